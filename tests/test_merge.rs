use pathbwt::merge::MergeParameters;

#[test]
fn defaults() {
    let params = MergeParameters::new();
    assert_eq!(params.pos_buffer_size(), MergeParameters::POS_BUFFER_SIZE);
    assert_eq!(params.thread_buffer_size(), MergeParameters::THREAD_BUFFER_SIZE);
    assert_eq!(params.merge_buffers(), MergeParameters::MERGE_BUFFERS);
    assert_eq!(params.chunk_size(), MergeParameters::CHUNK_SIZE);
    assert_eq!(params.merge_jobs(), MergeParameters::MERGE_JOBS);
    assert_eq!(params, MergeParameters::default());
}

#[test]
fn setters_clamp() {
    let mut params = MergeParameters::new();

    params.set_pos_buffer_size(0);
    assert_eq!(params.pos_buffer_size(), 1);
    params.set_pos_buffer_size(usize::MAX);
    assert_eq!(params.pos_buffer_size(), MergeParameters::MAX_BUFFER_SIZE);
    params.set_pos_buffer_size(128);
    assert_eq!(params.pos_buffer_size(), 128);

    params.set_thread_buffer_size(0);
    assert_eq!(params.thread_buffer_size(), 1);

    params.set_merge_buffers(100);
    assert_eq!(params.merge_buffers(), MergeParameters::MAX_MERGE_BUFFERS);
    params.set_merge_buffers(0);
    assert_eq!(params.merge_buffers(), 1);

    params.set_chunk_size(0);
    assert_eq!(params.chunk_size(), 1);
    params.set_chunk_size(1_000_000);
    assert_eq!(params.chunk_size(), 1_000_000, "chunk size has no upper bound");

    params.set_merge_jobs(99);
    assert_eq!(params.merge_jobs(), MergeParameters::MAX_MERGE_JOBS);
}
