//! Tunables for multi-source merges.
//!
//! The merge algorithms stream positions through fixed-size buffers and may
//! run several merge jobs at once; the right sizes depend on the machine, so
//! they are carried explicitly instead of living in process-wide state. The
//! setters clamp to safe bounds rather than reject, the way the construction
//! front-ends expect.

/// Parameters for merging indexes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MergeParameters {
    pos_buffer_size: usize,
    thread_buffer_size: usize,
    merge_buffers: usize,
    chunk_size: usize,
    merge_jobs: usize,
}

impl MergeParameters {
    /// Default position buffer size in megabytes.
    pub const POS_BUFFER_SIZE: usize = 64;
    /// Default thread buffer size in megabytes.
    pub const THREAD_BUFFER_SIZE: usize = 256;
    /// Default number of merge buffers.
    pub const MERGE_BUFFERS: usize = 6;
    /// Default chunk size in sequences.
    pub const CHUNK_SIZE: usize = 1;
    /// Default number of merge jobs.
    pub const MERGE_JOBS: usize = 4;

    /// Largest allowed buffer size in megabytes.
    pub const MAX_BUFFER_SIZE: usize = 16384;
    pub const MAX_MERGE_BUFFERS: usize = 16;
    pub const MAX_MERGE_JOBS: usize = 16;

    pub fn new() -> Self {
        MergeParameters {
            pos_buffer_size: Self::POS_BUFFER_SIZE,
            thread_buffer_size: Self::THREAD_BUFFER_SIZE,
            merge_buffers: Self::MERGE_BUFFERS,
            chunk_size: Self::CHUNK_SIZE,
            merge_jobs: Self::MERGE_JOBS,
        }
    }

    /// Sets the position buffer size in megabytes, clamped to
    /// `1..=MAX_BUFFER_SIZE`.
    pub fn set_pos_buffer_size(&mut self, megabytes: usize) {
        self.pos_buffer_size = megabytes.clamp(1, Self::MAX_BUFFER_SIZE);
    }

    /// Sets the thread buffer size in megabytes, clamped to
    /// `1..=MAX_BUFFER_SIZE`.
    pub fn set_thread_buffer_size(&mut self, megabytes: usize) {
        self.thread_buffer_size = megabytes.clamp(1, Self::MAX_BUFFER_SIZE);
    }

    /// Sets the number of merge buffers, clamped to `1..=MAX_MERGE_BUFFERS`.
    pub fn set_merge_buffers(&mut self, n: usize) {
        self.merge_buffers = n.clamp(1, Self::MAX_MERGE_BUFFERS);
    }

    /// Sets the chunk size; at least one sequence per chunk.
    pub fn set_chunk_size(&mut self, n: usize) {
        self.chunk_size = n.max(1);
    }

    /// Sets the number of merge jobs, clamped to `1..=MAX_MERGE_JOBS`.
    pub fn set_merge_jobs(&mut self, n: usize) {
        self.merge_jobs = n.clamp(1, Self::MAX_MERGE_JOBS);
    }

    #[inline]
    pub fn pos_buffer_size(&self) -> usize {
        self.pos_buffer_size
    }

    #[inline]
    pub fn thread_buffer_size(&self) -> usize {
        self.thread_buffer_size
    }

    #[inline]
    pub fn merge_buffers(&self) -> usize {
        self.merge_buffers
    }

    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[inline]
    pub fn merge_jobs(&self) -> usize {
        self.merge_jobs
    }
}

impl Default for MergeParameters {
    fn default() -> Self {
        MergeParameters::new()
    }
}
