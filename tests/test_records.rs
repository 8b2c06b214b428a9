mod common;

use std::collections::BTreeSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use pathbwt::record::{CompressedRecord, DecompressedRecord, DynamicRecord};
use pathbwt::support::{flip_node, Pos, Run};
use pathbwt::ENDMARKER;

//-----------------------------------------------------------------------------

// The successor node at every position, by expanding the runs.
fn expand(record: &DynamicRecord) -> Vec<usize> {
    let mut result = Vec::with_capacity(record.len());
    for run in record.body.iter() {
        for _ in 0..run.len {
            result.push(record.outgoing[run.value].0);
        }
    }
    result
}

// The position LF should map `i` to, computed naively.
fn naive_lf(record: &DynamicRecord, i: usize) -> Pos {
    let body = expand(record);
    let node = body[i];
    let rank = record.outgoing.iter().position(|e| e.0 == node).unwrap();
    let before = body[..i].iter().filter(|n| **n == node).count();
    Pos::new(node, record.outgoing[rank].1 + before)
}

fn compressed_bytes(record: &DynamicRecord) -> Vec<u8> {
    let mut data: Vec<u8> = Vec::new();
    record.write_bwt(&mut data);
    data
}

fn random_record(rng: &mut ChaCha8Rng, max_outdegree: usize) -> DynamicRecord {
    let outdegree = rng.gen_range(1..=max_outdegree);
    let mut nodes: BTreeSet<usize> = BTreeSet::new();
    while nodes.len() < outdegree {
        nodes.insert(rng.gen_range(2..60));
    }
    let outgoing: Vec<(usize, usize)> =
        nodes.iter().map(|n| (*n, rng.gen_range(0..20))).collect();

    let mut result = DynamicRecord::new();
    result.outgoing = outgoing;
    let runs = rng.gen_range(1..25);
    let mut prev = usize::MAX;
    for _ in 0..runs {
        let mut value = rng.gen_range(0..outdegree);
        if value == prev {
            // Keep runs maximal so that physical and logical runs coincide.
            value = (value + 1) % outdegree;
            if value == prev {
                continue;
            }
        }
        prev = value;
        let len = rng.gen_range(1..6);
        result.body.push(Run::new(value, len));
        result.body_size += len;
    }
    result
}

//-----------------------------------------------------------------------------

#[test]
fn statistics() {
    let index = common::paper_index();
    let sizes: Vec<usize> = index.iter().map(|record| record.len()).collect();
    assert_eq!(sizes, vec![3, 3, 2, 1, 2, 2, 1, 3]);
    let total: usize = sizes.iter().sum();
    assert_eq!(total, 17, "total length of the paper example");

    let node_1 = &index[1];
    assert_eq!(node_1.outdegree(), 2);
    assert_eq!(node_1.successor(1), 3);
    assert_eq!(node_1.offset(1), 0);
    assert_eq!(node_1.runs(), 2);
    assert!(!node_1.is_empty());
    assert!(node_1.has_edge(2));
    assert!(!node_1.has_edge(5));
    assert_eq!(node_1.edge_to(3), Some(1));
    assert_eq!(node_1.edge_to(5), None);
    assert_eq!(node_1.edge_to_linear(2), Some(0));
}

#[test]
fn record_round_trip() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xB0D1E5);
    let mut records = common::paper_index();
    for _ in 0..20 {
        records.push(random_record(&mut rng, 8));
    }

    for record in records.iter() {
        let data = compressed_bytes(record);
        let compressed = CompressedRecord::new(&data, 0, data.len());
        assert_eq!(compressed.outdegree(), record.outdegree());
        assert_eq!(compressed.outgoing(), &record.outgoing[..]);
        assert_eq!(compressed.len(), record.len());
        assert_eq!(compressed.runs(), record.runs());
    }
}

#[test]
fn empty_record_encoding() {
    let record = DynamicRecord::new();
    let data = compressed_bytes(&record);
    assert_eq!(data, vec![0], "an empty record is a single zero byte");
    assert!(CompressedRecord::is_empty_record(&data, 0));

    let compressed = CompressedRecord::new(&data, 0, data.len());
    assert!(compressed.is_empty());
    assert_eq!(compressed.len(), 0);
    assert_eq!(compressed.lf(0), None);
    assert_eq!(compressed.node_at(0), ENDMARKER);
}

#[test]
fn lf_equivalence() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xD1CE);
    let mut records = common::paper_index();
    for _ in 0..50 {
        records.push(random_record(&mut rng, 8));
    }

    for record in records.iter() {
        let data = compressed_bytes(record);
        let compressed = CompressedRecord::new(&data, 0, data.len());
        let decompressed = DecompressedRecord::from(record);

        for i in 0..record.len() {
            let expected = naive_lf(record, i);
            assert_eq!(record.lf(i), Some(expected), "dynamic lf at {}", i);
            assert_eq!(compressed.lf(i), Some(expected), "compressed lf at {}", i);
            assert_eq!(decompressed.lf(i), Some(expected), "decompressed lf at {}", i);
            assert_eq!(record.run_lf(i), compressed.run_lf(i), "run_lf at {}", i);
            assert_eq!(record.run_lf(i), decompressed.run_lf(i), "run_lf at {}", i);
            assert_eq!(record.node_at(i), expected.node);
            assert_eq!(compressed.node_at(i), expected.node);
            assert_eq!(decompressed.node_at(i), expected.node);
        }
        assert_eq!(record.lf(record.len()), None);
        assert_eq!(compressed.lf(record.len()), None);
        assert_eq!(decompressed.lf(record.len()), None);
        assert_eq!(record.node_at(record.len()), ENDMARKER);
    }
}

#[test]
fn run_lf_run_ends() {
    let record = common::record(&[(3, 0), (7, 2)], &[(0, 2), (1, 3), (0, 1)], &[]);
    let data = compressed_bytes(&record);
    let compressed = CompressedRecord::new(&data, 0, data.len());

    let ends = [1, 1, 4, 4, 4, 5];
    for (i, end) in ends.iter().enumerate() {
        let (_, run_end) = record.run_lf(i).unwrap();
        assert_eq!(run_end, *end, "dynamic run end at {}", i);
        let (_, run_end) = compressed.run_lf(i).unwrap();
        assert_eq!(run_end, *end, "compressed run end at {}", i);
    }
}

#[test]
fn follow_matches_lf_to() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xF0110);
    for _ in 0..50 {
        let record = random_record(&mut rng, 8);
        let data = compressed_bytes(&record);
        let compressed = CompressedRecord::new(&data, 0, data.len());

        for _ in 0..20 {
            let a = rng.gen_range(0..record.len());
            let b = rng.gen_range(a..record.len());
            let range = a..b + 1;
            let rank = rng.gen_range(0..record.outdegree());
            let to = record.successor(rank);

            let start = record.lf_to(a, to).unwrap();
            let end = record.lf_to(b + 1, to).unwrap();
            match record.follow(&range, to) {
                Some(result) => assert_eq!(result, start..end, "dynamic follow"),
                None => assert_eq!(start, end, "empty dynamic follow"),
            }
            assert_eq!(compressed.lf_to(a, to), Some(start));
            assert_eq!(compressed.lf_to(b + 1, to), Some(end));
            assert_eq!(record.follow(&range, to), compressed.follow(&range, to));

            // Missing successor and empty range.
            assert_eq!(record.follow(&range, 61), None);
            assert_eq!(compressed.follow(&range, 61), None);
            assert_eq!(record.follow(&(a..a), to), None);
            assert_eq!(compressed.follow(&(a..a), to), None);
        }
    }
}

#[test]
fn bd_follow_reverse_offsets() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xBDBD);
    for _ in 0..100 {
        let record = random_record(&mut rng, 6);
        let data = compressed_bytes(&record);
        let compressed = CompressedRecord::new(&data, 0, data.len());
        let body = expand(&record);

        for rank in 0..record.outdegree() {
            let to = record.successor(rank);
            for _ in 0..10 {
                let a = rng.gen_range(0..record.len());
                let b = rng.gen_range(a..record.len());
                let range = a..b + 1;

                // Positions whose successor, reversed, precedes the reversed
                // destination.
                let naive_reverse: usize = body[range.clone()]
                    .iter()
                    .filter(|node| flip_node(**node) < flip_node(to))
                    .count();
                let naive_count = body[range.clone()].iter().filter(|n| **n == to).count();

                let dynamic = record.bd_follow(&range, to);
                let view = compressed.bd_follow(&range, to);
                assert_eq!(dynamic, view, "record shapes disagree on bd_follow");

                match dynamic {
                    Some((result, reverse_offset)) => {
                        assert_eq!(result.len(), naive_count, "mapped range length");
                        assert_eq!(result, record.follow(&range, to).unwrap());
                        assert_eq!(reverse_offset, naive_reverse, "reverse offset");
                    }
                    None => assert_eq!(naive_count, 0, "bd_follow missed occurrences"),
                }
            }
        }
    }
}

#[test]
fn bd_follow_three_cases() {
    // Both orientations of node 2 (records 4 and 5) and a lone forward node 3
    // (record 6): queries to 4 take the both-orientations/forward case, to 5
    // the both-orientations/reverse case, and to 6 the easy case.
    let record = common::record(
        &[(4, 0), (5, 0), (6, 0)],
        &[(0, 2), (1, 1), (2, 3), (1, 2), (0, 1)],
        &[],
    );
    let body = expand(&record);

    for to in [4, 5, 6] {
        for a in 0..record.len() {
            for b in a..record.len() {
                let range = a..b + 1;
                let naive_reverse: usize = body[range.clone()]
                    .iter()
                    .filter(|node| flip_node(**node) < flip_node(to))
                    .count();
                match record.bd_follow(&range, to) {
                    Some((_, reverse_offset)) => assert_eq!(
                        reverse_offset, naive_reverse,
                        "reverse offset for {} over {:?}",
                        to, range
                    ),
                    None => {
                        let count = body[range.clone()].iter().filter(|n| **n == to).count();
                        assert_eq!(count, 0);
                    }
                }
            }
        }
    }
}

#[test]
fn recode_sorts_outgoing() {
    let mut record = common::record(&[(7, 0), (3, 0)], &[(0, 2), (1, 3)], &[]);
    assert_eq!(record.node_at(0), 7);
    assert_eq!(record.node_at(2), 3);

    record.recode();
    assert_eq!(record.outgoing, vec![(3, 0), (7, 0)]);
    assert_eq!(record.body, vec![Run::new(1, 2), Run::new(0, 3)]);
    assert_eq!(record.node_at(0), 7, "queries unchanged by recode");
    assert_eq!(record.node_at(2), 3);

    let copy = record.clone();
    record.recode();
    assert_eq!(record, copy, "recode is idempotent");
}

#[test]
fn recode_preserves_queries() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x4EC0DE);
    for _ in 0..20 {
        let mut record = random_record(&mut rng, 8);
        // Shuffle the outgoing edges and remap the runs accordingly.
        let sorted = record.clone();
        let outdegree = record.outdegree();
        let shift = rng.gen_range(1..outdegree.max(2));
        record.outgoing.rotate_left(shift % outdegree);
        for run in record.body.iter_mut() {
            run.value = (run.value + outdegree - shift % outdegree) % outdegree;
        }

        record.recode();
        assert_eq!(record.outgoing, sorted.outgoing);
        for i in 0..record.len() {
            assert_eq!(record.lf(i), sorted.lf(i), "lf changed by recode");
        }
    }
}

#[test]
fn remove_unused_edges_prunes() {
    let mut record = common::record(
        &[(2, 0), (4, 1), (6, 0), (8, 5)],
        &[(0, 2), (3, 1), (0, 1)],
        &[],
    );
    let before: Vec<Option<Pos>> = (0..record.len()).map(|i| record.lf(i)).collect();

    record.remove_unused_edges();
    assert_eq!(record.outgoing, vec![(2, 0), (8, 5)]);
    let after: Vec<Option<Pos>> = (0..record.len()).map(|i| record.lf(i)).collect();
    assert_eq!(before, after, "queries changed by remove_unused_edges");
}

#[test]
fn incoming_edges() {
    let mut record = DynamicRecord::new();
    record.increment(4);
    record.increment(2);
    record.increment(4);
    record.increment(8);
    assert_eq!(record.incoming, vec![(2, 1), (4, 2), (8, 1)]);
    assert_eq!(record.indegree(), 3);
    assert_eq!(record.predecessor(1), 4);
    assert_eq!(record.count(1), 2);

    assert_eq!(record.count_before(2), 0);
    assert_eq!(record.count_before(4), 1);
    assert_eq!(record.count_until(4), 3);
    assert_eq!(record.count_until(100), 4);
}

#[test]
fn next_sample() {
    let record = common::record(&[(3, 0)], &[(0, 6)], &[(1, 10), (4, 11)]);
    assert_eq!(record.samples(), 2);
    assert_eq!(record.next_sample(0), Some((1, 10)));
    assert_eq!(record.next_sample(1), Some((1, 10)));
    assert_eq!(record.next_sample(2), Some((4, 11)));
    assert_eq!(record.next_sample(5), None);
}

#[test]
fn physical_and_logical_runs() {
    // Adjacent runs with the same rank appear after concatenating records.
    // The run-length encoded shapes count them separately; the decompressed
    // shape merges them.
    let record = common::record(&[(3, 0), (5, 0)], &[(0, 2), (0, 3), (1, 1)], &[]);
    let data = compressed_bytes(&record);
    let compressed = CompressedRecord::new(&data, 0, data.len());
    let decompressed = DecompressedRecord::from(&record);

    assert_eq!(record.runs(), 3);
    assert_eq!(compressed.runs(), 3);
    assert_eq!(decompressed.runs(), 2);

    for i in 0..record.len() {
        assert_eq!(record.lf(i), decompressed.lf(i));
    }
    // The merged run spans both physical runs.
    assert_eq!(decompressed.run_lf(0).unwrap().1, 4);
}

#[test]
fn decompressed_from_both_shapes() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xDEC0);
    for _ in 0..10 {
        let record = random_record(&mut rng, 8);
        let data = compressed_bytes(&record);
        let compressed = CompressedRecord::new(&data, 0, data.len());

        let from_dynamic = DecompressedRecord::from(&record);
        let from_compressed = DecompressedRecord::from(&compressed);
        assert_eq!(from_dynamic, from_compressed);
        assert_eq!(from_dynamic.len(), record.len());
        assert_eq!(from_dynamic.outdegree(), record.outdegree());
        assert!(from_dynamic.has_edge(record.successor(0)));
    }
}
