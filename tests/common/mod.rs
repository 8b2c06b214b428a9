//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use simple_sds::bits;
use simple_sds::int_vector::IntVector;
use simple_sds::ops::Push;

use pathbwt::record::DynamicRecord;
use pathbwt::support::{Run, Sample};

/// Builds a dynamic record from an outgoing edge list, a run list, and a
/// sample list.
pub fn record(
    outgoing: &[(usize, usize)],
    runs: &[(usize, usize)],
    samples: &[Sample],
) -> DynamicRecord {
    let mut result = DynamicRecord::new();
    result.outgoing = outgoing.to_vec();
    for (value, len) in runs.iter() {
        result.body.push(Run::new(*value, *len));
        result.body_size += len;
    }
    result.ids = samples.to_vec();
    result
}

/// Packs a slice of values into an `IntVector` of minimal width.
pub fn int_vector(values: &[usize]) -> IntVector {
    let max = values.iter().copied().max().unwrap_or(0);
    let mut result = IntVector::new(bits::bit_len(max as u64)).unwrap();
    for value in values.iter() {
        result.push(*value as u64);
    }
    result
}

/// The example index from the GBWT paper: three paths through a graph of
/// seven nodes, with node 0 as the endmarker.
///
/// The paths are 1-2-4-5-7, 1-2-4-6-7, and 1-3-4-5-7.
pub fn paper_index() -> Vec<DynamicRecord> {
    vec![
        record(&[(1, 0)], &[(0, 3)], &[]),
        record(&[(2, 0), (3, 0)], &[(0, 2), (1, 1)], &[]),
        record(&[(4, 0), (5, 0)], &[(0, 1), (1, 1)], &[]),
        record(&[(4, 1)], &[(0, 1)], &[]),
        record(&[(5, 1), (6, 0)], &[(1, 1), (0, 1)], &[]),
        record(&[(7, 0)], &[(0, 2)], &[]),
        record(&[(7, 2)], &[(0, 1)], &[]),
        record(&[(0, 0)], &[(0, 3)], &[]),
    ]
}
