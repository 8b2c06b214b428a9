//! Sparse document-array samples.
//!
//! Storing the originating sequence identifier at every BWT position would
//! dwarf the index itself, so identifiers are sampled: only some (record,
//! offset) positions carry one, and `locate` walks the BWT until it hits a
//! sampled position. The store is a two-level structure: a dense bitvector
//! flags the records that carry any sample, and two sparse bitvectors over
//! the concatenated offset space of those records mark record boundaries and
//! sampled offsets. The sample values themselves sit in a bit-packed array in
//! offset order.

use std::io;
use std::io::{Error, ErrorKind};

use simple_sds::bit_vector::BitVector;
use simple_sds::bits;
use simple_sds::int_vector::IntVector;
use simple_sds::ops::{Access, BitVec, Push, Rank, Select, Vector};
use simple_sds::raw_vector::{AccessRaw, RawVector};
use simple_sds::serialize::Serialize;
use simple_sds::sparse_vector::{SparseBuilder, SparseVector};

use crate::record::DynamicRecord;
use crate::support::Sample;
use crate::ENDMARKER;

//-----------------------------------------------------------------------------

/// Document-array samples for an entire record array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DASamples {
    /// Flags the records that carry at least one sample.
    sampled_records: BitVector,
    /// One set bit at the start of each sampled record, in the space formed
    /// by concatenating the offset ranges of the sampled records.
    bwt_ranges: SparseVector,
    /// One set bit at each sampled offset in the same space.
    sampled_offsets: SparseVector,
    /// Sample values in offset order, packed to the minimal width.
    array: IntVector,
}

impl DASamples {
    /// Collects the samples stored in the given records.
    pub fn from_records(bwt: &[DynamicRecord]) -> Self {
        // Statistics and the sampled-record flags.
        let mut record_count = 0;
        let mut bwt_offsets = 0;
        let mut sample_count = 0;
        let mut max_sample = 0;
        let mut raw = RawVector::with_len(bwt.len(), false);
        for (i, record) in bwt.iter().enumerate() {
            if record.samples() > 0 {
                record_count += 1;
                bwt_offsets += record.len();
                sample_count += record.samples();
                for sample in record.ids.iter() {
                    max_sample = max_sample.max(sample.1);
                }
                raw.set_bit(i, true);
            }
        }
        let mut sampled_records = BitVector::from(raw);
        sampled_records.enable_rank();

        // The bitvectors over BWT offsets and the sample values.
        let mut range_builder = SparseBuilder::new(bwt_offsets, record_count).unwrap();
        let mut offset_builder = SparseBuilder::new(bwt_offsets, sample_count).unwrap();
        let mut array = IntVector::new(bits::bit_len(max_sample as u64)).unwrap();
        let mut offset = 0;
        for record in bwt.iter() {
            if record.samples() > 0 {
                range_builder.set(offset);
                for sample in record.ids.iter() {
                    offset_builder.set(offset + sample.0);
                    array.push(sample.1 as u64);
                }
                offset += record.len();
            }
        }

        DASamples {
            sampled_records,
            bwt_ranges: SparseVector::try_from(range_builder).unwrap(),
            sampled_offsets: SparseVector::try_from(offset_builder).unwrap(),
            array,
        }
    }

    /// Merges the sample stores of multiple sources.
    ///
    /// `origins` and `record_offsets` describe the same destination layout as
    /// in [`crate::record_array::RecordArray::merged`]. `sequence_counts[i]`
    /// is the number of sequences in source `i`; sample values and endmarker
    /// offsets of source `i` are shifted by the total sequence count of the
    /// preceding sources, renumbering the sequences of the merged index.
    ///
    /// The endmarker is special: if any source samples its endmarker, the
    /// merged endmarker spans the whole merged sequence count, and each
    /// source's endmarker samples land at `offset + sequence_offset`. Other
    /// sampled records keep their lengths and have their sample offsets
    /// re-based to the record's start in the merged offset space.
    pub fn merged(
        sources: &[&DASamples],
        origins: &IntVector,
        record_offsets: &[usize],
        sequence_counts: &[usize],
    ) -> Self {
        let mut sample_count = 0;
        let mut total_sequences = 0;
        let mut sequence_offsets: Vec<usize> = vec![0; sources.len()];
        for (i, source) in sources.iter().enumerate() {
            sample_count += source.len();
            sequence_offsets[i] = total_sequences;
            total_sequences += sequence_counts[i];
        }
        let mut sample_iters: Vec<SampleIter> =
            sources.iter().map(|source| SampleIter::new(source)).collect();
        let mut range_iters: Vec<SampleRangeIter> = sources
            .iter()
            .map(|source| SampleRangeIter::new(source))
            .collect();

        // Statistics and the sampled-record flags. The endmarker is sampled
        // in the merged index if any source samples it.
        let mut record_count = 0;
        let mut bwt_offsets = 0;
        let mut raw = RawVector::with_len(origins.len(), false);
        let mut sample_endmarker = false;
        for (origin, source) in sources.iter().enumerate() {
            if source.is_sampled(ENDMARKER) {
                sample_endmarker = true;
                range_iters[origin].advance();
            }
        }
        if sample_endmarker {
            record_count += 1;
            bwt_offsets += total_sequences;
            raw.set_bit(ENDMARKER, true);
        }
        for i in 1..origins.len() {
            let origin = origins.get(i) as usize;
            if origin >= sources.len() {
                continue; // No record.
            }
            if sources[origin].is_sampled(i - record_offsets[origin]) {
                record_count += 1;
                bwt_offsets += range_iters[origin].length();
                raw.set_bit(i, true);
                range_iters[origin].advance();
            }
        }
        let mut sampled_records = BitVector::from(raw);
        sampled_records.enable_rank();

        // Restart the range iterators for the copying pass.
        let mut range_iters: Vec<SampleRangeIter> = sources
            .iter()
            .map(|source| SampleRangeIter::new(source))
            .collect();

        // Build the offset bitvectors and copy the samples.
        let mut range_builder = SparseBuilder::new(bwt_offsets, record_count).unwrap();
        let mut offset_builder = SparseBuilder::new(bwt_offsets, sample_count).unwrap();
        let width = bits::bit_len(total_sequences.saturating_sub(1) as u64);
        let mut array = IntVector::new(width).unwrap();
        let mut record_start = 0;
        if sample_endmarker {
            range_builder.set(record_start);
            for (origin, source) in sources.iter().enumerate() {
                if !source.is_sampled(ENDMARKER) {
                    continue;
                }
                while !sample_iters[origin].end()
                    && sample_iters[origin].offset() < range_iters[origin].limit()
                {
                    offset_builder.set(sample_iters[origin].offset() + sequence_offsets[origin]);
                    array.push((sample_iters[origin].value() + sequence_offsets[origin]) as u64);
                    sample_iters[origin].advance();
                }
                range_iters[origin].advance();
            }
            record_start += total_sequences;
        }
        for i in 1..origins.len() {
            if !sampled_records.get(i) {
                continue;
            }
            let origin = origins.get(i) as usize;
            range_builder.set(record_start);
            while !sample_iters[origin].end()
                && sample_iters[origin].offset() < range_iters[origin].limit()
            {
                offset_builder.set(
                    sample_iters[origin].offset() - range_iters[origin].start() + record_start,
                );
                array.push((sample_iters[origin].value() + sequence_offsets[origin]) as u64);
                sample_iters[origin].advance();
            }
            record_start += range_iters[origin].length();
            range_iters[origin].advance();
        }

        DASamples {
            sampled_records,
            bwt_ranges: SparseVector::try_from(range_builder).unwrap(),
            sampled_offsets: SparseVector::try_from(offset_builder).unwrap(),
            array,
        }
    }

    /// Returns the number of stored samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.array.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    /// Returns the number of sampled records.
    #[inline]
    pub fn records(&self) -> usize {
        self.bwt_ranges.count_ones()
    }

    /// Returns `true` if the record carries at least one sample.
    pub fn is_sampled(&self, record: usize) -> bool {
        record < self.sampled_records.len() && self.sampled_records.get(record)
    }

    /// Returns the start of the record's range in the concatenated offset
    /// space. The record must be sampled.
    pub fn start(&self, record: usize) -> usize {
        let rank = self.sampled_records.rank(record);
        self.bwt_ranges.select_iter(rank).next().unwrap().1
    }

    /// Returns the end of the record's range in the concatenated offset
    /// space. The record must be sampled.
    pub fn limit(&self, record: usize) -> usize {
        self.limit_for_rank(self.sampled_records.rank(record))
    }

    fn limit_for_rank(&self, rank: usize) -> usize {
        if rank + 1 < self.records() {
            self.bwt_ranges.select_iter(rank + 1).next().unwrap().1
        } else {
            self.bwt_ranges.len()
        }
    }

    /// Returns the sequence identifier stored for the position, or [`None`]
    /// if the position is not sampled.
    pub fn try_locate(&self, record: usize, offset: usize) -> Option<usize> {
        if !self.is_sampled(record) {
            return None;
        }
        let pos = self.start(record) + offset;
        if self.sampled_offsets.get(pos) {
            Some(self.array.get(self.sampled_offsets.rank(pos)) as usize)
        } else {
            None
        }
    }

    /// Returns the first sample in the record at `offset` or later, or
    /// [`None`] if the record has no further samples.
    pub fn next_sample(&self, record: usize, offset: usize) -> Option<Sample> {
        if !self.is_sampled(record) {
            return None;
        }
        let record_start = self.start(record);
        let rank = self.sampled_offsets.rank(record_start + offset);
        if rank >= self.array.len() {
            return None;
        }
        let pos = self.sampled_offsets.select_iter(rank).next().unwrap().1;
        if pos >= self.limit(record) {
            return None;
        }
        Some((pos - record_start, self.array.get(rank) as usize))
    }
}

impl Serialize for DASamples {
    fn serialize_header<T: io::Write>(&self, _: &mut T) -> io::Result<()> {
        Ok(())
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.sampled_records.serialize(writer)?;
        self.bwt_ranges.serialize(writer)?;
        self.sampled_offsets.serialize(writer)?;
        self.array.serialize(writer)?;
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let mut sampled_records = BitVector::load(reader)?;
        sampled_records.enable_rank();
        let bwt_ranges = SparseVector::load(reader)?;
        let sampled_offsets = SparseVector::load(reader)?;
        let array = IntVector::load(reader)?;
        if bwt_ranges.len() != sampled_offsets.len() {
            return Err(Error::new(
                ErrorKind::InvalidData,
                "DASamples: offset universe mismatch",
            ));
        }
        if sampled_offsets.count_ones() != array.len() {
            return Err(Error::new(
                ErrorKind::InvalidData,
                "DASamples: sample count does not match the offsets",
            ));
        }
        Ok(DASamples {
            sampled_records,
            bwt_ranges,
            sampled_offsets,
            array,
        })
    }

    fn size_in_elements(&self) -> usize {
        self.sampled_records.size_in_elements()
            + self.bwt_ranges.size_in_elements()
            + self.sampled_offsets.size_in_elements()
            + self.array.size_in_elements()
    }
}

//-----------------------------------------------------------------------------

/// An iterator over the samples of a [`DASamples`] in offset order, yielding
/// positions in the concatenated offset space along with the values.
#[derive(Clone, Debug)]
pub struct SampleIter<'a> {
    parent: &'a DASamples,
    pos: usize,
    offset: usize,
}

impl<'a> SampleIter<'a> {
    pub fn new(parent: &'a DASamples) -> Self {
        let mut iter = SampleIter {
            parent,
            pos: 0,
            offset: 0,
        };
        iter.find_offset();
        iter
    }

    #[inline]
    pub fn end(&self) -> bool {
        self.pos >= self.parent.len()
    }

    /// Returns the position of the current sample in the concatenated offset
    /// space.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the value of the current sample.
    pub fn value(&self) -> usize {
        self.parent.array.get(self.pos) as usize
    }

    pub fn advance(&mut self) {
        self.pos += 1;
        self.find_offset();
    }

    fn find_offset(&mut self) {
        if !self.end() {
            self.offset = self
                .parent
                .sampled_offsets
                .select_iter(self.pos)
                .next()
                .unwrap()
                .1;
        }
    }
}

/// An iterator over the sampled records of a [`DASamples`], exposing each
/// record's range in the concatenated offset space.
#[derive(Clone, Debug)]
pub struct SampleRangeIter<'a> {
    parent: &'a DASamples,
    record_id: usize,
    rank: usize,
    start: usize,
    limit: usize,
}

impl<'a> SampleRangeIter<'a> {
    pub fn new(parent: &'a DASamples) -> Self {
        let mut iter = SampleRangeIter {
            parent,
            record_id: 0,
            rank: 0,
            start: 0,
            limit: 0,
        };
        iter.find_range();
        iter
    }

    #[inline]
    pub fn end(&self) -> bool {
        self.rank >= self.parent.records()
    }

    /// Returns the identifier of the current sampled record.
    #[inline]
    pub fn record(&self) -> usize {
        self.record_id
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the length of the current record's range.
    #[inline]
    pub fn length(&self) -> usize {
        self.limit - self.start
    }

    pub fn advance(&mut self) {
        self.record_id += 1;
        self.rank += 1;
        self.find_range();
    }

    fn find_range(&mut self) {
        if self.end() {
            return;
        }
        while !self.parent.is_sampled(self.record_id) {
            self.record_id += 1;
        }
        self.start = self
            .parent
            .bwt_ranges
            .select_iter(self.rank)
            .next()
            .unwrap()
            .1;
        self.limit = self.parent.limit_for_rank(self.rank);
    }
}
