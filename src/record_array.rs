//! The concatenated byte encodings of all records, with a sparse offset index.
//!
//! Record `i` occupies `data[start(i)..limit(i)]`; the starts are the set bits
//! of an Elias-Fano coded bitvector over the byte positions, so the array adds
//! only a sublinear index on top of the raw encodings. Empty records (a single
//! zero byte, outdegree 0) keep the identifier space dense.

use std::io;
use std::io::{Error, ErrorKind};
use std::iter::FusedIterator;

use simple_sds::int_vector::IntVector;
use simple_sds::ops::{Access, BitVec, Select, Vector};
use simple_sds::serialize::Serialize;
use simple_sds::sparse_vector::{SparseBuilder, SparseVector};

use crate::record::{CompressedRecord, DynamicRecord, RunReader};
use crate::ENDMARKER;

//-----------------------------------------------------------------------------

/// An immutable array of compressed records over one byte blob.
///
/// Construction consumes dynamic records; queries hand out borrowed
/// [`CompressedRecord`] views. Multiple views over distinct records may be
/// read concurrently, as the array is never mutated after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordArray {
    records: usize,
    index: SparseVector,
    data: Vec<u8>,
}

impl RecordArray {
    /// Encodes the given records in order.
    pub fn from_records(bwt: &[DynamicRecord]) -> Self {
        let mut data: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = Vec::with_capacity(bwt.len());
        for record in bwt.iter() {
            offsets.push(data.len());
            record.write_bwt(&mut data);
        }
        let index = Self::build_index(data.len(), &offsets);
        RecordArray {
            records: bwt.len(),
            index,
            data,
        }
    }

    /// Concatenates the records of multiple arrays into one.
    ///
    /// `origins[comp]` names the source array that owns destination record
    /// `comp`; a value at or above `sources.len()` marks an empty destination
    /// record. `record_offsets[origin]` is the amount destination identifiers
    /// are shifted relative to that source, so the source record behind `comp`
    /// is `comp - record_offsets[origin]`. Destination records must map to
    /// each source's records in increasing order, which lets the merge copy
    /// raw byte ranges while advancing one cursor per source.
    ///
    /// The endmarker record cannot be copied raw: its body is the
    /// concatenation of every source's endmarker body, with run values
    /// shifted past the outgoing edges of the preceding sources, recoded into
    /// sorted order. Reading the endmarkers first also advances each source
    /// cursor past its endmarker bytes.
    pub fn merged(
        sources: &[&RecordArray],
        origins: &IntVector,
        record_offsets: &[usize],
    ) -> Self {
        let records = origins.len();
        if records == 0 {
            return RecordArray::from_records(&[]);
        }
        let total: usize = sources.iter().map(|source| source.data.len()).sum();
        let mut data: Vec<u8> = Vec::new();
        let mut limits: Vec<usize> = vec![0; sources.len()];

        // Merge the endmarkers.
        {
            let mut merged = DynamicRecord::new();
            for (origin, source) in sources.iter().enumerate() {
                if source.is_empty() {
                    continue;
                }
                let start = source.start(ENDMARKER);
                let limit = source.limit(ENDMARKER);
                let record = CompressedRecord::new(&source.data, start, limit);
                let shift = merged.outdegree();
                let mut reader = RunReader::new(&record);
                while !reader.end() {
                    let mut run = reader.run();
                    run.value += shift;
                    merged.body_size += run.len;
                    merged.body.push(run);
                    reader.advance();
                }
                merged.outgoing.extend_from_slice(record.outgoing());
                limits[origin] = limit;
            }
            merged.recode();
            merged.write_bwt(&mut data);
        }

        // Copy the remaining records as raw bytes.
        data.reserve(total);
        let mut offsets: Vec<usize> = vec![0; records];
        for comp in 1..records {
            offsets[comp] = data.len();
            let origin = origins.get(comp) as usize;
            if origin >= sources.len() {
                data.push(0); // Empty record, outdegree 0.
                continue;
            }
            let start = limits[origin];
            let limit = sources[origin].limit(comp - record_offsets[origin]);
            limits[origin] = limit;
            data.extend_from_slice(&sources[origin].data[start..limit]);
        }

        let index = Self::build_index(data.len(), &offsets);
        RecordArray {
            records,
            index,
            data,
        }
    }

    fn build_index(universe: usize, offsets: &[usize]) -> SparseVector {
        let mut builder = SparseBuilder::new(universe, offsets.len()).unwrap();
        for offset in offsets.iter() {
            builder.set(*offset);
        }
        SparseVector::try_from(builder).unwrap()
    }

    /// Returns the number of records, including empty ones.
    #[inline]
    pub fn len(&self) -> usize {
        self.records
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Returns the starting offset of record `i` in the byte blob.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn start(&self, i: usize) -> usize {
        self.index.select_iter(i).next().unwrap().1
    }

    /// Returns the one-past-the-end offset of record `i` in the byte blob.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn limit(&self, i: usize) -> usize {
        if i + 1 < self.records {
            self.index.select_iter(i + 1).next().unwrap().1
        } else {
            self.data.len()
        }
    }

    /// Returns a view of record `i`, or [`None`] if there is no such record.
    /// Empty records yield a view with outdegree 0.
    pub fn record(&self, i: usize) -> Option<CompressedRecord<'_>> {
        if i >= self.records {
            return None;
        }
        let mut iter = self.index.select_iter(i);
        let (_, start) = iter.next().unwrap();
        let limit = if i + 1 < self.records {
            iter.next().unwrap().1
        } else {
            self.data.len()
        };
        Some(CompressedRecord::new(&self.data, start, limit))
    }

    /// Returns an iterator over (identifier, record) pairs, skipping empty
    /// records.
    pub fn iter(&self) -> RecordArrayIter<'_> {
        RecordArrayIter {
            parent: self,
            next: 0,
        }
    }

    /// Returns the raw byte blob.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Serialize for RecordArray {
    fn serialize_header<T: io::Write>(&self, _: &mut T) -> io::Result<()> {
        Ok(())
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.records.serialize(writer)?;
        self.index.serialize(writer)?;
        self.data.serialize(writer)?;
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let records = usize::load(reader)?;
        let index = SparseVector::load(reader)?;
        let data = Vec::<u8>::load(reader)?;
        if index.len() != data.len() {
            return Err(Error::new(
                ErrorKind::InvalidData,
                "RecordArray: index / data length mismatch",
            ));
        }
        if index.count_ones() != records {
            return Err(Error::new(
                ErrorKind::InvalidData,
                "RecordArray: record count does not match the index",
            ));
        }
        Ok(RecordArray {
            records,
            index,
            data,
        })
    }

    fn size_in_elements(&self) -> usize {
        self.records.size_in_elements() + self.index.size_in_elements() + self.data.size_in_elements()
    }
}

//-----------------------------------------------------------------------------

/// An iterator over the nonempty records of a [`RecordArray`], yielding
/// (record identifier, record) pairs.
#[derive(Clone, Debug)]
pub struct RecordArrayIter<'a> {
    parent: &'a RecordArray,
    next: usize,
}

impl<'a> Iterator for RecordArrayIter<'a> {
    type Item = (usize, CompressedRecord<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.parent.len() {
            let id = self.next;
            self.next += 1;
            let record = self.parent.record(id)?;
            if !record.is_empty() {
                return Some((id, record));
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.parent.len() - self.next))
    }
}

impl<'a> FusedIterator for RecordArrayIter<'a> {}
