//! A binary-searchable table of interned strings.
//!
//! Strings are stored back to back in one byte buffer, partitioned by a
//! packed offset array, with a side permutation giving the lexicographic
//! order. Lookups binary search the permutation and return the original
//! insertion id, so identifiers stay stable while search stays logarithmic.

use std::cmp::Ordering;
use std::io;
use std::io::{Error, ErrorKind};

use rayon::slice::ParallelSliceMut;
use simple_sds::bits;
use simple_sds::int_vector::IntVector;
use simple_sds::ops::{Access, Push, Vector};
use simple_sds::serialize::Serialize;
use tracing::warn;

//-----------------------------------------------------------------------------

/// A string table with stable identifiers and binary-searchable lookup.
///
/// Duplicate strings are tolerated with a warning; every duplicate keeps its
/// own identifier, and [`Dictionary::find`] returns the first in
/// lexicographic-permutation order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dictionary {
    // `len() + 1` monotonic offsets partitioning `data`.
    offsets: IntVector,
    // Permutation of the identifiers in lexicographic order.
    sorted_ids: IntVector,
    data: Vec<u8>,
}

impl Default for Dictionary {
    fn default() -> Self {
        let mut offsets = IntVector::new(1).unwrap();
        offsets.push(0);
        Dictionary {
            offsets,
            sorted_ids: IntVector::new(1).unwrap(),
            data: Vec::new(),
        }
    }
}

impl Dictionary {
    pub fn new() -> Self {
        Dictionary::default()
    }

    /// Builds a dictionary from the given strings, which keep their positions
    /// as identifiers.
    pub fn from_strings<S: AsRef<str>>(source: &[S]) -> Self {
        if source.is_empty() {
            return Dictionary::default();
        }

        let total_length: usize = source.iter().map(|s| s.as_ref().len()).sum();
        let mut data: Vec<u8> = Vec::with_capacity(total_length);
        let mut offsets = IntVector::new(bits::bit_len(total_length as u64)).unwrap();
        for string in source.iter() {
            offsets.push(data.len() as u64);
            data.extend_from_slice(string.as_ref().as_bytes());
        }
        offsets.push(total_length as u64);

        let mut result = Dictionary {
            offsets,
            sorted_ids: IntVector::new(1).unwrap(),
            data,
        };
        result.sort_ids();
        result
    }

    /// Returns the number of strings.
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the bytes of the string with the given identifier.
    ///
    /// # Panics
    ///
    /// Panics if `id >= self.len()`.
    pub fn bytes(&self, id: usize) -> &[u8] {
        let start = self.offsets.get(id) as usize;
        let limit = self.offsets.get(id + 1) as usize;
        &self.data[start..limit]
    }

    /// Returns the string with the given identifier.
    ///
    /// # Panics
    ///
    /// Panics if `id >= self.len()`.
    pub fn word(&self, id: usize) -> String {
        String::from_utf8_lossy(self.bytes(id)).into_owned()
    }

    /// Returns the identifier of the given string, or `self.len()` if the
    /// string is not in the dictionary.
    pub fn find(&self, s: &str) -> usize {
        let target = s.as_bytes();
        let mut start = 0;
        let mut limit = self.len();
        while start < limit {
            let mid = start + (limit - start) / 2;
            let id = self.sorted_ids.get(mid) as usize;
            match self.bytes(id).cmp(target) {
                Ordering::Less => start = mid + 1,
                Ordering::Greater => limit = mid,
                Ordering::Equal => return id,
            }
        }
        self.len()
    }

    /// Appends the strings of another dictionary, shifting their identifiers
    /// by `self.len()` and rebuilding the lexicographic permutation.
    pub fn append(&mut self, source: &Dictionary) {
        if source.is_empty() {
            return;
        }

        let old_data_size = self.data.len();
        let old_size = self.len();
        self.data.extend_from_slice(&source.data);

        let mut new_offsets = IntVector::new(bits::bit_len(self.data.len() as u64)).unwrap();
        for i in 0..old_size {
            new_offsets.push(self.offsets.get(i));
        }
        for i in 0..=source.len() {
            new_offsets.push(old_data_size as u64 + source.offsets.get(i));
        }
        self.offsets = new_offsets;

        self.sort_ids();
    }

    // Rebuilds `sorted_ids` from scratch and checks for duplicates.
    fn sort_ids(&mut self) {
        let size = self.len();
        let mut ids: Vec<usize> = (0..size).collect();
        ids.par_sort_unstable_by(|&a, &b| self.bytes(a).cmp(self.bytes(b)));

        let width = bits::bit_len(size.saturating_sub(1) as u64);
        let mut sorted_ids = IntVector::new(width).unwrap();
        for id in ids.iter() {
            sorted_ids.push(*id as u64);
        }
        self.sorted_ids = sorted_ids;

        for pair in ids.windows(2) {
            if self.bytes(pair[0]) == self.bytes(pair[1]) {
                warn!("The dictionary contains duplicate strings");
                break;
            }
        }
    }
}

impl Serialize for Dictionary {
    fn serialize_header<T: io::Write>(&self, _: &mut T) -> io::Result<()> {
        Ok(())
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.offsets.serialize(writer)?;
        self.sorted_ids.serialize(writer)?;
        self.data.serialize(writer)?;
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let offsets = IntVector::load(reader)?;
        let sorted_ids = IntVector::load(reader)?;
        let data = Vec::<u8>::load(reader)?;
        if offsets.is_empty() || offsets.len() != sorted_ids.len() + 1 {
            return Err(Error::new(
                ErrorKind::InvalidData,
                "Dictionary: offset / id count mismatch",
            ));
        }
        if offsets.get(offsets.len() - 1) as usize != data.len() {
            return Err(Error::new(
                ErrorKind::InvalidData,
                "Dictionary: offsets do not match the data",
            ));
        }
        Ok(Dictionary {
            offsets,
            sorted_ids,
            data,
        })
    }

    fn size_in_elements(&self) -> usize {
        self.offsets.size_in_elements()
            + self.sorted_ids.size_in_elements()
            + self.data.size_in_elements()
    }
}
