//! Index metadata: path names and the sample / contig dictionaries.
//!
//! The metadata is optional at the index level and each of its three sections
//! is optional in turn, gated by a flag bit in the fixed header. Multi-source
//! merges concatenate the sections while renumbering sample and contig fields
//! of the appended path names.

use std::fmt;
use std::io;
use std::io::{Error, ErrorKind};

use simple_sds::serialize::{Serializable, Serialize};
use tracing::{debug, warn};

use crate::dictionary::Dictionary;

//-----------------------------------------------------------------------------

/// The structured name of one path: which sample and contig it belongs to,
/// which haplotype phase it represents, and a running count (fragment index)
/// disambiguating multiple fragments of the same haplotype.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathName {
    pub sample: u32,
    pub contig: u32,
    pub phase: u32,
    pub count: u32,
}

impl PathName {
    pub fn new(sample: u32, contig: u32, phase: u32, count: u32) -> Self {
        PathName {
            sample,
            contig,
            phase,
            count,
        }
    }
}

impl Serializable for PathName {}

//-----------------------------------------------------------------------------

/// Metadata for an entire index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    tag: usize,
    version: usize,
    sample_count: usize,
    haplotype_count: usize,
    contig_count: usize,
    flags: usize,
    path_names: Vec<PathName>,
    sample_names: Dictionary,
    contig_names: Dictionary,
}

impl Metadata {
    /// Magic number identifying serialized metadata.
    pub const TAG: usize = 0x6B37_5E7A;
    /// Current serialization version.
    pub const VERSION: usize = 2;
    /// Oldest loadable serialization version.
    pub const INITIAL_VERSION: usize = 1;

    pub const FLAG_PATH_NAMES: usize = 0x1;
    pub const FLAG_SAMPLE_NAMES: usize = 0x2;
    pub const FLAG_CONTIG_NAMES: usize = 0x4;
    /// Flags understood by [`Self::VERSION`].
    pub const FLAG_MASK: usize = 0x7;
    /// Flags understood by [`Self::INITIAL_VERSION`].
    pub const INITIAL_FLAG_MASK: usize = 0x0;

    pub fn new() -> Self {
        Metadata {
            tag: Self::TAG,
            version: Self::VERSION,
            sample_count: 0,
            haplotype_count: 0,
            contig_count: 0,
            flags: 0,
            path_names: Vec::new(),
            sample_names: Dictionary::new(),
            contig_names: Dictionary::new(),
        }
    }

    /// Returns `true` if the header is a version this implementation
    /// understands, with no unknown flag bits set.
    pub fn check(&self) -> bool {
        if self.tag != Self::TAG {
            return false;
        }
        match self.version {
            Self::VERSION => self.flags & Self::FLAG_MASK == self.flags,
            Self::INITIAL_VERSION => self.flags & Self::INITIAL_FLAG_MASK == self.flags,
            _ => false,
        }
    }

    #[inline]
    fn set_flag(&mut self, flag: usize) {
        self.flags |= flag;
    }

    #[inline]
    fn unset_flag(&mut self, flag: usize) {
        self.flags &= !flag;
    }

    #[inline]
    pub fn is_set(&self, flag: usize) -> bool {
        self.flags & flag != 0
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Metadata::new()
    }
}

// Statistics.
impl Metadata {
    #[inline]
    pub fn samples(&self) -> usize {
        self.sample_count
    }

    #[inline]
    pub fn haplotypes(&self) -> usize {
        self.haplotype_count
    }

    #[inline]
    pub fn contigs(&self) -> usize {
        self.contig_count
    }

    #[inline]
    pub fn paths(&self) -> usize {
        self.path_names.len()
    }

    #[inline]
    pub fn has_path_names(&self) -> bool {
        self.is_set(Self::FLAG_PATH_NAMES)
    }

    #[inline]
    pub fn has_sample_names(&self) -> bool {
        self.is_set(Self::FLAG_SAMPLE_NAMES)
    }

    #[inline]
    pub fn has_contig_names(&self) -> bool {
        self.is_set(Self::FLAG_CONTIG_NAMES)
    }

    /// Returns the name of path `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.paths()`.
    #[inline]
    pub fn path(&self, i: usize) -> &PathName {
        &self.path_names[i]
    }

    pub fn sample_names(&self) -> &Dictionary {
        &self.sample_names
    }

    pub fn contig_names(&self) -> &Dictionary {
        &self.contig_names
    }
}

// Setters.
impl Metadata {
    /// Sets the sample count without touching the names.
    pub fn set_samples(&mut self, n: usize) {
        if self.has_sample_names() {
            warn!("Changing the sample count without changing sample names");
        }
        self.sample_count = n;
    }

    pub fn set_haplotypes(&mut self, n: usize) {
        self.haplotype_count = n;
    }

    /// Sets the contig count without touching the names.
    pub fn set_contigs(&mut self, n: usize) {
        if self.has_contig_names() {
            warn!("Changing the contig count without changing contig names");
        }
        self.contig_count = n;
    }

    /// Sets the sample names, replacing the sample count with the name count.
    /// An empty list clears the names.
    pub fn set_sample_names<S: AsRef<str>>(&mut self, names: &[S]) {
        if names.is_empty() {
            self.clear_sample_names();
            return;
        }
        self.sample_count = names.len();
        self.set_flag(Self::FLAG_SAMPLE_NAMES);
        self.sample_names = Dictionary::from_strings(names);
    }

    pub fn clear_sample_names(&mut self) {
        self.unset_flag(Self::FLAG_SAMPLE_NAMES);
        self.sample_names = Dictionary::new();
    }

    /// Sets the contig names, replacing the contig count with the name count.
    /// An empty list clears the names.
    pub fn set_contig_names<S: AsRef<str>>(&mut self, names: &[S]) {
        if names.is_empty() {
            self.clear_contig_names();
            return;
        }
        self.contig_count = names.len();
        self.set_flag(Self::FLAG_CONTIG_NAMES);
        self.contig_names = Dictionary::from_strings(names);
    }

    pub fn clear_contig_names(&mut self) {
        self.unset_flag(Self::FLAG_CONTIG_NAMES);
        self.contig_names = Dictionary::new();
    }

    pub fn add_path(&mut self, path: PathName) {
        self.set_flag(Self::FLAG_PATH_NAMES);
        self.path_names.push(path);
    }

    pub fn clear_path_names(&mut self) {
        self.unset_flag(Self::FLAG_PATH_NAMES);
        self.path_names = Vec::new();
    }
}

// Path queries.
impl Metadata {
    /// Returns the identifiers of the paths with the given sample and contig.
    pub fn find_paths(&self, sample_id: usize, contig_id: usize) -> Vec<usize> {
        let mut result = Vec::new();
        for (i, path) in self.path_names.iter().enumerate() {
            if path.sample as usize == sample_id && path.contig as usize == contig_id {
                result.push(i);
            }
        }
        result
    }

    /// Returns the identifiers of the paths with the given sample.
    pub fn paths_for_sample(&self, sample_id: usize) -> Vec<usize> {
        let mut result = Vec::new();
        for (i, path) in self.path_names.iter().enumerate() {
            if path.sample as usize == sample_id {
                result.push(i);
            }
        }
        result
    }

    /// Returns the identifiers of the paths with the given contig.
    pub fn paths_for_contig(&self, contig_id: usize) -> Vec<usize> {
        let mut result = Vec::new();
        for (i, path) in self.path_names.iter().enumerate() {
            if path.contig as usize == contig_id {
                result.push(i);
            }
        }
        result
    }
}

// Merging.
impl Metadata {
    /// Merges the metadata of another index into this one.
    ///
    /// With `same_samples`, both indexes are assumed to cover the same
    /// samples: counts stay, and names are adopted from the source when only
    /// it has them. Otherwise sample and haplotype counts add up and the
    /// source's names are appended, or all names are dropped when the source
    /// has none. `same_contigs` works the same way for contigs. Appended path
    /// names have their sample and contig fields shifted past this index's
    /// counts.
    pub fn merge(&mut self, source: &Metadata, same_samples: bool, same_contigs: bool) {
        let mut source_sample_offset = 0;
        let mut source_contig_offset = 0;

        // Samples and haplotypes.
        if same_samples {
            if self.samples() != source.samples() || self.haplotypes() != source.haplotypes() {
                warn!("Sample/haplotype counts do not match");
            }
            if !self.has_sample_names() && source.has_sample_names() {
                debug!("Taking sample names from the source");
                self.sample_names = source.sample_names.clone();
                self.set_flag(Self::FLAG_SAMPLE_NAMES);
            }
        } else {
            source_sample_offset = self.samples();
            self.sample_count += source.samples();
            self.haplotype_count += source.haplotypes();
            if self.has_sample_names() {
                if source.has_sample_names() {
                    self.sample_names.append(&source.sample_names);
                } else {
                    debug!("Clearing sample names: the source has no sample names");
                    self.clear_sample_names();
                }
            }
        }

        // Contigs.
        if same_contigs {
            if self.contigs() != source.contigs() {
                warn!("Contig counts do not match");
            }
            if !self.has_contig_names() && source.has_contig_names() {
                debug!("Taking contig names from the source");
                self.contig_names = source.contig_names.clone();
                self.set_flag(Self::FLAG_CONTIG_NAMES);
            }
        } else {
            source_contig_offset = self.contigs();
            self.contig_count += source.contigs();
            if self.has_contig_names() {
                if source.has_contig_names() {
                    self.contig_names.append(&source.contig_names);
                } else {
                    debug!("Clearing contig names: the source has no contig names");
                    self.clear_contig_names();
                }
            }
        }

        // Paths.
        if self.has_path_names() {
            if source.has_path_names() {
                let offset = self.paths();
                self.path_names.extend_from_slice(&source.path_names);
                for path in self.path_names[offset..].iter_mut() {
                    path.sample += source_sample_offset as u32;
                    path.contig += source_contig_offset as u32;
                }
            } else {
                debug!("Clearing path names: the source has no path names");
                self.clear_path_names();
            }
        }
    }

    /// Merges multiple sources in order.
    pub fn merge_all(&mut self, sources: &[&Metadata], same_samples: bool, same_contigs: bool) {
        for source in sources.iter() {
            self.merge(source, same_samples, same_contigs);
        }
    }
}

impl Serialize for Metadata {
    fn serialize_header<T: io::Write>(&self, _: &mut T) -> io::Result<()> {
        Ok(())
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.tag.serialize(writer)?;
        self.version.serialize(writer)?;
        self.sample_count.serialize(writer)?;
        self.haplotype_count.serialize(writer)?;
        self.contig_count.serialize(writer)?;
        self.flags.serialize(writer)?;

        if self.has_path_names() {
            self.path_names.serialize(writer)?;
        }
        if self.has_sample_names() {
            self.sample_names.serialize(writer)?;
        }
        if self.has_contig_names() {
            self.contig_names.serialize(writer)?;
        }
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let mut result = Metadata::new();
        result.tag = usize::load(reader)?;
        result.version = usize::load(reader)?;
        result.sample_count = usize::load(reader)?;
        result.haplotype_count = usize::load(reader)?;
        result.contig_count = usize::load(reader)?;
        result.flags = usize::load(reader)?;
        if !result.check() {
            return Err(Error::new(
                ErrorKind::InvalidData,
                "Metadata: invalid tag, version, or flags",
            ));
        }

        if result.has_path_names() {
            result.path_names = Vec::<PathName>::load(reader)?;
        }
        if result.has_sample_names() {
            result.sample_names = Dictionary::load(reader)?;
        }
        if result.has_contig_names() {
            result.contig_names = Dictionary::load(reader)?;
        }
        Ok(result)
    }

    fn size_in_elements(&self) -> usize {
        let mut result = 6 * self.tag.size_in_elements();
        if self.has_path_names() {
            result += self.path_names.size_in_elements();
        }
        if self.has_sample_names() {
            result += self.sample_names.size_in_elements();
        }
        if self.has_contig_names() {
            result += self.contig_names.size_in_elements();
        }
        result
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_path_names() {
            write!(f, "{} paths with names, ", self.paths())?;
        }
        write!(f, "{} samples", self.samples())?;
        if self.has_sample_names() {
            write!(f, " with names")?;
        }
        write!(f, ", {} haplotypes, ", self.haplotypes())?;
        write!(f, "{} contigs", self.contigs())?;
        if self.has_contig_names() {
            write!(f, " with names")?;
        }
        Ok(())
    }
}
