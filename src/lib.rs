//! # pathbwt: the record layer of a graph BWT
//!
//! This crate implements the in-memory core of a run-length encoded BWT index
//! over a collection of paths through a bidirected sequence graph. Each node of
//! the graph owns a *record*: the BWT column listing, for every path occurrence
//! passing through the node, the successor node the path continues to. Records
//! support LF-mapping queries (unidirectional and bidirectional), which are the
//! building blocks of `find` / `locate` / `extract` over the whole index.
//!
//! The crate covers the record machinery and its supporting succinct
//! structures:
//!
//! * [`record::DynamicRecord`]: the mutable per-node column used during
//!   construction and merging.
//! * [`record::CompressedRecord`]: an immutable byte-packed view used during
//!   queries.
//! * [`record::DecompressedRecord`]: a fully expanded column for sequential
//!   scans.
//! * [`record_array::RecordArray`]: all compressed records concatenated into
//!   one byte blob, indexed by a sparse bitvector.
//! * [`samples::DASamples`]: sparse document-array samples mapping
//!   (node, offset) positions to sequence identifiers.
//! * [`dictionary::Dictionary`]: a binary-searchable string table for sample
//!   and contig names.
//! * [`metadata::Metadata`]: path / sample / contig bookkeeping with a
//!   multi-source merge protocol.
//!
//! Succinct structures and serialization come from
//! [Simple-SDS](https://github.com/jltsiren/simple-sds); everything persistent
//! implements its `Serialize` trait.
//!
//! Higher-level concerns (file transport, search drivers, construction
//! front-ends) live outside this crate.

pub mod codec;
pub mod dictionary;
pub mod merge;
pub mod metadata;
pub mod record;
pub mod record_array;
pub mod samples;
pub mod support;

/// Node identifier `0` is reserved for marking path boundaries and does not
/// exist in the graph. Its record encodes the starts of all sequences.
pub const ENDMARKER: usize = 0;
