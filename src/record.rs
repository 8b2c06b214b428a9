//! Per-node BWT records in three shapes.
//!
//! A record is the BWT column of one node: for every path occurrence passing
//! through the node, the successor node the path continues to, in stable order
//! over the occurrences. Successors are stored as ranks into the node's sorted
//! outgoing edge list, and stretches of equal ranks are run-length encoded.
//!
//! * [`DynamicRecord`] is the mutable shape used while building or merging an
//!   index.
//! * [`CompressedRecord`] is a read-only view over a byte range of a
//!   [`crate::record_array::RecordArray`]; it borrows the bytes and must not
//!   outlive the array.
//! * [`DecompressedRecord`] expands the runs into explicit positions for
//!   sequential scanning.
//!
//! All three shapes answer the same LF queries with identical results, so
//! algorithms can be written against whichever shape is at hand.

use std::fmt;
use std::ops::Range;

use crate::codec::{ByteCode, ByteCodeIter, RunEncoder, RunIter};
use crate::support::{self, Pos, Run, Sample};
use crate::ENDMARKER;

//-----------------------------------------------------------------------------

/// Records with at most this many outgoing edges answer LF queries over a
/// stack-resident cumulative array instead of a heap allocation.
pub const MAX_OUTDEGREE_FOR_ARRAY: usize = 4;

// Binary search for the rank of the edge to `to` in a sorted outgoing list.
fn find_edge(outgoing: &[(usize, usize)], to: usize) -> Option<usize> {
    let mut low = 0;
    let mut high = outgoing.len();
    while low < high {
        let mid = low + (high - low) / 2;
        if outgoing[mid].0 == to {
            return Some(mid);
        }
        if outgoing[mid].0 > to {
            high = mid;
        } else {
            low = mid + 1;
        }
    }
    None
}

// Walks the runs while accumulating per-rank cumulative offsets into `edges`
// (pre-seeded from the outgoing list) and stops inside the run containing
// position `i`. Returns the mapped position and the last offset of that run.
// The caller guarantees `i` is within the record.
fn lf_loop<I: Iterator<Item = Run>>(edges: &mut [Pos], runs: I, i: usize) -> (Pos, usize) {
    let mut last = 0;
    let mut offset = 0;
    for run in runs {
        last = run.value;
        edges[run.value].offset += run.len;
        offset += run.len;
        if offset > i {
            break;
        }
    }
    let mut result = edges[last];
    result.offset -= offset - i;
    (result, offset - 1)
}

// Resolves the reverse rank used by the bidirectional queries.
//
// Counting positions whose reversed successor precedes `flip_node(to)` splits
// into three cases:
// 1. no edge to `flip_node(to)`: count ranks strictly below `outrank`;
// 2. the edge exists and `to` is forward: count ranks up to and including
//    the reverse rank, then remove the occurrences of `outrank` itself;
// 3. the edge exists and `to` is reverse: count ranks strictly below the
//    reverse rank, which precedes `outrank` in the sorted outgoing list.
//
// Returns the exclusive rank bound and whether the `outrank` occurrences must
// be subtracted afterwards.
fn reverse_bound(outgoing: &[(usize, usize)], to: usize, outrank: usize) -> (usize, bool) {
    match find_edge(outgoing, support::flip_node(to)) {
        None => (outrank, false),
        Some(reverse_rank) => {
            if support::is_reverse(to) {
                (reverse_rank, false)
            } else {
                (reverse_rank + 1, true)
            }
        }
    }
}

//-----------------------------------------------------------------------------

/// The mutable per-node record used during construction and merging.
///
/// All fields are public: a record is built by the owner pushing edges, runs,
/// and samples directly, the way the construction algorithms do. The fields
/// must satisfy the invariants stated on each of them before queries are
/// answered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DynamicRecord {
    /// Sum of the run lengths in `body`.
    pub body_size: usize,
    /// Incoming edges as (predecessor node, occurrence count), sorted by node.
    pub incoming: Vec<(usize, usize)>,
    /// Outgoing edges as (successor node, BWT offset in the successor where
    /// this node's occurrences begin), sorted by node.
    pub outgoing: Vec<(usize, usize)>,
    /// The BWT column as runs over outgoing ranks. Consecutive runs with the
    /// same rank may appear after concatenating records; they are equivalent
    /// to a single merged run.
    pub body: Vec<Run>,
    /// Document-array samples sorted by offset, offsets unique and within
    /// `[0, body_size)`.
    pub ids: Vec<Sample>,
}

impl DynamicRecord {
    pub fn new() -> Self {
        DynamicRecord::default()
    }

    /// Returns the number of BWT positions in the record.
    #[inline]
    pub fn len(&self) -> usize {
        self.body_size
    }

    /// Returns `true` if the record has no outgoing edges.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty()
    }

    /// Returns the number of physical runs in the body.
    #[inline]
    pub fn runs(&self) -> usize {
        self.body.len()
    }

    /// Returns the number of stored samples.
    #[inline]
    pub fn samples(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn outdegree(&self) -> usize {
        self.outgoing.len()
    }

    #[inline]
    pub fn indegree(&self) -> usize {
        self.incoming.len()
    }

    /// Returns the successor node of outgoing rank `rank`.
    #[inline]
    pub fn successor(&self, rank: usize) -> usize {
        self.outgoing[rank].0
    }

    /// Returns the BWT offset in the successor of rank `rank`.
    #[inline]
    pub fn offset(&self, rank: usize) -> usize {
        self.outgoing[rank].1
    }

    /// Returns the predecessor node of incoming rank `rank`.
    #[inline]
    pub fn predecessor(&self, rank: usize) -> usize {
        self.incoming[rank].0
    }

    /// Returns the occurrence count of incoming rank `rank`.
    #[inline]
    pub fn count(&self, rank: usize) -> usize {
        self.incoming[rank].1
    }
}

// Edge lookups.
impl DynamicRecord {
    /// Returns `true` if there is an edge to the given node.
    pub fn has_edge(&self, to: usize) -> bool {
        self.outgoing.iter().any(|edge| edge.0 == to)
    }

    /// Returns the rank of the edge to `to` by binary search.
    ///
    /// Requires `outgoing` to be sorted; use [`Self::edge_to_linear`] before
    /// the record has been recoded.
    pub fn edge_to(&self, to: usize) -> Option<usize> {
        find_edge(&self.outgoing, to)
    }

    /// Returns the rank of the edge to `to` by linear scan.
    pub fn edge_to_linear(&self, to: usize) -> Option<usize> {
        self.outgoing.iter().position(|edge| edge.0 == to)
    }
}

// Construction-time mutation.
impl DynamicRecord {
    /// Restores the sorted-outgoing invariant after edges were appended out of
    /// order, recoding the body ranks against the new order.
    ///
    /// Adjacent runs that end up with the same rank are left unmerged.
    pub fn recode(&mut self) {
        if self.is_empty() {
            return;
        }
        if self.outgoing.windows(2).all(|pair| pair[0].0 <= pair[1].0) {
            return;
        }

        for run in self.body.iter_mut() {
            run.value = self.outgoing[run.value].0;
        }
        self.outgoing.sort_unstable();
        let outgoing = &self.outgoing;
        for run in self.body.iter_mut() {
            run.value = find_edge(outgoing, run.value).unwrap();
        }
    }

    /// Removes outgoing edges that no body run refers to, preserving the
    /// order of the remaining edges and recoding the body against them.
    pub fn remove_unused_edges(&mut self) {
        let mut used = vec![false; self.outdegree()];
        for run in self.body.iter_mut() {
            used[run.value] = true;
            run.value = self.outgoing[run.value].0;
        }

        let mut tail = 0;
        for rank in 0..self.outgoing.len() {
            self.outgoing[tail] = self.outgoing[rank];
            if used[rank] {
                tail += 1;
            }
        }
        self.outgoing.truncate(tail);

        let outgoing = &self.outgoing;
        for run in self.body.iter_mut() {
            run.value = find_edge(outgoing, run.value).unwrap();
        }
    }

    /// Appends the byte encoding of the record: the outdegree, the
    /// delta-coded (successor, offset) pairs, and the run-encoded body.
    pub fn write_bwt(&self, data: &mut Vec<u8>) {
        ByteCode::write(data, self.outdegree());
        let mut prev = 0;
        for (node, offset) in self.outgoing.iter() {
            ByteCode::write(data, node - prev);
            prev = *node;
            ByteCode::write(data, *offset);
        }
        if self.outdegree() > 0 {
            let encoder = RunEncoder::new(self.outdegree());
            for run in self.body.iter() {
                encoder.write(data, *run);
            }
        }
    }

    /// Records one more occurrence of the edge from `from`, inserting the
    /// incoming edge if it is new.
    pub fn increment(&mut self, from: usize) {
        for edge in self.incoming.iter_mut() {
            if edge.0 == from {
                edge.1 += 1;
                return;
            }
        }
        self.add_incoming((from, 1));
    }

    /// Adds an incoming edge, keeping the list sorted by predecessor.
    pub fn add_incoming(&mut self, edge: (usize, usize)) {
        self.incoming.push(edge);
        self.incoming.sort_unstable();
    }
}

// Incoming-edge statistics.
impl DynamicRecord {
    /// Returns the total count of incoming edges from nodes before `from`.
    pub fn count_before(&self, from: usize) -> usize {
        self.incoming
            .iter()
            .take_while(|edge| edge.0 < from)
            .map(|edge| edge.1)
            .sum()
    }

    /// Returns the total count of incoming edges from nodes up to and
    /// including `from`.
    pub fn count_until(&self, from: usize) -> usize {
        self.incoming
            .iter()
            .take_while(|edge| edge.0 <= from)
            .map(|edge| edge.1)
            .sum()
    }
}

// Queries.
impl DynamicRecord {
    /// Maps BWT position `i` to the corresponding position in the successor.
    ///
    /// The successor may be the endmarker. Returns [`None`] only when `i` is
    /// out of range.
    pub fn lf(&self, i: usize) -> Option<Pos> {
        self.run_lf(i).map(|(pos, _)| pos)
    }

    /// As [`Self::lf`], also returning the last position of the run that
    /// contains `i`.
    pub fn run_lf(&self, i: usize) -> Option<(Pos, usize)> {
        if i >= self.len() {
            return None;
        }
        let runs = self.body.iter().copied();
        if self.outdegree() <= MAX_OUTDEGREE_FOR_ARRAY {
            let mut edges = [Pos::default(); MAX_OUTDEGREE_FOR_ARRAY];
            for (rank, edge) in self.outgoing.iter().enumerate() {
                edges[rank] = Pos::new(edge.0, edge.1);
            }
            Some(lf_loop(&mut edges, runs, i))
        } else {
            let mut edges: Vec<Pos> = self
                .outgoing
                .iter()
                .map(|edge| Pos::new(edge.0, edge.1))
                .collect();
            Some(lf_loop(&mut edges, runs, i))
        }
    }

    /// Returns the offset in node `to` that position `i` maps to, if there is
    /// an edge to `to`.
    pub fn lf_to(&self, i: usize, to: usize) -> Option<usize> {
        let outrank = self.edge_to(to)?;
        let mut offset = 0;
        let mut result = self.offset(outrank);
        let mut last = Run::new(0, 0);
        for run in self.body.iter() {
            if offset >= i {
                break;
            }
            last = *run;
            offset += run.len;
            if run.value == outrank {
                result += run.len;
            }
        }
        if last.value == outrank && offset > i {
            result -= offset - i;
        }
        Some(result)
    }

    /// Maps all positions in the half-open range to node `to`.
    ///
    /// Returns the range of mapped positions in `to`, or [`None`] if the range
    /// is empty or no position maps there.
    pub fn follow(&self, range: &Range<usize>, to: usize) -> Option<Range<usize>> {
        if range.is_empty() {
            return None;
        }
        let outrank = self.edge_to(to)?;

        let mut runs = self.body.iter();
        let mut run = Run::new(0, 0);
        let mut offset = 0;
        let mut result = self.offset(outrank);
        let mut rank_at = |i: usize| {
            while offset < i {
                match runs.next() {
                    Some(next) => {
                        run = *next;
                        offset += next.len;
                        if next.value == outrank {
                            result += next.len;
                        }
                    }
                    None => break,
                }
            }
            if run.value == outrank && offset > i {
                result - (offset - i)
            } else {
                result
            }
        };

        let start = rank_at(range.start);
        let end = rank_at(range.end);
        if start < end {
            Some(start..end)
        } else {
            None
        }
    }

    /// Bidirectional version of [`Self::follow`].
    ///
    /// The second return value is the number of positions in the query range
    /// whose successor, reversed, is strictly less than `flip_node(to)`. It is
    /// the amount by which the reverse range of a bidirectional search moves.
    pub fn bd_follow(&self, range: &Range<usize>, to: usize) -> Option<(Range<usize>, usize)> {
        if range.is_empty() {
            return None;
        }
        let outrank = self.edge_to(to)?;
        let (reverse_rank, subtract_equal) = reverse_bound(&self.outgoing, to, outrank);

        // Scan to the run containing range.start.
        let mut runs = self.body.iter();
        let mut run = Run::new(0, 0);
        let mut offset = 0;
        let mut result = self.offset(outrank);
        while offset < range.start {
            match runs.next() {
                Some(next) => {
                    run = *next;
                    offset += next.len;
                    if next.value == outrank {
                        result += next.len;
                    }
                }
                None => break,
            }
        }
        let sp = if run.value == outrank && offset > range.start {
            result - (offset - range.start)
        } else {
            result
        };

        // The run containing range.start may reach into the range.
        let overshoot = offset.saturating_sub(range.start);
        let mut equal = if run.value == outrank { overshoot } else { 0 };
        let mut reverse_offset = if run.value < reverse_rank { overshoot } else { 0 };

        while offset < range.end {
            match runs.next() {
                Some(next) => {
                    run = *next;
                    offset += next.len;
                    if next.value == outrank {
                        equal += next.len;
                    }
                    if next.value < reverse_rank {
                        reverse_offset += next.len;
                    }
                }
                None => break,
            }
        }

        // The last run may reach past the range.
        if offset > range.end {
            if run.value == outrank {
                equal -= offset - range.end;
            }
            if run.value < reverse_rank {
                reverse_offset -= offset - range.end;
            }
        }
        if subtract_equal {
            reverse_offset -= equal;
        }

        if equal == 0 {
            return None;
        }
        Some((sp..sp + equal, reverse_offset))
    }

    /// Returns the successor node at position `i`, or the endmarker if `i` is
    /// out of range.
    pub fn node_at(&self, i: usize) -> usize {
        let mut offset = 0;
        for run in self.body.iter() {
            offset += run.len;
            if offset > i {
                return self.successor(run.value);
            }
        }
        ENDMARKER
    }

    /// Returns the first sample at offset `i` or later.
    pub fn next_sample(&self, i: usize) -> Option<Sample> {
        self.ids.iter().find(|sample| sample.0 >= i).copied()
    }
}

impl fmt::Display for DynamicRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(size {}, {} runs, indegree {}, outdegree {}, incoming = {:?}, outgoing = {:?}, body = {:?}, ids = {:?})",
            self.len(),
            self.runs(),
            self.indegree(),
            self.outdegree(),
            self.incoming,
            self.outgoing,
            self.body,
            self.ids
        )
    }
}

//-----------------------------------------------------------------------------

/// An immutable record over a byte slice of a record array.
///
/// The outgoing edges are decoded eagerly; the body stays byte-packed and is
/// borrowed from the array, so the view must not outlive it. Queries mirror
/// [`DynamicRecord`] exactly.
#[derive(Clone, Debug)]
pub struct CompressedRecord<'a> {
    outgoing: Vec<(usize, usize)>,
    body: &'a [u8],
}

impl<'a> CompressedRecord<'a> {
    /// Decodes the record occupying `data[start..limit]`.
    pub fn new(data: &'a [u8], start: usize, limit: usize) -> Self {
        let mut iter = ByteCodeIter::with_pos(data, start);
        let sigma = iter.next().unwrap_or(0);
        let mut outgoing = Vec::with_capacity(sigma);
        let mut prev = 0;
        for _ in 0..sigma {
            let node = iter.next().unwrap_or(0) + prev;
            prev = node;
            let offset = iter.next().unwrap_or(0);
            outgoing.push((node, offset));
        }
        CompressedRecord {
            outgoing,
            body: &data[iter.offset()..limit],
        }
    }

    /// Returns `true` if the record starting at `start` is empty.
    pub fn is_empty_record(data: &[u8], start: usize) -> bool {
        ByteCodeIter::with_pos(data, start).next().unwrap_or(0) == 0
    }

    /// Returns the number of BWT positions in the record. Linear in the
    /// number of runs.
    pub fn len(&self) -> usize {
        let mut result = 0;
        if self.outdegree() > 0 {
            for run in RunIter::new(self.body, self.outdegree()) {
                result += run.len;
            }
        }
        result
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty()
    }

    /// Returns the number of physical runs in the body. Linear.
    pub fn runs(&self) -> usize {
        if self.outdegree() == 0 {
            return 0;
        }
        RunIter::new(self.body, self.outdegree()).count()
    }

    #[inline]
    pub fn outdegree(&self) -> usize {
        self.outgoing.len()
    }

    /// Returns the successor node of outgoing rank `rank`.
    #[inline]
    pub fn successor(&self, rank: usize) -> usize {
        self.outgoing[rank].0
    }

    /// Returns the BWT offset in the successor of rank `rank`.
    #[inline]
    pub fn offset(&self, rank: usize) -> usize {
        self.outgoing[rank].1
    }

    /// Returns the decoded outgoing edges.
    #[inline]
    pub fn outgoing(&self) -> &[(usize, usize)] {
        &self.outgoing
    }

    /// Returns the encoded body bytes.
    #[inline]
    pub fn body(&self) -> &'a [u8] {
        self.body
    }

    pub fn has_edge(&self, to: usize) -> bool {
        self.outgoing.iter().any(|edge| edge.0 == to)
    }

    /// Returns the rank of the edge to `to` by binary search.
    pub fn edge_to(&self, to: usize) -> Option<usize> {
        find_edge(&self.outgoing, to)
    }

    /// Maps BWT position `i` to the corresponding position in the successor.
    pub fn lf(&self, i: usize) -> Option<Pos> {
        self.run_lf(i).map(|(pos, _)| pos)
    }

    /// As [`Self::lf`], also returning the last position of the run that
    /// contains `i`.
    pub fn run_lf(&self, i: usize) -> Option<(Pos, usize)> {
        if self.outdegree() == 0 {
            return None;
        }
        if self.outdegree() <= MAX_OUTDEGREE_FOR_ARRAY {
            let mut iter = ArrayReader::new(self);
            let result = iter.edge_at(i)?;
            Some((result, iter.offset() - 1))
        } else {
            let mut iter = FullReader::new(self);
            let result = iter.edge_at(i)?;
            Some((result, iter.offset() - 1))
        }
    }

    /// Returns the offset in node `to` that position `i` maps to.
    pub fn lf_to(&self, i: usize, to: usize) -> Option<usize> {
        let outrank = self.edge_to(to)?;
        let mut iter = RankReader::new(self, outrank);
        Some(iter.rank_at(i))
    }

    /// Maps all positions in the half-open range to node `to`.
    pub fn follow(&self, range: &Range<usize>, to: usize) -> Option<Range<usize>> {
        if range.is_empty() {
            return None;
        }
        let outrank = self.edge_to(to)?;
        let mut iter = RankReader::new(self, outrank);
        let start = iter.rank_at(range.start);
        let end = iter.rank_at(range.end);
        if start < end {
            Some(start..end)
        } else {
            None
        }
    }

    /// Bidirectional version of [`Self::follow`]; see
    /// [`DynamicRecord::bd_follow`] for the reverse offset contract.
    pub fn bd_follow(&self, range: &Range<usize>, to: usize) -> Option<(Range<usize>, usize)> {
        if range.is_empty() {
            return None;
        }
        let outrank = self.edge_to(to)?;
        let (reverse_rank, _) = reverse_bound(&self.outgoing, to, outrank);
        // Occurrences of outrank are excluded inline instead of subtracting
        // them at the end.
        let counted = |run: Run| run.value < reverse_rank && run.value != outrank;

        let mut iter = RankReader::new(self, outrank);
        let sp = iter.rank_at(range.start);

        // The run containing range.start may reach into the range.
        let mut reverse_offset = if counted(iter.run()) {
            iter.offset().saturating_sub(range.start)
        } else {
            0
        };

        while !iter.end() && iter.offset() < range.end {
            iter.advance();
            if counted(iter.run()) {
                reverse_offset += iter.run().len;
            }
        }

        // The last run may reach past the range.
        if counted(iter.run()) && iter.offset() > range.end {
            reverse_offset -= iter.offset() - range.end;
        }

        let ep = iter.rank_at(range.end);
        if sp < ep {
            Some((sp..ep, reverse_offset))
        } else {
            None
        }
    }

    /// Returns the successor node at position `i`, or the endmarker if `i` is
    /// out of range.
    pub fn node_at(&self, i: usize) -> usize {
        if self.outdegree() == 0 {
            return ENDMARKER;
        }
        let mut offset = 0;
        for run in RunIter::new(self.body, self.outdegree()) {
            offset += run.len;
            if offset > i {
                return self.successor(run.value);
            }
        }
        ENDMARKER
    }
}

//-----------------------------------------------------------------------------

/// Plain run iterator over a compressed record body.
///
/// After construction the reader is positioned at the first run;
/// [`RunReader::offset`] is the end offset of the current run in BWT
/// coordinates. [`RunReader::advance`] past the last run sets the end flag and
/// leaves the last run in place.
#[derive(Clone, Debug)]
pub struct RunReader<'a> {
    iter: RunIter<'a>,
    run: Run,
    limit: usize,
    at_end: bool,
}

impl<'a> RunReader<'a> {
    pub fn new(record: &CompressedRecord<'a>) -> Self {
        let mut reader = RunReader {
            iter: RunIter::new(record.body, record.outdegree()),
            run: Run::new(0, 0),
            limit: 0,
            at_end: false,
        };
        reader.advance();
        reader
    }

    #[inline]
    pub fn end(&self) -> bool {
        self.at_end
    }

    /// Returns the current run.
    #[inline]
    pub fn run(&self) -> Run {
        self.run
    }

    /// Returns the end offset of the current run.
    #[inline]
    pub fn offset(&self) -> usize {
        self.limit
    }

    pub fn advance(&mut self) {
        match self.iter.next() {
            Some(run) => {
                self.run = run;
                self.limit += run.len;
            }
            None => self.at_end = true,
        }
    }
}

/// Run iterator that maintains an inline cumulative edge array. Only valid
/// for records with `outdegree <= MAX_OUTDEGREE_FOR_ARRAY`.
#[derive(Clone, Debug)]
pub struct ArrayReader<'a> {
    iter: RunIter<'a>,
    run: Run,
    limit: usize,
    at_end: bool,
    edges: [Pos; MAX_OUTDEGREE_FOR_ARRAY],
}

impl<'a> ArrayReader<'a> {
    pub fn new(record: &CompressedRecord<'a>) -> Self {
        debug_assert!(record.outdegree() <= MAX_OUTDEGREE_FOR_ARRAY);
        let mut edges = [Pos::default(); MAX_OUTDEGREE_FOR_ARRAY];
        for (rank, edge) in record.outgoing.iter().enumerate() {
            edges[rank] = Pos::new(edge.0, edge.1);
        }
        let mut reader = ArrayReader {
            iter: RunIter::new(record.body, record.outdegree()),
            run: Run::new(0, 0),
            limit: 0,
            at_end: false,
            edges,
        };
        reader.advance();
        reader
    }

    #[inline]
    pub fn end(&self) -> bool {
        self.at_end
    }

    #[inline]
    pub fn run(&self) -> Run {
        self.run
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.limit
    }

    pub fn advance(&mut self) {
        match self.iter.next() {
            Some(run) => {
                self.run = run;
                self.limit += run.len;
                self.edges[run.value].offset += run.len;
            }
            None => self.at_end = true,
        }
    }

    /// Advances to the run containing position `i` and returns the mapped
    /// position, or [`None`] if `i` is out of range.
    pub fn edge_at(&mut self, i: usize) -> Option<Pos> {
        while !self.end() && self.offset() <= i {
            self.advance();
        }
        if self.offset() <= i {
            return None;
        }
        let mut result = self.edges[self.run.value];
        result.offset -= self.offset() - i;
        Some(result)
    }
}

/// As [`ArrayReader`], with the cumulative edge array on the heap.
#[derive(Clone, Debug)]
pub struct FullReader<'a> {
    iter: RunIter<'a>,
    run: Run,
    limit: usize,
    at_end: bool,
    edges: Vec<Pos>,
}

impl<'a> FullReader<'a> {
    pub fn new(record: &CompressedRecord<'a>) -> Self {
        let edges = record
            .outgoing
            .iter()
            .map(|edge| Pos::new(edge.0, edge.1))
            .collect();
        let mut reader = FullReader {
            iter: RunIter::new(record.body, record.outdegree()),
            run: Run::new(0, 0),
            limit: 0,
            at_end: false,
            edges,
        };
        reader.advance();
        reader
    }

    #[inline]
    pub fn end(&self) -> bool {
        self.at_end
    }

    #[inline]
    pub fn run(&self) -> Run {
        self.run
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.limit
    }

    pub fn advance(&mut self) {
        match self.iter.next() {
            Some(run) => {
                self.run = run;
                self.limit += run.len;
                self.edges[run.value].offset += run.len;
            }
            None => self.at_end = true,
        }
    }

    /// Advances to the run containing position `i` and returns the mapped
    /// position, or [`None`] if `i` is out of range.
    pub fn edge_at(&mut self, i: usize) -> Option<Pos> {
        while !self.end() && self.offset() <= i {
            self.advance();
        }
        if self.offset() <= i {
            return None;
        }
        let mut result = self.edges[self.run.value];
        result.offset -= self.offset() - i;
        Some(result)
    }
}

/// Run iterator bound to one outgoing rank, tracking the cumulative number of
/// its occurrences on top of the rank's base offset.
#[derive(Clone, Debug)]
pub struct RankReader<'a> {
    iter: RunIter<'a>,
    run: Run,
    limit: usize,
    at_end: bool,
    outrank: usize,
    result: usize,
}

impl<'a> RankReader<'a> {
    pub fn new(record: &CompressedRecord<'a>, outrank: usize) -> Self {
        let mut reader = RankReader {
            iter: RunIter::new(record.body, record.outdegree()),
            run: Run::new(0, 0),
            limit: 0,
            at_end: false,
            outrank,
            result: record.offset(outrank),
        };
        reader.advance();
        reader
    }

    #[inline]
    pub fn end(&self) -> bool {
        self.at_end
    }

    #[inline]
    pub fn run(&self) -> Run {
        self.run
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.limit
    }

    pub fn advance(&mut self) {
        match self.iter.next() {
            Some(run) => {
                self.run = run;
                self.limit += run.len;
                if run.value == self.outrank {
                    self.result += run.len;
                }
            }
            None => self.at_end = true,
        }
    }

    /// Returns the offset in the bound successor that position `i` maps to.
    ///
    /// Positions must be queried in nondecreasing order on one reader.
    pub fn rank_at(&mut self, i: usize) -> usize {
        while !self.end() && self.offset() < i {
            self.advance();
        }
        if self.run.value == self.outrank && self.offset() > i {
            self.result - (self.offset() - i)
        } else {
            self.result
        }
    }
}

//-----------------------------------------------------------------------------

/// A record expanded into explicit positions, one per BWT offset.
///
/// Useful for sequential scans where decoding runs repeatedly would dominate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecompressedRecord {
    /// The outgoing edges of the source record.
    pub outgoing: Vec<(usize, usize)>,
    /// Per-successor cursors holding the next unassigned offset in each
    /// successor; advanced during expansion.
    pub after: Vec<(usize, usize)>,
    /// The expanded body: the position in the successor for every offset.
    pub body: Vec<Pos>,
}

impl From<&DynamicRecord> for DecompressedRecord {
    fn from(source: &DynamicRecord) -> Self {
        let mut result = DecompressedRecord {
            outgoing: source.outgoing.clone(),
            after: source.outgoing.clone(),
            body: Vec::with_capacity(source.len()),
        };
        for run in source.body.iter() {
            for _ in 0..run.len {
                let edge = result.after[run.value];
                result.body.push(Pos::new(edge.0, edge.1));
                result.after[run.value].1 += 1;
            }
        }
        result
    }
}

impl From<&CompressedRecord<'_>> for DecompressedRecord {
    fn from(source: &CompressedRecord<'_>) -> Self {
        let mut result = DecompressedRecord {
            outgoing: source.outgoing.clone(),
            after: source.outgoing.clone(),
            body: Vec::new(),
        };
        if source.outdegree() == 0 {
            return result;
        }
        for run in RunIter::new(source.body, source.outdegree()) {
            for _ in 0..run.len {
                let edge = result.after[run.value];
                result.body.push(Pos::new(edge.0, edge.1));
                result.after[run.value].1 += 1;
            }
        }
        result
    }
}

impl DecompressedRecord {
    #[inline]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Returns the number of logical runs: maximal stretches of equal
    /// successors. Unlike the run-length encoded shapes, adjacent equal-symbol
    /// runs are counted once here.
    pub fn runs(&self) -> usize {
        let mut result = 0;
        let mut prev = None;
        for pos in self.body.iter() {
            if Some(pos.node) != prev {
                result += 1;
                prev = Some(pos.node);
            }
        }
        result
    }

    #[inline]
    pub fn outdegree(&self) -> usize {
        self.outgoing.len()
    }

    /// Returns the successor node of outgoing rank `rank`.
    #[inline]
    pub fn successor(&self, rank: usize) -> usize {
        self.outgoing[rank].0
    }

    /// Returns the BWT offset in the successor of rank `rank`.
    #[inline]
    pub fn offset(&self, rank: usize) -> usize {
        self.outgoing[rank].1
    }

    pub fn has_edge(&self, to: usize) -> bool {
        self.outgoing.iter().any(|edge| edge.0 == to)
    }

    /// Maps BWT position `i` to the corresponding position in the successor.
    pub fn lf(&self, i: usize) -> Option<Pos> {
        self.body.get(i).copied()
    }

    /// As [`Self::lf`], also returning the last position of the run that
    /// contains `i`.
    pub fn run_lf(&self, i: usize) -> Option<(Pos, usize)> {
        if i >= self.len() {
            return None;
        }
        let mut run_end = i;
        while run_end + 1 < self.len() && self.body[run_end + 1].node == self.body[i].node {
            run_end += 1;
        }
        Some((self.body[i], run_end))
    }

    /// Returns the successor node at position `i`, or the endmarker if `i` is
    /// out of range.
    pub fn node_at(&self, i: usize) -> usize {
        self.body.get(i).map_or(ENDMARKER, |pos| pos.node)
    }
}
