//! Candidate data model shared by the scanner, the end-finder, and the
//! exporter.

use serde::{Deserialize, Serialize};

/// A hypothesized function: a start address discovered by the reference
/// scan, and an end address once (if) the boundary heuristic resolves one.
///
/// `end` is written at most once, by the end-finder. A candidate whose `end`
/// stays `None` is simply not exported; that is a normal outcome, not an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Candidate {
    pub start: u64,
    pub end: Option<u64>,
}

impl Candidate {
    pub fn new(start: u64) -> Self {
        Self { start, end: None }
    }

    pub fn resolved(&self) -> bool {
        self.end.is_some()
    }
}

/// Ordered, duplicate-free set of candidates, sorted ascending by start.
///
/// After [`CandidateSet::normalize`] the sequence is never reordered or
/// resized; only `end` fields are filled in. That is what keeps the
/// "next candidate's start is this candidate's upper bound" view valid while
/// the end-finder iterates by index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    /// Sort by start and drop structural duplicates. All candidates coming
    /// out of the reference scan still have `end = None`, so this
    /// deduplicates by start alone.
    pub fn normalize(&mut self) {
        self.candidates.sort_unstable();
        self.candidates.dedup();
    }

    /// Exclusive upper search bound for candidate `index`: the next
    /// candidate's start, or `region_end` for the last one. Valid only after
    /// `normalize`.
    pub fn bound(&self, index: usize, region_end: u64) -> u64 {
        match self.candidates.get(index + 1) {
            Some(next) => next.start,
            None => region_end,
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    /// Write a candidate's resolved end. Only the end-finder calls this, and
    /// only for a candidate that is still unresolved.
    pub(crate) fn set_end(&mut self, index: usize, end: u64) {
        self.candidates[index].end = Some(end);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    /// Candidates that resolved to a full `[start, end)` range.
    pub fn resolved(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter().filter(|c| c.resolved())
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

/// A function range as recorded in a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionRange {
    pub start: u64,
    pub end: u64,
    /// True when the range came out of this analysis rather than symbol or
    /// user input.
    pub heuristic: bool,
}
