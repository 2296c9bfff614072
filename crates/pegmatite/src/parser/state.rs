//! Per-parse mutable state.
//!
//! A [`ParserState`] is created at parse entry and dropped at return. It
//! carries the input text and cursor bounds, the whitespace-mode flag, the
//! expected-tracking inhibit depth, the furthest-failure tracker, and the
//! packrat memo cache. Because the state never outlives one parse, memo
//! entries can never be observed against a different input text.

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::grammar::rule::{Expectation, MemoId};
use crate::value::Value;

/// Cached outcome of a memoizing rule at one position: the advanced
/// position and value on success, `None` for a cached failure.
pub(crate) type MemoEntry = Option<(usize, Value)>;

/// Mutable context for a single parse.
#[derive(Debug)]
pub(crate) struct ParserState<'t> {
    /// The input text.
    pub text: &'t str,
    /// Byte length of the input.
    pub end: usize,
    /// Suppresses nested whitespace skipping while the whitespace rule or a
    /// lexical subgrammar is matching.
    pub in_whitespace: bool,
    /// Expected-set tracking is suspended while this is nonzero (whitespace
    /// and lookahead).
    pub inhibit_expected: u32,
    /// Furthest position any rule has been attempted at. Monotone.
    pub max_pos: usize,
    /// Descriptions of the expectable rules attempted at `max_pos`.
    pub expected: SmallVec<[Expectation; 8]>,
    /// Packrat cache, keyed by memo-rule identity and position.
    pub memo: HashMap<(MemoId, usize), MemoEntry, ahash::RandomState>,
    /// Number of memo lookups served from the cache.
    pub memo_hits: usize,
    /// Number of memo lookups that had to compute.
    pub memo_misses: usize,
}

impl<'t> ParserState<'t> {
    pub(crate) fn new(text: &'t str) -> Self {
        Self {
            text,
            end: text.len(),
            in_whitespace: false,
            inhibit_expected: 0,
            max_pos: 0,
            expected: SmallVec::new(),
            memo: HashMap::with_hasher(ahash::RandomState::new()),
            memo_hits: 0,
            memo_misses: 0,
        }
    }

    /// Record a rule attempt at `pos` for the furthest-failure tracker.
    ///
    /// A strictly further attempt replaces the expected set; an attempt at
    /// the current furthest position extends it. Non-expectable rules still
    /// advance `max_pos` but contribute no description.
    pub(crate) fn track(&mut self, pos: usize, expectation: Option<Expectation>) {
        if pos > self.max_pos {
            self.max_pos = pos;
            self.expected.clear();
            if let Some(expectation) = expectation {
                self.expected.push(expectation);
            }
        } else if pos == self.max_pos
            && let Some(expectation) = expectation
            && !self.expected.contains(&expectation)
        {
            self.expected.push(expectation);
        }
    }

    /// Anchor the tracker at the end position of a match whose trailing
    /// input was not consumed, so the diagnostic points at the leftover
    /// text.
    pub(crate) fn anchor_trailing(&mut self, pos: usize) {
        if pos > self.max_pos {
            self.max_pos = pos;
            self.expected.clear();
        }
    }
}
