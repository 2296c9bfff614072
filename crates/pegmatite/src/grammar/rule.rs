//! The compiled rule algebra.
//!
//! A [`Rule`] is the closed sum type the matching engine dispatches over.
//! Rules are immutable once compiled; the only cross-links are
//! [`Rule::Symbol`] handles resolved through the grammar at match time, so
//! the graph may be cyclic without owning cycles.

use compact_str::CompactString;

use crate::grammar::char_class::CharClass;
use crate::grammar::expr::{CharPredicate, Extractor, Reducer};

/// Handle of an interned symbol name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub(crate) lasso::Spur);

/// Identity of a memoizing rule, used to key its per-parse cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct MemoId(pub(crate) u32);

/// An entry of the expected set: the description of an expectable rule.
///
/// Quoted entries come from literals and render as `'text'`; unquoted ones
/// come from named lexical rules and render bare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Expectation {
    pub label: CompactString,
    pub quoted: bool,
}

/// A compiled rule.
#[derive(Debug, Clone)]
pub(crate) enum Rule {
    /// Match a string exactly.
    Literal(CompactString),
    /// Match any single code point.
    AnyChar,
    /// Match one code point from a compiled class.
    CharClass(CharClass),
    /// Match one code point satisfying a predicate.
    CharPred(CharPredicate),
    /// Match only at end of input.
    EndOfInput,
    /// Abort the whole parse with a message when entered.
    Abort(CompactString),
    /// Late-bound reference to a named rule in the grammar.
    Symbol(SymbolId),
    /// Match the inner rule, discarding its value.
    Skip(Box<Rule>),
    /// Match the inner rule; the value is derived from the matched span.
    Text {
        inner: Box<Rule>,
        extract: Option<Extractor>,
    },
    /// Match the inner rule or nothing.
    Optional(Box<Rule>),
    /// Repeat the inner rule, optionally separated; `min` is 0 or 1.
    Repeat {
        inner: Box<Rule>,
        sep: Option<Box<Rule>>,
        min: usize,
    },
    /// Match the parts in order. `value_count` is the number of
    /// value-generating parts, fixed at compile time.
    Sequence {
        parts: Vec<Rule>,
        value_count: usize,
        reduce: Option<Reducer>,
    },
    /// Ordered choice.
    Choice(Vec<Rule>),
    /// Positive lookahead; consumes nothing.
    Lookahead(Box<Rule>),
    /// Negative lookahead; consumes nothing.
    NotLookahead(Box<Rule>),
    /// Match the inner rule in whitespace-suppressed mode.
    Lexical {
        name: Option<CompactString>,
        inner: Box<Rule>,
    },
    /// Cache outcomes of the inner rule per input position.
    Memo { id: MemoId, inner: Box<Rule> },
}

impl Rule {
    /// Whether a successful match of this rule contributes a value to its
    /// enclosing context.
    pub(crate) fn generates_value(&self) -> bool {
        match self {
            Self::Literal(_)
            | Self::AnyChar
            | Self::CharClass(_)
            | Self::CharPred(_)
            | Self::EndOfInput
            | Self::Abort(_)
            | Self::Skip(_)
            | Self::Lookahead(_)
            | Self::NotLookahead(_)
            | Self::Lexical { .. } => false,
            Self::Symbol(_)
            | Self::Text { .. }
            | Self::Optional(_)
            | Self::Repeat { .. }
            | Self::Choice(_) => true,
            Self::Sequence {
                value_count,
                reduce,
                ..
            } => *value_count > 0 || reduce.is_some(),
            Self::Memo { inner, .. } => inner.generates_value(),
        }
    }

    /// The description this rule contributes to the expected set, if any.
    ///
    /// Only literals and named lexical rules are expectable; everything else
    /// stays silent to keep diagnostics readable.
    pub(crate) fn expectation(&self) -> Option<Expectation> {
        match self {
            Self::Literal(text) => Some(Expectation {
                label: text.clone(),
                quoted: true,
            }),
            Self::Lexical {
                name: Some(name), ..
            } => Some(Expectation {
                label: name.clone(),
                quoted: false,
            }),
            _ => None,
        }
    }
}
