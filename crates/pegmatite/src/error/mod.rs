//! # Error Types
//!
//! Error types and parse-result payloads.
//!
//! ## Overview
//!
//! Three regimes, kept deliberately distinct:
//!
//! - [`GrammarError`]: construction and compile errors, such as redefining
//!   a symbol or misplacing a reducer. Surfaced eagerly from
//!   [`Grammar::define`](crate::Grammar::define) and friends.
//! - [`ParseError::Syntax`]: a normal parse failure, carrying the
//!   furthest-failure diagnostic ([`SyntaxError`]).
//! - [`ParseError::Abort`]: a fatal abort raised by an
//!   [`error` rule](crate::Expr::error) or an undefined symbol; unlike a
//!   failure it does not participate in ordered choice.
//!
//! Successful parses return a [`ParseOutput`] with the AST value, non-fatal
//! [`ParseWarning`]s, and [`ParseMetrics`].
//!
//! ## Diagnostics Support
//!
//! When the `diagnostics` feature is enabled, errors derive
//! [`miette::Diagnostic`] for integration with miette-based reporters.

pub mod diagnostics;

use std::time::Duration;

use compact_str::CompactString;
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

use crate::value::Value;

/// Grammar construction or rule compilation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum GrammarError {
    #[error("symbol '{0}' is already defined")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::symbol_redefined)))]
    SymbolRedefined(CompactString),

    #[error("unknown symbol '{0}'")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::unknown_symbol)))]
    UnknownSymbol(CompactString),

    #[error("a reducer may only appear as the last element of a sequence")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::misplaced_reducer)))]
    MisplacedReducer,

    #[error("repeat minimum must be 0 or 1, got {0}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::invalid_repeat_min)))]
    InvalidRepeatMin(usize),

    #[error("character class must contain at least one character")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::empty_char_class)))]
    EmptyCharClass,

    #[error("choice must have at least one alternative")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(grammar::empty_choice)))]
    EmptyChoice,
}

/// Error returned by [`Grammar::parse`](crate::Grammar::parse).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum ParseError {
    /// The text did not match; carries the furthest-failure diagnostic.
    #[error("{0}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parse::syntax)))]
    Syntax(SyntaxError),

    /// An error rule or undefined symbol was reached; the parse was
    /// abandoned.
    #[error("parse aborted at offset {pos}: {message}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(parse::abort)))]
    Abort { pos: usize, message: String },

    /// The root expression failed to compile.
    #[error(transparent)]
    #[cfg_attr(feature = "diagnostics", diagnostic(transparent))]
    Grammar(#[from] GrammarError),
}

/// The furthest-failure diagnostic.
///
/// `expected` holds the sorted descriptions of the expectable rules
/// attempted at the failure position (unquoted lexical names before quoted
/// literals); `found` is the offending character quoted, or `end of file`.
/// The display form is the message followed by the offending source line
/// and a `^` indicator column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// Byte offset of the failure.
    pub pos: usize,
    /// 1-based line of the failure.
    pub line: u32,
    /// 1-based column (in bytes) of the failure.
    pub column: u32,
    /// Sorted descriptions of what would have been accepted here.
    pub expected: Vec<String>,
    /// What was actually found: a quoted character or `end of file`.
    pub found: String,
    /// The source line containing the failure, without its newline.
    pub source_line: String,
    /// Spaces up to the failure column followed by `^`.
    pub indicator: String,
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.expected.is_empty() {
            write!(f, "Unexpected {}", self.found)?;
        } else {
            write!(
                f,
                "Expected {} but found {}",
                self.expected.join(" or "),
                self.found
            )?;
        }
        write!(f, "\n{}\n{}", self.source_line, self.indicator)
    }
}

/// A non-fatal problem surfaced by a parse, such as a symbol that was
/// mentioned but never defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub message: String,
}

/// Counters and timings collected over one parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseMetrics {
    /// Wall-clock time spent matching.
    pub parse_time: Duration,
    /// Memo lookups served from the packrat cache.
    pub memo_hits: usize,
    /// Memo lookups that had to compute.
    pub memo_misses: usize,
    /// Furthest position any rule was attempted at.
    pub furthest_pos: usize,
}

/// A successful parse: the AST value plus warnings and metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    pub value: Value,
    pub warnings: Vec<ParseWarning>,
    pub metrics: ParseMetrics,
}
