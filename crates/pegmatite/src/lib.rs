//! # Pegmatite
//!
//! A Parsing Expression Grammar (PEG) engine built around a small set of
//! rule-combinators that compose into recursive grammars.
//!
//! ## Overview
//!
//! - **Combinator algebra**: literals, character classes, sequences,
//!   ordered choice, repetition with separators, optionals, and positive
//!   and negative lookahead ([`Expr`]).
//! - **Value discipline**: some rules generate AST values
//!   ([`Expr::text`], repetitions, [`Expr::maybe`]) and some do not
//!   (literals, [`Expr::skip`]); sequences compute their value shape from
//!   their parts, with user reducers only where composition is non-trivial.
//! - **Whitespace handling**: a grammar-owned whitespace rule is skipped
//!   between matches and suppressed inside [`Expr::lex`] token subgrammars.
//! - **Packrat memoization**: [`Expr::memo`] caches outcomes per input
//!   position for linear-time matching of ambiguity-free grammars.
//! - **Diagnostics**: failures report the furthest position reached, the
//!   set of expectable rules attempted there, and the offending source line
//!   with an indicator column ([`SyntaxError`]).
//!
//! ## Quick Start
//!
//! ```rust
//! use pegmatite::{Expr, Grammar, Value};
//!
//! let mut grammar = Grammar::new();
//! grammar.rule("number", Expr::text(Expr::plus(Expr::one_of("0123456789"))))?;
//! grammar.rule(
//!     "sum",
//!     Expr::seq_map(
//!         [Expr::sym("number"), Expr::lit("+"), Expr::sym("number")],
//!         |mut values| {
//!             let rhs = values.pop().unwrap_or(Value::Null);
//!             let lhs = values.pop().unwrap_or(Value::Null);
//!             Value::List(vec![Value::from("+"), lhs, rhs])
//!         },
//!     ),
//! )?;
//!
//! let output = grammar.parse(Expr::sym("sum"), "7 + 8")?;
//! assert_eq!(
//!     output.value,
//!     Value::List(vec!["+".into(), "7".into(), "8".into()]),
//! );
//! # Ok::<(), pegmatite::ParseError>(())
//! ```
//!
//! ## Modules
//!
//! - [`grammar`] - Grammar definition, combinators, and the rule compiler
//! - [`error`] - Error types, warnings, metrics, and diagnostics
//! - [`value`] - The dynamic AST value type

pub mod error;
pub mod grammar;
pub(crate) mod parser;
pub mod value;

// Re-export commonly used types
pub use error::{
    GrammarError, ParseError, ParseMetrics, ParseOutput, ParseWarning, SyntaxError,
};
pub use grammar::{CharPredicate, Expr, Extractor, Grammar, Reducer, SeqItem, SymbolId};
pub use value::Value;
