//! # Grammar Module
//!
//! Grammar definition for the PEG engine: a registry of named symbols, the
//! whitespace rule, and the parse entry point.
//!
//! ## Overview
//!
//! A [`Grammar`] owns interned symbol names and their compiled definitions.
//! Symbols are created on first mention and defined at most once; they are
//! the only back-edges in the rule graph, so recursive grammars never form
//! owning cycles. The grammar also owns the whitespace rule applied between
//! matches (any of space, tab, CR, LF by default).
//!
//! ## Usage
//!
//! ```rust
//! use pegmatite::{Expr, Grammar, Value};
//!
//! let mut grammar = Grammar::new();
//! grammar.rule("number", Expr::text(Expr::plus(Expr::one_of("0123456789"))))?;
//! grammar.rule(
//!     "list",
//!     Expr::seq([
//!         Expr::lit("["),
//!         Expr::star_sep(Expr::sym("number"), Expr::lit(",")),
//!         Expr::lit("]"),
//!     ]),
//! )?;
//!
//! let output = grammar.parse(Expr::sym("list"), "[1, 2, 3]")?;
//! assert_eq!(
//!     output.value,
//!     Value::List(vec!["1".into(), "2".into(), "3".into()]),
//! );
//! # Ok::<(), pegmatite::ParseError>(())
//! ```

pub(crate) mod char_class;
pub(crate) mod compile;
pub mod expr;
pub(crate) mod rule;

pub use expr::{CharPredicate, Expr, Extractor, Reducer, SeqItem};
pub use rule::SymbolId;

use std::sync::atomic::AtomicU32;
use std::time::Instant;

use compact_str::CompactString;
use hashbrown::HashMap;
use lasso::{Rodeo, Spur};

use crate::error::diagnostics::furthest_failure;
use crate::error::{GrammarError, ParseError, ParseMetrics, ParseOutput, ParseWarning};
use crate::grammar::char_class::CharClass;
use crate::grammar::compile::{SymbolResolver, compile};
use crate::grammar::rule::Rule;
use crate::parser::engine::{MatchContext, match_rule, skip_whitespace};
use crate::parser::state::ParserState;

/// A named-symbol registry with a whitespace rule and a parse entry point.
///
/// Once all definitions are in place the grammar is read-only during
/// parsing, so independent parses may run concurrently, each with its own
/// per-parse state.
pub struct Grammar {
    /// Interned symbol names.
    names: Rodeo,
    /// Compiled definitions, at most one per symbol.
    defs: HashMap<Spur, Rule, ahash::RandomState>,
    /// Rule skipped between matches; `None` disables skipping entirely.
    whitespace: Option<Rule>,
    /// Allocator for memo-rule identities.
    memo_ids: AtomicU32,
}

impl Grammar {
    /// An empty grammar with the default whitespace rule (any of space,
    /// tab, CR, LF).
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: Rodeo::new(),
            defs: HashMap::with_hasher(ahash::RandomState::new()),
            whitespace: CharClass::new(" \t\r\n").map(Rule::CharClass),
            memo_ids: AtomicU32::new(0),
        }
    }

    /// Get or create the symbol named `name`.
    pub fn symbol(&mut self, name: &str) -> SymbolId {
        SymbolId(self.names.get_or_intern(name))
    }

    /// The name a symbol was registered under.
    #[must_use]
    pub fn symbol_name(&self, symbol: SymbolId) -> &str {
        self.names.resolve(&symbol.0)
    }

    /// Assign a definition to `symbol`.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::SymbolRedefined`] on a second assignment, or
    /// any error the expression fails to compile with.
    pub fn define(
        &mut self,
        symbol: SymbolId,
        expr: impl Into<Expr>,
    ) -> Result<(), GrammarError> {
        if self.defs.contains_key(&symbol.0) {
            return Err(GrammarError::SymbolRedefined(
                self.names.resolve(&symbol.0).into(),
            ));
        }
        let expr = expr.into();
        let rule = compile(
            &expr,
            &mut SymbolResolver::Create(&mut self.names),
            &self.memo_ids,
        )?;
        self.defs.insert(symbol.0, rule);
        Ok(())
    }

    /// Get-or-create `name` and define it in one step.
    ///
    /// # Errors
    ///
    /// Same as [`Grammar::define`].
    pub fn rule(&mut self, name: &str, expr: impl Into<Expr>) -> Result<SymbolId, GrammarError> {
        let symbol = self.symbol(name);
        self.define(symbol, expr)?;
        Ok(symbol)
    }

    /// Override the whitespace rule; `None` disables skipping entirely.
    ///
    /// # Errors
    ///
    /// Returns any error the expression fails to compile with.
    pub fn set_whitespace(&mut self, whitespace: Option<Expr>) -> Result<(), GrammarError> {
        self.whitespace = match whitespace {
            Some(expr) => Some(compile(
                &expr,
                &mut SymbolResolver::Create(&mut self.names),
                &self.memo_ids,
            )?),
            None => None,
        };
        Ok(())
    }

    /// Names that were mentioned somewhere but never defined, sorted.
    ///
    /// Reaching one of these during a parse aborts it; [`Grammar::parse`]
    /// also surfaces them as warnings.
    #[must_use]
    pub fn undefined_symbols(&self) -> Vec<CompactString> {
        let mut missing: Vec<CompactString> = self
            .names
            .iter()
            .filter(|(spur, _)| !self.defs.contains_key(spur))
            .map(|(_, name)| CompactString::from(name))
            .collect();
        missing.sort_unstable();
        missing
    }

    /// Parse `text` against `root`.
    ///
    /// The root is compiled against the existing registry, matched from
    /// position 0, and trailing whitespace is skipped from the end of the
    /// match; anything left over is a syntax error anchored at that
    /// position.
    ///
    /// # Errors
    ///
    /// [`ParseError::Grammar`] when the root fails to compile,
    /// [`ParseError::Abort`] when an error rule or undefined symbol is
    /// reached, and [`ParseError::Syntax`] with the furthest-failure
    /// diagnostic when the text does not match.
    pub fn parse(&self, root: impl Into<Expr>, text: &str) -> Result<ParseOutput, ParseError> {
        let root = self.compile_root(&root.into())?;
        let warnings: Vec<ParseWarning> = self
            .undefined_symbols()
            .into_iter()
            .map(|name| ParseWarning {
                message: format!("symbol '{name}' has no definition"),
            })
            .collect();

        let started = Instant::now();
        let mut state = ParserState::new(text);
        let outcome = {
            let mut ctx = MatchContext {
                grammar: self,
                state: &mut state,
            };
            match match_rule(&mut ctx, &root, 0) {
                Ok(Some((end, value))) => {
                    skip_whitespace(&mut ctx, end).map(|end| Some((end, value)))
                }
                other => other,
            }
        };

        match outcome {
            Err(abort) => Err(ParseError::Abort {
                pos: abort.pos,
                message: abort.message.into(),
            }),
            Ok(None) => Err(ParseError::Syntax(furthest_failure(
                text,
                state.max_pos,
                &state.expected,
            ))),
            Ok(Some((end, value))) => {
                if end < state.end {
                    state.anchor_trailing(end);
                    return Err(ParseError::Syntax(furthest_failure(
                        text,
                        state.max_pos,
                        &state.expected,
                    )));
                }
                Ok(ParseOutput {
                    value,
                    warnings,
                    metrics: ParseMetrics {
                        parse_time: started.elapsed(),
                        memo_hits: state.memo_hits,
                        memo_misses: state.memo_misses,
                        furthest_pos: state.max_pos,
                    },
                })
            }
        }
    }

    pub(crate) fn definition(&self, symbol: SymbolId) -> Option<&Rule> {
        self.defs.get(&symbol.0)
    }

    pub(crate) fn whitespace_rule(&self) -> Option<&Rule> {
        self.whitespace.as_ref()
    }

    fn compile_root(&self, expr: &Expr) -> Result<Rule, GrammarError> {
        compile(
            expr,
            &mut SymbolResolver::Lookup(&self.names),
            &self.memo_ids,
        )
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grammar")
            .field("symbols", &self.names.len())
            .field("defined", &self.defs.len())
            .field("whitespace", &self.whitespace.is_some())
            .finish_non_exhaustive()
    }
}
