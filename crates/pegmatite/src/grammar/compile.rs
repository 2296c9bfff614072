//! The rule compiler.
//!
//! Normalizes user-facing [`Expr`] trees into the internal [`Rule`] algebra:
//! literal strings become [`Rule::Literal`], symbol names are interned and
//! become late-bound [`Rule::Symbol`] handles, sequences compute their value
//! count and validate reducer placement, and character classes compile to
//! bounded bitmaps. Placement and shape errors surface here as
//! [`GrammarError`]s.

use std::sync::atomic::{AtomicU32, Ordering};

use lasso::Rodeo;

use crate::error::GrammarError;
use crate::grammar::char_class::CharClass;
use crate::grammar::expr::{Expr, SeqItem};
use crate::grammar::rule::{MemoId, Rule, SymbolId};

/// How symbol names are resolved during compilation.
///
/// Definition-side compiles create placeholder symbols on first mention (the
/// grammar registry is get-or-create); parse-side root compiles only look
/// names up, since a parse holds the grammar immutably.
pub(crate) enum SymbolResolver<'a> {
    Create(&'a mut Rodeo),
    Lookup(&'a Rodeo),
}

impl SymbolResolver<'_> {
    fn resolve(&mut self, name: &str) -> Result<SymbolId, GrammarError> {
        match self {
            Self::Create(names) => Ok(SymbolId(names.get_or_intern(name))),
            Self::Lookup(names) => names
                .get(name)
                .map(SymbolId)
                .ok_or_else(|| GrammarError::UnknownSymbol(name.into())),
        }
    }
}

/// Compile one expression into a rule.
pub(crate) fn compile(
    expr: &Expr,
    symbols: &mut SymbolResolver<'_>,
    memo_ids: &AtomicU32,
) -> Result<Rule, GrammarError> {
    match expr {
        Expr::Lit(text) => Ok(Rule::Literal(text.clone())),
        Expr::Sym(name) => Ok(Rule::Symbol(symbols.resolve(name)?)),
        Expr::Any => Ok(Rule::AnyChar),
        Expr::OneOf(chars) => CharClass::new(chars)
            .map(Rule::CharClass)
            .ok_or(GrammarError::EmptyCharClass),
        Expr::CharIf(pred) => Ok(Rule::CharPred(pred.clone())),
        Expr::End => Ok(Rule::EndOfInput),
        Expr::Error(message) => Ok(Rule::Abort(message.clone())),
        Expr::Skip(inner) => Ok(Rule::Skip(Box::new(compile(inner, symbols, memo_ids)?))),
        Expr::Text { expr, extract } => Ok(Rule::Text {
            inner: Box::new(compile(expr, symbols, memo_ids)?),
            extract: extract.clone(),
        }),
        Expr::Maybe(inner) => Ok(Rule::Optional(Box::new(compile(inner, symbols, memo_ids)?))),
        Expr::Repeat { expr, sep, min } => {
            if *min > 1 {
                return Err(GrammarError::InvalidRepeatMin(*min));
            }
            let sep = match sep {
                Some(sep) => Some(Box::new(compile(sep, symbols, memo_ids)?)),
                None => None,
            };
            Ok(Rule::Repeat {
                inner: Box::new(compile(expr, symbols, memo_ids)?),
                sep,
                min: *min,
            })
        }
        Expr::Seq(items) => compile_sequence(items, symbols, memo_ids),
        Expr::Choice(alternatives) => {
            if alternatives.is_empty() {
                return Err(GrammarError::EmptyChoice);
            }
            let mut compiled = Vec::with_capacity(alternatives.len());
            for alternative in alternatives {
                compiled.push(compile(alternative, symbols, memo_ids)?);
            }
            if compiled.len() == 1 {
                return Ok(compiled.into_iter().next().unwrap_or(Rule::AnyChar));
            }
            Ok(Rule::Choice(compiled))
        }
        Expr::At(inner) => Ok(Rule::Lookahead(Box::new(compile(
            inner, symbols, memo_ids,
        )?))),
        Expr::Not(inner) => Ok(Rule::NotLookahead(Box::new(compile(
            inner, symbols, memo_ids,
        )?))),
        Expr::Lex { name, expr } => Ok(Rule::Lexical {
            name: name.clone(),
            inner: Box::new(compile(expr, symbols, memo_ids)?),
        }),
        Expr::Memo(inner) => Ok(Rule::Memo {
            id: MemoId(memo_ids.fetch_add(1, Ordering::Relaxed)),
            inner: Box::new(compile(inner, symbols, memo_ids)?),
        }),
    }
}

/// Compile a sequence: scan parts left to right, count the value-generating
/// ones, and accept at most one reducer in final position.
fn compile_sequence(
    items: &[SeqItem],
    symbols: &mut SymbolResolver<'_>,
    memo_ids: &AtomicU32,
) -> Result<Rule, GrammarError> {
    let mut parts = Vec::with_capacity(items.len());
    let mut value_count = 0;
    let mut reduce = None;

    for (index, item) in items.iter().enumerate() {
        match item {
            SeqItem::Expr(expr) => {
                let part = compile(expr, symbols, memo_ids)?;
                if part.generates_value() {
                    value_count += 1;
                }
                parts.push(part);
            }
            SeqItem::Reduce(reducer) => {
                if index + 1 != items.len() {
                    return Err(GrammarError::MisplacedReducer);
                }
                reduce = Some(reducer.clone());
            }
        }
    }

    // A one-part sequence without a reducer is equivalent to its part.
    if parts.len() == 1 && reduce.is_none() {
        return Ok(parts.into_iter().next().unwrap_or(Rule::AnyChar));
    }

    Ok(Rule::Sequence {
        parts,
        value_count,
        reduce,
    })
}
