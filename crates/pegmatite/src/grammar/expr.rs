//! User-facing grammar expressions.
//!
//! An [`Expr`] is the heterogeneous input accepted by the rule compiler:
//! literal strings, symbol references, nested sequences with an optional
//! trailing reducer, and the full combinator set. Construction is loose;
//! placement errors (a reducer anywhere but the end of a sequence, a repeat
//! minimum outside `{0, 1}`) are reported when the expression is compiled
//! into the internal rule algebra.

use std::fmt;
use std::sync::Arc;

use compact_str::CompactString;

use crate::value::Value;

/// A reducer combines the collected values of a sequence into one value.
///
/// It is applied to the ordered list of values produced by the sequence's
/// value-generating parts.
#[derive(Clone)]
pub struct Reducer(Arc<dyn Fn(Vec<Value>) -> Value + Send + Sync>);

impl Reducer {
    pub fn new(f: impl Fn(Vec<Value>) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub(crate) fn apply(&self, values: Vec<Value>) -> Value {
        (self.0)(values)
    }
}

impl fmt::Debug for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Reducer(..)")
    }
}

/// An extractor turns a matched span into a value.
///
/// Invoked as `extractor(text, start, end)` where `[start, end)` is the byte
/// span the inner rule consumed. The default extractor used by
/// [`Expr::text`] returns the matched substring.
#[derive(Clone)]
pub struct Extractor(Arc<dyn Fn(&str, usize, usize) -> Value + Send + Sync>);

impl Extractor {
    pub fn new(f: impl Fn(&str, usize, usize) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub(crate) fn apply(&self, text: &str, start: usize, end: usize) -> Value {
        (self.0)(text, start, end)
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Extractor(..)")
    }
}

/// A single-character predicate, optionally named for debug output.
#[derive(Clone)]
pub struct CharPredicate {
    name: Option<CompactString>,
    pred: Arc<dyn Fn(char) -> bool + Send + Sync>,
}

impl CharPredicate {
    pub fn new(pred: impl Fn(char) -> bool + Send + Sync + 'static) -> Self {
        Self {
            name: None,
            pred: Arc::new(pred),
        }
    }

    pub fn named(
        name: impl Into<CompactString>,
        pred: impl Fn(char) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: Some(name.into()),
            pred: Arc::new(pred),
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn test(&self, c: char) -> bool {
        (self.pred)(c)
    }
}

impl fmt::Debug for CharPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "CharPredicate({name})"),
            None => f.write_str("CharPredicate(..)"),
        }
    }
}

/// One element of a sequence: a subexpression or the trailing reducer.
#[derive(Debug, Clone)]
pub enum SeqItem {
    Expr(Expr),
    Reduce(Reducer),
}

impl From<Expr> for SeqItem {
    fn from(expr: Expr) -> Self {
        Self::Expr(expr)
    }
}

impl From<&str> for SeqItem {
    fn from(s: &str) -> Self {
        Self::Expr(Expr::lit(s))
    }
}

impl From<Reducer> for SeqItem {
    fn from(reducer: Reducer) -> Self {
        Self::Reduce(reducer)
    }
}

/// Grammar expression accepted by the rule compiler.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Match a string exactly.
    Lit(CompactString),
    /// Reference a named symbol, resolved through the grammar.
    Sym(CompactString),
    /// Match any single code point.
    Any,
    /// Match one code point drawn from a class string.
    OneOf(CompactString),
    /// Match one code point satisfying a predicate.
    CharIf(CharPredicate),
    /// Match only at end of input.
    End,
    /// Abort the whole parse with a message when entered.
    Error(CompactString),
    /// Match the inner expression, discarding its value.
    Skip(Box<Expr>),
    /// Match the inner expression; the value is the matched span (or the
    /// extractor's output).
    Text {
        expr: Box<Expr>,
        extract: Option<Extractor>,
    },
    /// Match the inner expression or nothing.
    Maybe(Box<Expr>),
    /// Repeat the inner expression, optionally separated.
    Repeat {
        expr: Box<Expr>,
        sep: Option<Box<Expr>>,
        min: usize,
    },
    /// Match the parts in order; an optional reducer may close the list.
    Seq(Vec<SeqItem>),
    /// Ordered choice: the first alternative that matches wins.
    Choice(Vec<Expr>),
    /// Positive lookahead: succeed without consuming.
    At(Box<Expr>),
    /// Negative lookahead: succeed when the inner expression does not match.
    Not(Box<Expr>),
    /// Match the inner expression with whitespace skipping suppressed.
    Lex {
        name: Option<CompactString>,
        expr: Box<Expr>,
    },
    /// Cache outcomes of the inner expression per input position.
    Memo(Box<Expr>),
}

impl Expr {
    /// Literal string.
    pub fn lit(s: impl Into<CompactString>) -> Self {
        Self::Lit(s.into())
    }

    /// Reference to a named symbol.
    pub fn sym(name: impl Into<CompactString>) -> Self {
        Self::Sym(name.into())
    }

    /// Any single code point.
    #[must_use]
    pub const fn any() -> Self {
        Self::Any
    }

    /// One code point from the class `chars`.
    pub fn one_of(chars: impl Into<CompactString>) -> Self {
        Self::OneOf(chars.into())
    }

    /// One code point satisfying `pred`.
    pub fn char_if(pred: impl Fn(char) -> bool + Send + Sync + 'static) -> Self {
        Self::CharIf(CharPredicate::new(pred))
    }

    /// One code point satisfying `pred`, with a name for debug output.
    pub fn char_if_named(
        name: impl Into<CompactString>,
        pred: impl Fn(char) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::CharIf(CharPredicate::named(name, pred))
    }

    /// End of input.
    #[must_use]
    pub const fn end() -> Self {
        Self::End
    }

    /// Abort the whole parse with `message` when entered.
    ///
    /// Distinct from a match failure: an abort does not participate in
    /// ordered choice.
    pub fn error(message: impl Into<CompactString>) -> Self {
        Self::Error(message.into())
    }

    /// Match `expr` but contribute no value.
    pub fn skip(expr: impl Into<Expr>) -> Self {
        Self::Skip(Box::new(expr.into()))
    }

    /// Match `expr`; the value is the matched substring.
    pub fn text(expr: impl Into<Expr>) -> Self {
        Self::Text {
            expr: Box::new(expr.into()),
            extract: None,
        }
    }

    /// Match `expr`; the value is `extract(text, start, end)`.
    pub fn text_with(
        expr: impl Into<Expr>,
        extract: impl Fn(&str, usize, usize) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self::Text {
            expr: Box::new(expr.into()),
            extract: Some(Extractor::new(extract)),
        }
    }

    /// Match `expr` or nothing. Always generates a value: the inner value
    /// (or `Null`) when `expr` generates one, a boolean match flag
    /// otherwise.
    pub fn maybe(expr: impl Into<Expr>) -> Self {
        Self::Maybe(Box::new(expr.into()))
    }

    /// One or more repetitions of `expr`.
    pub fn plus(expr: impl Into<Expr>) -> Self {
        Self::repeat(expr, None, 1)
    }

    /// Zero or more repetitions of `expr`.
    pub fn star(expr: impl Into<Expr>) -> Self {
        Self::repeat(expr, None, 0)
    }

    /// One or more repetitions of `expr` separated by `sep`. A trailing
    /// separator is never consumed.
    pub fn plus_sep(expr: impl Into<Expr>, sep: impl Into<Expr>) -> Self {
        Self::repeat(expr, Some(sep.into()), 1)
    }

    /// Zero or more repetitions of `expr` separated by `sep`.
    pub fn star_sep(expr: impl Into<Expr>, sep: impl Into<Expr>) -> Self {
        Self::repeat(expr, Some(sep.into()), 0)
    }

    /// Raw repetition; `min` must be 0 or 1.
    pub fn repeat(expr: impl Into<Expr>, sep: Option<Expr>, min: usize) -> Self {
        Self::Repeat {
            expr: Box::new(expr.into()),
            sep: sep.map(Box::new),
            min,
        }
    }

    /// Sequence of parts, matched in order.
    pub fn seq<I>(parts: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SeqItem>,
    {
        Self::Seq(parts.into_iter().map(Into::into).collect())
    }

    /// Sequence of parts closed by a reducer over the collected values.
    pub fn seq_map<I>(parts: I, reduce: impl Fn(Vec<Value>) -> Value + Send + Sync + 'static) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
    {
        let mut items: Vec<SeqItem> = parts
            .into_iter()
            .map(|part| SeqItem::Expr(part.into()))
            .collect();
        items.push(SeqItem::Reduce(Reducer::new(reduce)));
        Self::Seq(items)
    }

    /// Ordered choice over alternatives.
    pub fn choice<I>(alternatives: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
    {
        Self::Choice(alternatives.into_iter().map(Into::into).collect())
    }

    /// Positive lookahead: match iff `expr` matches, consuming nothing.
    pub fn at(expr: impl Into<Expr>) -> Self {
        Self::At(Box::new(expr.into()))
    }

    /// Negative lookahead: match iff `expr` does not match, consuming
    /// nothing.
    pub fn not(expr: impl Into<Expr>) -> Self {
        Self::Not(Box::new(expr.into()))
    }

    /// Match `expr` with whitespace skipping suppressed.
    pub fn lex(expr: impl Into<Expr>) -> Self {
        Self::Lex {
            name: None,
            expr: Box::new(expr.into()),
        }
    }

    /// Like [`Expr::lex`], with a name used in error messages.
    pub fn lex_named(name: impl Into<CompactString>, expr: impl Into<Expr>) -> Self {
        Self::Lex {
            name: Some(name.into()),
            expr: Box::new(expr.into()),
        }
    }

    /// Cache outcomes of `expr` per input position within a single parse.
    pub fn memo(expr: impl Into<Expr>) -> Self {
        Self::Memo(Box::new(expr.into()))
    }

    /// Wrap `expr` so its value becomes `[label, value]`.
    pub fn tag(label: impl Into<CompactString>, expr: impl Into<Expr>) -> Self {
        let label = label.into();
        Self::seq_map([expr.into()], move |mut values| {
            let ast = if values.is_empty() {
                Value::Null
            } else {
                values.swap_remove(0)
            };
            Value::List(vec![Value::Str(label.clone()), ast])
        })
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Self::lit(s)
    }
}
