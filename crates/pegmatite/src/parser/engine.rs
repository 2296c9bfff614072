//! The matching loop.
//!
//! Every rule is matched through two entry points: [`match_rule`] first
//! skips whitespace (unless the state is already in whitespace mode) and
//! [`match_after_ws`] records the attempt for the furthest-failure tracker
//! before dispatching on the rule variant. A match returns
//! `Ok(Some((new_pos, value)))`, the failure sentinel `Ok(None)`, or
//! `Err(Abort)` which unwinds the whole parse.

use compact_str::{CompactString, format_compact};

use crate::grammar::Grammar;
use crate::grammar::rule::Rule;
use crate::parser::state::ParserState;
use crate::value::Value;

/// A fatal parse abort, raised by error rules and undefined symbols.
///
/// Distinct from the failure sentinel: an abort does not participate in
/// ordered choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Abort {
    pub pos: usize,
    pub message: CompactString,
}

pub(crate) type MatchResult = Result<Option<(usize, Value)>, Abort>;

/// Everything a match needs: the read-only grammar for symbol and
/// whitespace lookups, and the per-parse mutable state.
pub(crate) struct MatchContext<'g, 's, 't> {
    pub grammar: &'g Grammar,
    pub state: &'s mut ParserState<'t>,
}

/// Normal entry point: skip whitespace, then match.
pub(crate) fn match_rule(ctx: &mut MatchContext<'_, '_, '_>, rule: &Rule, pos: usize) -> MatchResult {
    let pos = if ctx.state.in_whitespace {
        pos
    } else {
        skip_whitespace(ctx, pos)?
    };
    match_after_ws(ctx, rule, pos)
}

/// Entry point for positions where whitespace is already skipped: track the
/// attempt, then dispatch.
pub(crate) fn match_after_ws(
    ctx: &mut MatchContext<'_, '_, '_>,
    rule: &Rule,
    pos: usize,
) -> MatchResult {
    if ctx.state.inhibit_expected == 0 {
        ctx.state.track(pos, rule.expectation());
    }
    dispatch(ctx, rule, pos)
}

/// Run the grammar's whitespace rule at `pos` until it stops matching.
///
/// The whitespace rule itself runs in whitespace mode (no nested skipping)
/// and with expected tracking suspended, so it never pollutes diagnostics.
pub(crate) fn skip_whitespace(
    ctx: &mut MatchContext<'_, '_, '_>,
    mut pos: usize,
) -> Result<usize, Abort> {
    let Some(whitespace) = ctx.grammar.whitespace_rule() else {
        return Ok(pos);
    };
    ctx.state.in_whitespace = true;
    ctx.state.inhibit_expected += 1;
    let outcome = loop {
        match match_after_ws(ctx, whitespace, pos) {
            Ok(Some((next, _))) if next > pos => pos = next,
            Ok(_) => break Ok(pos),
            Err(abort) => break Err(abort),
        }
    };
    ctx.state.in_whitespace = false;
    ctx.state.inhibit_expected -= 1;
    outcome
}

fn next_char(text: &str, pos: usize) -> Option<char> {
    text[pos..].chars().next()
}

#[allow(clippy::too_many_lines)]
fn dispatch(ctx: &mut MatchContext<'_, '_, '_>, rule: &Rule, pos: usize) -> MatchResult {
    match rule {
        Rule::Literal(text) => {
            if ctx.state.text[pos..].starts_with(text.as_str()) {
                Ok(Some((pos + text.len(), Value::Null)))
            } else {
                Ok(None)
            }
        }

        Rule::AnyChar => Ok(next_char(ctx.state.text, pos).map(|c| (pos + c.len_utf8(), Value::Null))),

        Rule::CharClass(class) => Ok(next_char(ctx.state.text, pos)
            .filter(|c| class.contains(*c))
            .map(|c| (pos + c.len_utf8(), Value::Null))),

        Rule::CharPred(pred) => Ok(next_char(ctx.state.text, pos)
            .filter(|c| pred.test(*c))
            .map(|c| (pos + c.len_utf8(), Value::Null))),

        Rule::EndOfInput => {
            if pos >= ctx.state.end {
                Ok(Some((pos, Value::Null)))
            } else {
                Ok(None)
            }
        }

        Rule::Abort(message) => Err(Abort {
            pos,
            message: message.clone(),
        }),

        Rule::Symbol(id) => {
            let grammar = ctx.grammar;
            match grammar.definition(*id) {
                Some(definition) => match_after_ws(ctx, definition, pos),
                None => Err(Abort {
                    pos,
                    message: format_compact!("undefined symbol '{}'", grammar.symbol_name(*id)),
                }),
            }
        }

        Rule::Skip(inner) => Ok(match_rule(ctx, inner, pos)?.map(|(next, _)| (next, Value::Null))),

        Rule::Text { inner, extract } => {
            let Some((end, _)) = match_rule(ctx, inner, pos)? else {
                return Ok(None);
            };
            let text = ctx.state.text;
            let value = match extract {
                Some(extract) => extract.apply(text, pos, end),
                None => Value::Str(text[pos..end].into()),
            };
            Ok(Some((end, value)))
        }

        Rule::Optional(inner) => {
            let generates = inner.generates_value();
            match match_rule(ctx, inner, pos)? {
                Some((next, value)) => {
                    let value = if generates { value } else { Value::Bool(true) };
                    Ok(Some((next, value)))
                }
                None => {
                    let value = if generates {
                        Value::Null
                    } else {
                        Value::Bool(false)
                    };
                    Ok(Some((pos, value)))
                }
            }
        }

        Rule::Repeat { inner, sep, min } => {
            let mut values = Vec::new();
            let mut cur = pos;
            match match_rule(ctx, inner, cur)? {
                Some((next, value)) => {
                    values.push(value);
                    cur = next;
                }
                None => {
                    return if *min == 0 {
                        Ok(Some((pos, Value::List(values))))
                    } else {
                        Ok(None)
                    };
                }
            }
            loop {
                let before_sep = cur;
                if let Some(sep) = sep {
                    match match_rule(ctx, sep, cur)? {
                        Some((next, _)) => cur = next,
                        // A trailing separator is never consumed.
                        None => return Ok(Some((before_sep, Value::List(values)))),
                    }
                }
                match match_rule(ctx, inner, cur)? {
                    Some((next, value)) => {
                        values.push(value);
                        cur = next;
                    }
                    None => return Ok(Some((before_sep, Value::List(values)))),
                }
                // A zero-width iteration would repeat forever.
                if cur == before_sep {
                    return Ok(Some((cur, Value::List(values))));
                }
            }
        }

        Rule::Sequence {
            parts,
            value_count,
            reduce,
        } => {
            let mut values = Vec::with_capacity(*value_count);
            let mut cur = pos;
            for part in parts {
                let Some((next, value)) = match_rule(ctx, part, cur)? else {
                    return Ok(None);
                };
                if part.generates_value() {
                    values.push(value);
                }
                cur = next;
            }
            let value = match reduce {
                Some(reduce) => reduce.apply(values),
                None => match values.len() {
                    0 => Value::Null,
                    1 => values.pop().unwrap_or(Value::Null),
                    _ => Value::List(values),
                },
            };
            Ok(Some((cur, value)))
        }

        Rule::Choice(alternatives) => {
            for alternative in alternatives {
                if let Some(matched) = match_rule(ctx, alternative, pos)? {
                    return Ok(Some(matched));
                }
            }
            Ok(None)
        }

        Rule::Lookahead(inner) => {
            ctx.state.inhibit_expected += 1;
            let result = match_after_ws(ctx, inner, pos);
            ctx.state.inhibit_expected -= 1;
            match result? {
                Some(_) => Ok(Some((pos, Value::Null))),
                None => Ok(None),
            }
        }

        Rule::NotLookahead(inner) => {
            ctx.state.inhibit_expected += 1;
            let result = match_after_ws(ctx, inner, pos);
            ctx.state.inhibit_expected -= 1;
            match result? {
                Some(_) => Ok(None),
                None => Ok(Some((pos, Value::Null))),
            }
        }

        Rule::Lexical { inner, .. } => {
            let saved = ctx.state.in_whitespace;
            ctx.state.in_whitespace = true;
            let result = match_rule(ctx, inner, pos);
            ctx.state.in_whitespace = saved;
            Ok(result?.map(|(next, _)| (next, Value::Null)))
        }

        Rule::Memo { id, inner } => {
            if let Some(cached) = ctx.state.memo.get(&(*id, pos)) {
                let cached = cached.clone();
                ctx.state.memo_hits += 1;
                return Ok(cached);
            }
            let outcome = match_rule(ctx, inner, pos)?;
            ctx.state.memo_misses += 1;
            ctx.state.memo.insert((*id, pos), outcome.clone());
            Ok(outcome)
        }
    }
}
