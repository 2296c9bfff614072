//! Furthest-failure diagnostic formatting.
//!
//! Builds a [`SyntaxError`] from the final parser state: the expected-set
//! descriptions sorted with unquoted (symbol and lexical) names before
//! quoted literals, the offending character or `end of file`, and the
//! source line around the failure with a `^` indicator column. Newlines are
//! located with `memchr`.

use crate::error::SyntaxError;
use crate::grammar::rule::Expectation;

/// Format the furthest failure recorded at `pos`.
pub(crate) fn furthest_failure(text: &str, pos: usize, expected: &[Expectation]) -> SyntaxError {
    let mut labels: Vec<(bool, &str)> = expected
        .iter()
        .map(|expectation| (expectation.quoted, expectation.label.as_str()))
        .collect();
    // Tuple order sorts unquoted descriptions first, lexicographic within
    // each class.
    labels.sort_unstable();
    let expected = labels
        .into_iter()
        .map(|(quoted, label)| {
            if quoted {
                format!("'{label}'")
            } else {
                label.to_string()
            }
        })
        .collect();

    let found = text[pos..]
        .chars()
        .next()
        .map_or_else(|| "end of file".to_string(), |c| format!("'{c}'"));

    let bytes = text.as_bytes();
    let line_start = memchr::memrchr(b'\n', &bytes[..pos]).map_or(0, |i| i + 1);
    let line_end = memchr::memchr(b'\n', &bytes[pos..]).map_or(text.len(), |i| pos + i);
    let source_line = text[line_start..line_end]
        .strip_suffix('\r')
        .unwrap_or(&text[line_start..line_end])
        .to_string();

    let newlines = memchr::memchr_iter(b'\n', &bytes[..pos]).count();
    let line = u32::try_from(newlines).unwrap_or(u32::MAX).saturating_add(1);
    let column = u32::try_from(pos - line_start)
        .unwrap_or(u32::MAX)
        .saturating_add(1);

    let mut indicator = " ".repeat(pos - line_start);
    indicator.push('^');

    SyntaxError {
        pos,
        line,
        column,
        expected,
        found,
        source_line,
        indicator,
    }
}
