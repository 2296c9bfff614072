//! End-to-end tests for the matching engine: combinator semantics, value
//! shapes, whitespace handling, lookahead, memoization, and aborts.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pegmatite::{Expr, Grammar, ParseError, Value};

fn digit() -> Expr {
    Expr::one_of("0123456789")
}

fn number() -> Expr {
    Expr::text(Expr::plus(digit()))
}

#[test]
fn two_literals_produce_no_value() {
    let grammar = Grammar::new();
    let root = Expr::seq([Expr::lit("a"), Expr::lit("b")]);
    let output = grammar.parse(root, "ab").unwrap();
    assert_eq!(output.value, Value::Null);
}

#[test]
fn literal_mismatch_reports_the_second_literal() {
    let grammar = Grammar::new();
    let root = Expr::seq([Expr::lit("a"), Expr::lit("b")]);
    let err = grammar.parse(root, "ac").unwrap_err();
    let ParseError::Syntax(syntax) = err else {
        panic!("expected a syntax error, got {err:?}");
    };
    assert_eq!(syntax.pos, 1);
    assert_eq!(syntax.expected, vec!["'b'"]);
    assert_eq!(syntax.to_string(), "Expected 'b' but found 'c'\nac\n ^");
}

#[test]
fn text_over_digits_ignores_padding() {
    let grammar = Grammar::new();
    let output = grammar.parse(number(), " 42 ").unwrap();
    assert_eq!(output.value, Value::from("42"));
}

#[test]
fn bracketed_list_collects_item_values() {
    let mut grammar = Grammar::new();
    grammar.rule("number", number()).unwrap();
    let root = Expr::seq([
        Expr::lit("["),
        Expr::plus_sep(Expr::sym("number"), Expr::lit(",")),
        Expr::lit("]"),
    ]);
    let output = grammar.parse(root, "[1,2,3]").unwrap();
    assert_eq!(
        output.value,
        Value::List(vec!["1".into(), "2".into(), "3".into()])
    );
}

#[test]
fn reducer_shapes_the_sequence_value() {
    let mut grammar = Grammar::new();
    grammar.rule("number", number()).unwrap();
    let root = Expr::seq_map(
        [Expr::sym("number"), Expr::lit("+"), Expr::sym("number")],
        |mut values| {
            let rhs = values.pop().unwrap_or(Value::Null);
            let lhs = values.pop().unwrap_or(Value::Null);
            Value::List(vec!["+".into(), lhs, rhs])
        },
    );
    let output = grammar.parse(root, "7 + 8").unwrap();
    assert_eq!(
        output.value,
        Value::List(vec!["+".into(), "7".into(), "8".into()])
    );
}

#[test]
fn lookahead_guards_without_consuming() {
    let grammar = Grammar::new();
    let root = Expr::seq([Expr::at(Expr::lit("x")), Expr::lit("xyz")]);

    let output = grammar.parse(root.clone(), "xyz").unwrap();
    assert_eq!(output.value, Value::Null);

    let err = grammar.parse(root, "yzz").unwrap_err();
    let ParseError::Syntax(syntax) = err else {
        panic!("expected a syntax error, got {err:?}");
    };
    assert_eq!(syntax.pos, 0);
    // The lookahead contributes nothing to the expected set.
    assert!(!syntax.expected.iter().any(|entry| entry.contains('x')));
}

#[test]
fn negative_lookahead() {
    let grammar = Grammar::new();
    let keyword = Expr::seq([
        Expr::lit("if"),
        Expr::not(Expr::char_if(|c| c.is_ascii_alphanumeric())),
    ]);
    assert!(grammar.parse(keyword.clone(), "if").is_ok());
    let err = grammar.parse(keyword, "iffy").unwrap_err();
    assert!(matches!(err, ParseError::Syntax(_)));
}

#[test]
fn memoized_symbol_is_computed_once_per_position() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let counted_digit = Expr::char_if(move |c| {
        counter.fetch_add(1, Ordering::Relaxed);
        c.is_ascii_digit()
    });

    let mut grammar = Grammar::new();
    grammar
        .rule("n", Expr::memo(Expr::text(Expr::plus(counted_digit))))
        .unwrap();
    let root = Expr::choice([
        Expr::seq([Expr::sym("n"), Expr::lit("!")]),
        Expr::seq([Expr::sym("n"), Expr::lit("?")]),
    ]);

    let output = grammar.parse(root, "123?").unwrap();
    assert_eq!(output.value, Value::from("123"));
    // Three digits plus the failing probe at '?'; the second alternative is
    // served from the cache and never re-runs the predicate.
    assert_eq!(calls.load(Ordering::Relaxed), 4);
    assert_eq!(output.metrics.memo_misses, 1);
    assert_eq!(output.metrics.memo_hits, 1);
}

#[test]
fn optional_values() {
    let grammar = Grammar::new();

    // Over a generating rule: the inner value or Null.
    let root = Expr::seq([Expr::maybe(number()), Expr::lit("!")]);
    assert_eq!(
        grammar.parse(root.clone(), "5!").unwrap().value,
        Value::from("5")
    );
    assert_eq!(grammar.parse(root, "!").unwrap().value, Value::Null);

    // Over a silent rule: a boolean match flag.
    let root = Expr::maybe(Expr::lit("a"));
    assert_eq!(
        grammar.parse(root.clone(), "a").unwrap().value,
        Value::Bool(true)
    );
    assert_eq!(grammar.parse(root, "").unwrap().value, Value::Bool(false));
}

#[test]
fn sequence_value_shapes() {
    let grammar = Grammar::new();

    // No generating part: null.
    let output = grammar
        .parse(Expr::seq([Expr::lit("a"), Expr::lit("b")]), "ab")
        .unwrap();
    assert_eq!(output.value, Value::Null);

    // One generating part: its value, punctuation elided.
    let output = grammar
        .parse(
            Expr::seq([Expr::lit("("), number(), Expr::lit(")")]),
            "(7)",
        )
        .unwrap();
    assert_eq!(output.value, Value::from("7"));

    // Two or more: the ordered list.
    let output = grammar
        .parse(
            Expr::seq([
                Expr::text(Expr::any()),
                Expr::lit("-"),
                Expr::text(Expr::any()),
            ]),
            "a-b",
        )
        .unwrap();
    assert_eq!(output.value, Value::List(vec!["a".into(), "b".into()]));
}

#[test]
fn skip_silences_a_generating_rule() {
    let grammar = Grammar::new();
    let word = Expr::text(Expr::plus(Expr::char_if(|c| c.is_ascii_alphabetic())));
    let root = Expr::seq([Expr::skip(number()), word]);
    let output = grammar.parse(root, "12 ab").unwrap();
    assert_eq!(output.value, Value::from("ab"));
}

#[test]
fn text_with_custom_extractor() {
    let grammar = Grammar::new();
    let int = Expr::text_with(Expr::plus(digit()), |text, start, end| {
        Value::Int(text[start..end].parse().unwrap_or(0))
    });
    let output = grammar.parse(int, " 42 ").unwrap();
    assert_eq!(output.value, Value::Int(42));
}

#[test]
fn tag_labels_its_value() {
    let grammar = Grammar::new();
    let output = grammar.parse(Expr::tag("num", number()), "5").unwrap();
    assert_eq!(
        output.value,
        Value::List(vec!["num".into(), "5".into()])
    );
}

#[test]
fn lexical_mode_suppresses_inner_whitespace_skipping() {
    let word = Expr::plus(Expr::char_if(|c| c.is_ascii_alphabetic()));

    let mut grammar = Grammar::new();
    grammar
        .rule("word", Expr::text(Expr::lex(word.clone())))
        .unwrap();
    let output = grammar.parse(Expr::plus(Expr::sym("word")), "ab cd").unwrap();
    assert_eq!(output.value, Value::List(vec!["ab".into(), "cd".into()]));

    // Without lexical mode the same repetition runs straight through the
    // space.
    let output = grammar.parse(Expr::text(word), "ab cd").unwrap();
    assert_eq!(output.value, Value::from("ab cd"));
}

#[test]
fn named_lexical_rules_appear_bare_in_the_expected_set() {
    let mut grammar = Grammar::new();
    grammar
        .rule("num", Expr::lex_named("number", Expr::plus(digit())))
        .unwrap();
    let root = Expr::choice([Expr::sym("num"), Expr::lit("x")]);
    let err = grammar.parse(root, "?").unwrap_err();
    let ParseError::Syntax(syntax) = err else {
        panic!("expected a syntax error, got {err:?}");
    };
    assert_eq!(syntax.expected, vec!["number", "'x'"]);
    assert!(
        syntax
            .to_string()
            .starts_with("Expected number or 'x' but found '?'")
    );
}

#[test]
fn error_rule_aborts_instead_of_failing() {
    let grammar = Grammar::new();
    let root = Expr::choice([Expr::lit("a"), Expr::error("boom")]);
    let err = grammar.parse(root, "b").unwrap_err();
    assert_eq!(
        err,
        ParseError::Abort {
            pos: 0,
            message: "boom".to_string(),
        }
    );

    // An abort is not a failure: ordered choice does not move past it.
    let root = Expr::choice([Expr::error("first"), Expr::lit("b")]);
    let err = grammar.parse(root, "b").unwrap_err();
    assert!(matches!(err, ParseError::Abort { .. }));
}

#[test]
fn repetition_boundaries() {
    let grammar = Grammar::new();

    // Zero repetitions of a starred rule match the empty input.
    let output = grammar.parse(Expr::star(digit()), "").unwrap();
    assert_eq!(output.value, Value::List(vec![]));

    // A plus requires at least one.
    assert!(grammar.parse(Expr::plus(digit()), "").is_err());

    // A literal cannot match the empty input.
    let err = grammar.parse(Expr::lit("a"), "").unwrap_err();
    let ParseError::Syntax(syntax) = err else {
        panic!("expected a syntax error, got {err:?}");
    };
    assert_eq!(syntax.found, "end of file");
}

#[test]
fn trailing_separator_is_left_for_the_caller() {
    let grammar = Grammar::new();
    let root = Expr::seq([
        Expr::star_sep(number(), Expr::lit(",")),
        Expr::maybe(Expr::lit(",")),
    ]);

    let output = grammar.parse(root.clone(), "1,2,3,").unwrap();
    assert_eq!(
        output.value,
        Value::List(vec![
            Value::List(vec!["1".into(), "2".into(), "3".into()]),
            Value::Bool(true),
        ])
    );

    let output = grammar.parse(root, "1,2,3").unwrap();
    assert_eq!(
        output.value,
        Value::List(vec![
            Value::List(vec!["1".into(), "2".into(), "3".into()]),
            Value::Bool(false),
        ])
    );
}

#[test]
fn separator_rejects_a_dangling_item_boundary() {
    let grammar = Grammar::new();
    // "1,,2" stops after the first item; the stray separator is trailing
    // input.
    let err = grammar
        .parse(Expr::plus_sep(number(), Expr::lit(",")), "1,,2")
        .unwrap_err();
    assert!(matches!(err, ParseError::Syntax(_)));
}

#[test]
fn recursive_grammar_through_symbols() {
    let mut grammar = Grammar::new();
    grammar.rule("number", number()).unwrap();
    grammar
        .rule(
            "term",
            Expr::choice([
                Expr::seq([Expr::lit("("), Expr::sym("expr"), Expr::lit(")")]),
                Expr::sym("number"),
            ]),
        )
        .unwrap();
    grammar
        .rule(
            "expr",
            Expr::choice([
                Expr::seq_map(
                    [Expr::sym("term"), Expr::lit("+"), Expr::sym("expr")],
                    |mut values| {
                        let rhs = values.pop().unwrap_or(Value::Null);
                        let lhs = values.pop().unwrap_or(Value::Null);
                        Value::List(vec!["+".into(), lhs, rhs])
                    },
                ),
                Expr::sym("term"),
            ]),
        )
        .unwrap();

    let output = grammar.parse(Expr::sym("expr"), "1 + 2 + 3").unwrap();
    assert_eq!(
        output.value,
        Value::List(vec![
            "+".into(),
            "1".into(),
            Value::List(vec!["+".into(), "2".into(), "3".into()]),
        ])
    );

    let output = grammar.parse(Expr::sym("expr"), "(1 + 2) + 3").unwrap();
    assert_eq!(
        output.value,
        Value::List(vec![
            "+".into(),
            Value::List(vec!["+".into(), "1".into(), "2".into()]),
            "3".into(),
        ])
    );
}

#[test]
fn comments_as_whitespace() {
    let mut grammar = Grammar::new();
    grammar
        .set_whitespace(Some(Expr::choice([
            Expr::one_of(" \t\r\n"),
            Expr::seq([Expr::lit("#"), Expr::star(Expr::char_if(|c| c != '\n'))]),
        ])))
        .unwrap();
    let root = Expr::seq([Expr::lit("a"), Expr::lit("b")]);
    let output = grammar.parse(root, "a # comment\n b # tail").unwrap();
    assert_eq!(output.value, Value::Null);
}

#[test]
fn end_rule_tolerates_trailing_whitespace() {
    let grammar = Grammar::new();
    let root = Expr::seq([Expr::lit("a"), Expr::end()]);
    assert!(grammar.parse(root.clone(), "a   ").is_ok());
    assert!(grammar.parse(root, "a b").is_err());
}

#[test]
fn furthest_failure_wins_across_alternatives() {
    let mut grammar = Grammar::new();
    grammar.rule("number", number()).unwrap();
    let root = Expr::choice([
        Expr::seq([Expr::sym("number"), Expr::lit("+"), Expr::sym("number")]),
        Expr::seq([Expr::sym("number"), Expr::lit("-")]),
    ]);
    // Both alternatives fail, but the first got furthest: past the '+'.
    let err = grammar.parse(root, "1 + x").unwrap_err();
    let ParseError::Syntax(syntax) = err else {
        panic!("expected a syntax error, got {err:?}");
    };
    assert_eq!(syntax.pos, 4);
    assert_eq!(syntax.found, "'x'");
}
