//! End-to-end scenarios of the executor

use packrat::analysis::prepare_grammar;
use packrat::grammar::{CharClass, Expr, Grammar, Rule};
use packrat::runtime::{parse, parse_reader, CodeError, Context, ErrorKind, ParseOptions, Parsed, Value};
use rstest::rstest;

fn grammar(rules: Vec<Rule>) -> Grammar {
    let mut grammar = Grammar::new(rules).unwrap();
    prepare_grammar(&mut grammar).unwrap();
    grammar
}

fn run(rules: Vec<Rule>, input: &str) -> Parsed {
    parse(&grammar(rules), input.as_bytes(), &ParseOptions::new())
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn digit() -> Expr {
    Expr::class(CharClass::new().with_range('0', '9'))
}

#[test]
fn repetition_stops_before_mismatch() {
    let parsed = run(vec![Rule::new("A", Expr::plus(Expr::lit("a")))], "aab");

    assert_eq!(parsed.value(), Some(&Value::List(vec![text("a"), text("a")])));
    assert_eq!(parsed.end().offset, 2);
    assert!(parsed.errors().is_empty());
}

#[test]
fn positive_lookahead_does_not_consume() {
    let parsed = run(
        vec![Rule::new("A", Expr::seq(vec![Expr::lit("a"), Expr::and(Expr::lit("b"))]))],
        "ab",
    );

    assert_eq!(parsed.value(), Some(&Value::List(vec![text("a"), Value::Nil])));
    assert_eq!(parsed.end().offset, 1);
}

#[test]
fn negative_lookahead_passes_on_mismatch() {
    let parsed = run(
        vec![Rule::new("A", Expr::seq(vec![Expr::lit("a"), Expr::not(Expr::lit("b"))]))],
        "aab",
    );

    assert!(parsed.is_success());
    assert_eq!(parsed.end().offset, 1);
}

#[test]
fn empty_grammar_is_rejected() {
    let parsed = parse(&Grammar::default(), b"anything", &ParseOptions::new());

    assert!(!parsed.is_success());
    assert_eq!(parsed.errors().len(), 1);
    assert_eq!(parsed.errors().first().unwrap().kind(), &ErrorKind::NoRule);
    assert_eq!(parsed.errors().to_string(), "1:0 (0): grammar has no rule");
}

#[test]
fn reports_farthest_failure() {
    let parsed = run(vec![Rule::new("A", Expr::lit("ab"))], "a");
    let err = parsed.errors().first().unwrap();

    assert_eq!(err.position().offset, 1);
    assert_eq!(err.expected(), ["\"ab\""]);
    assert_eq!(err.to_string(), "1:2 (1): no match found, expected: \"ab\"");
    assert_eq!(parsed.end().offset, 0);
}

#[test]
fn merges_expectations_at_the_same_position() {
    let parsed = run(
        vec![Rule::new(
            "A",
            Expr::choice(vec![Expr::lit("ab"), Expr::lit("ac"), digit()]),
        )],
        "ad",
    );

    assert_eq!(
        parsed.errors().to_string(),
        "1:2 (1): no match found, expected: \"ab\" or \"ac\""
    );
}

#[test]
fn expected_end_of_input_is_listed_last() {
    let parsed = run(
        vec![Rule::new(
            "A",
            Expr::seq(vec![
                Expr::lit("a"),
                Expr::choice(vec![Expr::lit("c"), Expr::not(Expr::any())]),
            ]),
        )],
        "ab",
    );

    assert_eq!(
        parsed.errors().to_string(),
        "1:2 (1): no match found, expected: \"c\" or EOF"
    );
}

#[test]
fn tracks_lines_and_columns() {
    let parsed = run(
        vec![Rule::new(
            "A",
            Expr::seq(vec![Expr::lit("a"), Expr::lit("\n"), Expr::lit("b"), Expr::lit("c")]),
        )],
        "a\nbd",
    );

    assert_eq!(
        parsed.errors().to_string(),
        "2:2 (3): no match found, expected: \"c\""
    );
}

#[rstest]
#[case::sequence(Expr::seq(vec![Expr::lit("a"), Expr::lit("b"), Expr::lit("c")]))]
#[case::choice(Expr::choice(vec![
    Expr::seq(vec![Expr::lit("a"), Expr::lit("x")]),
    Expr::seq(vec![Expr::lit("a"), Expr::lit("b"), Expr::lit("x")]),
]))]
#[case::and(Expr::and(Expr::lit("abx")))]
#[case::not(Expr::not(Expr::lit("ab")))]
#[case::one_or_more(Expr::plus(Expr::seq(vec![Expr::lit("ab"), Expr::lit("c")])))]
fn failures_restore_the_cursor(#[case] expr: Expr) {
    let parsed = run(vec![Rule::new("A", expr)], "abd");

    assert!(!parsed.is_success());
    assert_eq!(parsed.end().offset, 0);
}

#[test]
fn choice_takes_first_matching_alternative() {
    let parsed = run(
        vec![Rule::new(
            "A",
            Expr::choice(vec![
                Expr::seq(vec![Expr::lit("a"), Expr::lit("b"), Expr::lit("c")]),
                Expr::lit("a"),
                Expr::lit("ab"),
            ]),
        )],
        "abd",
    );

    assert_eq!(parsed.value(), Some(&text("a")));
    assert_eq!(parsed.end().offset, 1);
}

#[test]
fn optional_miss_produces_nil() {
    let parsed = run(
        vec![Rule::new("A", Expr::seq(vec![Expr::opt(Expr::lit("x")), Expr::lit("y")]))],
        "y",
    );

    assert_eq!(parsed.value(), Some(&Value::List(vec![Value::Nil, text("y")])));
}

#[test]
fn empty_matches_do_not_loop() {
    let parsed = run(vec![Rule::new("A", Expr::star(Expr::opt(Expr::lit("x"))))], "xxy");

    assert_eq!(
        parsed.value(),
        Some(&Value::List(vec![text("x"), text("x"), Value::Nil]))
    );
    assert_eq!(parsed.end().offset, 2);
}

#[rstest]
#[case("hello", true)]
#[case("HELLO", true)]
#[case("hELlo", true)]
#[case("help!", false)]
fn case_insensitive_literals(#[case] input: &str, #[case] matches: bool) {
    let parsed = run(vec![Rule::new("A", Expr::lit_i("HeLLo"))], input);

    assert_eq!(parsed.is_success(), matches);

    if !matches {
        assert_eq!(
            parsed.errors().to_string(),
            "1:4 (3): no match found, expected: \"HeLLo\"i"
        );
    }
}

#[rstest]
#[case("É", true)]
#[case("z", true)]
#[case("é", false)]
#[case("", false)]
fn char_classes(#[case] input: &str, #[case] matches: bool) {
    let class = CharClass::new()
        .with_range('x', 'z')
        .with_category("Lu")
        .unwrap();

    let parsed = run(vec![Rule::new("A", Expr::class(class))], input);
    assert_eq!(parsed.is_success(), matches);
}

#[rstest]
#[case("a", false)]
#[case("b", true)]
#[case("", false)]
fn inverted_classes_never_match_end_of_input(#[case] input: &str, #[case] matches: bool) {
    let class = CharClass::new().with_chars("a").inverted();
    let parsed = run(vec![Rule::new("A", Expr::class(class))], input);

    assert_eq!(parsed.is_success(), matches);
}

#[test]
fn undefined_rules_are_reported() {
    let parsed = run(vec![Rule::new("A", Expr::rule("B"))], "x");

    assert!(!parsed.is_success());
    assert_eq!(parsed.errors().to_string(), "1:1 (0): rule A: undefined rule: B");
}

#[test]
fn errors_use_display_names() {
    let parsed = run(
        vec![Rule::new("A", Expr::rule("Missing")).with_display_name("letter A")],
        "x",
    );

    assert_eq!(
        parsed.errors().first().unwrap().rule(),
        Some("letter A")
    );
    assert_eq!(
        parsed.errors().to_string(),
        "1:1 (0): rule letter A: undefined rule: Missing"
    );
}

#[test]
fn actions_receive_labels_and_text() {
    let sum = Expr::action(
        Expr::seq(vec![
            Expr::label("x", Expr::rule("digit")),
            Expr::lit("+"),
            Expr::label("y", Expr::rule("digit")),
        ]),
        |ctx| {
            assert_eq!(ctx.text(), "3+4");
            assert_eq!(ctx.bytes(), &b"3+4"[..]);
            assert_eq!(ctx.position().offset, 0);

            let x = ctx.label("x").and_then(Value::as_int).unwrap_or_default();
            let y = ctx.label("y").and_then(Value::as_int).unwrap_or_default();

            Ok(Value::Int(x + y))
        },
    );

    let digit = Expr::action(digit(), |ctx| {
        ctx.text()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|err| CodeError::new(err.to_string()))
    });

    let parsed = run(vec![Rule::new("sum", sum), Rule::new("digit", digit)], "3+4");

    assert_eq!(parsed.into_result(), Ok(Value::Int(7)));
}

#[test]
fn labels_do_not_leak_from_failed_alternatives() {
    let parsed = run(
        vec![Rule::new(
            "A",
            Expr::action(
                Expr::choice(vec![
                    Expr::seq(vec![Expr::label("x", Expr::lit("a")), Expr::lit("!")]),
                    Expr::lit("a"),
                ]),
                |ctx| Ok(Value::Bool(ctx.label("x").is_some())),
            ),
        )],
        "a",
    );

    assert_eq!(parsed.value(), Some(&Value::Bool(false)));
}

#[test]
fn action_errors_are_recorded_with_fallback() {
    let parsed = run(
        vec![Rule::new(
            "A",
            Expr::seq(vec![
                Expr::lit("x"),
                Expr::action(Expr::lit("y"), |_| {
                    Err(CodeError::new("not a number").with_fallback(0i64))
                }),
            ]),
        )],
        "xy",
    );

    assert_eq!(parsed.value(), Some(&Value::List(vec![text("x"), Value::Int(0)])));
    assert_eq!(parsed.errors().to_string(), "1:2 (1): rule A: not a number");
    assert_eq!(parsed.into_result(), Ok(Value::List(vec![text("x"), Value::Int(0)])));
}

#[rstest]
#[case("7", true)]
#[case("3", false)]
fn code_predicates_see_labels(#[case] input: &str, #[case] matches: bool) {
    let parsed = run(
        vec![Rule::new(
            "A",
            Expr::seq(vec![
                Expr::label("n", digit()),
                Expr::and_code(|ctx| Ok(ctx.label("n") == Some(&Value::from("7")))),
            ]),
        )],
        input,
    );

    assert_eq!(parsed.is_success(), matches);
}

#[test]
fn failing_predicates_count_as_false() {
    let failing = || Err(CodeError::new("predicate failed"));

    let parsed = run(vec![Rule::new("A", Expr::and_code(move |_| failing()))], "");
    assert!(!parsed.is_success());
    assert_eq!(parsed.errors().to_string(), "1:1 (0): rule A: predicate failed");

    let parsed = run(vec![Rule::new("A", Expr::not_code(move |_| failing()))], "");
    assert!(parsed.is_success());
    assert_eq!(parsed.errors().len(), 1);
}

fn increment(key: &'static str, by: i64) -> Expr {
    Expr::state_code(move |ctx| {
        let current = ctx.state().get(key).and_then(Value::as_int).unwrap_or(0);
        ctx.state_mut().insert(key.to_string(), Value::Int(current + by));
        Ok(())
    })
}

fn read_state(key: &'static str) -> impl Fn(&mut Context<'_>) -> Result<Value, CodeError> {
    move |ctx| Ok(ctx.state().get(key).cloned().unwrap_or(Value::Nil))
}

#[test]
fn state_is_rolled_back_on_backtracking() {
    let parsed = run(
        vec![Rule::new(
            "A",
            Expr::action(
                Expr::choice(vec![
                    Expr::seq(vec![increment("count", 1), Expr::lit("x")]),
                    Expr::seq(vec![increment("count", 10), Expr::lit("y")]),
                ]),
                read_state("count"),
            ),
        )],
        "y",
    );

    assert_eq!(parsed.value(), Some(&Value::Int(10)));
}

#[test]
fn lookaheads_roll_back_state() {
    let parsed = run(
        vec![Rule::new(
            "A",
            Expr::action(
                Expr::seq(vec![
                    Expr::and(increment("count", 1)),
                    Expr::not(Expr::seq(vec![increment("count", 1), Expr::lit("z")])),
                ]),
                read_state("count"),
            ),
        )],
        "",
    );

    assert_eq!(parsed.value(), Some(&Value::Nil));
}

#[test]
fn initial_state_is_visible() {
    let grammar = grammar(vec![Rule::new(
        "A",
        Expr::action(Expr::seq(vec![]), read_state("mode")),
    )]);

    let parsed = parse(&grammar, b"", &ParseOptions::new().init_state("mode", "strict"));
    assert_eq!(parsed.value(), Some(&text("strict")));
}

#[test]
fn global_store_is_never_rolled_back() {
    let grammar = grammar(vec![
        Rule::new(
            "A",
            Expr::choice(vec![
                Expr::seq(vec![Expr::rule("B"), Expr::lit("x")]),
                Expr::seq(vec![Expr::rule("B"), Expr::lit("y")]),
            ]),
        ),
        Rule::new(
            "B",
            Expr::action(Expr::lit("b"), |ctx| {
                let calls = ctx.global().get("calls").and_then(Value::as_int).unwrap_or(0);
                ctx.global_mut().insert("calls".to_string(), Value::Int(calls + 1));
                Ok(Value::Nil)
            }),
        ),
    ]);

    let parsed = parse(&grammar, b"by", &ParseOptions::new().global("calls", 10i64));

    assert!(parsed.is_success());
    assert_eq!(parsed.global_store().get("calls"), Some(&Value::Int(12)));
}

#[test]
fn starts_from_the_requested_rule() {
    let grammar = grammar(vec![
        Rule::new("A", Expr::lit("a")),
        Rule::new("B", Expr::lit("b")),
    ]);

    let parsed = parse(&grammar, b"b", &ParseOptions::new().entrypoint("B"));
    assert_eq!(parsed.value(), Some(&text("b")));

    let parsed = parse(&grammar, b"b", &ParseOptions::new().entrypoint("C"));
    assert!(!parsed.is_success());
    assert_eq!(
        parsed.errors().first().unwrap().kind(),
        &ErrorKind::InvalidEntrypoint("C".to_string())
    );
}

#[test]
fn aborts_after_max_expressions() {
    let grammar = grammar(vec![Rule::new("A", Expr::star(Expr::lit("a")))]);

    let parsed = parse(&grammar, b"aaaa", &ParseOptions::new().max_expressions(3));
    assert!(!parsed.is_success());
    assert_eq!(parsed.errors().len(), 1);
    assert_eq!(parsed.errors().first().unwrap().kind(), &ErrorKind::MaxExpressions);

    let parsed = parse(&grammar, b"aaaa", &ParseOptions::new().max_expressions(100));
    assert!(parsed.is_success());
}

#[test]
fn reports_invalid_utf8() {
    let grammar = grammar(vec![Rule::new("A", Expr::plus(Expr::any()))]);

    let parsed = parse(&grammar, b"a\xffb", &ParseOptions::new());
    assert_eq!(
        parsed.value(),
        Some(&Value::List(vec![text("a"), text("\u{FFFD}"), text("b")]))
    );
    assert_eq!(parsed.errors().to_string(), "1:2 (1): rule A: invalid encoding");

    let parsed = parse(&grammar, b"a\xffb", &ParseOptions::new().allow_invalid_utf8(true));
    assert!(parsed.is_success());
    assert!(parsed.errors().is_empty());
}

fn panicking_grammar() -> Grammar {
    grammar(vec![Rule::new(
        "A",
        Expr::action(Expr::lit("a"), |_| panic!("boom")),
    )])
}

#[test]
fn recovers_from_panics() {
    let parsed = parse(&panicking_grammar(), b"a", &ParseOptions::new());

    assert!(!parsed.is_success());
    assert_eq!(
        parsed.errors().first().unwrap().kind(),
        &ErrorKind::Panic("boom".to_string())
    );
    assert_eq!(parsed.errors().to_string(), "1:2 (1): rule A: panic: boom");
}

#[test]
#[should_panic(expected = "boom")]
fn propagates_panics_without_recovery() {
    parse(&panicking_grammar(), b"a", &ParseOptions::new().recover(false));
}

#[test]
fn parses_from_readers() {
    let grammar = grammar(vec![Rule::new("A", Expr::plus(digit()))]);
    let parsed = parse_reader(&grammar, std::io::Cursor::new("123"), &ParseOptions::new()).unwrap();

    assert_eq!(parsed.value().map(Value::flatten_text), Some("123".to_string()));
}

#[test]
fn failed_parses_convert_to_errors() {
    let errors = run(vec![Rule::new("A", Expr::lit("a"))], "b")
        .into_result()
        .unwrap_err();

    assert_eq!(errors.messages(), vec!["1:1 (0): no match found, expected: \"a\""]);
}

#[test]
fn reports_no_match_when_no_terminal_was_tried() {
    let parsed = run(vec![Rule::new("A", Expr::and_code(|_| Ok(false)))], "a");

    assert!(!parsed.is_success());
    assert_eq!(parsed.errors().messages(), vec!["1:1 (0): no match found"]);
}

#[rstest]
#[case("1+2+3")]
#[case("1+")]
#[case("x")]
fn debug_tracing_does_not_change_results(
    #[case] input: &str,
    #[values(false, true)] memoize: bool,
) {
    // sum = sum '+' [0-9] / [0-9]
    let grammar = grammar(vec![Rule::new(
        "sum",
        Expr::choice(vec![
            Expr::seq(vec![Expr::rule("sum"), Expr::lit("+"), digit()]),
            digit(),
        ]),
    )]);

    let outcome = |debug: bool| {
        let options = ParseOptions::new().memoize(memoize).debug(debug);
        let parsed = parse(&grammar, input.as_bytes(), &options);

        (parsed.value().cloned(), parsed.errors().messages(), parsed.end().offset)
    };

    assert_eq!(outcome(true), outcome(false));
}
