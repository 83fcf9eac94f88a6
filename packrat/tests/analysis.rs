//! Nullability, first-call graph and left-recursion classification

use packrat::analysis::{compute_nullables, make_first_graph, prepare_grammar, AnalysisError};
use packrat::grammar::{Expr, Grammar, Rule};
use packrat::runtime::{parse, ParseOptions};
use rstest::rstest;

fn grammar(rules: Vec<Rule>) -> Grammar {
    Grammar::new(rules).unwrap()
}

fn flags(grammar: &Grammar, name: &str) -> (bool, bool) {
    let rule = grammar.rule(name).unwrap();
    (rule.is_left_recursive(), rule.is_leader())
}

// start = expr NEWLINE
// expr  = '-' term / expr '+' term / term
// term  = NUMBER
fn direct_left_recursion() -> Grammar {
    grammar(vec![
        Rule::new(
            "start",
            Expr::seq(vec![Expr::rule("expr"), Expr::rule("NEWLINE")]),
        ),
        Rule::new(
            "expr",
            Expr::choice(vec![
                Expr::seq(vec![Expr::lit("-"), Expr::rule("term")]),
                Expr::seq(vec![Expr::rule("expr"), Expr::lit("+"), Expr::rule("term")]),
                Expr::rule("term"),
            ]),
        ),
        Rule::new("term", Expr::rule("NUMBER")),
    ])
}

// start = foo 'E'
// foo   = bar 'A' / 'B'
// bar   = foo 'C' / 'D'
fn mutual_left_recursion() -> Grammar {
    grammar(vec![
        Rule::new("start", Expr::seq(vec![Expr::rule("foo"), Expr::lit("E")])),
        Rule::new(
            "foo",
            Expr::choice(vec![
                Expr::seq(vec![Expr::rule("bar"), Expr::lit("A")]),
                Expr::lit("B"),
            ]),
        ),
        Rule::new(
            "bar",
            Expr::choice(vec![
                Expr::seq(vec![Expr::rule("foo"), Expr::lit("C")]),
                Expr::lit("D"),
            ]),
        ),
    ])
}

// start = foo
// foo   = bar '+' / baz '+' / '+'
// bar   = baz '-' / foo '-' / '-'
// baz   = foo '*' / bar '*' / '*'
fn leaderless_left_recursion() -> Grammar {
    let alternatives = |first: &str, second: &str, op: &str| {
        Expr::choice(vec![
            Expr::seq(vec![Expr::rule(first), Expr::lit(op)]),
            Expr::seq(vec![Expr::rule(second), Expr::lit(op)]),
            Expr::lit(op),
        ])
    };

    grammar(vec![
        Rule::new("start", Expr::rule("foo")),
        Rule::new("foo", alternatives("bar", "baz", "+")),
        Rule::new("bar", alternatives("baz", "foo", "-")),
        Rule::new("baz", alternatives("foo", "bar", "*")),
    ])
}

#[test]
fn classifies_direct_left_recursion() {
    let mut grammar = direct_left_recursion();

    assert_eq!(prepare_grammar(&mut grammar), Ok(true));
    assert_eq!(flags(&grammar, "expr"), (true, true));
    assert_eq!(flags(&grammar, "start"), (false, false));
    assert_eq!(flags(&grammar, "term"), (false, false));
}

#[test]
fn elects_a_single_leader_in_mutual_recursion() {
    let mut grammar = mutual_left_recursion();

    assert_eq!(prepare_grammar(&mut grammar), Ok(true));
    assert_eq!(flags(&grammar, "start"), (false, false));

    let (foo_recursive, foo_leader) = flags(&grammar, "foo");
    let (bar_recursive, bar_leader) = flags(&grammar, "bar");

    assert!(foo_recursive && bar_recursive);
    assert!(foo_leader ^ bar_leader);

    // Election is deterministic
    assert!(bar_leader);
}

#[test]
fn rejects_groups_without_leader() {
    let mut grammar = leaderless_left_recursion();

    match prepare_grammar(&mut grammar) {
        Err(AnalysisError::NoLeader(group)) => assert_eq!(group, vec!["bar", "baz", "foo"]),
        other => panic!("expected a missing leader, got {:?}", other),
    }
}

#[test]
fn grammars_without_left_recursion_are_not_flagged() {
    let mut grammar = grammar(vec![
        Rule::new("list", Expr::seq(vec![Expr::rule("item"), Expr::star(Expr::rule("tail"))])),
        Rule::new("tail", Expr::seq(vec![Expr::lit(","), Expr::rule("item")])),
        Rule::new(
            "item",
            Expr::choice(vec![
                Expr::lit("x"),
                Expr::seq(vec![Expr::lit("("), Expr::rule("list"), Expr::lit(")")]),
            ]),
        ),
    ]);

    assert_eq!(prepare_grammar(&mut grammar), Ok(false));

    for rule in grammar.rules() {
        assert!(!rule.is_left_recursive(), "{} is not left-recursive", rule.name());
    }
}

#[test]
fn nullable_prefix_exposes_left_recursion() {
    // a = 'x'? a 'y' / 'z'
    let mut grammar = grammar(vec![Rule::new(
        "a",
        Expr::choice(vec![
            Expr::seq(vec![Expr::opt(Expr::lit("x")), Expr::rule("a"), Expr::lit("y")]),
            Expr::lit("z"),
        ]),
    )]);

    assert_eq!(prepare_grammar(&mut grammar), Ok(true));
    assert_eq!(flags(&grammar, "a"), (true, true));
}

#[test]
fn first_graph_includes_undeclared_initial_names() {
    let mut grammar = direct_left_recursion();
    compute_nullables(&mut grammar);

    let graph = make_first_graph(&grammar);

    assert_eq!(
        graph.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["NUMBER", "expr", "start", "term"]
    );
    assert!(graph["NUMBER"].is_empty());
    assert_eq!(
        graph["expr"].iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["expr", "term"]
    );
}

// a = b c
// b = 'x'?
// c = b*
// d = 'y' / a
// e = d 'z'
// f = e / g
// g = f 'w' / h
// h = !'q' ""
// i = 'k'+
// j = ""+
fn nullability_grammar() -> Grammar {
    grammar(vec![
        Rule::new("a", Expr::seq(vec![Expr::rule("b"), Expr::rule("c")])),
        Rule::new("b", Expr::opt(Expr::lit("x"))),
        Rule::new("c", Expr::star(Expr::rule("b"))),
        Rule::new("d", Expr::choice(vec![Expr::lit("y"), Expr::rule("a")])),
        Rule::new("e", Expr::seq(vec![Expr::rule("d"), Expr::lit("z")])),
        Rule::new("f", Expr::choice(vec![Expr::rule("e"), Expr::rule("g")])),
        Rule::new(
            "g",
            Expr::choice(vec![
                Expr::seq(vec![Expr::rule("f"), Expr::lit("w")]),
                Expr::rule("h"),
            ]),
        ),
        Rule::new("h", Expr::seq(vec![Expr::not(Expr::lit("q")), Expr::lit("")])),
        Rule::new("i", Expr::plus(Expr::lit("k"))),
        Rule::new("j", Expr::plus(Expr::lit(""))),
    ])
}

#[rstest]
#[case("a", true)]
#[case("b", true)]
#[case("c", true)]
#[case("d", true)]
#[case("e", false)]
#[case("f", true)]
#[case("g", true)]
#[case("h", true)]
#[case("i", false)]
#[case("j", true)]
fn nullability_matches_execution(#[case] name: &str, #[case] nullable: bool) {
    let mut grammar = nullability_grammar();
    prepare_grammar(&mut grammar).unwrap();

    let rule = grammar.rule(name).unwrap();
    assert_eq!(rule.is_nullable(), nullable);
    assert_eq!(rule.expr().is_nullable_in(&grammar), nullable);

    let parsed = parse(&grammar, b"", &ParseOptions::new().entrypoint(name));

    assert_eq!(parsed.is_success(), nullable, "{}", parsed.errors());
    assert_eq!(parsed.end().offset, 0);
}
