//! This file demonstrates how to build a left-recursive calculator grammar and evaluate expressions with Packrat
//!
//! Usage: `cargo run --example calculator -- "(3 + 9.3 / 3) / (5 / (2 / 3))"`

use packrat::analysis::prepare_grammar;
use packrat::grammar::{CharClass, Expr, Grammar, Rule};
use packrat::runtime::{parse, CodeError, Context, ParseOptions, Value};
use std::time::Instant;

static DEFAULT_SUBJECT: &str = "(3 + 9.3 / 3) / (5 / (2 / 3))";

/// Get a number bound to a label
fn number(ctx: &Context<'_>, label: &str) -> f64 {
    ctx.label(label).and_then(Value::as_float).unwrap_or(f64::NAN)
}

/// `rule op operand`, applying `apply` to both sides
fn operation(rule: &str, op: &'static str, operand: &str, apply: fn(f64, f64) -> f64) -> Expr {
    Expr::action(
        Expr::seq(vec![
            Expr::label("left", Expr::rule(rule)),
            Expr::lit(op),
            Expr::rule("S"),
            Expr::label("right", Expr::rule(operand)),
        ]),
        move |ctx| Ok(Value::Float(apply(number(ctx, "left"), number(ctx, "right")))),
    )
}

fn digits() -> Expr {
    Expr::plus(Expr::class(CharClass::new().with_range('0', '9')))
}

// main    = S expr !.
// expr    = expr '+' S term / expr '-' S term / term
// term    = term '*' S operand / term '/' S operand / operand
// operand = '(' S expr ')' S / number S
// number  = [0-9]+ ('.' [0-9]+)?
// S       = [ \t]*
fn grammar() -> Grammar {
    Grammar::new(vec![
        Rule::new(
            "main",
            Expr::action(
                Expr::seq(vec![
                    Expr::rule("S"),
                    Expr::label("value", Expr::rule("expr")),
                    Expr::not(Expr::any()),
                ]),
                |ctx| Ok(Value::Float(number(ctx, "value"))),
            ),
        ),
        Rule::new(
            "expr",
            Expr::choice(vec![
                operation("expr", "+", "term", |a, b| a + b),
                operation("expr", "-", "term", |a, b| a - b),
                Expr::rule("term"),
            ]),
        )
        .with_display_name("expression"),
        Rule::new(
            "term",
            Expr::choice(vec![
                operation("term", "*", "operand", |a, b| a * b),
                operation("term", "/", "operand", |a, b| a / b),
                Expr::rule("operand"),
            ]),
        ),
        Rule::new(
            "operand",
            Expr::choice(vec![
                Expr::action(
                    Expr::seq(vec![
                        Expr::lit("("),
                        Expr::rule("S"),
                        Expr::label("inner", Expr::rule("expr")),
                        Expr::lit(")"),
                        Expr::rule("S"),
                    ]),
                    |ctx| Ok(Value::Float(number(ctx, "inner"))),
                ),
                Expr::action(
                    Expr::seq(vec![Expr::label("number", Expr::rule("number")), Expr::rule("S")]),
                    |ctx| Ok(Value::Float(number(ctx, "number"))),
                ),
            ]),
        ),
        Rule::new(
            "number",
            Expr::action(
                Expr::seq(vec![digits(), Expr::opt(Expr::seq(vec![Expr::lit("."), digits()]))]),
                |ctx| {
                    ctx.text()
                        .parse::<f64>()
                        .map(Value::Float)
                        .map_err(|err| CodeError::new(err.to_string()).with_fallback(f64::NAN))
                },
            ),
        ),
        Rule::new("S", Expr::star(Expr::class(CharClass::new().with_chars(" \t")))),
    ])
    .unwrap_or_else(|err| panic!("Invalid calculator grammar: {}", err))
}

fn main() {
    let subject = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SUBJECT.to_string());

    // Measure performances
    let now = Instant::now();

    // Build and analyze the grammar
    let mut grammar = grammar();

    prepare_grammar(&mut grammar)
        .unwrap_or_else(|err| panic!("Failed to analyze calculator grammar: {}", err));

    let elapsed = now.elapsed();

    println!(
        "Grammar in: {}.{:#003} ms{}",
        elapsed.as_millis(),
        elapsed.subsec_micros(),
        if cfg!(debug_assertions) {
            " [WARNING: debug mode heavily impacts performances]"
        } else {
            ""
        }
    );

    // Measure performances
    let now = Instant::now();

    // Evaluate the input
    let parsed = parse(&grammar, subject.as_bytes(), &ParseOptions::new().memoize(true));

    let elapsed = now.elapsed();

    println!("Expression: {}", subject);

    println!(
        "Parse time: {}.{:#003} ms{}",
        elapsed.as_millis(),
        elapsed.subsec_micros(),
        if cfg!(debug_assertions) {
            " [WARNING: debug mode heavily impacts performances]"
        } else {
            ""
        }
    );

    match parsed.into_result() {
        Ok(value) => println!("Result: {}", value),
        Err(errors) => {
            eprintln!("{}", errors);
            std::process::exit(1);
        }
    }
}
