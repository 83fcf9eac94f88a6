//! # Packrat
//!
//! Packrat is a PEG analysis and execution engine.
//!
//! It takes a [grammar](`grammar::Grammar`) built from rules and parsing expressions, [analyzes](`analysis::prepare_grammar`) it
//! to find out which rules are nullable or left-recursive, then [runs](`runtime::parse`) it against an input.
//!
//! Results can be cached per position (packrat parsing) for a linear parsing time, and left-recursive rules
//! are evaluated by growing a seed from the leader of their group.
//!
//! ## Usage
//!
//! ```rust
//! use packrat::analysis::prepare_grammar;
//! use packrat::grammar::{CharClass, Expr, Grammar, Rule};
//! use packrat::runtime::{parse, ParseOptions, Value};
//!
//! // 1. Define the grammar
//! //
//! // sum = sum '+' num / num
//! // num = [0-9]+
//! let mut grammar = Grammar::new(vec![
//!     Rule::new("sum", Expr::choice(vec![
//!         Expr::action(
//!             Expr::seq(vec![
//!                 Expr::label("left", Expr::rule("sum")),
//!                 Expr::lit("+"),
//!                 Expr::label("right", Expr::rule("num")),
//!             ]),
//!             |ctx| {
//!                 let left = ctx.label("left").and_then(Value::as_int).unwrap_or(0);
//!                 let right = ctx.label("right").and_then(Value::as_int).unwrap_or(0);
//!                 Ok(Value::Int(left + right))
//!             },
//!         ),
//!         Expr::rule("num"),
//!     ])),
//!     Rule::new("num", Expr::action(
//!         Expr::plus(Expr::class(CharClass::new().with_range('0', '9'))),
//!         |ctx| ctx.text().parse::<i64>().map(Value::Int).map_err(|err| err.to_string().into()),
//!     )),
//! ])
//! .unwrap();
//!
//! // 2. Analyze it
//! prepare_grammar(&mut grammar).unwrap();
//!
//! // 3. Run it
//! let parsed = parse(&grammar, b"1+20+300", &ParseOptions::new().memoize(true));
//!
//! // 4. Play with the result!
//! assert_eq!(parsed.into_result().unwrap(), Value::Int(321));
//! ```

#![forbid(unsafe_code)]
#![forbid(unused_must_use)]

pub mod analysis;
pub mod grammar;
pub mod runtime;
