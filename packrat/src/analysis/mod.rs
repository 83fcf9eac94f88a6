//! # Grammar analysis
//!
//! This module computes the flags the [runtime](crate::runtime) relies on:
//!
//! * which rules may match without consuming any input (nullability)
//! * which rules may call themselves before consuming any input (left recursion)
//! * which rule of each left-recursive group drives its evaluation (leader)
//!
//! Left recursion is a supported condition: the only failure is a left-recursive group
//! whose cycles don't all share a common rule, as no single rule could then grow the group's matches.

mod errors;
mod graph;
mod left_recursion;

pub use errors::*;
pub use graph::*;
pub use left_recursion::*;

use crate::grammar::Grammar;

/// Analyze a grammar and store the results in its rules' flags
///
/// Returns `true` if the grammar contains left recursion.
///
/// ## Example usage
///
/// ```rust
/// use packrat::analysis::prepare_grammar;
/// use packrat::grammar::{Expr, Grammar, Rule};
///
/// // expr = expr '+' num / num
/// let mut grammar = Grammar::new(vec![
///     Rule::new("expr", Expr::choice(vec![
///         Expr::seq(vec![Expr::rule("expr"), Expr::lit("+"), Expr::rule("num")]),
///         Expr::rule("num"),
///     ])),
///     Rule::new("num", Expr::lit("1")),
/// ]).unwrap();
///
/// assert!(prepare_grammar(&mut grammar).unwrap());
/// assert!(grammar.rule("expr").unwrap().is_leader());
/// ```
pub fn prepare_grammar(grammar: &mut Grammar) -> Result<bool, AnalysisError> {
    compute_nullables(grammar);
    compute_left_recursives(grammar)
}
