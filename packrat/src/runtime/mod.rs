//! # Packrat runtime
//!
//! This module contains the [executor](executor::parse) which matches an input against an analyzed [grammar](crate::grammar::Grammar).
//!
//! Every rule and expression is evaluated at most once per position when [memoization](ParseOptions::memoize) is enabled,
//! and left-recursive rules are supported by growing a seed from their group's leader.

mod context;
mod cursor;
mod data;
mod errors;
mod executor;
mod memo;
mod options;

pub use context::{CodeError, Context, StateContext};
pub use cursor::Position;
pub use data::*;
pub use errors::*;
pub use executor::*;
pub use options::*;
