//! # Grammar model
//!
//! A [`Grammar`] is an ordered list of [`Rule`]s, each owning a tree of [`Expr`]essions.
//!
//! Rules refer to each other by name only ([`Expr::RuleRef`]), so the tree itself is never cyclic.
//! Lookups are performed when the grammar is analyzed or executed.

mod charclass;
mod code;
mod data;
mod errors;

pub use charclass::{category_contains, CharClass, UNICODE_CATEGORIES};
pub use code::*;
pub use data::*;
pub use errors::*;

pub(crate) use charclass::fold;
