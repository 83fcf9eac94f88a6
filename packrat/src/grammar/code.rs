use crate::runtime::{CodeError, Context, StateContext, Value};
use std::fmt;
use std::sync::Arc;

/// Signature of an action's code block
pub type ActionFn = dyn Fn(&mut Context<'_>) -> Result<Value, CodeError> + Send + Sync;

/// Signature of a code predicate (`&{ }` and `!{ }`)
pub type PredicateFn = dyn Fn(&mut Context<'_>) -> Result<bool, CodeError> + Send + Sync;

/// Signature of a state-changing code block (`#{ }`)
pub type StateFn = dyn Fn(&mut StateContext<'_>) -> Result<(), CodeError> + Send + Sync;

/// User code attached to an [`Expr::Action`](super::Expr::Action)
///
/// The closure receives the labels bound by the wrapped expression along with the matched text,
/// and its return value replaces the expression's value.
#[derive(Clone)]
pub struct ActionCode(Arc<ActionFn>);

impl ActionCode {
    pub fn new(
        code: impl Fn(&mut Context<'_>) -> Result<Value, CodeError> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(code))
    }

    pub(crate) fn run(&self, ctx: &mut Context<'_>) -> Result<Value, CodeError> {
        (self.0)(ctx)
    }
}

/// User code attached to an [`Expr::AndCode`](super::Expr::AndCode) or [`Expr::NotCode`](super::Expr::NotCode)
#[derive(Clone)]
pub struct PredicateCode(Arc<PredicateFn>);

impl PredicateCode {
    pub fn new(
        code: impl Fn(&mut Context<'_>) -> Result<bool, CodeError> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(code))
    }

    pub(crate) fn run(&self, ctx: &mut Context<'_>) -> Result<bool, CodeError> {
        (self.0)(ctx)
    }
}

/// User code attached to an [`Expr::StateCode`](super::Expr::StateCode)
///
/// This is the only kind of code block allowed to modify the parser's state dictionary.
#[derive(Clone)]
pub struct StateCode(Arc<StateFn>);

impl StateCode {
    pub fn new(
        code: impl Fn(&mut StateContext<'_>) -> Result<(), CodeError> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(code))
    }

    pub(crate) fn run(&self, ctx: &mut StateContext<'_>) -> Result<(), CodeError> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for ActionCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ActionCode {{ .. }}")
    }
}

impl fmt::Debug for PredicateCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PredicateCode {{ .. }}")
    }
}

impl fmt::Debug for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "StateCode {{ .. }}")
    }
}
