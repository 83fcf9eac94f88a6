use super::cursor::Savepoint;
use super::data::{Store, Value};
use crate::grammar::{Expr, Rule};
use hashbrown::HashMap;
use std::rc::Rc;

/// Identity of a memoized node
///
/// Nodes are identified by address, which is stable as the grammar is borrowed for the whole parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Node {
    Rule(usize),
    Expr(usize),
}

impl Node {
    pub(crate) fn rule(rule: &Rule) -> Self {
        Self::Rule(rule as *const Rule as usize)
    }

    pub(crate) fn expr(expr: &Expr) -> Self {
        Self::Expr(expr as *const Expr as usize)
    }
}

/// Memoized result of a node at a given offset
#[derive(Debug, Clone)]
pub(crate) struct MemoEntry {
    /// Matched value, `None` if the node failed
    pub(crate) value: Option<Value>,

    /// Cursor after the evaluation
    pub(crate) end: Savepoint,

    /// State dictionary the evaluation started from
    pub(crate) entry_state: Rc<Store>,

    /// State dictionary after the evaluation, replayed on a hit
    pub(crate) state: Rc<Store>,

    /// Seed of a left-recursive leader being grown, valid whatever the current state
    pub(crate) growing: bool,
}

impl MemoEntry {
    /// Check if the entry can stand for an evaluation starting from `state`
    pub(crate) fn applies_to(&self, state: &Rc<Store>) -> bool {
        self.growing || Rc::ptr_eq(&self.entry_state, state) || *self.entry_state == **state
    }
}

/// Memoization key: the node, the offset it was evaluated at, and whether a negative
/// lookahead was active (which changes what failures get tracked)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct MemoKey {
    pub(crate) node: Node,
    pub(crate) offset: usize,
    pub(crate) inverted: bool,
}

/// Memoization table: `MemoKey` -> `MemoEntry`
#[derive(Debug, Default)]
pub(crate) struct MemoTable {
    entries: HashMap<MemoKey, MemoEntry>,
}

impl MemoTable {
    pub(crate) fn get(&self, key: &MemoKey) -> Option<&MemoEntry> {
        self.entries.get(key)
    }

    pub(crate) fn set(&mut self, key: MemoKey, entry: MemoEntry) {
        self.entries.insert(key, entry);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
