use super::cursor::Position;
use super::data::{Store, Value};
use hashbrown::HashMap;
use std::borrow::Cow;
use thiserror::Error;

/// Values bound to labels in the current scope
pub(crate) type Labels<'g> = HashMap<&'g str, Value>;

/// Error returned by user code
///
/// Such errors are recorded but don't make the parse fail by themselves.
/// An action may provide a fallback value, used in place of its result.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct CodeError {
    message: String,
    fallback: Option<Value>,
}

impl CodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fallback: None,
        }
    }

    /// Value an action should produce despite the error
    pub fn with_fallback(mut self, value: impl Into<Value>) -> Self {
        self.fallback = Some(value.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn fallback(&self) -> Option<&Value> {
        self.fallback.as_ref()
    }

    pub(crate) fn into_fallback(self) -> Value {
        self.fallback.unwrap_or(Value::Nil)
    }
}

impl From<&str> for CodeError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for CodeError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Data available to actions and code predicates
pub struct Context<'p> {
    pub(crate) position: Position,
    pub(crate) text: &'p [u8],
    pub(crate) labels: Option<&'p Labels<'p>>,
    pub(crate) state: &'p Store,
    pub(crate) global: &'p mut Store,
}

impl<'p> Context<'p> {
    /// Start of the match for actions, current position for predicates
    pub fn position(&self) -> Position {
        self.position
    }

    /// Text matched by the action's expression (empty for predicates)
    pub fn text(&self) -> Cow<'p, str> {
        String::from_utf8_lossy(self.text)
    }

    /// Raw bytes matched by the action's expression
    pub fn bytes(&self) -> &'p [u8] {
        self.text
    }

    /// Get the value bound to a label in the current scope
    pub fn label(&self, name: &str) -> Option<&Value> {
        self.labels.and_then(|labels| labels.get(name))
    }

    /// Get the state dictionary (read-only: use a state code block to change it)
    pub fn state(&self) -> &Store {
        self.state
    }

    pub fn global(&self) -> &Store {
        self.global
    }

    /// Get the global store, which is never rolled back
    pub fn global_mut(&mut self) -> &mut Store {
        self.global
    }
}

/// Data available to state code blocks
pub struct StateContext<'p> {
    pub(crate) position: Position,
    pub(crate) labels: Option<&'p Labels<'p>>,
    pub(crate) state: &'p mut Store,
    pub(crate) global: &'p mut Store,
}

impl<'p> StateContext<'p> {
    pub fn position(&self) -> Position {
        self.position
    }

    /// Get the value bound to a label in the current scope
    pub fn label(&self, name: &str) -> Option<&Value> {
        self.labels.and_then(|labels| labels.get(name))
    }

    pub fn state(&self) -> &Store {
        self.state
    }

    /// Get the state dictionary, whose changes are rolled back if the parser backtracks
    pub fn state_mut(&mut self) -> &mut Store {
        self.state
    }

    pub fn global(&self) -> &Store {
        self.global
    }

    pub fn global_mut(&mut self) -> &mut Store {
        self.global
    }
}
