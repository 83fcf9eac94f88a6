use super::cursor::Position;
use std::fmt;
use thiserror::Error;

/// Kind of a [`ParserError`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// The grammar has no rule to start from
    #[error("grammar has no rule")]
    NoRule,

    /// The requested entrypoint is not a rule of the grammar
    #[error("invalid entrypoint: {0}")]
    InvalidEntrypoint(String),

    /// A byte of the input is not valid UTF-8
    #[error("invalid encoding")]
    InvalidEncoding,

    /// The maximum number of evaluated expressions was reached
    #[error("max number of expressions parsed")]
    MaxExpressions,

    /// A rule refers to another one which doesn't exist
    #[error("undefined rule: {0}")]
    UndefinedRule(String),

    /// Nothing matched; lists what was expected at the farthest position reached
    #[error("{}", no_match_message(.0))]
    NoMatch(Vec<String>),

    /// Error returned by user code
    #[error("{0}")]
    Code(String),

    /// Panic raised by user code, caught because recovery is enabled
    #[error("panic: {0}")]
    Panic(String),
}

/// A single error, located in the input and attributed to the innermost active rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserError {
    position: Position,
    rule: Option<String>,
    kind: ErrorKind,
}

impl ParserError {
    pub(crate) fn new(position: Position, rule: Option<String>, kind: ErrorKind) -> Self {
        Self {
            position,
            rule,
            kind,
        }
    }

    /// Get the location of the error in the input
    pub fn position(&self) -> Position {
        self.position
    }

    /// Get the display name (or name) of the rule being matched when the error occurred
    pub fn rule(&self) -> Option<&str> {
        self.rule.as_deref()
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// List of what was expected, for a [`ErrorKind::NoMatch`] error
    pub fn expected(&self) -> &[String] {
        match &self.kind {
            ErrorKind::NoMatch(expected) => expected,
            _ => &[],
        }
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.position)?;

        if let Some(rule) = &self.rule {
            write!(f, ": rule {}", rule)?;
        }

        write!(f, ": {}", self.kind)
    }
}

impl std::error::Error for ParserError {}

/// Ordered list of errors, without duplicate messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorList {
    errors: Vec<ParserError>,
}

impl ErrorList {
    /// Add an error, unless another one with the same message was already added
    pub(crate) fn add(&mut self, err: ParserError) {
        let message = err.to_string();

        if !self.errors.iter().any(|other| other.to_string() == message) {
            self.errors.push(err);
        }
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.errors.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParserError> {
        self.errors.iter()
    }

    pub fn first(&self) -> Option<&ParserError> {
        self.errors.first()
    }

    /// Get the rendered message of every error
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a ParserError;
    type IntoIter = std::slice::Iter<'a, ParserError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }

            write!(f, "{}", err)?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorList {}

fn no_match_message(expected: &[String]) -> String {
    if expected.is_empty() {
        // No terminal was tried
        "no match found".to_string()
    } else {
        format!("no match found, expected: {}", list_join(expected, ", ", "or"))
    }
}

/// Join a list of items in a human-readable way: "a, b or c"
pub(crate) fn list_join(items: &[String], sep: &str, last_sep: &str) -> String {
    match items {
        [] => String::new(),
        [single] => single.clone(),
        [init @ .., last] => format!("{} {} {}", init.join(sep), last_sep, last),
    }
}
