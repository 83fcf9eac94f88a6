use thiserror::Error;

/// Error raised while building a [`Grammar`](super::Grammar)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// Another rule was already declared with this name
    #[error("another rule was already declared with the name {0:?}")]
    DuplicateRule(String),

    /// A character class refers to an unknown Unicode general category
    #[error("unknown Unicode class {0:?} (available: {})", super::charclass::UNICODE_CATEGORIES.join(", "))]
    UnknownUnicodeClass(String),
}
