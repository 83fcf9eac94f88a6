use super::data::{Store, Value};

/// Options of a [parse](super::parse)
///
/// ## Example usage
///
/// ```rust
/// use packrat::runtime::ParseOptions;
///
/// let options = ParseOptions::new()
///     .memoize(true)
///     .entrypoint("document")
///     .max_expressions(1_000_000);
///
/// assert!(options.recover);
/// ```
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Cache the result of each rule and expression at each position (packrat parsing).
    /// Guarantees a linear parsing time at the cost of memory.
    pub memoize: bool,

    /// Catch panics raised by user code and report them as errors.
    /// When disabled, the panic reaches the caller with its full context.
    pub recover: bool,

    /// Log every step of the parse (see the `log` crate)
    pub debug: bool,

    /// Rule to start from instead of the grammar's first one
    pub entrypoint: Option<String>,

    /// Abort the parse once this many expressions have been evaluated (0 means no limit)
    pub max_expressions: u64,

    /// Don't report bytes which are not valid UTF-8
    pub allow_invalid_utf8: bool,

    /// Initial content of the state dictionary, which is rolled back on backtracking
    pub init_state: Store,

    /// Initial content of the global store, which is never rolled back
    pub global_store: Store,
}

impl ParseOptions {
    /// Create a new set of options
    pub fn new() -> Self {
        Self::default()
    }

    pub fn memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    pub fn recover(mut self, recover: bool) -> Self {
        self.recover = recover;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn entrypoint(mut self, rule: impl Into<String>) -> Self {
        self.entrypoint = Some(rule.into());
        self
    }

    pub fn max_expressions(mut self, max: u64) -> Self {
        self.max_expressions = max;
        self
    }

    pub fn allow_invalid_utf8(mut self, allow: bool) -> Self {
        self.allow_invalid_utf8 = allow;
        self
    }

    /// Set an initial entry of the state dictionary
    pub fn init_state(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.init_state.insert(key.into(), value.into());
        self
    }

    /// Set an initial entry of the global store
    pub fn global(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.global_store.insert(key.into(), value.into());
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            memoize: false,
            recover: true,
            debug: false,
            entrypoint: None,
            max_expressions: 0,
            allow_invalid_utf8: false,
            init_state: Store::new(),
            global_store: Store::new(),
        }
    }
}
