use super::charclass::{fold, CharClass};
use super::code::{ActionCode, PredicateCode, StateCode};
use super::errors::GrammarError;
use crate::runtime::{CodeError, Context, StateContext, Value};
use hashbrown::HashSet;
use std::collections::BTreeSet;

/// An ordered list of rules, the first one being the default entrypoint
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    rules: Vec<Rule>,
}

impl Grammar {
    /// Create a grammar from its rules, in declaration order
    ///
    /// Fails if two rules share the same name.
    pub fn new(rules: Vec<Rule>) -> Result<Self, GrammarError> {
        {
            let mut names = HashSet::new();

            for rule in &rules {
                if !names.insert(rule.name.as_str()) {
                    return Err(GrammarError::DuplicateRule(rule.name.clone()));
                }
            }
        }

        Ok(Self { rules })
    }

    /// Get the grammar's rules, in declaration order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub(crate) fn rules_mut(&mut self) -> &mut [Rule] {
        &mut self.rules
    }

    /// Find a rule by its name
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    /// Check if the grammar has no rule at all
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// A named rule
///
/// The `nullable`, `left_recursive` and `leader` flags are computed by
/// [`prepare_grammar`](crate::analysis::prepare_grammar) and are all `false` before that.
#[derive(Debug, Clone)]
pub struct Rule {
    pub(crate) name: String,
    pub(crate) display_name: Option<String>,
    pub(crate) expr: Expr,
    pub(crate) nullable: bool,
    pub(crate) left_recursive: bool,
    pub(crate) leader: bool,
}

impl Rule {
    pub fn new(name: impl Into<String>, expr: Expr) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            expr,
            nullable: false,
            left_recursive: false,
            leader: false,
        }
    }

    /// Set the name used in error messages
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Get the rule's body
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Can the rule match without consuming any input?
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Can the rule invoke itself (directly or not) without consuming any input?
    pub fn is_left_recursive(&self) -> bool {
        self.left_recursive
    }

    /// Is the rule the leader of its left-recursive group?
    pub fn is_leader(&self) -> bool {
        self.leader
    }
}

/// A parsing expression
#[derive(Debug, Clone)]
pub enum Expr {
    /// Match all expressions, in order (`a b c`)
    Sequence(Vec<Expr>),

    /// Match the first expression that succeeds (`a / b / c`)
    Choice(Vec<Expr>),

    /// Bind the inner expression's value to a label (`name:expr`)
    Labeled { label: String, expr: Box<Expr> },

    /// Positive lookahead (`&expr`)
    And(Box<Expr>),

    /// Negative lookahead (`!expr`)
    Not(Box<Expr>),

    /// `expr?`
    ZeroOrOne(Box<Expr>),

    /// `expr*`
    ZeroOrMore(Box<Expr>),

    /// `expr+`
    OneOrMore(Box<Expr>),

    /// Match a constant string (`"abc"` or `"abc"i`)
    Literal(Literal),

    /// Match a single code point from a class (`[a-z]`)
    CharClass(CharClass),

    /// Match any single code point (`.`)
    AnyChar,

    /// Match another rule, by name
    RuleRef(String),

    /// Code predicate which must return `true` (`&{ }`)
    AndCode(PredicateCode),

    /// Code predicate which must return `false` (`!{ }`)
    NotCode(PredicateCode),

    /// Code block updating the state dictionary (`#{ }`)
    StateCode(StateCode),

    /// Run code on the inner expression's match (`expr { }`)
    Action { expr: Box<Expr>, code: ActionCode },
}

impl Expr {
    pub fn seq(exprs: Vec<Expr>) -> Self {
        Self::Sequence(exprs)
    }

    pub fn choice(alternatives: Vec<Expr>) -> Self {
        Self::Choice(alternatives)
    }

    pub fn label(label: impl Into<String>, expr: Expr) -> Self {
        Self::Labeled {
            label: label.into(),
            expr: Box::new(expr),
        }
    }

    pub fn and(expr: Expr) -> Self {
        Self::And(Box::new(expr))
    }

    pub fn not(expr: Expr) -> Self {
        Self::Not(Box::new(expr))
    }

    pub fn opt(expr: Expr) -> Self {
        Self::ZeroOrOne(Box::new(expr))
    }

    pub fn star(expr: Expr) -> Self {
        Self::ZeroOrMore(Box::new(expr))
    }

    pub fn plus(expr: Expr) -> Self {
        Self::OneOrMore(Box::new(expr))
    }

    pub fn lit(text: &str) -> Self {
        Self::Literal(Literal::new(text))
    }

    /// Case-insensitive literal
    pub fn lit_i(text: &str) -> Self {
        Self::Literal(Literal::new(text).ignore_case())
    }

    pub fn class(class: CharClass) -> Self {
        Self::CharClass(class)
    }

    pub fn any() -> Self {
        Self::AnyChar
    }

    pub fn rule(name: impl Into<String>) -> Self {
        Self::RuleRef(name.into())
    }

    pub fn and_code(
        code: impl Fn(&mut Context<'_>) -> Result<bool, CodeError> + Send + Sync + 'static,
    ) -> Self {
        Self::AndCode(PredicateCode::new(code))
    }

    pub fn not_code(
        code: impl Fn(&mut Context<'_>) -> Result<bool, CodeError> + Send + Sync + 'static,
    ) -> Self {
        Self::NotCode(PredicateCode::new(code))
    }

    pub fn state_code(
        code: impl Fn(&mut StateContext<'_>) -> Result<(), CodeError> + Send + Sync + 'static,
    ) -> Self {
        Self::StateCode(StateCode::new(code))
    }

    pub fn action(
        expr: Expr,
        code: impl Fn(&mut Context<'_>) -> Result<Value, CodeError> + Send + Sync + 'static,
    ) -> Self {
        Self::Action {
            expr: Box::new(expr),
            code: ActionCode::new(code),
        }
    }

    /// Check if the expression can match without consuming any input
    ///
    /// `nullable_rule` gives the current nullability of a rule, by name.
    /// Unknown rules must be reported as non-nullable.
    pub fn is_nullable(&self, nullable_rule: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Self::Sequence(exprs) => exprs.iter().all(|expr| expr.is_nullable(nullable_rule)),
            Self::Choice(alternatives) => alternatives
                .iter()
                .any(|alt| alt.is_nullable(nullable_rule)),

            // A label doesn't change what its expression consumes
            Self::Labeled { expr, .. } => expr.is_nullable(nullable_rule),

            Self::And(_) | Self::Not(_) | Self::ZeroOrOne(_) | Self::ZeroOrMore(_) => true,
            Self::OneOrMore(expr) => expr.is_nullable(nullable_rule),

            Self::Literal(lit) => lit.text().is_empty(),
            Self::CharClass(_) | Self::AnyChar => false,

            Self::RuleRef(name) => nullable_rule(name),

            Self::AndCode(_) | Self::NotCode(_) | Self::StateCode(_) => true,
            Self::Action { expr, .. } => expr.is_nullable(nullable_rule),
        }
    }

    /// Check if the expression can match without consuming any input, using the
    /// nullability flags computed on the grammar's rules
    pub fn is_nullable_in(&self, grammar: &Grammar) -> bool {
        self.is_nullable(&|name| grammar.rule(name).map_or(false, Rule::is_nullable))
    }

    /// Collect the names of the rules which may be invoked before any input is consumed
    pub fn initial_names(&self, nullable_rule: &dyn Fn(&str) -> bool) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_initial_names(nullable_rule, &mut names);
        names
    }

    fn collect_initial_names(
        &self,
        nullable_rule: &dyn Fn(&str) -> bool,
        names: &mut BTreeSet<String>,
    ) {
        match self {
            Self::Sequence(exprs) => {
                // Keep going as long as the previous members may match empty
                for expr in exprs {
                    expr.collect_initial_names(nullable_rule, names);

                    if !expr.is_nullable(nullable_rule) {
                        break;
                    }
                }
            }

            Self::Choice(alternatives) => {
                for alt in alternatives {
                    alt.collect_initial_names(nullable_rule, names);
                }
            }

            Self::Labeled { expr, .. }
            | Self::And(expr)
            | Self::Not(expr)
            | Self::ZeroOrOne(expr)
            | Self::ZeroOrMore(expr)
            | Self::OneOrMore(expr)
            | Self::Action { expr, .. } => expr.collect_initial_names(nullable_rule, names),

            Self::RuleRef(name) => {
                names.insert(name.clone());
            }

            Self::Literal(_)
            | Self::CharClass(_)
            | Self::AnyChar
            | Self::AndCode(_)
            | Self::NotCode(_)
            | Self::StateCode(_) => {}
        }
    }
}

/// A constant string, optionally matched case-insensitively
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    /// Text to match (lowercased for case-insensitive literals)
    text: String,

    /// Compare the input lowercased
    ignore_case: bool,

    /// Textual form, reported in "expected" lists
    want: String,
}

impl Literal {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ignore_case: false,
            want: format!("{:?}", text),
        }
    }

    /// Make the literal case-insensitive
    pub fn ignore_case(self) -> Self {
        Self {
            text: self.text.chars().map(fold).collect(),
            ignore_case: true,
            want: format!("{}i", self.want),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Get the literal's textual form
    pub fn want(&self) -> &str {
        &self.want
    }
}
