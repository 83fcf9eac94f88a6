use super::context::{Context, Labels, StateContext};
use super::cursor::{Position, Savepoint};
use super::data::{Store, Value};
use super::errors::{ErrorKind, ErrorList, ParserError};
use super::memo::{MemoEntry, MemoKey, MemoTable, Node};
use super::options::ParseOptions;
use crate::grammar::{fold, ActionCode, CharClass, Expr, Grammar, Literal, PredicateCode, Rule, StateCode};
use hashbrown::HashMap;
use std::any::Any;
use std::collections::BTreeSet;
use std::io::{self, Read};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

/// Match an input against a [prepared grammar](crate::analysis::prepare_grammar)
///
/// The grammar's first rule is used unless [`ParseOptions::entrypoint`] says otherwise.
/// Left-recursive grammars must have been prepared beforehand, so their leaders are known.
pub fn parse(grammar: &Grammar, input: &[u8], options: &ParseOptions) -> Parsed {
    Parser::new(grammar, input, options).parse()
}

/// Read a whole stream, then [parse](parse) it
pub fn parse_reader(
    grammar: &Grammar,
    mut reader: impl Read,
    options: &ParseOptions,
) -> io::Result<Parsed> {
    let mut input = vec![];
    reader.read_to_end(&mut input)?;
    Ok(parse(grammar, &input, options))
}

/// Outcome of a parse
///
/// A successful parse may still carry errors, reported by user code along the way.
#[derive(Debug, Clone)]
pub struct Parsed {
    value: Option<Value>,
    errors: ErrorList,
    global_store: Store,
    end: Position,
}

impl Parsed {
    /// Get the entry rule's value, `None` if the parse failed
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn errors(&self) -> &ErrorList {
        &self.errors
    }

    pub fn is_success(&self) -> bool {
        self.value.is_some()
    }

    /// Get the position where the entry rule stopped matching
    pub fn end(&self) -> Position {
        self.end
    }

    /// Get the global store, as left by user code
    pub fn global_store(&self) -> &Store {
        &self.global_store
    }

    /// Get the value of a successful parse, or the errors of a failed one
    pub fn into_result(self) -> Result<Value, ErrorList> {
        self.value.ok_or(self.errors)
    }
}

/// Evaluation was aborted, the reason being already recorded in the error list
struct Aborted;

/// Outcome of an evaluation: `Some` value on match, `None` on failure
type Eval = Result<Option<Value>, Aborted>;

/// Farthest position where a terminal failed, with what was expected there
struct FarthestFailure {
    position: Position,
    expected: Vec<String>,

    /// Set while evaluating a negative lookahead, where successes are what's being tracked
    invert: bool,
}

/// Single-use parser, holding the state of a parse
pub struct Parser<'g, 'i> {
    grammar: &'g Grammar,
    input: &'i [u8],
    lookup: HashMap<&'g str, usize>,

    memoize: bool,
    recover: bool,
    debug: bool,
    entrypoint: Option<String>,
    max_expressions: u64,
    allow_invalid_utf8: bool,

    pt: Savepoint,
    state: Rc<Store>,
    global: Store,
    errors: ErrorList,
    farthest: FarthestFailure,
    memo: MemoTable,

    rule_stack: Vec<&'g Rule>,
    label_stack: Vec<Labels<'g>>,
    expressions: u64,
    depth: usize,
}

impl<'g, 'i> Parser<'g, 'i> {
    pub fn new(grammar: &'g Grammar, input: &'i [u8], options: &ParseOptions) -> Self {
        let lookup = grammar
            .rules()
            .iter()
            .enumerate()
            .map(|(i, rule)| (rule.name(), i))
            .collect();

        Self {
            grammar,
            input,
            lookup,

            memoize: options.memoize,
            recover: options.recover,
            debug: options.debug,
            entrypoint: options.entrypoint.clone(),
            max_expressions: options.max_expressions,
            allow_invalid_utf8: options.allow_invalid_utf8,

            pt: Savepoint::start(),
            state: Rc::new(options.init_state.clone()),
            global: options.global_store.clone(),
            errors: ErrorList::default(),
            farthest: FarthestFailure {
                position: Position {
                    line: 1,
                    col: 1,
                    offset: 0,
                },
                expected: vec![],
                invert: false,
            },
            memo: MemoTable::default(),

            rule_stack: vec![],
            label_stack: vec![],
            expressions: 0,
            depth: 0,
        }
    }

    /// Run the parse
    pub fn parse(mut self) -> Parsed {
        let value = self.run();

        if self.debug {
            log::debug!(
                "parse done after {} expressions, {} memoized results",
                self.expressions,
                self.memo.len()
            );
        }

        Parsed {
            value,
            errors: self.errors,
            global_store: self.global,
            end: self.pt.position,
        }
    }

    fn run(&mut self) -> Option<Value> {
        let grammar = self.grammar;

        if grammar.is_empty() {
            self.add_error(ErrorKind::NoRule);
            return None;
        }

        let entry = match self.entrypoint.clone() {
            None => 0,
            Some(name) => match self.lookup.get(name.as_str()) {
                Some(&i) => i,
                None => {
                    self.add_error(ErrorKind::InvalidEntrypoint(name));
                    return None;
                }
            },
        };

        let rule = &grammar.rules()[entry];

        // Decode the first code point
        self.read();

        let outcome = if self.recover {
            match panic::catch_unwind(AssertUnwindSafe(|| self.parse_rule_wrap(rule))) {
                Ok(outcome) => outcome,
                Err(payload) => {
                    self.add_error(ErrorKind::Panic(panic_message(payload)));
                    return None;
                }
            }
        } else {
            self.parse_rule_wrap(rule)
        };

        match outcome {
            Ok(Some(value)) => Some(value),
            Ok(None) => {
                if self.errors.is_empty() {
                    self.add_no_match_error();
                }

                None
            }
            Err(Aborted) => None,
        }
    }

    // Report what was expected at the farthest position reached
    fn add_no_match_error(&mut self) {
        let mut expected = self
            .farthest
            .expected
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>();

        let eof = expected.remove("!.");
        let mut expected = expected.into_iter().collect::<Vec<_>>();

        if eof {
            expected.push("EOF".to_string());
        }

        self.add_error_at(self.farthest.position, ErrorKind::NoMatch(expected));
    }

    fn add_error(&mut self, kind: ErrorKind) {
        self.add_error_at(self.pt.position, kind);
    }

    fn add_error_at(&mut self, position: Position, kind: ErrorKind) {
        let rule = self
            .rule_stack
            .last()
            .map(|rule| rule.display_name().unwrap_or(rule.name()).to_string());

        self.errors.add(ParserError::new(position, rule, kind));
    }

    /// Move over the current code point
    fn read(&mut self) {
        self.pt.advance(self.input);

        if self.pt.at_invalid_byte() && !self.allow_invalid_utf8 {
            self.add_error(ErrorKind::InvalidEncoding);
        }
    }

    fn restore(&mut self, pt: Savepoint) {
        self.pt = pt;
    }

    fn text_from(&self, start: Savepoint) -> Value {
        let bytes = &self.input[start.position.offset..self.pt.position.offset];
        Value::Text(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Track the outcome of a terminal for the final "no match" error
    fn fail_at(&mut self, matched: bool, position: Position, want: &str) {
        if matched != self.farthest.invert || position.offset < self.farthest.position.offset {
            return;
        }

        if position.offset > self.farthest.position.offset {
            self.farthest.position = position;
            self.farthest.expected.clear();
        }

        let want = if self.farthest.invert {
            format!("!{}", want)
        } else {
            want.to_string()
        };

        self.farthest.expected.push(want);
    }

    fn bind(&mut self, label: &'g str, value: Value) {
        if label.is_empty() {
            return;
        }

        if let Some(frame) = self.label_stack.last_mut() {
            frame.insert(label, value);
        }
    }

    fn memo_key(&self, node: Node, at: Savepoint) -> MemoKey {
        MemoKey {
            node,
            offset: at.position.offset,
            inverted: self.farthest.invert,
        }
    }

    /// Replay a memoized result, if one was computed from the current state
    fn recall(&mut self, node: Node) -> Option<Option<Value>> {
        let key = self.memo_key(node, self.pt);
        let entry = self.memo.get(&key)?;

        if !entry.applies_to(&self.state) {
            return None;
        }

        let value = entry.value.clone();
        let end = entry.end;
        let state = Rc::clone(&entry.state);

        if self.debug {
            log::trace!("{:?} at {}: memoized", node, self.pt.position);
        }

        self.restore(end);
        self.state = state;

        Some(value)
    }

    fn memorize(
        &mut self,
        node: Node,
        start: Savepoint,
        entry_state: Rc<Store>,
        value: Option<Value>,
    ) {
        let entry = MemoEntry {
            value,
            end: self.pt,
            entry_state,
            state: Rc::clone(&self.state),
            growing: false,
        };

        let key = self.memo_key(node, start);
        self.memo.set(key, entry);
    }

    fn parse_rule_wrap(&mut self, rule: &'g Rule) -> Eval {
        let start = self.pt;

        if self.debug {
            log::debug!(
                "{:indent$}> {} [{}]",
                "",
                rule.name(),
                start.position,
                indent = self.depth * 2
            );
        }

        self.depth += 1;

        let outcome = if rule.is_leader() {
            self.parse_rule_leader(rule)?
        } else if self.memoize && !rule.is_left_recursive() {
            self.parse_rule_memoize(rule)?
        } else {
            self.parse_rule(rule)?
        };

        self.depth -= 1;

        if self.debug {
            match &outcome {
                Some(_) => log::debug!(
                    "{:indent$}< {} matched {:?}",
                    "",
                    rule.name(),
                    String::from_utf8_lossy(
                        &self.input[start.position.offset..self.pt.position.offset]
                    ),
                    indent = self.depth * 2
                ),
                None => log::debug!(
                    "{:indent$}< {} failed",
                    "",
                    rule.name(),
                    indent = self.depth * 2
                ),
            }
        }

        Ok(outcome)
    }

    fn parse_rule(&mut self, rule: &'g Rule) -> Eval {
        self.rule_stack.push(rule);
        self.label_stack.push(Labels::new());

        let outcome = self.eval_wrap(rule.expr())?;

        self.label_stack.pop();
        self.rule_stack.pop();

        Ok(outcome)
    }

    fn parse_rule_memoize(&mut self, rule: &'g Rule) -> Eval {
        let node = Node::rule(rule);

        if let Some(outcome) = self.recall(node) {
            return Ok(outcome);
        }

        let start = self.pt;
        let entry_state = Rc::clone(&self.state);
        let outcome = self.parse_rule(rule)?;
        self.memorize(node, start, entry_state, outcome.clone());

        Ok(outcome)
    }

    /// Evaluate the leader of a left-recursive group by growing a seed
    ///
    /// The memo entry starts as a failure, then the rule is evaluated again and again,
    /// each nested call to the leader reading the previous iteration's result,
    /// until the match stops getting longer.
    fn parse_rule_leader(&mut self, rule: &'g Rule) -> Eval {
        let node = Node::rule(rule);

        if let Some(outcome) = self.recall(node) {
            return Ok(outcome);
        }

        let start = self.pt;
        let start_state = Rc::clone(&self.state);
        let errors_len = self.errors.len();
        let key = self.memo_key(node, start);

        // Nested calls to the leader at this offset read the seed, whatever the state they see
        let mut last = MemoEntry {
            value: None,
            end: start,
            entry_state: Rc::clone(&start_state),
            state: Rc::clone(&start_state),
            growing: true,
        };
        let mut last_errors_len = errors_len;
        let mut grown = false;

        loop {
            self.memo.set(key, last.clone());
            self.restore(start);
            self.state = Rc::clone(&start_state);

            let outcome = self.parse_rule(rule)?;

            match outcome {
                Some(value) if !grown || self.pt.position.offset > last.end.position.offset => {
                    if self.debug {
                        log::debug!(
                            "{:indent$}~ {} grown to {}",
                            "",
                            rule.name(),
                            self.pt.position,
                            indent = self.depth * 2
                        );
                    }

                    last = MemoEntry {
                        value: Some(value),
                        end: self.pt,
                        entry_state: Rc::clone(&start_state),
                        state: Rc::clone(&self.state),
                        growing: true,
                    };
                    last_errors_len = self.errors.len();
                    grown = true;
                }

                _ => break,
            }
        }

        // Errors of the rejected iteration are dropped, unless no iteration matched at all
        if grown {
            self.errors.truncate(last_errors_len);
        }

        self.restore(last.end);
        self.state = Rc::clone(&last.state);

        let value = last.value.clone();
        last.growing = false;
        self.memo.set(key, last);

        Ok(value)
    }

    fn eval_wrap(&mut self, expr: &'g Expr) -> Eval {
        let cacheable = self.memoize
            && !self
                .rule_stack
                .last()
                .map_or(false, |rule| rule.is_left_recursive());

        if !cacheable {
            return self.eval(expr);
        }

        let node = Node::expr(expr);

        if let Some(outcome) = self.recall(node) {
            // Bindings are a side effect of the evaluation, so they must be replayed too
            if let (Expr::Labeled { label, .. }, Some(value)) = (expr, &outcome) {
                self.bind(label, value.clone());
            }

            return Ok(outcome);
        }

        let start = self.pt;
        let entry_state = Rc::clone(&self.state);
        let outcome = self.eval(expr)?;
        self.memorize(node, start, entry_state, outcome.clone());

        Ok(outcome)
    }

    fn eval(&mut self, expr: &'g Expr) -> Eval {
        self.expressions += 1;

        if self.max_expressions != 0 && self.expressions > self.max_expressions {
            self.add_error(ErrorKind::MaxExpressions);
            return Err(Aborted);
        }

        if self.debug {
            log::trace!(
                "{:indent$}{} [{}]",
                "",
                expr_kind(expr),
                self.pt.position,
                indent = self.depth * 2
            );
        }

        match expr {
            Expr::Sequence(exprs) => self.eval_sequence(exprs),
            Expr::Choice(alternatives) => self.eval_choice(alternatives),
            Expr::Labeled { label, expr } => self.eval_labeled(label, expr),
            Expr::And(expr) => self.eval_lookahead(expr, false),
            Expr::Not(expr) => self.eval_lookahead(expr, true),

            Expr::ZeroOrOne(expr) => {
                self.label_stack.push(Labels::new());
                let outcome = self.eval_wrap(expr)?;
                self.label_stack.pop();

                Ok(Some(outcome.unwrap_or(Value::Nil)))
            }

            Expr::ZeroOrMore(expr) => self.eval_repetition(expr, false),
            Expr::OneOrMore(expr) => self.eval_repetition(expr, true),

            Expr::Literal(lit) => Ok(self.eval_literal(lit)),
            Expr::CharClass(class) => Ok(self.eval_char_class(class)),
            Expr::AnyChar => Ok(self.eval_any_char()),

            Expr::RuleRef(name) => self.eval_rule_ref(name),

            Expr::AndCode(code) => Ok(self.run_predicate(code).then(|| Value::Nil)),
            Expr::NotCode(code) => Ok((!self.run_predicate(code)).then(|| Value::Nil)),
            Expr::StateCode(code) => Ok(Some(self.run_state_code(code))),

            Expr::Action { expr, code } => self.eval_action(expr, code),
        }
    }

    fn eval_sequence(&mut self, exprs: &'g [Expr]) -> Eval {
        let start = self.pt;
        let state = Rc::clone(&self.state);
        let mut values = Vec::with_capacity(exprs.len());

        for expr in exprs {
            match self.eval_wrap(expr)? {
                Some(value) => values.push(value),
                None => {
                    self.state = state;
                    self.restore(start);
                    return Ok(None);
                }
            }
        }

        Ok(Some(Value::List(values)))
    }

    fn eval_choice(&mut self, alternatives: &'g [Expr]) -> Eval {
        for alt in alternatives {
            let state = Rc::clone(&self.state);

            self.label_stack.push(Labels::new());
            let outcome = self.eval_wrap(alt)?;
            self.label_stack.pop();

            if outcome.is_some() {
                return Ok(outcome);
            }

            self.state = state;
        }

        Ok(None)
    }

    fn eval_labeled(&mut self, label: &'g str, expr: &'g Expr) -> Eval {
        self.label_stack.push(Labels::new());
        let outcome = self.eval_wrap(expr)?;
        self.label_stack.pop();

        if let Some(value) = &outcome {
            self.bind(label, value.clone());
        }

        Ok(outcome)
    }

    /// Evaluate `&expr` or `!expr`, consuming nothing in both cases
    fn eval_lookahead(&mut self, expr: &'g Expr, negative: bool) -> Eval {
        let start = self.pt;
        let state = Rc::clone(&self.state);

        if negative {
            self.farthest.invert = !self.farthest.invert;
        }

        self.label_stack.push(Labels::new());
        let outcome = self.eval_wrap(expr)?;
        self.label_stack.pop();

        if negative {
            self.farthest.invert = !self.farthest.invert;
        }

        self.state = state;
        self.restore(start);

        Ok((outcome.is_some() != negative).then(|| Value::Nil))
    }

    fn eval_repetition(&mut self, expr: &'g Expr, at_least_one: bool) -> Eval {
        let mut values = vec![];

        loop {
            let offset = self.pt.position.offset;

            self.label_stack.push(Labels::new());
            let outcome = self.eval_wrap(expr)?;
            self.label_stack.pop();

            let Some(value) = outcome else {
                break;
            };

            values.push(value);

            // An empty match would repeat forever
            if self.pt.position.offset == offset {
                break;
            }
        }

        if at_least_one && values.is_empty() {
            return Ok(None);
        }

        Ok(Some(Value::List(values)))
    }

    fn eval_literal(&mut self, lit: &Literal) -> Option<Value> {
        let start = self.pt;

        for want in lit.text().chars() {
            let cur = if lit.is_ignore_case() {
                fold(self.pt.rune)
            } else {
                self.pt.rune
            };

            if self.pt.at_eof() || cur != want {
                self.fail_at(false, self.pt.position, lit.want());
                self.restore(start);
                return None;
            }

            self.read();
        }

        self.fail_at(true, start.position, lit.want());
        Some(self.text_from(start))
    }

    fn eval_char_class(&mut self, class: &CharClass) -> Option<Value> {
        let start = self.pt;

        // End of input never matches, even an inverted class
        if start.at_eof() || class.contains(start.rune) == class.is_inverted() {
            self.fail_at(false, start.position, class.want());
            return None;
        }

        self.read();
        self.fail_at(true, start.position, class.want());
        Some(self.text_from(start))
    }

    fn eval_any_char(&mut self) -> Option<Value> {
        let start = self.pt;

        if start.at_eof() {
            self.fail_at(false, start.position, ".");
            return None;
        }

        self.read();
        self.fail_at(true, start.position, ".");
        Some(self.text_from(start))
    }

    fn eval_rule_ref(&mut self, name: &'g str) -> Eval {
        let grammar = self.grammar;

        match self.lookup.get(name) {
            Some(&i) => self.parse_rule_wrap(&grammar.rules()[i]),
            None => {
                self.add_error(ErrorKind::UndefinedRule(name.to_string()));
                Ok(None)
            }
        }
    }

    fn eval_action(&mut self, expr: &'g Expr, code: &ActionCode) -> Eval {
        let start = self.pt;

        if self.eval_wrap(expr)?.is_none() {
            return Ok(None);
        }

        let mut ctx = Context {
            position: start.position,
            text: &self.input[start.position.offset..self.pt.position.offset],
            labels: self.label_stack.last(),
            state: &self.state,
            global: &mut self.global,
        };

        match code.run(&mut ctx) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                self.add_error_at(start.position, ErrorKind::Code(err.message().to_string()));
                Ok(Some(err.into_fallback()))
            }
        }
    }

    fn run_predicate(&mut self, code: &PredicateCode) -> bool {
        let mut ctx = Context {
            position: self.pt.position,
            text: &[],
            labels: self.label_stack.last(),
            state: &self.state,
            global: &mut self.global,
        };

        match code.run(&mut ctx) {
            Ok(result) => result,
            Err(err) => {
                self.add_error(ErrorKind::Code(err.message().to_string()));
                false
            }
        }
    }

    fn run_state_code(&mut self, code: &StateCode) -> Value {
        let mut ctx = StateContext {
            position: self.pt.position,
            labels: self.label_stack.last(),
            state: Rc::make_mut(&mut self.state),
            global: &mut self.global,
        };

        if let Err(err) = code.run(&mut ctx) {
            self.add_error(ErrorKind::Code(err.message().to_string()));
        }

        Value::Nil
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn expr_kind(expr: &Expr) -> &'static str {
    match expr {
        Expr::Sequence(_) => "sequence",
        Expr::Choice(_) => "choice",
        Expr::Labeled { .. } => "labeled",
        Expr::And(_) => "and",
        Expr::Not(_) => "not",
        Expr::ZeroOrOne(_) => "zero or one",
        Expr::ZeroOrMore(_) => "zero or more",
        Expr::OneOrMore(_) => "one or more",
        Expr::Literal(_) => "literal",
        Expr::CharClass(_) => "char class",
        Expr::AnyChar => "any char",
        Expr::RuleRef(_) => "rule ref",
        Expr::AndCode(_) => "and code",
        Expr::NotCode(_) => "not code",
        Expr::StateCode(_) => "state code",
        Expr::Action { .. } => "action",
    }
}
