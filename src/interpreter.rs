//=============================================
// src/interpreter.rs
//=============================================
// Author: OperatorLang Contributors
// License: MIT (see LICENSE)
// Goal: OperatorLang runtime interpreter implementation
// Objective: Execute parsed programs with breakpoints, stepping, an
//            iteration budget, and console/canvas collaborators
//=============================================

//=============================================
// Section 1: Imports
//=============================================

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ast::{BinaryOp, Expr, Literal, Stmt, UnaryOp};
use crate::canvas::{DrawingSurface, RecordingSurface};
use crate::console::ConsoleSink;
use crate::parser::{ParseError, Parser};
use crate::tokenizer::{LexError, Tokenizer};

/// Safety budget against non-terminating programs.
pub const DEFAULT_MAX_ITERATIONS: usize = 100_000;

/// Cap on user-function nesting before the evaluator refuses to recurse.
pub const MAX_CALL_DEPTH: usize = 1_000;

//=============================================
// Section 2: Native Function Arity
//=============================================

/// Supported arity constraints for native (built-in) functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeArity {
    /// The function expects exactly this many arguments.
    Exact(usize),
    /// The function accepts a range of arguments defined by the inclusive
    /// minimum and an optional maximum. `None` indicates "no upper bound".
    Range { min: usize, max: Option<usize> },
}

impl NativeArity {
    fn accepts(&self, count: usize) -> bool {
        match self {
            NativeArity::Exact(n) => *n == count,
            NativeArity::Range { min, max } => {
                if count < *min {
                    return false;
                }
                match max {
                    Some(max) => count <= *max,
                    None => true,
                }
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            NativeArity::Exact(n) => format!("exactly {}", n),
            NativeArity::Range { min, max } => match max {
                Some(max) if min == max => format!("exactly {}", min),
                Some(max) => format!("between {} and {}", min, max),
                None => format!("at least {}", min),
            },
        }
    }
}

//=============================================
// Section 3: Runtime Values
//=============================================

/// OperatorLang runtime value types.
///
/// `Undefined` is distinct from `Null`: unresolved variables read as
/// `Null`, while missing call arguments and out-of-range `get` produce
/// `Undefined`. Both serialize as JSON `null`; `Null` wins on the way
/// back in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Array(Vec<Value>),
    Object(HashMap<String, Value>),
    Undefined,
}

impl Value {
    pub fn from_literal(literal: &Literal) -> Value {
        match literal {
            Literal::Null => Value::Null,
            Literal::Boolean(b) => Value::Bool(*b),
            Literal::Number(n) => Value::Number(*n),
            Literal::Str(s) => Value::Str(s.clone()),
        }
    }

    /// Condition coercion: falsy values are `false`, `0`, `NaN`, the
    /// empty string, `null`, and `undefined`. Arrays and objects are
    /// always truthy, empty or not.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Null | Value::Undefined => false,
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// Numeric coercion for arithmetic and comparisons.
    pub fn coerce_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
            Value::Null => 0.0,
            Value::Undefined => f64::NAN,
            Value::Str(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Array(items) => match items.len() {
                0 => 0.0,
                1 => items[0].coerce_number(),
                _ => f64::NAN,
            },
            Value::Object(_) => f64::NAN,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Undefined => "undefined",
        }
    }
}

/// Number formatting: integral finite values print without a fractional
/// part, non-finite values use their conventional spellings.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == n.trunc() && n.abs() < 9e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            Value::Undefined => write!(f, "undefined"),
            Value::Array(items) => {
                // Comma-joined elements; null/undefined render empty
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    match item {
                        Value::Null | Value::Undefined => {}
                        other => write!(f, "{}", other)?,
                    }
                }
                Ok(())
            }
            Value::Object(_) => write!(f, "[object Object]"),
        }
    }
}

//=============================================
// Section 4: Errors
//=============================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    #[error("Type error: {0}")]
    Type(String),
    #[error("Argument error: {0}")]
    Argument(String),
    #[error("Index error: {0}")]
    Index(String),
    #[error("Stack overflow: call depth exceeded {0}")]
    StackOverflow(usize),
    #[error("{0}")]
    Custom(String),
}

/// Failure to load source text; the previously loaded program is kept.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("{0}")]
    Lex(#[from] LexError),
    #[error("{0}")]
    Parse(#[from] ParseError),
}

//=============================================
// Section 5: Callables & Execution State
//=============================================

pub type NativeFn = fn(&mut Interpreter, &[Value]) -> Result<Value, RuntimeError>;

/// An entry in the function registry. Natives and user functions share
/// one namespace; the last registration under a name wins.
#[derive(Debug, Clone)]
pub enum Callable {
    Native {
        name: String,
        arity: NativeArity,
        func: NativeFn,
    },
    User {
        params: Vec<String>,
        body: Vec<Stmt>,
    },
}

/// Saved execution context for the duration of a user-function call.
#[derive(Debug, Clone)]
struct CallFrame {
    variables: HashMap<String, Value>,
    program_counter: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Normal,
    Step,
    Fast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    Idle,
    Running,
    Paused,
    Completed,
    Errored,
}

//=============================================
// Section 6: Interpreter
//=============================================

/// Tree-walking interpreter over the parsed statement list.
///
/// Single-threaded and cooperative: `run` dispatches top-level statements
/// until completion, a breakpoint, an error, or the iteration budget, and
/// nested loops poll the running flag so a forced stop unwinds at the
/// next statement boundary.
pub struct Interpreter {
    pub(crate) variables: HashMap<String, Value>,
    pub(crate) functions: HashMap<String, Callable>,
    call_stack: Vec<CallFrame>,
    pub(crate) program: Vec<Stmt>,
    program_counter: usize,
    pub(crate) breakpoints: HashSet<usize>,
    pub(crate) running: bool,
    state: ExecState,
    mode: ExecutionMode,
    max_iterations: usize,
    delay_ms: u64,
    iterations: usize,
    pub(crate) console: ConsoleSink,
    pub(crate) canvas: Rc<RefCell<dyn DrawingSurface>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_collaborators(
            ConsoleSink::new(),
            Rc::new(RefCell::new(RecordingSurface::new())),
        )
    }

    pub fn with_collaborators(
        console: ConsoleSink,
        canvas: Rc<RefCell<dyn DrawingSurface>>,
    ) -> Self {
        let mut interpreter = Self {
            variables: HashMap::new(),
            functions: HashMap::new(),
            call_stack: Vec::new(),
            program: Vec::new(),
            program_counter: 0,
            breakpoints: HashSet::new(),
            running: false,
            state: ExecState::Idle,
            mode: ExecutionMode::Normal,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            delay_ms: 0,
            iterations: 0,
            console,
            canvas,
        };
        interpreter.install_stdlib();
        interpreter
    }

    //=============================================
    // Section 6.1: Configuration & Introspection
    //=============================================

    pub fn set_max_iterations(&mut self, limit: usize) {
        self.max_iterations = limit;
    }

    pub fn set_delay_ms(&mut self, delay_ms: u64) {
        self.delay_ms = delay_ms;
    }

    pub fn set_mode(&mut self, mode: ExecutionMode) {
        self.mode = mode;
    }

    pub fn state(&self) -> ExecState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn program(&self) -> &[Stmt] {
        &self.program
    }

    pub fn program_counter(&self) -> usize {
        self.program_counter
    }

    pub fn console(&self) -> &ConsoleSink {
        &self.console
    }

    pub fn canvas(&self) -> Rc<RefCell<dyn DrawingSurface>> {
        Rc::clone(&self.canvas)
    }

    pub fn get_variable(&self, name: &str) -> Value {
        self.variables.get(name).cloned().unwrap_or(Value::Null)
    }

    pub fn set_variable(&mut self, name: &str, value: Value) {
        self.variables.insert(name.to_string(), value);
    }

    //=============================================
    // Section 6.2: Breakpoints
    //=============================================

    // Breakpoints address top-level statement indices only; statements
    // nested in blocks are not independently addressable.

    pub fn set_breakpoint(&mut self, index: usize) {
        self.breakpoints.insert(index);
    }

    pub fn clear_breakpoint(&mut self, index: usize) {
        self.breakpoints.remove(&index);
    }

    pub fn clear_all_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    pub fn breakpoints(&self) -> &HashSet<usize> {
        &self.breakpoints
    }

    //=============================================
    // Section 6.3: Function Registry
    //=============================================

    pub fn register_native(&mut self, name: &str, arity: NativeArity, func: NativeFn) {
        self.functions.insert(
            name.to_string(),
            Callable::Native {
                name: name.to_string(),
                arity,
                func,
            },
        );
    }

    pub fn define_function(&mut self, name: &str, params: Vec<String>, body: Vec<Stmt>) {
        self.functions
            .insert(name.to_string(), Callable::User { params, body });
    }

    pub(crate) fn user_functions(&self) -> impl Iterator<Item = (&String, &Vec<String>, &Vec<Stmt>)> {
        self.functions.iter().filter_map(|(name, callable)| {
            if let Callable::User { params, body } = callable {
                Some((name, params, body))
            } else {
                None
            }
        })
    }

    //=============================================
    // Section 6.4: Program Lifecycle
    //=============================================

    /// Parse source text and install it as the current program.
    ///
    /// Fails closed: on a lex or parse error the previously loaded
    /// program and all interpreter state stay untouched, and the error
    /// is surfaced both on the console and to the caller.
    pub fn load(&mut self, source: &str) -> Result<(), LoadError> {
        let tokens = match Tokenizer::new(source).tokenize() {
            Ok(tokens) => tokens,
            Err(error) => {
                self.console.write(&format!("Parse error: {}", error));
                return Err(error.into());
            }
        };
        let statements = match Parser::new(tokens).parse() {
            Ok(statements) => statements,
            Err(error) => {
                self.console.write(&format!("Parse error: {}", error));
                return Err(error.into());
            }
        };

        // Function declarations go straight to the registry; only the
        // remaining statements are executable and addressable by the
        // program counter.
        let mut program = Vec::new();
        for statement in statements {
            if let Stmt::Function { name, params, body } = statement {
                self.define_function(&name, params, body);
            } else {
                program.push(statement);
            }
        }
        self.program = program;
        self.reset_execution();
        Ok(())
    }

    pub(crate) fn reset_execution(&mut self) {
        self.program_counter = 0;
        self.call_stack.clear();
        self.running = false;
        self.iterations = 0;
        self.state = ExecState::Idle;
    }

    /// Run from the top of the program until completion, a breakpoint,
    /// an error, or the iteration budget.
    pub fn run(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.state = ExecState::Running;
        self.program_counter = 0;
        self.call_stack.clear();
        self.iterations = 0;
        self.execute_program();
    }

    fn execute_program(&mut self) {
        while self.running && self.program_counter < self.program.len() {
            // Breakpoint check happens before the statement executes
            if self.breakpoints.contains(&self.program_counter) {
                let message =
                    format!("Breakpoint hit at instruction {}", self.program_counter);
                self.console.write(&message);
                self.running = false;
                self.state = ExecState::Paused;
                return;
            }

            let statement = self.program[self.program_counter].clone();
            self.program_counter += 1;

            if let Err(error) = self.execute_statement(&statement) {
                self.console.write(&format!("Runtime error: {}", error));
                self.running = false;
                self.state = ExecState::Errored;
                return;
            }

            // Budget exhaustion or a forced stop ends the pass here
            if !self.running {
                return;
            }

            if self.delay_ms > 0 && self.mode != ExecutionMode::Fast {
                thread::sleep(Duration::from_millis(self.delay_ms));
            }

            if self.mode == ExecutionMode::Step {
                self.running = false;
                self.state = ExecState::Paused;
                return;
            }
        }

        if self.program_counter >= self.program.len() {
            self.running = false;
            self.state = ExecState::Completed;
        }
    }

    /// Execute exactly one top-level statement. Breakpoints are ignored.
    pub fn step(&mut self) {
        if self.running {
            return;
        }
        if self.program_counter >= self.program.len() {
            self.state = ExecState::Completed;
            return;
        }

        self.running = true;
        self.state = ExecState::Running;
        self.iterations = 0;
        let statement = self.program[self.program_counter].clone();
        self.program_counter += 1;

        match self.execute_statement(&statement) {
            Err(error) => {
                self.console.write(&format!("Runtime error: {}", error));
                self.running = false;
                self.state = ExecState::Errored;
            }
            Ok(_) => {
                self.running = false;
                if self.state == ExecState::Running {
                    self.state = ExecState::Paused;
                }
            }
        }
    }

    /// Request a stop; execution halts at the next statement boundary.
    pub fn stop(&mut self) {
        self.running = false;
        if self.state == ExecState::Running {
            self.state = ExecState::Paused;
        }
    }

    //=============================================
    // Section 6.5: Statement Execution
    //=============================================

    // Function: execute_statement
    // Every dispatched statement, nested ones included, charges the
    // iteration budget, so an inner `while true` cannot outrun the
    // top-level safety check.
    pub fn execute_statement(&mut self, statement: &Stmt) -> Result<Value, RuntimeError> {
        self.iterations += 1;
        if self.iterations > self.max_iterations {
            self.console
                .write("Program exceeded maximum iterations - stopping execution");
            self.running = false;
            self.state = ExecState::Paused;
            return Ok(Value::Null);
        }

        match statement {
            Stmt::Assign {
                variable,
                expression,
            } => {
                let value = self.eval_expression(expression)?;
                self.variables.insert(variable.clone(), value.clone());
                Ok(value)
            }

            Stmt::If {
                condition,
                body,
                else_body,
            } => {
                let branch = if self.eval_expression(condition)?.is_truthy() {
                    Some(body)
                } else {
                    else_body.as_ref()
                };
                if let Some(branch) = branch {
                    for statement in branch {
                        self.execute_statement(statement)?;
                        if !self.running {
                            break;
                        }
                    }
                }
                Ok(Value::Null)
            }

            Stmt::While { condition, body } => {
                while self.running && self.eval_expression(condition)?.is_truthy() {
                    for statement in body {
                        self.execute_statement(statement)?;
                        if !self.running {
                            break;
                        }
                    }
                }
                Ok(Value::Null)
            }

            Stmt::For {
                variable,
                start,
                end,
                body,
            } => {
                let start = self.eval_expression(start)?.coerce_number();
                let end = self.eval_expression(end)?.coerce_number();
                let mut index = start;
                // Strictly ascending; range(5, 2) runs zero times
                while index < end && self.running {
                    self.variables
                        .insert(variable.clone(), Value::Number(index));
                    for statement in body {
                        self.execute_statement(statement)?;
                        if !self.running {
                            break;
                        }
                    }
                    index += 1.0;
                }
                Ok(Value::Null)
            }

            Stmt::Return { expression } => self.eval_expression(expression),

            Stmt::Expression { expression } => self.eval_expression(expression),

            Stmt::Function { name, .. } => Err(RuntimeError::Custom(format!(
                "Function declaration '{}' is not executable",
                name
            ))),
        }
    }

    //=============================================
    // Section 6.6: Expression Evaluation
    //=============================================

    pub fn eval_expression(&mut self, expression: &Expr) -> Result<Value, RuntimeError> {
        match expression {
            Expr::Value { value } => Ok(Value::from_literal(value)),
            Expr::Variable { name } => Ok(self.get_variable(name)),
            Expr::Binary {
                operator,
                left,
                right,
            } => self.eval_binary(*operator, left, right),
            Expr::Unary {
                operator,
                expression,
            } => {
                let value = self.eval_expression(expression)?;
                Ok(match operator {
                    UnaryOp::Not => Value::Bool(!value.is_truthy()),
                    UnaryOp::Minus => Value::Number(-value.coerce_number()),
                })
            }
            Expr::Array { elements } => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.eval_expression(element)?);
                }
                Ok(Value::Array(items))
            }
            Expr::Object { properties } => {
                let mut object = HashMap::new();
                for (key, value) in properties {
                    object.insert(key.clone(), self.eval_expression(value)?);
                }
                Ok(Value::Object(object))
            }
            Expr::Call {
                function,
                arguments,
            } => {
                let mut args = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.eval_expression(argument)?);
                }
                self.call_function(function, &args)
            }
        }
    }

    // Function: call_function
    // User calls snapshot the whole environment and restore it on the
    // way out, so the callee sees caller bindings and any writes it
    // makes disappear when the frame pops.
    pub fn call_function(&mut self, name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
        let callable = self
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownFunction(name.to_string()))?;

        match callable {
            Callable::Native { name, arity, func } => {
                if !arity.accepts(args.len()) {
                    return Err(RuntimeError::Argument(format!(
                        "{} expects {} arguments, got {}",
                        name,
                        arity.describe(),
                        args.len()
                    )));
                }
                func(self, args)
            }
            Callable::User { params, body } => {
                if self.call_stack.len() >= MAX_CALL_DEPTH {
                    return Err(RuntimeError::StackOverflow(MAX_CALL_DEPTH));
                }
                self.call_stack.push(CallFrame {
                    variables: self.variables.clone(),
                    program_counter: self.program_counter,
                });
                for (index, param) in params.iter().enumerate() {
                    let value = args.get(index).cloned().unwrap_or(Value::Undefined);
                    self.variables.insert(param.clone(), value);
                }

                let mut result = Ok(Value::Null);
                for statement in &body {
                    result = self.execute_statement(statement);
                    if result.is_err() || !self.running {
                        break;
                    }
                    // A top-level `return` in the body ends the call;
                    // returns nested in blocks only end their block.
                    if matches!(statement, Stmt::Return { .. }) {
                        break;
                    }
                }

                if let Some(frame) = self.call_stack.pop() {
                    self.variables = frame.variables;
                    self.program_counter = frame.program_counter;
                }
                result
            }
        }
    }

    fn eval_binary(
        &mut self,
        operator: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<Value, RuntimeError> {
        // Both operands are evaluated before the operator applies; the
        // logical operators do not short-circuit.
        let lhs = self.eval_expression(left)?;
        let rhs = self.eval_expression(right)?;

        Ok(match operator {
            BinaryOp::Add => match (&lhs, &rhs) {
                (Value::Str(_), _) | (_, Value::Str(_)) => {
                    Value::Str(format!("{}{}", lhs, rhs))
                }
                _ => Value::Number(lhs.coerce_number() + rhs.coerce_number()),
            },
            BinaryOp::Sub => Value::Number(lhs.coerce_number() - rhs.coerce_number()),
            BinaryOp::Mul => Value::Number(lhs.coerce_number() * rhs.coerce_number()),
            BinaryOp::Div => Value::Number(lhs.coerce_number() / rhs.coerce_number()),
            BinaryOp::Mod => Value::Number(lhs.coerce_number() % rhs.coerce_number()),
            BinaryOp::Eq => Value::Bool(lhs == rhs),
            BinaryOp::Neq => Value::Bool(lhs != rhs),
            BinaryOp::Lt => Self::compare(&lhs, &rhs, |ordering| ordering == std::cmp::Ordering::Less),
            BinaryOp::Gt => Self::compare(&lhs, &rhs, |ordering| ordering == std::cmp::Ordering::Greater),
            BinaryOp::Lte => Self::compare(&lhs, &rhs, |ordering| ordering != std::cmp::Ordering::Greater),
            BinaryOp::Gte => Self::compare(&lhs, &rhs, |ordering| ordering != std::cmp::Ordering::Less),
            BinaryOp::And => {
                if lhs.is_truthy() {
                    rhs
                } else {
                    lhs
                }
            }
            BinaryOp::Or => {
                if lhs.is_truthy() {
                    lhs
                } else {
                    rhs
                }
            }
        })
    }

    // Utility: relational comparison; strings compare lexicographically,
    // everything else numerically with NaN comparing false
    fn compare(lhs: &Value, rhs: &Value, test: fn(std::cmp::Ordering) -> bool) -> Value {
        if let (Value::Str(a), Value::Str(b)) = (lhs, rhs) {
            return Value::Bool(test(a.cmp(b)));
        }
        let a = lhs.coerce_number();
        let b = rhs.coerce_number();
        match a.partial_cmp(&b) {
            Some(ordering) => Value::Bool(test(ordering)),
            None => Value::Bool(false),
        }
    }
}

//=============================================
// Section 7: Tests
//=============================================
