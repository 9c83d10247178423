//! Evaluator for plox programs
//!
//! A tree-walking interpreter over the type-checked AST. Bindings live in a
//! [`ScopeChain`]; `print` output goes to the environment's writer so tests
//! and the REPL can capture it.

use plox_ast::ast::{BinOp, Expr, ExprKind, Lit, LogicOp, Stmt, TypeTag, UnOp};
use plox_ast::span::Span;
use plox_types::{ScopeChain, MAX_EVAL_DEPTH};
use std::fmt;
use std::io::{self, Write};

/// Runtime values in plox
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            // f64's Display already omits a trailing ".0"
            Value::Number(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<&Lit> for Value {
    fn from(lit: &Lit) -> Self {
        match lit {
            Lit::Nil => Value::Nil,
            Lit::Bool(b) => Value::Bool(*b),
            Lit::Number(n) => Value::Number(*n),
            Lit::Str(s) => Value::Str(s.clone()),
        }
    }
}

impl Value {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Nil => TypeTag::Nil,
            Value::Bool(_) => TypeTag::Bool,
            Value::Number(_) => TypeTag::Number,
            Value::Str(_) => TypeTag::String,
        }
    }

    /// `nil` and `false` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }
}

/// A fault that aborts the current `interpret` call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct RuntimeError {
    pub span: Span,
    pub message: String,
}

impl RuntimeError {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Runtime environment: variable bindings plus the `print` sink.
///
/// The global scope persists across [`interpret`] calls.
pub struct Env {
    scopes: ScopeChain<Value>,
    out: Box<dyn Write>,
    depth: u32,
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl Env {
    /// Create an environment that prints to stdout
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }

    pub fn with_output(out: impl Write + 'static) -> Self {
        Self {
            scopes: ScopeChain::new(),
            out: Box::new(out),
            depth: 0,
        }
    }

    /// Execute a closure in a child scope that is popped on exit, even when
    /// the closure fails.
    pub fn with_scope<T>(&mut self, f: impl FnOnce(&mut Env) -> Result<T>) -> Result<T> {
        self.scopes.push();
        let result = f(self);
        self.scopes.pop();
        result
    }

    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.scopes.define(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.scopes.get(name)
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.depth()
    }

    fn print(&mut self, value: &Value, span: Span) -> Result<()> {
        writeln!(self.out, "{value}")
            .and_then(|()| self.out.flush())
            .map_err(|e| RuntimeError::new(span, format!("Output error: {e}")))
    }
}

/// Execute `stmts` in order, stopping at the first runtime error.
pub fn interpret(env: &mut Env, stmts: &[Stmt]) -> Result<()> {
    for stmt in stmts {
        exec_stmt(env, stmt)?;
    }
    Ok(())
}

/// Execute a statement
pub fn exec_stmt(env: &mut Env, stmt: &Stmt) -> Result<()> {
    match stmt {
        Stmt::Expr { expr, .. } => {
            eval_expr(env, expr)?;
        }
        Stmt::Print { expr, span } => {
            let v = eval_expr(env, expr)?;
            env.print(&v, *span)?;
        }
        Stmt::Var { name, init, .. } => {
            let v = match init {
                Some(init) => eval_expr(env, init)?,
                None => Value::Nil,
            };
            env.define(name.text.clone(), v);
        }
        Stmt::Block { stmts, .. } => {
            env.with_scope(|env| interpret(env, stmts))?;
        }
        Stmt::If {
            cond, then_, else_, ..
        } => {
            if eval_expr(env, cond)?.is_truthy() {
                exec_stmt(env, then_)?;
            } else if let Some(else_) = else_ {
                exec_stmt(env, else_)?;
            }
        }
        // never produced by a successful parse
        Stmt::Error { .. } => {}
    }
    Ok(())
}

/// Evaluate an expression
pub fn eval_expr(env: &mut Env, expr: &Expr) -> Result<Value> {
    if env.depth >= MAX_EVAL_DEPTH {
        return Err(RuntimeError::new(
            expr.span,
            format!("Expression nesting too deep (limit {MAX_EVAL_DEPTH})"),
        ));
    }
    env.depth += 1;
    let result = eval_kind(env, expr);
    env.depth -= 1;
    result
}

fn eval_kind(env: &mut Env, expr: &Expr) -> Result<Value> {
    let span = expr.span;
    match &expr.kind {
        ExprKind::Lit(lit) => Ok(Value::from(lit)),

        ExprKind::Grouping(inner) => eval_expr(env, inner),

        ExprKind::Unary { op, expr } => {
            let v = eval_expr(env, expr)?;
            match (op, v) {
                (UnOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
                (UnOp::Neg, Value::Number(n)) => Ok(Value::Number(-n)),
                (UnOp::Neg, v) => Err(RuntimeError::new(
                    span,
                    format!("Bad type for negation: '{}'", v.type_tag()),
                )),
            }
        }

        ExprKind::Binary { lhs, op, rhs } => eval_binary(env, *op, lhs, rhs, span),

        ExprKind::Ternary {
            cond, then_, else_, ..
        } => {
            if eval_expr(env, cond)?.is_truthy() {
                eval_expr(env, then_)
            } else {
                eval_expr(env, else_)
            }
        }

        ExprKind::Logical { lhs, op, rhs } => {
            let l = eval_expr(env, lhs)?.is_truthy();
            let decided = match op {
                LogicOp::And => !l,
                LogicOp::Or => l,
            };
            if decided {
                return Ok(Value::Bool(l));
            }
            Ok(Value::Bool(eval_expr(env, rhs)?.is_truthy()))
        }

        ExprKind::Var(id) => env.get(&id.text).cloned().ok_or_else(|| {
            RuntimeError::new(id.span, format!("Undefined variable '{}'", id.text))
        }),

        ExprKind::Assign { target, value } => {
            let v = eval_expr(env, value)?;
            if env.scopes.assign(&target.text, v.clone()) {
                Ok(v)
            } else {
                Err(RuntimeError::new(
                    target.span,
                    format!("Undefined variable '{}'", target.text),
                ))
            }
        }

        ExprKind::Error => Err(RuntimeError::new(
            span,
            "Cannot evaluate malformed expression",
        )),
    }
}

/// Evaluate a binary operation
fn eval_binary(env: &mut Env, op: BinOp, lhs: &Expr, rhs: &Expr, span: Span) -> Result<Value> {
    use BinOp::*;

    let l = eval_expr(env, lhs)?;
    let r = eval_expr(env, rhs)?;

    let bad_types = |l: &Value, r: &Value| {
        let operation = match op {
            Add => "addition",
            Sub => "subtraction",
            Mul => "multiplication",
            Div => "division",
            Lt => "less-than comparison",
            Le => "less-equals comparison",
            Gt => "greater-than comparison",
            Ge => "greater-equals comparison",
            Eq | Ne | Comma => "operation",
        };
        RuntimeError::new(
            span,
            format!(
                "Bad types for {operation}: '{}' and '{}'",
                l.type_tag(),
                r.type_tag()
            ),
        )
    };

    match op {
        Comma => return Ok(r),
        Eq => return Ok(Value::Bool(l == r)),
        Ne => return Ok(Value::Bool(l != r)),
        _ => {}
    }

    match (op, &l, &r) {
        (Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (Div, Value::Number(_), Value::Number(b)) if *b == 0.0 => {
            Err(RuntimeError::new(span, "Division by zero"))
        }
        (Add | Sub | Mul | Div, Value::Number(a), Value::Number(b)) => {
            let n = match op {
                Add => a + b,
                Sub => a - b,
                Mul => a * b,
                _ => a / b,
            };
            Ok(Value::Number(n))
        }
        (Lt | Le | Gt | Ge, Value::Number(a), Value::Number(b)) => {
            let result = match op {
                Lt => a < b,
                Le => a <= b,
                Gt => a > b,
                _ => a >= b,
            };
            Ok(Value::Bool(result))
        }
        _ => Err(bad_types(&l, &r)),
    }
}
