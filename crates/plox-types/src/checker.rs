// crates/plox-types/src/checker.rs
// Static type checker - tags every expression and reports operand mismatches

use crate::scope::ScopeChain;
use plox_ast::ast::{BinOp, Expr, ExprKind, Ident, Stmt, TypeTag, UnOp};
use plox_ast::diag::Diagnostics;
use plox_ast::span::Span;
use tracing::debug;

/// Maximum nesting of expressions the checker (and evaluator) will walk.
pub const MAX_EVAL_DEPTH: u32 = 512;

/// Type errors that can occur during type checking
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    /// Unary minus applied to something other than a number
    #[error("Bad type for negation: '{ty}'")]
    BadNegation { ty: TypeTag, span: Span },
    /// Binary operator applied to an unsupported pair of operand types
    #[error("Bad operand types for '{op}': '{lhs}' and '{rhs}'")]
    BadOperands {
        op: &'static str,
        lhs: TypeTag,
        rhs: TypeTag,
        span: Span,
    },
    /// The two arms of `?:` disagree
    #[error("Operands of ternary have different types: '{then_}' and '{else_}'")]
    TernaryMismatch {
        then_: TypeTag,
        else_: TypeTag,
        span: Span,
    },
    /// `?` without a matching `:`
    #[error("Malformed ternary operator")]
    MalformedTernary { span: Span },
    /// Reference to a name with no binding in any enclosing scope
    #[error("Undefined variable '{name}'")]
    UndefinedVariable { name: String, span: Span },
    /// Expression nested deeper than [`MAX_EVAL_DEPTH`]
    #[error("Expression nesting too deep (limit {})", MAX_EVAL_DEPTH)]
    DepthLimitExceeded { span: Span },
}

impl TypeError {
    pub fn span(&self) -> Span {
        match self {
            TypeError::BadNegation { span, .. }
            | TypeError::BadOperands { span, .. }
            | TypeError::TernaryMismatch { span, .. }
            | TypeError::MalformedTernary { span }
            | TypeError::UndefinedVariable { span, .. }
            | TypeError::DepthLimitExceeded { span } => *span,
        }
    }
}

/// Type checker with a scoped environment of variable tags.
///
/// The environment outlives a single [`check_program`](Self::check_program)
/// call so a REPL can check one line at a time.
#[derive(Debug, Default)]
pub struct TypeChecker {
    scopes: ScopeChain<TypeTag>,
    depth: u32,
    errors: Vec<TypeError>,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check every statement, writing tags into the expression nodes and
    /// reporting type errors to `diags` in detection order.
    pub fn check_program(&mut self, stmts: &mut [Stmt], diags: &mut Diagnostics) {
        for stmt in stmts.iter_mut() {
            self.check_stmt(stmt);
        }
        let errors = std::mem::take(&mut self.errors);
        debug!(
            statements = stmts.len(),
            errors = errors.len(),
            "type check complete"
        );
        for err in errors {
            diags.push(err.span(), err.to_string());
        }
    }

    /// Tag of a variable as currently known, if it is bound.
    pub fn lookup(&self, name: &str) -> Option<TypeTag> {
        self.scopes.get(name).copied()
    }

    pub fn check_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Expr { expr, .. } | Stmt::Print { expr, .. } => {
                self.check_expr(expr);
            }
            Stmt::Var { name, init, .. } => {
                let tag = match init {
                    Some(init) => self.check_expr(init),
                    None => TypeTag::Nil,
                };
                self.scopes.define(name.text.clone(), tag);
            }
            Stmt::Block { stmts, .. } => self.with_scope(|tc| {
                for stmt in stmts.iter_mut() {
                    tc.check_stmt(stmt);
                }
            }),
            Stmt::If {
                cond, then_, else_, ..
            } => {
                self.check_expr(cond);
                self.check_stmt(then_);
                if let Some(else_) = else_ {
                    self.check_stmt(else_);
                }
            }
            Stmt::Error { .. } => {}
        }
    }

    fn with_scope<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.scopes.push();
        let out = f(self);
        self.scopes.pop();
        out
    }

    /// Tag `expr` (and everything under it), returning its tag.
    ///
    /// A node that already carries a tag is not re-checked.
    pub fn check_expr(&mut self, expr: &mut Expr) -> TypeTag {
        if expr.ty != TypeTag::Unknown {
            return expr.ty;
        }
        let tag = if self.depth >= MAX_EVAL_DEPTH {
            self.fail(TypeError::DepthLimitExceeded { span: expr.span })
        } else {
            self.depth += 1;
            let tag = self.infer(&mut expr.kind, expr.span);
            self.depth -= 1;
            tag
        };
        expr.ty = tag;
        tag
    }

    fn fail(&mut self, err: TypeError) -> TypeTag {
        self.errors.push(err);
        TypeTag::Error
    }

    fn infer(&mut self, kind: &mut ExprKind, span: Span) -> TypeTag {
        use TypeTag::{Bool, Error, Number};

        match kind {
            ExprKind::Lit(lit) => lit.type_tag(),
            ExprKind::Grouping(inner) => self.check_expr(inner),
            ExprKind::Unary { op, expr } => {
                let ty = self.check_expr(expr);
                match (op, ty) {
                    (_, Error) => Error,
                    (UnOp::Not, _) => Bool,
                    (UnOp::Neg, Number) => Number,
                    (UnOp::Neg, ty) => self.fail(TypeError::BadNegation { ty, span }),
                }
            }
            ExprKind::Binary { lhs, op, rhs } => {
                let l = self.check_expr(lhs);
                let r = self.check_expr(rhs);
                if l == Error || r == Error {
                    return Error;
                }
                match binary_result(*op, l, r) {
                    Some(tag) => tag,
                    None => self.fail(TypeError::BadOperands {
                        op: op.symbol(),
                        lhs: l,
                        rhs: r,
                        span,
                    }),
                }
            }
            ExprKind::Ternary {
                cond,
                then_,
                else_,
                colon,
            } => {
                let c = self.check_expr(cond);
                let a = self.check_expr(then_);
                let b = self.check_expr(else_);
                if c == Error || a == Error || b == Error {
                    Error
                } else if colon.is_none() {
                    self.fail(TypeError::MalformedTernary { span })
                } else if a != b {
                    self.fail(TypeError::TernaryMismatch {
                        then_: a,
                        else_: b,
                        span,
                    })
                } else {
                    a
                }
            }
            ExprKind::Logical { lhs, rhs, .. } => {
                let l = self.check_expr(lhs);
                let r = self.check_expr(rhs);
                if l == Error || r == Error {
                    Error
                } else {
                    Bool
                }
            }
            ExprKind::Var(name) => match self.lookup(&name.text) {
                Some(tag) => tag,
                None => self.undefined(name),
            },
            ExprKind::Assign { target, value } => {
                let tag = self.check_expr(value);
                if self.scopes.assign(&target.text, tag) {
                    tag
                } else {
                    self.undefined(target)
                }
            }
            ExprKind::Error => Error,
        }
    }

    fn undefined(&mut self, name: &Ident) -> TypeTag {
        self.fail(TypeError::UndefinedVariable {
            name: name.text.clone(),
            span: name.span,
        })
    }
}

/// Result tag of a binary operator on two well-typed operands, or `None`
/// when the operator does not accept that pair.
fn binary_result(op: BinOp, l: TypeTag, r: TypeTag) -> Option<TypeTag> {
    use TypeTag::{Bool, Number, String};

    match op {
        BinOp::Add => match (l, r) {
            (Number, Number) => Some(Number),
            (String, String) => Some(String),
            _ => None,
        },
        BinOp::Sub | BinOp::Mul | BinOp::Div => (l == Number && r == Number).then_some(Number),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            (l == Number && r == Number).then_some(Bool)
        }
        BinOp::Eq | BinOp::Ne => Some(Bool),
        BinOp::Comma => Some(r),
    }
}
