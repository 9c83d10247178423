use super::span::Span;
use serde::Serialize;
use std::fmt;

/// Coarse value category assigned to an expression by the type checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum TypeTag {
    /// Not yet checked.
    #[default]
    Unknown,
    Nil,
    Bool,
    Number,
    String,
    /// Ill-typed or malformed; suppresses further diagnostics upward.
    Error,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::Unknown => "UNKNOWN",
            TypeTag::Nil => "NIL",
            TypeTag::Bool => "BOOL",
            TypeTag::Number => "NUMBER",
            TypeTag::String => "STRING",
            TypeTag::Error => "ERROR",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Lit {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
}

impl Lit {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Lit::Nil => TypeTag::Nil,
            Lit::Bool(_) => TypeTag::Bool,
            Lit::Number(_) => TypeTag::Number,
            Lit::Str(_) => TypeTag::String,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ident {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnOp {
    Not,
    Neg,
}

impl UnOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnOp::Not => "!",
            UnOp::Neg => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    // equality
    Eq,
    Ne,
    // relational
    Lt,
    Le,
    Gt,
    Ge,
    // arithmetic
    Add,
    Sub,
    Mul,
    Div,
    // sequencing
    Comma,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Comma => ",",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogicOp {
    And,
    Or,
}

impl LogicOp {
    pub fn symbol(self) -> &'static str {
        match self {
            LogicOp::And => "and",
            LogicOp::Or => "or",
        }
    }
}

/// An expression node.
///
/// `ty` starts out as [`TypeTag::Unknown`] and is filled in once by the
/// type checker; error placeholders are born with [`TypeTag::Error`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    pub ty: TypeTag,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprKind {
    Lit(Lit),
    Grouping(Box<Expr>),
    Unary {
        op: UnOp,
        expr: Box<Expr>,
    },
    Binary {
        lhs: Box<Expr>,
        op: BinOp,
        rhs: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then_: Box<Expr>,
        else_: Box<Expr>,
        /// Span of the `:`; `None` when the parser had to synthesize it.
        colon: Option<Span>,
    },
    Var(Ident),
    Assign {
        target: Ident,
        value: Box<Expr>,
    },
    Logical {
        lhs: Box<Expr>,
        op: LogicOp,
        rhs: Box<Expr>,
    },
    /// Placeholder for an operand the parser could not recognize.
    Error,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        let ty = if matches!(kind, ExprKind::Error) {
            TypeTag::Error
        } else {
            TypeTag::Unknown
        };
        Self { kind, span, ty }
    }

    pub fn error(span: Span) -> Self {
        Self::new(ExprKind::Error, span)
    }

    pub fn lit(lit: Lit, span: Span) -> Self {
        Self::new(ExprKind::Lit(lit), span)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, ExprKind::Error)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    Expr {
        expr: Expr,
        span: Span,
    },
    Print {
        expr: Expr,
        span: Span,
    },
    Var {
        name: Ident,
        init: Option<Expr>,
        span: Span,
    },
    Block {
        stmts: Vec<Stmt>,
        span: Span,
    },
    If {
        cond: Expr,
        then_: Box<Stmt>,
        else_: Option<Box<Stmt>>,
        span: Span,
    },
    /// A declaration that failed to parse; never checked or executed.
    Error {
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr { span, .. }
            | Stmt::Print { span, .. }
            | Stmt::Var { span, .. }
            | Stmt::Block { span, .. }
            | Stmt::If { span, .. }
            | Stmt::Error { span } => *span,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Stmt::Error { .. })
    }
}

// ======= parenthesized printer =======

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lit::Nil => write!(f, "nil"),
            Lit::Bool(b) => write!(f, "{b}"),
            Lit::Number(n) => write!(f, "{n}"),
            Lit::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Lit(lit) => write!(f, "{lit}"),
            ExprKind::Grouping(inner) => write!(f, "(group {inner})"),
            ExprKind::Unary { op, expr } => write!(f, "({} {expr})", op.symbol()),
            ExprKind::Binary { lhs, op, rhs } => write!(f, "({} {lhs} {rhs})", op.symbol()),
            ExprKind::Ternary {
                cond, then_, else_, ..
            } => write!(f, "(?: {cond} {then_} {else_})"),
            ExprKind::Var(id) => write!(f, "{}", id.text),
            ExprKind::Assign { target, value } => write!(f, "(= {} {value})", target.text),
            ExprKind::Logical { lhs, op, rhs } => write!(f, "({} {lhs} {rhs})", op.symbol()),
            ExprKind::Error => write!(f, "<error>"),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expr { expr, .. } => write!(f, "(expr {expr})"),
            Stmt::Print { expr, .. } => write!(f, "(print {expr})"),
            Stmt::Var { name, init, .. } => match init {
                Some(init) => write!(f, "(var {} {init})", name.text),
                None => write!(f, "(var {})", name.text),
            },
            Stmt::Block { stmts, .. } => {
                write!(f, "(block")?;
                for stmt in stmts {
                    write!(f, " {stmt}")?;
                }
                write!(f, ")")
            }
            Stmt::If {
                cond, then_, else_, ..
            } => match else_ {
                Some(else_) => write!(f, "(if {cond} {then_} {else_})"),
                None => write!(f, "(if {cond} {then_})"),
            },
            Stmt::Error { .. } => write!(f, "<error>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp() -> Span {
        Span::point(1, 1)
    }

    fn num(n: f64) -> Expr {
        Expr::lit(Lit::Number(n), sp())
    }

    #[test]
    fn error_expr_is_born_with_error_tag() {
        assert_eq!(Expr::error(sp()).ty, TypeTag::Error);
        assert_eq!(num(1.0).ty, TypeTag::Unknown);
    }

    #[test]
    fn prints_nested_expression() {
        let e = Expr::new(
            ExprKind::Binary {
                lhs: Box::new(num(1.0)),
                op: BinOp::Add,
                rhs: Box::new(Expr::new(
                    ExprKind::Grouping(Box::new(Expr::new(
                        ExprKind::Unary {
                            op: UnOp::Neg,
                            expr: Box::new(num(2.5)),
                        },
                        sp(),
                    ))),
                    sp(),
                )),
            },
            sp(),
        );
        assert_eq!(e.to_string(), "(+ 1 (group (- 2.5)))");
    }

    #[test]
    fn prints_statements() {
        let s = Stmt::If {
            cond: Expr::lit(Lit::Bool(true), sp()),
            then_: Box::new(Stmt::Print {
                expr: Expr::lit(Lit::Str("hi".into()), sp()),
                span: sp(),
            }),
            else_: None,
            span: sp(),
        };
        assert_eq!(s.to_string(), "(if true (print \"hi\"))");
    }

    #[test]
    fn type_tags_render_upper_case() {
        assert_eq!(TypeTag::Number.to_string(), "NUMBER");
        assert_eq!(TypeTag::String.to_string(), "STRING");
    }
}
