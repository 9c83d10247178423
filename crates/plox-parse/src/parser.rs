use crate::lexer::scan;
use crate::token::{Tok, TokKind};
use anyhow::{bail, Result};
use plox_ast::ast::{BinOp, Expr, ExprKind, Ident, LogicOp, Stmt, UnOp};
use plox_ast::diag::Diagnostics;
use plox_ast::span::Span;
use tracing::{debug, trace};

/// Maximum nesting before parsing gives up. Statements and expressions are
/// counted separately; each operand of a left-associative chain counts as
/// one expression level.
pub const MAX_NESTING_DEPTH: u32 = 200;

/// A failure that abandons the current declaration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub span: Span,
    pub message: String,
}

type PResult<T> = std::result::Result<T, ParseError>;

/// Parse a token stream into statements, reporting problems to `diags`.
///
/// Never fails: a declaration that cannot be parsed becomes `Stmt::Error`
/// and parsing resumes at the next statement boundary.
pub fn parse(mut toks: Vec<Tok>, diags: &mut Diagnostics) -> Vec<Stmt> {
    if !matches!(toks.last(), Some(t) if t.kind == TokKind::Eof) {
        let span = toks.last().map_or(Span::point(1, 1), |t| t.span);
        toks.push(Tok::eof(span));
    }
    let mut p = Parser {
        toks,
        pos: 0,
        stmt_depth: 0,
        expr_depth: 0,
        diags,
    };
    let mut stmts = Vec::new();
    while !p.at_end() {
        stmts.push(p.declaration());
    }
    debug!(statements = stmts.len(), "parse complete");
    stmts
}

/// Scan and parse `src`, failing with the rendered diagnostics if any
/// lexical or syntax error was found.
pub fn parse_str(file: &str, src: &str) -> Result<Vec<Stmt>> {
    let mut diags = Diagnostics::new();
    let toks = scan(src, &mut diags);
    let stmts = parse(toks, &mut diags);
    if !diags.is_empty() {
        bail!(
            "{}: {} syntax error(s)\n{}",
            file,
            diags.len(),
            diags.render(src)
        );
    }
    Ok(stmts)
}

struct Parser<'d> {
    toks: Vec<Tok>,
    pos: usize,
    stmt_depth: u32,
    expr_depth: u32,
    diags: &'d mut Diagnostics,
}

impl<'d> Parser<'d> {
    fn cur(&self) -> &Tok {
        &self.toks[self.pos]
    }

    fn at(&self, k: TokKind) -> bool {
        self.cur().kind == k
    }

    fn at_end(&self) -> bool {
        self.at(TokKind::Eof)
    }

    fn bump(&mut self) -> Tok {
        let t = self.cur().clone();
        if !self.at_end() {
            self.pos += 1;
        }
        t
    }

    fn eat(&mut self, k: TokKind) -> Option<Tok> {
        if self.at(k) {
            Some(self.bump())
        } else {
            None
        }
    }

    fn expect(&mut self, k: TokKind, message: &str) -> PResult<Tok> {
        match self.eat(k) {
            Some(t) => Ok(t),
            None => Err(self.error_at_cur(message)),
        }
    }

    fn error_at_cur(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            span: self.cur().span,
            message: message.into(),
        }
    }

    /// Record a problem that does not abandon the declaration.
    fn report(&mut self, span: Span, message: impl Into<String>) {
        self.diags.push(span, message);
    }

    fn depth_error(&self) -> ParseError {
        self.error_at_cur(format!(
            "Nesting depth exceeds limit of {MAX_NESTING_DEPTH}"
        ))
    }

    fn nested_stmt(&mut self, f: impl FnOnce(&mut Self) -> PResult<Stmt>) -> PResult<Stmt> {
        if self.stmt_depth >= MAX_NESTING_DEPTH {
            return Err(self.depth_error());
        }
        self.stmt_depth += 1;
        let result = f(self);
        self.stmt_depth -= 1;
        result
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let base = self.expr_depth;
        self.deepen()?;
        let result = f(self);
        self.expr_depth = base;
        result
    }

    /// Take one more expression level without returning it; the enclosing
    /// [`chain`](Self::chain) or [`nested`](Self::nested) restores the count.
    fn deepen(&mut self) -> PResult<()> {
        if self.expr_depth >= MAX_NESTING_DEPTH {
            return Err(self.depth_error());
        }
        self.expr_depth += 1;
        Ok(())
    }

    /// Run a left-associative loop whose iterations call [`deepen`](Self::deepen).
    fn chain(&mut self, f: impl FnOnce(&mut Self) -> PResult<Expr>) -> PResult<Expr> {
        let base = self.expr_depth;
        let result = f(self);
        self.expr_depth = base;
        result
    }

    // ======= declarations / statements =======

    fn declaration(&mut self) -> Stmt {
        let start = self.pos;
        let result = if self.at(TokKind::Var) {
            self.var_decl()
        } else {
            self.statement()
        };
        match result {
            Ok(stmt) => stmt,
            Err(err) => {
                self.diags.push(err.span, err.message);
                self.synchronize(start);
                let first = self.toks[start].span;
                let last = if self.pos > start {
                    self.toks[self.pos - 1].span
                } else {
                    first
                };
                Stmt::Error {
                    span: first.join(last),
                }
            }
        }
    }

    /// Discard tokens up to the next statement boundary: just after a `;`
    /// or just before a statement keyword.
    fn synchronize(&mut self, start: usize) {
        if self.pos == start {
            self.bump();
        }
        while !self.at_end() {
            if self.pos > 0 && self.toks[self.pos - 1].kind == TokKind::Semicolon {
                break;
            }
            if self.cur().kind.starts_statement() {
                break;
            }
            self.bump();
        }
        trace!(skipped = self.pos - start, "synchronized");
    }

    fn var_decl(&mut self) -> PResult<Stmt> {
        let kw = self.bump();
        let name = self.expect(TokKind::Identifier, "Expected variable name.")?;
        let init = if self.eat(TokKind::Equal).is_some() {
            Some(self.expression()?)
        } else {
            None
        };
        let semi = self.expect(
            TokKind::Semicolon,
            "Expected ';' after variable declaration.",
        )?;
        Ok(Stmt::Var {
            name: Ident {
                text: name.lexeme,
                span: name.span,
            },
            init,
            span: kw.span.join(semi.span),
        })
    }

    fn statement(&mut self) -> PResult<Stmt> {
        self.nested_stmt(|p| match p.cur().kind {
            TokKind::Print => p.print_stmt(),
            TokKind::LeftBrace => p.block(),
            TokKind::If => p.if_stmt(),
            _ => p.expr_stmt(),
        })
    }

    fn print_stmt(&mut self) -> PResult<Stmt> {
        let kw = self.bump();
        let expr = self.expression()?;
        let semi = self.expect(TokKind::Semicolon, "Expected ';' after value.")?;
        Ok(Stmt::Print {
            expr,
            span: kw.span.join(semi.span),
        })
    }

    fn expr_stmt(&mut self) -> PResult<Stmt> {
        let expr = self.expression()?;
        let semi = self.expect(TokKind::Semicolon, "Expected ';' after expression.")?;
        let span = expr.span.join(semi.span);
        Ok(Stmt::Expr { expr, span })
    }

    /// Parse a block: `{ declaration* }`
    fn block(&mut self) -> PResult<Stmt> {
        let open = self.bump();
        let mut stmts = Vec::new();
        while !self.at(TokKind::RightBrace) && !self.at_end() {
            stmts.push(self.declaration());
        }
        let close = self.expect(TokKind::RightBrace, "Expected '}' after block.")?;
        Ok(Stmt::Block {
            stmts,
            span: open.span.join(close.span),
        })
    }

    /// Parse `if (cond) stmt [else stmt]`; `else` binds to the nearest `if`.
    fn if_stmt(&mut self) -> PResult<Stmt> {
        let kw = self.bump();
        self.expect(TokKind::LeftParen, "Expected '(' after 'if'.")?;
        let cond = self.expression()?;
        self.expect(TokKind::RightParen, "Expected ')' after if condition.")?;
        let then_ = Box::new(self.statement()?);
        let else_ = if self.eat(TokKind::Else).is_some() {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        let end = else_.as_ref().map_or(then_.span(), |s| s.span());
        Ok(Stmt::If {
            cond,
            then_,
            else_,
            span: kw.span.join(end),
        })
    }

    // ======= expressions =======
    //
    // Loosest to tightest:
    //   ,  =  or  and  ?:  == !=  < <= > >=  + -  * /  unary  primary

    fn expression(&mut self) -> PResult<Expr> {
        let expr = self.nested(|p| p.comma())?;
        if expr.is_error() {
            return Err(self.error_at_cur("Expected expression."));
        }
        Ok(expr)
    }

    fn comma(&mut self) -> PResult<Expr> {
        self.chain(|p| {
            let mut expr = p.assignment()?;
            while let Some(op_tok) = p.eat(TokKind::Comma) {
                p.deepen()?;
                let rhs = p.assignment()?;
                expr = p.binary(expr, BinOp::Comma, &op_tok, rhs);
            }
            Ok(expr)
        })
    }

    fn assignment(&mut self) -> PResult<Expr> {
        let expr = self.logic_or()?;
        let Some(eq) = self.eat(TokKind::Equal) else {
            return Ok(expr);
        };
        let value = self.nested(|p| p.assignment())?;
        if value.is_error() {
            self.report(eq.span, "Assignment expected value");
        }
        match &expr.kind {
            ExprKind::Var(target) => {
                let target = target.clone();
                let span = expr.span.join(value.span);
                Ok(Expr::new(
                    ExprKind::Assign {
                        target,
                        value: Box::new(value),
                    },
                    span,
                ))
            }
            _ => {
                self.report(eq.span, "Invalid assignment target.");
                Ok(expr)
            }
        }
    }

    fn logic_or(&mut self) -> PResult<Expr> {
        self.chain(|p| {
            let mut expr = p.logic_and()?;
            while let Some(op_tok) = p.eat(TokKind::Or) {
                p.deepen()?;
                let rhs = p.logic_and()?;
                expr = p.logical(expr, LogicOp::Or, &op_tok, rhs);
            }
            Ok(expr)
        })
    }

    fn logic_and(&mut self) -> PResult<Expr> {
        self.chain(|p| {
            let mut expr = p.ternary()?;
            while let Some(op_tok) = p.eat(TokKind::And) {
                p.deepen()?;
                let rhs = p.ternary()?;
                expr = p.logical(expr, LogicOp::And, &op_tok, rhs);
            }
            Ok(expr)
        })
    }

    fn ternary(&mut self) -> PResult<Expr> {
        let cond = self.equality()?;
        let Some(q) = self.eat(TokKind::Question) else {
            return Ok(cond);
        };
        let then_ = self.equality()?;
        let colon = self.eat(TokKind::Colon).map(|t| t.span);
        if colon.is_none() {
            self.report(q.span, "Ternary operator expected ':'");
        }
        let else_ = self.nested(|p| p.ternary())?;

        if cond.is_error() {
            self.report(q.span, "Ternary operator ? expected condition");
        }
        let colon_span = colon.unwrap_or(q.span);
        if then_.is_error() {
            self.report(colon_span, "Ternary operator : expected left operand");
        }
        if else_.is_error() && colon.is_some() {
            self.report(colon_span, "Ternary operator : expected right operand");
        }

        let span = cond.span.join(else_.span);
        Ok(Expr::new(
            ExprKind::Ternary {
                cond: Box::new(cond),
                then_: Box::new(then_),
                else_: Box::new(else_),
                colon,
            },
            span,
        ))
    }

    fn equality(&mut self) -> PResult<Expr> {
        self.binary_level(
            &[(TokKind::EqualEqual, BinOp::Eq), (TokKind::BangEqual, BinOp::Ne)],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> PResult<Expr> {
        self.binary_level(
            &[
                (TokKind::Less, BinOp::Lt),
                (TokKind::LessEqual, BinOp::Le),
                (TokKind::Greater, BinOp::Gt),
                (TokKind::GreaterEqual, BinOp::Ge),
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> PResult<Expr> {
        self.binary_level(
            &[(TokKind::Plus, BinOp::Add), (TokKind::Minus, BinOp::Sub)],
            Self::factor,
        )
    }

    fn factor(&mut self) -> PResult<Expr> {
        self.binary_level(
            &[(TokKind::Star, BinOp::Mul), (TokKind::Slash, BinOp::Div)],
            Self::unary,
        )
    }

    /// One left-associative precedence level.
    fn binary_level(
        &mut self,
        ops: &[(TokKind, BinOp)],
        next: fn(&mut Self) -> PResult<Expr>,
    ) -> PResult<Expr> {
        self.chain(|p| {
            let mut expr = next(p)?;
            while let Some(&(_, op)) = ops.iter().find(|(k, _)| p.at(*k)) {
                let op_tok = p.bump();
                p.deepen()?;
                let rhs = next(p)?;
                expr = p.binary(expr, op, &op_tok, rhs);
            }
            Ok(expr)
        })
    }

    fn unary(&mut self) -> PResult<Expr> {
        let op = match self.cur().kind {
            TokKind::Bang => UnOp::Not,
            TokKind::Minus => UnOp::Neg,
            _ => return self.primary(),
        };
        let op_tok = self.bump();
        let operand = self.nested(|p| p.unary())?;
        if operand.is_error() {
            self.report(
                op_tok.span,
                format!("Unary operator {} expected operand", op_tok.lexeme),
            );
        }
        let span = op_tok.span.join(operand.span);
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                expr: Box::new(operand),
            },
            span,
        ))
    }

    /// Literals, variables and groupings. Anything else yields an error
    /// placeholder without consuming the token.
    fn primary(&mut self) -> PResult<Expr> {
        let tok = self.cur().clone();
        if let Some(lit) = tok.literal {
            self.bump();
            return Ok(Expr::lit(lit, tok.span));
        }
        let expr = match tok.kind {
            TokKind::Identifier => {
                self.bump();
                Expr::new(
                    ExprKind::Var(Ident {
                        text: tok.lexeme,
                        span: tok.span,
                    }),
                    tok.span,
                )
            }
            TokKind::LeftParen => {
                self.bump();
                let inner = self.expression()?;
                let span = match self.eat(TokKind::RightParen) {
                    Some(close) => tok.span.join(close.span),
                    None => {
                        self.report(tok.span, "Expected closing bracket");
                        tok.span.join(inner.span)
                    }
                };
                Expr::new(ExprKind::Grouping(Box::new(inner)), span)
            }
            _ => Expr::error(tok.span),
        };
        Ok(expr)
    }

    // ======= node builders =======

    fn binary(&mut self, lhs: Expr, op: BinOp, op_tok: &Tok, rhs: Expr) -> Expr {
        let label = format!("Binary operator {}", op_tok.lexeme);
        self.check_operands(&label, op_tok.span, &lhs, &rhs);
        let span = lhs.span.join(rhs.span);
        Expr::new(
            ExprKind::Binary {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
            },
            span,
        )
    }

    fn logical(&mut self, lhs: Expr, op: LogicOp, op_tok: &Tok, rhs: Expr) -> Expr {
        let label = format!("Logical operator {}", op_tok.lexeme);
        self.check_operands(&label, op_tok.span, &lhs, &rhs);
        let span = lhs.span.join(rhs.span);
        Expr::new(
            ExprKind::Logical {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
            },
            span,
        )
    }

    fn check_operands(&mut self, label: &str, at: Span, lhs: &Expr, rhs: &Expr) {
        if lhs.is_error() {
            self.report(at, format!("{label} expected left operand"));
        }
        if rhs.is_error() {
            self.report(at, format!("{label} expected right operand"));
        }
    }
}
