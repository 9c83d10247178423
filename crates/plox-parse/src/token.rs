use plox_ast::ast::Lit;
use plox_ast::span::Span;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokKind {
    // punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Semicolon,
    Question,
    Colon,
    // arithmetic
    Minus,
    Plus,
    Slash,
    Star,
    // comparison / assignment
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    // literals
    Identifier,
    String,
    Number,
    // keywords
    And,
    Class,
    Else,
    False,
    For,
    Fun,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,
    // sentinels
    /// Character the scanner could not classify.
    Error,
    Eof,
}

impl TokKind {
    /// Keywords that begin a statement; the parser resynchronizes before them.
    pub fn starts_statement(self) -> bool {
        matches!(
            self,
            TokKind::Class
                | TokKind::Fun
                | TokKind::For
                | TokKind::Var
                | TokKind::If
                | TokKind::While
                | TokKind::Print
                | TokKind::Return
        )
    }
}

pub fn keyword(text: &str) -> Option<TokKind> {
    let kind = match text {
        "and" => TokKind::And,
        "class" => TokKind::Class,
        "else" => TokKind::Else,
        "false" => TokKind::False,
        "for" => TokKind::For,
        "fun" => TokKind::Fun,
        "if" => TokKind::If,
        "nil" => TokKind::Nil,
        "or" => TokKind::Or,
        "print" => TokKind::Print,
        "return" => TokKind::Return,
        "super" => TokKind::Super,
        "this" => TokKind::This,
        "true" => TokKind::True,
        "var" => TokKind::Var,
        "while" => TokKind::While,
        _ => return None,
    };
    Some(kind)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tok {
    pub kind: TokKind,
    pub lexeme: String,
    pub literal: Option<Lit>,
    pub span: Span,
}

impl Tok {
    pub fn new(kind: TokKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            literal: None,
            span,
        }
    }

    pub fn eof(span: Span) -> Self {
        Self::new(TokKind::Eof, "", span)
    }
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {:?} {:?}",
            self.span.line, self.span.col, self.kind, self.lexeme
        )?;
        if let Some(lit) = &self.literal {
            write!(f, " {lit}")?;
        }
        Ok(())
    }
}
