use crate::token::{keyword, Tok, TokKind};
use plox_ast::ast::Lit;
use plox_ast::diag::Diagnostics;
use plox_ast::span::Span;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("Unterminated string")]
    UnterminatedString { span: Span },
    #[error("Unterminated comment")]
    UnterminatedComment { span: Span },
    #[error("Unexpected character '{ch}'")]
    UnexpectedChar { ch: char, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnterminatedString { span }
            | LexError::UnterminatedComment { span }
            | LexError::UnexpectedChar { span, .. } => *span,
        }
    }
}

/// Scan `src` into tokens, reporting lexical errors to `diags`.
///
/// Never fails: the returned stream always ends with exactly one `Eof`.
pub fn scan(src: &str, diags: &mut Diagnostics) -> Vec<Tok> {
    let mut lex = Lexer::new(src);
    let mut toks = Vec::new();
    loop {
        let tok = lex.next_tok();
        let done = tok.kind == TokKind::Eof;
        toks.push(tok);
        if done {
            break;
        }
    }
    let errors = lex.take_errors();
    debug!(tokens = toks.len(), errors = errors.len(), "scan complete");
    for err in errors {
        diags.push(err.span(), err.to_string());
    }
    toks
}

pub struct Lexer<'a> {
    text: &'a str,
    src: &'a [u8],
    pos: usize,
    /// Line and column of the next character.
    line: u32,
    col: u32,
    /// Line and column of the last consumed character.
    last: (u32, u32),
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            text: src,
            src: src.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            last: (1, 1),
            errors: Vec::new(),
        }
    }

    pub fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.errors)
    }

    fn bump(&mut self) -> Option<u8> {
        let b = *self.src.get(self.pos)?;
        self.pos += 1;
        // UTF-8 continuation bytes belong to the character already counted.
        if b & 0xC0 != 0x80 {
            self.last = (self.line, self.col);
            if b == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        Some(b)
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }
    fn peek2(&self) -> Option<u8> {
        self.src.get(self.pos + 1).copied()
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Span from `(line, col)` to the last consumed character.
    fn span_from(&self, line: u32, col: u32) -> Span {
        Span::new(line, col, self.last.0, self.last.1)
    }

    fn tok(&self, kind: TokKind, start: usize, line: u32, col: u32) -> Tok {
        Tok::new(kind, &self.text[start..self.pos], self.span_from(line, col))
    }

    fn skip_ws_and_comments(&mut self) {
        loop {
            while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
                self.bump();
            }
            // line comment: //
            if self.peek() == Some(b'/') && self.peek2() == Some(b'/') {
                while let Some(b) = self.peek() {
                    if b == b'\n' {
                        break;
                    }
                    self.bump();
                }
                continue;
            }
            // block comment: /* ... */
            if self.peek() == Some(b'/') && self.peek2() == Some(b'*') {
                let (line, col) = (self.line, self.col);
                self.bump();
                self.bump();
                loop {
                    match self.bump() {
                        Some(b'*') if self.peek() == Some(b'/') => {
                            self.bump();
                            break;
                        }
                        Some(_) => {}
                        None => {
                            self.errors.push(LexError::UnterminatedComment {
                                span: self.span_from(line, col),
                            });
                            return;
                        }
                    }
                }
                continue;
            }
            break;
        }
    }

    pub fn next_tok(&mut self) -> Tok {
        loop {
            self.skip_ws_and_comments();
            let start = self.pos;
            let (line, col) = (self.line, self.col);
            let Some(b) = self.bump() else {
                return Tok::eof(Span::point(line, col));
            };

            let kind = match b {
                b'(' => TokKind::LeftParen,
                b')' => TokKind::RightParen,
                b'{' => TokKind::LeftBrace,
                b'}' => TokKind::RightBrace,
                b',' => TokKind::Comma,
                b'.' => TokKind::Dot,
                b';' => TokKind::Semicolon,
                b'?' => TokKind::Question,
                b':' => TokKind::Colon,
                b'-' => TokKind::Minus,
                b'+' => TokKind::Plus,
                b'*' => TokKind::Star,
                b'/' => TokKind::Slash,
                b'!' if self.eat(b'=') => TokKind::BangEqual,
                b'!' => TokKind::Bang,
                b'=' if self.eat(b'=') => TokKind::EqualEqual,
                b'=' => TokKind::Equal,
                b'<' if self.eat(b'=') => TokKind::LessEqual,
                b'<' => TokKind::Less,
                b'>' if self.eat(b'=') => TokKind::GreaterEqual,
                b'>' => TokKind::Greater,
                b'"' => match self.string(line, col) {
                    Some(tok) => return tok,
                    // unterminated: reported, nothing to emit
                    None => continue,
                },
                b if b.is_ascii_digit() => return self.number(start, line, col),
                b if b.is_ascii_alphabetic() || b == b'_' => {
                    return self.identifier(start, line, col)
                }
                _ => return self.unexpected(start, line, col),
            };
            return self.tok(kind, start, line, col);
        }
    }

    /// Called after the opening quote has been consumed.
    fn string(&mut self, line: u32, col: u32) -> Option<Tok> {
        let start = self.pos - 1;
        let mut buf = Vec::new();
        loop {
            match self.bump() {
                Some(b'"') => break,
                Some(b'\\') => {
                    let Some(esc) = self.bump() else {
                        return self.unterminated_string(line, col);
                    };
                    buf.push(match esc {
                        b'n' => b'\n',
                        b't' => b'\t',
                        b'r' => b'\r',
                        other => other,
                    });
                }
                Some(b) => buf.push(b),
                None => return self.unterminated_string(line, col),
            }
        }
        // Quotes and backslashes are ASCII, so `buf` is still valid UTF-8.
        let value = String::from_utf8_lossy(&buf).into_owned();
        let mut tok = self.tok(TokKind::String, start, line, col);
        tok.literal = Some(Lit::Str(value));
        Some(tok)
    }

    fn unterminated_string(&mut self, line: u32, col: u32) -> Option<Tok> {
        self.errors.push(LexError::UnterminatedString {
            span: self.span_from(line, col),
        });
        None
    }

    fn number(&mut self, start: usize, line: u32, col: u32) -> Tok {
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.bump();
        }
        // A trailing '.' without a digit is left for the next token.
        if self.peek() == Some(b'.') && matches!(self.peek2(), Some(b) if b.is_ascii_digit()) {
            self.bump();
            while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
                self.bump();
            }
        }
        let mut tok = self.tok(TokKind::Number, start, line, col);
        // digits with an optional fraction always fit an f64
        tok.literal = tok.lexeme.parse().ok().map(Lit::Number);
        tok
    }

    fn identifier(&mut self, start: usize, line: u32, col: u32) -> Tok {
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            self.bump();
        }
        let text = &self.text[start..self.pos];
        let kind = keyword(text).unwrap_or(TokKind::Identifier);
        let mut tok = self.tok(kind, start, line, col);
        tok.literal = match kind {
            TokKind::True => Some(Lit::Bool(true)),
            TokKind::False => Some(Lit::Bool(false)),
            TokKind::Nil => Some(Lit::Nil),
            _ => None,
        };
        tok
    }

    fn unexpected(&mut self, start: usize, line: u32, col: u32) -> Tok {
        // Swallow the rest of a multi-byte character.
        while matches!(self.peek(), Some(b) if b & 0xC0 == 0x80) {
            self.bump();
        }
        let tok = self.tok(TokKind::Error, start, line, col);
        let ch = tok.lexeme.chars().next().unwrap_or('\u{FFFD}');
        self.errors.push(LexError::UnexpectedChar { ch, span: tok.span });
        tok
    }
}
