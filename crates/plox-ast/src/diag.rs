//! Diagnostics collector shared by every phase.
//!
//! Errors are recorded in detection order as `{span, message}` pairs and
//! rendered against the source text only when a phase checkpoint asks for
//! them.

use crate::span::Span;
use std::io;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }

    /// Render this diagnostic against `src`.
    ///
    /// Single-line spans get a caret under the start column. Multi-line
    /// spans print every covered line and put the caret under the end
    /// column of the last one.
    pub fn render(&self, src: &str) -> String {
        let lines: Vec<&str> = src.lines().collect();
        let first = self.span.line.max(1);
        let last = self.span.end_line.max(first);

        let mut out = format!("Error: {}\n\n", self.message);
        let mut prefix_len = 0;
        for n in first..=last {
            let text = lines.get(n as usize - 1).copied().unwrap_or("");
            let prefix = format!("{n} | ");
            prefix_len = prefix.len();
            out.push_str(&prefix);
            out.push_str(text);
            out.push('\n');
        }

        let caret_col = if self.span.is_multiline() {
            self.span.end_col
        } else {
            self.span.col
        };
        let pad = prefix_len + caret_col.saturating_sub(1) as usize;
        out.push_str(&" ".repeat(pad));
        out.push_str("^--here\n");
        out
    }
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, span: Span, message: impl Into<String>) {
        self.items.push(Diagnostic::new(span, message));
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Render all diagnostics in arrival order. Does not clear.
    pub fn render(&self, src: &str) -> String {
        self.items.iter().map(|d| d.render(src)).collect()
    }

    /// Write the rendered diagnostics to `out` and clear the list.
    ///
    /// Returns whether anything was reported.
    pub fn report(&mut self, src: &str, out: &mut dyn io::Write) -> io::Result<bool> {
        if self.items.is_empty() {
            return Ok(false);
        }
        out.write_all(self.render(src).as_bytes())?;
        out.flush()?;
        self.items.clear();
        Ok(true)
    }
}
