pub mod ast;
pub mod diag;

pub mod span {
    use serde::Serialize;

    /// Source region covered by a token or node.
    ///
    /// Lines and columns are 1-based. `end_col` is the column of the last
    /// character covered, so a one-character token has `col == end_col`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
    pub struct Span {
        pub line: u32,
        pub col: u32,
        pub end_line: u32,
        pub end_col: u32,
    }

    impl Span {
        pub fn new(line: u32, col: u32, end_line: u32, end_col: u32) -> Self {
            Self {
                line,
                col,
                end_line,
                end_col,
            }
        }

        pub fn point(line: u32, col: u32) -> Self {
            Self::new(line, col, line, col)
        }

        /// Start of `self`, end of `other`.
        pub fn join(self, other: Span) -> Span {
            Span {
                line: self.line,
                col: self.col,
                end_line: other.end_line,
                end_col: other.end_col,
            }
        }

        pub fn is_multiline(&self) -> bool {
            self.end_line > self.line
        }
    }

}
