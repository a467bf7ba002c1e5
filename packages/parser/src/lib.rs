//! # Interspy Parser
//!
//! Tokenizes and parses single lines of the Interspy script language, a
//! line-oriented Python subset. Every line is parsed on its own: the live
//! evaluator re-runs a document one line at a time, so a line that only
//! makes sense as part of a block is reported as a syntax error rather
//! than parsed.

pub mod ast;
pub mod error;
pub mod parser;
pub mod tokenizer;

pub use ast::{Expr, Span, Stmt, Target};
pub use error::{ParseError, ParseResult};
pub use parser::{parse_line, Parser};
pub use tokenizer::{tokenize, Token};

#[cfg(feature = "pretty-errors")]
pub use error::format_error;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenizer_basic() {
        let tokens = tokenize("x = 1").unwrap();
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_parse_line_basic() {
        assert!(parse_line("x = 1").unwrap().is_assignment());
    }
}
