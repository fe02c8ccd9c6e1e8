//! Recursive-descent parser.
//!
//! Tokens come from the lexer; productions build the AST directly. The
//! parser stops at the first error and reports it with the offending
//! token's span.

mod core;
mod grammar;


use crate::ast::Script;
use crate::lexer::{TokenKind, lex};
use crate::{CompileError, ErrorKind, Result};

use self::core::Parser;

/// Parses a whole script.
pub fn parse(source: &str) -> Result<Script> {
    let tokens = lex(source);

    // Surface lexical damage before parsing; the first bad token wins.
    for token in &tokens {
        match token.kind {
            TokenKind::Garbage => {
                return Err(CompileError::new(
                    ErrorKind::Lexical,
                    token.span,
                    "malformed token",
                ));
            }
            TokenKind::UnterminatedBlockComment => {
                return Err(CompileError::new(
                    ErrorKind::Lexical,
                    token.span,
                    "unterminated block comment",
                ));
            }
            _ => {}
        }
    }

    Parser::new(source, tokens).parse_script()
}
