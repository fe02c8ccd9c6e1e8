//! Parser state and low-level token operations.

use dtl_core::Span;

use crate::lexer::{Token, TokenKind, token_text};
use crate::{CompileError, ErrorKind, Result};

pub(super) struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    /// Span of the most recently consumed token. Seeds node-span covers.
    last_span: Span,
}

impl<'src> Parser<'src> {
    pub(super) fn new(source: &'src str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            last_span: Span::default(),
        }
    }

    pub(super) fn eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Current token kind, or `None` at end of input.
    pub(super) fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    pub(super) fn peek_nth(&self, lookahead: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + lookahead).map(|t| t.kind)
    }

    pub(super) fn at(&self, kind: TokenKind) -> bool {
        self.peek() == Some(kind)
    }

    /// Span of the current token; an empty span at the end of input.
    pub(super) fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some(token) => token.span,
            None => Span::new(self.source.len() as u32, self.source.len() as u32),
        }
    }

    /// Span of the most recently consumed token.
    pub(super) fn last_span(&self) -> Span {
        self.last_span
    }

    /// Consumes the current token.
    ///
    /// # Panics
    /// Panics at end of input; callers must check first.
    pub(super) fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos];
        self.pos += 1;
        self.last_span = token.span;
        token
    }

    /// Consumes the current token if it has the given kind.
    pub(super) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consumes a token of the given kind or fails with a syntax error.
    pub(super) fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    /// Syntax error at the current token.
    pub(super) fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::new(ErrorKind::Syntax, self.current_span(), message)
    }

    /// Text of a consumed token.
    pub(super) fn text(&self, token: &Token) -> &'src str {
        token_text(self.source, token)
    }
}
