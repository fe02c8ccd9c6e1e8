//! Lexer for the DTL surface language.
//!
//! Produces span-based tokens; text is sliced from the source only when
//! needed. Keywords are reserved, case-sensitive, and all-uppercase; a
//! capitalized identifier lexes as `Type`, anything else as `Name`.
//!
//! Consecutive unrecognized characters coalesce into single `Garbage`
//! tokens so malformed input produces one error, not one per byte.

use logos::Logos;

use dtl_core::Span;

/// Token kinds. Trivia (whitespace and comments) never reaches the parser.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip(r"//[^\n]*", allow_greedy = true))]
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
pub enum TokenKind {
    /* Keywords. */
    #[token("AS")]
    As,
    #[token("BY")]
    By,
    #[token("CONSECUTIVE")]
    Consecutive,
    #[token("DISTINCT")]
    Distinct,
    #[token("EXPORT")]
    Export,
    #[token("FROM")]
    From,
    #[token("GROUP")]
    Group,
    #[token("IMPORT")]
    Import,
    #[token("JOIN")]
    Join,
    #[token("ON")]
    On,
    #[token("SELECT")]
    Select,
    #[token("TO")]
    To,
    #[token("UPDATE")]
    Update,
    #[token("USING")]
    Using,
    #[token("WHERE")]
    Where,
    #[token("WITH")]
    With,

    /* Identifiers. */
    #[regex("[A-Z][A-Za-z0-9_]*")]
    Type,
    #[regex("[a-z_][A-Za-z0-9_]*")]
    Name,

    /* Literals. */
    #[regex("[0-9]+")]
    Int,
    #[regex("'(?:[^']|'')*'")]
    String,

    /* Punctuation. */
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token("@")]
    At,
    #[token("#")]
    Pound,
    #[token("~")]
    Tilde,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("$")]
    Dollar,
    #[token("=")]
    Eq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    LessThan,
    #[token("<=")]
    LessThanEq,
    #[token(">")]
    GreaterThan,
    #[token(">=")]
    GreaterThanEq,
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("^")]
    Caret,
    #[token("%")]
    Percent,

    /// A `/*` comment that never closes. Complete comments are trivia and
    /// match longer, so this only surfaces at end of input.
    #[regex(r"/\*(?:[^*]|\*[^/])*")]
    UnterminatedBlockComment,

    /// Coalesced run of characters no rule matched.
    Garbage,
}

/// Zero-copy token: kind plus byte span into the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Tokenizes the whole source, coalescing error runs into `Garbage`.
pub fn lex(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    let mut garbage_start: Option<usize> = None;

    loop {
        match lexer.next() {
            Some(Ok(kind)) => {
                if let Some(start) = garbage_start.take() {
                    let end = lexer.span().start;
                    tokens.push(Token::new(
                        TokenKind::Garbage,
                        Span::new(start as u32, end as u32),
                    ));
                }
                let span = lexer.span();
                tokens.push(Token::new(kind, Span::new(span.start as u32, span.end as u32)));
            }
            Some(Err(())) => {
                if garbage_start.is_none() {
                    garbage_start = Some(lexer.span().start);
                }
            }
            None => {
                if let Some(start) = garbage_start.take() {
                    tokens.push(Token::new(
                        TokenKind::Garbage,
                        Span::new(start as u32, source.len() as u32),
                    ));
                }
                break;
            }
        }
    }

    tokens
}

/// The text slice a token covers.
#[inline]
pub fn token_text<'s>(source: &'s str, token: &Token) -> &'s str {
    &source[token.span.range()]
}

/// Decodes a string literal's value: strips the quotes and collapses the
/// `''` escape.
pub fn string_value(text: &str) -> String {
    debug_assert!(text.len() >= 2 && text.starts_with('\'') && text.ends_with('\''));
    text[1..text.len() - 1].replace("''", "'")
}
