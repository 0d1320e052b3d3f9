//! Token model and the cursor interface the classifier reads tokens through
//!
//! The engine does not own a lexer. Hosts hand it a [`TokenCursor`] positioned
//! over their own token stream; [`crate::lexer`] ships a reference
//! implementation backed by a small C/C++ lexer.

use crate::types::TextSpan;

/// Reserved words whose follow-up is constrained
///
/// Everything else the lexer recognizes as a keyword is `Plain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordKind {
    Goto,
    Namespace,
    StaticCast,
    DynamicCast,
    ReinterpretCast,
    ConstCast,
    Template,
    Decltype,
    Typeid,
    Alignof,
    Alignas,
    StaticAssert,
    Asm,
    Plain,
}

/// Closed set of token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Whitespace,
    Newline,
    LineComment,
    BlockComment,
    DocComment,
    Identifier,
    Keyword(KeywordKind),
    Number,
    StringLiteral,
    CharLiteral,
    /// `.`
    Dot,
    /// `.*`
    DotStar,
    /// `->`
    Arrow,
    /// `->*`
    ArrowStar,
    /// `::`
    Scope,
    /// `...`
    Ellipsis,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Semicolon,
    Comma,
    Colon,
    /// Any other operator or punctuator
    Operator,
    /// A whole directive line; its tokens live in the embedded stream
    PreprocessorDirective,
    /// `#` inside a directive
    Hash,
    /// The name following `#` (`define`, `include`, ...)
    DirectiveName,
    Unknown,
}

impl TokenKind {
    /// Whitespace, newlines and comments
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::Newline
                | TokenKind::LineComment
                | TokenKind::BlockComment
                | TokenKind::DocComment
        )
    }
}

/// A token borrowed from the cursor's backing storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub span: TextSpan,
    pub text: &'a str,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, span: TextSpan, text: &'a str) -> Self {
        Self { kind, span, text }
    }

    /// Non-empty text made only of identifier characters
    pub fn is_identifier_continuation(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(is_identifier_part)
    }
}

/// Characters that may continue an identifier (`$` is accepted as GCC does)
pub fn is_identifier_part(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

/// Read-only, position-addressable view over a token stream
///
/// Offsets are byte offsets into the buffer the stream was produced from.
/// Embedded streams (directive contents) use the same absolute offsets.
pub trait TokenCursor {
    /// Position the cursor on the token immediately left of `offset`, i.e. the
    /// token whose span satisfies `start < offset <= end`.
    ///
    /// Returns `false` (and leaves the cursor unpositioned) when no such token
    /// exists, for example at offset 0.
    fn move_to(&mut self, offset: u32) -> bool;

    /// The token under the cursor
    fn token(&self) -> Option<Token<'_>>;

    /// Step to the previous token; `false` at the start of the stream
    fn move_previous(&mut self) -> bool;

    /// Step to the next token; `false` at the end of the stream
    fn move_next(&mut self) -> bool;

    /// Cursor over the embedded stream of the current token, if it has one
    fn embedded(&self) -> Option<Box<dyn TokenCursor + '_>>;

    /// Step back until a non-trivia token is under the cursor
    fn move_previous_significant(&mut self) -> bool {
        while self.move_previous() {
            if matches!(self.token(), Some(token) if !token.kind.is_trivia()) {
                return true;
            }
        }
        false
    }

    /// Step forward until a non-trivia token is under the cursor
    fn move_next_significant(&mut self) -> bool {
        while self.move_next() {
            if matches!(self.token(), Some(token) if !token.kind.is_trivia()) {
                return true;
            }
        }
        false
    }
}
