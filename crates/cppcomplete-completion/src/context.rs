/// Context classification for completion triggers
///
/// This module decides, from the token stream around the caret, whether
/// general completion may be offered and where the substitution anchor lies.
///
/// # Rules
///
/// - Inside a comment: anchor at the caret, tagged [`ContextTag::Comment`]
/// - After trivia: anchor at the caret, unless the last significant token is
///   on the deny list
/// - On a partial word: anchor at the word's start so the word gets replaced,
///   unless the token before it is on the deny list
/// - On a deny-listed token (`.`, `->`, `::`, `goto`, `static_cast`, ...):
///   suppress, since a narrower provider owns those positions
/// - Inside a preprocessor directive: see [`directive`]
///
/// Classification is pure: the same token snapshot and offset always produce
/// the same decision.
use crate::token::{KeywordKind, Token, TokenCursor, TokenKind};
use crate::types::{ContextTag, TriggerDecision};

mod directive;

/// Classifier from a token cursor and caret offset to a trigger decision
///
/// # Example
///
/// ```ignore
/// use cppcomplete_completion::context::*;
/// use cppcomplete_completion::buffer::{BufferSnapshot, TextSnapshot};
///
/// let snapshot = TextSnapshot::cpp("a.b->c[1].");
/// let mut cursor = snapshot.token_cursor();
/// let decision = CppContextClassifier.classify(cursor.as_mut(), 10);
/// assert!(decision.is_suppressed());
/// ```
pub trait ContextClassifier: Send + Sync {
    /// Classify the caret position `offset`
    ///
    /// The cursor may be moved freely; callers must not rely on its position
    /// afterwards.
    fn classify(&self, cursor: &mut dyn TokenCursor, offset: u32) -> TriggerDecision;
}

/// Classifier for C and C++ token streams
#[derive(Debug, Clone, Copy, Default)]
pub struct CppContextClassifier;

impl ContextClassifier for CppContextClassifier {
    fn classify(&self, cursor: &mut dyn TokenCursor, offset: u32) -> TriggerDecision {
        if !cursor.move_to(offset) {
            return TriggerDecision::anchor(offset, ContextTag::Normal);
        }

        let in_directive = matches!(
            cursor.token(),
            Some(token) if token.kind == TokenKind::PreprocessorDirective
        );
        if in_directive {
            return match cursor.embedded() {
                Some(mut embedded) => directive::classify_directive(embedded.as_mut(), offset),
                None => TriggerDecision::Suppressed,
            };
        }

        classify_in_stream(cursor, offset, ContextTag::Normal)
    }
}

/// Classify with the cursor already positioned on the token left of `offset`
pub(crate) fn classify_in_stream(
    cursor: &mut dyn TokenCursor,
    offset: u32,
    tag: ContextTag,
) -> TriggerDecision {
    let Some(token) = cursor.token() else {
        return TriggerDecision::anchor(offset, tag);
    };
    let kind = token.kind;
    let start = token.span.start;

    match kind {
        TokenKind::LineComment | TokenKind::BlockComment | TokenKind::DocComment => {
            if comment_contains(&token, offset) {
                TriggerDecision::anchor(offset, ContextTag::Comment)
            } else {
                after_trivia(cursor, offset, tag)
            }
        }
        TokenKind::Whitespace | TokenKind::Newline => after_trivia(cursor, offset, tag),
        TokenKind::StringLiteral | TokenKind::CharLiteral => {
            if literal_contains(&token, offset) {
                TriggerDecision::Suppressed
            } else {
                TriggerDecision::anchor(offset, tag)
            }
        }
        TokenKind::Identifier
        | TokenKind::Keyword(_)
        | TokenKind::Number
        | TokenKind::DirectiveName => {
            if !token.is_identifier_continuation() {
                return TriggerDecision::anchor(offset, tag);
            }
            if previous_significant_is_denied(cursor) {
                TriggerDecision::Suppressed
            } else {
                TriggerDecision::anchor(start, tag)
            }
        }
        TokenKind::Dot
        | TokenKind::DotStar
        | TokenKind::Arrow
        | TokenKind::ArrowStar
        | TokenKind::Scope => TriggerDecision::Suppressed,
        TokenKind::Ellipsis
        | TokenKind::LParen
        | TokenKind::RParen
        | TokenKind::LBracket
        | TokenKind::RBracket
        | TokenKind::LBrace
        | TokenKind::RBrace
        | TokenKind::Semicolon
        | TokenKind::Comma
        | TokenKind::Colon
        | TokenKind::Operator
        | TokenKind::PreprocessorDirective
        | TokenKind::Hash
        | TokenKind::Unknown => TriggerDecision::anchor(offset, tag),
    }
}

/// Token kinds after which general completion is wrong
pub fn is_denied(kind: TokenKind) -> bool {
    match kind {
        TokenKind::Dot
        | TokenKind::DotStar
        | TokenKind::Arrow
        | TokenKind::ArrowStar
        | TokenKind::Scope => true,
        TokenKind::Keyword(keyword) => match keyword {
            // expect a name
            KeywordKind::Goto | KeywordKind::Namespace => true,
            // expect `(`
            KeywordKind::Decltype
            | KeywordKind::Typeid
            | KeywordKind::Alignof
            | KeywordKind::Alignas
            | KeywordKind::StaticAssert
            | KeywordKind::Asm => true,
            // expect `<`
            KeywordKind::StaticCast
            | KeywordKind::DynamicCast
            | KeywordKind::ReinterpretCast
            | KeywordKind::ConstCast
            | KeywordKind::Template => true,
            KeywordKind::Plain => false,
        },
        TokenKind::Whitespace
        | TokenKind::Newline
        | TokenKind::LineComment
        | TokenKind::BlockComment
        | TokenKind::DocComment
        | TokenKind::Identifier
        | TokenKind::Number
        | TokenKind::StringLiteral
        | TokenKind::CharLiteral
        | TokenKind::Ellipsis
        | TokenKind::LParen
        | TokenKind::RParen
        | TokenKind::LBracket
        | TokenKind::RBracket
        | TokenKind::LBrace
        | TokenKind::RBrace
        | TokenKind::Semicolon
        | TokenKind::Comma
        | TokenKind::Colon
        | TokenKind::Operator
        | TokenKind::PreprocessorDirective
        | TokenKind::Hash
        | TokenKind::DirectiveName
        | TokenKind::Unknown => false,
    }
}

fn after_trivia(cursor: &mut dyn TokenCursor, offset: u32, tag: ContextTag) -> TriggerDecision {
    if previous_significant_is_denied(cursor) {
        TriggerDecision::Suppressed
    } else {
        TriggerDecision::anchor(offset, tag)
    }
}

fn previous_significant_is_denied(cursor: &mut dyn TokenCursor) -> bool {
    cursor.move_previous_significant()
        && cursor.token().is_some_and(|token| is_denied(token.kind))
}

/// True if the caret at `offset` sits inside the comment
///
/// Line comments run to the end of the line, so any caret within the span is
/// inside. A caret right after a closing `*/` is outside.
fn comment_contains(token: &Token<'_>, offset: u32) -> bool {
    if token.text.starts_with("//") {
        return true;
    }
    let closed = token.text.len() >= 4 && token.text.ends_with("*/");
    !closed || offset < token.span.end
}

/// True if the caret at `offset` sits inside the literal
fn literal_contains(token: &Token<'_>, offset: u32) -> bool {
    offset < token.span.end || !literal_is_closed(token)
}

fn literal_is_closed(token: &Token<'_>) -> bool {
    let quote = if token.kind == TokenKind::CharLiteral {
        '\''
    } else {
        '"'
    };
    let Some(open) = token.text.find(quote) else {
        return false;
    };
    let body = &token.text[open + 1..];
    let Some(inner) = body.strip_suffix(quote) else {
        return false;
    };
    let trailing_backslashes = inner.chars().rev().take_while(|c| *c == '\\').count();
    trailing_backslashes % 2 == 0
}
