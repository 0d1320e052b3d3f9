//! Classification inside preprocessor directive lines
//!
//! The caret on or inside the directive name is never a keyword position.
//! Directives that take file names, macro names or free text suppress
//! completion entirely. `#define` suppresses up to the end of the macro name
//! and classifies the replacement list with [`ContextTag::PreprocessorDefine`].
//! Every other directive (`#if`, `#elif`, ...) holds an expression and is
//! classified like ordinary code.

use super::classify_in_stream;
use crate::token::{TokenCursor, TokenKind};
use crate::types::{ContextTag, TriggerDecision};

/// Directives whose operands are never general keyword positions
const SUPPRESSING_DIRECTIVES: &[&str] = &[
    "include",
    "include_next",
    "import",
    "undef",
    "ifdef",
    "ifndef",
    "elifdef",
    "elifndef",
    "pragma",
    "error",
    "warning",
    "line",
];

/// Classify `offset` within a directive's embedded token stream
pub(super) fn classify_directive(cursor: &mut dyn TokenCursor, offset: u32) -> TriggerDecision {
    if !cursor.move_to(offset) {
        return TriggerDecision::Suppressed;
    }
    while cursor.move_previous() {}

    if !matches!(cursor.token(), Some(token) if token.kind == TokenKind::Hash) {
        return TriggerDecision::Suppressed;
    }
    if !cursor.move_next_significant() {
        return TriggerDecision::Suppressed;
    }
    let Some(name) = cursor.token() else {
        return TriggerDecision::Suppressed;
    };
    if name.kind != TokenKind::DirectiveName || offset <= name.span.end {
        return TriggerDecision::Suppressed;
    }
    let directive = name.text.to_owned();

    let tag = match directive.as_str() {
        "define" => {
            if !cursor.move_next_significant() {
                return TriggerDecision::Suppressed;
            }
            match cursor.token() {
                Some(macro_name) if offset > macro_name.span.end => {}
                _ => return TriggerDecision::Suppressed,
            }
            ContextTag::PreprocessorDefine
        }
        name if SUPPRESSING_DIRECTIVES.contains(&name) => {
            return TriggerDecision::Suppressed;
        }
        _ => ContextTag::Normal,
    };

    if !cursor.move_to(offset) {
        return TriggerDecision::Suppressed;
    }
    tracing::trace!(%directive, ?tag, offset, "Classifying directive body");
    classify_in_stream(cursor, offset, tag)
}
