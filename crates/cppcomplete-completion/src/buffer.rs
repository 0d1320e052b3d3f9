//! Read-only buffer snapshots consumed by the query engine
//!
//! The host editor owns the document; the engine only ever sees immutable
//! snapshots through [`BufferSnapshot`] and learns about mutations through
//! [`BufferEdit`] notifications.

use crate::lexer::{lex, LexedToken, SliceTokenCursor};
use crate::token::TokenCursor;
use std::sync::Arc;

/// Immutable view of a buffer at one point in time
pub trait BufferSnapshot: Send + Sync {
    /// Full text of the snapshot
    fn text(&self) -> &str;

    /// Content type used to resolve per-language settings (e.g. `text/x-c++`)
    fn content_type(&self) -> &str;

    /// A fresh cursor over the snapshot's token stream
    fn token_cursor(&self) -> Box<dyn TokenCursor + '_>;

    /// Read `length` bytes starting at `offset`
    ///
    /// Returns `None` if the range is out of bounds or splits a UTF-8 sequence.
    fn read(&self, offset: u32, length: u32) -> Option<String> {
        let start = offset as usize;
        let end = start.checked_add(length as usize)?;
        self.text().get(start..end).map(str::to_string)
    }

    fn len(&self) -> u32 {
        self.text().len() as u32
    }

    fn is_empty(&self) -> bool {
        self.text().is_empty()
    }
}

/// [`BufferSnapshot`] over an owned string, lexed with the reference lexer
#[derive(Debug, Clone)]
pub struct TextSnapshot {
    text: Arc<str>,
    content_type: String,
    tokens: Arc<Vec<LexedToken>>,
}

impl TextSnapshot {
    pub fn new(text: impl Into<Arc<str>>, content_type: impl Into<String>) -> Self {
        let text: Arc<str> = text.into();
        let tokens = Arc::new(lex(&text));
        Self {
            text,
            content_type: content_type.into(),
            tokens,
        }
    }

    /// Snapshot with the C++ content type
    pub fn cpp(text: impl Into<Arc<str>>) -> Self {
        Self::new(text, crate::language::CPP_CONTENT_TYPE)
    }

    /// Snapshot with the C content type
    pub fn c(text: impl Into<Arc<str>>) -> Self {
        Self::new(text, crate::language::C_CONTENT_TYPE)
    }

    pub fn tokens(&self) -> &[LexedToken] {
        &self.tokens
    }

    /// Apply an edit and return the resulting snapshot together with the edit
    /// descriptor the controller should be notified with
    pub fn edit(&self, offset: u32, removed_len: u32, inserted: &str) -> (Self, BufferEdit) {
        let start = floor_char_boundary(&self.text, offset as usize);
        let end = floor_char_boundary(&self.text, start.saturating_add(removed_len as usize));
        let mut text = String::with_capacity(self.text.len() + inserted.len());
        text.push_str(&self.text[..start]);
        text.push_str(inserted);
        text.push_str(&self.text[end..]);

        let edit = BufferEdit {
            offset: start as u32,
            removed_len: (end - start) as u32,
            inserted_len: inserted.len() as u32,
        };
        (Self::new(text, self.content_type.clone()), edit)
    }
}

impl BufferSnapshot for TextSnapshot {
    fn text(&self) -> &str {
        &self.text
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn token_cursor(&self) -> Box<dyn TokenCursor + '_> {
        Box::new(SliceTokenCursor::new(&self.text, &self.tokens))
    }
}

fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// A buffer mutation, reported by the host after it happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferEdit {
    pub offset: u32,
    pub removed_len: u32,
    pub inserted_len: u32,
}

impl BufferEdit {
    pub fn insert(offset: u32, inserted_len: u32) -> Self {
        Self {
            offset,
            removed_len: 0,
            inserted_len,
        }
    }

    pub fn remove(offset: u32, removed_len: u32) -> Self {
        Self {
            offset,
            removed_len,
            inserted_len: 0,
        }
    }

    /// True if the edit shifts or rewrites text strictly before `offset`
    pub fn is_upstream_of(&self, offset: u32) -> bool {
        self.offset < offset
    }
}
