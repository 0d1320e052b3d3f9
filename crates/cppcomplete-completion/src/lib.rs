//! cppcomplete completion engine
//!
//! A context-sensitive, cancellable keyword completion query engine for C and
//! C++ buffers.
//!
//! # Architecture
//!
//! The engine is a two-stage pipeline:
//!
//! 1. **Trigger** (background): the [`ContextClassifier`] reads the token stream
//!    around the caret and either suppresses completion or picks an anchor
//!    offset; the [`CandidateSource`] then produces the full candidate table
//!    once, and the [`CandidateRanker`] orders it once
//! 2. **Refine** (synchronous): every keystroke derives the prefix typed since
//!    the anchor and narrows the cached table with the [`PrefixFilter`]
//!
//! The [`QueryController`] owns the session between the two stages and
//! disposes it on acceptance, dismissal, a caret before the anchor, a
//! non-identifier prefix, or an edit upstream of the anchor.
//!
//! # Core Components
//!
//! ## TokenCursor
//! Read-only view over the host's token stream. [`SliceTokenCursor`] adapts
//! the output of the reference [`lexer`].
//!
//! ## ContextClassifier
//! - [`CppContextClassifier`]: member access, scope, cast and directive rules
//!
//! ## CandidateSource
//! - [`KeywordCandidateSource`]: keyword table plus `#define` placeholders
//! - [`CandidateSourceRegistry`]: concatenation of several sources
//!
//! ## CandidateRanker
//! - [`PriorityRanker`]: priority, then sort key
//!
//! # Configuration
//!
//! [`CompletionSettings`] are loaded from YAML or JSON by [`ConfigLoader`]:
//! case sensitivity per content type, a language variant restricting the
//! keywords, macro placeholder names and an optional keyword table file.
//!
//! # Example: Basic Usage
//!
//! ```ignore
//! use cppcomplete_completion::*;
//! use std::sync::Arc;
//!
//! let controller = QueryController::builtin();
//! let snapshot = Arc::new(TextSnapshot::cpp("int main() {\n    "));
//!
//! // Bare trigger on an empty line: first-tier keywords only
//! let anchor = controller.trigger(snapshot.clone(), 17, QueryKind::Basic).await;
//! assert_eq!(anchor, Some(17));
//!
//! // Typing narrows the cached candidates without producing again
//! let (typed, edit) = snapshot.edit(17, 0, "re");
//! controller.notify_edit(edit);
//! let visible = controller.refine(&typed, 19);
//! assert!(visible.iter().any(|c| c.text == "return"));
//!
//! // Accepting yields the substitution and ends the session
//! let substitution = controller.accept(&typed, 19, &visible[0]);
//! ```
//!
//! # Example: Settings
//!
//! ```ignore
//! use cppcomplete_completion::*;
//! use std::path::Path;
//!
//! let settings = ConfigLoader::load_or_default(Path::new(".cppcomplete"));
//! let controller = QueryController::from_settings(settings)?;
//! ```
pub mod buffer;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod filter;
pub mod language;
pub mod lexer;
pub mod providers;
pub mod ranker;
pub mod token;
pub mod types;

// Re-export public types and traits
pub use buffer::{BufferEdit, BufferSnapshot, TextSnapshot};
pub use config::{CompletionSettings, ConfigFormat, ConfigLoader};
pub use context::{ContextClassifier, CppContextClassifier};
pub use engine::{CompletionQuery, QueryController, QuerySession, QueryState};
pub use error::{CompletionError, CompletionResult};
pub use filter::{match_kind, FilterRequest, PrefixFilter};
pub use language::LanguageVariant;
pub use lexer::{lex, LexedToken, SliceTokenCursor};
pub use providers::{
    CandidatePredicate, CandidateSource, CandidateSourceFactory, CandidateSourceRegistry,
    KeywordCandidateSource, KeywordEntry, KeywordTable,
};
pub use ranker::{rank_by_match_kind, CandidateRanker, PriorityRanker, SourceOrderRanker};
pub use token::{KeywordKind, Token, TokenCursor, TokenKind};
pub use types::*;
