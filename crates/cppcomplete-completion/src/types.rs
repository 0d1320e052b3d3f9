//! Core data types shared by the classifier, filter, candidate source and controller

use serde::{Deserialize, Serialize};

/// Buffer position (UTF-8 byte offset) where a candidate's inserted text begins
pub type AnchorOffset = u32;

/// Half-open byte range `[start, end)` in a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: u32,
    pub end: u32,
}

impl TextSpan {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// True if the character just left of `offset` lies inside this span,
    /// i.e. `start < offset <= end`.
    pub fn ends_at_or_covers(&self, offset: u32) -> bool {
        self.start < offset && offset <= self.end
    }
}

/// Context flag attached to a trigger decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextTag {
    /// Ordinary code
    #[default]
    Normal,
    /// Replacement list of a `#define` directive, after the macro name
    PreprocessorDefine,
    /// Inside a line, block or doc comment
    Comment,
}

/// Outcome of classifying the caret position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    /// Completion must not be offered here
    Suppressed,
    /// Completion is offered; inserted text replaces `[anchor_offset, caret)`
    AnchorAt {
        anchor_offset: AnchorOffset,
        context_tag: ContextTag,
    },
}

impl TriggerDecision {
    pub fn anchor(anchor_offset: AnchorOffset, context_tag: ContextTag) -> Self {
        TriggerDecision::AnchorAt {
            anchor_offset,
            context_tag,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, TriggerDecision::Suppressed)
    }

    pub fn anchor_offset(&self) -> Option<AnchorOffset> {
        match self {
            TriggerDecision::Suppressed => None,
            TriggerDecision::AnchorAt { anchor_offset, .. } => Some(*anchor_offset),
        }
    }

    pub fn context_tag(&self) -> Option<ContextTag> {
        match self {
            TriggerDecision::Suppressed => None,
            TriggerDecision::AnchorAt { context_tag, .. } => Some(*context_tag),
        }
    }
}

/// Curation tier of a candidate
///
/// `First` candidates are shown on a bare trigger; `All` candidates only show up
/// once a prefix is typed or when everything was explicitly requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    First,
    #[default]
    All,
}

/// Presentation hint for a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateKind {
    #[default]
    Keyword,
    /// Predefined macro-argument name such as `__VA_ARGS__`
    MacroArgument,
}

/// A single completion candidate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    /// Text inserted at the anchor
    pub text: String,
    /// Key used for prefix matching and ordering; stable for a query's lifetime
    pub sort_key: String,
    /// Higher values are listed first
    pub priority: i32,
    pub tier: Tier,
    pub kind: CandidateKind,
}

impl Candidate {
    /// Create a keyword candidate whose sort key equals its text
    pub fn new(text: impl Into<String>, tier: Tier) -> Self {
        let text = text.into();
        Self {
            sort_key: text.clone(),
            text,
            priority: 0,
            tier,
            kind: CandidateKind::Keyword,
        }
    }

    pub fn with_sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = sort_key.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_kind(mut self, kind: CandidateKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_first_tier(&self) -> bool {
        self.tier == Tier::First
    }
}

/// Kind of completion request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    /// Bare trigger; an empty prefix shows the curated first tier only
    #[default]
    Basic,
    /// Explicit "show everything" request; bypasses tier curation
    All,
}

impl QueryKind {
    pub fn tier_only_if_empty(&self) -> bool {
        matches!(self, QueryKind::Basic)
    }
}

/// How a candidate matched the typed prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatchKind {
    /// Empty prefix, or `sort_key` starts with the prefix in exact case
    Exact,
    /// Only a case-insensitive comparison matched
    CaseInsensitive,
}

/// Text edit produced when the user accepts a candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub anchor_offset: AnchorOffset,
    /// Number of bytes after the anchor to replace
    pub replace_len: u32,
    pub text: String,
}
