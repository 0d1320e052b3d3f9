//! Prefix filtering of a cached candidate set
//!
//! Filtering is pure and order-preserving: the output is always a subsequence
//! of the input. The same [`match_kind`] backs the cached refine path and the
//! initial visible set computed at trigger time.

use crate::buffer::BufferSnapshot;
use crate::token::is_identifier_part;
use crate::types::{AnchorOffset, Candidate, MatchKind};

/// Prefix filter over candidates
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixFilter;

impl PrefixFilter {
    /// Filter candidates by prefix
    ///
    /// # Arguments
    ///
    /// * `candidates` - Candidate set in presentation order
    /// * `prefix` - Text typed since the anchor; `None` and `Some("")` both
    ///   mean nothing was typed
    /// * `case_sensitive` - Disables the case-insensitive fallback
    /// * `tier_only_if_empty` - With no typed text, keep only first-tier
    ///   candidates
    ///
    /// # Returns
    ///
    /// The matching candidates, in input order
    pub fn filter(
        candidates: &[Candidate],
        prefix: Option<&str>,
        case_sensitive: bool,
        tier_only_if_empty: bool,
    ) -> Vec<Candidate> {
        Self::filter_with_match_kind(candidates, prefix, case_sensitive, tier_only_if_empty)
            .into_iter()
            .map(|(candidate, _)| candidate)
            .collect()
    }

    /// Like [`PrefixFilter::filter`], also reporting how each candidate matched
    pub fn filter_with_match_kind(
        candidates: &[Candidate],
        prefix: Option<&str>,
        case_sensitive: bool,
        tier_only_if_empty: bool,
    ) -> Vec<(Candidate, MatchKind)> {
        let prefix = prefix.unwrap_or("");
        candidates
            .iter()
            .filter_map(|candidate| {
                if prefix.is_empty() && tier_only_if_empty && !candidate.is_first_tier() {
                    return None;
                }
                match_kind(&candidate.sort_key, prefix, case_sensitive)
                    .map(|kind| (candidate.clone(), kind))
            })
            .collect()
    }
}

/// How `key` matches `prefix`, if at all
///
/// The exact-case comparison runs first; the case-insensitive comparison is
/// only a fallback and only when `case_sensitive` is false.
pub fn match_kind(key: &str, prefix: &str, case_sensitive: bool) -> Option<MatchKind> {
    if key.starts_with(prefix) {
        return Some(MatchKind::Exact);
    }
    if !case_sensitive && starts_with_ignore_case(key, prefix) {
        return Some(MatchKind::CaseInsensitive);
    }
    None
}

fn starts_with_ignore_case(key: &str, prefix: &str) -> bool {
    let mut key_chars = key.chars().flat_map(char::to_lowercase);
    prefix
        .chars()
        .flat_map(char::to_lowercase)
        .all(|p| key_chars.next() == Some(p))
}

/// Prefix derived from the live buffer on each keystroke
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRequest {
    pub caret_offset: u32,
    /// `None` terminates the session
    pub prefix: Option<String>,
}

impl FilterRequest {
    /// Derive the typed prefix between `anchor` and `caret`
    ///
    /// The prefix is `None` when the caret moved before the anchor, when the
    /// range cannot be read, or when the text is not an identifier
    /// continuation.
    pub fn derive(buffer: &dyn BufferSnapshot, anchor: AnchorOffset, caret: u32) -> Self {
        let prefix = caret
            .checked_sub(anchor)
            .and_then(|len| buffer.read(anchor, len))
            .filter(|text| text.chars().all(is_identifier_part));
        Self {
            caret_offset: caret,
            prefix,
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextSnapshot;
    use crate::types::Tier;

    fn table() -> Vec<Candidate> {
        vec![
            Candidate::new("return", Tier::First),
            Candidate::new("register", Tier::All),
            Candidate::new("static_cast", Tier::All),
            Candidate::new("Return", Tier::First),
        ]
    }

    fn texts(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_empty_prefix_first_tier_only() {
        let visible = PrefixFilter::filter(&table(), None, false, true);
        assert_eq!(texts(&visible), vec!["return", "Return"]);
        let visible = PrefixFilter::filter(&table(), Some(""), false, true);
        assert_eq!(texts(&visible), vec!["return", "Return"]);
    }

    #[test]
    fn test_empty_prefix_without_tiering_keeps_all() {
        assert_eq!(PrefixFilter::filter(&table(), None, false, false), table());
    }

    #[test]
    fn test_non_empty_prefix_ignores_tier() {
        let visible = PrefixFilter::filter(&table(), Some("re"), true, true);
        assert_eq!(texts(&visible), vec!["return", "register"]);
    }

    #[test]
    fn test_case_insensitive_fallback() {
        let visible = PrefixFilter::filter(&table(), Some("Re"), false, true);
        assert_eq!(texts(&visible), vec!["return", "register", "Return"]);
        let visible = PrefixFilter::filter(&table(), Some("Re"), true, true);
        assert_eq!(texts(&visible), vec!["Return"]);
    }

    #[test]
    fn test_match_kind_prefers_exact() {
        assert_eq!(match_kind("return", "ret", false), Some(MatchKind::Exact));
        assert_eq!(match_kind("return", "RET", false), Some(MatchKind::CaseInsensitive));
        assert_eq!(match_kind("return", "RET", true), None);
        assert_eq!(match_kind("return", "", true), Some(MatchKind::Exact));
        assert_eq!(match_kind("re", "return", false), None);
    }

    #[test]
    fn test_filter_with_match_kind() {
        let visible = PrefixFilter::filter_with_match_kind(&table(), Some("Ret"), false, true);
        assert_eq!(visible[0].1, MatchKind::CaseInsensitive);
        assert_eq!(visible[1].0.text, "Return");
        assert_eq!(visible[1].1, MatchKind::Exact);
    }

    #[test]
    fn test_derive_prefix() {
        let buffer = TextSnapshot::cpp("int x; re");
        let request = FilterRequest::derive(&buffer, 7, 9);
        assert_eq!(request.prefix(), Some("re"));
        assert_eq!(FilterRequest::derive(&buffer, 7, 7).prefix(), Some(""));
    }

    #[test]
    fn test_derive_caret_before_anchor() {
        let buffer = TextSnapshot::cpp("int x; re");
        assert_eq!(FilterRequest::derive(&buffer, 7, 6).prefix(), None);
    }

    #[test]
    fn test_derive_non_identifier_text() {
        let buffer = TextSnapshot::cpp("int x; re(");
        assert_eq!(FilterRequest::derive(&buffer, 7, 10).prefix(), None);
        let buffer = TextSnapshot::cpp("int x; r e");
        assert_eq!(FilterRequest::derive(&buffer, 7, 10).prefix(), None);
    }

    #[test]
    fn test_derive_out_of_range() {
        let buffer = TextSnapshot::cpp("re");
        assert_eq!(FilterRequest::derive(&buffer, 0, 5).prefix(), None);
    }
}
