use std::cmp::Ordering;

/// Candidate ordering
///
/// Ranking happens once per session, when the produced table is cached.
/// Filtering afterwards only removes candidates, so the ranked order is the
/// presentation order for the rest of the session.
use crate::types::{Candidate, MatchKind};

/// Orders a freshly produced candidate table
pub trait CandidateRanker: Send + Sync {
    fn rank(&self, candidates: Vec<Candidate>) -> Vec<Candidate>;
}

/// Higher `priority` first, then `sort_key` ascending; ties keep their
/// production order
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityRanker;

impl CandidateRanker for PriorityRanker {
    fn rank(&self, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        candidates.sort_by(compare);
        candidates
    }
}

/// Leaves the produced order untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceOrderRanker;

impl CandidateRanker for SourceOrderRanker {
    fn rank(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        candidates
    }
}

fn compare(a: &Candidate, b: &Candidate) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.sort_key.cmp(&b.sort_key))
}

/// Float exact-case matches above case-insensitive ones
///
/// Stable, so each group keeps the filter's order.
pub fn rank_by_match_kind(mut visible: Vec<(Candidate, MatchKind)>) -> Vec<(Candidate, MatchKind)> {
    visible.sort_by_key(|(_, kind)| *kind);
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tier;

    #[test]
    fn test_priority_then_sort_key() {
        let ranked = PriorityRanker.rank(vec![
            Candidate::new("while", Tier::First),
            Candidate::new("auto", Tier::First),
            Candidate::new("return", Tier::First).with_priority(10),
        ]);
        let texts: Vec<_> = ranked.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["return", "auto", "while"]);
    }

    #[test]
    fn test_equal_keys_keep_production_order() {
        let ranked = PriorityRanker.rank(vec![
            Candidate::new("b", Tier::First).with_sort_key("k"),
            Candidate::new("a", Tier::First).with_sort_key("k"),
        ]);
        assert_eq!(ranked[0].text, "b");
        assert_eq!(ranked[1].text, "a");
    }

    #[test]
    fn test_source_order_is_identity() {
        let input = vec![Candidate::new("z", Tier::All), Candidate::new("a", Tier::All)];
        assert_eq!(SourceOrderRanker.rank(input.clone()), input);
    }

    #[test]
    fn test_rank_by_match_kind_is_stable() {
        let visible = vec![
            (Candidate::new("Register", Tier::All), MatchKind::CaseInsensitive),
            (Candidate::new("return", Tier::First), MatchKind::Exact),
            (Candidate::new("Return", Tier::First), MatchKind::CaseInsensitive),
            (Candidate::new("rethrow", Tier::All), MatchKind::Exact),
        ];
        let ranked: Vec<_> = rank_by_match_kind(visible)
            .into_iter()
            .map(|(c, _)| c.text)
            .collect();
        assert_eq!(ranked, vec!["return", "rethrow", "Register", "Return"]);
    }
}
