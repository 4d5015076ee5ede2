use std::collections::BTreeSet;

use resume_model::{ResumeId, ResumePayload};
use resume_store::ScoredResume;
use serde::Serialize;

/// Additive boost per matched keyword.
pub const KEYWORD_BOOST: f32 = 5.0;
/// Additive boost per experience year.
pub const EXPERIENCE_BOOST: f32 = 1.5;
/// Upper clamp for the final score.
pub const MAX_SCORE: f32 = 100.0;

/// One ranked search hit with its matched-keyword evidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: ResumeId,
    /// Final score in [0, 100], rounded to two decimals.
    pub score: f32,
    pub data: ResumePayload,
    pub matched_keywords: Vec<String>,
}

/// Keywords from the expanded vocabulary that occur as substrings of the
/// lowercased resume text.
pub fn matched_keywords(resume_text: &str, vocabulary: &BTreeSet<String>) -> Vec<String> {
    let lowered = resume_text.to_lowercase();
    vocabulary
        .iter()
        .filter(|k| lowered.contains(k.as_str()))
        .cloned()
        .collect()
}

/// Combine similarity, keyword overlap and experience into one score:
/// `min(100, similarity * 100 + 5 * matches + 1.5 * years)`.
///
/// All terms are non-negative, so the result is always in [0, 100].
pub fn final_score(similarity: f32, matched: usize, experience_years: u32) -> f32 {
    let base = similarity.max(0.0) * 100.0;
    let boosted = base + matched as f32 * KEYWORD_BOOST + experience_years as f32 * EXPERIENCE_BOOST;
    boosted.min(MAX_SCORE)
}

/// Rank similarity hits by final score, descending. Equal scores order by
/// ascending resume id so the output is deterministic regardless of index
/// arrival order.
pub fn rank(hits: Vec<ScoredResume>, vocabulary: &BTreeSet<String>) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = hits
        .into_iter()
        .map(|hit| {
            let matched = matched_keywords(&hit.payload.resume_text, vocabulary);
            let score = final_score(hit.score, matched.len(), hit.payload.experience_years);
            SearchResult {
                id: hit.id,
                score: (score * 100.0).round() / 100.0,
                data: hit.payload,
                matched_keywords: matched,
            }
        })
        .collect();
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocabulary(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn hit(id: &str, score: f32, years: u32, text: &str) -> ScoredResume {
        ScoredResume {
            id: ResumeId(id.into()),
            score,
            payload: ResumePayload {
                s3_url: "file:///tmp/r.pdf".into(),
                candidate_name: "A B".into(),
                email: "a@b.com".into(),
                experience_years: years,
                department: "General".into(),
                resume_text: text.into(),
            },
        }
    }

    #[test]
    fn final_score_is_clamped_to_the_band() {
        assert_eq!(final_score(1.0, 40, 60), 100.0);
        assert_eq!(final_score(0.0, 0, 0), 0.0);
        let mid = final_score(0.5, 2, 4);
        assert!((mid - 66.0).abs() < 1e-4, "50 + 10 + 6 = 66, got {mid}");
        for &(sim, matched, years) in
            &[(0.0f32, 0usize, 0u32), (1.0, 0, 0), (0.3, 7, 2), (0.99, 50, 80)]
        {
            let s = final_score(sim, matched, years);
            assert!((0.0..=100.0).contains(&s), "score {s} out of band");
        }
    }

    #[test]
    fn keyword_matching_is_substring_over_lowercased_text() {
        let vocab = vocabulary(&["python", "go", "django"]);
        let matched = matched_keywords("Senior PYTHON engineer, Django projects", &vocab);
        assert_eq!(matched, vec!["django", "python"]);
    }

    #[test]
    fn keyword_and_experience_boosts_reorder_hits() {
        let vocab = vocabulary(&["python", "django"]);
        let hits = vec![
            hit("plain", 0.60, 0, "java developer"),
            hit("boosted", 0.55, 4, "python and django developer"),
        ];
        let ranked = rank(hits, &vocab);
        // 55 + 10 + 6 = 71 beats 60 + 0 + 0.
        assert_eq!(ranked[0].id.0, "boosted");
        assert_eq!(ranked[0].matched_keywords, vec!["django", "python"]);
        assert!(ranked[1].matched_keywords.is_empty());
    }

    #[test]
    fn equal_scores_tie_break_on_ascending_id() {
        let vocab = BTreeSet::new();
        let hits = vec![
            hit("zeta", 0.4, 0, "text"),
            hit("alpha", 0.4, 0, "text"),
        ];
        let ranked = rank(hits, &vocab);
        assert_eq!(ranked[0].id.0, "alpha");
        assert_eq!(ranked[1].id.0, "zeta");
        assert_eq!(ranked[0].score, ranked[1].score);
    }

    #[test]
    fn scores_round_to_two_decimals() {
        let vocab = BTreeSet::new();
        let ranked = rank(vec![hit("r", 0.333333, 0, "")], &vocab);
        assert_eq!(ranked[0].score, 33.33);
    }
}
