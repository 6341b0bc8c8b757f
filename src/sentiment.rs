//! Framing-aware sentiment scoring. The 0-100 scale reads favorability
//! toward the Republican side: 50 is neutral, above is favorable framing,
//! below is critical.

use crate::lexicon::{
    self, DEMOCRAT_MARKERS, PHRASES_LONGEST_FIRST, REPUBLICAN_MARKERS, SUBREDDIT_PRIORS,
    WORD_WEIGHTS,
};
use crate::models::Item;
use crate::text::scrub;

/// Accumulate phrase weights, blanking each match with a space so the
/// word pass cannot double-count a phrase's constituent words.
fn phrase_pass(scrubbed: &str) -> (i32, String) {
    let mut score = 0;
    let mut text = scrubbed.to_string();
    for &(phrase, weight) in PHRASES_LONGEST_FIRST.iter() {
        if text.contains(phrase) {
            score += weight;
            text = text.replace(phrase, " ");
        }
    }
    (score, text)
}

/// Lexicon score for a topic/query pair, mapped onto 0-100 and clamped.
/// Empty text lands exactly on the neutral 50.
pub fn score_text(topic: &str, query: &str) -> f64 {
    let scrubbed = scrub(&format!("{topic} {query}"));
    let (phrase_raw, remaining) = phrase_pass(&scrubbed);
    let word_raw: i32 = remaining
        .split_whitespace()
        .map(|w| WORD_WEIGHTS.get(w).copied().unwrap_or(0))
        .sum();
    (f64::from(phrase_raw + word_raw) * 5.0 + 50.0).clamp(0.0, 100.0)
}

/// Full item score: lexicon score, then framing inversion for
/// Democrat-only content, then the subreddit ideological prior.
///
/// Partisan markers match by plain substring on the raw lowercased text
/// ("ocasio-cortez" keeps its hyphen there). The prior is added in 0-100
/// space (raw units x5) and the result re-clamped.
pub fn score_item(item: &Item) -> f64 {
    let text = format!("{} {}", item.topic, item.query).to_lowercase();
    let mut score = score_text(&item.topic, &item.query);

    let is_repub = REPUBLICAN_MARKERS.iter().any(|kw| text.contains(kw));
    let is_dem = DEMOCRAT_MARKERS.iter().any(|kw| text.contains(kw));
    if is_dem && !is_repub {
        score = 100.0 - score;
    }

    if let Some(raw_sub) = item.subreddit.as_deref() {
        let lowered = raw_sub.to_lowercase();
        let key = lowered.trim_start_matches("r/");
        if !key.is_empty() {
            if let Some(prior) = SUBREDDIT_PRIORS.get(key) {
                score = (score + f64::from(prior * 5)).clamp(0.0, 100.0);
            }
        }
    }

    score
}

/// Aggregate score across items, each weighted by count x source weight.
/// Empty input reads as neutral.
pub fn weighted_score(items: &[Item]) -> i64 {
    let mut total_weight = 0.0;
    let mut total_score = 0.0;
    for item in items {
        let w = item.count as f64 * lexicon::source_weight(&item.source);
        total_weight += w;
        total_score += score_item(item) * w;
    }
    if total_weight > 0.0 {
        (total_score / total_weight).round() as i64
    } else {
        50
    }
}

/// Count-weighted aggregate for cohort slices, None when there is nothing
/// to score. Source weights do not apply here: a cohort slice is all one
/// source.
pub fn count_weighted_score(items: &[Item]) -> Option<i64> {
    let mut total_weight = 0.0;
    let mut total_score = 0.0;
    for item in items {
        let w = item.count as f64;
        total_weight += w;
        total_score += score_item(item) * w;
    }
    if total_weight > 0.0 {
        Some((total_score / total_weight).round() as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;

    fn search_item(query: &str, count: i64) -> Item {
        Item {
            topic: String::new(),
            query: query.to_string(),
            count,
            source: Source::Search,
            subreddit: None,
            channel: None,
            url: None,
            trend: "stable".into(),
        }
    }

    fn reddit_item(query: &str, subreddit: &str) -> Item {
        Item {
            subreddit: Some(subreddit.to_string()),
            source: Source::Reddit,
            ..search_item(query, 1)
        }
    }

    #[test]
    fn scores_stay_in_bounds() {
        let texts = [
            "massacre genocide atrocity terrorism bombing war deaths",
            "peace victory freedom justice historic breakthrough win",
            "trump tariffs",
            "totally apolitical gardening tips",
            "",
        ];
        for t in texts {
            let s = score_text("", t);
            assert!((0.0..=100.0).contains(&s), "{t:?} scored {s}");
        }
    }

    #[test]
    fn empty_text_is_exactly_neutral() {
        assert_eq!(score_text("", ""), 50.0);
        assert_eq!(weighted_score(&[]), 50);
    }

    #[test]
    fn phrase_weight_replaces_constituent_words() {
        // "peace"(+5) + "deal"(+2) would give 85; the phrase weight (+4) gives 70
        assert_eq!(score_text("", "peace deal"), 70.0);
        // phrase weight applies once, words outside the phrase still count
        assert_eq!(score_text("", "historic peace deal"), 85.0);
    }

    #[test]
    fn government_shutdown_scores_as_one_phrase() {
        assert_eq!(score_text("", "government shutdown"), 35.0);
    }

    #[test]
    fn framing_inversion_is_symmetric() {
        let item = search_item("democrats pass funding bill", 1);
        let base = score_text("", &item.query);
        assert!(base > 50.0);
        assert_eq!(score_item(&item), 100.0 - base);
    }

    #[test]
    fn republican_mention_blocks_inversion() {
        let item = search_item("democrats attack trump tariffs", 1);
        let base = score_text("", &item.query);
        assert_eq!(score_item(&item), base);
    }

    #[test]
    fn subreddit_prior_shifts_and_clamps() {
        let neutral = score_item(&reddit_item("budget vote scheduled", "uspolitics"));
        let left = score_item(&reddit_item("budget vote scheduled", "politics"));
        let right = score_item(&reddit_item("budget vote scheduled", "conservative"));
        assert_eq!(left, (neutral - 40.0).max(0.0));
        assert_eq!(right, (neutral + 40.0).min(100.0));

        // "r/" prefix and case are normalized away
        let prefixed = score_item(&reddit_item("budget vote scheduled", "r/Politics"));
        assert_eq!(prefixed, left);
    }

    #[test]
    fn positive_republican_item_scores_high() {
        let item = search_item("Trump signs historic deal", 10);
        // signs(+2) + historic(+3) + deal(+2) = +7 -> 85, no inversion
        assert_eq!(score_item(&item), 85.0);
        assert_eq!(weighted_score(&[item]), 85);
    }

    #[test]
    fn democrat_negative_item_inverts_positive() {
        let item = search_item("Democrats demand defund ICE", 5);
        // defund(-2) -> 40 base, Democrat-only so inverted to 60
        assert_eq!(score_item(&item), 60.0);
        assert!(weighted_score(&[item]) > 50);
    }

    #[test]
    fn weighted_score_leans_toward_heavier_sources() {
        let mut watch = search_item("peace deal", 1); // 70
        watch.source = Source::TiktokWatch; // weight 3.0
        let search = search_item("government shutdown", 1); // 35, weight 1.0
        // (70*3 + 35*1) / 4 = 61.25 -> 61
        assert_eq!(weighted_score(&[watch, search]), 61);
    }

    #[test]
    fn count_weighted_score_ignores_source_weights() {
        let mut watch = search_item("peace deal", 1);
        watch.source = Source::TiktokWatch;
        let search = search_item("government shutdown", 1);
        // (70 + 35) / 2 = 52.5 -> rounds half away from zero
        assert_eq!(count_weighted_score(&[watch, search]), Some(53));
        assert_eq!(count_weighted_score(&[]), None);
    }
}
