use std::cmp::Reverse;
use std::collections::HashMap;

use crate::models::Item;
use crate::text::{prefix_chars, squash_ws};

/// Chars of normalized query compared when collapsing near-identical titles.
pub const TITLE_PREFIX_LEN: usize = 35;
/// Max items per subreddit/channel within a category.
pub const VENUE_CAP: usize = 2;

/// Collapse near-duplicate items within one category.
///
/// Pass 1 folds free-text sources (search, tiktok_search, youtube, news)
/// onto a lowercased 35-char title prefix so "trump tariffs 2026" and
/// "trump tariffs today" become one item with their counts summed.
/// Pass 2 re-sorts and keeps at most two items per subreddit or channel
/// for reddit/youtube/news. Both passes walk in descending count order.
pub fn dedup_items(items: Vec<Item>) -> Vec<Item> {
    let mut sorted = items;
    sorted.sort_by_key(|i| Reverse(i.count));

    let mut seen_prefix: HashMap<String, usize> = HashMap::new();
    let mut collapsed: Vec<Item> = Vec::with_capacity(sorted.len());
    for item in sorted {
        if item.source.prefix_collapses() {
            let prefix = prefix_chars(&squash_ws(&item.query.to_lowercase()), TITLE_PREFIX_LEN);
            if let Some(&idx) = seen_prefix.get(&prefix) {
                collapsed[idx].count += item.count;
                continue;
            }
            seen_prefix.insert(prefix, collapsed.len());
        }
        collapsed.push(item);
    }

    collapsed.sort_by_key(|i| Reverse(i.count));
    let mut venue_seen: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<Item> = Vec::with_capacity(collapsed.len());
    for item in collapsed {
        if item.source.venue_capped() {
            if let Some(venue) = item.venue().map(str::to_string) {
                let n = venue_seen.entry(venue).or_insert(0);
                if *n >= VENUE_CAP {
                    continue;
                }
                *n += 1;
            }
        }
        kept.push(item);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;

    fn item(query: &str, count: i64, source: Source) -> Item {
        Item {
            topic: query.to_string(),
            query: query.to_string(),
            count,
            source,
            subreddit: None,
            channel: None,
            url: None,
            trend: "stable".into(),
        }
    }

    fn reddit_item(query: &str, count: i64, subreddit: &str) -> Item {
        Item {
            subreddit: Some(subreddit.to_string()),
            ..item(query, count, Source::Reddit)
        }
    }

    #[test]
    fn prefix_twins_collapse_with_summed_counts() {
        // identical through the first 35 chars, divergent after
        let out = dedup_items(vec![
            item("trump tariffs hurt american farmers 2026", 10, Source::Search),
            item("trump tariffs hurt american farmers today", 4, Source::Search),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].count, 14);
        // the higher-count phrasing survives
        assert_eq!(out[0].query, "trump tariffs hurt american farmers 2026");
    }

    #[test]
    fn prefix_normalizes_case_and_whitespace() {
        let out = dedup_items(vec![
            item("Trump  Tariffs", 5, Source::Search),
            item("trump tariffs", 3, Source::Search),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].count, 8);
    }

    #[test]
    fn reddit_items_never_prefix_collapse() {
        let out = dedup_items(vec![
            reddit_item("trump tariffs", 5, "politics"),
            reddit_item("trump tariffs", 3, "economics"),
        ]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn venue_cap_keeps_two_highest_per_subreddit() {
        let out = dedup_items(vec![
            reddit_item("thread a", 9, "politics"),
            reddit_item("thread b", 7, "politics"),
            reddit_item("thread c", 5, "politics"),
            reddit_item("other sub", 1, "economics"),
        ]);
        let politics: Vec<i64> = out
            .iter()
            .filter(|i| i.subreddit.as_deref() == Some("politics"))
            .map(|i| i.count)
            .collect();
        assert_eq!(politics, vec![9, 7]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn empty_venue_is_exempt_from_cap() {
        let mut items = Vec::new();
        for n in 0..4 {
            let mut it = item(&format!("clip {n}"), 4 - n, Source::Youtube);
            it.channel = Some(String::new());
            items.push(it);
        }
        assert_eq!(dedup_items(items).len(), 4);
    }

    #[test]
    fn dedup_is_idempotent() {
        let input = vec![
            item("trump tariffs 2026", 10, Source::Search),
            item("trump tariffs today", 6, Source::Search),
            reddit_item("thread a", 9, "politics"),
            reddit_item("thread b", 7, "politics"),
            reddit_item("thread c", 5, "politics"),
        ];
        let once = dedup_items(input);
        let again = dedup_items(once.clone());
        assert_eq!(
            serde_json::to_value(&once).unwrap(),
            serde_json::to_value(&again).unwrap()
        );
    }

    #[test]
    fn ordering_is_descending_by_count() {
        let out = dedup_items(vec![
            item("low", 1, Source::Search),
            item("high", 9, Source::Search),
            item("mid", 5, Source::Search),
        ]);
        let counts: Vec<i64> = out.iter().map(|i| i.count).collect();
        assert_eq!(counts, vec![9, 5, 1]);
    }
}
