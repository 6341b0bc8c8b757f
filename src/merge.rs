//! Folds one run's fresh snapshot into the previous one. How counters
//! combine depends on how the window was fetched, made explicit here as a
//! mode instead of inferred from emptiness checks.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::aggregate::{self, item_key, rank_categories};
use crate::categories::CATEGORIES;
use crate::dedup::dedup_items;
use crate::models::{Category, Snapshot, Summary};
use crate::window;

/// Items kept per category after a merge.
pub const MERGED_ITEM_CAP: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// The whole window was re-queried; counters take the max of both sides
    /// so the same events are not counted twice.
    FullRebuild,
    /// Only events past the cursor were fetched; counters add up.
    Incremental,
    /// Nothing came back this run; the previous snapshot passes through
    /// with a refreshed generation timestamp and nothing else changed.
    NoOp,
}

fn combine(full: bool, old: i64, new: i64) -> i64 {
    if full {
        old.max(new)
    } else {
        old + new
    }
}

/// Merge `fresh` into `previous` under `mode`.
///
/// A missing fresh snapshot degrades to pass-through regardless of mode;
/// a missing previous snapshot makes the fresh one authoritative. Items
/// match across runs by (query prefix, source) within their category.
/// unique_users always takes the max: the same user can appear in both
/// windows.
pub fn apply(
    mode: MergeMode,
    previous: Option<Snapshot>,
    fresh: Option<Snapshot>,
    now: DateTime<Utc>,
    window_start: &str,
) -> Snapshot {
    let fresh = match (mode, fresh) {
        (MergeMode::NoOp, _) | (_, None) => {
            let mut snap = previous
                .unwrap_or_else(|| aggregate::fresh_snapshot(now, window_start));
            snap.meta.generated_at = window::fmt_instant(now);
            return snap;
        }
        (_, Some(f)) => f,
    };
    let previous = match previous {
        Some(p) => p,
        None => return fresh,
    };
    let full = mode == MergeMode::FullRebuild;

    let mut merged = previous.categories;
    let mut index: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, c)| (c.label.clone(), i))
        .collect();

    for new_cat in fresh.categories {
        match index.get(&new_cat.label).copied() {
            Some(i) => {
                let cat = &mut merged[i];
                cat.engagement_count =
                    combine(full, cat.engagement_count, new_cat.engagement_count);
                cat.unique_users = cat.unique_users.max(new_cat.unique_users);

                let mut item_idx: HashMap<(String, String), usize> = cat
                    .items
                    .iter()
                    .enumerate()
                    .map(|(j, it)| (item_key(&it.query, &it.source), j))
                    .collect();
                for new_item in new_cat.items {
                    let key = item_key(&new_item.query, &new_item.source);
                    match item_idx.get(&key).copied() {
                        Some(j) => {
                            cat.items[j].count =
                                combine(full, cat.items[j].count, new_item.count);
                        }
                        None => {
                            item_idx.insert(key, cat.items.len());
                            cat.items.push(new_item);
                        }
                    }
                }
            }
            None => {
                index.insert(new_cat.label.clone(), merged.len());
                merged.push(new_cat);
            }
        }
    }

    // Rebuild in canonical order, re-collapse near-duplicates, cap, re-rank.
    let mut slots: Vec<Option<Category>> = merged.into_iter().map(Some).collect();
    let mut categories: Vec<Category> = Vec::with_capacity(CATEGORIES.len());
    for meta in CATEGORIES.iter() {
        if let Some(&i) = index.get(meta.label) {
            if let Some(mut cat) = slots[i].take() {
                cat.items = dedup_items(cat.items);
                cat.items.truncate(MERGED_ITEM_CAP);
                categories.push(cat);
            }
        }
    }
    rank_categories(&mut categories);

    let now_iso = window::fmt_instant(now);
    let mut meta = previous.meta;
    meta.generated_at = now_iso.clone();
    meta.last_fetch_at = Some(now_iso);
    meta.window_start = window_start.to_string();

    let mut events_today = previous.summary.events_today;
    for (src, v) in fresh.summary.events_today {
        let slot = events_today.entry(src).or_insert(0);
        *slot = combine(full, *slot, v);
    }

    let summary = Summary {
        total_engagements: categories.iter().map(|c| c.engagement_count).sum(),
        total_unique_users: categories.iter().map(|c| c.unique_users).sum(),
        top_category: categories
            .first()
            .map(|c| c.label.clone())
            .unwrap_or_else(|| "N/A".to_string()),
        categories_tracked: categories
            .iter()
            .filter(|c| c.engagement_count > 0)
            .count(),
        data_window: aggregate::DATA_WINDOW_LABEL.to_string(),
        events_today,
    };

    Snapshot {
        meta,
        summary,
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeedEvent, Source};
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 25, 12, 0, 0).unwrap()
    }

    fn t1() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 25, 13, 0, 0).unwrap()
    }

    const WS: &str = "2026-02-24T12:00:00Z";

    fn ev(query: &str, source: Source, count: i64) -> FeedEvent {
        FeedEvent {
            time: "2026-02-25T11:00:00Z".into(),
            query: query.into(),
            source,
            subreddit: None,
            channel: None,
            url: None,
            category: "economy".into(),
            count,
            trend: "stable".into(),
            age: None,
            gender: None,
            state: None,
        }
    }

    fn snap(events: &[FeedEvent], at: DateTime<Utc>) -> Snapshot {
        aggregate::snapshot_from_events(events, at, WS)
    }

    fn econ(s: &Snapshot) -> &Category {
        s.categories.iter().find(|c| c.label == "Economic Policy").unwrap()
    }

    #[test]
    fn noop_touches_only_the_generation_timestamp() {
        let prev = snap(&[ev("trump tariffs", Source::Search, 10)], t0());
        let fresh = snap(&[ev("border bill", Source::Search, 99)], t1());
        let out = apply(MergeMode::NoOp, Some(prev.clone()), Some(fresh), t1(), WS);

        let mut a = serde_json::to_value(&prev).unwrap();
        let mut b = serde_json::to_value(&out).unwrap();
        assert_eq!(b["meta"]["generated_at"], serde_json::json!("2026-02-25T13:00:00Z"));
        a["meta"]["generated_at"] = serde_json::Value::Null;
        b["meta"]["generated_at"] = serde_json::Value::Null;
        assert_eq!(a, b);
    }

    #[test]
    fn missing_fresh_degrades_to_pass_through() {
        let prev = snap(&[ev("trump tariffs", Source::Search, 10)], t0());
        let out = apply(MergeMode::Incremental, Some(prev.clone()), None, t1(), WS);
        assert_eq!(econ(&out).engagement_count, 10);
        assert_eq!(
            econ(&out).items.len(),
            econ(&prev).items.len()
        );
    }

    #[test]
    fn incremental_sums_and_full_rebuild_takes_max() {
        let prev = snap(&[ev("trump tariffs", Source::Search, 10)], t0());
        let fresh = snap(&[ev("trump tariffs", Source::Search, 4)], t1());

        let inc = apply(MergeMode::Incremental, Some(prev.clone()), Some(fresh.clone()), t1(), WS);
        assert_eq!(econ(&inc).items[0].count, 14);
        assert_eq!(econ(&inc).engagement_count, 14);
        assert_eq!(inc.summary.events_today.get("search"), Some(&14));

        let full = apply(MergeMode::FullRebuild, Some(prev), Some(fresh), t1(), WS);
        assert_eq!(econ(&full).items[0].count, 10);
        assert_eq!(econ(&full).engagement_count, 10);
        assert_eq!(full.summary.events_today.get("search"), Some(&10));
    }

    #[test]
    fn unique_users_never_sum() {
        let prev = snap(
            &[
                ev("trump tariffs", Source::Search, 10),
                ev("debt ceiling vote", Source::Search, 2),
            ],
            t0(),
        );
        let fresh = snap(&[ev("tariff rates", Source::Search, 1)], t1());
        let out = apply(MergeMode::Incremental, Some(prev), Some(fresh), t1(), WS);
        // 2 items before, 1 in the new batch: max, not 3
        assert_eq!(econ(&out).unique_users, 2);
    }

    #[test]
    fn same_query_different_source_stays_distinct() {
        let prev = snap(&[ev("tariffs", Source::Search, 10)], t0());
        let mut reddit = ev("tariffs", Source::Reddit, 5);
        reddit.subreddit = Some("economics".into());
        let fresh = snap(&[reddit], t1());
        let out = apply(MergeMode::Incremental, Some(prev), Some(fresh), t1(), WS);
        assert_eq!(econ(&out).items.len(), 2);
        assert_eq!(econ(&out).engagement_count, 15);
    }

    #[test]
    fn appended_items_re_collapse_by_title_prefix() {
        let prev = snap(&[ev("trump tariffs hurt american farmers 2026", Source::Search, 10)], t0());
        let fresh = snap(&[ev("trump tariffs hurt american farmers today", Source::Search, 5)], t1());
        let out = apply(MergeMode::Incremental, Some(prev), Some(fresh), t1(), WS);
        assert_eq!(econ(&out).items.len(), 1);
        assert_eq!(econ(&out).items[0].count, 15);
    }

    #[test]
    fn merged_item_lists_are_capped() {
        let many: Vec<FeedEvent> = (0..40)
            .map(|i| {
                let mut e = ev(&format!("distinct topic number {i}"), Source::Reddit, 40 - i);
                e.subreddit = Some(format!("sub{i}"));
                e
            })
            .collect();
        let prev = snap(&many, t0());
        let fresh = snap(&[], t1());
        let out = apply(MergeMode::Incremental, Some(prev), Some(fresh), t1(), WS);
        assert_eq!(econ(&out).items.len(), MERGED_ITEM_CAP);
    }

    #[test]
    fn first_run_takes_the_fresh_snapshot_whole() {
        let fresh = snap(&[ev("trump tariffs", Source::Search, 3)], t1());
        let out = apply(MergeMode::FullRebuild, None, Some(fresh.clone()), t1(), WS);
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            serde_json::to_value(&fresh).unwrap()
        );
    }

    #[test]
    fn nothing_at_all_yields_a_skeleton() {
        let out = apply(MergeMode::NoOp, None, None, t1(), WS);
        assert_eq!(out.categories.len(), 11);
        assert_eq!(out.summary.total_engagements, 0);
        assert_eq!(out.meta.generated_at, "2026-02-25T13:00:00Z");
    }
}
