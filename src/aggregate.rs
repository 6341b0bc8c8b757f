//! Builds one run's Snapshot from the window's event list, so the dial,
//! summary stats, and category cards all reflect the same picture as the
//! live feed.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::categories::{self, CATEGORIES};
use crate::dedup::dedup_items;
use crate::models::{Category, FeedEvent, Item, Snapshot, SnapshotMeta, Source, Summary};
use crate::text::prefix_chars;
use crate::window;

pub const DEMOGRAPHIC_LABEL: &str = "Ages 18-29";
pub const DATA_SOURCE_LABEL: &str = "Pulse events API (search, YouTube, Reddit, TikTok, news)";
pub const WINDOW_ID: &str = "rolling_24h";
pub const WINDOW_LABEL: &str = "Last 24h · Updated live";
pub const DATA_WINDOW_LABEL: &str = "Sliding 24-hour window · accumulates each run";
pub const REFRESH_INTERVAL_MINUTES: u32 = 60;

/// Chars of lowercased query that identify an item within a category.
const ITEM_KEY_LEN: usize = 80;

/// Aggregation identity for an item or event: query prefix + source.
pub fn item_key(query: &str, source: &Source) -> (String, String) {
    (
        prefix_chars(&query.trim().to_lowercase(), ITEM_KEY_LEN),
        source.as_str().to_string(),
    )
}

fn count_or_one(count: i64) -> i64 {
    if count == 0 {
        1
    } else {
        count
    }
}

/// Place every event into its canonical category, aggregate by
/// (query, source) keeping the highest count seen, then dedup and rank.
pub fn snapshot_from_events(events: &[FeedEvent], now: DateTime<Utc>, window_start: &str) -> Snapshot {
    let mut by_label: HashMap<&'static str, (HashMap<(String, String), usize>, Vec<Item>)> =
        HashMap::new();

    for ev in events {
        let label = categories::normalize_category(&ev.category);
        let query = ev.query.trim().to_string();
        let key = item_key(&query, &ev.source);
        let count = count_or_one(ev.count);

        let (index, items) = by_label.entry(label).or_default();
        if let Some(&idx) = index.get(&key) {
            if count > items[idx].count {
                items[idx].count = count;
            }
        } else {
            index.insert(key, items.len());
            items.push(Item {
                topic: query.clone(),
                query,
                count,
                source: ev.source.clone(),
                subreddit: ev.subreddit.clone(),
                channel: ev.channel.clone(),
                url: ev.url.clone(),
                trend: ev.trend.clone(),
            });
        }
    }

    let mut categories_out: Vec<Category> = Vec::with_capacity(CATEGORIES.len());
    let mut total_eng = 0i64;
    for meta in CATEGORIES.iter() {
        let raw = by_label.remove(meta.label).map(|(_, v)| v).unwrap_or_default();
        let items = dedup_items(raw);
        let eng: i64 = items.iter().map(|i| i.count).sum();
        total_eng += eng;
        categories_out.push(Category {
            id: meta.id.to_string(),
            label: meta.label.to_string(),
            icon: meta.icon.to_string(),
            engagement_count: eng,
            unique_users: items.len() as i64,
            trending_score: 0,
            items,
        });
    }

    rank_categories(&mut categories_out);

    let top_category = categories_out
        .first()
        .map(|c| c.label.clone())
        .unwrap_or_else(|| "N/A".to_string());

    let mut events_today: BTreeMap<String, i64> = BTreeMap::new();
    for ev in events {
        *events_today.entry(ev.source.as_str().to_string()).or_insert(0) +=
            count_or_one(ev.count);
    }

    let generated_at = window::fmt_instant(now);
    Snapshot {
        meta: SnapshotMeta {
            generated_at: generated_at.clone(),
            last_fetch_at: Some(generated_at),
            demographic: DEMOGRAPHIC_LABEL.to_string(),
            data_source: DATA_SOURCE_LABEL.to_string(),
            window: WINDOW_ID.to_string(),
            window_label: WINDOW_LABEL.to_string(),
            window_start: window_start.to_string(),
            refresh_interval_minutes: REFRESH_INTERVAL_MINUTES,
        },
        summary: Summary {
            total_engagements: total_eng,
            total_unique_users: categories_out.iter().map(|c| c.unique_users).sum(),
            top_category,
            categories_tracked: categories_out
                .iter()
                .filter(|c| c.engagement_count > 0)
                .count(),
            data_window: DATA_WINDOW_LABEL.to_string(),
            events_today,
        },
        categories: categories_out,
    }
}

/// Sort busiest-first and recompute trending relative to the max category.
pub fn rank_categories(categories: &mut [Category]) {
    categories.sort_by_key(|c| Reverse(c.engagement_count));
    let max_eng = categories
        .iter()
        .map(|c| c.engagement_count)
        .max()
        .unwrap_or(0)
        .max(1);
    for c in categories.iter_mut() {
        c.trending_score = ((c.engagement_count as f64 / max_eng as f64) * 100.0).round() as i64;
    }
}

/// Zeroed 11-category skeleton for a first run with no stored snapshot.
pub fn fresh_snapshot(now: DateTime<Utc>, window_start: &str) -> Snapshot {
    let mut snap = snapshot_from_events(&[], now, window_start);
    snap.meta.last_fetch_at = None;
    snap
}
