//! Live activity feed: a rolling 24-hour ticker of individual events with
//! demographic color, reset at Eastern-Time midnight. Also maintains the
//! permanent per-run sources cache that history backfills read from.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use xxhash_rust::xxh3::xxh3_64;

use crate::models::{CacheItem, CacheRun, FeedEvent, LiveFeed, Snapshot, SourcesCache};
use crate::text::prefix_chars;
use crate::window;

/// Most events the feed file holds.
pub const FEED_CAP: usize = 2000;
/// Query-prefix length in the feed dedup key.
pub const FEED_KEY_LEN: usize = 60;
/// Events kept per synthetic viewer fingerprint.
pub const PER_USER_CAP: usize = 3;
/// Events seeded from a snapshot when running offline.
pub const SEED_CAP: usize = 50;
/// Query-prefix length in the cache aggregation key.
pub const CACHE_KEY_LEN: usize = 100;
/// How long cache runs are kept.
pub const CACHE_RETENTION_DAYS: i64 = 30;

const US_STATES: [&str; 50] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA",
    "KS", "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ",
    "NM", "NY", "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT",
    "VA", "WA", "WV", "WI", "WY",
];

/// True once the feed's last write landed on an earlier ET civil day, or
/// its timestamp cannot be read at all. The caller starts from an empty
/// feed in that case.
pub fn rolled_over(feed: &LiveFeed, now: DateTime<Utc>) -> bool {
    match window::parse_instant(&feed.generated_at) {
        Some(t) => window::et_civil_date(t) != window::et_civil_date(now),
        None => true,
    }
}

fn feed_key(e: &FeedEvent) -> (String, String) {
    (e.time.clone(), prefix_chars(&e.query, FEED_KEY_LEN))
}

/// Fold `new_events` into `existing`, newest first. Events older than 24
/// hours fall off and the total is capped. The (time, query prefix) pair
/// identifies an event across runs.
pub fn merge_feed(existing: LiveFeed, new_events: Vec<FeedEvent>, now: DateTime<Utc>) -> LiveFeed {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut events: Vec<FeedEvent> = Vec::with_capacity(new_events.len() + existing.events.len());
    for e in new_events.into_iter().chain(existing.events) {
        if seen.insert(feed_key(&e)) {
            events.push(e);
        }
    }

    events.sort_by(|a, b| b.time.cmp(&a.time));
    let cutoff = window::window_start(now);
    events.retain(|e| e.time >= cutoff);
    events.truncate(FEED_CAP);

    LiveFeed {
        generated_at: window::fmt_instant(now),
        day_start: cutoff,
        events,
    }
}

/// Drop repeats of the same query at the same instant within one fetch.
/// Unlike the feed merge key, the query is case-folded here: slices from
/// different endpoints disagree on casing for the same underlying query.
pub fn dedup_events(events: Vec<FeedEvent>) -> Vec<FeedEvent> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    events
        .into_iter()
        .filter(|e| {
            let key = (
                e.time.clone(),
                prefix_chars(e.query.trim().to_lowercase().as_str(), FEED_KEY_LEN),
            );
            seen.insert(key)
        })
        .collect()
}

fn fingerprint(e: &FeedEvent) -> String {
    format!(
        "{}|{}|{}",
        e.age.map(|a| a.to_string()).unwrap_or_default(),
        e.gender.as_deref().unwrap_or(""),
        e.state.as_deref().unwrap_or("")
    )
}

/// No synthetic viewer dominates the ticker: at most `PER_USER_CAP` events
/// survive per (age, gender, state) fingerprint, keeping earlier ones.
pub fn cap_events_per_user(events: Vec<FeedEvent>) -> Vec<FeedEvent> {
    let mut per_user: HashMap<String, usize> = HashMap::new();
    events
        .into_iter()
        .filter(|e| {
            let n = per_user.entry(fingerprint(e)).or_insert(0);
            *n += 1;
            *n <= PER_USER_CAP
        })
        .collect()
}

/// Fill missing demographic fields deterministically from the event's own
/// query and timestamp, weighted roughly 48/48/4 across genders, ages
/// 18-29, all fifty states. The same event always imputes the same way.
pub fn impute_demographics(e: &mut FeedEvent) {
    let h = xxh3_64(format!("{}{}", e.query, e.time).as_bytes());
    if e.gender.is_none() {
        let roll = h % 100;
        e.gender = Some(
            if roll < 48 {
                "Male"
            } else if roll < 96 {
                "Female"
            } else {
                "Non-binary"
            }
            .to_string(),
        );
    }
    if e.age.is_none() {
        e.age = Some(18 + ((h >> 8) % 12) as u8);
    }
    if e.state.is_none() {
        e.state = Some(US_STATES[((h >> 16) % 50) as usize].to_string());
    }
}

/// Offline stand-in for the live-events slice: scatter up to `SEED_CAP` of
/// the snapshot's items across today's ET day as synthetic events. The
/// scatter is a keyed shuffle, so reruns over the same snapshot agree.
pub fn seed_events_from_snapshot(snapshot: &Snapshot, now: DateTime<Utc>) -> Vec<FeedEvent> {
    let mut picks: Vec<FeedEvent> = snapshot
        .categories
        .iter()
        .flat_map(|cat| {
            cat.items.iter().map(|item| FeedEvent {
                time: String::new(),
                query: item.query.clone(),
                source: item.source.clone(),
                subreddit: item.subreddit.clone(),
                channel: None,
                url: None,
                category: cat.label.clone(),
                count: 1,
                trend: "stable".to_string(),
                age: None,
                gender: None,
                state: None,
            })
        })
        .collect();
    picks.sort_by_key(|e| xxh3_64(format!("{}|{}", e.query, e.source).as_bytes()));
    picks.truncate(SEED_CAP);

    let day_start = window::et_day_start_utc(now);
    let times = window::spread_instants(&day_start, now, picks.len(), 1);
    for (e, t) in picks.iter_mut().zip(times) {
        e.time = t;
        impute_demographics(e);
    }
    picks.sort_by(|a, b| b.time.cmp(&a.time));
    picks
}

/// Record this run's raw events in the permanent cache, one aggregated
/// item per (query prefix, source) keeping the highest count seen. Runs
/// older than the retention horizon are pruned on the way out.
pub fn append_cache_run(cache: &mut SourcesCache, events: &[FeedEvent], now: DateTime<Utc>) {
    let mut agg: HashMap<(String, String), CacheItem> = HashMap::new();
    for e in events {
        let query = e.query.trim();
        if query.is_empty() {
            continue;
        }
        let key = (
            prefix_chars(&query.to_lowercase(), CACHE_KEY_LEN),
            e.source.as_str().to_string(),
        );
        let item = agg.entry(key).or_insert_with(|| CacheItem {
            query: query.to_string(),
            topic: query.to_string(),
            count: e.count,
            source: e.source.clone(),
            category: e.category.clone(),
            subreddit: e.subreddit.clone(),
            channel: e.channel.clone(),
            trend: e.trend.clone(),
        });
        item.count = item.count.max(e.count);
    }
    if agg.is_empty() {
        return;
    }

    let mut items: Vec<CacheItem> = agg.into_values().collect();
    items.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.query.cmp(&b.query)));
    cache.runs.push(CacheRun {
        ts: window::fmt_instant(now),
        items,
    });

    let horizon = window::fmt_instant(now - Duration::days(CACHE_RETENTION_DAYS));
    cache.runs.retain(|r| r.ts >= horizon);
}
