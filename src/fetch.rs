//! Boundary to the remote analytics endpoint. Everything here is plumbing:
//! slice requests, tolerant row decoding, and the conversion of raw rows
//! into the pipeline's events. A slice that fails to fetch or decode
//! degrades to an empty slice with a warning; it never aborts the run.

use std::collections::HashMap;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

use crate::categories;
use crate::feed;
use crate::merge::MergeMode;
use crate::models::{FeedEvent, FetchStatus, History, Item, Source};
use crate::relevance;
use crate::sentiment;
use crate::text::prefix_chars;
use crate::window;

/// Minutes between cohort (per-gender) slice refreshes.
const COHORT_REFRESH_MINUTES: i64 = 55;
/// Minimum span media timestamps are spread over, in seconds.
const MEDIA_MIN_SPAN_SECS: i64 = 3600;
/// Reddit URLs are rebuilt as search links when they point at telemetry.
const REDDIT_JUNK_URL_MARKERS: [&str; 2] = ["shreddit/events", "gql-fed.reddit.com"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceKind {
    SearchQueries,
    LiveEvents,
    YoutubeVideos,
    TiktokWatch,
    NewsArticles,
}

impl SliceKind {
    pub const ALL: [SliceKind; 5] = [
        SliceKind::SearchQueries,
        SliceKind::LiveEvents,
        SliceKind::YoutubeVideos,
        SliceKind::TiktokWatch,
        SliceKind::NewsArticles,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SliceKind::SearchQueries => "search_queries",
            SliceKind::LiveEvents => "live_events",
            SliceKind::YoutubeVideos => "youtube_videos",
            SliceKind::TiktokWatch => "tiktok_watch",
            SliceKind::NewsArticles => "news_articles",
        }
    }
}

/// Where and how to reach the remote endpoint. Absent entirely when the
/// pipeline runs offline.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub endpoint: Url,
    pub token: String,
    /// Demographic cohort the endpoint filters to, e.g. "18-29".
    pub cohort: String,
}

/// One row as the endpoint returns it. Every field is optional; rows with
/// no query/topic text at all are skipped downstream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subreddit: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub trend: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl RawRecord {
    /// Query if present, else topic, else empty.
    pub fn text(&self) -> &str {
        self.query
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.topic.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Default, Deserialize)]
struct SliceResponse {
    #[serde(default)]
    records: Vec<RawRecord>,
}

async fn try_fetch_slice(
    client: &Client,
    cfg: &FetchConfig,
    body: serde_json::Value,
    kind: SliceKind,
) -> Result<Vec<RawRecord>> {
    let resp = client
        .post(cfg.endpoint.clone())
        .bearer_auth(&cfg.token)
        .json(&body)
        .send()
        .await
        .with_context(|| format!("Request failed for slice {}", kind.as_str()))?
        .error_for_status()
        .with_context(|| format!("HTTP error for slice {}", kind.as_str()))?;

    let body: SliceResponse = resp
        .json()
        .await
        .with_context(|| format!("Decoding JSON for slice {}", kind.as_str()))?;
    Ok(body.records)
}

/// Fetch one slice of the window. Failures come back as an empty slice.
pub async fn fetch_slice(
    client: &Client,
    cfg: &FetchConfig,
    kind: SliceKind,
    since: &str,
    until: &str,
) -> Vec<RawRecord> {
    let start = Instant::now();
    debug!("Fetching slice - kind={}, since={}", kind.as_str(), since);

    let body = json!({
        "kind": kind.as_str(),
        "since": since,
        "until": until,
        "cohort": cfg.cohort,
    });
    match try_fetch_slice(client, cfg, body, kind).await {
        Ok(records) => {
            info!(
                "Slice fetch completed - kind={}, duration={:.2}s, rows={}",
                kind.as_str(),
                start.elapsed().as_secs_f32(),
                records.len()
            );
            records
        }
        Err(e) => {
            warn!(
                "Slice fetch failed, treating as empty - kind={}, error={:#}",
                kind.as_str(),
                e
            );
            Vec::new()
        }
    }
}

/// Keep only rows whose text the relevance classifier accepts. Rows with
/// no text are dropped here too.
pub fn filter_political(records: Vec<RawRecord>) -> Vec<RawRecord> {
    records
        .into_par_iter()
        .filter(|r| {
            let text = r.text();
            !text.trim().is_empty() && relevance::is_political(text)
        })
        .collect()
}

/// Decide where this run's fetch window starts and how its snapshot merges.
/// A successful fetch inside the current 24 h window lets the run continue
/// incrementally from that instant; anything else (first run, stale cursor,
/// a no-data run that cleared it, or --force-full) re-queries the whole
/// window and merges by max.
pub fn fetch_cursor(
    status: Option<&FetchStatus>,
    now: DateTime<Utc>,
    force_full: bool,
) -> (String, MergeMode) {
    let ws = window::window_start(now);
    if force_full {
        return (ws, MergeMode::FullRebuild);
    }
    match status.and_then(|s| s.last_success_at.as_deref()) {
        Some(last) if last >= ws.as_str() => (last.to_string(), MergeMode::Incremental),
        _ => (ws, MergeMode::FullRebuild),
    }
}

/// Reddit rows sometimes carry telemetry URLs instead of thread links;
/// rebuild those as a subreddit search for the query. Other URLs pass
/// through untouched.
pub fn sanitize_url(
    url: Option<String>,
    source: &Source,
    subreddit: Option<&str>,
    query: &str,
) -> Option<String> {
    let url = url?;
    if *source == Source::Reddit && REDDIT_JUNK_URL_MARKERS.iter().any(|m| url.contains(m)) {
        let sub = subreddit.filter(|s| !s.is_empty()).unwrap_or("politics");
        let q = prefix_chars(query, 120).replace(' ', "+");
        return Some(format!(
            "https://www.reddit.com/r/{sub}/search/?q={q}&sort=top&t=week"
        ));
    }
    Some(url)
}

/// Convert one live-event row. Rows without text are dropped, and rows
/// whose category is not one of the canonical labels are dropped too: the
/// live slice is pre-categorized upstream and anything else is noise.
fn live_record_to_event(r: RawRecord, now: DateTime<Utc>) -> Option<FeedEvent> {
    let query = r.text().trim().to_string();
    if query.is_empty() {
        return None;
    }
    let category = categories::canonical_label(r.category.as_deref().unwrap_or(""))?;
    let source = r
        .source
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(Source::from)
        .unwrap_or_default();
    let url = sanitize_url(r.url, &source, r.subreddit.as_deref(), &query);
    let mut event = FeedEvent {
        time: r.time.unwrap_or_else(|| window::fmt_instant(now)),
        query,
        source,
        subreddit: r.subreddit,
        channel: r.channel,
        url,
        category: category.to_string(),
        count: r.count.unwrap_or(1),
        trend: r.trend.filter(|t| !t.is_empty()).unwrap_or_else(|| "stable".to_string()),
        age: r.age,
        gender: r.gender,
        state: r.state,
    };
    feed::impute_demographics(&mut event);
    Some(event)
}

/// Live slice rows → events, deduplicated and per-viewer capped.
pub fn live_records_to_events(records: Vec<RawRecord>, now: DateTime<Utc>) -> Vec<FeedEvent> {
    let events: Vec<FeedEvent> = records
        .into_iter()
        .filter_map(|r| live_record_to_event(r, now))
        .collect();
    feed::cap_events_per_user(feed::dedup_events(events))
}

/// Media slice rows (aggregates without timestamps) → events, with synthetic
/// timestamps spread evenly from `since` to now. Slices keep their input
/// order; a row missing its source falls back to its slice's.
pub fn media_records_to_events(
    slices: Vec<(Vec<RawRecord>, Source)>,
    since: &str,
    now: DateTime<Utc>,
) -> Vec<FeedEvent> {
    let tagged: Vec<(RawRecord, Source)> = slices
        .into_iter()
        .flat_map(|(rows, default_source)| {
            rows.into_iter().map(move |r| (r, default_source.clone()))
        })
        .collect();
    let times = window::spread_instants(since, now, tagged.len(), MEDIA_MIN_SPAN_SECS);

    tagged
        .into_iter()
        .zip(times)
        .filter_map(|((r, default_source), time)| {
            let query = r.text().trim().to_string();
            if query.is_empty() {
                return None;
            }
            let source = r
                .source
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(Source::from)
                .unwrap_or(default_source);
            let url = sanitize_url(r.url, &source, r.subreddit.as_deref(), &query);
            let mut event = FeedEvent {
                time,
                query,
                source,
                subreddit: r.subreddit,
                channel: r.channel,
                url,
                category: categories::normalize_category(r.category.as_deref().unwrap_or(""))
                    .to_string(),
                count: r.count.unwrap_or(1),
                trend: r.trend.filter(|t| !t.is_empty()).unwrap_or_else(|| "stable".to_string()),
                age: r.age,
                gender: r.gender,
                state: r.state,
            };
            feed::impute_demographics(&mut event);
            Some(event)
        })
        .collect()
}

/// Aggregate search rows keyed by lowercased query, keeping the max count.
/// Individual events borrow counts from here.
pub fn search_count_lookup(records: &[RawRecord]) -> HashMap<String, i64> {
    let mut lookup: HashMap<String, i64> = HashMap::new();
    for r in records {
        let key = r.text().trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        let count = r.count.unwrap_or(1);
        let slot = lookup.entry(key).or_insert(count);
        *slot = (*slot).max(count);
    }
    lookup
}

/// Raise search/reddit event counts to the aggregate count of the matching
/// search row. Aggregates only ever raise; an event already above stays.
pub fn enrich_event_counts(events: &mut [FeedEvent], lookup: &HashMap<String, i64>) {
    for e in events.iter_mut() {
        if !matches!(e.source, Source::Search | Source::Reddit) {
            continue;
        }
        if let Some(&agg) = lookup.get(&e.query.trim().to_lowercase()) {
            if agg > e.count {
                e.count = agg;
            }
        }
    }
}

/// Whether this run should re-query the per-gender cohort slices. Skipped
/// when a run less than 55 minutes ago already filled today's cohort
/// fields; carry-forward keeps the previous values meanwhile.
pub fn cohort_refresh_due(
    status: Option<&FetchStatus>,
    history: &History,
    now: DateTime<Utc>,
) -> bool {
    let recently_ran = status
        .and_then(|s| window::parse_instant(&s.last_attempt_at))
        .map(|t| now - t < Duration::minutes(COHORT_REFRESH_MINUTES))
        .unwrap_or(false);
    if !recently_ran {
        return true;
    }
    history
        .points
        .last()
        .map(|p| p.score_male.is_none())
        .unwrap_or(true)
}

fn record_score_item(r: &RawRecord) -> Item {
    let text = r.text().to_string();
    Item {
        topic: text.clone(),
        query: text,
        count: r.count.unwrap_or(1),
        source: Source::default(),
        subreddit: None,
        channel: None,
        url: None,
        trend: "stable".to_string(),
    }
}

/// Fetch one gender's slice of live events and score it with the plain
/// count-weighted scorer. None when the slice is empty or unscoreable.
pub async fn fetch_gender_score(
    client: &Client,
    cfg: &FetchConfig,
    gender: &str,
    since: &str,
    until: &str,
) -> Option<i64> {
    let start = Instant::now();
    let kind = SliceKind::LiveEvents;
    let body = json!({
        "kind": kind.as_str(),
        "since": since,
        "until": until,
        "cohort": cfg.cohort,
        "gender": gender,
    });
    let records = match try_fetch_slice(client, cfg, body, kind).await {
        Ok(records) => records,
        Err(e) => {
            warn!("Cohort slice fetch failed - gender={}, error={:#}", gender, e);
            return None;
        }
    };
    let items: Vec<Item> = filter_political(records).iter().map(record_score_item).collect();
    let score = sentiment::count_weighted_score(&items);
    debug!(
        "Cohort slice scored - gender={}, duration={:.2}s, rows={}, score={:?}",
        gender,
        start.elapsed().as_secs_f32(),
        items.len(),
        score
    );
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HistoryPoint;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 25, 12, 0, 0).unwrap()
    }

    fn record(query: &str) -> RawRecord {
        RawRecord {
            query: Some(query.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn raw_records_tolerate_sparse_and_extra_fields() {
        let r: RawRecord =
            serde_json::from_str(r#"{"topic": "tariffs", "whatever": 1, "rank": null}"#).unwrap();
        assert_eq!(r.text(), "tariffs");
        assert_eq!(r.count, None);

        let r: RawRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(r.text(), "");
    }

    #[test]
    fn cursor_goes_incremental_only_inside_the_window() {
        let mut status = FetchStatus {
            last_attempt_at: "2026-02-25T11:00:00Z".into(),
            data_returned: true,
            last_success_at: Some("2026-02-25T11:00:00Z".into()),
            counts: Default::default(),
        };

        let (since, mode) = fetch_cursor(Some(&status), now(), false);
        assert_eq!(mode, MergeMode::Incremental);
        assert_eq!(since, "2026-02-25T11:00:00Z");

        // Cursor older than the window start.
        status.last_success_at = Some("2026-02-23T11:00:00Z".into());
        let (since, mode) = fetch_cursor(Some(&status), now(), false);
        assert_eq!(mode, MergeMode::FullRebuild);
        assert_eq!(since, "2026-02-24T12:00:00Z");

        // Cleared by a no-data run.
        status.last_success_at = None;
        let (_, mode) = fetch_cursor(Some(&status), now(), false);
        assert_eq!(mode, MergeMode::FullRebuild);

        // No status at all.
        let (since, mode) = fetch_cursor(None, now(), false);
        assert_eq!(mode, MergeMode::FullRebuild);
        assert_eq!(since, "2026-02-24T12:00:00Z");
    }

    #[test]
    fn force_full_overrides_a_live_cursor() {
        let status = FetchStatus {
            last_attempt_at: "2026-02-25T11:00:00Z".into(),
            data_returned: true,
            last_success_at: Some("2026-02-25T11:00:00Z".into()),
            counts: Default::default(),
        };
        let (since, mode) = fetch_cursor(Some(&status), now(), true);
        assert_eq!(mode, MergeMode::FullRebuild);
        assert_eq!(since, "2026-02-24T12:00:00Z");
    }

    #[test]
    fn political_filter_drops_junk_and_textless_rows() {
        let records = vec![
            record("trump tariff announcement"),
            record("taylor swift tour dates"),
            RawRecord::default(),
        ];
        let kept = filter_political(records);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].text(), "trump tariff announcement");
    }

    #[test]
    fn junk_reddit_urls_are_rebuilt_as_searches() {
        let url = sanitize_url(
            Some("https://gql-fed.reddit.com/abc".into()),
            &Source::Reddit,
            Some("politics"),
            "border bill vote",
        );
        assert_eq!(
            url.as_deref(),
            Some("https://www.reddit.com/r/politics/search/?q=border+bill+vote&sort=top&t=week")
        );

        let kept = sanitize_url(
            Some("https://www.reddit.com/r/politics/comments/x".into()),
            &Source::Reddit,
            Some("politics"),
            "border bill vote",
        );
        assert_eq!(kept.as_deref(), Some("https://www.reddit.com/r/politics/comments/x"));

        let other = sanitize_url(
            Some("https://example.com/shreddit/events".into()),
            &Source::Youtube,
            None,
            "anything",
        );
        assert_eq!(other.as_deref(), Some("https://example.com/shreddit/events"));

        assert_eq!(sanitize_url(None, &Source::Reddit, None, "q"), None);
    }

    #[test]
    fn live_rows_need_a_canonical_category() {
        let mut r = record("student loan forgiveness ruling");
        r.category = Some("economic policy".into());
        r.time = Some("2026-02-25T10:00:00Z".into());
        let e = live_record_to_event(r, now()).unwrap();
        assert_eq!(e.category, "Economic Policy");
        assert_eq!(e.count, 1);
        assert!(e.age.is_some() && e.gender.is_some() && e.state.is_some());

        let mut r = record("student loan forgiveness ruling");
        r.category = Some("stuff about loans".into());
        assert!(live_record_to_event(r, now()).is_none());

        let mut r = RawRecord::default();
        r.category = Some("Economic Policy".into());
        assert!(live_record_to_event(r, now()).is_none());
    }

    #[test]
    fn media_rows_inherit_their_slice_source_and_spread_times() {
        let youtube = vec![record("immigration bill explained"), record("senate vote recap")];
        let news = vec![record("white house briefing")];
        let events = media_records_to_events(
            vec![(youtube, Source::Youtube), (news, Source::News)],
            "2026-02-24T12:00:00Z",
            now(),
        );
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].source, Source::Youtube);
        assert_eq!(events[2].source, Source::News);
        assert_eq!(events[0].time, "2026-02-24T12:00:00Z");
        assert_eq!(events[2].time, "2026-02-25T12:00:00Z");
        assert!(events.iter().all(|e| e.category == "General Politics"));
    }

    #[test]
    fn enrichment_raises_search_and_reddit_counts_only() {
        let lookup = search_count_lookup(&[
            {
                let mut r = record("Border Bill");
                r.count = Some(40);
                r
            },
            {
                let mut r = record("border bill");
                r.count = Some(25);
                r
            },
        ]);
        assert_eq!(lookup.get("border bill"), Some(&40));

        let mut events = vec![
            FeedEvent {
                time: "2026-02-25T10:00:00Z".into(),
                query: "border bill".into(),
                source: Source::Search,
                subreddit: None,
                channel: None,
                url: None,
                category: "General Politics".into(),
                count: 1,
                trend: "stable".into(),
                age: None,
                gender: None,
                state: None,
            },
            FeedEvent {
                time: "2026-02-25T10:00:00Z".into(),
                query: "border bill".into(),
                source: Source::Youtube,
                subreddit: None,
                channel: None,
                url: None,
                category: "General Politics".into(),
                count: 1,
                trend: "stable".into(),
                age: None,
                gender: None,
                state: None,
            },
        ];
        enrich_event_counts(&mut events, &lookup);
        assert_eq!(events[0].count, 40);
        assert_eq!(events[1].count, 1);
    }

    #[test]
    fn cohort_refresh_skips_only_recent_and_filled() {
        let status = FetchStatus {
            last_attempt_at: "2026-02-25T11:30:00Z".into(), // 30 min ago
            data_returned: true,
            last_success_at: Some("2026-02-25T11:30:00Z".into()),
            counts: Default::default(),
        };
        let filled = History {
            points: vec![HistoryPoint {
                ts: "2026-02-25T17:00:00Z".into(),
                score: 60,
                runs: 2,
                score_male: Some(58),
                score_female: Some(63),
                llm: None,
            }],
        };
        assert!(!cohort_refresh_due(Some(&status), &filled, now()));

        // Recent run but cohort fields never landed.
        let unfilled = History {
            points: vec![HistoryPoint {
                ts: "2026-02-25T17:00:00Z".into(),
                score: 60,
                runs: 2,
                score_male: None,
                score_female: None,
                llm: None,
            }],
        };
        assert!(cohort_refresh_due(Some(&status), &unfilled, now()));

        // Stale last attempt.
        let stale = FetchStatus {
            last_attempt_at: "2026-02-25T10:00:00Z".into(),
            ..status
        };
        assert!(cohort_refresh_due(Some(&stale), &filled, now()));

        assert!(cohort_refresh_due(None, &filled, now()));
    }
}
