//! One pipeline run end to end: cursor, slice fan-out, event assembly,
//! snapshot merge, history upsert, status. Every store is read and
//! rewritten whole; a run that yields nothing still refreshes timestamps
//! so downstream dashboards can tell "no data" from "not running".

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use reqwest::Client;
use tracing::{debug, info};

use crate::aggregate;
use crate::feed;
use crate::fetch::{self, FetchConfig, SliceKind};
use crate::history::{self, DailySample};
use crate::merge::{self, MergeMode};
use crate::models::{FetchStatus, Item, LiveFeed, Snapshot, Source};
use crate::sentiment;
use crate::store::Store;
use crate::window;

const HTTP_TIMEOUT_SECS: u64 = 30;

pub struct RunOptions {
    /// None runs the pipeline offline, seeding events from the snapshot.
    pub fetch: Option<FetchConfig>,
    /// Ignore the incremental cursor and re-query the whole window.
    pub force_full: bool,
}

fn snapshot_items(snapshot: &Snapshot) -> Vec<Item> {
    snapshot
        .categories
        .iter()
        .flat_map(|c| c.items.iter().cloned())
        .collect()
}

pub async fn run_pipeline(store: &Store, opts: &RunOptions) -> Result<()> {
    let pipeline_start = std::time::Instant::now();
    let now = Utc::now();
    let window_start = window::window_start(now);
    let until = window::fmt_instant(now);

    // 1) cursor from the previous run's status
    let status = store.load_status()?;
    let (since, mode) = fetch::fetch_cursor(status.as_ref(), now, opts.force_full);
    info!(
        "Pipeline started - mode={:?}, since={}, until={}",
        mode, since, until
    );

    let previous = store.load_snapshot()?;
    let mut history = store.load_history()?;

    // 2) gather this run's events
    let fetch_start = std::time::Instant::now();
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let (events, score_male, score_female) = match &opts.fetch {
        Some(cfg) => {
            let client = Client::builder()
                .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()?;

            let tasks: Vec<_> = SliceKind::ALL
                .iter()
                .map(|&kind| fetch::fetch_slice(&client, cfg, kind, &since, &until))
                .collect();
            let mut slices = futures::future::join_all(tasks).await;
            let news = slices.pop().unwrap_or_default();
            let tiktok = slices.pop().unwrap_or_default();
            let youtube = slices.pop().unwrap_or_default();
            let live = slices.pop().unwrap_or_default();
            let search = slices.pop().unwrap_or_default();

            counts.insert(SliceKind::SearchQueries.as_str().to_string(), search.len());
            counts.insert(SliceKind::LiveEvents.as_str().to_string(), live.len());
            counts.insert(SliceKind::YoutubeVideos.as_str().to_string(), youtube.len());
            counts.insert(SliceKind::TiktokWatch.as_str().to_string(), tiktok.len());
            counts.insert(SliceKind::NewsArticles.as_str().to_string(), news.len());

            // 3) relevance-gate, convert, enrich
            let search = fetch::filter_political(search);
            let lookup = fetch::search_count_lookup(&search);
            let mut events = fetch::live_records_to_events(live, now);
            fetch::enrich_event_counts(&mut events, &lookup);
            events.extend(fetch::media_records_to_events(
                vec![
                    (fetch::filter_political(youtube), Source::Youtube),
                    (fetch::filter_political(tiktok), Source::TiktokWatch),
                    (fetch::filter_political(news), Source::News),
                ],
                &since,
                now,
            ));

            let (score_male, score_female) =
                if fetch::cohort_refresh_due(status.as_ref(), &history, now) {
                    let male = fetch::fetch_gender_score(&client, cfg, "male", &since, &until);
                    let female = fetch::fetch_gender_score(&client, cfg, "female", &since, &until);
                    futures::future::join(male, female).await
                } else {
                    debug!("Cohort slices skipped - refreshed recently, carrying forward");
                    (None, None)
                };
            (events, score_male, score_female)
        }
        None => {
            info!("Offline mode - seeding events from the existing snapshot");
            let events = previous
                .as_ref()
                .map(|s| feed::seed_events_from_snapshot(s, now))
                .unwrap_or_default();
            counts.insert("seeded".to_string(), events.len());
            (events, None, None)
        }
    };
    info!(
        "Event assembly completed - duration={:.2}s, events={}",
        fetch_start.elapsed().as_secs_f32(),
        events.len()
    );

    // 4) nothing came back: keep stores warm and record the dry run
    if events.is_empty() {
        let snapshot = merge::apply(MergeMode::NoOp, previous, None, now, &window_start);
        let items = snapshot_items(&snapshot);
        if !items.is_empty() {
            let sample = DailySample {
                score: sentiment::weighted_score(&items),
                score_male,
                score_female,
                stance: None,
            };
            history::upsert_daily(&mut history, sample, now);
            store.save_history(&history)?;
        }
        store.save_snapshot(&snapshot)?;
        store.save_status(&FetchStatus {
            last_attempt_at: until.clone(),
            data_returned: false,
            last_success_at: None,
            counts,
        })?;
        info!(
            "Pipeline completed - total_duration={:.2}s, events=0, data_returned=false",
            pipeline_start.elapsed().as_secs_f32()
        );
        return Ok(());
    }

    // 5) live feed: reset on ET-day rollover, then accumulate
    let feed_start = std::time::Instant::now();
    let existing = store.load_feed()?;
    let existing = if feed::rolled_over(&existing, now) {
        debug!("Feed reset - first run of a new ET day");
        LiveFeed::default()
    } else {
        existing
    };
    let live_feed = feed::merge_feed(existing, events.clone(), now);
    store.save_feed(&live_feed)?;
    info!(
        "Feed updated - duration={:.2}s, feed_events={}",
        feed_start.elapsed().as_secs_f32(),
        live_feed.events.len()
    );

    // 6) permanent sources cache
    let mut cache = store.load_cache()?;
    feed::append_cache_run(&mut cache, &events, now);
    store.save_cache(&cache)?;
    debug!("Cache appended - runs={}", cache.runs.len());

    // 7) snapshot: build this run's, merge with the previous, archive
    let build_start = std::time::Instant::now();
    let fresh = aggregate::snapshot_from_events(&events, now, &window_start);
    let snapshot = merge::apply(mode, previous, Some(fresh), now, &window_start);
    store.save_snapshot(&snapshot)?;
    let archive_path = store.archive_snapshot(&snapshot, window::et_civil_date(now))?;
    info!(
        "Snapshot merged - duration={:.2}s, total_engagements={}, top={}, archive={}",
        build_start.elapsed().as_secs_f32(),
        snapshot.summary.total_engagements,
        snapshot.summary.top_category,
        archive_path.display()
    );

    // 8) daily history from the merged snapshot's items
    let items = snapshot_items(&snapshot);
    if !items.is_empty() {
        let sample = DailySample {
            score: sentiment::weighted_score(&items),
            score_male,
            score_female,
            stance: None,
        };
        history::upsert_daily(&mut history, sample, now);
        store.save_history(&history)?;
        debug!("History upserted - points={}", history.points.len());
    }

    // 9) status for the next run's cursor
    store.save_status(&FetchStatus {
        last_attempt_at: until.clone(),
        data_returned: true,
        last_success_at: Some(until),
        counts,
    })?;

    info!(
        "Pipeline completed successfully - total_duration={:.2}s, events={}, categories_tracked={}",
        pipeline_start.elapsed().as_secs_f32(),
        events.len(),
        snapshot.summary.categories_tracked
    );
    Ok(())
}

/// Rebuild missing history days from the permanent sources cache instead
/// of running the pipeline.
pub fn run_backfill(store: &Store) -> Result<()> {
    let start = std::time::Instant::now();
    let cache = store.load_cache()?;
    let mut history = store.load_history()?;
    let before = history.points.len();

    let added = history::backfill_from_cache(&mut history, &cache, Utc::now());
    if added > 0 {
        store.save_history(&history)?;
    }
    info!(
        "Backfill completed - duration={:.2}s, days_added={}, points={} -> {}",
        start.elapsed().as_secs_f32(),
        added,
        before,
        history.points.len()
    );
    Ok(())
}
