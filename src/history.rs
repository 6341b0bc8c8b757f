//! Daily sentiment history. One point per Eastern-Time civil day, stamped
//! at noon ET so charts bucket cleanly; repeat runs on the same day fold
//! into a running mean instead of appending.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use itertools::Itertools;

use crate::models::{CacheItem, History, HistoryPoint, Item, SourcesCache, StanceBreakdown};
use crate::sentiment;
use crate::window;

/// Two years of daily points.
pub const RETENTION_DAYS: usize = 730;

/// What one pipeline run contributes to today's point. Cohort and stance
/// fields are None when their fetch was rate-limited or skipped; the
/// previous value for today carries forward in that case.
#[derive(Debug, Clone, Default)]
pub struct DailySample {
    pub score: i64,
    pub score_male: Option<i64>,
    pub score_female: Option<i64>,
    pub stance: Option<StanceBreakdown>,
}

fn round_div(sum: i64, n: i64) -> i64 {
    (sum as f64 / n.max(1) as f64).round() as i64
}

fn carry<T>(bucket: &[HistoryPoint], f: impl Fn(&HistoryPoint) -> Option<T>) -> Option<T> {
    bucket.iter().rev().find_map(f)
}

fn finalize(history: &mut History, mut points: Vec<HistoryPoint>) {
    points.sort_by(|a, b| a.ts.cmp(&b.ts));
    if points.len() > RETENTION_DAYS {
        points.drain(..points.len() - RETENTION_DAYS);
    }
    history.points = points;
}

/// Fold `sample` into today's point, creating it if absent.
///
/// Also self-heals older data: multiple points that land on the same ET
/// day (from before runs were folded) collapse into one run-weighted
/// point at noon; unparseable timestamps are dropped. Points outside the
/// retention horizon fall off the front.
pub fn upsert_daily(history: &mut History, sample: DailySample, now: DateTime<Utc>) {
    let today = window::et_civil_date(now);

    let by_day = std::mem::take(&mut history.points)
        .into_iter()
        .filter_map(|p| window::parse_instant(&p.ts).map(|t| (window::et_civil_date(t), p)))
        .into_group_map();

    let mut rebuilt: Vec<HistoryPoint> = Vec::with_capacity(by_day.len() + 1);
    let mut today_seen = false;

    for (day, bucket) in by_day {
        if day == today {
            today_seen = true;
            let prev_runs: i64 = bucket.iter().map(|p| p.runs).sum();
            let prev_sum: i64 = bucket.iter().map(|p| p.score * p.runs).sum();
            let runs = prev_runs + 1;
            rebuilt.push(HistoryPoint {
                ts: window::noon_et_utc(day),
                score: round_div(prev_sum + sample.score, runs),
                runs,
                score_male: sample.score_male.or_else(|| carry(&bucket, |p| p.score_male)),
                score_female: sample
                    .score_female
                    .or_else(|| carry(&bucket, |p| p.score_female)),
                llm: sample.stance.clone().or_else(|| carry(&bucket, |p| p.llm.clone())),
            });
        } else if bucket.len() == 1 {
            rebuilt.extend(bucket);
        } else {
            let runs: i64 = bucket.iter().map(|p| p.runs).sum();
            let sum: i64 = bucket.iter().map(|p| p.score * p.runs).sum();
            rebuilt.push(HistoryPoint {
                ts: window::noon_et_utc(day),
                score: round_div(sum, runs),
                runs,
                score_male: carry(&bucket, |p| p.score_male),
                score_female: carry(&bucket, |p| p.score_female),
                llm: carry(&bucket, |p| p.llm.clone()),
            });
        }
    }

    if !today_seen {
        rebuilt.push(HistoryPoint {
            ts: window::noon_et_utc(today),
            score: sample.score,
            runs: 1,
            score_male: sample.score_male,
            score_female: sample.score_female,
            llm: sample.stance,
        });
    }

    finalize(history, rebuilt);
}

fn cache_item_as_item(ci: &CacheItem) -> Item {
    Item {
        topic: ci.topic.clone(),
        query: ci.query.clone(),
        count: ci.count,
        source: ci.source.clone(),
        subreddit: ci.subreddit.clone(),
        channel: ci.channel.clone(),
        url: None,
        trend: ci.trend.clone(),
    }
}

/// Synthesize history points for past ET days the chart is missing but the
/// sources cache still has raw items for. Existing days are never touched
/// and today is left to the live upsert. Returns how many days were added.
pub fn backfill_from_cache(
    history: &mut History,
    cache: &SourcesCache,
    now: DateTime<Utc>,
) -> usize {
    let today = window::et_civil_date(now);
    let existing: HashSet<NaiveDate> = history
        .points
        .iter()
        .filter_map(|p| window::parse_instant(&p.ts).map(window::et_civil_date))
        .collect();

    let mut by_day: BTreeMap<NaiveDate, Vec<&crate::models::CacheRun>> = BTreeMap::new();
    for run in &cache.runs {
        if let Some(t) = window::parse_instant(&run.ts) {
            by_day.entry(window::et_civil_date(t)).or_default().push(run);
        }
    }

    let mut added = 0;
    for (day, runs) in by_day {
        if day >= today || existing.contains(&day) {
            continue;
        }
        let items: Vec<Item> = runs
            .iter()
            .flat_map(|r| r.items.iter())
            .map(cache_item_as_item)
            .collect();
        let Some(score) = sentiment::count_weighted_score(&items) else {
            continue;
        };
        history.points.push(HistoryPoint {
            ts: window::noon_et_utc(day),
            score,
            runs: runs.len() as i64,
            score_male: None,
            score_female: None,
            llm: None,
        });
        added += 1;
    }

    if added > 0 {
        let points = std::mem::take(&mut history.points);
        finalize(history, points);
    }
    added
}
