use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Where an engagement record came from. Serialized as the upstream
/// snake_case string; unrecognized values round-trip untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    Search,
    News,
    Youtube,
    Reddit,
    TiktokSearch,
    TiktokWatch,
    Other(String),
}

impl Source {
    pub fn as_str(&self) -> &str {
        match self {
            Source::Search => "search",
            Source::News => "news",
            Source::Youtube => "youtube",
            Source::Reddit => "reddit",
            Source::TiktokSearch => "tiktok_search",
            Source::TiktokWatch => "tiktok_watch",
            Source::Other(s) => s,
        }
    }

    /// Free-text query sources whose near-identical titles collapse by prefix.
    pub fn prefix_collapses(&self) -> bool {
        matches!(
            self,
            Source::Search | Source::Youtube | Source::TiktokSearch | Source::News
        )
    }

    /// Sources subject to the per-venue (subreddit/channel) cap.
    pub fn venue_capped(&self) -> bool {
        matches!(self, Source::Reddit | Source::Youtube | Source::News)
    }
}

impl Default for Source {
    fn default() -> Self {
        Source::Search
    }
}

impl From<&str> for Source {
    fn from(raw: &str) -> Self {
        match raw {
            "search" => Source::Search,
            "news" => Source::News,
            "youtube" => Source::Youtube,
            "reddit" => Source::Reddit,
            "tiktok_search" => Source::TiktokSearch,
            "tiktok_watch" => Source::TiktokWatch,
            other => Source::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Source {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Source {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Source::from(raw.as_str()))
    }
}

fn default_count() -> i64 {
    1
}

fn default_trend() -> String {
    "stable".to_string()
}

fn default_runs() -> i64 {
    1
}

/// One aggregated topic row inside a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub topic: String,
    pub query: String,
    #[serde(default = "default_count")]
    pub count: i64,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub subreddit: Option<String>,
    #[serde(default)]
    pub channel: Option<String>, // YouTube channel name; None elsewhere
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_trend")]
    pub trend: String, // "up" | "down" | "stable"
}

impl Item {
    /// First non-empty of subreddit / channel; the venue-cap group key.
    pub fn venue(&self) -> Option<&str> {
        self.subreddit
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.channel.as_deref().filter(|s| !s.is_empty()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub label: String,
    pub icon: String,
    pub engagement_count: i64,
    pub unique_users: i64,
    pub trending_score: i64, // 0-100, relative to the busiest category
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub generated_at: String, // ISO8601 UTC
    #[serde(default)]
    pub last_fetch_at: Option<String>,
    pub demographic: String,
    pub data_source: String,
    pub window: String,
    pub window_label: String,
    pub window_start: String,
    pub refresh_interval_minutes: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total_engagements: i64,
    pub total_unique_users: i64,
    pub top_category: String,
    pub categories_tracked: usize,
    pub data_window: String,
    #[serde(default)]
    pub events_today: BTreeMap<String, i64>, // source -> events in window
}

/// The full current-window picture written to snapshot.json each run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub meta: SnapshotMeta,
    pub summary: Summary,
    pub categories: Vec<Category>,
}

/// One atomic engagement record in the rolling live feed. Demographics are
/// imputed at event assembly when the upstream record lacks them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEvent {
    pub time: String, // ISO8601 UTC
    pub query: String,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub subreddit: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_count")]
    pub count: i64,
    #[serde(default = "default_trend")]
    pub trend: String,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveFeed {
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub day_start: String,
    #[serde(default)]
    pub events: Vec<FeedEvent>,
}

/// One consolidated day on the sentiment chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub ts: String, // noon ET expressed in UTC
    pub score: i64,
    #[serde(rename = "_n", default = "default_runs")]
    pub runs: i64, // samples averaged into score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_male: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_female: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<StanceBreakdown>,
}

/// LLM stance split over a day's top queries, in whole percents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StanceBreakdown {
    pub pct_pro: i64,
    pub pct_anti: i64,
    pub pct_neutral: i64,
    #[serde(default)]
    pub n: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    pub points: Vec<HistoryPoint>,
}

/// One archived run in the permanent sources cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRun {
    pub ts: String,
    #[serde(default)]
    pub items: Vec<CacheItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheItem {
    pub query: String,
    pub topic: String,
    #[serde(default = "default_count")]
    pub count: i64,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subreddit: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default = "default_trend")]
    pub trend: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesCache {
    #[serde(default)]
    pub runs: Vec<CacheRun>,
}

/// Written after every run; the next run's cursor decision reads it.
/// last_success_at is cleared on a no-data run so the cursor falls back
/// to a full-window rebuild instead of stranding past the data's edge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchStatus {
    pub last_attempt_at: String,
    pub data_returned: bool,
    #[serde(default)]
    pub last_success_at: Option<String>,
    #[serde(default)]
    pub counts: BTreeMap<String, usize>, // rows per slice this attempt
}
