//! `GarminApi` trait, activity types and reqwest-based client for the
//! Garmin Connect API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod http_client;
pub mod retry;

#[derive(Debug, Error)]
pub enum GarminError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("too many requests (retry-after: {retry_after:?})")]
    RateLimited { retry_after: Option<u64> },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("api error (status {status}): {body}")]
    Api { status: u16, body: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl GarminError {
    /// Whether a retry has any chance of succeeding. Auth, not-found and
    /// malformed-payload errors are permanent for a given run.
    pub fn is_transient(&self) -> bool {
        match self {
            GarminError::Http(e) => e.is_timeout() || e.is_connect(),
            GarminError::RateLimited { .. } => true,
            GarminError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// The sports the dashboard tracks. Anything else the service reports
/// (yoga, strength, …) deserializes to `Other` and is filtered out before
/// aggregation.
#[derive(
    Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum SportKind {
    Running,
    Cycling,
    LapSwimming,
    OpenWaterSwimming,
    #[serde(other)]
    Other,
}

impl SportKind {
    pub fn is_tracked(&self) -> bool {
        !matches!(self, SportKind::Other)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SportKind::Running => "Running",
            SportKind::Cycling => "Cycling",
            SportKind::LapSwimming => "Lap swimming",
            SportKind::OpenWaterSwimming => "Open water swimming",
            SportKind::Other => "Other",
        }
    }
}

impl std::fmt::Display for SportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Nested `activityType` object as the service returns it.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityType {
    pub type_key: SportKind,
}

/// One recorded exercise session. Field names follow the service's JSON;
/// distances are meters and durations seconds until aggregation converts
/// them.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub activity_id: i64,
    #[serde(default)]
    pub activity_name: Option<String>,
    pub activity_type: ActivityType,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default, rename = "averageHR")]
    pub average_hr: Option<f64>,
    #[serde(default, rename = "maxHR")]
    pub max_hr: Option<f64>,
    #[serde(default)]
    pub average_speed: Option<f64>,
    #[serde(default)]
    pub max_speed: Option<f64>,
    #[serde(default)]
    pub elevation_gain: Option<f64>,
    #[serde(default)]
    pub start_time_local: Option<String>,
    #[serde(default, rename = "startTimeGMT")]
    pub start_time_gmt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_longitude: Option<f64>,
}

impl Activity {
    pub fn sport(&self) -> SportKind {
        self.activity_type.type_key
    }

    /// Parse the start timestamp, preferring local time over GMT.
    ///
    /// The service is not consistent about the format: the activity list
    /// uses `YYYY-MM-DD HH:MM:SS` while detail payloads may carry ISO-8601
    /// with or without a zone suffix. All three are accepted.
    pub fn start_time(&self) -> Option<chrono::NaiveDateTime> {
        self.start_time_local
            .as_deref()
            .or(self.start_time_gmt.as_deref())
            .and_then(parse_timestamp)
    }
}

fn parse_timestamp(s: &str) -> Option<chrono::NaiveDateTime> {
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(ndt);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(ndt);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    None
}

/// Per-activity detail payload. Only the start coordinates are projected;
/// everything else stays as opaque JSON.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDetail {
    #[serde(default)]
    pub start_latitude: Option<f64>,
    #[serde(default)]
    pub start_longitude: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[async_trait]
pub trait GarminApi: Send + Sync + 'static {
    /// Exchange credentials for a session token. Must be called before any
    /// other operation.
    async fn login(&self) -> Result<(), GarminError>;

    async fn get_user_profile(&self) -> Result<UserProfile, GarminError>;

    /// One page of the activity list, newest first, `?start=N&limit=M`.
    async fn get_activities(&self, start: u32, limit: u32)
    -> Result<Vec<Activity>, GarminError>;

    /// Page through the activity list until a short page, or until `max`
    /// records have been collected. Transient page failures are retried
    /// before the whole fetch fails.
    async fn get_all_activities(
        &self,
        page_size: u32,
        max: Option<u32>,
    ) -> Result<Vec<Activity>, GarminError>;

    async fn get_activity_detail(&self, activity_id: i64)
    -> Result<ActivityDetail, GarminError>;
}
