//! The fetch → aggregate → publish pipeline.

use crate::error::Result;
use crate::site;
use crate::stats::{self, DashboardData};
use crate::store::SnapshotStore;
use chrono::{Duration, Local, NaiveDateTime};
use garmin_connect_client::{Activity, GarminApi};
use std::path::Path;

#[derive(Clone, Debug)]
pub struct FetchOptions {
    /// Only keep activities started within this many days.
    pub days_back: u32,
    /// Activities per list request.
    pub page_size: u32,
    /// Stop fetching after this many activities.
    pub max_activities: Option<u32>,
    /// Enrich each kept activity with start coordinates from the detail
    /// endpoint.
    pub with_coordinates: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            days_back: 365,
            page_size: 100,
            max_activities: None,
            with_coordinates: false,
        }
    }
}

/// Keep tracked sports whose start time falls within the lookback window.
/// Records without a parseable start time are dropped with a warning.
pub fn filter_activities(
    activities: Vec<Activity>,
    now: NaiveDateTime,
    days_back: u32,
) -> Vec<Activity> {
    let cutoff = now - Duration::days(days_back as i64);
    activities
        .into_iter()
        .filter(|a| {
            if !a.sport().is_tracked() {
                return false;
            }
            match a.start_time() {
                Some(t) => t >= cutoff,
                None => {
                    tracing::warn!(
                        activity_id = a.activity_id,
                        "dropping activity with unparseable start time"
                    );
                    false
                }
            }
        })
        .collect()
}

/// Sign in, page through the activity list, filter to the tracked sports
/// and lookback window, optionally enrich with coordinates, and persist
/// the snapshot.
pub async fn fetch(
    client: &dyn GarminApi,
    store: &SnapshotStore,
    opts: &FetchOptions,
) -> Result<Vec<Activity>> {
    client.login().await?;
    match client.get_user_profile().await {
        Ok(profile) => tracing::info!(
            user = profile.display_name.as_deref().unwrap_or("unknown"),
            "signed in to Garmin Connect"
        ),
        Err(e) => tracing::warn!(error = %e, "could not fetch user profile"),
    }

    let fetched = client
        .get_all_activities(opts.page_size, opts.max_activities)
        .await?;
    let total = fetched.len();
    let mut kept = filter_activities(fetched, Local::now().naive_local(), opts.days_back);
    tracing::info!(total, kept = kept.len(), "fetched and filtered activities");

    if opts.with_coordinates {
        for a in kept.iter_mut() {
            match client.get_activity_detail(a.activity_id).await {
                Ok(detail) => {
                    a.start_latitude = detail.start_latitude;
                    a.start_longitude = detail.start_longitude;
                }
                // Detail lookups fail for some activities; the dashboard
                // just goes without coordinates for those.
                Err(e) => tracing::warn!(
                    activity_id = a.activity_id,
                    error = %e,
                    "could not fetch activity detail"
                ),
            }
        }
    }

    store.save_activities(&kept)?;
    Ok(kept)
}

/// Build the dashboard document from the stored snapshot and write the
/// static site artifacts.
pub fn render(store: &SnapshotStore, site_dir: &Path) -> Result<DashboardData> {
    let activities = store.load_activities()?;
    let generated_at = Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string();
    let data = stats::build_dashboard(&activities, generated_at);
    site::write_site(&data, site_dir)?;
    Ok(data)
}

/// Fetch followed by render; records the completion timestamp on success.
/// The one-shot entry point a scheduled job invokes.
pub async fn run(
    client: &dyn GarminApi,
    store: &SnapshotStore,
    site_dir: &Path,
    opts: &FetchOptions,
) -> Result<DashboardData> {
    fetch(client, store, opts).await?;
    let data = render(store, site_dir)?;
    store.save_last_update(&data.generated_at)?;
    tracing::info!("dashboard update complete");
    Ok(data)
}
