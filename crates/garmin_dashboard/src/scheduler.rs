//! Cron-driven loop around the pipeline. Each tick is independent: a
//! failed run is logged and the loop simply waits for the next trigger.

use crate::error::{DashboardError, Result};
use cron::Schedule;
use std::str::FromStr;
use std::time::Duration;

/// Parse a cron expression (the `cron` crate's seconds-first syntax,
/// e.g. `"0 0 6 * * *"` for 06:00 daily). Local time.
pub fn parse_schedule(expr: &str) -> Result<Schedule> {
    Schedule::from_str(expr).map_err(|e| DashboardError::Schedule(format!("{expr:?}: {e}")))
}

/// Run `tick` at each occurrence of `schedule` until the schedule has no
/// upcoming occurrence.
pub async fn run_on_schedule<F, Fut>(schedule: &Schedule, mut tick: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    loop {
        let now = chrono::Local::now();
        let Some(next) = schedule.after(&now).next() else {
            tracing::warn!("schedule has no upcoming occurrences; stopping");
            return;
        };
        let delay = (next - now).to_std().unwrap_or(Duration::from_secs(1));
        tracing::info!(next = %next, "waiting for next scheduled run");
        tokio::time::sleep(delay).await;
        if let Err(e) = tick().await {
            tracing::warn!(error = %e, "scheduled run failed; will retry on next trigger");
        }
    }
}
