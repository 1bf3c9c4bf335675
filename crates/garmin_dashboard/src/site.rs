//! Static site output: `dashboard_data.json` plus an `index.html` rendered
//! from the askama template.

use crate::error::Result;
use crate::stats::DashboardData;
use askama::Template;
use std::fs;
use std::path::Path;

pub const DATA_FILE: &str = "dashboard_data.json";
pub const PAGE_FILE: &str = "index.html";

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate<'a> {
    data: &'a DashboardData,
}

/// Write both site artifacts into `site_dir`, creating it if needed.
pub fn write_site(data: &DashboardData, site_dir: &Path) -> Result<()> {
    fs::create_dir_all(site_dir)?;

    let json = serde_json::to_vec_pretty(data)?;
    fs::write(site_dir.join(DATA_FILE), json)?;

    let html = DashboardTemplate { data }.render()?;
    fs::write(site_dir.join(PAGE_FILE), html)?;

    tracing::info!(
        site_dir = %site_dir.display(),
        recent = data.recent_activities.len(),
        "wrote dashboard site"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::build_dashboard;
    use garmin_connect_client::{Activity, ActivityType, SportKind};

    fn sample_data() -> DashboardData {
        let acts = vec![Activity {
            activity_id: 1,
            activity_name: Some("Fjord Loop".into()),
            activity_type: ActivityType {
                type_key: SportKind::Cycling,
            },
            distance: 42_000.0,
            duration: 5400.0,
            calories: Some(980.0),
            average_hr: Some(139.0),
            max_hr: None,
            average_speed: None,
            max_speed: None,
            elevation_gain: Some(510.0),
            start_time_local: Some("2026-07-18 10:00:00".into()),
            start_time_gmt: None,
            start_latitude: None,
            start_longitude: None,
        }];
        build_dashboard(&acts, "2026-08-01T06:00:00".into())
    }

    #[test]
    fn template_renders_headline_and_rows() {
        let data = sample_data();
        let html = DashboardTemplate { data: &data }.render().expect("render");
        assert!(html.contains("Training Dashboard"));
        assert!(html.contains("Fjord Loop"));
        assert!(html.contains("Cycling"));
        assert!(html.contains("42.0"));
        assert!(html.contains("2026-08-01T06:00:00"));
    }

    #[test]
    fn write_site_creates_both_artifacts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let data = sample_data();
        write_site(&data, dir.path()).expect("write site");

        let json = fs::read(dir.path().join(DATA_FILE)).expect("json exists");
        let parsed: DashboardData = serde_json::from_slice(&json).expect("json parses back");
        assert_eq!(parsed, data);

        let html = fs::read_to_string(dir.path().join(PAGE_FILE)).expect("html exists");
        assert!(html.contains("<!doctype html>") || html.contains("<!DOCTYPE html>"));
    }
}
