//! Aggregation of raw activities into the publishable dashboard document.
//!
//! All functions here are pure: the same activity set always produces the
//! same output, independent of input ordering. Meters and seconds from the
//! API are converted to km / hours / minutes exactly once, here.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use garmin_connect_client::{Activity, SportKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const METERS_PER_KM: f64 = 1000.0;
const SECS_PER_HOUR: f64 = 3600.0;
const SECS_PER_MINUTE: f64 = 60.0;

/// Weekly trends are truncated to this many most recent weeks.
pub const WEEKLY_TREND_WEEKS: usize = 12;

/// Recent-activity list length when the caller does not override it.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeStats {
    pub count: usize,
    pub total_distance_km: f64,
    pub avg_distance_km: f64,
    pub total_duration_hours: f64,
    pub avg_duration_hours: f64,
    pub total_calories: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_activities: usize,
    pub total_distance_km: f64,
    pub total_duration_hours: f64,
    pub total_calories: f64,
    pub by_type: BTreeMap<SportKind, TypeStats>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeTrend {
    pub count: usize,
    pub distance_km: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    /// Calendar month, `YYYY-MM`.
    pub month: String,
    pub total_activities: usize,
    pub total_distance_km: f64,
    pub by_type: BTreeMap<SportKind, TypeTrend>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTrend {
    /// ISO week label, e.g. `2026-W28`.
    pub week: String,
    /// Monday of the ISO week, `YYYY-MM-DD`.
    pub week_start: String,
    pub total_distance_km: f64,
    pub activities: usize,
    pub by_type: BTreeMap<SportKind, f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecentActivity {
    /// `YYYY-MM-DD` of the local start time.
    pub date: String,
    pub name: String,
    #[serde(rename = "type")]
    pub sport: SportKind,
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub calories: Option<u32>,
}

/// The full publishable document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    pub generated_at: String,
    pub summary: SummaryStats,
    pub monthly_trends: Vec<MonthlyTrend>,
    pub weekly_trends: Vec<WeeklyTrend>,
    pub recent_activities: Vec<RecentActivity>,
}

/// Activities paired with a successfully parsed start time. Records whose
/// timestamp cannot be parsed are logged and left out of date-bucketed
/// aggregates.
fn with_start_times(activities: &[Activity]) -> Vec<(&Activity, NaiveDateTime)> {
    activities
        .iter()
        .filter_map(|a| match a.start_time() {
            Some(t) => Some((a, t)),
            None => {
                tracing::warn!(
                    activity_id = a.activity_id,
                    "skipping activity with unparseable start time"
                );
                None
            }
        })
        .collect()
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Totals over the whole set plus a per-sport breakdown. Does not depend
/// on timestamps, so every activity counts.
pub fn summarize(activities: &[Activity]) -> SummaryStats {
    let mut summary = SummaryStats {
        total_activities: activities.len(),
        ..Default::default()
    };

    for a in activities {
        let km = a.distance / METERS_PER_KM;
        let hours = a.duration / SECS_PER_HOUR;
        let calories = a.calories.unwrap_or(0.0);

        summary.total_distance_km += km;
        summary.total_duration_hours += hours;
        summary.total_calories += calories;

        let t = summary.by_type.entry(a.sport()).or_default();
        t.count += 1;
        t.total_distance_km += km;
        t.total_duration_hours += hours;
        t.total_calories += calories;
    }

    for t in summary.by_type.values_mut() {
        t.avg_distance_km = t.total_distance_km / t.count as f64;
        t.avg_duration_hours = t.total_duration_hours / t.count as f64;
    }

    summary
}

/// Group by calendar month of the local start time, ascending.
pub fn monthly_trends(activities: &[Activity]) -> Vec<MonthlyTrend> {
    let mut months: BTreeMap<String, MonthlyTrend> = BTreeMap::new();

    for (a, start) in with_start_times(activities) {
        let key = start.format("%Y-%m").to_string();
        let km = a.distance / METERS_PER_KM;
        let entry = months.entry(key.clone()).or_insert_with(|| MonthlyTrend {
            month: key,
            total_activities: 0,
            total_distance_km: 0.0,
            by_type: BTreeMap::new(),
        });
        entry.total_activities += 1;
        entry.total_distance_km += km;
        let t = entry.by_type.entry(a.sport()).or_default();
        t.count += 1;
        t.distance_km += km;
    }

    months.into_values().collect()
}

/// Group by ISO week, ascending, truncated to the most recent
/// [`WEEKLY_TREND_WEEKS`].
pub fn weekly_trends(activities: &[Activity]) -> Vec<WeeklyTrend> {
    let mut weeks: BTreeMap<(i32, u32), WeeklyTrend> = BTreeMap::new();

    for (a, start) in with_start_times(activities) {
        let iso = start.date().iso_week();
        let key = (iso.year(), iso.week());
        let km = a.distance / METERS_PER_KM;
        let entry = weeks.entry(key).or_insert_with(|| {
            let monday = NaiveDate::from_isoywd_opt(iso.year(), iso.week(), Weekday::Mon)
                .unwrap_or_else(|| start.date());
            WeeklyTrend {
                week: format!("{}-W{:02}", iso.year(), iso.week()),
                week_start: monday.format("%Y-%m-%d").to_string(),
                total_distance_km: 0.0,
                activities: 0,
                by_type: BTreeMap::new(),
            }
        });
        entry.total_distance_km += km;
        entry.activities += 1;
        *entry.by_type.entry(a.sport()).or_insert(0.0) += km;
    }

    let mut trends: Vec<WeeklyTrend> = weeks.into_values().collect();
    let skip = trends.len().saturating_sub(WEEKLY_TREND_WEEKS);
    trends.split_off(skip)
}

/// The newest `limit` activities as display rows.
pub fn recent_activities(activities: &[Activity], limit: usize) -> Vec<RecentActivity> {
    let mut dated = with_start_times(activities);
    dated.sort_by(|(a, ta), (b, tb)| tb.cmp(ta).then(b.activity_id.cmp(&a.activity_id)));

    dated
        .into_iter()
        .take(limit)
        .map(|(a, start)| RecentActivity {
            date: start.format("%Y-%m-%d").to_string(),
            name: a
                .activity_name
                .clone()
                .unwrap_or_else(|| format!("{} activity", a.sport())),
            sport: a.sport(),
            distance_km: round2(a.distance / METERS_PER_KM),
            duration_minutes: round1(a.duration / SECS_PER_MINUTE),
            calories: a.calories.map(|c| c.round() as u32),
        })
        .collect()
}

/// Assemble the full document. `generated_at` is injected so output is a
/// pure function of its inputs.
pub fn build_dashboard(activities: &[Activity], generated_at: String) -> DashboardData {
    DashboardData {
        generated_at,
        summary: summarize(activities),
        monthly_trends: monthly_trends(activities),
        weekly_trends: weekly_trends(activities),
        recent_activities: recent_activities(activities, DEFAULT_RECENT_LIMIT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garmin_connect_client::ActivityType;

    fn act(
        id: i64,
        sport: SportKind,
        start: &str,
        meters: f64,
        secs: f64,
        calories: Option<f64>,
    ) -> Activity {
        Activity {
            activity_id: id,
            activity_name: None,
            activity_type: ActivityType { type_key: sport },
            distance: meters,
            duration: secs,
            calories,
            average_hr: None,
            max_hr: None,
            average_speed: None,
            max_speed: None,
            elevation_gain: None,
            start_time_local: Some(start.to_string()),
            start_time_gmt: None,
            start_latitude: None,
            start_longitude: None,
        }
    }

    fn sample_set() -> Vec<Activity> {
        vec![
            act(
                1,
                SportKind::Running,
                "2026-06-01 07:00:00",
                10_000.0,
                3600.0,
                Some(700.0),
            ),
            act(
                2,
                SportKind::Running,
                "2026-06-15 07:00:00",
                5_000.0,
                1800.0,
                Some(350.0),
            ),
            act(
                3,
                SportKind::Cycling,
                "2026-06-20 18:00:00",
                40_000.0,
                5400.0,
                Some(900.0),
            ),
            act(
                4,
                SportKind::LapSwimming,
                "2026-07-02 06:30:00",
                2_000.0,
                2400.0,
                None,
            ),
        ]
    }

    #[test]
    fn summary_totals_match_underlying_activities() {
        let s = summarize(&sample_set());
        assert_eq!(s.total_activities, 4);
        assert!((s.total_distance_km - 57.0).abs() < 1e-9);
        assert!((s.total_duration_hours - (3600.0 + 1800.0 + 5400.0 + 2400.0) / 3600.0).abs() < 1e-9);
        assert!((s.total_calories - 1950.0).abs() < 1e-9);

        let running = &s.by_type[&SportKind::Running];
        assert_eq!(running.count, 2);
        assert!((running.total_distance_km - 15.0).abs() < 1e-9);
        assert!((running.avg_distance_km - 7.5).abs() < 1e-9);
    }

    #[test]
    fn by_type_distances_sum_to_total() {
        let s = summarize(&sample_set());
        let per_type: f64 = s.by_type.values().map(|t| t.total_distance_km).sum();
        assert!((per_type - s.total_distance_km).abs() < 1e-9);
    }

    #[test]
    fn monthly_trends_group_and_sort_by_month() {
        let trends = monthly_trends(&sample_set());
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].month, "2026-06");
        assert_eq!(trends[1].month, "2026-07");
        assert_eq!(trends[0].total_activities, 3);
        assert!((trends[0].total_distance_km - 55.0).abs() < 1e-9);
        assert_eq!(trends[0].by_type[&SportKind::Running].count, 2);
        assert!((trends[1].total_distance_km - 2.0).abs() < 1e-9);
    }

    #[test]
    fn monthly_by_type_sums_to_bucket_total() {
        for trend in monthly_trends(&sample_set()) {
            let per_type: f64 = trend.by_type.values().map(|t| t.distance_km).sum();
            assert!((per_type - trend.total_distance_km).abs() < 1e-9);
        }
    }

    #[test]
    fn weekly_trends_use_iso_weeks() {
        // 2026-06-01 is a Monday; both runs below land in 2026-W23
        let set = vec![
            act(1, SportKind::Running, "2026-06-01 07:00:00", 5_000.0, 1500.0, None),
            act(2, SportKind::Running, "2026-06-07 09:00:00", 5_000.0, 1500.0, None),
            act(3, SportKind::Cycling, "2026-06-08 09:00:00", 30_000.0, 3600.0, None),
        ];
        let trends = weekly_trends(&set);
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].week, "2026-W23");
        assert_eq!(trends[0].week_start, "2026-06-01");
        assert_eq!(trends[0].activities, 2);
        assert!((trends[0].total_distance_km - 10.0).abs() < 1e-9);
        assert_eq!(trends[1].week, "2026-W24");
    }

    #[test]
    fn weekly_trends_keep_only_most_recent_weeks() {
        // 16 consecutive Mondays, one activity each
        let mut set = Vec::new();
        let mut day = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        for i in 0..16 {
            let start = format!("{} 07:00:00", day.format("%Y-%m-%d"));
            set.push(act(i, SportKind::Running, &start, 5_000.0, 1500.0, None));
            day += chrono::Duration::days(7);
        }
        let trends = weekly_trends(&set);
        assert_eq!(trends.len(), WEEKLY_TREND_WEEKS);
        // the oldest four weeks were dropped
        assert_eq!(trends[0].week_start, "2026-02-02");
    }

    #[test]
    fn recent_activities_newest_first_with_rounding() {
        let mut set = sample_set();
        set[1].activity_name = Some("Midweek Tempo".into());
        let recent = recent_activities(&set, 3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].date, "2026-07-02");
        assert_eq!(recent[0].sport, SportKind::LapSwimming);
        assert_eq!(recent[0].name, "Lap swimming activity");
        assert!((recent[0].distance_km - 2.0).abs() < 1e-9);
        assert!((recent[0].duration_minutes - 40.0).abs() < 1e-9);
        assert_eq!(recent[0].calories, None);
        assert_eq!(recent[1].date, "2026-06-20");
        assert_eq!(recent[2].name, "Midweek Tempo");
        assert_eq!(recent[2].calories, Some(350));
    }

    #[test]
    fn aggregation_is_order_independent_and_idempotent() {
        let set = sample_set();
        let mut reversed = set.clone();
        reversed.reverse();

        let a = build_dashboard(&set, "2026-08-01T00:00:00".into());
        let b = build_dashboard(&reversed, "2026-08-01T00:00:00".into());
        let c = build_dashboard(&set, "2026-08-01T00:00:00".into());
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn unparseable_start_times_skip_trends_but_count_in_summary() {
        let mut set = sample_set();
        set.push(act(99, SportKind::Running, "garbage", 1_000.0, 600.0, None));

        let summary = summarize(&set);
        assert_eq!(summary.total_activities, 5);

        let monthly = monthly_trends(&set);
        let counted: usize = monthly.iter().map(|m| m.total_activities).sum();
        assert_eq!(counted, 4);
        assert!(recent_activities(&set, 10).iter().all(|r| r.date != "garbage"));
    }
}
