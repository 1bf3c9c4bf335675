//! Flat-file snapshot persistence under the data directory.
//!
//! Two files, overwritten on each run: `activities.json` (the filtered
//! fetch result) and `last_update.json`. Writes go through a temp file and
//! rename so a crashed run never leaves a half-written snapshot behind.

use crate::error::{DashboardError, Result};
use garmin_connect_client::Activity;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const ACTIVITIES_FILE: &str = "activities.json";
const LAST_UPDATE_FILE: &str = "last_update.json";

#[derive(Debug, Serialize, Deserialize)]
struct LastUpdate {
    last_update: String,
}

#[derive(Clone, Debug)]
pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn activities_path(&self) -> PathBuf {
        self.data_dir.join(ACTIVITIES_FILE)
    }

    pub fn has_snapshot(&self) -> bool {
        self.activities_path().is_file()
    }

    pub fn save_activities(&self, activities: &[Activity]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(activities)?;
        self.write_atomic(&self.activities_path(), &bytes)?;
        tracing::info!(
            count = activities.len(),
            path = %self.activities_path().display(),
            "saved activity snapshot"
        );
        Ok(())
    }

    pub fn load_activities(&self) -> Result<Vec<Activity>> {
        let path = self.activities_path();
        if !path.is_file() {
            return Err(DashboardError::MissingSnapshot(path));
        }
        let bytes = fs::read(&path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn save_last_update(&self, timestamp: &str) -> Result<()> {
        let payload = LastUpdate {
            last_update: timestamp.to_string(),
        };
        let bytes = serde_json::to_vec_pretty(&payload)?;
        self.write_atomic(&self.data_dir.join(LAST_UPDATE_FILE), &bytes)
    }

    pub fn load_last_update(&self) -> Result<Option<String>> {
        let path = self.data_dir.join(LAST_UPDATE_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        let payload: LastUpdate = serde_json::from_slice(&bytes)?;
        Ok(Some(payload.last_update))
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garmin_connect_client::{ActivityType, SportKind};

    fn activity(id: i64) -> Activity {
        Activity {
            activity_id: id,
            activity_name: Some("Evening Ride".into()),
            activity_type: ActivityType {
                type_key: SportKind::Cycling,
            },
            distance: 25_000.0,
            duration: 3000.0,
            calories: Some(600.0),
            average_hr: Some(140.0),
            max_hr: None,
            average_speed: None,
            max_speed: None,
            elevation_gain: Some(210.0),
            start_time_local: Some("2026-07-01 18:00:00".into()),
            start_time_gmt: None,
            start_latitude: None,
            start_longitude: None,
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::new(dir.path());
        let acts = vec![activity(1), activity(2)];

        store.save_activities(&acts).expect("save");
        assert!(store.has_snapshot());
        let loaded = store.load_activities().expect("load");
        assert_eq!(loaded, acts);
    }

    #[test]
    fn missing_snapshot_is_explicit_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::new(dir.path().join("nested"));
        assert!(!store.has_snapshot());
        let err = store.load_activities().unwrap_err();
        assert!(matches!(err, DashboardError::MissingSnapshot(_)));
    }

    #[test]
    fn last_update_round_trip_and_absence() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::new(dir.path());
        assert_eq!(store.load_last_update().expect("load"), None);
        store
            .save_last_update("2026-08-01T06:00:00")
            .expect("save");
        assert_eq!(
            store.load_last_update().expect("load").as_deref(),
            Some("2026-08-01T06:00:00")
        );
    }

    #[test]
    fn overwrite_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SnapshotStore::new(dir.path());
        store.save_activities(&[activity(1)]).expect("save");
        store
            .save_activities(&[activity(2), activity(3)])
            .expect("save again");
        let loaded = store.load_activities().expect("load");
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].activity_id, 2);
    }
}
