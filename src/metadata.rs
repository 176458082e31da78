//! Metadata storage for tracking database update checks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::error::{Error, Result};

/// Update bookkeeping persisted as JSON next to the database file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateMetadata {
    /// When the release feed was last consulted.
    #[serde(with = "system_time_serde")]
    pub last_checked: Option<SystemTime>,
    /// Release date of the last installed database.
    pub last_release: Option<NaiveDate>,
}

mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &Option<SystemTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => {
                let duration = t.duration_since(UNIX_EPOCH).unwrap_or_default();
                Some(duration.as_secs()).serialize(serializer)
            }
            None => None::<u64>.serialize(serializer),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SystemTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs: Option<u64> = Option::deserialize(deserializer)?;
        Ok(secs.map(|s| UNIX_EPOCH + Duration::from_secs(s)))
    }
}

impl UpdateMetadata {
    /// Load metadata from a file.
    ///
    /// Returns default metadata if the file doesn't exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let meta: Self =
            serde_json::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        Ok(meta)
    }

    /// Save metadata to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Record a feed check at the current time.
    pub fn touch(&mut self) {
        self.last_checked = Some(SystemTime::now());
    }

    /// Record a freshly installed release.
    pub fn record_release(&mut self, date: NaiveDate) {
        self.last_release = Some(date);
        self.touch();
    }

    /// Check whether the feed should be consulted again.
    ///
    /// Returns `true` if no check is recorded or the elapsed time since the
    /// last one exceeds the interval.
    pub fn needs_check(&self, interval: Duration) -> bool {
        match self.last_checked {
            None => true,
            Some(last) => {
                let elapsed = SystemTime::now()
                    .duration_since(last)
                    .unwrap_or(Duration::MAX);
                elapsed >= interval
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_metadata_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("qqwry.dat.meta");
        let mut meta = UpdateMetadata::default();
        meta.record_release(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        meta.save(&path).unwrap();
        let loaded = UpdateMetadata::load(&path).unwrap();
        assert!(loaded.last_checked.is_some());
        assert_eq!(
            loaded.last_release,
            Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
    }

    #[test]
    fn test_metadata_needs_check() {
        let meta = UpdateMetadata {
            last_checked: Some(SystemTime::now() - Duration::from_secs(3600)),
            last_release: None,
        };
        // 1h ago, 30min interval -> check again
        assert!(meta.needs_check(Duration::from_secs(1800)));
        // 1h ago, 2h interval -> still fresh
        assert!(!meta.needs_check(Duration::from_secs(7200)));
    }

    #[test]
    fn test_metadata_missing_file() {
        let loaded = UpdateMetadata::load("/nonexistent/path.meta");
        assert!(loaded.is_ok());
        assert!(loaded.unwrap().last_checked.is_none());
    }

    #[test]
    fn test_metadata_default_needs_check() {
        let meta = UpdateMetadata::default();
        assert!(meta.needs_check(Duration::from_secs(1)));
    }

    #[test]
    fn test_metadata_touch_keeps_release() {
        let mut meta = UpdateMetadata::default();
        meta.record_release(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        meta.touch();
        assert!(meta.last_release.is_some());
    }
}
