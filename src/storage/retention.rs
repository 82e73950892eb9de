//! Startup housekeeping: drop records whose embedded `_savedAt` stamp is
//! older than the retention window (30 days by default).
//!
//! Only records that carry a stamp are candidates. The account list and the
//! active session have none and are never touched. Records that fail to parse
//! are counted and left alone.
//!
//! A window of 0 days disables the pass. A window too large to subtract from
//! the current time keeps every record.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use serde_json::Value;

use super::Storage;

pub const DEFAULT_RETENTION_DAYS: i64 = 30;
pub const SAVED_AT_FIELD: &str = "_savedAt";

#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    /// Records saved more than this many days ago are removed.
    pub max_age_days: i64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_age_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

/// Statistics for one housekeeping pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HousekeepingStats {
    pub scanned: u64,
    pub purged: u64,
    pub kept: u64,
    pub unstamped: u64,
    pub malformed: u64,
}

/// Extract the `_savedAt` stamp from a raw JSON record.
///
/// `Err(())` means the document itself did not parse; `Ok(None)` means it
/// parsed but carries no (readable) stamp.
fn saved_at(raw: &str) -> Result<Option<DateTime<Utc>>, ()> {
    let value: Value = serde_json::from_str(raw.trim_start_matches('\0')).map_err(|_| ())?;
    Ok(value
        .get(SAVED_AT_FIELD)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc)))
}

impl RetentionPolicy {
    /// A window of zero (or less) days turns purging off.
    pub fn is_disabled(&self) -> bool {
        self.max_age_days <= 0
    }

    /// Oldest stamp still kept. `None` when the window reaches past the
    /// representable time range, in which case nothing is old enough.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        Duration::try_days(self.max_age_days).and_then(|d| now.checked_sub_signed(d))
    }
}

/// Remove every stamped record older than `policy.max_age_days` relative to `now`.
/// A disabled policy touches nothing.
pub fn purge_stale(
    storage: &mut Storage,
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> HousekeepingStats {
    let mut stats = HousekeepingStats::default();
    if policy.is_disabled() {
        debug!("housekeeping: retention disabled");
        return stats;
    }
    let cutoff = policy.cutoff(now);

    for key in storage.keys() {
        stats.scanned += 1;
        let Some(raw) = storage.get_raw(&key) else {
            continue;
        };
        match saved_at(&raw) {
            Err(()) => stats.malformed += 1,
            Ok(None) => stats.unstamped += 1,
            Ok(Some(stamp)) if cutoff.map_or(false, |c| stamp < c) => {
                debug!("housekeeping: removing '{}' saved {}", key, stamp.to_rfc3339());
                storage.remove(&key);
                stats.purged += 1;
            }
            Ok(Some(_)) => stats.kept += 1,
        }
    }

    if stats.purged > 0 {
        info!(
            "housekeeping: purged {} record(s) older than {} days ({} scanned)",
            stats.purged, policy.max_age_days, stats.scanned
        );
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamped(days_ago: i64, now: DateTime<Utc>) -> String {
        let ts = now - Duration::days(days_ago);
        format!("{{\"position\":5,\"_savedAt\":\"{}\"}}", ts.to_rfc3339())
    }

    #[test]
    fn purges_31_days_keeps_29() {
        let now = Utc::now();
        let mut s = Storage::memory();
        s.set_raw("game_old", &stamped(31, now));
        s.set_raw("game_new", &stamped(29, now));
        s.set_raw("users", "[]");
        s.set_raw("comments_bad", "{oops");

        let stats = purge_stale(&mut s, &RetentionPolicy::default(), now);
        assert_eq!(s.get_raw("game_old"), None);
        assert!(s.get_raw("game_new").is_some());
        assert!(s.get_raw("users").is_some());
        assert!(s.get_raw("comments_bad").is_some());
        assert_eq!(
            stats,
            HousekeepingStats {
                scanned: 4,
                purged: 1,
                kept: 1,
                unstamped: 1,
                malformed: 1
            }
        );
    }

    #[test]
    fn zero_window_purges_nothing() {
        let now = Utc::now();
        let mut s = Storage::memory();
        s.set_raw("game_guest", &stamped(0, now));
        s.set_raw("game_ancient", &stamped(3650, now));
        let policy = RetentionPolicy { max_age_days: 0 };
        assert_eq!(purge_stale(&mut s, &policy, now), HousekeepingStats::default());
        assert_eq!(s.keys().len(), 2);
    }

    #[test]
    fn huge_window_keeps_everything() {
        let now = Utc::now();
        let mut s = Storage::memory();
        s.set_raw("game_old", &stamped(3650, now));
        let policy = RetentionPolicy {
            max_age_days: 200_000_000,
        };
        assert_eq!(policy.cutoff(now), None);
        let stats = purge_stale(&mut s, &policy, now);
        assert_eq!(stats.purged, 0);
        assert_eq!(stats.kept, 1);
        assert!(s.get_raw("game_old").is_some());
    }

    #[test]
    fn accepts_browser_style_iso_stamps() {
        let now = DateTime::parse_from_rfc3339("2024-03-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut s = Storage::memory();
        s.set_raw("game_x", "{\"_savedAt\":\"2024-01-15T10:20:30.123Z\"}");
        purge_stale(&mut s, &RetentionPolicy::default(), now);
        assert_eq!(s.get_raw("game_x"), None);
    }
}
