//! When to persist a canonical snapshot and when to keep a timestamped
//! version.

use crate::types::{DiffResult, NotebookId};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Which writes an action authorises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SnapshotDecision {
    pub write_canonical: bool,
    pub write_version: bool,
}

impl SnapshotDecision {
    pub const SKIP: SnapshotDecision = SnapshotDecision {
        write_canonical: false,
        write_version: false,
    };

    pub fn writes_anything(&self) -> bool {
        self.write_canonical || self.write_version
    }
}

/// Throttle settings for version copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotPolicy {
    /// Minimum time between two version copies of the same notebook.
    pub min_interval: Duration,
}

impl Default for SnapshotPolicy {
    fn default() -> Self {
        Self {
            min_interval: Duration::seconds(60),
        }
    }
}

impl SnapshotPolicy {
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval }
    }

    pub fn decide(
        &self,
        diff: &DiffResult,
        has_canonical: bool,
        last_version: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> SnapshotDecision {
        decide(diff, has_canonical, last_version, now, self.min_interval)
    }
}

/// Decide the writes for one action.
///
/// With a canonical snapshot already stored, an empty diff writes nothing.
/// Otherwise the canonical copy is always rewritten, and a version copy is
/// added only if more than `min_interval` has passed since the last one (or
/// there has never been one).
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use comet::v1::{Cell, DiffResult, decide};
///
/// let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
/// let mut diff = DiffResult::new();
/// diff.insert(0, Cell::code("x"));
///
/// let d = decide(&diff, true, Some(now - Duration::seconds(30)), now, Duration::seconds(60));
/// assert!(d.write_canonical);
/// assert!(!d.write_version);
/// ```
pub fn decide(
    diff: &DiffResult,
    has_canonical: bool,
    last_version: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    min_interval: Duration,
) -> SnapshotDecision {
    if has_canonical && diff.is_empty() {
        return SnapshotDecision::SKIP;
    }
    let write_version = match last_version {
        None => true,
        Some(last) => now - last > min_interval,
    };
    SnapshotDecision {
        write_canonical: true,
        write_version,
    }
}

/// Per-notebook throttle state.
///
/// One of these exists per notebook identity and is never shared between
/// notebooks. `last_version` only moves forward after a version copy has
/// actually been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotState {
    pub identity: NotebookId,
    pub last_version: Option<DateTime<Utc>>,
}

impl SnapshotState {
    pub fn new(identity: NotebookId, last_version: Option<DateTime<Utc>>) -> Self {
        Self {
            identity,
            last_version,
        }
    }

    pub fn version_written(&mut self, at: DateTime<Utc>) {
        self.last_version = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cell;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 29, 10, 0, 0).unwrap()
    }

    fn changed() -> DiffResult {
        let mut diff = DiffResult::new();
        diff.insert(1, Cell::code("x = 2"));
        diff
    }

    #[test]
    fn test_existing_canonical_and_empty_diff_skips() {
        let policy = SnapshotPolicy::default();
        for last in [None, Some(now() - Duration::hours(5)), Some(now())] {
            let d = policy.decide(&DiffResult::new(), true, last, now());
            assert_eq!(d, SnapshotDecision::SKIP);
            assert!(!d.writes_anything());
        }
    }

    #[test]
    fn test_bootstrap_writes_both() {
        let d = SnapshotPolicy::default().decide(&DiffResult::new(), false, None, now());
        assert!(d.write_canonical);
        assert!(d.write_version);
    }

    #[test]
    fn test_recent_version_throttled() {
        let d = SnapshotPolicy::default().decide(
            &changed(),
            true,
            Some(now() - Duration::seconds(30)),
            now(),
        );
        assert!(d.write_canonical);
        assert!(!d.write_version);
    }

    #[test]
    fn test_old_version_allows_new_one() {
        let d = SnapshotPolicy::default().decide(
            &changed(),
            true,
            Some(now() - Duration::seconds(61)),
            now(),
        );
        assert!(d.write_version);
    }

    #[test]
    fn test_interval_boundary_is_exclusive() {
        let d = SnapshotPolicy::default().decide(
            &changed(),
            true,
            Some(now() - Duration::seconds(60)),
            now(),
        );
        assert!(!d.write_version);
    }

    #[test]
    fn test_custom_interval() {
        let policy = SnapshotPolicy::new(Duration::seconds(5));
        let d = policy.decide(&changed(), true, Some(now() - Duration::seconds(6)), now());
        assert!(d.write_version);
    }

    #[test]
    fn test_state_tracks_last_version() {
        let mut state = SnapshotState::new(NotebookId::new("nb"), None);
        state.version_written(now());
        assert_eq!(state.last_version, Some(now()));
    }
}
