//! Release identifiers and retention.
//!
//! Pure functions only: no I/O. The clock is passed in by the caller.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use regex::Regex;

/// `YYYYMMDDTHHMMSSmmmZ`: sortable, and free of `:` and `.`.
const RELEASE_ID_FORMAT: &str = "%Y%m%dT%H%M%S%3fZ";

static RELEASE_ID_REGEX: OnceLock<Regex> = OnceLock::new();

fn release_id_regex() -> &'static Regex {
    RELEASE_ID_REGEX.get_or_init(|| {
        #[allow(clippy::expect_used)] // static pattern
        Regex::new(r"^\d{8}T\d{9}Z$").expect("static regex pattern is valid")
    })
}

/// Returns `true` when `name` has the shape of an allocated release id.
#[must_use]
pub fn is_release_id(name: &str) -> bool {
    release_id_regex().is_match(name)
}

/// Hands out release ids derived from the clock.
///
/// Ids from one allocator are strictly increasing even when two calls land
/// in the same millisecond or the clock steps backwards: the next id is
/// bumped one millisecond past the last one issued.
#[derive(Debug)]
pub struct ReleaseIdAllocator {
    last_millis: AtomicI64,
}

impl Default for ReleaseIdAllocator {
    fn default() -> Self {
        Self {
            last_millis: AtomicI64::new(i64::MIN),
        }
    }
}

impl ReleaseIdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id for a release created at `now`.
    pub fn allocate(&self, now: DateTime<Utc>) -> String {
        let wanted = now.timestamp_millis();
        let mut last = self.last_millis.load(Ordering::Relaxed);
        loop {
            let next = wanted.max(last.saturating_add(1));
            match self.last_millis.compare_exchange_weak(
                last,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return format_release_id(next),
                Err(actual) => last = actual,
            }
        }
    }
}

fn format_release_id(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .format(RELEASE_ID_FORMAT)
        .to_string()
}

/// Pick the release directories to delete.
///
/// `entries` is the raw directory listing of `releases/`; names that are not
/// release ids are never touched. The newest `keep` releases survive, and so
/// does `current` (the release the live symlink resolves to) wherever it
/// ranks. Result is oldest-first.
#[must_use]
pub fn select_prunable(entries: &[String], current: Option<&str>, keep: usize) -> Vec<String> {
    let mut releases: Vec<&str> = entries
        .iter()
        .map(String::as_str)
        .filter(|name| is_release_id(name))
        .collect();
    releases.sort_unstable_by(|a, b| b.cmp(a));
    releases.dedup();

    let mut doomed: Vec<String> = releases
        .into_iter()
        .skip(keep)
        .filter(|name| Some(*name) != current)
        .map(str::to_owned)
        .collect();
    doomed.reverse();
    doomed
}

/// Extract the release id from a `readlink` target such as
/// `/var/www/app/releases/20261017T101500000Z`.
#[must_use]
pub fn release_id_from_target(target: &str) -> Option<&str> {
    let name = target.trim().trim_end_matches('/').rsplit('/').next()?;
    is_release_id(name).then_some(name)
}
