//! Backup naming and retention for local snapshot files.
//!
//! Backups live next to the snapshot as `<stem>_backup_<yyyyMMdd_HHmmss>.json`.
//! Because the timestamp is zero-padded, filename order is chronological order.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};

pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const BACKUP_MARKER: &str = "_backup_";
const BACKUP_EXTENSION: &str = ".json";

/// Stem used as the backup prefix, e.g. `clipboard_sync` for `clipboard_sync.json`.
pub fn snapshot_stem(snapshot_path: &Path) -> Option<&str> {
    snapshot_path.file_stem().and_then(|stem| stem.to_str())
}

pub fn backup_file_name(stem: &str, at: DateTime<Utc>) -> String {
    format!(
        "{stem}{BACKUP_MARKER}{}{BACKUP_EXTENSION}",
        at.format(BACKUP_TIMESTAMP_FORMAT)
    )
}

/// Where the backup of `snapshot_path` taken at `at` goes.
pub fn backup_path(snapshot_path: &Path, at: DateTime<Utc>) -> Option<PathBuf> {
    let stem = snapshot_stem(snapshot_path)?;
    let name = backup_file_name(stem, at);
    Some(match snapshot_path.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    })
}

/// Whether `file_name` is a backup of the snapshot with the given stem.
pub fn is_backup_of(stem: &str, file_name: &str) -> bool {
    let Some(rest) = file_name
        .strip_prefix(stem)
        .and_then(|rest| rest.strip_prefix(BACKUP_MARKER))
    else {
        return false;
    };
    let Some(timestamp) = rest.strip_suffix(BACKUP_EXTENSION) else {
        return false;
    };

    NaiveDateTime::parse_from_str(timestamp, BACKUP_TIMESTAMP_FORMAT).is_ok()
}

/// Names to delete so that only the newest `keep` backups remain.
pub fn expired_backups(mut names: Vec<String>, keep: usize) -> Vec<String> {
    names.sort_unstable_by(|a, b| b.cmp(a));
    if names.len() <= keep {
        return Vec::new();
    }
    names.split_off(keep)
}
