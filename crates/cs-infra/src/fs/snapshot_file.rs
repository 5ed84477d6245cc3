use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{debug, info, warn};

use cs_core::ports::{PruneReport, SnapshotError, SnapshotFilePort};
use cs_core::sync::backup;
use cs_core::ClipboardRecord;

/// Snapshot files as UTF-8 JSON arrays on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSnapshotFile;

impl JsonSnapshotFile {
    pub fn new() -> Self {
        Self
    }

    async fn ensure_parent_dir(path: &Path) -> Result<(), SnapshotError> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await.map_err(|source| SnapshotError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    /// Write next to the target, then rename over it, so readers only ever see
    /// the previous or the complete new contents.
    async fn atomic_write(path: &Path, content: &[u8]) -> Result<(), SnapshotError> {
        Self::ensure_parent_dir(path).await?;

        let tmp_path = tmp_path_for(path);
        fs::write(&tmp_path, content)
            .await
            .map_err(|source| SnapshotError::Io {
                path: tmp_path.clone(),
                source,
            })?;

        if let Err(source) = fs::rename(&tmp_path, path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(SnapshotError::Io {
                path: path.to_path_buf(),
                source,
            });
        }

        Ok(())
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SnapshotError + '_ {
    move |source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            SnapshotError::NotFound(path.to_path_buf())
        } else {
            SnapshotError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

#[async_trait]
impl SnapshotFilePort for JsonSnapshotFile {
    async fn write_snapshot(
        &self,
        path: &Path,
        records: &[ClipboardRecord],
    ) -> Result<(), SnapshotError> {
        let json = serde_json::to_vec_pretty(records)
            .map_err(|e| SnapshotError::Encode(e.to_string()))?;

        Self::atomic_write(path, &json).await?;
        debug!(path = %path.display(), count = records.len(), "snapshot written");
        Ok(())
    }

    async fn read_snapshot(&self, path: &Path) -> Result<Vec<serde_json::Value>, SnapshotError> {
        let bytes = fs::read(path).await.map_err(io_error(path))?;

        serde_json::from_slice::<Vec<serde_json::Value>>(&bytes).map_err(|e| {
            SnapshotError::InvalidFormat {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })
    }

    async fn validate_format(&self, path: &Path) -> bool {
        match self.read_snapshot(path).await {
            Ok(_) => true,
            Err(SnapshotError::NotFound(_)) => false,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "snapshot failed validation");
                false
            }
        }
    }

    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn create_backup(
        &self,
        path: &Path,
        at: DateTime<Utc>,
    ) -> Result<PathBuf, SnapshotError> {
        let target = backup::backup_path(path, at)
            .ok_or_else(|| SnapshotError::InvalidPath(path.to_path_buf()))?;

        fs::copy(path, &target).await.map_err(io_error(path))?;
        info!(from = %path.display(), to = %target.display(), "snapshot backup created");

        Ok(target)
    }

    async fn prune_backups(&self, path: &Path, keep: usize) -> Result<PruneReport, SnapshotError> {
        let stem = backup::snapshot_stem(path)
            .ok_or_else(|| SnapshotError::InvalidPath(path.to_path_buf()))?;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut names = Vec::new();
        let mut entries = fs::read_dir(&dir).await.map_err(io_error(&dir))?;
        while let Some(entry) = entries.next_entry().await.map_err(io_error(&dir))? {
            if let Some(name) = entry.file_name().to_str() {
                if backup::is_backup_of(stem, name) {
                    names.push(name.to_string());
                }
            }
        }

        let mut report = PruneReport::default();
        for name in backup::expired_backups(names, keep) {
            let victim = dir.join(&name);
            match fs::remove_file(&victim).await {
                Ok(()) => {
                    debug!(path = %victim.display(), "removed expired backup");
                    report.deleted.push(victim);
                }
                Err(err) => {
                    warn!(path = %victim.display(), error = %err, "failed to remove expired backup");
                    report.failed.push(victim);
                }
            }
            tokio::task::yield_now().await;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use cs_core::{DeviceId, RecordId};
    use tempfile::TempDir;

    fn record(record_id: i64, content: &str) -> ClipboardRecord {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        ClipboardRecord {
            id: RecordId::new(record_id),
            content: content.to_string(),
            device_id: Some(DeviceId::new("dev-a")),
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn write_then_read_returns_every_field() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("clipboard_sync.json");
        let files = JsonSnapshotFile::new();

        files
            .write_snapshot(&path, &[record(1, "one"), record(2, "two")])
            .await
            .unwrap();

        let values = files.read_snapshot(&path).await.unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0]["content"], "one");
        assert_eq!(values[0]["deviceId"], "dev-a");
        assert!(values[1].get("updatedAt").is_some());
        assert!(!tmp_path_for(&path).exists());
    }

    #[tokio::test]
    async fn empty_snapshot_is_an_empty_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clipboard_sync.json");
        let files = JsonSnapshotFile::new();

        files.write_snapshot(&path, &[]).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.trim(), "[]");
        assert!(files.validate_format(&path).await);
    }

    #[tokio::test]
    async fn validate_rejects_missing_and_non_array_files() {
        let dir = TempDir::new().unwrap();
        let files = JsonSnapshotFile::new();

        let missing = dir.path().join("missing.json");
        assert!(!files.validate_format(&missing).await);

        let object = dir.path().join("object.json");
        std::fs::write(&object, r#"{"content":"x"}"#).unwrap();
        assert!(!files.validate_format(&object).await);

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "not json").unwrap();
        assert!(!files.validate_format(&garbage).await);
    }

    #[tokio::test]
    async fn read_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let files = JsonSnapshotFile::new();

        let err = files
            .read_snapshot(&dir.path().join("nope.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, SnapshotError::NotFound(_)));
    }

    #[tokio::test]
    async fn backup_then_prune_keeps_newest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clipboard_sync.json");
        let files = JsonSnapshotFile::new();
        files.write_snapshot(&path, &[record(1, "x")]).await.unwrap();

        for day in 1..=4 {
            let at = Utc.with_ymd_and_hms(2024, 2, day, 12, 0, 0).unwrap();
            files.create_backup(&path, at).await.unwrap();
        }
        std::fs::write(dir.path().join("unrelated_backup_file.json"), "[]").unwrap();

        let report = files.prune_backups(&path, 2).await.unwrap();
        assert_eq!(report.deleted.len(), 2);
        assert!(report.failed.is_empty());

        let mut remaining: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        remaining.sort();
        assert_eq!(
            remaining,
            vec![
                "clipboard_sync.json".to_string(),
                "clipboard_sync_backup_20240203_120000.json".to_string(),
                "clipboard_sync_backup_20240204_120000.json".to_string(),
                "unrelated_backup_file.json".to_string(),
            ]
        );
    }
}
