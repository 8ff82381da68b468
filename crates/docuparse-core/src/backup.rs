//! Crash-safe mutation of a persisted file via timestamped snapshots.
//!
//! A caller performing a risky mutation calls [`BackupGuard::begin`]
//! first, mutates the target, then calls [`BackupGuard::commit`] on
//! success or [`BackupGuard::rollback`] on failure. If neither happens -
//! an early return, a panic in the mutation step - the guard restores
//! the target from its snapshot on drop.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, error, warn};

use crate::error::BackupError;

/// Scoped backup of a single file.
#[derive(Debug)]
pub struct BackupGuard {
    target: PathBuf,
    backup: PathBuf,
    armed: bool,
}

impl BackupGuard {
    /// Snapshot `target` to a timestamped sibling path
    /// (`<stem>_backup_<YYYYMMDD_HHMMSS><ext>`).
    ///
    /// Fails with [`BackupError::Create`] when the target is missing or
    /// unreadable; the guarded mutation must not proceed in that case.
    pub fn begin(target: impl AsRef<Path>) -> Result<Self, BackupError> {
        let target = target.as_ref().to_path_buf();
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let stem = target
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("file");
        let name = match target.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{stem}_backup_{stamp}.{ext}"),
            None => format!("{stem}_backup_{stamp}"),
        };
        let backup = target.with_file_name(name);

        fs::copy(&target, &backup).map_err(|source| BackupError::Create {
            path: target.clone(),
            source,
        })?;
        debug!("created backup {}", backup.display());

        Ok(Self {
            target,
            backup,
            armed: true,
        })
    }

    /// Path of the snapshot file.
    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    /// The mutation succeeded: delete the snapshot. Idempotent if the
    /// snapshot was already removed.
    pub fn commit(mut self) -> Result<(), BackupError> {
        self.armed = false;
        match fs::remove_file(&self.backup) {
            Ok(()) => {
                debug!("removed backup {}", self.backup.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(BackupError::Remove {
                path: self.backup.clone(),
                source,
            }),
        }
    }

    /// The mutation failed: copy the snapshot back over the target,
    /// restoring its pre-mutation state even if the target was partially
    /// overwritten, then clean up the snapshot.
    pub fn rollback(mut self) -> Result<(), BackupError> {
        self.armed = false;
        self.restore()?;
        if let Err(e) = fs::remove_file(&self.backup) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("could not remove backup {}: {}", self.backup.display(), e);
            }
        }
        Ok(())
    }

    fn restore(&self) -> Result<(), BackupError> {
        fs::copy(&self.backup, &self.target).map_err(|source| BackupError::Restore {
            path: self.target.clone(),
            backup: self.backup.clone(),
            source,
        })?;
        warn!(
            "restored {} from backup {}",
            self.target.display(),
            self.backup.display()
        );
        Ok(())
    }
}

impl Drop for BackupGuard {
    fn drop(&mut self) {
        if self.armed {
            // Unwinding or an early return skipped commit/rollback. The
            // snapshot is intentionally left behind for inspection.
            if let Err(e) = self.restore() {
                error!("backup guard failed to restore on drop: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_begin_creates_timestamped_sibling() {
        let (_dir, path) = setup("original");
        let guard = BackupGuard::begin(&path).unwrap();

        let name = guard
            .backup_path()
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(name.starts_with("ledger_backup_"));
        assert!(name.ends_with(".json"));
        assert_eq!(fs::read_to_string(guard.backup_path()).unwrap(), "original");

        guard.commit().unwrap();
    }

    #[test]
    fn test_begin_fails_for_missing_target() {
        let dir = TempDir::new().unwrap();
        let result = BackupGuard::begin(dir.path().join("absent.json"));
        assert!(matches!(result, Err(BackupError::Create { .. })));
    }

    #[test]
    fn test_commit_removes_backup() {
        let (_dir, path) = setup("original");
        let guard = BackupGuard::begin(&path).unwrap();
        let backup = guard.backup_path().to_path_buf();

        fs::write(&path, "mutated").unwrap();
        guard.commit().unwrap();

        assert!(!backup.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "mutated");
    }

    #[test]
    fn test_commit_idempotent_when_backup_gone() {
        let (_dir, path) = setup("original");
        let guard = BackupGuard::begin(&path).unwrap();
        fs::remove_file(guard.backup_path()).unwrap();
        guard.commit().unwrap();
    }

    #[test]
    fn test_rollback_restores_bytes() {
        let (_dir, path) = setup("pre-mutation contents");
        let guard = BackupGuard::begin(&path).unwrap();

        fs::write(&path, "partially overwr").unwrap();
        guard.rollback().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "pre-mutation contents");
    }

    #[test]
    fn test_drop_without_commit_restores() {
        let (_dir, path) = setup("pre-mutation contents");
        {
            let _guard = BackupGuard::begin(&path).unwrap();
            fs::write(&path, "garbage").unwrap();
            // Guard dropped without commit or rollback.
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "pre-mutation contents");
    }

    #[test]
    fn test_restore_survives_panic_in_mutation() {
        let (_dir, path) = setup("pre-mutation contents");
        let target = path.clone();

        let result = std::panic::catch_unwind(move || {
            let _guard = BackupGuard::begin(&target).unwrap();
            fs::write(&target, "garbage").unwrap();
            panic!("mutation step blew up");
        });

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "pre-mutation contents");
    }
}
