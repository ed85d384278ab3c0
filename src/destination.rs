use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::{debug, info, warn};

use crate::config::ConfigSource;
use crate::error::BackupError;

const NAME_PREFIX: &str = "dbbackup";
const NAME_SUFFIX: &str = "qos-bigmenu";
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// The directory chosen to receive the dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupDestination {
    pub path: PathBuf,
    /// `false` when the directory already existed before this run
    pub created: bool,
}

/// Base directories the backup directory may be placed under
pub trait BaseDirs {
    fn primary_base(&self) -> Option<PathBuf>;
    fn fallback_base(&self) -> Option<PathBuf>;

    /// Resolvable bases in the order they should be tried
    fn candidates(&self) -> Vec<PathBuf> {
        self.primary_base()
            .into_iter()
            .chain(self.fallback_base())
            .collect()
    }
}

/// Current directory first, then the user's Desktop (or home when there is no Desktop)
pub struct PlatformDirs<C> {
    config: C,
}

impl<C: ConfigSource> PlatformDirs<C> {
    pub fn new(config: C) -> Self {
        Self { config }
    }

    fn home(&self) -> Option<PathBuf> {
        let key = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
        self.config.var(key).map(PathBuf::from)
    }
}

impl<C: ConfigSource> BaseDirs for PlatformDirs<C> {
    fn primary_base(&self) -> Option<PathBuf> {
        match std::env::current_dir() {
            Ok(dir) => Some(dir),
            Err(e) => {
                warn!("Could not resolve current directory: {}", e);
                None
            }
        }
    }

    fn fallback_base(&self) -> Option<PathBuf> {
        let home = self.home()?;
        let desktop = home.join("Desktop");
        if desktop.is_dir() {
            Some(desktop)
        } else {
            debug!("No Desktop under {}, falling back to home", home.display());
            Some(home)
        }
    }
}

/// Build the backup directory name for `now`, optionally with a uniqueness token
pub fn backup_dir_name(now: DateTime<Local>, token: Option<&str>) -> String {
    let stamp = now.format(TIMESTAMP_FORMAT);
    match token {
        Some(token) => format!("{}-{}-{}-{}", NAME_PREFIX, stamp, NAME_SUFFIX, token),
        None => format!("{}-{}-{}", NAME_PREFIX, stamp, NAME_SUFFIX),
    }
}

/// Short random token used to keep concurrent runs apart
pub fn unique_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Create the backup directory under the first candidate that accepts it.
///
/// `name_builder` is called exactly once, before any attempt.
pub fn select<F>(candidates: &[PathBuf], name_builder: F) -> Result<BackupDestination, BackupError>
where
    F: FnOnce() -> String,
{
    let name = name_builder();
    let mut attempts = Vec::with_capacity(candidates.len());

    for base in candidates {
        let path = base.join(&name);
        debug!("Trying backup directory {}", path.display());
        match create(&path) {
            Ok(created) => {
                if created {
                    info!("Created backup directory {}", path.display());
                } else {
                    warn!(
                        "Backup directory {} already exists, another run may be writing to it",
                        path.display()
                    );
                }
                return Ok(BackupDestination { path, created });
            }
            Err(e) => {
                warn!("Cannot create {}: {}", path.display(), e);
                attempts.push((path, e.to_string()));
            }
        }
    }

    Err(BackupError::DirectoryCreationFailed { attempts })
}

fn create(path: &Path) -> std::io::Result<bool> {
    let existed = path.is_dir();
    std::fs::create_dir_all(path)?;
    Ok(!existed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapSource;
    use chrono::TimeZone;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn fixed_instant() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 8, 5, 13, 25, 0).unwrap()
    }

    /// A base whose parent is a regular file, so creating anything under it fails
    fn blocked_base(root: &TempDir) -> PathBuf {
        let file = root.path().join("not-a-dir");
        std::fs::write(&file, b"").unwrap();
        file.join("base")
    }

    #[test]
    fn test_backup_dir_name_format() {
        let name = backup_dir_name(fixed_instant(), None);
        assert_eq!(name, "dbbackup-20250805132500-qos-bigmenu");

        let stamp = name
            .strip_prefix("dbbackup-")
            .and_then(|rest| rest.strip_suffix("-qos-bigmenu"))
            .unwrap();
        assert_eq!(stamp.len(), 14);
        assert!(stamp.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_backup_dir_name_with_token() {
        let name = backup_dir_name(fixed_instant(), Some("a1b2c3d4"));
        assert_eq!(name, "dbbackup-20250805132500-qos-bigmenu-a1b2c3d4");
    }

    #[test]
    fn test_unique_token_shape() {
        let token = unique_token();
        assert_eq!(token.len(), 8);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_primary_is_preferred() {
        let primary = TempDir::new().unwrap();
        let fallback = TempDir::new().unwrap();
        let candidates = vec![primary.path().to_path_buf(), fallback.path().to_path_buf()];

        let dest = select(&candidates, || "dbbackup-x-qos-bigmenu".to_string()).unwrap();

        assert_eq!(dest.path, primary.path().join("dbbackup-x-qos-bigmenu"));
        assert!(dest.created);
        assert!(dest.path.is_dir());
        assert_eq!(std::fs::read_dir(fallback.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_falls_back_when_primary_fails() {
        let root = TempDir::new().unwrap();
        let fallback = TempDir::new().unwrap();
        let candidates = vec![blocked_base(&root), fallback.path().to_path_buf()];

        let dest = select(&candidates, || "dbbackup-x-qos-bigmenu".to_string()).unwrap();

        assert_eq!(dest.path, fallback.path().join("dbbackup-x-qos-bigmenu"));
        assert!(dest.path.is_dir());
    }

    #[test]
    fn test_all_candidates_fail() {
        let root = TempDir::new().unwrap();
        let candidates = vec![blocked_base(&root), blocked_base(&root).join("deeper")];

        match select(&candidates, || "dbbackup-x-qos-bigmenu".to_string()) {
            Err(BackupError::DirectoryCreationFailed { attempts }) => {
                assert_eq!(attempts.len(), 2);
                assert_eq!(attempts[0].0, candidates[0].join("dbbackup-x-qos-bigmenu"));
            }
            other => panic!("expected DirectoryCreationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_no_candidates() {
        let err = select(&[], || "name".to_string()).unwrap_err();
        assert!(matches!(err, BackupError::DirectoryCreationFailed { .. }));
    }

    #[test]
    fn test_name_built_once() {
        let root = TempDir::new().unwrap();
        let fallback = TempDir::new().unwrap();
        let calls = Cell::new(0);
        let candidates = vec![blocked_base(&root), fallback.path().to_path_buf()];

        select(&candidates, || {
            calls.set(calls.get() + 1);
            "once".to_string()
        })
        .unwrap();

        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_creates_missing_parents_and_is_idempotent() {
        let root = TempDir::new().unwrap();
        let base = root.path().join("nested").join("deeper");

        let first = select(&[base.clone()], || "dir".to_string()).unwrap();
        assert!(first.created);
        let second = select(&[base], || "dir".to_string()).unwrap();
        assert!(!second.created);
        assert_eq!(first.path, second.path);
    }

    #[test]
    fn test_fallback_prefers_desktop() {
        let home = TempDir::new().unwrap();
        std::fs::create_dir(home.path().join("Desktop")).unwrap();
        let key = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
        let dirs = PlatformDirs::new(MapSource::new().with(key, home.path().to_string_lossy()));

        assert_eq!(dirs.fallback_base(), Some(home.path().join("Desktop")));
    }

    #[test]
    fn test_fallback_uses_home_without_desktop() {
        let home = TempDir::new().unwrap();
        let key = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
        let dirs = PlatformDirs::new(MapSource::new().with(key, home.path().to_string_lossy()));

        assert_eq!(dirs.fallback_base(), Some(home.path().to_path_buf()));
        let candidates = dirs.candidates();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1], home.path().to_path_buf());
    }

    #[test]
    fn test_no_home_leaves_only_primary() {
        let dirs = PlatformDirs::new(MapSource::new());
        assert_eq!(dirs.fallback_base(), None);
        assert_eq!(dirs.candidates().len(), 1);
    }
}
