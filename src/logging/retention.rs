//! Log file retention management
//!
//! Handles cleanup of old dated launcher logs based on age.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};

/// Default retention period in days
pub const DEFAULT_RETENTION_DAYS: u64 = 7;

/// File name prefix of launcher log files
pub const LOG_FILE_PREFIX: &str = "techniclauncher_";

/// Clean up log files older than the retention period
///
/// `active` is the file currently being written and is never removed.
/// Returns the number of files deleted.
pub fn cleanup_old_logs(logs_dir: &Path, retention_days: u64, active: &Path) -> Result<usize> {
    if !logs_dir.exists() {
        return Ok(0);
    }

    let retention_duration = Duration::from_secs(retention_days * 24 * 60 * 60);
    let cutoff = SystemTime::now()
        .checked_sub(retention_duration)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let mut deleted_count = 0;

    for entry in fs::read_dir(logs_dir).context("Failed to read logs directory")? {
        let entry = entry?;
        let path = entry.path();

        if path == active {
            continue;
        }

        // Only process launcher log files
        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) if name.starts_with(LOG_FILE_PREFIX) && name.ends_with(".log") => {}
            _ => continue,
        }

        if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
            if modified < cutoff && fs::remove_file(&path).is_ok() {
                deleted_count += 1;
            }
        }
    }

    Ok(deleted_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_cleanup_nonexistent_dir() {
        let path = Path::new("/nonexistent/path/for/testing");
        let count = cleanup_old_logs(path, DEFAULT_RETENTION_DAYS, Path::new("")).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_cleanup_ignores_non_log_files() {
        let temp_dir = TempDir::new().unwrap();

        let other_file = temp_dir.path().join("other.txt");
        File::create(&other_file).unwrap().write_all(b"test").unwrap();

        let wrong_prefix = temp_dir.path().join("other_2026-01-01.log");
        File::create(&wrong_prefix).unwrap().write_all(b"test").unwrap();

        // Zero-day retention makes every launcher log eligible
        let count = cleanup_old_logs(temp_dir.path(), 0, Path::new("")).unwrap();
        assert_eq!(count, 0);
        assert!(other_file.exists());
        assert!(wrong_prefix.exists());
    }

    #[test]
    fn test_cleanup_keeps_recent_files() {
        let temp_dir = TempDir::new().unwrap();

        let log_file = temp_dir.path().join("techniclauncher_2026-01-21.log");
        File::create(&log_file).unwrap().write_all(b"test log content").unwrap();

        let count =
            cleanup_old_logs(temp_dir.path(), DEFAULT_RETENTION_DAYS, Path::new("")).unwrap();
        assert_eq!(count, 0);
        assert!(log_file.exists());
    }

    #[test]
    fn test_cleanup_removes_expired_but_not_active() {
        let temp_dir = TempDir::new().unwrap();

        let old = temp_dir.path().join("techniclauncher_2026-01-01.log");
        let active = temp_dir.path().join("techniclauncher_2026-01-21.log");
        File::create(&old).unwrap().write_all(b"old").unwrap();
        File::create(&active).unwrap().write_all(b"active").unwrap();
        std::thread::sleep(Duration::from_millis(20));

        let count = cleanup_old_logs(temp_dir.path(), 0, &active).unwrap();
        assert_eq!(count, 1);
        assert!(!old.exists());
        assert!(active.exists());
    }
}
