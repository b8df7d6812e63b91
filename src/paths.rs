//! Launcher directory layout

use std::path::{Path, PathBuf};

/// Name of the launcher root directory under the user's home
pub const LAUNCHER_DIR_NAME: &str = ".technic";

/// Resolved launcher root and the paths derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherPaths {
    root: PathBuf,
}

impl LauncherPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the root: explicit override, else `~/.technic`.
    ///
    /// Returns a warning when the home directory is unavailable and the
    /// current directory is used instead.
    pub fn resolve(override_dir: Option<&Path>) -> (Self, Option<String>) {
        if let Some(dir) = override_dir {
            return (Self::new(dir), None);
        }
        match try_launcher_dir() {
            Some(root) => (Self::new(root), None),
            None => (
                Self::new(LAUNCHER_DIR_NAME),
                Some(
                    "Could not determine home directory, using current directory for launcher data"
                        .to_string(),
                ),
            ),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join("settings.toml")
    }
}

/// Try to get `~/.technic`, returning None if home dir is unavailable
pub fn try_launcher_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(LAUNCHER_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_override() {
        let (paths, warning) = LauncherPaths::resolve(Some(Path::new("/opt/technic")));
        assert!(warning.is_none());
        assert_eq!(paths.root(), Path::new("/opt/technic"));
        assert_eq!(paths.logs_dir(), PathBuf::from("/opt/technic/logs"));
        assert_eq!(paths.settings_file(), PathBuf::from("/opt/technic/settings.toml"));
    }

    #[test]
    fn test_resolve_default_ends_with_dir_name() {
        let (paths, _) = LauncherPaths::resolve(None);
        assert!(paths.root().ends_with(LAUNCHER_DIR_NAME));
    }
}
