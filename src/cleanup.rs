//! Removal of artifacts left behind by earlier launcher versions

use std::path::Path;

/// Paths relative to the launcher root that earlier versions left behind
pub const LEGACY_ARTIFACTS: &[&str] = &[
    "temp.jar",
    "temp.exe",
    "Spoutcraft-Launcher.jar",
    "mc.patch",
    "config/libraries.yml",
    "config/spoutcraft.yml",
    "config/minecraft.yml",
];

/// Delete every legacy artifact under `root`.
///
/// Each deletion is independent; missing files and failures are ignored.
/// Returns the number of files actually removed.
pub fn remove_legacy_artifacts(root: &Path) -> usize {
    LEGACY_ARTIFACTS
        .iter()
        .filter(|relative| std::fs::remove_file(root.join(relative)).is_ok())
        .count()
}
