//! Launcher build identity

use std::fmt;

/// Build id baked in at compile time, e.g. `LAUNCHER_BUILD=312 cargo build`
pub const BUILD_RESOURCE: Option<&str> = option_env!("LAUNCHER_BUILD");

/// Numeric launcher build, or the unknown-build sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherBuild {
    Known(u32),
    Unknown,
}

impl LauncherBuild {
    /// Parse a build resource; missing or non-numeric text yields `Unknown`
    pub fn from_resource(resource: Option<&str>) -> Self {
        resource
            .and_then(|text| text.trim().parse().ok())
            .map_or(LauncherBuild::Unknown, LauncherBuild::Known)
    }

    pub fn id(&self) -> Option<u32> {
        match self {
            LauncherBuild::Known(id) => Some(*id),
            LauncherBuild::Unknown => None,
        }
    }
}

impl fmt::Display for LauncherBuild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LauncherBuild::Known(id) => write!(f, "{}", id),
            LauncherBuild::Unknown => write!(f, "unknown build"),
        }
    }
}
