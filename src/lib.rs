//! Technic Launcher - application bootstrap and diagnostic logging
//!
//! This library sets up the launcher process: it captures all process output
//! into a date-rotating log file, decides whether the process must relaunch
//! itself, and hands off to the launcher UI.

pub mod bootstrap;
pub mod build_info;
pub mod cleanup;
pub mod console;
pub mod lifecycle;
pub mod logging;
pub mod params;
pub mod paths;
pub mod proxy;
pub mod settings;
