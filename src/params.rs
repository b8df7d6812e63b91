//! Startup parameters
//!
//! Parsed from the process arguments with clap. Parsing never aborts startup:
//! on a clap error the raw arguments are scanned for the flags we understand
//! and the partially-populated record is used instead.

use std::fmt;
use std::path::PathBuf;

use clap::Parser;

use crate::logging::Logger;

/// Technic Launcher
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "technic-launcher")]
#[command(about = "Technic Launcher - modpack launcher bootstrap")]
pub struct StartupParameters {
    /// Show the launcher console
    #[arg(long)]
    pub console: bool,

    /// Debug mode: keep output on the terminal instead of the log bridge
    #[arg(long)]
    pub debug: bool,

    /// Launcher root directory (default: ~/.technic)
    #[arg(long, value_name = "PATH")]
    pub launcher_dir: Option<PathBuf>,

    #[arg(long)]
    pub proxy_host: Option<String>,

    #[arg(long)]
    pub proxy_port: Option<u16>,

    #[arg(long)]
    pub proxy_user: Option<String>,

    #[arg(long)]
    pub proxy_pass: Option<String>,

    /// Set by a previous instance that replaced itself with this one
    #[arg(long)]
    pub relaunched: bool,
}

/// Result of lenient parsing
#[derive(Debug, Clone)]
pub struct ParsedParameters {
    pub params: StartupParameters,
    /// Parse error text, if clap rejected the arguments
    pub error: Option<String>,
}

impl StartupParameters {
    pub fn is_console(&self) -> bool {
        self.console
    }

    pub fn is_debug_mode(&self) -> bool {
        self.debug
    }

    /// Parse `args` (including the program name), falling back to a
    /// best-effort scan on failure.
    pub fn parse_lenient<I, T>(args: I) -> ParsedParameters
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        match Self::try_parse_from(&args) {
            Ok(params) => ParsedParameters { params, error: None },
            Err(e) => ParsedParameters {
                params: Self::scan(&args),
                error: Some(e.to_string().trim_end().to_string()),
            },
        }
    }

    /// Pick out the flags we recognize, ignoring everything else
    fn scan(args: &[String]) -> Self {
        let mut params = Self::default();
        let mut iter = args.iter().skip(1);
        while let Some(arg) = iter.next() {
            let (name, inline) = match arg.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (arg.as_str(), None),
            };
            let mut value = || inline.clone().or_else(|| iter.next().cloned());
            match name {
                "--console" => params.console = true,
                "--debug" => params.debug = true,
                "--relaunched" => params.relaunched = true,
                "--launcher-dir" => params.launcher_dir = value().map(PathBuf::from),
                "--proxy-host" => params.proxy_host = value(),
                "--proxy-port" => params.proxy_port = value().and_then(|v| v.parse().ok()),
                "--proxy-user" => params.proxy_user = value(),
                "--proxy-pass" => params.proxy_pass = value(),
                _ => {}
            }
        }
        params
    }

    /// Record the parameters in the log, password redacted
    pub fn log_parameters(&self, logger: &Logger) {
        logger.info(format!("Startup parameters: {}", self));
    }
}

impl fmt::Display for StartupParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "console={} debug={} relaunched={}",
            self.console, self.debug, self.relaunched
        )?;
        if let Some(dir) = &self.launcher_dir {
            write!(f, " launcher_dir={}", dir.display())?;
        }
        if let Some(host) = &self.proxy_host {
            write!(f, " proxy_host={}", host)?;
        }
        if let Some(port) = self.proxy_port {
            write!(f, " proxy_port={}", port)?;
        }
        if let Some(user) = &self.proxy_user {
            write!(f, " proxy_user={}", user)?;
        }
        if self.proxy_pass.is_some() {
            write!(f, " proxy_pass=****")?;
        }
        Ok(())
    }
}
