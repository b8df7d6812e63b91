//! HTTP proxy configuration
//!
//! Startup parameters override persisted settings field by field. Applying the
//! configuration exports the conventional proxy environment variables, which
//! the download code and any child processes pick up.

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::params::StartupParameters;
use crate::settings::Settings;

const DEFAULT_PROXY_PORT: u16 = 8080;

/// Everything except the unreserved URL characters
const USERINFO: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn encode_userinfo(text: &str) -> String {
    utf8_percent_encode(text, USERINFO).to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub pass: Option<String>,
}

impl ProxyConfig {
    pub fn resolve(params: &StartupParameters, settings: &Settings) -> Self {
        Self {
            host: params.proxy_host.clone().or_else(|| settings.proxy_host.clone()),
            port: params.proxy_port.or(settings.proxy_port),
            user: params.proxy_user.clone().or_else(|| settings.proxy_username.clone()),
            pass: params.proxy_pass.clone().or_else(|| settings.proxy_password.clone()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.host.as_deref().map_or(false, |h| !h.trim().is_empty())
    }

    /// Proxy URL including credentials, if a host is configured
    pub fn url(&self) -> Option<String> {
        let host = self.host.as_deref().filter(|h| !h.trim().is_empty())?;
        let port = self.port.unwrap_or(DEFAULT_PROXY_PORT);
        let credentials = match (&self.user, &self.pass) {
            (Some(user), Some(pass)) => {
                format!("{}:{}@", encode_userinfo(user), encode_userinfo(pass))
            }
            (Some(user), None) => format!("{}@", encode_userinfo(user)),
            _ => String::new(),
        };
        Some(format!("http://{}{}:{}", credentials, host, port))
    }

    /// Export `http_proxy`/`https_proxy`. No-op without a host.
    pub fn apply(&self) -> bool {
        let Some(url) = self.url() else {
            return false;
        };
        for var in ["http_proxy", "https_proxy", "HTTP_PROXY", "HTTPS_PROXY"] {
            std::env::set_var(var, &url);
        }
        true
    }
}

impl fmt::Display for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.host.as_deref() {
            Some(host) if self.is_configured() => {
                write!(f, "{}:{}", host, self.port.unwrap_or(DEFAULT_PROXY_PORT))?;
                if let Some(user) = &self.user {
                    write!(f, " as {}", user)?;
                }
                Ok(())
            }
            _ => write!(f, "none"),
        }
    }
}
