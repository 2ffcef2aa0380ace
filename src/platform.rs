//! Host capabilities used by the intent resolver
//!
//! - [`Connectivity`]: whether the network is reachable
//! - [`UrlOpener`]: open a URL in the user's browser
//! - [`Clock`]: render the current local time

use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::DEFAULT_TIME_FORMAT;
use crate::{Error, Result};

/// Network reachability check
#[async_trait]
pub trait Connectivity: Send + Sync {
    /// Whether the network is currently reachable
    async fn is_online(&self) -> bool;
}

/// Probes reachability by opening a TCP connection
pub struct NetworkProbe {
    addr: String,
    timeout: Duration,
}

impl NetworkProbe {
    /// Probe `addr` (`host:port`) with the given timeout
    #[must_use]
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Connectivity for NetworkProbe {
    async fn is_online(&self) -> bool {
        match tokio::time::timeout(self.timeout, tokio::net::TcpStream::connect(&self.addr)).await
        {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!(addr = %self.addr, error = %e, "connectivity probe failed");
                false
            }
            Err(_) => {
                tracing::debug!(addr = %self.addr, "connectivity probe timed out");
                false
            }
        }
    }
}

/// Opens URLs in a new browser tab or window
pub trait UrlOpener: Send + Sync {
    /// Open `url`
    ///
    /// # Errors
    ///
    /// Returns error if the browser cannot be launched
    fn open(&self, url: &str) -> Result<()>;
}

/// Opens URLs with the desktop's default handler
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl UrlOpener for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        let mut cmd = if cfg!(target_os = "macos") {
            std::process::Command::new("open")
        } else if cfg!(target_os = "windows") {
            let mut cmd = std::process::Command::new("cmd");
            cmd.args(["/C", "start", ""]);
            cmd
        } else {
            std::process::Command::new("xdg-open")
        };

        cmd.arg(url)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| Error::Browser(format!("failed to open {url}: {e}")))?;

        tracing::debug!(url, "opened in browser");
        Ok(())
    }
}

/// Source of the current local time, already formatted
pub trait Clock: Send + Sync {
    /// Current local time rendered for speech
    fn now(&self) -> String;
}

/// Local wall clock formatted with a chrono pattern
#[derive(Debug, Clone)]
pub struct SystemClock {
    format: String,
}

impl SystemClock {
    /// Create a clock using a chrono format string
    #[must_use]
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> String {
        let now = chrono::Local::now();
        let mut rendered = String::new();
        if write!(rendered, "{}", now.format(&self.format)).is_err() {
            tracing::warn!(format = %self.format, "invalid time format, using default");
            rendered = now.format(DEFAULT_TIME_FORMAT).to_string();
        }
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_formats() {
        let clock = SystemClock::new("%H");
        let hour: u32 = clock.now().parse().unwrap();
        assert!(hour < 24);
    }

    #[test]
    fn test_invalid_format_falls_back() {
        let clock = SystemClock::new("%Q");
        assert!(!clock.now().is_empty());
    }

    #[tokio::test]
    async fn test_probe_reachable_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let probe = NetworkProbe::new(addr.to_string(), Duration::from_secs(1));
        assert!(probe.is_online().await);
    }

    #[tokio::test]
    async fn test_probe_closed_port() {
        let addr = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let probe = NetworkProbe::new(addr.to_string(), Duration::from_secs(1));
        assert!(!probe.is_online().await);
    }
}
