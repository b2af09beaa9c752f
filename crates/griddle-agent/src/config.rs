//! Agent configuration

use griddle_proto::CHANNEL_PATH;
use std::time::Duration;

/// Delay before a reconnect attempt after the channel drops.
///
/// Fixed, with no backoff and no jitter, for compatibility with existing
/// endpoints that expect prompt reconnects. Many pages reconnecting against
/// a restarting server will herd; that tradeoff is deliberate.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(1000);

/// Connection settings for the control channel.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Host (and optional port) the page itself was served from
    pub host: String,
    /// Whether the page was loaded over a secure transport (wss vs ws)
    pub secure: bool,
    /// Control-channel path, `/__lr` unless an endpoint says otherwise
    pub path: String,
    /// Delay between a disconnect and the next connection attempt
    pub reconnect_delay: Duration,
}

impl AgentConfig {
    /// Configuration for a page served from the given host, insecure scheme.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            secure: false,
            path: CHANNEL_PATH.to_string(),
            reconnect_delay: RECONNECT_DELAY,
        }
    }

    /// Derive host and scheme from the page's own URL, the way an in-page
    /// agent would: secure channel iff the page is on a secure transport.
    pub fn from_page_url(page_url: &str) -> Self {
        let (secure, rest) = if let Some(rest) = page_url.strip_prefix("https://") {
            (true, rest)
        } else if let Some(rest) = page_url.strip_prefix("http://") {
            (false, rest)
        } else {
            (false, page_url)
        };
        let host = rest
            .split(['/', '?', '#'])
            .next()
            .unwrap_or(rest)
            .to_string();
        Self {
            secure,
            ..Self::new(host)
        }
    }

    /// Use the secure scheme.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Override the reconnect delay. Endpoints expect the fixed default;
    /// shorter delays are for tests.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Full control-channel URL.
    pub fn channel_url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}{}", scheme, self.host, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_url_schemes() {
        assert_eq!(
            AgentConfig::new("localhost:8080").channel_url(),
            "ws://localhost:8080/__lr"
        );
        assert_eq!(
            AgentConfig::new("example.dev").with_secure(true).channel_url(),
            "wss://example.dev/__lr"
        );
    }

    #[test]
    fn test_from_page_url() {
        let insecure = AgentConfig::from_page_url("http://localhost:3000/app/index.html?x=1");
        assert_eq!(insecure.host, "localhost:3000");
        assert!(!insecure.secure);

        let secure = AgentConfig::from_page_url("https://dev.example.com/");
        assert_eq!(secure.host, "dev.example.com");
        assert!(secure.secure);
        assert_eq!(secure.channel_url(), "wss://dev.example.com/__lr");
    }

    #[test]
    fn test_default_reconnect_delay_is_fixed_second() {
        let config = AgentConfig::new("localhost");
        assert_eq!(config.reconnect_delay, Duration::from_millis(1000));
    }
}
