//! Agent assembly
//!
//! Ties the pieces together: one uplink shared by every interception point,
//! one dispatcher driving the page, one connection supervisor. The agent has
//! two states, disconnected and connected, and the supervisor moves between
//! them for the life of the page.

use crate::config::AgentConfig;
use crate::connection;
use crate::dispatch::Dispatcher;
use crate::intercept::{InterceptedFetcher, InterceptedLogger, TelemetrySink};
use crate::page::{Fetcher, Logger, Page};
use crate::uplink::Uplink;
use std::sync::Arc;

/// The in-page development agent.
///
/// Construction wires the dispatcher and uplink; interception wrappers are
/// handed out from here so they all share the same channel; [`run`](Self::run)
/// starts the connection supervisor and never returns. Drop the future to
/// end the agent, the way page unload would.
pub struct Agent {
    config: AgentConfig,
    page: Arc<dyn Page>,
    uplink: Uplink,
    dispatcher: Arc<Dispatcher>,
}

impl Agent {
    /// Build an agent for the given page. No connection is attempted until
    /// [`run`](Self::run).
    pub fn new(config: AgentConfig, page: Arc<dyn Page>) -> Self {
        let uplink = Uplink::new();
        let dispatcher = Arc::new(Dispatcher::new(page.clone(), uplink.clone()));
        Self {
            config,
            page,
            uplink,
            dispatcher,
        }
    }

    /// Handle to the best-effort telemetry channel.
    pub fn uplink(&self) -> Uplink {
        self.uplink.clone()
    }

    /// Wrap the page's console so warn/error output is mirrored upstream.
    /// Register once at startup; the host routes console calls through the
    /// returned handle.
    pub fn wrap_logger(&self, inner: Arc<dyn Logger>) -> Arc<InterceptedLogger> {
        InterceptedLogger::wrap(inner, self.uplink.clone())
    }

    /// Wrap the page's fetch capability so every request outcome is reported.
    pub fn wrap_fetcher(&self, inner: Arc<dyn Fetcher>) -> Arc<InterceptedFetcher> {
        InterceptedFetcher::wrap(inner, self.uplink.clone())
    }

    /// Sink for uncaught errors and unhandled rejections.
    pub fn error_sink(&self) -> Arc<TelemetrySink> {
        TelemetrySink::new(self.uplink.clone())
    }

    /// Run the connection supervisor until the future is dropped.
    pub async fn run(self) {
        connection::maintain(self.config, self.page, self.uplink, self.dispatcher).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{HeadlessPage, RecordingLogger};
    use crate::page::ConsoleLevel;

    #[tokio::test]
    async fn test_agent_starts_disconnected() {
        let agent = Agent::new(
            AgentConfig::new("localhost:9"),
            Arc::new(HeadlessPage::new("http://localhost:9/")),
        );
        assert!(!agent.uplink().is_attached());
    }

    #[tokio::test]
    async fn test_wrappers_share_the_agent_uplink() {
        let agent = Agent::new(
            AgentConfig::new("localhost:9"),
            Arc::new(HeadlessPage::new("http://localhost:9/")),
        );
        let logger = agent.wrap_logger(Arc::new(RecordingLogger::default()));

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        agent.uplink().attach(tx);

        logger.log(ConsoleLevel::Warn, &["shared".into()]);
        assert!(rx.try_recv().unwrap().contains("shared"));
    }
}
