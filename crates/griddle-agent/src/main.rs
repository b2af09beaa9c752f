//! Griddle headless driver
//!
//! Connects a stub page to a running Griddle endpoint so the wire contract
//! can be exercised without a browser: identity on connect, telemetry for
//! scripted console output, and live handling of every inbound command.

use anyhow::Result;
use griddle_agent::harness::{HeadlessPage, RecordingLogger};
use griddle_agent::{Agent, AgentConfig, ConsoleLevel, DomNode, Logger};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let host = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8080".to_string());
    let config = AgentConfig::new(&host);
    info!(url = %config.channel_url(), "starting headless agent");

    let page = Arc::new(
        HeadlessPage::new(format!("http://{host}/"))
            .with_stylesheet("/app.css")
            .with_node(DomNode {
                tag: "div".into(),
                text: "headless driver".into(),
                attributes: BTreeMap::from([("id".to_string(), "root".to_string())]),
                inner_html: "<p>headless driver</p>".into(),
            }),
    );

    let agent = Agent::new(config, page);

    // Exercise the telemetry path once the channel is up
    let logger = agent.wrap_logger(Arc::new(RecordingLogger::default()));
    let uplink = agent.uplink();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(10)).await;
            if uplink.is_attached() {
                logger.log(ConsoleLevel::Warn, &["headless driver heartbeat".into()]);
            }
        }
    });

    agent.run().await;
    Ok(())
}
