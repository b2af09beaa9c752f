//! Connection lifecycle
//!
//! One supervisor task owns the control channel for the life of the page:
//! it connects, announces the page's identity, pumps inbound frames into the
//! dispatcher, and on any disconnect waits out the fixed delay before the
//! next attempt. Because a single task owns both the socket and the delay,
//! at most one live socket and one pending reconnect exist at any time.

use crate::config::AgentConfig;
use crate::dispatch::Dispatcher;
use crate::page::Page;
use crate::uplink::Uplink;
use futures_util::{SinkExt, StreamExt};
use griddle_proto::TelemetryEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::connect_async;
use tracing::{debug, info};

/// Supervise the channel forever. Ends only when the future is dropped,
/// which is the page-unload case: no shutdown handshake is owed to anyone.
pub(crate) async fn maintain(
    config: AgentConfig,
    page: Arc<dyn Page>,
    uplink: Uplink,
    dispatcher: Arc<Dispatcher>,
) {
    let url = config.channel_url();
    loop {
        match serve_connection(&url, &page, &uplink, &dispatcher).await {
            Ok(()) => debug!("control channel closed"),
            Err(err) => debug!(%err, "control channel error"),
        }
        tokio::time::sleep(config.reconnect_delay).await;
    }
}

/// Run one connection from open to close. The error path and the clean-close
/// path converge here so reconnect scheduling has a single owner.
async fn serve_connection(
    url: &str,
    page: &Arc<dyn Page>,
    uplink: &Uplink,
    dispatcher: &Arc<Dispatcher>,
) -> Result<(), WsError> {
    let (stream, _) = connect_async(url).await?;
    info!(url, "control channel open");
    let (mut sink, mut reader) = stream.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // Identity goes out first, before any other traffic on this connection.
    // It is queued straight into the writer channel while the uplink is
    // still detached, so telemetry racing in from other threads cannot get
    // ahead of it; until attach below, those frames are dropped as usual.
    let (vw, vh) = page.viewport();
    let identity = TelemetryEvent::Connect {
        url: page.url(),
        ua: page.user_agent(),
        vw,
        vh,
    };
    if let Ok(text) = identity.to_json() {
        let _ = tx.send(text);
    }
    uplink.attach(tx);

    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let result = loop {
        match reader.next().await {
            Some(Ok(Message::Text(frame))) => dispatcher.dispatch(&frame),
            Some(Ok(Message::Close(_))) | None => break Ok(()),
            // Ping/pong/binary are transport housekeeping, not protocol
            Some(Ok(_)) => {}
            Some(Err(err)) => break Err(err),
        }
    };

    // Detach before tearing down the writer so interception points go back
    // to dropping frames instead of queueing into a dead task.
    uplink.detach();
    writer.abort();
    let _ = writer.await;
    result
}
