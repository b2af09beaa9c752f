//! Best-effort sender for the control channel
//!
//! The uplink is the one piece of state shared between the connection
//! supervisor and every interception point. It holds the write half of the
//! current connection, or nothing. Sends while nothing is attached are
//! dropped outright: never queued, never an error to the caller, so an
//! intercepted console call or fetch can never fail because the channel is
//! down.

use griddle_proto::{ProtocolError, ResponseFrame, TelemetryEvent};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::trace;

/// Cloneable handle to the current connection's write half, if any.
#[derive(Clone, Default)]
pub struct Uplink {
    slot: Arc<Mutex<Option<mpsc::UnboundedSender<String>>>>,
}

impl Uplink {
    /// Create a detached uplink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the write half of a freshly opened connection, superseding any
    /// previous one.
    pub(crate) fn attach(&self, tx: mpsc::UnboundedSender<String>) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(tx);
    }

    /// Drop the write half. Subsequent sends are discarded until the next
    /// [`attach`](Self::attach).
    pub(crate) fn detach(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    /// Whether a connection write half is currently installed.
    pub fn is_attached(&self) -> bool {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.is_some()
    }

    /// Send one telemetry event, best-effort.
    pub fn send(&self, event: &TelemetryEvent) {
        self.send_serialized(event.to_json());
    }

    /// Send one command response, best-effort.
    pub fn send_response(&self, frame: &ResponseFrame) {
        self.send_serialized(frame.to_json());
    }

    fn send_serialized(&self, json: Result<String, ProtocolError>) {
        let Ok(text) = json else {
            // Serialization of our own frame types cannot realistically
            // fail; treat it like any other dropped send if it does.
            trace!("dropping unserializable frame");
            return;
        };
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        match slot.as_ref() {
            // The receiver may already be gone mid-teardown; that is the
            // same "channel down" case and drops the frame the same way.
            Some(tx) => {
                let _ = tx.send(text);
            }
            None => trace!("channel down, dropping frame"),
        }
    }
}
