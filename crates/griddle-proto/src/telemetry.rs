//! Telemetry frames: page → server observations
//!
//! Every variant maps to one JSON text frame with a `kind` discriminator.
//! Telemetry is fire-and-forget: events are constructed at the interception
//! point, serialized, and sent immediately. Nothing is buffered or retried;
//! if the channel is down the event is dropped.

use crate::ProtocolError;
use serde::{Deserialize, Serialize};

/// Console severity mirrored over the control channel.
///
/// Only `warn` and `error` output is intercepted; informational logging stays
/// local to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    /// `console.warn` equivalent
    Warn,
    /// `console.error` equivalent
    Error,
}

/// One observation reported from the page to the server.
///
/// An HTTP status of `0` in the network variants means the request failed at
/// the transport level before any status was received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// Page identity, sent once per connection before any other traffic
    Connect {
        /// Current page URL
        url: String,
        /// User-agent string of the hosting runtime
        ua: String,
        /// Viewport width in CSS pixels
        vw: u32,
        /// Viewport height in CSS pixels
        vh: u32,
    },

    /// Intercepted console output
    Console {
        /// Severity of the original call
        level: ConsoleLevel,
        /// Space-joined string of all arguments
        msg: String,
    },

    /// Uncaught script error or unhandled rejection
    JsError {
        /// Error message
        msg: String,
        /// Source URL, empty for rejections
        src: String,
        /// Line number, 0 for rejections
        line: u32,
        /// Column number, 0 for rejections
        col: u32,
        /// Stack trace, empty when unavailable
        stack: String,
    },

    /// A request that completed with a non-success status or failed outright
    NetError {
        /// Request URL
        url: String,
        /// HTTP method
        method: String,
        /// HTTP status, 0 on transport failure
        status: u16,
        /// Status text or transport failure message
        error: String,
    },

    /// Outcome of every intercepted request, success or not
    NetRequest {
        /// Request URL
        url: String,
        /// HTTP method
        method: String,
        /// HTTP status, 0 on transport failure
        status: u16,
        /// Elapsed wall time in whole milliseconds
        duration: u64,
    },
}

impl TelemetryEvent {
    /// Serialize to the JSON text-frame form sent over the channel.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}
