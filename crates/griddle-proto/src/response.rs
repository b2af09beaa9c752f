//! Command-response frames: page → server results
//!
//! Responses are JSON text frames like telemetry, discriminated by `kind`.
//!
//! Wire quirk, preserved for compatibility: on the wire the request id is
//! carried under the field name `url` and the payload under `msg`, because
//! the server's frame reader reuses one envelope for every inbound frame.
//! The quirk lives entirely in the serde renames below; internal code only
//! ever sees `request_id` and `payload`.

use crate::ProtocolError;
use serde::{Deserialize, Serialize};

/// One correlated result for a command that carried a request id.
///
/// Sent exactly once per command, never retried. Responses may leave the page
/// out of order relative to their commands; the echoed id is the only
/// correlation mechanism.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseFrame {
    /// Result of a screenshot command
    ScreenshotResponse {
        /// Echoed correlation id (field `url` on the wire)
        #[serde(rename = "url")]
        request_id: String,
        /// Base64-encoded PNG, empty when capture failed
        #[serde(rename = "msg")]
        payload: String,
    },

    /// Result of a dom-query command
    DomResponse {
        /// Echoed correlation id (field `url` on the wire)
        #[serde(rename = "url")]
        request_id: String,
        /// JSON array of matched elements, or a JSON error object, as text
        #[serde(rename = "msg")]
        payload: String,
    },

    /// Result of an eval command
    EvalResponse {
        /// Echoed correlation id (field `url` on the wire)
        #[serde(rename = "url")]
        request_id: String,
        /// JSON-serialized result, `"undefined"`, or a JSON error object
        #[serde(rename = "msg")]
        payload: String,
    },
}

impl ResponseFrame {
    /// Build a screenshot response.
    pub fn screenshot(request_id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::ScreenshotResponse {
            request_id: request_id.into(),
            payload: payload.into(),
        }
    }

    /// Build a dom-query response.
    pub fn dom(request_id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::DomResponse {
            request_id: request_id.into(),
            payload: payload.into(),
        }
    }

    /// Build an eval response.
    pub fn eval(request_id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::EvalResponse {
            request_id: request_id.into(),
            payload: payload.into(),
        }
    }

    /// Echoed correlation id.
    pub fn request_id(&self) -> &str {
        match self {
            Self::ScreenshotResponse { request_id, .. }
            | Self::DomResponse { request_id, .. }
            | Self::EvalResponse { request_id, .. } => request_id,
        }
    }

    /// Serialize to the JSON text-frame form sent over the channel.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}
