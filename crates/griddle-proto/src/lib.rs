//! # Griddle Protocol
//!
//! Wire contract for the Griddle control channel: the single WebSocket
//! connection an in-page agent holds to its development server at `/__lr`.
//!
//! The two directions use different encodings and both are defined here:
//!
//! - Client → server frames are JSON text frames with a `kind` discriminator:
//!   telemetry ([`TelemetryEvent`]) and command responses ([`ResponseFrame`]).
//! - Server → client frames are raw prefix-matched text, decoded into the
//!   typed [`Command`] enum.
//!
//! This crate is pure data and parsing; it performs no I/O.

#![warn(missing_docs)]

/// Telemetry frames sent from the page to the server
pub mod telemetry;

/// Inbound command frames and their prefix decoder
pub mod command;

/// Correlated command-response frames
pub mod response;

/// Error types for protocol operations
pub mod error;

pub use command::Command;
pub use error::ProtocolError;
pub use response::ResponseFrame;
pub use telemetry::{ConsoleLevel, TelemetryEvent};

/// Well-known control-channel path on the page's own host.
pub const CHANNEL_PATH: &str = "/__lr";

/// Query parameter appended to hot-swapped stylesheet hrefs as a cache buster.
pub const CACHE_BUSTER_PARAM: &str = "_lr";
