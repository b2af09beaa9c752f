//! # Griddle Agent
//!
//! Development-time instrumentation agent that lives inside a page's
//! execution context and holds one persistent control channel to a Griddle
//! development server.
//!
//! The agent plays two roles:
//!
//! - **Telemetry uplink**: console output, uncaught errors, and network
//!   outcomes observed in the page are forwarded to the server as
//!   self-contained JSON frames. Telemetry is best-effort: when the channel
//!   is down, events are dropped, never queued.
//! - **Remote-control surface**: server-issued commands (reload, CSS
//!   hot-swap, script/style injection, screenshot, DOM query, eval) are
//!   decoded, executed against the page, and answered with correlated
//!   response frames.
//!
//! Instead of monkey-patching global bindings, the agent wraps explicit
//! capability interfaces ([`Logger`], [`Fetcher`], [`ErrorSink`], [`Page`])
//! registered once at startup; the host runtime routes its console, fetch,
//! and error traffic through the wrapped handles.

pub mod agent;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod handlers;
pub mod harness;
pub mod intercept;
pub mod page;
pub mod uplink;

pub use agent::Agent;
pub use config::AgentConfig;
pub use intercept::{InterceptedFetcher, InterceptedLogger, TelemetrySink};
pub use page::{
    ConsoleLevel, DomNode, ErrorSink, EvalFault, FetchFault, FetchOutcome, FetchRequest, Fetcher,
    InjectKind, Logger, Page, PageFault, ScriptFault,
};
pub use uplink::Uplink;
