//! Capability interfaces the agent wraps and drives
//!
//! These traits are the statically-typed stand-in for what a dynamic runtime
//! would do by mutating global bindings: the host registers its real console,
//! fetch, and error plumbing behind [`Logger`], [`Fetcher`], and
//! [`ErrorSink`], and exposes its document surface behind [`Page`]. The agent
//! only ever talks to these abstractions.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

pub use griddle_proto::ConsoleLevel;

/// The page's own console. Implementations must not forward anywhere; the
/// agent's [`crate::InterceptedLogger`] wrapper does that.
pub trait Logger: Send + Sync {
    /// Emit one console call. Arguments arrive unjoined, exactly as the page
    /// code passed them.
    fn log(&self, level: ConsoleLevel, args: &[String]);
}

/// An outbound request as seen at the fetch boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Request URL
    pub url: String,
    /// HTTP method
    pub method: String,
}

impl FetchRequest {
    /// Convenience constructor; method defaults are the caller's concern.
    pub fn new(url: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
        }
    }
}

/// Outcome of a request that completed at the HTTP level (any status).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// HTTP status code
    pub status: u16,
    /// Status text as reported by the transport
    pub status_text: String,
}

impl FetchOutcome {
    /// Whether the status is in the success range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A request that failed before any HTTP status was received.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct FetchFault {
    /// Transport failure message
    pub message: String,
}

/// The page's outbound request capability.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform one request and await its settlement.
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, FetchFault>;
}

/// An uncaught synchronous script failure as observed by the host runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFault {
    /// Error message
    pub message: String,
    /// Source URL of the failing script
    pub source: String,
    /// Line number
    pub line: u32,
    /// Column number
    pub column: u32,
    /// Stack trace, empty when unavailable
    pub stack: String,
}

/// Sink for page faults the host runtime could not catch. The agent's
/// [`crate::TelemetrySink`] implementation mirrors each fault to the server;
/// it never suppresses the fault's normal propagation through the page.
pub trait ErrorSink: Send + Sync {
    /// An uncaught synchronous error.
    fn uncaught(&self, fault: &ScriptFault);

    /// An unhandled asynchronous rejection. Rejections carry no source
    /// position, only the reason and whatever stack it offers.
    fn unhandled_rejection(&self, reason: &str, stack: &str);
}

/// What gets appended to the document head by an injection command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectKind {
    /// A script element
    Script,
    /// A style element
    Style,
}

/// One element matched by a DOM query, untruncated. Caps and truncation are
/// applied by the command handler, not the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomNode {
    /// Tag name, any case
    pub tag: String,
    /// Full text content
    pub text: String,
    /// All attributes as a flat mapping
    pub attributes: BTreeMap<String, String>,
    /// Full inner markup
    pub inner_html: String,
}

/// Recoverable page-operation failures surfaced to command handlers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PageFault {
    /// The selector could not be parsed or evaluated
    #[error("invalid selector: {0}")]
    Selector(String),

    /// The document could not be serialized
    #[error("document serialization failed: {0}")]
    Serialize(String),

    /// Rasterization failed or is unavailable
    #[error("raster failed: {0}")]
    Raster(String),

    /// Appending to the document head failed
    #[error("injection failed: {0}")]
    Inject(String),
}

/// A failure thrown by evaluated code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct EvalFault {
    /// Error message
    pub message: String,
    /// Stack trace, empty when unavailable
    pub stack: String,
}

/// The document surface the command handlers drive.
///
/// Everything here is synchronous except the two genuinely asynchronous
/// operations: rasterization (image decode) and eval (the implementation
/// wraps the code body in an asynchronous function and awaits it).
#[async_trait]
pub trait Page: Send + Sync {
    /// Current page URL.
    fn url(&self) -> String;

    /// User-agent string of the hosting runtime.
    fn user_agent(&self) -> String;

    /// Viewport dimensions in CSS pixels.
    fn viewport(&self) -> (u32, u32);

    /// Reload the page. Terminal for the current page context.
    fn reload(&self);

    /// Hrefs of all stylesheet link elements, in document order.
    fn stylesheet_links(&self) -> Vec<String>;

    /// Rewrite the href of the stylesheet link at `index` (document order).
    /// Out-of-range indexes are ignored.
    fn set_stylesheet_href(&self, index: usize, href: &str);

    /// Append a script or style element with the given source, verbatim, to
    /// the document head.
    fn append_head(&self, kind: InjectKind, source: &str) -> Result<(), PageFault>;

    /// Evaluate a selector against the document and return every match.
    fn query_selector_all(&self, selector: &str) -> Result<Vec<DomNode>, PageFault>;

    /// Serialize the full current document to markup.
    fn serialize_document(&self) -> Result<String, PageFault>;

    /// Rasterize an SVG document onto a canvas of the given dimensions and
    /// return the PNG encoding.
    async fn rasterize(&self, svg: &str, width: u32, height: u32) -> Result<Vec<u8>, PageFault>;

    /// Execute a code body wrapped in an asynchronous function. `Ok(None)`
    /// means the code completed with no value (undefined).
    async fn eval(&self, code: &str) -> Result<Option<Value>, EvalFault>;
}
