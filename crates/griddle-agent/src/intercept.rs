//! Telemetry interception
//!
//! Wrappers around the page's capability interfaces. Each wrapper forwards a
//! structured record of what it observed to the uplink and then lets the
//! original behavior proceed unchanged: console output still reaches the real
//! console, fetch outcomes (including failures) still reach the caller
//! exactly as they would with no agent present.

use crate::page::{
    ConsoleLevel, ErrorSink, FetchFault, FetchOutcome, FetchRequest, Fetcher, Logger, ScriptFault,
};
use crate::uplink::Uplink;
use async_trait::async_trait;
use griddle_proto::TelemetryEvent;
use std::sync::Arc;
use std::time::Instant;

/// Console wrapper: mirrors warn/error output to the server, then delegates.
pub struct InterceptedLogger {
    inner: Arc<dyn Logger>,
    uplink: Uplink,
}

impl InterceptedLogger {
    /// Wrap the page's real logger.
    pub fn wrap(inner: Arc<dyn Logger>, uplink: Uplink) -> Arc<Self> {
        Arc::new(Self { inner, uplink })
    }
}

impl Logger for InterceptedLogger {
    fn log(&self, level: ConsoleLevel, args: &[String]) {
        self.uplink.send(&TelemetryEvent::Console {
            level,
            msg: args.join(" "),
        });
        self.inner.log(level, args);
    }
}

/// Fetch wrapper: times every request and reports its outcome.
///
/// Exactly one `net_request` event is emitted per call, plus one `net_error`
/// iff the outcome was not a success status. The resolved value or failure is
/// returned to the caller untouched.
pub struct InterceptedFetcher {
    inner: Arc<dyn Fetcher>,
    uplink: Uplink,
}

impl InterceptedFetcher {
    /// Wrap the page's real fetcher.
    pub fn wrap(inner: Arc<dyn Fetcher>, uplink: Uplink) -> Arc<Self> {
        Arc::new(Self { inner, uplink })
    }
}

#[async_trait]
impl Fetcher for InterceptedFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, FetchFault> {
        let started = Instant::now();
        let result = self.inner.fetch(request).await;
        let duration = started.elapsed().as_millis() as u64;

        match &result {
            Ok(outcome) => {
                self.uplink.send(&TelemetryEvent::NetRequest {
                    url: request.url.clone(),
                    method: request.method.clone(),
                    status: outcome.status,
                    duration,
                });
                if !outcome.is_success() {
                    self.uplink.send(&TelemetryEvent::NetError {
                        url: request.url.clone(),
                        method: request.method.clone(),
                        status: outcome.status,
                        error: outcome.status_text.clone(),
                    });
                }
            }
            Err(fault) => {
                self.uplink.send(&TelemetryEvent::NetRequest {
                    url: request.url.clone(),
                    method: request.method.clone(),
                    status: 0,
                    duration,
                });
                self.uplink.send(&TelemetryEvent::NetError {
                    url: request.url.clone(),
                    method: request.method.clone(),
                    status: 0,
                    error: fault.message.clone(),
                });
            }
        }

        result
    }
}

/// Error-sink implementation that mirrors page faults to the server.
///
/// Observation only: the host runtime calls this in addition to, never
/// instead of, its normal fault propagation.
pub struct TelemetrySink {
    uplink: Uplink,
}

impl TelemetrySink {
    /// Build a sink forwarding over the given uplink.
    pub fn new(uplink: Uplink) -> Arc<Self> {
        Arc::new(Self { uplink })
    }
}

impl ErrorSink for TelemetrySink {
    fn uncaught(&self, fault: &ScriptFault) {
        self.uplink.send(&TelemetryEvent::JsError {
            msg: fault.message.clone(),
            src: fault.source.clone(),
            line: fault.line,
            col: fault.column,
            stack: fault.stack.clone(),
        });
    }

    fn unhandled_rejection(&self, reason: &str, stack: &str) {
        self.uplink.send(&TelemetryEvent::JsError {
            msg: reason.to_string(),
            src: String::new(),
            line: 0,
            col: 0,
            stack: stack.to_string(),
        });
    }
}
