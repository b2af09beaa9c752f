//! Command dispatch
//!
//! Decodes each inbound text frame into one [`Command`] and routes it to its
//! handler. Synchronous commands run inline; the asynchronous ones
//! (screenshot, dom-query, eval) are spawned so a slow capture or a hung
//! eval never stalls the read loop, which is also why responses may leave
//! the page out of order relative to their commands.

use crate::handlers;
use crate::page::{InjectKind, Page};
use crate::uplink::Uplink;
use griddle_proto::Command;
use std::sync::Arc;
use tracing::trace;

/// Routes decoded commands to their handlers.
pub struct Dispatcher {
    page: Arc<dyn Page>,
    uplink: Uplink,
}

impl Dispatcher {
    /// Build a dispatcher driving the given page and answering over the
    /// given uplink.
    pub fn new(page: Arc<dyn Page>, uplink: Uplink) -> Self {
        Self { page, uplink }
    }

    /// Handle one inbound text frame. Unrecognized frames are ignored.
    pub fn dispatch(&self, frame: &str) {
        let Some(command) = Command::decode(frame) else {
            trace!(frame, "ignoring unrecognized frame");
            return;
        };

        match command {
            Command::Reload => self.page.reload(),
            Command::CssSwap { path } => handlers::swap_css(&*self.page, &path),
            Command::InjectScript { source } => {
                handlers::inject(&*self.page, InjectKind::Script, &source)
            }
            Command::InjectStyle { source } => {
                handlers::inject(&*self.page, InjectKind::Style, &source)
            }
            Command::Screenshot {
                request_id,
                width,
                height,
            } => {
                tokio::spawn(handlers::screenshot(
                    self.page.clone(),
                    self.uplink.clone(),
                    request_id,
                    width,
                    height,
                ));
            }
            Command::DomQuery {
                request_id,
                selector,
            } => {
                tokio::spawn(handlers::dom_query(
                    self.page.clone(),
                    self.uplink.clone(),
                    request_id,
                    selector,
                ));
            }
            Command::Eval { request_id, code } => {
                tokio::spawn(handlers::eval(
                    self.page.clone(),
                    self.uplink.clone(),
                    request_id,
                    code,
                ));
            }
        }
    }
}
