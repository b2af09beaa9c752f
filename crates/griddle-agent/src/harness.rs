//! Headless page harness
//!
//! An in-memory [`Page`] implementation plus small capability doubles.
//! The binary uses [`HeadlessPage`] to exercise a server endpoint without a
//! browser, and the test suites use the same types as fixtures.

use crate::page::{
    ConsoleLevel, DomNode, EvalFault, FetchFault, FetchOutcome, FetchRequest, Fetcher, InjectKind,
    Logger, Page, PageFault,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

type RasterFn = dyn Fn(&str, u32, u32) -> Result<Vec<u8>, PageFault> + Send + Sync;
type EvalFn = dyn Fn(&str) -> Result<Option<Value>, EvalFault> + Send + Sync;

/// An in-memory document: a flat node list, a stylesheet link list, and a
/// head the injection commands append to.
///
/// Selector support is deliberately minimal: a bare tag name (or `*`)
/// matches; anything else reports an invalid selector, which is exactly the
/// recoverable-failure path the dom-query handler needs to exercise.
pub struct HeadlessPage {
    url: String,
    user_agent: String,
    viewport: (u32, u32),
    state: Mutex<DocumentState>,
    raster: Option<Box<RasterFn>>,
    eval_backend: Option<Box<EvalFn>>,
}

#[derive(Default)]
struct DocumentState {
    stylesheets: Vec<String>,
    head: Vec<(InjectKind, String)>,
    nodes: Vec<DomNode>,
    reloads: u32,
}

impl HeadlessPage {
    /// Empty document at the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user_agent: format!("HeadlessGriddle/{}", env!("CARGO_PKG_VERSION")),
            viewport: (1280, 720),
            state: Mutex::new(DocumentState::default()),
            raster: None,
            eval_backend: None,
        }
    }

    /// Add a stylesheet link with the given href.
    pub fn with_stylesheet(self, href: impl Into<String>) -> Self {
        self.lock().stylesheets.push(href.into());
        self
    }

    /// Add a body node returned by matching queries.
    pub fn with_node(self, node: DomNode) -> Self {
        self.lock().nodes.push(node);
        self
    }

    /// Override the default viewport.
    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = (width, height);
        self
    }

    /// Install a raster backend. Without one, rasterization fails and
    /// screenshots take the best-effort empty-payload path.
    pub fn with_raster_backend<F>(mut self, raster: F) -> Self
    where
        F: Fn(&str, u32, u32) -> Result<Vec<u8>, PageFault> + Send + Sync + 'static,
    {
        self.raster = Some(Box::new(raster));
        self
    }

    /// Install an eval backend. Without one, a code body of the form
    /// `return <json>;` yields the parsed literal and anything else yields
    /// no value.
    pub fn with_eval_backend<F>(mut self, eval: F) -> Self
    where
        F: Fn(&str) -> Result<Option<Value>, EvalFault> + Send + Sync + 'static,
    {
        self.eval_backend = Some(Box::new(eval));
        self
    }

    /// How many times a command reloaded the page.
    pub fn reload_count(&self) -> u32 {
        self.lock().reloads
    }

    /// How many head elements of the given kind have been injected.
    pub fn head_count(&self, kind: InjectKind) -> usize {
        self.lock().head.iter().filter(|(k, _)| *k == kind).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DocumentState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Page for HeadlessPage {
    fn url(&self) -> String {
        self.url.clone()
    }

    fn user_agent(&self) -> String {
        self.user_agent.clone()
    }

    fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    fn reload(&self) {
        self.lock().reloads += 1;
    }

    fn stylesheet_links(&self) -> Vec<String> {
        self.lock().stylesheets.clone()
    }

    fn set_stylesheet_href(&self, index: usize, href: &str) {
        let mut state = self.lock();
        if let Some(slot) = state.stylesheets.get_mut(index) {
            *slot = href.to_string();
        }
    }

    fn append_head(&self, kind: InjectKind, source: &str) -> Result<(), PageFault> {
        self.lock().head.push((kind, source.to_string()));
        Ok(())
    }

    fn query_selector_all(&self, selector: &str) -> Result<Vec<DomNode>, PageFault> {
        let tag_like = !selector.is_empty()
            && selector.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if selector != "*" && !tag_like {
            return Err(PageFault::Selector(format!(
                "unsupported selector: {selector}"
            )));
        }
        let state = self.lock();
        Ok(state
            .nodes
            .iter()
            .filter(|n| selector == "*" || n.tag.eq_ignore_ascii_case(selector))
            .cloned()
            .collect())
    }

    fn serialize_document(&self) -> Result<String, PageFault> {
        let state = self.lock();
        let mut markup = String::from("<html><head>");
        for href in &state.stylesheets {
            markup.push_str(&format!(r#"<link rel="stylesheet" href="{href}">"#));
        }
        for (kind, source) in &state.head {
            match kind {
                InjectKind::Script => markup.push_str(&format!("<script>{source}</script>")),
                InjectKind::Style => markup.push_str(&format!("<style>{source}</style>")),
            }
        }
        markup.push_str("</head><body>");
        for node in &state.nodes {
            let tag = node.tag.to_lowercase();
            markup.push_str(&format!("<{tag}>{}</{tag}>", node.inner_html));
        }
        markup.push_str("</body></html>");
        Ok(markup)
    }

    async fn rasterize(&self, svg: &str, width: u32, height: u32) -> Result<Vec<u8>, PageFault> {
        match &self.raster {
            Some(raster) => raster(svg, width, height),
            None => Err(PageFault::Raster("headless page has no raster backend".into())),
        }
    }

    async fn eval(&self, code: &str) -> Result<Option<Value>, EvalFault> {
        if let Some(eval) = &self.eval_backend {
            return eval(code);
        }
        let literal = code
            .trim()
            .strip_prefix("return")
            .map(|rest| rest.trim().trim_end_matches(';').trim());
        match literal {
            Some(text) => Ok(serde_json::from_str(text).ok()),
            None => Ok(None),
        }
    }
}

/// Logger double that records every call.
#[derive(Default)]
pub struct RecordingLogger {
    calls: Mutex<Vec<(ConsoleLevel, Vec<String>)>>,
}

impl RecordingLogger {
    /// Everything logged so far.
    pub fn calls(&self) -> Vec<(ConsoleLevel, Vec<String>)> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: ConsoleLevel, args: &[String]) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((level, args.to_vec()));
    }
}

/// Fetcher double that settles every request the same scripted way.
pub struct ScriptedFetcher {
    result: Result<FetchOutcome, FetchFault>,
}

impl ScriptedFetcher {
    /// Always complete with the given status.
    pub fn ok(status: u16, status_text: impl Into<String>) -> Self {
        Self {
            result: Ok(FetchOutcome {
                status,
                status_text: status_text.into(),
            }),
        }
    }

    /// Always fail at the transport level with the given message.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            result: Err(FetchFault {
                message: message.into(),
            }),
        }
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, _request: &FetchRequest) -> Result<FetchOutcome, FetchFault> {
        self.result.clone()
    }
}
