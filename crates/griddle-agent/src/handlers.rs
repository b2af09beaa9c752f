//! Command handlers
//!
//! One function per command variant. Handlers for correlated commands send
//! exactly one response frame and report their own failures inside that
//! frame; nothing here ever propagates an error back into the dispatch loop.

use crate::page::{DomNode, InjectKind, Page, PageFault};
use crate::uplink::Uplink;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use griddle_proto::{ResponseFrame, CACHE_BUSTER_PARAM};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Most elements a dom-query response will carry.
pub const DOM_QUERY_LIMIT: usize = 200;
/// Longest text content reported per element, in characters.
pub const DOM_TEXT_LIMIT: usize = 500;
/// Longest inner markup reported per element, in characters.
pub const DOM_MARKUP_LIMIT: usize = 1000;

/// Hot-swap every stylesheet link matching `path`; reload when none does.
///
/// A link matches when its href with the query string stripped equals the
/// path, equals `/` + path, or ends with `/` + path. Matched hrefs get a
/// cache-busting query parameter set to the current timestamp. The reload
/// fallback guarantees the requested style change always becomes visible,
/// even when path matching fails.
pub(crate) fn swap_css(page: &dyn Page, path: &str) {
    let slash_path = format!("/{path}");
    let buster = unix_millis();
    let mut found = false;

    for (index, href) in page.stylesheet_links().iter().enumerate() {
        let clean = href.split('?').next().unwrap_or(href);
        if clean == path || clean == slash_path || clean.ends_with(&slash_path) {
            page.set_stylesheet_href(
                index,
                &format!("{clean}?{CACHE_BUSTER_PARAM}={buster}"),
            );
            found = true;
        }
    }

    if !found {
        debug!(path, "no stylesheet link matched, falling back to reload");
        page.reload();
    }
}

/// Append a script or style element to the document head. Failures are
/// logged and swallowed so the dispatcher keeps serving later commands.
pub(crate) fn inject(page: &dyn Page, kind: InjectKind, source: &str) {
    if let Err(fault) = page.append_head(kind, source) {
        warn!(%fault, "head injection failed");
    }
}

/// Capture the document as a base64 PNG and respond.
///
/// Best-effort by contract: any failure in the serialize → SVG → raster →
/// encode pipeline produces an empty payload, not an error response.
pub(crate) async fn screenshot(
    page: Arc<dyn Page>,
    uplink: Uplink,
    request_id: String,
    width: Option<u32>,
    height: Option<u32>,
) {
    let (vw, vh) = page.viewport();
    let width = width.unwrap_or(vw);
    let height = height.unwrap_or(vh);

    let payload = match capture(&*page, width, height).await {
        Ok(encoded) => encoded,
        Err(fault) => {
            debug!(%fault, "screenshot capture failed, responding empty");
            String::new()
        }
    };
    uplink.send_response(&ResponseFrame::screenshot(request_id, payload));
}

async fn capture(page: &dyn Page, width: u32, height: u32) -> Result<String, PageFault> {
    let markup = page.serialize_document()?;
    let svg = foreign_object_svg(&markup, width, height);
    let png = page.rasterize(&svg, width, height).await?;
    Ok(BASE64.encode(png))
}

/// Wrap serialized document markup as a foreignObject inside an SVG document
/// of the capture dimensions, ready for rasterization.
fn foreign_object_svg(markup: &str, width: u32, height: u32) -> String {
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}">"#,
            r#"<foreignObject width="100%" height="100%">{m}</foreignObject></svg>"#
        ),
        w = width,
        h = height,
        m = markup,
    )
}

/// Run a selector and respond with a JSON array of matched elements.
///
/// A bad selector is a recoverable per-request failure: the response payload
/// becomes a JSON error object instead of the array.
pub(crate) async fn dom_query(
    page: Arc<dyn Page>,
    uplink: Uplink,
    request_id: String,
    selector: String,
) {
    let payload = match page.query_selector_all(&selector) {
        Ok(nodes) => {
            let records: Vec<Value> = nodes
                .into_iter()
                .take(DOM_QUERY_LIMIT)
                .map(node_record)
                .collect();
            serialize_payload(&Value::Array(records))
        }
        Err(fault) => error_object(&fault.to_string(), ""),
    };
    uplink.send_response(&ResponseFrame::dom(request_id, payload));
}

fn node_record(node: DomNode) -> Value {
    json!({
        "tag": node.tag.to_lowercase(),
        "text": truncate_chars(&node.text, DOM_TEXT_LIMIT),
        "attributes": node.attributes,
        "html": truncate_chars(&node.inner_html, DOM_MARKUP_LIMIT),
    })
}

/// Evaluate a code body and respond with the JSON-serialized result.
///
/// No value (undefined) responds with the literal text `undefined`; a thrown
/// failure responds with a JSON object carrying the message and stack.
pub(crate) async fn eval(page: Arc<dyn Page>, uplink: Uplink, request_id: String, code: String) {
    let payload = match page.eval(&code).await {
        Ok(Some(value)) => {
            let text = serialize_payload(&value);
            if text.is_empty() {
                "undefined".to_string()
            } else {
                text
            }
        }
        Ok(None) => "undefined".to_string(),
        Err(fault) => error_object(&fault.message, &fault.stack),
    };
    uplink.send_response(&ResponseFrame::eval(request_id, payload));
}

fn serialize_payload(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| error_object(&e.to_string(), ""))
}

fn error_object(message: &str, stack: &str) -> String {
    if stack.is_empty() {
        json!({ "error": message }).to_string()
    } else {
        json!({ "error": message, "stack": stack }).to_string()
    }
}

/// Character-boundary-safe truncation.
fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::HeadlessPage;
    use crate::page::EvalFault;
    use std::collections::BTreeMap;
    use tokio::sync::mpsc;

    fn attached_uplink() -> (Uplink, mpsc::UnboundedReceiver<String>) {
        let uplink = Uplink::new();
        let (tx, rx) = mpsc::unbounded_channel();
        uplink.attach(tx);
        (uplink, rx)
    }

    fn recv_frame(rx: &mut mpsc::UnboundedReceiver<String>) -> serde_json::Value {
        serde_json::from_str(&rx.try_recv().unwrap()).unwrap()
    }

    #[test]
    fn test_swap_css_rewrites_matching_links() {
        let page = HeadlessPage::new("http://localhost:8080/")
            .with_stylesheet("/app.css")
            .with_stylesheet("/vendor/reset.css")
            .with_stylesheet("https://cdn.example.com/theme/app.css?v=3");

        swap_css(&page, "app.css");

        let links = page.stylesheet_links();
        // Exact root match and the suffix match are both rewritten
        assert!(links[0].starts_with("/app.css?_lr="));
        assert_eq!(links[1], "/vendor/reset.css");
        assert!(links[2].starts_with("https://cdn.example.com/theme/app.css?_lr="));
        assert_eq!(page.reload_count(), 0);
    }

    #[test]
    fn test_swap_css_strips_old_query_before_busting() {
        let page = HeadlessPage::new("http://localhost:8080/").with_stylesheet("/app.css?_lr=1");
        swap_css(&page, "app.css");
        let href = &page.stylesheet_links()[0];
        assert!(href.starts_with("/app.css?_lr="));
        assert_eq!(href.matches('?').count(), 1);
    }

    #[test]
    fn test_swap_css_falls_back_to_reload() {
        let page = HeadlessPage::new("http://localhost:8080/").with_stylesheet("/app.css");
        swap_css(&page, "missing.css");
        assert_eq!(page.stylesheet_links()[0], "/app.css");
        assert_eq!(page.reload_count(), 1);
    }

    #[test]
    fn test_inject_appends_every_call_without_dedup() {
        let page = HeadlessPage::new("http://localhost:8080/");
        inject(&page, InjectKind::Style, "body{background:teal}");
        inject(&page, InjectKind::Style, "body{background:teal}");
        inject(&page, InjectKind::Script, "console.log(1)");
        assert_eq!(page.head_count(InjectKind::Style), 2);
        assert_eq!(page.head_count(InjectKind::Script), 1);
    }

    #[tokio::test]
    async fn test_screenshot_failure_responds_empty() {
        // The headless page has no raster backend, so the pipeline fails
        let page = Arc::new(HeadlessPage::new("http://localhost:8080/"));
        let (uplink, mut rx) = attached_uplink();

        screenshot(page, uplink, "shot-1".into(), Some(320), Some(240)).await;

        let frame = recv_frame(&mut rx);
        assert_eq!(frame["kind"], "screenshot_response");
        assert_eq!(frame["url"], "shot-1");
        assert_eq!(frame["msg"], "");
    }

    #[tokio::test]
    async fn test_screenshot_success_encodes_png_base64() {
        let page = Arc::new(
            HeadlessPage::new("http://localhost:8080/").with_raster_backend(|svg, w, h| {
                assert!(svg.contains("<foreignObject"));
                assert!(svg.contains(r#"width="320""#));
                Ok(vec![w as u8, h as u8, 0x89])
            }),
        );
        let (uplink, mut rx) = attached_uplink();

        screenshot(page, uplink, "shot-2".into(), Some(320), Some(240)).await;

        let frame = recv_frame(&mut rx);
        assert_eq!(frame["url"], "shot-2");
        let bytes = BASE64.decode(frame["msg"].as_str().unwrap()).unwrap();
        assert_eq!(bytes, vec![64, 240, 0x89]);
    }

    #[tokio::test]
    async fn test_screenshot_defaults_to_viewport_dimensions() {
        let page = Arc::new(
            HeadlessPage::new("http://localhost:8080/")
                .with_viewport(1024, 768)
                .with_raster_backend(|_, w, h| {
                    assert_eq!((w, h), (1024, 768));
                    Ok(vec![1])
                }),
        );
        let (uplink, mut rx) = attached_uplink();

        screenshot(page, uplink, "shot-3".into(), None, None).await;
        assert_eq!(recv_frame(&mut rx)["url"], "shot-3");
    }

    #[tokio::test]
    async fn test_dom_query_caps_at_limit() {
        let mut page = HeadlessPage::new("http://localhost:8080/");
        for i in 0..205 {
            page = page.with_node(DomNode {
                tag: "DIV".into(),
                text: format!("node {i}"),
                attributes: BTreeMap::new(),
                inner_html: String::new(),
            });
        }
        let (uplink, mut rx) = attached_uplink();

        dom_query(Arc::new(page), uplink, "q1".into(), "div".into()).await;

        let frame = recv_frame(&mut rx);
        assert_eq!(frame["kind"], "dom_response");
        let records: Vec<Value> =
            serde_json::from_str(frame["msg"].as_str().unwrap()).unwrap();
        assert_eq!(records.len(), DOM_QUERY_LIMIT);
        assert_eq!(records[0]["tag"], "div");
    }

    #[tokio::test]
    async fn test_dom_query_truncates_text_and_markup() {
        let page = HeadlessPage::new("http://localhost:8080/").with_node(DomNode {
            tag: "pre".into(),
            text: "x".repeat(2000),
            attributes: BTreeMap::from([("id".to_string(), "big".to_string())]),
            inner_html: "y".repeat(2000),
        });
        let (uplink, mut rx) = attached_uplink();

        dom_query(Arc::new(page), uplink, "q2".into(), "pre".into()).await;

        let frame = recv_frame(&mut rx);
        let records: Vec<Value> =
            serde_json::from_str(frame["msg"].as_str().unwrap()).unwrap();
        assert_eq!(records[0]["text"].as_str().unwrap().len(), DOM_TEXT_LIMIT);
        assert_eq!(records[0]["html"].as_str().unwrap().len(), DOM_MARKUP_LIMIT);
        assert_eq!(records[0]["attributes"]["id"], "big");
    }

    #[tokio::test]
    async fn test_dom_query_bad_selector_responds_error_object() {
        let page = Arc::new(HeadlessPage::new("http://localhost:8080/"));
        let (uplink, mut rx) = attached_uplink();

        dom_query(page, uplink, "q3".into(), "!!".into()).await;

        let frame = recv_frame(&mut rx);
        assert_eq!(frame["url"], "q3");
        let payload: Value = serde_json::from_str(frame["msg"].as_str().unwrap()).unwrap();
        assert!(!payload["error"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_eval_serializes_result() {
        let page = Arc::new(
            HeadlessPage::new("http://localhost:8080/")
                .with_eval_backend(|code| {
                    assert_eq!(code, "return 1+1;");
                    Ok(Some(json!(2)))
                }),
        );
        let (uplink, mut rx) = attached_uplink();

        eval(page, uplink, "e1".into(), "return 1+1;".into()).await;

        let frame = recv_frame(&mut rx);
        assert_eq!(frame["kind"], "eval_response");
        assert_eq!(frame["msg"], "2");
    }

    #[tokio::test]
    async fn test_eval_undefined_sentinel() {
        let page = Arc::new(
            HeadlessPage::new("http://localhost:8080/").with_eval_backend(|_| Ok(None)),
        );
        let (uplink, mut rx) = attached_uplink();

        eval(page, uplink, "e2".into(), "void 0;".into()).await;
        assert_eq!(recv_frame(&mut rx)["msg"], "undefined");
    }

    #[tokio::test]
    async fn test_eval_failure_responds_error_object_with_stack() {
        let page = Arc::new(HeadlessPage::new("http://localhost:8080/").with_eval_backend(
            |_| {
                Err(EvalFault {
                    message: "boom".into(),
                    stack: "at <anonymous>:1:1".into(),
                })
            },
        ));
        let (uplink, mut rx) = attached_uplink();

        eval(page, uplink, "e3".into(), "throw new Error('boom');".into()).await;

        let frame = recv_frame(&mut rx);
        let payload: Value = serde_json::from_str(frame["msg"].as_str().unwrap()).unwrap();
        assert_eq!(payload["error"], "boom");
        assert_eq!(payload["stack"], "at <anonymous>:1:1");
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("ab", 10), "ab");
    }
}
