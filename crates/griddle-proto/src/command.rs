//! Inbound command frames
//!
//! Server → client frames are raw text, not JSON, matched by prefix. The
//! decoder turns one frame into one typed [`Command`] so everything past this
//! point dispatches on a clean discriminated type instead of string slicing.

/// A server-issued command decoded from one inbound text frame.
///
/// Variants that carry a `request_id` must echo it verbatim in their response
/// frame; the id is an opaque token the agent never generates or validates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Full page reload
    Reload,

    /// Hot-swap the stylesheet at the given path without a reload
    CssSwap {
        /// Stylesheet path to match against link hrefs
        path: String,
    },

    /// Append a script element with the given source to the document head
    InjectScript {
        /// Script source, used verbatim
        source: String,
    },

    /// Append a style element with the given source to the document head
    InjectStyle {
        /// Style source, used verbatim
        source: String,
    },

    /// Capture the current document as a PNG
    Screenshot {
        /// Correlation id echoed in the response
        request_id: String,
        /// Capture width, falling back to the viewport width when absent
        width: Option<u32>,
        /// Capture height, falling back to the viewport height when absent
        height: Option<u32>,
    },

    /// Run a selector against the document and return matched elements
    DomQuery {
        /// Correlation id echoed in the response
        request_id: String,
        /// Selector text, may itself contain colons
        selector: String,
    },

    /// Evaluate arbitrary code in the page and return the result
    Eval {
        /// Correlation id echoed in the response
        request_id: String,
        /// Code body, may itself contain colons
        code: String,
    },
}

impl Command {
    /// Decode one inbound text frame.
    ///
    /// Prefixes are checked in precedence order; the first match wins. An
    /// unrecognized frame decodes to `None` and is ignored by the dispatcher.
    pub fn decode(frame: &str) -> Option<Self> {
        if frame == "reload" {
            return Some(Self::Reload);
        }
        if let Some(path) = frame.strip_prefix("css:") {
            return Some(Self::CssSwap { path: path.to_string() });
        }
        if let Some(source) = frame.strip_prefix("inject:js:") {
            return Some(Self::InjectScript { source: source.to_string() });
        }
        if let Some(source) = frame.strip_prefix("inject:css:") {
            return Some(Self::InjectStyle { source: source.to_string() });
        }
        if let Some(rest) = frame.strip_prefix("screenshot:") {
            return Some(Self::decode_screenshot(rest));
        }
        if let Some(rest) = frame.strip_prefix("dom_query:") {
            let (request_id, selector) = split_correlated(rest);
            return Some(Self::DomQuery {
                request_id,
                selector,
            });
        }
        if let Some(rest) = frame.strip_prefix("eval:") {
            let (request_id, code) = split_correlated(rest);
            return Some(Self::Eval { request_id, code });
        }
        None
    }

    /// Remainder form is `<id>:<width>x<height>`; dimensions that are absent
    /// or non-numeric decode as `None` and resolve against the viewport.
    fn decode_screenshot(rest: &str) -> Self {
        let (request_id, dims) = split_correlated(rest);
        let (width, height) = match dims.split_once('x') {
            Some((w, h)) => (w.parse().ok(), h.parse().ok()),
            None => (None, None),
        };
        Self::Screenshot {
            request_id,
            width,
            height,
        }
    }

    /// Correlation id carried by this command, if any.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Screenshot { request_id, .. }
            | Self::DomQuery { request_id, .. }
            | Self::Eval { request_id, .. } => Some(request_id),
            _ => None,
        }
    }
}

/// Split `<id>:<payload>` at the first colon after the id. The payload keeps
/// any further colons intact; a missing colon yields an empty payload.
fn split_correlated(rest: &str) -> (String, String) {
    match rest.split_once(':') {
        Some((id, payload)) => (id.to_string(), payload.to_string()),
        None => (rest.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_reload() {
        assert_eq!(Command::decode("reload"), Some(Command::Reload));
        // The literal must match exactly, not as a prefix
        assert_eq!(Command::decode("reload:now"), None);
    }

    #[test]
    fn test_decode_css_swap() {
        assert_eq!(
            Command::decode("css:styles/app.css"),
            Some(Command::CssSwap {
                path: "styles/app.css".into()
            })
        );
    }

    #[test]
    fn test_decode_injections() {
        assert_eq!(
            Command::decode("inject:js:console.log(1)"),
            Some(Command::InjectScript {
                source: "console.log(1)".into()
            })
        );
        assert_eq!(
            Command::decode("inject:css:body{color:red}"),
            Some(Command::InjectStyle {
                source: "body{color:red}".into()
            })
        );
    }

    #[test]
    fn test_decode_screenshot_with_dimensions() {
        assert_eq!(
            Command::decode("screenshot:req-1:800x600"),
            Some(Command::Screenshot {
                request_id: "req-1".into(),
                width: Some(800),
                height: Some(600),
            })
        );
    }

    #[test]
    fn test_decode_screenshot_defaults_on_missing_or_bad_dimensions() {
        assert_eq!(
            Command::decode("screenshot:req-2"),
            Some(Command::Screenshot {
                request_id: "req-2".into(),
                width: None,
                height: None,
            })
        );
        assert_eq!(
            Command::decode("screenshot:req-3:axb"),
            Some(Command::Screenshot {
                request_id: "req-3".into(),
                width: None,
                height: None,
            })
        );
        // One good dimension does not rescue the other
        assert_eq!(
            Command::decode("screenshot:req-4:800xtall"),
            Some(Command::Screenshot {
                request_id: "req-4".into(),
                width: Some(800),
                height: None,
            })
        );
    }

    #[test]
    fn test_decode_dom_query_keeps_colons_in_selector() {
        assert_eq!(
            Command::decode("dom_query:id7:div:nth-child(2)"),
            Some(Command::DomQuery {
                request_id: "id7".into(),
                selector: "div:nth-child(2)".into(),
            })
        );
    }

    #[test]
    fn test_decode_eval_keeps_colons_in_code() {
        assert_eq!(
            Command::decode("eval:id9:return location.href + ':suffix';"),
            Some(Command::Eval {
                request_id: "id9".into(),
                code: "return location.href + ':suffix';".into(),
            })
        );
    }

    #[test]
    fn test_decode_correlated_without_payload() {
        assert_eq!(
            Command::decode("eval:lonely"),
            Some(Command::Eval {
                request_id: "lonely".into(),
                code: String::new(),
            })
        );
    }

    #[test]
    fn test_unrecognized_frames_decode_to_none() {
        assert_eq!(Command::decode(""), None);
        assert_eq!(Command::decode("ping"), None);
        assert_eq!(Command::decode("css-swap:app.css"), None);
        assert_eq!(Command::decode("{\"kind\":\"connect\"}"), None);
    }

    #[test]
    fn test_request_id_accessor() {
        assert_eq!(Command::decode("reload").unwrap().request_id(), None);
        assert_eq!(
            Command::decode("dom_query:abc:p").unwrap().request_id(),
            Some("abc")
        );
    }

    proptest! {
        #[test]
        fn test_decode_never_panics(frame in ".*") {
            let _ = Command::decode(&frame);
        }

        #[test]
        fn test_correlated_payload_survives_decode(
            id in "[a-z0-9-]{1,16}",
            payload in "[^:][\\PC]*"
        ) {
            let decoded = Command::decode(&format!("eval:{}:{}", id, payload)).unwrap();
            prop_assert_eq!(decoded, Command::Eval {
                request_id: id,
                code: payload,
            });
        }
    }
}
