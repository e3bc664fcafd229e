//! Browser transport: `postMessage` to a peer window and `message` events from
//! the local window.

use gloo::events::EventListener;
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlIFrameElement, MessageEvent, Window};

use crate::error::{BridgeError, BridgeResult};
use crate::transport::{InboundHandler, InboundMessage, MessageSource, PeerWindow, SourceRegistration};
use crate::wire::WireMessage;

/// Peer window reached through `Window.postMessage`.
#[derive(Debug, Clone)]
pub struct WindowPeer {
    window: Window,
}

impl WindowPeer {
    /// Wrap an existing window handle.
    #[must_use]
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    /// Parent of the current window; the host page when running inside a frame.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::PeerUnavailable`] when the parent cannot be read.
    pub fn parent() -> BridgeResult<Self> {
        gloo::utils::window()
            .parent()
            .ok()
            .flatten()
            .map(Self::new)
            .ok_or(BridgeError::PeerUnavailable { peer: "parent" })
    }

    /// Content window of an embedded module frame.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::PeerUnavailable`] when the frame is not attached
    /// to a document yet.
    pub fn frame(frame: &HtmlIFrameElement) -> BridgeResult<Self> {
        frame
            .content_window()
            .map(Self::new)
            .ok_or(BridgeError::PeerUnavailable { peer: "frame" })
    }
}

impl PeerWindow for WindowPeer {
    fn post_message(&self, message: &WireMessage, target_origin: &str) -> BridgeResult<()> {
        let text = message.to_json()?;
        let value = js_sys::JSON::parse(&text).map_err(|err| post_error(message, &err))?;
        self.window
            .post_message(&value, target_origin)
            .map_err(|err| post_error(message, &err))
    }
}

fn post_error(message: &WireMessage, err: &JsValue) -> BridgeError {
    BridgeError::Post {
        event: message.event.clone(),
        detail: format!("{err:?}"),
    }
}

/// Local window `message` events.
#[derive(Debug, Clone)]
pub struct WindowSource {
    window: Window,
}

impl WindowSource {
    /// Listen on the current global window.
    #[must_use]
    pub fn current() -> Self {
        Self {
            window: gloo::utils::window(),
        }
    }
}

impl MessageSource for WindowSource {
    fn listen(&self, handler: InboundHandler) -> SourceRegistration {
        let listener = EventListener::new(&self.window, "message", move |event| {
            let Some(event) = event.dyn_ref::<MessageEvent>() else {
                return;
            };
            let Some(data) = to_json(&event.data()) else {
                return;
            };
            handler(InboundMessage {
                origin: event.origin(),
                data,
            });
        });
        SourceRegistration::new(move || drop(listener))
    }
}

fn to_json(value: &JsValue) -> Option<Value> {
    let text: String = js_sys::JSON::stringify(value).ok()?.into();
    serde_json::from_str(&text).ok()
}
