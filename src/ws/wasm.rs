//! WASM WebSocket client using `web-sys::WebSocket`.
//!
//! - `web-sys::WebSocket` + `wasm-bindgen` closures
//! - The [`WsHandler`] runs inside the socket callbacks; its frames are sent
//!   straight back on the same socket
//! - Frames sent while connecting are queued and flushed on open
//! - Callback-based event system (`on_event: impl Fn(WsEvent)`)
//! - No reconnect: once closed, `connect()` must be called again

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, ErrorEvent, MessageEvent, WebSocket};

use crate::error::WsError;
use crate::ws::{parse_message, MessageOut, ReadyState, WsConfig, WsEvent, WsHandler};

const CLIENT_DISCONNECT_REASON: &str = "Client disconnect";

struct Callbacks {
    _onopen: Closure<dyn FnMut()>,
    _onmessage: Closure<dyn FnMut(MessageEvent)>,
    _onerror: Closure<dyn FnMut(ErrorEvent)>,
    _onclose: Closure<dyn FnMut(CloseEvent)>,
}

#[derive(Default)]
struct Inner {
    ws: Option<WebSocket>,
    callbacks: Option<Callbacks>,
    pending_messages: Vec<MessageOut>,
    on_event: Option<Box<dyn Fn(WsEvent)>>,
}

/// WASM WebSocket client.
///
/// State is shared with the socket callbacks through `Rc<RefCell<_>>`
/// (WASM is single-threaded). Consumers observe events either through a
/// [`WsHandler`] or an `on_event` callback.
pub struct WsClient {
    config: WsConfig,
    handler: Option<Arc<dyn WsHandler>>,
    inner: Rc<RefCell<Inner>>,
}

impl WsClient {
    pub fn new(config: WsConfig) -> Self {
        Self {
            config,
            handler: None,
            inner: Rc::new(RefCell::new(Inner::default())),
        }
    }

    pub fn with_handler(config: WsConfig, handler: Arc<dyn WsHandler>) -> Self {
        let mut client = Self::new(config);
        client.handler = Some(handler);
        client
    }

    /// Register a callback that receives every event after the handler.
    pub fn on_event(&self, f: impl Fn(WsEvent) + 'static) {
        self.inner.borrow_mut().on_event = Some(Box::new(f));
    }

    /// Open the socket. No-op while connecting or open.
    pub fn connect(&mut self) -> Result<(), WsError> {
        match self.ready_state() {
            ReadyState::Open | ReadyState::Connecting => return Ok(()),
            ReadyState::Closing | ReadyState::Closed => {}
        }
        self.detach();

        tracing::info!("Connecting to {}", self.config.url);
        let ws = WebSocket::new(&self.config.url).map_err(|e| {
            let reason = extract_js_error(&e);
            tracing::error!("Failed to create WebSocket: {}", reason);
            WsError::ConnectionFailed(reason)
        })?;

        let callbacks = self.attach(&ws);
        let mut inner = self.inner.borrow_mut();
        inner.ws = Some(ws);
        inner.callbacks = Some(callbacks);
        Ok(())
    }

    /// Close the socket with code 1000.
    ///
    /// Callbacks are detached first, so the close is reported here rather
    /// than from `onclose`.
    pub fn disconnect(&mut self) {
        let Some(ws) = self.detach() else {
            return;
        };
        if let Err(e) = ws.close_with_code_and_reason(1000, CLIENT_DISCONNECT_REASON) {
            tracing::warn!("Close failed: {}", extract_js_error(&e));
        }
        dispatch(
            &self.inner,
            self.handler.as_deref(),
            WsEvent::Disconnected {
                code: Some(1000),
                reason: CLIENT_DISCONNECT_REASON.into(),
            },
        );
    }

    /// Send a frame, queueing it while the socket is still opening.
    pub fn send(&self, msg: MessageOut) -> Result<(), WsError> {
        match self.ready_state() {
            ReadyState::Open => {
                let ws = self.inner.borrow().ws.clone().ok_or(WsError::NotConnected)?;
                send_msg(&ws, &msg)
            }
            ReadyState::Connecting => {
                self.inner.borrow_mut().pending_messages.push(msg);
                Ok(())
            }
            ReadyState::Closing | ReadyState::Closed => Err(WsError::NotConnected),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.ready_state() == ReadyState::Open
    }

    pub fn ready_state(&self) -> ReadyState {
        match self.inner.borrow().ws.as_ref() {
            Some(w) => ReadyState::from(w.ready_state()),
            None => ReadyState::Closed,
        }
    }

    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────────────────

    /// Unhook the current socket, if any, and return it.
    fn detach(&self) -> Option<WebSocket> {
        let mut inner = self.inner.borrow_mut();
        inner.callbacks = None;
        inner.pending_messages.clear();
        let ws = inner.ws.take()?;
        ws.set_onopen(None);
        ws.set_onmessage(None);
        ws.set_onerror(None);
        ws.set_onclose(None);
        Some(ws)
    }

    fn attach(&self, ws: &WebSocket) -> Callbacks {
        let onopen = {
            let inner = Rc::downgrade(&self.inner);
            let handler = self.handler.clone();
            let ws = ws.clone();
            Closure::<dyn FnMut()>::new(move || {
                tracing::info!("WebSocket opened");
                let Some(inner) = inner.upgrade() else { return };
                let frames = dispatch(&inner, handler.as_deref(), WsEvent::Connected);
                send_all(&ws, &frames);
                let pending = std::mem::take(&mut inner.borrow_mut().pending_messages);
                if !pending.is_empty() {
                    tracing::info!("Flushing {} pending message(s)", pending.len());
                    send_all(&ws, &pending);
                }
            })
        };
        ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));

        let onmessage = {
            let inner = Rc::downgrade(&self.inner);
            let handler = self.handler.clone();
            let ws = ws.clone();
            Closure::<dyn FnMut(_)>::new(move |e: MessageEvent| {
                let Ok(txt) = e.data().dyn_into::<js_sys::JsString>() else {
                    return;
                };
                let txt: String = txt.into();
                let event = match parse_message(&txt) {
                    Ok(kind) => WsEvent::Message(kind),
                    Err(err) => {
                        tracing::warn!("WS deserialization error: {} (raw: {})", err, txt);
                        WsEvent::Error(err.to_string())
                    }
                };
                let Some(inner) = inner.upgrade() else { return };
                let frames = dispatch(&inner, handler.as_deref(), event);
                send_all(&ws, &frames);
            })
        };
        ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));

        let onerror = {
            let inner = Rc::downgrade(&self.inner);
            let handler = self.handler.clone();
            Closure::<dyn FnMut(_)>::new(move |e: ErrorEvent| {
                let msg = extract_js_error(&e.error());
                tracing::error!("WebSocket error: {}", msg);
                if let Some(inner) = inner.upgrade() {
                    dispatch(&inner, handler.as_deref(), WsEvent::ConnectionFailed(msg));
                }
            })
        };
        ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));

        let onclose = {
            let weak: Weak<RefCell<Inner>> = Rc::downgrade(&self.inner);
            let handler = self.handler.clone();
            Closure::<dyn FnMut(_)>::new(move |e: CloseEvent| {
                let code = e.code();
                let reason = e.reason();
                tracing::info!("WebSocket closed: code={}, reason={}", code, reason);
                if let Some(inner) = weak.upgrade() {
                    dispatch(
                        &inner,
                        handler.as_deref(),
                        WsEvent::Disconnected {
                            code: Some(code),
                            reason,
                        },
                    );
                }
            })
        };
        ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));

        Callbacks {
            _onopen: onopen,
            _onmessage: onmessage,
            _onerror: onerror,
            _onclose: onclose,
        }
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        if let Some(ws) = self.detach() {
            let _ = ws.close();
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Handler first, then the `on_event` callback. Returns the handler's frames.
fn dispatch(
    inner: &Rc<RefCell<Inner>>,
    handler: Option<&dyn WsHandler>,
    event: WsEvent,
) -> Vec<MessageOut> {
    let frames = handler.map(|h| h.on_event(&event)).unwrap_or_default();
    // The callback is taken out while it runs so it may call back into the client.
    let callback = inner.borrow_mut().on_event.take();
    if let Some(f) = callback {
        f(event);
        let mut inner = inner.borrow_mut();
        if inner.on_event.is_none() {
            inner.on_event = Some(f);
        }
    }
    frames
}

fn send_msg(ws: &WebSocket, msg: &MessageOut) -> Result<(), WsError> {
    let json = msg.to_json()?;
    tracing::debug!("WS send: {}", json);
    ws.send_with_str(&json)
        .map_err(|e| WsError::SendFailed(extract_js_error(&e)))
}

fn send_all(ws: &WebSocket, frames: &[MessageOut]) {
    for frame in frames {
        if let Err(e) = send_msg(ws, frame) {
            tracing::warn!("Send failed: {}", e);
        }
    }
}

fn extract_js_error(err: &JsValue) -> String {
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        let name = error.name().as_string().unwrap_or_else(|| "Error".to_string());
        let message = error.message().as_string().unwrap_or_default();
        return if message.is_empty() {
            name
        } else {
            format!("{}: {}", name, message)
        };
    }

    if let Some(s) = err.as_string().filter(|s| !s.is_empty()) {
        return s;
    }

    if let Ok(json_str) = js_sys::JSON::stringify(err) {
        if let Some(s) = json_str.as_string() {
            if !s.is_empty() && s != "null" && s != "undefined" {
                return s;
            }
        }
    }

    "Unknown WebSocket error".to_string()
}
