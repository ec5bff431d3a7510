//! Native WebSocket client: `tokio-tungstenite`.
//!
//! - Background tokio task per connection, owning the socket
//! - Commands in over an mpsc channel, events out over another
//! - An optional [`WsHandler`] sees every event inside the task and may
//!   answer with frames, which go out before the next frame is read
//! - No reconnect: once closed, `connect()` must be called again

use std::pin::Pin;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream, Stream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::WsError;
use crate::ws::{parse_message, MessageOut, ReadyState, WsConfig, WsEvent, WsHandler};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

const COMMAND_BUFFER: usize = 64;
const CLIENT_DISCONNECT_REASON: &str = "Client disconnect";

// ─── Commands from public API to background task ─────────────────────────────

enum Command {
    Send(MessageOut),
    Disconnect,
}

// ─── Background task state ───────────────────────────────────────────────────

struct TaskState {
    config: WsConfig,
    handler: Option<Arc<dyn WsHandler>>,
    event_tx: mpsc::Sender<WsEvent>,
    cmd_rx: mpsc::Receiver<Command>,
    /// Frames sent while the socket was still opening.
    pending_messages: Vec<MessageOut>,
    ready_state: Arc<AtomicU16>,
}

impl TaskState {
    fn set_state(&self, state: ReadyState) {
        self.ready_state.store(state as u16, Ordering::SeqCst);
    }

    /// Run the handler, then publish the event. Returns the handler's frames.
    fn deliver(&self, event: WsEvent) -> Vec<MessageOut> {
        let frames = self
            .handler
            .as_ref()
            .map(|h| h.on_event(&event))
            .unwrap_or_default();
        self.emit(event);
        frames
    }

    fn emit(&self, event: WsEvent) {
        if let Err(mpsc::error::TrySendError::Full(event)) = self.event_tx.try_send(event) {
            tracing::debug!("Event buffer full, dropping {:?}", event);
        }
    }

    /// Final event of a connection: state is Closed before anyone hears of it,
    /// the handler included.
    fn finish(&self, event: WsEvent) {
        self.set_state(ReadyState::Closed);
        if let Some(h) = &self.handler {
            h.on_event(&event);
        }
        self.emit(event);
    }
}

// ─── Public WsClient ─────────────────────────────────────────────────────────

/// Native WebSocket client using `tokio-tungstenite`.
///
/// Uses a background tokio task for connection management.
/// The public API communicates with it via mpsc channels.
pub struct WsClient {
    config: WsConfig,
    handler: Option<Arc<dyn WsHandler>>,
    cmd_tx: Option<mpsc::Sender<Command>>,
    event_rx: tokio::sync::Mutex<mpsc::Receiver<WsEvent>>,
    event_tx: mpsc::Sender<WsEvent>,
    task_handle: Option<JoinHandle<()>>,
    ready_state: Arc<AtomicU16>,
}

impl WsClient {
    /// Create a new WS client. Does not connect yet.
    pub fn new(config: WsConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer.max(1));
        Self {
            config,
            handler: None,
            cmd_tx: None,
            event_rx: tokio::sync::Mutex::new(event_rx),
            event_tx,
            task_handle: None,
            ready_state: Arc::new(AtomicU16::new(ReadyState::Closed as u16)),
        }
    }

    /// Create a client whose events are first passed to `handler`.
    pub fn with_handler(config: WsConfig, handler: Arc<dyn WsHandler>) -> Self {
        let mut client = Self::new(config);
        client.handler = Some(handler);
        client
    }

    /// Open the socket in a background task.
    ///
    /// No-op while connecting or open. Must be called from within a tokio
    /// runtime.
    pub fn connect(&mut self) -> Result<(), WsError> {
        match self.ready_state() {
            ReadyState::Open | ReadyState::Connecting => return Ok(()),
            ReadyState::Closing | ReadyState::Closed => {}
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| WsError::ConnectionFailed(format!("no tokio runtime: {}", e)))?;

        // The previous task, if any, has finished or is about to.
        self.task_handle.take();

        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        self.cmd_tx = Some(cmd_tx);
        self.ready_state
            .store(ReadyState::Connecting as u16, Ordering::SeqCst);

        let state = TaskState {
            config: self.config.clone(),
            handler: self.handler.clone(),
            event_tx: self.event_tx.clone(),
            cmd_rx,
            pending_messages: Vec::new(),
            ready_state: Arc::clone(&self.ready_state),
        };

        tracing::info!("Connecting to {}", self.config.url);
        self.task_handle = Some(runtime.spawn(run_task(state)));
        Ok(())
    }

    /// Close the socket with code 1000 and wait for the task to finish.
    pub async fn disconnect(&mut self) -> Result<(), WsError> {
        if let Some(tx) = self.cmd_tx.take() {
            if self.ready_state() != ReadyState::Closed {
                self.ready_state
                    .store(ReadyState::Closing as u16, Ordering::SeqCst);
            }
            let _ = tx.send(Command::Disconnect).await;
        }

        if let Some(handle) = self.task_handle.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }

        self.ready_state
            .store(ReadyState::Closed as u16, Ordering::SeqCst);
        Ok(())
    }

    /// Send a frame.
    ///
    /// While connecting the frame is queued and sent once the socket opens.
    /// Returns `WsError::NotConnected` when there is no connection.
    pub fn send(&self, msg: MessageOut) -> Result<(), WsError> {
        if self.ready_state() == ReadyState::Closed {
            return Err(WsError::NotConnected);
        }
        match &self.cmd_tx {
            Some(tx) => tx.try_send(Command::Send(msg)).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    WsError::SendFailed("Command channel full".into())
                }
                mpsc::error::TrySendError::Closed(_) => WsError::NotConnected,
            }),
            None => Err(WsError::NotConnected),
        }
    }

    /// Whether the WebSocket is currently open.
    pub fn is_connected(&self) -> bool {
        self.ready_state() == ReadyState::Open
    }

    /// Current connection state.
    pub fn ready_state(&self) -> ReadyState {
        ReadyState::from(self.ready_state.load(Ordering::SeqCst))
    }

    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    /// Get a stream of events from the WebSocket connection.
    ///
    /// The returned stream borrows `self`, so it must be dropped
    /// before calling `disconnect()`.
    pub fn events(&self) -> Pin<Box<dyn Stream<Item = WsEvent> + Send + '_>> {
        Box::pin(futures_util::stream::unfold(
            &self.event_rx,
            |rx| async move {
                let mut guard = rx.lock().await;
                guard.recv().await.map(|event| (event, rx))
            },
        ))
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

// ─── Background task ─────────────────────────────────────────────────────────

async fn run_task(mut state: TaskState) {
    // ── 1. Open the socket, still listening for commands ─────────────────
    let config = state.config.clone();
    let connecting = attempt_connect(&config);
    tokio::pin!(connecting);

    let result = loop {
        tokio::select! {
            res = &mut connecting => break res,
            cmd = state.cmd_rx.recv() => match cmd {
                Some(Command::Send(msg)) => state.pending_messages.push(msg),
                Some(Command::Disconnect) | None => {
                    tracing::info!("Connect aborted by client");
                    state.finish(WsEvent::Disconnected {
                        code: Some(1000),
                        reason: CLIENT_DISCONNECT_REASON.into(),
                    });
                    return;
                }
            },
        }
    };

    let (mut sink, stream) = match result {
        Ok(parts) => parts,
        Err(e) => {
            tracing::error!("WebSocket connection failed: {}", e);
            state.finish(WsEvent::ConnectionFailed(e));
            return;
        }
    };

    // ── 2. Connected ─────────────────────────────────────────────────────
    state.set_state(ReadyState::Open);
    let frames = state.deliver(WsEvent::Connected);
    send_all(&mut sink, &frames).await;
    flush_pending(&mut sink, &mut state.pending_messages).await;

    // ── 3. Run until the socket closes ───────────────────────────────────
    let closing = run_connected(&mut state, sink, stream).await;
    state.finish(closing);
}

/// The inner connected loop. Returns the event describing how it ended.
async fn run_connected(
    state: &mut TaskState,
    mut sink: WsSink,
    mut stream: SplitStream<WsStream>,
) -> WsEvent {
    loop {
        tokio::select! {
            // ── a) Incoming WS message ───────────────────────────────────
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let text_str: &str = text.as_ref();
                        let event = match parse_message(text_str) {
                            Ok(kind) => WsEvent::Message(kind),
                            Err(e) => {
                                tracing::warn!("WS deserialization error: {} (raw: {})", e, text_str);
                                WsEvent::Error(e.to_string())
                            }
                        };
                        let frames = state.deliver(event);
                        send_all(&mut sink, &frames).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = extract_close(frame.as_ref());
                        tracing::info!("Server closed the connection ({}): {}", code, reason);
                        return WsEvent::Disconnected { code: Some(code), reason };
                    }
                    Some(Ok(_)) => {} // binary, pong, raw frames
                    Some(Err(e)) => {
                        let reason = e.to_string();
                        tracing::error!("WebSocket error: {}", reason);
                        state.deliver(WsEvent::ConnectionFailed(reason.clone()));
                        return WsEvent::Disconnected { code: None, reason };
                    }
                    None => {
                        return WsEvent::Disconnected {
                            code: None,
                            reason: "Stream ended".into(),
                        };
                    }
                }
            }

            // ── b) Command from public API ───────────────────────────────
            cmd = state.cmd_rx.recv() => {
                match cmd {
                    Some(Command::Send(msg_out)) => {
                        if let Err(e) = send_msg(&mut sink, &msg_out).await {
                            tracing::warn!("Send failed: {}", e);
                        }
                    }
                    Some(Command::Disconnect) | None => {
                        let _ = sink.send(Message::Close(Some(CloseFrame {
                            code: CloseCode::Normal,
                            reason: CLIENT_DISCONNECT_REASON.into(),
                        }))).await;
                        return WsEvent::Disconnected {
                            code: Some(1000),
                            reason: CLIENT_DISCONNECT_REASON.into(),
                        };
                    }
                }
            }
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Establish a WebSocket connection within the configured timeout.
async fn attempt_connect(
    config: &WsConfig,
) -> Result<(WsSink, SplitStream<WsStream>), String> {
    let timeout = Duration::from_millis(config.connect_timeout_ms);
    let (ws_stream, _) = tokio::time::timeout(timeout, connect_async(config.url.as_str()))
        .await
        .map_err(|_| "Connection timeout".to_string())?
        .map_err(|e| e.to_string())?;

    Ok(ws_stream.split())
}

/// Serialize and send a MessageOut over the sink.
async fn send_msg(sink: &mut WsSink, msg: &MessageOut) -> Result<(), String> {
    let json = msg.to_json().map_err(|e| e.to_string())?;
    tracing::debug!("WS send: {}", json);
    sink.send(Message::Text(json.into()))
        .await
        .map_err(|e| e.to_string())
}

async fn send_all(sink: &mut WsSink, frames: &[MessageOut]) {
    for frame in frames {
        if let Err(e) = send_msg(sink, frame).await {
            tracing::warn!("Send failed: {}", e);
        }
    }
}

async fn flush_pending(sink: &mut WsSink, pending: &mut Vec<MessageOut>) {
    if pending.is_empty() {
        return;
    }
    tracing::info!("Flushing {} pending message(s)", pending.len());
    let messages = std::mem::take(pending);
    send_all(sink, &messages).await;
}

/// Extract close code and reason from an optional CloseFrame.
fn extract_close(frame: Option<&CloseFrame>) -> (u16, String) {
    match frame {
        Some(f) => (f.code.into(), f.reason.to_string()),
        None => (1005, "No close frame".into()),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_client_new_is_closed() {
        let client = WsClient::new(WsConfig::default());
        assert!(client.cmd_tx.is_none());
        assert_eq!(client.ready_state(), ReadyState::Closed);
        assert!(!client.is_connected());
    }

    #[test]
    fn test_send_when_not_connected() {
        let client = WsClient::new(WsConfig::default());
        let result = client.send(MessageOut::auth("jwt"));
        assert!(matches!(result, Err(WsError::NotConnected)));
    }

    #[test]
    fn test_connect_outside_runtime_fails() {
        let mut client = WsClient::new(WsConfig::default());
        assert!(matches!(
            client.connect(),
            Err(WsError::ConnectionFailed(_))
        ));
        assert_eq!(client.ready_state(), ReadyState::Closed);
    }

    #[test]
    fn test_extract_close_with_frame() {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "goodbye".into(),
        };
        let (code, reason) = extract_close(Some(&frame));
        assert_eq!(code, 1000);
        assert_eq!(reason, "goodbye");
    }

    #[test]
    fn test_extract_close_no_frame() {
        let (code, reason) = extract_close(None);
        assert_eq!(code, 1005);
        assert_eq!(reason, "No close frame");
    }

    #[tokio::test]
    async fn test_disconnect_when_not_connected() {
        let mut client = WsClient::new(WsConfig::default());
        assert!(client.disconnect().await.is_ok());
        assert_eq!(client.ready_state(), ReadyState::Closed);
    }

    #[derive(Default)]
    struct StateRecorder {
        ready_state: std::sync::OnceLock<Arc<AtomicU16>>,
        seen: parking_lot::Mutex<Vec<ReadyState>>,
    }

    impl WsHandler for StateRecorder {
        fn on_event(&self, event: &WsEvent) -> Vec<MessageOut> {
            if let (WsEvent::ConnectionFailed(_), Some(state)) = (event, self.ready_state.get()) {
                self.seen
                    .lock()
                    .push(ReadyState::from(state.load(Ordering::SeqCst)));
            }
            Vec::new()
        }
    }

    #[tokio::test]
    async fn test_handler_sees_closed_state_on_failure() {
        let config = WsConfig {
            url: "ws://127.0.0.1:1/ws/v1".into(),
            ..WsConfig::default()
        };
        let recorder = Arc::new(StateRecorder::default());
        let mut client = WsClient::with_handler(config, recorder.clone());
        let _ = recorder.ready_state.set(Arc::clone(&client.ready_state));
        client.connect().unwrap();

        let mut events = client.events();
        let event = tokio::time::timeout(Duration::from_secs(5), events.next())
            .await
            .unwrap();
        assert!(matches!(event, Some(WsEvent::ConnectionFailed(_))));
        assert_eq!(*recorder.seen.lock(), vec![ReadyState::Closed]);
    }

    #[tokio::test]
    async fn test_refused_connection_reports_failure() {
        let config = WsConfig {
            url: "ws://127.0.0.1:1/ws/v1".into(),
            ..WsConfig::default()
        };
        let mut client = WsClient::new(config);
        client.connect().unwrap();
        assert_eq!(client.ready_state(), ReadyState::Connecting);

        let mut events = client.events();
        let event = tokio::time::timeout(Duration::from_secs(5), events.next())
            .await
            .unwrap();
        assert!(matches!(event, Some(WsEvent::ConnectionFailed(_))));
        drop(events);
        assert_eq!(client.ready_state(), ReadyState::Closed);
    }
}
