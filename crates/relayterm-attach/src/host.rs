//! Native session host
//!
//! - `WsTransport`: one tokio task per socket attempt (tokio-tungstenite)
//! - `StdoutTerminal`: the local terminal as the widget (crossterm raw mode)
//! - `ResizeWatch`: gates forwarding of terminal resize events
//!
//! Everything reports back over one channel as [`AppEvent`], so the session
//! is only ever touched from the main loop.

use std::io::{stdout, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossterm::terminal::{self, disable_raw_mode, enable_raw_mode};
use futures_util::{SinkExt, StreamExt};
use relayterm_core::{
    ConnectionId, RelayEndpoint, SessionHost, SizeObserver, TerminalSize, TerminalWidget,
    Transport, TransportEvent, WidgetOptions,
};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// Everything the main loop reacts to
#[derive(Debug)]
pub enum AppEvent {
    Transport(ConnectionId, TransportEvent),
    Input(String),
    Resized,
    /// Reconnect hotkey, only sent while reconnect is offered
    Reconnect,
    Detach,
}

pub type EventSender = mpsc::UnboundedSender<AppEvent>;

pub struct NativeHost {
    events: EventSender,
    observing: Arc<AtomicBool>,
}

impl NativeHost {
    /// `observing` is shared with the input reader, which only forwards
    /// resize events while it is set.
    pub fn new(events: EventSender, observing: Arc<AtomicBool>) -> Self {
        Self { events, observing }
    }
}

impl SessionHost for NativeHost {
    type Widget = StdoutTerminal;
    type Transport = WsTransport;
    type Observer = ResizeWatch;

    fn create_widget(&mut self, options: &WidgetOptions) -> StdoutTerminal {
        // Fonts, colors and cursor belong to the local terminal emulator
        debug!(font_size = options.font_size, scrollback = options.scrollback, "Using local terminal as widget");
        StdoutTerminal::new()
    }

    fn open_transport(&mut self, id: ConnectionId, endpoint: &RelayEndpoint) -> WsTransport {
        WsTransport::spawn(id, endpoint.as_str().to_string(), self.events.clone())
    }

    fn observe_container(&mut self) -> ResizeWatch {
        self.observing.store(true, Ordering::SeqCst);
        ResizeWatch {
            observing: self.observing.clone(),
        }
    }
}

// ========== Widget ==========

pub struct StdoutTerminal {
    out: Stdout,
    size: TerminalSize,
    raw_mode: bool,
}

impl StdoutTerminal {
    fn new() -> Self {
        Self {
            out: stdout(),
            size: TerminalSize::new(80, 24),
            raw_mode: false,
        }
    }

    fn write(&mut self, data: &[u8]) {
        if let Err(e) = self.out.write_all(data).and_then(|_| self.out.flush()) {
            warn!(error = %e, "Failed to write terminal output");
        }
    }
}

impl TerminalWidget for StdoutTerminal {
    fn open(&mut self) {
        match enable_raw_mode() {
            Ok(()) => self.raw_mode = true,
            Err(e) => warn!(error = %e, "Failed to enable raw mode"),
        }
        self.fit();
    }

    fn write_text(&mut self, text: &str) {
        self.write(text.as_bytes());
    }

    fn write_bytes(&mut self, data: &[u8]) {
        self.write(data);
    }

    fn fit(&mut self) {
        match terminal::size() {
            Ok((cols, rows)) => self.size = TerminalSize::new(cols, rows),
            Err(e) => warn!(error = %e, "Failed to read terminal size"),
        }
    }

    fn size(&self) -> TerminalSize {
        self.size
    }

    fn dispose(&mut self) {
        let _ = self.out.flush();
        if self.raw_mode {
            self.raw_mode = false;
            if let Err(e) = disable_raw_mode() {
                warn!(error = %e, "Failed to restore terminal mode");
            }
        }
    }
}

// ========== Observer ==========

pub struct ResizeWatch {
    observing: Arc<AtomicBool>,
}

impl SizeObserver for ResizeWatch {
    fn disconnect(&mut self) {
        self.observing.store(false, Ordering::SeqCst);
    }
}

// ========== Transport ==========

#[derive(Debug)]
enum Outbound {
    Text(String),
    Binary(Vec<u8>),
    Close,
}

/// Client side of one WebSocket attempt
pub struct WsTransport {
    id: ConnectionId,
    outbound: Option<mpsc::UnboundedSender<Outbound>>,
}

impl WsTransport {
    fn spawn(id: ConnectionId, url: String, events: EventSender) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_socket(id, url, outbound_rx, events));
        Self {
            id,
            outbound: Some(outbound_tx),
        }
    }

    fn push(&self, msg: Outbound) {
        if let Some(tx) = &self.outbound {
            if tx.send(msg).is_err() {
                debug!(connection_id = %self.id, "Socket task already finished");
            }
        }
    }
}

impl Transport for WsTransport {
    fn send_text(&mut self, text: &str) {
        self.push(Outbound::Text(text.to_string()));
    }

    fn send_binary(&mut self, data: &[u8]) {
        self.push(Outbound::Binary(data.to_vec()));
    }

    fn close(&mut self) {
        self.push(Outbound::Close);
        self.outbound = None;
    }
}

async fn run_socket(
    id: ConnectionId,
    url: String,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: EventSender,
) {
    let emit = |event: TransportEvent| {
        let _ = events.send(AppEvent::Transport(id, event));
    };

    // Closing while the handshake is pending drops the connect future
    let ws_stream = tokio::select! {
        result = connect_async(url.as_str()) => match result {
            Ok((ws_stream, _)) => ws_stream,
            Err(e) => {
                emit(TransportEvent::Error(e.to_string()));
                return;
            }
        },
        _ = closed_while_connecting(&mut outbound) => {
            debug!(connection_id = %id, "Closed before handshake completed");
            return;
        }
    };

    info!(connection_id = %id, url = %url, "Connected to relay");
    emit(TransportEvent::Open);

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    loop {
        tokio::select! {
            cmd = outbound.recv() => {
                let msg = match cmd {
                    Some(Outbound::Text(text)) => Message::Text(text),
                    Some(Outbound::Binary(data)) => Message::Binary(data),
                    Some(Outbound::Close) | None => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        let _ = ws_tx.close().await;
                        debug!(connection_id = %id, "Socket closed by client");
                        return;
                    }
                };
                if let Err(e) = ws_tx.send(msg).await {
                    emit(TransportEvent::Error(e.to_string()));
                    return;
                }
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => emit(TransportEvent::Text(text)),
                    Some(Ok(Message::Binary(data))) => emit(TransportEvent::Binary(data)),
                    Some(Ok(Message::Close(frame))) => {
                        emit(TransportEvent::Closed {
                            reason: frame.map(|f| f.reason.to_string()),
                        });
                        return;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        emit(TransportEvent::Error(e.to_string()));
                        return;
                    }
                    None => {
                        emit(TransportEvent::Closed { reason: None });
                        return;
                    }
                }
            }
        }
    }
}

/// Resolves once the client closes (or drops) the transport. Nothing but a
/// close can be queued before the handshake, since sends require `Connected`.
async fn closed_while_connecting(outbound: &mut mpsc::UnboundedReceiver<Outbound>) {
    while let Some(cmd) = outbound.recv().await {
        if matches!(cmd, Outbound::Close) {
            return;
        }
    }
}
