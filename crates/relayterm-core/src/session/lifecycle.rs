//! Terminal Session - lifecycle of one open terminal panel
//!
//! The session is the only owner of the widget, the size observer, the live
//! connection and every timer. All host callbacks land here; once closed,
//! every callback is a no-op.
//!
//! Teardown order: timers → observer → connection → widget.

use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, info};

use super::resize::{fit_and_sync, ResizeSync, DEFAULT_INITIAL_FIT_DELAY, DEFAULT_RESIZE_DEBOUNCE};
use super::timer::{earliest, TimerSlot};
use crate::error::{RelayError, Result};
use crate::relay::{Connection, ConnectionId, ConnectionState, RelayEndpoint, Transport, TransportEvent};
use crate::widget::{SizeObserver, TerminalWidget, WidgetOptions};

/// Creates the collaborators a session owns
pub trait SessionHost {
    type Widget: TerminalWidget;
    type Transport: Transport;
    type Observer: SizeObserver;

    /// Construct the terminal widget (not yet attached)
    fn create_widget(&mut self, options: &WidgetOptions) -> Self::Widget;

    /// Start opening a socket. Events for it must be delivered with `id`.
    fn open_transport(&mut self, id: ConnectionId, endpoint: &RelayEndpoint) -> Self::Transport;

    /// Start observing the widget's host container
    fn observe_container(&mut self) -> Self::Observer;
}

/// Settings for one session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub endpoint: RelayEndpoint,
    pub widget: WidgetOptions,
    pub resize_debounce: Duration,
    pub initial_fit_delay: Duration,
    /// `None` keeps a pending handshake until the user reconnects or closes
    pub connect_timeout: Option<Duration>,
}

impl SessionConfig {
    pub fn new(endpoint: RelayEndpoint) -> Self {
        Self {
            endpoint,
            widget: WidgetOptions::default(),
            resize_debounce: DEFAULT_RESIZE_DEBOUNCE,
            initial_fit_delay: DEFAULT_INITIAL_FIT_DELAY,
            connect_timeout: None,
        }
    }
}

/// What the host UI renders: indicator plus reconnect affordance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStatus {
    pub state: ConnectionState,
    pub ever_connected: bool,
}

impl SessionStatus {
    /// Offer "Reconnect" only after a drop of a session that did connect
    pub fn show_reconnect(&self) -> bool {
        self.state == ConnectionState::Disconnected && self.ever_connected
    }
}

pub struct Session<H: SessionHost> {
    host: H,
    config: SessionConfig,
    is_open: bool,
    ever_connected: bool,
    widget: Option<H::Widget>,
    observer: Option<H::Observer>,
    connection: Connection<H::Transport>,
    resize: ResizeSync,
    connect_timeout: TimerSlot,
    status_tx: watch::Sender<SessionStatus>,
}

impl<H: SessionHost> Session<H> {
    /// Open a session: create and attach the widget, arm the initial fit,
    /// start the first connection and observe the container.
    pub fn open(host: H, config: SessionConfig, now: Instant) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::default());
        let resize = ResizeSync::new(config.resize_debounce, config.initial_fit_delay);

        let mut session = Self {
            host,
            config,
            is_open: true,
            ever_connected: false,
            widget: None,
            observer: None,
            connection: Connection::new(ConnectionId::new(0)),
            resize,
            connect_timeout: TimerSlot::new(),
            status_tx,
        };

        let mut widget = session.host.create_widget(&session.config.widget);
        widget.open();
        session.widget = Some(widget);

        session.resize.arm_initial_fit(now);
        session.start_connection(now);
        session.observer = Some(session.host.observe_container());

        info!(endpoint = %session.config.endpoint, "Terminal session opened");
        session
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn ever_connected(&self) -> bool {
        self.ever_connected
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.connection.state(),
            ever_connected: self.ever_connected,
        }
    }

    /// Status updates, one per change
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    /// Id of the current connection; events tagged with any other id are ignored
    pub fn connection_id(&self) -> ConnectionId {
        self.connection.id()
    }

    pub fn widget(&self) -> Option<&H::Widget> {
        self.widget.as_ref()
    }

    /// When the host should next call [`poll_timers`](Self::poll_timers)
    pub fn next_deadline(&self) -> Option<Instant> {
        if !self.is_open {
            return None;
        }
        earliest([self.resize.next_deadline(), self.connect_timeout.deadline()])
    }

    /// Whether any timer is still schedulable
    pub fn has_pending_timers(&self) -> bool {
        self.resize.has_pending() || self.connect_timeout.is_pending()
    }

    /// Transport callback for connection `id`
    pub fn on_transport_event(&mut self, id: ConnectionId, event: TransportEvent) {
        if !self.is_open {
            debug!(connection_id = %id, event = event.kind(), "Ignoring transport event after close");
            return;
        }
        if id != self.connection.id() {
            debug!(connection_id = %id, current = %self.connection.id(), event = event.kind(), "Ignoring event from superseded connection");
            return;
        }
        let Some(widget) = self.widget.as_mut() else {
            return;
        };

        let Some(change) = self.connection.handle_event(event, widget) else {
            return;
        };

        if change.is_established() {
            self.connect_timeout.cancel();
            self.ever_connected = true;
            let frame = fit_and_sync(widget, &mut self.connection);
            info!(
                connection_id = %self.connection.id(),
                cols = frame.map(|f| f.cols),
                rows = frame.map(|f| f.rows),
                "Relay connected"
            );
        } else if change.to == ConnectionState::Disconnected {
            self.connect_timeout.cancel();
            info!(connection_id = %self.connection.id(), from = %change.from, "Relay disconnected");
        }
        self.publish();
    }

    /// Keystroke input from the widget. Returns true if it was forwarded.
    pub fn on_input(&mut self, data: &str) -> bool {
        if !self.is_open {
            return false;
        }
        self.connection.send_input(data)
    }

    /// Size observer callback
    pub fn on_container_resized(&mut self, now: Instant) {
        if !self.is_open || self.observer.is_none() {
            return;
        }
        self.resize.container_resized(now);
    }

    /// Run every timer whose deadline has elapsed
    pub fn poll_timers(&mut self, now: Instant) {
        if !self.is_open {
            return;
        }

        let due = self.resize.poll(now);
        if let Some(widget) = self.widget.as_mut() {
            if due.initial_fit {
                widget.fit();
                debug!(cols = widget.size().cols, rows = widget.size().rows, "Initial fit");
            }
            if due.debounce {
                fit_and_sync(widget, &mut self.connection);
            }
        }

        if self.connect_timeout.take_due(now) && self.connection.abort_connecting().is_some() {
            self.publish();
        }
    }

    /// Replace the current connection with a fresh one, keeping the widget
    /// (and its scrollback). Only valid while the session is open.
    pub fn reconnect(&mut self, now: Instant) -> Result<()> {
        if !self.is_open || self.widget.is_none() {
            return Err(RelayError::SessionClosed);
        }
        info!(previous = %self.connection.id(), state = %self.connection.state(), "Reconnecting to relay");
        self.start_connection(now);
        Ok(())
    }

    /// Release every resource. Safe to call more than once.
    pub fn close(&mut self) {
        if !self.is_open {
            return;
        }
        self.is_open = false;

        let cancelled = self.resize.cancel_all() + usize::from(self.connect_timeout.cancel());
        if let Some(mut observer) = self.observer.take() {
            observer.disconnect();
        }
        self.connection.teardown();
        if let Some(mut widget) = self.widget.take() {
            widget.dispose();
        }

        self.publish();
        info!(connection_id = %self.connection.id(), cancelled_timers = cancelled, "Terminal session closed");
    }

    fn start_connection(&mut self, now: Instant) {
        self.connect_timeout.cancel();
        self.connection.teardown();

        let mut connection = Connection::new(self.connection.id().next());
        let host = &mut self.host;
        let endpoint = &self.config.endpoint;
        connection.connect(|id| host.open_transport(id, endpoint));
        self.connection = connection;

        if let Some(timeout) = self.config.connect_timeout {
            self.connect_timeout.schedule(now, timeout);
        }
        debug!(connection_id = %self.connection.id(), endpoint = %self.config.endpoint, "Connecting to relay");
        self.publish();
    }

    fn publish(&self) {
        let status = self.status();
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
    }
}

impl<H: SessionHost> Drop for Session<H> {
    fn drop(&mut self) {
        self.close();
    }
}
