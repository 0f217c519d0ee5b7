//! Recording collaborators for unit tests

use std::cell::RefCell;
use std::rc::Rc;

use crate::frame::{ControlFrame, ResizeFrame};
use crate::relay::{ConnectionId, RelayEndpoint, Transport};
use crate::session::SessionHost;
use crate::widget::{SizeObserver, TerminalSize, TerminalWidget, WidgetOptions};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    WidgetCreated(u32),
    WidgetOpened(u32),
    WriteText(String),
    WriteBytes(Vec<u8>),
    Fit(u32, TerminalSize),
    WidgetDisposed(u32),
    TransportOpened(ConnectionId),
    SendText(ConnectionId, String),
    SendBinary(ConnectionId, Vec<u8>),
    TransportClosed(ConnectionId),
    ObserverStarted,
    ObserverStopped,
    UseAfterDispose(&'static str),
}

#[derive(Debug)]
struct Log {
    calls: Vec<Call>,
    container: TerminalSize,
    next_widget: u32,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            container: TerminalSize::new(80, 24),
            next_widget: 1,
        }
    }
}

/// Shared call log plus the simulated container size
#[derive(Debug, Clone, Default)]
pub struct Recorder(Rc<RefCell<Log>>);

impl Recorder {
    pub fn record(&self, call: Call) {
        self.0.borrow_mut().calls.push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().calls.clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().calls.clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn set_container(&self, size: TerminalSize) {
        self.0.borrow_mut().container = size;
    }

    pub fn container(&self) -> TerminalSize {
        self.0.borrow().container
    }

    pub fn widget_writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::WriteText(_) | Call::WriteBytes(_)))
            .collect()
    }

    pub fn sent_text(&self) -> Vec<(ConnectionId, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SendText(id, text) => Some((id, text)),
                _ => None,
            })
            .collect()
    }

    pub fn sent_frames(&self) -> Vec<ResizeFrame> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SendBinary(_, bytes) => match ControlFrame::decode(&bytes) {
                    Ok(ControlFrame::Resize(frame)) => Some(frame),
                    Err(e) => panic!("invalid frame sent: {e}"),
                },
                _ => None,
            })
            .collect()
    }

    /// Transports opened and not yet closed by the client
    pub fn live_transports(&self) -> Vec<ConnectionId> {
        let calls = self.calls();
        calls
            .iter()
            .filter_map(|c| match c {
                Call::TransportOpened(id) if !calls.contains(&Call::TransportClosed(*id)) => {
                    Some(*id)
                }
                _ => None,
            })
            .collect()
    }

    pub fn use_after_dispose(&self) -> usize {
        self.count(|c| matches!(c, Call::UseAfterDispose(_)))
    }

    fn next_widget_id(&self) -> u32 {
        let mut log = self.0.borrow_mut();
        let id = log.next_widget;
        log.next_widget += 1;
        id
    }
}

pub struct RecordingWidget {
    recorder: Recorder,
    instance: u32,
    size: TerminalSize,
    disposed: bool,
}

impl RecordingWidget {
    pub fn new(recorder: Recorder, instance: u32) -> Self {
        Self {
            recorder,
            instance,
            size: TerminalSize::new(80, 24),
            disposed: false,
        }
    }

    pub fn instance(&self) -> u32 {
        self.instance
    }

    fn guard(&self, op: &'static str) -> bool {
        if self.disposed {
            self.recorder.record(Call::UseAfterDispose(op));
        }
        !self.disposed
    }
}

impl TerminalWidget for RecordingWidget {
    fn open(&mut self) {
        if self.guard("open") {
            self.recorder.record(Call::WidgetOpened(self.instance));
        }
    }

    fn write_text(&mut self, text: &str) {
        if self.guard("write_text") {
            self.recorder.record(Call::WriteText(text.to_string()));
        }
    }

    fn write_bytes(&mut self, data: &[u8]) {
        if self.guard("write_bytes") {
            self.recorder.record(Call::WriteBytes(data.to_vec()));
        }
    }

    fn fit(&mut self) {
        if self.guard("fit") {
            self.size = self.recorder.container();
            self.recorder.record(Call::Fit(self.instance, self.size));
        }
    }

    fn size(&self) -> TerminalSize {
        self.size
    }

    fn dispose(&mut self) {
        if self.guard("dispose") {
            self.disposed = true;
            self.recorder.record(Call::WidgetDisposed(self.instance));
        }
    }
}

pub struct RecordingTransport {
    recorder: Recorder,
    id: ConnectionId,
}

impl RecordingTransport {
    pub fn new(recorder: Recorder, id: ConnectionId) -> Self {
        recorder.record(Call::TransportOpened(id));
        Self { recorder, id }
    }
}

impl Transport for RecordingTransport {
    fn send_text(&mut self, text: &str) {
        self.recorder.record(Call::SendText(self.id, text.to_string()));
    }

    fn send_binary(&mut self, data: &[u8]) {
        self.recorder.record(Call::SendBinary(self.id, data.to_vec()));
    }

    fn close(&mut self) {
        self.recorder.record(Call::TransportClosed(self.id));
    }
}

pub struct RecordingObserver {
    recorder: Recorder,
}

impl SizeObserver for RecordingObserver {
    fn disconnect(&mut self) {
        self.recorder.record(Call::ObserverStopped);
    }
}

pub struct RecordingHost {
    recorder: Recorder,
}

impl RecordingHost {
    pub fn new(recorder: Recorder) -> Self {
        Self { recorder }
    }
}

impl SessionHost for RecordingHost {
    type Widget = RecordingWidget;
    type Transport = RecordingTransport;
    type Observer = RecordingObserver;

    fn create_widget(&mut self, _options: &WidgetOptions) -> RecordingWidget {
        let instance = self.recorder.next_widget_id();
        self.recorder.record(Call::WidgetCreated(instance));
        RecordingWidget::new(self.recorder.clone(), instance)
    }

    fn open_transport(&mut self, id: ConnectionId, _endpoint: &RelayEndpoint) -> RecordingTransport {
        RecordingTransport::new(self.recorder.clone(), id)
    }

    fn observe_container(&mut self) -> RecordingObserver {
        self.recorder.record(Call::ObserverStarted);
        RecordingObserver {
            recorder: self.recorder.clone(),
        }
    }
}
