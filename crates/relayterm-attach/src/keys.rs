//! Local keyboard → terminal input bytes

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::host::{AppEvent, EventSender};

/// What a key press means locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Bytes for the remote process
    Input(String),
    /// Leave the session (Ctrl+])
    Detach,
}

/// Translate a key press. `None` for keys with no terminal encoding.
pub fn translate_key(key: &KeyEvent) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    if ctrl && key.code == KeyCode::Char(']') {
        return Some(KeyAction::Detach);
    }

    let data = match key.code {
        KeyCode::Char(c) if ctrl => control_char(c)?.to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "\r".to_string(),
        KeyCode::Backspace => "\x7f".to_string(),
        KeyCode::Tab => "\t".to_string(),
        KeyCode::BackTab => "\x1b[Z".to_string(),
        KeyCode::Esc => "\x1b".to_string(),
        KeyCode::Up => "\x1b[A".to_string(),
        KeyCode::Down => "\x1b[B".to_string(),
        KeyCode::Right => "\x1b[C".to_string(),
        KeyCode::Left => "\x1b[D".to_string(),
        KeyCode::Home => "\x1b[H".to_string(),
        KeyCode::End => "\x1b[F".to_string(),
        KeyCode::PageUp => "\x1b[5~".to_string(),
        KeyCode::PageDown => "\x1b[6~".to_string(),
        KeyCode::Delete => "\x1b[3~".to_string(),
        KeyCode::Insert => "\x1b[2~".to_string(),
        KeyCode::F(n) => function_key(n)?.to_string(),
        _ => return None,
    };

    Some(KeyAction::Input(if alt { format!("\x1b{data}") } else { data }))
}

/// Ctrl+<c> as a C0 control character
fn control_char(c: char) -> Option<char> {
    let byte = match c {
        'a'..='z' => c as u8 - b'a' + 1,
        'A'..='Z' => c as u8 - b'A' + 1,
        ' ' | '@' | '2' => 0x00,
        '[' | '3' => 0x1b,
        '\\' | '4' => 0x1c,
        ']' | '5' => 0x1d,
        '^' | '6' => 0x1e,
        '_' | '7' | '/' => 0x1f,
        '8' | '?' => 0x7f,
        _ => return None,
    };
    Some(byte as char)
}

/// Plain `r`, the reconnect hotkey
pub fn is_reconnect_key(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('r') && key.modifiers.is_empty()
}

fn function_key(n: u8) -> Option<&'static str> {
    Some(match n {
        1 => "\x1bOP",
        2 => "\x1bOQ",
        3 => "\x1bOR",
        4 => "\x1bOS",
        5 => "\x1b[15~",
        6 => "\x1b[17~",
        7 => "\x1b[18~",
        8 => "\x1b[19~",
        9 => "\x1b[20~",
        10 => "\x1b[21~",
        11 => "\x1b[23~",
        12 => "\x1b[24~",
        _ => return None,
    })
}

/// Map one terminal event to what the main loop should do with it.
///
/// Pasted text is always plain input, even when it is a lone `r`.
pub fn classify_event(event: Event, observing: bool, reconnect_offered: bool) -> Option<AppEvent> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => {
            if reconnect_offered && is_reconnect_key(&key) {
                return Some(AppEvent::Reconnect);
            }
            match translate_key(&key)? {
                KeyAction::Input(data) => Some(AppEvent::Input(data)),
                KeyAction::Detach => Some(AppEvent::Detach),
            }
        }
        Event::Paste(text) => Some(AppEvent::Input(text)),
        Event::Resize(_, _) if observing => Some(AppEvent::Resized),
        _ => None,
    }
}

/// Read the local terminal on a blocking thread until `running` clears.
///
/// Resize events are only forwarded while `observing` is set, and the
/// reconnect hotkey is only intercepted while `reconnect_offered` is set.
pub fn spawn_input_reader(
    events: EventSender,
    observing: Arc<AtomicBool>,
    reconnect_offered: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        while running.load(Ordering::SeqCst) {
            match event::poll(Duration::from_millis(100)) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    warn!(error = %e, "Failed to poll terminal events");
                    break;
                }
            }

            let app_event = match event::read() {
                Ok(ev) => {
                    let watching = observing.load(Ordering::SeqCst);
                    let offered = reconnect_offered.load(Ordering::SeqCst);
                    match classify_event(ev, watching, offered) {
                        Some(app_event) => app_event,
                        None => continue,
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read terminal event");
                    break;
                }
            };

            if events.send(app_event).is_err() {
                break;
            }
        }
    })
}
