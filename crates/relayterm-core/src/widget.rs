//! Terminal widget collaborator
//!
//! The widget renders cells and turns keystrokes into input; the session only
//! writes output into it, asks it to fit its container and reads its size.

use serde::{Deserialize, Serialize};

/// Terminal geometry in character cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TerminalSize {
    pub cols: u16,
    pub rows: u16,
}

impl TerminalSize {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    /// Build from widget-computed geometry, saturating at `u16::MAX` so an
    /// oversized container never wraps to a tiny terminal on the relay side.
    pub fn from_geometry(cols: usize, rows: usize) -> Self {
        Self {
            cols: u16::try_from(cols).unwrap_or(u16::MAX),
            rows: u16::try_from(rows).unwrap_or(u16::MAX),
        }
    }
}

/// Cursor shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorStyle {
    #[default]
    Block,
    Underline,
    Bar,
}

/// Widget addon modules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetAddon {
    /// Recompute cols/rows from the container size
    Fit,
    /// Clickable links in output
    WebLinks,
}

/// Color theme (CSS-style color strings)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetTheme {
    pub background: String,
    pub foreground: String,
    pub cursor: String,
    pub selection_background: String,
}

impl Default for WidgetTheme {
    fn default() -> Self {
        Self {
            background: "#1e1e1e".to_string(),
            foreground: "#d4d4d4".to_string(),
            cursor: "#d4d4d4".to_string(),
            selection_background: "#264f78".to_string(),
        }
    }
}

/// Display options handed to the widget at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetOptions {
    pub cursor_blink: bool,
    pub cursor_style: CursorStyle,
    pub font_family: String,
    pub font_size: u16,
    pub scrollback: u32,
    pub theme: WidgetTheme,
    pub addons: Vec<WidgetAddon>,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            cursor_blink: true,
            cursor_style: CursorStyle::Block,
            font_family: "Menlo, Monaco, 'Courier New', monospace".to_string(),
            font_size: 13,
            scrollback: 5_000,
            theme: WidgetTheme::default(),
            addons: vec![WidgetAddon::Fit, WidgetAddon::WebLinks],
        }
    }
}

impl WidgetOptions {
    pub fn has_addon(&self, addon: WidgetAddon) -> bool {
        self.addons.contains(&addon)
    }
}

/// Terminal emulator widget
///
/// Keystrokes do not flow through this trait: the host delivers them to
/// [`Session::on_input`](crate::session::Session::on_input).
pub trait TerminalWidget {
    /// Attach to the host container
    fn open(&mut self);

    /// Write terminal output text
    fn write_text(&mut self, text: &str);

    /// Write raw terminal output bytes
    fn write_bytes(&mut self, data: &[u8]);

    /// Recompute cols/rows from the container's current size
    fn fit(&mut self);

    /// Current geometry
    fn size(&self) -> TerminalSize;

    /// Release the widget; no other method is called afterwards
    fn dispose(&mut self);
}

/// Watches the widget's host container for size changes
///
/// The host reports changes through
/// [`Session::on_container_resized`](crate::session::Session::on_container_resized).
pub trait SizeObserver {
    /// Stop observing; no further notifications are delivered
    fn disconnect(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_geometry_saturates() {
        assert_eq!(TerminalSize::from_geometry(80, 24), TerminalSize::new(80, 24));
        assert_eq!(
            TerminalSize::from_geometry(usize::MAX, 65_536),
            TerminalSize::new(u16::MAX, u16::MAX)
        );
    }

    #[test]
    fn test_widget_options_yaml_defaults() {
        let options: WidgetOptions = serde_yaml::from_str("fontSize: 15\ncursorStyle: bar\n").unwrap();
        assert_eq!(options.font_size, 15);
        assert_eq!(options.cursor_style, CursorStyle::Bar);
        assert!(options.cursor_blink);
        assert!(options.has_addon(WidgetAddon::Fit));
        assert!(options.has_addon(WidgetAddon::WebLinks));
    }
}
