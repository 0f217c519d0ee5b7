//! Control frame codec
//!
//! Outbound control messages share one duplex socket with raw keystroke text.
//! Every control frame starts with a one-byte tag; the rest of the layout is
//! fixed per tag. Inbound traffic is never decoded here, it is terminal output.
//!
//! Layout (big-endian):
//! - resize: `[0x01, cols_hi, cols_lo, rows_hi, rows_lo]`

use thiserror::Error;

use crate::widget::TerminalSize;

/// Total length of an encoded resize frame
pub const RESIZE_FRAME_LEN: usize = 5;

/// Frame discriminator (byte 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameTag {
    Resize = 0x01,
}

impl FrameTag {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(FrameTag::Resize),
            _ => None,
        }
    }

    /// Encoded length of a frame with this tag, tag byte included
    pub fn frame_len(self) -> usize {
        match self {
            FrameTag::Resize => RESIZE_FRAME_LEN,
        }
    }
}

/// Errors decoding a control frame
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,

    #[error("unknown frame tag 0x{0:02x}")]
    UnknownTag(u8),

    #[error("truncated {tag:?} frame: expected {expected} bytes, got {actual}")]
    Truncated {
        tag: FrameTag,
        expected: usize,
        actual: usize,
    },

    #[error("oversized {tag:?} frame: expected {expected} bytes, got {actual}")]
    Oversized {
        tag: FrameTag,
        expected: usize,
        actual: usize,
    },
}

/// Terminal geometry update sent to the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeFrame {
    pub cols: u16,
    pub rows: u16,
}

impl ResizeFrame {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    pub fn encode(&self) -> [u8; RESIZE_FRAME_LEN] {
        encode_resize(self.cols, self.rows)
    }
}

impl From<TerminalSize> for ResizeFrame {
    fn from(size: TerminalSize) -> Self {
        Self::new(size.cols, size.rows)
    }
}

/// Any client→relay control message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFrame {
    Resize(ResizeFrame),
}

impl ControlFrame {
    pub fn tag(&self) -> FrameTag {
        match self {
            ControlFrame::Resize(_) => FrameTag::Resize,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            ControlFrame::Resize(frame) => frame.encode().to_vec(),
        }
    }

    /// Decode a frame as the relay would see it.
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        let (&first, body) = bytes.split_first().ok_or(FrameError::Empty)?;
        let tag = FrameTag::from_u8(first).ok_or(FrameError::UnknownTag(first))?;

        let expected = tag.frame_len();
        if bytes.len() < expected {
            return Err(FrameError::Truncated {
                tag,
                expected,
                actual: bytes.len(),
            });
        }
        if bytes.len() > expected {
            return Err(FrameError::Oversized {
                tag,
                expected,
                actual: bytes.len(),
            });
        }

        match tag {
            FrameTag::Resize => Ok(ControlFrame::Resize(ResizeFrame {
                cols: u16::from_be_bytes([body[0], body[1]]),
                rows: u16::from_be_bytes([body[2], body[3]]),
            })),
        }
    }
}

impl From<ResizeFrame> for ControlFrame {
    fn from(frame: ResizeFrame) -> Self {
        ControlFrame::Resize(frame)
    }
}

/// Encode a resize frame. Callers convert wider geometry through
/// [`TerminalSize::from_geometry`], which saturates instead of wrapping.
pub fn encode_resize(cols: u16, rows: u16) -> [u8; RESIZE_FRAME_LEN] {
    let mut frame = [0u8; RESIZE_FRAME_LEN];
    frame[0] = FrameTag::Resize.as_u8();
    frame[1..3].copy_from_slice(&cols.to_be_bytes());
    frame[3..5].copy_from_slice(&rows.to_be_bytes());
    frame
}
