// src/term/modes.rs

//! DEC private modes honored by the screen. Unknown mode numbers are
//! logged and ignored; they never fail the stream.

use log::debug;

/// DEC private mode numbers this core reacts to (CSI ? Pm h / l).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum DecModeConstant {
    /// DECCKM: application cursor keys.
    CursorKeys = 1,
    /// DECOM: origin mode.
    Origin = 6,
    /// DECAWM: autowrap at end of line.
    AutoWrap = 7,
    /// DECTCEM: text cursor visibility.
    TextCursorEnable = 25,
    /// Alternate screen buffer, no cursor save.
    AltScreen = 47,
    /// Alternate screen buffer, clear on entry.
    AltScreenClear = 1047,
    /// Save/restore cursor (used by 1049's bookends).
    SaveRestoreCursor = 1048,
    /// Alternate screen + cursor save/restore + clear on entry.
    AltScreenSaveRestore = 1049,
    /// Bracketed paste.
    BracketedPaste = 2004,
}

impl DecModeConstant {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(DecModeConstant::CursorKeys),
            6 => Some(DecModeConstant::Origin),
            7 => Some(DecModeConstant::AutoWrap),
            25 => Some(DecModeConstant::TextCursorEnable),
            47 => Some(DecModeConstant::AltScreen),
            1047 => Some(DecModeConstant::AltScreenClear),
            1048 => Some(DecModeConstant::SaveRestoreCursor),
            1049 => Some(DecModeConstant::AltScreenSaveRestore),
            2004 => Some(DecModeConstant::BracketedPaste),
            other => {
                debug!("ignoring unknown DEC private mode {}", other);
                None
            }
        }
    }
}

/// Boolean terminal modes toggled by DECSET/DECRST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecPrivateModes {
    /// DECCKM: arrow keys send SS3 sequences instead of CSI.
    pub cursor_keys_app_mode: bool,
    /// DECAWM: printing past the last column wraps to the next line.
    pub autowrap: bool,
    /// Bracketed paste: pasted text is framed by `ESC [200~` / `ESC [201~`.
    pub bracketed_paste: bool,
}

impl Default for DecPrivateModes {
    fn default() -> Self {
        DecPrivateModes {
            cursor_keys_app_mode: false,
            autowrap: true,
            bracketed_paste: false,
        }
    }
}
