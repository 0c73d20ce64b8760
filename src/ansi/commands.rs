// src/ansi/commands.rs

//! Structured commands produced by the parser, plus SGR parameter parsing.

use crate::color::{Color, Rgb};
use log::debug;
use std::iter::Peekable;
use std::slice::Iter;

/// C0 control bytes the screen reacts to. Anything else in the C0 range
/// is parsed but applied as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum C0Control {
    Bell,
    Backspace,
    Tab,
    LineFeed,
    VerticalTab,
    FormFeed,
    CarriageReturn,
    /// A C0 byte with no grid effect (NUL, SO, SI, ...).
    Ignored(u8),
}

impl C0Control {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x07 => C0Control::Bell,
            0x08 => C0Control::Backspace,
            0x09 => C0Control::Tab,
            0x0A => C0Control::LineFeed,
            0x0B => C0Control::VerticalTab,
            0x0C => C0Control::FormFeed,
            0x0D => C0Control::CarriageReturn,
            other => C0Control::Ignored(other),
        }
    }
}

/// One SGR attribute change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Reset,
    Bold,
    Faint,
    Italic,
    Underline,
    Blink,
    Inverse,
    Hidden,
    Strikethrough,
    NormalIntensity,
    NoItalic,
    NoUnderline,
    NoBlink,
    NoInverse,
    NoHidden,
    NoStrikethrough,
    Foreground(Color),
    Background(Color),
}

/// Which identification level a device-attributes query asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAttributesLevel {
    Primary,
    Secondary,
}

/// Erase extents for EL/ED, selected by the sequence parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseMode {
    ToEnd,
    ToStart,
    All,
    /// ED 3: clear the scrollback as well.
    Scrollback,
    Unsupported(u16),
}

impl EraseMode {
    pub fn from_param(value: u16) -> Self {
        match value {
            0 => EraseMode::ToEnd,
            1 => EraseMode::ToStart,
            2 => EraseMode::All,
            3 => EraseMode::Scrollback,
            other => EraseMode::Unsupported(other),
        }
    }
}

/// A completed CSI sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsiCommand {
    CursorUp(u16),
    CursorDown(u16),
    CursorForward(u16),
    CursorBackward(u16),
    CursorNextLine(u16),
    CursorPrevLine(u16),
    CursorColumn(u16),
    CursorRow(u16),
    CursorPosition { row: u16, col: u16 },
    EraseInDisplay(EraseMode),
    EraseInLine(EraseMode),
    EraseCharacter(u16),
    InsertCharacter(u16),
    DeleteCharacter(u16),
    InsertLine(u16),
    DeleteLine(u16),
    ScrollUp(u16),
    ScrollDown(u16),
    SetGraphicsRendition(Vec<Attribute>),
    SetScrollRegion { top: u16, bottom: u16 },
    SetModePrivate(u16),
    ResetModePrivate(u16),
    SetMode(u16),
    ResetMode(u16),
    DeviceStatusReport(u16),
    DeviceAttributes(DeviceAttributesLevel),
    SaveCursor,
    RestoreCursor,
    /// A recognized-shape sequence this core does not implement.
    Unsupported { final_byte: u8, params: Vec<u16> },
}

/// A completed plain escape sequence (no CSI/OSC introducer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscCommand {
    /// ESC D: move down one line, scrolling at the bottom margin.
    Index,
    /// ESC E: like CR + Index.
    NextLine,
    /// ESC M: move up one line, scrolling at the top margin.
    ReverseIndex,
    /// ESC 7.
    SaveCursor,
    /// ESC 8.
    RestoreCursor,
    /// ESC c: reset to initial state.
    Reset,
}

/// A completed OSC string sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OscCommand {
    /// OSC 0: icon name and window title together.
    SetIconAndWindowTitle(String),
    /// OSC 1.
    SetIconName(String),
    /// OSC 2.
    SetWindowTitle(String),
    Unsupported { code: i32, data: String },
}

/// Everything the parser can emit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnsiCommand {
    Print(char),
    C0(C0Control),
    Csi(CsiCommand),
    Esc(EscCommand),
    Osc(OscCommand),
}

impl AnsiCommand {
    /// Maps a plain escape final byte to a command. `None` means the
    /// sequence is unrecognized and silently discarded.
    pub fn from_esc(final_byte: u8) -> Option<Self> {
        let command = match final_byte {
            b'D' => EscCommand::Index,
            b'E' => EscCommand::NextLine,
            b'M' => EscCommand::ReverseIndex,
            b'7' => EscCommand::SaveCursor,
            b'8' => EscCommand::RestoreCursor,
            b'c' => EscCommand::Reset,
            _ => return None,
        };
        Some(AnsiCommand::Esc(command))
    }
}

impl CsiCommand {
    /// Builds a CSI command from collected parameters and the final byte.
    ///
    /// `h`/`l` are handled by the parser itself since one sequence may set
    /// several modes. Defaults follow ECMA-48: count parameters default to
    /// 1, selector parameters (erase modes, reports) to 0.
    pub fn dispatch(params: &[u16], private: bool, final_byte: u8) -> CsiCommand {
        let count = |idx: usize| params.get(idx).copied().unwrap_or(1).max(1);
        let select = |idx: usize| params.get(idx).copied().unwrap_or(0);

        if private {
            // Only h/l (handled upstream) and DA variants carry markers here.
            return match final_byte {
                b'c' => CsiCommand::DeviceAttributes(DeviceAttributesLevel::Secondary),
                _ => {
                    debug!(
                        "discarding private CSI sequence: final 0x{:02X}, params {:?}",
                        final_byte, params
                    );
                    CsiCommand::Unsupported {
                        final_byte,
                        params: params.to_vec(),
                    }
                }
            };
        }

        match final_byte {
            b'A' => CsiCommand::CursorUp(count(0)),
            b'B' => CsiCommand::CursorDown(count(0)),
            b'C' => CsiCommand::CursorForward(count(0)),
            b'D' => CsiCommand::CursorBackward(count(0)),
            b'E' => CsiCommand::CursorNextLine(count(0)),
            b'F' => CsiCommand::CursorPrevLine(count(0)),
            b'G' => CsiCommand::CursorColumn(count(0)),
            b'd' => CsiCommand::CursorRow(count(0)),
            b'H' | b'f' => CsiCommand::CursorPosition {
                row: count(0),
                col: count(1),
            },
            b'J' => CsiCommand::EraseInDisplay(EraseMode::from_param(select(0))),
            b'K' => CsiCommand::EraseInLine(EraseMode::from_param(select(0))),
            b'X' => CsiCommand::EraseCharacter(count(0)),
            b'@' => CsiCommand::InsertCharacter(count(0)),
            b'P' => CsiCommand::DeleteCharacter(count(0)),
            b'L' => CsiCommand::InsertLine(count(0)),
            b'M' => CsiCommand::DeleteLine(count(0)),
            b'S' => CsiCommand::ScrollUp(count(0)),
            b'T' => CsiCommand::ScrollDown(count(0)),
            b'm' => CsiCommand::SetGraphicsRendition(parse_sgr(params)),
            b'r' => CsiCommand::SetScrollRegion {
                top: count(0),
                bottom: params.get(1).copied().unwrap_or(0),
            },
            b'n' => CsiCommand::DeviceStatusReport(select(0)),
            b'c' => CsiCommand::DeviceAttributes(DeviceAttributesLevel::Primary),
            b's' => CsiCommand::SaveCursor,
            b'u' => CsiCommand::RestoreCursor,
            _ => {
                debug!(
                    "discarding CSI sequence: final 0x{:02X} ('{}'), params {:?}",
                    final_byte, final_byte as char, params
                );
                CsiCommand::Unsupported {
                    final_byte,
                    params: params.to_vec(),
                }
            }
        }
    }
}

/// Parses an SGR parameter list into attribute changes. An empty list is a
/// full reset. Unknown parameters are skipped.
pub fn parse_sgr(params: &[u16]) -> Vec<Attribute> {
    if params.is_empty() {
        return vec![Attribute::Reset];
    }
    let mut attrs = Vec::new();
    let mut iter = params.iter().peekable();
    while let Some(&param) = iter.next() {
        match param {
            0 => attrs.push(Attribute::Reset),
            1 => attrs.push(Attribute::Bold),
            2 => attrs.push(Attribute::Faint),
            3 => attrs.push(Attribute::Italic),
            4 => attrs.push(Attribute::Underline),
            5 | 6 => attrs.push(Attribute::Blink),
            7 => attrs.push(Attribute::Inverse),
            8 => attrs.push(Attribute::Hidden),
            9 => attrs.push(Attribute::Strikethrough),
            22 => attrs.push(Attribute::NormalIntensity),
            23 => attrs.push(Attribute::NoItalic),
            24 => attrs.push(Attribute::NoUnderline),
            25 => attrs.push(Attribute::NoBlink),
            27 => attrs.push(Attribute::NoInverse),
            28 => attrs.push(Attribute::NoHidden),
            29 => attrs.push(Attribute::NoStrikethrough),
            30..=37 => attrs.push(Attribute::Foreground(Color::Indexed((param - 30) as u8))),
            39 => attrs.push(Attribute::Foreground(Color::Default)),
            40..=47 => attrs.push(Attribute::Background(Color::Indexed((param - 40) as u8))),
            49 => attrs.push(Attribute::Background(Color::Default)),
            90..=97 => attrs.push(Attribute::Foreground(Color::Indexed((param - 90 + 8) as u8))),
            100..=107 => {
                attrs.push(Attribute::Background(Color::Indexed((param - 100 + 8) as u8)))
            }
            38 => {
                if let Some(color) = parse_extended_color(&mut iter) {
                    attrs.push(Attribute::Foreground(color));
                }
            }
            48 => {
                if let Some(color) = parse_extended_color(&mut iter) {
                    attrs.push(Attribute::Background(color));
                }
            }
            other => debug!("skipping unknown SGR parameter {}", other),
        }
    }
    attrs
}

/// Parses the tail of a `38;...` / `48;...` extended color: `5;n` indexed
/// or `2;r;g;b` direct. Returns `None` (consuming what it read) on a
/// malformed tail.
fn parse_extended_color(iter: &mut Peekable<Iter<u16>>) -> Option<Color> {
    match iter.next() {
        Some(5) => iter.next().map(|&idx| Color::Indexed(idx.min(255) as u8)),
        Some(2) => {
            let r = iter.next().map(|&v| v.min(255) as u8)?;
            let g = iter.next().map(|&v| v.min(255) as u8)?;
            let b = iter.next().map(|&v| v.min(255) as u8)?;
            Some(Color::Rgb(Rgb(r, g, b)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sgr_is_reset() {
        assert_eq!(parse_sgr(&[]), vec![Attribute::Reset]);
    }

    #[test]
    fn extended_colors() {
        assert_eq!(
            parse_sgr(&[38, 5, 196]),
            vec![Attribute::Foreground(Color::Indexed(196))]
        );
        assert_eq!(
            parse_sgr(&[48, 2, 10, 20, 30]),
            vec![Attribute::Background(Color::Rgb(Rgb(10, 20, 30)))]
        );
    }

    #[test]
    fn bright_ranges_map_to_upper_palette() {
        assert_eq!(
            parse_sgr(&[90]),
            vec![Attribute::Foreground(Color::Indexed(8))]
        );
        assert_eq!(
            parse_sgr(&[107]),
            vec![Attribute::Background(Color::Indexed(15))]
        );
    }

    #[test]
    fn malformed_extended_color_is_dropped_but_rest_survives() {
        // 38;2 with too few components, then a bold.
        assert_eq!(parse_sgr(&[38, 2, 10]), vec![]);
        assert_eq!(parse_sgr(&[4, 38]), vec![Attribute::Underline]);
    }

    #[test]
    fn count_defaults_apply() {
        assert_eq!(CsiCommand::dispatch(&[], false, b'A'), CsiCommand::CursorUp(1));
        assert_eq!(CsiCommand::dispatch(&[0], false, b'A'), CsiCommand::CursorUp(1));
        assert_eq!(
            CsiCommand::dispatch(&[], false, b'J'),
            CsiCommand::EraseInDisplay(EraseMode::ToEnd)
        );
        assert_eq!(
            CsiCommand::dispatch(&[2], false, b'J'),
            CsiCommand::EraseInDisplay(EraseMode::All)
        );
    }

    #[test]
    fn secondary_da_uses_private_marker() {
        assert_eq!(
            CsiCommand::dispatch(&[], true, b'c'),
            CsiCommand::DeviceAttributes(DeviceAttributesLevel::Secondary)
        );
    }
}
