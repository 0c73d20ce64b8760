// src/term/input.rs

//! Translates logical key events into the byte sequences a child process
//! expects, honoring application cursor keys and bracketed paste.

use crate::keys::{KeySymbol, Modifiers};

/// xterm modifier parameter: 1 + bitmask of shift/alt/control.
fn modifier_code(mods: Modifiers) -> u8 {
    let mut code = 1;
    if mods.contains(Modifiers::SHIFT) {
        code += 1;
    }
    if mods.contains(Modifiers::ALT) {
        code += 2;
    }
    if mods.contains(Modifiers::CONTROL) {
        code += 4;
    }
    code
}

fn csi_with_mods(final_byte: char, mods: Modifiers) -> Vec<u8> {
    if mods.intersects(Modifiers::SHIFT | Modifiers::ALT | Modifiers::CONTROL) {
        format!("\x1b[1;{}{}", modifier_code(mods), final_byte).into_bytes()
    } else {
        format!("\x1b[{}", final_byte).into_bytes()
    }
}

fn tilde_with_mods(number: u8, mods: Modifiers) -> Vec<u8> {
    if mods.intersects(Modifiers::SHIFT | Modifiers::ALT | Modifiers::CONTROL) {
        format!("\x1b[{};{}~", number, modifier_code(mods)).into_bytes()
    } else {
        format!("\x1b[{}~", number).into_bytes()
    }
}

/// Arrow and home/end keys: SS3 under application cursor keys, CSI
/// otherwise. Any modifier forces the CSI form so the modifier parameter
/// has somewhere to go.
fn cursor_key(final_byte: char, mods: Modifiers, app_mode: bool) -> Vec<u8> {
    if app_mode && !mods.intersects(Modifiers::SHIFT | Modifiers::ALT | Modifiers::CONTROL) {
        format!("\x1bO{}", final_byte).into_bytes()
    } else {
        csi_with_mods(final_byte, mods)
    }
}

/// Encodes one key event. Returns an empty vector for keys with no
/// terminal encoding (lone modifiers, unknown symbols).
pub fn encode_key(symbol: KeySymbol, mods: Modifiers, app_cursor_keys: bool) -> Vec<u8> {
    match symbol {
        KeySymbol::Char(ch) => encode_char(ch, mods),

        KeySymbol::Up => cursor_key('A', mods, app_cursor_keys),
        KeySymbol::Down => cursor_key('B', mods, app_cursor_keys),
        KeySymbol::Right => cursor_key('C', mods, app_cursor_keys),
        KeySymbol::Left => cursor_key('D', mods, app_cursor_keys),
        KeySymbol::Home => cursor_key('H', mods, app_cursor_keys),
        KeySymbol::End => cursor_key('F', mods, app_cursor_keys),

        KeySymbol::Insert => tilde_with_mods(2, mods),
        KeySymbol::Delete => tilde_with_mods(3, mods),
        KeySymbol::PageUp => tilde_with_mods(5, mods),
        KeySymbol::PageDown => tilde_with_mods(6, mods),

        KeySymbol::F1 => b"\x1bOP".to_vec(),
        KeySymbol::F2 => b"\x1bOQ".to_vec(),
        KeySymbol::F3 => b"\x1bOR".to_vec(),
        KeySymbol::F4 => b"\x1bOS".to_vec(),
        KeySymbol::F5 => tilde_with_mods(15, mods),
        KeySymbol::F6 => tilde_with_mods(17, mods),
        KeySymbol::F7 => tilde_with_mods(18, mods),
        KeySymbol::F8 => tilde_with_mods(19, mods),
        KeySymbol::F9 => tilde_with_mods(20, mods),
        KeySymbol::F10 => tilde_with_mods(21, mods),
        KeySymbol::F11 => tilde_with_mods(23, mods),
        KeySymbol::F12 => tilde_with_mods(24, mods),

        KeySymbol::Enter => b"\r".to_vec(),
        KeySymbol::Backspace => vec![0x7f],
        KeySymbol::Tab => {
            if mods.contains(Modifiers::SHIFT) {
                b"\x1b[Z".to_vec()
            } else {
                b"\t".to_vec()
            }
        }
        KeySymbol::Escape => vec![0x1b],

        KeySymbol::Unknown => Vec::new(),
    }
}

fn encode_char(ch: char, mods: Modifiers) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(4);
    if mods.contains(Modifiers::ALT) {
        bytes.push(0x1b);
    }
    if mods.contains(Modifiers::CONTROL) {
        if let Some(ctrl) = control_byte(ch) {
            bytes.push(ctrl);
            return bytes;
        }
    }
    let mut buf = [0u8; 4];
    bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
    bytes
}

/// Maps a character to its control byte, when it has one.
fn control_byte(ch: char) -> Option<u8> {
    match ch {
        'a'..='z' => Some(ch as u8 & 0x1f),
        'A'..='Z' => Some(ch as u8 & 0x1f),
        ' ' | '@' => Some(0x00),
        '[' => Some(0x1b),
        '\\' => Some(0x1c),
        ']' => Some(0x1d),
        '^' => Some(0x1e),
        '_' | '/' => Some(0x1f),
        '?' => Some(0x7f),
        _ => None,
    }
}

/// Encodes pasted text, framing it when bracketed paste is active so
/// the application can distinguish it from typed input.
pub fn encode_paste(text: &str, bracketed: bool) -> Vec<u8> {
    if bracketed {
        let mut bytes = Vec::with_capacity(text.len() + 12);
        bytes.extend_from_slice(b"\x1b[200~");
        bytes.extend_from_slice(text.as_bytes());
        bytes.extend_from_slice(b"\x1b[201~");
        bytes
    } else {
        text.as_bytes().to_vec()
    }
}
