// src/ansi/parser.rs

//! The escape-sequence state machine.
//!
//! One byte at a time, regardless of how input is chunked: every piece of
//! in-flight sequence state (mode, parameter list, OSC payload, partial
//! UTF-8 character) lives in the `Parser` itself, so splitting a stream at
//! any byte boundary yields the same command sequence.
//!
//! Error policy: anything that does not complete a recognized sequence is
//! discarded and the machine resynchronizes; parsing never fails.

use super::commands::{AnsiCommand, C0Control, CsiCommand, OscCommand};
use super::{MAX_CSI_INTERMEDIATES, MAX_CSI_PARAMS, MAX_OSC_STRING_LEN};
use log::{debug, trace};
use std::collections::VecDeque;
use utf8parse::{Parser as Utf8Parser, Receiver as Utf8Receiver};

const BEL: u8 = 0x07;
const CAN: u8 = 0x18;
const SUB: u8 = 0x1A;
const ESC: u8 = 0x1B;
const DEL: u8 = 0x7F;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    /// Printable text and C0 controls.
    #[default]
    Ground,
    /// ESC seen, selecting the sequence type.
    Escape,
    /// Charset designation (ESC `(` etc.); the next byte is consumed and
    /// the designation discarded as unsupported.
    EscIntermediate,
    /// Collecting CSI parameters and intermediates.
    CsiParam,
    /// Collecting CSI intermediate bytes (0x20-0x2F) after parameters.
    CsiIntermediate,
    /// Malformed or oversized CSI; consuming until the final byte.
    CsiIgnore,
    /// Collecting an OSC payload.
    OscString,
    /// ESC inside an OSC payload: either ESC `\` (terminator) or an abort.
    OscEsc,
    /// Consuming a DCS/PM/APC string this core does not interpret.
    StringIgnore,
    /// ESC inside an ignored string.
    StringIgnoreEsc,
}

/// Re-entrant ANSI parser. See the module docs for the contract.
pub struct Parser {
    state: State,
    params: Vec<u16>,
    /// Parameter currently being accumulated from digits, if any.
    cur_param: Option<u16>,
    params_truncated: bool,
    intermediates: Vec<u8>,
    /// Private-parameter marker (`?`, `>`, `=`) seen at sequence start.
    private_marker: Option<u8>,
    osc_string: Vec<u8>,
    utf8: Utf8Parser,
    queue: VecDeque<AnsiCommand>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            state: State::Ground,
            params: Vec::with_capacity(MAX_CSI_PARAMS),
            cur_param: None,
            params_truncated: false,
            intermediates: Vec::with_capacity(MAX_CSI_INTERMEDIATES),
            private_marker: None,
            osc_string: Vec::with_capacity(64),
            utf8: Utf8Parser::new(),
            queue: VecDeque::new(),
        }
    }

    /// Feeds a chunk of PTY output, returning every command completed by it.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<AnsiCommand> {
        for &byte in bytes {
            self.advance(byte);
        }
        self.queue.drain(..).collect()
    }

    fn advance(&mut self, byte: u8) {
        match self.state {
            State::Ground => self.ground(byte),
            State::Escape => self.escape(byte),
            State::EscIntermediate => self.esc_intermediate(byte),
            State::CsiParam => self.csi_param(byte),
            State::CsiIntermediate => self.csi_intermediate(byte),
            State::CsiIgnore => self.csi_ignore(byte),
            State::OscString => self.osc_string(byte),
            State::OscEsc => self.osc_esc(byte),
            State::StringIgnore => self.string_ignore(byte),
            State::StringIgnoreEsc => self.string_ignore_esc(byte),
        }
    }

    fn emit(&mut self, command: AnsiCommand) {
        self.queue.push_back(command);
    }

    /// C0 controls execute immediately in every state except OSC/string
    /// collection. Returns true when the byte was consumed here.
    fn execute_c0(&mut self, byte: u8) -> bool {
        if byte >= 0x20 {
            return false;
        }
        match byte {
            ESC => false, // handled by the caller's state logic
            CAN | SUB => {
                trace!("sequence cancelled by 0x{:02X}", byte);
                self.reset_collect();
                self.state = State::Ground;
                true
            }
            _ => {
                self.emit(AnsiCommand::C0(C0Control::from_byte(byte)));
                true
            }
        }
    }

    fn reset_collect(&mut self) {
        self.params.clear();
        self.cur_param = None;
        self.params_truncated = false;
        self.intermediates.clear();
        self.private_marker = None;
        self.osc_string.clear();
    }

    // --- Ground ---

    fn ground(&mut self, byte: u8) {
        match byte {
            ESC => {
                self.reset_collect();
                self.state = State::Escape;
            }
            0x00..=0x1F => {
                self.emit(AnsiCommand::C0(C0Control::from_byte(byte)));
            }
            DEL => {}
            _ => {
                // All printable input, ASCII included, goes through the
                // UTF-8 assembler so multi-byte characters survive chunk
                // boundaries. Invalid sequences become U+FFFD.
                let mut sink = CharSink {
                    queue: &mut self.queue,
                };
                self.utf8.advance(&mut sink, byte);
            }
        }
    }

    // --- Escape ---

    fn escape(&mut self, byte: u8) {
        if self.execute_c0(byte) {
            return;
        }
        match byte {
            ESC => {} // restart
            b'[' => self.state = State::CsiParam,
            b']' => self.state = State::OscString,
            b'P' | b'^' | b'_' => self.state = State::StringIgnore,
            b'(' | b')' | b'*' | b'+' => self.state = State::EscIntermediate,
            b'\\' => self.state = State::Ground, // stray ST
            _ => {
                match AnsiCommand::from_esc(byte) {
                    Some(command) => self.emit(command),
                    None => debug!("discarding unknown escape: ESC 0x{:02X}", byte),
                }
                self.state = State::Ground;
            }
        }
    }

    fn esc_intermediate(&mut self, byte: u8) {
        if self.execute_c0(byte) {
            return;
        }
        // Charset designations are parsed for resynchronization only.
        trace!("discarding charset designation final 0x{:02X}", byte);
        self.state = if byte == ESC { State::Escape } else { State::Ground };
    }

    // --- CSI ---

    fn csi_param(&mut self, byte: u8) {
        if self.execute_c0(byte) {
            return;
        }
        match byte {
            ESC => {
                // Aborted mid-sequence; nothing collected may leak into
                // whatever the new ESC starts.
                self.reset_collect();
                self.state = State::Escape;
            }
            b'0'..=b'9' => self.push_digit(byte - b'0'),
            b';' => self.next_param(),
            b'?' | b'>' | b'=' => {
                if self.params.is_empty() && self.cur_param.is_none() {
                    self.private_marker = Some(byte);
                } else {
                    debug!("private marker after parameters; ignoring sequence");
                    self.state = State::CsiIgnore;
                }
            }
            0x20..=0x2F => {
                if self.intermediates.len() < MAX_CSI_INTERMEDIATES {
                    self.intermediates.push(byte);
                    self.state = State::CsiIntermediate;
                } else {
                    self.state = State::CsiIgnore;
                }
            }
            0x40..=0x7E => self.csi_dispatch(byte),
            _ => {
                debug!("unexpected byte 0x{:02X} in CSI; ignoring sequence", byte);
                self.state = State::CsiIgnore;
            }
        }
    }

    fn csi_intermediate(&mut self, byte: u8) {
        if self.execute_c0(byte) {
            return;
        }
        match byte {
            ESC => {
                self.reset_collect();
                self.state = State::Escape;
            }
            0x20..=0x2F => {
                if self.intermediates.len() < MAX_CSI_INTERMEDIATES {
                    self.intermediates.push(byte);
                } else {
                    self.state = State::CsiIgnore;
                }
            }
            0x40..=0x7E => self.csi_dispatch(byte),
            _ => self.state = State::CsiIgnore,
        }
    }

    fn csi_ignore(&mut self, byte: u8) {
        if self.execute_c0(byte) {
            return;
        }
        match byte {
            ESC => {
                self.reset_collect();
                self.state = State::Escape;
            }
            0x40..=0x7E => {
                self.reset_collect();
                self.state = State::Ground;
            }
            _ => {}
        }
    }

    fn push_digit(&mut self, digit: u8) {
        if self.params_truncated {
            return;
        }
        let cur = self.cur_param.unwrap_or(0);
        self.cur_param = Some(cur.saturating_mul(10).saturating_add(digit as u16));
    }

    fn next_param(&mut self) {
        if self.params.len() >= MAX_CSI_PARAMS {
            // Excess parameters are dropped, never fatal.
            self.params_truncated = true;
            self.cur_param = None;
            return;
        }
        self.params.push(self.cur_param.take().unwrap_or(0));
    }

    fn csi_dispatch(&mut self, final_byte: u8) {
        if let Some(param) = self.cur_param.take() {
            if self.params.len() < MAX_CSI_PARAMS {
                self.params.push(param);
            }
        }
        let private = self.private_marker.is_some();

        // Sequences with intermediate bytes (e.g. DECSCUSR's space) are
        // outside the supported set; discard them whole.
        if !self.intermediates.is_empty() {
            debug!(
                "discarding CSI with intermediates {:?}, final 0x{:02X}",
                self.intermediates, final_byte
            );
        } else if self.private_marker == Some(b'?') && matches!(final_byte, b'h' | b'l') {
            // One DECSET/DECRST sequence may toggle several modes.
            let set = final_byte == b'h';
            let params = if self.params.is_empty() { vec![0] } else { self.params.clone() };
            for mode in params {
                let command = if set {
                    CsiCommand::SetModePrivate(mode)
                } else {
                    CsiCommand::ResetModePrivate(mode)
                };
                self.emit(AnsiCommand::Csi(command));
            }
        } else if !private && matches!(final_byte, b'h' | b'l') {
            let set = final_byte == b'h';
            let params = if self.params.is_empty() { vec![0] } else { self.params.clone() };
            for mode in params {
                let command = if set {
                    CsiCommand::SetMode(mode)
                } else {
                    CsiCommand::ResetMode(mode)
                };
                self.emit(AnsiCommand::Csi(command));
            }
        } else {
            let command = CsiCommand::dispatch(&self.params, private, final_byte);
            self.emit(AnsiCommand::Csi(command));
        }

        self.reset_collect();
        self.state = State::Ground;
    }

    // --- OSC ---

    fn osc_string(&mut self, byte: u8) {
        match byte {
            BEL => {
                self.osc_dispatch();
                self.state = State::Ground;
            }
            ESC => self.state = State::OscEsc,
            0x00..=0x1F => {
                // Only the terminator ends collection; other controls are
                // dropped from the payload.
            }
            _ => {
                if self.osc_string.len() < MAX_OSC_STRING_LEN {
                    self.osc_string.push(byte);
                }
            }
        }
    }

    fn osc_esc(&mut self, byte: u8) {
        if byte == b'\\' {
            self.osc_dispatch();
            self.state = State::Ground;
        } else {
            // Aborted OSC: drop the payload and reprocess the byte as a
            // fresh escape.
            debug!("OSC aborted by ESC 0x{:02X}", byte);
            self.osc_string.clear();
            self.state = State::Escape;
            self.escape(byte);
        }
    }

    fn osc_dispatch(&mut self) {
        let content = String::from_utf8_lossy(&self.osc_string).into_owned();
        self.osc_string.clear();

        let mut parts = content.splitn(2, ';');
        let code = parts.next().unwrap_or("");
        let arg = parts.next().unwrap_or("").to_string();

        let command = match code {
            "0" => OscCommand::SetIconAndWindowTitle(arg),
            "1" => OscCommand::SetIconName(arg),
            "2" => OscCommand::SetWindowTitle(arg),
            _ => {
                debug!("unsupported OSC code '{}'", code);
                OscCommand::Unsupported {
                    code: code.parse().unwrap_or(-1),
                    data: arg,
                }
            }
        };
        self.emit(AnsiCommand::Osc(command));
    }

    // --- Ignored strings (DCS/PM/APC) ---

    fn string_ignore(&mut self, byte: u8) {
        match byte {
            BEL => self.state = State::Ground,
            ESC => self.state = State::StringIgnoreEsc,
            _ => {}
        }
    }

    fn string_ignore_esc(&mut self, byte: u8) {
        if byte == b'\\' {
            self.state = State::Ground;
        } else {
            self.state = State::Escape;
            self.escape(byte);
        }
    }
}

/// Pushes completed codepoints from the UTF-8 assembler into the command
/// queue. The parser only routes ground-state printable bytes here.
struct CharSink<'a> {
    queue: &'a mut VecDeque<AnsiCommand>,
}

impl Utf8Receiver for CharSink<'_> {
    fn codepoint(&mut self, c: char) {
        self.queue.push_back(AnsiCommand::Print(c));
    }

    fn invalid_sequence(&mut self) {
        self.queue
            .push_back(AnsiCommand::Print(char::REPLACEMENT_CHARACTER));
    }
}

#[cfg(test)]
mod tests;
