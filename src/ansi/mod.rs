// src/ansi/mod.rs

//! Byte-level decoding of VT100/ANSI/xterm control and escape sequences.
//!
//! [`Parser::feed`] accepts raw PTY output in arbitrarily sized chunks and
//! emits structured [`AnsiCommand`] values; all sequence state survives
//! across calls, so a sequence split at any byte boundary decodes the same
//! as one contiguous chunk.

pub mod commands;
pub mod parser;

pub use commands::{AnsiCommand, Attribute, C0Control, CsiCommand, EscCommand, OscCommand};
pub use parser::Parser;

/// Parameters beyond this count are dropped, not treated as fatal.
pub const MAX_CSI_PARAMS: usize = 16;
/// Intermediate bytes beyond this count push the sequence into the
/// ignore state until its final byte.
pub const MAX_CSI_INTERMEDIATES: usize = 2;
/// OSC payload bytes beyond this length are discarded.
pub const MAX_OSC_STRING_LEN: usize = 1024;
