// src/lib.rs

//! Core engine of a terminal emulator.
//!
//! The crate decodes the byte stream a child process writes to its
//! pseudo-terminal, maintains a grid of styled text runs with scrollback,
//! cursor state and a selection, and batches grid damage into bounded-rate
//! change notifications for a renderer. Pixel rendering, font handling and
//! window management live outside this crate; they consume read-only
//! snapshots and feed key events back in.
//!
//! Data flow: [`os::pty::PtySession`] → raw bytes → [`ansi::Parser`] →
//! [`ansi::AnsiCommand`] → [`term::Screen::apply`] → damage →
//! [`term::ChangeDispatcher`] → renderer. [`engine::Engine`] wires the
//! pieces together for a single owner thread.

pub mod ansi;
pub mod color;
pub mod config;
pub mod engine;
pub mod keys;
pub mod os;
pub mod style;
pub mod term;

pub use config::Config;
pub use engine::Engine;
