// src/os/mod.rs

//! Operating system integration: the pseudo-terminal session.

pub mod pty;

pub use pty::{ChildExit, PtyConfig, PtySession};
