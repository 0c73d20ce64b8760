// src/term/mod.rs

//! Terminal state: the grid, cursor, selection, and change dispatch.

pub mod arena;
pub mod cursor;
pub mod dispatch;
pub mod input;
pub mod modes;
pub mod run;
pub mod screen;
pub mod screen_data;
pub mod selection;
pub mod snapshot;

pub use arena::RunId;
pub use cursor::{Cursor, CursorStack, MAX_SAVED_CURSORS};
pub use dispatch::{ChangeBatch, ChangeDispatcher, Damage};
pub use modes::{DecModeConstant, DecPrivateModes};
pub use run::{Line, RunStore, TextRun};
pub use screen::Screen;
pub use screen_data::ScreenData;
pub use selection::{Selection, SelectionMode};
pub use snapshot::{CursorView, LineView, Point, ScreenSnapshot};

/// Side effects the screen cannot perform itself; the engine carries
/// them out after `apply` returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineAction {
    /// Reply bytes to write back to the child (DA/DSR responses).
    WritePty(Vec<u8>),
    /// The stream set a new window title.
    SetTitle(String),
    /// BEL was received.
    Bell,
}

/// Out-of-band events surfaced to the embedder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Emitted before a resize mutates the grid, carrying the state a
    /// consumer needs to snapshot its scroll position.
    ResizePending {
        cursor_row: usize,
        scrollback_len: usize,
    },
    /// The child process terminated.
    ChildExited(crate::os::pty::ChildExit),
    /// BEL was received during this pump.
    Bell,
    /// The stream set a new window title.
    TitleChanged(String),
}
