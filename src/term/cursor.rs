// src/term/cursor.rs

//! Cursor position, visibility, active style and the save/restore stack.

use crate::style::TextStyle;
use log::trace;

/// Maximum saved-cursor depth. A stream looping ESC 7 without ESC 8 would
/// otherwise grow memory without bound; past the cap the oldest snapshot
/// is dropped so the most recent saves remain restorable.
pub const MAX_SAVED_CURSORS: usize = 32;

/// The active cursor: grid position, visibility, the style stamped onto
/// the next printed character, and origin mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// 0-based row, clamped to `[0, height)`.
    pub row: usize,
    /// 0-based column, clamped to `[0, width)`.
    pub col: usize,
    pub visible: bool,
    pub style: TextStyle,
    /// DECOM: when set, absolute addressing is relative to the scroll
    /// region and clamped inside it.
    pub origin_mode: bool,
}

impl Default for Cursor {
    fn default() -> Self {
        Cursor {
            row: 0,
            col: 0,
            visible: true,
            style: TextStyle::default(),
            origin_mode: false,
        }
    }
}

impl Cursor {
    /// Clamps the position into the given grid bounds. Dimensions are
    /// always at least 1x1.
    pub fn clamp(&mut self, width: usize, height: usize) {
        self.col = self.col.min(width.saturating_sub(1));
        self.row = self.row.min(height.saturating_sub(1));
    }
}

/// Bounded stack of cursor snapshots for DECSC/DECRC.
#[derive(Debug, Default)]
pub struct CursorStack {
    saved: Vec<Cursor>,
}

impl CursorStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a full snapshot. At capacity the oldest entry is dropped.
    pub fn push(&mut self, cursor: Cursor) {
        if self.saved.len() == MAX_SAVED_CURSORS {
            trace!("cursor save stack full; dropping oldest snapshot");
            self.saved.remove(0);
        }
        self.saved.push(cursor);
    }

    /// Pops the most recent snapshot. `None` on an empty stack; the caller
    /// leaves the cursor untouched in that case.
    pub fn pop(&mut self) -> Option<Cursor> {
        self.saved.pop()
    }

    pub fn clear(&mut self) {
        self.saved.clear();
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi::commands::Attribute;
    use crate::color::Color;

    #[test]
    fn save_restore_round_trip() {
        let mut stack = CursorStack::new();
        let mut cursor = Cursor::default();
        cursor.row = 3;
        cursor.col = 7;
        cursor.style = cursor.style.apply(Attribute::Foreground(Color::Indexed(2)));
        stack.push(cursor);

        let restored = stack.pop().unwrap();
        assert_eq!(restored, cursor);
        assert!(stack.pop().is_none());
    }

    #[test]
    fn restore_on_empty_stack_is_none() {
        let mut stack = CursorStack::new();
        assert!(stack.pop().is_none());
    }

    #[test]
    fn overflow_drops_oldest() {
        let mut stack = CursorStack::new();
        for i in 0..MAX_SAVED_CURSORS + 5 {
            let mut cursor = Cursor::default();
            cursor.col = i;
            stack.push(cursor);
        }
        assert_eq!(stack.depth(), MAX_SAVED_CURSORS);
        // The most recent save is still on top.
        assert_eq!(stack.pop().unwrap().col, MAX_SAVED_CURSORS + 4);
        // The oldest surviving entry is save #5.
        let mut last = 0;
        while let Some(cursor) = stack.pop() {
            last = cursor.col;
        }
        assert_eq!(last, 5);
    }

    #[test]
    fn clamp_respects_minimum_grid() {
        let mut cursor = Cursor::default();
        cursor.row = 100;
        cursor.col = 100;
        cursor.clamp(80, 24);
        assert_eq!((cursor.row, cursor.col), (23, 79));
        cursor.clamp(1, 1);
        assert_eq!((cursor.row, cursor.col), (0, 0));
    }
}
