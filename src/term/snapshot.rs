// src/term/snapshot.rs

//! Read-only views handed to a renderer. Snapshots copy cell data out of
//! the grid so the renderer never holds references into live state.

use crate::style::TextStyle;

/// A grid coordinate, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

impl Point {
    pub fn new(row: usize, col: usize) -> Self {
        Point { row, col }
    }
}

/// Cursor state as a renderer needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorView {
    pub row: usize,
    pub col: usize,
    pub visible: bool,
    pub style: TextStyle,
}

/// One visible row, fully materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineView {
    pub cells: Vec<(char, TextStyle)>,
}

impl LineView {
    pub fn text(&self) -> String {
        self.cells.iter().map(|&(ch, _)| ch).collect()
    }
}

/// The visible grid at one point in time.
#[derive(Debug, Clone)]
pub struct ScreenSnapshot {
    pub width: usize,
    pub height: usize,
    pub lines: Vec<LineView>,
    pub cursor: CursorView,
    /// Normalized selection anchors, when a selection is active.
    pub selection: Option<(Point, Point)>,
    pub title: String,
}

impl ScreenSnapshot {
    pub fn line_text(&self, row: usize) -> Option<String> {
        self.lines.get(row).map(LineView::text)
    }
}
