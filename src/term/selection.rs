// src/term/selection.rs

//! Text selection over the visible grid.
//!
//! Anchors are grid coordinates and are only meaningful while the grid
//! keeps the dimensions it had when the selection was made; resize and
//! buffer switches disable the selection rather than risk stale text.

use crate::term::run::RunStore;
use crate::term::screen_data::ScreenData;
use crate::term::snapshot::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// A contiguous span reading left to right, top to bottom.
    Linear,
    /// A rectangle spanning the same column range on every row.
    Block,
}

#[derive(Debug, Clone, Copy)]
pub struct Selection {
    start: Point,
    end: Point,
    mode: SelectionMode,
    enabled: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Selection {
            start: Point::new(0, 0),
            end: Point::new(0, 0),
            mode: SelectionMode::Linear,
            enabled: false,
        }
    }
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a selection at `anchor`; both ends start there.
    pub fn begin(&mut self, anchor: Point, mode: SelectionMode) {
        self.start = anchor;
        self.end = anchor;
        self.mode = mode;
        self.enabled = true;
    }

    /// Moves the free end of an active selection. No-op when disabled.
    pub fn extend(&mut self, to: Point) {
        if self.enabled {
            self.end = to;
        }
    }

    /// Disables the selection. Called on resize and buffer switch as well
    /// as by the user clearing it.
    pub fn clear(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// The anchors ordered so the first compares before the second. For
    /// block mode the columns are additionally ordered per-axis.
    pub fn normalized(&self) -> Option<(Point, Point)> {
        if !self.enabled {
            return None;
        }
        let (mut a, mut b) = if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        };
        if self.mode == SelectionMode::Block && a.col > b.col {
            std::mem::swap(&mut a.col, &mut b.col);
        }
        Some((a, b))
    }

    /// Extracts the selected text from the visible grid. Lines are joined
    /// with `\n`; trailing blanks on each selected row are trimmed.
    pub fn text(&self, data: &ScreenData, store: &RunStore) -> Option<String> {
        let (start, end) = self.normalized()?;
        let width = data.width();
        let mut lines = Vec::with_capacity(end.row - start.row + 1);
        for row in start.row..=end.row {
            let line = data.line(row)?;
            let range = match self.mode {
                SelectionMode::Block => (start.col, end.col + 1),
                SelectionMode::Linear => {
                    let from = if row == start.row { start.col } else { 0 };
                    let to = if row == end.row { end.col + 1 } else { width };
                    (from, to)
                }
            };
            lines.push(line.text_range(range.0, range.1, store).trim_end().to_string());
        }
        Some(lines.join("\n"))
    }

    /// Double-click selection: the maximal span of non-separator
    /// characters containing `at`, on its row. Selects nothing if `at`
    /// sits on a separator.
    pub fn select_word_at(
        &mut self,
        at: Point,
        separators: &str,
        data: &ScreenData,
        store: &RunStore,
    ) {
        let line = match data.line(at.row) {
            Some(line) => line,
            None => return,
        };
        let chars: Vec<char> = line.text(store).chars().collect();
        let is_word = |col: usize| {
            chars
                .get(col)
                .map(|ch| !separators.contains(*ch))
                .unwrap_or(false)
        };
        if !is_word(at.col) {
            self.clear();
            return;
        }
        let mut start = at.col;
        while start > 0 && is_word(start - 1) {
            start -= 1;
        }
        let mut end = at.col;
        while is_word(end + 1) {
            end += 1;
        }
        self.start = Point::new(at.row, start);
        self.end = Point::new(at.row, end);
        self.mode = SelectionMode::Linear;
        self.enabled = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::TextStyle;

    const SEPARATORS: &str = " \t\"'`()[]{}<>|,;";

    fn grid(rows: &[&str], store: &mut RunStore) -> ScreenData {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(1);
        let mut data = ScreenData::new(width, rows.len(), TextStyle::default(), 0, store);
        for (row, text) in rows.iter().enumerate() {
            let line = data.line_mut(row).unwrap();
            for (col, ch) in text.chars().enumerate() {
                line.write_char(col, ch, TextStyle::default(), store);
            }
        }
        data
    }

    #[test]
    fn linear_extraction_spans_rows() {
        let mut store = RunStore::new();
        let data = grid(&["hello world", "second line"], &mut store);
        let mut sel = Selection::new();
        sel.begin(Point::new(0, 6), SelectionMode::Linear);
        sel.extend(Point::new(1, 5));
        assert_eq!(sel.text(&data, &store).unwrap(), "world\nsecon");
    }

    #[test]
    fn reversed_anchors_normalize() {
        let mut store = RunStore::new();
        let data = grid(&["abcdef"], &mut store);
        let mut sel = Selection::new();
        sel.begin(Point::new(0, 4), SelectionMode::Linear);
        sel.extend(Point::new(0, 1));
        assert_eq!(sel.text(&data, &store).unwrap(), "bcde");
    }

    #[test]
    fn block_mode_takes_a_rectangle() {
        let mut store = RunStore::new();
        let data = grid(&["abcdef", "ghijkl", "mnopqr"], &mut store);
        let mut sel = Selection::new();
        sel.begin(Point::new(0, 4), SelectionMode::Block);
        sel.extend(Point::new(2, 1));
        assert_eq!(sel.text(&data, &store).unwrap(), "bcde\nhijk\nnopq");
    }

    #[test]
    fn word_selection_stops_at_separators() {
        let mut store = RunStore::new();
        let data = grid(&["ls -la /tmp"], &mut store);
        let mut sel = Selection::new();
        sel.select_word_at(Point::new(0, 4), SEPARATORS, &data, &store);
        assert_eq!(sel.text(&data, &store).unwrap(), "-la");
    }

    #[test]
    fn word_selection_on_separator_clears() {
        let mut store = RunStore::new();
        let data = grid(&["ls -la"], &mut store);
        let mut sel = Selection::new();
        sel.begin(Point::new(0, 0), SelectionMode::Linear);
        sel.select_word_at(Point::new(0, 2), SEPARATORS, &data, &store);
        assert!(!sel.is_enabled());
    }

    #[test]
    fn disabled_selection_yields_nothing() {
        let mut store = RunStore::new();
        let data = grid(&["text"], &mut store);
        let sel = Selection::new();
        assert!(sel.text(&data, &store).is_none());
    }
}
