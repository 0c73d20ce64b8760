// src/term/run.rs

//! Styled text runs and the lines built from them.
//!
//! A [`Line`] is an ordered sequence of runs covering exactly `width`
//! columns with no gaps or overlap; a [`TextRun`] is a maximal span of
//! characters sharing one style. Gaps created by erasing or padding are
//! filled with space runs carrying the style active at the time, not a
//! fixed default.
//!
//! Runs live in a [`RunStore`], which records creations and releases so
//! the dispatcher can report object lifecycle to the renderer and defer
//! actual deallocation to the flush.

use crate::style::TextStyle;
use crate::term::arena::{Arena, RunId};

/// A maximal horizontal span of characters sharing one style.
/// Every character occupies one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub style: TextStyle,
}

impl TextRun {
    pub fn width(&self) -> usize {
        self.text.chars().count()
    }
}

/// Arena of runs plus the lifecycle log consumed at dispatch flush.
///
/// `release` only parks the id: the run stays resolvable until
/// [`RunStore::finalize_release`] runs, so references handed out mid-tick
/// never dangle.
#[derive(Default)]
pub struct RunStore {
    arena: Arena<TextRun>,
    created: Vec<RunId>,
    released: Vec<RunId>,
}

impl RunStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, text: String, style: TextStyle) -> RunId {
        let id = self.arena.insert(TextRun { text, style });
        self.created.push(id);
        id
    }

    pub fn release(&mut self, id: RunId) {
        self.released.push(id);
    }

    pub fn get(&self, id: RunId) -> Option<&TextRun> {
        self.arena.get(id)
    }

    pub fn get_mut(&mut self, id: RunId) -> Option<&mut TextRun> {
        self.arena.get_mut(id)
    }

    /// Drains the creation/release logs. Called by the dispatcher when
    /// building a change batch.
    pub fn take_lifecycle(&mut self) -> (Vec<RunId>, Vec<RunId>) {
        (
            std::mem::take(&mut self.created),
            std::mem::take(&mut self.released),
        )
    }

    /// Actually frees a released run. Only the dispatch flush calls this.
    pub fn finalize_release(&mut self, id: RunId) {
        self.arena.remove(id);
    }

    pub fn live_runs(&self) -> usize {
        self.arena.len()
    }
}

/// One grid row: run ids covering exactly `width` columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    runs: Vec<RunId>,
    width: usize,
}

impl Line {
    /// A line of `width` spaces in the given style.
    pub fn blank(width: usize, style: TextStyle, store: &mut RunStore) -> Line {
        let mut runs = Vec::with_capacity(1);
        if width > 0 {
            runs.push(store.alloc(" ".repeat(width), style));
        }
        Line { runs, width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn runs(&self) -> &[RunId] {
        &self.runs
    }

    /// The character and style at a column.
    pub fn cell(&self, col: usize, store: &RunStore) -> Option<(char, TextStyle)> {
        let mut cursor = 0;
        for &id in &self.runs {
            let run = store.get(id)?;
            let w = run.width();
            if col < cursor + w {
                let ch = run.text.chars().nth(col - cursor)?;
                return Some((ch, run.style));
            }
            cursor += w;
        }
        None
    }

    /// The full line text, width characters long.
    pub fn text(&self, store: &RunStore) -> String {
        let mut out = String::with_capacity(self.width);
        for &id in &self.runs {
            if let Some(run) = store.get(id) {
                out.push_str(&run.text);
            }
        }
        out
    }

    /// Text of the column range `[start, end)`.
    pub fn text_range(&self, start: usize, end: usize, store: &RunStore) -> String {
        self.text(store)
            .chars()
            .skip(start)
            .take(end.saturating_sub(start))
            .collect()
    }

    /// Writes one character at `col` in `style`, merging with an adjacent
    /// run of identical style where possible.
    pub fn write_char(&mut self, col: usize, ch: char, style: TextStyle, store: &mut RunStore) {
        if col >= self.width {
            return;
        }
        self.splice(col, col + 1, ch.to_string(), style, store);
    }

    /// Overwrites `[start, end)` with spaces in `style`. This is the erase
    /// primitive: the caller supplies the background style active at erase
    /// time.
    pub fn fill(&mut self, start: usize, end: usize, style: TextStyle, store: &mut RunStore) {
        let start = start.min(self.width);
        let end = end.min(self.width);
        if start >= end {
            return;
        }
        self.splice(start, end, " ".repeat(end - start), style, store);
    }

    /// Inserts `n` blank cells at `col`; content shifts right, the
    /// rightmost `n` cells fall off.
    pub fn insert_blanks(&mut self, col: usize, n: usize, style: TextStyle, store: &mut RunStore) {
        if col >= self.width || n == 0 {
            return;
        }
        let n = n.min(self.width - col);
        let mut cells = self.cells(store);
        let blanks = vec![(' ', style); n];
        cells.splice(col..col, blanks);
        cells.truncate(self.width);
        self.rebuild(cells, store);
    }

    /// Deletes `n` cells at `col`; content shifts left, blanks in `style`
    /// fill the tail.
    pub fn delete_cells(&mut self, col: usize, n: usize, style: TextStyle, store: &mut RunStore) {
        if col >= self.width || n == 0 {
            return;
        }
        let n = n.min(self.width - col);
        let mut cells = self.cells(store);
        cells.drain(col..col + n);
        cells.extend(std::iter::repeat((' ', style)).take(n));
        self.rebuild(cells, store);
    }

    /// Grows (padding with `pad_style` blanks) or shrinks the line to
    /// `new_width` columns.
    pub fn resize(&mut self, new_width: usize, pad_style: TextStyle, store: &mut RunStore) {
        if new_width == self.width {
            return;
        }
        let mut cells = self.cells(store);
        if new_width > self.width {
            cells.extend(std::iter::repeat((' ', pad_style)).take(new_width - self.width));
        } else {
            cells.truncate(new_width);
        }
        self.width = new_width;
        self.rebuild(cells, store);
    }

    /// Releases every run, leaving the line empty. Used when a line is
    /// dropped from the grid entirely.
    pub fn release_all(&mut self, store: &mut RunStore) {
        for id in self.runs.drain(..) {
            store.release(id);
        }
        self.width = 0;
    }

    fn cells(&self, store: &RunStore) -> Vec<(char, TextStyle)> {
        let mut cells = Vec::with_capacity(self.width);
        for &id in &self.runs {
            if let Some(run) = store.get(id) {
                cells.extend(run.text.chars().map(|c| (c, run.style)));
            }
        }
        cells
    }

    fn rebuild(&mut self, cells: Vec<(char, TextStyle)>, store: &mut RunStore) {
        for id in self.runs.drain(..) {
            store.release(id);
        }
        let mut current: Option<(String, TextStyle)> = None;
        for (ch, style) in cells {
            match &mut current {
                Some((text, cur_style)) if *cur_style == style => text.push(ch),
                _ => {
                    if let Some((text, style)) = current.take() {
                        self.runs.push(store.alloc(text, style));
                    }
                    current = Some((ch.to_string(), style));
                }
            }
        }
        if let Some((text, style)) = current {
            self.runs.push(store.alloc(text, style));
        }
    }

    /// Replaces columns `[start, end)` with `text` (exactly `end - start`
    /// characters) in `style`, splitting boundary runs and re-merging
    /// equal-style neighbors.
    fn splice(
        &mut self,
        start: usize,
        end: usize,
        text: String,
        style: TextStyle,
        store: &mut RunStore,
    ) {
        debug_assert!(start < end && end <= self.width);
        let mut rebuilt: Vec<RunId> = Vec::with_capacity(self.runs.len() + 2);
        let mut inserted = false;
        let mut cursor = 0;

        for &id in &self.runs {
            let run_width = store.get(id).map(TextRun::width).unwrap_or(0);
            let (run_start, run_end) = (cursor, cursor + run_width);
            cursor = run_end;

            if run_end <= start || run_start >= end {
                rebuilt.push(id);
                continue;
            }

            // Affected run: keep the part left of `start` and the part
            // right of `end`, drop the middle.
            let (run_text, run_style) = {
                let run = store.get(id).expect("line references live run");
                (run.text.clone(), run.style)
            };
            if run_start < start {
                let keep: String = run_text.chars().take(start - run_start).collect();
                rebuilt.push(store.alloc(keep, run_style));
            }
            if !inserted {
                rebuilt.push(store.alloc(text.clone(), style));
                inserted = true;
            }
            if run_end > end {
                let keep: String = run_text.chars().skip(end - run_start).collect();
                rebuilt.push(store.alloc(keep, run_style));
            }
            store.release(id);
        }

        // Merge equal-style neighbors back into maximal runs.
        let mut merged: Vec<RunId> = Vec::with_capacity(rebuilt.len());
        for id in rebuilt {
            let merge = match merged.last() {
                Some(&prev) => match (store.get(prev), store.get(id)) {
                    (Some(a), Some(b)) => a.style == b.style,
                    _ => false,
                },
                None => false,
            };
            if merge {
                let tail = store.get(id).expect("checked above").text.clone();
                let prev = *merged.last().expect("checked above");
                store
                    .get_mut(prev)
                    .expect("checked above")
                    .text
                    .push_str(&tail);
                store.release(id);
            } else {
                merged.push(id);
            }
        }
        self.runs = merged;
    }
}
