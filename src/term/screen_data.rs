// src/term/screen_data.rs

//! One screen buffer: the visible grid plus its scrollback ring.
//!
//! Two instances exist for the engine's lifetime (primary and alternate);
//! only the primary ever accumulates scrollback. Lines pushed into
//! scrollback are immutable from then on.

use crate::style::TextStyle;
use crate::term::run::{Line, RunStore};
use std::collections::VecDeque;

pub struct ScreenData {
    lines: Vec<Line>,
    scrollback: VecDeque<Line>,
    /// 0 disables scrollback entirely (the alternate buffer).
    scrollback_limit: usize,
    width: usize,
    height: usize,
}

impl ScreenData {
    pub fn new(
        width: usize,
        height: usize,
        style: TextStyle,
        scrollback_limit: usize,
        store: &mut RunStore,
    ) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let lines = (0..height).map(|_| Line::blank(width, style, store)).collect();
        ScreenData {
            lines,
            scrollback: VecDeque::new(),
            scrollback_limit,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn line(&self, row: usize) -> Option<&Line> {
        self.lines.get(row)
    }

    pub fn line_mut(&mut self, row: usize) -> Option<&mut Line> {
        self.lines.get_mut(row)
    }

    pub fn scrollback_len(&self) -> usize {
        self.scrollback.len()
    }

    /// Scrollback line by age: index 0 is the oldest retained line.
    pub fn scrollback_line(&self, index: usize) -> Option<&Line> {
        self.scrollback.get(index)
    }

    pub fn has_scrollback(&self) -> bool {
        self.scrollback_limit > 0
    }

    /// ED 3: drop all retained history.
    pub fn clear_scrollback(&mut self, store: &mut RunStore) {
        for mut line in self.scrollback.drain(..) {
            line.release_all(store);
        }
    }

    /// Scrolls `[top, bottom]` up by `n`: the top `n` lines leave the
    /// region and blank lines in `style` appear at the bottom. When
    /// `retain` is set and the region starts at row 0, departing lines go
    /// to scrollback (primary buffer printing/LF); otherwise they are
    /// released (alternate buffer, or an inner scroll region).
    pub fn scroll_up(
        &mut self,
        top: usize,
        bottom: usize,
        n: usize,
        style: TextStyle,
        retain: bool,
        store: &mut RunStore,
    ) {
        let bottom = bottom.min(self.height.saturating_sub(1));
        if top > bottom {
            return;
        }
        let region = bottom - top + 1;
        let n = n.min(region);
        if n == 0 {
            return;
        }
        for _ in 0..n {
            let line = self.lines.remove(top);
            if retain && top == 0 && self.has_scrollback() {
                self.push_scrollback(line, store);
            } else {
                let mut line = line;
                line.release_all(store);
            }
            self.lines.insert(bottom, Line::blank(self.width, style, store));
        }
    }

    /// Scrolls `[top, bottom]` down by `n`: blank lines in `style` appear
    /// at the top, lines falling off the bottom of the region are
    /// released. History is never involved.
    pub fn scroll_down(
        &mut self,
        top: usize,
        bottom: usize,
        n: usize,
        style: TextStyle,
        store: &mut RunStore,
    ) {
        let bottom = bottom.min(self.height.saturating_sub(1));
        if top > bottom {
            return;
        }
        let region = bottom - top + 1;
        let n = n.min(region);
        if n == 0 {
            return;
        }
        for _ in 0..n {
            let mut line = self.lines.remove(bottom);
            line.release_all(store);
            self.lines.insert(top, Line::blank(self.width, style, store));
        }
    }

    /// Fills every visible line with blanks in `style`.
    pub fn clear_visible(&mut self, style: TextStyle, store: &mut RunStore) {
        let width = self.width;
        for line in &mut self.lines {
            line.fill(0, width, style, store);
        }
    }

    /// Resizes the grid. New cells and lines are padded with `style`
    /// blanks; excess columns and bottom lines are truncated. Dimensions
    /// are clamped to at least 1x1; scrollback lines are left untouched.
    pub fn resize(&mut self, width: usize, height: usize, style: TextStyle, store: &mut RunStore) {
        let width = width.max(1);
        let height = height.max(1);

        if width != self.width {
            for line in &mut self.lines {
                line.resize(width, style, store);
            }
            self.width = width;
        }

        while self.lines.len() > height {
            if let Some(mut line) = self.lines.pop() {
                line.release_all(store);
            }
        }
        while self.lines.len() < height {
            self.lines.push(Line::blank(width, style, store));
        }
        self.height = height;
    }

    fn push_scrollback(&mut self, line: Line, store: &mut RunStore) {
        if self.scrollback.len() == self.scrollback_limit {
            if let Some(mut oldest) = self.scrollback.pop_front() {
                oldest.release_all(store);
            }
        }
        self.scrollback.push_back(line);
    }
}
