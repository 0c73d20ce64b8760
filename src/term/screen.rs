// src/term/screen.rs

//! The screen orchestrator: applies parsed commands to the current
//! buffer, tracks the cursor and modes, and records damage for the
//! dispatcher.
//!
//! `apply` never fails. Malformed or unsupported commands are absorbed;
//! the only outward effects are the optional [`EngineAction`] replies
//! (DA/DSR/bell/title) the engine forwards.

use crate::ansi::commands::{
    AnsiCommand, C0Control, CsiCommand, DeviceAttributesLevel, EraseMode, EscCommand, OscCommand,
};
use crate::config::Config;
use crate::style::TextStyle;
use crate::term::cursor::{Cursor, CursorStack};
use crate::term::dispatch::Damage;
use crate::term::modes::{DecModeConstant, DecPrivateModes};
use crate::term::run::RunStore;
use crate::term::screen_data::ScreenData;
use crate::term::selection::{Selection, SelectionMode};
use crate::term::snapshot::{CursorView, LineView, Point, ScreenSnapshot};
use crate::term::{EngineAction, EngineEvent};
use log::{debug, trace};

const TAB_WIDTH: usize = 8;

const DA_PRIMARY_REPLY: &[u8] = b"\x1b[?6c";
const DA_SECONDARY_REPLY: &[u8] = b"\x1b[>1;95;0c";

pub struct Screen {
    primary: ScreenData,
    alternate: ScreenData,
    alt_active: bool,
    store: RunStore,
    cursor: Cursor,
    saved_cursors: CursorStack,
    modes: DecPrivateModes,
    /// Scroll region, 0-based inclusive.
    scroll_top: usize,
    scroll_bottom: usize,
    /// Printing at the last column defers the wrap to the next print.
    wrap_pending: bool,
    title: String,
    selection: Selection,
    word_separators: String,
    damage: Damage,
}

impl Screen {
    pub fn new(width: usize, height: usize, config: &Config) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut store = RunStore::new();
        let primary = ScreenData::new(
            width,
            height,
            TextStyle::default(),
            config.behavior.scrollback_limit,
            &mut store,
        );
        let alternate = ScreenData::new(width, height, TextStyle::default(), 0, &mut store);
        Screen {
            primary,
            alternate,
            alt_active: false,
            store,
            cursor: Cursor::default(),
            saved_cursors: CursorStack::new(),
            modes: DecPrivateModes::default(),
            scroll_top: 0,
            scroll_bottom: height - 1,
            wrap_pending: false,
            title: String::new(),
            selection: Selection::new(),
            word_separators: config.behavior.word_separators.clone(),
            damage: Damage::default(),
        }
    }

    pub fn width(&self) -> usize {
        self.current().width()
    }

    pub fn height(&self) -> usize {
        self.current().height()
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn modes(&self) -> &DecPrivateModes {
        &self.modes
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn alt_screen_active(&self) -> bool {
        self.alt_active
    }

    pub fn scrollback_len(&self) -> usize {
        self.primary.scrollback_len()
    }

    pub fn run_store(&self) -> &RunStore {
        &self.store
    }

    pub fn run_store_mut(&mut self) -> &mut RunStore {
        &mut self.store
    }

    pub fn current(&self) -> &ScreenData {
        if self.alt_active {
            &self.alternate
        } else {
            &self.primary
        }
    }

    /// Full text of a visible row. Used by tests and debugging surfaces.
    pub fn line_text(&self, row: usize) -> Option<String> {
        self.current().line(row).map(|line| line.text(&self.store))
    }

    /// Drains the damage accumulated since the last call.
    pub fn take_damage(&mut self) -> Damage {
        std::mem::take(&mut self.damage)
    }

    /// Applies one parsed command. Returns a side effect for the engine
    /// to carry out, if the command produced one.
    pub fn apply(&mut self, command: AnsiCommand) -> Option<EngineAction> {
        trace!("apply {:?}", command);
        match command {
            AnsiCommand::Print(ch) => {
                self.print(ch);
                None
            }
            AnsiCommand::C0(control) => self.apply_c0(control),
            AnsiCommand::Csi(csi) => self.apply_csi(csi),
            AnsiCommand::Esc(esc) => {
                self.apply_esc(esc);
                None
            }
            AnsiCommand::Osc(osc) => self.apply_osc(osc),
        }
    }

    /// Resizes both buffers, returning the pre-mutation notification a
    /// consumer needs to re-anchor its scroll position. Degenerate sizes
    /// are clamped to 1x1; the selection and scroll region are reset.
    pub fn resize(&mut self, width: usize, height: usize) -> EngineEvent {
        let event = EngineEvent::ResizePending {
            cursor_row: self.cursor.row,
            scrollback_len: self.primary.scrollback_len(),
        };
        let width = width.max(1);
        let height = height.max(1);
        self.primary
            .resize(width, height, TextStyle::default(), &mut self.store);
        self.alternate
            .resize(width, height, TextStyle::default(), &mut self.store);
        self.scroll_top = 0;
        self.scroll_bottom = height - 1;
        self.cursor.clamp(width, height);
        self.wrap_pending = false;
        self.selection.clear();
        self.damage.mark_all();
        self.damage.mark_cursor();
        event
    }

    // Selection surface.

    pub fn begin_selection(&mut self, anchor: Point, mode: SelectionMode) {
        self.selection.begin(anchor, mode);
    }

    pub fn extend_selection(&mut self, to: Point) {
        self.selection.extend(to);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_text(&self) -> Option<String> {
        self.selection.text(self.current(), &self.store)
    }

    pub fn select_word_at(&mut self, at: Point) {
        let data = if self.alt_active {
            &self.alternate
        } else {
            &self.primary
        };
        self.selection
            .select_word_at(at, &self.word_separators, data, &self.store);
    }

    /// Materializes the visible grid for a renderer.
    pub fn snapshot(&self) -> ScreenSnapshot {
        let data = self.current();
        let lines = (0..data.height())
            .map(|row| {
                let cells = match data.line(row) {
                    Some(line) => (0..data.width())
                        .map(|col| line.cell(col, &self.store).unwrap_or((' ', TextStyle::default())))
                        .collect(),
                    None => Vec::new(),
                };
                LineView { cells }
            })
            .collect();
        ScreenSnapshot {
            width: data.width(),
            height: data.height(),
            lines,
            cursor: CursorView {
                row: self.cursor.row,
                col: self.cursor.col,
                visible: self.cursor.visible,
                style: self.cursor.style,
            },
            selection: self.selection.normalized(),
            title: self.title.clone(),
        }
    }

    // Command handlers.

    fn print(&mut self, ch: char) {
        if self.wrap_pending {
            self.wrap_pending = false;
            if self.modes.autowrap {
                self.carriage_return();
                self.line_feed();
            }
        }
        let style = self.cursor.style;
        let (row, col) = (self.cursor.row, self.cursor.col);
        let width = {
            let (data, store) = self.parts();
            if let Some(line) = data.line_mut(row) {
                line.write_char(col, ch, style, store);
            }
            data.width()
        };
        self.damage.mark_line(row);
        if col + 1 < width {
            self.cursor.col = col + 1;
        } else {
            self.wrap_pending = true;
        }
        self.damage.mark_cursor();
    }

    fn apply_c0(&mut self, control: C0Control) -> Option<EngineAction> {
        match control {
            C0Control::Bell => return Some(EngineAction::Bell),
            C0Control::Backspace => {
                self.cursor.col = self.cursor.col.saturating_sub(1);
                self.wrap_pending = false;
                self.damage.mark_cursor();
            }
            C0Control::Tab => {
                let width = self.width();
                self.cursor.col = ((self.cursor.col / TAB_WIDTH + 1) * TAB_WIDTH).min(width - 1);
                self.wrap_pending = false;
                self.damage.mark_cursor();
            }
            C0Control::LineFeed | C0Control::VerticalTab | C0Control::FormFeed => {
                self.line_feed();
            }
            C0Control::CarriageReturn => self.carriage_return(),
            C0Control::Ignored(byte) => trace!("ignoring C0 byte 0x{:02X}", byte),
        }
        None
    }

    fn apply_csi(&mut self, command: CsiCommand) -> Option<EngineAction> {
        use CsiCommand::*;
        match command {
            CursorUp(n) => self.move_cursor_vertical(-(n as isize)),
            CursorDown(n) => self.move_cursor_vertical(n as isize),
            CursorForward(n) => {
                let width = self.width();
                self.cursor.col = (self.cursor.col + n as usize).min(width - 1);
                self.cursor_moved();
            }
            CursorBackward(n) => {
                self.cursor.col = self.cursor.col.saturating_sub(n as usize);
                self.cursor_moved();
            }
            CursorNextLine(n) => {
                self.move_cursor_vertical(n as isize);
                self.cursor.col = 0;
            }
            CursorPrevLine(n) => {
                self.move_cursor_vertical(-(n as isize));
                self.cursor.col = 0;
            }
            CursorColumn(n) => {
                let width = self.width();
                self.cursor.col = (n as usize - 1).min(width - 1);
                self.cursor_moved();
            }
            CursorRow(n) => {
                self.cursor.row = self.absolute_row(n);
                self.cursor_moved();
            }
            CursorPosition { row, col } => {
                let width = self.width();
                self.cursor.row = self.absolute_row(row);
                self.cursor.col = (col as usize - 1).min(width - 1);
                self.cursor_moved();
            }
            EraseInDisplay(mode) => self.erase_in_display(mode),
            EraseInLine(mode) => self.erase_in_line(mode),
            EraseCharacter(n) => {
                let style = self.blank_style();
                let (row, col) = (self.cursor.row, self.cursor.col);
                let (data, store) = self.parts();
                if let Some(line) = data.line_mut(row) {
                    line.fill(col, col + n as usize, style, store);
                }
                self.damage.mark_line(row);
            }
            InsertCharacter(n) => {
                let style = self.blank_style();
                let (row, col) = (self.cursor.row, self.cursor.col);
                let (data, store) = self.parts();
                if let Some(line) = data.line_mut(row) {
                    line.insert_blanks(col, n as usize, style, store);
                }
                self.damage.mark_line(row);
            }
            DeleteCharacter(n) => {
                let style = self.blank_style();
                let (row, col) = (self.cursor.row, self.cursor.col);
                let (data, store) = self.parts();
                if let Some(line) = data.line_mut(row) {
                    line.delete_cells(col, n as usize, style, store);
                }
                self.damage.mark_line(row);
            }
            InsertLine(n) => self.insert_lines(n as usize),
            DeleteLine(n) => self.delete_lines(n as usize),
            ScrollUp(n) => self.scroll_region_up(n as usize),
            ScrollDown(n) => self.scroll_region_down(n as usize),
            SetGraphicsRendition(attrs) => {
                self.cursor.style = self.cursor.style.apply_all(&attrs);
                self.damage.mark_cursor();
            }
            SetScrollRegion { top, bottom } => self.set_scroll_region(top, bottom),
            SetModePrivate(mode) => self.set_dec_mode(mode, true),
            ResetModePrivate(mode) => self.set_dec_mode(mode, false),
            SetMode(mode) | ResetMode(mode) => {
                debug!("ignoring ANSI mode {}", mode);
            }
            DeviceStatusReport(5) => return Some(EngineAction::WritePty(b"\x1b[0n".to_vec())),
            DeviceStatusReport(6) => {
                // Region-relative under DECOM. Saturate: a restored cursor
                // may sit outside a region set after the save.
                let row = if self.cursor.origin_mode {
                    self.cursor.row.saturating_sub(self.scroll_top)
                } else {
                    self.cursor.row
                };
                let reply = format!("\x1b[{};{}R", row + 1, self.cursor.col + 1);
                return Some(EngineAction::WritePty(reply.into_bytes()));
            }
            DeviceStatusReport(other) => debug!("ignoring DSR {}", other),
            DeviceAttributes(DeviceAttributesLevel::Primary) => {
                return Some(EngineAction::WritePty(DA_PRIMARY_REPLY.to_vec()));
            }
            DeviceAttributes(DeviceAttributesLevel::Secondary) => {
                return Some(EngineAction::WritePty(DA_SECONDARY_REPLY.to_vec()));
            }
            SaveCursor => self.saved_cursors.push(self.cursor),
            RestoreCursor => self.restore_cursor(),
            Unsupported { final_byte, ref params } => {
                debug!(
                    "unsupported CSI final 0x{:02X} params {:?} ignored",
                    final_byte, params
                );
            }
        }
        None
    }

    fn apply_esc(&mut self, command: EscCommand) {
        match command {
            EscCommand::Index => self.line_feed(),
            EscCommand::NextLine => {
                self.carriage_return();
                self.line_feed();
            }
            EscCommand::ReverseIndex => self.reverse_index(),
            EscCommand::SaveCursor => self.saved_cursors.push(self.cursor),
            EscCommand::RestoreCursor => self.restore_cursor(),
            EscCommand::Reset => self.reset(),
        }
    }

    fn apply_osc(&mut self, command: OscCommand) -> Option<EngineAction> {
        match command {
            OscCommand::SetIconAndWindowTitle(title) | OscCommand::SetWindowTitle(title) => {
                self.title = title.clone();
                self.damage.mark_title();
                Some(EngineAction::SetTitle(title))
            }
            OscCommand::SetIconName(name) => {
                trace!("ignoring icon name {:?}", name);
                None
            }
            OscCommand::Unsupported { code, data } => {
                debug!("ignoring OSC {} with {} payload bytes", code, data.len());
                None
            }
        }
    }

    // Movement and scrolling.

    fn cursor_moved(&mut self) {
        self.wrap_pending = false;
        self.damage.mark_cursor();
    }

    /// Relative vertical movement, stopping at the scroll margins when
    /// the cursor starts inside the region.
    fn move_cursor_vertical(&mut self, delta: isize) {
        let row = self.cursor.row as isize + delta;
        let (min, max) = if delta < 0 {
            let min = if self.cursor.row >= self.scroll_top {
                self.scroll_top
            } else {
                0
            };
            (min, self.height() - 1)
        } else {
            let max = if self.cursor.row <= self.scroll_bottom {
                self.scroll_bottom
            } else {
                self.height() - 1
            };
            (0, max)
        };
        self.cursor.row = row.clamp(min as isize, max as isize) as usize;
        self.cursor_moved();
    }

    /// 1-based absolute row from the stream, honoring origin mode.
    fn absolute_row(&self, row: u16) -> usize {
        let row = row as usize - 1;
        if self.cursor.origin_mode {
            (self.scroll_top + row).min(self.scroll_bottom)
        } else {
            row.min(self.height() - 1)
        }
    }

    fn line_feed(&mut self) {
        self.wrap_pending = false;
        if self.cursor.row == self.scroll_bottom {
            self.scroll_region_up(1);
        } else if self.cursor.row + 1 < self.height() {
            self.cursor.row += 1;
        }
        self.damage.mark_cursor();
    }

    fn reverse_index(&mut self) {
        self.wrap_pending = false;
        if self.cursor.row == self.scroll_top {
            self.scroll_region_down(1);
        } else if self.cursor.row > 0 {
            self.cursor.row -= 1;
        }
        self.damage.mark_cursor();
    }

    fn carriage_return(&mut self) {
        self.cursor.col = 0;
        self.wrap_pending = false;
        self.damage.mark_cursor();
    }

    fn scroll_region_up(&mut self, n: usize) {
        let style = self.blank_style();
        let (top, bottom) = (self.scroll_top, self.scroll_bottom);
        let retain = top == 0 && bottom == self.height() - 1;
        let (data, store) = self.parts();
        data.scroll_up(top, bottom, n, style, retain, store);
        self.damage.mark_lines(top..=bottom);
    }

    fn scroll_region_down(&mut self, n: usize) {
        let style = self.blank_style();
        let (top, bottom) = (self.scroll_top, self.scroll_bottom);
        let (data, store) = self.parts();
        data.scroll_down(top, bottom, n, style, store);
        self.damage.mark_lines(top..=bottom);
    }

    fn insert_lines(&mut self, n: usize) {
        let row = self.cursor.row;
        if row < self.scroll_top || row > self.scroll_bottom {
            return;
        }
        let style = self.blank_style();
        let bottom = self.scroll_bottom;
        let (data, store) = self.parts();
        data.scroll_down(row, bottom, n, style, store);
        self.damage.mark_lines(row..=bottom);
    }

    fn delete_lines(&mut self, n: usize) {
        let row = self.cursor.row;
        if row < self.scroll_top || row > self.scroll_bottom {
            return;
        }
        let style = self.blank_style();
        let bottom = self.scroll_bottom;
        let (data, store) = self.parts();
        data.scroll_up(row, bottom, n, style, false, store);
        self.damage.mark_lines(row..=bottom);
    }

    fn set_scroll_region(&mut self, top: u16, bottom: u16) {
        let height = self.height();
        let top = top as usize - 1;
        let bottom = if bottom == 0 {
            height - 1
        } else {
            (bottom as usize - 1).min(height - 1)
        };
        if top >= bottom {
            debug!("ignoring degenerate scroll region {}..{}", top, bottom);
            return;
        }
        self.scroll_top = top;
        self.scroll_bottom = bottom;
        // DECSTBM homes the cursor, to the region origin under DECOM.
        self.cursor.row = if self.cursor.origin_mode { top } else { 0 };
        self.cursor.col = 0;
        self.cursor_moved();
    }

    // Erasing.

    /// Erased cells carry the background active at erase time.
    fn blank_style(&self) -> TextStyle {
        TextStyle {
            bg: self.cursor.style.bg,
            ..TextStyle::default()
        }
    }

    fn erase_in_display(&mut self, mode: EraseMode) {
        let style = self.blank_style();
        let (row, col) = (self.cursor.row, self.cursor.col);
        let height = self.height();
        let width = self.width();
        match mode {
            EraseMode::ToEnd => {
                let (data, store) = self.parts();
                if let Some(line) = data.line_mut(row) {
                    line.fill(col, width, style, store);
                }
                for r in row + 1..height {
                    if let Some(line) = data.line_mut(r) {
                        line.fill(0, width, style, store);
                    }
                }
                self.damage.mark_lines(row..=height - 1);
            }
            EraseMode::ToStart => {
                let (data, store) = self.parts();
                for r in 0..row {
                    if let Some(line) = data.line_mut(r) {
                        line.fill(0, width, style, store);
                    }
                }
                if let Some(line) = data.line_mut(row) {
                    line.fill(0, col + 1, style, store);
                }
                self.damage.mark_lines(0..=row);
            }
            EraseMode::All => {
                let (data, store) = self.parts();
                data.clear_visible(style, store);
                self.damage.mark_all();
            }
            EraseMode::Scrollback => {
                self.primary.clear_scrollback(&mut self.store);
            }
            EraseMode::Unsupported(param) => debug!("ignoring ED {}", param),
        }
    }

    fn erase_in_line(&mut self, mode: EraseMode) {
        let style = self.blank_style();
        let (row, col) = (self.cursor.row, self.cursor.col);
        let width = self.width();
        let range = match mode {
            EraseMode::ToEnd => (col, width),
            EraseMode::ToStart => (0, col + 1),
            EraseMode::All => (0, width),
            EraseMode::Scrollback | EraseMode::Unsupported(_) => return,
        };
        let (data, store) = self.parts();
        if let Some(line) = data.line_mut(row) {
            line.fill(range.0, range.1, style, store);
        }
        self.damage.mark_line(row);
    }

    // Modes and buffer switching.

    fn set_dec_mode(&mut self, mode: u16, on: bool) {
        let Some(mode) = DecModeConstant::from_u16(mode) else {
            return;
        };
        match mode {
            DecModeConstant::CursorKeys => self.modes.cursor_keys_app_mode = on,
            DecModeConstant::Origin => {
                self.cursor.origin_mode = on;
                self.cursor.row = if on { self.scroll_top } else { 0 };
                self.cursor.col = 0;
                self.cursor_moved();
            }
            DecModeConstant::AutoWrap => self.modes.autowrap = on,
            DecModeConstant::TextCursorEnable => {
                self.cursor.visible = on;
                self.damage.mark_cursor();
            }
            DecModeConstant::AltScreen => self.switch_buffer(on, false),
            DecModeConstant::AltScreenClear => self.switch_buffer(on, on),
            DecModeConstant::SaveRestoreCursor => {
                if on {
                    self.saved_cursors.push(self.cursor);
                } else {
                    self.restore_cursor();
                }
            }
            DecModeConstant::AltScreenSaveRestore => {
                if on {
                    self.saved_cursors.push(self.cursor);
                    self.switch_buffer(true, true);
                } else {
                    self.switch_buffer(false, false);
                    self.restore_cursor();
                }
            }
            DecModeConstant::BracketedPaste => self.modes.bracketed_paste = on,
        }
    }

    /// Switches which buffer is current. Neither buffer's content is
    /// altered by the switch itself; `clear_alt` wipes the alternate on
    /// entry (modes 1047/1049).
    fn switch_buffer(&mut self, to_alt: bool, clear_alt: bool) {
        if to_alt == self.alt_active {
            return;
        }
        self.alt_active = to_alt;
        if to_alt && clear_alt {
            let style = self.blank_style();
            self.alternate.clear_visible(style, &mut self.store);
        }
        self.wrap_pending = false;
        self.selection.clear();
        self.cursor.clamp(self.width(), self.height());
        self.damage.mark_all();
        self.damage.mark_cursor();
    }

    fn restore_cursor(&mut self) {
        // Empty stack leaves the cursor untouched.
        if let Some(saved) = self.saved_cursors.pop() {
            self.cursor = saved;
            self.cursor.clamp(self.width(), self.height());
            // The scroll region may have moved since the save; under
            // DECOM the cursor cannot live outside it.
            if self.cursor.origin_mode {
                self.cursor.row = self.cursor.row.clamp(self.scroll_top, self.scroll_bottom);
            }
        }
        self.wrap_pending = false;
        self.damage.mark_cursor();
    }

    /// RIS: back to the initial state, both buffers blanked.
    fn reset(&mut self) {
        self.cursor = Cursor::default();
        self.saved_cursors.clear();
        self.modes = DecPrivateModes::default();
        self.scroll_top = 0;
        self.scroll_bottom = self.primary.height() - 1;
        self.wrap_pending = false;
        self.alt_active = false;
        self.selection.clear();
        self.primary
            .clear_visible(TextStyle::default(), &mut self.store);
        self.alternate
            .clear_visible(TextStyle::default(), &mut self.store);
        self.damage.mark_all();
        self.damage.mark_cursor();
    }

    fn parts(&mut self) -> (&mut ScreenData, &mut RunStore) {
        let data = if self.alt_active {
            &mut self.alternate
        } else {
            &mut self.primary
        };
        (data, &mut self.store)
    }
}
