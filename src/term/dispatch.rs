// src/term/dispatch.rs

//! Debounced change notification.
//!
//! Grid mutation marks damage; `schedule` arms a one-shot flag; `flush`
//! turns everything accumulated since the last flush into a single
//! [`ChangeBatch`] and disarms. However many commands run inside one
//! tick, subscribers see at most one notification for it. Run releases
//! parked in the [`RunStore`] are finalized here and nowhere else.

use crate::term::arena::RunId;
use crate::term::run::RunStore;
use log::debug;
use std::collections::BTreeSet;

/// Damage accumulated by the screen between flushes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Damage {
    pub lines: BTreeSet<usize>,
    pub all_lines: bool,
    pub cursor: bool,
    pub title: bool,
}

impl Damage {
    pub fn mark_line(&mut self, row: usize) {
        if !self.all_lines {
            self.lines.insert(row);
        }
    }

    pub fn mark_lines(&mut self, rows: std::ops::RangeInclusive<usize>) {
        if !self.all_lines {
            self.lines.extend(rows);
        }
    }

    pub fn mark_all(&mut self) {
        self.all_lines = true;
        self.lines.clear();
    }

    pub fn mark_cursor(&mut self) {
        self.cursor = true;
    }

    pub fn mark_title(&mut self) {
        self.title = true;
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && !self.all_lines && !self.cursor && !self.title
    }

    pub fn merge(&mut self, other: Damage) {
        if other.all_lines {
            self.mark_all();
        } else if !self.all_lines {
            self.lines.extend(other.lines);
        }
        self.cursor |= other.cursor;
        self.title |= other.title;
    }
}

/// One flushed notification: everything that changed during the tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    /// Monotonically increasing; a poller compares against the last
    /// version it rendered.
    pub version: u64,
    /// Changed visible rows, sorted ascending. Empty when `all_lines`.
    pub dirty_lines: Vec<usize>,
    pub all_lines: bool,
    pub cursor_changed: bool,
    pub title_changed: bool,
    /// Runs created during the tick.
    pub created_runs: Vec<RunId>,
    /// Runs superseded during the tick. Their ids stop resolving once
    /// this batch is delivered.
    pub released_runs: Vec<RunId>,
}

/// Coalesces damage into at most one notification per scheduled tick.
#[derive(Default)]
pub struct ChangeDispatcher {
    pending: Damage,
    armed: bool,
    version: u64,
    on_flush: Option<Box<dyn FnMut(&ChangeBatch)>>,
}

impl ChangeDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds screen damage into the pending set. Idempotent.
    pub fn absorb(&mut self, damage: Damage) {
        self.pending.merge(damage);
    }

    /// Arms the one-shot flush. Returns `true` only when this call armed
    /// it; callers start their tick timer exactly then.
    pub fn schedule(&mut self) -> bool {
        if self.armed {
            return false;
        }
        self.armed = true;
        true
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Disarms without flushing. Used during teardown so no flush fires
    /// against state that is about to go away.
    pub fn cancel(&mut self) {
        self.armed = false;
        self.pending = Damage::default();
    }

    /// Registers the flush callback. Pollers can instead watch
    /// [`ChangeDispatcher::version`].
    pub fn on_flush(&mut self, callback: impl FnMut(&ChangeBatch) + 'static) {
        self.on_flush = Some(Box::new(callback));
    }

    /// Version of the last flushed batch.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The tick fired: emit one batch covering everything since the last
    /// flush, finalize deferred run releases, and disarm. Returns `None`
    /// when not armed.
    pub fn flush(&mut self, store: &mut RunStore) -> Option<ChangeBatch> {
        if !self.armed {
            return None;
        }
        self.armed = false;
        let damage = std::mem::take(&mut self.pending);
        let (created, released) = store.take_lifecycle();
        for &id in &released {
            store.finalize_release(id);
        }
        self.version += 1;
        let batch = ChangeBatch {
            version: self.version,
            dirty_lines: damage.lines.into_iter().collect(),
            all_lines: damage.all_lines,
            cursor_changed: damage.cursor,
            title_changed: damage.title,
            created_runs: created,
            released_runs: released,
        };
        debug!(
            "flush v{}: {} dirty lines (all={}), cursor={}, {} created / {} released runs",
            batch.version,
            batch.dirty_lines.len(),
            batch.all_lines,
            batch.cursor_changed,
            batch.created_runs.len(),
            batch.released_runs.len()
        );
        if let Some(callback) = &mut self.on_flush {
            callback(&batch);
        }
        Some(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn schedule_arms_once() {
        let mut dispatcher = ChangeDispatcher::new();
        assert!(dispatcher.schedule());
        assert!(!dispatcher.schedule());
        assert!(dispatcher.is_armed());
    }

    #[test]
    fn flush_without_schedule_is_none() {
        let mut dispatcher = ChangeDispatcher::new();
        let mut store = RunStore::new();
        dispatcher.absorb(Damage {
            cursor: true,
            ..Damage::default()
        });
        assert!(dispatcher.flush(&mut store).is_none());
    }

    #[test]
    fn damage_coalesces_into_one_sorted_batch() {
        let mut dispatcher = ChangeDispatcher::new();
        let mut store = RunStore::new();
        let mut damage = Damage::default();
        damage.mark_line(5);
        damage.mark_line(2);
        damage.mark_line(5);
        damage.mark_cursor();
        dispatcher.absorb(damage);
        dispatcher.schedule();

        let batch = dispatcher.flush(&mut store).unwrap();
        assert_eq!(batch.dirty_lines, vec![2, 5]);
        assert!(batch.cursor_changed);
        assert!(!dispatcher.is_armed());
        assert!(dispatcher.flush(&mut store).is_none());
    }

    #[test]
    fn flush_finalizes_deferred_releases() {
        let mut dispatcher = ChangeDispatcher::new();
        let mut store = RunStore::new();
        let id = store.alloc("x".into(), Default::default());
        store.release(id);
        // Parked, still resolvable.
        assert!(store.get(id).is_some());

        dispatcher.schedule();
        let batch = dispatcher.flush(&mut store).unwrap();
        assert!(batch.released_runs.contains(&id));
        assert!(store.get(id).is_none());
    }

    #[test]
    fn callback_sees_each_batch() {
        let mut dispatcher = ChangeDispatcher::new();
        let mut store = RunStore::new();
        let seen = Rc::new(Cell::new(0u64));
        let seen_cb = Rc::clone(&seen);
        dispatcher.on_flush(move |batch| seen_cb.set(batch.version));

        dispatcher.schedule();
        dispatcher.flush(&mut store);
        dispatcher.schedule();
        dispatcher.flush(&mut store);
        assert_eq!(seen.get(), 2);
        assert_eq!(dispatcher.version(), 2);
    }

    #[test]
    fn line_marks_after_mark_all_stay_folded() {
        let mut full = Damage::default();
        full.mark_all();
        let mut partial = Damage::default();
        partial.mark_line(3);
        full.merge(partial);
        assert!(full.all_lines);
        assert!(full.lines.is_empty());
        full.mark_line(7);
        assert!(full.lines.is_empty());
    }

    #[test]
    fn cancel_drops_pending_damage() {
        let mut dispatcher = ChangeDispatcher::new();
        let mut store = RunStore::new();
        let mut damage = Damage::default();
        damage.mark_all();
        dispatcher.absorb(damage);
        dispatcher.schedule();
        dispatcher.cancel();
        assert!(dispatcher.flush(&mut store).is_none());
    }
}
