//! Linear undo/redo log of annotation snapshots.
//!
//! `cursor` points at the active snapshot. `None` is the state before the
//! first recorded edit, so undoing the very first edit yields an empty list.
//! Recording after an undo discards the redoable tail.

use crate::store::Snapshot;

#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<Snapshot>,
    cursor: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, snapshot: Snapshot) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        let dropped = self.entries.len().saturating_sub(keep);
        self.entries.truncate(keep);
        self.entries.push(snapshot);
        self.cursor = Some(self.entries.len() - 1);
        log::debug!(
            "history: recorded entry {} ({} annotations, dropped {} redo entries)",
            self.entries.len() - 1,
            self.entries[self.entries.len() - 1].len(),
            dropped
        );
    }

    /// Step back one entry. Returns the snapshot to restore, if any.
    pub fn undo(&mut self) -> Option<Snapshot> {
        let cursor = self.cursor?;
        if cursor == 0 {
            self.cursor = None;
            log::debug!("history: undo to initial state");
            return Some(Snapshot::empty());
        }
        self.cursor = Some(cursor - 1);
        log::debug!("history: undo to entry {}", cursor - 1);
        Some(self.entries[cursor - 1].clone())
    }

    /// Step forward one entry. Returns the snapshot to restore, if any.
    pub fn redo(&mut self) -> Option<Snapshot> {
        let next = self.cursor.map_or(0, |c| c + 1);
        let snapshot = self.entries.get(next)?.clone();
        self.cursor = Some(next);
        log::debug!("history: redo to entry {}", next);
        Some(snapshot)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.map_or(0, |c| c + 1) < self.entries.len()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Annotation, LineWidth, PaletteColor, Tool};
    use crate::geometry::Point;

    fn snap(n: usize) -> Snapshot {
        let anns: Vec<Annotation> = (0..n)
            .map(|i| {
                Annotation::new(
                    Tool::Rectangle,
                    Point::new(i as f32, i as f32),
                    Point::new(i as f32 + 10.0, i as f32 + 10.0),
                    PaletteColor::Red,
                    LineWidth::Thin,
                )
            })
            .collect();
        Snapshot::from(anns.as_slice())
    }

    #[test]
    fn test_empty_history_is_noop() {
        let mut history = History::new();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert_eq!(history.cursor(), None);
    }

    #[test]
    fn test_undo_first_entry_restores_empty() {
        let mut history = History::new();
        history.record(snap(1));
        assert_eq!(history.cursor(), Some(0));

        let restored = history.undo().unwrap();
        assert!(restored.is_empty());
        assert_eq!(history.cursor(), None);
        assert!(history.undo().is_none());
    }

    #[test]
    fn test_undo_redo_walks_entries() {
        let mut history = History::new();
        history.record(snap(1));
        history.record(snap(2));
        history.record(snap(3));

        assert_eq!(history.undo().unwrap().len(), 2);
        assert_eq!(history.undo().unwrap().len(), 1);
        assert_eq!(history.redo().unwrap().len(), 2);
        assert_eq!(history.redo().unwrap().len(), 3);
        assert!(history.redo().is_none());
        assert_eq!(history.cursor(), Some(2));
    }

    #[test]
    fn test_redo_from_initial_state() {
        let mut history = History::new();
        history.record(snap(1));
        history.undo();
        assert!(history.can_redo());
        assert_eq!(history.redo().unwrap().len(), 1);
        assert_eq!(history.cursor(), Some(0));
    }

    #[test]
    fn test_record_after_undo_truncates_future() {
        let mut history = History::new();
        history.record(snap(1));
        history.record(snap(2));
        history.undo();
        history.record(snap(5));

        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_record_from_initial_state_discards_everything() {
        let mut history = History::new();
        history.record(snap(1));
        history.record(snap(2));
        history.undo();
        history.undo();
        history.record(snap(7));
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), Some(0));
    }
}
