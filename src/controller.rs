//! Interaction controller: pointer and keyboard input to session transitions.
//!
//! ```text
//! Idle ──down──▶ Drawing ──up (dragged)──▶ EditingNote ──save/skip──▶ Idle
//!   ▲               │
//!   └──up (click)───┘   a click on an existing shape opens its note instead
//! ```

use crate::geometry::{pick, Point};
use crate::session::{Mode, Session};
use crate::store::Snapshot;

#[derive(Clone, Debug, PartialEq)]
pub enum Input {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp(Point),
    PointerLeave,
    /// Commit the note editor's buffer.
    SaveNote,
    /// Close the note editor without changing the note.
    SkipNote,
    Undo,
    Redo,
    ClearAll,
}

/// Result of handling one input.
#[must_use]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    /// The overlay must be repainted before the next input.
    pub repaint: bool,
}

impl Outcome {
    const NONE: Outcome = Outcome { repaint: false };
    const REPAINT: Outcome = Outcome { repaint: true };

    fn from_changed(changed: bool) -> Self {
        Self { repaint: changed }
    }
}

impl Session {
    pub fn handle(&mut self, input: Input) -> Outcome {
        let mode = self.mode();
        match (mode, input) {
            (Mode::Idle, Input::PointerDown(p)) => {
                let s = self.settings;
                self.store.begin_shape(s.tool, s.color, s.line_width, p);
                self.hover = None;
                Outcome::REPAINT
            }
            (Mode::Drawing, Input::PointerMove(p)) => {
                self.store.update_pending(p);
                Outcome::REPAINT
            }
            (Mode::Drawing, Input::PointerUp(p)) => self.finish_drag(p),
            (Mode::Idle, Input::PointerMove(p)) => {
                let hover = pick(
                    p,
                    self.store.annotations(),
                    self.config.hit_padding,
                    self.config.pick_order,
                );
                Outcome::from_changed(self.set_hover(hover))
            }
            (Mode::Idle | Mode::Drawing, Input::PointerLeave) => {
                let cancelled = self.store.cancel_pending();
                let hover_changed = self.set_hover(None);
                Outcome::from_changed(cancelled || hover_changed)
            }
            (Mode::EditingNote, Input::PointerLeave) => Outcome::from_changed(self.set_hover(None)),
            (Mode::EditingNote, Input::SaveNote) => {
                self.save_note();
                Outcome::REPAINT
            }
            (Mode::EditingNote, Input::SkipNote) => {
                self.store.close_note();
                Outcome::REPAINT
            }
            (Mode::Idle | Mode::Drawing, Input::Undo) => {
                let snapshot = self.history.undo();
                Outcome::from_changed(self.restore(snapshot))
            }
            (Mode::Idle | Mode::Drawing, Input::Redo) => {
                let snapshot = self.history.redo();
                Outcome::from_changed(self.restore(snapshot))
            }
            (Mode::Idle, Input::ClearAll) if !self.store.is_empty() => {
                let snapshot = self.store.clear_all();
                self.history.record(snapshot);
                self.hover = None;
                Outcome::REPAINT
            }
            (mode, input) => {
                log::trace!("ignoring {:?} in {:?}", input, mode);
                Outcome::NONE
            }
        }
    }

    fn finish_drag(&mut self, end: Point) -> Outcome {
        let Some(start) = self.store.pending().map(|p| p.start) else {
            return Outcome::NONE;
        };

        if start.distance_to(end) >= self.config.click_tolerance {
            if let Some(snapshot) = self.store.commit_shape(end) {
                self.history.record(snapshot);
            }
            return Outcome::REPAINT;
        }

        // Too short to be a shape: treat it as a click.
        self.store.cancel_pending();
        let hit = pick(
            start,
            self.store.annotations(),
            self.config.hit_padding,
            self.config.pick_order,
        );
        if let Some(index) = hit {
            if let Err(err) = self.store.open_note(index) {
                log::warn!("could not open note: {err}");
            }
        }
        Outcome::REPAINT
    }

    fn save_note(&mut self) {
        let Some(editor) = self.store.close_note() else {
            return;
        };
        match self.store.set_note(editor.index, editor.buffer) {
            Ok(snapshot) => self.history.record(snapshot),
            Err(err) => log::warn!("note not saved: {err}"),
        }
    }

    fn set_hover(&mut self, hover: Option<usize>) -> bool {
        let changed = self.hover != hover;
        self.hover = hover;
        changed
    }

    fn restore(&mut self, snapshot: Option<Snapshot>) -> bool {
        let Some(snapshot) = snapshot else {
            return false;
        };
        self.store.restore(&snapshot);
        if self.hover.is_some_and(|i| i >= self.store.len()) {
            self.hover = None;
        }
        true
    }
}
