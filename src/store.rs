//! Committed annotations, the in-progress shape and the note editor.

use std::sync::Arc;

use crate::annotation::{Annotation, LineWidth, PaletteColor, PendingShape, Tool};
use crate::error::EngineError;
use crate::geometry::Point;

/// Immutable copy of the committed list; one history entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot(Arc<[Annotation]>);

impl Snapshot {
    pub fn empty() -> Self {
        Self(Arc::from(Vec::new()))
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[Annotation]> for Snapshot {
    fn from(annotations: &[Annotation]) -> Self {
        Self(Arc::from(annotations))
    }
}

/// Open text-note editor for one annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteEditor {
    pub index: usize,
    pub buffer: String,
}

#[derive(Clone, Debug, Default)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    pending: Option<PendingShape>,
    editing: Option<NoteEditor>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn pending(&self) -> Option<&PendingShape> {
        self.pending.as_ref()
    }

    pub fn editing(&self) -> Option<&NoteEditor> {
        self.editing.as_ref()
    }

    pub fn editing_mut(&mut self) -> Option<&mut NoteEditor> {
        self.editing.as_mut()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from(self.annotations.as_slice())
    }

    pub fn begin_shape(
        &mut self,
        tool: Tool,
        color: PaletteColor,
        line_width: LineWidth,
        point: Point,
    ) {
        self.pending = Some(PendingShape {
            tool,
            color,
            line_width,
            start: point,
            current: point,
        });
    }

    pub fn update_pending(&mut self, point: Point) {
        if let Some(pending) = self.pending.as_mut() {
            pending.current = point;
        }
    }

    /// Append the pending shape ending at `point` and open its note editor.
    /// Returns `None` when nothing was pending.
    pub fn commit_shape(&mut self, point: Point) -> Option<Snapshot> {
        let pending = self.pending.take()?;
        self.annotations.push(pending.into_annotation(point));
        self.editing = Some(NoteEditor {
            index: self.annotations.len() - 1,
            buffer: String::new(),
        });
        Some(self.snapshot())
    }

    pub fn cancel_pending(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn set_note(
        &mut self,
        index: usize,
        text: impl Into<String>,
    ) -> Result<Snapshot, EngineError> {
        let len = self.annotations.len();
        let annotation = self
            .annotations
            .get_mut(index)
            .ok_or(EngineError::OutOfRange { index, len })?;
        annotation.text = text.into();
        Ok(self.snapshot())
    }

    pub fn clear_all(&mut self) -> Snapshot {
        self.annotations.clear();
        self.snapshot()
    }

    /// Open the note editor on an existing annotation, pre-filled with its text.
    pub fn open_note(&mut self, index: usize) -> Result<(), EngineError> {
        let annotation = self.annotations.get(index).ok_or(EngineError::OutOfRange {
            index,
            len: self.annotations.len(),
        })?;
        self.editing = Some(NoteEditor {
            index,
            buffer: annotation.text.clone(),
        });
        Ok(())
    }

    pub fn close_note(&mut self) -> Option<NoteEditor> {
        self.editing.take()
    }

    /// Replace the committed list with a history snapshot.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.annotations = snapshot.annotations().to_vec();
        if self
            .editing
            .as_ref()
            .is_some_and(|editor| editor.index >= self.annotations.len())
        {
            self.editing = None;
        }
    }
}
