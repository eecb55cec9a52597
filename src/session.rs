//! Editing sessions and their lifecycle.
//!
//! A [`Session`] holds all state for one opened image. The [`Editor`] owns at
//! most one session, invokes the host's save/cancel callbacks and tears
//! sessions down in two phases: `request_close` marks the session closing and
//! hands out a [`TeardownTicket`]; `dispose` drops it on the host's next tick.
//! Opening another image in between invalidates the ticket.

use std::path::Path;

use crate::annotation::{Annotation, LineWidth, PaletteColor, Tool, ToolSettings};
use crate::config::EditorConfig;
use crate::error::EngineError;
use crate::export::{flatten, Export};
use crate::history::History;
use crate::render::{BaseLayer, OverlayView};
use crate::store::{AnnotationStore, NoteEditor};

// ── Host interface ──────────────────────────────────────────────────────────

/// Encoded image to annotate plus a display title.
#[derive(Debug, Clone)]
pub struct ImageSource {
    pub title: String,
    pub bytes: Vec<u8>,
}

impl ImageSource {
    pub fn new(title: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            title: title.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, EngineError> {
        let bytes = std::fs::read(path).map_err(|source| EngineError::ImageRead {
            path: path.to_path_buf(),
            source,
        })?;
        let title = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { title, bytes })
    }
}

/// Everything the host receives when the user saves.
#[derive(Debug, Clone)]
pub struct SavePayload {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
    pub data_uri: String,
    pub annotations: Vec<Annotation>,
}

/// Callbacks into the host application.
pub trait EditorHost {
    fn on_save(&mut self, payload: SavePayload);
    fn on_cancel(&mut self);
}

// ── Session ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Drawing,
    EditingNote,
}

/// State of one open image. Mutated only through [`Session::handle`] and the
/// settings setters.
#[derive(Debug)]
pub struct Session {
    pub(crate) base: BaseLayer,
    pub(crate) store: AnnotationStore,
    pub(crate) history: History,
    pub(crate) hover: Option<usize>,
    pub(crate) settings: ToolSettings,
    pub(crate) config: EditorConfig,
}

impl Session {
    pub fn new(base: BaseLayer, config: EditorConfig) -> Self {
        Self {
            base,
            store: AnnotationStore::new(),
            history: History::new(),
            hover: None,
            settings: ToolSettings::default(),
            config,
        }
    }

    /// Derived from the store so it can never disagree with it.
    pub fn mode(&self) -> Mode {
        if self.store.editing().is_some() {
            Mode::EditingNote
        } else if self.store.pending().is_some() {
            Mode::Drawing
        } else {
            Mode::Idle
        }
    }

    pub fn base(&self) -> &BaseLayer {
        &self.base
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn annotations(&self) -> &[Annotation] {
        self.store.annotations()
    }

    pub fn hover(&self) -> Option<usize> {
        self.hover
    }

    pub fn hovered(&self) -> Option<&Annotation> {
        self.hover.and_then(|i| self.store.annotations().get(i))
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.mode() != Mode::EditingNote && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.mode() != Mode::EditingNote && self.history.can_redo()
    }

    pub fn can_clear(&self) -> bool {
        self.mode() == Mode::Idle && !self.store.is_empty()
    }

    pub fn can_export(&self) -> bool {
        !self.store.is_empty()
    }

    pub fn settings(&self) -> ToolSettings {
        self.settings
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.settings.tool = tool;
    }

    pub fn set_color(&mut self, color: PaletteColor) {
        self.settings.color = color;
    }

    pub fn set_line_width(&mut self, line_width: LineWidth) {
        self.settings.line_width = line_width;
    }

    pub fn note_editor(&self) -> Option<&NoteEditor> {
        self.store.editing()
    }

    /// Text buffer of the open note editor, for the host's input widget.
    pub fn note_buffer_mut(&mut self) -> Option<&mut String> {
        self.store.editing_mut().map(|editor| &mut editor.buffer)
    }

    /// Live view: hover highlight and pending preview included.
    pub fn overlay_view(&self) -> OverlayView<'_> {
        OverlayView {
            annotations: self.store.annotations(),
            hover: self.hover,
            pending: self.store.pending(),
        }
    }

    pub fn export(&self) -> Result<Export, EngineError> {
        flatten(&self.base, self.store.annotations(), &self.config.style)
    }

    /// Drop an in-progress drag without touching history.
    pub fn cancel_drawing(&mut self) -> bool {
        self.store.cancel_pending()
    }
}

// ── Editor lifecycle ────────────────────────────────────────────────────────

/// Proof that a close was requested for a particular session generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TeardownTicket(u64);

#[derive(Debug, Default)]
pub struct Editor {
    config: EditorConfig,
    session: Option<Session>,
    closing: bool,
    generation: u64,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Decode `source` and start a fresh session, replacing any previous one.
    /// On failure the current state is left as it was.
    pub fn open(&mut self, source: &ImageSource, viewport: (f32, f32)) -> Result<(), EngineError> {
        let max_size = self.config.fit.max_size(viewport);
        let base = BaseLayer::decode(&source.title, &source.bytes, max_size)?;
        self.generation += 1;
        self.closing = false;
        self.session = Some(Session::new(base, self.config.clone()));
        log::info!("session {} opened for '{}'", self.generation, source.title);
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some() && !self.closing
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    /// The active session; `None` once a close has been requested.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref().filter(|_| !self.closing)
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        if self.closing {
            return None;
        }
        self.session.as_mut()
    }

    /// First teardown phase. Cancels any pending drag and marks the session
    /// closing; the host passes the ticket to [`Editor::dispose`] later.
    pub fn request_close(&mut self) -> Option<TeardownTicket> {
        let session = self.session.as_mut()?;
        if session.cancel_drawing() {
            log::debug!("session {}: pending shape cancelled on close", self.generation);
        }
        self.closing = true;
        Some(TeardownTicket(self.generation))
    }

    /// Second teardown phase. Returns whether a session was dropped; stale or
    /// repeated tickets are ignored.
    pub fn dispose(&mut self, ticket: TeardownTicket) -> bool {
        if !self.closing || ticket.0 != self.generation {
            log::debug!("ignoring stale teardown for session {}", ticket.0);
            return false;
        }
        self.session = None;
        self.closing = false;
        log::info!("session {} disposed", ticket.0);
        true
    }

    /// Flatten the current session and hand it to the host.
    pub fn save(&mut self, host: &mut dyn EditorHost) -> Result<(), EngineError> {
        let session = self.session().ok_or(EngineError::NoSession)?;
        let export = session.export()?;
        host.on_save(SavePayload {
            title: session.base().title().to_string(),
            width: export.width,
            height: export.height,
            png: export.png,
            data_uri: export.data_uri,
            annotations: export.annotations,
        });
        Ok(())
    }

    /// Notify the host and begin teardown.
    pub fn cancel(&mut self, host: &mut dyn EditorHost) -> Option<TeardownTicket> {
        host.on_cancel();
        self.request_close()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::controller::Input;
    use crate::geometry::Point;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    pub(crate) fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([200, 200, 200, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    #[derive(Default)]
    struct RecordingHost {
        saved: Vec<SavePayload>,
        cancelled: usize,
    }

    impl EditorHost for RecordingHost {
        fn on_save(&mut self, payload: SavePayload) {
            self.saved.push(payload);
        }

        fn on_cancel(&mut self) {
            self.cancelled += 1;
        }
    }

    fn open_editor() -> Editor {
        let mut editor = Editor::new(EditorConfig::default());
        editor
            .open(&ImageSource::new("photo.png", png_bytes(200, 100)), (1000.0, 1000.0))
            .unwrap();
        editor
    }

    fn draw_rect(session: &mut Session) {
        let _ = session.handle(Input::PointerDown(Point::new(10.0, 10.0)));
        let _ = session.handle(Input::PointerUp(Point::new(50.0, 40.0)));
        let _ = session.handle(Input::SkipNote);
    }

    #[test]
    fn test_open_rejects_undecodable_image() {
        let mut editor = Editor::new(EditorConfig::default());
        let err = editor
            .open(&ImageSource::new("bad", b"garbage".to_vec()), (800.0, 600.0))
            .unwrap_err();
        assert!(matches!(err, EngineError::ImageLoad { .. }));
        assert!(!editor.is_open());
    }

    #[test]
    fn test_open_fits_into_viewport_fraction() {
        let mut editor = Editor::new(EditorConfig::default());
        editor
            .open(&ImageSource::new("big.png", png_bytes(1000, 500)), (500.0, 1000.0))
            .unwrap();
        let base = editor.session().unwrap().base();
        assert_eq!((base.width(), base.height()), (400, 200));
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = ImageSource::from_path(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, EngineError::ImageRead { .. }));
    }

    #[test]
    fn test_save_without_annotations_is_empty_export() {
        let mut editor = open_editor();
        let mut host = RecordingHost::default();
        assert!(!editor.session().unwrap().can_export());
        assert!(matches!(editor.save(&mut host), Err(EngineError::EmptyExport)));
        assert!(host.saved.is_empty());
    }

    #[test]
    fn test_save_invokes_host() {
        let mut editor = open_editor();
        draw_rect(editor.session_mut().unwrap());
        let mut host = RecordingHost::default();
        editor.save(&mut host).unwrap();

        let payload = &host.saved[0];
        assert_eq!(payload.title, "photo.png");
        assert_eq!((payload.width, payload.height), (200, 100));
        assert_eq!(payload.annotations.len(), 1);
        assert!(payload.data_uri.starts_with("data:image/png;base64,"));
        // Session survives a save.
        assert!(editor.is_open());
    }

    #[test]
    fn test_close_mid_drag_cancels_without_history() {
        let mut editor = open_editor();
        let session = editor.session_mut().unwrap();
        let _ = session.handle(Input::PointerDown(Point::new(5.0, 5.0)));
        let _ = session.handle(Input::PointerMove(Point::new(40.0, 40.0)));

        let ticket = editor.request_close().unwrap();
        assert!(editor.session().is_none());
        assert!(editor.is_closing());
        assert!(editor.dispose(ticket));
        assert!(!editor.is_open());
        assert!(!editor.dispose(ticket));
    }

    #[test]
    fn test_stale_ticket_does_not_clobber_new_session() {
        let mut editor = open_editor();
        draw_rect(editor.session_mut().unwrap());
        let ticket = editor.request_close().unwrap();

        editor
            .open(&ImageSource::new("next.png", png_bytes(50, 50)), (1000.0, 1000.0))
            .unwrap();
        assert!(!editor.dispose(ticket));

        let session = editor.session().unwrap();
        assert_eq!(session.base().title(), "next.png");
        assert!(session.annotations().is_empty());
        assert!(!session.history().can_undo());
    }

    #[test]
    fn test_cancel_notifies_host_and_closes() {
        let mut editor = open_editor();
        let mut host = RecordingHost::default();
        let ticket = editor.cancel(&mut host).unwrap();
        assert_eq!(host.cancelled, 1);
        assert!(editor.dispose(ticket));
        assert!(matches!(editor.save(&mut host), Err(EngineError::NoSession)));
    }
}
