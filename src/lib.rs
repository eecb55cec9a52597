//! Interactive image annotation engine.
//!
//! Draw rectangles and arrows over a fitted reference image, attach numbered
//! notes, undo/redo edits, and flatten the result into a PNG plus a JSON-ready
//! annotation legend. The host owns persistence; see [`session::EditorHost`].

pub mod annotation;
pub mod config;
pub mod controller;
pub mod egui_surface;
pub mod error;
pub mod export;
pub mod geometry;
pub mod history;
pub mod raster;
pub mod render;
pub mod session;
pub mod store;

pub use annotation::{Annotation, LineWidth, PaletteColor, Tool};
pub use config::EditorConfig;
pub use controller::{Input, Outcome};
pub use error::{ConfigError, EngineError};
pub use export::Export;
pub use geometry::Point;
pub use session::{Editor, EditorHost, ImageSource, Mode, SavePayload, Session, TeardownTicket};
