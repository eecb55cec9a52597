use std::path::{Path, PathBuf};

use eframe::egui;
use figure_annotator::egui_surface::EguiSurface;
use figure_annotator::render::paint_overlay;
use figure_annotator::{
    Annotation, Editor, EditorConfig, EditorHost, ImageSource, Input, LineWidth, Mode,
    PaletteColor, SavePayload, TeardownTicket, Tool,
};
use serde::Serialize;

const WINDOW_SIZE: [f32; 2] = [1200.0, 800.0];

// ── Legend file ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Legend<'a> {
    image: &'a str,
    width: u32,
    height: u32,
    annotations: &'a [Annotation],
}

fn legend_path(png_path: &Path) -> PathBuf {
    png_path.with_extension("json")
}

fn default_export_name(image_path: &Path) -> String {
    format!(
        "{}_annotated.png",
        image_path
            .file_stem()
            .unwrap_or_default()
            .to_str()
            .unwrap_or("out")
    )
}

/// Write the flattened PNG and its JSON legend; returns the legend path.
fn write_export(png_path: &Path, payload: &SavePayload) -> std::io::Result<PathBuf> {
    std::fs::write(png_path, &payload.png)?;
    let legend = Legend {
        image: &payload.title,
        width: payload.width,
        height: payload.height,
        annotations: &payload.annotations,
    };
    let json = serde_json::to_string_pretty(&legend).map_err(std::io::Error::other)?;
    let path = legend_path(png_path);
    std::fs::write(&path, json)?;
    Ok(path)
}

// ── Host callbacks ──────────────────────────────────────────────────────────

struct DiskHost {
    image_path: PathBuf,
    status: Option<String>,
    cancelled: bool,
}

impl EditorHost for DiskHost {
    fn on_save(&mut self, payload: SavePayload) {
        let dir = self
            .image_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let Some(png_path) = rfd::FileDialog::new()
            .set_directory(dir)
            .set_file_name(default_export_name(&self.image_path))
            .add_filter("PNG image", &["png"])
            .save_file()
        else {
            self.status = Some("Save cancelled".to_string());
            return;
        };

        match write_export(&png_path, &payload) {
            Ok(legend) => {
                log::info!("wrote {} and {}", png_path.display(), legend.display());
                self.status = Some(format!("Saved {}", png_path.display()));
            }
            Err(e) => {
                log::error!("failed to write {}: {e}", png_path.display());
                self.status = Some(format!("Save failed: {e}"));
            }
        }
    }

    fn on_cancel(&mut self) {
        self.cancelled = true;
    }
}

// ── App ─────────────────────────────────────────────────────────────────────

enum Action {
    Input(Input),
    Tool(Tool),
    Color(PaletteColor),
    Width(LineWidth),
    Save,
    Cancel,
}

struct AnnotateApp {
    editor: Editor,
    host: DiskHost,
    texture: Option<egui::TextureHandle>,
    teardown: Option<TeardownTicket>,
    pointer_inside: bool,
}

impl AnnotateApp {
    fn new(editor: Editor, image_path: PathBuf) -> Self {
        Self {
            editor,
            host: DiskHost {
                image_path,
                status: None,
                cancelled: false,
            },
            texture: None,
            teardown: None,
            pointer_inside: false,
        }
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() {
            return;
        }
        let Some(session) = self.editor.session() else {
            return;
        };
        let pixels = session.base().pixels();
        let size = [pixels.width() as usize, pixels.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_raw());
        self.texture = Some(ctx.load_texture(
            "base-layer",
            color_image,
            egui::TextureOptions::LINEAR,
        ));
    }

    fn apply(&mut self, ctx: &egui::Context, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Save => {
                    if let Err(e) = self.editor.save(&mut self.host) {
                        log::warn!("save failed: {e}");
                        self.host.status = Some(format!("Save failed: {e}"));
                    }
                }
                Action::Cancel => {
                    self.teardown = self.editor.cancel(&mut self.host);
                    ctx.request_repaint();
                }
                Action::Input(input) => {
                    if let Some(session) = self.editor.session_mut() {
                        if session.handle(input).repaint {
                            ctx.request_repaint();
                        }
                    }
                }
                Action::Tool(tool) => {
                    if let Some(session) = self.editor.session_mut() {
                        session.set_tool(tool);
                    }
                }
                Action::Color(color) => {
                    if let Some(session) = self.editor.session_mut() {
                        session.set_color(color);
                    }
                }
                Action::Width(width) => {
                    if let Some(session) = self.editor.session_mut() {
                        session.set_line_width(width);
                    }
                }
            }
        }
    }
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for AnnotateApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Second teardown phase runs one frame after the close request.
        if let Some(ticket) = self.teardown.take() {
            if self.editor.dispose(ticket) {
                self.texture = None;
            }
            if self.host.cancelled {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }

        self.ensure_texture(ctx);

        let Some(session) = self.editor.session() else {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.label("No image open");
            });
            return;
        };

        let mut actions = Vec::new();

        // Shortcuts stay out of the way of the note text field.
        if session.mode() != Mode::EditingNote {
            ctx.input(|i| {
                if i.modifiers.command && i.key_pressed(egui::Key::Z) {
                    actions.push(Action::Input(if i.modifiers.shift {
                        Input::Redo
                    } else {
                        Input::Undo
                    }));
                }
                if i.modifiers.command && i.key_pressed(egui::Key::Y) {
                    actions.push(Action::Input(Input::Redo));
                }
            });
        }

        let settings = session.settings();
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for tool in [Tool::Rectangle, Tool::Arrow] {
                    if ui.selectable_label(settings.tool == tool, tool.name()).clicked() {
                        actions.push(Action::Tool(tool));
                    }
                }
                ui.separator();
                for color in PaletteColor::ALL {
                    let swatch = egui::RichText::new("●").color(color.color().to_egui());
                    if ui
                        .selectable_label(settings.color == color, swatch)
                        .on_hover_text(color.name())
                        .clicked()
                    {
                        actions.push(Action::Color(color));
                    }
                }
                ui.separator();
                for width in LineWidth::ALL {
                    if ui
                        .selectable_label(settings.line_width == width, width.name())
                        .clicked()
                    {
                        actions.push(Action::Width(width));
                    }
                }
                ui.separator();
                if ui
                    .add_enabled(session.can_undo(), egui::Button::new("Undo"))
                    .clicked()
                {
                    actions.push(Action::Input(Input::Undo));
                }
                if ui
                    .add_enabled(session.can_redo(), egui::Button::new("Redo"))
                    .clicked()
                {
                    actions.push(Action::Input(Input::Redo));
                }
                if ui
                    .add_enabled(session.can_clear(), egui::Button::new("Clear"))
                    .clicked()
                {
                    actions.push(Action::Input(Input::ClearAll));
                }
                ui.separator();
                if ui
                    .add_enabled(session.can_export(), egui::Button::new("Save"))
                    .clicked()
                {
                    actions.push(Action::Save);
                }
                if ui.button("Cancel").clicked() {
                    actions.push(Action::Cancel);
                }
                if let Some(status) = &self.host.status {
                    ui.separator();
                    ui.label(status);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let (response, painter) =
                ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
            let canvas_rect = response.rect;
            painter.rect_filled(canvas_rect, 0.0, egui::Color32::from_gray(40));

            let base = session.base();
            let image_rect = egui::Rect::from_center_size(
                canvas_rect.center(),
                egui::vec2(base.width() as f32, base.height() as f32),
            );
            if let Some(ref tex) = self.texture {
                painter.image(
                    tex.id(),
                    image_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }

            let mut surface = EguiSurface::new(&painter, image_rect);
            paint_overlay(&mut surface, &session.overlay_view(), &session.config().style);

            // Pointer input, clamped onto the image.
            let to_overlay =
                |pos: egui::Pos2| EguiSurface::to_overlay(image_rect, image_rect.clamp(pos));
            let latest = ctx.input(|i| i.pointer.latest_pos());

            if response.drag_started_by(egui::PointerButton::Primary) {
                if let Some(origin) = ctx.input(|i| i.pointer.press_origin()) {
                    if image_rect.contains(origin) {
                        actions.push(Action::Input(Input::PointerDown(to_overlay(origin))));
                    }
                }
            }
            if response.dragged_by(egui::PointerButton::Primary) {
                if let Some(pos) = latest {
                    actions.push(Action::Input(Input::PointerMove(to_overlay(pos))));
                }
            }
            if response.drag_stopped_by(egui::PointerButton::Primary) {
                if let Some(pos) = latest {
                    actions.push(Action::Input(Input::PointerUp(to_overlay(pos))));
                }
            }
            if response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    if image_rect.contains(pos) {
                        let p = to_overlay(pos);
                        actions.push(Action::Input(Input::PointerDown(p)));
                        actions.push(Action::Input(Input::PointerUp(p)));
                    }
                }
            }

            let hover_pos = response.hover_pos().filter(|p| image_rect.contains(*p));
            if !response.dragged() {
                match hover_pos {
                    Some(pos) => actions.push(Action::Input(Input::PointerMove(to_overlay(pos)))),
                    None if self.pointer_inside => actions.push(Action::Input(Input::PointerLeave)),
                    None => {}
                }
            }
            self.pointer_inside = hover_pos.is_some();

            if let Some(note) = session.hovered().filter(|a| a.has_note()) {
                let _ = response.on_hover_text_at_pointer(&note.text);
            }
        });

        if let Some(session) = self.editor.session_mut() {
            if let Some(index) = session.note_editor().map(|e| e.index) {
                egui::Window::new(format!("Note for #{}", index + 1))
                    .collapsible(false)
                    .resizable(false)
                    .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -24.0))
                    .show(ctx, |ui| {
                        if let Some(buffer) = session.note_buffer_mut() {
                            let te = ui.text_edit_singleline(buffer);
                            if te.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                                actions.push(Action::Input(Input::SaveNote));
                            } else {
                                te.request_focus();
                            }
                        }
                        ui.horizontal(|ui| {
                            if ui.button("Save note").clicked() {
                                actions.push(Action::Input(Input::SaveNote));
                            }
                            if ui.button("Skip").clicked()
                                || ui.input(|i| i.key_pressed(egui::Key::Escape))
                            {
                                actions.push(Action::Input(Input::SkipNote));
                            }
                        });
                    });
            }
        }

        self.apply(ctx, actions);
    }
}

// ── Main ────────────────────────────────────────────────────────────────────

fn parse_args(args: impl Iterator<Item = String>) -> Result<(Option<PathBuf>, PathBuf), String> {
    let usage = "Usage: figure-annotator [--config <file.json>] <image.png|jpg>".to_string();
    let mut config = None;
    let mut image = None;
    let mut args = args;
    while let Some(arg) = args.next() {
        if arg == "--config" {
            config = Some(PathBuf::from(args.next().ok_or_else(|| usage.clone())?));
        } else if image.is_none() {
            image = Some(PathBuf::from(arg));
        } else {
            return Err(usage);
        }
    }
    let image = image.ok_or(usage)?;
    Ok((config, image))
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info,figure_annotator=debug"),
    )
    .init();

    let (config_path, image_path) = match parse_args(std::env::args().skip(1)) {
        Ok(parsed) => parsed,
        Err(usage) => {
            eprintln!("{usage}");
            std::process::exit(1);
        }
    };

    let config = match config_path {
        Some(path) => match EditorConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("invalid config {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        None => EditorConfig::default(),
    };

    let source = match ImageSource::from_path(&image_path) {
        Ok(source) => source,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    let mut editor = Editor::new(config);
    if let Err(e) = editor.open(&source, (WINDOW_SIZE[0], WINDOW_SIZE[1])) {
        log::error!("{e}");
        std::process::exit(1);
    }

    let title = format!("figure-annotator - {}", source.title);
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(WINDOW_SIZE)
            .with_title(&title),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(AnnotateApp::new(editor, image_path)))),
    ) {
        log::error!("application error: {e}");
        std::process::exit(1);
    }
}
