//! BillCheck — desktop client for the remote bill authenticity classifier.
//!
//! This crate is presentation only: it maps picker/drag/drop/click events
//! onto the `billcheck_core` session and renders its snapshot each frame.

use billcheck_core::{Endpoint, FileHandle, InferenceClient, RequestPhase, Session, Snapshot};
use eframe::{App, Frame, NativeOptions, egui};
use rfd::FileDialog;
use std::path::Path;

fn main() {
    tracing_subscriber::fmt::init();

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([860.0, 620.0])
            .with_min_inner_size([560.0, 420.0])
            .with_title("BillCheck"),
        ..Default::default()
    };
    if let Err(e) = eframe::run_native(
        "BillCheck",
        options,
        Box::new(|_cc| Ok::<_, Box<dyn std::error::Error + Send + Sync>>(Box::new(UiApp::new()))),
    ) {
        eprintln!("Application stopped with error: {e}");
    }
}

struct UiApp {
    session: Session,
    // Texture for the current preview, tagged with the session generation it
    // was uploaded for.
    preview_texture: Option<(u64, egui::TextureHandle)>,
}

impl UiApp {
    fn new() -> Self {
        let endpoint = Endpoint::from_env();
        let client = InferenceClient::new(endpoint);
        tracing::info!("classification endpoint: {}", client.url());
        Self {
            session: Session::new(client),
            preview_texture: None,
        }
    }

    fn select_path(&mut self, path: &Path) {
        match FileHandle::from_path(path) {
            Ok(file) => self.session.select_file(file),
            Err(e) => tracing::warn!("ignoring unreadable file {}: {e}", path.display()),
        }
    }

    fn handle_drag_and_drop(&mut self, ctx: &egui::Context) {
        let hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());
        if hovering {
            if self.session.drag_active() {
                self.session.drag_over();
            } else {
                self.session.drag_enter();
            }
        } else if self.session.drag_active() {
            self.session.drag_leave();
        }

        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() {
            return;
        }
        // Single-file interface: first dropped file wins.
        if dropped.len() > 1 {
            tracing::debug!("{} files dropped; taking the first", dropped.len());
        }
        let Some(path) = dropped[0].path.clone() else {
            self.session.drag_leave();
            return;
        };
        match FileHandle::from_path(&path) {
            Ok(file) => self.session.drop_file(file),
            Err(e) => {
                tracing::warn!("ignoring unreadable drop {}: {e}", path.display());
                self.session.drag_leave();
            }
        }
    }

    fn sync_preview_texture(&mut self, ctx: &egui::Context, snap: &Snapshot) {
        match &snap.preview {
            Some(image) => {
                let current = self
                    .preview_texture
                    .as_ref()
                    .is_some_and(|(generation, _)| *generation == snap.generation);
                if !current {
                    let size = [image.width() as usize, image.height() as usize];
                    let pixels = egui::ColorImage::from_rgba_unmultiplied(size, image.rgba());
                    let texture =
                        ctx.load_texture("bill-preview", pixels, egui::TextureOptions::LINEAR);
                    self.preview_texture = Some((snap.generation, texture));
                }
            }
            None => self.preview_texture = None,
        }
    }

    fn show_preview(&self, ui: &mut egui::Ui) {
        let Some((_, texture)) = &self.preview_texture else {
            return;
        };
        let [width, height] = texture.size();
        let avail = ui.available_size();
        let scale = (avail.x / width as f32)
            .min(avail.y * 0.75 / height as f32)
            .min(1.0);
        let desired = egui::Vec2::new(width as f32 * scale, height as f32 * scale);
        let (response, painter) = ui.allocate_painter(desired, egui::Sense::hover());
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        painter.image(texture.id(), response.rect, uv, egui::Color32::WHITE);
    }

    fn show_result(ui: &mut egui::Ui, phase: &RequestPhase) {
        match phase {
            RequestPhase::Idle => {}
            RequestPhase::InFlight => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Analyzing…");
                });
            }
            RequestPhase::Succeeded(prediction) => {
                let line = match prediction.confidence_percent() {
                    Some(percent) => {
                        format!("Prediction: {} (Confidence: {percent})", prediction.label)
                    }
                    None => format!("Prediction: {}", prediction.label),
                };
                ui.label(egui::RichText::new(line).size(18.0).strong());
            }
            RequestPhase::Failed(message) => {
                ui.colored_label(egui::Color32::from_rgb(220, 70, 70), message);
            }
        }
    }
}

impl App for UiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.session.poll();
        self.handle_drag_and_drop(ctx);

        let snap = self.session.snapshot();
        self.sync_preview_texture(ctx, &snap);

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Choose image…").clicked()
                    && let Some(path) = FileDialog::new()
                        .add_filter("Images", &["jpg", "jpeg", "png", "bmp", "webp"])
                        .pick_file()
                {
                    self.select_path(&path);
                }

                if ui
                    .add_enabled(snap.is_submittable, egui::Button::new("Predict"))
                    .clicked()
                {
                    self.session.submit();
                }

                if ui
                    .add_enabled(snap.file_name.is_some(), egui::Button::new("Clear"))
                    .clicked()
                {
                    self.session.clear_selection();
                }

                if let (Some(name), Some(size)) = (&snap.file_name, snap.file_size) {
                    ui.separator();
                    ui.label(format!("{name} ({})", human_size(size)));
                }
            });
        });

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.weak(format!("BillCheck {}", env!("BILLCHECK_VERSION")));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if snap.drag_active {
                ui.centered_and_justified(|ui| {
                    ui.heading("Drop the bill image to select it");
                });
                return;
            }

            if snap.file_name.is_none() {
                ui.centered_and_justified(|ui| {
                    ui.vertical_centered(|ui| {
                        ui.heading("Bill Authenticity Detector");
                        ui.add_space(6.0);
                        ui.label("Drop a bill image here, or use Choose image…");
                    });
                });
                return;
            }

            ui.add_space(8.0);
            self.show_preview(ui);
            ui.add_space(12.0);
            Self::show_result(ui, &snap.phase);
        });

        // Keep frames coming while a decode or request is outstanding.
        if self.session.is_busy() {
            ctx.request_repaint();
        }
    }
}

fn human_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
