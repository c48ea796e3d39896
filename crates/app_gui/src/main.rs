use eframe::{App, Frame, NativeOptions, egui};
use predict_core::{
    HttpPredictionService, PredictOutcome, PredictionService, PredictorConfig, RequestId,
    RequestState, UploadController,
};
use rfd::FileDialog;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

fn main() {
    tracing_subscriber::fmt::init();

    let mut config = PredictorConfig::default();
    if let Ok(endpoint) = std::env::var("CELL_PREDICT_ENDPOINT") {
        config.endpoint_url = endpoint;
    }
    tracing::info!(endpoint = %config.endpoint_url, "starting");

    let options = NativeOptions::default();
    if let Err(e) = eframe::run_native(
        "Cell Predict",
        options,
        Box::new(move |_cc| {
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(Box::new(UiApp::new(config)))
        }),
    ) {
        eprintln!("application stopped with an error: {e}");
    }
}

const PREVIEW_SIZE: u32 = 320;

struct UiApp {
    controller: UploadController,
    service: HttpPredictionService,
    outcome_tx: Sender<(RequestId, PredictOutcome)>,
    outcome_rx: Receiver<(RequestId, PredictOutcome)>,
    // Decoded preview keyed on the controller's preview id; replaced (and
    // thereby dropped) whenever the selection changes.
    preview_tex: Option<(u64, egui::TextureHandle)>,
}

impl UiApp {
    fn new(config: PredictorConfig) -> Self {
        let service = HttpPredictionService::new(&config);
        let (outcome_tx, outcome_rx) = channel();
        Self {
            controller: UploadController::new(config),
            service,
            outcome_tx,
            outcome_rx,
            preview_tex: None,
        }
    }

    fn preview_texture(&mut self, ctx: &egui::Context) -> Option<egui::TextureId> {
        let id = self.controller.preview()?.id;
        if let Some((cached_id, tex)) = &self.preview_tex
            && *cached_id == id
        {
            return Some(tex.id());
        }
        let path = self.controller.selection()?.path.clone();
        match image::open(&path) {
            Ok(img) => {
                let thumb = image::imageops::thumbnail(&img, PREVIEW_SIZE, PREVIEW_SIZE);
                let (w, h) = thumb.dimensions();
                let pixels = thumb.into_raw();
                let color =
                    egui::ColorImage::from_rgba_unmultiplied([w as usize, h as usize], &pixels);
                let tex = ctx.load_texture(
                    format!("preview:{id}"),
                    color,
                    egui::TextureOptions::LINEAR,
                );
                let tex_id = tex.id();
                self.preview_tex = Some((id, tex));
                Some(tex_id)
            }
            Err(e) => {
                tracing::warn!("failed to decode preview for {}: {}", path.display(), e);
                None
            }
        }
    }

    fn spawn_submit(&mut self, ctx: &egui::Context) {
        if let Some(pending) = self.controller.begin_submit() {
            let service = self.service.clone();
            let tx = self.outcome_tx.clone();
            let ctx = ctx.clone();
            thread::spawn(move || {
                let outcome = service.predict(&pending.file);
                if tx.send((pending.id, outcome)).is_ok() {
                    ctx.request_repaint();
                }
            });
        }
    }

    fn show_result_window(&mut self, ctx: &egui::Context) {
        let Some(result) = self.controller.result().cloned() else {
            return;
        };
        let mut open = true;
        egui::Window::new("Prediction result")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .open(&mut open)
            .show(ctx, |ui| {
                let color = if result.label.eq_ignore_ascii_case("uninfected") {
                    egui::Color32::LIGHT_GREEN
                } else {
                    egui::Color32::LIGHT_RED
                };
                ui.vertical_centered(|ui| {
                    ui.heading(egui::RichText::new(&result.label).color(color).size(28.0));
                    ui.label(format!("Confidence: {:.2}%", result.confidence * 100.0));
                    ui.add_space(8.0);
                    if ui.button("Try another image").clicked() {
                        self.controller.dismiss();
                    }
                });
            });
        if !open {
            self.controller.dismiss();
        }
    }
}

impl App for UiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        // Outcomes arrive from worker threads; the controller decides
        // whether each one is still current.
        while let Ok((id, outcome)) = self.outcome_rx.try_recv() {
            self.controller.finish_submit(id, outcome);
        }
        if self.controller.preview().is_none() {
            self.preview_tex = None;
        }

        let submitting = self.controller.state() == RequestState::Submitting;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Cell image prediction");
            ui.add_space(8.0);

            if ui
                .add_enabled(!submitting, egui::Button::new("Choose image..."))
                .clicked()
                && let Some(file) = FileDialog::new()
                    .add_filter("Images", &["png", "jpg", "jpeg", "bmp", "tif", "tiff"])
                    .pick_file()
            {
                self.controller.select_file(Some(file));
            }

            if let Some(tex_id) = self.preview_texture(ctx) {
                ui.add_space(6.0);
                ui.image((tex_id, egui::Vec2::splat(PREVIEW_SIZE as f32)));
            }

            if let Some(err) = self.controller.error() {
                ui.add_space(6.0);
                ui.colored_label(egui::Color32::LIGHT_RED, err.to_string());
            }

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                let can_submit = self.controller.selection().is_some() && !submitting;
                if ui
                    .add_enabled(can_submit, egui::Button::new("Predict"))
                    .clicked()
                {
                    self.spawn_submit(ctx);
                }
                if submitting {
                    ui.spinner();
                    ui.label("Predicting...");
                }
            });
        });

        if self.controller.result_visible() {
            self.show_result_window(ctx);
        }
    }
}
