use eframe::egui::{self, Color32, RichText};

use debris_detect_common::{DetectError, HttpBackend, UploadWorkflow, WorkflowEvent};

use crate::io::{decode_color_image, read_image};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

pub struct DetectApp {
    workflow: UploadWorkflow<HttpBackend>,
    preview: Option<egui::TextureHandle>,
    result: Option<egui::TextureHandle>,
    status: String,
}

impl DetectApp {
    pub fn new(backend: HttpBackend) -> Self {
        Self {
            workflow: UploadWorkflow::new(backend),
            preview: None,
            result: None,
            status: String::new(),
        }
    }

    fn pick_image(&mut self, ctx: &egui::Context) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file()
        else {
            return;
        };

        match read_image(&path) {
            Ok((file_name, bytes)) => {
                self.status = format!("Selected {file_name}");
                // Release the previous preview before loading the
                // replacement texture.
                self.preview = None;
                match decode_color_image(&bytes) {
                    Ok(color) => {
                        self.preview =
                            Some(ctx.load_texture("preview", color, egui::TextureOptions::default()));
                    }
                    Err(err) => self.status = format!("Preview failed: {err}"),
                }
                self.workflow.select_image(file_name, bytes);
            }
            Err(err) => self.status = format!("Load failed: {err}"),
        }
    }

    fn analyze(&mut self) {
        match self.workflow.start() {
            Ok(()) => {
                // The workflow dropped its previous results; drop the
                // stale texture with them.
                self.result = None;
                self.status = "Analyzing...".to_string();
            }
            Err(DetectError::NoImageSelected) => {
                rfd::MessageDialog::new()
                    .set_level(rfd::MessageLevel::Warning)
                    .set_title("Underwater Waste Detection")
                    .set_description("Please select an image!")
                    .show();
            }
            Err(err) => self.status = format!("Analyze failed: {err}"),
        }
    }

    fn poll_workflow(&mut self, ctx: &egui::Context) {
        let Some(event) = self.workflow.poll() else {
            return;
        };

        match event {
            WorkflowEvent::Completed => {
                self.result = None;
                let annotated = self.workflow.snapshot().annotated.map(|bytes| bytes.to_vec());
                if let Some(bytes) = annotated {
                    match decode_color_image(&bytes) {
                        Ok(color) => {
                            self.result = Some(ctx.load_texture(
                                "result",
                                color,
                                egui::TextureOptions::default(),
                            ));
                            self.status = "Analysis complete".to_string();
                        }
                        Err(err) => self.status = format!("Result decode failed: {err}"),
                    }
                }
            }
            WorkflowEvent::Failed(err) => {
                tracing::warn!(%err, "analysis failed");
                self.result = None;
                self.status = "Analysis failed".to_string();
                rfd::MessageDialog::new()
                    .set_level(rfd::MessageLevel::Error)
                    .set_title("Underwater Waste Detection")
                    .set_description("Error processing image.")
                    .show();
            }
        }
    }

    fn render_upload_panel(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.heading("Upload Image");
        ui.separator();

        if ui.button("Select Image").clicked() {
            self.pick_image(ctx);
        }

        if let Some(texture) = &self.preview {
            ui.add_space(8.0);
            ui.add(
                egui::Image::new(texture)
                    .max_size(egui::vec2(ui.available_width(), 320.0)),
            );
        }

        ui.add_space(8.0);
        let busy = self.workflow.snapshot().busy;
        let label = if busy { "Analyzing..." } else { "Analyze Image" };
        if ui.add_enabled(!busy, egui::Button::new(label)).clicked() {
            self.analyze();
        }
    }

    fn render_result_panel(&self, ui: &mut egui::Ui) {
        ui.heading("AI Output");
        ui.separator();

        if self.workflow.snapshot().busy {
            ui.label(RichText::new("Processing image...").color(Color32::from_gray(170)));
        }

        if let Some(texture) = &self.result {
            ui.add(
                egui::Image::new(texture)
                    .max_size(egui::vec2(ui.available_width(), 480.0)),
            );
        }
    }

    fn render_detections(&self, ui: &mut egui::Ui) {
        ui.heading("Detected Objects");
        ui.separator();

        let snapshot = self.workflow.snapshot();
        if snapshot.detections.is_empty() && !snapshot.busy {
            ui.label(RichText::new("No detections yet.").color(Color32::from_gray(140)));
            return;
        }

        egui::Grid::new("detections")
            .striped(true)
            .min_col_width(120.0)
            .show(ui, |ui| {
                for detection in snapshot.detections {
                    ui.label(RichText::new(&detection.class).strong());
                    ui.label(
                        RichText::new(detection.confidence_percent())
                            .color(Color32::from_rgb(37, 99, 235)),
                    );
                    ui.end_row();
                }
            });
    }
}

impl eframe::App for DetectApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.workflow.snapshot().busy {
            ctx.request_repaint();
        }
        self.poll_workflow(ctx);

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("Underwater Waste Detection");
                ui.label(RichText::new("AI-powered detection of marine debris").italics());
            });
            if !self.status.is_empty() {
                ui.label(RichText::new(&self.status).color(Color32::from_gray(170)));
            }
        });

        egui::SidePanel::left("upload")
            .resizable(true)
            .default_width(360.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.render_upload_panel(ui, ctx);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.render_result_panel(ui);
                ui.add_space(16.0);
                self.render_detections(ui);
            });
        });
    }
}
