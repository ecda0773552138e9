// UI module for the emotion tracker application

use crate::camera::CameraManager;
use crate::chart;
use crate::history::EmotionHistory;
use crate::models::{AnalyzerEvent, DetectionReport, Frame};
use chrono::Local;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, warn};

const MODEL_LOADING_MSG: &str = "Mudelite laadimine...";
const MODEL_LOAD_ERROR: &str = "Mudelite laadimine ebaõnnestus";
const CAMERA_ACCESS_ERROR: &str = "Kaamera ligipääs ebaõnnestus";

/// Every Nth camera frame is forwarded for detection
const DETECT_EVERY_N_FRAMES: u32 = 5;

const FACE_BOX_STROKE: f32 = 2.0;

/// Startup progresses models -> camera -> running; both setup failures
/// are terminal and show a static message
enum SetupPhase {
    LoadingModels,
    Running,
    Failed(String),
}

/// Main application UI
pub struct EmotionTrackerApp {
    phase: SetupPhase,
    camera: Option<CameraManager>,
    frame_sender: mpsc::Sender<Frame>,
    event_receiver: broadcast::Receiver<AnalyzerEvent>,
    camera_texture: Option<egui::TextureHandle>,
    latest_report: Option<DetectionReport>,
    history: EmotionHistory,
    frame_count: u32,
}

impl EmotionTrackerApp {
    /// Creates a new EmotionTrackerApp. The camera is opened only after
    /// the detection worker reports its models loaded.
    pub fn new(
        frame_sender: mpsc::Sender<Frame>,
        event_receiver: broadcast::Receiver<AnalyzerEvent>,
    ) -> Self {
        Self {
            phase: SetupPhase::LoadingModels,
            camera: None,
            frame_sender,
            event_receiver,
            camera_texture: None,
            latest_report: None,
            history: EmotionHistory::new(),
            frame_count: 0,
        }
    }

    /// Drains pending analyzer events
    fn poll_events(&mut self) {
        loop {
            match self.event_receiver.try_recv() {
                Ok(AnalyzerEvent::ModelsLoaded) => self.start_camera(),
                Ok(AnalyzerEvent::ModelsFailed(reason)) => {
                    error!("Detection worker failed to load models: {}", reason);
                    self.phase = SetupPhase::Failed(MODEL_LOAD_ERROR.to_string());
                }
                Ok(AnalyzerEvent::Report(report)) => {
                    self.history.record(&report, Local::now());
                    self.latest_report = Some(report);
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!("Dropped {} analyzer events", skipped);
                }
                Err(_) => break,
            }
        }
    }

    fn start_camera(&mut self) {
        let opened = CameraManager::new().and_then(|mut camera| {
            camera.start()?;
            Ok(camera)
        });
        match opened {
            Ok(camera) => {
                self.camera = Some(camera);
                self.phase = SetupPhase::Running;
            }
            Err(e) => {
                error!("Camera setup failed: {}", e);
                self.phase = SetupPhase::Failed(CAMERA_ACCESS_ERROR.to_string());
            }
        }
    }

    /// Updates the live texture from the latest frame and forwards every
    /// Nth frame to the detection worker. The send is lossy: when the
    /// worker lags, frames are skipped.
    fn update_camera_texture(&mut self, ctx: &egui::Context) {
        let Some(camera) = self.camera.as_mut() else {
            return;
        };
        if let Ok(frame) = camera.current_frame() {
            if self.frame_count % DETECT_EVERY_N_FRAMES == 0 {
                let _ = self.frame_sender.try_send(frame.clone());
            }

            let color_image = egui::ColorImage::from_rgb(
                [frame.width as usize, frame.height as usize],
                &frame.data,
            );
            self.camera_texture =
                Some(ctx.load_texture("camera", color_image, egui::TextureOptions::LINEAR));
        }
    }

    /// Renders the setup status banner (hidden once running)
    fn render_status(&self, ctx: &egui::Context) {
        match &self.phase {
            SetupPhase::LoadingModels => {
                egui::TopBottomPanel::top("status").show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.add(egui::Spinner::new());
                        ui.label(MODEL_LOADING_MSG);
                    });
                });
            }
            SetupPhase::Failed(message) => {
                egui::TopBottomPanel::top("status").show(ctx, |ui| {
                    ui.colored_label(egui::Color32::from_rgb(220, 60, 60), message);
                });
            }
            SetupPhase::Running => {}
        }
    }

    /// Renders the live camera view with detection overlays
    fn render_camera_view(&self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let available_size = ui.available_size();
                let origin = ui.max_rect().min;

                let Some(texture) = &self.camera_texture else {
                    return;
                };
                let texture_size = texture.size_vec2();
                let aspect_ratio = texture_size.x / texture_size.y;

                // Calculate size to fit while maintaining aspect ratio
                let mut display_width = available_size.x;
                let mut display_height = display_width / aspect_ratio;

                if display_height > available_size.y {
                    display_height = available_size.y;
                    display_width = display_height * aspect_ratio;
                }

                // Center position
                let x_offset = (available_size.x - display_width) / 2.0;
                let y_offset = (available_size.y - display_height) / 2.0;

                let image_rect = egui::Rect::from_min_size(
                    origin + egui::vec2(x_offset, y_offset),
                    egui::vec2(display_width, display_height),
                );

                ui.put(
                    image_rect,
                    egui::Image::new(texture)
                        .fit_to_exact_size(egui::vec2(display_width, display_height)),
                );

                if let Some(report) = &self.latest_report {
                    Self::draw_overlays(ui, image_rect, report);
                }
            });
    }

    /// Paints one stroked box and dominant-expression label per detected
    /// face, scaled from frame coordinates to the displayed size
    fn draw_overlays(ui: &egui::Ui, image_rect: egui::Rect, report: &DetectionReport) {
        if report.frame_width == 0 || report.frame_height == 0 {
            return;
        }
        let sx = image_rect.width() / report.frame_width as f32;
        let sy = image_rect.height() / report.frame_height as f32;
        let painter = ui.painter_at(image_rect);

        for detection in &report.detections {
            let scaled = detection.region.scaled(sx, sy);
            let face_rect = egui::Rect::from_min_size(
                image_rect.min + egui::vec2(scaled.x, scaled.y),
                egui::vec2(scaled.width, scaled.height),
            );
            painter.rect_stroke(
                face_rect,
                2.0,
                egui::Stroke::new(FACE_BOX_STROKE, egui::Color32::LIGHT_BLUE),
            );

            let (emotion, score) = detection.scores.dominant();
            painter.text(
                face_rect.left_bottom() + egui::vec2(0.0, 4.0),
                egui::Align2::LEFT_TOP,
                format!("{} {:.0}%", emotion.label(), score * 100.0),
                egui::FontId::proportional(14.0),
                chart::emotion_color(emotion),
            );
        }
    }

    fn render_chart(&self, ctx: &egui::Context) {
        if self.history.is_empty() {
            return;
        }
        egui::TopBottomPanel::bottom("chart")
            .exact_height(270.0)
            .show(ctx, |ui| {
                chart::draw(ui, &self.history);
            });
    }
}

impl eframe::App for EmotionTrackerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint();
        self.frame_count = self.frame_count.wrapping_add(1);

        self.poll_events();
        if matches!(self.phase, SetupPhase::Running) {
            self.update_camera_texture(ctx);
        }

        self.render_status(ctx);
        self.render_chart(ctx);
        self.render_camera_view(ctx);
    }
}
