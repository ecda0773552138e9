mod camera;
mod chart;
mod detector;
mod error;
mod history;
mod models;
mod ui;

use detector::ExpressionAnalyzer;
use error::Result;
use models::AnalyzerEvent;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};
use ui::EmotionTrackerApp;

const CASCADE_PATH: &str = "assets/models/haarcascade_frontalface_default.xml";
const EXPRESSION_MODEL_PATH: &str = "assets/models/emotion.onnx";

/// Initializes the logging system (file only, no console output)
fn init_logging() -> Result<()> {
    // Create log file
    let log_file =
        std::fs::File::create("emotion_tracker.log").map_err(error::EmotionTrackerError::Io)?;

    // Set up file layer only (no console output)
    let file_layer = fmt::layer()
        .with_writer(Arc::new(log_file))
        .with_ansi(false);

    // Initialize subscriber with file logging only
    tracing_subscriber::registry().with(file_layer).init();

    Ok(())
}

fn main() -> Result<()> {
    init_logging()?;

    // Frames flow to the detection worker; events flow back
    let (frame_sender, mut frame_receiver) = mpsc::channel(20);
    let (event_sender, event_receiver) = broadcast::channel(32);

    // Detection worker: loads both model resources, reports readiness,
    // then analyzes frames until the frame channel closes
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().expect("failed to start analyzer runtime");
        rt.block_on(async move {
            let mut analyzer = match ExpressionAnalyzer::new(CASCADE_PATH, EXPRESSION_MODEL_PATH) {
                Ok(analyzer) => {
                    let _ = event_sender.send(AnalyzerEvent::ModelsLoaded);
                    analyzer
                }
                Err(e) => {
                    error!("Model loading failed: {}", e);
                    let _ = event_sender.send(AnalyzerEvent::ModelsFailed(e.to_string()));
                    return;
                }
            };

            while let Some(frame) = frame_receiver.recv().await {
                match analyzer.process_frame(&frame) {
                    Ok(report) => {
                        let _ = event_sender.send(AnalyzerEvent::Report(report));
                    }
                    Err(e) => warn!("Frame analysis failed: {}", e),
                }
            }
        });
    });

    // Run application
    let result = eframe::run_native(
        "Emotsioonide Jälgija",
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([1280.0, 960.0])
                .with_title("Emotsioonide Jälgija"),
            ..Default::default()
        },
        Box::new(move |_cc| {
            Ok(Box::new(EmotionTrackerApp::new(
                frame_sender,
                event_receiver,
            )))
        }),
    );

    if let Err(e) = result {
        error!("Application error: {}", e);
    }

    Ok(())
}
