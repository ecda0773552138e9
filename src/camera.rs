// Camera module for webcam capture

use crate::error::{EmotionTrackerError, Result};
use crate::models::Frame;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use tracing::error;

/// Manages the webcam stream. Frames are pulled by the UI loop; the
/// stream is stopped explicitly or when the manager is dropped.
pub struct CameraManager {
    camera: Camera,
    streaming: bool,
}

impl CameraManager {
    /// Opens a camera device. Failure here is terminal; there is no retry.
    pub fn new() -> Result<Self> {
        // Request 640x480 at 30 FPS for better performance
        let requested_format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            nokhwa::utils::CameraFormat::new(
                nokhwa::utils::Resolution::new(640, 480),
                nokhwa::utils::FrameFormat::YUYV,
                30,
            ),
        ));

        // Try different camera indices (some systems start at 0, others at 1)
        let camera = Self::try_open_camera(0, requested_format)
            .or_else(|_| Self::try_open_camera(1, requested_format))
            .map_err(|e| {
                error!(
                    "Failed to initialize camera after trying multiple indices: {}",
                    e
                );
                EmotionTrackerError::CameraInit(format!(
                    "Could not open camera. Make sure:\n\
                    1. A camera is connected\n\
                    2. No other app is using it\n\
                    3. Camera permissions are granted\n\
                    Error: {e}"
                ))
            })?;

        Ok(Self {
            camera,
            streaming: false,
        })
    }

    /// Helper to try opening a camera at a specific index
    fn try_open_camera(index: u32, requested_format: RequestedFormat) -> Result<Camera> {
        Camera::new(CameraIndex::Index(index), requested_format)
            .map_err(|e| EmotionTrackerError::CameraInit(e.to_string()))
    }

    /// Opens the camera stream and verifies frames arrive
    pub fn start(&mut self) -> Result<()> {
        // Opening is idempotent if the stream is already up
        let _ = self.camera.open_stream();

        // Wait a moment for the camera to initialize
        std::thread::sleep(std::time::Duration::from_millis(200));

        // Verify stream is working
        match self.camera.frame() {
            Ok(_) => {
                self.streaming = true;
                Ok(())
            }
            Err(e) => {
                error!("Camera stream not working: {}", e);
                Err(EmotionTrackerError::CameraInit(format!(
                    "Camera stream not working: {e}. Make sure camera permissions are granted."
                )))
            }
        }
    }

    /// Stops the camera stream
    pub fn stop(&mut self) {
        if !self.streaming {
            return;
        }

        self.streaming = false;

        if let Err(e) = self.camera.stop_stream() {
            error!("Error stopping camera stream: {}", e);
        }
    }

    /// Gets the most recent frame (blocking).
    /// The stream must be opened first with start().
    pub fn current_frame(&mut self) -> Result<Frame> {
        let frame_data = self.camera.frame().map_err(|e| {
            EmotionTrackerError::FrameProcessing(format!("Failed to capture frame: {e}"))
        })?;

        let buffer = frame_data.decode_image::<RgbFormat>().map_err(|e| {
            EmotionTrackerError::FrameProcessing(format!("Failed to decode frame: {e}"))
        })?;

        let (width, height) = (buffer.width(), buffer.height());
        let data = buffer.into_raw();

        Ok(Frame::new(data, width, height))
    }
}

impl Drop for CameraManager {
    fn drop(&mut self) {
        self.stop();
    }
}
