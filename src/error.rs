// Error types for the Emotion Tracker application

use thiserror::Error;

/// Main error type for the Emotion Tracker application
#[derive(Debug, Error)]
pub enum EmotionTrackerError {
    #[error("Camera initialization failed: {0}")]
    CameraInit(String),

    #[error("Frame processing failed: {0}")]
    FrameProcessing(String),

    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Face detection failed: {0}")]
    FaceDetection(String),

    #[error("ONNX Runtime error: {0}")]
    OnnxRuntime(String),

    #[error("OpenCV error: {0}")]
    OpenCV(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Emotion Tracker operations
pub type Result<T> = std::result::Result<T, EmotionTrackerError>;

// Conversion from nokhwa errors
impl From<nokhwa::NokhwaError> for EmotionTrackerError {
    fn from(err: nokhwa::NokhwaError) -> Self {
        match err {
            nokhwa::NokhwaError::StructureError { structure, error } => {
                EmotionTrackerError::CameraInit(format!("{structure}: {error}"))
            }
            nokhwa::NokhwaError::OpenDeviceError(device, error) => {
                EmotionTrackerError::CameraInit(format!("Device {device}: {error}"))
            }
            nokhwa::NokhwaError::GetPropertyError { property, error } => {
                EmotionTrackerError::CameraInit(format!("Property {property}: {error}"))
            }
            _ => EmotionTrackerError::CameraInit(err.to_string()),
        }
    }
}

// Conversion from OpenCV errors
impl From<opencv::Error> for EmotionTrackerError {
    fn from(err: opencv::Error) -> Self {
        EmotionTrackerError::OpenCV(err.to_string())
    }
}

// Conversion from ONNX Runtime errors
impl From<ort::Error> for EmotionTrackerError {
    fn from(err: ort::Error) -> Self {
        EmotionTrackerError::OnnxRuntime(err.to_string())
    }
}
