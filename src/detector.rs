// Face detection and expression classification

use crate::error::{EmotionTrackerError, Result};
use crate::models::{Detection, DetectionReport, Emotion, ExpressionScores, FaceBox, Frame};
use opencv::core::{Mat, Rect, Size, Vector};
use opencv::imgproc;
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;
use tracing::{error, warn};

/// Model input edge length (HSEmotion expects 260x260 RGB)
const MODEL_INPUT_SIZE: i32 = 260;

/// A cropped face ready for classification
struct FaceCrop {
    region: FaceBox,
    /// Grayscale pixel data of the cropped region
    gray: Vec<u8>,
    height: u32,
}

/// Face detector using OpenCV Haar Cascade
pub struct FaceDetector {
    classifier: CascadeClassifier,
}

impl FaceDetector {
    /// Creates a new FaceDetector by loading the Haar Cascade classifier
    pub fn new(cascade_path: &str) -> Result<Self> {
        let classifier = CascadeClassifier::new(cascade_path).map_err(|e| {
            error!("Failed to load Haar Cascade: {}", e);
            EmotionTrackerError::ModelLoad(format!("Haar Cascade load failed: {e}"))
        })?;

        if classifier.empty()? {
            return Err(EmotionTrackerError::ModelLoad(
                "Haar Cascade classifier is empty".to_string(),
            ));
        }

        Ok(Self { classifier })
    }

    /// Detects all faces in the given frame
    fn detect_faces(&mut self, frame: &Frame) -> Result<Vec<FaceCrop>> {
        // Convert frame data to OpenCV Mat
        let mat = Mat::from_slice(&frame.data).map_err(|e| {
            EmotionTrackerError::FaceDetection(format!("Failed to create Mat: {e}"))
        })?;

        let mat = mat.reshape(3, frame.height as i32).map_err(|e| {
            EmotionTrackerError::FaceDetection(format!("Failed to reshape Mat: {e}"))
        })?;

        // Convert to grayscale for face detection
        let mut gray = Mat::default();
        imgproc::cvt_color(
            &mat,
            &mut gray,
            imgproc::COLOR_RGB2GRAY,
            0,
            opencv::core::AlgorithmHint::ALGO_HINT_DEFAULT,
        )
        .map_err(|e| {
            EmotionTrackerError::FaceDetection(format!("Failed to convert to grayscale: {e}"))
        })?;

        // Detect faces - balanced for accuracy
        let mut faces = Vector::<Rect>::new();
        self.classifier
            .detect_multi_scale(
                &gray,
                &mut faces,
                1.1,               // scale factor (lower = more accurate)
                5,                 // min neighbors (lower = more detections)
                0,                 // flags
                Size::new(40, 40), // min size (smaller = more detections)
                Size::new(0, 0),   // max size (0,0 means no limit)
            )
            .map_err(|e| {
                EmotionTrackerError::FaceDetection(format!("Face detection failed: {e}"))
            })?;

        // Extract face regions
        let mut crops = Vec::new();
        for face_rect in faces.iter() {
            match Self::extract_face_region(&gray, face_rect) {
                Ok(crop) => crops.push(crop),
                Err(e) => {
                    warn!("Failed to extract face region: {}", e);
                    continue;
                }
            }
        }

        Ok(crops)
    }

    /// Extracts and crops a face region from the grayscale image
    fn extract_face_region(gray: &Mat, rect: Rect) -> Result<FaceCrop> {
        // Crop the face region
        let face_roi = Mat::roi(gray, rect).map_err(|e| {
            EmotionTrackerError::FaceDetection(format!("Failed to crop face region: {e}"))
        })?;

        // Clone the ROI to ensure the Mat is continuous in memory
        let face_continuous = face_roi.try_clone().map_err(|e| {
            EmotionTrackerError::FaceDetection(format!("Failed to clone face ROI: {e}"))
        })?;

        // Convert to continuous array
        let face_data = face_continuous.data_bytes().map_err(|e| {
            EmotionTrackerError::FaceDetection(format!("Failed to get face data: {e}"))
        })?;

        Ok(FaceCrop {
            region: FaceBox {
                x: rect.x as f32,
                y: rect.y as f32,
                width: rect.width as f32,
                height: rect.height as f32,
            },
            gray: face_data.to_vec(),
            height: rect.height as u32,
        })
    }
}

/// Preprocesses a face crop for model input (RGB format for HSEmotion).
/// Returns a normalized float array in HWC layout.
fn preprocess_face(face_data: &[u8], face_height: u32) -> Result<Vec<f32>> {
    // Create Mat from face data (grayscale)
    let face_mat = Mat::from_slice(face_data).map_err(|e| {
        EmotionTrackerError::FrameProcessing(format!("Failed to create face Mat: {e}"))
    })?;

    let face_mat = face_mat.reshape(1, face_height as i32).map_err(|e| {
        EmotionTrackerError::FrameProcessing(format!("Failed to reshape face Mat: {e}"))
    })?;

    // Convert grayscale to RGB (HSEmotion expects RGB)
    let mut rgb_mat = Mat::default();
    opencv::imgproc::cvt_color_def(&face_mat, &mut rgb_mat, imgproc::COLOR_GRAY2RGB).map_err(
        |e| EmotionTrackerError::FrameProcessing(format!("Failed to convert to RGB: {e}")),
    )?;

    // Resize to the model input size
    let mut resized = Mat::default();
    imgproc::resize(
        &rgb_mat,
        &mut resized,
        Size::new(MODEL_INPUT_SIZE, MODEL_INPUT_SIZE),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )
    .map_err(|e| EmotionTrackerError::FrameProcessing(format!("Failed to resize face: {e}")))?;

    // Convert to float and normalize to [0, 1]
    let data = resized.data_bytes().map_err(|e| {
        EmotionTrackerError::FrameProcessing(format!("Failed to get resized data: {e}"))
    })?;

    let normalized: Vec<f32> = data.iter().map(|&pixel| pixel as f32 / 255.0).collect();
    Ok(normalized)
}

/// Applies softmax to convert logits to probabilities
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp_sum: f32 = logits.iter().map(|&x| (x - max_logit).exp()).sum();
    logits
        .iter()
        .map(|&x| (x - max_logit).exp() / exp_sum)
        .collect()
}

/// Maps model output probabilities to per-emotion scores.
/// HSEmotion class order: 0=Angry, 1=Disgust, 2=Fear, 3=Happy, 4=Sad,
/// 5=Surprise, 6=Neutral, 7=Contempt. Contempt folds into Disgusted.
fn scores_from_probabilities(probabilities: &[f32]) -> ExpressionScores {
    const CLASS_ORDER: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgusted,
        Emotion::Fearful,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprised,
        Emotion::Neutral,
    ];

    let mut scores = ExpressionScores::new();
    for (index, &probability) in probabilities.iter().enumerate() {
        match CLASS_ORDER.get(index) {
            Some(&emotion) => scores.set(emotion, probability),
            None if index == 7 => scores.add(Emotion::Disgusted, probability),
            None => {
                warn!("Unknown emotion class index: {}, ignoring", index);
            }
        }
    }
    scores
}

use ort::session::Session;
use ort::value::Value;

/// Expression classifier using ONNX Runtime
pub struct ExpressionClassifier {
    session: Session,
}

impl ExpressionClassifier {
    /// Creates a new ExpressionClassifier by loading the ONNX model
    pub fn new(model_path: &str) -> Result<Self> {
        let session = Session::builder()
            .map_err(|e| {
                EmotionTrackerError::ModelLoad(format!("Failed to create session builder: {e}"))
            })?
            .commit_from_file(model_path)
            .map_err(|e| {
                error!("Failed to load ONNX model: {}", e);
                EmotionTrackerError::ModelLoad(format!("ONNX model load failed: {e}"))
            })?;

        Ok(Self { session })
    }

    /// Classifies expressions from preprocessed face data, returning the
    /// whole score distribution rather than just the top class
    fn classify(&mut self, preprocessed_face: &[f32]) -> Result<ExpressionScores> {
        // The model expects [1, 3, 260, 260] in CHW format but the
        // preprocessed data is in HWC format, so reorder
        let height = MODEL_INPUT_SIZE as usize;
        let width = MODEL_INPUT_SIZE as usize;
        let channels = 3;

        let mut chw_data = vec![0.0f32; channels * height * width];
        for h in 0..height {
            for w in 0..width {
                for c in 0..channels {
                    let hwc_idx = (h * width + w) * channels + c;
                    let chw_idx = c * (height * width) + h * width + w;
                    chw_data[chw_idx] = preprocessed_face[hwc_idx];
                }
            }
        }

        let input_array = ndarray::Array4::from_shape_vec((1, 3, height, width), chw_data)
            .map_err(|e| {
                error!("Failed to create input array: {}", e);
                EmotionTrackerError::OnnxRuntime(format!("Failed to create input array: {e}"))
            })?;

        let input_tensor = Value::from_array(input_array).map_err(|e| {
            EmotionTrackerError::OnnxRuntime(format!("Failed to create input tensor: {e}"))
        })?;

        // Run inference
        let inputs = ort::inputs![input_tensor];
        let outputs = self.session.run(inputs).map_err(|e| {
            error!("ONNX inference failed: {}", e);
            EmotionTrackerError::OnnxRuntime(format!("Inference failed: {e}"))
        })?;

        // Extract output logits - get first output
        let (_, output_value) = outputs
            .iter()
            .next()
            .ok_or_else(|| EmotionTrackerError::OnnxRuntime("No output from model".to_string()))?;

        let tensor = output_value.try_extract_tensor::<f32>().map_err(|e| {
            EmotionTrackerError::OnnxRuntime(format!("Failed to extract output tensor: {e}"))
        })?;

        let logits = tensor.1;
        if logits.is_empty() {
            return Err(EmotionTrackerError::OnnxRuntime(
                "Empty model output".to_string(),
            ));
        }

        Ok(scores_from_probabilities(&softmax(logits)))
    }
}

/// Combines face detection and expression classification into per-frame
/// detection reports
pub struct ExpressionAnalyzer {
    face_detector: FaceDetector,
    classifier: ExpressionClassifier,
}

impl ExpressionAnalyzer {
    /// Creates a new ExpressionAnalyzer, loading both model resources
    pub fn new(cascade_path: &str, model_path: &str) -> Result<Self> {
        let face_detector = FaceDetector::new(cascade_path)?;
        let classifier = ExpressionClassifier::new(model_path)?;

        Ok(Self {
            face_detector,
            classifier,
        })
    }

    /// Detects all faces in a frame and classifies each one's expressions
    pub fn process_frame(&mut self, frame: &Frame) -> Result<DetectionReport> {
        let crops = self.face_detector.detect_faces(frame)?;

        let mut detections = Vec::with_capacity(crops.len());
        for crop in crops {
            let preprocessed = preprocess_face(&crop.gray, crop.height)?;
            match self.classifier.classify(&preprocessed) {
                Ok(scores) => detections.push(Detection {
                    region: crop.region,
                    scores,
                }),
                Err(e) => {
                    error!("Expression classification failed: {}", e);
                    continue;
                }
            }
        }

        Ok(DetectionReport {
            detections,
            frame_width: frame.width,
            frame_height: frame.height,
        })
    }
}
