// Core data models for the Emotion Tracker application

/// Represents a single video frame with RGB data
#[derive(Clone, Debug)]
pub struct Frame {
    /// Raw RGB pixel data (width * height * 3 bytes)
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

impl Frame {
    /// Creates a new Frame with the given parameters
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }
}

/// The set of emotions the expression model scores.
///
/// Neutral is scored and shown in overlays but excluded from the
/// charted history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Fearful,
    Surprised,
    Disgusted,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Fearful,
        Emotion::Surprised,
        Emotion::Disgusted,
        Emotion::Neutral,
    ];

    /// The emotions recorded in history and drawn on the chart
    pub const CHARTED: [Emotion; 6] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Fearful,
        Emotion::Surprised,
        Emotion::Disgusted,
    ];

    /// Estonian display label
    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Happy => "rõõm",
            Emotion::Sad => "kurbus",
            Emotion::Angry => "viha",
            Emotion::Fearful => "hirm",
            Emotion::Surprised => "üllatus",
            Emotion::Disgusted => "vastikus",
            Emotion::Neutral => "neutraalne",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Per-emotion expression scores in [0, 1], one entry per `Emotion::ALL`
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ExpressionScores {
    scores: [f32; Emotion::ALL.len()],
}

impl ExpressionScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, emotion: Emotion) -> f32 {
        self.scores[emotion as usize]
    }

    pub fn set(&mut self, emotion: Emotion, score: f32) {
        self.scores[emotion as usize] = score;
    }

    pub fn add(&mut self, emotion: Emotion, score: f32) {
        self.scores[emotion as usize] += score;
    }

    /// The highest-scoring emotion and its score. Ties resolve to the
    /// earlier entry in `Emotion::ALL`.
    pub fn dominant(&self) -> (Emotion, f32) {
        let mut best = Emotion::ALL[0];
        let mut best_score = self.scores[0];
        for &emotion in &Emotion::ALL[1..] {
            let score = self.get(emotion);
            if score > best_score {
                best = emotion;
                best_score = score;
            }
        }
        (best, best_score)
    }
}

/// Axis-aligned face bounding box in frame coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl FaceBox {
    /// Scales the box, e.g. from frame coordinates to display coordinates
    pub fn scaled(&self, sx: f32, sy: f32) -> FaceBox {
        FaceBox {
            x: self.x * sx,
            y: self.y * sy,
            width: self.width * sx,
            height: self.height * sy,
        }
    }
}

/// One located face and its expression score vector
#[derive(Clone, Debug)]
pub struct Detection {
    pub region: FaceBox,
    pub scores: ExpressionScores,
}

/// All detections for one analyzed frame
#[derive(Clone, Debug)]
pub struct DetectionReport {
    pub detections: Vec<Detection>,
    /// Dimensions of the analyzed frame, for overlay scaling
    pub frame_width: u32,
    pub frame_height: u32,
}

/// Messages published by the detection worker
#[derive(Clone, Debug)]
pub enum AnalyzerEvent {
    ModelsLoaded,
    ModelsFailed(String),
    Report(DetectionReport),
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dominant_picks_highest_score() {
        let mut scores = ExpressionScores::new();
        scores.set(Emotion::Happy, 0.1);
        scores.set(Emotion::Surprised, 0.7);
        scores.set(Emotion::Neutral, 0.2);
        let (emotion, score) = scores.dominant();
        assert_eq!(emotion, Emotion::Surprised);
        assert_relative_eq!(score, 0.7);
    }

    #[test]
    fn test_dominant_all_zero_defaults_to_first() {
        let scores = ExpressionScores::new();
        assert_eq!(scores.dominant().0, Emotion::Happy);
    }

    #[test]
    fn test_add_accumulates() {
        let mut scores = ExpressionScores::new();
        scores.set(Emotion::Disgusted, 0.2);
        scores.add(Emotion::Disgusted, 0.1);
        assert_relative_eq!(scores.get(Emotion::Disgusted), 0.3);
    }

    #[test]
    fn test_charted_excludes_neutral() {
        assert!(!Emotion::CHARTED.contains(&Emotion::Neutral));
        assert_eq!(Emotion::CHARTED.len(), Emotion::ALL.len() - 1);
    }

    #[test]
    fn test_face_box_scaled() {
        let region = FaceBox {
            x: 10.0,
            y: 20.0,
            width: 100.0,
            height: 50.0,
        };
        let scaled = region.scaled(2.0, 0.5);
        assert_relative_eq!(scaled.x, 20.0);
        assert_relative_eq!(scaled.y, 10.0);
        assert_relative_eq!(scaled.width, 200.0);
        assert_relative_eq!(scaled.height, 25.0);
    }
}
