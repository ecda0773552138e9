// Bounded history of emotion samples driving the chart

use crate::models::{DetectionReport, Emotion, ExpressionScores};
use chrono::{DateTime, Local};
use std::collections::VecDeque;

/// Maximum number of samples kept; the oldest is evicted first
pub const HISTORY_CAP: usize = 50;

/// One recorded measurement: a timestamp and the charted emotions'
/// scores scaled to 0-100. Immutable once created.
#[derive(Clone, Debug)]
pub struct EmotionSample {
    timestamp: DateTime<Local>,
    scores: [f32; Emotion::CHARTED.len()],
}

impl EmotionSample {
    /// Builds a sample from a raw [0, 1] score vector, scaling each
    /// charted emotion to 0-100. Neutral is not recorded.
    pub fn from_scores(timestamp: DateTime<Local>, scores: &ExpressionScores) -> Self {
        let mut scaled = [0.0; Emotion::CHARTED.len()];
        for (slot, &emotion) in scaled.iter_mut().zip(Emotion::CHARTED.iter()) {
            *slot = scores.get(emotion) * 100.0;
        }
        Self {
            timestamp,
            scores: scaled,
        }
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Score for a charted emotion, or None for Neutral
    pub fn score(&self, emotion: Emotion) -> Option<f32> {
        Emotion::CHARTED
            .iter()
            .position(|&e| e == emotion)
            .map(|i| self.scores[i])
    }
}

/// FIFO buffer of the most recent emotion samples, capped at
/// `HISTORY_CAP`. Owned by the UI and discarded with it.
#[derive(Default)]
pub struct EmotionHistory {
    samples: VecDeque<EmotionSample>,
}

impl EmotionHistory {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(HISTORY_CAP),
        }
    }

    /// Records one sample from a detection report, taken from the first
    /// detected face. A report with no faces leaves the history
    /// unchanged. Returns whether a sample was appended.
    pub fn record(&mut self, report: &DetectionReport, timestamp: DateTime<Local>) -> bool {
        let Some(detection) = report.detections.first() else {
            return false;
        };
        self.push(EmotionSample::from_scores(timestamp, &detection.scores));
        true
    }

    /// Appends a sample, evicting the oldest once past the cap
    pub fn push(&mut self, sample: EmotionSample) {
        self.samples.push_back(sample);
        if self.samples.len() > HISTORY_CAP {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmotionSample> {
        self.samples.iter()
    }

    pub fn first(&self) -> Option<&EmotionSample> {
        self.samples.front()
    }

    pub fn last(&self) -> Option<&EmotionSample> {
        self.samples.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Detection, FaceBox};
    use approx::assert_relative_eq;
    use chrono::TimeZone;
    use rstest::rstest;

    fn at(seconds: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 1, 12, 0, seconds)
            .unwrap()
    }

    fn raw_scores(values: [(Emotion, f32); 7]) -> ExpressionScores {
        let mut scores = ExpressionScores::new();
        for (emotion, value) in values {
            scores.set(emotion, value);
        }
        scores
    }

    fn report_with_scores(scores: ExpressionScores) -> DetectionReport {
        DetectionReport {
            detections: vec![Detection {
                region: FaceBox {
                    x: 0.0,
                    y: 0.0,
                    width: 100.0,
                    height: 100.0,
                },
                scores,
            }],
            frame_width: 640,
            frame_height: 480,
        }
    }

    fn empty_report() -> DetectionReport {
        DetectionReport {
            detections: Vec::new(),
            frame_width: 640,
            frame_height: 480,
        }
    }

    fn happy_sample(seconds: u32, happy: f32) -> EmotionSample {
        let mut scores = ExpressionScores::new();
        scores.set(Emotion::Happy, happy);
        EmotionSample::from_scores(at(seconds), &scores)
    }

    #[test]
    fn test_sample_scales_scores_to_percent() {
        let scores = raw_scores([
            (Emotion::Happy, 0.8),
            (Emotion::Sad, 0.1),
            (Emotion::Angry, 0.0),
            (Emotion::Fearful, 0.0),
            (Emotion::Surprised, 0.1),
            (Emotion::Disgusted, 0.0),
            (Emotion::Neutral, 0.0),
        ]);
        let sample = EmotionSample::from_scores(at(0), &scores);

        assert_eq!(sample.timestamp(), at(0));
        assert_relative_eq!(sample.score(Emotion::Happy).unwrap(), 80.0);
        assert_relative_eq!(sample.score(Emotion::Sad).unwrap(), 10.0);
        assert_relative_eq!(sample.score(Emotion::Angry).unwrap(), 0.0);
        assert_relative_eq!(sample.score(Emotion::Fearful).unwrap(), 0.0);
        assert_relative_eq!(sample.score(Emotion::Surprised).unwrap(), 10.0);
        assert_relative_eq!(sample.score(Emotion::Disgusted).unwrap(), 0.0);
    }

    #[test]
    fn test_sample_does_not_record_neutral() {
        let scores = raw_scores([
            (Emotion::Happy, 0.0),
            (Emotion::Sad, 0.0),
            (Emotion::Angry, 0.0),
            (Emotion::Fearful, 0.0),
            (Emotion::Surprised, 0.0),
            (Emotion::Disgusted, 0.0),
            (Emotion::Neutral, 1.0),
        ]);
        let sample = EmotionSample::from_scores(at(0), &scores);
        assert!(sample.score(Emotion::Neutral).is_none());
    }

    #[rstest]
    #[case::zero(0.0, 0.0)]
    #[case::half(0.5, 50.0)]
    #[case::full(1.0, 100.0)]
    fn test_sample_scale_factor(#[case] raw: f32, #[case] percent: f32) {
        let mut scores = ExpressionScores::new();
        scores.set(Emotion::Fearful, raw);
        let sample = EmotionSample::from_scores(at(0), &scores);
        assert_relative_eq!(sample.score(Emotion::Fearful).unwrap(), percent);
    }

    #[test]
    fn test_record_appends_first_face() {
        let mut history = EmotionHistory::new();
        let mut first = ExpressionScores::new();
        first.set(Emotion::Angry, 0.9);
        let mut second = ExpressionScores::new();
        second.set(Emotion::Happy, 0.9);

        let mut report = report_with_scores(first);
        report.detections.push(Detection {
            region: FaceBox {
                x: 200.0,
                y: 0.0,
                width: 80.0,
                height: 80.0,
            },
            scores: second,
        });

        assert!(history.record(&report, at(0)));
        assert_eq!(history.len(), 1);
        let sample = history.last().unwrap();
        assert_relative_eq!(sample.score(Emotion::Angry).unwrap(), 90.0);
        assert_relative_eq!(sample.score(Emotion::Happy).unwrap(), 0.0);
    }

    #[test]
    fn test_record_empty_report_leaves_history_unchanged() {
        let mut history = EmotionHistory::new();
        history.push(happy_sample(0, 0.5));

        assert!(!history.record(&empty_report(), at(1)));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_history_never_exceeds_cap() {
        let mut history = EmotionHistory::new();
        for i in 0..200 {
            history.push(happy_sample(i % 60, 0.5));
            assert!(history.len() <= HISTORY_CAP);
        }
        assert_eq!(history.len(), HISTORY_CAP);
    }

    #[test]
    fn test_sixty_appends_keep_last_fifty_in_order() {
        let mut history = EmotionHistory::new();
        // Encode the append index in the score so order is observable
        for i in 0..60u32 {
            history.push(happy_sample(i, i as f32 / 100.0));
        }

        assert_eq!(history.len(), 50);
        let values: Vec<f32> = history
            .iter()
            .map(|s| s.score(Emotion::Happy).unwrap())
            .collect();
        for (offset, value) in values.iter().enumerate() {
            assert_relative_eq!(*value, (10 + offset) as f32);
        }
    }

    #[test]
    fn test_history_preserves_timestamp_order() {
        let mut history = EmotionHistory::new();
        for i in 0..10 {
            history.record(&report_with_scores(ExpressionScores::new()), at(i));
        }
        let timestamps: Vec<_> = history.iter().map(|s| s.timestamp()).collect();
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(history.first().unwrap().timestamp(), at(0));
        assert_eq!(history.last().unwrap().timestamp(), at(9));
    }
}
