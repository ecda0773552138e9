// Rolling line chart of the emotion score history

use crate::history::EmotionHistory;
use crate::models::Emotion;

const CHART_HEIGHT: f32 = 220.0;
const CHART_BG: egui::Color32 = egui::Color32::from_rgb(16, 16, 24);
const GRID_LINE: egui::Color32 = egui::Color32::from_rgb(38, 38, 56);
const AXIS_TEXT: egui::Color32 = egui::Color32::from_rgb(138, 138, 170);
const SERIES_STROKE: f32 = 1.5;

/// Line color for each emotion
pub fn emotion_color(emotion: Emotion) -> egui::Color32 {
    match emotion {
        Emotion::Happy => egui::Color32::from_rgb(0xFF, 0xD7, 0x00),
        Emotion::Sad => egui::Color32::from_rgb(0x41, 0x69, 0xE1),
        Emotion::Angry => egui::Color32::from_rgb(0xFF, 0x45, 0x00),
        Emotion::Fearful => egui::Color32::from_rgb(0x80, 0x00, 0x80),
        Emotion::Surprised => egui::Color32::from_rgb(0x32, 0xCD, 0x32),
        Emotion::Disgusted => egui::Color32::from_rgb(0x8B, 0x45, 0x13),
        Emotion::Neutral => egui::Color32::from_rgb(0xA0, 0xA0, 0xA0),
    }
}

/// One chart line: an emotion and its 0-100 values, oldest first
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub emotion: Emotion,
    pub values: Vec<f32>,
}

/// Maps the history to one series per charted emotion
pub fn build_series(history: &EmotionHistory) -> Vec<Series> {
    Emotion::CHARTED
        .iter()
        .map(|&emotion| Series {
            emotion,
            values: history
                .iter()
                .map(|sample| sample.score(emotion).unwrap_or(0.0))
                .collect(),
        })
        .collect()
}

/// Draws the chart: title, legend, gridded plot area and one line per
/// charted emotion
pub fn draw(ui: &mut egui::Ui, history: &EmotionHistory) {
    ui.label(egui::RichText::new("Emotsioonide muutused ajas").strong());
    ui.horizontal(|ui| {
        for emotion in Emotion::CHARTED {
            ui.colored_label(emotion_color(emotion), emotion.label());
        }
    });

    let width = ui.available_width();
    let (rect, _) = ui.allocate_exact_size(egui::vec2(width, CHART_HEIGHT), egui::Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 2.0, CHART_BG);

    let plot = egui::Rect::from_min_max(
        egui::pos2(rect.min.x + 34.0, rect.min.y + 8.0),
        egui::pos2(rect.max.x - 8.0, rect.max.y - 18.0),
    );
    let value_to_y = |value: f32| plot.max.y - (value / 100.0) * plot.height();

    // Score gridlines with percentage labels
    for level in [0.0f32, 25.0, 50.0, 75.0, 100.0] {
        let y = value_to_y(level);
        painter.line_segment(
            [egui::pos2(plot.min.x, y), egui::pos2(plot.max.x, y)],
            egui::Stroke::new(0.5, GRID_LINE),
        );
        painter.text(
            egui::pos2(plot.min.x - 4.0, y),
            egui::Align2::RIGHT_CENTER,
            format!("{}", level as u32),
            egui::FontId::monospace(9.0),
            AXIS_TEXT,
        );
    }

    // Axis captions
    painter.text(
        egui::pos2(plot.min.x + 2.0, rect.min.y + 2.0),
        egui::Align2::LEFT_TOP,
        "Emotsiooni tugevus (%)",
        egui::FontId::proportional(9.0),
        AXIS_TEXT,
    );
    painter.text(
        egui::pos2(plot.center().x, rect.max.y - 2.0),
        egui::Align2::CENTER_BOTTOM,
        "Aeg",
        egui::FontId::proportional(9.0),
        AXIS_TEXT,
    );

    if history.len() >= 2 {
        let span = (history.len() - 1) as f32;
        for series in build_series(history) {
            let points: Vec<egui::Pos2> = series
                .values
                .iter()
                .enumerate()
                .map(|(i, &value)| {
                    let x = plot.min.x + plot.width() * (i as f32 / span);
                    egui::pos2(x, value_to_y(value))
                })
                .collect();
            painter.add(egui::Shape::line(
                points,
                egui::Stroke::new(SERIES_STROKE, emotion_color(series.emotion)),
            ));
        }
    }

    // First and last sample times on the x-axis
    if let (Some(first), Some(last)) = (history.first(), history.last()) {
        painter.text(
            egui::pos2(plot.min.x, plot.max.y + 2.0),
            egui::Align2::LEFT_TOP,
            first.timestamp().format("%H:%M:%S").to_string(),
            egui::FontId::monospace(9.0),
            AXIS_TEXT,
        );
        painter.text(
            egui::pos2(plot.max.x, plot.max.y + 2.0),
            egui::Align2::RIGHT_TOP,
            last.timestamp().format("%H:%M:%S").to_string(),
            egui::FontId::monospace(9.0),
            AXIS_TEXT,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::EmotionSample;
    use crate::models::ExpressionScores;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn history_with(values: &[(Emotion, f32)]) -> EmotionHistory {
        let mut history = EmotionHistory::new();
        for (i, &(emotion, value)) in values.iter().enumerate() {
            let mut scores = ExpressionScores::new();
            scores.set(emotion, value);
            let timestamp = chrono::Local
                .with_ymd_and_hms(2024, 3, 1, 12, 0, i as u32)
                .unwrap();
            history.push(EmotionSample::from_scores(timestamp, &scores));
        }
        history
    }

    #[test]
    fn test_build_series_one_line_per_charted_emotion() {
        let history = history_with(&[(Emotion::Happy, 0.5)]);
        let series = build_series(&history);
        assert_eq!(series.len(), Emotion::CHARTED.len());
        let emotions: Vec<Emotion> = series.iter().map(|s| s.emotion).collect();
        assert_eq!(emotions, Emotion::CHARTED.to_vec());
    }

    #[test]
    fn test_build_series_values_match_samples() {
        let history = history_with(&[(Emotion::Sad, 0.25), (Emotion::Sad, 0.75)]);
        let series = build_series(&history);

        let sad = series.iter().find(|s| s.emotion == Emotion::Sad).unwrap();
        assert_eq!(sad.values.len(), 2);
        assert_relative_eq!(sad.values[0], 25.0);
        assert_relative_eq!(sad.values[1], 75.0);

        // Other emotions stay flat at zero
        let happy = series.iter().find(|s| s.emotion == Emotion::Happy).unwrap();
        assert_relative_eq!(happy.values[0], 0.0);
        assert_relative_eq!(happy.values[1], 0.0);
    }

    #[test]
    fn test_build_series_empty_history() {
        let history = EmotionHistory::new();
        let series = build_series(&history);
        assert_eq!(series.len(), Emotion::CHARTED.len());
        assert!(series.iter().all(|s| s.values.is_empty()));
    }
}
