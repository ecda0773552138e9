// Library exports for Emotsioonide Jälgija - Emotion Tracker

pub mod camera;
pub mod chart;
pub mod detector;
pub mod error;
pub mod history;
pub mod models;
pub mod ui;
