//! Shapes a prediction set for display: rounding, ranking, glyphs and colors.

use serde::Serialize;

use crate::glyphs::glyph_for;
use crate::prediction::PredictionSet;

/// Decimal places shown for confidences
pub const DISPLAY_PRECISION: i32 = 4;

const PALETTE: [&str; 10] = [
    "#4c78a8", "#f58518", "#e45756", "#72b7b2", "#54a24b",
    "#eeca3b", "#b279a2", "#ff9da6", "#9d755d", "#bab0ac",
];

/// One row of the results table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub glyph: &'static str,
    pub label: String,
    /// Rounded to [`DISPLAY_PRECISION`] places
    pub confidence: f64,
    /// The model's score, unrounded
    pub score: f32,
}

/// One bar of the horizontal chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartBar {
    pub label: String,
    pub confidence: f64,
    /// Bar length as a share of the full axis, `0..=100`
    pub width_percent: f64,
    pub color: &'static str,
}

/// Both views of the same ranked predictions, highest confidence first.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FormattedResult {
    pub table: Vec<TableRow>,
    pub chart: Vec<ChartBar>,
}

impl FormattedResult {
    pub fn top(&self) -> Option<&TableRow> {
        self.table.first()
    }
}

/// Rounds half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub fn round_confidence(score: f32) -> f64 {
    round_to(f64::from(score), DISPLAY_PRECISION)
}

/// Ranks predictions by rounded confidence, descending.
///
/// The sort is stable: labels whose rounded confidences tie keep the order the
/// model returned them in.
pub fn format(predictions: &PredictionSet) -> FormattedResult {
    let mut table: Vec<TableRow> = predictions
        .iter()
        .map(|p| TableRow {
            glyph: glyph_for(&p.label),
            label: p.label.clone(),
            confidence: round_confidence(p.score),
            score: p.score,
        })
        .collect();
    table.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut alphabetical: Vec<&str> = predictions.iter().map(|p| p.label.as_str()).collect();
    alphabetical.sort_unstable();
    let color_of = |label: &str| {
        let rank = alphabetical.binary_search(&label).unwrap_or(0);
        PALETTE[rank % PALETTE.len()]
    };

    let chart = table
        .iter()
        .map(|row| ChartBar {
            label: row.label.clone(),
            confidence: row.confidence,
            width_percent: (row.confidence * 100.0).clamp(0.0, 100.0),
            color: color_of(&row.label),
        })
        .collect();

    FormattedResult { table, chart }
}
