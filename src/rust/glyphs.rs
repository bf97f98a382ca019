use std::collections::HashMap;
use lazy_static::lazy_static;

/// Shown for any label without a dedicated glyph
pub const FALLBACK_GLYPH: &str = "❓";

lazy_static! {
    static ref GLYPHS: HashMap<&'static str, &'static str> = HashMap::from([
        ("anger", "😠"),
        ("disgust", "🤢"),
        ("fear", "😨"),
        ("joy", "😄"),
        ("neutral", "😐"),
        ("sadness", "😢"),
        ("surprise", "😲"),
    ]);
}

/// Display glyph for `label`; never fails.
pub fn glyph_for(label: &str) -> &'static str {
    GLYPHS.get(label).copied().unwrap_or(FALLBACK_GLYPH)
}
