//! Text measurement helpers for scene layout.
//!
//! SVG text does not wrap, so layouts break paragraphs themselves using an
//! estimated average glyph advance. The estimate errs wide so lines stay inside
//! their boxes with the fonts we fall back to.

/// Average advance as a fraction of the font size for running text.
pub const BODY_ADVANCE: f32 = 0.52;
/// Average advance for the calligraphic display faces.
pub const DISPLAY_ADVANCE: f32 = 0.45;

/// Approximate rendered width of `text` at `size`.
pub fn estimate_width(text: &str, size: f32, advance: f32) -> f32 {
    text.chars().count() as f32 * size * advance
}

/// Greedy word wrap to lines no wider than `max_width`.
///
/// A word longer than a line gets a line of its own rather than being split.
pub fn wrap(text: &str, max_width: f32, size: f32, advance: f32) -> Vec<String> {
    let max_chars = ((max_width / (size * advance)).floor() as usize).max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current_len == 0 {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Shrink `size` until `text` fits on one line of `max_width`.
pub fn fit_size(text: &str, max_width: f32, size: f32, advance: f32) -> f32 {
    let width = estimate_width(text, size, advance);
    if width <= max_width || width == 0.0 {
        size
    } else {
        size * max_width / width
    }
}

/// Uppercase for tracked label text; scripts without case pass through unchanged.
pub fn upper(text: &str) -> String {
    text.to_uppercase()
}
