//! Anchor and hyperlink helpers.

use crate::model::slug::slugify;

/// Fragment (without `#`) that a heading with `text` is reachable under.
pub fn anchor(text: &str) -> String {
    slugify(text)
}

/// Renders `[text](#anchor)`.
pub fn hyperlink(text: &str) -> String {
    format!("[{text}](#{})", anchor(text))
}
