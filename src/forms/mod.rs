use serde::{Deserialize, Deserializer};

pub mod order_items;
pub mod orders;
pub mod payments;

/// Maximum length accepted for free-text notes.
pub(crate) const NOTES_MAX_LEN: u64 = 500;

/// Deserialize optional text, treating blank strings as absent.
pub fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|text| !text.trim().is_empty()))
}

/// Collapse runs of whitespace and drop control characters.
pub(crate) fn sanitize_inline_text(input: &str) -> String {
    let mut sanitized = String::with_capacity(input.len());
    let mut previous_whitespace = false;

    for ch in input.trim().chars() {
        if ch.is_whitespace() {
            if !previous_whitespace {
                sanitized.push(' ');
                previous_whitespace = true;
            }
        } else if ch.is_control() {
            continue;
        } else {
            sanitized.push(ch);
            previous_whitespace = false;
        }
    }

    sanitized
}

/// Sanitize optional notes, dropping them when nothing printable is left.
pub(crate) fn sanitize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|notes| sanitize_inline_text(&notes))
        .filter(|notes| !notes.is_empty())
}
