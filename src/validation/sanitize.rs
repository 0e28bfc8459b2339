//! Text sanitization. A transform, never a rejection.

use super::MAX_TEXT_LENGTH;

/// Strip angle brackets, collapse whitespace runs, trim, cap at [`MAX_TEXT_LENGTH`] chars.
pub fn sanitize_text(text: &str) -> String {
    sanitize_text_with_limit(text, MAX_TEXT_LENGTH)
}

pub fn sanitize_text_with_limit(text: &str, max_chars: usize) -> String {
    let stripped: String = text.chars().filter(|c| !matches!(c, '<' | '>')).collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    match collapsed.char_indices().nth(max_chars) {
        Some((cut, _)) => collapsed[..cut].trim_end().to_string(),
        None => collapsed,
    }
}
