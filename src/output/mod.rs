// Output formatting for the CLI.

pub mod terminal;

/// Shorten `text` to `max_chars` characters plus "...". Used for note
/// previews in page titles and the `notes` listing, where content may hold
/// emoji or accented text.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
