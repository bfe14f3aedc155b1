use reportsheet_core::PLACEHOLDER;

/// Default maximum characters per wrapped body line.
pub const DEFAULT_WRAP_WIDTH: usize = 60;

/// 以空白斷行，每行不超過 `width` 個字元。 / Breaks `text` at whitespace into lines of at most `width` characters.
///
/// Width is measured in `char`s. A single word longer than `width` is kept
/// whole on its own line. Blank input yields exactly one [`PLACEHOLDER`]
/// line, so callers always receive at least one line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if current_len == 0 {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }

    if current_len > 0 {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(PLACEHOLDER.to_string());
    }
    lines
}

/// Wraps an optional field value; `None` behaves like blank text.
pub fn wrap_field(value: Option<&str>, width: usize) -> Vec<String> {
    wrap_text(value.unwrap_or_default(), width)
}
