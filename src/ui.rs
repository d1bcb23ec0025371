use terminal_size::{Width, terminal_size};

/// Get the current terminal width, defaulting to 80 if unable to detect
pub fn terminal_width() -> usize {
    if let Some((Width(w), _)) = terminal_size() {
        w as usize
    } else {
        80
    }
}

/// Pads `text` so a `\r`-prefixed rewrite fully covers the previous line.
pub fn pad_line(text: &str) -> String {
    let width = terminal_width().min(120);
    format!("{:<width$}", text, width = width.saturating_sub(1))
}
