pub mod instances;
pub mod select;
pub mod series;
pub mod top;

/// Format milliseconds as a human-readable duration value.
pub(crate) fn format_ms(ms: u64) -> String {
    let ms = ms as f64;
    if ms >= 3_600_000.0 {
        format!("{:.2} h", ms / 3_600_000.0)
    } else if ms >= 60_000.0 {
        format!("{:.2} min", ms / 60_000.0)
    } else if ms >= 1_000.0 {
        format!("{:.2} s", ms / 1_000.0)
    } else {
        format!("{} ms", ms as u64)
    }
}

/// Collapse SQL text to a single line and cap its width for table
/// output.
pub(crate) fn compact_sql(text: &str, max_width: usize) -> String {
    let mut compact = String::with_capacity(text.len().min(max_width));
    let mut last_was_space = true;
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                compact.push(' ');
            }
            last_was_space = true;
        } else {
            compact.push(c);
            last_was_space = false;
        }
    }
    let compact = compact.trim_end();
    if compact.chars().count() > max_width {
        let truncated: String = compact.chars().take(max_width.saturating_sub(1)).collect();
        format!("{truncated}…")
    } else {
        compact.to_string()
    }
}
