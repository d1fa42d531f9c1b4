//! View rendering modules

mod catalog;
mod pane;

pub use catalog::render_catalog;
pub use pane::render_pane;

use pagediff_core::DiffKind;
use unicode_width::UnicodeWidthChar;

/// Cut `text` to at most `max_width` display columns, marking the cut with `…`
pub(crate) fn truncate_to_width(text: &str, max_width: usize) -> String {
    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut width = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > max_width - 1 {
            break;
        }
        out.push(c);
        width += w;
    }
    out.push('…');
    out
}

/// Title of a difference in lists
pub(crate) fn kind_title(kind: DiffKind) -> &'static str {
    match kind {
        DiffKind::Addition => "Text Added",
        DiffKind::Deletion => "Text Deleted",
        DiffKind::Modification => "Text Changed",
    }
}

#[cfg(test)]
mod tests;
