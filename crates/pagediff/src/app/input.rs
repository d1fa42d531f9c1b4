use super::{App, InputMode};
use pagediff_core::Side;
use std::path::PathBuf;

/// Expand a leading `~` to the home directory
fn expand_path(raw: &str) -> PathBuf {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(raw)
}

impl App {
    /// Start editing the document path of `side`, prefilled with the current one
    pub fn begin_path_input(&mut self, side: Side) {
        self.input_buffer = self
            .session
            .viewer(side)
            .source()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        self.input_mode = InputMode::Path(side);
    }

    pub fn begin_search(&mut self) {
        self.focus_catalog();
        self.input_buffer = self.query.search.clone();
        self.input_mode = InputMode::Search;
    }

    pub fn input_char(&mut self, c: char) {
        self.input_buffer.push(c);
        if self.input_mode == InputMode::Search {
            let search = self.input_buffer.clone();
            self.set_search(&search);
        }
    }

    pub fn input_backspace(&mut self) {
        self.input_buffer.pop();
        if self.input_mode == InputMode::Search {
            let search = self.input_buffer.clone();
            self.set_search(&search);
        }
    }

    /// Clear the whole input line (Ctrl-u)
    pub fn input_clear(&mut self) {
        self.input_buffer.clear();
        if self.input_mode == InputMode::Search {
            self.set_search("");
        }
    }

    /// Apply the input. An empty path closes the document of that side.
    pub fn submit_input(&mut self) {
        let mode = std::mem::take(&mut self.input_mode);
        let value = std::mem::take(&mut self.input_buffer);
        match mode {
            InputMode::Path(side) => {
                if value.trim().is_empty() {
                    if self.session.viewer(side).source().is_some() {
                        self.close_document(side);
                        let label = super::documents::side_label(side);
                        self.set_status(format!("Closed document {label}"));
                    }
                } else {
                    self.open_document(side, &expand_path(&value));
                }
            }
            InputMode::Search => self.set_search(&value),
            InputMode::Normal => {}
        }
    }

    /// Leave input mode. A cancelled search clears the search term.
    pub fn cancel_input(&mut self) {
        if self.input_mode == InputMode::Search {
            self.set_search("");
        }
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
    }

    pub fn is_editing(&self) -> bool {
        self.input_mode != InputMode::Normal
    }
}
