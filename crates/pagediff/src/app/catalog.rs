use super::{App, Focus};
use pagediff_core::TypeFilter;
use std::time::Instant;

impl App {
    /// Global indices of the differences passing the current filter and search
    pub fn visible_entries(&self) -> Vec<usize> {
        self.session
            .catalog()
            .filtered(&self.query)
            .iter()
            .map(|entry| entry.index)
            .collect()
    }

    pub(super) fn reset_catalog_cursor(&mut self) {
        self.catalog_cursor = 0;
        self.catalog_scroll = 0;
    }

    fn clamp_catalog_cursor(&mut self) {
        let len = self.visible_entries().len();
        if len == 0 {
            self.reset_catalog_cursor();
        } else if self.catalog_cursor >= len {
            self.catalog_cursor = len - 1;
        }
    }

    /// Move the catalog cursor onto `index` if it is visible
    pub(super) fn sync_catalog_cursor(&mut self, index: usize) {
        if let Some(pos) = self.visible_entries().iter().position(|&i| i == index) {
            self.catalog_cursor = pos;
        }
    }

    pub fn cycle_filter(&mut self) {
        self.set_filter(self.query.filter.next());
    }

    pub fn set_filter(&mut self, filter: TypeFilter) {
        self.query.filter = filter;
        self.clamp_catalog_cursor();
        if let Some(active) = self.session.active_index() {
            self.sync_catalog_cursor(active);
        }
    }

    pub(super) fn set_search(&mut self, search: &str) {
        self.query.search = search.to_string();
        self.clamp_catalog_cursor();
    }

    pub fn catalog_cursor_down(&mut self) {
        let len = self.visible_entries().len();
        if len > 0 && self.catalog_cursor + 1 < len {
            self.catalog_cursor += 1;
        }
    }

    pub fn catalog_cursor_up(&mut self) {
        self.catalog_cursor = self.catalog_cursor.saturating_sub(1);
    }

    pub fn catalog_cursor_first(&mut self) {
        self.catalog_cursor = 0;
    }

    pub fn catalog_cursor_last(&mut self) {
        self.catalog_cursor = self.visible_entries().len().saturating_sub(1);
    }

    /// Global index under the catalog cursor
    pub fn catalog_cursor_index(&self) -> Option<usize> {
        self.visible_entries().get(self.catalog_cursor).copied()
    }

    /// Navigate to the entry under the cursor
    pub fn activate_catalog_cursor(&mut self) {
        if let Some(index) = self.catalog_cursor_index() {
            self.select_difference(index, Instant::now());
        }
    }

    pub fn focus_catalog(&mut self) {
        if !self.catalog_visible {
            self.catalog_visible = true;
        }
        self.focus = Focus::Catalog;
    }

    /// Keep the cursor inside a list window of `rows` entries
    pub fn ensure_catalog_cursor_visible(&mut self, rows: usize) {
        if rows == 0 {
            return;
        }
        if self.catalog_cursor < self.catalog_scroll {
            self.catalog_scroll = self.catalog_cursor;
        } else if self.catalog_cursor >= self.catalog_scroll + rows {
            self.catalog_scroll = self.catalog_cursor + 1 - rows;
        }
    }
}
