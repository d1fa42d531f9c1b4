use super::types::{contains, WHEEL_ROWS, ZOOM_STEP};
use super::{App, Focus};
use log::debug;
use pagediff_core::Side;
use std::time::Instant;

impl App {
    /// Pane that takes scroll keys: the focused one, or A from the catalog
    pub fn scroll_side(&self) -> Side {
        match self.focus {
            Focus::Pane(side) => side,
            Focus::Catalog => Side::A,
        }
    }

    /// Scroll a pane by `rows` terminal rows as a user scroll
    pub fn scroll_rows(&mut self, side: Side, rows: f64) {
        let delta = rows * self.cell.height;
        self.session.scroll_by(side, delta);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_rows(self.scroll_side(), 1.0);
    }

    pub fn scroll_up(&mut self) {
        self.scroll_rows(self.scroll_side(), -1.0);
    }

    pub fn scroll_half_page_down(&mut self) {
        let side = self.scroll_side();
        let half = self.session.viewer(side).client_height() / 2.0;
        self.session.scroll_by(side, half.max(self.cell.height));
    }

    pub fn scroll_half_page_up(&mut self) {
        let side = self.scroll_side();
        let half = self.session.viewer(side).client_height() / 2.0;
        self.session.scroll_by(side, -half.max(self.cell.height));
    }

    pub fn scroll_to_top(&mut self) {
        let side = self.scroll_side();
        self.session.on_scroll(side, 0.0);
    }

    pub fn scroll_to_bottom(&mut self) {
        let side = self.scroll_side();
        let bottom = self.session.viewer(side).pane_metrics().max_scroll();
        self.session.on_scroll(side, bottom);
    }

    pub fn focus_pane(&mut self, side: Side) {
        self.focus = Focus::Pane(side);
    }

    /// Move focus one step left: catalog -> B -> A
    pub fn focus_left(&mut self) {
        self.focus = match self.focus {
            Focus::Catalog => Focus::Pane(Side::B),
            Focus::Pane(_) => Focus::Pane(Side::A),
        };
    }

    /// Move focus one step right: A -> B -> catalog
    pub fn focus_right(&mut self) {
        self.focus = match self.focus {
            Focus::Pane(Side::A) => Focus::Pane(Side::B),
            Focus::Pane(Side::B) if self.catalog_visible => Focus::Catalog,
            other => other,
        };
    }

    pub fn zoom_in(&mut self) {
        let zoom = self.session.viewer(Side::A).zoom() * ZOOM_STEP;
        self.session.set_zoom(zoom);
    }

    pub fn zoom_out(&mut self) {
        let zoom = self.session.viewer(Side::A).zoom() / ZOOM_STEP;
        self.session.set_zoom(zoom);
    }

    pub fn zoom_reset(&mut self) {
        self.session.set_zoom(1.0);
    }

    /// Navigate to difference `index` of the full sequence
    pub fn select_difference(&mut self, index: usize, now: Instant) {
        let applied = self.session.select_difference(index, now);
        if self.session.active_index() != Some(index) {
            return;
        }
        debug!("selected difference {index} ({} panes moved)", applied.len());
        self.sync_catalog_cursor(index);
        self.flash_panes(now);
    }

    pub fn next_difference(&mut self) {
        let now = Instant::now();
        match self.session.next_difference(&self.query, now) {
            Some(index) => {
                self.sync_catalog_cursor(index);
                self.flash_panes(now);
            }
            None => self.set_status("No differences to show"),
        }
    }

    pub fn prev_difference(&mut self) {
        let now = Instant::now();
        match self.session.prev_difference(&self.query, now) {
            Some(index) => {
                self.sync_catalog_cursor(index);
                self.flash_panes(now);
            }
            None => self.set_status("No differences to show"),
        }
    }

    fn pane_at(&self, column: u16, row: u16) -> Option<Side> {
        Side::BOTH.into_iter().find(|side| {
            self.pane_hits[side.index()]
                .area
                .is_some_and(|area| contains(area, column, row))
        })
    }

    /// Mouse wheel over a pane or the catalog
    pub fn scroll_at(&mut self, column: u16, row: u16, down: bool) {
        if let Some(area) = self.catalog_area {
            if self.catalog_visible && contains(area, column, row) {
                let max = self.visible_entries().len().saturating_sub(1);
                self.catalog_scroll = if down {
                    (self.catalog_scroll + 1).min(max)
                } else {
                    self.catalog_scroll.saturating_sub(1)
                };
                return;
            }
        }
        let side = self.pane_at(column, row).unwrap_or(self.scroll_side());
        let rows = if down { WHEEL_ROWS } else { -WHEEL_ROWS };
        self.scroll_rows(side, rows);
    }

    /// Left click: catalog rows and tabs, gutter markers and overlays select;
    /// anywhere else in a pane focuses it
    pub fn click_at(&mut self, column: u16, row: u16) {
        if self.catalog_visible {
            let tab = self
                .catalog_tabs
                .iter()
                .find(|(area, _)| contains(*area, column, row))
                .map(|(_, filter)| *filter);
            if let Some(filter) = tab {
                self.focus = Focus::Catalog;
                self.set_filter(filter);
                return;
            }
            if let Some(area) = self.catalog_area {
                if contains(area, column, row) {
                    self.focus = Focus::Catalog;
                    let offset = (row - area.1) as usize;
                    if let Some(Some(index)) = self.catalog_rows.get(offset).copied() {
                        self.select_difference(index, Instant::now());
                    }
                    return;
                }
            }
        }

        let Some(side) = self.pane_at(column, row) else {
            return;
        };
        self.focus_pane(side);
        let hits = &self.pane_hits[side.index()];
        let target = hits
            .markers
            .iter()
            .find(|(marker_row, _)| *marker_row == row)
            .map(|(_, index)| *index)
            .filter(|_| hits.area.is_some_and(|a| column < a.0 + super::GUTTER_COLS))
            .or_else(|| {
                hits.overlays
                    .iter()
                    .find(|(area, _)| contains(*area, column, row))
                    .map(|(_, index)| *index)
            });
        if let Some(index) = target {
            self.select_difference(index, Instant::now());
        }
    }
}
