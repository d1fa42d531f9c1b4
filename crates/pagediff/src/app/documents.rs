use super::{App, PageSlot};
use log::debug;
use pagediff_core::render::page_metrics;
use pagediff_core::{Disposition, LoadState, PageHandle, PageRenderer, RasterSurface, Side};
use std::path::Path;

/// Pages rendered past the bottom of the viewport
const PREFETCH_PAGES: usize = 1;

impl App {
    /// Open `path` in the pane of `side`. Any previous compare result is dropped.
    pub fn open_document(&mut self, side: Side, path: &Path) {
        let i = side.index();
        self.trackers[i].cancel_all();
        self.pages[i].clear();
        self.session.set_source(side, path);
        self.reset_catalog_cursor();

        match self.renderers[i].load_document(path) {
            Ok(handles) => {
                let metrics = page_metrics(&self.renderers[i], &handles);
                self.session.set_pages(side, metrics);
                self.set_status(format!(
                    "{}: {} ({} pages)",
                    side_label(side),
                    path.display(),
                    handles.len()
                ));
            }
            Err(e) => {
                self.session.load_failed(side, e.to_string());
                self.set_error(format!("{}: {}", side_label(side), e));
            }
        }
    }

    /// Remove the document of `side`
    pub fn close_document(&mut self, side: Side) {
        let i = side.index();
        self.trackers[i].cancel_all();
        self.pages[i].clear();
        self.renderers[i].close();
        self.session.deselect(side);
        self.reset_catalog_cursor();
    }

    /// Record the content area of a pane (in cells) and rescale if it changed
    pub fn layout_pane(&mut self, side: Side, cols: u16, rows: u16) {
        let width = cols as f64 * self.cell.width;
        let height = rows as f64 * self.cell.height;
        let viewer = self.session.viewer(side);
        let unchanged = (viewer.client_height() - height).abs() < f64::EPSILON
            && self.pane_widths[side.index()] == cols;
        if unchanged {
            return;
        }
        self.pane_widths[side.index()] = cols;
        self.session.resize(side, width, height);
    }

    /// Pages overlapping the viewport of `side`
    pub fn visible_pages(&self, side: Side) -> std::ops::Range<usize> {
        let viewer = self.session.viewer(side);
        let pages = viewer.pages();
        if pages.is_empty() {
            return 0..0;
        }
        let scale = viewer.scale();
        let top = viewer.scroll_top();
        let bottom = top + viewer.client_height();
        let first = pages.page_at_offset(top, scale).unwrap_or(0);
        let mut last = first;
        while last + 1 < pages.len() && viewer.page_top(last + 1) < bottom {
            last += 1;
        }
        first..last + 1
    }

    /// Ask for renders of the visible pages that are missing or stale, and
    /// cancel renders of pages that scrolled away
    pub fn request_visible_pages(&mut self, side: Side) {
        let i = side.index();
        let viewer = self.session.viewer(side);
        if viewer.has_fallback_geometry()
            || *viewer.load_state() != LoadState::Ready
            || self.renderers[i].page_count() == 0
        {
            return;
        }
        let scale = viewer.scale();
        let visible = self.visible_pages(side);
        let wanted = visible.start..(visible.end + PREFETCH_PAGES).min(viewer.pages().len());

        let in_flight: Vec<usize> = (0..viewer.pages().len())
            .filter(|&p| self.trackers[i].is_pending(p) && !wanted.contains(&p))
            .collect();
        for page in in_flight {
            self.trackers[i].cancel(page);
        }

        for page in wanted {
            let current = match self.pages[i].get(&page) {
                Some(PageSlot::Ready { scale: s, .. }) => (*s - scale).abs() < 1e-9,
                Some(PageSlot::Failed(_)) => true,
                None => false,
            };
            let pending = self.trackers[i]
                .pending_scale(page)
                .is_some_and(|s| (s - scale).abs() < 1e-9);
            if current || pending {
                continue;
            }
            let handle = PageHandle { index: page };
            let natural = self.renderers[i].natural_size(handle);
            let surface = RasterSurface::new(natural, scale, self.device_pixel_ratio);
            let task = self.renderers[i].render(handle, scale, surface);
            debug!(
                "{} render page {} at {:.3}",
                side.file_id(),
                page + 1,
                scale
            );
            self.trackers[i].begin(task);
        }
    }

    /// Collect finished renders. Returns true when a page changed.
    pub(super) fn poll_renders(&mut self) -> bool {
        let mut changed = false;
        for side in Side::BOTH {
            let i = side.index();
            for event in self.renderers[i].poll() {
                let page = event.page.index;
                let scale = self.trackers[i].pending_scale(page);
                match (self.trackers[i].retire(&event), event.result, scale) {
                    (Disposition::Paint, Ok(raster), Some(scale)) => {
                        self.pages[i].insert(page, PageSlot::Ready { scale, raster });
                        changed = true;
                    }
                    (Disposition::Report(reason), _, _) => {
                        self.pages[i].insert(page, PageSlot::Failed(reason));
                        changed = true;
                    }
                    _ => {}
                }
            }
        }
        changed
    }
}

pub(crate) fn side_label(side: Side) -> &'static str {
    match side {
        Side::A => "A",
        Side::B => "B",
    }
}
