//! Session state: two document viewers, the difference catalog and navigation
//!
//! The session owns both panes and routes scroll writes between them, so the
//! panes never reference each other. It is reset when a compare starts and
//! torn down when a document is deselected.

use crate::catalog::{CatalogQuery, DiffCatalog, GutterMarker};
use crate::compare::CompareError;
use crate::geometry::{to_screen_rect, PageMetrics, ScreenRect};
use crate::model::{CompareResponse, DiffKind, DocumentInfo, Side};
use crate::navigation::{ActiveId, NavigationController, NavigationOptions, PaneTarget};
use crate::scroll::{PaneMetrics, ScrollCommand, ScrollSynchronizer};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Width reserved for the vertical scrollbar when fitting pages
pub const DEFAULT_SCROLLBAR_GUTTER: f64 = 17.0;
pub const MIN_ZOOM: f64 = 0.25;
pub const MAX_ZOOM: f64 = 4.0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Select both documents before comparing")]
    MissingInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Empty,
    Loading,
    Ready,
    Failed(String),
}

/// One document pane: source, geometry, scale and scroll position
#[derive(Debug, Clone)]
pub struct Viewer {
    side: Side,
    source: Option<PathBuf>,
    pages: PageMetrics,
    /// Pages came from the compare response instead of the renderer
    fallback_geometry: bool,
    load: LoadState,
    fit_scale: f64,
    zoom: f64,
    container_width: f64,
    scroll_top: f64,
    client_height: f64,
    info: Option<DocumentInfo>,
}

impl Viewer {
    fn new(side: Side) -> Self {
        Self {
            side,
            source: None,
            pages: PageMetrics::default(),
            fallback_geometry: false,
            load: LoadState::Empty,
            fit_scale: 1.0,
            zoom: 1.0,
            container_width: 0.0,
            scroll_top: 0.0,
            client_height: 0.0,
            info: None,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn pages(&self) -> &PageMetrics {
        &self.pages
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn has_fallback_geometry(&self) -> bool {
        self.fallback_geometry
    }

    pub fn info(&self) -> Option<&DocumentInfo> {
        self.info.as_ref()
    }

    /// Effective render scale
    pub fn scale(&self) -> f64 {
        self.fit_scale * self.zoom
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub fn client_height(&self) -> f64 {
        self.client_height
    }

    /// Height of the scrollable content at the current scale
    pub fn content_height(&self) -> f64 {
        if !self.pages.is_empty() {
            self.pages.total_height(self.scale())
        } else if let Some(info) = &self.info {
            info.total_height * self.scale()
        } else {
            0.0
        }
    }

    pub fn pane_metrics(&self) -> PaneMetrics {
        PaneMetrics::new(self.scroll_top, self.content_height(), self.client_height)
    }

    /// Zero-based page at the top of the viewport
    pub fn current_page(&self) -> Option<usize> {
        self.pages.page_at_offset(self.scroll_top, self.scale())
    }

    /// Top of `page` in screen space
    pub fn page_top(&self, page: usize) -> f64 {
        self.pages.accumulated_offset(page, self.scale())
    }

    pub fn is_navigable(&self) -> bool {
        !self.pages.is_empty()
    }

    fn clamp_scroll(&self, offset: f64) -> f64 {
        self.pane_metrics().clamp_offset(offset)
    }

    fn reset_document(&mut self) {
        self.pages = PageMetrics::default();
        self.fallback_geometry = false;
        self.fit_scale = 1.0;
        self.scroll_top = 0.0;
        self.info = None;
    }

    /// Recompute the fit-width scale, keeping the scroll ratio. Skipped when
    /// there is no geometry or no usable width.
    fn recompute_scale(&mut self, gutter: f64) {
        let Some(fit) = self.pages.fit_width_scale(self.container_width, gutter) else {
            return;
        };
        if (fit - self.fit_scale).abs() < f64::EPSILON {
            return;
        }
        let ratio = self.pane_metrics().scroll_ratio();
        self.fit_scale = fit;
        self.scroll_top = self.pane_metrics().offset_for_ratio(ratio);
        debug!(
            "{} scale {:.3} (fit {:.3}, zoom {:.2})",
            self.side.file_id(),
            self.scale(),
            fit,
            self.zoom
        );
    }
}

/// Visual state of one overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Normal,
    /// The selected difference
    Active,
    /// The box keyed by the active id
    Flashing,
}

/// Highlight rectangle on one page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlay {
    pub index: usize,
    pub local_index: usize,
    pub kind: DiffKind,
    pub rect: ScreenRect,
    pub emphasis: Emphasis,
}

/// Compare request handle; completions carrying an older ticket are stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CompareStatus {
    #[default]
    Idle,
    Running(Ticket),
    Done,
    Failed(String),
}

/// Inputs of an accepted compare request
#[derive(Debug, Clone)]
pub struct CompareRequest {
    pub ticket: Ticket,
    pub a: PathBuf,
    pub b: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    pub scrollbar_gutter: f64,
    pub sync_scroll: bool,
    pub navigation: NavigationOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            scrollbar_gutter: DEFAULT_SCROLLBAR_GUTTER,
            sync_scroll: true,
            navigation: NavigationOptions::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    options: SessionOptions,
    viewers: [Viewer; 2],
    catalog: DiffCatalog,
    nav: NavigationController,
    sync: ScrollSynchronizer,
    status: CompareStatus,
    next_ticket: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        let mut sync = ScrollSynchronizer::new();
        sync.set_enabled(options.sync_scroll);
        Self {
            options,
            viewers: [Viewer::new(Side::A), Viewer::new(Side::B)],
            catalog: DiffCatalog::default(),
            nav: NavigationController::new(options.navigation),
            sync,
            status: CompareStatus::Idle,
            next_ticket: 1,
        }
    }

    pub fn viewer(&self, side: Side) -> &Viewer {
        &self.viewers[side.index()]
    }

    fn viewer_mut(&mut self, side: Side) -> &mut Viewer {
        &mut self.viewers[side.index()]
    }

    pub fn catalog(&self) -> &DiffCatalog {
        &self.catalog
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.nav
    }

    pub fn status(&self) -> &CompareStatus {
        &self.status
    }

    pub fn active_index(&self) -> Option<usize> {
        self.nav.active_index()
    }

    pub fn active_id(&self) -> Option<ActiveId> {
        self.nav.active_id()
    }

    pub fn sync_enabled(&self) -> bool {
        self.sync.is_enabled()
    }

    pub fn set_sync_enabled(&mut self, enabled: bool) {
        self.sync.set_enabled(enabled);
    }

    /// Drop everything derived from the last compare
    fn clear_results(&mut self) {
        self.catalog = DiffCatalog::default();
        self.nav.clear();
        self.sync.reset();
        for viewer in &mut self.viewers {
            viewer.info = None;
            if viewer.fallback_geometry {
                viewer.pages = PageMetrics::default();
                viewer.fallback_geometry = false;
            }
        }
    }

    /// Choose the document shown on `side`. Previous results no longer apply.
    pub fn set_source(&mut self, side: Side, path: impl Into<PathBuf>) {
        let path = path.into();
        info!("{} source {}", side.file_id(), path.display());
        self.clear_results();
        self.status = CompareStatus::Idle;
        let viewer = self.viewer_mut(side);
        viewer.reset_document();
        viewer.source = Some(path);
        viewer.load = LoadState::Loading;
    }

    /// Remove the document on `side` and tear down the session state
    pub fn deselect(&mut self, side: Side) {
        info!("{} deselected", side.file_id());
        self.clear_results();
        self.status = CompareStatus::Idle;
        let viewer = self.viewer_mut(side);
        viewer.reset_document();
        viewer.source = None;
        viewer.load = LoadState::Empty;
    }

    /// Accept page geometry from the renderer
    pub fn set_pages(&mut self, side: Side, pages: PageMetrics) {
        let gutter = self.options.scrollbar_gutter;
        let viewer = self.viewer_mut(side);
        debug!("{} loaded {} pages", side.file_id(), pages.len());
        viewer.pages = pages;
        viewer.fallback_geometry = false;
        viewer.load = LoadState::Ready;
        viewer.recompute_scale(gutter);
        viewer.scroll_top = viewer.clamp_scroll(viewer.scroll_top);
    }

    pub fn load_failed(&mut self, side: Side, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("{} failed to load: {reason}", side.file_id());
        let viewer = self.viewer_mut(side);
        viewer.pages = PageMetrics::default();
        viewer.fallback_geometry = false;
        viewer.load = LoadState::Failed(reason);
    }

    /// Container of `side` changed size (screen pixels)
    pub fn resize(&mut self, side: Side, width: f64, height: f64) {
        let gutter = self.options.scrollbar_gutter;
        let viewer = self.viewer_mut(side);
        viewer.container_width = width;
        viewer.client_height = height.max(0.0);
        viewer.recompute_scale(gutter);
        viewer.scroll_top = viewer.clamp_scroll(viewer.scroll_top);
    }

    /// Zoom both panes relative to their fit-width scale
    pub fn set_zoom(&mut self, zoom: f64) {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        for viewer in &mut self.viewers {
            let ratio = viewer.pane_metrics().scroll_ratio();
            viewer.zoom = zoom;
            viewer.scroll_top = viewer.pane_metrics().offset_for_ratio(ratio);
        }
        debug!("zoom {zoom:.2}");
    }

    /// Start a compare. Previous results are cleared right away.
    pub fn begin_compare(&mut self) -> Result<CompareRequest, SessionError> {
        let (Some(a), Some(b)) = (
            self.viewers[0].source.clone(),
            self.viewers[1].source.clone(),
        ) else {
            return Err(SessionError::MissingInput);
        };
        self.clear_results();
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.status = CompareStatus::Running(ticket);
        info!("compare #{} started: {} vs {}", ticket.0, a.display(), b.display());
        Ok(CompareRequest { ticket, a, b })
    }

    /// Apply a compare completion. Returns false for stale tickets.
    pub fn finish_compare(
        &mut self,
        ticket: Ticket,
        result: Result<CompareResponse, CompareError>,
    ) -> bool {
        if self.status != CompareStatus::Running(ticket) {
            debug!("ignoring stale compare #{}", ticket.0);
            return false;
        }

        match result {
            Ok(response) => {
                info!(
                    "compare #{} finished with {} differences",
                    ticket.0,
                    response.differences.len()
                );
                let gutter = self.options.scrollbar_gutter;
                for side in Side::BOTH {
                    let info = response.document_info.get(side).clone();
                    let viewer = self.viewer_mut(side);
                    let failed = matches!(viewer.load, LoadState::Failed(_));
                    if !failed && viewer.pages.is_empty() && !info.pages.is_empty() {
                        debug!("{} using page sizes from compare response", side.file_id());
                        viewer.pages = PageMetrics::new(info.pages.clone());
                        viewer.fallback_geometry = true;
                        viewer.recompute_scale(gutter);
                    }
                    viewer.info = Some(info);
                }
                self.catalog = DiffCatalog::new(response.differences);
                self.status = CompareStatus::Done;
            }
            Err(err) => {
                warn!("compare #{} failed: {err}", ticket.0);
                self.clear_results();
                self.status = CompareStatus::Failed(err.to_string());
            }
        }
        true
    }

    /// Handle a scroll event from `side` and mirror it to the other pane.
    /// Returns the write applied to the other pane, if any.
    pub fn on_scroll(&mut self, side: Side, scroll_top: f64) -> Option<ScrollCommand> {
        let viewer = self.viewer_mut(side);
        viewer.scroll_top = viewer.clamp_scroll(scroll_top);
        let command = self.deliver_scroll_event(side)?;
        Some(self.write_scroll(command.side, command.scroll_top))
    }

    /// Scroll `side` by `delta` as if the user did it
    pub fn scroll_by(&mut self, side: Side, delta: f64) -> Option<ScrollCommand> {
        let top = self.viewer(side).scroll_top + delta;
        self.on_scroll(side, top)
    }

    fn deliver_scroll_event(&mut self, side: Side) -> Option<ScrollCommand> {
        let source = self.viewer(side).pane_metrics();
        let target = self.viewer(side.other()).pane_metrics();
        self.sync.mirror(side, &source, &target)
    }

    /// Programmatic scroll of one pane. The pane reports the write back as a
    /// scroll event, which the synchronizer swallows.
    fn write_scroll(&mut self, side: Side, offset: f64) -> ScrollCommand {
        let viewer = self.viewer_mut(side);
        let scroll_top = viewer.clamp_scroll(offset);
        viewer.scroll_top = scroll_top;
        let command = ScrollCommand { side, scroll_top };
        self.sync.expect_programmatic(command);
        let _ = self.deliver_scroll_event(side);
        command
    }

    /// Navigate to difference `index` of the full sequence
    pub fn select_difference(&mut self, index: usize, now: Instant) -> Vec<ScrollCommand> {
        let panes = [0, 1].map(|i| {
            let viewer = &self.viewers[i];
            viewer
                .is_navigable()
                .then(|| PaneTarget::new(&viewer.pages, viewer.scale()))
        });
        let Some(targets) = self.nav.select(&self.catalog, index, panes, now) else {
            warn!("no difference at index {index}");
            return Vec::new();
        };
        let applied = targets
            .into_iter()
            .map(|cmd| self.write_scroll(cmd.side, cmd.scroll_top))
            .collect();
        self.nav.commit();
        applied
    }

    /// Next difference in filtered order after the active one (wraps)
    pub fn next_difference(&mut self, query: &CatalogQuery, now: Instant) -> Option<usize> {
        self.step_difference(query, now, true)
    }

    pub fn prev_difference(&mut self, query: &CatalogQuery, now: Instant) -> Option<usize> {
        self.step_difference(query, now, false)
    }

    fn step_difference(&mut self, query: &CatalogQuery, now: Instant, forward: bool) -> Option<usize> {
        let visible: Vec<usize> = self.catalog.filtered(query).iter().map(|e| e.index).collect();
        if visible.is_empty() {
            return None;
        }
        let position = self
            .nav
            .active_index()
            .and_then(|active| visible.iter().position(|&i| i == active));
        let next = match (position, forward) {
            (Some(pos), true) => (pos + 1) % visible.len(),
            (Some(pos), false) => (pos + visible.len() - 1) % visible.len(),
            (None, true) => 0,
            (None, false) => visible.len() - 1,
        };
        let index = visible[next];
        self.select_difference(index, now);
        Some(index)
    }

    /// Expire the active highlight. Returns true when the view changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.nav.tick(now)
    }

    pub fn clear_active(&mut self) {
        self.nav.clear();
    }

    /// Overlay rectangles of `side`'s highlights on `page`
    pub fn overlays(&self, side: Side, page: usize) -> Vec<Overlay> {
        let viewer = self.viewer(side);
        let Some(size) = viewer.pages.page(page) else {
            return Vec::new();
        };
        let scale = viewer.scale();
        let active_index = self.nav.active_index();
        let active_id = self.nav.active_id();

        self.catalog
            .page_highlights(side, page)
            .into_iter()
            .filter_map(|(local_index, index)| {
                let diff = self.catalog.get(index)?;
                let bbox = diff.bbox(side)?;
                let key = ActiveId {
                    side,
                    page_index: page,
                    local_index,
                };
                let emphasis = if active_id == Some(key) {
                    Emphasis::Flashing
                } else if active_index == Some(index) {
                    Emphasis::Active
                } else {
                    Emphasis::Normal
                };
                Some(Overlay {
                    index,
                    local_index,
                    kind: diff.kind,
                    rect: to_screen_rect(bbox, size, scale),
                    emphasis,
                })
            })
            .collect()
    }

    pub fn gutter_markers(&self, side: Side) -> Vec<GutterMarker> {
        if self.viewer(side).pages.is_empty() {
            return Vec::new();
        }
        self.catalog.gutter_markers(side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TypeFilter;
    use crate::geometry::PageSize;
    use crate::model::{BBox, Difference, DocumentInfoPair};
    use std::time::Duration;

    fn pages(heights: &[f64]) -> PageMetrics {
        PageMetrics::new(heights.iter().map(|&h| PageSize::new(583.0, h)).collect())
    }

    fn addition(page: usize, y: f64, text: &str) -> Difference {
        Difference {
            page_index: page,
            kind: DiffKind::Addition,
            bbox_a: None,
            bbox_b: Some(BBox::new(10.0, y, 50.0, y + 20.0)),
            text_a: None,
            text_b: Some(text.to_string()),
            absolute_y_a: None,
            absolute_y_b: None,
        }
    }

    fn modification(page: usize, y: f64) -> Difference {
        Difference {
            page_index: page,
            kind: DiffKind::Modification,
            bbox_a: Some(BBox::new(10.0, y, 50.0, y + 20.0)),
            bbox_b: Some(BBox::new(10.0, y, 60.0, y + 20.0)),
            text_a: Some("old".into()),
            text_b: Some("new".into()),
            absolute_y_a: None,
            absolute_y_b: None,
        }
    }

    fn response(differences: Vec<Difference>) -> CompareResponse {
        CompareResponse {
            document_info: DocumentInfoPair {
                a: DocumentInfo {
                    total_height: 1600.0,
                    pages: vec![],
                },
                b: DocumentInfo {
                    total_height: 1800.0,
                    pages: vec![],
                },
            },
            differences,
        }
    }

    /// Session with both documents loaded at scale 1 (583 + 17 = 600 wide)
    fn loaded(a: &[f64], b: &[f64], client_height: f64) -> Session {
        let mut session = Session::default();
        session.set_source(Side::A, "a.pdf");
        session.set_source(Side::B, "b.pdf");
        session.resize(Side::A, 600.0, client_height);
        session.resize(Side::B, 600.0, client_height);
        session.set_pages(Side::A, pages(a));
        session.set_pages(Side::B, pages(b));
        session
    }

    fn compared(session: &mut Session, differences: Vec<Difference>) {
        let request = session.begin_compare().unwrap();
        assert!(session.finish_compare(request.ticket, Ok(response(differences))));
    }

    #[test]
    fn test_compare_requires_both_documents() {
        let mut session = Session::default();
        session.set_source(Side::A, "a.pdf");
        assert_eq!(session.begin_compare().unwrap_err(), SessionError::MissingInput);
        assert_eq!(session.status(), &CompareStatus::Idle);
    }

    #[test]
    fn test_fit_width_scale_on_resize() {
        let session = loaded(&[800.0], &[800.0], 400.0);
        assert!((session.viewer(Side::A).scale() - 1.0).abs() < 1e-9);

        let mut session = session;
        session.resize(Side::A, 1183.0, 400.0);
        assert!((session.viewer(Side::A).scale() - 2.0).abs() < 1e-9);
        // Scale recomputation is per viewer
        assert!((session.viewer(Side::B).scale() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_resize_without_pages_keeps_scale() {
        let mut session = Session::default();
        session.set_source(Side::A, "a.pdf");
        session.resize(Side::A, 1200.0, 400.0);
        assert_eq!(session.viewer(Side::A).scale(), 1.0);
        assert_eq!(session.viewer(Side::A).page_top(3), 0.0);
    }

    #[test]
    fn test_single_addition_scenario() {
        let mut session = loaded(&[800.0], &[800.0], 400.0);
        compared(&mut session, vec![addition(0, 100.0, "inserted")]);

        let query = CatalogQuery::new("", TypeFilter::Addition);
        let entries = session.catalog().filtered(&query);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].index, 0);

        session.on_scroll(Side::A, 150.0);
        let a_before = session.viewer(Side::A).scroll_top();
        let applied = session.select_difference(0, Instant::now());
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].side, Side::B);
        assert_eq!(session.viewer(Side::B).scroll_top(), 0.0);
        // Navigation does not mirror into pane A
        assert_eq!(session.viewer(Side::A).scroll_top(), a_before);
        assert_eq!(session.active_id().unwrap().to_string(), "file2-0-0");
    }

    #[test]
    fn test_scroll_mirror_between_different_page_counts() {
        let client = 800.0;
        let mut session = loaded(&[800.0, 800.0], &[600.0, 600.0, 600.0], client);
        let command = session.on_scroll(Side::A, 400.0).unwrap();
        assert_eq!(command.side, Side::B);
        let expected = 0.5 * (1800.0 - client);
        assert!((session.viewer(Side::B).scroll_top() - expected).abs() < 1e-9);

        // The echo from B was swallowed; a user scroll on B mirrors back
        let back = session.on_scroll(Side::B, 1000.0).unwrap();
        assert_eq!(back.side, Side::A);
        assert!((session.viewer(Side::A).scroll_top() - 800.0).abs() < 1e-9);
    }

    #[test]
    fn test_sync_can_be_disabled() {
        let mut session = loaded(&[800.0, 800.0], &[800.0, 800.0], 400.0);
        session.set_sync_enabled(false);
        assert!(session.on_scroll(Side::A, 300.0).is_none());
        assert_eq!(session.viewer(Side::B).scroll_top(), 0.0);
    }

    #[test]
    fn test_navigation_uses_page_offsets_per_pane() {
        let mut session = loaded(&[800.0, 800.0, 800.0], &[600.0, 600.0, 600.0], 300.0);
        compared(&mut session, vec![modification(2, 10.0)]);
        session.select_difference(0, Instant::now());
        assert_eq!(session.viewer(Side::A).scroll_top(), 1600.0);
        assert_eq!(session.viewer(Side::B).scroll_top(), 1200.0);
        assert_eq!(session.viewer(Side::A).current_page(), Some(2));
    }

    #[test]
    fn test_navigation_target_is_clamped_to_scroll_range() {
        let mut session = loaded(&[800.0, 800.0], &[800.0, 800.0], 1000.0);
        compared(&mut session, vec![modification(1, 10.0)]);
        session.select_difference(0, Instant::now());
        assert_eq!(session.viewer(Side::A).scroll_top(), 600.0);
    }

    #[test]
    fn test_active_state_is_exclusive() {
        let mut session = loaded(&[800.0], &[800.0], 400.0);
        compared(
            &mut session,
            vec![modification(0, 10.0), addition(0, 300.0, "x"), modification(0, 500.0)],
        );
        let now = Instant::now();
        session.select_difference(0, now);
        session.select_difference(2, now);

        let emphasised: Vec<_> = Side::BOTH
            .iter()
            .flat_map(|&side| session.overlays(side, 0))
            .filter(|o| o.emphasis != Emphasis::Normal)
            .map(|o| o.index)
            .collect();
        assert!(emphasised.iter().all(|&i| i == 2));
        assert_eq!(session.active_id().unwrap().to_string(), "file1-0-1");

        let flashing: Vec<_> = session
            .overlays(Side::A, 0)
            .into_iter()
            .filter(|o| o.emphasis == Emphasis::Flashing)
            .collect();
        assert_eq!(flashing.len(), 1);
        let on_b = session.overlays(Side::B, 0);
        assert_eq!(on_b[2].index, 2);
        assert_eq!(on_b[2].emphasis, Emphasis::Active);
    }

    #[test]
    fn test_highlight_expires() {
        let mut session = loaded(&[800.0], &[800.0], 400.0);
        compared(&mut session, vec![modification(0, 10.0)]);
        let start = Instant::now();
        session.select_difference(0, start);
        assert!(!session.tick(start + Duration::from_secs(4)));
        assert!(session.tick(start + Duration::from_secs(5)));
        assert_eq!(session.active_index(), None);
        assert!(session
            .overlays(Side::A, 0)
            .iter()
            .all(|o| o.emphasis == Emphasis::Normal));
    }

    #[test]
    fn test_overlay_geometry_follows_scale() {
        let mut session = loaded(&[800.0], &[800.0], 400.0);
        compared(&mut session, vec![addition(0, 100.0, "x")]);
        session.resize(Side::B, 1183.0, 400.0);
        let overlays = session.overlays(Side::B, 0);
        assert_eq!(overlays.len(), 1);
        assert!((overlays[0].rect.top - 200.0).abs() < 1e-9);
        assert!((overlays[0].rect.width - 80.0).abs() < 1e-9);
        assert!(session.overlays(Side::A, 0).is_empty());
    }

    #[test]
    fn test_stale_compare_is_ignored() {
        let mut session = loaded(&[800.0], &[800.0], 400.0);
        let first = session.begin_compare().unwrap();
        let second = session.begin_compare().unwrap();
        assert!(!session.finish_compare(first.ticket, Ok(response(vec![modification(0, 1.0)]))));
        assert!(session.catalog().is_empty());
        assert!(session.finish_compare(second.ticket, Ok(response(vec![]))));
        assert_eq!(session.status(), &CompareStatus::Done);
    }

    #[test]
    fn test_failed_compare_clears_previous_results() {
        let mut session = loaded(&[800.0], &[800.0], 400.0);
        compared(&mut session, vec![modification(0, 1.0)]);
        session.select_difference(0, Instant::now());

        let request = session.begin_compare().unwrap();
        // Cleared eagerly, before the service answers
        assert!(session.catalog().is_empty());
        assert_eq!(session.active_index(), None);

        let err = CompareError::Network("connection refused".into());
        assert!(session.finish_compare(request.ticket, Err(err)));
        assert!(matches!(session.status(), CompareStatus::Failed(msg) if msg.contains("connection refused")));
        assert!(session.catalog().is_empty());
    }

    #[test]
    fn test_deselect_tears_down() {
        let mut session = loaded(&[800.0], &[800.0], 400.0);
        compared(&mut session, vec![modification(0, 1.0)]);
        session.deselect(Side::B);
        assert!(session.catalog().is_empty());
        assert!(session.viewer(Side::B).source().is_none());
        assert_eq!(session.viewer(Side::B).load_state(), &LoadState::Empty);
        assert!(session.viewer(Side::A).is_navigable());
    }

    #[test]
    fn test_unavailable_side_is_skipped() {
        let mut session = loaded(&[800.0, 800.0], &[800.0, 800.0], 400.0);
        session.load_failed(Side::A, "broken xref");
        compared(&mut session, vec![modification(1, 1.0)]);
        let applied = session.select_difference(0, Instant::now());
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].side, Side::B);
        assert_eq!(session.active_index(), Some(0));
        assert!(session.gutter_markers(Side::A).is_empty());
        assert_eq!(session.gutter_markers(Side::B).len(), 1);
    }

    #[test]
    fn test_fallback_geometry_from_response() {
        let mut session = Session::default();
        session.set_source(Side::A, "a.pdf");
        session.set_source(Side::B, "b.pdf");
        session.resize(Side::A, 629.0, 400.0);
        let request = session.begin_compare().unwrap();
        let mut resp = response(vec![]);
        resp.document_info.a.pages = vec![PageSize::new(612.0, 792.0); 2];
        session.finish_compare(request.ticket, Ok(resp));

        let viewer = session.viewer(Side::A);
        assert!(viewer.has_fallback_geometry());
        assert_eq!(viewer.pages().len(), 2);
        assert!((viewer.scale() - 1.0).abs() < 1e-9);
        // B has no geometry; its content height comes from total_height
        assert_eq!(session.viewer(Side::B).content_height(), 1800.0);
    }

    #[test]
    fn test_failed_pane_takes_no_fallback_geometry() {
        let mut session = Session::default();
        session.set_source(Side::A, "a.pdf");
        session.set_source(Side::B, "b.pdf");
        session.resize(Side::A, 629.0, 400.0);
        let request = session.begin_compare().unwrap();
        let mut resp = response(vec![]);
        resp.document_info.a.pages = vec![PageSize::new(612.0, 792.0); 2];
        session.finish_compare(request.ticket, Ok(resp.clone()));
        assert!(session.viewer(Side::A).has_fallback_geometry());

        session.load_failed(Side::A, "not a pdf");
        let viewer = session.viewer(Side::A);
        assert!(!viewer.has_fallback_geometry());
        assert!(viewer.pages().is_empty());

        let request = session.begin_compare().unwrap();
        session.finish_compare(request.ticket, Ok(resp));
        let viewer = session.viewer(Side::A);
        assert!(matches!(viewer.load_state(), LoadState::Failed(_)));
        assert!(!viewer.has_fallback_geometry());
        assert!(viewer.pages().is_empty());
    }

    #[test]
    fn test_next_and_prev_follow_filtered_order() {
        let mut session = loaded(&[800.0, 800.0], &[800.0, 800.0], 400.0);
        compared(
            &mut session,
            vec![
                addition(0, 10.0, "alpha"),
                modification(0, 50.0),
                addition(1, 10.0, "beta"),
                addition(1, 90.0, "gamma"),
            ],
        );
        let query = CatalogQuery::new("", TypeFilter::Addition);
        let now = Instant::now();
        assert_eq!(session.next_difference(&query, now), Some(0));
        assert_eq!(session.next_difference(&query, now), Some(2));
        assert_eq!(session.next_difference(&query, now), Some(3));
        assert_eq!(session.next_difference(&query, now), Some(0));
        assert_eq!(session.prev_difference(&query, now), Some(3));

        let none = CatalogQuery::new("missing", TypeFilter::All);
        assert_eq!(session.next_difference(&none, now), None);
    }

    #[test]
    fn test_zoom_scales_both_panes() {
        let mut session = loaded(&[800.0], &[800.0], 400.0);
        session.set_zoom(1.5);
        assert!((session.viewer(Side::A).scale() - 1.5).abs() < 1e-9);
        assert!((session.viewer(Side::B).scale() - 1.5).abs() < 1e-9);
        session.set_zoom(100.0);
        assert_eq!(session.viewer(Side::A).zoom(), MAX_ZOOM);
    }
}
