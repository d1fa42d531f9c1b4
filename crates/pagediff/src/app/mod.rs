//! Application state and logic

use crate::color::Palette;
use crate::config::{Config, ResolvedTheme};
use crate::renderer::{CellSize, TerminalRenderer};
use pagediff_core::{CatalogQuery, CompareBackend, RenderTracker, Session, Side};
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::time::Instant;

mod catalog;
mod compare;
mod documents;
mod input;
mod navigation;
mod types;

pub(crate) use types::{
    contains, AreaRect, Focus, InputMode, PageSlot, PaneHitMap, StatusLevel, StatusMessage,
    CATALOG_WIDTH, GUTTER_COLS, PANE_MIN_WIDTH,
};
pub(crate) use documents::side_label;
use types::{CompareDone, CompareJob, PANE_FLASH, STATUS_TIMEOUT};

/// The main application state
pub struct App {
    /// Both viewers, the catalog and navigation state
    pub session: Session,
    renderers: [TerminalRenderer; 2],
    trackers: [RenderTracker; 2],
    /// Rendered pages per side
    pages: [HashMap<usize, PageSlot>; 2],
    /// Last laid out content width per pane (in columns)
    pane_widths: [u16; 2],
    /// Oversampling of page rasters
    device_pixel_ratio: f64,
    pub cell: CellSize,

    backend: Arc<dyn CompareBackend>,
    compare_tx: Option<mpsc::Sender<CompareJob>>,
    compare_rx: Option<mpsc::Receiver<CompareDone>>,
    /// Where finished compare responses are saved
    pub save_report: Option<PathBuf>,

    /// Catalog filter and search
    pub query: CatalogQuery,
    pub catalog_visible: bool,
    /// Cursor position in the filtered catalog
    pub catalog_cursor: usize,
    pub catalog_scroll: usize,
    /// Catalog list area (x, y, width, height)
    pub catalog_area: Option<AreaRect>,
    /// Catalog row mapping for mouse selection
    pub catalog_rows: Vec<Option<usize>>,
    /// Filter tab hit areas
    pub catalog_tabs: Vec<(AreaRect, pagediff_core::TypeFilter)>,

    /// Mouse targets per pane
    pub pane_hits: [PaneHitMap; 2],
    pub focus: Focus,

    pub input_mode: InputMode,
    pub input_buffer: String,

    /// Highlight colors
    pub palette: Palette,
    pub theme: ResolvedTheme,

    pub status: Option<StatusMessage>,
    /// Pane borders flash until this instant after a navigation
    pane_flash_until: Option<Instant>,
    started_at: Instant,

    /// Whether to show the help popover
    pub show_help: bool,
    pub help_scroll: usize,
    pub help_max_scroll: usize,
    /// Whether to quit
    pub should_quit: bool,
}

impl App {
    pub fn new(config: &Config, backend: Arc<dyn CompareBackend>) -> Self {
        let cell = CellSize::new(config.ui.cell_width_px, config.ui.cell_height_px);
        let device_pixel_ratio = if config.ui.device_pixel_ratio.is_finite() {
            config.ui.device_pixel_ratio.clamp(1.0, 4.0)
        } else {
            1.0
        };
        Self {
            session: Session::new(config.session_options()),
            renderers: [TerminalRenderer::new(cell), TerminalRenderer::new(cell)],
            trackers: [RenderTracker::new(), RenderTracker::new()],
            pages: [HashMap::new(), HashMap::new()],
            pane_widths: [0, 0],
            device_pixel_ratio,
            cell,
            backend,
            compare_tx: None,
            compare_rx: None,
            save_report: None,
            query: CatalogQuery::default(),
            catalog_visible: config.ui.catalog_visible,
            catalog_cursor: 0,
            catalog_scroll: 0,
            catalog_area: None,
            catalog_rows: Vec::new(),
            catalog_tabs: Vec::new(),
            pane_hits: [PaneHitMap::default(), PaneHitMap::default()],
            focus: Focus::default(),
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            palette: config.palette(),
            theme: config.resolve_theme(),
            status: None,
            pane_flash_until: None,
            started_at: Instant::now(),
            show_help: false,
            help_scroll: 0,
            help_max_scroll: 0,
            should_quit: false,
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level: StatusLevel::Info,
            shown_at: Instant::now(),
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level: StatusLevel::Error,
            shown_at: Instant::now(),
        });
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if !self.show_help {
            self.help_scroll = 0;
        }
    }

    pub fn help_scroll_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    pub fn help_scroll_down(&mut self) {
        self.help_scroll = (self.help_scroll + 1).min(self.help_max_scroll);
    }

    pub fn toggle_catalog(&mut self) {
        self.catalog_visible = !self.catalog_visible;
        if !self.catalog_visible && self.focus == Focus::Catalog {
            self.focus = Focus::Pane(Side::A);
        }
    }

    pub fn cycle_highlight(&mut self) {
        self.palette.cycle();
    }

    pub fn highlight_color(&self) -> Color {
        self.palette.current()
    }

    pub fn toggle_sync(&mut self) {
        let enabled = !self.session.sync_enabled();
        self.session.set_sync_enabled(enabled);
        self.set_status(if enabled {
            "Scroll sync on"
        } else {
            "Scroll sync off"
        });
    }

    /// Both pane borders flash briefly after a navigation
    pub fn pane_flash_active(&self) -> bool {
        self.pane_flash_until
            .is_some_and(|until| Instant::now() < until)
    }

    fn flash_panes(&mut self, now: Instant) {
        self.pane_flash_until = Some(now + PANE_FLASH);
    }

    /// Phase of the flashing outline pulse, in 0..1
    pub fn pulse_phase(&self) -> f32 {
        let elapsed = self.started_at.elapsed().as_secs_f32();
        (elapsed / 1.5).fract()
    }

    pub fn page_slot(&self, side: Side, page: usize) -> Option<&PageSlot> {
        self.pages[side.index()].get(&page)
    }

    pub fn render_in_flight(&self, side: Side, page: usize) -> bool {
        self.trackers[side.index()].is_pending(page)
    }

    /// Called every frame: collect background results and expire timers
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.poll_compare();
        self.poll_renders();
        self.session.tick(now);

        if let Some(until) = self.pane_flash_until {
            if now >= until {
                self.pane_flash_until = None;
            }
        }
        if let Some(status) = &self.status {
            if now.duration_since(status.shown_at) >= STATUS_TIMEOUT {
                self.status = None;
            }
        }
    }
}
