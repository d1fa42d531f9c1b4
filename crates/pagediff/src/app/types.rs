use crate::renderer::PageRaster;
use pagediff_core::{CompareError, CompareResponse, Side, Ticket};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Width of the catalog panel (in columns)
pub(crate) const CATALOG_WIDTH: u16 = 38;
/// Minimum width of a document pane
pub(crate) const PANE_MIN_WIDTH: u16 = 20;
/// Columns of the marker gutter inside each pane
pub(crate) const GUTTER_COLS: u16 = 2;
/// How long status messages stay visible
pub(crate) const STATUS_TIMEOUT: Duration = Duration::from_secs(6);
/// Pane border flash after a navigation
pub(crate) const PANE_FLASH: Duration = Duration::from_millis(500);
/// Rows moved per mouse wheel notch
pub(crate) const WHEEL_ROWS: f64 = 3.0;
/// Zoom change per `+` / `-`
pub(crate) const ZOOM_STEP: f64 = 1.25;

/// What keystrokes are feeding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Editing the document path of one side
    Path(Side),
    /// Editing the catalog search
    Search,
}

/// Which part of the screen takes navigation keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Pane(Side),
    Catalog,
}

impl Default for Focus {
    fn default() -> Self {
        Focus::Pane(Side::A)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub shown_at: Instant,
}

/// Rendered state of one page. A stale raster stays on screen until the
/// render at the new scale lands.
#[derive(Debug, Clone)]
pub enum PageSlot {
    Ready { scale: f64, raster: PageRaster },
    Failed(String),
}

impl PageSlot {
    pub fn raster(&self) -> Option<&PageRaster> {
        match self {
            PageSlot::Ready { raster, .. } => Some(raster),
            _ => None,
        }
    }
}

/// Screen area as (x, y, width, height)
pub type AreaRect = (u16, u16, u16, u16);

pub(crate) fn contains(area: AreaRect, column: u16, row: u16) -> bool {
    let (x, y, w, h) = area;
    column >= x && column < x.saturating_add(w) && row >= y && row < y.saturating_add(h)
}

/// Mouse targets of one pane, recorded while drawing
#[derive(Debug, Clone, Default)]
pub struct PaneHitMap {
    /// Inner area of the pane
    pub area: Option<AreaRect>,
    /// Gutter marker rows: (screen row, difference index)
    pub markers: Vec<(u16, usize)>,
    /// Overlay cells: (area, difference index)
    pub overlays: Vec<(AreaRect, usize)>,
}

impl PaneHitMap {
    pub fn clear(&mut self) {
        self.area = None;
        self.markers.clear();
        self.overlays.clear();
    }
}

pub(crate) struct CompareJob {
    pub(crate) ticket: Ticket,
    pub(crate) a: PathBuf,
    pub(crate) b: PathBuf,
}

pub(crate) struct CompareDone {
    pub(crate) ticket: Ticket,
    pub(crate) result: Result<CompareResponse, CompareError>,
}
