//! pagediff-core: side-by-side document comparison engine
//!
//! Keeps two independently paginated and scaled documents in step, maps
//! difference boxes from document space onto rendered pages, and tracks which
//! difference is active across the catalog and both panes.

pub mod catalog;
pub mod compare;
pub mod geometry;
pub mod model;
pub mod navigation;
pub mod render;
pub mod scroll;
pub mod session;

pub use catalog::{
    gutter_symbol, CatalogEntry, CatalogQuery, DiffCatalog, GutterMarker, KindCounts, TypeFilter,
};
pub use compare::{
    CompareBackend, CompareError, HttpCompareBackend, ReportCompareBackend, DEFAULT_ENDPOINT,
};
pub use geometry::{to_screen_rect, PageMetrics, PageSize, RasterSurface, ScreenRect};
pub use model::{BBox, CompareResponse, DiffKind, Difference, DocumentInfo, Side};
pub use navigation::{ActiveId, NavPhase, NavigationController, NavigationOptions, ScrollAlign};
pub use render::{
    CancelToken, Disposition, LoadError, PageHandle, PageRenderer, RenderError, RenderEvent,
    RenderTask, RenderTracker, TaskId,
};
pub use scroll::{PaneMetrics, ScrollCommand, ScrollSynchronizer};
pub use session::{
    CompareRequest, CompareStatus, Emphasis, LoadState, Overlay, Session, SessionError,
    SessionOptions, Ticket,
};
