//! Page-rendering collaborator contract and render task bookkeeping
//!
//! Rendering is asynchronous: [`PageRenderer::render`] hands back a task with
//! a cancel token and the result arrives later through [`PageRenderer::poll`].
//! A pane keeps at most one task in flight per page in a [`RenderTracker`].

use crate::geometry::{PageMetrics, PageSize, RasterSurface};
use log::error;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("document not found: {0}")]
    NotFound(PathBuf),
    #[error("unsupported document type: {0}")]
    Unsupported(PathBuf),
    #[error("cannot read {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
    #[error("document has no pages: {0}")]
    Empty(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The task was superseded; not a failure
    #[error("render cancelled")]
    Cancelled,
    #[error("render failed: {0}")]
    Failed(String),
}

/// A loaded page of one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageHandle {
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

/// Shared cancellation flag. Cancelling more than once is harmless.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Handle of one in-flight page render
#[derive(Debug, Clone)]
pub struct RenderTask {
    pub id: TaskId,
    pub page: PageHandle,
    pub scale: f64,
    token: CancelToken,
}

impl RenderTask {
    pub fn new(id: TaskId, page: PageHandle, scale: f64, token: CancelToken) -> Self {
        Self {
            id,
            page,
            scale,
            token,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }
}

/// Completion of a render task
#[derive(Debug)]
pub struct RenderEvent<T> {
    pub task: TaskId,
    pub page: PageHandle,
    pub result: Result<T, RenderError>,
}

pub trait PageRenderer {
    /// Raster produced for one page
    type Output;

    /// Open a document, replacing the previous one. Pending tasks of the old
    /// document are cancelled.
    fn load_document(&mut self, path: &Path) -> Result<Vec<PageHandle>, LoadError>;

    /// Natural size of a page at scale 1
    fn natural_size(&self, page: PageHandle) -> PageSize;

    fn render(&mut self, page: PageHandle, scale: f64, surface: RasterSurface) -> RenderTask;

    /// Completed tasks since the last poll
    fn poll(&mut self) -> Vec<RenderEvent<Self::Output>>;
}

/// Collect the page geometry of loaded pages
pub fn page_metrics<R: PageRenderer + ?Sized>(renderer: &R, pages: &[PageHandle]) -> PageMetrics {
    PageMetrics::new(pages.iter().map(|&p| renderer.natural_size(p)).collect())
}

/// What to do with a finished render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Paint,
    /// Stale or cancelled result
    Ignore,
    /// Genuine failure; the page should show it
    Report(String),
}

/// In-flight render tasks of one pane, keyed by page
#[derive(Debug, Default)]
pub struct RenderTracker {
    in_flight: HashMap<usize, RenderTask>,
}

impl RenderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new task, cancelling whatever was running for the same page
    pub fn begin(&mut self, task: RenderTask) {
        if let Some(previous) = self.in_flight.insert(task.page.index, task) {
            previous.cancel();
        }
    }

    pub fn is_pending(&self, page: usize) -> bool {
        self.in_flight.contains_key(&page)
    }

    /// Scale of the task in flight for `page`
    pub fn pending_scale(&self, page: usize) -> Option<f64> {
        self.in_flight.get(&page).map(|t| t.scale)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn cancel(&mut self, page: usize) {
        if let Some(task) = self.in_flight.remove(&page) {
            task.cancel();
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, task) in self.in_flight.drain() {
            task.cancel();
        }
    }

    /// Decide what to do with a finished task and stop tracking it
    pub fn retire<T>(&mut self, event: &RenderEvent<T>) -> Disposition {
        let current = self
            .in_flight
            .get(&event.page.index)
            .is_some_and(|t| t.id == event.task);
        if !current {
            return Disposition::Ignore;
        }
        self.in_flight.remove(&event.page.index);

        match &event.result {
            Ok(_) => Disposition::Paint,
            Err(RenderError::Cancelled) => Disposition::Ignore,
            Err(RenderError::Failed(reason)) => {
                error!("page {} render failed: {reason}", event.page.index + 1);
                Disposition::Report(reason.clone())
            }
        }
    }
}
