//! Terminal page renderer
//!
//! Pages are rasterized on a worker thread into a grid of ink levels, one per
//! terminal cell. The backing raster is sampled at `device_pixel_ratio` times
//! the on-screen size and averaged down to cells.
//!
//! Supported inputs:
//! - page manifests (`.json`): `{"pages":[{"width":612,"height":792,"blocks":[[x0,y0,x1,y1]]}]}`
//! - PDFs (`.pdf`) when built with the `pdf` feature

use log::{debug, warn};
use pagediff_core::{
    BBox, CancelToken, LoadError, PageHandle, PageRenderer, PageSize, RasterSurface, RenderError,
    RenderEvent, RenderTask, TaskId,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

/// Luminance of blank paper and of manifest text blocks
const PAPER_LUMA: u8 = 255;
const BLOCK_LUMA: u8 = 96;

/// Pixel size of one terminal cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSize {
    pub width: f64,
    pub height: f64,
}

impl CellSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    /// Cells covering `px` horizontally
    pub fn cols(&self, px: f64) -> u16 {
        (px / self.width).ceil().clamp(0.0, u16::MAX as f64) as u16
    }

    /// Cells covering `px` vertically
    pub fn rows(&self, px: f64) -> u16 {
        (px / self.height).ceil().clamp(0.0, u16::MAX as f64) as u16
    }
}

impl Default for CellSize {
    fn default() -> Self {
        Self::new(8.0, 16.0)
    }
}

/// A rendered page: ink level per cell, row-major (0 = blank, 255 = solid)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRaster {
    pub cols: u16,
    pub rows: u16,
    ink: Vec<u8>,
}

impl PageRaster {
    pub fn blank(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            ink: vec![0; cols as usize * rows as usize],
        }
    }

    pub fn ink(&self, col: u16, row: u16) -> u8 {
        if col >= self.cols || row >= self.rows {
            return 0;
        }
        self.ink[row as usize * self.cols as usize + col as usize]
    }
}

/// Average a luminance buffer down to `cols x rows` ink levels
pub fn downsample(luma: &[u8], width: usize, height: usize, cols: u16, rows: u16) -> PageRaster {
    let mut raster = PageRaster::blank(cols, rows);
    if width == 0 || height == 0 || cols == 0 || rows == 0 || luma.len() < width * height {
        return raster;
    }

    for row in 0..rows as usize {
        let y0 = row * height / rows as usize;
        let y1 = ((row + 1) * height / rows as usize).max(y0 + 1).min(height);
        for col in 0..cols as usize {
            let x0 = col * width / cols as usize;
            let x1 = ((col + 1) * width / cols as usize).max(x0 + 1).min(width);
            let mut sum = 0u64;
            let mut count = 0u64;
            for y in y0..y1 {
                let line = &luma[y * width..(y + 1) * width];
                for &value in &line[x0..x1] {
                    sum += value as u64;
                    count += 1;
                }
            }
            let avg = if count == 0 { 255 } else { sum / count };
            raster.ink[row * cols as usize + col] = 255 - avg as u8;
        }
    }
    raster
}

#[derive(Debug, Clone, Deserialize)]
struct ManifestPage {
    width: f64,
    height: f64,
    #[serde(default)]
    blocks: Vec<BBox>,
}

#[derive(Debug, Clone, Deserialize)]
struct Manifest {
    pages: Vec<ManifestPage>,
}

/// Paint manifest blocks into a luminance buffer sized to `surface`
fn paint_manifest_page(page: &ManifestPage, surface: &RasterSurface) -> (Vec<u8>, usize, usize) {
    let width = surface.backing_width as usize;
    let height = surface.backing_height as usize;
    let mut luma = vec![PAPER_LUMA; width * height];
    if page.width <= 0.0 || page.height <= 0.0 {
        return (luma, width, height);
    }
    let fx = width as f64 / page.width;
    let fy = height as f64 / page.height;
    for block in &page.blocks {
        // Corners may come in either order
        let (left, right) = (block.x0.min(block.x1), block.x0.max(block.x1));
        let (top, bottom) = (block.y0.min(block.y1), block.y0.max(block.y1));
        let x0 = (left * fx).floor().clamp(0.0, width as f64) as usize;
        let x1 = (right * fx).ceil().clamp(0.0, width as f64) as usize;
        let y0 = (top * fy).floor().clamp(0.0, height as f64) as usize;
        let y1 = (bottom * fy).ceil().clamp(0.0, height as f64) as usize;
        if x0 >= x1 || y0 >= y1 {
            continue;
        }
        for y in y0..y1 {
            luma[y * width + x0..y * width + x1].fill(BLOCK_LUMA);
        }
    }
    (luma, width, height)
}

#[derive(Debug)]
enum Source {
    Manifest(Manifest),
    #[cfg(feature = "pdf")]
    Pdf(PathBuf),
}

struct Job {
    task: TaskId,
    page: PageHandle,
    surface: RasterSurface,
    token: CancelToken,
}

/// Worker-side view of one document
struct WorkerState {
    source: Arc<Source>,
    #[cfg(feature = "pdf")]
    doc: Option<mupdf::Document>,
    cell: CellSize,
}

impl WorkerState {
    fn new(source: Arc<Source>, cell: CellSize) -> Self {
        #[cfg(feature = "pdf")]
        let doc = match source.as_ref() {
            Source::Pdf(path) => pdf::open(path)
                .map_err(|e| log::error!("render worker cannot open {}: {e}", path.display()))
                .ok(),
            Source::Manifest(_) => None,
        };
        Self {
            source,
            #[cfg(feature = "pdf")]
            doc,
            cell,
        }
    }

    fn rasterize(&self, job: &Job) -> Result<PageRaster, RenderError> {
        let cols = self.cell.cols(job.surface.css_width);
        let rows = self.cell.rows(job.surface.css_height);
        let (luma, width, height) = match self.source.as_ref() {
            Source::Manifest(manifest) => {
                let page = manifest.pages.get(job.page.index).ok_or_else(|| {
                    RenderError::Failed(format!("no page {}", job.page.index + 1))
                })?;
                paint_manifest_page(page, &job.surface)
            }
            #[cfg(feature = "pdf")]
            Source::Pdf(path) => {
                let doc = self.doc.as_ref().ok_or_else(|| {
                    RenderError::Failed(format!("cannot open {}", path.display()))
                })?;
                pdf::render_luma(doc, job)?
            }
        };
        if job.token.is_cancelled() {
            return Err(RenderError::Cancelled);
        }
        Ok(downsample(&luma, width, height, cols, rows))
    }
}

#[cfg(feature = "pdf")]
mod pdf {
    use super::Job;
    use mupdf::{Colorspace, Document, Matrix};
    use pagediff_core::{PageSize, RenderError};
    use std::path::Path;

    fn failed(e: mupdf::error::Error) -> RenderError {
        RenderError::Failed(e.to_string())
    }

    pub fn open(path: &Path) -> Result<Document, String> {
        Document::open(path.to_string_lossy().as_ref()).map_err(|e| e.to_string())
    }

    pub fn page_sizes(doc: &Document) -> Result<Vec<PageSize>, String> {
        let count = doc.page_count().map_err(|e| e.to_string())?;
        let mut sizes = Vec::with_capacity(count.max(0) as usize);
        for index in 0..count {
            let page = doc.load_page(index).map_err(|e| e.to_string())?;
            let bounds = page.bounds().map_err(|e| e.to_string())?;
            sizes.push(PageSize::new(
                (bounds.x1 - bounds.x0) as f64,
                (bounds.y1 - bounds.y0) as f64,
            ));
        }
        Ok(sizes)
    }

    /// Render the page at the backing resolution and reduce it to luminance
    pub fn render_luma(doc: &Document, job: &Job) -> Result<(Vec<u8>, usize, usize), RenderError> {
        let page = doc.load_page(job.page.index as i32).map_err(failed)?;
        let bounds = page.bounds().map_err(failed)?;
        let natural_width = (bounds.x1 - bounds.x0).max(1.0);
        let mag = job.surface.backing_width as f32 / natural_width;
        let pixmap = page
            .to_pixmap(&Matrix::new_scale(mag, mag), &Colorspace::device_rgb(), false, false)
            .map_err(failed)?;
        if job.token.is_cancelled() {
            return Err(RenderError::Cancelled);
        }

        let n = pixmap.n() as usize;
        let width = pixmap.width() as usize;
        let height = pixmap.height() as usize;
        let stride = pixmap.stride() as usize;
        let samples = pixmap.samples();
        if n < 3 || samples.len() < stride.saturating_mul(height) || width * n > stride {
            return Err(RenderError::Failed("Pixmap buffer size mismatch".into()));
        }

        let mut luma = Vec::with_capacity(width * height);
        for y in 0..height {
            let row = &samples[y * stride..y * stride + width * n];
            for px in row.chunks_exact(n) {
                let l = (px[0] as u32 * 54 + px[1] as u32 * 183 + px[2] as u32 * 19) >> 8;
                luma.push(l as u8);
            }
        }
        Ok((luma, width, height))
    }
}

/// Worker thread serving one document
fn spawn_worker(
    source: Arc<Source>,
    cell: CellSize,
    events: mpsc::Sender<RenderEvent<PageRaster>>,
) -> mpsc::Sender<Job> {
    let (job_tx, job_rx) = mpsc::channel::<Job>();
    thread::spawn(move || {
        let state = WorkerState::new(source, cell);
        while let Ok(job) = job_rx.recv() {
            let result = if job.token.is_cancelled() {
                Err(RenderError::Cancelled)
            } else {
                state.rasterize(&job)
            };
            let event = RenderEvent {
                task: job.task,
                page: job.page,
                result,
            };
            if events.send(event).is_err() {
                break;
            }
        }
    });
    job_tx
}

/// [`PageRenderer`] producing cell rasters for the terminal
pub struct TerminalRenderer {
    cell: CellSize,
    path: Option<PathBuf>,
    sizes: Vec<PageSize>,
    jobs: Option<mpsc::Sender<Job>>,
    events_tx: mpsc::Sender<RenderEvent<PageRaster>>,
    events_rx: mpsc::Receiver<RenderEvent<PageRaster>>,
    open_tasks: HashMap<TaskId, CancelToken>,
    next_task: u64,
}

impl TerminalRenderer {
    pub fn new(cell: CellSize) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            cell,
            path: None,
            sizes: Vec::new(),
            jobs: None,
            events_tx,
            events_rx,
            open_tasks: HashMap::new(),
            next_task: 1,
        }
    }

    pub fn cell(&self) -> CellSize {
        self.cell
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn page_count(&self) -> usize {
        self.sizes.len()
    }

    /// Drop the current document and cancel its tasks
    pub fn close(&mut self) {
        for (_, token) in self.open_tasks.drain() {
            token.cancel();
        }
        self.jobs = None;
        self.path = None;
        self.sizes.clear();
    }

    fn open_source(path: &Path) -> Result<(Source, Vec<PageSize>), LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("json") => {
                let content = std::fs::read_to_string(path)?;
                let manifest: Manifest =
                    serde_json::from_str(&content).map_err(|e| LoadError::Malformed {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    })?;
                let sizes = manifest
                    .pages
                    .iter()
                    .map(|p| PageSize::new(p.width, p.height))
                    .collect();
                Ok((Source::Manifest(manifest), sizes))
            }
            #[cfg(feature = "pdf")]
            Some("pdf") => {
                let malformed = |reason: String| LoadError::Malformed {
                    path: path.to_path_buf(),
                    reason,
                };
                let doc = pdf::open(path).map_err(malformed)?;
                let sizes = pdf::page_sizes(&doc).map_err(malformed)?;
                Ok((Source::Pdf(path.to_path_buf()), sizes))
            }
            _ => Err(LoadError::Unsupported(path.to_path_buf())),
        }
    }
}

impl PageRenderer for TerminalRenderer {
    type Output = PageRaster;

    fn load_document(&mut self, path: &Path) -> Result<Vec<PageHandle>, LoadError> {
        self.close();
        if !path.exists() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }
        let (source, sizes) = Self::open_source(path)?;
        if sizes.is_empty() {
            return Err(LoadError::Empty(path.to_path_buf()));
        }
        debug!("opened {} ({} pages)", path.display(), sizes.len());

        self.jobs = Some(spawn_worker(
            Arc::new(source),
            self.cell,
            self.events_tx.clone(),
        ));
        self.path = Some(path.to_path_buf());
        self.sizes = sizes;
        Ok((0..self.sizes.len()).map(|index| PageHandle { index }).collect())
    }

    fn natural_size(&self, page: PageHandle) -> PageSize {
        self.sizes
            .get(page.index)
            .copied()
            .unwrap_or(PageSize::new(0.0, 0.0))
    }

    fn render(&mut self, page: PageHandle, scale: f64, surface: RasterSurface) -> RenderTask {
        let id = TaskId(self.next_task);
        self.next_task += 1;
        let token = CancelToken::new();
        let task = RenderTask::new(id, page, scale, token.clone());

        let job = Job {
            task: id,
            page,
            surface,
            token: token.clone(),
        };
        let sent = self.jobs.as_ref().is_some_and(|jobs| jobs.send(job).is_ok());
        if sent {
            self.open_tasks.insert(id, token);
        } else {
            warn!("no document to render page {}", page.index + 1);
            let _ = self.events_tx.send(RenderEvent {
                task: id,
                page,
                result: Err(RenderError::Failed("no document loaded".into())),
            });
        }
        task
    }

    fn poll(&mut self) -> Vec<RenderEvent<PageRaster>> {
        let mut events = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            self.open_tasks.remove(&event.task);
            events.push(event);
        }
        events
    }
}
