//! Page geometry and the document-space to screen-space transform
//!
//! Document space is a page at its natural size (scale 1). Screen space is the
//! displayed, CSS-pixel-like space overlays live in. The device pixel ratio only
//! affects the backing raster surface, never overlay geometry.

use crate::model::BBox;
use serde::{Deserialize, Serialize};

/// Natural size of a page at scale 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn scaled(&self, scale: f64) -> PageSize {
        PageSize::new(self.width * scale, self.height * scale)
    }
}

/// Ordered page sizes of one document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMetrics {
    pages: Vec<PageSize>,
}

impl PageMetrics {
    pub fn new(pages: Vec<PageSize>) -> Self {
        Self { pages }
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Option<PageSize> {
        self.pages.get(index).copied()
    }

    pub fn pages(&self) -> &[PageSize] {
        &self.pages
    }

    pub fn heights_at_scale(&self, scale: f64) -> Vec<f64> {
        self.pages.iter().map(|p| p.height * scale).collect()
    }

    /// Sum of the heights of pages `[0, page_index)` at `scale`
    pub fn accumulated_offset(&self, page_index: usize, scale: f64) -> f64 {
        self.pages
            .iter()
            .take(page_index)
            .map(|p| p.height * scale)
            .sum()
    }

    pub fn total_height(&self, scale: f64) -> f64 {
        self.accumulated_offset(self.pages.len(), scale)
    }

    /// Page whose vertical span contains `offset`
    pub fn page_at_offset(&self, offset: f64, scale: f64) -> Option<usize> {
        if self.pages.is_empty() {
            return None;
        }
        let mut top = 0.0;
        for (idx, page) in self.pages.iter().enumerate() {
            let bottom = top + page.height * scale;
            if offset >= top && offset < bottom {
                return Some(idx);
            }
            top = bottom;
        }
        // Past the end (or negative): pin to the nearest page
        if offset < 0.0 {
            Some(0)
        } else {
            Some(self.pages.len() - 1)
        }
    }

    /// Scale that fits the first page into `container_width - reserved`
    pub fn fit_width_scale(&self, container_width: f64, reserved: f64) -> Option<f64> {
        let first = self.pages.first()?;
        let content = container_width - reserved;
        if content <= 0.0 || first.width <= 0.0 {
            return None;
        }
        Some(content / first.width)
    }
}

/// Overlay rectangle in screen space, relative to the page's top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Map a document-space box onto a page rendered at `scale`.
///
/// Each axis gets its own factor (`rendered / natural`), so a renderer that
/// distorts the aspect ratio still lines overlays up with the pixels.
pub fn to_screen_rect(bbox: &BBox, page: PageSize, scale: f64) -> ScreenRect {
    let rendered = page.scaled(scale);
    to_screen_rect_in(bbox, page, rendered)
}

/// Same as [`to_screen_rect`] for an explicitly measured rendered size
pub fn to_screen_rect_in(bbox: &BBox, natural: PageSize, rendered: PageSize) -> ScreenRect {
    if natural.width <= 0.0 || natural.height <= 0.0 {
        return ScreenRect::default();
    }
    let fx = rendered.width / natural.width;
    let fy = rendered.height / natural.height;
    ScreenRect {
        left: bbox.x0 * fx,
        top: bbox.y0 * fy,
        width: bbox.width() * fx,
        height: bbox.height() * fy,
    }
}

/// Raster target for one page.
///
/// `css_*` is what the page occupies on screen; `backing_*` is the pixel buffer
/// the renderer paints into (`css * device_pixel_ratio`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterSurface {
    pub css_width: f64,
    pub css_height: f64,
    pub backing_width: u32,
    pub backing_height: u32,
    pub device_pixel_ratio: f64,
}

impl RasterSurface {
    pub fn new(page: PageSize, scale: f64, device_pixel_ratio: f64) -> Self {
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        let css = page.scaled(scale);
        Self {
            css_width: css.width,
            css_height: css.height,
            backing_width: (css.width * dpr).round().max(0.0) as u32,
            backing_height: (css.height * dpr).round().max(0.0) as u32,
            device_pixel_ratio: dpr,
        }
    }

    /// Render scale the backing buffer is painted at
    pub fn raster_scale(&self, scale: f64) -> f64 {
        scale * self.device_pixel_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_accumulated_offset() {
        let metrics = PageMetrics::new(vec![
            PageSize::new(600.0, 800.0),
            PageSize::new(600.0, 800.0),
            PageSize::new(600.0, 400.0),
        ]);
        assert_eq!(metrics.accumulated_offset(0, 1.0), 0.0);
        assert_eq!(metrics.accumulated_offset(1, 1.0), 800.0);
        assert_eq!(metrics.accumulated_offset(2, 1.5), 2400.0);
        assert_eq!(metrics.accumulated_offset(3, 1.0), 2000.0);
        // Past the end clamps to the full height
        assert_eq!(metrics.accumulated_offset(10, 1.0), 2000.0);
        assert_eq!(metrics.heights_at_scale(0.5), vec![400.0, 400.0, 200.0]);
    }

    #[test]
    fn test_empty_metrics() {
        let metrics = PageMetrics::default();
        assert_eq!(metrics.accumulated_offset(3, 2.0), 0.0);
        assert_eq!(metrics.fit_width_scale(800.0, 0.0), None);
        assert_eq!(metrics.page_at_offset(10.0, 1.0), None);
    }

    #[test]
    fn test_page_at_offset() {
        let metrics = PageMetrics::new(vec![PageSize::new(100.0, 100.0); 3]);
        assert_eq!(metrics.page_at_offset(0.0, 1.0), Some(0));
        assert_eq!(metrics.page_at_offset(99.9, 1.0), Some(0));
        assert_eq!(metrics.page_at_offset(100.0, 1.0), Some(1));
        assert_eq!(metrics.page_at_offset(250.0, 1.0), Some(2));
        assert_eq!(metrics.page_at_offset(900.0, 1.0), Some(2));
        assert_eq!(metrics.page_at_offset(250.0, 2.0), Some(1));
    }

    #[test]
    fn test_fit_width_scale_reserves_gutter() {
        let metrics = PageMetrics::new(vec![LETTER]);
        let scale = metrics.fit_width_scale(629.0, 17.0).unwrap();
        assert!(approx(scale, 1.0));
        assert_eq!(metrics.fit_width_scale(10.0, 17.0), None);
    }

    #[test]
    fn test_screen_rect_at_unit_scale() {
        let rect = to_screen_rect(&BBox::new(10.0, 20.0, 50.0, 40.0), LETTER, 1.0);
        assert_eq!(
            rect,
            ScreenRect {
                left: 10.0,
                top: 20.0,
                width: 40.0,
                height: 20.0
            }
        );
    }

    #[test]
    fn test_screen_rect_is_linear_in_scale() {
        let bbox = BBox::new(72.0, 100.5, 300.25, 180.0);
        let base = to_screen_rect(&bbox, LETTER, 1.0);
        for scale in [0.25, 0.8, 1.5, 3.0] {
            let rect = to_screen_rect(&bbox, LETTER, scale);
            assert!(approx(rect.left, base.left * scale));
            assert!(approx(rect.top, base.top * scale));
            assert!(approx(rect.width, base.width * scale));
            assert!(approx(rect.height, base.height * scale));
            // Same inputs, same output
            assert_eq!(rect, to_screen_rect(&bbox, LETTER, scale));
        }
    }

    #[test]
    fn test_screen_rect_per_axis_factor() {
        let bbox = BBox::new(100.0, 100.0, 200.0, 200.0);
        let rendered = PageSize::new(1224.0, 792.0);
        let rect = to_screen_rect_in(&bbox, LETTER, rendered);
        assert!(approx(rect.left, 200.0));
        assert!(approx(rect.width, 200.0));
        assert!(approx(rect.top, 100.0));
        assert!(approx(rect.height, 100.0));
    }

    #[test]
    fn test_degenerate_page_yields_empty_rect() {
        let rect = to_screen_rect(&BBox::new(1.0, 1.0, 2.0, 2.0), PageSize::new(0.0, 10.0), 2.0);
        assert_eq!(rect, ScreenRect::default());
    }

    #[test]
    fn test_device_pixel_ratio_only_touches_backing_surface() {
        let surface = RasterSurface::new(LETTER, 1.5, 2.0);
        assert!(approx(surface.css_width, 918.0));
        assert!(approx(surface.css_height, 1188.0));
        assert_eq!(surface.backing_width, 1836);
        assert_eq!(surface.backing_height, 2376);
        assert!(approx(surface.raster_scale(1.5), 3.0));

        let fallback = RasterSurface::new(LETTER, 1.0, f64::NAN);
        assert_eq!(fallback.device_pixel_ratio, 1.0);
        assert_eq!(fallback.backing_width, 612);
    }
}
