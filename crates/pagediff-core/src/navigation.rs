//! Difference navigation: select, scroll both panes, highlight, expire
//!
//! ```text
//! Idle --select--> Navigating --commit--> Active --tick (deadline)--> Idle
//!   ^                  |                     |
//!   +------clear-------+---------clear-------+
//! ```
//!
//! A new selection in any state replaces the previous one, including its
//! deadline.

use crate::catalog::DiffCatalog;
use crate::geometry::PageMetrics;
use crate::model::{BBox, Side};
use crate::scroll::ScrollCommand;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

pub const DEFAULT_FLASH: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavPhase {
    #[default]
    Idle,
    /// Scroll commands issued, not yet applied
    Navigating,
    Active,
}

/// Where in the page a navigation lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScrollAlign {
    /// Top of the page holding the difference
    #[default]
    PageTop,
    /// Top of the difference's box, less a margin
    BoxTop,
}

impl FromStr for ScrollAlign {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "page-top" | "page" => Ok(ScrollAlign::PageTop),
            "box-top" | "box" | "row" => Ok(ScrollAlign::BoxTop),
            other => Err(format!("unknown scroll alignment: {other}")),
        }
    }
}

/// Side-qualified key of the highlighted box, e.g. `file2-0-0`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveId {
    pub side: Side,
    pub page_index: usize,
    /// Position among `side`'s highlights on that page
    pub local_index: usize,
}

impl fmt::Display for ActiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.side.file_id(),
            self.page_index,
            self.local_index
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveDiff {
    pub index: usize,
    pub id: Option<ActiveId>,
    pub deadline: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationOptions {
    pub flash: Duration,
    pub prefer_side: Side,
    pub align: ScrollAlign,
    /// Space kept above the box with [`ScrollAlign::BoxTop`], in screen pixels
    pub align_margin: f64,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self {
            flash: DEFAULT_FLASH,
            prefer_side: Side::A,
            align: ScrollAlign::PageTop,
            align_margin: 0.0,
        }
    }
}

/// Geometry of a pane that can be scrolled to
#[derive(Debug, Clone, Copy)]
pub struct PaneTarget<'a> {
    pub metrics: &'a PageMetrics,
    pub scale: f64,
}

impl<'a> PaneTarget<'a> {
    pub fn new(metrics: &'a PageMetrics, scale: f64) -> Self {
        Self { metrics, scale }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NavigationController {
    options: NavigationOptions,
    phase: NavPhase,
    active: Option<ActiveDiff>,
}

impl NavigationController {
    pub fn new(options: NavigationOptions) -> Self {
        Self {
            options,
            phase: NavPhase::Idle,
            active: None,
        }
    }

    pub fn options(&self) -> &NavigationOptions {
        &self.options
    }

    pub fn phase(&self) -> NavPhase {
        self.phase
    }

    pub fn active(&self) -> Option<&ActiveDiff> {
        self.active.as_ref()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active.map(|a| a.index)
    }

    pub fn active_id(&self) -> Option<ActiveId> {
        self.active.and_then(|a| a.id)
    }

    /// Select difference `index` and compute the scroll commands for both panes.
    ///
    /// Sides without a box, without a pane, or whose page is out of range are
    /// skipped; the difference still becomes active. Returns `None` when the
    /// index is not in the catalog.
    pub fn select(
        &mut self,
        catalog: &DiffCatalog,
        index: usize,
        panes: [Option<PaneTarget<'_>>; 2],
        now: Instant,
    ) -> Option<Vec<ScrollCommand>> {
        let diff = catalog.get(index)?;

        let mut commands = Vec::with_capacity(2);
        for side in Side::BOTH {
            let Some(bbox) = diff.bbox(side) else {
                continue;
            };
            let Some(pane) = panes[side.index()] else {
                warn!("pane {} unavailable, skipping scroll for difference {index}", side.file_id());
                continue;
            };
            if diff.page_index >= pane.metrics.len() {
                warn!(
                    "difference {index} targets page {} but {} has {} pages",
                    diff.page_index,
                    side.file_id(),
                    pane.metrics.len()
                );
                continue;
            }
            commands.push(ScrollCommand {
                side,
                scroll_top: self.target_offset(pane, diff.page_index, bbox),
            });
        }

        let prefer = self.options.prefer_side;
        let id = [prefer, prefer.other()].into_iter().find_map(|side| {
            let local_index = catalog.local_index(side, index)?;
            Some(ActiveId {
                side,
                page_index: diff.page_index,
                local_index,
            })
        });

        debug!(
            "select difference {index} ({}), id {}",
            diff.kind,
            id.map(|id| id.to_string()).unwrap_or_default()
        );

        self.active = Some(ActiveDiff {
            index,
            id,
            deadline: now + self.options.flash,
        });
        self.phase = NavPhase::Navigating;
        Some(commands)
    }

    fn target_offset(&self, pane: PaneTarget<'_>, page_index: usize, bbox: &BBox) -> f64 {
        let page_top = pane.metrics.accumulated_offset(page_index, pane.scale);
        match self.options.align {
            ScrollAlign::PageTop => page_top,
            ScrollAlign::BoxTop => {
                (page_top + bbox.y0 * pane.scale - self.options.align_margin).max(0.0)
            }
        }
    }

    /// Scroll commands from the last selection have been applied
    pub fn commit(&mut self) {
        if self.phase == NavPhase::Navigating {
            self.phase = NavPhase::Active;
        }
    }

    /// Expire the active difference once its deadline passed. Returns true if
    /// something was cleared.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.active {
            Some(active) if now >= active.deadline => {
                debug!("difference {} highlight expired", active.index);
                self.clear();
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.active = None;
        self.phase = NavPhase::Idle;
    }

    /// Time left before the active highlight expires
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.active
            .map(|a| a.deadline.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PageSize;
    use crate::model::{DiffKind, Difference};

    fn record(page: usize, kind: DiffKind, bbox: BBox) -> Difference {
        Difference {
            page_index: page,
            kind,
            bbox_a: (kind != DiffKind::Addition).then_some(bbox),
            bbox_b: (kind != DiffKind::Deletion).then_some(bbox),
            text_a: None,
            text_b: None,
            absolute_y_a: None,
            absolute_y_b: None,
        }
    }

    fn metrics(heights: &[f64]) -> PageMetrics {
        PageMetrics::new(heights.iter().map(|&h| PageSize::new(600.0, h)).collect())
    }

    #[test]
    fn test_single_addition_scrolls_only_b() {
        let catalog = DiffCatalog::new(vec![record(
            0,
            DiffKind::Addition,
            BBox::new(10.0, 20.0, 50.0, 40.0),
        )]);
        let a = metrics(&[800.0]);
        let b = metrics(&[800.0]);
        let mut nav = NavigationController::default();
        let now = Instant::now();

        let commands = nav
            .select(
                &catalog,
                0,
                [Some(PaneTarget::new(&a, 1.0)), Some(PaneTarget::new(&b, 1.0))],
                now,
            )
            .unwrap();
        assert_eq!(
            commands,
            vec![ScrollCommand {
                side: Side::B,
                scroll_top: 0.0
            }]
        );
        assert_eq!(nav.active_index(), Some(0));
        assert_eq!(nav.active_id().unwrap().to_string(), "file2-0-0");
        assert_eq!(nav.phase(), NavPhase::Navigating);
        nav.commit();
        assert_eq!(nav.phase(), NavPhase::Active);
    }

    #[test]
    fn test_page_offsets_follow_each_pane_scale() {
        let catalog = DiffCatalog::new(vec![record(
            2,
            DiffKind::Modification,
            BBox::new(0.0, 100.0, 10.0, 110.0),
        )]);
        let a = metrics(&[800.0, 800.0, 800.0]);
        let b = metrics(&[600.0, 600.0, 600.0]);
        let mut nav = NavigationController::default();
        let commands = nav
            .select(
                &catalog,
                0,
                [Some(PaneTarget::new(&a, 1.5)), Some(PaneTarget::new(&b, 0.5))],
                Instant::now(),
            )
            .unwrap();
        assert_eq!(commands[0].scroll_top, 2400.0);
        assert_eq!(commands[1].scroll_top, 600.0);
        // Preferred side is A for modifications
        assert_eq!(nav.active_id().unwrap().to_string(), "file1-2-0");
    }

    #[test]
    fn test_box_top_alignment() {
        let catalog = DiffCatalog::new(vec![record(
            1,
            DiffKind::Deletion,
            BBox::new(0.0, 100.0, 10.0, 110.0),
        )]);
        let a = metrics(&[800.0, 800.0]);
        let mut nav = NavigationController::new(NavigationOptions {
            align: ScrollAlign::BoxTop,
            align_margin: 40.0,
            ..NavigationOptions::default()
        });
        let commands = nav
            .select(&catalog, 0, [Some(PaneTarget::new(&a, 2.0)), None], Instant::now())
            .unwrap();
        assert_eq!(commands[0].scroll_top, 1600.0 + 200.0 - 40.0);
    }

    #[test]
    fn test_missing_pane_and_out_of_range_page_still_activate() {
        let catalog = DiffCatalog::new(vec![record(
            5,
            DiffKind::Modification,
            BBox::new(0.0, 0.0, 1.0, 1.0),
        )]);
        let short = metrics(&[800.0]);
        let mut nav = NavigationController::default();
        let commands = nav
            .select(&catalog, 0, [Some(PaneTarget::new(&short, 1.0)), None], Instant::now())
            .unwrap();
        assert!(commands.is_empty());
        assert_eq!(nav.active_index(), Some(0));
    }

    #[test]
    fn test_unknown_index_is_ignored() {
        let mut nav = NavigationController::default();
        assert!(nav.select(&DiffCatalog::default(), 3, [None, None], Instant::now()).is_none());
        assert_eq!(nav.phase(), NavPhase::Idle);
    }

    #[test]
    fn test_expiry_after_flash_duration() {
        let catalog = DiffCatalog::new(vec![record(0, DiffKind::Deletion, BBox::new(0.0, 0.0, 1.0, 1.0))]);
        let mut nav = NavigationController::default();
        let start = Instant::now();
        nav.select(&catalog, 0, [None, None], start).unwrap();
        nav.commit();

        assert!(!nav.tick(start + Duration::from_millis(4999)));
        assert_eq!(nav.active_index(), Some(0));
        assert!(nav.tick(start + Duration::from_secs(5)));
        assert_eq!(nav.active_index(), None);
        assert_eq!(nav.active_id(), None);
        assert_eq!(nav.phase(), NavPhase::Idle);
    }

    #[test]
    fn test_new_selection_replaces_deadline() {
        let catalog = DiffCatalog::new(vec![
            record(0, DiffKind::Deletion, BBox::new(0.0, 0.0, 1.0, 1.0)),
            record(0, DiffKind::Deletion, BBox::new(0.0, 5.0, 1.0, 6.0)),
        ]);
        let mut nav = NavigationController::default();
        let start = Instant::now();
        nav.select(&catalog, 0, [None, None], start).unwrap();
        nav.select(&catalog, 1, [None, None], start + Duration::from_secs(3))
            .unwrap();

        // First deadline passes without clearing the second selection
        assert!(!nav.tick(start + Duration::from_secs(6)));
        assert_eq!(nav.active_index(), Some(1));
        assert_eq!(nav.active_id().unwrap().to_string(), "file1-0-1");
        assert!(nav.tick(start + Duration::from_secs(8)));
    }

    #[test]
    fn test_prefer_side_b() {
        let catalog = DiffCatalog::new(vec![record(
            0,
            DiffKind::Modification,
            BBox::new(0.0, 0.0, 1.0, 1.0),
        )]);
        let mut nav = NavigationController::new(NavigationOptions {
            prefer_side: Side::B,
            ..NavigationOptions::default()
        });
        nav.select(&catalog, 0, [None, None], Instant::now()).unwrap();
        assert_eq!(nav.active_id().unwrap().side, Side::B);
    }

    #[test]
    fn test_clear_returns_to_idle() {
        let catalog = DiffCatalog::new(vec![record(0, DiffKind::Deletion, BBox::new(0.0, 0.0, 1.0, 1.0))]);
        let mut nav = NavigationController::default();
        nav.select(&catalog, 0, [None, None], Instant::now()).unwrap();
        nav.clear();
        assert_eq!(nav.phase(), NavPhase::Idle);
        assert!(nav.active().is_none());
    }

    #[test]
    fn test_parse_align() {
        assert_eq!("box-top".parse::<ScrollAlign>(), Ok(ScrollAlign::BoxTop));
        assert_eq!("page".parse::<ScrollAlign>(), Ok(ScrollAlign::PageTop));
        assert!("middle".parse::<ScrollAlign>().is_err());
    }
}
