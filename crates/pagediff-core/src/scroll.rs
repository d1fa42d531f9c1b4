//! Proportional scroll mirroring between the two document panes

use crate::model::Side;

/// Offsets closer than this are considered the same scroll position
const ECHO_TOLERANCE: f64 = 0.5;

/// Scroll geometry of one pane, in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PaneMetrics {
    pub scroll_top: f64,
    /// Full content height
    pub scroll_height: f64,
    /// Visible viewport height
    pub client_height: f64,
}

impl PaneMetrics {
    pub fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
            client_height,
        }
    }

    /// Largest reachable `scroll_top`
    pub fn max_scroll(&self) -> f64 {
        (self.scroll_height - self.client_height).max(0.0)
    }

    /// Position as a fraction of the scrollable range. A pane that cannot
    /// scroll reports 0.
    pub fn scroll_ratio(&self) -> f64 {
        let range = self.scroll_height - self.client_height;
        if range <= 0.0 {
            return 0.0;
        }
        (self.scroll_top / range).clamp(0.0, 1.0)
    }

    pub fn offset_for_ratio(&self, ratio: f64) -> f64 {
        ratio.clamp(0.0, 1.0) * self.max_scroll()
    }

    pub fn clamp_offset(&self, offset: f64) -> f64 {
        offset.clamp(0.0, self.max_scroll())
    }
}

/// Programmatic scroll write for one pane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollCommand {
    pub side: Side,
    pub scroll_top: f64,
}

/// Mirrors the scroll ratio of one pane onto the other.
///
/// Every programmatic write is remembered as an expected echo for the written
/// pane. When that pane then reports a scroll at the written offset, the event
/// is swallowed so the two panes never chase each other.
#[derive(Debug, Clone)]
pub struct ScrollSynchronizer {
    enabled: bool,
    pending_echo: [Option<f64>; 2],
}

impl Default for ScrollSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollSynchronizer {
    pub fn new() -> Self {
        Self {
            enabled: true,
            pending_echo: [None, None],
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.pending_echo = [None, None];
        }
    }

    /// Record a programmatic write so its echo is not mirrored back
    pub fn expect_programmatic(&mut self, command: ScrollCommand) {
        self.pending_echo[command.side.index()] = Some(command.scroll_top);
    }

    /// Drop any pending echo (e.g. when a pane's content is replaced)
    pub fn reset(&mut self) {
        self.pending_echo = [None, None];
    }

    /// Returns true if the scroll event from `side` is the echo of our own write
    fn consume_echo(&mut self, side: Side, scroll_top: f64) -> bool {
        match self.pending_echo[side.index()].take() {
            Some(expected) => (expected - scroll_top).abs() <= ECHO_TOLERANCE,
            None => false,
        }
    }

    /// Handle a scroll event from `source_side` and compute the write for the
    /// opposite pane, if any.
    pub fn mirror(
        &mut self,
        source_side: Side,
        source: &PaneMetrics,
        target: &PaneMetrics,
    ) -> Option<ScrollCommand> {
        if self.consume_echo(source_side, source.scroll_top) {
            return None;
        }
        if !self.enabled {
            return None;
        }

        let ratio = source.scroll_ratio();
        let scroll_top = target.offset_for_ratio(ratio);
        if (scroll_top - target.scroll_top).abs() <= ECHO_TOLERANCE {
            return None;
        }

        let command = ScrollCommand {
            side: source_side.other(),
            scroll_top,
        };
        self.expect_programmatic(command);
        Some(command)
    }
}
