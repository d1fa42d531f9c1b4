//! Document pane: shaded page cells, highlight overlays and the marker gutter

use crate::app::{App, AreaRect, Focus, PageSlot, GUTTER_COLS};
use crate::color::{self, ACTIVE_ALPHA, NORMAL_ALPHA};
use crate::views::truncate_to_width;
use pagediff_core::{Emphasis, LoadState, Overlay, Side};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use std::collections::HashMap;

/// Overlay footprint in page-local cells (inclusive bounds)
#[derive(Debug, Clone, Copy)]
struct CellBox {
    col0: i64,
    col1: i64,
    row0: i64,
    row1: i64,
    index: usize,
    emphasis: Emphasis,
}

impl CellBox {
    fn from_overlay(overlay: &Overlay, cell_w: f64, cell_h: f64) -> Self {
        let rect = overlay.rect;
        let col0 = (rect.left / cell_w).floor() as i64;
        let row0 = (rect.top / cell_h).floor() as i64;
        // Boxes smaller than a cell still cover one
        let col1 = ((rect.right() / cell_w).ceil() as i64 - 1).max(col0);
        let row1 = ((rect.bottom() / cell_h).ceil() as i64 - 1).max(row0);
        Self {
            col0,
            col1,
            row0,
            row1,
            index: overlay.index,
            emphasis: overlay.emphasis,
        }
    }

    fn contains(&self, col: i64, row: i64) -> bool {
        col >= self.col0 && col <= self.col1 && row >= self.row0 && row <= self.row1
    }

    /// Outline glyph for `col, row` on the box edge
    fn edge_symbol(&self, col: i64, row: i64) -> Option<&'static str> {
        let left = col == self.col0;
        let right = col == self.col1;
        let top = row == self.row0;
        let bottom = row == self.row1;
        match (left || right, top || bottom) {
            (true, true) => Some("█"),
            (true, false) if left && right => Some("█"),
            (true, false) if left => Some("▌"),
            (true, false) => Some("▐"),
            (false, true) if top && bottom => Some("█"),
            (false, true) if top => Some("▀"),
            (false, true) => Some("▄"),
            (false, false) => None,
        }
    }
}

fn side_title(side: Side) -> &'static str {
    match side {
        Side::A => "A",
        Side::B => "B",
    }
}

/// Render one document pane
pub fn render_pane(frame: &mut Frame, app: &mut App, area: Rect, side: Side) {
    let focused = app.focus == Focus::Pane(side);
    let border_color = if app.pane_flash_active() {
        app.theme.warning
    } else if focused {
        app.theme.border_active
    } else {
        app.theme.border
    };

    let viewer = app.session.viewer(side);
    let name = viewer
        .source()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "no document".to_string());
    let title = truncate_to_width(
        &format!(" {} · {} ", side_title(side), name),
        area.width.saturating_sub(4) as usize,
    );
    let mut right_title = String::new();
    if viewer.is_navigable() {
        if let Some(page) = viewer.current_page() {
            right_title = format!(
                " {}/{} · {:.0}% ",
                page + 1,
                viewer.pages().len(),
                viewer.scale() * 100.0
            );
        }
    }

    let mut block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(border_color));
    if !right_title.is_empty() && area.width > 30 {
        block = block.title(Line::from(right_title).alignment(Alignment::Right));
    }
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let hits = &mut app.pane_hits[side.index()];
    hits.clear();
    hits.area = Some((inner.x, inner.y, inner.width, inner.height));

    if inner.width <= GUTTER_COLS || inner.height == 0 {
        return;
    }
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(GUTTER_COLS), Constraint::Min(0)])
        .split(inner);
    let gutter = chunks[0];
    let content = chunks[1];

    app.layout_pane(side, content.width, content.height);
    app.request_visible_pages(side);

    if !app.session.viewer(side).is_navigable() {
        render_placeholder(frame, app, content, side);
        return;
    }

    let overlays = draw_pages(frame.buffer_mut(), app, content, side);
    draw_gutter(frame.buffer_mut(), app, gutter, side);
    draw_scrollbar(frame.buffer_mut(), app, content, side);
    app.pane_hits[side.index()].overlays = overlays;
}

fn render_placeholder(frame: &mut Frame, app: &App, area: Rect, side: Side) {
    let viewer = app.session.viewer(side);
    let key = match side {
        Side::A => "1",
        Side::B => "2",
    };
    let (text, style) = match viewer.load_state() {
        LoadState::Empty => (
            format!("No document. Press {key} to open one."),
            Style::default().fg(app.theme.text_muted),
        ),
        LoadState::Loading => (
            "Loading...".to_string(),
            Style::default().fg(app.theme.text_muted),
        ),
        LoadState::Ready => (
            "Document has no pages".to_string(),
            Style::default().fg(app.theme.text_muted),
        ),
        LoadState::Failed(reason) => (
            format!("Cannot display document: {reason}"),
            Style::default().fg(app.theme.error),
        ),
    };
    let y = area.y + area.height / 2;
    let line_area = Rect::new(area.x, y, area.width, area.height.saturating_sub(y - area.y));
    let paragraph = Paragraph::new(text)
        .style(style)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, line_area);
}

/// Paint the visible page cells. Returns the screen areas of overlays.
fn draw_pages(buf: &mut Buffer, app: &App, area: Rect, side: Side) -> Vec<(AreaRect, usize)> {
    let viewer = app.session.viewer(side);
    let pages = viewer.pages();
    let scale = viewer.scale();
    let cell_w = app.cell.width;
    let cell_h = app.cell.height;
    let scroll_top = viewer.scroll_top();
    let total = viewer.content_height();
    let highlight = app.highlight_color();
    let flash = color::pulse(app.theme.flash, app.pulse_phase());
    let paper = app.theme.paper;
    let ink = app.theme.ink;

    let mut boxes: HashMap<usize, Vec<CellBox>> = HashMap::new();
    let mut overlay_hits: HashMap<usize, (u16, u16, u16, u16)> = HashMap::new();

    for row in 0..area.height {
        let y = area.y + row;
        let doc_y = scroll_top + (row as f64 + 0.5) * cell_h;
        let page = if doc_y < total {
            pages.page_at_offset(doc_y, scale)
        } else {
            None
        };
        let Some(page) = page else {
            continue;
        };
        let Some(size) = pages.page(page) else {
            continue;
        };
        let page_row = ((doc_y - viewer.page_top(page)) / cell_h).floor() as i64;
        let page_cols = (app.cell.cols(size.width * scale)).min(area.width);
        let x_offset = area.width.saturating_sub(page_cols) / 2;
        let slot = app.page_slot(side, page);
        let raster = slot.and_then(PageSlot::raster);

        let page_boxes = boxes.entry(page).or_insert_with(|| {
            app.session
                .overlays(side, page)
                .iter()
                .map(|o| CellBox::from_overlay(o, cell_w, cell_h))
                .collect()
        });

        for col in 0..page_cols {
            let x = area.x + x_offset + col;
            let level = raster.map_or(0, |r| r.ink(col, page_row.max(0) as u16));
            let mut bg = color::ink_shade(paper, ink, level);
            let mut symbol = " ";
            let mut fg = None;

            for cell_box in page_boxes.iter().filter(|b| b.contains(col as i64, page_row)) {
                let alpha = match cell_box.emphasis {
                    Emphasis::Normal => NORMAL_ALPHA,
                    Emphasis::Active | Emphasis::Flashing => ACTIVE_ALPHA,
                };
                bg = color::blend(bg, highlight, alpha);
                if cell_box.emphasis == Emphasis::Flashing {
                    if let Some(edge) = cell_box.edge_symbol(col as i64, page_row) {
                        symbol = edge;
                        fg = Some(flash);
                    }
                }
                let hit = overlay_hits.entry(cell_box.index).or_insert((x, y, x, y));
                hit.0 = hit.0.min(x);
                hit.1 = hit.1.min(y);
                hit.2 = hit.2.max(x);
                hit.3 = hit.3.max(y);
            }

            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_symbol(symbol).set_bg(bg);
                cell.set_fg(fg.unwrap_or(ink));
            }
        }

        if page_row == 0 {
            let label = format!(" {} ", page + 1);
            let label_width = label.chars().count() as u16;
            if page_cols > label_width + 1 {
                let x = area.x + x_offset + page_cols - label_width;
                buf.set_string(x, y, &label, Style::default().fg(app.theme.text_muted).bg(paper));
            }
        }
        if page_row == 1 && page_cols > 4 {
            let note = match slot {
                Some(PageSlot::Failed(reason)) => {
                    Some((format!(" render failed: {reason}"), app.theme.error))
                }
                None if app.render_in_flight(side, page) => {
                    Some((format!(" rendering page {}...", page + 1), app.theme.text_muted))
                }
                _ => None,
            };
            if let Some((text, fg)) = note {
                let text = truncate_to_width(&text, page_cols as usize - 1);
                buf.set_string(
                    area.x + x_offset,
                    y,
                    text,
                    Style::default().fg(fg).bg(paper),
                );
            }
        }
    }

    let mut hits: Vec<(AreaRect, usize)> = overlay_hits
        .into_iter()
        .map(|(index, (x0, y0, x1, y1))| ((x0, y0, x1 - x0 + 1, y1 - y0 + 1), index))
        .collect();
    hits.sort_by_key(|(_, index)| *index);
    hits
}

/// Gutter markers next to each highlighted box of this side
fn draw_gutter(buf: &mut Buffer, app: &mut App, area: Rect, side: Side) {
    let mut markers = Vec::new();
    {
        let viewer = app.session.viewer(side);
        let scale = viewer.scale();
        let scroll_top = viewer.scroll_top();
        let active = app.session.active_index();
        let highlight = app.highlight_color();

        for marker in app.session.gutter_markers(side) {
            let screen_y = viewer.page_top(marker.page_index) + marker.y * scale - scroll_top;
            if screen_y < 0.0 {
                continue;
            }
            let row = (screen_y / app.cell.height).floor() as u16;
            if row >= area.height {
                continue;
            }
            let y = area.y + row;
            let kind = app
                .session
                .catalog()
                .get(marker.index)
                .map(|d| d.kind);
            let color = kind.map_or(app.theme.text_muted, |k| app.theme.kind_color(k));
            let mut style = Style::default().fg(color);
            if active == Some(marker.index) {
                style = style.bg(highlight).fg(Color::White).add_modifier(Modifier::BOLD);
            }
            // The first marker on a row wins the click
            if markers.iter().all(|(r, _)| *r != y) {
                buf.set_string(area.x, y, marker.symbol.to_string(), style);
                markers.push((y, marker.index));
            }
        }
    }
    app.pane_hits[side.index()].markers = markers;
}

fn draw_scrollbar(buf: &mut Buffer, app: &App, area: Rect, side: Side) {
    let metrics = app.session.viewer(side).pane_metrics();
    if metrics.max_scroll() <= 0.0 || area.height < 2 || area.width == 0 {
        return;
    }
    let height = area.height as f64;
    let thumb = ((metrics.client_height / metrics.scroll_height) * height)
        .clamp(1.0, height)
        .round() as u16;
    let start = (metrics.scroll_ratio() * (height - thumb as f64)).round() as u16;
    let x = area.right() - 1;
    for row in 0..area.height {
        let (symbol, color) = if row >= start && row < start + thumb {
            ("┃", app.theme.border_active)
        } else {
            ("│", app.theme.border)
        };
        buf.set_string(x, area.y + row, symbol, Style::default().fg(color));
    }
}
