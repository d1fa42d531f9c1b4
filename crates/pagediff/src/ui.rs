//! UI rendering for the TUI

use crate::app::{App, Focus, InputMode, StatusLevel, CATALOG_WIDTH, PANE_MIN_WIDTH};
use crate::views::{render_catalog, render_pane};
use pagediff_core::{CompareStatus, Side};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use std::time::Instant;
use unicode_width::UnicodeWidthStr;

/// Truncate a path to fit a given width, using /.../ for middle sections
pub(crate) fn truncate_path(path: &str, max_width: usize) -> String {
    if path.width() <= max_width {
        return path.to_string();
    }

    let parts: Vec<&str> = path.split('/').collect();
    let last = parts.last().copied().unwrap_or(path);
    if parts.len() > 2 {
        let simple = format!("{}/.../{}", parts[0], last);
        if simple.width() <= max_width {
            return simple;
        }
    }

    // Otherwise keep the tail of the file name
    let keep = max_width.saturating_sub(3);
    let chars: Vec<char> = last.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(keep)..].iter().collect();
    format!("...{}", tail)
}

fn span_width(spans: &[Span]) -> usize {
    spans.iter().map(|s| s.content.width()).sum()
}

/// Main drawing function
pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Panes and catalog
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_content(frame, app, chunks[0]);
    draw_status_bar(frame, app, chunks[1]);

    if app.show_help {
        draw_help_popover(frame, app);
    }
}

fn draw_content(frame: &mut Frame, app: &mut App, area: Rect) {
    // The catalog gives way before the panes get too narrow
    let show_catalog = app.catalog_visible && area.width >= PANE_MIN_WIDTH * 2 + CATALOG_WIDTH;
    let (panes_area, catalog_area) = if show_catalog {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(CATALOG_WIDTH)])
            .split(area);
        (chunks[0], Some(chunks[1]))
    } else {
        (area, None)
    };

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(panes_area);
    render_pane(frame, app, panes[0], Side::A);
    render_pane(frame, app, panes[1], Side::B);

    match catalog_area {
        Some(catalog_area) => render_catalog(frame, app, catalog_area),
        None => {
            app.catalog_area = None;
            app.catalog_rows.clear();
            app.catalog_tabs.clear();
        }
    }
}

fn draw_status_bar(frame: &mut Frame, app: &mut App, area: Rect) {
    let available_width = area.width as usize;
    let bar_bg = app.theme.border;

    let (badge, badge_bg) = match app.session.status() {
        CompareStatus::Idle => (" IDLE ", app.theme.text_muted),
        CompareStatus::Running(_) => (" COMPARING ", app.theme.warning),
        CompareStatus::Done => (" DONE ", app.theme.success),
        CompareStatus::Failed(_) => (" ERROR ", app.theme.error),
    };

    // CENTER: input prompt, status message or page position
    let mut center_spans = Vec::new();
    match app.input_mode {
        InputMode::Path(side) => {
            center_spans.push(Span::styled(
                format!("Open {}: ", crate::app::side_label(side)),
                Style::default().fg(app.theme.accent),
            ));
            center_spans.push(Span::styled(
                format!("{}▏", app.input_buffer),
                Style::default().fg(app.theme.text),
            ));
        }
        InputMode::Search => {
            center_spans.push(Span::styled("/", Style::default().fg(app.theme.text_muted)));
            center_spans.push(Span::raw(" "));
            let (text, style) = if app.input_buffer.is_empty() {
                ("Search".to_string(), Style::default().fg(app.theme.text_muted))
            } else {
                (app.input_buffer.clone(), Style::default().fg(app.theme.text))
            };
            center_spans.push(Span::styled(text, style));
        }
        InputMode::Normal => {
            if let Some(status) = &app.status {
                let color = match status.level {
                    StatusLevel::Info => app.theme.text,
                    StatusLevel::Error => app.theme.error,
                };
                center_spans.push(Span::styled(status.text.clone(), Style::default().fg(color)));
            } else {
                let side = app.scroll_side();
                let viewer = app.session.viewer(side);
                if let (true, Some(page)) = (viewer.is_navigable(), viewer.current_page()) {
                    center_spans.push(Span::styled(
                        format!("Page {} of {}", page + 1, viewer.pages().len()),
                        Style::default().fg(app.theme.text_muted),
                    ));
                }
            }
        }
    }

    // RIGHT: counts, active difference, sync and zoom
    let counts = app.session.catalog().counts();
    let mut right_spans = Vec::new();
    if !app.session.catalog().is_empty() {
        right_spans.push(Span::styled(
            format!("+{}", counts.additions),
            Style::default().fg(app.theme.diff_added),
        ));
        right_spans.push(Span::raw(" "));
        right_spans.push(Span::styled(
            format!("-{}", counts.deletions),
            Style::default().fg(app.theme.diff_removed),
        ));
        right_spans.push(Span::raw(" "));
        right_spans.push(Span::styled(
            format!("~{}", counts.modifications),
            Style::default().fg(app.theme.diff_modified),
        ));
        right_spans.push(Span::raw("  "));
    }
    if let Some(id) = app.session.active_id() {
        let remaining = app
            .session
            .navigation()
            .remaining(Instant::now())
            .map(|d| format!(" {:.0}s", d.as_secs_f64().ceil()))
            .unwrap_or_default();
        right_spans.push(Span::styled(
            format!("{}{}", id, remaining),
            Style::default().fg(app.highlight_color()),
        ));
        right_spans.push(Span::raw("  "));
    }
    right_spans.push(Span::styled(
        if app.session.sync_enabled() {
            "sync"
        } else {
            "nosync"
        },
        Style::default().fg(app.theme.text_muted),
    ));
    right_spans.push(Span::raw("  "));
    right_spans.push(Span::styled(
        format!("{:.0}%", app.session.viewer(Side::A).zoom() * 100.0),
        Style::default().fg(app.theme.text_muted),
    ));
    right_spans.push(Span::raw(" "));

    // LEFT: badge and document names
    let name = |side: Side| {
        app.session
            .viewer(side)
            .source()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    let center_width = span_width(&center_spans);
    let right_width = span_width(&right_spans);
    let left_fixed_width = badge.width() + 1 + 4;
    let min_padding = 2;
    let names_width = available_width
        .saturating_sub(center_width + right_width + left_fixed_width + min_padding * 2);
    let each = names_width / 2;
    let left_spans = vec![
        Span::styled(
            badge,
            Style::default()
                .fg(app.theme.paper)
                .bg(badge_bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            truncate_path(&name(Side::A), each),
            Style::default().fg(app.theme.text),
        ),
        Span::styled(" ⇄ ", Style::default().fg(app.theme.text_muted)),
        Span::styled(
            truncate_path(&name(Side::B), each),
            Style::default().fg(app.theme.text),
        ),
    ];

    let left_width = span_width(&left_spans);
    let center_start = (available_width / 2).saturating_sub(center_width / 2);
    let left_pad = center_start.saturating_sub(left_width);
    let right_pad =
        available_width.saturating_sub(left_width + left_pad.max(1) + center_width + right_width);

    let mut spans = left_spans;
    spans.push(Span::raw(" ".repeat(left_pad.max(1))));
    spans.extend(center_spans);
    spans.push(Span::raw(" ".repeat(right_pad.max(1))));
    spans.extend(right_spans);

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bar_bg));
    frame.render_widget(paragraph, area);
}

fn draw_help_popover(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    let key_style = Style::default().fg(app.theme.accent);
    let label_style = Style::default().fg(app.theme.text);
    let dim_style = Style::default().fg(app.theme.text_muted);
    let section_style = Style::default().fg(app.theme.primary);

    let help_line = |key: &str, desc: &str| -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("  {:<12}", key), key_style),
            Span::styled(desc.to_string(), label_style),
        ])
    };

    let focus_hint = match app.focus {
        Focus::Catalog => "(catalog focused)",
        Focus::Pane(Side::A) => "(pane A focused)",
        Focus::Pane(Side::B) => "(pane B focused)",
    };

    let lines = vec![
        Line::from(vec![
            Span::styled(" Documents ", section_style),
            Span::styled(focus_hint, dim_style),
        ]),
        help_line("1 / 2", "Open document A/B"),
        help_line("c", "Compare"),
        help_line("s", "Toggle scroll sync"),
        help_line("+ / - / =", "Zoom in/out/reset"),
        Line::from(""),
        Line::from(Span::styled(" Navigation", section_style)),
        help_line("j / k / ↑↓", "Scroll (cursor in catalog)"),
        help_line("^D / ^U", "Scroll half-page"),
        help_line("g / G", "Go to start/end"),
        help_line("h / l / ←→", "Focus left/right"),
        help_line("n / N", "Next/prev difference"),
        help_line("Enter", "Go to selected difference"),
        Line::from(""),
        Line::from(Span::styled(" Catalog", section_style)),
        help_line("d", "Toggle catalog"),
        help_line("Tab", "Cycle type filter"),
        help_line("/", "Search difference text"),
        help_line("C", "Cycle highlight color"),
        help_line("Esc", "Clear active difference"),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("  {:<12}", "?"), key_style),
            Span::styled("Close help", dim_style),
        ]),
        Line::from(vec![
            Span::styled(format!("  {:<12}", "q"), key_style),
            Span::styled("Quit", label_style),
        ]),
    ];

    let popup_width = 46u16.min(area.width.saturating_sub(4));
    let popup_height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    app.help_max_scroll = lines.len().saturating_sub(popup_height.saturating_sub(2) as usize);
    app.help_scroll = app.help_scroll.min(app.help_max_scroll);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .title_alignment(Alignment::Center)
        .border_style(Style::default().fg(app.theme.border_active));

    let help_block = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Left)
        .scroll((app.help_scroll as u16, 0));

    frame.render_widget(help_block, popup_area);
}
