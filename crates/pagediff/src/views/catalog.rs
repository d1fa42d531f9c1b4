//! Difference catalog panel: filter tabs, search line and the entry list

use crate::app::{App, Focus, InputMode};
use crate::views::{kind_title, truncate_to_width};
use pagediff_core::{gutter_symbol, CompareStatus, DiffKind, Difference, Side, TypeFilter};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Rows per catalog entry
const ENTRY_ROWS: usize = 2;

fn tab_label(filter: TypeFilter) -> &'static str {
    match filter {
        TypeFilter::All => "All",
        TypeFilter::Addition => "Added",
        TypeFilter::Deletion => "Deleted",
        TypeFilter::Modification => "Changed",
    }
}

/// Second line of an entry: the text involved
fn entry_text(diff: &Difference) -> String {
    let a = diff.text(Side::A).filter(|t| !t.trim().is_empty());
    let b = diff.text(Side::B).filter(|t| !t.trim().is_empty());
    match diff.kind {
        DiffKind::Modification => format!(
            "{} → {}",
            a.unwrap_or("no content"),
            b.unwrap_or("no content")
        ),
        DiffKind::Addition => b.or(a).unwrap_or("no content").to_string(),
        DiffKind::Deletion => a.or(b).unwrap_or("no content").to_string(),
    }
    .replace('\n', " ")
}

pub fn render_catalog(frame: &mut Frame, app: &mut App, area: Rect) {
    let focused = app.focus == Focus::Catalog;
    let counts = app.session.catalog().counts();
    let title = format!(" Differences ({}) ", counts.total());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(if focused {
            app.theme.border_active
        } else {
            app.theme.border
        }));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    app.catalog_tabs.clear();
    app.catalog_rows.clear();
    app.catalog_area = None;
    if inner.height < 3 || inner.width < 4 {
        return;
    }

    // Filter tabs
    let mut spans = Vec::new();
    let mut x = inner.x;
    for filter in TypeFilter::ALL {
        let label = format!(" {} {}", tab_label(filter), counts.for_filter(filter));
        let width = label.chars().count() as u16;
        if x + width > inner.right() {
            break;
        }
        let style = if app.query.filter == filter {
            Style::default()
                .fg(app.theme.paper)
                .bg(app.theme.primary)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text_muted)
        };
        app.catalog_tabs.push(((x, inner.y, width, 1), filter));
        spans.push(Span::styled(label, style));
        x += width;
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)),
        Rect::new(inner.x, inner.y, inner.width, 1),
    );

    // Search line
    let searching = app.input_mode == InputMode::Search;
    let search_line = if searching {
        Line::from(vec![
            Span::styled("/", Style::default().fg(app.theme.accent)),
            Span::styled(
                format!("{}▏", app.input_buffer),
                Style::default().fg(app.theme.text),
            ),
        ])
    } else if app.query.search.is_empty() {
        Line::from(Span::styled(
            "/ to search",
            Style::default().fg(app.theme.text_muted),
        ))
    } else {
        Line::from(vec![
            Span::styled("/", Style::default().fg(app.theme.accent)),
            Span::styled(app.query.search.clone(), Style::default().fg(app.theme.text)),
        ])
    };
    frame.render_widget(
        Paragraph::new(search_line),
        Rect::new(inner.x, inner.y + 1, inner.width, 1),
    );

    let list = Rect::new(inner.x, inner.y + 2, inner.width, inner.height - 2);
    app.catalog_area = Some((list.x, list.y, list.width, list.height));

    let visible = app.visible_entries();
    if visible.is_empty() {
        let message = if app.is_comparing() {
            "Comparing..."
        } else if app.session.catalog().is_empty() {
            match app.session.status() {
                CompareStatus::Done => "No differences found",
                _ => "Compare to list differences",
            }
        } else {
            "No matches"
        };
        frame.render_widget(
            Paragraph::new(Span::styled(
                message,
                Style::default().fg(app.theme.text_muted),
            )),
            list,
        );
        return;
    }

    let capacity = (list.height as usize / ENTRY_ROWS).max(1);
    if app.catalog_scroll > visible.len().saturating_sub(capacity) {
        app.catalog_scroll = visible.len().saturating_sub(capacity);
    }
    if focused {
        app.ensure_catalog_cursor_visible(capacity);
    }

    let active = app.session.active_index();
    let highlight = app.highlight_color();
    let width = list.width as usize;
    let mut lines = Vec::new();
    let mut rows = Vec::new();

    for (pos, &index) in visible
        .iter()
        .enumerate()
        .skip(app.catalog_scroll)
        .take(capacity)
    {
        let Some(diff) = app.session.catalog().get(index) else {
            continue;
        };
        let is_active = active == Some(index);
        let is_cursor = focused && pos == app.catalog_cursor;
        let mut base = Style::default();
        if is_active {
            base = base.bg(highlight);
        }
        if is_cursor {
            base = base.add_modifier(Modifier::REVERSED);
        }

        let symbol = gutter_symbol(diff.kind, Side::A);
        let page = format!("Page {}", diff.page_index + 1);
        let head = format!("{} {}", symbol, kind_title(diff.kind));
        let pad = width.saturating_sub(head.chars().count() + page.chars().count());
        let head_style = base
            .fg(app.theme.kind_color(diff.kind))
            .add_modifier(Modifier::BOLD);
        lines.push(Line::from(vec![
            Span::styled(head, head_style),
            Span::styled(" ".repeat(pad), base),
            Span::styled(page, base.fg(app.theme.text_muted)),
        ]));

        let text = truncate_to_width(&format!("  {}", entry_text(diff)), width);
        let text_pad = width.saturating_sub(unicode_width::UnicodeWidthStr::width(text.as_str()));
        lines.push(Line::from(vec![
            Span::styled(text, base.fg(app.theme.text)),
            Span::styled(" ".repeat(text_pad), base),
        ]));
        rows.push(Some(index));
        rows.push(Some(index));
    }

    app.catalog_rows = rows;
    frame.render_widget(Paragraph::new(lines), list);
}
