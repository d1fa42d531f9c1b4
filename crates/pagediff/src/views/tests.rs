use crate::app::{App, Focus, InputMode};
use crate::config::Config;
use crate::ui;
use pagediff_core::{ReportCompareBackend, Side};
use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const DOC: &str = r#"{"pages": [
    {"width": 400, "height": 600, "blocks": [[40, 100, 220, 120]]},
    {"width": 400, "height": 600}
]}"#;

const REPORT: &str = r#"{
    "document_info": {"a": {"total_height": 1200}, "b": {"total_height": 1200}},
    "differences": [
        {"page_index": 0, "type": "modification", "bbox_a": [40, 100, 200, 120],
         "bbox_b": [40, 100, 220, 120], "text_a": "old title", "text_b": "new title"},
        {"page_index": 1, "type": "addition", "bbox_a": null,
         "bbox_b": [40, 200, 240, 220], "text_a": null, "text_b": "added paragraph"},
        {"page_index": 0, "type": "deletion", "bbox_a": [40, 300, 300, 320],
         "bbox_b": null, "text_a": "removed line", "text_b": null}
    ]
}"#;

fn make_app(dir: &tempfile::TempDir) -> (App, PathBuf, PathBuf) {
    let write = |name: &str, content: &str| {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    };
    let a = write("a.json", DOC);
    let b = write("b.json", DOC);
    let report = write("report.json", REPORT);
    let app = App::new(&Config::default(), Arc::new(ReportCompareBackend::new(report)));
    (app, a, b)
}

fn compared_app(dir: &tempfile::TempDir) -> App {
    let (mut app, a, b) = make_app(dir);
    app.open_document(Side::A, &a);
    app.open_document(Side::B, &b);
    app.start_compare();
    let deadline = Instant::now() + Duration::from_secs(5);
    while app.is_comparing() && Instant::now() < deadline {
        app.tick();
        thread::sleep(Duration::from_millis(5));
    }
    assert!(!app.is_comparing(), "compare timed out");
    app
}

fn render_buffer(app: &mut App, width: u16, height: u16) -> Buffer {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).expect("terminal");
    terminal.draw(|frame| ui::draw(frame, app)).expect("draw");
    terminal.backend().buffer().clone()
}

fn buffer_text(buf: &Buffer) -> Vec<String> {
    let mut lines = Vec::new();
    for y in 0..buf.area.height {
        let mut line = String::new();
        for x in 0..buf.area.width {
            line.push_str(buf[(x, y)].symbol());
        }
        lines.push(line);
    }
    lines
}

#[test]
fn test_empty_session_render() {
    let dir = tempfile::tempdir().unwrap();
    let (mut app, _, _) = make_app(&dir);
    let text = buffer_text(&render_buffer(&mut app, 120, 30)).join("\n");

    assert!(text.contains("No document. Press 1 to open one."));
    assert!(text.contains("No document. Press 2 to open one."));
    assert!(text.contains("Differences (0)"));
    assert!(text.contains("Compare to list differences"));
    assert!(text.contains("IDLE"));
}

#[test]
fn test_catalog_lists_differences() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = compared_app(&dir);
    let text = buffer_text(&render_buffer(&mut app, 120, 30)).join("\n");

    assert!(text.contains("Differences (3)"));
    assert!(text.contains("All 3"));
    assert!(text.contains("Added 1"));
    assert!(text.contains("~ Text Changed"));
    assert!(text.contains("+ Text Added"));
    assert!(text.contains("- Text Deleted"));
    assert!(text.contains("old title → new title"));
    assert!(text.contains("Page 2"));
    assert!(text.contains("DONE"));
    assert!(text.contains("+1 -1 ~1"));
    assert_eq!(app.catalog_rows.len(), 6);
}

#[test]
fn test_catalog_empty_search() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = compared_app(&dir);
    app.begin_search();
    for c in "zzz".chars() {
        app.input_char(c);
    }
    let text = buffer_text(&render_buffer(&mut app, 120, 30)).join("\n");
    assert!(text.contains("No matches"));
    assert!(text.contains("/zzz"));
}

#[test]
fn test_gutter_markers_match_kinds() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = compared_app(&dir);
    let buf = render_buffer(&mut app, 120, 30);

    let markers = app.pane_hits[Side::A.index()].markers.clone();
    let area = app.pane_hits[Side::A.index()].area.expect("pane area");
    // A shows the modification and the deletion, not the B-only addition
    let indices: Vec<usize> = markers.iter().map(|(_, index)| *index).collect();
    assert_eq!(indices, vec![0, 2]);
    assert_eq!(buf[(area.0, markers[0].0)].symbol(), "~");
    assert_eq!(buf[(area.0, markers[1].0)].symbol(), "-");

    let b_markers = &app.pane_hits[Side::B.index()].markers;
    assert_eq!(b_markers.len(), 1);
    let b_area = app.pane_hits[Side::B.index()].area.expect("pane area");
    assert_eq!(buf[(b_area.0, b_markers[0].0)].symbol(), "~");
}

#[test]
fn test_active_difference_draws_outline() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = compared_app(&dir);
    render_buffer(&mut app, 120, 30);
    app.select_difference(0, Instant::now());
    let buf = render_buffer(&mut app, 120, 30);

    let overlays = &app.pane_hits[Side::A.index()].overlays;
    let (area, _) = overlays
        .iter()
        .find(|(_, index)| *index == 0)
        .copied()
        .expect("overlay for the active difference");
    assert_eq!(buf[(area.0, area.1)].symbol(), "█");
    // Only the preferred side flashes
    let (b_area, _) = app.pane_hits[Side::B.index()].overlays[0];
    assert_eq!(buf[(b_area.0, b_area.1)].symbol(), " ");

    let status = buffer_text(&buf).pop().unwrap_or_default();
    assert!(status.contains("file1-0-0"));
}

#[test]
fn test_click_catalog_row_selects() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = compared_app(&dir);
    render_buffer(&mut app, 120, 30);

    let (x, y, _, _) = app.catalog_area.expect("catalog area");
    // Third entry starts on the fifth list row
    app.click_at(x + 1, y + 4);
    assert_eq!(app.focus, Focus::Catalog);
    assert_eq!(app.session.active_index(), Some(2));

    let (tab_area, filter) = app.catalog_tabs[1];
    app.click_at(tab_area.0, tab_area.1);
    assert_eq!(app.query.filter, filter);
    assert_eq!(app.visible_entries(), vec![1]);
}

#[test]
fn test_click_gutter_marker_selects() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = compared_app(&dir);
    render_buffer(&mut app, 120, 30);

    let area = app.pane_hits[Side::A.index()].area.expect("pane area");
    let (row, index) = app.pane_hits[Side::A.index()].markers[1];
    app.click_at(area.0, row);
    assert_eq!(app.focus, Focus::Pane(Side::A));
    assert_eq!(app.session.active_index(), Some(index));
}

#[test]
fn test_narrow_terminal_hides_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = compared_app(&dir);
    let text = buffer_text(&render_buffer(&mut app, 70, 20)).join("\n");
    assert!(!text.contains("Differences ("));
    assert!(app.catalog_area.is_none());
}

#[test]
fn test_catalog_clicks_ignored_after_narrowing() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = compared_app(&dir);
    render_buffer(&mut app, 120, 30);
    let (x, y, _, _) = app.catalog_area.expect("catalog area");

    render_buffer(&mut app, 70, 30);
    assert!(app.catalog_area.is_none());
    assert!(app.catalog_rows.is_empty());
    app.click_at(x + 1, y);
    assert_eq!(app.session.active_index(), None);
    assert_ne!(app.focus, Focus::Catalog);
}

#[test]
fn test_help_popover() {
    let dir = tempfile::tempdir().unwrap();
    let (mut app, _, _) = make_app(&dir);
    app.toggle_help();
    let text = buffer_text(&render_buffer(&mut app, 120, 40)).join("\n");
    assert!(text.contains(" Help "));
    assert!(text.contains("Open document A/B"));
    assert!(text.contains("Cycle highlight color"));
}

#[test]
fn test_path_prompt_in_status_bar() {
    let dir = tempfile::tempdir().unwrap();
    let (mut app, _, _) = make_app(&dir);
    app.begin_path_input(Side::B);
    assert_eq!(app.input_mode, InputMode::Path(Side::B));
    for c in "x.pdf".chars() {
        app.input_char(c);
    }
    let status = buffer_text(&render_buffer(&mut app, 120, 30))
        .pop()
        .unwrap_or_default();
    assert!(status.contains("Open B: x.pdf"));
}

#[test]
fn test_failed_document_message() {
    let dir = tempfile::tempdir().unwrap();
    let (mut app, _, _) = make_app(&dir);
    app.open_document(Side::A, &dir.path().join("notes.txt"));
    let text = buffer_text(&render_buffer(&mut app, 120, 30)).join("\n");
    assert!(text.contains("Cannot display document"));
}

#[test]
fn test_pane_title_shows_page_and_zoom() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = compared_app(&dir);
    let text = buffer_text(&render_buffer(&mut app, 120, 30)).join("\n");
    assert!(text.contains("A · a.json"));
    assert!(text.contains("1/2 · 70%"));
}
