//! pagediff CLI - side-by-side document diff viewer TUI

mod app;
mod color;
mod config;
mod renderer;
mod ui;
mod views;

use anyhow::{Context, Result};
use app::{App, Focus};
use clap::Parser;
use config::ThemeMode;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, info};
use pagediff_core::{CompareBackend, HttpCompareBackend, ReportCompareBackend, Side};
use ratatui::prelude::*;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "pagediff")]
#[command(author, version, about = "A side-by-side visual diff viewer for paginated documents")]
struct Args {
    /// Documents to compare: document_a document_b
    #[arg(num_args = 0..=2)]
    paths: Vec<PathBuf>,

    /// Read differences from a saved compare response instead of the service
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Compare service endpoint
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// curl binary used to reach the service
    #[arg(long, value_name = "PATH")]
    curl: Option<PathBuf>,

    /// Save each finished compare response to this file
    #[arg(long, value_name = "FILE")]
    save_report: Option<PathBuf>,

    /// Run a comparison as soon as both documents are open
    #[arg(short, long)]
    compare: bool,

    /// Start with scroll sync off
    #[arg(long)]
    no_sync: bool,

    /// Log file (default: cache dir)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Log level: off, error, warn, info, debug or trace
    #[arg(long)]
    log_level: Option<String>,

    /// Theme mode: dark or light
    #[arg(long, value_enum)]
    theme_mode: Option<CliThemeMode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum CliThemeMode {
    Dark,
    Light,
}

impl From<CliThemeMode> for ThemeMode {
    fn from(mode: CliThemeMode) -> Self {
        match mode {
            CliThemeMode::Dark => ThemeMode::Dark,
            CliThemeMode::Light => ThemeMode::Light,
        }
    }
}

fn init_logging(config: &config::Config) -> Result<()> {
    let level = config.log.level_filter();
    if level == log::LevelFilter::Off {
        return Ok(());
    }
    let Some(path) = config.log_path() else {
        return Ok(());
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }
    let file = File::create(&path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    simplelog::WriteLogger::init(level, simplelog::Config::default(), file)
        .context("Failed to initialize logging")?;
    Ok(())
}

fn build_backend(args: &Args, config: &config::Config) -> Arc<dyn CompareBackend> {
    if let Some(report) = &args.report {
        return Arc::new(ReportCompareBackend::new(report.clone()));
    }
    let endpoint = args
        .endpoint
        .clone()
        .unwrap_or_else(|| config.service.endpoint.clone());
    let curl = args
        .curl
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.service.curl));
    let mut backend = HttpCompareBackend::new(endpoint).with_curl(curl);
    if config.service.timeout_seconds > 0 {
        backend = backend.with_timeout(Duration::from_secs(config.service.timeout_seconds));
    }
    Arc::new(backend)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = config::Config::load();

    // CLI overrides config
    if let Some(mode) = args.theme_mode {
        config.ui.theme_mode = mode.into();
    }
    if args.no_sync {
        config.ui.sync_scroll = false;
    }
    if let Some(file) = &args.log_file {
        config.log.file = Some(file.clone());
    }
    if let Some(level) = &args.log_level {
        if config::parse_level(level).is_none() {
            anyhow::bail!("Unknown log level: {}", level);
        }
        config.log.level = level.clone();
    }
    for path in &args.paths {
        if !path.exists() {
            anyhow::bail!("No such document: {}", path.display());
        }
    }

    init_logging(&config)?;
    info!("Starting pagediff {}", env!("CARGO_PKG_VERSION"));

    let backend = build_backend(&args, &config);
    let mut app = App::new(&config, backend);
    app.save_report = args.save_report.clone();
    for (path, side) in args.paths.iter().zip(Side::BOTH) {
        app.open_document(side, path);
    }
    if args.compare {
        app.start_compare();
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        error!("Application error: {:?}", err);
        eprintln!("Error: {}", err);
        return Err(err);
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let tick_rate = Duration::from_millis(16);

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Mouse(me) => {
                    if app.show_help {
                        continue;
                    }
                    match me.kind {
                        MouseEventKind::ScrollUp => app.scroll_at(me.column, me.row, false),
                        MouseEventKind::ScrollDown => app.scroll_at(me.column, me.row, true),
                        MouseEventKind::Down(MouseButton::Left) => app.click_at(me.column, me.row),
                        _ => {}
                    }
                }
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.show_help {
                        handle_help_key(app, key);
                    } else if app.is_editing() {
                        handle_input_key(app, key);
                    } else {
                        handle_key(app, key);
                    }
                }
                _ => {}
            }
        }

        app.tick();

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_help_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => app.toggle_help(),
        KeyCode::Down | KeyCode::Char('j') => app.help_scroll_down(),
        KeyCode::Up | KeyCode::Char('k') => app.help_scroll_up(),
        _ => {}
    }
}

fn handle_input_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_input(),
        KeyCode::Enter => app.submit_input(),
        KeyCode::Backspace => app.input_backspace(),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => app.input_clear(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.cancel_input(),
        KeyCode::Char(c) => app.input_char(c),
        _ => {}
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let in_catalog = app.focus == Focus::Catalog;
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc => app.session.clear_active(),
        KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Char('1') => app.begin_path_input(Side::A),
        KeyCode::Char('2') => app.begin_path_input(Side::B),
        KeyCode::Char('c') => app.start_compare(),
        KeyCode::Char('C') => app.cycle_highlight(),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }
        KeyCode::Char('d') => app.toggle_catalog(),
        KeyCode::Tab => app.cycle_filter(),
        KeyCode::Char('/') => app.begin_search(),
        KeyCode::Char('n') => app.next_difference(),
        KeyCode::Char('N') => app.prev_difference(),
        KeyCode::Enter if in_catalog => app.activate_catalog_cursor(),
        KeyCode::Down | KeyCode::Char('j') if in_catalog => app.catalog_cursor_down(),
        KeyCode::Up | KeyCode::Char('k') if in_catalog => app.catalog_cursor_up(),
        KeyCode::Home | KeyCode::Char('g') if in_catalog => app.catalog_cursor_first(),
        KeyCode::End | KeyCode::Char('G') if in_catalog => app.catalog_cursor_last(),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),
        KeyCode::PageDown => app.scroll_half_page_down(),
        KeyCode::PageUp => app.scroll_half_page_up(),
        KeyCode::Home | KeyCode::Char('g') => app.scroll_to_top(),
        KeyCode::End | KeyCode::Char('G') => app.scroll_to_bottom(),
        KeyCode::Left | KeyCode::Char('h') => app.focus_left(),
        KeyCode::Right | KeyCode::Char('l') => app.focus_right(),
        KeyCode::Char('+') => app.zoom_in(),
        KeyCode::Char('-') => app.zoom_out(),
        KeyCode::Char('=') => app.zoom_reset(),
        KeyCode::Char('s') => app.toggle_sync(),
        _ => {}
    }
}
