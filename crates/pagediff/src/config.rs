//! Configuration file support for pagediff
//!
//! Config file location: `~/.config/pagediff/config.toml` (XDG_CONFIG_HOME)
//!
//! Example config:
//! ```toml
//! [ui]
//! highlight_color = "#007bff"
//! palette = ["#007bff", "#ff9800", "#2ecc71"]
//! catalog_visible = true
//! sync_scroll = true
//! cell_width_px = 8
//! cell_height_px = 16
//!
//! [ui.theme.defs]
//! paper = "#fdf6e3"
//!
//! [ui.theme.theme.paper]
//! dark = "#d8d8d8"
//! light = "paper"
//!
//! [navigation]
//! flash_seconds = 5
//! prefer_side = "a"
//! align = "page-top"
//!
//! [service]
//! endpoint = "http://localhost:8000/compare"
//!
//! [log]
//! level = "info"
//! ```

use crate::color;
use anyhow::{Context, Result};
use log::LevelFilter;
use pagediff_core::session::DEFAULT_SCROLLBAR_GUTTER;
use pagediff_core::{NavigationOptions, ScrollAlign, SessionOptions, Side, DEFAULT_ENDPOINT};
use ratatui::style::Color;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Theme Configuration
// ============================================================================

/// Dark/light color pair for a theme token
#[derive(Debug, Clone, Deserialize)]
pub struct DarkLight {
    pub dark: String,
    #[serde(default)]
    pub light: Option<String>,
}

/// Theme tokens
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ThemeTokens {
    pub text: Option<DarkLight>,
    pub text_muted: Option<DarkLight>,
    pub primary: Option<DarkLight>,
    pub accent: Option<DarkLight>,
    pub error: Option<DarkLight>,
    pub warning: Option<DarkLight>,
    pub success: Option<DarkLight>,
    pub border: Option<DarkLight>,
    pub border_active: Option<DarkLight>,
    /// Blank page cells
    pub paper: Option<DarkLight>,
    /// Fully inked page cells
    pub ink: Option<DarkLight>,
    pub diff_added: Option<DarkLight>,
    pub diff_removed: Option<DarkLight>,
    pub diff_modified: Option<DarkLight>,
    /// Outline of the flashing highlight
    pub flash: Option<DarkLight>,
}

/// Theme configuration (defs + tokens)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Named color definitions (e.g., paper = "#fdf6e3")
    pub defs: HashMap<String, String>,
    pub theme: ThemeTokens,
}

/// Resolved theme, all ratatui Colors ready to use
#[derive(Debug, Clone)]
pub struct ResolvedTheme {
    pub text: Color,
    pub text_muted: Color,
    pub primary: Color,
    pub accent: Color,

    pub error: Color,
    pub warning: Color,
    pub success: Color,

    pub border: Color,
    pub border_active: Color,

    pub paper: Color,
    pub ink: Color,

    pub diff_added: Color,
    pub diff_removed: Color,
    pub diff_modified: Color,
    pub flash: Color,
}

impl ResolvedTheme {
    pub fn kind_color(&self, kind: pagediff_core::DiffKind) -> Color {
        match kind {
            pagediff_core::DiffKind::Addition => self.diff_added,
            pagediff_core::DiffKind::Deletion => self.diff_removed,
            pagediff_core::DiffKind::Modification => self.diff_modified,
        }
    }
}

impl Default for ResolvedTheme {
    fn default() -> Self {
        ThemeConfig::default().resolve(false)
    }
}

impl ThemeConfig {
    /// Resolve theme config to concrete colors.
    /// In light mode `.light` values win, falling back to `.dark`.
    pub fn resolve(&self, light_mode: bool) -> ResolvedTheme {
        let defs = &self.defs;
        let tokens = &self.theme;

        let resolve = |token: &Option<DarkLight>, fallback: Color| -> Color {
            token
                .as_ref()
                .and_then(|dl| {
                    if light_mode {
                        dl.light
                            .as_ref()
                            .and_then(|v| color::resolve_color(v, defs))
                            .or_else(|| color::resolve_color(&dl.dark, defs))
                    } else {
                        color::resolve_color(&dl.dark, defs)
                    }
                })
                .unwrap_or(fallback)
        };

        // Pages stay paper-colored in both modes; dark mode dims them a little
        let (paper, ink) = if light_mode {
            (Color::Rgb(255, 255, 255), Color::Rgb(20, 20, 20))
        } else {
            (Color::Rgb(216, 216, 216), Color::Rgb(24, 24, 24))
        };

        ResolvedTheme {
            text: resolve(&tokens.text, Color::Reset),
            text_muted: resolve(&tokens.text_muted, Color::DarkGray),
            primary: resolve(&tokens.primary, Color::Cyan),
            accent: resolve(&tokens.accent, Color::Cyan),

            error: resolve(&tokens.error, Color::Red),
            warning: resolve(&tokens.warning, Color::Yellow),
            success: resolve(&tokens.success, Color::Green),

            border: resolve(&tokens.border, Color::DarkGray),
            border_active: resolve(&tokens.border_active, Color::Gray),

            paper: resolve(&tokens.paper, paper),
            ink: resolve(&tokens.ink, ink),

            diff_added: resolve(&tokens.diff_added, Color::Green),
            diff_removed: resolve(&tokens.diff_removed, Color::Red),
            diff_modified: resolve(&tokens.diff_modified, Color::Yellow),
            flash: resolve(&tokens.flash, Color::Rgb(255, 0, 0)),
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Theme mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

/// UI configuration
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Initial highlight color (hex, def name or ANSI name)
    pub highlight_color: String,
    /// Colors cycled with `C`
    pub palette: Vec<String>,
    /// Show the difference catalog on start
    pub catalog_visible: bool,
    /// Mirror scrolling between the panes
    pub sync_scroll: bool,
    /// Pixel size of one terminal cell
    pub cell_width_px: f64,
    pub cell_height_px: f64,
    /// Oversampling of page rasters
    pub device_pixel_ratio: f64,
    /// Width reserved for the scrollbar when fitting pages
    pub scrollbar_gutter_px: f64,
    pub theme_mode: ThemeMode,
    pub theme: ThemeConfig,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            highlight_color: color::DEFAULT_PALETTE[0].to_string(),
            palette: color::DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            catalog_visible: true,
            sync_scroll: true,
            cell_width_px: 8.0,
            cell_height_px: 16.0,
            device_pixel_ratio: 1.0,
            scrollbar_gutter_px: DEFAULT_SCROLLBAR_GUTTER,
            theme_mode: ThemeMode::Dark,
            theme: ThemeConfig::default(),
        }
    }
}

/// Difference navigation
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// How long a selected difference stays highlighted
    pub flash_seconds: f64,
    /// Side whose box gets the flashing outline: "a" or "b"
    pub prefer_side: String,
    /// "page-top" or "box-top"
    pub align: ScrollAlign,
    /// Space above the box with `align = "box-top"`
    pub align_margin_px: f64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        let defaults = NavigationOptions::default();
        Self {
            flash_seconds: defaults.flash.as_secs_f64(),
            prefer_side: "a".to_string(),
            align: defaults.align,
            align_margin_px: defaults.align_margin,
        }
    }
}

impl NavigationConfig {
    pub fn prefer_side(&self) -> Side {
        match self.prefer_side.trim().to_ascii_lowercase().as_str() {
            "b" | "file2" | "right" => Side::B,
            _ => Side::A,
        }
    }

    pub fn options(&self) -> NavigationOptions {
        let flash = if self.flash_seconds.is_finite() && self.flash_seconds > 0.0 {
            Duration::from_secs_f64(self.flash_seconds)
        } else {
            NavigationOptions::default().flash
        };
        NavigationOptions {
            flash,
            prefer_side: self.prefer_side(),
            align: self.align,
            align_margin: self.align_margin_px.max(0.0),
        }
    }
}

/// Compare service
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub endpoint: String,
    /// curl binary used for requests
    pub curl: String,
    /// Request timeout in seconds (0 = none)
    pub timeout_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            curl: "curl".to_string(),
            timeout_seconds: 0,
        }
    }
}

/// Log file
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// off, error, warn, info, debug or trace
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LogConfig {
    pub fn level_filter(&self) -> LevelFilter {
        parse_level(&self.level).unwrap_or(LevelFilter::Info)
    }
}

pub fn parse_level(value: &str) -> Option<LevelFilter> {
    value.trim().parse().ok()
}

/// Root configuration
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub ui: UiConfig,
    pub navigation: NavigationConfig,
    pub service: ServiceConfig,
    pub log: LogConfig,
}

impl Config {
    /// Get all possible config file paths in priority order
    fn config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg).join("pagediff").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".config").join("pagediff").join("config.toml"));
        }

        // Platform-specific config dir (~/Library/Application Support on macOS)
        if let Some(config_dir) = dirs::config_dir() {
            let platform_path = config_dir.join("pagediff").join("config.toml");
            if !paths.contains(&platform_path) {
                paths.push(platform_path);
            }
        }

        paths
    }

    /// Get the first existing config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_paths().into_iter().find(|p| p.exists())
    }

    /// Read and parse one config file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load config from the XDG config path.
    /// Returns default config if the file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        Self::from_path(&path).unwrap_or_else(|e| {
            eprintln!("Warning: {:#}", e);
            Self::default()
        })
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            scrollbar_gutter: self.ui.scrollbar_gutter_px.max(0.0),
            sync_scroll: self.ui.sync_scroll,
            navigation: self.navigation.options(),
        }
    }

    pub fn resolve_theme(&self) -> ResolvedTheme {
        self.ui.theme.resolve(self.ui.theme_mode == ThemeMode::Light)
    }

    pub fn palette(&self) -> color::Palette {
        color::Palette::new(&self.ui.palette, Some(&self.ui.highlight_color))
    }

    /// Log file location: configured, else the cache dir
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log.file.clone().or_else(|| {
            dirs::cache_dir().map(|dir| dir.join("pagediff").join("pagediff.log"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.ui.highlight_color, "#007bff");
        assert!(config.ui.catalog_visible);
        assert_eq!(config.service.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.log.level_filter(), LevelFilter::Info);

        let options = config.session_options();
        assert!(options.sync_scroll);
        assert_eq!(options.scrollbar_gutter, DEFAULT_SCROLLBAR_GUTTER);
        assert_eq!(options.navigation.flash, Duration::from_secs(5));
        assert_eq!(options.navigation.prefer_side, Side::A);
    }

    #[test]
    fn test_parse_sections() {
        let config: Config = toml::from_str(
            r##"
            [ui]
            highlight_color = "#ff9800"
            sync_scroll = false
            cell_width_px = 10
            theme_mode = "light"

            [navigation]
            flash_seconds = 2.5
            prefer_side = "file2"
            align = "box-top"
            align_margin_px = 24

            [service]
            endpoint = "http://diff.internal:9000/compare"

            [log]
            level = "debug"
            "##,
        )
        .unwrap();

        assert_eq!(config.ui.cell_width_px, 10.0);
        assert_eq!(config.ui.cell_height_px, 16.0);
        assert_eq!(config.ui.theme_mode, ThemeMode::Light);
        assert_eq!(config.log.level_filter(), LevelFilter::Debug);

        let options = config.session_options();
        assert!(!options.sync_scroll);
        assert_eq!(options.navigation.flash, Duration::from_millis(2500));
        assert_eq!(options.navigation.prefer_side, Side::B);
        assert_eq!(options.navigation.align, ScrollAlign::BoxTop);
        assert_eq!(options.navigation.align_margin, 24.0);
        assert_eq!(config.palette().current(), Color::Rgb(255, 152, 0));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config: Config = toml::from_str(
            r#"
            [navigation]
            flash_seconds = -1
            prefer_side = "middle"

            [log]
            level = "loud"
            "#,
        )
        .unwrap();
        let options = config.navigation.options();
        assert_eq!(options.flash, Duration::from_secs(5));
        assert_eq!(options.prefer_side, Side::A);
        assert_eq!(config.log.level_filter(), LevelFilter::Info);
    }

    #[test]
    fn test_theme_tokens_and_defs() {
        let config: Config = toml::from_str(
            r##"
            [ui.theme.defs]
            sepia = "#fdf6e3"

            [ui.theme.theme.paper]
            dark = "#202020"
            light = "sepia"

            [ui.theme.theme.diffAdded]
            dark = "light-green"
            "##,
        )
        .unwrap();
        let dark = config.ui.theme.resolve(false);
        assert_eq!(dark.paper, Color::Rgb(32, 32, 32));
        assert_eq!(dark.diff_added, Color::LightGreen);
        assert_eq!(dark.kind_color(pagediff_core::DiffKind::Deletion), Color::Red);

        let light = config.ui.theme.resolve(true);
        assert_eq!(light.paper, Color::Rgb(253, 246, 227));
        // No light value: falls back to dark
        assert_eq!(light.diff_added, Color::LightGreen);
    }

    #[test]
    fn test_from_path_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("config.toml");
        std::fs::write(&good, "[ui]\ncatalog_visible = false\n").unwrap();
        assert!(!Config::from_path(&good).unwrap().ui.catalog_visible);

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[ui\n").unwrap();
        let err = Config::from_path(&bad).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse"));

        assert!(Config::from_path(&dir.path().join("missing.toml")).is_err());
    }
}
