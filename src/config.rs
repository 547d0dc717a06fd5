use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::core::content::ContentSource;
use crate::core::renderer::RenderOptions;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub content: ContentConfig,
    pub tooltip: TooltipConfig,
    pub reveal: RevealConfig,
    pub page: PageConfig,
    pub features: FeatureFlags,
    pub logging: LoggingConfig,
}

/// Where the letter and the campaign data come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Cache key for the letter.
    pub letter_id: String,
    /// `embedded`, a file path, or an http(s) URL.
    pub letter_source: String,
    /// `embedded`, a file path, or an http(s) URL.
    pub knowledge_source: String,
    /// Keep successfully loaded letters in memory.
    pub cache: bool,
    /// Match reference identifiers regardless of case.
    pub case_insensitive_ids: bool,
}

/// How tooltips are triggered on this device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    #[default]
    Pointer,
    Touch,
}

/// Tooltip timings and geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TooltipConfig {
    /// Hover time before a tooltip appears.
    pub show_delay_ms: u64,
    /// Grace period before a tooltip disappears.
    pub hide_delay_ms: u64,
    /// Gap between the pointer/anchor and the tooltip, in pixels.
    pub position_offset: f64,
    pub max_width: f64,
    /// Long-press duration on touch screens.
    pub touch_hold_ms: u64,
    /// Auto-hide after the finger lifts.
    pub touch_auto_hide_ms: u64,
    pub input_mode: InputMode,
}

/// Scroll-triggered reveal animations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Visible fraction that triggers a reveal.
    pub threshold: f64,
    /// Delay per paragraph number.
    pub stagger_ms: u64,
    /// Delay between highlights inside one element.
    pub highlight_stagger_ms: u64,
    pub reduced_motion: bool,
    /// `kind:identifier` references that earn a highlight.
    pub highlight: Vec<String>,
}

/// Page chrome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub title: String,
    pub stylesheet: Option<String>,
    pub archive_name: String,
    pub session_label: String,
    pub container_id: String,
    pub loading_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub tooltips: bool,
    pub animations: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Override the default log directory.
    pub log_dir: Option<PathBuf>,
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            letter_id: "vellynne-session2".to_string(),
            letter_source: "embedded".to_string(),
            knowledge_source: "embedded".to_string(),
            cache: true,
            case_insensitive_ids: false,
        }
    }
}

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            show_delay_ms: 500,
            hide_delay_ms: 100,
            position_offset: 10.0,
            max_width: 320.0,
            touch_hold_ms: 800,
            touch_auto_hide_ms: 2000,
            input_mode: InputMode::Pointer,
        }
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            stagger_ms: 100,
            highlight_stagger_ms: 200,
            reduced_motion: false,
            highlight: vec![
                "item:netherese_stones".to_string(),
                "item:radiant_bracers".to_string(),
                "character:illithid".to_string(),
            ],
        }
    }
}

impl Default for PageConfig {
    fn default() -> Self {
        let render = RenderOptions::default();
        Self {
            title: "Letter from Vellynne Harpell".to_string(),
            stylesheet: Some("styles/main.css".to_string()),
            archive_name: render.archive_name,
            session_label: render.session_label,
            container_id: "app-container".to_string(),
            loading_id: "loading-indicator".to_string(),
        }
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            tooltips: true,
            animations: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            level: "info".to_string(),
        }
    }
}

impl ContentConfig {
    pub fn letter_source(&self) -> ContentSource {
        self.letter_source.parse().unwrap_or(ContentSource::Embedded)
    }

    pub fn knowledge_source(&self) -> ContentSource {
        self.knowledge_source.parse().unwrap_or(ContentSource::Embedded)
    }
}

impl TooltipConfig {
    pub fn show_delay(&self) -> Duration {
        Duration::from_millis(self.show_delay_ms)
    }

    pub fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.hide_delay_ms)
    }

    pub fn touch_hold(&self) -> Duration {
        Duration::from_millis(self.touch_hold_ms)
    }

    pub fn touch_auto_hide(&self) -> Duration {
        Duration::from_millis(self.touch_auto_hide_ms)
    }
}

impl PageConfig {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            archive_name: self.archive_name.clone(),
            session_label: self.session_label.clone(),
        }
    }
}

impl LoggingConfig {
    /// Resolved log directory (override or XDG data dir).
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("campaign-letter").join("logs"))
                .unwrap_or_else(|| PathBuf::from("logs"))
        })
    }
}

impl AppConfig {
    /// Load from `~/.config/campaign-letter/config.toml` plus `LETTER_*`
    /// environment variables. Returns `Default` if extraction fails.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match Self::figment(path).extract() {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Failed to load config at {}: {e} - using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Defaults, then the TOML file (if present), then the environment.
    /// Nested keys use a double underscore: `LETTER_TOOLTIP__SHOW_DELAY_MS`.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("LETTER_").split("__"))
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("campaign-letter").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("letter.toml"))
    }
}
