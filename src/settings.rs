use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use crate::layout::{
    DEFAULT_OVERSCAN, LayoutConfig, MeasurementCache, PageMeta, SizeEstimator,
};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "scrollfolio";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Size assumed for pages whose metadata has not arrived
    #[serde(default = "default_placeholder_width")]
    pub placeholder_width: f64,

    #[serde(default = "default_placeholder_height")]
    pub placeholder_height: f64,

    /// Padding and caption added to every slot
    #[serde(default = "default_slot_chrome")]
    pub slot_chrome: f64,

    /// Horizontal space reserved around the page column
    #[serde(default = "default_gutter")]
    pub gutter: f64,

    #[serde(default = "default_min_page_width")]
    pub min_page_width: f64,

    #[serde(default = "default_max_page_width")]
    pub max_page_width: f64,

    #[serde(default = "default_overscan")]
    pub overscan: usize,

    #[serde(default = "default_zoom")]
    pub default_zoom: f64,

    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,

    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,

    #[serde(default = "default_measurement_cache_size")]
    pub measurement_cache_size: usize,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_placeholder_width() -> f64 {
    SizeEstimator::DEFAULT_PLACEHOLDER.width
}

fn default_placeholder_height() -> f64 {
    SizeEstimator::DEFAULT_PLACEHOLDER.height
}

fn default_slot_chrome() -> f64 {
    SizeEstimator::DEFAULT_CHROME
}

fn default_gutter() -> f64 {
    SizeEstimator::DEFAULT_GUTTER
}

fn default_min_page_width() -> f64 {
    SizeEstimator::DEFAULT_MIN_PAGE_WIDTH
}

fn default_max_page_width() -> f64 {
    SizeEstimator::DEFAULT_MAX_PAGE_WIDTH
}

fn default_overscan() -> usize {
    DEFAULT_OVERSCAN
}

fn default_zoom() -> f64 {
    1.0
}

fn default_min_zoom() -> f64 {
    0.6
}

fn default_max_zoom() -> f64 {
    2.0
}

fn default_measurement_cache_size() -> usize {
    MeasurementCache::DEFAULT_CAPACITY
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            placeholder_width: default_placeholder_width(),
            placeholder_height: default_placeholder_height(),
            slot_chrome: default_slot_chrome(),
            gutter: default_gutter(),
            min_page_width: default_min_page_width(),
            max_page_width: default_max_page_width(),
            overscan: default_overscan(),
            default_zoom: default_zoom(),
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
            measurement_cache_size: default_measurement_cache_size(),
        }
    }
}

impl Settings {
    /// Engine configuration with out-of-range values replaced by defaults
    pub fn layout_config(&self) -> LayoutConfig {
        let defaults = Self::default();
        let positive = |value: f64, fallback: f64| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };

        let placeholder = PageMeta::new(
            positive(self.placeholder_width, defaults.placeholder_width),
            positive(self.placeholder_height, defaults.placeholder_height),
        );
        let slot_chrome = if self.slot_chrome.is_finite() && self.slot_chrome >= 0.0 {
            self.slot_chrome
        } else {
            defaults.slot_chrome
        };
        let gutter = if self.gutter.is_finite() && self.gutter >= 0.0 {
            self.gutter
        } else {
            defaults.gutter
        };

        let mut min_page_width = positive(self.min_page_width, defaults.min_page_width);
        let mut max_page_width = positive(self.max_page_width, defaults.max_page_width);
        if min_page_width > max_page_width {
            warn!(
                "min_page_width {min_page_width} exceeds max_page_width {max_page_width}, swapping"
            );
            std::mem::swap(&mut min_page_width, &mut max_page_width);
        }

        let mut min_zoom = positive(self.min_zoom, defaults.min_zoom);
        let mut max_zoom = positive(self.max_zoom, defaults.max_zoom);
        if min_zoom > max_zoom {
            warn!("min_zoom {min_zoom} exceeds max_zoom {max_zoom}, swapping");
            std::mem::swap(&mut min_zoom, &mut max_zoom);
        }
        let default_zoom =
            positive(self.default_zoom, defaults.default_zoom).clamp(min_zoom, max_zoom);

        LayoutConfig {
            estimator: SizeEstimator {
                chrome: slot_chrome,
                gutter,
                min_page_width,
                max_page_width,
                placeholder,
            },
            overscan: self.overscan,
            default_zoom,
            min_zoom,
            max_zoom,
            measurement_cache_size: self.measurement_cache_size.max(1),
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

pub fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from the config directory, writing defaults if absent
pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };

    if path.exists() {
        load_settings_into_global(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

/// Load an explicit settings file into the global settings
pub fn load_settings_into_global(path: &Path) {
    if let Some(settings) = load_settings_from_path(path) {
        if let Ok(mut global) = SETTINGS.write() {
            *global = settings;
        }
    }
}

/// Read and migrate a settings file. Returns `None` if it cannot be used.
pub fn load_settings_from_path(path: &Path) -> Option<Settings> {
    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }
                Some(settings)
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
                None
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
            None
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    settings.version = CURRENT_VERSION;
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = generate_settings_yaml(settings);

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::new();

    content.push_str(&format!("version: {}\n", settings.version));
    content.push('\n');
    content.push_str(LAYOUT_TEMPLATE);
    content.push_str(&format!(
        "placeholder_width: {:?}\n",
        settings.placeholder_width
    ));
    content.push_str(&format!(
        "placeholder_height: {:?}\n",
        settings.placeholder_height
    ));
    content.push_str(&format!("slot_chrome: {:?}\n", settings.slot_chrome));
    content.push_str(&format!("gutter: {:?}\n", settings.gutter));
    content.push_str(&format!("min_page_width: {:?}\n", settings.min_page_width));
    content.push_str(&format!("max_page_width: {:?}\n", settings.max_page_width));
    content.push_str(&format!("overscan: {}\n", settings.overscan));
    content.push('\n');
    content.push_str(ZOOM_TEMPLATE);
    content.push_str(&format!("default_zoom: {:?}\n", settings.default_zoom));
    content.push_str(&format!("min_zoom: {:?}\n", settings.min_zoom));
    content.push_str(&format!("max_zoom: {:?}\n", settings.max_zoom));
    content.push('\n');
    content.push_str(&format!(
        "measurement_cache_size: {}\n",
        settings.measurement_cache_size
    ));

    content
}

const LAYOUT_TEMPLATE: &str = r#"# ============================================================================
# Page layout
# ============================================================================
# Sizes are in pixels at 100% zoom. Pages are fitted into a column of
# (viewport width - gutter), clamped to [min_page_width, max_page_width].
# Each slot is the fitted page height plus slot_chrome.
"#;

const ZOOM_TEMPLATE: &str = r#"# Zoom factors, 1.0 = 100%
"#;

// Public API for accessing settings

pub fn current_settings() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}

pub fn layout_config() -> LayoutConfig {
    current_settings().layout_config()
}
