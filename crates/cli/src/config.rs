use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use engine::StyleControls;
use serde::Deserialize;

const APP_DIR: &str = "karaoke";
const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// Settings read from `config.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub projects_dir: Option<PathBuf>,
    pub frame_rate: f64,
    pub max_words: u32,
    /// Style applied to projects that leave a control unset.
    pub style: StyleControls,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            projects_dir: None,
            frame_rate: DEFAULT_FRAME_RATE,
            max_words: 0,
            style: StyleControls::default(),
        }
    }
}

impl Config {
    /// Loads `path`, or the user config file when no path is given.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::load_from_path(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config at {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("parsing config at {}", path.display()))?;
        Ok(config)
    }

    /// Directory holding the project library.
    pub fn projects_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.projects_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir().context("Unable to determine user data directory")?;
        Ok(data_dir.join(APP_DIR).join("projects"))
    }

    /// Fills controls the project leaves unset with the configured ones.
    pub fn style_for(&self, project: &StyleControls) -> StyleControls {
        let fallback = &self.style;
        StyleControls {
            font_family: project.font_family.clone().or_else(|| fallback.font_family.clone()),
            font_size_px: project.font_size_px.or(fallback.font_size_px),
            done_color: project.done_color.clone().or_else(|| fallback.done_color.clone()),
            rest_color: project.rest_color.clone().or_else(|| fallback.rest_color.clone()),
            background_color: project
                .background_color
                .clone()
                .or_else(|| fallback.background_color.clone()),
            background_opacity: project.background_opacity.or(fallback.background_opacity),
            border_on: project.border_on.or(fallback.border_on),
            border_color: project.border_color.clone().or_else(|| fallback.border_color.clone()),
            border_width: project.border_width.or(fallback.border_width),
            shadow_on: project.shadow_on.or(fallback.shadow_on),
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}
