use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::signature::{MAX_CANVAS_SIDE, Rgb};

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub preview: PreviewConfig,
    pub signature: SignatureConfig,
    pub signatures: StoreConfig,
    pub keymap: KeymapConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PreviewConfig {
    /// Zoom factor used to rasterize a page for placement.
    pub zoom: f32,
    pub cache_entries: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            zoom: 1.5,
            cache_entries: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SignatureConfig {
    pub default_width: u32,
    pub min_width: u32,
    pub max_width: u32,
    pub width_step: u32,
    pub stroke_width: f32,
    pub stroke_color: String,
    /// Canvas size for strokes files that do not state their own.
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            default_width: 150,
            min_width: 50,
            max_width: 400,
            width_step: 10,
            stroke_width: 3.0,
            stroke_color: "#1A237E".to_string(),
            canvas_width: 350,
            canvas_height: 150,
        }
    }
}

impl SignatureConfig {
    pub fn clamp_width(&self, width: u32) -> u32 {
        width.clamp(self.min_width, self.max_width)
    }

    pub fn stroke_rgb(&self) -> Rgb {
        Rgb::parse_hex(&self.stroke_color).unwrap_or(Rgb::DEFAULT_INK)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct StoreConfig {
    pub directory: Option<PathBuf>,
}

impl StoreConfig {
    pub fn resolved_directory(&self) -> AppResult<PathBuf> {
        if let Some(directory) = self.directory.as_ref()
            && !directory.as_os_str().is_empty()
        {
            return Ok(directory.clone());
        }
        default_signatures_dir().ok_or_else(|| {
            AppError::invalid_argument(
                "cannot locate a data directory; set [signatures] directory in the config",
            )
        })
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KeymapConfig {
    pub preset: String,
}

impl Default for KeymapConfig {
    fn default() -> Self {
        Self {
            preset: "default".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> AppResult<Self> {
        let Some(path) = default_config_path() else {
            return Ok(Self::default());
        };
        Self::load_from_path(path)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        if !path.is_file() {
            return Err(AppError::invalid_argument(format!(
                "config path is not a regular file: {}",
                path.display()
            )));
        }

        let raw = fs::read_to_string(path).map_err(|source| {
            AppError::io_with_context(source, format!("failed to read config: {}", path.display()))
        })?;
        let parsed = toml::from_str::<Self>(&raw).map_err(|source| {
            AppError::invalid_argument(format!(
                "failed to parse config {}: {source}",
                path.display()
            ))
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(parsed.sanitized())
    }

    fn sanitized(mut self) -> Self {
        if !self.preview.zoom.is_finite() || self.preview.zoom <= 0.0 {
            self.preview.zoom = PreviewConfig::default().zoom;
        }
        self.preview.cache_entries = self.preview.cache_entries.max(1);

        let defaults = SignatureConfig::default();
        let signature = &mut self.signature;
        signature.min_width = signature.min_width.max(1);
        if signature.max_width < signature.min_width {
            signature.max_width = signature.min_width;
        }
        signature.default_width = signature
            .default_width
            .clamp(signature.min_width, signature.max_width);
        signature.width_step = signature.width_step.max(1);
        if !signature.stroke_width.is_finite() || signature.stroke_width <= 0.0 {
            signature.stroke_width = defaults.stroke_width;
        }
        if Rgb::parse_hex(&signature.stroke_color).is_none() {
            signature.stroke_color = defaults.stroke_color;
        }
        signature.canvas_width = signature.canvas_width.clamp(1, MAX_CANVAS_SIDE);
        signature.canvas_height = signature.canvas_height.clamp(1, MAX_CANVAS_SIDE);
        self
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    if let Some(explicit) = std::env::var_os("PSIG_CONFIG_PATH")
        && !explicit.is_empty()
    {
        return Some(PathBuf::from(explicit));
    }

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME")
        && !xdg.is_empty()
    {
        return Some(PathBuf::from(xdg).join("psig").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME")
        && !home.is_empty()
    {
        return Some(
            PathBuf::from(home)
                .join(".config")
                .join("psig")
                .join("config.toml"),
        );
    }
    if let Some(appdata) = std::env::var_os("APPDATA")
        && !appdata.is_empty()
    {
        return Some(PathBuf::from(appdata).join("psig").join("config.toml"));
    }
    None
}

pub fn default_signatures_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME")
        && !xdg.is_empty()
    {
        return Some(PathBuf::from(xdg).join("psig").join("signatures"));
    }
    if let Some(home) = std::env::var_os("HOME")
        && !home.is_empty()
    {
        return Some(
            PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("psig")
                .join("signatures"),
        );
    }
    if let Some(appdata) = std::env::var_os("APPDATA")
        && !appdata.is_empty()
    {
        return Some(PathBuf::from(appdata).join("psig").join("signatures"));
    }
    None
}
