use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::content::Language;
use crate::controller::DEFAULT_AUTOPLAY_INTERVAL;
use crate::export::document::{DEFAULT_JPEG_QUALITY, DEFAULT_SETTLE};
use crate::export::pdf::PageUnit;
use crate::export::video::{DEFAULT_DWELL, DEFAULT_FPS, MAX_FPS};

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "invitedeck";

const VALID_KEYS: &str = "defaults.language, defaults.autoplay, defaults.autoplay_interval_secs, \
    defaults.content, defaults.fonts_dir, export.output_dir, export.page_unit, export.settle_ms, \
    export.jpeg_quality, video.output_dir, video.dwell_ms, video.fps";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoplay: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoplay_interval_secs: Option<u64>,

    /// Replacement content table (YAML).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<PathBuf>,

    /// Extra fonts loaded in addition to the system fonts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fonts_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_unit: Option<PageUnit>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jpeg_quality: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dwell_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("No config found. Run `invitedeck config show` to see defaults.")
            } else {
                anyhow::anyhow!("Failed to read config: {e}")
            }
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!(error = %e, "using default configuration");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let contents =
            format!("# invitedeck configuration - https://github.com/mklab-se/invitedeck\n{yaml}");
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "defaults.language" => {
                let Some(language) = Language::from_code(value) else {
                    anyhow::bail!("Invalid language: {value}. Must be 'en' or 'ld'.");
                };
                self.defaults_mut().language = Some(language);
            }
            "defaults.autoplay" => {
                let on = match value {
                    "true" | "on" | "yes" => true,
                    "false" | "off" | "no" => false,
                    _ => anyhow::bail!("Invalid autoplay: {value}. Must be 'true' or 'false'."),
                };
                self.defaults_mut().autoplay = Some(on);
            }
            "defaults.autoplay_interval_secs" => {
                let secs = parse_positive(key, value)?;
                self.defaults_mut().autoplay_interval_secs = Some(secs);
            }
            "defaults.content" => {
                self.defaults_mut().content = Some(PathBuf::from(value));
            }
            "defaults.fonts_dir" => {
                self.defaults_mut().fonts_dir = Some(PathBuf::from(value));
            }
            "export.output_dir" => {
                self.export_mut().output_dir = Some(PathBuf::from(value));
            }
            "export.page_unit" => {
                let Some(unit) = PageUnit::from_name(value) else {
                    anyhow::bail!("Invalid page unit: {value}. Must be 'pt' or 'mm'.");
                };
                self.export_mut().page_unit = Some(unit);
            }
            "export.settle_ms" => {
                let ms = value.parse::<u64>().map_err(|_| {
                    anyhow::anyhow!("Invalid settle_ms: {value}. Must be a number of milliseconds.")
                })?;
                self.export_mut().settle_ms = Some(ms);
            }
            "export.jpeg_quality" => {
                let quality = match value.parse::<u8>() {
                    Ok(q) if (1..=100).contains(&q) => q,
                    _ => anyhow::bail!("Invalid jpeg_quality: {value}. Must be between 1 and 100."),
                };
                self.export_mut().jpeg_quality = Some(quality);
            }
            "video.output_dir" => {
                self.video_mut().output_dir = Some(PathBuf::from(value));
            }
            "video.dwell_ms" => {
                let ms = parse_positive(key, value)?;
                self.video_mut().dwell_ms = Some(ms);
            }
            "video.fps" => {
                let fps = match value.parse::<u32>() {
                    Ok(f) if (1..=MAX_FPS).contains(&f) => f,
                    _ => anyhow::bail!("Invalid fps: {value}. Must be between 1 and {MAX_FPS}."),
                };
                self.video_mut().fps = Some(fps);
            }
            _ => anyhow::bail!("Unknown config key: {key}. Valid keys: {VALID_KEYS}"),
        }
        Ok(())
    }

    fn defaults_mut(&mut self) -> &mut DefaultsConfig {
        self.defaults.get_or_insert_with(DefaultsConfig::default)
    }

    fn export_mut(&mut self) -> &mut ExportConfig {
        self.export.get_or_insert_with(ExportConfig::default)
    }

    fn video_mut(&mut self) -> &mut VideoConfig {
        self.video.get_or_insert_with(VideoConfig::default)
    }

    pub fn language(&self) -> Language {
        self.defaults
            .as_ref()
            .and_then(|d| d.language)
            .unwrap_or_default()
    }

    pub fn autoplay(&self) -> bool {
        self.defaults
            .as_ref()
            .and_then(|d| d.autoplay)
            .unwrap_or(true)
    }

    pub fn autoplay_interval(&self) -> Duration {
        self.defaults
            .as_ref()
            .and_then(|d| d.autoplay_interval_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_AUTOPLAY_INTERVAL)
    }

    pub fn content_path(&self) -> Option<&Path> {
        self.defaults.as_ref().and_then(|d| d.content.as_deref())
    }

    pub fn fonts_dir(&self) -> Option<&Path> {
        self.defaults.as_ref().and_then(|d| d.fonts_dir.as_deref())
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export
            .as_ref()
            .and_then(|e| e.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn page_unit(&self) -> PageUnit {
        self.export
            .as_ref()
            .and_then(|e| e.page_unit)
            .unwrap_or_default()
    }

    pub fn settle(&self) -> Duration {
        self.export
            .as_ref()
            .and_then(|e| e.settle_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_SETTLE)
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.export
            .as_ref()
            .and_then(|e| e.jpeg_quality)
            .unwrap_or(DEFAULT_JPEG_QUALITY)
    }

    pub fn video_dir(&self) -> PathBuf {
        self.video
            .as_ref()
            .and_then(|v| v.output_dir.clone())
            .unwrap_or_else(|| self.export_dir())
    }

    pub fn dwell(&self) -> Duration {
        self.video
            .as_ref()
            .and_then(|v| v.dwell_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_DWELL)
    }

    pub fn fps(&self) -> u32 {
        self.video
            .as_ref()
            .and_then(|v| v.fps)
            .unwrap_or(DEFAULT_FPS)
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u64> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => anyhow::bail!("Invalid value for {key}: {value}. Must be a positive number."),
    }
}
