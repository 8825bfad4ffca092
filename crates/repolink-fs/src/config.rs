//! Serde-backed settings files
//!
//! The on-disk format follows the file extension: `.json`, `.toml`, or
//! `.yaml`/`.yml`. Writes go through [`io::write_atomic`].

use std::path::PathBuf;

use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, NormalizedPath, Result, io};

/// Serialization formats a settings file may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Toml,
    Yaml,
}

impl Format {
    /// Pick the format from `path`'s extension, case-insensitively.
    pub fn of(path: &NormalizedPath) -> Result<Self> {
        let extension = path.extension().unwrap_or_default();
        match extension.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(Error::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Toml => "TOML",
            Self::Yaml => "YAML",
        }
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> std::result::Result<T, String> {
        match self {
            Self::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
            Self::Toml => toml::from_str(text).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
        }
    }

    fn encode<T: Serialize>(&self, value: &T) -> std::result::Result<String, String> {
        match self {
            Self::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
            Self::Toml => toml::to_string_pretty(value).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        }
    }
}

/// Loads and saves serde values in whatever format the path names.
#[derive(Debug, Default, Clone)]
pub struct ConfigStore {
    robustness: io::RobustnessConfig,
    boundary: Option<PathBuf>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_robustness(robustness: io::RobustnessConfig) -> Self {
        Self {
            robustness,
            ..Self::default()
        }
    }

    /// Refuse saves that would pass through a symlink beneath `boundary`.
    pub fn within(mut self, boundary: impl Into<PathBuf>) -> Self {
        self.boundary = Some(boundary.into());
        self
    }

    pub fn load<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<T> {
        let format = Format::of(path)?;
        let text = io::read_text(path)?;
        format.decode(&text).map_err(|message| Error::ConfigParse {
            path: path.to_native(),
            format: format.name().into(),
            message,
        })
    }

    /// Like [`load`](Self::load), but an absent file yields `T::default()`.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, path: &NormalizedPath) -> Result<T> {
        match self.load(path) {
            Err(e) if e.is_not_found() => Ok(T::default()),
            other => other,
        }
    }

    pub fn save<T: Serialize>(&self, path: &NormalizedPath, value: &T) -> Result<()> {
        let format = Format::of(path)?;
        let text = format.encode(value).map_err(|message| Error::ConfigSerialize {
            path: path.to_native(),
            format: format.name().into(),
            message,
        })?;

        if let Some(boundary) = &self.boundary {
            io::ensure_no_symlink_below(boundary, &path.to_native())?;
        }
        io::write_atomic(path, text.as_bytes(), self.robustness)
    }
}
