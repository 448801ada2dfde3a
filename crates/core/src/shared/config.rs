use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::annotation::domain::palette::RenderStyle;
use crate::detection::domain::detection_params::DetectionParams;
use crate::shared::constants::{CAMERA_INDEX, DEFAULT_CASCADE_PATH, KEY_POLL_MS, WINDOW_TITLE};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything the session needs, injected from the binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub cascade_path: PathBuf,
    pub camera_index: u32,
    pub window_title: String,
    pub key_poll_ms: u64,
    /// Keep the last frame on screen until a key press when the camera stops.
    pub hold_on_capture_failure: bool,
    pub detection: DetectionParams,
    pub render: RenderStyle,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cascade_path: PathBuf::from(DEFAULT_CASCADE_PATH),
            camera_index: CAMERA_INDEX,
            window_title: WINDOW_TITLE.to_string(),
            key_poll_ms: KEY_POLL_MS,
            hold_on_capture_failure: true,
            detection: DetectionParams::default(),
            render: RenderStyle::default(),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("facecam").join("config.json"))
    }

    /// Reads the per-user config file, falling back to defaults.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring config at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detection.validate().map_err(ConfigError::Invalid)?;
        if self.render.thickness == 0 {
            return Err(ConfigError::Invalid(
                "outline thickness must be at least 1".to_string(),
            ));
        }
        if self.window_title.is_empty() {
            return Err(ConfigError::Invalid("window title is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::domain::palette::Rgb;
    use crate::detection::domain::detection_params::Size;
    use approx::assert_relative_eq;
    use std::io::Write;

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.camera_index, 0);
        assert_eq!(config.window_title, "Face Detector");
        assert_eq!(config.key_poll_ms, 10);
        assert!(config.hold_on_capture_failure);
        assert!(config
            .cascade_path
            .ends_with("haarcascade_frontalface_alt.xml"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config(r#"{ "camera_index": 2, "detection": { "min_neighbors": 5 } }"#);
        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.camera_index, 2);
        assert_eq!(config.detection.min_neighbors, 5);
        assert_relative_eq!(config.detection.scale_factor, 1.3);
        assert_eq!(config.detection.min_size, Size::new(40, 48));
        assert_eq!(config.render.palette.len(), 4);
    }

    #[test]
    fn test_custom_palette() {
        let file = write_config(r#"{ "render": { "palette": [[1, 2, 3]], "thickness": 1 } }"#);
        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.render.palette.colors(), &[Rgb(1, 2, 3)]);
        assert_eq!(config.render.thickness, 1);
    }

    #[test]
    fn test_empty_palette_is_rejected() {
        let file = write_config(r#"{ "render": { "palette": [] } }"#);
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        let file = write_config("{ not json");
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load_from(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.detection.scale_factor = 1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.render.thickness = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.window_title.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_round_trips_through_json() {
        let config = AppConfig {
            camera_index: 1,
            key_poll_ms: 33,
            ..Default::default()
        };
        let json = serde_json::to_string_pretty(&config).unwrap();
        let back: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
