//! Configuration file support

use crate::audio::FrameFormat;
use crate::error::Result;
use crate::ring::{RingGeometry, SafetyMargin, DEFAULT_SAFETY_MARGIN_FRAMES};
use crate::stream::StreamConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Ring and stream configuration loaded from a TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Capture sample rate in Hz
    pub sample_rate: u32,

    /// Channels per frame
    pub channels: u16,

    /// Bytes (not bits) per channel sample
    pub bytes_per_channel: u16,

    /// Analysis window length in milliseconds
    pub window_ms: u32,

    /// Explicit window length in frames (0 = derive from window_ms)
    pub user_capacity_frames: usize,

    /// Hidden frames around the write cursor (even, >= 2)
    pub safety_margin_frames: usize,

    /// Frames delivered per capture callback
    pub callback_frames: usize,

    /// Time between snapshots in milliseconds
    pub snapshot_interval_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            bytes_per_channel: 2,
            window_ms: 4000,
            user_capacity_frames: 0,
            safety_margin_frames: DEFAULT_SAFETY_MARGIN_FRAMES,
            callback_frames: 512,
            snapshot_interval_ms: 250,
            log_level: "info".to_string(),
        }
    }
}

impl RingConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        let config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration from default locations
    ///
    /// Searches in order:
    /// 1. Same directory as executable: satring.toml
    /// 2. User config directory: satring/config.toml
    pub fn load_default() -> std::result::Result<Self, ConfigError> {
        for path in Self::default_locations() {
            if path.exists() {
                return Self::load(&path);
            }
        }

        Ok(Self::default())
    }

    fn default_locations() -> Vec<PathBuf> {
        let mut locations = Vec::new();
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                locations.push(exe_dir.join("satring.toml"));
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            locations.push(config_dir.join("satring").join("config.toml"));
        }
        locations
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::result::Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_string_lossy().to_string(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Io {
            path: path.as_ref().to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn format(&self) -> FrameFormat {
        FrameFormat::new(self.sample_rate, self.channels, self.bytes_per_channel)
    }

    /// Window length in frames
    pub fn window_frames(&self) -> usize {
        if self.user_capacity_frames > 0 {
            self.user_capacity_frames
        } else {
            self.format().frames_for_ms(self.window_ms)
        }
    }

    /// Validated ring geometry
    pub fn to_geometry(&self) -> Result<RingGeometry> {
        let margin = SafetyMargin::new(self.safety_margin_frames)?;
        self.format().ring_geometry(self.window_frames(), margin)
    }

    /// Validated stream engine configuration
    pub fn to_stream_config(&self) -> Result<StreamConfig> {
        let config = StreamConfig {
            format: self.format(),
            geometry: self.to_geometry()?,
            callback_frames: self.callback_frames,
            snapshot_interval: Duration::from_millis(self.snapshot_interval_ms),
            snapshot_queue: 64,
        };
        config.validate()?;
        Ok(config)
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# satring configuration

# Capture format: 44.1 kHz stereo 16-bit (default)
sample_rate = 44100
channels = 2
bytes_per_channel = 2

# Analysis window in milliseconds (default: 4000)
window_ms = 4000

# Explicit window in frames; overrides window_ms when > 0
user_capacity_frames = 0

# Hidden frames around the write cursor; must be even and >= 2
safety_margin_frames = 2

# Frames per capture callback; must be smaller than the ring
callback_frames = 512

# Milliseconds between snapshots
snapshot_interval_ms = 250

# Log level: trace, debug, info, warn, error (default: info)
log_level = "info"
"#
        .to_string()
    }
}

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading/writing config file
    #[error("Failed to access config file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    /// Error parsing TOML
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    /// Error serializing config
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SatRingError;

    #[test]
    fn test_sample_config_matches_default() {
        let parsed: RingConfig = toml::from_str(&RingConfig::sample_config()).unwrap();
        assert_eq!(parsed, RingConfig::default());
    }

    #[test]
    fn test_default_geometry() {
        let geometry = RingConfig::default().to_geometry().unwrap();
        assert_eq!(geometry.user_capacity_frames(), 176_400);
        assert_eq!(geometry.total_capacity_frames(), 176_402);
        assert_eq!(geometry.total_capacity_bytes(), 176_402 * 4);
    }

    #[test]
    fn test_explicit_frames_override_window() {
        let config: RingConfig = toml::from_str(
            "user_capacity_frames = 10\nchannels = 1\nsafety_margin_frames = 4",
        )
        .unwrap();
        let geometry = config.to_geometry().unwrap();
        assert_eq!(geometry.user_capacity_frames(), 10);
        assert_eq!(geometry.total_capacity_bytes(), 28);
    }

    #[test]
    fn test_odd_margin_is_rejected() {
        let config = RingConfig {
            safety_margin_frames: 3,
            ..RingConfig::default()
        };
        assert!(matches!(
            config.to_geometry(),
            Err(SatRingError::InvalidSafetyMargin(3))
        ));
    }

    #[test]
    fn test_oversized_callback_is_rejected() {
        let config = RingConfig {
            user_capacity_frames: 100,
            callback_frames: 102,
            ..RingConfig::default()
        };
        assert!(config.to_stream_config().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("satring-test-{}", std::process::id()));
        let path = dir.join("nested").join("config.toml");
        let config = RingConfig {
            sample_rate: 48000,
            callback_frames: 256,
            ..RingConfig::default()
        };

        config.save(&path).unwrap();
        let loaded = RingConfig::load(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_zero_snapshot_interval_is_rejected() {
        let config: RingConfig =
            toml::from_str("user_capacity_frames = 100\nsnapshot_interval_ms = 0").unwrap();
        assert!(config.to_geometry().is_ok());
        assert!(config.to_stream_config().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = RingConfig::load("/nonexistent/satring.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
