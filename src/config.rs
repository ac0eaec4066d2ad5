//! Runtime configuration.
//!
//! Every field has a default, so embedders can start from
//! [`Config::default`] and override nothing. A TOML file overrides
//! fields one by one:
//!
//! ```toml
//! banner_width = 960
//! banner_height = 320
//! ffmpeg_path = "/usr/local/bin/ffmpeg"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Output banner width in pixels.
    pub banner_width: u32,
    /// Output banner height in pixels.
    pub banner_height: u32,
    /// Source pixels moved per move command.
    pub move_step: u32,
    /// Zoom factor change per zoom command.
    pub zoom_step: f32,
    /// Fixed session lifetime from creation, in seconds.
    pub session_ttl_secs: u64,
    /// Hard cap on submitted input size, in bytes.
    pub max_input_bytes: usize,
    /// JPEG re-encode quality (1-100).
    pub jpeg_quality: u32,
    /// Previews wider than this are downscaled for display.
    pub preview_max_width: u32,
    pub gifsicle_path: PathBuf,
    pub ffmpeg_path: PathBuf,
    /// Per-invocation timeout for external tools, in seconds.
    pub tool_timeout_secs: u64,
    /// Scratch directory for external-tool invocations. Defaults to the
    /// system temp directory.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            banner_width: 734,
            banner_height: 293,
            move_step: 32,
            zoom_step: 0.25,
            session_ttl_secs: 300,
            max_input_bytes: 10 * 1024 * 1024,
            jpeg_quality: 90,
            preview_max_width: 1024,
            gifsicle_path: PathBuf::from("gifsicle"),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            tool_timeout_secs: 30,
            scratch_dir: None,
        }
    }
}

impl Config {
    /// Load from a TOML file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn banner(&self) -> (u32, u32) {
        (self.banner_width, self.banner_height)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}
