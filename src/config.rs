//! Sampler configuration.
//!
//! The defaults reproduce the fixed cadence of the menu-bar app: a 500ms reporting cycle split
//! into four 125ms sub-samples, with a 500ms pause between cycles.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default reporting-cycle length in milliseconds
pub const DEFAULT_DURATION_MS: u64 = 500;

/// Default number of sub-samples per reporting cycle
pub const DEFAULT_MEASURES: u32 = 4;

/// Default pause between two reporting cycles of a session
pub const DEFAULT_PAUSE_MS: u64 = 500;

/// Settings for one sampling session.
///
/// # Example
///
/// ```rust
/// use statsbar::config::SamplerConfig;
///
/// let config = SamplerConfig::from_json_str(r#"{ "measures": 5 }"#).unwrap();
/// assert_eq!(config.measures, 5);
/// assert_eq!(config.duration_ms, 500);
/// assert_eq!(config.sub_sample_interval().as_millis(), 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Length of one reporting cycle in milliseconds
    pub duration_ms: u64,
    /// Number of sub-samples taken per reporting cycle
    pub measures: u32,
    /// Delay between reporting cycles when running a session
    pub pause_ms: u64,
    /// Only account traffic on this interface; `None` counts the interface carrying the default route
    pub network_interface: Option<String>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_DURATION_MS,
            measures: DEFAULT_MEASURES,
            pause_ms: DEFAULT_PAUSE_MS,
            network_interface: None,
        }
    }
}

impl SamplerConfig {
    /// Parse a configuration from JSON; missing fields fall back to their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Check the cadence values.
    pub fn validate(&self) -> Result<()> {
        if self.measures == 0 {
            return Err(Error::invalid_config("measures must be at least 1"));
        }
        if self.duration_ms < u64::from(self.measures) {
            return Err(Error::invalid_config(format!(
                "duration_ms ({}) must be at least one millisecond per measure ({})",
                self.duration_ms, self.measures
            )));
        }
        Ok(())
    }

    /// Spacing between two sub-samples.
    pub fn sub_sample_interval(&self) -> Duration {
        Duration::from_millis(self.duration_ms / u64::from(self.measures.max(1)))
    }

    /// Pause inserted before each cycle of a session.
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}
