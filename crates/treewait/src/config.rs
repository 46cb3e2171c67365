//! Wait configuration.
use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Timeout used when an operation is given `None`.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings shared by every wait issued through a [`Waiter`](crate::Waiter).
///
/// Serialized as JSON with the timeout in (fractional) seconds:
///
/// ```json
/// { "default_timeout_secs": 5.0 }
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    #[serde(rename = "default_timeout_secs", with = "secs")]
    pub default_timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl WaitConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_to_sixty_seconds() {
        assert_eq!(WaitConfig::default().default_timeout, Duration::from_secs(60));
        let config = WaitConfig::from_json_str("{}").unwrap();
        assert_eq!(config, WaitConfig::default());
    }

    #[test]
    fn reads_fractional_seconds() {
        let config = WaitConfig::from_json_str(r#"{"default_timeout_secs": 2.5}"#).unwrap();
        assert_eq!(config.default_timeout, Duration::from_millis(2500));
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"default_timeout_secs":2.5}"#);
    }

    #[test]
    fn rejects_negative_timeouts() {
        let err = WaitConfig::from_json_str(r#"{"default_timeout_secs": -1}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = WaitConfig::load("/definitely/not/a/treewait/config.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
