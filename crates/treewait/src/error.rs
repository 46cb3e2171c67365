//! Errors
use std::fmt::Display;

/// Why a wait failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaitError {
    /// The container, or in a batch wait any child already found, was
    /// destroyed before the wait was satisfied.
    ContainerDestroyed,
    /// The timeout elapsed with no satisfaction and no destruction.
    Timeout,
}

impl Display for WaitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            WaitError::ContainerDestroyed => "container was destroyed",
            WaitError::Timeout => "timed out",
        })
    }
}

impl std::error::Error for WaitError {}

/// Misuse of the in-memory tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimError {
    /// The instance, or the parent it was moved under, is destroyed.
    Destroyed,
    /// The move would make an instance its own ancestor.
    Cycle,
}

impl Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SimError::Destroyed => "instance is destroyed",
            SimError::Cycle => "instance cannot be parented to itself or a descendant",
        })
    }
}

impl std::error::Error for SimError {}

/// Failure loading a [`WaitConfig`](crate::config::WaitConfig).
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "could not read config: {e}"),
            ConfigError::Json(e) => write!(f, "could not parse config: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}
