use thiserror::Error;

use crate::host::HostId;
use crate::types::{SurfaceId, Target};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("invalid configuration for {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
    #[error("configuration error: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("{surface} has no overlay layer; use push_desktop instead")]
    OverlayUnavailable { surface: SurfaceId },
    #[error("{surface} is not known to the host framework")]
    UnknownSurface { surface: SurfaceId },
    #[error("session for {target} is bound to {expected}, got {found}")]
    InvariantViolation {
        target: Target,
        expected: HostId,
        found: HostId,
    },
    #[error("no active surface to notify")]
    NoActiveSurface,
    #[error("notification dispatcher is closed")]
    DispatcherClosed,
}

impl Error {
    /// Whether the caller can reasonably retry or fall back to another target.
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Notify(NotifyError::NoActiveSurface)
                | Self::Notify(NotifyError::OverlayUnavailable { .. })
        )
    }
}
