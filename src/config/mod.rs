use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

use crate::Result;
use crate::error::Error as OverlayError;
use crate::placement::PlacementPolicy;
use crate::types::Edge;
use crate::view::{DismissPolicy, ViewOptions};

mod defaults;
mod duration;
mod env;
mod raw;

pub(crate) use duration::HumantimeDuration;

const MAX_MESSAGES_BOUNDS: RangeInclusive<usize> = 1..=100;
const MAX_MARGIN: u16 = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub placement: PlacementSettings,
    pub view: ViewSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementSettings {
    pub default_edge: Edge,
    pub margin: u16,
    pub spacing: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSettings {
    pub auto_dismiss: Duration,
    pub sticky: bool,
    pub sticky_errors: bool,
    pub max_messages: usize,
}

impl Config {
    /// Load configuration from a file and the environment.
    ///
    /// A missing file is not an error: defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration file cannot be parsed, when
    /// environment overrides are invalid, or when the resulting values fail
    /// validation.
    pub fn from_env_and_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut raw = raw::load(path).map_err(OverlayError::from)?;
        raw.apply_env_overrides().map_err(OverlayError::from)?;
        raw.validate_and_build()
    }

    /// Parse configuration from an in-memory TOML document, without
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env_and_file`] minus the environment part.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        raw::parse_str(text)
            .map_err(OverlayError::from)?
            .validate_and_build()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            placement: PlacementSettings {
                default_edge: Edge::default(),
                margin: defaults::default_margin(),
                spacing: defaults::default_spacing(),
            },
            view: ViewSettings {
                auto_dismiss: defaults::default_auto_dismiss(),
                sticky: false,
                sticky_errors: defaults::default_sticky_errors(),
                max_messages: defaults::default_max_messages(),
            },
        }
    }
}

impl PlacementSettings {
    #[must_use]
    pub const fn policy(&self) -> PlacementPolicy {
        PlacementPolicy::new(self.margin, self.spacing)
    }
}

impl ViewSettings {
    #[must_use]
    pub const fn dismiss_policy(&self) -> DismissPolicy {
        compute_dismiss(self.sticky, self.auto_dismiss, self.sticky_errors)
    }

    #[must_use]
    pub const fn options(&self) -> ViewOptions {
        ViewOptions {
            dismiss: self.dismiss_policy(),
            max_entries: self.max_messages,
        }
    }
}

const fn compute_dismiss(sticky: bool, after: Duration, keep_errors: bool) -> DismissPolicy {
    if sticky {
        DismissPolicy::Never
    } else {
        DismissPolicy::After {
            duration: after,
            keep_errors,
        }
    }
}
