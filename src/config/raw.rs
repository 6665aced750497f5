use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use serde_with::serde_as;

use crate::Result;
use crate::error::ConfigError;
use crate::types::Edge;

use super::defaults::{
    default_auto_dismiss, default_edge, default_margin, default_max_messages, default_spacing,
    default_sticky_errors,
};
use super::env::{EnvReader, process_env};
use super::{
    Config, HumantimeDuration, MAX_MARGIN, MAX_MESSAGES_BOUNDS, PlacementSettings, ViewSettings,
};

pub(super) fn load(path: impl AsRef<Path>) -> std::result::Result<RawConfig, ConfigError> {
    let path = path.as_ref();
    let builder = ::config::Config::builder()
        .add_source(::config::File::from(path).required(false))
        .add_source(
            ::config::Environment::with_prefix("OVERLAY")
                .separator("__")
                .try_parsing(true),
        );
    deserialize(builder)
}

pub(super) fn parse_str(text: &str) -> std::result::Result<RawConfig, ConfigError> {
    let builder = ::config::Config::builder()
        .add_source(::config::File::from_str(text, ::config::FileFormat::Toml));
    deserialize(builder)
}

fn deserialize(
    builder: ::config::ConfigBuilder<::config::builder::DefaultState>,
) -> std::result::Result<RawConfig, ConfigError> {
    builder
        .build()
        .map_err(|err| ConfigError::Other(err.to_string()))?
        .try_deserialize()
        .map_err(|err| ConfigError::Parse(err.to_string()))
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub(super) placement: RawPlacement,
    #[serde(default)]
    pub(super) view: RawView,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawPlacement {
    #[serde(default = "default_edge")]
    pub(super) default_edge: String,
    #[serde(default = "default_margin")]
    pub(super) margin: u16,
    #[serde(default = "default_spacing")]
    pub(super) spacing: u16,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub(super) struct RawView {
    #[serde(default = "default_auto_dismiss")]
    #[serde_as(as = "HumantimeDuration")]
    pub(super) auto_dismiss: Duration,
    #[serde(default)]
    pub(super) sticky: bool,
    #[serde(default = "default_sticky_errors")]
    pub(super) sticky_errors: bool,
    #[serde(default = "default_max_messages")]
    pub(super) max_messages: usize,
}

impl RawConfig {
    pub(super) fn apply_env_overrides(&mut self) -> std::result::Result<(), ConfigError> {
        self.apply_overrides(&EnvReader::new(&process_env))
    }

    pub(super) fn apply_overrides(
        &mut self,
        env: &EnvReader<'_>,
    ) -> std::result::Result<(), ConfigError> {
        if let Some(edge) = env.string("OVERLAY_DEFAULT_EDGE")? {
            self.placement.default_edge = edge;
        }
        if let Some(margin) = env.parse::<u16>("OVERLAY_MARGIN")? {
            self.placement.margin = margin;
        }
        if let Some(spacing) = env.parse::<u16>("OVERLAY_SPACING")? {
            self.placement.spacing = spacing;
        }
        if let Some(delay) = env.duration("OVERLAY_AUTO_DISMISS")? {
            self.view.auto_dismiss = delay;
        }
        if let Some(sticky) = env.flag("OVERLAY_STICKY")? {
            self.view.sticky = sticky;
        }
        if let Some(sticky_errors) = env.flag("OVERLAY_STICKY_ERRORS")? {
            self.view.sticky_errors = sticky_errors;
        }
        if let Some(max) = env.parse::<usize>("OVERLAY_MAX_MESSAGES")? {
            self.view.max_messages = max;
        }
        Ok(())
    }

    pub(super) fn validate_and_build(self) -> Result<Config> {
        let default_edge = Edge::from_str(&self.placement.default_edge).map_err(|err| {
            ConfigError::InvalidField {
                field: "placement.default_edge",
                message: err,
            }
        })?;

        if self.placement.margin > MAX_MARGIN {
            return Err(ConfigError::InvalidField {
                field: "placement.margin",
                message: format!("expected at most {MAX_MARGIN}, got {}", self.placement.margin),
            }
            .into());
        }
        if !MAX_MESSAGES_BOUNDS.contains(&self.view.max_messages) {
            return Err(ConfigError::InvalidField {
                field: "view.max_messages",
                message: format!(
                    "expected between {} and {}, got {}",
                    MAX_MESSAGES_BOUNDS.start(),
                    MAX_MESSAGES_BOUNDS.end(),
                    self.view.max_messages
                ),
            }
            .into());
        }
        if !self.view.sticky && self.view.auto_dismiss.is_zero() {
            return Err(ConfigError::InvalidField {
                field: "view.auto_dismiss",
                message: "auto-dismiss delay must be greater than zero unless sticky".to_string(),
            }
            .into());
        }

        Ok(Config {
            placement: PlacementSettings {
                default_edge,
                margin: self.placement.margin,
                spacing: self.placement.spacing,
            },
            view: ViewSettings {
                auto_dismiss: self.view.auto_dismiss,
                sticky: self.view.sticky,
                sticky_errors: self.view.sticky_errors,
                max_messages: self.view.max_messages,
            },
        })
    }
}

impl Default for RawPlacement {
    fn default() -> Self {
        Self {
            default_edge: default_edge(),
            margin: default_margin(),
            spacing: default_spacing(),
        }
    }
}

impl Default for RawView {
    fn default() -> Self {
        Self {
            auto_dismiss: default_auto_dismiss(),
            sticky: false,
            sticky_errors: default_sticky_errors(),
            max_messages: default_max_messages(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RawConfig;
    use crate::config::env::EnvReader;
    use crate::error::ConfigError;
    use crate::types::Edge;
    use std::time::Duration;

    fn overrides(key: &'static str) -> Result<Option<String>, ConfigError> {
        Ok(match key {
            "OVERLAY_DEFAULT_EDGE" => Some("top".to_string()),
            "OVERLAY_AUTO_DISMISS" => Some("10s".to_string()),
            "OVERLAY_STICKY_ERRORS" => Some("0".to_string()),
            _ => None,
        })
    }

    #[test]
    fn flat_overrides_apply_before_validation() {
        let mut raw = RawConfig::default();
        raw.apply_overrides(&EnvReader::new(&overrides)).unwrap();
        let config = raw.validate_and_build().unwrap();

        assert_eq!(config.placement.default_edge, Edge::Top);
        assert_eq!(config.view.auto_dismiss, Duration::from_secs(10));
        assert!(!config.view.sticky_errors);
        assert_eq!(config.view.max_messages, 5);
    }

    #[test]
    fn margin_upper_bound_is_enforced() {
        let mut raw = RawConfig::default();
        raw.placement.margin = 4096;
        assert!(raw.validate_and_build().is_err());
    }
}
