use std::str::FromStr;
use std::time::Duration;

use humantime::parse_duration;

use crate::error::ConfigError;

type Lookup<'a> = dyn Fn(&'static str) -> std::result::Result<Option<String>, ConfigError> + 'a;

pub(super) fn process_env(key: &'static str) -> std::result::Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(ConfigError::InvalidField {
            field: key,
            message: err.to_string(),
        }),
    }
}

/// Typed access to flat `OVERLAY_*` overrides. Blank values count as unset.
pub(super) struct EnvReader<'a> {
    lookup: &'a Lookup<'a>,
}

impl<'a> EnvReader<'a> {
    pub(super) fn new(lookup: &'a Lookup<'a>) -> Self {
        Self { lookup }
    }

    pub(super) fn string(
        &self,
        key: &'static str,
    ) -> std::result::Result<Option<String>, ConfigError> {
        Ok((self.lookup)(key)?
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty()))
    }

    pub(super) fn parse<T>(&self, key: &'static str) -> std::result::Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.string(key)?
            .map(|value| {
                value.parse::<T>().map_err(|err| ConfigError::InvalidField {
                    field: key,
                    message: err.to_string(),
                })
            })
            .transpose()
    }

    /// Accepts `1/0`, `true/false`, `yes/no`, `y/n` in any case.
    pub(super) fn flag(&self, key: &'static str) -> std::result::Result<Option<bool>, ConfigError> {
        self.string(key)?
            .map(|value| match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "y" => Ok(true),
                "0" | "false" | "no" | "n" => Ok(false),
                other => Err(ConfigError::InvalidField {
                    field: key,
                    message: format!("expected a boolean, got {other}"),
                }),
            })
            .transpose()
    }

    pub(super) fn duration(
        &self,
        key: &'static str,
    ) -> std::result::Result<Option<Duration>, ConfigError> {
        self.string(key)?
            .map(|value| {
                parse_duration(&value).map_err(|err| ConfigError::InvalidField {
                    field: key,
                    message: err.to_string(),
                })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::EnvReader;
    use crate::error::ConfigError;
    use std::time::Duration;

    fn fake(key: &'static str) -> Result<Option<String>, ConfigError> {
        Ok(match key {
            "BLANK" => Some("   ".to_string()),
            "FLAG" => Some("Yes".to_string()),
            "DELAY" => Some("250ms".to_string()),
            "COUNT" => Some(" 7 ".to_string()),
            "JUNK" => Some("seven".to_string()),
            _ => None,
        })
    }

    #[test]
    fn blank_values_are_unset() {
        let reader = EnvReader::new(&fake);
        assert_eq!(reader.string("BLANK").unwrap(), None);
        assert_eq!(reader.string("MISSING").unwrap(), None);
    }

    #[test]
    fn typed_values_parse() {
        let reader = EnvReader::new(&fake);
        assert_eq!(reader.flag("FLAG").unwrap(), Some(true));
        assert_eq!(
            reader.duration("DELAY").unwrap(),
            Some(Duration::from_millis(250))
        );
        assert_eq!(reader.parse::<usize>("COUNT").unwrap(), Some(7));
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let reader = EnvReader::new(&fake);
        let err = reader.parse::<usize>("JUNK").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { field: "JUNK", .. }));
        assert!(reader.flag("JUNK").is_err());
    }
}
