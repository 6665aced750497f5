use std::time::Duration;

use humantime::parse_duration;
use serde::Deserialize;
use serde_with::DeserializeAs;

/// Reads durations written the human way (`"3s"`, `"1m 30s"`).
pub(crate) struct HumantimeDuration;

impl<'de> DeserializeAs<'de, Duration> for HumantimeDuration {
    fn deserialize_as<D>(deserializer: D) -> std::result::Result<Duration, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_duration(raw.trim()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::HumantimeDuration;
    use serde::Deserialize;
    use serde_with::serde_as;
    use std::time::Duration;

    #[serde_as]
    #[derive(Deserialize)]
    struct Sample {
        #[serde_as(as = "HumantimeDuration")]
        delay: Duration,
    }

    #[test]
    fn parses_compound_durations() {
        let sample: Sample = serde_json::from_str(r#"{"delay":"1m 500ms"}"#).unwrap();
        assert_eq!(sample.delay, Duration::from_millis(60_500));
    }

    #[test]
    fn rejects_bare_numbers() {
        assert!(serde_json::from_str::<Sample>(r#"{"delay":"15"}"#).is_err());
    }
}
