use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Screen edge notifications are anchored to.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Left,
    Top,
    #[default]
    Right,
    Bottom,
}

impl Edge {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Top => "top",
            Self::Right => "right",
            Self::Bottom => "bottom",
        }
    }
}

impl Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Edge {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "top" => Ok(Self::Top),
            "right" => Ok(Self::Right),
            "bottom" => Ok(Self::Bottom),
            other => Err(format!("unknown edge: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Question,
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "Info",
            Self::Question => "Question",
            Self::Warning => "Warning",
            Self::Error => "Error",
        })
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" | "information" | "asterisk" => Ok(Self::Info),
            "question" => Ok(Self::Question),
            "warn" | "warning" | "exclamation" => Ok(Self::Warning),
            "error" | "stop" | "hand" => Ok(Self::Error),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// Identity of a host window, as handed out by the GUI framework.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SurfaceId(u64);

impl SurfaceId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// Where a notification is scoped: the whole desktop or one window.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Target {
    Desktop,
    Surface(SurfaceId),
}

impl Target {
    #[must_use]
    pub const fn surface(self) -> Option<SurfaceId> {
        match self {
            Self::Desktop => None,
            Self::Surface(id) => Some(id),
        }
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Desktop => f.write_str("desktop"),
            Self::Surface(id) => Display::fmt(id, f),
        }
    }
}

impl From<SurfaceId> for Target {
    fn from(id: SurfaceId) -> Self {
        Self::Surface(id)
    }
}

/// Identity of one notification view instance. A recreated view gets a new id.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ViewId(u64);

impl ViewId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct MessageId(u64);

impl MessageId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::{Edge, Severity, SurfaceId, Target, ViewId};
    use std::str::FromStr;

    #[test]
    fn edge_from_str_is_case_insensitive() {
        assert_eq!(Edge::from_str("LEFT"), Ok(Edge::Left));
        assert_eq!(Edge::from_str(" bottom "), Ok(Edge::Bottom));
        assert!(Edge::from_str("middle").is_err());
        assert_eq!(Edge::default(), Edge::Right);
    }

    #[test]
    fn severity_accepts_message_box_aliases() {
        assert_eq!(Severity::from_str("asterisk"), Ok(Severity::Info));
        assert_eq!(Severity::from_str("Exclamation"), Ok(Severity::Warning));
        assert_eq!(Severity::from_str("hand"), Ok(Severity::Error));
        assert!(Severity::from_str("loud").is_err());
    }

    #[test]
    fn targets_compare_by_surface_identity() {
        let a = Target::from(SurfaceId::new(1));
        let b = Target::from(SurfaceId::new(2));
        assert_ne!(a, b);
        assert_eq!(a, Target::Surface(SurfaceId::new(1)));
        assert_ne!(a, Target::Desktop);
        assert_eq!(Target::Desktop.surface(), None);
    }

    #[test]
    fn view_ids_are_unique() {
        assert_ne!(ViewId::next(), ViewId::next());
    }
}
