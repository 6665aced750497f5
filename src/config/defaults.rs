use std::time::Duration;

pub(super) fn default_edge() -> String {
    "right".to_string()
}

pub(super) const fn default_margin() -> u16 {
    12
}

pub(super) const fn default_spacing() -> u16 {
    6
}

pub(super) const fn default_auto_dismiss() -> Duration {
    Duration::from_secs(3)
}

pub(super) const fn default_sticky_errors() -> bool {
    true
}

pub(super) const fn default_max_messages() -> usize {
    5
}
