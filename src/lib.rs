#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod headless;
pub mod host;
pub mod placement;
pub mod registry;
pub mod session;
pub mod telemetry;
pub mod types;
pub mod view;

pub use dispatch::{Command, Dispatcher};
pub use registry::NotificationRegistry;
pub use types::{Edge, Severity, SurfaceId, Target};
pub use view::Notice;

pub type Result<T> = std::result::Result<T, error::Error>;
