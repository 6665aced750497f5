//! Contract between the registry and the GUI framework that owns the windows.
//!
//! The framework supplies an [`OverlayProvider`]: it resolves surfaces to
//! overlay hosts (an adorner layer floating above a window's content) and
//! creates desktop hosts. Everything here is called on the UI thread.

use std::fmt::{self, Display};
use std::rc::Rc;

use async_channel::{Receiver, Sender, unbounded};
use tracing::debug;

use crate::placement::Layout;
use crate::types::{SurfaceId, Target, ViewId};
use crate::view::Entry;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct HostId(u64);

impl HostId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host#{}", self.0)
    }
}

/// A surface able to show floating content above whatever it already shows.
pub trait OverlayHost {
    fn id(&self) -> HostId;

    fn attach(&self, view: ViewId);

    /// Removes `view` and drops the [`CloseSignal`] registered for it.
    fn detach(&self, view: ViewId);

    fn apply_layout(&self, view: ViewId, layout: &Layout);

    /// Called whenever the queued messages of `view` change.
    fn render(&self, view: ViewId, entries: &[Entry]);

    /// Registers a one-shot signal the host fires when it closes for good.
    fn on_closed(&self, signal: CloseSignal);

    fn is_visible(&self) -> bool {
        true
    }

    fn show(&self) {}
}

/// Resolves the window notifications go to when the caller names none.
///
/// Implementations should prefer the focused window and fall back to the
/// first open one, returning `None` only when no window exists at all.
pub trait ActiveSurfaceResolver {
    fn active_surface(&self) -> Option<SurfaceId>;
}

pub enum SurfaceLookup {
    Overlay(Rc<dyn OverlayHost>),
    /// The surface exists but offers no overlay layer.
    NoOverlay,
    Missing,
}

pub trait OverlayProvider: ActiveSurfaceResolver {
    fn overlay_host(&self, surface: SurfaceId) -> SurfaceLookup;

    /// Returns a host covering the desktop, creating its window if needed.
    fn desktop_host(&self) -> Rc<dyn OverlayHost>;
}

#[derive(Debug)]
pub(crate) struct HostClosed {
    pub(crate) target: Target,
    pub(crate) view: ViewId,
}

pub(crate) fn closure_channel() -> (Sender<HostClosed>, Receiver<HostClosed>) {
    unbounded()
}

/// One-shot closure notification for a single view.
///
/// Firing it queues the closure for the registry, so the session learns
/// about it on the UI thread before its next use.
#[derive(Debug)]
pub struct CloseSignal {
    target: Target,
    view: ViewId,
    tx: Sender<HostClosed>,
}

impl CloseSignal {
    pub(crate) const fn new(target: Target, view: ViewId, tx: Sender<HostClosed>) -> Self {
        Self { target, view, tx }
    }

    #[must_use]
    pub const fn target(&self) -> Target {
        self.target
    }

    #[must_use]
    pub const fn view(&self) -> ViewId {
        self.view
    }

    pub fn fire(self) {
        let Self { target, view, tx } = self;
        if tx.try_send(HostClosed { target, view }).is_err() {
            debug!(scope = %target, %view, "registry gone before host closed");
        }
    }
}
