//! Lifecycle owner of at most one notification view for a target.

use std::rc::Rc;
use std::time::Instant;

use async_channel::Sender;
use tracing::{debug, info};

use crate::error::NotifyError;
use crate::host::{CloseSignal, HostClosed, OverlayHost};
use crate::placement::PlacementPolicy;
use crate::types::{Edge, Target, ViewId};
use crate::view::{NotificationView, ViewOptions};

/// `Uninitialized -> Attached -> Detached -> Attached -> ...`
///
/// A session is `Detached` after its host closed or after the registry
/// invalidated it; the next push attaches a fresh view.
#[derive(Clone, Copy, Debug)]
pub enum SessionState<'a> {
    Uninitialized,
    Attached(&'a NotificationView),
    Detached,
}

#[derive(Debug)]
pub struct Session {
    target: Target,
    view: Option<NotificationView>,
    released: bool,
}

impl Session {
    #[must_use]
    pub(crate) const fn new(target: Target) -> Self {
        Self {
            target,
            view: None,
            released: false,
        }
    }

    #[must_use]
    pub const fn target(&self) -> Target {
        self.target
    }

    #[must_use]
    pub const fn state(&self) -> SessionState<'_> {
        match (&self.view, self.released) {
            (Some(view), _) => SessionState::Attached(view),
            (None, false) => SessionState::Uninitialized,
            (None, true) => SessionState::Detached,
        }
    }

    #[must_use]
    pub const fn view(&self) -> Option<&NotificationView> {
        self.view.as_ref()
    }

    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.view.is_some()
    }

    #[must_use]
    pub fn edge(&self) -> Option<Edge> {
        self.view().map(NotificationView::edge)
    }

    /// Returns the attached view, creating one on `host` when there is none.
    ///
    /// A new view subscribes to the host's closure; the signal lands on `closures`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::InvariantViolation`] when the attached view lives
    /// on a different host: sessions never migrate between hosts.
    pub(crate) fn ensure_view(
        &mut self,
        host: &Rc<dyn OverlayHost>,
        edge: Edge,
        policy: &PlacementPolicy,
        options: ViewOptions,
        closures: &Sender<HostClosed>,
    ) -> Result<&mut NotificationView, NotifyError> {
        let target = self.target;
        if let Some(view) = &self.view {
            if view.host_id() != host.id() {
                return Err(NotifyError::InvariantViolation {
                    target,
                    expected: view.host_id(),
                    found: host.id(),
                });
            }
        }

        Ok(self.view.get_or_insert_with(|| {
            let view = NotificationView::attach(Rc::clone(host), edge, policy, options);
            host.on_closed(CloseSignal::new(target, view.id(), closures.clone()));
            info!(
                scope = %target,
                view = %view.id(),
                host = %host.id(),
                %edge,
                "attached notification view"
            );
            view
        }))
    }

    /// Repositions the attached view in place if it sits on another edge.
    pub(crate) fn set_edge(&mut self, edge: Edge, policy: &PlacementPolicy) -> bool {
        let target = self.target;
        let Some(view) = self.view.as_mut() else {
            return false;
        };
        let moved = view.apply_edge(edge, policy);
        if moved {
            debug!(scope = %target, view = %view.id(), %edge, "repositioned view");
        }
        moved
    }

    /// Marks the view destroyed after its host closed. Signals for views the
    /// session no longer holds are ignored.
    pub(crate) fn host_closed(&mut self, view_id: ViewId) -> bool {
        if self.view.as_ref().is_some_and(|view| view.id() == view_id) {
            info!(scope = %self.target, view = %view_id, "host closed, view released");
            self.view = None;
            self.released = true;
            true
        } else {
            debug!(scope = %self.target, view = %view_id, "ignoring stale close signal");
            false
        }
    }

    /// Detaches the view from its host and drops it.
    pub(crate) fn invalidate(&mut self) -> bool {
        let Some(view) = self.view.take() else {
            return false;
        };
        view.host().detach(view.id());
        self.released = true;
        debug!(scope = %self.target, view = %view.id(), "invalidated view");
        true
    }

    /// Empties the view's queue, keeping the view attached.
    pub(crate) fn clear(&mut self) -> bool {
        self.view.as_mut().map(NotificationView::clear).is_some()
    }

    pub(crate) fn expire(&mut self, now: Instant) -> usize {
        self.view.as_mut().map_or(0, |view| view.expire(now))
    }
}
