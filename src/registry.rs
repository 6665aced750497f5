//! Process-wide map from notification targets to their sessions.
//!
//! The registry is created once by the UI layer and passed to whoever needs
//! to notify. It lives on the UI thread (`!Send`); other threads talk to it
//! through a [`Dispatcher`] and the UI loop applies their commands with
//! [`NotificationRegistry::pump`] or [`NotificationRegistry::run`].
//!
//! Surface notifications follow the focused window: pushing to a surface
//! other than the last one drops the sessions of every other surface, so a
//! window never shows messages that were meant for a previous one. The
//! desktop session is independent of all of that.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

use async_channel::{Receiver, Sender};
use tracing::{debug, info, warn};

use crate::Result;
use crate::config::Config;
use crate::dispatch::{self, Command, Dispatcher};
use crate::error::{Error, NotifyError};
use crate::host::{self, HostClosed, OverlayHost, OverlayProvider, SurfaceLookup};
use crate::placement::PlacementPolicy;
use crate::session::Session;
use crate::types::{Edge, SurfaceId, Target, ViewId};
use crate::view::{Notice, ViewOptions};

pub struct NotificationRegistry {
    provider: Rc<dyn OverlayProvider>,
    placement: PlacementPolicy,
    options: ViewOptions,
    default_edge: Edge,
    edge: Edge,
    desktop: Option<Session>,
    surfaces: HashMap<SurfaceId, Session>,
    last_surface: Option<SurfaceId>,
    dispatcher: Dispatcher,
    commands: Receiver<Command>,
    closures: Sender<HostClosed>,
    closed: Receiver<HostClosed>,
}

impl std::fmt::Debug for NotificationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationRegistry")
            .field("edge", &self.edge)
            .field("desktop", &self.desktop)
            .field("surfaces", &self.surfaces)
            .field("last_surface", &self.last_surface)
            .finish_non_exhaustive()
    }
}

impl NotificationRegistry {
    #[must_use]
    pub fn new(provider: Rc<dyn OverlayProvider>, config: &Config) -> Self {
        let (dispatcher, commands) = dispatch::channel();
        let (closures, closed) = host::closure_channel();
        Self {
            provider,
            placement: config.placement.policy(),
            options: config.view.options(),
            default_edge: config.placement.default_edge,
            edge: config.placement.default_edge,
            desktop: None,
            surfaces: HashMap::new(),
            last_surface: None,
            dispatcher,
            commands,
            closures,
            closed,
        }
    }

    /// Handle for queuing work from other threads or timers.
    #[must_use]
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    /// Current default edge for views.
    #[must_use]
    pub const fn position(&self) -> Edge {
        self.edge
    }

    /// Changes the edge used by subsequent pushes. Views already on screen
    /// move on their next push. Returns `false` when `edge` is already set.
    pub fn set_position(&mut self, edge: Edge) -> bool {
        if self.edge == edge {
            return false;
        }
        debug!(from = %self.edge, to = %edge, "notification edge changed");
        self.edge = edge;
        true
    }

    #[must_use]
    pub fn session(&self, target: Target) -> Option<&Session> {
        match target {
            Target::Desktop => self.desktop.as_ref(),
            Target::Surface(id) => self.surfaces.get(&id),
        }
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.surfaces.len() + usize::from(self.desktop.is_some())
    }

    /// Pushes to the desktop surface, reopening its window if it was closed
    /// and showing it if it was hidden.
    ///
    /// # Errors
    ///
    /// Propagates [`NotifyError::InvariantViolation`] from the session.
    pub fn push_desktop(&mut self, notice: impl Into<Notice>) -> Result<ViewId> {
        self.drain_closures();
        let session = self
            .desktop
            .get_or_insert_with(|| Session::new(Target::Desktop));
        let host = match session.view() {
            Some(view) => Rc::clone(view.host()),
            None => self.provider.desktop_host(),
        };
        if !host.is_visible() {
            host.show();
        }
        append(
            session,
            &host,
            self.edge,
            &self.placement,
            self.options,
            &self.closures,
            notice.into(),
        )
    }

    /// Pushes to one window's overlay layer.
    ///
    /// # Errors
    ///
    /// [`NotifyError::OverlayUnavailable`] when the window has no overlay
    /// layer (use [`push_desktop`](Self::push_desktop) instead),
    /// [`NotifyError::UnknownSurface`] when the window does not exist, and
    /// [`NotifyError::InvariantViolation`] when the window's host changed
    /// under a live view.
    pub fn push(&mut self, surface: SurfaceId, notice: impl Into<Notice>) -> Result<ViewId> {
        self.drain_closures();
        self.switch_to(surface);

        let attached = self
            .surfaces
            .get(&surface)
            .and_then(Session::view)
            .map(|view| Rc::clone(view.host()));
        let host = match attached {
            Some(host) => host,
            None => resolve_host(self.provider.as_ref(), surface)?,
        };

        let session = self
            .surfaces
            .entry(surface)
            .or_insert_with(|| Session::new(Target::Surface(surface)));
        append(
            session,
            &host,
            self.edge,
            &self.placement,
            self.options,
            &self.closures,
            notice.into(),
        )
    }

    /// Pushes to the active window, as reported by the provider.
    ///
    /// # Errors
    ///
    /// [`NotifyError::NoActiveSurface`] when no window is open, otherwise the
    /// same as [`push`](Self::push).
    pub fn push_active(&mut self, notice: impl Into<Notice>) -> Result<ViewId> {
        let surface = self
            .provider
            .active_surface()
            .ok_or(NotifyError::NoActiveSurface)?;
        self.push(surface, notice)
    }

    /// Empties the queue of `target`'s view, keeping the view itself.
    /// Returns `false` when the target has no view.
    pub fn clear(&mut self, target: Target) -> bool {
        self.drain_closures();
        let cleared = match target {
            Target::Desktop => self.desktop.as_mut().is_some_and(Session::clear),
            Target::Surface(id) => self.surfaces.get_mut(&id).is_some_and(Session::clear),
        };
        debug!(scope = %target, cleared, "clear requested");
        cleared
    }

    pub fn clear_desktop(&mut self) -> bool {
        self.clear(Target::Desktop)
    }

    /// Clears the view of the surface last pushed to.
    pub fn clear_active(&mut self) -> bool {
        match self.last_surface {
            Some(id) => self.clear(Target::Surface(id)),
            None => false,
        }
    }

    /// Drops expired messages from every attached view.
    pub fn tick(&mut self, now: Instant) -> usize {
        self.drain_closures();
        let removed: usize = self
            .surfaces
            .values_mut()
            .chain(self.desktop.as_mut())
            .map(|session| session.expire(now))
            .sum();
        if removed > 0 {
            debug!(removed, "expired notifications");
        }
        removed
    }

    /// Applies every queued command. Failures are returned rather than
    /// stopping the pump.
    pub fn pump(&mut self) -> Vec<Error> {
        let mut failures = Vec::new();
        while let Ok(command) = self.commands.try_recv() {
            if let Err(err) = self.apply(command) {
                warn!(error = %err, "queued notification command failed");
                failures.push(err);
            }
        }
        failures
    }

    /// Applies commands as they arrive until a dispatcher handle closes the
    /// queue. Must be polled on the UI thread (e.g. inside a `LocalSet`).
    pub async fn run(&mut self) {
        while let Ok(command) = self.commands.recv().await {
            if let Err(err) = self.apply(command) {
                warn!(error = %err, "queued notification command failed");
            }
        }
        debug!("notification command queue closed");
    }

    /// Tears everything down: detaches every view, forgets every session and
    /// restores the configured edge. Pending commands are discarded.
    pub fn reset(&mut self) {
        while self.commands.try_recv().is_ok() {}
        while self.closed.try_recv().is_ok() {}
        for session in self.surfaces.values_mut().chain(self.desktop.as_mut()) {
            session.invalidate();
        }
        let dropped = self.session_count();
        self.surfaces.clear();
        self.desktop = None;
        self.last_surface = None;
        self.edge = self.default_edge;
        info!(sessions = dropped, "notification registry reset");
    }

    fn apply(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Push { surface, notice } => self.push(surface, notice).map(drop),
            Command::PushActive { notice } => self.push_active(notice).map(drop),
            Command::PushDesktop { notice } => self.push_desktop(notice).map(drop),
            Command::Clear { target } => {
                self.clear(target);
                Ok(())
            }
            Command::ClearActive => {
                self.clear_active();
                Ok(())
            }
            Command::SetPosition(edge) => {
                self.set_position(edge);
                Ok(())
            }
            Command::Tick => {
                self.tick(Instant::now());
                Ok(())
            }
        }
    }

    /// Applies pending host closures so no operation sees a dead view.
    ///
    /// A closed window is gone for good and its session is dropped. The
    /// desktop session stays `Detached` and gets a new host on its next push.
    fn drain_closures(&mut self) {
        while let Ok(HostClosed { target, view }) = self.closed.try_recv() {
            match target {
                Target::Desktop => {
                    if let Some(session) = self.desktop.as_mut() {
                        session.host_closed(view);
                    }
                }
                Target::Surface(id) => {
                    let released = self
                        .surfaces
                        .get_mut(&id)
                        .is_some_and(|session| session.host_closed(view));
                    if released {
                        self.surfaces.remove(&id);
                        if self.last_surface == Some(id) {
                            self.last_surface = None;
                        }
                        debug!(scope = %target, "dropped session of closed surface");
                    }
                }
            }
        }
    }

    fn switch_to(&mut self, surface: SurfaceId) {
        if self.last_surface == Some(surface) {
            return;
        }
        let previous = self.last_surface.replace(surface);
        let before = self.surfaces.len();
        self.surfaces.retain(|id, session| {
            if *id == surface {
                return true;
            }
            session.invalidate();
            false
        });
        if before != self.surfaces.len() {
            info!(
                from = ?previous.map(SurfaceId::get),
                to = %surface,
                dropped = before - self.surfaces.len(),
                "switched notification surface"
            );
        }
    }
}

fn resolve_host(
    provider: &dyn OverlayProvider,
    surface: SurfaceId,
) -> Result<Rc<dyn OverlayHost>> {
    match provider.overlay_host(surface) {
        SurfaceLookup::Overlay(host) => Ok(host),
        SurfaceLookup::NoOverlay => Err(NotifyError::OverlayUnavailable { surface }.into()),
        SurfaceLookup::Missing => Err(NotifyError::UnknownSurface { surface }.into()),
    }
}

fn append(
    session: &mut Session,
    host: &Rc<dyn OverlayHost>,
    edge: Edge,
    placement: &PlacementPolicy,
    options: ViewOptions,
    closures: &Sender<HostClosed>,
    notice: Notice,
) -> Result<ViewId> {
    // Repositions a live view; a new one is created on `edge` directly.
    session.set_edge(edge, placement);
    let view = session.ensure_view(host, edge, placement, options, closures)?;
    view.append(notice);
    Ok(view.id())
}

#[cfg(test)]
mod tests {
    use super::NotificationRegistry;
    use crate::config::Config;
    use crate::error::{Error, NotifyError};
    use crate::headless::HeadlessProvider;
    use crate::types::{Edge, Target};
    use crate::view::Notice;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    fn registry() -> (Rc<HeadlessProvider>, NotificationRegistry) {
        let provider = Rc::new(HeadlessProvider::new());
        let registry = NotificationRegistry::new(provider.clone(), &Config::default());
        (provider, registry)
    }

    #[test]
    fn push_to_bare_window_suggests_desktop() {
        let (provider, mut registry) = registry();
        let bare = provider.open_bare_window();
        let err = registry.push(bare, "hi").unwrap_err();
        assert!(matches!(
            err,
            Error::Notify(NotifyError::OverlayUnavailable { surface }) if surface == bare
        ));
        assert!(err.is_recoverable());
    }

    #[test]
    fn push_active_without_windows_is_recoverable() {
        let (_provider, mut registry) = registry();
        let err = registry.push_active("hi").unwrap_err();
        assert!(matches!(err, Error::Notify(NotifyError::NoActiveSurface)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn push_active_uses_focused_window() {
        let (provider, mut registry) = registry();
        let _first = provider.open_window();
        let second = provider.open_window();
        provider.activate(second);

        registry.push_active("to focused").unwrap();
        assert!(registry.session(Target::Surface(second)).is_some());
    }

    #[test]
    fn tick_expires_old_messages() {
        let (provider, mut registry) = registry();
        let window = provider.open_window();
        registry.push(window, Notice::info("short lived")).unwrap();
        registry.push(window, Notice::error("sticky")).unwrap();

        let removed = registry.tick(Instant::now() + Duration::from_secs(4));
        assert_eq!(removed, 1);
        let view = registry.session(Target::Surface(window)).unwrap().view().unwrap();
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn reset_detaches_everything_and_restores_edge() {
        let (provider, mut registry) = registry();
        let window = provider.open_window();
        registry.set_position(Edge::Left);
        registry.push(window, "a").unwrap();
        registry.push_desktop("b").unwrap();

        registry.reset();
        assert_eq!(registry.session_count(), 0);
        assert_eq!(registry.position(), Edge::Right);
        assert!(provider.host(window).unwrap().attached().is_empty());
        assert!(provider.desktop().unwrap().attached().is_empty());
    }

    #[test]
    fn clear_active_targets_last_surface() {
        let (provider, mut registry) = registry();
        assert!(!registry.clear_active());
        let window = provider.open_window();
        registry.push(window, "a").unwrap();
        assert!(registry.clear_active());
        let session = registry.session(Target::Surface(window)).unwrap();
        assert!(session.view().unwrap().is_empty());
    }

    #[test]
    fn closed_window_session_is_dropped() {
        let (provider, mut registry) = registry();
        let window = provider.open_window();
        registry.push(window, "a").unwrap();
        registry.push_desktop("b").unwrap();

        provider.close_window(window);
        assert_eq!(registry.tick(Instant::now()), 0);

        assert!(registry.session(Target::Surface(window)).is_none());
        assert_eq!(registry.session_count(), 1);
        assert!(!registry.clear_active());
    }
}
