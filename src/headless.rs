//! In-memory overlay backend.
//!
//! Records everything the registry asks of it instead of drawing. Used by
//! the demo binary and by tests; also a reference for writing a real backend.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::host::{
    ActiveSurfaceResolver, CloseSignal, HostId, OverlayHost, OverlayProvider, SurfaceLookup,
};
use crate::placement::Layout;
use crate::types::{SurfaceId, ViewId};
use crate::view::Entry;

fn next_host_id() -> HostId {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    HostId::new(COUNTER.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug)]
pub struct HeadlessHost {
    id: HostId,
    attached: RefCell<Vec<ViewId>>,
    layouts: Cell<usize>,
    last_layout: Cell<Option<Layout>>,
    rendered: RefCell<HashMap<ViewId, Vec<String>>>,
    signals: RefCell<Vec<CloseSignal>>,
    visible: Cell<bool>,
    closed: Cell<bool>,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: next_host_id(),
            attached: RefCell::new(Vec::new()),
            layouts: Cell::new(0),
            last_layout: Cell::new(None),
            rendered: RefCell::new(HashMap::new()),
            signals: RefCell::new(Vec::new()),
            visible: Cell::new(true),
            closed: Cell::new(false),
        }
    }

    #[must_use]
    pub fn attached(&self) -> Vec<ViewId> {
        self.attached.borrow().clone()
    }

    /// Number of layout applications received so far.
    #[must_use]
    pub fn layout_count(&self) -> usize {
        self.layouts.get()
    }

    #[must_use]
    pub fn last_layout(&self) -> Option<Layout> {
        self.last_layout.get()
    }

    #[must_use]
    pub fn rendered_texts(&self, view: ViewId) -> Vec<String> {
        self.rendered
            .borrow()
            .get(&view)
            .cloned()
            .unwrap_or_default()
    }

    /// Closure subscriptions still pending.
    #[must_use]
    pub fn signal_count(&self) -> usize {
        self.signals.borrow().len()
    }

    pub fn hide(&self) {
        self.visible.set(false);
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Closes the host and fires every registered closure signal.
    pub fn close(&self) {
        if self.closed.replace(true) {
            return;
        }
        self.visible.set(false);
        self.attached.borrow_mut().clear();
        let signals = std::mem::take(&mut *self.signals.borrow_mut());
        debug!(host = %self.id, signals = signals.len(), "headless host closed");
        for signal in signals {
            signal.fire();
        }
    }
}

impl OverlayHost for HeadlessHost {
    fn id(&self) -> HostId {
        self.id
    }

    fn attach(&self, view: ViewId) {
        self.attached.borrow_mut().push(view);
    }

    fn detach(&self, view: ViewId) {
        self.attached.borrow_mut().retain(|v| *v != view);
        self.rendered.borrow_mut().remove(&view);
        self.signals.borrow_mut().retain(|s| s.view() != view);
    }

    fn apply_layout(&self, _view: ViewId, layout: &Layout) {
        self.layouts.set(self.layouts.get() + 1);
        self.last_layout.set(Some(*layout));
    }

    fn render(&self, view: ViewId, entries: &[Entry]) {
        let texts = entries.iter().map(|e| e.text().to_string()).collect();
        self.rendered.borrow_mut().insert(view, texts);
    }

    fn on_closed(&self, signal: CloseSignal) {
        if self.closed.get() {
            signal.fire();
            return;
        }
        self.signals.borrow_mut().push(signal);
    }

    fn is_visible(&self) -> bool {
        self.visible.get()
    }

    fn show(&self) {
        if !self.closed.get() {
            self.visible.set(true);
        }
    }
}

#[derive(Debug)]
struct Window {
    overlay: Option<Rc<HeadlessHost>>,
}

/// Set of fake windows plus a lazily created desktop host.
#[derive(Debug, Default)]
pub struct HeadlessProvider {
    windows: RefCell<BTreeMap<SurfaceId, Window>>,
    active: Cell<Option<SurfaceId>>,
    desktop: RefCell<Option<Rc<HeadlessHost>>>,
    desktops_created: Cell<usize>,
    next_surface: Cell<u64>,
}

impl HeadlessProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&self, overlay: Option<Rc<HeadlessHost>>) -> SurfaceId {
        let raw = self.next_surface.get() + 1;
        self.next_surface.set(raw);
        let id = SurfaceId::new(raw);
        self.windows.borrow_mut().insert(id, Window { overlay });
        id
    }

    /// Opens a window with an overlay layer.
    pub fn open_window(&self) -> SurfaceId {
        self.allocate(Some(Rc::new(HeadlessHost::new())))
    }

    /// Opens a window whose content offers no overlay layer.
    pub fn open_bare_window(&self) -> SurfaceId {
        self.allocate(None)
    }

    pub fn activate(&self, surface: SurfaceId) {
        self.active.set(Some(surface));
    }

    pub fn close_window(&self, surface: SurfaceId) {
        let removed = self.windows.borrow_mut().remove(&surface);
        if let Some(host) = removed.and_then(|w| w.overlay) {
            host.close();
        }
        if self.active.get() == Some(surface) {
            self.active.set(None);
        }
    }

    #[must_use]
    pub fn host(&self, surface: SurfaceId) -> Option<Rc<HeadlessHost>> {
        self.windows
            .borrow()
            .get(&surface)
            .and_then(|w| w.overlay.clone())
    }

    #[must_use]
    pub fn desktop(&self) -> Option<Rc<HeadlessHost>> {
        self.desktop.borrow().clone()
    }

    /// How many desktop windows were created so far.
    #[must_use]
    pub fn desktops_created(&self) -> usize {
        self.desktops_created.get()
    }
}

impl ActiveSurfaceResolver for HeadlessProvider {
    fn active_surface(&self) -> Option<SurfaceId> {
        let windows = self.windows.borrow();
        self.active
            .get()
            .filter(|id| windows.contains_key(id))
            .or_else(|| windows.keys().next().copied())
    }
}

impl OverlayProvider for HeadlessProvider {
    fn overlay_host(&self, surface: SurfaceId) -> SurfaceLookup {
        match self.windows.borrow().get(&surface) {
            None => SurfaceLookup::Missing,
            Some(Window { overlay: None }) => SurfaceLookup::NoOverlay,
            Some(Window {
                overlay: Some(host),
            }) => SurfaceLookup::Overlay(host.clone()),
        }
    }

    fn desktop_host(&self) -> Rc<dyn OverlayHost> {
        let mut slot = self.desktop.borrow_mut();
        if let Some(host) = slot.as_ref().filter(|h| !h.is_closed()) {
            return host.clone();
        }
        let host = Rc::new(HeadlessHost::new());
        // Desktop windows start hidden, like a freshly created top-level window.
        host.hide();
        self.desktops_created.set(self.desktops_created.get() + 1);
        *slot = Some(host.clone());
        host
    }
}

#[cfg(test)]
mod tests {
    use super::{HeadlessHost, HeadlessProvider};
    use crate::host::{
        ActiveSurfaceResolver, CloseSignal, OverlayHost, OverlayProvider, SurfaceLookup,
        closure_channel,
    };
    use crate::placement::PlacementPolicy;
    use crate::types::{Edge, Target, ViewId};

    #[test]
    fn active_surface_falls_back_to_first_window() {
        let provider = HeadlessProvider::new();
        assert_eq!(provider.active_surface(), None);

        let first = provider.open_window();
        let second = provider.open_window();
        assert_eq!(provider.active_surface(), Some(first));

        provider.activate(second);
        assert_eq!(provider.active_surface(), Some(second));

        provider.close_window(second);
        assert_eq!(provider.active_surface(), Some(first));
    }

    #[test]
    fn lookup_distinguishes_missing_and_bare_windows() {
        let provider = HeadlessProvider::new();
        let bare = provider.open_bare_window();
        let full = provider.open_window();
        assert!(matches!(provider.overlay_host(bare), SurfaceLookup::NoOverlay));
        assert!(matches!(provider.overlay_host(full), SurfaceLookup::Overlay(_)));
        provider.close_window(full);
        assert!(matches!(provider.overlay_host(full), SurfaceLookup::Missing));
    }

    #[test]
    fn desktop_host_is_reused_until_closed() {
        let provider = HeadlessProvider::new();
        let first = provider.desktop_host().id();
        assert_eq!(provider.desktop_host().id(), first);
        assert_eq!(provider.desktops_created(), 1);

        provider.desktop().unwrap().close();
        assert_ne!(provider.desktop_host().id(), first);
        assert_eq!(provider.desktops_created(), 2);
    }

    #[test]
    fn detach_drops_close_subscription() {
        let (tx, rx) = closure_channel();
        let host = HeadlessHost::new();
        let kept = ViewId::next();
        let dropped = ViewId::next();
        for view in [kept, dropped] {
            host.attach(view);
            host.apply_layout(view, &PlacementPolicy::default().layout(Edge::Right));
            host.on_closed(CloseSignal::new(Target::Desktop, view, tx.clone()));
        }
        assert_eq!(host.signal_count(), 2);

        host.detach(dropped);
        assert_eq!(host.signal_count(), 1);
        assert_eq!(host.attached(), vec![kept]);

        host.close();
        let fired = rx.try_recv().unwrap();
        assert_eq!(fired.view, kept);
        assert!(rx.try_recv().is_err());
    }
}
