//! A single notification view attached to an overlay host.
//!
//! The view keeps the ordered queue of messages the host renders and decides
//! when old messages go away, either by eviction when the queue is full or
//! by the auto-dismiss policy on [`NotificationView::expire`].

use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::host::{HostId, OverlayHost};
use crate::placement::{Layout, PlacementPolicy};
use crate::types::{Edge, MessageId, Severity, ViewId};

/// Payload of one push.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Notice {
    pub text: String,
    pub severity: Severity,
    pub centered: bool,
}

impl Notice {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity,
            centered: false,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Severity::Info, text)
    }

    pub fn question(text: impl Into<String>) -> Self {
        Self::new(Severity::Question, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(Severity::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Severity::Error, text)
    }

    #[must_use]
    pub const fn centered(mut self, centered: bool) -> Self {
        self.centered = centered;
        self
    }
}

impl From<&str> for Notice {
    fn from(text: &str) -> Self {
        Self::info(text)
    }
}

impl From<String> for Notice {
    fn from(text: String) -> Self {
        Self::info(text)
    }
}

#[derive(Clone, Debug)]
pub struct Entry {
    id: MessageId,
    notice: Notice,
    pushed_at: Instant,
}

impl Entry {
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    #[must_use]
    pub const fn notice(&self) -> &Notice {
        &self.notice
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.notice.text
    }

    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.notice.severity
    }

    #[must_use]
    pub const fn pushed_at(&self) -> Instant {
        self.pushed_at
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DismissPolicy {
    Never,
    After {
        duration: Duration,
        /// Errors stay until cleared explicitly.
        keep_errors: bool,
    },
}

impl DismissPolicy {
    fn is_expired(self, entry: &Entry, now: Instant) -> bool {
        match self {
            Self::Never => false,
            Self::After {
                duration,
                keep_errors,
            } => {
                if keep_errors && entry.severity() == Severity::Error {
                    return false;
                }
                now.saturating_duration_since(entry.pushed_at) >= duration
            }
        }
    }
}

/// Per-view behaviour derived from configuration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ViewOptions {
    pub dismiss: DismissPolicy,
    pub max_entries: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            dismiss: DismissPolicy::After {
                duration: Duration::from_secs(3),
                keep_errors: true,
            },
            max_entries: 5,
        }
    }
}

pub struct NotificationView {
    id: ViewId,
    entries: VecDeque<Entry>,
    layout: Layout,
    host: Rc<dyn OverlayHost>,
    options: ViewOptions,
}

impl std::fmt::Debug for NotificationView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationView")
            .field("id", &self.id)
            .field("host", &self.host.id())
            .field("edge", &self.layout.edge)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl NotificationView {
    /// Creates a view and attaches it to `host` with the layout for `edge`.
    pub(crate) fn attach(
        host: Rc<dyn OverlayHost>,
        edge: Edge,
        policy: &PlacementPolicy,
        options: ViewOptions,
    ) -> Self {
        let id = ViewId::next();
        let layout = policy.layout(edge);
        host.attach(id);
        host.apply_layout(id, &layout);
        Self {
            id,
            entries: VecDeque::with_capacity(options.max_entries.max(1)),
            layout,
            host,
            options,
        }
    }

    #[must_use]
    pub const fn id(&self) -> ViewId {
        self.id
    }

    #[must_use]
    pub fn host_id(&self) -> HostId {
        self.host.id()
    }

    pub(crate) fn host(&self) -> &Rc<dyn OverlayHost> {
        &self.host
    }

    #[must_use]
    pub const fn edge(&self) -> Edge {
        self.layout.edge
    }

    #[must_use]
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn entries(&self) -> impl ExactSizeIterator<Item = &Entry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn append(&mut self, notice: Notice) -> MessageId {
        self.append_at(notice, Instant::now())
    }

    pub(crate) fn append_at(&mut self, notice: Notice, now: Instant) -> MessageId {
        while self.entries.len() >= self.options.max_entries.max(1) {
            if let Some(evicted) = self.entries.pop_front() {
                trace!(view = %self.id, message = ?evicted.id, "evicted oldest message");
            }
        }
        let id = MessageId::next();
        self.entries.push_back(Entry {
            id,
            notice,
            pushed_at: now,
        });
        self.render();
        id
    }

    pub fn clear(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.entries.clear();
        self.render();
    }

    /// Removes messages whose dismiss delay elapsed at `now`.
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let policy = self.options.dismiss;
        self.entries.retain(|entry| !policy.is_expired(entry, now));
        let removed = before - self.entries.len();
        if removed > 0 {
            self.render();
        }
        removed
    }

    /// Re-applies the layout for `edge` in place. Returns `false` when the view
    /// already sits on that edge.
    pub fn apply_edge(&mut self, edge: Edge, policy: &PlacementPolicy) -> bool {
        if self.layout.edge == edge {
            return false;
        }
        self.layout = policy.layout(edge);
        self.host.apply_layout(self.id, &self.layout);
        true
    }

    fn render(&mut self) {
        self.host.render(self.id, self.entries.make_contiguous());
    }
}

#[cfg(test)]
mod tests {
    use super::{DismissPolicy, Notice, NotificationView, ViewOptions};
    use crate::headless::HeadlessHost;
    use crate::placement::PlacementPolicy;
    use crate::types::{Edge, Severity};
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    fn view_with(options: ViewOptions) -> (Rc<HeadlessHost>, NotificationView) {
        let host = Rc::new(HeadlessHost::new());
        let view = NotificationView::attach(
            host.clone(),
            Edge::Right,
            &PlacementPolicy::default(),
            options,
        );
        (host, view)
    }

    #[test]
    fn attach_registers_view_with_host() {
        let (host, view) = view_with(ViewOptions::default());
        assert_eq!(host.attached(), vec![view.id()]);
        assert_eq!(host.layout_count(), 1);
    }

    #[test]
    fn append_keeps_push_order_and_renders() {
        let (host, mut view) = view_with(ViewOptions::default());
        view.append(Notice::info("one"));
        view.append(Notice::warning("two").centered(true));

        let texts: Vec<_> = view.entries().map(|e| e.text().to_string()).collect();
        assert_eq!(texts, ["one", "two"]);
        assert_eq!(host.rendered_texts(view.id()), ["one", "two"]);
        assert!(view.entries().nth(1).unwrap().notice().centered);
    }

    #[test]
    fn append_evicts_oldest_when_full() {
        let (_host, mut view) = view_with(ViewOptions {
            max_entries: 2,
            ..ViewOptions::default()
        });
        for text in ["a", "b", "c"] {
            view.append(Notice::info(text));
        }
        let texts: Vec<_> = view.entries().map(|e| e.text().to_string()).collect();
        assert_eq!(texts, ["b", "c"]);
    }

    #[test]
    fn expire_respects_delay_and_sticky_errors() {
        let (_host, mut view) = view_with(ViewOptions {
            dismiss: DismissPolicy::After {
                duration: Duration::from_secs(3),
                keep_errors: true,
            },
            max_entries: 5,
        });
        let start = Instant::now();
        view.append_at(Notice::info("saved"), start);
        view.append_at(Notice::error("disk full"), start);

        assert_eq!(view.expire(start + Duration::from_secs(1)), 0);
        assert_eq!(view.expire(start + Duration::from_secs(3)), 1);
        assert_eq!(view.len(), 1);
        assert_eq!(view.entries().next().unwrap().severity(), Severity::Error);
    }

    #[test]
    fn never_policy_keeps_everything() {
        let (_host, mut view) = view_with(ViewOptions {
            dismiss: DismissPolicy::Never,
            max_entries: 5,
        });
        let start = Instant::now();
        view.append_at(Notice::info("kept"), start);
        assert_eq!(view.expire(start + Duration::from_secs(3600)), 0);
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn apply_edge_is_noop_for_same_edge() {
        let (host, mut view) = view_with(ViewOptions::default());
        let policy = PlacementPolicy::default();
        assert!(!view.apply_edge(Edge::Right, &policy));
        assert!(view.apply_edge(Edge::Top, &policy));
        assert_eq!(view.edge(), Edge::Top);
        assert_eq!(host.layout_count(), 2);
    }

    #[test]
    fn clear_empties_queue_but_stays_attached() {
        let (host, mut view) = view_with(ViewOptions::default());
        view.append(Notice::info("gone soon"));
        view.clear();
        assert!(view.is_empty());
        assert_eq!(host.attached(), vec![view.id()]);
        assert!(host.rendered_texts(view.id()).is_empty());
    }
}
