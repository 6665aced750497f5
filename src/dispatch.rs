//! Hand-off from worker threads and timers into the UI-affine registry.

use std::fmt;
use std::sync::Arc;

use async_channel::{Receiver, Sender, TrySendError, unbounded};

use crate::error::NotifyError;
use crate::types::{Edge, SurfaceId, Target};
use crate::view::Notice;

/// Deferred registry operation, applied on the UI thread by
/// [`NotificationRegistry::pump`](crate::registry::NotificationRegistry::pump).
#[derive(Clone, Debug)]
pub enum Command {
    Push { surface: SurfaceId, notice: Notice },
    PushActive { notice: Notice },
    PushDesktop { notice: Notice },
    Clear { target: Target },
    ClearActive,
    SetPosition(Edge),
    /// Drop expired messages from every view.
    Tick,
}

type Waker = Arc<dyn Fn() + Send + Sync>;

/// Cloneable, `Send` handle onto a registry's command queue.
#[derive(Clone)]
pub struct Dispatcher {
    tx: Sender<Command>,
    waker: Option<Waker>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("pending", &self.tx.len())
            .field("closed", &self.tx.is_closed())
            .field("waker", &self.waker.is_some())
            .finish()
    }
}

pub(crate) fn channel() -> (Dispatcher, Receiver<Command>) {
    let (tx, rx) = unbounded();
    (Dispatcher { tx, waker: None }, rx)
}

impl Dispatcher {
    /// Returns a handle that calls `waker` after each queued command, so the
    /// UI event loop can schedule a pump.
    #[must_use]
    pub fn with_waker(mut self, waker: impl Fn() + Send + Sync + 'static) -> Self {
        self.waker = Some(Arc::new(waker));
        self
    }

    /// Queues `command` for the UI thread.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::DispatcherClosed`] once the registry is gone.
    pub fn send(&self, command: Command) -> Result<(), NotifyError> {
        match self.tx.try_send(command) {
            Ok(()) => {
                if let Some(waker) = &self.waker {
                    waker();
                }
                Ok(())
            }
            Err(TrySendError::Closed(_) | TrySendError::Full(_)) => {
                Err(NotifyError::DispatcherClosed)
            }
        }
    }

    /// # Errors
    ///
    /// See [`Dispatcher::send`].
    pub fn push(&self, surface: SurfaceId, notice: impl Into<Notice>) -> Result<(), NotifyError> {
        self.send(Command::Push {
            surface,
            notice: notice.into(),
        })
    }

    /// # Errors
    ///
    /// See [`Dispatcher::send`].
    pub fn push_desktop(&self, notice: impl Into<Notice>) -> Result<(), NotifyError> {
        self.send(Command::PushDesktop {
            notice: notice.into(),
        })
    }

    /// # Errors
    ///
    /// See [`Dispatcher::send`].
    pub fn tick(&self) -> Result<(), NotifyError> {
        self.send(Command::Tick)
    }

    /// Closes the queue for every handle. The registry's
    /// [`run`](crate::registry::NotificationRegistry::run) loop returns once
    /// the remaining commands are applied.
    pub fn close(&self) -> bool {
        self.tx.close()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, channel};
    use crate::error::NotifyError;
    use crate::types::SurfaceId;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn waker_runs_once_per_command() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let (dispatcher, rx) = channel();
        let dispatcher = dispatcher.with_waker(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.push(SurfaceId::new(3), "hello").unwrap();
        dispatcher.tick().unwrap();

        assert_eq!(wakes.load(Ordering::SeqCst), 2);
        assert!(matches!(rx.try_recv(), Ok(Command::Push { .. })));
        assert!(matches!(rx.try_recv(), Ok(Command::Tick)));
    }

    #[test]
    fn send_fails_once_receiver_dropped() {
        let (dispatcher, rx) = channel();
        drop(rx);
        assert!(dispatcher.is_closed());
        assert!(matches!(
            dispatcher.push_desktop("late"),
            Err(NotifyError::DispatcherClosed)
        ));
    }

    #[test]
    fn close_is_shared_by_clones() {
        let (dispatcher, rx) = channel();
        let worker = dispatcher.clone();
        dispatcher.tick().unwrap();
        assert!(dispatcher.close());
        assert!(worker.is_closed());
        assert!(worker.tick().is_err());
        assert!(matches!(rx.try_recv(), Ok(Command::Tick)));
    }
}
