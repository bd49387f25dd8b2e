//! Operation arbitration
//!
//! The arbiter keeps at most one operation on record. Granting control to a
//! new operation interrupts the recorded one synchronously: its outcome is
//! settled, its interrupt hook runs and its cancellation signal fires before
//! the new operation gets its own signal. The rest of the interrupted
//! session's teardown happens on that session's own task.

use crate::operation::{Operation, OperationInfo, OperationOutcome};
use sitesketch_core::OperationId;
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::watch;

/// Why a session was asked to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    /// Another operation took control, or the editor shut down
    Interrupted,
    /// An explicit external cancel
    Cancelled,
}

/// Receiving end of an operation's cancellation.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    rx: watch::Receiver<Option<CancelReason>>,
}

impl CancellationSignal {
    /// Resolves once the signal fires. A dropped arbiter reads as
    /// [`CancelReason::Interrupted`].
    pub async fn cancelled(&mut self) -> CancelReason {
        match self.rx.wait_for(Option::is_some).await {
            Ok(reason) => (*reason).unwrap_or(CancelReason::Interrupted),
            Err(_) => CancelReason::Interrupted,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    pub fn reason(&self) -> Option<CancelReason> {
        *self.rx.borrow()
    }
}

/// Work that must be done the moment an operation is interrupted
pub type InterruptHook = Box<dyn FnOnce()>;

struct Entry {
    operation: Rc<Operation>,
    cancel: watch::Sender<Option<CancelReason>>,
    on_interrupt: Option<InterruptHook>,
}

impl Entry {
    fn interrupt(self) {
        self.operation.settle(OperationOutcome::Interrupted);
        if let Some(hook) = self.on_interrupt {
            hook();
        }
        self.cancel.send_replace(Some(CancelReason::Interrupted));
    }
}

/// Grants exclusive control to one operation at a time.
pub struct OperationArbiter {
    current: RefCell<Option<Entry>>,
    observer: watch::Sender<Option<OperationInfo>>,
}

impl Default for OperationArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationArbiter {
    pub fn new() -> Self {
        let (observer, _) = watch::channel(None);
        Self {
            current: RefCell::new(None),
            observer,
        }
    }

    /// Records `operation` as the active one and returns its signal.
    ///
    /// Any operation already on record is settled `Interrupted` and its
    /// signal fired before this returns.
    pub fn request_control(&self, operation: &Rc<Operation>) -> CancellationSignal {
        let previous = self.current.borrow_mut().take();
        if let Some(previous) = previous {
            tracing::info!(
                "{} interrupted by {}",
                previous.operation.id(),
                operation.id()
            );
            previous.interrupt();
        }

        let (cancel, rx) = watch::channel(None);
        *self.current.borrow_mut() = Some(Entry {
            operation: Rc::clone(operation),
            cancel,
            on_interrupt: None,
        });
        self.refresh();
        CancellationSignal { rx }
    }

    /// Runs `hook` synchronously if operation `id` is interrupted while on
    /// record. Dropped unrun on release. Returns false if `id` is not active.
    pub fn on_interrupt(&self, id: OperationId, hook: InterruptHook) -> bool {
        match self.current.borrow_mut().as_mut() {
            Some(entry) if entry.operation.id() == id => {
                entry.on_interrupt = Some(hook);
                true
            }
            _ => false,
        }
    }

    /// Snapshot of the active operation
    pub fn current(&self) -> Option<OperationInfo> {
        self.current.borrow().as_ref().map(|e| e.operation.info())
    }

    pub fn current_operation(&self) -> Option<Rc<Operation>> {
        self.current
            .borrow()
            .as_ref()
            .map(|e| Rc::clone(&e.operation))
    }

    pub fn is_active(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// Observe the active operation
    pub fn subscribe(&self) -> watch::Receiver<Option<OperationInfo>> {
        self.observer.subscribe()
    }

    /// Clears the record iff `id` is still the active operation.
    pub fn release(&self, id: OperationId) -> bool {
        let released = {
            let mut current = self.current.borrow_mut();
            match current.as_ref() {
                Some(entry) if entry.operation.id() == id => {
                    current.take();
                    true
                }
                _ => false,
            }
        };
        if released {
            tracing::debug!("{} released control", id);
            self.refresh();
        }
        released
    }

    /// Asks the active session to cancel. The session settles the outcome.
    pub fn cancel_current(&self) -> bool {
        match self.current.borrow().as_ref() {
            Some(entry) => {
                tracing::info!("Cancelling {}", entry.operation.id());
                entry.cancel.send_replace(Some(CancelReason::Cancelled));
                true
            }
            None => false,
        }
    }

    /// Interrupts whatever is active.
    pub fn shutdown(&self) {
        let previous = self.current.borrow_mut().take();
        if let Some(entry) = previous {
            tracing::info!("{} interrupted by shutdown", entry.operation.id());
            entry.interrupt();
            self.refresh();
        }
    }

    /// Republishes the active operation's snapshot to observers.
    pub fn refresh(&self) {
        let info = self.current();
        self.observer.send_replace(info);
    }
}
