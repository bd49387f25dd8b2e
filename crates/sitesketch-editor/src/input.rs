//! Input routing
//!
//! The view pushes [`InputEvent`]s into an [`InputRouter`]. At most one
//! [`InputCapture`] holds focus at a time and receives every event; without a
//! capture, events go to the idle listener (the editor's click-to-update
//! loop). A new capture replaces the old one, whose stream then ends.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tokio::sync::mpsc;

/// Position in screen pixels, origin top-left
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// A pointer or keyboard event from the view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerDown {
        at: ScreenPoint,
        button: PointerButton,
    },
    PointerMove {
        at: ScreenPoint,
    },
    PointerUp {
        at: ScreenPoint,
        button: PointerButton,
    },
    Click {
        at: ScreenPoint,
        button: PointerButton,
    },
    DoubleClick {
        at: ScreenPoint,
    },
    KeyDown {
        key: String,
    },
}

/// What a key press means to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Complete,
    Cancel,
    Delete,
}

/// Key names bound to session actions
#[derive(Debug, Clone, PartialEq)]
pub struct KeyMap {
    pub complete: Vec<String>,
    pub cancel: Vec<String>,
    pub delete: Vec<String>,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            complete: vec!["c".to_string()],
            cancel: vec!["Escape".to_string()],
            delete: vec!["Delete".to_string(), "Backspace".to_string()],
        }
    }
}

impl KeyMap {
    /// Action bound to `key`, matched case-insensitively
    pub fn action(&self, key: &str) -> Option<KeyAction> {
        let bound = |keys: &[String]| keys.iter().any(|k| k.eq_ignore_ascii_case(key));
        if bound(&self.cancel) {
            Some(KeyAction::Cancel)
        } else if bound(&self.complete) {
            Some(KeyAction::Complete)
        } else if bound(&self.delete) {
            Some(KeyAction::Delete)
        } else {
            None
        }
    }
}

/// Where [`InputRouter::dispatch`] sent an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Captured,
    Idle,
    Dropped,
}

#[derive(Default)]
struct RouterState {
    capture: Option<(u64, mpsc::UnboundedSender<InputEvent>)>,
    idle: Option<mpsc::UnboundedSender<InputEvent>>,
    next_id: u64,
}

/// Routes view input to the capturing session or the idle listener.
#[derive(Default)]
pub struct InputRouter {
    state: RefCell<RouterState>,
}

impl InputRouter {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn dispatch(&self, event: InputEvent) -> Delivery {
        let mut state = self.state.borrow_mut();

        if let Some((id, tx)) = &state.capture {
            match tx.send(event) {
                Ok(()) => return Delivery::Captured,
                Err(mpsc::error::SendError(returned)) => {
                    tracing::debug!("Capture {} went away, clearing", id);
                    state.capture = None;
                    return Self::to_idle(&mut state, returned);
                }
            }
        }
        Self::to_idle(&mut state, event)
    }

    fn to_idle(state: &mut RouterState, event: InputEvent) -> Delivery {
        if let Some(tx) = &state.idle {
            if tx.send(event).is_ok() {
                return Delivery::Idle;
            }
            state.idle = None;
        }
        Delivery::Dropped
    }

    /// Takes exclusive input focus. Any previous capture's stream ends.
    pub fn capture(self: &Rc<Self>) -> InputCapture {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut state = self.state.borrow_mut();
            state.next_id += 1;
            let id = state.next_id;
            if let Some((previous, _)) = state.capture.replace((id, tx)) {
                tracing::debug!("Capture {} replaced by {}", previous, id);
            }
            id
        };
        InputCapture {
            id,
            rx,
            router: Rc::downgrade(self),
            released: false,
        }
    }

    /// Receiver for events that arrive while nothing holds focus.
    ///
    /// Replaces any previous idle listener.
    pub fn listen_idle(&self) -> mpsc::UnboundedReceiver<InputEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.borrow_mut().idle = Some(tx);
        rx
    }

    pub fn is_captured(&self) -> bool {
        self.state.borrow().capture.is_some()
    }

    fn release(&self, id: u64) -> bool {
        let mut state = self.state.borrow_mut();
        match &state.capture {
            Some((current, _)) if *current == id => {
                state.capture = None;
                true
            }
            _ => false,
        }
    }
}

/// Exclusive input focus held by a session.
///
/// Focus is given back on [`release`](InputCapture::release) or drop,
/// whichever comes first.
pub struct InputCapture {
    id: u64,
    rx: mpsc::UnboundedReceiver<InputEvent>,
    router: Weak<InputRouter>,
    released: bool,
}

impl InputCapture {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next captured event; `None` once focus was taken by someone else.
    pub async fn next(&mut self) -> Option<InputEvent> {
        self.rx.recv().await
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.rx.close();
        if let Some(router) = self.router.upgrade() {
            if router.release(self.id) {
                tracing::debug!("Capture {} released", self.id);
            }
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for InputCapture {
    fn drop(&mut self) {
        self.release();
    }
}
