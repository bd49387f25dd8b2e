//! Type aliases for commonly used complex types.
//!
//! The editor is single-threaded: layers, sessions and listener lists are
//! shared through `Rc<RefCell<_>>` and driven from a `tokio::task::LocalSet`.
//!
//! ```rust,ignore
//! use sitesketch_core::types::*;
//!
//! let layer: Shared<GraphicsLayer> = shared(GraphicsLayer::new("sketches"));
//! let listeners: SharedVec<LocalCallback<CompletedEdit>> = shared(Vec::new());
//! ```

use std::cell::RefCell;
use std::rc::Rc;

/// A reference-counted, interior-mutable wrapper for single-threaded sharing.
pub type Shared<T> = Rc<RefCell<T>>;

/// A shared vector for single-threaded collection management.
pub type SharedVec<T> = Rc<RefCell<Vec<T>>>;

/// A single-threaded listener receiving a borrowed payload.
///
/// Stored as `Rc` so a listener list can be cloned out of its `RefCell`
/// before dispatch, letting listeners register further listeners.
pub type LocalCallback<T> = Rc<dyn Fn(&T)>;

/// Create a new `Shared<T>` from a value.
#[inline]
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}
