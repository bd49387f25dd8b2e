//! Type system utilities and aliases.
//!
//! - [`aliases`]: `Rc<RefCell<T>>` aliases and local callback types.

pub mod aliases;

pub use aliases::*;
