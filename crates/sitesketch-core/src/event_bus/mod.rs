//! # Event Bus Module
//!
//! Publish/subscribe distribution of application events. The editor
//! publishes operation and layer events, the settings controller publishes
//! settings events, and the replay CLI records everything through history.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sitesketch_core::event_bus::{EventBus, AppEvent, EventFilter, EventCategory};
//!
//! let bus = EventBus::new();
//! let subscription = bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::Operation]),
//!     |event| tracing::info!("{}", event.description()),
//! );
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
