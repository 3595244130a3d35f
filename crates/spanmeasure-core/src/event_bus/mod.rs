//! # Event Bus Module
//!
//! Publish/subscribe distribution of measurement events.
//!
//! Each measurement loop is handed an explicit `Arc<EventBus>`; there is no
//! process-wide instance.
//!
//! ## Usage
//!
//! ```rust
//! use spanmeasure_core::event_bus::{EventBus, EventCategory, EventFilter, MeasureEvent};
//!
//! let bus = EventBus::new();
//! bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::Point]),
//!     |event| {
//!         if let MeasureEvent::Point(point) = event {
//!             println!("point event: {:?}", point);
//!         }
//!     },
//! );
//! assert_eq!(bus.callback_count(), 1);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
