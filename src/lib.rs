//! event-dispatch - Synchronous, in-process event dispatching.
//!
//! Components register listeners for event types and an [`EventManager`]
//! calls them, in order, whenever a matching event is emitted:
//! - Append/prepend ordering, once-listeners and self-eviction
//! - Cancellation from inside a listener
//! - Re-entrant emission and registration from listener callbacks
//! - Post-emission and listener lifecycle hooks
//!
//! ```rust
//! use event_dispatch::event::Event;
//! use event_dispatch::event::EventFlags;
//! use event_dispatch::event::EventManager;
//! use event_dispatch::impl_event;
//!
//! #[derive(Default)]
//! struct Saving {
//!     flags: EventFlags,
//! }
//!
//! impl_event!(Saving);
//!
//! let events = EventManager::new();
//! events.on(|e: &mut Saving| {
//!     e.cancel();
//!     Ok(())
//! });
//!
//! let emission = events.emit(&mut Saving::default()).unwrap();
//! assert_eq!(emission.invoked, 1);
//! assert!(emission.canceled);
//! ```
//!
//! [`EventManager`]: event::EventManager

pub mod config;
pub mod error;
pub mod event;
pub mod listener;
pub mod logging;
pub mod macros;
