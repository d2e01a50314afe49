//! Events, their control flags and the registries that dispatch them.

pub mod event_handler;
pub mod event_manager;
pub mod handles_events;

use std::any::Any;
use std::any::TypeId;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;

pub use event_handler::Emission;
pub use event_handler::EventHandler;
pub use event_manager::EventManager;
pub use handles_events::EventHandlers;
pub use handles_events::HandlesEvents;

/// Control flags consulted by the dispatch loop after every listener call.
///
/// Concrete events embed one of these and expose it through
/// [`Event::flags`] / [`Event::flags_mut`]. The [`impl_event!`](crate::impl_event)
/// macro does the wiring for structs with a `flags` field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventFlags {
    propagation_stopped: bool,
    cancel_requested: bool,
    evict_requested: bool,
}

impl EventFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested
    }

    pub fn evict_requested(&self) -> bool {
        self.evict_requested
    }

    /// Reads and clears the eviction request.
    pub(crate) fn take_eviction(&mut self) -> bool {
        std::mem::take(&mut self.evict_requested)
    }
}

/// Marker trait for values that can be emitted through an [`EventManager`]
/// or an [`EventHandler`].
///
/// Listener callbacks mutate the flags to steer the dispatch loop; the loop
/// resets the per-call state so one event value can be emitted repeatedly.
pub trait Event: Any + Send + Sync + 'static {
    /// Downcast this event to a concrete type.
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn flags(&self) -> &EventFlags;

    fn flags_mut(&mut self) -> &mut EventFlags;

    /// Get the name of the event type.
    fn event_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Marks the event as no longer propagating.
    ///
    /// Dispatch targets the exact event type only, so the current pass still
    /// reaches every listener; the flag is for listeners and emitters to read.
    /// Unlike [`cancel`](Event::cancel) it is never reset by the dispatcher.
    fn stop_propagation(&mut self) {
        self.flags_mut().propagation_stopped = true;
    }

    fn is_propagation_stopped(&self) -> bool {
        self.flags().propagation_stopped
    }

    /// Stops the current pass after this listener and reports the
    /// cancellation through [`Emission::canceled`].
    fn cancel(&mut self) {
        self.flags_mut().cancel_requested = true;
    }

    fn is_canceled(&self) -> bool {
        self.flags().cancel_requested
    }

    /// Mark the listener currently running for removal.
    /// When this is set to **true**, the listener is evicted once it returns,
    /// whether or not it was registered as a once-listener.
    fn evict_callback(&mut self, toggle: bool) {
        self.flags_mut().evict_requested = toggle;
    }

    fn will_evict_callback(&self) -> bool {
        self.flags().evict_requested
    }

    /// Clears the cancellation request after a listener call.
    fn reset_after_call(&mut self) {
        self.flags_mut().cancel_requested = false;
    }
}

/// Stable identifier of an event type, used as the registry key.
///
/// Equality and hashing only look at the [`TypeId`]; the name is carried
/// along for logs and error messages.
#[derive(Clone, Copy, Debug)]
pub struct EventKey {
    id: TypeId,
    name: &'static str,
}

impl EventKey {
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
        }
    }

    /// Key of the runtime type behind a type-erased event.
    pub fn of_val(event: &dyn Event) -> Self {
        Self {
            id: event.as_any().type_id(),
            name: event.event_name(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventKey {}

impl Hash for EventKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
