//! Listeners that react to emitted events.

pub mod callback_listener;

use std::fmt;
use std::sync::Arc;

use anyhow::Result;

pub use callback_listener::CallbackListener;

use crate::event::Event;
use crate::event::EventKey;

/// Trait for event listeners.
///
/// A listener is bound to exactly one event type through [`Listener::Event`].
/// Returning `Err` from [`invoke`](Listener::invoke) aborts the emission that
/// called it and propagates to the emitter.
pub trait Listener: Send + Sync + 'static {
    type Event: Event;

    /// Called when an event of type `Self::Event` is emitted.
    fn invoke(&self, event: &mut Self::Event) -> Result<()>;

    /// Whether the dispatcher removes this listener after every invocation.
    fn evict_after_invocation(&self) -> bool {
        false
    }
}

/// Type-erased listener for event type `E`.
pub type DynListener<E> = dyn Listener<Event = E>;

/// Reference to a registered listener, used to remove it later.
///
/// Two handles match when they point at the same listener allocation; a
/// listener appended twice is matched (and removed) by either handle.
pub struct ListenerHandle<E: Event> {
    listener: Arc<DynListener<E>>,
}

impl<E: Event> ListenerHandle<E> {
    pub fn new<L: Listener<Event = E>>(listener: Arc<L>) -> Self {
        Self { listener }
    }

    pub fn event_key(&self) -> EventKey {
        EventKey::of::<E>()
    }

    /// Reference identity, not value equality.
    pub fn matches(&self, other: &ListenerHandle<E>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.listener), Arc::as_ptr(&other.listener))
    }

    pub fn invoke(&self, event: &mut E) -> Result<()> {
        self.listener.invoke(event)
    }

    pub fn evict_after_invocation(&self) -> bool {
        self.listener.evict_after_invocation()
    }
}

impl<E: Event> Clone for ListenerHandle<E> {
    fn clone(&self) -> Self {
        Self {
            listener: Arc::clone(&self.listener),
        }
    }
}

impl<E: Event> fmt::Debug for ListenerHandle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("event", &self.event_key().name())
            .field("listener", &Arc::as_ptr(&self.listener).cast::<()>())
            .finish()
    }
}
