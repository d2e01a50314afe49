//! Event handling embedded directly in a component.
//!
//! Unlike [`EventManager`](crate::event::EventManager), which is shared and
//! locks internally, [`EventHandlers`] is plain owned state: the owning
//! component emits through `&mut self` and no listener can reach back into
//! the registry while an emission runs.

use std::any::Any;
use std::collections::HashMap;

use crate::error::EventError;
use crate::event::Event;
use crate::event::EventKey;
use crate::event::event_handler::EventHandler;

/// Typed map of [`EventHandler`]s keyed by event type.
#[derive(Default)]
pub struct EventHandlers {
    handlers: HashMap<EventKey, Box<dyn Any + Send + Sync>>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<E: Event>(&self) -> Option<&EventHandler<E>> {
        self.handlers
            .get(&EventKey::of::<E>())
            .and_then(|handler| handler.downcast_ref::<EventHandler<E>>())
    }

    pub fn get_mut<E: Event>(&mut self) -> Option<&mut EventHandler<E>> {
        self.handlers
            .get_mut(&EventKey::of::<E>())
            .and_then(|handler| handler.downcast_mut::<EventHandler<E>>())
    }

    /// Returns the handler for `E`, creating an empty one if needed.
    pub fn resolve<E: Event>(&mut self) -> &mut EventHandler<E> {
        let key = EventKey::of::<E>();
        let slot = self
            .handlers
            .entry(key)
            .or_insert_with(|| Box::new(EventHandler::<E>::new()));
        match slot.downcast_mut::<EventHandler<E>>() {
            Some(handler) => handler,
            None => unreachable!("slot for {} holds a handler of another type", key),
        }
    }

    pub fn remove<E: Event>(&mut self) -> bool {
        self.handlers.remove(&EventKey::of::<E>()).is_some()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Gives a component its own event registry.
///
/// Implementors only provide access to their [`EventHandlers`]; everything
/// else has a default implementation.
pub trait HandlesEvents {
    fn event_handlers(&self) -> &EventHandlers;

    fn event_handlers_mut(&mut self) -> &mut EventHandlers;

    /// Emits to the handler for `E`, if any.
    /// Returns the number of listeners that were called.
    fn emit_event<E: Event>(&mut self, event: &mut E) -> Result<usize, EventError> {
        match self.event_handlers_mut().get_mut::<E>() {
            Some(handler) if handler.has_listeners() => {
                handler.emit(event).map(|emission| emission.invoked)
            }
            _ => Ok(0),
        }
    }

    fn event_has_listeners<E: Event>(&self) -> bool {
        self.event_handlers()
            .get::<E>()
            .is_some_and(EventHandler::has_listeners)
    }

    fn resolve_event_handler<E: Event>(&mut self) -> &mut EventHandler<E> {
        self.event_handlers_mut().resolve::<E>()
    }

    fn event_handler<E: Event>(&self) -> Option<&EventHandler<E>> {
        self.event_handlers().get::<E>()
    }

    fn remove_event_handler<E: Event>(&mut self) -> bool {
        self.event_handlers_mut().remove::<E>()
    }
}
