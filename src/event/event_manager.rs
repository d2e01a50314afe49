use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use anyhow::Result;
use log::debug;
use log::trace;
use log::warn;
use parking_lot::Mutex;

use crate::config::Config;
use crate::error::EventError;
use crate::event::Event;
use crate::event::EventKey;
use crate::event::event_handler::Emission;
use crate::event::event_handler::Entry;
use crate::event::event_handler::EventHandler;
use crate::event::event_handler::Pass;
use crate::event::event_handler::Position;
use crate::listener::CallbackListener;
use crate::listener::Listener;
use crate::listener::ListenerHandle;
use crate::logging::log_emission;

type EmittedHook = dyn Fn(&dyn Event, usize) + Send + Sync;
type AddedHook = dyn Fn(EventKey) + Send + Sync;
type RemovedHook = dyn Fn(EventKey, usize) + Send + Sync;
type ErasedEmit = fn(&EventManager, &mut dyn Event) -> Result<Emission, EventError>;

/// Handler stored under its event key, together with the entry point that
/// re-types an erased event for it.
struct Slot {
    handler: Box<dyn Any + Send + Sync>,
    emit: ErasedEmit,
}

impl Slot {
    fn new<E: Event>() -> Self {
        Self {
            handler: Box::new(EventHandler::<E>::new()),
            emit: emit_erased::<E>,
        }
    }

    fn handler<E: Event>(&self) -> Option<&EventHandler<E>> {
        self.handler.downcast_ref::<EventHandler<E>>()
    }

    fn handler_mut<E: Event>(&mut self) -> Option<&mut EventHandler<E>> {
        self.handler.downcast_mut::<EventHandler<E>>()
    }
}

fn emit_erased<E: Event>(
    manager: &EventManager,
    event: &mut dyn Event,
) -> Result<Emission, EventError> {
    let actual = event.event_name();
    match event.as_any_mut().downcast_mut::<E>() {
        Some(event) => manager.emit(event),
        None => Err(EventError::TypeMismatch {
            expected: std::any::type_name::<E>(),
            actual,
        }),
    }
}

/// Maps event types to their [`EventHandler`]s and runs emissions.
///
/// A handler exists for a type exactly as long as it has at least one
/// listener. Locks are only held while the registry is read or mutated, never
/// while a listener or hook runs, so listeners may register, remove and emit
/// from inside their callbacks.
pub struct EventManager {
    handlers: Mutex<HashMap<EventKey, Slot>>,
    /// Entry ids, unique across every handler this manager ever creates.
    next_id: AtomicU64,
    emitted_hooks: Mutex<Vec<Arc<EmittedHook>>>,
    added_hooks: Mutex<Vec<Arc<AddedHook>>>,
    removed_hooks: Mutex<Vec<Arc<RemovedHook>>>,
}

impl EventManager {
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            emitted_hooks: Mutex::new(Vec::new()),
            added_hooks: Mutex::new(Vec::new()),
            removed_hooks: Mutex::new(Vec::new()),
        }
    }

    pub fn with_config(config: &Config) -> Self {
        let manager = Self::new();
        if config.trace_emissions {
            debug!("Emission tracing enabled");
            manager.on_emitted(log_emission);
        }
        manager
    }

    /// Appends a callback listener for `E`.
    ///
    /// The event type comes from the callback's parameter, or from a
    /// turbofish: `events.on::<Saving, _>(...)`.
    pub fn on<E, F>(&self, callback: F) -> ListenerHandle<E>
    where
        E: Event,
        F: Fn(&mut E) -> Result<()> + Send + Sync + 'static,
    {
        self.append(Arc::new(CallbackListener::new(callback)))
    }

    /// Appends a callback listener for `E` that is removed after it is
    /// called once.
    pub fn once<E, F>(&self, callback: F) -> ListenerHandle<E>
    where
        E: Event,
        F: Fn(&mut E) -> Result<()> + Send + Sync + 'static,
    {
        self.append(Arc::new(CallbackListener::once(callback)))
    }

    /// Appends a listener to the end of the list for its event.
    pub fn append<L: Listener>(&self, listener: Arc<L>) -> ListenerHandle<L::Event> {
        self.attach(ListenerHandle::new(listener), Position::Back)
    }

    /// Prepends a listener to the beginning of the list for its event.
    pub fn prepend<L: Listener>(&self, listener: Arc<L>) -> ListenerHandle<L::Event> {
        self.attach(ListenerHandle::new(listener), Position::Front)
    }

    fn attach<E: Event>(
        &self,
        listener: ListenerHandle<E>,
        position: Position,
    ) -> ListenerHandle<E> {
        let key = listener.event_key();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut handlers = self.handlers.lock();
            let slot = handlers.entry(key).or_insert_with(|| {
                debug!("Creating handler for {}", key);
                Slot::new::<E>()
            });
            if let Some(handler) = slot.handler_mut::<E>() {
                handler.insert_with_id(id, listener.clone(), position);
            }
        }
        trace!("Registered listener for {} ({:?})", key, position);

        let hooks = self.added_hooks.lock().clone();
        for hook in hooks {
            hook(key);
        }
        listener
    }

    /// Checks if there are any listeners for the given event.
    pub fn has_listeners<E: Event>(&self) -> bool {
        self.has_listeners_for(EventKey::of::<E>())
    }

    pub fn has_listeners_for(&self, key: EventKey) -> bool {
        self.handlers.lock().contains_key(&key)
    }

    pub fn listener_count<E: Event>(&self) -> usize {
        self.handlers
            .lock()
            .get(&EventKey::of::<E>())
            .and_then(|slot| slot.handler::<E>())
            .map_or(0, EventHandler::len)
    }

    /// Calls all listeners for the given event, then every `on_emitted` hook.
    ///
    /// The listeners called are the ones registered when the emission starts;
    /// listeners added meanwhile only see later emissions.
    pub fn emit<E: Event>(&self, event: &mut E) -> Result<Emission, EventError> {
        let key = EventKey::of::<E>();
        let entries = self
            .handlers
            .lock()
            .get(&key)
            .and_then(|slot| slot.handler::<E>())
            .map(EventHandler::snapshot);

        let emission = match entries {
            Some(entries) => {
                let pass = Pass::run(&entries, event);
                self.evict(key, &entries, &pass.evicting);
                pass.into_result(key).inspect_err(|e| {
                    warn!("Emission of {} aborted: {}", key, e);
                })?
            }
            None => Emission::default(),
        };

        self.notify_emitted(event, emission.invoked);
        Ok(emission)
    }

    /// Emits a type-erased event to the listeners of its runtime type.
    pub fn emit_dyn(&self, event: &mut dyn Event) -> Result<Emission, EventError> {
        let key = EventKey::of_val(event);
        let emit = self.handlers.lock().get(&key).map(|slot| slot.emit);
        match emit {
            Some(emit) => emit(self, event),
            None => {
                self.notify_emitted(event, 0);
                Ok(Emission::default())
            }
        }
    }

    /// Builds and emits the event only if something listens for `E`.
    ///
    /// Useful when creating the event is costly. Returns the emitted event
    /// after the listeners ran, or `None` when `factory` was not called.
    pub fn emit_if_listening<E, F>(
        &self,
        factory: F,
    ) -> Result<Option<(E, Emission)>, EventError>
    where
        E: Event,
        F: FnOnce() -> E,
    {
        if !self.has_listeners::<E>() {
            return Ok(None);
        }
        let mut event = factory();
        let emission = self.emit(&mut event)?;
        Ok(Some((event, emission)))
    }

    /// Type-erased form of [`emit_if_listening`](EventManager::emit_if_listening).
    /// The factory must build an event of the type named by `key`.
    pub fn emit_if_listening_dyn<F>(
        &self,
        key: EventKey,
        factory: F,
    ) -> Result<Option<(Box<dyn Event>, Emission)>, EventError>
    where
        F: FnOnce() -> Box<dyn Event>,
    {
        if !self.has_listeners_for(key) {
            return Ok(None);
        }
        let mut event = factory();
        let actual = EventKey::of_val(&*event);
        if actual != key {
            return Err(EventError::TypeMismatch {
                expected: key.name(),
                actual: actual.name(),
            });
        }
        let emission = self.emit_dyn(&mut *event)?;
        Ok(Some((event, emission)))
    }

    /// Removes every registration of the given listener.
    /// Returns the number of listeners that were removed.
    pub fn remove_listener<E: Event>(&self, listener: &ListenerHandle<E>) -> usize {
        let key = listener.event_key();
        let count = {
            let mut handlers = self.handlers.lock();
            let Some(slot) = handlers.get_mut(&key) else {
                return 0;
            };
            let (count, emptied) = match slot.handler_mut::<E>() {
                Some(handler) => (handler.remove_listener(listener), handler.has_no_listeners()),
                None => (0, false),
            };
            if emptied {
                handlers.remove(&key);
                debug!("Discarded empty handler for {}", key);
            }
            count
        };

        if count > 0 {
            trace!("Removed {} listener(s) for {}", count, key);
            self.notify_removed(key, count);
        }
        count
    }

    /// Remove all listeners for the given event.
    pub fn remove_all_listeners<E: Event>(&self) -> bool {
        let key = EventKey::of::<E>();
        let Some(slot) = self.handlers.lock().remove(&key) else {
            return false;
        };
        let count = slot.handler::<E>().map_or(0, EventHandler::len);
        debug!("Removed all {} listener(s) for {}", count, key);
        self.notify_removed(key, count);
        true
    }

    /// Registers a callback that will be invoked whenever an event is
    /// emitted, with the number of listeners that were called.
    pub fn on_emitted<F>(&self, hook: F)
    where
        F: Fn(&dyn Event, usize) + Send + Sync + 'static,
    {
        self.emitted_hooks.lock().push(Arc::new(hook));
    }

    /// Registers a callback invoked after a listener is registered.
    pub fn on_listener_added<F>(&self, hook: F)
    where
        F: Fn(EventKey) + Send + Sync + 'static,
    {
        self.added_hooks.lock().push(Arc::new(hook));
    }

    /// Registers a callback invoked after listeners are explicitly removed,
    /// with the number removed.
    pub fn on_listener_removed<F>(&self, hook: F)
    where
        F: Fn(EventKey, usize) + Send + Sync + 'static,
    {
        self.removed_hooks.lock().push(Arc::new(hook));
    }

    fn evict<E: Event>(&self, key: EventKey, entries: &[Entry<E>], evicting: &[usize]) {
        if evicting.is_empty() {
            return;
        }
        let ids: Vec<u64> = evicting.iter().map(|&index| entries[index].id).collect();

        let mut handlers = self.handlers.lock();
        let Some(slot) = handlers.get_mut(&key) else {
            return;
        };
        let emptied = match slot.handler_mut::<E>() {
            Some(handler) => {
                let evicted = handler.evict(&ids);
                trace!("Evicted {} listener(s) for {}", evicted, key);
                handler.has_no_listeners()
            }
            None => false,
        };
        if emptied {
            handlers.remove(&key);
            debug!("Discarded empty handler for {}", key);
        }
    }

    fn notify_emitted(&self, event: &dyn Event, invoked: usize) {
        let hooks = self.emitted_hooks.lock().clone();
        for hook in hooks {
            hook(event, invoked);
        }
    }

    fn notify_removed(&self, key: EventKey, count: usize) {
        let hooks = self.removed_hooks.lock().clone();
        for hook in hooks {
            hook(key, count);
        }
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.lock();
        let mut events: Vec<&'static str> = handlers.keys().map(|key| key.name()).collect();
        events.sort_unstable();
        f.debug_struct("EventManager")
            .field("events", &events)
            .field("emitted_hooks", &self.emitted_hooks.lock().len())
            .finish_non_exhaustive()
    }
}
