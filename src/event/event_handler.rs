use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use anyhow::Result;
use log::trace;

use crate::error::EventError;
use crate::event::Event;
use crate::event::EventKey;
use crate::listener::CallbackListener;
use crate::listener::Listener;
use crate::listener::ListenerHandle;

/// Outcome of a single emission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Emission {
    /// Number of listeners that were called.
    pub invoked: usize,
    /// Whether a listener canceled the event.
    pub canceled: bool,
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum Position {
    Front,
    Back,
}

/// Registered listener plus the id used to evict this exact registration.
///
/// `claimed` is shared by every snapshot of the entry; a listener evicted
/// after invocation runs only for the pass that claims it first.
pub(crate) struct Entry<E: Event> {
    pub(crate) id: u64,
    pub(crate) listener: ListenerHandle<E>,
    claimed: Arc<AtomicBool>,
}

impl<E: Event> Entry<E> {
    fn claim(&self) -> bool {
        !self.claimed.swap(true, Ordering::AcqRel)
    }

    fn release(&self) {
        self.claimed.store(false, Ordering::Release);
    }
}

impl<E: Event> Clone for Entry<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            listener: self.listener.clone(),
            claimed: Arc::clone(&self.claimed),
        }
    }
}

/// Result of walking a sequence of entries once.
pub(crate) struct Pass {
    pub(crate) invoked: usize,
    pub(crate) canceled: bool,
    /// Positions in the walked sequence, ascending.
    pub(crate) evicting: Vec<usize>,
    pub(crate) failure: Option<anyhow::Error>,
}

impl Pass {
    /// Invokes `entries` in order until the sequence ends, a listener
    /// cancels or a listener fails.
    ///
    /// The sequence is never mutated here; the caller applies `evicting`
    /// once the walk is over.
    pub(crate) fn run<E: Event>(entries: &[Entry<E>], event: &mut E) -> Self {
        let mut pass = Self {
            invoked: 0,
            canceled: false,
            evicting: Vec::new(),
            failure: None,
        };

        for (index, entry) in entries.iter().enumerate() {
            let single_use = entry.listener.evict_after_invocation();
            if single_use && !entry.claim() {
                continue;
            }

            let outcome = entry.listener.invoke(event);
            pass.invoked += 1;

            let evict_requested = event.flags_mut().take_eviction();
            let canceled = event.is_canceled();
            event.reset_after_call();

            if let Err(source) = outcome {
                if single_use {
                    entry.release();
                }
                pass.failure = Some(source);
                break;
            }
            if evict_requested || single_use {
                pass.evicting.push(index);
            }
            if canceled {
                pass.canceled = true;
                break;
            }
        }

        pass
    }

    pub(crate) fn into_result(self, key: EventKey) -> Result<Emission, EventError> {
        match self.failure {
            Some(source) => Err(EventError::ListenerFailed {
                event: key.name(),
                source,
            }),
            None => Ok(Emission {
                invoked: self.invoked,
                canceled: self.canceled,
            }),
        }
    }
}

/// Ordered listeners bound to one event type.
///
/// Registration order is invocation order; [`prepend`](EventHandler::prepend)
/// puts a listener in front of everything registered so far.
pub struct EventHandler<E: Event> {
    entries: Vec<Entry<E>>,
    next_id: u64,
}

impl<E: Event> EventHandler<E> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    pub fn key(&self) -> EventKey {
        EventKey::of::<E>()
    }

    /// Appends a persistent callback.
    pub fn on<F>(&mut self, callback: F) -> ListenerHandle<E>
    where
        F: Fn(&mut E) -> Result<()> + Send + Sync + 'static,
    {
        self.append(Arc::new(CallbackListener::new(callback)))
    }

    /// Appends a callback that is evicted after its first invocation.
    pub fn once<F>(&mut self, callback: F) -> ListenerHandle<E>
    where
        F: Fn(&mut E) -> Result<()> + Send + Sync + 'static,
    {
        self.append(Arc::new(CallbackListener::once(callback)))
    }

    /// Append a listener to the end of the list.
    pub fn append<L: Listener<Event = E>>(&mut self, listener: Arc<L>) -> ListenerHandle<E> {
        let handle = ListenerHandle::new(listener);
        self.insert(handle.clone(), Position::Back);
        handle
    }

    /// Prepend a listener to the beginning of the list.
    pub fn prepend<L: Listener<Event = E>>(&mut self, listener: Arc<L>) -> ListenerHandle<E> {
        let handle = ListenerHandle::new(listener);
        self.insert(handle.clone(), Position::Front);
        handle
    }

    fn insert(&mut self, listener: ListenerHandle<E>, position: Position) {
        let id = self.next_id;
        self.next_id += 1;
        self.insert_with_id(id, listener, position);
    }

    /// Inserts under an id chosen by the caller, which must keep ids unique
    /// for as long as a snapshot may refer to them.
    pub(crate) fn insert_with_id(
        &mut self,
        id: u64,
        listener: ListenerHandle<E>,
        position: Position,
    ) {
        let entry = Entry {
            id,
            listener,
            claimed: Arc::new(AtomicBool::new(false)),
        };
        match position {
            Position::Front => self.entries.insert(0, entry),
            Position::Back => self.entries.push(entry),
        }
    }

    pub fn has_listeners(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn has_no_listeners(&self) -> bool {
        !self.has_listeners()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every registration of `listener`.
    /// Returns the number of listeners that were removed.
    pub fn remove_listener(&mut self, listener: &ListenerHandle<E>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !entry.listener.matches(listener));
        before - self.entries.len()
    }

    /// Returns the number of listeners that were removed.
    pub fn remove_all_listeners(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// Calls the listeners in order and returns how many were called and
    /// whether one of them canceled the event.
    ///
    /// Once-listeners and listeners that asked for eviction are removed after
    /// the pass, keeping the relative order of the survivors.
    pub fn emit(&mut self, event: &mut E) -> Result<Emission, EventError> {
        let pass = Pass::run(&self.entries, event);
        self.compact(&pass.evicting);
        pass.into_result(self.key())
    }

    /// Same as [`emit`](EventHandler::emit) for a type-erased event.
    pub fn emit_dyn(&mut self, event: &mut dyn Event) -> Result<Emission, EventError> {
        let actual = event.event_name();
        match event.as_any_mut().downcast_mut::<E>() {
            Some(event) => self.emit(event),
            None => Err(EventError::TypeMismatch {
                expected: self.key().name(),
                actual,
            }),
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<Entry<E>> {
        self.entries.clone()
    }

    /// Drops the entries at the given ascending positions in one pass.
    fn compact(&mut self, evicting: &[usize]) {
        if evicting.is_empty() {
            return;
        }
        let mut evicting = evicting.iter().copied().peekable();
        let mut position = 0;
        self.entries.retain(|_| {
            let evict = evicting.next_if_eq(&position).is_some();
            position += 1;
            !evict
        });
        trace!("Evicted listeners from {} handler", self.key());
    }

    /// Drops the entries with the given ids, wherever they sit now.
    pub(crate) fn evict(&mut self, ids: &[u64]) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !ids.contains(&entry.id));
        before - self.entries.len()
    }
}

impl<E: Event> Default for EventHandler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for EventHandler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandler")
            .field("event", &self.key().name())
            .field("listeners", &self.entries.len())
            .finish()
    }
}
