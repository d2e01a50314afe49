use std::fmt;

use anyhow::Result;

use crate::event::Event;
use crate::listener::Listener;

type Callback<E> = Box<dyn Fn(&mut E) -> Result<()> + Send + Sync>;

/// Listener wrapping a closure.
pub struct CallbackListener<E: Event> {
    callback: Callback<E>,
    once: bool,
}

impl<E: Event> CallbackListener<E> {
    /// Persistent listener: stays registered until removed or until the
    /// event asks for its eviction.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&mut E) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
            once: false,
        }
    }

    /// Listener evicted after its first invocation.
    pub fn once<F>(callback: F) -> Self
    where
        F: Fn(&mut E) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
            once: true,
        }
    }

    pub fn is_once(&self) -> bool {
        self.once
    }
}

impl<E: Event> Listener for CallbackListener<E> {
    type Event = E;

    fn invoke(&self, event: &mut E) -> Result<()> {
        (self.callback)(event)
    }

    fn evict_after_invocation(&self) -> bool {
        self.once
    }
}

impl<E: Event> fmt::Debug for CallbackListener<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackListener")
            .field("event", &std::any::type_name::<E>())
            .field("once", &self.once)
            .finish_non_exhaustive()
    }
}
