//! Common test utilities and sample events.

use std::sync::Arc;
use std::sync::Mutex;

use event_dispatch::event::EventFlags;
use event_dispatch::impl_event;

/// Sample event carrying the name of what is being saved.
#[derive(Clone, Debug, PartialEq)]
pub struct Saving {
    pub target: String,
    pub flags: EventFlags,
}

impl Saving {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            flags: EventFlags::new(),
        }
    }
}

impl_event!(Saving);

/// Second sample event, for checks across types.
#[derive(Clone, Debug, Default, PartialEq)]
#[allow(dead_code)]
pub struct Deleted {
    pub id: u64,
    pub flags: EventFlags,
}

impl_event!(Deleted);

/// Shared, ordered log of what listeners saw.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct Recorder {
    entries: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Callback recording the target of every `Saving` it receives.
    pub fn saving_targets(
        &self,
    ) -> impl Fn(&mut Saving) -> anyhow::Result<()> + Send + Sync + 'static {
        let recorder = self.clone();
        move |e: &mut Saving| {
            recorder.push(e.target.clone());
            Ok(())
        }
    }

    /// Callback recording a fixed label.
    pub fn label(
        &self,
        label: &'static str,
    ) -> impl Fn(&mut Saving) -> anyhow::Result<()> + Send + Sync + 'static {
        let recorder = self.clone();
        move |_: &mut Saving| {
            recorder.push(label);
            Ok(())
        }
    }
}
