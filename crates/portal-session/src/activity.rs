//! User-presence signals and the listener plumbing that carries them.
//!
//! [`ActivityHub`] is the host event target (the browser window in the
//! portal): anything that observes user interaction dispatches event names
//! into it. [`ActivityMonitor`] owns a set of listeners on a hub and removes
//! them again when detached or dropped.

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    MouseMove,
    KeyDown,
    Scroll,
    MouseDown,
    TouchStart,
    Click,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 6] = [
        ActivityKind::MouseMove,
        ActivityKind::KeyDown,
        ActivityKind::Scroll,
        ActivityKind::MouseDown,
        ActivityKind::TouchStart,
        ActivityKind::Click,
    ];

    pub fn event_name(&self) -> &'static str {
        match self {
            ActivityKind::MouseMove => "mousemove",
            ActivityKind::KeyDown => "keydown",
            ActivityKind::Scroll => "scroll",
            ActivityKind::MouseDown => "mousedown",
            ActivityKind::TouchStart => "touchstart",
            ActivityKind::Click => "click",
        }
    }
}

impl Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not an activity event: {0}")]
pub struct UnknownActivity(pub String);

impl FromStr for ActivityKind {
    type Err = UnknownActivity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityKind::ALL
            .into_iter()
            .find(|kind| kind.event_name() == s)
            .ok_or_else(|| UnknownActivity(s.to_string()))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ListenerId(pub u64);

pub type Listener = Arc<dyn Fn(ActivityKind) + Send + Sync>;

#[derive(Default)]
struct HubInner {
    next_id: u64,
    listeners: BTreeMap<ListenerId, (ActivityKind, Listener)>,
}

/// Process-wide registry of activity listeners.
///
/// Clones share the same registry.
#[derive(Clone, Default)]
pub struct ActivityHub {
    inner: Arc<Mutex<HubInner>>,
}

impl ActivityHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_listener(&self, kind: ActivityKind, listener: Listener) -> ListenerId {
        let mut inner = self.lock();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner.listeners.insert(id, (kind, listener));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.lock().listeners.remove(&id).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Dispatches a raw event name. Names that are not activity events reach
    /// no listener.
    pub fn dispatch(&self, event_name: &str) -> usize {
        match event_name.parse::<ActivityKind>() {
            Ok(kind) => self.dispatch_kind(kind),
            Err(_) => 0,
        }
    }

    /// Runs every listener registered for `kind` and returns how many ran.
    ///
    /// Listeners added during the dispatch do not run until the next one. A
    /// listener removed during the dispatch is skipped.
    pub fn dispatch_kind(&self, kind: ActivityKind) -> usize {
        let matching: Vec<(ListenerId, Listener)> = self
            .lock()
            .listeners
            .iter()
            .filter(|(_, (k, _))| *k == kind)
            .map(|(id, (_, listener))| (*id, listener.clone()))
            .collect();
        let mut ran = 0;
        for (id, listener) in matching {
            if !self.lock().listeners.contains_key(&id) {
                continue;
            }
            listener(kind);
            ran += 1;
        }
        ran
    }
}

/// A set of listeners registered on a hub on behalf of one owner.
pub struct ActivityMonitor {
    hub: ActivityHub,
    ids: Vec<ListenerId>,
}

impl ActivityMonitor {
    pub fn attach<F>(hub: &ActivityHub, kinds: &[ActivityKind], on_activity: F) -> Self
    where
        F: Fn(ActivityKind) + Send + Sync + 'static,
    {
        let on_activity: Listener = Arc::new(on_activity);
        let ids = kinds
            .iter()
            .map(|kind| hub.add_listener(*kind, on_activity.clone()))
            .collect();
        Self {
            hub: hub.clone(),
            ids,
        }
    }

    pub fn is_attached(&self) -> bool {
        !self.ids.is_empty()
    }

    pub fn detach(&mut self) {
        for id in self.ids.drain(..) {
            self.hub.remove_listener(id);
        }
    }
}

impl Drop for ActivityMonitor {
    fn drop(&mut self) {
        self.detach();
    }
}
