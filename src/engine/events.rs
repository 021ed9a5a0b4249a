//! Engine notifications
//!
//! Events are delivered synchronously, in subscription order, on the
//! controller's thread. There is no global bus; each controller owns its
//! registry.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

/// Identity of the engine that emitted an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineId(Uuid);

impl EngineId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EngineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What happened
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    CanPlay,
    CanPlayThrough,
    Ended,
    Error { detail: String },
    LoadedData,
    Play,
    Pause,
    RateChange,
    Seeked,
    TimeUpdate,
    VolumeChange,
}

impl EventKind {
    /// Conventional media-element event name
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::CanPlay => "canplay",
            EventKind::CanPlayThrough => "canplaythrough",
            EventKind::Ended => "ended",
            EventKind::Error { .. } => "error",
            EventKind::LoadedData => "loadeddata",
            EventKind::Play => "play",
            EventKind::Pause => "pause",
            EventKind::RateChange => "ratechange",
            EventKind::Seeked => "seeked",
            EventKind::TimeUpdate => "timeupdate",
            EventKind::VolumeChange => "volumechange",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Error { detail } => write!(f, "error: {}", detail),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// A notification and the engine it came from
#[derive(Debug, Clone, PartialEq)]
pub struct MediaEvent {
    pub engine: EngineId,
    pub kind: EventKind,
}

/// Receiver of engine notifications
pub trait EventSink: Send {
    fn on_event(&mut self, event: &MediaEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&MediaEvent) + Send,
{
    fn on_event(&mut self, event: &MediaEvent) {
        self(event)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Observer registry owned by a controller
#[derive(Default)]
pub struct EventRegistry {
    next_id: u64,
    listeners: Vec<(ListenerId, Box<dyn EventSink>)>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<S>(&mut self, sink: S) -> ListenerId
    where
        S: EventSink + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(sink)));
        id
    }

    /// Returns false if `id` was not subscribed
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn emit(&mut self, event: &MediaEvent) {
        for (_, sink) in self.listeners.iter_mut() {
            sink.on_event(event);
        }
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Shared recording sink
///
/// Clones append to the same log, so one clone can be subscribed while
/// another is inspected.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<MediaEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MediaEvent> {
        self.events.lock().clone()
    }

    /// Names of all recorded events, oldest first
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.kind.name()).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind.name() == name)
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for EventLog {
    fn on_event(&mut self, event: &MediaEvent) {
        self.events.lock().push(event.clone());
    }
}
