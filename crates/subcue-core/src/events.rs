use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::director::{DirectorObserver, DirectorState};
use crate::entry::Millis;

/// Every director notification as a value.
/// The CLI prints these; tests assert on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Started,
    Display {
        text: String,
        overlay: String,
    },
    Waiting {
        delay_ms: u64,
    },
    /// `count` entries from `start_index` were dropped.
    Loss {
        start_index: usize,
        count: usize,
    },
    Finished,
    StatusChanged {
        from: DirectorState,
        to: DirectorState,
    },
    Tick {
        instant_ms: Millis,
    },
}

impl Event {
    /// Ticks and status changes are bookkeeping; everything else changes
    /// what a viewer sees.
    pub fn is_visible(&self) -> bool {
        !matches!(self, Event::Tick { .. } | Event::StatusChanged { .. })
    }
}

/// Observer that records events into a shared buffer.
///
/// Clones share the buffer, so one handle goes to the director and the
/// other stays with the caller.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Event>> {
        // Poisoning is ignored; the buffer is only ever pushed to or drained.
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push(&self, event: Event) {
        self.lock().push(event);
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.lock())
    }

    /// Drain, keeping only [visible](Event::is_visible) events.
    pub fn take_visible(&self) -> Vec<Event> {
        self.take().into_iter().filter(Event::is_visible).collect()
    }

    pub fn snapshot(&self) -> Vec<Event> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl DirectorObserver for EventLog {
    fn on_start(&mut self) {
        self.push(Event::Started);
    }

    fn on_display(&mut self, text: &str, overlay: &str) {
        self.push(Event::Display {
            text: text.to_string(),
            overlay: overlay.to_string(),
        });
    }

    fn on_waiting(&mut self, delay_ms: u64) {
        self.push(Event::Waiting { delay_ms });
    }

    fn on_loss(&mut self, start_index: usize, count: usize) {
        self.push(Event::Loss { start_index, count });
    }

    fn on_finish(&mut self) {
        self.push(Event::Finished);
    }

    fn on_status_changed(&mut self, from: DirectorState, to: DirectorState) {
        self.push(Event::StatusChanged { from, to });
    }

    fn on_tick(&mut self, instant_ms: Millis) {
        self.push(Event::Tick { instant_ms });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(Event::Display {
            text: "A".into(),
            overlay: String::new(),
        })
        .unwrap();
        assert_eq!(json["type"], "display");
        assert_eq!(json["text"], "A");

        let json = serde_json::to_value(Event::StatusChanged {
            from: DirectorState::NotStarted,
            to: DirectorState::Running,
        })
        .unwrap();
        assert_eq!(json["from"], "not_started");
        assert_eq!(json["to"], "running");
    }

    #[test]
    fn log_clones_share_buffer() {
        let log = EventLog::new();
        let mut observer = log.clone();
        observer.on_start();
        observer.on_tick(10);
        observer.on_waiting(5);
        assert_eq!(log.len(), 3);
        assert_eq!(
            log.take_visible(),
            vec![Event::Started, Event::Waiting { delay_ms: 5 }]
        );
        assert!(log.is_empty());
    }
}
