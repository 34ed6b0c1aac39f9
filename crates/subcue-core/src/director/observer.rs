use super::DirectorState;
use crate::entry::Millis;

/// Receives director notifications.
///
/// Every callback runs synchronously on the thread driving the director,
/// in the middle of the operation that caused it. All methods default to
/// no-ops so an observer only implements what it renders.
pub trait DirectorObserver {
    /// A session began (before the first entry is selected).
    fn on_start(&mut self) {}

    /// `text` should now be visible, with `overlay` (possibly empty)
    /// rendered alongside it.
    fn on_display(&mut self, _text: &str, _overlay: &str) {}

    /// Nothing is visible; the next entry begins in `delay_ms`.
    fn on_waiting(&mut self, _delay_ms: u64) {}

    /// `count` entries starting at `start_index` were dropped because too
    /// little of their display time was left.
    fn on_loss(&mut self, _start_index: usize, _count: usize) {}

    fn on_finish(&mut self) {}

    /// Only called when the state actually changes.
    fn on_status_changed(&mut self, _from: DirectorState, _to: DirectorState) {}

    /// The playback instant was recomputed.
    fn on_tick(&mut self, _instant_ms: Millis) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DirectorObserver for NoopObserver {}

impl<O: DirectorObserver + ?Sized> DirectorObserver for Box<O> {
    fn on_start(&mut self) {
        (**self).on_start()
    }

    fn on_display(&mut self, text: &str, overlay: &str) {
        (**self).on_display(text, overlay)
    }

    fn on_waiting(&mut self, delay_ms: u64) {
        (**self).on_waiting(delay_ms)
    }

    fn on_loss(&mut self, start_index: usize, count: usize) {
        (**self).on_loss(start_index, count)
    }

    fn on_finish(&mut self) {
        (**self).on_finish()
    }

    fn on_status_changed(&mut self, from: DirectorState, to: DirectorState) {
        (**self).on_status_changed(from, to)
    }

    fn on_tick(&mut self, instant_ms: Millis) {
        (**self).on_tick(instant_ms)
    }
}

/// Source of the playback position in external-clock mode, typically a
/// media player's current position.
pub trait ExternalClock {
    fn current_ms(&self) -> Millis;
}

impl<F> ExternalClock for F
where
    F: Fn() -> Millis,
{
    fn current_ms(&self) -> Millis {
        self()
    }
}
