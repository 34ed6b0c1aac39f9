//! Subtitle director.
//!
//! The director decides, every time its timer fires, which entry should be
//! visible and how long to wait before the next transition. It does not
//! refresh on a fixed interval: an entry is shown when it begins, and the
//! wait for the next entry starts when it ends.
//!
//! Late timer callbacks are corrected by jumping straight to the entry at
//! the real instant, which may drop entries but keeps the timeline honest.
//! Entries with less than `min_duration_ms` left are dropped (their time is
//! folded into the wait for the next entry), and waits shorter than
//! `min_wait_ms` are skipped (folded into the next entry's display time).
//!
//! ## State Transitions
//!
//! ```text
//! NotStarted -> Running -> (Paused | Sleeping) -> Running -> Finished
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut director = Director::new(SystemClock::new(), observer, DirectorConfig::default());
//! director.start(subtitles, 0)?;
//! // In a loop, once `next_deadline()` has passed:
//! director.poll();
//! ```
//!
//! All operations must be serialized onto one thread. The director never
//! blocks; waiting is the host's job.

mod observer;
mod state;

pub use observer::{DirectorObserver, ExternalClock, NoopObserver};
pub use state::DirectorState;

use std::ops::RangeInclusive;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::DirectorConfig;
use crate::entry::{EntryStore, Millis};
use crate::error::DirectorError;
use crate::search;
use crate::timefmt::format_timestamp;
use crate::timer::{Clock, Fired, Scheduler, SystemClock, TimerMode};

type DynStore = dyn EntryStore + Send + Sync;

/// Sleep bookkeeping. `carried_ms` is playback time owed on wake that was
/// not measured by the sleep itself: effective elapsed time before the
/// sleep began, plus any seeks made while asleep.
#[derive(Debug, Clone, Copy)]
struct SleepMark {
    since: u64,
    carried_ms: Millis,
}

pub struct Director<C: Clock = SystemClock> {
    scheduler: Scheduler<C>,
    observer: Box<dyn DirectorObserver + Send>,
    external: Option<Box<dyn ExternalClock + Send>>,
    config: DirectorConfig,
    store: Option<Arc<DynStore>>,
    state: DirectorState,
    current_ms: Millis,
    current_index: Option<usize>,
    external_offset_ms: Millis,
    /// Clock reading when the running `advance` began.
    handle_started_at: u64,
    sleep: Option<SleepMark>,
}

impl<C: Clock> Director<C> {
    /// Director that accumulates its own elapsed time.
    pub fn new(
        clock: C,
        observer: impl DirectorObserver + Send + 'static,
        config: DirectorConfig,
    ) -> Self {
        Self {
            scheduler: Scheduler::new(clock),
            observer: Box::new(observer),
            external: None,
            config,
            store: None,
            state: DirectorState::NotStarted,
            current_ms: 0,
            current_index: None,
            external_offset_ms: 0,
            handle_started_at: 0,
            sleep: None,
        }
    }

    /// Director whose playback position is read from `external` each time
    /// it recomputes. `clock` still paces the timer.
    pub fn with_external_clock(
        clock: C,
        observer: impl DirectorObserver + Send + 'static,
        config: DirectorConfig,
        external: impl ExternalClock + Send + 'static,
    ) -> Self {
        let mut director = Self::new(clock, observer, config);
        director.external = Some(Box::new(external));
        director
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> DirectorState {
        self.state
    }

    /// Index of the current entry, `None` before the first one.
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Live playback instant.
    pub fn current_instant(&self) -> Millis {
        if let Some(external) = &self.external {
            return external
                .current_ms()
                .saturating_add(self.external_offset_ms)
                .max(0);
        }
        match self.state {
            DirectorState::Running | DirectorState::Paused => {
                self.current_ms
                    .saturating_add(self.scheduler.effective_elapsed() as Millis)
            }
            DirectorState::Sleeping => match self.sleep {
                Some(mark) => {
                    let slept = self.scheduler.now_ms().saturating_sub(mark.since) as Millis;
                    self.current_ms
                        .saturating_add(mark.carried_ms)
                        .saturating_add(slept)
                        .max(0)
                }
                None => self.current_ms,
            },
            DirectorState::NotStarted | DirectorState::Finished => self.current_ms,
        }
    }

    pub fn is_external(&self) -> bool {
        self.external.is_some()
    }

    pub fn external_offset(&self) -> Millis {
        self.external_offset_ms
    }

    /// `(first begin, last end)` of the loaded entries, `(0, 0)` if none.
    pub fn total_span(&self) -> (Millis, Millis) {
        self.store
            .as_ref()
            .map(|store| store.total_span())
            .unwrap_or((0, 0))
    }

    pub fn store(&self) -> Option<&DynStore> {
        self.store.as_deref()
    }

    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Scheduler<C> {
        &self.scheduler
    }

    /// Clock reading at which [`poll`](Self::poll) next has work to do.
    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin directing `store` from `start_ms`.
    ///
    /// An active session is stopped first. On error nothing changes.
    pub fn start<S>(&mut self, store: S, start_ms: Millis) -> Result<(), DirectorError>
    where
        S: EntryStore + Send + Sync + 'static,
    {
        let Some(last) = store.last() else {
            info!("start: no subtitle entries, start failed");
            return Err(DirectorError::EmptyStore);
        };
        let last_end = last.end_ms;
        if start_ms < 0 || start_ms > last_end {
            info!(start_ms, last_end, "start: instant out of range");
            return Err(DirectorError::StartOutOfRange {
                instant: start_ms,
                last_end,
            });
        }
        if self.state.is_active() {
            info!("start: director already active, restarting");
            self.stop();
        }

        self.store = Some(Arc::new(store));
        self.set_state(DirectorState::Running);
        self.scheduler.cancel();
        self.current_ms = 0;
        self.current_index = None;
        self.sleep = None;
        self.external_offset_ms = 0;
        self.observer.on_start();
        self.advance(start_ms, 0);
        Ok(())
    }

    /// End the session. Pending timers are cancelled and the clock snaps to
    /// the end of the last entry.
    pub fn stop(&mut self) {
        match self.state {
            DirectorState::NotStarted => {
                self.scheduler.cancel();
                info!("stop: director not started");
            }
            DirectorState::Finished => {
                self.scheduler.cancel();
                info!("stop: director already finished");
            }
            _ => {
                if let Some(store) = self.store.clone() {
                    self.finish(&*store, false);
                }
            }
        }
    }

    /// Freeze playback. Paused time does not advance the playback clock.
    pub fn pause(&mut self) {
        if self.state != DirectorState::Running {
            info!(state = %self.state, "pause: director not running");
            return;
        }
        self.set_state(DirectorState::Paused);
        self.scheduler.pause();
    }

    pub fn resume(&mut self) {
        if self.state != DirectorState::Paused {
            info!(state = %self.state, "resume: director not paused");
            return;
        }
        self.set_state(DirectorState::Running);
        self.scheduler.resume();
    }

    /// Stop refreshing until [`wake`](Self::wake). Unlike a pause, the time
    /// spent asleep counts as playback time.
    pub fn sleep(&mut self) {
        match self.state {
            DirectorState::Running | DirectorState::Paused => {
                let elapsed = self.scheduler.effective_elapsed() as Millis;
                self.scheduler.cancel();
                self.sleep = Some(SleepMark {
                    since: self.scheduler.now_ms(),
                    carried_ms: elapsed,
                });
                self.set_state(DirectorState::Sleeping);
            }
            DirectorState::Sleeping => info!("sleep: director already sleeping"),
            _ => info!(state = %self.state, "sleep: director not running"),
        }
    }

    pub fn wake(&mut self) {
        if self.state != DirectorState::Sleeping {
            info!(state = %self.state, "wake: director not sleeping");
            return;
        }
        self.set_state(DirectorState::Running);
        let owed = self
            .sleep
            .take()
            .map(|mark| {
                let slept = self.scheduler.now_ms().saturating_sub(mark.since) as Millis;
                debug!(slept = %format_timestamp(slept), "wake");
                mark.carried_ms.saturating_add(slept)
            })
            .unwrap_or(0);
        self.advance(owed, 0);
    }

    /// Jump to `instant_ms`. See [`seek_by`](Self::seek_by).
    pub fn seek_to(&mut self, instant_ms: Millis) {
        let delta = instant_ms.saturating_sub(self.current_instant());
        self.seek_by(delta);
    }

    /// Move the playback position by `delta_ms`.
    ///
    /// Running and paused directors re-derive their position immediately
    /// and keep their state. A sleeping director applies the delta on wake.
    /// A finished director re-enters running for backward seeks and
    /// ignores forward ones.
    pub fn seek_by(&mut self, delta_ms: Millis) {
        match self.state {
            DirectorState::Running | DirectorState::Paused => {
                let elapsed = self.scheduler.effective_elapsed() as Millis;
                self.scheduler.cancel();
                debug!(delta_ms, elapsed, "seek");
                self.advance(delta_ms.saturating_add(elapsed), 0);
            }
            DirectorState::Sleeping => {
                if let Some(mark) = self.sleep.as_mut() {
                    mark.carried_ms = mark.carried_ms.saturating_add(delta_ms);
                }
            }
            DirectorState::Finished => {
                if delta_ms > 0 {
                    info!(delta_ms, "seek: forward seek ignored after finish");
                    return;
                }
                self.set_state(DirectorState::Running);
                self.scheduler.cancel();
                self.advance(delta_ms, 0);
            }
            DirectorState::NotStarted => info!("seek: director not started"),
        }
    }

    /// Set the offset applied to the external clock and recompute.
    pub fn set_external_offset(&mut self, offset_ms: Millis) {
        if self.external.is_none() {
            info!("set_external_offset: director does not use an external clock");
            return;
        }
        self.external_offset_ms = offset_ms;
        self.refresh_external_timestamp();
    }

    /// Re-read the external clock now. Call after the external position
    /// jumps (a player seek, for instance).
    pub fn refresh_external_timestamp(&mut self) {
        if self.external.is_none() {
            info!("refresh: director does not use an external clock");
            return;
        }
        match self.state {
            DirectorState::Running | DirectorState::Paused | DirectorState::Finished => {
                if self.state == DirectorState::Finished {
                    self.set_state(DirectorState::Running);
                }
                self.scheduler.cancel();
                self.advance(0, 0);
            }
            _ => info!(state = %self.state, "refresh: nothing to refresh"),
        }
    }

    /// Run the pending timer if it is due. Returns whether anything ran.
    pub fn poll(&mut self) -> bool {
        match self.scheduler.poll() {
            Some(Fired::Timer {
                real_elapsed,
                expected,
                ..
            }) => {
                self.advance(real_elapsed as Millis, expected);
                true
            }
            Some(Fired::KeepAlive) => {
                self.set_state(DirectorState::Running);
                self.advance(0, 0);
                true
            }
            None => false,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn set_state(&mut self, next: DirectorState) {
        let previous = self.state;
        self.state = next;
        if previous != next {
            self.observer.on_status_changed(previous, next);
        }
    }

    /// Recompute the instant and select what should be on screen.
    fn advance(&mut self, real_elapsed: Millis, expected_ms: u64) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let store = &*store;
        self.handle_started_at = self.scheduler.now_ms();

        self.current_ms = match &self.external {
            Some(external) => external.current_ms().saturating_add(self.external_offset_ms),
            None => self.current_ms.saturating_add(real_elapsed),
        }
        .max(0);
        debug!(
            instant = %format_timestamp(self.current_ms),
            expected = %format_timestamp(expected_ms as Millis),
            overshoot_ms = real_elapsed.saturating_sub(expected_ms as Millis),
            "advance"
        );
        self.observer.on_tick(self.current_ms);
        let now = self.current_ms;

        // Cheap path: still on the current entry, or one step away from it.
        if let Some(index) = self.current_index {
            let Some(current) = store.get(index) else {
                self.finish(store, true);
                return;
            };
            if now < current.begin_ms {
                if index == 0 {
                    self.current_index = None;
                } else {
                    let Some(previous) = store.get(index - 1) else {
                        self.finish(store, true);
                        return;
                    };
                    if now >= previous.end_ms {
                        self.current_index = Some(index - 1);
                        self.wait_next(store, current.begin_ms.saturating_sub(now));
                    } else if now >= previous.begin_ms {
                        self.current_index = Some(index - 1);
                        self.show(store, index - 1);
                    } else {
                        self.correct(store, 0..=index - 1);
                    }
                    return;
                }
            } else if now < current.end_ms {
                self.show(store, index);
                return;
            }
        }

        let next_index = self.current_index.map_or(0, |index| index + 1);
        match store.get(next_index) {
            Some(next) if now < next.begin_ms => {
                self.wait_next(store, next.begin_ms.saturating_sub(now))
            }
            Some(next) if now <= next.end_ms => {
                self.current_index = Some(next_index);
                self.show(store, next_index);
            }
            Some(_) => self.correct(store, next_index..=store.count() - 1),
            None => self.finish(store, true),
        }
    }

    /// Expensive path for large jumps: binary search within `range`.
    fn correct(&mut self, store: &DynStore, range: RangeInclusive<usize>) {
        let now = self.current_ms;
        debug!(?range, "correct");
        let (Some(first), Some(last)) = (store.first(), store.last()) else {
            self.finish(store, true);
            return;
        };
        if now < first.begin_ms {
            self.current_index = None;
            self.wait_next(store, first.begin_ms.saturating_sub(now));
            return;
        }
        if now >= last.end_ms {
            self.finish(store, true);
            return;
        }

        let Some(index) = search::correction_index(store, range, now) else {
            self.finish(store, true);
            return;
        };
        self.current_index = Some(index);
        let Some(entry) = store.get(index) else {
            self.finish(store, true);
            return;
        };
        if now <= entry.end_ms {
            self.show(store, index);
        } else {
            match store.get(index + 1) {
                Some(next) => self.wait_next(store, next.begin_ms.saturating_sub(now)),
                None => self.finish(store, true),
            }
        }
    }

    /// Nothing is on screen; the entry after the current index begins in
    /// `wait_ms`. Short waits are folded into that entry's display.
    fn wait_next(&mut self, store: &DynStore, wait_ms: Millis) {
        let wait_ms = wait_ms.max(0) as u64;
        if wait_ms >= self.config.min_wait_ms {
            self.arm(wait_ms, TimerMode::Waiting);
            self.observer.on_waiting(wait_ms);
        } else {
            let next_index = self.current_index.map_or(0, |index| index + 1);
            self.current_index = Some(next_index);
            self.show(store, next_index);
        }
    }

    /// Display the entry at `index` for the rest of its duration, or drop
    /// it if too little of it is left.
    fn show(&mut self, store: &DynStore, index: usize) {
        let Some(entry) = store.get(index) else {
            self.finish(store, true);
            return;
        };
        let available = entry.end_ms.saturating_sub(self.current_ms);
        if available > self.config.min_duration_ms as Millis {
            let overlay = store
                .related_overlay(entry.id)
                .map(|overlay| overlay.body.as_str())
                .unwrap_or("");
            self.arm(available as u64, TimerMode::Duration);
            self.observer.on_display(&entry.body, overlay);
        } else {
            self.skip(store, index);
        }
    }

    /// Report the entry at `index` as lost and wait for the one after it.
    fn skip(&mut self, store: &DynStore, index: usize) {
        match store.get(index + 1) {
            Some(next) => {
                let wait_ms = next.begin_ms.saturating_sub(self.current_ms).max(0) as u64;
                self.current_index = Some(index);
                debug!(index, "entry lost");
                self.observer.on_loss(index, 1);
                self.arm(wait_ms, TimerMode::Waiting);
                self.observer.on_waiting(wait_ms);
            }
            None => self.finish(store, true),
        }
    }

    /// Arm the timer, discounting the time already spent in this `advance`.
    /// A paused director keeps the new timer frozen.
    fn arm(&mut self, delay_ms: u64, mode: TimerMode) {
        let spent = self
            .scheduler
            .now_ms()
            .saturating_sub(self.handle_started_at);
        self.scheduler.arm(delay_ms.saturating_sub(spent), mode);
        if self.state == DirectorState::Paused {
            self.scheduler.pause();
        }
    }

    /// `natural` is false for an explicit [`stop`](Self::stop), which never
    /// keeps the timer alive.
    fn finish(&mut self, store: &DynStore, natural: bool) {
        self.set_state(DirectorState::Finished);
        self.scheduler.cancel();
        self.sleep = None;
        if let Some(last_index) = store.count().checked_sub(1) {
            self.current_index = Some(last_index);
            if let Some(last) = store.get(last_index) {
                self.current_ms = last.end_ms;
            }
        }
        self.observer.on_finish();
        if natural && self.external.is_some() && self.config.keep_alive {
            self.scheduler.arm_keep_alive(self.config.keep_alive_interval_ms);
        }
    }
}

impl<C: Clock> Drop for Director<C> {
    fn drop(&mut self) {
        self.scheduler.cancel();
    }
}

impl<C: Clock> std::fmt::Debug for Director<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Director")
            .field("state", &self.state)
            .field("current_ms", &self.current_ms)
            .field("current_index", &self.current_index)
            .field("external", &self.external.is_some())
            .field("external_offset_ms", &self.external_offset_ms)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Entry, Subtitles};
    use crate::timer::ManualClock;

    /// Observer whose tick handling takes `cost_ms` of clock time.
    struct SlowObserver {
        clock: ManualClock,
        cost_ms: u64,
    }

    impl DirectorObserver for SlowObserver {
        fn on_tick(&mut self, _instant_ms: Millis) {
            self.clock.advance(self.cost_ms);
        }
    }

    fn subtitles() -> Subtitles {
        Subtitles::from_entries(vec![
            Entry::new(1, 0, 1000, "A"),
            Entry::new(2, 1000, 2000, "B"),
        ])
    }

    #[test]
    fn handler_time_is_subtracted_from_next_delay() {
        let clock = ManualClock::new();
        let observer = SlowObserver {
            clock: clock.clone(),
            cost_ms: 30,
        };
        let mut director = Director::new(clock.clone(), observer, DirectorConfig::default());
        director.start(subtitles(), 0).unwrap();
        assert_eq!(clock.now_ms(), 30);
        assert_eq!(director.next_deadline(), Some(1000));
    }

    #[test]
    fn new_director_is_idle() {
        let director = Director::new(ManualClock::new(), NoopObserver, DirectorConfig::default());
        assert_eq!(director.state(), DirectorState::NotStarted);
        assert_eq!(director.current_index(), None);
        assert_eq!(director.current_instant(), 0);
        assert_eq!(director.total_span(), (0, 0));
        assert!(director.store().is_none());
        assert!(!director.is_external());
        assert_eq!(director.next_deadline(), None);
    }

    #[test]
    fn poll_without_session_does_nothing() {
        let clock = ManualClock::new();
        let mut director = Director::new(clock.clone(), NoopObserver, DirectorConfig::default());
        clock.advance(1000);
        assert!(!director.poll());
    }

    #[test]
    fn debug_shows_state() {
        let mut director = Director::new(ManualClock::new(), NoopObserver, DirectorConfig::default());
        director.start(subtitles(), 500).unwrap();
        let debug = format!("{director:?}");
        assert!(debug.contains("Running"));
        assert!(debug.contains("current_index: Some(0)"));
    }
}
