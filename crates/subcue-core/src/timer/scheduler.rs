//! Single-slot delayed wake-up.
//!
//! The scheduler does not own a thread. It remembers one pending deadline
//! measured on an injected [`Clock`]; the host asks for
//! [`Scheduler::next_deadline`] and calls [`Scheduler::poll`] once that
//! instant has passed.
//!
//! ## Pause accounting
//!
//! ```text
//! effective_elapsed = (now - armed_at) - paused_total - current_pause
//! ```
//!
//! Pausing freezes the remaining delay; resuming re-arms with exactly that
//! remainder. Cancelling drops the slot and all timing state.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::clock::Clock;

/// What the pending wake-up marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    /// Time until the next entry begins.
    Waiting,
    /// Time remaining on the displayed entry.
    Duration,
}

/// A wake-up that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fired {
    Timer {
        /// Effective time since arming, pauses excluded.
        real_elapsed: u64,
        /// The delay the timer was armed with.
        expected: u64,
        mode: TimerMode,
    },
    KeepAlive,
}

#[derive(Debug, Clone)]
struct Pending {
    mode: TimerMode,
    armed_at: u64,
    expected_ms: u64,
    /// `None` while paused.
    deadline: Option<u64>,
    paused_at: Option<u64>,
    paused_total: u64,
    remaining_ms: u64,
}

#[derive(Debug)]
pub struct Scheduler<C: Clock> {
    clock: C,
    pending: Option<Pending>,
    keep_alive_at: Option<u64>,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            pending: None,
            keep_alive_at: None,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Replace whatever is pending with a wake-up `delay_ms` from now.
    pub fn arm(&mut self, delay_ms: u64, mode: TimerMode) {
        let now = self.clock.now_ms();
        trace!(delay_ms, ?mode, "arm");
        self.keep_alive_at = None;
        self.pending = Some(Pending {
            mode,
            armed_at: now,
            expected_ms: delay_ms,
            deadline: Some(now.saturating_add(delay_ms)),
            paused_at: None,
            paused_total: 0,
            remaining_ms: 0,
        });
    }

    /// Low-frequency tick that only reports [`Fired::KeepAlive`].
    pub fn arm_keep_alive(&mut self, interval_ms: u64) {
        self.keep_alive_at = Some(self.clock.now_ms().saturating_add(interval_ms));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
        self.keep_alive_at = None;
    }

    /// Freeze the pending wake-up. No-op when nothing is pending or it is
    /// already frozen.
    pub fn pause(&mut self) {
        let now = self.clock.now_ms();
        let elapsed = self.effective_elapsed();
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        if pending.paused_at.is_some() {
            return;
        }
        pending.remaining_ms = pending.expected_ms.saturating_sub(elapsed);
        pending.paused_at = Some(now);
        pending.deadline = None;
    }

    /// Re-arm a frozen wake-up with the remainder captured by [`pause`].
    ///
    /// [`pause`]: Scheduler::pause
    pub fn resume(&mut self) {
        let now = self.clock.now_ms();
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        let Some(paused_at) = pending.paused_at.take() else {
            return;
        };
        pending.paused_total += now.saturating_sub(paused_at);
        pending.deadline = Some(now.saturating_add(pending.remaining_ms));
        pending.remaining_ms = 0;
    }

    /// Time since the last [`arm`], minus the time spent paused since then.
    /// Zero when nothing is pending.
    ///
    /// [`arm`]: Scheduler::arm
    pub fn effective_elapsed(&self) -> u64 {
        let Some(pending) = self.pending.as_ref() else {
            return 0;
        };
        let now = self.clock.now_ms();
        let current_pause = pending
            .paused_at
            .map(|at| now.saturating_sub(at))
            .unwrap_or(0);
        now.saturating_sub(pending.armed_at)
            .saturating_sub(pending.paused_total)
            .saturating_sub(current_pause)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.pending.as_ref().is_some_and(|p| p.paused_at.is_some())
    }

    pub fn mode(&self) -> Option<TimerMode> {
        self.pending.as_ref().map(|p| p.mode)
    }

    /// Delay left before the pending wake-up fires.
    pub fn remaining_ms(&self) -> Option<u64> {
        let pending = self.pending.as_ref()?;
        Some(match pending.deadline {
            Some(deadline) => deadline.saturating_sub(self.clock.now_ms()),
            None => pending.remaining_ms,
        })
    }

    /// Earliest clock reading at which [`poll`] will report something.
    ///
    /// [`poll`]: Scheduler::poll
    pub fn next_deadline(&self) -> Option<u64> {
        let timer = self.pending.as_ref().and_then(|p| p.deadline);
        match (timer, self.keep_alive_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Take the wake-up if it is due. The slot is empty afterwards.
    pub fn poll(&mut self) -> Option<Fired> {
        let now = self.clock.now_ms();
        let due = self
            .pending
            .as_ref()
            .and_then(|p| p.deadline)
            .is_some_and(|deadline| deadline <= now);
        if due {
            let real_elapsed = self.effective_elapsed();
            let pending = self.pending.take()?;
            return Some(Fired::Timer {
                real_elapsed,
                expected: pending.expected_ms,
                mode: pending.mode,
            });
        }
        if self.keep_alive_at.is_some_and(|at| at <= now) {
            self.keep_alive_at = None;
            return Some(Fired::KeepAlive);
        }
        None
    }
}
