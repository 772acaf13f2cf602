//! Countdown engine implementation.
//!
//! The engine is a one-second-resolution state machine. It owns no thread and
//! reads no clock: while running it keeps exactly one repeating timer armed on
//! a [`TimerQueue`], and the queue owner feeds the resulting [`TickTicket`]s
//! back through [`CountdownEngine::on_tick`].
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused -> Running)* -> Expired -> (reset) Idle
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut queue = TimerQueue::new();
//! let mut engine = CountdownEngine::new(300);
//! engine.start(&mut queue);
//! // In a loop:
//! while let Some(ticket) = queue.pop_due(until) {
//!     engine.on_tick(ticket, &mut queue); // Some(Event::TimerExpired) at zero
//! }
//! ```

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::queue::{TimerHandle, TimerQueue};
use crate::events::Event;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Expired,
}

/// Payload of the engine's repeating timer.
///
/// Tagged with the generation the source was armed under, so a tick from a
/// source that has since been cancelled is recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTicket {
    generation: u64,
}

/// Core countdown engine.
///
/// `running` and `expired` are never both true, and `remaining_secs` never
/// exceeds `total_secs`.
#[derive(Debug)]
pub struct CountdownEngine {
    total_secs: u64,
    remaining_secs: u64,
    running: bool,
    expired: bool,
    generation: u64,
    ticker: Option<TimerHandle>,
}

impl CountdownEngine {
    /// Create an idle engine with `total_secs` on the clock.
    pub fn new(total_secs: u64) -> Self {
        Self {
            total_secs,
            remaining_secs: total_secs,
            running: false,
            expired: false,
            generation: 0,
            ticker: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        if self.expired {
            TimerState::Expired
        } else if self.running {
            TimerState::Running
        } else if self.remaining_secs < self.total_secs {
            TimerState::Paused
        } else {
            TimerState::Idle
        }
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// True while a tick source is armed.
    pub fn has_tick_source(&self) -> bool {
        self.ticker.is_some()
    }

    /// 0.0 .. 100.0 elapsed share of the countdown.
    pub fn progress_pct(&self) -> f64 {
        if self.total_secs == 0 {
            return if self.expired { 100.0 } else { 0.0 };
        }
        let elapsed = self.total_secs - self.remaining_secs;
        elapsed as f64 / self.total_secs as f64 * 100.0
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin (or continue) counting down.
    ///
    /// No-op while running or expired. With nothing left on the clock the
    /// engine expires immediately instead.
    pub fn start<J: From<TickTicket>>(&mut self, queue: &mut TimerQueue<J>) -> Option<Event> {
        if self.running || self.expired {
            return None;
        }
        if self.remaining_secs == 0 {
            return Some(self.expire(queue, false));
        }
        self.running = true;
        self.arm(queue);
        debug!(remaining_secs = self.remaining_secs, "countdown started");
        Some(Event::TimerStarted {
            total_secs: self.total_secs,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn pause<J>(&mut self, queue: &mut TimerQueue<J>) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.disarm(queue);
        self.running = false;
        debug!(remaining_secs = self.remaining_secs, "countdown paused");
        Some(Event::TimerPaused {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Stop, optionally change the duration, and put the full duration back
    /// on the clock. Always safe to call.
    pub fn reset<J>(&mut self, queue: &mut TimerQueue<J>, total_secs: Option<u64>) -> Event {
        self.disarm(queue);
        if let Some(total) = total_secs {
            self.total_secs = total;
        }
        self.remaining_secs = self.total_secs;
        self.running = false;
        self.expired = false;
        debug!(total_secs = self.total_secs, "countdown reset");
        Event::TimerReset {
            total_secs: self.total_secs,
            at: Utc::now(),
        }
    }

    /// Count one second off the clock. Ignored unless running.
    ///
    /// Returns `TimerExpired` on the tick that reaches zero, `TimerTicked`
    /// otherwise.
    pub fn tick<J>(&mut self, queue: &mut TimerQueue<J>) -> Option<Event> {
        if !self.running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            return Some(self.expire(queue, false));
        }
        Some(Event::TimerTicked {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Deliver a tick from the queue, dropping it if its source is stale.
    pub fn on_tick<J>(&mut self, ticket: TickTicket, queue: &mut TimerQueue<J>) -> Option<Event> {
        if ticket.generation != self.generation || self.ticker.is_none() {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "dropping stale tick"
            );
            return None;
        }
        self.tick(queue)
    }

    /// Jump straight to the expired state without waiting.
    pub fn force_expire<J>(&mut self, queue: &mut TimerQueue<J>) -> Option<Event> {
        if self.expired {
            return None;
        }
        Some(self.expire(queue, true))
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn expire<J>(&mut self, queue: &mut TimerQueue<J>, forced: bool) -> Event {
        self.disarm(queue);
        self.running = false;
        self.expired = true;
        debug!(forced, "countdown expired");
        Event::TimerExpired {
            total_secs: self.total_secs,
            forced,
            at: Utc::now(),
        }
    }

    fn arm<J: From<TickTicket>>(&mut self, queue: &mut TimerQueue<J>) {
        self.disarm(queue);
        let ticket = TickTicket {
            generation: self.generation,
        };
        self.ticker = Some(queue.every(TICK_PERIOD, ticket.into()));
    }

    fn disarm<J>(&mut self, queue: &mut TimerQueue<J>) {
        if let Some(handle) = self.ticker.take() {
            queue.cancel(handle);
        }
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    type Queue = TimerQueue<TickTicket>;

    fn run_secs(engine: &mut CountdownEngine, queue: &mut Queue, secs: u64) -> Vec<Event> {
        let until = queue.now() + Duration::from_secs(secs);
        let mut events = Vec::new();
        while let Some(ticket) = queue.pop_due(until) {
            events.extend(engine.on_tick(ticket, queue));
        }
        queue.advance_to(until);
        events
    }

    fn expiries(events: &[Event]) -> usize {
        events.iter().filter(|e| e.is_expiry()).count()
    }

    #[test]
    fn start_pause_resume() {
        let mut q = Queue::new();
        let mut engine = CountdownEngine::new(60);
        assert_eq!(engine.state(), TimerState::Idle);

        assert!(engine.start(&mut q).is_some());
        assert_eq!(engine.state(), TimerState::Running);
        run_secs(&mut engine, &mut q, 5);

        assert!(engine.pause(&mut q).is_some());
        assert_eq!(engine.state(), TimerState::Paused);
        assert_eq!(engine.remaining_secs(), 55);
        assert!(engine.pause(&mut q).is_none());

        assert!(engine.start(&mut q).is_some());
        run_secs(&mut engine, &mut q, 5);
        assert_eq!(engine.remaining_secs(), 50);
    }

    #[test]
    fn double_start_arms_one_source() {
        let mut q = Queue::new();
        let mut engine = CountdownEngine::new(10);
        engine.start(&mut q);
        assert!(engine.start(&mut q).is_none());
        assert_eq!(q.len(), 1);
        run_secs(&mut engine, &mut q, 1);
        assert_eq!(engine.remaining_secs(), 9);
    }

    #[test]
    fn tick_after_pause_changes_nothing() {
        let mut q = Queue::new();
        let mut engine = CountdownEngine::new(10);
        engine.start(&mut q);
        run_secs(&mut engine, &mut q, 3);
        engine.pause(&mut q);

        assert!(engine.tick(&mut q).is_none());
        assert_eq!(engine.remaining_secs(), 7);
        assert!(!engine.is_running());
        assert!(q.is_empty());
    }

    #[test]
    fn stale_ticket_is_dropped_after_restart() {
        let mut q = Queue::new();
        let mut engine = CountdownEngine::new(10);
        engine.start(&mut q);
        let stale = q.pop_due(Duration::from_secs(1)).unwrap();
        engine.pause(&mut q);
        engine.start(&mut q);

        assert!(engine.on_tick(stale, &mut q).is_none());
        assert_eq!(engine.remaining_secs(), 10);
    }

    #[test]
    fn tick_after_reset_changes_nothing() {
        let mut q = Queue::new();
        let mut engine = CountdownEngine::new(10);
        engine.start(&mut q);
        let pending = q.pop_due(Duration::from_secs(1)).unwrap();
        engine.reset(&mut q, None);

        assert!(engine.on_tick(pending, &mut q).is_none());
        assert!(engine.tick(&mut q).is_none());
        assert_eq!(engine.remaining_secs(), 10);
        assert!(q.is_empty());
    }

    #[test]
    fn expiry_fires_once_and_cancels_source() {
        let mut q = Queue::new();
        let mut engine = CountdownEngine::new(3);
        engine.start(&mut q);
        let events = run_secs(&mut engine, &mut q, 10);
        assert_eq!(expiries(&events), 1);
        assert!(!engine.has_tick_source());
        assert!(q.is_empty());
        assert!(engine.tick(&mut q).is_none());
        assert!(engine.start(&mut q).is_none());
    }

    #[test]
    fn zero_duration_expires_on_start() {
        let mut q = Queue::new();
        let mut engine = CountdownEngine::new(0);
        let event = engine.start(&mut q).unwrap();
        assert!(event.is_expiry());
        assert!(engine.is_expired());
        assert!(!engine.is_running());
        assert!(q.is_empty());
    }

    #[test]
    fn force_expire_skips_the_wait() {
        let mut q = Queue::new();
        let mut engine = CountdownEngine::new(600);
        engine.start(&mut q);
        match engine.force_expire(&mut q) {
            Some(Event::TimerExpired { forced, .. }) => assert!(forced),
            other => panic!("Expected TimerExpired, got {other:?}"),
        }
        assert_eq!(engine.state(), TimerState::Expired);
        assert!(engine.force_expire(&mut q).is_none());
        assert!(q.is_empty());
    }

    #[test]
    fn reset_changes_duration() {
        let mut q = Queue::new();
        let mut engine = CountdownEngine::new(600);
        engine.start(&mut q);
        engine.reset(&mut q, Some(300));
        assert_eq!(engine.total_secs(), 300);
        assert_eq!(engine.remaining_secs(), 300);
        assert_eq!(engine.state(), TimerState::Idle);
    }

    proptest! {
        #[test]
        fn d_ticks_expire_any_duration(d in 1u64..2_000) {
            let mut q = Queue::new();
            let mut engine = CountdownEngine::new(d);
            engine.start(&mut q);
            let events = run_secs(&mut engine, &mut q, d);
            prop_assert!(engine.is_expired());
            prop_assert!(!engine.is_running());
            prop_assert_eq!(engine.remaining_secs(), 0);
            prop_assert_eq!(expiries(&events), 1);
        }

        #[test]
        fn reset_is_idempotent_from_any_state(
            total in 0u64..500,
            run_for in 0u64..600,
            pause in any::<bool>(),
            force in any::<bool>(),
        ) {
            let mut q = Queue::new();
            let mut engine = CountdownEngine::new(total);
            engine.start(&mut q);
            run_secs(&mut engine, &mut q, run_for);
            if pause {
                engine.pause(&mut q);
            }
            if force {
                engine.force_expire(&mut q);
            }
            for _ in 0..2 {
                engine.reset(&mut q, None);
                prop_assert_eq!(engine.remaining_secs(), total);
                prop_assert!(!engine.is_running());
                prop_assert!(!engine.is_expired());
                prop_assert!(q.is_empty());
            }
        }
    }
}
