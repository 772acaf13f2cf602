//! Virtual-time timer queue.
//!
//! The queue is the single source of both the countdown tick and the delayed
//! tone callbacks. It never reads a wall clock: the owner moves time forward
//! with [`TimerQueue::pop_due`] / [`TimerQueue::advance_to`], so tests can step
//! through virtual seconds and the CLI can feed it real elapsed time.
//!
//! Jobs are popped one at a time so that a job which cancels another timer
//! (a tick that expires the countdown, a reset) takes effect before the
//! cancelled timer would have been delivered.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Cancellation handle for a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Entry<J> {
    period: Option<Duration>,
    job: J,
}

#[derive(Debug)]
pub struct TimerQueue<J> {
    now: Duration,
    next_id: u64,
    /// Ordered by deadline, then by arming order.
    entries: BTreeMap<(Duration, u64), Entry<J>>,
    deadlines: HashMap<u64, Duration>,
}

impl<J> Default for TimerQueue<J> {
    fn default() -> Self {
        Self::new()
    }
}

impl<J> TimerQueue<J> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            entries: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }

    /// Virtual time elapsed since the queue was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Fire `job` once, `delay` from now.
    pub fn after(&mut self, delay: Duration, job: J) -> TimerHandle {
        self.insert(self.now + delay, None, job)
    }

    /// Fire `job` every `period`, first at `now + period`.
    ///
    /// A zero period would never let time advance, so it is clamped to 1ms.
    pub fn every(&mut self, period: Duration, job: J) -> TimerHandle {
        let period = period.max(Duration::from_millis(1));
        self.insert(self.now + period, Some(period), job)
    }

    /// Remove a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.deadlines.remove(&handle.0) {
            Some(deadline) => self.entries.remove(&(deadline, handle.0)).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(&handle.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deadline of the earliest pending timer.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Move the clock forward without firing anything. Never moves backwards.
    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    fn insert(&mut self, deadline: Duration, period: Option<Duration>, job: J) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert((deadline, id), Entry { period, job });
        self.deadlines.insert(id, deadline);
        TimerHandle(id)
    }
}

impl<J: Clone> TimerQueue<J> {
    /// Pop the earliest timer due at or before `until`, moving the clock to
    /// its deadline. Repeating timers are re-armed before returning.
    pub fn pop_due(&mut self, until: Duration) -> Option<J> {
        let (&(deadline, id), _) = self.entries.iter().next()?;
        if deadline > until {
            return None;
        }
        let entry = self.entries.remove(&(deadline, id))?;
        self.now = self.now.max(deadline);
        match entry.period {
            Some(period) => {
                let next = deadline + period;
                let job = entry.job.clone();
                self.entries.insert((next, id), entry);
                self.deadlines.insert(id, next);
                Some(job)
            }
            None => {
                self.deadlines.remove(&id);
                Some(entry.job)
            }
        }
    }
}
