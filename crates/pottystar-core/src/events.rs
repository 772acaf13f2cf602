use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerState;

/// Which button the user pressed on the expiry screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    TryAgain,
}

/// Every state change in the system produces an Event.
/// The CLI renders them; tests assert on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        total_secs: u64,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerTicked {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero, or was expired by hand when `forced`.
    TimerExpired {
        total_secs: u64,
        forced: bool,
        at: DateTime<Utc>,
    },
    TimerReset {
        total_secs: u64,
        at: DateTime<Utc>,
    },
    OutcomeRecorded {
        outcome: Outcome,
        stars: u64,
        next_secs: u64,
        at: DateTime<Utc>,
    },
    SoundToggled {
        enabled: bool,
        at: DateTime<Utc>,
    },
    StarsReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        remaining_secs: u64,
        total_secs: u64,
        progress_pct: f64,
        selected_minutes: u32,
        stars: u64,
        sound_enabled: bool,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// True for both natural and forced expiry.
    pub fn is_expiry(&self) -> bool {
        matches!(self, Event::TimerExpired { .. })
    }
}
