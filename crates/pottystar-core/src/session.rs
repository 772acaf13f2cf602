//! The timer session: what the UI layer drives.
//!
//! A [`Session`] owns the timer queue, the countdown engine, the tone
//! sequencer and the reward counter, and turns user actions into engine
//! transitions plus the matching cues. It is single-threaded: the owner
//! calls the action methods as input arrives and [`Session::advance`] as time
//! passes, and renders the returned [`Event`]s.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::audio::{Cue, ToneJob, ToneSequencer, DEFAULT_VOLUME, STAR_AFTER_SUCCESS};
use crate::error::ValidationError;
use crate::events::{Event, Outcome};
use crate::storage::{Config, KvStore, RewardCounter};
use crate::timer::{
    minutes_to_secs, parse_custom_minutes, retry_minutes, CountdownEngine, TickTicket, TimerQueue,
    DEFAULT_PRESETS,
};

/// Delay before the confirmation click when sound is switched back on.
pub const UNMUTE_CLICK_DELAY: Duration = Duration::from_millis(100);

/// Everything that can sit on the session's timer queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    Tick(TickTicket),
    Tone(ToneJob),
}

impl From<TickTicket> for Job {
    fn from(ticket: TickTicket) -> Self {
        Job::Tick(ticket)
    }
}

impl From<ToneJob> for Job {
    fn from(job: ToneJob) -> Self {
        Job::Tone(job)
    }
}

/// Session settings, usually taken from [`Config`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub presets: Vec<u32>,
    pub initial_minutes: u32,
    pub sound_enabled: bool,
    pub volume: u8,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            presets: DEFAULT_PRESETS.to_vec(),
            initial_minutes: DEFAULT_PRESETS[0],
            sound_enabled: true,
            volume: DEFAULT_VOLUME,
        }
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            presets: config.timer.presets.clone(),
            initial_minutes: config.timer.default_minutes,
            sound_enabled: config.audio.enabled,
            volume: config.audio.volume,
        }
    }
}

pub struct Session<S> {
    queue: TimerQueue<Job>,
    engine: CountdownEngine,
    sequencer: ToneSequencer,
    rewards: RewardCounter<S>,
    presets: Vec<u32>,
    selected_minutes: u32,
    sound_enabled: bool,
}

impl<S: KvStore> Session<S> {
    pub fn new(options: SessionOptions, mut sequencer: ToneSequencer, store: S) -> Self {
        sequencer.set_volume(options.volume);
        Self {
            queue: TimerQueue::new(),
            engine: CountdownEngine::new(minutes_to_secs(options.initial_minutes)),
            sequencer,
            rewards: RewardCounter::load(store),
            presets: options.presets,
            selected_minutes: options.initial_minutes,
            sound_enabled: options.sound_enabled,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &CountdownEngine {
        &self.engine
    }

    pub fn sequencer(&self) -> &ToneSequencer {
        &self.sequencer
    }

    pub fn stars(&self) -> u64 {
        self.rewards.count()
    }

    pub fn rewards(&self) -> &RewardCounter<S> {
        &self.rewards
    }

    pub fn presets(&self) -> &[u32] {
        &self.presets
    }

    pub fn selected_minutes(&self) -> u32 {
        self.selected_minutes
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    /// Time until the next queued timer, if any.
    pub fn next_deadline_in(&self) -> Option<Duration> {
        self.queue
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(self.queue.now()))
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.engine.state(),
            remaining_secs: self.engine.remaining_secs(),
            total_secs: self.engine.total_secs(),
            progress_pct: self.engine.progress_pct(),
            selected_minutes: self.selected_minutes,
            stars: self.rewards.count(),
            sound_enabled: self.sound_enabled,
            at: Utc::now(),
        }
    }

    // ── User actions ─────────────────────────────────────────────────

    /// Switch to one of the preset intervals.
    pub fn select_preset(&mut self, minutes: u32) -> Result<Vec<Event>, ValidationError> {
        if !self.presets.contains(&minutes) {
            return Err(ValidationError::UnknownPreset(minutes));
        }
        self.user_gesture();
        Ok(self.change_duration(minutes))
    }

    /// Switch to a user-entered duration in minutes.
    ///
    /// Rejected input leaves the session untouched.
    pub fn apply_custom(&mut self, input: &str) -> Result<Vec<Event>, ValidationError> {
        let minutes = parse_custom_minutes(input)?;
        self.user_gesture();
        Ok(self.change_duration(minutes))
    }

    /// Start/pause button.
    pub fn toggle(&mut self) -> Vec<Event> {
        self.user_gesture();
        self.click();
        let mut events = Vec::new();
        if self.engine.is_running() {
            events.extend(self.engine.pause(&mut self.queue));
        } else {
            let started = self.engine.start(&mut self.queue);
            self.after_engine_event(started, &mut events);
        }
        events.extend(self.flush());
        events
    }

    /// Reset button: back to the full selected interval, stopped.
    pub fn reset(&mut self) -> Vec<Event> {
        self.user_gesture();
        self.click();
        self.sequencer.stop_all(&mut self.queue);
        let total = minutes_to_secs(self.selected_minutes);
        vec![self.engine.reset(&mut self.queue, Some(total))]
    }

    /// Debug trigger: expire now and sound the alarm.
    pub fn force_expire(&mut self) -> Vec<Event> {
        self.user_gesture();
        self.click();
        let mut events = Vec::new();
        let expired = self.engine.force_expire(&mut self.queue);
        self.after_engine_event(expired, &mut events);
        events.extend(self.flush());
        events
    }

    /// Expiry screen: it worked. Earns a star and restarts the same interval.
    pub fn record_success(&mut self) -> Result<Vec<Event>, ValidationError> {
        if !self.engine.is_expired() {
            return Err(ValidationError::NoPendingOutcome);
        }
        self.user_gesture();
        self.sequencer.stop_all(&mut self.queue);
        let stars = self.rewards.increment();
        if self.sound_enabled {
            self.sequencer.play_success(&mut self.queue);
            self.sequencer
                .schedule_cue(&mut self.queue, STAR_AFTER_SUCCESS, Cue::Star);
        }
        Ok(self.restart(Outcome::Success, self.selected_minutes, stars))
    }

    /// Expiry screen: not this time. Restarts with the next shorter preset.
    pub fn try_again(&mut self) -> Result<Vec<Event>, ValidationError> {
        if !self.engine.is_expired() {
            return Err(ValidationError::NoPendingOutcome);
        }
        self.user_gesture();
        self.sequencer.stop_all(&mut self.queue);
        self.click();
        let next = retry_minutes(&self.presets, self.selected_minutes);
        self.selected_minutes = next;
        let stars = self.rewards.count();
        Ok(self.restart(Outcome::TryAgain, next, stars))
    }

    /// Mute/unmute. Unmuting confirms with a click shortly after.
    pub fn toggle_sound(&mut self) -> Vec<Event> {
        self.user_gesture();
        self.sound_enabled = !self.sound_enabled;
        if self.sound_enabled {
            self.sequencer
                .schedule_cue(&mut self.queue, UNMUTE_CLICK_DELAY, Cue::Click);
        } else {
            self.sequencer.stop_all(&mut self.queue);
        }
        debug!(enabled = self.sound_enabled, "sound toggled");
        vec![Event::SoundToggled {
            enabled: self.sound_enabled,
            at: Utc::now(),
        }]
    }

    /// Start the star count over from zero.
    pub fn reset_stars(&mut self) -> Vec<Event> {
        self.user_gesture();
        self.click();
        self.rewards.reset();
        vec![Event::StarsReset { at: Utc::now() }]
    }

    // ── Time ─────────────────────────────────────────────────────────

    /// Let `by` pass, delivering every tick and cue that falls due in order.
    pub fn advance(&mut self, by: Duration) -> Vec<Event> {
        let until = self.queue.now() + by;
        let mut events = Vec::new();
        while let Some(job) = self.queue.pop_due(until) {
            match job {
                Job::Tick(ticket) => {
                    let event = self.engine.on_tick(ticket, &mut self.queue);
                    self.after_engine_event(event, &mut events);
                }
                Job::Tone(tone) => self.sequencer.handle(tone, &mut self.queue),
            }
        }
        self.queue.advance_to(until);
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Every action counts as the user interaction that unlocks audio.
    fn user_gesture(&mut self) {
        self.sequencer.initialize();
    }

    fn click(&mut self) {
        if self.sound_enabled {
            self.sequencer.play_click();
        }
    }

    /// Deliver cues that were scheduled with no delay.
    fn flush(&mut self) -> Vec<Event> {
        self.advance(Duration::ZERO)
    }

    fn after_engine_event(&mut self, event: Option<Event>, events: &mut Vec<Event>) {
        let Some(event) = event else {
            return;
        };
        if event.is_expiry() && self.sound_enabled {
            self.sequencer.play_alarm(&mut self.queue);
        }
        events.push(event);
    }

    fn change_duration(&mut self, minutes: u32) -> Vec<Event> {
        self.click();
        self.sequencer.stop_all(&mut self.queue);
        self.selected_minutes = minutes;
        vec![self
            .engine
            .reset(&mut self.queue, Some(minutes_to_secs(minutes)))]
    }

    fn restart(&mut self, outcome: Outcome, minutes: u32, stars: u64) -> Vec<Event> {
        let next_secs = minutes_to_secs(minutes);
        info!(?outcome, stars, next_secs, "outcome recorded");
        let mut events = vec![
            Event::OutcomeRecorded {
                outcome,
                stars,
                next_secs,
                at: Utc::now(),
            },
            self.engine.reset(&mut self.queue, Some(next_secs)),
        ];
        let started = self.engine.start(&mut self.queue);
        self.after_engine_event(started, &mut events);
        events.extend(self.flush());
        events
    }
}
