//! Tone sequencer: the four synthesized cues and their timing.
//!
//! Multi-tone cues are staggered through the shared [`TimerQueue`]; every
//! handle the sequencer arms is remembered so [`ToneSequencer::stop_all`] can
//! cancel them in one go. All playback is best-effort: a missing or failing
//! output is logged and the sequence carries on as if the voice had played.
//!
//! ## Alarm
//!
//! ```text
//! Idle -> Playing (6 beeps, 400ms apart) -> Idle (500ms after the last beep)
//! ```
//!
//! Re-entering while `Playing` is a no-op.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::output::{AudioOutput, OutputOpener};
use super::synth::{RampKind, Voice, Waveform};
use crate::error::AudioError;
use crate::timer::{TimerHandle, TimerQueue};

pub const ALARM_BEEPS: u32 = 6;
pub const ALARM_SPACING: Duration = Duration::from_millis(400);
/// How long after the last beep the alarm accepts a new trigger.
pub const ALARM_SETTLE: Duration = Duration::from_millis(500);
pub const SUCCESS_ECHO_DELAY: Duration = Duration::from_millis(100);
pub const SPARKLE_COUNT: u32 = 3;
pub const SPARKLE_SPACING: Duration = Duration::from_millis(80);
/// Gap between the success cue and the star cue that follows it.
pub const STAR_AFTER_SUCCESS: Duration = Duration::from_millis(600);
/// Master volume in percent used when nothing else is configured.
pub const DEFAULT_VOLUME: u8 = 80;

const SPARKLE_MIN_HZ: f32 = 1500.0;
const SPARKLE_MAX_HZ: f32 = 2500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cue {
    Click,
    Success,
    Star,
    Alarm,
}

/// Payload of the sequencer's delayed timers.
#[derive(Debug, Clone, PartialEq)]
pub enum ToneJob {
    Voice(Voice),
    Cue(Cue),
    AlarmSettled,
}

pub struct ToneSequencer {
    opener: OutputOpener,
    output: Option<Box<dyn AudioOutput>>,
    alarm_active: bool,
    pending: Vec<TimerHandle>,
    volume: f32,
    rng: Pcg32,
}

impl ToneSequencer {
    /// `opener` is not called until [`ToneSequencer::initialize`].
    pub fn new<F>(opener: F) -> Self
    where
        F: FnMut() -> Result<Box<dyn AudioOutput>, AudioError> + 'static,
    {
        Self {
            opener: Box::new(opener),
            output: None,
            alarm_active: false,
            pending: Vec::new(),
            volume: 1.0,
            rng: Pcg32::from_entropy(),
        }
    }

    /// Sequencer that hands out `output` on the first `initialize`.
    pub fn with_output<O: AudioOutput + 'static>(output: O) -> Self {
        let mut slot = Some(output);
        Self::new(move || {
            slot.take()
                .map(|o| Box::new(o) as Box<dyn AudioOutput>)
                .ok_or_else(|| AudioError::Unavailable("output already taken".into()))
        })
    }

    /// Fix the sparkle pitches for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Pcg32::seed_from_u64(seed);
        self
    }

    /// Master volume in percent; values above 100 are clamped.
    pub fn set_volume(&mut self, percent: u8) {
        self.volume = f32::from(percent.min(100)) / 100.0;
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Acquire the output if that has not happened yet.
    ///
    /// Call only after a user-originated action. A failed attempt is logged
    /// and retried on the next call.
    pub fn initialize(&mut self) -> bool {
        if self.output.is_some() {
            return true;
        }
        match (self.opener)() {
            Ok(output) => {
                info!("audio output initialized");
                self.output = Some(output);
                true
            }
            Err(e) => {
                warn!(error = %e, "audio output unavailable, cues will be silent");
                false
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.output.is_some()
    }

    pub fn is_alarm_active(&self) -> bool {
        self.alarm_active
    }

    /// Number of cue timers armed and not yet known to have fired.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    // ── Cues ─────────────────────────────────────────────────────────

    pub fn play<J: From<ToneJob>>(&mut self, cue: Cue, queue: &mut TimerQueue<J>) -> bool {
        match cue {
            Cue::Click => {
                self.play_click();
                true
            }
            Cue::Success => {
                self.play_success(queue);
                true
            }
            Cue::Star => {
                self.play_star(queue);
                true
            }
            Cue::Alarm => self.play_alarm(queue),
        }
    }

    pub fn play_click(&mut self) {
        self.emit(&Voice::tone(Waveform::Sine, 800.0, 0.2, Duration::from_millis(80)));
    }

    /// Rising sweep, then a second tone 100ms later.
    pub fn play_success<J: From<ToneJob>>(&mut self, queue: &mut TimerQueue<J>) {
        let sweep = Voice::tone(Waveform::Sine, 600.0, 0.6, Duration::from_millis(500))
            .with_ramp(RampKind::Linear, 1200.0, Duration::from_millis(200))
            .with_decay(Duration::from_millis(500));
        let echo = Voice::tone(Waveform::Sine, 900.0, 0.4, Duration::from_millis(400))
            .with_decay(Duration::from_millis(400));
        self.emit(&sweep);
        self.schedule(queue, SUCCESS_ECHO_DELAY, ToneJob::Voice(echo));
    }

    /// Quick upward chirp plus three randomly pitched sparkles.
    pub fn play_star<J: From<ToneJob>>(&mut self, queue: &mut TimerQueue<J>) {
        let chirp = Voice::tone(Waveform::Sine, 1200.0, 0.2, Duration::from_millis(300))
            .with_ramp(RampKind::Exponential, 2000.0, Duration::from_millis(100))
            .with_decay(Duration::from_millis(300));
        self.emit(&chirp);
        for i in 0..SPARKLE_COUNT {
            let hz = self.rng.gen_range(SPARKLE_MIN_HZ..SPARKLE_MAX_HZ);
            let sparkle = Voice::tone(Waveform::Sine, hz, 0.1, Duration::from_millis(200))
                .with_decay(Duration::from_millis(200));
            self.schedule(queue, SPARKLE_SPACING * i, ToneJob::Voice(sparkle));
        }
    }

    /// Start the beep sequence. Returns false if one is already in flight.
    pub fn play_alarm<J: From<ToneJob>>(&mut self, queue: &mut TimerQueue<J>) -> bool {
        if self.alarm_active {
            debug!("alarm already playing, ignoring trigger");
            return false;
        }
        info!("playing alarm");
        self.alarm_active = true;
        self.cancel_pending(queue);
        let beep = Voice::tone(Waveform::Square, 440.0, 0.3, Duration::from_millis(300))
            .with_decay(Duration::from_millis(300));
        for i in 0..ALARM_BEEPS {
            self.schedule(queue, ALARM_SPACING * i, ToneJob::Voice(beep.clone()));
        }
        self.schedule(
            queue,
            ALARM_SPACING * ALARM_BEEPS + ALARM_SETTLE,
            ToneJob::AlarmSettled,
        );
        true
    }

    /// Play `cue` after `delay`. Cancelled by [`ToneSequencer::stop_all`].
    pub fn schedule_cue<J: From<ToneJob>>(
        &mut self,
        queue: &mut TimerQueue<J>,
        delay: Duration,
        cue: Cue,
    ) {
        self.schedule(queue, delay, ToneJob::Cue(cue));
    }

    /// Cancel every pending cue timer and clear the alarm flag.
    ///
    /// Voices already handed to the output are left to decay.
    pub fn stop_all<J>(&mut self, queue: &mut TimerQueue<J>) {
        debug!(pending = self.pending.len(), "stopping all cues");
        self.cancel_pending(queue);
        self.alarm_active = false;
    }

    /// React to one of this sequencer's timers firing.
    pub fn handle<J: From<ToneJob>>(&mut self, job: ToneJob, queue: &mut TimerQueue<J>) {
        self.pending.retain(|h| queue.is_pending(*h));
        match job {
            ToneJob::Voice(voice) => self.emit(&voice),
            ToneJob::Cue(cue) => {
                self.play(cue, queue);
            }
            ToneJob::AlarmSettled => {
                debug!("alarm settled");
                self.alarm_active = false;
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn schedule<J: From<ToneJob>>(
        &mut self,
        queue: &mut TimerQueue<J>,
        delay: Duration,
        job: ToneJob,
    ) {
        let handle = queue.after(delay, job.into());
        self.pending.push(handle);
    }

    fn cancel_pending<J>(&mut self, queue: &mut TimerQueue<J>) {
        for handle in self.pending.drain(..) {
            queue.cancel(handle);
        }
    }

    fn emit(&mut self, voice: &Voice) {
        let Some(output) = self.output.as_mut() else {
            debug!(hz = voice.start_hz, "audio not initialized, skipping voice");
            return;
        };
        if let Err(e) = output.play(&voice.scaled(self.volume)) {
            warn!(error = %e, "failed to play voice");
        }
    }
}
