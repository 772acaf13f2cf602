mod output;
mod sequencer;
mod synth;

#[cfg(feature = "playback")]
pub use output::RodioOutput;
pub use output::{AudioOutput, NullOutput, OutputOpener, RecordingOutput};
pub use sequencer::{
    Cue, ToneJob, ToneSequencer, ALARM_BEEPS, ALARM_SETTLE, ALARM_SPACING, DEFAULT_VOLUME,
    SPARKLE_COUNT, SPARKLE_SPACING, STAR_AFTER_SUCCESS, SUCCESS_ECHO_DELAY,
};
pub use synth::{Ramp, RampKind, Voice, Waveform, DECAY_FLOOR, DEFAULT_SAMPLE_RATE};
