//! Audio output boundary.
//!
//! The sequencer only needs somewhere to send rendered voices. Real devices
//! sit behind the `playback` feature; the silent and recording outputs keep
//! the core usable (and testable) with no sound hardware at all.

use std::sync::{Arc, Mutex};

use tracing::debug;

use super::synth::Voice;
use crate::error::AudioError;

pub trait AudioOutput {
    /// Start playing `voice` now. Must not block for the voice's duration.
    fn play(&mut self, voice: &Voice) -> Result<(), AudioError>;
}

/// Opens an output on demand. Called from `ToneSequencer::initialize`.
pub type OutputOpener = Box<dyn FnMut() -> Result<Box<dyn AudioOutput>, AudioError>>;

/// Accepts every voice and drops it.
#[derive(Debug, Default)]
pub struct NullOutput;

impl AudioOutput for NullOutput {
    fn play(&mut self, voice: &Voice) -> Result<(), AudioError> {
        debug!(
            waveform = ?voice.waveform,
            hz = voice.start_hz,
            ms = voice.duration.as_millis() as u64,
            "voice (silent)"
        );
        Ok(())
    }
}

/// Keeps every played voice in a shared log.
#[derive(Debug, Clone, Default)]
pub struct RecordingOutput {
    played: Arc<Mutex<Vec<Voice>>>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the voices played so far, oldest first.
    pub fn played(&self) -> Vec<Voice> {
        self.played
            .lock()
            .map(|voices| voices.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut voices) = self.played.lock() {
            voices.clear();
        }
    }
}

impl AudioOutput for RecordingOutput {
    fn play(&mut self, voice: &Voice) -> Result<(), AudioError> {
        self.played
            .lock()
            .map_err(|_| AudioError::Playback("recording log poisoned".into()))?
            .push(voice.clone());
        Ok(())
    }
}

#[cfg(feature = "playback")]
pub use rodio_output::RodioOutput;

#[cfg(feature = "playback")]
mod rodio_output {
    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, OutputStreamHandle};
    use tracing::info;

    use super::AudioOutput;
    use crate::audio::synth::{Voice, DEFAULT_SAMPLE_RATE};
    use crate::error::AudioError;

    /// Default output device through rodio.
    ///
    /// `OutputStream` is not `Send`; keep this on the thread that opened it.
    pub struct RodioOutput {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sample_rate: u32,
    }

    impl RodioOutput {
        pub fn open_default() -> Result<Self, AudioError> {
            let (stream, handle) = OutputStream::try_default()
                .map_err(|e| AudioError::Unavailable(e.to_string()))?;
            info!("audio output stream opened");
            Ok(Self {
                _stream: stream,
                handle,
                sample_rate: DEFAULT_SAMPLE_RATE,
            })
        }
    }

    impl AudioOutput for RodioOutput {
        fn play(&mut self, voice: &Voice) -> Result<(), AudioError> {
            let samples = voice.render(self.sample_rate);
            self.handle
                .play_raw(SamplesBuffer::new(1, self.sample_rate, samples))
                .map_err(|e| AudioError::Playback(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::synth::Waveform;
    use std::time::Duration;

    #[test]
    fn recording_output_shares_log_between_clones() {
        let recorder = RecordingOutput::new();
        let mut output: Box<dyn AudioOutput> = Box::new(recorder.clone());
        let voice = Voice::tone(Waveform::Sine, 800.0, 0.2, Duration::from_millis(80));
        output.play(&voice).unwrap();
        assert_eq!(recorder.played(), vec![voice]);
        recorder.clear();
        assert!(recorder.played().is_empty());
    }
}
