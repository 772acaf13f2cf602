//! Oscillator voices and their sample renderer.
//!
//! A [`Voice`] is one oscillator feeding one gain stage, played for a fixed
//! time. Frequency may glide linearly or exponentially to a target and then
//! hold; gain may decay exponentially towards [`DECAY_FLOOR`].

use std::f32::consts::TAU;
use std::time::Duration;

/// Level an exponential gain decay lands on. Exponential ramps cannot reach 0.
pub const DECAY_FLOOR: f32 = 0.001;

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampKind {
    Linear,
    Exponential,
}

/// Frequency glide from a voice's start pitch to `to_hz` over `over`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    pub kind: RampKind,
    pub to_hz: f32,
    pub over: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    pub waveform: Waveform,
    pub start_hz: f32,
    pub ramp: Option<Ramp>,
    pub gain: f32,
    /// Exponential decay from `gain` to [`DECAY_FLOOR`] over this span.
    pub decay: Option<Duration>,
    pub duration: Duration,
}

impl Voice {
    /// A constant-pitch, constant-gain tone.
    pub fn tone(waveform: Waveform, hz: f32, gain: f32, duration: Duration) -> Self {
        Self {
            waveform,
            start_hz: hz,
            ramp: None,
            gain,
            decay: None,
            duration,
        }
    }

    pub fn with_ramp(mut self, kind: RampKind, to_hz: f32, over: Duration) -> Self {
        self.ramp = Some(Ramp { kind, to_hz, over });
        self
    }

    pub fn with_decay(mut self, over: Duration) -> Self {
        self.decay = Some(over);
        self
    }

    /// Same voice with its gain multiplied by `factor`.
    pub fn scaled(&self, factor: f32) -> Self {
        let mut voice = self.clone();
        voice.gain *= factor.clamp(0.0, 1.0);
        voice
    }

    pub fn frequency_at(&self, t: f32) -> f32 {
        let Some(ramp) = self.ramp else {
            return self.start_hz;
        };
        let over = ramp.over.as_secs_f32();
        if over <= 0.0 || t >= over {
            return ramp.to_hz;
        }
        let x = (t / over).max(0.0);
        match ramp.kind {
            RampKind::Linear => self.start_hz + (ramp.to_hz - self.start_hz) * x,
            RampKind::Exponential => {
                if self.start_hz <= 0.0 || ramp.to_hz <= 0.0 {
                    // Exponential glides are undefined through zero.
                    return ramp.to_hz;
                }
                self.start_hz * (ramp.to_hz / self.start_hz).powf(x)
            }
        }
    }

    pub fn gain_at(&self, t: f32) -> f32 {
        let Some(decay) = self.decay else {
            return self.gain;
        };
        let over = decay.as_secs_f32();
        if self.gain <= DECAY_FLOOR {
            return self.gain;
        }
        if over <= 0.0 || t >= over {
            return DECAY_FLOOR;
        }
        self.gain * (DECAY_FLOOR / self.gain).powf(t.max(0.0) / over)
    }

    pub fn frame_count(&self, sample_rate: u32) -> usize {
        (self.duration.as_secs_f64() * f64::from(sample_rate)).round() as usize
    }

    /// Render mono samples in `-1.0..=1.0`.
    ///
    /// Phase is accumulated sample by sample, so glides have no discontinuity.
    pub fn render(&self, sample_rate: u32) -> Vec<f32> {
        let frames = self.frame_count(sample_rate);
        let rate = sample_rate.max(1) as f32;
        let mut samples = Vec::with_capacity(frames);
        let mut phase = 0.0f32;
        for n in 0..frames {
            let t = n as f32 / rate;
            let value = match self.waveform {
                Waveform::Sine => (phase * TAU).sin(),
                Waveform::Square => {
                    if phase < 0.5 {
                        1.0
                    } else {
                        -1.0
                    }
                }
            };
            samples.push((value * self.gain_at(t)).clamp(-1.0, 1.0));
            phase = (phase + self.frequency_at(t) / rate).fract();
        }
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn render_length_matches_duration() {
        let voice = Voice::tone(Waveform::Sine, 800.0, 0.2, Duration::from_millis(80));
        assert_eq!(voice.render(44_100).len(), 3_528);
        assert_eq!(voice.render(8_000).len(), 640);
    }

    #[test]
    fn sine_starts_at_zero_and_stays_within_gain() {
        let voice = Voice::tone(Waveform::Sine, 440.0, 0.5, Duration::from_millis(50));
        let samples = voice.render(DEFAULT_SAMPLE_RATE);
        assert_eq!(samples[0], 0.0);
        assert!(samples.iter().all(|s| s.abs() <= 0.5 + 1e-6));
        assert!(samples.iter().any(|s| *s > 0.45));
    }

    #[test]
    fn square_alternates_at_full_gain() {
        let voice = Voice::tone(Waveform::Square, 100.0, 0.3, Duration::from_millis(20));
        let samples = voice.render(1_000);
        assert!(close(samples[0], 0.3));
        assert!(close(samples[2], 0.3));
        assert!(close(samples[7], -0.3));
        assert!(close(samples[12], 0.3));
    }

    #[test]
    fn linear_ramp_midpoint_and_hold() {
        let voice = Voice::tone(Waveform::Sine, 600.0, 0.6, Duration::from_millis(500))
            .with_ramp(RampKind::Linear, 1200.0, Duration::from_millis(200));
        assert!(close(voice.frequency_at(0.0), 600.0));
        assert!(close(voice.frequency_at(0.1), 900.0));
        assert!(close(voice.frequency_at(0.4), 1200.0));
    }

    #[test]
    fn exponential_ramp_is_geometric() {
        let voice = Voice::tone(Waveform::Sine, 1000.0, 0.2, Duration::from_millis(300))
            .with_ramp(RampKind::Exponential, 4000.0, Duration::from_millis(100));
        assert!((voice.frequency_at(0.05) - 2000.0).abs() < 0.5);
        assert!(close(voice.frequency_at(0.1), 4000.0));
    }

    #[test]
    fn decay_reaches_floor() {
        let voice = Voice::tone(Waveform::Square, 440.0, 0.3, Duration::from_millis(300))
            .with_decay(Duration::from_millis(300));
        assert!(close(voice.gain_at(0.0), 0.3));
        assert!(voice.gain_at(0.15) < 0.3 && voice.gain_at(0.15) > DECAY_FLOOR);
        assert!(close(voice.gain_at(0.3), DECAY_FLOOR));
        let tail = *voice.render(DEFAULT_SAMPLE_RATE).last().unwrap();
        assert!(tail.abs() <= 0.002);
    }

    #[test]
    fn scaling_clamps_factor() {
        let voice = Voice::tone(Waveform::Sine, 440.0, 0.4, Duration::from_millis(10));
        assert!(close(voice.scaled(0.5).gain, 0.2));
        assert!(close(voice.scaled(3.0).gain, 0.4));
        assert_eq!(voice.scaled(-1.0).gain, 0.0);
    }
}
