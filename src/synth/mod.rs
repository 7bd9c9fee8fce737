// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The tone synthesizer, converting tone requests into wave data.
//!
//! Each tone is a sine fundamental through a low-pass filter and an amplitude
//! envelope, optionally accompanied by quieter overtones. Tones are identified
//! by monotonically increasing handles and removed once their envelope is over.

pub mod envelope;
pub mod filter;
pub mod oscillator;
mod voice;

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, trace};
use snafu::Snafu;

use self::envelope::EnvelopeShape;
use self::oscillator::WaveShape;
use self::voice::Voice;
use crate::wave::{seconds_to_samples, Stereo};

/// Overtones as (frequency ratio, gain relative to the fundamental).
const HARMONICS: [(f64, f64); 3] = [(2.0, 0.15), (3.0, 0.08), (4.0, 0.04)];

/// Duration of the fade applied by `stop_all`.
pub const STOP_FADE_SECS: f64 = 0.05;

/// Capabilities and timbre of the synthesizer.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthConfig {
    pub envelope: EnvelopeShape,
    /// Add overtones at two, three and four times the fundamental.
    pub harmonics: bool,
    /// Low-pass cutoff as a multiple of the fundamental.
    pub filter_ratio: f64,
    pub filter_q: f64,
    pub wave: WaveShape,
    /// Upper bound on simultaneously registered tones.
    pub max_voices: usize,
}

impl SynthConfig {
    /// Plain sine tones with a soft envelope.
    pub fn basic() -> Self {
        SynthConfig {
            envelope: EnvelopeShape::BASIC,
            harmonics: false,
            filter_ratio: 3.0,
            filter_q: 1.0,
            wave: WaveShape::Sine,
            max_voices: 24,
        }
    }

    /// A brighter, breathier tone closer to a real ocarina.
    pub fn enhanced() -> Self {
        SynthConfig {
            envelope: EnvelopeShape::ENHANCED,
            harmonics: true,
            filter_ratio: 4.0,
            ..SynthConfig::basic()
        }
    }

    fn partials(&self) -> &'static [(f64, f64)] {
        if self.harmonics {
            &HARMONICS
        } else {
            &[]
        }
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        SynthConfig::enhanced()
    }
}

/// Opaque handle identifying a tone.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ToneHandle(u64);

impl fmt::Display for ToneHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tone#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Snafu)]
pub enum ToneError {
    #[snafu(display("Cannot play a tone at {} Hz", frequency))]
    Frequency { frequency: f64 },
    #[snafu(display("Cannot play a tone lasting {} s", duration))]
    Duration { duration: f64 },
}

pub struct Synthesizer {
    /// Samples per second rate of the generated audio signal.
    sample_rate: f64,
    config: SynthConfig,
    /// Monotonically increasing id used for identifying tones.
    next_handle: u64,
    /// Registered tones, oldest first.
    active: BTreeMap<ToneHandle, Voice>,
    /// Tones that were stopped or stolen and are ramping down.
    fading: Vec<Voice>,
}

impl Synthesizer {
    pub fn new(sample_rate: f64, config: SynthConfig) -> Self {
        Synthesizer {
            sample_rate,
            config,
            next_handle: 0,
            active: BTreeMap::new(),
            fading: Vec::new(),
        }
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Start a tone at `frequency` Hz lasting `duration` seconds, peaking at `volume`.
    ///
    /// The volume is clamped to `[0, 1]`. When the voice cap is reached,
    /// the oldest tone is faded out to make room.
    ///
    /// ```
    /// use ocarina_tutor::synth::*;
    ///
    /// let mut synth = Synthesizer::new(8000.0, SynthConfig::basic());
    /// let first = synth.play_tone(440.0, 0.5, 0.5).unwrap();
    /// let second = synth.play_tone(440.0, 0.5, 0.5).unwrap();
    /// assert!(first < second);
    /// assert!(synth.is_active(first));
    /// assert!(synth.play_tone(0.0, 0.5, 0.5).is_err());
    /// ```
    pub fn play_tone(
        &mut self,
        frequency: f64,
        duration: f64,
        volume: f64,
    ) -> Result<ToneHandle, ToneError> {
        if !(frequency.is_finite() && frequency > 0.0) {
            return Frequency { frequency }.fail();
        }
        if !(duration.is_finite() && duration > 0.0) {
            return Duration { duration }.fail();
        }
        let volume = if volume.is_nan() {
            0.0
        } else {
            volume.max(0.0).min(1.0)
        };

        while self.active.len() >= self.config.max_voices.max(1) {
            let oldest = match self.active.keys().next() {
                Some(handle) => *handle,
                None => break,
            };
            debug!("voice limit reached, stealing {}", oldest);
            self.stop(oldest);
        }

        let handle = ToneHandle(self.next_handle);
        self.next_handle += 1;
        let voice = Voice::new(
            handle,
            &self.config,
            self.sample_rate,
            frequency,
            duration,
            volume,
        );
        trace!(
            "{}: {:.2} Hz for {:.3} s at {:.2} with {} partials",
            handle,
            frequency,
            duration,
            volume,
            voice.partial_count()
        );
        self.active.insert(handle, voice);
        Ok(handle)
    }

    /// Whether the tone is still registered, i.e. neither finished nor stopped.
    pub fn is_active(&self, handle: ToneHandle) -> bool {
        self.active.contains_key(&handle)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Number of tones still producing sound, including fading ones.
    pub fn sounding_count(&self) -> usize {
        self.active.len() + self.fading.len()
    }

    /// Fade out a single tone. Returns whether the tone was registered.
    pub fn stop(&mut self, handle: ToneHandle) -> bool {
        match self.active.remove(&handle) {
            Some(mut voice) => {
                voice.fade_out(seconds_to_samples(STOP_FADE_SECS, self.sample_rate));
                self.fading.push(voice);
                true
            }
            None => false,
        }
    }

    /// Fade every tone to silence over 50 ms and clear the registry at once.
    pub fn stop_all(&mut self) {
        let fade = seconds_to_samples(STOP_FADE_SECS, self.sample_rate);
        let count = self.active.len();
        for (_, mut voice) in std::mem::take(&mut self.active) {
            voice.fade_out(fade);
            self.fading.push(voice);
        }
        if count > 0 {
            debug!("fading out {} tones", count);
        }
    }

    /// Mix all sounding tones into `output`.
    pub fn fill_buffer(&mut self, output: &mut [Stereo<f64>]) {
        for out_sample in output.iter_mut() {
            let mut wave = Stereo::mono(0.0);
            for voice in self.active.values_mut() {
                if let Some(value) = voice.sample() {
                    wave += value;
                }
            }
            for voice_index in (0..self.fading.len()).rev() {
                match self.fading[voice_index].sample() {
                    Some(value) => wave += value,
                    None => {
                        trace!("removing faded {}", self.fading[voice_index].handle);
                        self.fading.swap_remove(voice_index);
                    }
                }
            }
            *out_sample += wave;
        }

        let before = self.active.len();
        self.active.retain(|_, voice| !voice.faded());
        if self.active.len() < before {
            trace!("{} tones finished", before - self.active.len());
        }
    }
}
