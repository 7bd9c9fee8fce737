// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The audio path from the synthesizer to the output device, and the sample clock.

use log::{debug, error, info, trace};
use rand::Rng;
use snafu::{ResultExt, Snafu};

use crate::effects::EffectsChain;
use crate::output::{DeviceError, DeviceState, OutputDevice};
use crate::synth::{SynthConfig, Synthesizer, ToneError, ToneHandle};
use crate::wave::{AudioBuffer, Sample, Stereo};

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub synth: SynthConfig,
    /// Route the synthesizer through compressor and reverb.
    pub effects: bool,
    pub master_gain: f64,
    /// Samples rendered per device write.
    pub buffer_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            synth: SynthConfig::default(),
            effects: true,
            master_gain: 0.3,
            // 10 ms buffer at 44100 Hz
            buffer_size: 441,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Snafu)]
pub enum PlayError {
    #[snafu(display("Audio output needs to be activated by the user"))]
    NeedsActivation,
    #[snafu(display("Audio output is {}", state))]
    Unavailable { state: DeviceState },
    #[snafu(display("{}", source))]
    InvalidTone { source: ToneError },
}

impl PlayError {
    /// Whether playing may succeed later, e.g. after a user gesture.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PlayError::Unavailable { .. })
    }
}

pub struct AudioEngine<D> {
    device: D,
    synth: Synthesizer,
    effects: Option<EffectsChain>,
    master_gain: f64,
    /// Samples rendered so far.
    clock: Sample,
    buffer: AudioBuffer,
}

impl<D: OutputDevice> AudioEngine<D> {
    pub fn new<R: Rng>(device: D, config: EngineConfig, rng: &mut R) -> Self {
        let sample_rate = device.sample_rate();
        let effects = if config.effects {
            Some(EffectsChain::new(
                sample_rate,
                device.supports_convolution(),
                rng,
            ))
        } else {
            debug!("effects disabled");
            None
        };
        info!("audio engine at {} Hz", sample_rate);
        AudioEngine {
            synth: Synthesizer::new(sample_rate, config.synth),
            effects,
            master_gain: clamp_gain(config.master_gain),
            clock: 0,
            buffer: AudioBuffer::new(config.buffer_size.max(1)),
            device,
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.synth.sample_rate()
    }

    /// Current position of the sample clock.
    pub fn now(&self) -> Sample {
        self.clock
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn synth(&self) -> &Synthesizer {
        &self.synth
    }

    pub fn effects(&self) -> Option<&EffectsChain> {
        self.effects.as_ref()
    }

    pub fn master_gain(&self) -> f64 {
        self.master_gain
    }

    pub fn set_master_gain(&mut self, gain: f64) {
        self.master_gain = clamp_gain(gain);
        debug!("master gain {:.2}", self.master_gain);
    }

    /// Start the device on behalf of a user gesture.
    pub fn activate(&mut self) -> Result<(), DeviceError> {
        self.device.resume(true)
    }

    /// Start a tone, resuming a suspended device once if needed.
    pub fn play_tone(
        &mut self,
        frequency: f64,
        duration: f64,
        volume: f64,
    ) -> Result<ToneHandle, PlayError> {
        match self.device.state() {
            DeviceState::Running => {}
            DeviceState::Closed => {
                return Unavailable {
                    state: DeviceState::Closed,
                }
                .fail()
            }
            DeviceState::Suspended => {
                if let Err(err) = self.device.resume(false) {
                    debug!("could not resume output: {}", err);
                    return NeedsActivation.fail();
                }
            }
        }
        self.synth
            .play_tone(frequency, duration, volume)
            .context(InvalidTone)
    }

    pub fn stop(&mut self, handle: ToneHandle) -> bool {
        self.synth.stop(handle)
    }

    pub fn stop_all(&mut self) {
        self.synth.stop_all();
    }

    /// Advance the clock by `frames` samples, sending the audio to the device
    /// while it is running.
    pub fn render(&mut self, frames: Sample) {
        let mut remaining = frames;
        while remaining > 0 {
            let n = remaining.min(self.buffer.len());
            let samples = &mut self.buffer.samples_mut()[..n];
            samples.iter_mut().for_each(|s| *s = Stereo::mono(0.0));
            self.synth.fill_buffer(samples);
            if let Some(effects) = self.effects.as_mut() {
                effects.process(samples);
            }
            let gain = self.master_gain;
            samples.iter_mut().for_each(|s| *s *= gain);

            if self.device.state() == DeviceState::Running {
                if let Err(err) = self.device.write(samples) {
                    error!("closing audio output: {}", err);
                    self.device.close();
                }
            }
            self.clock += n;
            remaining -= n;
        }
        trace!("rendered up to sample {}", self.clock);
    }
}

fn clamp_gain(gain: f64) -> f64 {
    if gain.is_nan() {
        0.0
    } else {
        gain.max(0.0).min(1.0)
    }
}
