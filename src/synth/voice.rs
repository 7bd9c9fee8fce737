// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! A single sounding tone: fundamental, optional overtones and their envelopes.

use super::envelope::ToneEnvelope;
use super::filter::{Biquad, BiquadCoefficients};
use super::oscillator::Oscillator;
use super::{SynthConfig, ToneHandle};
use crate::wave::{Sample, Stereo};

/// An overtone with its own envelope. Overtones bypass the low-pass filter.
struct Partial {
    oscillator: Oscillator,
    envelope: ToneEnvelope,
}

pub(super) struct Voice {
    pub(super) handle: ToneHandle,
    oscillator: Oscillator,
    coefficients: BiquadCoefficients,
    filter: Biquad,
    envelope: ToneEnvelope,
    partials: Vec<Partial>,
}

impl Voice {
    pub(super) fn new(
        handle: ToneHandle,
        config: &SynthConfig,
        sample_rate: f64,
        frequency: f64,
        duration: f64,
        volume: f64,
    ) -> Self {
        let partials = config
            .partials()
            .iter()
            .map(|&(ratio, gain)| Partial {
                oscillator: Oscillator::new(config.wave, sample_rate, frequency * ratio),
                envelope: config
                    .envelope
                    .schedule(volume * gain, duration, sample_rate),
            })
            .collect();

        Voice {
            handle,
            oscillator: Oscillator::new(config.wave, sample_rate, frequency),
            coefficients: BiquadCoefficients::lowpass(
                sample_rate,
                frequency * config.filter_ratio,
                config.filter_q,
            ),
            filter: Biquad::new(),
            envelope: config.envelope.schedule(volume, duration, sample_rate),
            partials,
        }
    }

    /// Next sample of the tone, or `None` once every envelope has faded.
    pub(super) fn sample(&mut self) -> Option<Stereo<f64>> {
        if self.faded() {
            return None;
        }
        let filtered = self
            .filter
            .step(&self.coefficients, self.oscillator.next_sample());
        let mut value = filtered * self.envelope.step();
        for partial in self.partials.iter_mut() {
            value += partial.oscillator.next_sample() * partial.envelope.step();
        }
        Some(Stereo::mono(value))
    }

    pub(super) fn fade_out(&mut self, samples: Sample) {
        self.envelope.fade_out(samples);
        for partial in self.partials.iter_mut() {
            partial.envelope.fade_out(samples);
        }
    }

    pub(super) fn faded(&self) -> bool {
        self.envelope.faded() && self.partials.iter().all(|p| p.envelope.faded())
    }

    pub(super) fn partial_count(&self) -> usize {
        self.partials.len()
    }
}
