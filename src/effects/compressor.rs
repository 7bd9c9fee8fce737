// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Stereo-linked feed-forward compressor with a soft knee.

use super::Effect;
use crate::wave::Stereo;

/// Below this level the detector treats the input as silence.
const SILENCE_DB: f64 = -120.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorParams {
    /// Level in dB above which the gain is reduced.
    pub threshold: f64,
    /// Width in dB of the soft transition around the threshold.
    pub knee: f64,
    pub ratio: f64,
    /// Seconds to reach a stronger gain reduction.
    pub attack: f64,
    /// Seconds to recover from a gain reduction.
    pub release: f64,
}

impl Default for CompressorParams {
    fn default() -> Self {
        CompressorParams {
            threshold: -30.0,
            knee: 40.0,
            ratio: 12.0,
            attack: 0.003,
            release: 0.25,
        }
    }
}

impl CompressorParams {
    /// Static gain change in dB for an input level in dB.
    ///
    /// ```
    /// use ocarina_tutor::effects::compressor::*;
    ///
    /// let params = CompressorParams::default();
    /// // far below the knee nothing happens
    /// assert_eq!(params.gain_db(-60.0), 0.0);
    /// // far above it, every 12 dB of input only add one dB of output
    /// assert!((params.gain_db(0.0) - (-30.0 + 30.0 / 12.0)).abs() < 1e-9);
    /// ```
    pub fn gain_db(&self, input_db: f64) -> f64 {
        let half_knee = self.knee / 2.0;
        let slope = 1.0 - 1.0 / self.ratio;
        if input_db <= self.threshold - half_knee {
            0.0
        } else if input_db >= self.threshold + half_knee || self.knee <= 0.0 {
            -(input_db - self.threshold) * slope
        } else {
            let x = input_db - self.threshold + half_knee;
            -slope * x * x / (2.0 * self.knee)
        }
    }
}

pub struct Compressor {
    params: CompressorParams,
    attack_coeff: f64,
    release_coeff: f64,
    /// Smoothed gain change in dB, never positive.
    gain_db: f64,
}

impl Compressor {
    pub fn new(sample_rate: f64, params: CompressorParams) -> Self {
        let coeff = |seconds: f64| {
            if seconds <= 0.0 {
                0.0
            } else {
                (-1.0 / (seconds * sample_rate)).exp()
            }
        };
        Compressor {
            attack_coeff: coeff(params.attack),
            release_coeff: coeff(params.release),
            params,
            gain_db: 0.0,
        }
    }

    /// Current gain reduction in dB, zero or negative.
    pub fn reduction_db(&self) -> f64 {
        self.gain_db
    }

    fn step(&mut self, input: Stereo<f64>) -> Stereo<f64> {
        let peak = input.peak();
        let level_db = if peak > 0.0 {
            (20.0 * peak.log10()).max(SILENCE_DB)
        } else {
            SILENCE_DB
        };
        let target = self.params.gain_db(level_db);
        let coeff = if target < self.gain_db {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.gain_db = coeff * self.gain_db + (1.0 - coeff) * target;
        input * 10f64.powf(self.gain_db / 20.0)
    }
}

impl Effect for Compressor {
    fn name(&self) -> &'static str {
        "compressor"
    }

    fn process(&mut self, buffer: &mut [Stereo<f64>]) {
        for sample in buffer.iter_mut() {
            *sample = self.step(*sample);
        }
    }
}
