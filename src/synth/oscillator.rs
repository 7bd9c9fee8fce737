// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

/// Position within one period of a wave, in `[0, 1)`.
#[derive(Debug, Copy, Clone)]
pub struct Phase(f64);

impl Phase {
    pub const ZERO: Phase = Phase(0.0);

    pub fn new(offset: f64) -> Phase {
        Phase(offset - offset.floor())
    }

    pub fn offset(self) -> f64 {
        self.0
    }

    pub fn step_frequency(self, frequency: f64, sample_rate: f64) -> Phase {
        Phase::new(self.0 + frequency / sample_rate)
    }
}

/// The wave shapes an oscillator can produce.
///
/// ```
/// use ocarina_tutor::synth::oscillator::*;
///
/// assert_eq!(WaveShape::Sine.eval(Phase::ZERO), 0.0);
/// assert_eq!(WaveShape::Triangle.eval(Phase::new(0.25)), 1.0);
/// assert_eq!(WaveShape::Square.eval(Phase::new(0.75)), -1.0);
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WaveShape {
    Sine,
    Triangle,
    Square,
}

impl WaveShape {
    pub fn eval(self, phase: Phase) -> f64 {
        let offset = phase.offset();
        use std::f64::consts::PI;
        match self {
            WaveShape::Sine => (offset * 2.0 * PI).sin(),
            WaveShape::Triangle => {
                if offset < 0.25 {
                    4.0 * offset
                } else if offset < 0.75 {
                    2.0 - 4.0 * offset
                } else {
                    4.0 * offset - 4.0
                }
            }
            WaveShape::Square => {
                if offset < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

/// An oscillator sampling a wave of some shape at a fixed sample rate.
#[derive(Debug, Clone)]
pub struct Oscillator {
    shape: WaveShape,
    sample_rate: f64,
    frequency: f64,
    phase: Phase,
}

impl Oscillator {
    pub fn new(shape: WaveShape, sample_rate: f64, frequency: f64) -> Self {
        Self {
            shape,
            sample_rate,
            frequency,
            phase: Phase::ZERO,
        }
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn next_sample(&mut self) -> f64 {
        let result = self.shape.eval(self.phase);
        self.phase = self.phase.step_frequency(self.frequency, self.sample_rate);
        result
    }
}
