// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Convolution reverb with a procedurally generated room.
//!
//! The impulse response is decaying white noise. Convolution runs as a uniformly
//! partitioned overlap-save: the response is cut into blocks, each block is
//! transformed once, and every incoming block is multiplied against the whole
//! spectrum history. This adds one block of latency to the wet signal.

use std::collections::VecDeque;
use std::sync::Arc;

use log::debug;
use rand::Rng;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::{Effect, EffectError};
use crate::wave::Stereo;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbParams {
    /// Length of the impulse response in seconds.
    pub seconds: f64,
    /// Exponent of the `(1 - t)` decay curve.
    pub decay: f64,
    /// Amplitude of the raw noise.
    pub amplitude: f64,
    pub wet: f64,
    pub dry: f64,
    /// Partition size in samples. The transforms are twice as long.
    pub block_size: usize,
}

impl Default for ReverbParams {
    fn default() -> Self {
        ReverbParams {
            seconds: 2.0,
            decay: 2.0,
            amplitude: 0.5,
            wet: 0.3,
            dry: 0.7,
            block_size: 512,
        }
    }
}

/// Generate a stereo impulse response: sample `i` of each channel is uniform noise
/// in `[-1, 1)` scaled by `amplitude * (1 - i/len)^decay`.
pub fn impulse_response<R: Rng>(
    rng: &mut R,
    sample_rate: f64,
    params: &ReverbParams,
) -> Result<Stereo<Vec<f64>>, EffectError> {
    let length = (params.seconds * sample_rate).round();
    if !(length >= 1.0) {
        return Err(EffectError::EmptyImpulse {
            seconds: params.seconds,
            sample_rate,
        });
    }
    let length = length as usize;
    let mut channel = || -> Vec<f64> {
        (0..length)
            .map(|i| {
                let envelope = (1.0 - i as f64 / length as f64).powf(params.decay);
                rng.gen_range(-1.0f64..1.0) * envelope * params.amplitude
            })
            .collect()
    };
    let left = channel();
    let right = channel();
    Ok(Stereo::new(left, right))
}

/// Scale both channels so the response has unit energy on average.
fn normalize(response: &mut Stereo<Vec<f64>>) {
    let energy = |channel: &[f64]| channel.iter().map(|x| x * x).sum::<f64>();
    let average = (energy(&response.left) + energy(&response.right)) / 2.0;
    if average > 0.0 {
        let scale = 1.0 / average.sqrt();
        response
            .left
            .iter_mut()
            .chain(response.right.iter_mut())
            .for_each(|x| *x *= scale);
    }
}

/// Overlap-save convolution of one channel.
struct Convolver {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    block_size: usize,
    /// Spectra of the impulse response partitions.
    partitions: Vec<Vec<Complex<f64>>>,
    /// Spectra of the most recent input blocks, newest first.
    history: VecDeque<Vec<Complex<f64>>>,
    /// The previous and the current input block.
    window: Vec<f64>,
    spectrum: Vec<Complex<f64>>,
    accumulator: Vec<Complex<f64>>,
    /// Working memory of the transforms.
    scratch: Vec<Complex<f64>>,
}

impl Convolver {
    fn new(
        response: &[f64],
        block_size: usize,
        planner: &mut FftPlanner<f64>,
    ) -> Result<Self, EffectError> {
        if block_size == 0 {
            return Err(EffectError::BlockSize { block_size });
        }
        let size = 2 * block_size;
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let mut scratch = vec![
            Complex::default();
            forward
                .get_inplace_scratch_len()
                .max(inverse.get_inplace_scratch_len())
        ];

        let partitions: Vec<Vec<Complex<f64>>> = response
            .chunks(block_size)
            .map(|chunk| {
                let mut spectrum = vec![Complex::default(); size];
                for (slot, x) in spectrum.iter_mut().zip(chunk.iter()) {
                    *slot = Complex::new(*x, 0.0);
                }
                forward.process_with_scratch(&mut spectrum, &mut scratch);
                spectrum
            })
            .collect();
        let history = (0..partitions.len())
            .map(|_| vec![Complex::default(); size])
            .collect();
        Ok(Convolver {
            forward,
            inverse,
            block_size,
            partitions,
            history,
            window: vec![0.0; size],
            spectrum: vec![Complex::default(); size],
            accumulator: vec![Complex::default(); size],
            scratch,
        })
    }

    /// Convolve one full block of input, writing one block of output.
    fn process_block(&mut self, input: &[f64], output: &mut [f64]) {
        let n = self.block_size;
        self.window.copy_within(n.., 0);
        self.window[n..].copy_from_slice(input);

        for (slot, x) in self.spectrum.iter_mut().zip(self.window.iter()) {
            *slot = Complex::new(*x, 0.0);
        }
        self.forward
            .process_with_scratch(&mut self.spectrum, &mut self.scratch);

        if let Some(mut oldest) = self.history.pop_back() {
            oldest.copy_from_slice(&self.spectrum);
            self.history.push_front(oldest);
        }

        self.accumulator
            .iter_mut()
            .for_each(|x| *x = Complex::default());
        for (spectrum, partition) in self.history.iter().zip(self.partitions.iter()) {
            for ((acc, x), h) in self
                .accumulator
                .iter_mut()
                .zip(spectrum.iter())
                .zip(partition.iter())
            {
                *acc += *x * *h;
            }
        }
        self.inverse
            .process_with_scratch(&mut self.accumulator, &mut self.scratch);

        // the first half is circular wrap-around, only the second half is valid
        let scale = 1.0 / (2 * n) as f64;
        for (out, value) in output.iter_mut().zip(self.accumulator[n..].iter()) {
            *out = value.re * scale;
        }
    }
}

pub struct ConvolutionReverb {
    params: ReverbParams,
    left: Convolver,
    right: Convolver,
    /// Input collected for the block being filled.
    input: Stereo<Vec<f64>>,
    /// Wet output of the previous block, played back while the next one fills.
    output: Stereo<Vec<f64>>,
    position: usize,
}

impl ConvolutionReverb {
    /// Build a reverb from a freshly generated room.
    pub fn generate<R: Rng>(
        rng: &mut R,
        sample_rate: f64,
        params: ReverbParams,
    ) -> Result<Self, EffectError> {
        let response = impulse_response(rng, sample_rate, &params)?;
        ConvolutionReverb::with_response(response, params)
    }

    pub fn with_response(
        mut response: Stereo<Vec<f64>>,
        params: ReverbParams,
    ) -> Result<Self, EffectError> {
        if response.left.is_empty() || response.right.is_empty() {
            return Err(EffectError::EmptyImpulse {
                seconds: 0.0,
                sample_rate: 0.0,
            });
        }
        normalize(&mut response);
        let block_size = params.block_size;
        let mut planner = FftPlanner::new();
        let left = Convolver::new(&response.left, block_size, &mut planner)?;
        let right = Convolver::new(&response.right, block_size, &mut planner)?;
        debug!(
            "reverb with {} partitions of {} samples",
            left.partitions.len(),
            block_size
        );
        Ok(ConvolutionReverb {
            params,
            left,
            right,
            input: Stereo::new(vec![0.0; block_size], vec![0.0; block_size]),
            output: Stereo::new(vec![0.0; block_size], vec![0.0; block_size]),
            position: 0,
        })
    }

    /// Delay in samples between dry input and the start of the wet signal.
    pub fn latency(&self) -> usize {
        self.params.block_size
    }
}

impl Effect for ConvolutionReverb {
    fn name(&self) -> &'static str {
        "reverb"
    }

    fn process(&mut self, buffer: &mut [Stereo<f64>]) {
        let (wet, dry) = (self.params.wet, self.params.dry);
        for sample in buffer.iter_mut() {
            let input = *sample;
            self.input.left[self.position] = input.left;
            self.input.right[self.position] = input.right;
            let reverberated = Stereo::new(
                self.output.left[self.position],
                self.output.right[self.position],
            );
            *sample = input * dry + reverberated * wet;

            self.position += 1;
            if self.position == self.params.block_size {
                self.position = 0;
                self.left.process_block(&self.input.left, &mut self.output.left);
                self.right
                    .process_block(&self.input.right, &mut self.output.right);
            }
        }
    }
}
