// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Shared processing between the synthesizer and the master gain.

pub mod compressor;
pub mod reverb;

use log::{debug, warn};
use rand::Rng;
use snafu::Snafu;

use self::compressor::{Compressor, CompressorParams};
use self::reverb::{ConvolutionReverb, ReverbParams};
use crate::wave::Stereo;

/// An in-place processor of a stereo stream.
pub trait Effect {
    fn name(&self) -> &'static str;

    fn process(&mut self, buffer: &mut [Stereo<f64>]);
}

#[derive(Debug, Clone, PartialEq, Snafu)]
pub enum EffectError {
    #[snafu(display("The output device cannot run a convolution"))]
    Unsupported,
    #[snafu(display(
        "An impulse response of {} s at {} Hz has no samples",
        seconds,
        sample_rate
    ))]
    EmptyImpulse { seconds: f64, sample_rate: f64 },
    #[snafu(display("Reverb block size must not be {}", block_size))]
    BlockSize { block_size: usize },
}

/// Unity pass-through.
#[derive(Debug, Default, Clone, Copy)]
pub struct Bypass;

impl Effect for Bypass {
    fn name(&self) -> &'static str {
        "bypass"
    }

    fn process(&mut self, _buffer: &mut [Stereo<f64>]) {}
}

/// Compressor followed by reverb. The reverb stage degrades to a pass-through
/// when it cannot be built.
pub struct EffectsChain {
    compressor: Compressor,
    reverb: Box<dyn Effect>,
}

impl EffectsChain {
    pub fn new<R: Rng>(sample_rate: f64, supports_convolution: bool, rng: &mut R) -> Self {
        EffectsChain::with_params(
            sample_rate,
            supports_convolution,
            CompressorParams::default(),
            ReverbParams::default(),
            rng,
        )
    }

    pub fn with_params<R: Rng>(
        sample_rate: f64,
        supports_convolution: bool,
        compressor: CompressorParams,
        reverb: ReverbParams,
        rng: &mut R,
    ) -> Self {
        let reverb: Box<dyn Effect> = match build_reverb(sample_rate, supports_convolution, reverb, rng)
        {
            Ok(reverb) => Box::new(reverb),
            Err(err) => {
                warn!("reverb disabled: {}", err);
                Box::new(Bypass)
            }
        };
        debug!("effects chain: compressor -> {}", reverb.name());
        EffectsChain {
            compressor: Compressor::new(sample_rate, compressor),
            reverb,
        }
    }

    /// Whether the reverb stage actually convolves.
    pub fn has_reverb(&self) -> bool {
        self.reverb.name() != "bypass"
    }

    pub fn compressor(&self) -> &Compressor {
        &self.compressor
    }

    pub fn process(&mut self, buffer: &mut [Stereo<f64>]) {
        self.compressor.process(buffer);
        self.reverb.process(buffer);
    }
}

fn build_reverb<R: Rng>(
    sample_rate: f64,
    supports_convolution: bool,
    params: ReverbParams,
    rng: &mut R,
) -> Result<ConvolutionReverb, EffectError> {
    if !supports_convolution {
        return Unsupported.fail();
    }
    ConvolutionReverb::generate(rng, sample_rate, params)
}
