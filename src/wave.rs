// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Sampled audio data.

use std::ops;

/// Time measured in samples since the engine started.
pub type Sample = usize;

/// Convert seconds to a whole number of samples, rounding to the nearest sample.
///
/// ```
/// use ocarina_tutor::wave::*;
///
/// assert_eq!(seconds_to_samples(0.05, 44100.0), 2205);
/// assert_eq!(seconds_to_samples(-1.0, 44100.0), 0);
/// ```
pub fn seconds_to_samples(seconds: f64, sample_rate: f64) -> Sample {
    (seconds * sample_rate).round().max(0.0) as Sample
}

/// A buffer holding floating point audio data.
pub struct AudioBuffer {
    samples: Vec<Stereo<f64>>,
}

#[allow(clippy::len_without_is_empty)]
impl AudioBuffer {
    pub fn new(sample_count: usize) -> Self {
        Self {
            samples: vec![Stereo::mono(0.0); sample_count],
        }
    }

    /// Set all samples to zero.
    pub fn fill_zero(&mut self) {
        self.samples
            .iter_mut()
            .for_each(|s| *s = Stereo::mono(0.0));
    }

    /// Size of the buffer in samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[Stereo<f64>] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [Stereo<f64>] {
        &mut self.samples
    }
}

/// Size of `samples` in bytes once interleaved as `f64`.
pub fn byte_len(samples: &[Stereo<f64>]) -> usize {
    samples.len() * 2 * std::mem::size_of::<f64>()
}

/// Copy the stereo `f64` samples to little endian bytes, interleaving the left and right samples.
///
/// Returns the number of samples that were actually copied.
/// Might be less than the number of input samples if the output buffer was not large enough.
///
/// ```
/// use ocarina_tutor::wave::*;
///
/// let mut bytes = [0u8; 16];
/// assert_eq!(copy_bytes_to(&[Stereo::new(1.0, -1.0)], &mut bytes), 1);
/// assert_eq!(bytes[0..8], 1.0f64.to_le_bytes());
/// assert_eq!(bytes[8..16], (-1.0f64).to_le_bytes());
/// ```
pub fn copy_bytes_to(samples: &[Stereo<f64>], bytes: &mut [u8]) -> usize {
    let mut processed = 0;
    for (sample, target) in samples.iter().zip(bytes.chunks_exact_mut(16)) {
        target[0..8].copy_from_slice(&sample.left.to_le_bytes());
        target[8..16].copy_from_slice(&sample.right.to_le_bytes());
        processed += 1;
    }
    processed
}

/// Convenience type for making things stereo, e.g. individual samples or whole buffers.
///
/// ```
/// use ocarina_tutor::wave::*;
///
/// let stereo = Stereo::new(0.25, 0.5);
/// let stereo2 = stereo + Stereo::new(0.5, -0.25);
/// assert_eq!(stereo2 * 2.0, Stereo::new(1.5, 0.5));
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Stereo<T> {
    pub left: T,
    pub right: T,
}

impl<T> Stereo<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    pub fn mono(mono: T) -> Self
    where
        T: Copy,
    {
        Self::new(mono, mono)
    }
}

impl Stereo<f64> {
    /// Absolute peak of both channels.
    pub fn peak(self) -> f64 {
        self.left.abs().max(self.right.abs())
    }
}

impl std::iter::Sum for Stereo<f64> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        let mut out = Stereo::mono(0.0);
        for x in iter {
            out += x;
        }
        out
    }
}

impl<T: ops::Add> ops::Add for Stereo<T> {
    type Output = Stereo<T::Output>;

    fn add(self, rhs: Self) -> Self::Output {
        Stereo {
            left: self.left + rhs.left,
            right: self.right + rhs.right,
        }
    }
}

impl<T: ops::AddAssign> ops::AddAssign for Stereo<T> {
    fn add_assign(&mut self, rhs: Self) {
        self.left += rhs.left;
        self.right += rhs.right;
    }
}

impl<T: ops::Mul + Copy> ops::Mul<T> for Stereo<T> {
    type Output = Stereo<T::Output>;

    fn mul(self, rhs: T) -> Self::Output {
        Stereo {
            left: self.left * rhs,
            right: self.right * rhs,
        }
    }
}

impl<T: ops::MulAssign + Copy> ops::MulAssign<T> for Stereo<T> {
    fn mul_assign(&mut self, rhs: T) {
        self.left *= rhs;
        self.right *= rhs;
    }
}
