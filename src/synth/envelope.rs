// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

use crate::wave::{seconds_to_samples, Sample};

/// An Attack-Decay-Sustain-Release envelope for a tone of known length.
///
/// The amplitude rises linearly from zero to the peak over `attack` seconds,
/// then decays over `decay` seconds to `sustain` times the peak, where it is held.
/// The release starts `release` seconds before the end of the tone, so that the
/// tone has faded completely when its duration is over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeShape {
    /// Time in seconds to go from 0.0 to the peak.
    pub attack: f64,
    /// Time in seconds to go from the peak to the sustain level.
    pub decay: f64,
    /// Sustain level relative to the peak.
    pub sustain: f64,
    /// Time in seconds to go from the sustain level to 0.0.
    pub release: f64,
}

impl EnvelopeShape {
    /// Soft, slow envelope of the plain synthesizer.
    pub const BASIC: EnvelopeShape = EnvelopeShape {
        attack: 0.1,
        decay: 0.3,
        sustain: 0.6,
        release: 0.8,
    };

    /// Quicker envelope used together with harmonics.
    pub const ENHANCED: EnvelopeShape = EnvelopeShape {
        attack: 0.05,
        decay: 0.1,
        sustain: 0.8,
        release: 0.3,
    };

    /// Schedule the envelope for a tone of `duration` seconds peaking at `peak`.
    ///
    /// Attack and decay keep their lengths. The sustain lasts until `release`
    /// seconds before the end, or disappears when the tone is too short for it, in
    /// which case the release starts right after the decay. Only a tone shorter
    /// than attack and decay together shrinks all three segments proportionally.
    ///
    /// # Example
    ///
    /// ```
    /// use ocarina_tutor::synth::envelope::*;
    /// let shape = EnvelopeShape {
    ///     attack: 0.25,
    ///     decay: 0.25,
    ///     sustain: 0.5,
    ///     release: 0.5,
    /// };
    /// let mut eval = shape.schedule(1.0, 2.0, 4.0); // 4 samples per second
    /// assert_eq!(eval.len(), 8);
    /// assert_eq!(eval.step(), 0.0);
    /// assert_eq!(eval.step(), 1.0);
    /// assert_eq!(eval.step(), 0.5);
    /// assert_eq!(eval.step(), 0.5);
    /// assert_eq!(eval.step(), 0.5);
    /// assert_eq!(eval.step(), 0.5);
    /// assert_eq!(eval.step(), 0.5);
    /// assert!(!eval.faded());
    /// assert_eq!(eval.step(), 0.25);
    /// assert!(eval.faded());
    /// assert_eq!(eval.step(), 0.0);
    /// ```
    pub fn schedule(&self, peak: f64, duration: f64, sample_rate: f64) -> ToneEnvelope {
        let duration = duration.max(0.0);
        let rise = self.attack + self.decay;
        let scale = if rise > duration {
            duration / (rise + self.release)
        } else {
            1.0
        };
        let attack = self.attack * scale;
        let decay = self.decay * scale;
        let release = self.release * scale;

        let end = seconds_to_samples(duration, sample_rate);
        let attack_end = seconds_to_samples(attack, sample_rate).min(end);
        let decay_end = seconds_to_samples(attack + decay, sample_rate)
            .max(attack_end)
            .min(end);
        let release_start = seconds_to_samples((duration - release).max(0.0), sample_rate)
            .max(decay_end)
            .min(end);

        ToneEnvelope {
            peak,
            sustain_level: peak * self.sustain,
            attack_end,
            decay_end,
            release_start,
            end,
            current: 0,
            fade: None,
        }
    }
}

/// A fade to silence started from whatever level the envelope had.
#[derive(Debug, Clone, Copy)]
struct Fade {
    from: f64,
    start: Sample,
    length: Sample,
}

/// Sample-exact evaluator of a scheduled envelope.
#[derive(Debug, Clone)]
pub struct ToneEnvelope {
    peak: f64,
    sustain_level: f64,
    attack_end: Sample,
    decay_end: Sample,
    release_start: Sample,
    end: Sample,
    current: Sample,
    fade: Option<Fade>,
}

impl ToneEnvelope {
    /// Called for every sample, returning the envelope gain at that sample.
    pub fn step(&mut self) -> f64 {
        let gain = self.gain();
        self.current += 1;
        gain
    }

    /// Gain at the current sample.
    pub fn gain(&self) -> f64 {
        if let Some(fade) = self.fade {
            let elapsed = self.current - fade.start;
            return if elapsed >= fade.length {
                0.0
            } else {
                fade.from * (1.0 - elapsed as f64 / fade.length as f64)
            };
        }

        let t = self.current;
        if t < self.attack_end {
            self.peak * t as f64 / self.attack_end as f64
        } else if t < self.decay_end {
            let progress = (t - self.attack_end) as f64 / (self.decay_end - self.attack_end) as f64;
            self.peak - progress * (self.peak - self.sustain_level)
        } else if t < self.release_start {
            self.sustain_level
        } else if t < self.end {
            let progress = (t - self.release_start) as f64 / (self.end - self.release_start) as f64;
            self.sustain_level * (1.0 - progress)
        } else {
            0.0
        }
    }

    /// Ramp linearly from the current level to silence over `samples`.
    /// An earlier ending ramp or envelope is left alone.
    pub fn fade_out(&mut self, samples: Sample) {
        let samples = samples.max(1);
        if self.current + samples >= self.remaining_end() {
            return;
        }
        self.fade = Some(Fade {
            from: self.gain(),
            start: self.current,
            length: samples,
        });
    }

    fn remaining_end(&self) -> Sample {
        match self.fade {
            Some(fade) => fade.start + fade.length,
            None => self.end,
        }
    }

    pub fn is_fading_out(&self) -> bool {
        self.fade.is_some()
    }

    /// Scheduled length of the envelope in samples.
    pub fn len(&self) -> Sample {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end == 0
    }

    /// The envelope has faded when all subsequent `step` calls would return zero.
    pub fn faded(&self) -> bool {
        self.current >= self.remaining_end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(envelope: &mut ToneEnvelope) -> Vec<f64> {
        let mut out = Vec::new();
        while !envelope.faded() {
            out.push(envelope.step());
        }
        out
    }

    #[test]
    fn attack_keeps_its_length() {
        // a quarter note at 110 bpm sounds for 0.436 s, less than the 1.2 s of the shape
        let mut envelope = EnvelopeShape::BASIC.schedule(1.0, 0.436, 1000.0);
        assert_eq!(envelope.attack_end, 100);
        assert_eq!(envelope.decay_end, 400);
        assert_eq!(envelope.release_start, 400);
        assert_eq!(envelope.end, 436);

        let samples = render(&mut envelope);
        assert_eq!(samples.len(), 436);
        assert_eq!(samples[100], 1.0);
        assert!((samples[400] - 0.6).abs() < 1e-12);
        assert!(samples[400..].windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn sustain_is_held_until_the_release() {
        let envelope = EnvelopeShape::BASIC.schedule(1.0, 2.0, 100.0);
        assert_eq!(envelope.attack_end, 10);
        assert_eq!(envelope.decay_end, 40);
        assert_eq!(envelope.release_start, 120);
        assert_eq!(envelope.end, 200);
    }

    #[test]
    fn very_short_tones_shrink_all_segments() {
        // shorter than attack and decay, everything scales by 0.2 / 1.2
        let mut envelope = EnvelopeShape::BASIC.schedule(1.0, 0.2, 100.0);
        assert_eq!(envelope.attack_end, 2);
        assert_eq!(envelope.decay_end, 7);
        assert_eq!(envelope.release_start, 7);
        assert_eq!(envelope.end, 20);

        let samples = render(&mut envelope);
        assert_eq!(samples.len(), 20);
        assert!(samples.iter().all(|s| *s >= 0.0 && *s <= 1.0));
        assert_eq!(samples[2], 1.0);
        // no hard cut at the end
        assert!(samples[19] < 0.1);
    }

    #[test]
    fn no_negative_segments() {
        for duration in [0.0, 0.001, 0.01, 0.08, 0.1, 0.5, 3.0].iter() {
            let envelope = EnvelopeShape::ENHANCED.schedule(0.5, *duration, 44100.0);
            assert!(envelope.attack_end <= envelope.decay_end);
            assert!(envelope.decay_end <= envelope.release_start);
            assert!(envelope.release_start <= envelope.end);
            assert_eq!(envelope.end, seconds_to_samples(*duration, 44100.0));
        }
    }

    #[test]
    fn peak_scales_the_curve() {
        let mut loud = EnvelopeShape::ENHANCED.schedule(0.8, 1.0, 1000.0);
        let mut soft = EnvelopeShape::ENHANCED.schedule(0.2, 1.0, 1000.0);
        for _ in 0..1000 {
            let (l, s) = (loud.step(), soft.step());
            assert!((l - 4.0 * s).abs() < 1e-12);
        }
    }

    #[test]
    fn fade_out_starts_from_current_level() {
        let mut envelope = EnvelopeShape::BASIC.schedule(1.0, 2.0, 100.0);
        for _ in 0..50 {
            envelope.step();
        }
        let level = envelope.gain();
        assert!(level > 0.5);

        envelope.fade_out(5);
        assert!(envelope.is_fading_out());
        let tail = render(&mut envelope);
        assert_eq!(tail.len(), 5);
        assert_eq!(tail[0], level);
        assert!(tail.windows(2).all(|w| w[1] < w[0]));
        assert_eq!(envelope.step(), 0.0);
    }

    #[test]
    fn fade_out_never_extends_a_tone() {
        let mut envelope = EnvelopeShape::BASIC.schedule(1.0, 0.1, 100.0);
        for _ in 0..8 {
            envelope.step();
        }
        envelope.fade_out(5);
        assert!(!envelope.is_fading_out());
        assert_eq!(render(&mut envelope).len(), 2);
    }
}
