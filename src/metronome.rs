// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! A click track with its own tempo, independent of song playback.

use log::{debug, info, trace};

use crate::engine::{AudioEngine, PlayError};
use crate::output::OutputDevice;
use crate::scheduler::Beat;
use crate::synth::ToneHandle;
use crate::timer::{TimerHandle, Timers, Wakeup};
use crate::wave::{seconds_to_samples, Sample};

pub const MIN_BPM: u32 = 40;
pub const MAX_BPM: u32 = 200;
pub const DEFAULT_BPM: u32 = 120;
pub const DEFAULT_BEATS_PER_MEASURE: u32 = 4;

const CLICK_SECS: f64 = 0.1;

/// (frequency, volume) of the first beat of a measure.
const ACCENT_CLICK: (f64, f64) = (1000.0, 0.8);
const REGULAR_CLICK: (f64, f64) = (800.0, 0.6);

/// Clamp a tempo to the range the metronome supports.
///
/// ```
/// use ocarina_tutor::metronome::clamp_tempo;
///
/// assert_eq!(clamp_tempo(10), 40);
/// assert_eq!(clamp_tempo(96), 96);
/// assert_eq!(clamp_tempo(400), 200);
/// ```
pub fn clamp_tempo(bpm: u32) -> u32 {
    bpm.max(MIN_BPM).min(MAX_BPM)
}

/// Sound one metronome click.
pub fn click<D: OutputDevice>(
    engine: &mut AudioEngine<D>,
    accented: bool,
) -> Result<ToneHandle, PlayError> {
    let (frequency, volume) = if accented {
        ACCENT_CLICK
    } else {
        REGULAR_CLICK
    };
    engine.play_tone(frequency, CLICK_SECS, volume)
}

struct Running {
    /// Sample of the start; ticks are computed from it so they never drift.
    started: Sample,
    ticks: u64,
    timer: TimerHandle,
}

pub struct Metronome {
    bpm: u32,
    beats_per_measure: u32,
    /// Beat of the next tick within the measure.
    beat: u32,
    /// Bumped on every start and stop, so wakeups of an earlier run are ignored.
    generation: u64,
    running: Option<Running>,
    sound: bool,
}

impl Default for Metronome {
    fn default() -> Self {
        Metronome::new()
    }
}

impl Metronome {
    pub fn new() -> Self {
        Metronome {
            bpm: DEFAULT_BPM,
            beats_per_measure: DEFAULT_BEATS_PER_MEASURE,
            beat: 0,
            generation: 0,
            running: None,
            sound: true,
        }
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn beats_per_measure(&self) -> u32 {
        self.beats_per_measure
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Whether ticks produce a click.
    pub fn sound(&self) -> bool {
        self.sound
    }

    /// Mute or unmute the click. The beat keeps counting either way.
    pub fn set_sound(&mut self, sound: bool) {
        self.sound = sound;
    }

    pub fn set_beats_per_measure(&mut self, beats: u32) {
        self.beats_per_measure = beats.max(1);
        if self.beat >= self.beats_per_measure {
            self.beat = 0;
        }
    }

    /// Change the tempo, restarting a running metronome. Returns the clamped tempo.
    pub fn set_tempo(
        &mut self,
        bpm: u32,
        timers: &mut Timers<Wakeup>,
        now: Sample,
        sample_rate: f64,
    ) -> u32 {
        self.bpm = clamp_tempo(bpm);
        debug!("metronome at {} bpm", self.bpm);
        if self.is_running() {
            self.stop(timers);
            self.start(timers, now, sample_rate);
        }
        self.bpm
    }

    /// Start ticking from the first beat. The first tick comes one interval after `now`.
    pub fn start(&mut self, timers: &mut Timers<Wakeup>, now: Sample, sample_rate: f64) {
        if self.is_running() {
            return;
        }
        self.beat = 0;
        self.generation += 1;
        let deadline = now + self.offset(1, sample_rate);
        let timer = timers.schedule_at(
            deadline,
            Wakeup::Metronome {
                generation: self.generation,
            },
        );
        self.running = Some(Running {
            started: now,
            ticks: 0,
            timer,
        });
        info!(
            "metronome started at {} bpm, {} beats per measure",
            self.bpm, self.beats_per_measure
        );
    }

    pub fn stop(&mut self, timers: &mut Timers<Wakeup>) {
        if let Some(running) = self.running.take() {
            timers.cancel(running.timer);
            self.generation += 1;
            info!("metronome stopped");
        }
    }

    /// Start or stop. Returns whether the metronome is running afterwards.
    pub fn toggle(&mut self, timers: &mut Timers<Wakeup>, now: Sample, sample_rate: f64) -> bool {
        if self.is_running() {
            self.stop(timers);
        } else {
            self.start(timers, now, sample_rate);
        }
        self.is_running()
    }

    /// Handle a metronome wakeup: click and schedule the next tick.
    ///
    /// Returns `None` for wakeups of an earlier run.
    pub fn tick<D: OutputDevice>(
        &mut self,
        generation: u64,
        engine: &mut AudioEngine<D>,
        timers: &mut Timers<Wakeup>,
    ) -> Option<Beat> {
        if generation != self.generation {
            trace!("ignoring stale metronome tick");
            return None;
        }
        let sample_rate = engine.sample_rate();
        let interval_ticks = {
            let running = self.running.as_mut()?;
            running.ticks += 1;
            running.ticks
        };

        let beat = Beat {
            index: self.beat,
            accented: self.beat == 0,
        };
        self.beat = (self.beat + 1) % self.beats_per_measure;

        if self.sound {
            match click(engine, beat.accented) {
                Ok(_) => {}
                Err(PlayError::NeedsActivation) => trace!("metronome click muted, no activation"),
                Err(err) => debug!("metronome click failed: {}", err),
            }
        }

        let offset = self.offset(interval_ticks + 1, sample_rate);
        if let Some(running) = self.running.as_mut() {
            running.timer = timers.schedule_at(
                running.started + offset,
                Wakeup::Metronome {
                    generation: self.generation,
                },
            );
        }
        trace!("metronome beat {} of {}", beat.index, self.beats_per_measure);
        Some(beat)
    }

    /// Samples from the start to tick number `ticks`.
    fn offset(&self, ticks: u64, sample_rate: f64) -> Sample {
        seconds_to_samples(ticks as f64 * 60.0 / self.bpm as f64, sample_rate)
    }
}
