// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Practice sessions, statistics, scale drills, the note quiz and the rhythm drill.

use std::collections::HashSet;
use std::rc::Rc;

use log::{debug, info, trace};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::Catalog;
use crate::engine::{AudioEngine, PlayError};
use crate::melody::NoteEvent;
use crate::metronome;
use crate::note::Note;
use crate::output::OutputDevice;
use crate::rational::Rational;
use crate::songbook::Difficulty;
use crate::storage::{PracticeRecord, UserProgress};
use crate::timer::{TimerHandle, Timers, Wakeup};
use crate::wave::{seconds_to_samples, Sample};

/// Tempo of the scale drill: quarter notes of 1.2 seconds.
pub const SCALE_BPM: u32 = 50;

/// Clicks and rests of the rhythm drill.
pub const RHYTHM_PATTERN: [bool; 8] = [true, false, true, true, false, true, false, false];
/// Time between two steps of the rhythm drill.
pub const RHYTHM_STEP_SECS: f64 = 0.5;

const QUIZ_OPTIONS: usize = 4;
const MS_PER_HOUR: f64 = 60.0 * 60.0 * 1000.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScaleDirection {
    Ascending,
    Descending,
}

/// The practice scale as quarter notes.
pub fn scale_events(catalog: &Catalog, direction: ScaleDirection) -> Rc<[NoteEvent]> {
    let mut notes = catalog.scale();
    if direction == ScaleDirection::Descending {
        notes.reverse();
    }
    notes
        .into_iter()
        .map(|note| NoteEvent::new(note, Rational::one()))
        .collect()
}

/// A song loaded for practice.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeSession {
    pub song_id: String,
    /// Tempo the song is written at.
    pub bpm: u32,
    pub started: Sample,
}

impl PracticeSession {
    pub fn new(song_id: impl Into<String>, bpm: u32, started: Sample) -> Self {
        PracticeSession {
            song_id: song_id.into(),
            bpm,
            started,
        }
    }

    /// Milliseconds between the start and `now`.
    pub fn elapsed_ms(&self, now: Sample, sample_rate: f64) -> u64 {
        let samples = now.saturating_sub(self.started);
        (samples as f64 * 1000.0 / sample_rate).round() as u64
    }

    pub fn record(&self, now: Sample, sample_rate: f64, date: u64) -> PracticeRecord {
        PracticeRecord {
            song_id: self.song_id.clone(),
            date,
            duration: self.elapsed_ms(now, sample_rate),
            completed: true,
        }
    }
}

/// Summary shown on the learner's dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeStats {
    /// Distinct songs in the practice history.
    pub songs_learned: usize,
    pub practice_hours: u64,
    pub level: Difficulty,
    pub accuracy: u32,
}

impl PracticeStats {
    /// ```
    /// use ocarina_tutor::practice::PracticeStats;
    /// use ocarina_tutor::storage::{PracticeRecord, UserProgress};
    ///
    /// let record = |id: &str, minutes: u64| PracticeRecord {
    ///     song_id: id.to_string(),
    ///     date: 0,
    ///     duration: minutes * 60 * 1000,
    ///     completed: true,
    /// };
    /// let history = [record("twinkle", 50), record("twinkle", 30), record("do_re_mi", 20)];
    /// let stats = PracticeStats::compute(&UserProgress::default(), &history);
    /// assert_eq!(stats.songs_learned, 2);
    /// assert_eq!(stats.practice_hours, 2);
    /// ```
    pub fn compute(progress: &UserProgress, history: &[PracticeRecord]) -> Self {
        let songs: HashSet<&str> = history.iter().map(|r| r.song_id.as_str()).collect();
        let total_ms: u64 = history.iter().map(|r| r.duration).sum();
        PracticeStats {
            songs_learned: songs.len(),
            practice_hours: (total_ms as f64 / MS_PER_HOUR).round() as u64,
            level: progress.level,
            accuracy: progress.accuracy,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuizQuestion {
    pub answer: Note,
    /// Four distinct notes, one of them the answer.
    pub options: Vec<Note>,
}

/// Play a random note, let the learner pick it from four options.
pub struct NoteQuiz<R> {
    rng: R,
    current: Option<QuizQuestion>,
    score: u32,
    total: u32,
}

impl<R: Rng> NoteQuiz<R> {
    pub fn new(rng: R) -> Self {
        NoteQuiz {
            rng,
            current: None,
            score: 0,
            total: 0,
        }
    }

    /// Draw a new question. Returns `None` for an empty catalog.
    pub fn next_question(&mut self, catalog: &Catalog) -> Option<&QuizQuestion> {
        let notes: Vec<Note> = catalog.all().iter().map(|info| info.note).collect();
        let answer = *notes.choose(&mut self.rng)?;

        let mut options = notes;
        options.shuffle(&mut self.rng);
        options.truncate(QUIZ_OPTIONS);
        if !options.contains(&answer) {
            let slot = self.rng.gen_range(0..options.len());
            options[slot] = answer;
        }
        debug!("quiz question {}", self.total + 1);
        self.current = Some(QuizQuestion { answer, options });
        self.current.as_ref()
    }

    pub fn current(&self) -> Option<&QuizQuestion> {
        self.current.as_ref()
    }

    /// Check a guess against the current question. Returns `None` without a question.
    pub fn answer(&mut self, guess: Note) -> Option<bool> {
        let question = self.current.take()?;
        let correct = guess == question.answer;
        self.total += 1;
        if correct {
            self.score += 1;
        }
        Some(correct)
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.score = 0;
        self.total = 0;
    }
}

struct Pulse {
    started: Sample,
    /// Index of the next step.
    step: usize,
    timer: TimerHandle,
}

/// Clicks a rhythm on a steady pulse for the learner to repeat.
pub struct RhythmDrill {
    pattern: Vec<bool>,
    /// Bumped on every start and stop, so wakeups of an earlier run are ignored.
    generation: u64,
    pulse: Option<Pulse>,
    score: u32,
    total: u32,
}

impl Default for RhythmDrill {
    fn default() -> Self {
        RhythmDrill::new(RHYTHM_PATTERN.to_vec())
    }
}

impl RhythmDrill {
    pub fn new(pattern: Vec<bool>) -> Self {
        RhythmDrill {
            pattern,
            generation: 0,
            pulse: None,
            score: 0,
            total: 0,
        }
    }

    pub fn pattern(&self) -> &[bool] {
        &self.pattern
    }

    pub fn is_playing(&self) -> bool {
        self.pulse.is_some()
    }

    /// Play the pattern once from the start. The first step is due at `now`.
    pub fn play(&mut self, timers: &mut Timers<Wakeup>, now: Sample) {
        self.stop(timers);
        if self.pattern.is_empty() {
            return;
        }
        self.generation += 1;
        let timer = timers.schedule_at(
            now,
            Wakeup::Rhythm {
                generation: self.generation,
            },
        );
        self.pulse = Some(Pulse {
            started: now,
            step: 0,
            timer,
        });
        info!("rhythm drill with {} steps", self.pattern.len());
    }

    pub fn stop(&mut self, timers: &mut Timers<Wakeup>) {
        if let Some(pulse) = self.pulse.take() {
            timers.cancel(pulse.timer);
            self.generation += 1;
            debug!("rhythm drill stopped at step {}", pulse.step);
        }
    }

    /// Handle a rhythm wakeup: click if the step is not a rest and schedule the
    /// next step. Returns the step and whether it clicked, or `None` for wakeups
    /// of an earlier run.
    pub fn step<D: OutputDevice>(
        &mut self,
        generation: u64,
        engine: &mut AudioEngine<D>,
        timers: &mut Timers<Wakeup>,
    ) -> Option<(usize, bool)> {
        if generation != self.generation {
            trace!("ignoring stale rhythm step");
            return None;
        }
        let pulse = self.pulse.as_mut()?;
        let index = pulse.step;
        let click = self.pattern.get(index).copied()?;
        if click {
            match metronome::click(engine, false) {
                Ok(_) => {}
                Err(PlayError::NeedsActivation) => trace!("rhythm click muted, no activation"),
                Err(err) => debug!("rhythm click failed: {}", err),
            }
        }

        pulse.step += 1;
        if pulse.step < self.pattern.len() {
            let offset = seconds_to_samples(
                pulse.step as f64 * RHYTHM_STEP_SECS,
                engine.sample_rate(),
            );
            pulse.timer = timers.schedule_at(pulse.started + offset, Wakeup::Rhythm { generation });
        } else {
            self.pulse = None;
        }
        Some((index, click))
    }

    /// Compare the learner's taps, one flag per step, with the pattern.
    pub fn answer(&mut self, taps: &[bool]) -> bool {
        let correct = taps == self.pattern.as_slice();
        self.total += 1;
        if correct {
            self.score += 1;
        }
        correct
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total(&self) -> u32 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::output::MemoryDevice;
    use crate::synth::SynthConfig;
    use rand::{rngs::StdRng, SeedableRng};

    fn engine() -> AudioEngine<MemoryDevice> {
        let config = EngineConfig {
            synth: SynthConfig::basic(),
            effects: false,
            ..EngineConfig::default()
        };
        AudioEngine::new(MemoryDevice::new(8000.0), config, &mut StdRng::seed_from_u64(0))
    }

    #[test]
    fn scale_in_both_directions() {
        let catalog = Catalog::standard();
        let names = |direction| -> String {
            scale_events(&catalog, direction)
                .iter()
                .map(|event| event.note.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        };
        assert_eq!(names(ScaleDirection::Ascending), "C4 D4 E4 F4 G4 A4 B4 C5");
        assert_eq!(names(ScaleDirection::Descending), "C5 B4 A4 G4 F4 E4 D4 C4");
        // one note every 1.2 seconds
        assert!((60.0 / SCALE_BPM as f64 - 1.2).abs() < 1e-12);
    }

    #[test]
    fn elapsed_time_in_milliseconds() {
        let session = PracticeSession::new("twinkle", 100, 8000);
        assert_eq!(session.elapsed_ms(8000 + 12_000, 8000.0), 1500);
        assert_eq!(session.elapsed_ms(0, 8000.0), 0);
        let record = session.record(16_000, 8000.0, 1234);
        assert_eq!(record.duration, 1000);
        assert_eq!(record.date, 1234);
        assert!(record.completed);
    }

    #[test]
    fn stats_of_an_empty_history() {
        let stats = PracticeStats::compute(&UserProgress::default(), &[]);
        assert_eq!(
            stats,
            PracticeStats {
                songs_learned: 0,
                practice_hours: 0,
                level: Difficulty::Beginner,
                accuracy: 85,
            }
        );
    }

    #[test]
    fn quiz_options_always_contain_the_answer() {
        let catalog = Catalog::standard();
        let mut quiz = NoteQuiz::new(StdRng::seed_from_u64(11));
        for _ in 0..200 {
            let question = quiz.next_question(&catalog).unwrap().clone();
            assert_eq!(question.options.len(), 4);
            assert!(question.options.contains(&question.answer));
            let mut distinct = question.options.clone();
            distinct.sort();
            distinct.dedup();
            assert_eq!(distinct.len(), 4);
            assert!(catalog.get(question.answer).is_some());
        }
    }

    #[test]
    fn quiz_keeps_score() {
        let catalog = Catalog::standard();
        let mut quiz = NoteQuiz::new(StdRng::seed_from_u64(2));
        assert_eq!(quiz.answer(Note::from_midi(60)), None);

        let answer = quiz.next_question(&catalog).unwrap().answer;
        assert_eq!(quiz.answer(answer), Some(true));
        let answer = quiz.next_question(&catalog).unwrap().answer;
        let wrong = catalog
            .all()
            .iter()
            .map(|info| info.note)
            .find(|note| *note != answer)
            .unwrap();
        assert_eq!(quiz.answer(wrong), Some(false));
        // a question can only be answered once
        assert_eq!(quiz.answer(answer), None);
        assert_eq!((quiz.score(), quiz.total()), (1, 2));

        quiz.reset();
        assert_eq!((quiz.score(), quiz.total()), (0, 0));
    }

    #[test]
    fn rhythm_drill_clicks_on_the_pulse() {
        let mut engine = engine();
        let mut timers = Timers::new();
        let mut drill = RhythmDrill::default();
        drill.play(&mut timers, engine.now());
        assert!(drill.is_playing());

        let mut steps = Vec::new();
        while let Some(deadline) = timers.next_deadline() {
            let now = engine.now();
            engine.render(deadline - now);
            while let Some((_, wakeup)) = timers.pop_due(engine.now()) {
                if let Wakeup::Rhythm { generation } = wakeup {
                    if let Some((index, click)) = drill.step(generation, &mut engine, &mut timers) {
                        steps.push((index, click, engine.now(), engine.synth().active_count()));
                    }
                }
            }
        }

        // one step every 4000 samples, a 100 ms click only where the pattern says so
        let expected: Vec<(usize, bool, Sample, usize)> = RHYTHM_PATTERN
            .iter()
            .enumerate()
            .map(|(i, click)| (i, *click, i * 4000, *click as usize))
            .collect();
        assert_eq!(steps, expected);
        assert!(!drill.is_playing());
        assert!(timers.is_empty());
    }

    #[test]
    fn rhythm_drill_stop_and_score() {
        let mut engine = engine();
        let mut timers = Timers::new();
        let mut drill = RhythmDrill::default();
        drill.play(&mut timers, 0);
        let stale = match timers.pop_due(0) {
            Some((_, Wakeup::Rhythm { generation })) => generation,
            other => panic!("unexpected timer {:?}", other.map(|(_, w)| w)),
        };
        drill.stop(&mut timers);
        assert!(!drill.is_playing());
        assert!(timers.is_empty());
        assert_eq!(drill.step(stale, &mut engine, &mut timers), None);
        assert_eq!(engine.synth().active_count(), 0);

        assert!(drill.answer(&RHYTHM_PATTERN));
        assert!(!drill.answer(&[true; 8]));
        assert_eq!((drill.score(), drill.total()), (1, 2));

        let mut silent = RhythmDrill::new(Vec::new());
        silent.play(&mut timers, 0);
        assert!(!silent.is_playing());
        assert!(timers.is_empty());
    }
}
