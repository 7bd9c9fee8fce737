// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Sequencing melodies one note at a time.
//!
//! At most one session plays at any time. Every session gets a fresh token, and
//! wakeups carrying any other token are ignored, so a cancelled session can
//! never advance again.

use std::fmt;
use std::rc::Rc;

use log::{debug, info, trace, warn};
use snafu::Snafu;

use crate::catalog::{Catalog, HoleVector};
use crate::engine::{AudioEngine, PlayError};
use crate::melody::NoteEvent;
use crate::note::Note;
use crate::output::OutputDevice;
use crate::rational::Rational;
use crate::synth::STOP_FADE_SECS;
use crate::timer::{TimerHandle, Timers, Wakeup};
use crate::wave::{seconds_to_samples, Sample};

/// Fraction of each event's length that actually sounds.
const ARTICULATION: f64 = 0.8;
const NORMAL_VOLUME: f64 = 0.5;
const DEMO_VOLUME: f64 = 0.7;
const DEMO_HARMONY_VOLUME: f64 = 0.3;
/// Frequency ratio of the demo harmony: one octave below.
const DEMO_HARMONY_RATIO: f64 = 0.5;

/// Identifies one playback session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionToken(u64);

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlaybackMode {
    Normal,
    /// Same melody at a reduced tempo.
    SlowPractice,
    /// Louder, with a second voice an octave below.
    Demo,
}

impl PlaybackMode {
    /// The tempo a song written at `bpm` is played at.
    pub fn tempo(self, bpm: u32) -> u32 {
        match self {
            PlaybackMode::SlowPractice => slow_tempo(bpm),
            PlaybackMode::Normal | PlaybackMode::Demo => bpm,
        }
    }
}

/// 70 % of the tempo, but never slower than 60 bpm.
///
/// ```
/// use ocarina_tutor::scheduler::slow_tempo;
///
/// assert_eq!(slow_tempo(80), 60);
/// assert_eq!(slow_tempo(120), 84);
/// assert_eq!(slow_tempo(200), 140);
/// ```
pub fn slow_tempo(bpm: u32) -> u32 {
    (bpm.saturating_mul(7) / 10).max(60)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    /// Stopped, waiting for the tones to fade out.
    Cancelling,
}

/// One metronome click as reported to the observer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Beat {
    /// Position within the measure, starting at zero.
    pub index: u32,
    pub accented: bool,
}

/// A session that played to its end.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub token: SessionToken,
    pub label: String,
    pub mode: PlaybackMode,
    /// Number of events that were sounded.
    pub notes: usize,
    pub started: Sample,
    pub finished: Sample,
}

#[derive(Debug, Snafu)]
pub enum ObserverError {
    #[snafu(display("Fingering display failed: {}", message))]
    Display { message: String },
}

/// Receives what the tutor is doing, typically to show it to the learner.
///
/// The scheduler never waits for the observer. Failures are logged and ignored.
pub trait PlaybackObserver {
    fn show_fingering(&mut self, _note: Note, _holes: HoleVector) -> Result<(), ObserverError> {
        Ok(())
    }

    fn note_started(&mut self, _index: usize, _event: &NoteEvent, _at: Sample) {}

    /// Sound could not be started without a user gesture.
    fn needs_activation(&mut self) {}

    fn beat(&mut self, _beat: Beat) {}

    /// A step of the rhythm drill, `click` tells whether it sounded or rested.
    fn rhythm_step(&mut self, _step: usize, _click: bool) {}

    fn completed(&mut self, _completion: &Completion) {}
}

/// An observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl PlaybackObserver for Silent {}

/// Everything a session needs while it advances.
pub struct Deck<'a, D> {
    pub engine: &'a mut AudioEngine<D>,
    pub timers: &'a mut Timers<Wakeup>,
    pub catalog: &'a Catalog,
    pub observer: &'a mut dyn PlaybackObserver,
}

struct Session {
    token: SessionToken,
    events: Rc<[NoteEvent]>,
    label: String,
    mode: PlaybackMode,
    tempo: u32,
    /// Index of the next event.
    index: usize,
    /// Beats elapsed up to the next event.
    position: Rational,
    sounded: usize,
    started: Sample,
    timer: Option<TimerHandle>,
    activation_reported: bool,
}

impl Session {
    /// Sample at which the event starting at `position` is due.
    fn deadline(&self, position: Rational, sample_rate: f64) -> Sample {
        let seconds = position.to_f64() * 60.0 / self.tempo as f64;
        self.started + seconds_to_samples(seconds, sample_rate)
    }
}

enum State {
    Idle,
    Playing(Session),
    Cancelling {
        token: SessionToken,
        timer: TimerHandle,
    },
}

pub struct PlaybackScheduler {
    state: State,
    next_token: u64,
    completions: Vec<Completion>,
}

impl Default for PlaybackScheduler {
    fn default() -> Self {
        PlaybackScheduler::new()
    }
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        PlaybackScheduler {
            state: State::Idle,
            next_token: 0,
            completions: Vec::new(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        match self.state {
            State::Idle => PlaybackState::Idle,
            State::Playing(_) => PlaybackState::Playing,
            State::Cancelling { .. } => PlaybackState::Cancelling,
        }
    }

    /// Token of the playing session, if any.
    pub fn current(&self) -> Option<SessionToken> {
        match &self.state {
            State::Playing(session) => Some(session.token),
            _ => None,
        }
    }

    /// Label of the playing session and how many of its events were started.
    pub fn progress(&self) -> Option<(&str, usize, usize)> {
        match &self.state {
            State::Playing(session) => Some((
                session.label.as_str(),
                session.index,
                session.events.len(),
            )),
            _ => None,
        }
    }

    /// Completions since the last call, oldest first.
    pub fn take_completions(&mut self) -> Vec<Completion> {
        std::mem::take(&mut self.completions)
    }

    /// Start playing `events` at `bpm`, replacing whatever was playing.
    ///
    /// The first event sounds right away.
    pub fn play<D: OutputDevice>(
        &mut self,
        deck: &mut Deck<'_, D>,
        events: Rc<[NoteEvent]>,
        bpm: u32,
        mode: PlaybackMode,
        label: impl Into<String>,
    ) -> SessionToken {
        self.cancel(deck);
        // the new session takes over, no need to wait for the fade
        if let State::Cancelling { timer, .. } = std::mem::replace(&mut self.state, State::Idle) {
            deck.timers.cancel(timer);
        }

        let token = SessionToken(self.next_token);
        self.next_token += 1;
        let tempo = mode.tempo(bpm).max(1);
        let label = label.into();
        info!(
            "{}: playing {} ({} events) at {} bpm, {:?}",
            token,
            label,
            events.len(),
            tempo,
            mode
        );
        self.state = State::Playing(Session {
            token,
            events,
            label,
            mode,
            tempo,
            index: 0,
            position: Rational::zero(),
            sounded: 0,
            started: deck.engine.now(),
            timer: None,
            activation_reported: false,
        });
        self.advance(deck);
        token
    }

    /// Handle a playback deadline. Tokens of past sessions are ignored.
    pub fn wake<D: OutputDevice>(&mut self, deck: &mut Deck<'_, D>, token: SessionToken) {
        match &mut self.state {
            State::Playing(session) if session.token == token => {
                session.timer = None;
                self.advance(deck);
            }
            _ => trace!("ignoring stale wakeup of {}", token),
        }
    }

    /// Handle the end of the fade after a stop.
    pub fn settle(&mut self, token: SessionToken) {
        match self.state {
            State::Cancelling { token: current, .. } if current == token => {
                debug!("{}: settled", token);
                self.state = State::Idle;
            }
            _ => trace!("ignoring stale settle of {}", token),
        }
    }

    /// Stop playback: no further events fire and all tones fade out.
    pub fn stop<D: OutputDevice>(&mut self, deck: &mut Deck<'_, D>) {
        self.cancel(deck);
        deck.engine.stop_all();
    }

    /// Cancel the playing session, fading its tones.
    fn cancel<D: OutputDevice>(&mut self, deck: &mut Deck<'_, D>) {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => {}
            cancelling @ State::Cancelling { .. } => self.state = cancelling,
            State::Playing(session) => {
                if let Some(timer) = session.timer {
                    deck.timers.cancel(timer);
                }
                deck.engine.stop_all();
                let fade = seconds_to_samples(STOP_FADE_SECS, deck.engine.sample_rate());
                let timer = deck.timers.schedule_at(
                    deck.engine.now() + fade,
                    Wakeup::Settle {
                        session: session.token,
                    },
                );
                info!(
                    "{}: stopped after {} of {} events",
                    session.token,
                    session.index,
                    session.events.len()
                );
                self.state = State::Cancelling {
                    token: session.token,
                    timer,
                };
            }
        }
    }

    /// Sound the next playable event and schedule the one after, or finish.
    fn advance<D: OutputDevice>(&mut self, deck: &mut Deck<'_, D>) {
        let session = match &mut self.state {
            State::Playing(session) => session,
            _ => return,
        };
        let sample_rate = deck.engine.sample_rate();

        while let Some(event) = session.events.get(session.index).copied() {
            let index = session.index;
            session.index += 1;

            let frequency = match deck.catalog.frequency(event.note) {
                Some(frequency) => frequency,
                None => {
                    warn!("{}: skipping {}, not on the chart", session.token, event.note);
                    continue;
                }
            };

            match deck.catalog.holes(event.fingering) {
                Some(holes) => {
                    if let Err(err) = deck.observer.show_fingering(event.fingering, holes) {
                        warn!("{}: {}", session.token, err);
                    }
                }
                None => debug!("{}: no fingering for {}", session.token, event.fingering),
            }

            let now = deck.engine.now();
            trace!(
                "{}: {:7}: event {} {} for {} beats",
                session.token,
                now,
                index,
                event.note,
                event.duration
            );
            deck.observer.note_started(index, &event, now);

            let seconds = event.duration.to_f64() * ARTICULATION * 60.0 / session.tempo as f64;
            match sound(deck.engine, session.mode, frequency, seconds) {
                Ok(()) => {}
                Err(PlayError::NeedsActivation) => {
                    if !session.activation_reported {
                        session.activation_reported = true;
                        info!("{}: continuing without sound", session.token);
                        deck.observer.needs_activation();
                    }
                }
                Err(err) => warn!("{}: {}", session.token, err),
            }
            session.sounded += 1;

            session.position += event.duration;
            let deadline = session.deadline(session.position, sample_rate);
            session.timer = Some(deck.timers.schedule_at(
                deadline,
                Wakeup::Playback {
                    session: session.token,
                },
            ));
            return;
        }

        self.finish(deck);
    }

    fn finish<D: OutputDevice>(&mut self, deck: &mut Deck<'_, D>) {
        if let State::Playing(session) = std::mem::replace(&mut self.state, State::Idle) {
            let completion = Completion {
                token: session.token,
                label: session.label,
                mode: session.mode,
                notes: session.sounded,
                started: session.started,
                finished: deck.engine.now(),
            };
            info!("{}: finished {}", completion.token, completion.label);
            deck.observer.completed(&completion);
            self.completions.push(completion);
        }
    }
}

fn sound<D: OutputDevice>(
    engine: &mut AudioEngine<D>,
    mode: PlaybackMode,
    frequency: f64,
    seconds: f64,
) -> Result<(), PlayError> {
    match mode {
        PlaybackMode::Demo => {
            engine.play_tone(frequency, seconds, DEMO_VOLUME)?;
            engine.play_tone(
                frequency * DEMO_HARMONY_RATIO,
                seconds,
                DEMO_HARMONY_VOLUME,
            )?;
        }
        PlaybackMode::Normal | PlaybackMode::SlowPractice => {
            engine.play_tone(frequency, seconds, NORMAL_VOLUME)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::melody::parse_melody;
    use crate::output::MemoryDevice;
    use crate::songbook::SongBook;
    use crate::synth::SynthConfig;
    use rand::{rngs::StdRng, SeedableRng};

    const SAMPLE_RATE: f64 = 8000.0;

    #[derive(Default)]
    struct Recorder {
        fingerings: Vec<Note>,
        notes: Vec<(Note, Sample)>,
        activation_requests: usize,
        completions: Vec<Completion>,
        failing: bool,
    }

    impl PlaybackObserver for Recorder {
        fn show_fingering(&mut self, note: Note, _holes: HoleVector) -> Result<(), ObserverError> {
            self.fingerings.push(note);
            if self.failing {
                Display {
                    message: "display detached",
                }
                .fail()
            } else {
                Ok(())
            }
        }

        fn note_started(&mut self, _index: usize, event: &NoteEvent, at: Sample) {
            self.notes.push((event.note, at));
        }

        fn needs_activation(&mut self) {
            self.activation_requests += 1;
        }

        fn completed(&mut self, completion: &Completion) {
            self.completions.push(completion.clone());
        }
    }

    struct Rig {
        engine: AudioEngine<MemoryDevice>,
        timers: Timers<Wakeup>,
        catalog: Catalog,
        recorder: Recorder,
        scheduler: PlaybackScheduler,
    }

    impl Rig {
        fn new() -> Self {
            Rig::with_device(MemoryDevice::new(SAMPLE_RATE))
        }

        fn with_device(device: MemoryDevice) -> Self {
            let config = EngineConfig {
                synth: SynthConfig::basic(),
                effects: false,
                buffer_size: 80,
                ..EngineConfig::default()
            };
            Rig {
                engine: AudioEngine::new(device, config, &mut StdRng::seed_from_u64(0)),
                timers: Timers::new(),
                catalog: Catalog::standard(),
                recorder: Recorder::default(),
                scheduler: PlaybackScheduler::new(),
            }
        }

        fn play(&mut self, melody: &str, bpm: u32, mode: PlaybackMode) -> SessionToken {
            let events: Rc<[NoteEvent]> = parse_melody(melody).unwrap().into();
            self.play_events(events, bpm, mode)
        }

        fn play_events(
            &mut self,
            events: Rc<[NoteEvent]>,
            bpm: u32,
            mode: PlaybackMode,
        ) -> SessionToken {
            let Rig {
                engine,
                timers,
                catalog,
                recorder,
                scheduler,
            } = self;
            let mut deck = Deck {
                engine,
                timers,
                catalog,
                observer: recorder,
            };
            scheduler.play(&mut deck, events, bpm, mode, "test")
        }

        fn stop(&mut self) {
            let Rig {
                engine,
                timers,
                catalog,
                recorder,
                scheduler,
            } = self;
            scheduler.stop(&mut Deck {
                engine,
                timers,
                catalog,
                observer: recorder,
            });
        }

        fn wake(&mut self, token: SessionToken) {
            let Rig {
                engine,
                timers,
                catalog,
                recorder,
                scheduler,
            } = self;
            scheduler.wake(
                &mut Deck {
                    engine,
                    timers,
                    catalog,
                    observer: recorder,
                },
                token,
            );
        }

        /// Render and fire deadlines until the clock reaches `until`.
        fn run_until(&mut self, until: Sample) {
            loop {
                let now = self.engine.now();
                let target = match self.timers.next_deadline() {
                    Some(deadline) if deadline <= until => deadline,
                    _ => until,
                };
                self.engine.render(target.saturating_sub(now));
                let mut fired = false;
                while let Some((_, wakeup)) = self.timers.pop_due(self.engine.now()) {
                    fired = true;
                    match wakeup {
                        Wakeup::Playback { session } => self.wake(session),
                        Wakeup::Settle { session } => self.scheduler.settle(session),
                        Wakeup::Metronome { .. } | Wakeup::Rhythm { .. } => {}
                    }
                }
                if !fired && self.engine.now() >= until {
                    break;
                }
            }
        }

        fn seconds(&self, seconds: f64) -> Sample {
            seconds_to_samples(seconds, SAMPLE_RATE)
        }
    }

    fn n(name: &str) -> Note {
        name.parse().unwrap()
    }

    #[test]
    fn do_re_mi_in_order() {
        let book = SongBook::builtin().unwrap();
        let song = book.by_id("do_re_mi").unwrap();
        let mut rig = Rig::new();
        rig.play_events(song.events.clone(), song.bpm, PlaybackMode::Normal);
        let end = rig.seconds(song.duration_secs() + 1.0);
        rig.run_until(end);

        let played: Vec<String> = rig.recorder.notes.iter().map(|(note, _)| note.to_string()).collect();
        assert_eq!(
            played.join(" "),
            "C4 D4 E4 F4 G4 A4 B4 C5 B4 A4 G4 F4 E4 D4 C4"
        );
        assert_eq!(rig.recorder.fingerings.len(), 15);
        assert_eq!(song.events[14].duration, Rational::from_int(2));

        // each note starts once the previous one has had its full length
        let mut position = Rational::zero();
        for ((_, at), event) in rig.recorder.notes.iter().zip(song.events.iter()) {
            assert_eq!(*at, rig.seconds(position.to_f64() * 60.0 / song.bpm as f64));
            position += event.duration;
        }

        assert_eq!(rig.scheduler.state(), PlaybackState::Idle);
        let completion = &rig.recorder.completions[0];
        assert_eq!(completion.notes, 15);
        let nominal = rig.seconds(song.duration_secs());
        let elapsed = (completion.finished - completion.started) as i64;
        assert!((elapsed - nominal as i64).abs() <= 1);
        assert_eq!(rig.scheduler.take_completions().len(), 1);
        assert!(rig.scheduler.take_completions().is_empty());
    }

    #[test]
    fn tones_sound_for_most_of_the_beat() {
        let mut rig = Rig::new();
        rig.play("C4 D4", 60, PlaybackMode::Normal);
        assert_eq!(rig.engine.synth().active_count(), 1);
        // C4 sounds for 0.8 s of its one second beat
        rig.run_until(rig.seconds(0.79));
        assert_eq!(rig.engine.synth().active_count(), 1);
        rig.run_until(rig.seconds(0.81));
        assert_eq!(rig.engine.synth().active_count(), 0);
    }

    #[test]
    fn new_session_replaces_the_old_one() {
        let mut rig = Rig::new();
        let first = rig.play("C4 D4 E4", 120, PlaybackMode::Normal);
        rig.run_until(rig.seconds(0.25));
        let second = rig.play("G4 A4", 120, PlaybackMode::Normal);
        assert_ne!(first, second);
        assert_eq!(rig.scheduler.current(), Some(second));
        // the pending wakeup of the old session is gone
        assert_eq!(rig.timers.len(), 1);

        // a stale wakeup does nothing
        rig.wake(first);
        rig.run_until(rig.seconds(3.0));
        let played: Vec<Note> = rig.recorder.notes.iter().map(|(note, _)| *note).collect();
        assert_eq!(played, vec![n("C4"), n("G4"), n("A4")]);
        assert_eq!(rig.recorder.completions.len(), 1);
        assert_eq!(rig.recorder.completions[0].token, second);
    }

    #[test]
    fn stop_fades_and_settles() {
        let mut rig = Rig::new();
        rig.play("C4:2 D4 E4", 60, PlaybackMode::Normal);
        rig.run_until(rig.seconds(0.5));
        rig.stop();
        assert_eq!(rig.scheduler.state(), PlaybackState::Cancelling);
        assert_eq!(rig.engine.synth().active_count(), 0);
        // still fading, not cut
        assert_eq!(rig.engine.synth().sounding_count(), 1);

        rig.run_until(rig.seconds(0.56));
        assert_eq!(rig.scheduler.state(), PlaybackState::Idle);
        assert_eq!(rig.engine.synth().sounding_count(), 0);

        rig.run_until(rig.seconds(5.0));
        assert_eq!(rig.recorder.notes.len(), 1);
        assert!(rig.recorder.completions.is_empty());
    }

    #[test]
    fn stop_before_the_sixth_note_of_do_re_mi() {
        let book = SongBook::builtin().unwrap();
        let song = book.by_id("do_re_mi").unwrap();
        let mut rig = Rig::new();
        rig.play_events(song.events.clone(), song.bpm, PlaybackMode::Normal);

        let sixth: Rational = song.events[..5].iter().map(|event| event.duration).sum();
        let due = rig.seconds(sixth.to_f64() * 60.0 / song.bpm as f64);
        rig.run_until(due - 1);
        assert_eq!(rig.scheduler.progress(), Some(("test", 5, 15)));
        rig.stop();

        rig.run_until(rig.seconds(song.duration_secs() + 1.0));
        let played: Vec<String> = rig.recorder.notes.iter().map(|(note, _)| note.to_string()).collect();
        assert_eq!(played.join(" "), "C4 D4 E4 F4 G4");
        assert_eq!(rig.recorder.fingerings.len(), 5);
        assert!(rig.recorder.completions.is_empty());
        assert_eq!(rig.scheduler.state(), PlaybackState::Idle);
        assert!(rig.timers.is_empty());
        assert_eq!(rig.engine.synth().sounding_count(), 0);
    }

    #[test]
    fn huge_tempos_do_not_overflow() {
        assert_eq!(slow_tempo(u32::MAX), u32::MAX / 10);
        assert_eq!(PlaybackMode::SlowPractice.tempo(1_000_000_000), 429_496_729);
        let mut rig = Rig::new();
        rig.play("C4 D4", u32::MAX, PlaybackMode::SlowPractice);
        rig.run_until(rig.seconds(1.0));
        assert_eq!(rig.recorder.notes.len(), 2);
    }

    #[test]
    fn playing_during_the_fade_cancels_the_settle() {
        let mut rig = Rig::new();
        rig.play("C4 D4", 60, PlaybackMode::Normal);
        rig.stop();
        rig.play("E4", 60, PlaybackMode::Normal);
        assert_eq!(rig.scheduler.state(), PlaybackState::Playing);
        rig.run_until(rig.seconds(0.1));
        assert_eq!(rig.scheduler.state(), PlaybackState::Playing);
    }

    #[test]
    fn slow_practice_stretches_the_schedule() {
        let mut rig = Rig::new();
        rig.play("C4 D4", 80, PlaybackMode::SlowPractice);
        rig.run_until(rig.seconds(3.0));
        // 80 bpm slows down to 60 bpm, one note per second
        assert_eq!(rig.recorder.notes[1].1, rig.seconds(1.0));
    }

    #[test]
    fn demo_adds_a_lower_voice() {
        let mut rig = Rig::new();
        rig.play("G4", 120, PlaybackMode::Demo);
        assert_eq!(rig.engine.synth().active_count(), 2);
    }

    #[test]
    fn notes_off_the_chart_are_skipped() {
        let mut rig = Rig::new();
        rig.play("C4 A5 C#4 D4", 60, PlaybackMode::Normal);
        rig.run_until(rig.seconds(3.0));
        assert_eq!(
            rig.recorder.notes,
            vec![(n("C4"), 0), (n("D4"), rig.seconds(1.0))]
        );
        assert_eq!(rig.recorder.completions[0].notes, 2);
    }

    #[test]
    fn missing_activation_is_reported_once() {
        let mut rig = Rig::with_device(MemoryDevice::new(SAMPLE_RATE).requiring_gesture());
        rig.play("C4 D4 E4", 120, PlaybackMode::Normal);
        rig.run_until(rig.seconds(2.0));
        assert_eq!(rig.recorder.activation_requests, 1);
        // sequencing went on in silence
        assert_eq!(rig.recorder.notes.len(), 3);
        assert_eq!(rig.recorder.completions.len(), 1);
    }

    #[test]
    fn fingering_failures_do_not_block_playback() {
        let mut rig = Rig::new();
        rig.recorder.failing = true;
        rig.play("C4 D4@C4", 120, PlaybackMode::Normal);
        rig.run_until(rig.seconds(2.0));
        assert_eq!(rig.recorder.fingerings, vec![n("C4"), n("C4")]);
        assert_eq!(rig.recorder.notes.len(), 2);
    }

    #[test]
    fn tempo_per_mode() {
        assert_eq!(PlaybackMode::Normal.tempo(80), 80);
        assert_eq!(PlaybackMode::SlowPractice.tempo(80), 60);
        assert_eq!(PlaybackMode::SlowPractice.tempo(200), 140);
        assert_eq!(PlaybackMode::Demo.tempo(200), 200);
    }
}
