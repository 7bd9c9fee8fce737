// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The tutor: owns every component and runs the event loop.
//!
//! Nothing happens on its own. The caller advances the sample clock, and the
//! tutor renders audio up to each deadline before firing it, so all timing is
//! sample accurate.

use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use snafu::{ResultExt, Snafu};

use crate::catalog::Catalog;
use crate::engine::{AudioEngine, EngineConfig, PlayError};
use crate::metronome::Metronome;
use crate::note::Note;
use crate::output::{DeviceError, OutputDevice};
use crate::practice::{
    scale_events, NoteQuiz, PracticeSession, PracticeStats, QuizQuestion, RhythmDrill,
    ScaleDirection, SCALE_BPM,
};
use crate::scheduler::{
    slow_tempo, Completion, Deck, PlaybackMode, PlaybackObserver, PlaybackScheduler,
    SessionToken,
};
use crate::songbook::{SongBook, SongBookError};
use crate::storage::{KeyValueStore, PracticeRecord, Profile};
use crate::synth::ToneHandle;
use crate::timer::{Timers, Wakeup};
use crate::wave::{seconds_to_samples, Sample};

/// Length and volume of a note picked from the chart.
const SELECTED_NOTE: (f64, f64) = (1.5, 0.6);
/// Length and volume of a quiz note.
const QUIZ_NOTE: (f64, f64) = (1.0, 0.5);

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TutorConfig {
    pub engine: EngineConfig,
    /// Seed for the reverb room and the quiz. Random when absent.
    pub seed: Option<u64>,
}

#[derive(Debug, Snafu)]
pub enum TutorError {
    #[snafu(display("Built-in songs are broken: {}", source))]
    Songs { source: SongBookError },
    #[snafu(display("There is no song {:?}", id))]
    UnknownSong { id: String },
    #[snafu(display("{} is not on the fingering chart", note))]
    UnknownNote { note: Note },
    #[snafu(display("No song is loaded for practice"))]
    NoPractice,
    #[snafu(display("{}", source))]
    Play { source: PlayError },
}

pub struct Tutor<D, S, O> {
    engine: AudioEngine<D>,
    timers: Timers<Wakeup>,
    catalog: Catalog,
    songbook: SongBook,
    scheduler: PlaybackScheduler,
    metronome: Metronome,
    profile: Profile<S>,
    practice: Option<PracticeSession>,
    quiz: NoteQuiz<StdRng>,
    rhythm: RhythmDrill,
    observer: O,
}

impl<D: OutputDevice, S: KeyValueStore, O: PlaybackObserver> Tutor<D, S, O> {
    pub fn new(device: D, store: S, config: TutorConfig, observer: O) -> Result<Self, TutorError> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let songbook = SongBook::builtin().context(Songs)?;
        let mut engine = AudioEngine::new(device, config.engine, &mut rng);
        let profile = Profile::load(store);

        let settings = profile.settings();
        engine.set_master_gain(settings.volume);
        let mut metronome = Metronome::new();
        metronome.set_sound(settings.metronome_sound);

        let quiz = NoteQuiz::new(StdRng::seed_from_u64(rng.gen()));
        info!("tutor ready with {} songs", songbook.all().len());
        Ok(Tutor {
            engine,
            timers: Timers::new(),
            catalog: Catalog::standard(),
            songbook,
            scheduler: PlaybackScheduler::new(),
            metronome,
            profile,
            practice: None,
            quiz,
            rhythm: RhythmDrill::default(),
            observer,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn songbook(&self) -> &SongBook {
        &self.songbook
    }

    pub fn engine(&self) -> &AudioEngine<D> {
        &self.engine
    }

    pub fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    pub fn metronome(&self) -> &Metronome {
        &self.metronome
    }

    pub fn profile(&self) -> &Profile<S> {
        &self.profile
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn practice(&self) -> Option<&PracticeSession> {
        self.practice.as_ref()
    }

    pub fn now(&self) -> Sample {
        self.engine.now()
    }

    /// Start audio output on behalf of a user gesture.
    pub fn activate(&mut self) -> Result<(), DeviceError> {
        self.engine.activate()
    }

    /// Show the fingering of `note` and let it sound.
    pub fn play_note(&mut self, note: Note) -> Result<ToneHandle, TutorError> {
        let info = self.catalog.get(note).ok_or(TutorError::UnknownNote { note })?;
        if let Err(err) = self.observer.show_fingering(note, info.holes) {
            warn!("{}", err);
        }
        let (duration, volume) = SELECTED_NOTE;
        let frequency = info.frequency;
        self.sound(frequency, duration, volume)
    }

    pub fn play_song(&mut self, id: &str, mode: PlaybackMode) -> Result<SessionToken, TutorError> {
        let song = self
            .songbook
            .by_id(id)
            .ok_or_else(|| TutorError::UnknownSong { id: id.to_string() })?;
        let (events, bpm, label) = (song.events.clone(), song.bpm, song.id);
        let (scheduler, mut deck) = self.split();
        Ok(scheduler.play(&mut deck, events, bpm, mode, label))
    }

    pub fn play_scale(&mut self, direction: ScaleDirection) -> SessionToken {
        let events = scale_events(&self.catalog, direction);
        let label = match direction {
            ScaleDirection::Ascending => "scale (ascending)",
            ScaleDirection::Descending => "scale (descending)",
        };
        let (scheduler, mut deck) = self.split();
        scheduler.play(&mut deck, events, SCALE_BPM, PlaybackMode::Normal, label)
    }

    /// Stop playback and fade out everything that sounds.
    pub fn stop(&mut self) {
        let (scheduler, mut deck) = self.split();
        scheduler.stop(&mut deck);
    }

    pub fn start_metronome(&mut self) {
        let now = self.engine.now();
        let sample_rate = self.engine.sample_rate();
        self.metronome.start(&mut self.timers, now, sample_rate);
    }

    pub fn stop_metronome(&mut self) {
        self.metronome.stop(&mut self.timers);
    }

    pub fn toggle_metronome(&mut self) -> bool {
        let now = self.engine.now();
        let sample_rate = self.engine.sample_rate();
        self.metronome.toggle(&mut self.timers, now, sample_rate)
    }

    /// Returns the tempo after clamping.
    pub fn set_metronome_tempo(&mut self, bpm: u32) -> u32 {
        let now = self.engine.now();
        let sample_rate = self.engine.sample_rate();
        self.metronome
            .set_tempo(bpm, &mut self.timers, now, sample_rate)
    }

    pub fn set_beats_per_measure(&mut self, beats: u32) {
        self.metronome.set_beats_per_measure(beats);
    }

    /// Set and persist the master volume.
    pub fn set_volume(&mut self, volume: f64) {
        self.profile.update_settings(|settings| settings.volume = volume);
        let volume = self.profile.settings().volume;
        self.engine.set_master_gain(volume);
    }

    /// Set and persist whether the metronome clicks.
    pub fn set_metronome_sound(&mut self, sound: bool) {
        self.profile
            .update_settings(|settings| settings.metronome_sound = sound);
        self.metronome.set_sound(sound);
    }

    /// Load a song for practice, matching the metronome to its tempo.
    pub fn practice_load(&mut self, id: &str) -> Result<(), TutorError> {
        let song = self
            .songbook
            .by_id(id)
            .ok_or_else(|| TutorError::UnknownSong { id: id.to_string() })?;
        let session = PracticeSession::new(song.id, song.bpm, self.engine.now());
        info!("practicing {} at {} bpm", song.title, song.bpm);
        self.set_metronome_tempo(session.bpm);
        self.practice = Some(session);
        Ok(())
    }

    pub fn practice_play(&mut self) -> Result<SessionToken, TutorError> {
        let session = self.practice.as_ref().ok_or(TutorError::NoPractice)?;
        let (id, bpm) = (session.song_id.clone(), session.bpm);
        self.set_metronome_tempo(bpm);
        self.play_song(&id, PlaybackMode::Normal)
    }

    /// Play the practice song slowly, with the metronome at the same reduced tempo.
    pub fn practice_slow(&mut self) -> Result<SessionToken, TutorError> {
        let session = self.practice.as_ref().ok_or(TutorError::NoPractice)?;
        let (id, bpm) = (session.song_id.clone(), session.bpm);
        self.set_metronome_tempo(slow_tempo(bpm));
        self.play_song(&id, PlaybackMode::SlowPractice)
    }

    /// Stop everything and log the session in the practice history.
    pub fn practice_end(&mut self) -> Option<PracticeRecord> {
        let session = self.practice.take()?;
        self.stop_metronome();
        self.stop();
        let record = session.record(self.engine.now(), self.engine.sample_rate(), unix_now());
        self.profile.record_practice(record.clone());
        Some(record)
    }

    pub fn stats(&self) -> PracticeStats {
        PracticeStats::compute(self.profile.progress(), self.profile.history())
    }

    /// Ask a new quiz question and play its note.
    pub fn quiz_question(&mut self) -> Option<QuizQuestion> {
        let question = self.quiz.next_question(&self.catalog)?.clone();
        if let Some(frequency) = self.catalog.frequency(question.answer) {
            let (duration, volume) = QUIZ_NOTE;
            if let Err(err) = self.sound(frequency, duration, volume) {
                debug!("quiz note is silent: {}", err);
            }
        }
        Some(question)
    }

    pub fn quiz_answer(&mut self, guess: Note) -> Option<bool> {
        self.quiz.answer(guess)
    }

    /// (score, total) of the quiz.
    pub fn quiz_score(&self) -> (u32, u32) {
        (self.quiz.score(), self.quiz.total())
    }

    pub fn rhythm(&self) -> &RhythmDrill {
        &self.rhythm
    }

    /// Click the rhythm pattern once, starting now.
    pub fn rhythm_play(&mut self) {
        let now = self.engine.now();
        self.rhythm.play(&mut self.timers, now);
    }

    pub fn rhythm_stop(&mut self) {
        self.rhythm.stop(&mut self.timers);
    }

    /// Check the learner's taps against the pattern.
    pub fn rhythm_answer(&mut self, taps: &[bool]) -> bool {
        self.rhythm.answer(taps)
    }

    /// Nothing is playing, sounding or ticking.
    pub fn is_idle(&self) -> bool {
        self.scheduler.current().is_none()
            && self.engine.synth().sounding_count() == 0
            && !self.metronome.is_running()
            && !self.rhythm.is_playing()
    }

    /// Move the clock forward by `frames` samples, firing every deadline on the way.
    pub fn advance(&mut self, frames: Sample) {
        let target = self.engine.now() + frames;
        loop {
            self.fire_due();
            let now = self.engine.now();
            if now >= target {
                break;
            }
            let next = self
                .timers
                .next_deadline()
                .map_or(target, |deadline| deadline.min(target))
                .max(now);
            self.engine.render(next - now);
        }
    }

    /// Advance until idle, but not past `limit`. Returns whether the tutor became idle.
    pub fn run_until_idle(&mut self, limit: Sample) -> bool {
        let chunk = seconds_to_samples(0.1, self.engine.sample_rate()).max(1);
        while !self.is_idle() {
            let now = self.engine.now();
            if now >= limit {
                return false;
            }
            self.advance(chunk.min(limit - now));
        }
        true
    }

    fn fire_due(&mut self) {
        while let Some((_, wakeup)) = self.timers.pop_due(self.engine.now()) {
            match wakeup {
                Wakeup::Playback { session } => {
                    let (scheduler, mut deck) = self.split();
                    scheduler.wake(&mut deck, session);
                }
                Wakeup::Settle { session } => self.scheduler.settle(session),
                Wakeup::Metronome { generation } => {
                    if let Some(beat) =
                        self.metronome
                            .tick(generation, &mut self.engine, &mut self.timers)
                    {
                        self.observer.beat(beat);
                    }
                }
                Wakeup::Rhythm { generation } => {
                    if let Some((step, click)) =
                        self.rhythm
                            .step(generation, &mut self.engine, &mut self.timers)
                    {
                        self.observer.rhythm_step(step, click);
                    }
                }
            }
            for completion in self.scheduler.take_completions() {
                self.completed(completion);
            }
        }
    }

    /// Count a song that was played to its end as learned.
    fn completed(&mut self, completion: Completion) {
        if self.songbook.by_id(&completion.label).is_none() {
            return;
        }
        let samples = completion.finished.saturating_sub(completion.started);
        let ms = (samples as f64 * 1000.0 / self.engine.sample_rate()).round() as u64;
        self.profile.mark_completed(&completion.label, ms);
    }

    fn sound(&mut self, frequency: f64, duration: f64, volume: f64) -> Result<ToneHandle, TutorError> {
        match self.engine.play_tone(frequency, duration, volume) {
            Ok(handle) => Ok(handle),
            Err(err) => {
                if err == PlayError::NeedsActivation {
                    self.observer.needs_activation();
                }
                Err(err).context(Play)
            }
        }
    }

    fn split(&mut self) -> (&mut PlaybackScheduler, Deck<'_, D>) {
        (
            &mut self.scheduler,
            Deck {
                engine: &mut self.engine,
                timers: &mut self.timers,
                catalog: &self.catalog,
                observer: &mut self.observer,
            },
        )
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::HoleVector;
    use crate::melody::NoteEvent;
    use crate::output::MemoryDevice;
    use crate::scheduler::{Beat, ObserverError};
    use crate::storage::{MemoryStore, SETTINGS_KEY};
    use crate::synth::SynthConfig;
    use expect_test::{expect, Expect};

    const SAMPLE_RATE: f64 = 8000.0;

    #[derive(Default)]
    struct Log {
        lines: Vec<String>,
    }

    impl PlaybackObserver for Log {
        fn show_fingering(&mut self, note: Note, holes: HoleVector) -> Result<(), ObserverError> {
            self.lines.push(format!("fingering {} {}", note, holes));
            Ok(())
        }

        fn note_started(&mut self, index: usize, event: &NoteEvent, at: Sample) {
            self.lines
                .push(format!("{:6} note {} {}", at, index, event.note));
        }

        fn needs_activation(&mut self) {
            self.lines.push("needs activation".to_string());
        }

        fn beat(&mut self, beat: Beat) {
            self.lines.push(format!(
                "beat {}{}",
                beat.index,
                if beat.accented { " accented" } else { "" }
            ));
        }

        fn rhythm_step(&mut self, step: usize, click: bool) {
            self.lines.push(format!(
                "{} {}",
                if click { "click" } else { "rest" },
                step
            ));
        }

        fn completed(&mut self, completion: &Completion) {
            self.lines.push(format!(
                "{:6} completed {} after {} notes",
                completion.finished, completion.label, completion.notes
            ));
        }
    }

    type TestTutor = Tutor<MemoryDevice, MemoryStore, Log>;

    fn tutor_with(device: MemoryDevice, store: MemoryStore) -> TestTutor {
        let config = TutorConfig {
            engine: EngineConfig {
                synth: SynthConfig::basic(),
                effects: false,
                ..EngineConfig::default()
            },
            seed: Some(9),
        };
        Tutor::new(device, store, config, Log::default()).unwrap()
    }

    fn tutor() -> TestTutor {
        tutor_with(MemoryDevice::new(SAMPLE_RATE), MemoryStore::new())
    }

    fn check_log(tutor: &TestTutor, expect: Expect) {
        let actual = tutor.observer().lines.join("\n");
        expect.assert_eq(&actual);
    }

    #[test]
    fn hot_cross_buns_with_fingerings() {
        let mut tutor = tutor();
        tutor.play_scale(ScaleDirection::Ascending);
        tutor.stop();
        tutor.observer_mut().lines.clear();

        tutor.play_song("hot_cross_buns", PlaybackMode::Normal).unwrap();
        assert!(tutor.run_until_idle(seconds_to_samples(30.0, SAMPLE_RATE)));
        let lines = &tutor.observer().lines;
        assert_eq!(lines.first().map(String::as_str), Some("fingering E4 ○○○○●●●●|●○"));
        assert!(lines.last().unwrap().ends_with("completed hot_cross_buns after 17 notes"));
        assert_eq!(
            tutor.profile().progress().completed_songs,
            vec!["hot_cross_buns"]
        );
    }

    #[test]
    fn scale_timing() {
        let mut tutor = tutor();
        tutor.play_scale(ScaleDirection::Descending);
        assert!(tutor.run_until_idle(seconds_to_samples(20.0, SAMPLE_RATE)));
        check_log(
            &tutor,
            expect![[r#"
                fingering C5 ●●●●●●●●|●●
                     0 note 0 C5
                fingering B4 ●●●●●●●●|●○
                  9600 note 1 B4
                fingering A4 ○●●●●●●●|●○
                 19200 note 2 A4
                fingering G4 ○○●●●●●●|●○
                 28800 note 3 G4
                fingering F4 ○○○●●●●●|●○
                 38400 note 4 F4
                fingering E4 ○○○○●●●●|●○
                 48000 note 5 E4
                fingering D4 ○○○○○●●●|●○
                 57600 note 6 D4
                fingering C4 ○○○○○○●●|●○
                 67200 note 7 C4
                 76800 completed scale (descending) after 8 notes"#]],
        );
        // a scale is not a song
        assert!(tutor.profile().progress().completed_songs.is_empty());
    }

    #[test]
    fn unknown_things_are_errors() {
        let mut tutor = tutor();
        assert!(matches!(
            tutor.play_song("wonderwall", PlaybackMode::Normal),
            Err(TutorError::UnknownSong { .. })
        ));
        assert!(matches!(
            tutor.play_note("A5".parse().unwrap()),
            Err(TutorError::UnknownNote { .. })
        ));
        assert!(matches!(tutor.practice_play(), Err(TutorError::NoPractice)));
        assert!(tutor.practice_end().is_none());
    }

    #[test]
    fn selected_note_needs_a_gesture() {
        let mut tutor = tutor_with(
            MemoryDevice::new(SAMPLE_RATE).requiring_gesture(),
            MemoryStore::new(),
        );
        let g4: Note = "G4".parse().unwrap();
        assert!(matches!(
            tutor.play_note(g4),
            Err(TutorError::Play {
                source: PlayError::NeedsActivation
            })
        ));
        tutor.activate().unwrap();
        tutor.play_note(g4).unwrap();
        assert_eq!(tutor.engine().synth().active_count(), 1);
        check_log(
            &tutor,
            expect![[r#"
                fingering G4 ○○●●●●●●|●○
                needs activation
                fingering G4 ○○●●●●●●|●○"#]],
        );
    }

    #[test]
    fn metronome_beats_reach_the_observer() {
        let mut tutor = tutor();
        assert_eq!(tutor.set_metronome_tempo(240), 200);
        tutor.set_beats_per_measure(3);
        assert!(tutor.toggle_metronome());
        // 200 bpm is one beat every 2400 samples
        tutor.advance(4 * 2400);
        assert!(!tutor.toggle_metronome());
        tutor.advance(10 * 2400);
        check_log(
            &tutor,
            expect![[r#"
                beat 0 accented
                beat 1
                beat 2
                beat 0 accented"#]],
        );
    }

    #[test]
    fn practice_session_is_logged() {
        let mut tutor = tutor();
        tutor.practice_load("twinkle").unwrap();
        let song_bpm = tutor.songbook().by_id("twinkle").unwrap().bpm;
        assert_eq!(tutor.metronome().bpm(), song_bpm);

        tutor.start_metronome();
        tutor.practice_slow().unwrap();
        assert_eq!(tutor.metronome().bpm(), slow_tempo(song_bpm));
        tutor.advance(seconds_to_samples(3.0, SAMPLE_RATE));

        let record = tutor.practice_end().unwrap();
        assert_eq!(record.song_id, "twinkle");
        assert_eq!(record.duration, 3000);
        assert!(!tutor.metronome().is_running());
        assert!(tutor.scheduler().current().is_none());
        assert_eq!(tutor.profile().history().len(), 1);

        let stats = tutor.stats();
        assert_eq!(stats.songs_learned, 1);
        assert_eq!(stats.practice_hours, 0);
    }

    #[test]
    fn settings_are_applied_and_saved() {
        let mut store = MemoryStore::new();
        store
            .set(SETTINGS_KEY, r#"{"volume": 0.8, "metronomeSound": false}"#)
            .unwrap();
        let mut tutor = tutor_with(MemoryDevice::new(SAMPLE_RATE), store);
        assert_eq!(tutor.engine().master_gain(), 0.8);
        assert!(!tutor.metronome().sound());

        tutor.set_volume(0.25);
        tutor.set_metronome_sound(true);
        assert_eq!(tutor.engine().master_gain(), 0.25);
        assert!(tutor.metronome().sound());
        let stored = tutor.profile().store().get(SETTINGS_KEY).unwrap().unwrap();
        assert!(stored.contains(r#""volume":0.25"#));
        assert!(stored.contains(r#""metronomeSound":true"#));
    }

    #[test]
    fn quiz_plays_its_note() {
        let mut tutor = tutor();
        let question = tutor.quiz_question().unwrap();
        assert_eq!(tutor.engine().synth().active_count(), 1);
        assert_eq!(tutor.quiz_answer(question.answer), Some(true));
        assert_eq!(tutor.quiz_score(), (1, 1));
    }

    #[test]
    fn rhythm_drill_reaches_the_observer() {
        let mut tutor = tutor();
        tutor.rhythm_play();
        assert!(!tutor.is_idle());
        assert!(tutor.run_until_idle(seconds_to_samples(10.0, SAMPLE_RATE)));
        // the eighth step is a rest, due 3.5 s after the first
        assert_eq!(tutor.now(), 28000);
        check_log(
            &tutor,
            expect![[r#"
                click 0
                rest 1
                click 2
                click 3
                rest 4
                click 5
                rest 6
                rest 7"#]],
        );
        assert!(tutor.rhythm_answer(&[true, false, true, true, false, true, false, false]));
        assert_eq!(tutor.rhythm().score(), 1);
    }
}
