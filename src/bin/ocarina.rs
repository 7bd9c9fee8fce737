// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! `ocarina` - look up fingerings, listen to songs and practice from the terminal.

use std::path::PathBuf;

use log::{error, info};
use structopt::StructOpt;

use ocarina_tutor::catalog::HoleVector;
use ocarina_tutor::engine::EngineConfig;
use ocarina_tutor::melody::NoteEvent;
use ocarina_tutor::note::Note;
use ocarina_tutor::output::sox::{SoxDevice, SoxTarget};
use ocarina_tutor::practice::ScaleDirection;
use ocarina_tutor::scheduler::{Beat, Completion, ObserverError, PlaybackMode, PlaybackObserver};
use ocarina_tutor::songbook::Difficulty;
use ocarina_tutor::storage::FileStore;
use ocarina_tutor::tutor::{Tutor, TutorConfig, TutorError};
use ocarina_tutor::wave::{seconds_to_samples, Sample};

const SAMPLE_RATE: f64 = 44100.0;
/// Extra time rendered after the music so the reverb can ring out.
const TAIL_SECS: f64 = 2.0;

#[derive(Debug, StructOpt)]
#[structopt(name = "ocarina", about = "Fingering tutor for the 12-hole ocarina")]
struct Opt {
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: usize,

    /// Output file (any sox-supported format). Sound is played directly if not given.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// Where settings, progress and practice history are kept.
    #[structopt(long, parse(from_os_str), default_value = ".ocarina")]
    state_dir: PathBuf,

    /// Skip compressor and reverb.
    #[structopt(long)]
    plain: bool,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// List the built-in songs.
    Songs {
        /// beginner, intermediate or advanced
        #[structopt(long)]
        difficulty: Option<Difficulty>,
        /// Only songs whose title or description contains this.
        #[structopt(long)]
        search: Option<String>,
    },
    /// Show how to finger a note.
    Fingering { note: Note },
    /// Show the fingering of a note and let it sound.
    Note { note: Note },
    /// Play a song with its fingerings.
    Play {
        song: String,
        /// Practice tempo.
        #[structopt(long)]
        slow: bool,
        /// With a second voice an octave below.
        #[structopt(long, conflicts_with = "slow")]
        demo: bool,
    },
    /// Play the practice scale C4 to C5.
    Scale {
        #[structopt(long)]
        descending: bool,
    },
    Metronome {
        #[structopt(long, default_value = "120")]
        bpm: u32,
        #[structopt(long, default_value = "4")]
        beats: u32,
        #[structopt(long, default_value = "8")]
        seconds: f64,
    },
    /// Click the rhythm drill pattern once.
    Rhythm,
    /// Show practice statistics.
    Stats,
}

/// Prints what the tutor does.
struct Console;

impl PlaybackObserver for Console {
    fn show_fingering(&mut self, note: Note, holes: HoleVector) -> Result<(), ObserverError> {
        println!("{:>4}  {}", note, holes);
        Ok(())
    }

    fn note_started(&mut self, _index: usize, event: &NoteEvent, at: Sample) {
        log::debug!(
            "{:8.2} s: {} for {} beats",
            at as f64 / SAMPLE_RATE,
            event.note,
            event.duration
        );
    }

    fn needs_activation(&mut self) {
        println!("(audio output is not available, continuing silently)");
    }

    fn beat(&mut self, beat: Beat) {
        if beat.accented {
            println!("TICK");
        } else {
            println!(" tick");
        }
    }

    fn rhythm_step(&mut self, step: usize, click: bool) {
        println!("{} {}", step + 1, if click { "clap" } else { "-" });
    }

    fn completed(&mut self, completion: &Completion) {
        println!("finished {} ({} notes)", completion.label, completion.notes);
    }
}

fn main() -> Result<(), TutorError> {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    simple_logger::init_with_level(level).unwrap();

    let target = match &opt.output {
        None => SoxTarget::Play,
        Some(path) => SoxTarget::File(path.clone()),
    };
    let config = TutorConfig {
        engine: EngineConfig {
            effects: !opt.plain,
            ..EngineConfig::default()
        },
        seed: None,
    };
    let mut tutor = Tutor::new(
        SoxDevice::new(SAMPLE_RATE, target),
        FileStore::new(&opt.state_dir),
        config,
        Console,
    )?;

    match opt.command {
        Command::Songs { difficulty, search } => {
            let query = search.unwrap_or_default();
            for song in tutor.songbook().search(&query) {
                if difficulty.map_or(true, |d| d == song.difficulty) {
                    println!(
                        "{:18} {:32} {:12} {:3} bpm {:5.1} s",
                        song.id,
                        song.title,
                        song.difficulty,
                        song.bpm,
                        song.duration_secs()
                    );
                }
            }
        }
        Command::Fingering { note } => match tutor.catalog().get(note) {
            Some(info) => {
                println!("{} {} at {:.2} Hz", info.note, info.name, info.frequency);
                println!("{}", info.holes);
                println!("{}", info.description);
                println!("Tip: {}", info.tip);
            }
            None => return Err(TutorError::UnknownNote { note }),
        },
        Command::Note { note } => {
            activate(&mut tutor);
            tutor.play_note(note)?;
            finish(&mut tutor, 5.0);
        }
        Command::Play { song, slow, demo } => {
            let mode = if slow {
                PlaybackMode::SlowPractice
            } else if demo {
                PlaybackMode::Demo
            } else {
                PlaybackMode::Normal
            };
            activate(&mut tutor);
            tutor.play_song(&song, mode)?;
            let limit = tutor
                .songbook()
                .by_id(&song)
                .map_or(0.0, |song| song.duration_secs() * 2.0);
            finish(&mut tutor, limit + 5.0);
        }
        Command::Scale { descending } => {
            let direction = if descending {
                ScaleDirection::Descending
            } else {
                ScaleDirection::Ascending
            };
            activate(&mut tutor);
            tutor.play_scale(direction);
            finish(&mut tutor, 15.0);
        }
        Command::Metronome {
            bpm,
            beats,
            seconds,
        } => {
            activate(&mut tutor);
            let bpm = tutor.set_metronome_tempo(bpm);
            tutor.set_beats_per_measure(beats);
            info!("metronome at {} bpm for {} s", bpm, seconds);
            tutor.start_metronome();
            tutor.advance(seconds_to_samples(seconds, SAMPLE_RATE));
            tutor.stop_metronome();
            finish(&mut tutor, TAIL_SECS);
        }
        Command::Rhythm => {
            activate(&mut tutor);
            tutor.rhythm_play();
            finish(&mut tutor, 10.0);
        }
        Command::Stats => {
            let stats = tutor.stats();
            let progress = tutor.profile().progress();
            println!("Level:          {}", stats.level);
            println!("Songs learned:  {}", stats.songs_learned);
            println!("Songs finished: {}", progress.completed_songs.len());
            println!("Practice hours: {}", stats.practice_hours);
            println!("Accuracy:       {}%", stats.accuracy);
        }
    }
    Ok(())
}

fn activate(tutor: &mut Tutor<SoxDevice, FileStore, Console>) {
    if let Err(err) = tutor.activate() {
        error!("{}", err);
    }
}

/// Play until everything went quiet, at most `limit` seconds, then let the room ring out.
fn finish(tutor: &mut Tutor<SoxDevice, FileStore, Console>, limit: f64) {
    let limit = tutor.now() + seconds_to_samples(limit, SAMPLE_RATE);
    if !tutor.run_until_idle(limit) {
        info!("stopping after the time limit");
        tutor.stop();
    }
    tutor.advance(seconds_to_samples(TAIL_SECS, SAMPLE_RATE));
}
