// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The built-in songs.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

use crate::melody::{self, NoteEvent};
use crate::rational::Rational;

/// Difficulty tier of a song, also used as the learner's level.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Beginner
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        })
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(format!("unknown difficulty {:?}", other)),
        }
    }
}

/// A pre-authored song.
///
/// Events are reference counted so playback sessions share them instead of copying.
#[derive(Debug, Clone)]
pub struct Song {
    pub id: &'static str,
    pub title: &'static str,
    pub difficulty: Difficulty,
    /// Beats per minute.
    pub bpm: u32,
    pub description: &'static str,
    pub events: Rc<[NoteEvent]>,
}

impl Song {
    /// Nominal playing time in seconds at the song's own tempo.
    ///
    /// ```
    /// use ocarina_tutor::songbook::*;
    ///
    /// let book = SongBook::builtin().unwrap();
    /// let song = book.by_id("do_re_mi").unwrap();
    /// // 13 quarter notes and two half notes at 110 bpm
    /// assert!((song.duration_secs() - 17.0 * 60.0 / 110.0).abs() < 1e-9);
    /// ```
    pub fn duration_secs(&self) -> f64 {
        self.beats().to_f64() * 60.0 / self.bpm as f64
    }

    pub fn beats(&self) -> Rational {
        melody::total_beats(&self.events)
    }
}

#[derive(Debug, Snafu)]
pub enum SongBookError {
    #[snafu(display("Song {:?} does not parse: {}", id, source))]
    Notation {
        id: &'static str,
        source: melody::ParseError,
    },
    #[snafu(display("Song {:?} has tempo {} outside of 40 to 200 bpm", id, bpm))]
    Tempo { id: &'static str, bpm: u32 },
}

struct SongSource {
    id: &'static str,
    title: &'static str,
    difficulty: Difficulty,
    bpm: u32,
    description: &'static str,
    melody: &'static str,
}

const BUILTIN: &[SongSource] = &[
    SongSource {
        id: "twinkle",
        title: "Twinkle, Twinkle, Little Star",
        difficulty: Difficulty::Beginner,
        bpm: 120,
        description: "The most basic practice piece.",
        melody: "C4:1/2 C4:1/2 G4:1/2 G4:1/2 A4:1/2 A4:1/2 G4
                 F4:1/2 F4:1/2 E4:1/2 E4:1/2 D4:1/2 D4:1/2 C4",
    },
    SongSource {
        id: "mary_lamb",
        title: "Mary Had a Little Lamb",
        difficulty: Difficulty::Beginner,
        bpm: 100,
        description: "A simple melody for learning the basic fingerings.",
        melody: "E4:1/2 D4:1/2 C4:1/2 D4:1/2 E4:1/2 E4:1/2 E4
                 D4:1/2 D4:1/2 D4 E4:1/2 G4:1/2 G4",
    },
    SongSource {
        id: "do_re_mi",
        title: "Do Re Mi Scale",
        difficulty: Difficulty::Beginner,
        bpm: 110,
        description: "Walks the basic scale up and down in order.",
        melody: "C4 D4 E4 F4 G4 A4 B4 C5:2 B4 A4 G4 F4 E4 D4 C4:2",
    },
    SongSource {
        id: "hot_cross_buns",
        title: "Hot Cross Buns",
        difficulty: Difficulty::Beginner,
        bpm: 120,
        description: "A very easy tune using only three notes.",
        melody: "E4 D4 C4:2 E4 D4 C4:2
                 C4:1/2 C4:1/2 C4:1/2 C4:1/2 D4:1/2 D4:1/2 D4:1/2 D4:1/2
                 E4 D4 C4:2",
    },
    SongSource {
        id: "london_bridge",
        title: "London Bridge",
        difficulty: Difficulty::Intermediate,
        bpm: 110,
        description: "An intermediate study with fingering changes.",
        melody: "G4:1/2 A4:1/4 G4:1/4 F4:1/2 E4:1/2 F4:1/2 G4:1/2
                 D4:1/2 E4:1/2 F4:1/2 E4:1/2 F4:1/2 G4",
    },
    SongSource {
        id: "amazing_grace",
        title: "Amazing Grace",
        difficulty: Difficulty::Intermediate,
        bpm: 90,
        description: "A beautiful melody for building expression.",
        melody: "D4:3/4 G4:3/2 B4:3/4 G4:3/4 B4:3/2 A4:3/4 G4:3/2 E4:3/4 D4:3/2",
    },
    SongSource {
        id: "ode_to_joy",
        title: "Ode to Joy",
        difficulty: Difficulty::Intermediate,
        bpm: 95,
        description: "Beethoven's famous theme.",
        melody: "E4:1/2 E4:1/2 F4:1/2 G4:1/2 G4:1/2 F4:1/2 E4:1/2 D4:1/2
                 C4:1/2 C4:1/2 D4:1/2 E4:1/2 E4:3/4 D4:1/4 D4",
    },
    SongSource {
        id: "happy_birthday",
        title: "Happy Birthday",
        difficulty: Difficulty::Intermediate,
        bpm: 100,
        description: "A familiar melody to grow intermediate skills.",
        melody: "C4:3/4 C4:1/4 D4 C4 F4 E4:2
                 C4:3/4 C4:1/4 D4 C4 G4 F4:2",
    },
    SongSource {
        id: "canon_in_d",
        title: "Canon in D",
        difficulty: Difficulty::Advanced,
        bpm: 80,
        description: "An advanced piece with complex fingerings and fast passages.",
        melody: "D4 A4 B4 F4 G4 D4 G4 A4
                 D4:1/4 F4:1/4 A4:1/4 D5:1/4",
    },
    SongSource {
        id: "zelda_theme",
        title: "Zelda's Lullaby",
        difficulty: Difficulty::Advanced,
        bpm: 85,
        description: "A classic that shows off the ocarina's voice.",
        melody: "B4:3/2 D5:1/2 A4:2 G4:1/2 A4:1/2 B4:3/2 D5:1/2 A4 G4",
    },
    SongSource {
        id: "fur_elise",
        title: "Für Elise",
        difficulty: Difficulty::Advanced,
        bpm: 70,
        description: "Beethoven's piece for practicing quick fingering changes.",
        melody: "E5:1/4 D5:1/4 E5:1/4 D5:1/4 E5:1/4 B4:1/4 D5:1/4 C5:1/4 A4:1/2
                 C4:1/4 E4:1/4 A4:1/4 B4:1/2",
    },
    SongSource {
        id: "moonlight_sonata",
        title: "Moonlight Sonata",
        difficulty: Difficulty::Advanced,
        bpm: 60,
        description: "Slow, but deeply expressive.",
        melody: "G4 C5 E5:2 G4 C5 E5:2 G4 C5 E5 G5 F5:2 E5:2",
    },
    SongSource {
        id: "flight_bumblebee",
        title: "Flight of the Bumblebee",
        difficulty: Difficulty::Advanced,
        bpm: 160,
        description: "The hardest piece, at a very fast tempo.",
        melody: "A4:1/8 B4:1/8 C5:1/8 D5:1/8 E5:1/8 F5:1/8 G5:1/8 A5:1/8@A4
                 G5:1/8 F5:1/8 E5:1/8 D5:1/8 C5:1/8 B4:1/8 A4:1/8 G4:1/8",
    },
];

/// Immutable collection of songs, in presentation order.
#[derive(Debug, Clone)]
pub struct SongBook {
    songs: Vec<Song>,
}

impl SongBook {
    /// Parse the built-in songs.
    pub fn builtin() -> Result<SongBook, SongBookError> {
        let mut songs = Vec::with_capacity(BUILTIN.len());
        for source in BUILTIN {
            if !(40..=200).contains(&source.bpm) {
                return Tempo {
                    id: source.id,
                    bpm: source.bpm,
                }
                .fail();
            }
            let events = melody::parse_melody(source.melody).context(Notation { id: source.id })?;
            songs.push(Song {
                id: source.id,
                title: source.title,
                difficulty: source.difficulty,
                bpm: source.bpm,
                description: source.description,
                events: events.into(),
            });
        }
        log::debug!("loaded {} built-in songs", songs.len());
        Ok(SongBook { songs })
    }

    pub fn all(&self) -> &[Song] {
        &self.songs
    }

    pub fn by_id(&self, id: &str) -> Option<&Song> {
        self.songs.iter().find(|song| song.id == id)
    }

    pub fn by_difficulty(&self, difficulty: Difficulty) -> impl Iterator<Item = &Song> {
        self.songs
            .iter()
            .filter(move |song| song.difficulty == difficulty)
    }

    /// Case-insensitive search in titles and descriptions.
    pub fn search<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a Song> + 'a {
        let query = query.to_lowercase();
        self.songs.iter().filter(move |song| {
            song.title.to_lowercase().contains(&query)
                || song.description.to_lowercase().contains(&query)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn builtin_songs_parse() {
        let book = SongBook::builtin().unwrap();
        assert_eq!(book.all().len(), 13);
        for difficulty in Difficulty::ALL.iter() {
            assert!(book.by_difficulty(*difficulty).count() >= 4);
        }
    }

    #[test]
    fn do_re_mi_events() {
        let book = SongBook::builtin().unwrap();
        let song = book.by_id("do_re_mi").unwrap();
        let names: Vec<String> = song.events.iter().map(|e| e.note.to_string()).collect();
        assert_eq!(
            names,
            [
                "C4", "D4", "E4", "F4", "G4", "A4", "B4", "C5", "B4", "A4", "G4", "F4", "E4",
                "D4", "C4"
            ]
        );
        assert_eq!(song.events[14].duration, Rational::from_int(2));
        assert_eq!(song.beats(), Rational::from_int(17));
    }

    #[test]
    fn only_the_bumblebee_leaves_the_chart() {
        let book = SongBook::builtin().unwrap();
        let catalog = Catalog::standard();
        for song in book.all() {
            for event in song.events.iter() {
                assert!(catalog.get(event.fingering).is_some(), "{}", song.id);
                if catalog.get(event.note).is_none() {
                    assert_eq!(song.id, "flight_bumblebee");
                    assert_eq!(event.note.to_string(), "A5");
                }
            }
        }
    }

    #[test]
    fn search_is_case_insensitive() {
        let book = SongBook::builtin().unwrap();
        let ids: Vec<&str> = book.search("BEETHOVEN").map(|s| s.id).collect();
        assert_eq!(ids, ["ode_to_joy", "fur_elise"]);
        assert_eq!(book.search("lullaby").count(), 1);
        assert_eq!(book.search("no such song").count(), 0);
    }

    #[test]
    fn difficulty_names() {
        assert_eq!("Advanced".parse(), Ok(Difficulty::Advanced));
        assert!("expert".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::Intermediate.to_string(), "intermediate");
    }
}
