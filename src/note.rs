// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Definitions of what a note is.

use std::fmt;

use snafu::Snafu;

/// A note is an index on a keyboard following the MIDI standard, where C4 is 60.
///
/// Notes parse from and print as scientific pitch names:
///
/// ```
/// use ocarina_tutor::note::*;
///
/// let a4: Note = "A4".parse().unwrap();
/// assert_eq!(a4, Note::from_midi(69));
/// assert_eq!(a4.to_string(), "A4");
/// assert_eq!("c#5".parse::<Note>().unwrap().to_string(), "C#5");
/// assert_eq!("Bb4".parse::<Note>().unwrap().to_string(), "A#4");
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Note(u8);

/// The name of a note in standard notation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NoteName {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

/// Any offset applied to a note in standard notation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Accidental {
    /// A half-tone lower than indicated by the name.
    Flat,
    Base,
    /// A half-tone higher than indicated by the name.
    Sharp,
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum ParseNoteError {
    #[snafu(display("Empty note name"))]
    Empty,
    #[snafu(display("{:?} is not a note letter", letter))]
    Letter { letter: char },
    #[snafu(display("{:?} is not an accidental", accidental))]
    BadAccidental { accidental: String },
    #[snafu(display("Missing or invalid octave in {:?}", name))]
    Octave { name: String },
    #[snafu(display("{:?} is outside of the MIDI range", name))]
    OutOfRange { name: String },
}

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

impl Note {
    /// Convert a note from standard notation to a MIDI note index.
    /// Returns `None` if the note is not representable in the MIDI note system.
    ///
    /// # Examples
    ///
    /// ```
    /// use ocarina_tutor::note::*;
    ///
    /// assert_eq!(Note::try_named(NoteName::C, Accidental::Base, 4), Some(Note::from_midi(60)));
    /// assert_eq!(Note::try_named(NoteName::G, Accidental::Flat, 5), Some(Note::from_midi(78)));
    /// assert_eq!(Note::try_named(NoteName::C, Accidental::Flat, -1), None);
    /// ```
    pub fn try_named(name: NoteName, accidental: Accidental, octave: i32) -> Option<Note> {
        let name_index = match name {
            NoteName::C => 0,
            NoteName::D => 2,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::G => 7,
            NoteName::A => 9,
            NoteName::B => 11,
        };
        let offset = match accidental {
            Accidental::Base => 0,
            Accidental::Flat => -1,
            Accidental::Sharp => 1,
        };
        // C4 is MIDI note number 60
        let index = (octave + 1) * 12 + name_index + offset;
        Note::try_from_midi(index as i64)
    }

    pub fn from_midi(midi_note: u8) -> Note {
        assert!(midi_note < 128, "MIDI only has notes 0 - 127");
        Note(midi_note)
    }

    pub fn try_from_midi(midi_note: i64) -> Option<Note> {
        if (0..128).contains(&midi_note) {
            Some(Note(midi_note as u8))
        } else {
            None
        }
    }

    pub fn to_midi(self) -> u8 {
        self.0
    }

    pub fn octave(self) -> i32 {
        self.0 as i32 / 12 - 1
    }

    /// Frequency in twelve-tone equal temperament with A4 at 440 Hz.
    ///
    /// ```
    /// use ocarina_tutor::note::*;
    ///
    /// assert_eq!(Note::from_midi(69).equal_tempered(), 440.0);
    /// assert!((Note::from_midi(60).equal_tempered() - 261.63).abs() < 0.01);
    /// ```
    pub fn equal_tempered(self) -> f64 {
        440.0 * 2f64.powf((self.0 as f64 - 69.0) / 12.0)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", SHARP_NAMES[self.0 as usize % 12], self.octave())
    }
}

impl std::str::FromStr for Note {
    type Err = ParseNoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let letter = chars.next().ok_or(ParseNoteError::Empty)?;
        let name = match letter.to_ascii_uppercase() {
            'A' => NoteName::A,
            'B' => NoteName::B,
            'C' => NoteName::C,
            'D' => NoteName::D,
            'E' => NoteName::E,
            'F' => NoteName::F,
            'G' => NoteName::G,
            _ => return Letter { letter }.fail(),
        };

        let rest = chars.as_str();
        let octave_start = rest
            .find(|ch: char| ch.is_ascii_digit() || ch == '-')
            .unwrap_or_else(|| rest.len());
        let accidental = match &rest[..octave_start] {
            "#" | "♯" => Accidental::Sharp,
            "b" | "♭" => Accidental::Flat,
            "" => Accidental::Base,
            other => {
                return BadAccidental {
                    accidental: other.to_string(),
                }
                .fail()
            }
        };
        let octave = rest[octave_start..]
            .parse()
            .map_err(|_| ParseNoteError::Octave { name: s.to_string() })?;

        Note::try_named(name, accidental, octave)
            .ok_or_else(|| ParseNoteError::OutOfRange { name: s.to_string() })
    }
}
