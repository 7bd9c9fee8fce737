// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! A compact textual format for writing down melodies.
//!
//! A melody is a whitespace separated list of events `NOTE[:DURATION][@FINGERING]`.
//! The duration is a positive fraction of a beat and defaults to one beat,
//! the fingering to show defaults to the note itself.
//!
//! ```
//! use ocarina_tutor::melody::*;
//! use ocarina_tutor::rational::Rational;
//!
//! let events = parse_melody("C4:1/2 G4 A5:1/8@A4").unwrap();
//! assert_eq!(events.len(), 3);
//! assert_eq!(events[0].duration, Rational::new(1, 2));
//! assert_eq!(events[1].duration, Rational::one());
//! assert_eq!(events[2].note.to_string(), "A5");
//! assert_eq!(events[2].fingering.to_string(), "A4");
//! ```

use snafu::{ResultExt, Snafu};

use crate::note::{Note, ParseNoteError};
use crate::rational::{ParseRationalError, Rational};

/// One note of a melody.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NoteEvent {
    /// The pitch that is sounded.
    pub note: Note,
    /// Length in beats.
    pub duration: Rational,
    /// The note whose fingering is shown while this event plays.
    pub fingering: Note,
}

impl NoteEvent {
    pub fn new(note: Note, duration: Rational) -> Self {
        Self {
            note,
            duration,
            fingering: note,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Snafu)]
pub enum ParseError {
    #[snafu(display("Invalid note in event {}: {}", index, source))]
    BadNote {
        index: usize,
        source: ParseNoteError,
    },
    #[snafu(display("Invalid fingering in event {}: {}", index, source))]
    BadFingering {
        index: usize,
        source: ParseNoteError,
    },
    #[snafu(display("Invalid duration in event {}: {}", index, source))]
    BadDuration {
        index: usize,
        source: ParseRationalError,
    },
    #[snafu(display("Duration of event {} must be positive, got {}", index, duration))]
    NonPositive { index: usize, duration: Rational },
}

pub fn parse_melody(input: &str) -> Result<Vec<NoteEvent>, ParseError> {
    input
        .split_whitespace()
        .enumerate()
        .map(|(index, token)| parse_event(index, token))
        .collect()
}

fn parse_event(index: usize, token: &str) -> Result<NoteEvent, ParseError> {
    let (rest, fingering) = match token.find('@') {
        Some(at) => (&token[..at], Some(&token[at + 1..])),
        None => (token, None),
    };
    let (note, duration) = match rest.find(':') {
        Some(colon) => (&rest[..colon], Some(&rest[colon + 1..])),
        None => (rest, None),
    };

    let note: Note = note.parse().context(BadNote { index })?;
    let duration = match duration {
        Some(text) => text.parse().context(BadDuration { index })?,
        None => Rational::one(),
    };
    if !duration.is_positive() {
        return NonPositive { index, duration }.fail();
    }
    let fingering = match fingering {
        Some(text) => text.parse().context(BadFingering { index })?,
        None => note,
    };

    Ok(NoteEvent {
        note,
        duration,
        fingering,
    })
}

/// Total length of a melody in beats.
pub fn total_beats(events: &[NoteEvent]) -> Rational {
    events.iter().map(|event| event.duration).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::{expect, Expect};

    fn n(name: &str) -> Note {
        name.parse().unwrap()
    }

    #[test]
    fn parse_sequences() {
        assert_eq!(parse_melody("").unwrap(), vec![]);
        assert_eq!(
            parse_melody("  E4:3/4\n D4:1/4 ").unwrap(),
            vec![
                NoteEvent::new(n("E4"), Rational::new(3, 4)),
                NoteEvent::new(n("D4"), Rational::new(1, 4)),
            ]
        );
        assert_eq!(
            parse_melody("G5@C5").unwrap(),
            vec![NoteEvent {
                note: n("G5"),
                duration: Rational::one(),
                fingering: n("C5"),
            }]
        );
    }

    #[test]
    fn total_length() {
        let events = parse_melody("C4:1/2 C4:1/2 G4 G4:2").unwrap();
        assert_eq!(total_beats(&events), Rational::from_int(4));
    }

    #[test]
    fn errors_name_the_event() {
        assert!(matches!(
            parse_melody("C4 X4"),
            Err(ParseError::BadNote { index: 1, .. })
        ));
        assert!(matches!(
            parse_melody("C4:1/0"),
            Err(ParseError::BadDuration { index: 0, .. })
        ));
        assert!(matches!(
            parse_melody("C4 D4 E4:0"),
            Err(ParseError::NonPositive { index: 2, .. })
        ));
        assert!(matches!(
            parse_melody("C4@"),
            Err(ParseError::BadFingering { index: 0, .. })
        ));
    }

    fn check_error(input: &str, output: Expect) {
        let message = match parse_melody(input) {
            Ok(events) => format!("unexpectedly parsed {:?}", events),
            Err(err) => err.to_string(),
        };
        output.assert_eq(&message);
    }

    #[test]
    fn error_messages() {
        check_error(
            "C4 D4:-1/2",
            expect![[r#"Duration of event 1 must be positive, got -1/2"#]],
        );
        check_error(
            "C4:1/2/3",
            expect![[r#"Invalid duration in event 0: expected <int> or <int>/<int>"#]],
        );
        check_error("Q4", expect![[r#"Invalid note in event 0: 'Q' is not a note letter"#]]);
    }
}
