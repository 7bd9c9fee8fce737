// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The note and fingering chart of a 12-hole alto C ocarina.
//!
//! The catalog is static data sorted by pitch and never changes after construction.

use std::fmt;

use crate::note::Note;

/// One of the ten holes covered by the player's fingers.
///
/// Holes 1 to 4 are played by the left hand, 5 to 8 by the right hand,
/// counted from the mouthpiece.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Hole {
    Finger(u8),
    /// Left thumb, on the underside.
    Thumb1,
    /// Right thumb, on the underside.
    Thumb2,
}

impl Hole {
    /// All holes in display order.
    pub const ALL: [Hole; 10] = [
        Hole::Finger(1),
        Hole::Finger(2),
        Hole::Finger(3),
        Hole::Finger(4),
        Hole::Finger(5),
        Hole::Finger(6),
        Hole::Finger(7),
        Hole::Finger(8),
        Hole::Thumb1,
        Hole::Thumb2,
    ];

    fn bit(self) -> u16 {
        match self {
            Hole::Finger(n) => {
                debug_assert!((1..=8).contains(&n), "finger holes are numbered 1 to 8");
                1 << (n - 1)
            }
            Hole::Thumb1 => 1 << 8,
            Hole::Thumb2 => 1 << 9,
        }
    }

    /// Which finger covers the hole.
    pub fn finger(self) -> &'static str {
        match self {
            Hole::Finger(1) => "left index",
            Hole::Finger(2) | Hole::Finger(3) => "left middle",
            Hole::Finger(4) => "left ring",
            Hole::Finger(5) => "right index",
            Hole::Finger(6) => "right middle",
            Hole::Finger(7) => "right ring",
            Hole::Finger(8) => "right pinky",
            Hole::Finger(_) => "unknown",
            Hole::Thumb1 => "left thumb",
            Hole::Thumb2 => "right thumb",
        }
    }
}

impl fmt::Display for Hole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hole::Finger(n) => write!(f, "{}", n),
            Hole::Thumb1 => write!(f, "thumb1"),
            Hole::Thumb2 => write!(f, "thumb2"),
        }
    }
}

/// Which of the ten holes are covered, one bit per hole.
///
/// ```
/// use ocarina_tutor::catalog::*;
///
/// let holes = HoleVector::covering(&[Hole::Finger(7), Hole::Finger(8), Hole::Thumb1]);
/// assert!(holes.is_covered(Hole::Finger(8)));
/// assert!(!holes.is_covered(Hole::Thumb2));
/// assert_eq!(holes.covered_count(), 3);
/// assert_eq!(holes.to_string(), "○○○○○○●●|●○");
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct HoleVector(u16);

impl HoleVector {
    pub const OPEN: HoleVector = HoleVector(0);

    pub fn covering(holes: &[Hole]) -> HoleVector {
        HoleVector(holes.iter().fold(0, |bits, hole| bits | hole.bit()))
    }

    /// Finger holes `from..=8` covered, plus the given thumbs.
    /// Every chart entry has this shape: fingers close from the far end of the body.
    const fn from_finger(from: u8, thumb1: bool, thumb2: bool) -> HoleVector {
        let fingers = if from > 8 { 0 } else { 0xff & !((1u16 << (from - 1)) - 1) };
        let thumbs = (thumb1 as u16) << 8 | (thumb2 as u16) << 9;
        HoleVector(fingers | thumbs)
    }

    pub fn is_covered(self, hole: Hole) -> bool {
        self.0 & hole.bit() != 0
    }

    pub fn covered_count(self) -> u32 {
        self.0.count_ones()
    }

    /// The ten flags in display order.
    pub fn flags(self) -> [bool; 10] {
        let mut flags = [false; 10];
        for (flag, hole) in flags.iter_mut().zip(Hole::ALL.iter()) {
            *flag = self.is_covered(*hole);
        }
        flags
    }
}

impl fmt::Display for HoleVector {
    /// Finger holes, a separator, then the two thumbs. `●` is covered.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, covered) in self.flags().iter().enumerate() {
            if i == 8 {
                write!(f, "|")?;
            }
            write!(f, "{}", if *covered { '●' } else { '○' })?;
        }
        Ok(())
    }
}

/// Everything the tutor knows about playing one note.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteInfo {
    pub note: Note,
    /// Solfège name shown to the learner.
    pub name: &'static str,
    pub frequency: f64,
    pub holes: HoleVector,
    /// 1 (easiest) to 4.
    pub difficulty: u8,
    pub description: &'static str,
    pub tip: &'static str,
}

macro_rules! entry {
    ($midi:expr, $name:expr, $freq:expr, $holes:expr, $difficulty:expr, $description:expr, $tip:expr) => {
        RawEntry {
            midi: $midi,
            name: $name,
            frequency: $freq,
            holes: $holes,
            difficulty: $difficulty,
            description: $description,
            tip: $tip,
        }
    };
}

struct RawEntry {
    midi: u8,
    name: &'static str,
    frequency: f64,
    holes: HoleVector,
    difficulty: u8,
    description: &'static str,
    tip: &'static str,
}

/// Sorted by pitch.
const CHART: [RawEntry; 12] = [
    entry!(60, "Do (C)", 261.63, HoleVector::from_finger(7, true, false), 1,
        "Cover the right ring finger and pinky holes and the left thumb.",
        "The first note to learn. Do not blow too hard."),
    entry!(62, "Re (D)", 293.66, HoleVector::from_finger(6, true, false), 1,
        "Cover the right middle, ring and pinky holes and the left thumb.",
        "Starting from Do, only add the right middle finger."),
    entry!(64, "Mi (E)", 329.63, HoleVector::from_finger(5, true, false), 2,
        "Cover all four right hand holes and the left thumb.",
        "Every finger of the right hand is in use."),
    entry!(65, "Fa (F)", 349.23, HoleVector::from_finger(4, true, false), 2,
        "Cover the left ring finger, the whole right hand and the left thumb.",
        "Seal the left ring finger hole completely."),
    entry!(67, "Sol (G)", 392.00, HoleVector::from_finger(3, true, false), 2,
        "Cover the left middle and ring holes, the whole right hand and the left thumb.",
        "Close every hole fully for a steady tone."),
    entry!(69, "La (A)", 440.00, HoleVector::from_finger(2, true, false), 3,
        "Cover holes 2 to 8 and the left thumb.",
        "Place the left index finger precisely."),
    entry!(71, "Ti (B)", 493.88, HoleVector::from_finger(1, true, false), 3,
        "Cover every hole except the right thumb.",
        "All fingers have to work together. Practice it slowly."),
    entry!(72, "High Do (C)", 523.25, HoleVector::from_finger(1, true, true), 4,
        "Cover every hole.",
        "Seal every hole and blow with gentle, even pressure."),
    entry!(74, "High Re (D)", 587.33, HoleVector::from_finger(2, true, true), 4,
        "Cover holes 2 to 8 and both thumbs.",
        "Lift the left index finger while both thumbs stay down."),
    entry!(76, "High Mi (E)", 659.25, HoleVector::from_finger(3, true, true), 4,
        "Cover holes 3 to 8 and both thumbs.",
        "Raise the breath pressure slightly for the upper register."),
    entry!(77, "High Fa (F)", 698.46, HoleVector::from_finger(4, true, true), 4,
        "Cover holes 4 to 8 and both thumbs.",
        "Keep the thumbs steady while the left hand opens."),
    entry!(79, "High Sol (G)", 783.99, HoleVector::from_finger(5, true, true), 4,
        "Cover the right hand holes and both thumbs.",
        "The highest note of the chart. Support it with firm breath."),
];

/// Lookup tables from notes to frequencies and fingerings.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<NoteInfo>,
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::standard()
    }
}

impl Catalog {
    /// The chart of a 12-hole alto C ocarina, C4 to G5.
    pub fn standard() -> Catalog {
        let entries = CHART
            .iter()
            .map(|raw| NoteInfo {
                note: Note::from_midi(raw.midi),
                name: raw.name,
                frequency: raw.frequency,
                holes: raw.holes,
                difficulty: raw.difficulty,
                description: raw.description,
                tip: raw.tip,
            })
            .collect();
        Catalog { entries }
    }

    pub fn get(&self, note: Note) -> Option<&NoteInfo> {
        self.entries
            .binary_search_by_key(&note, |info| info.note)
            .ok()
            .map(|index| &self.entries[index])
    }

    pub fn frequency(&self, note: Note) -> Option<f64> {
        self.get(note).map(|info| info.frequency)
    }

    pub fn holes(&self, note: Note) -> Option<HoleVector> {
        self.get(note).map(|info| info.holes)
    }

    /// All entries, sorted by pitch.
    pub fn all(&self) -> &[NoteInfo] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry closest to `frequency`, comparing in cents.
    ///
    /// ```
    /// use ocarina_tutor::catalog::*;
    ///
    /// let catalog = Catalog::standard();
    /// assert_eq!(catalog.nearest(445.0).map(|n| n.name), Some("La (A)"));
    /// assert!(catalog.nearest(0.0).is_none());
    /// ```
    pub fn nearest(&self, frequency: f64) -> Option<&NoteInfo> {
        if !(frequency.is_finite() && frequency > 0.0) {
            return None;
        }
        let distance = |info: &NoteInfo| (info.frequency / frequency).log2().abs();
        self.entries.iter().min_by(|a, b| {
            distance(a)
                .partial_cmp(&distance(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// The one-octave practice scale C4 to C5.
    pub fn scale(&self) -> Vec<Note> {
        let c4 = Note::from_midi(60);
        let c5 = Note::from_midi(72);
        self.entries
            .iter()
            .map(|info| info.note)
            .filter(|note| *note >= c4 && *note <= c5)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(name: &str) -> Note {
        name.parse().unwrap()
    }

    #[test]
    fn frequencies_are_positive_and_ascending() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.len(), 12);
        for pair in catalog.all().windows(2) {
            assert!(pair[0].frequency > 0.0);
            assert!(pair[0].frequency < pair[1].frequency);
            assert!(pair[0].note < pair[1].note);
        }
    }

    #[test]
    fn frequencies_are_close_to_equal_temperament() {
        for info in Catalog::standard().all() {
            assert!((info.frequency - info.note.equal_tempered()).abs() < 0.01);
        }
    }

    #[test]
    fn documented_hole_patterns() {
        let catalog = Catalog::standard();
        let holes = |name| catalog.holes(n(name)).unwrap();

        assert_eq!(
            holes("C4"),
            HoleVector::covering(&[Hole::Finger(7), Hole::Finger(8), Hole::Thumb1])
        );
        assert_eq!(
            holes("D4"),
            HoleVector::covering(&[
                Hole::Finger(6),
                Hole::Finger(7),
                Hole::Finger(8),
                Hole::Thumb1
            ])
        );
        assert_eq!(holes("B4").covered_count(), 9);
        assert!(!holes("B4").is_covered(Hole::Thumb2));
        assert_eq!(holes("C5").covered_count(), 10);
        assert_eq!(holes("G5").to_string(), "○○○○●●●●|●●");

        // each step up to B4 closes exactly one more finger hole
        let scale = catalog.scale();
        for pair in scale[..scale.len() - 1].windows(2) {
            assert_eq!(holes_count(&catalog, pair[0]) + 1, holes_count(&catalog, pair[1]));
        }
    }

    fn holes_count(catalog: &Catalog, note: Note) -> u32 {
        catalog.holes(note).unwrap().covered_count()
    }

    #[test]
    fn difficulty_ranks() {
        let catalog = Catalog::standard();
        for info in catalog.all() {
            assert!((1..=4).contains(&info.difficulty), "{}", info.note);
        }
        assert_eq!(catalog.get(n("C4")).unwrap().difficulty, 1);
        assert_eq!(catalog.get(n("A4")).unwrap().difficulty, 3);
        assert_eq!(catalog.get(n("C5")).unwrap().difficulty, 4);
    }

    #[test]
    fn nearest_of_exact_frequency_is_the_same_note() {
        let catalog = Catalog::standard();
        for info in catalog.all() {
            assert_eq!(catalog.nearest(info.frequency).map(|i| i.note), Some(info.note));
        }
    }

    #[test]
    fn missing_notes() {
        let catalog = Catalog::standard();
        assert!(catalog.get(n("A5")).is_none());
        assert!(catalog.get(n("C#4")).is_none());
        assert_eq!(catalog.frequency(n("A5")), None);
    }

    #[test]
    fn scale_spans_one_octave() {
        let scale = Catalog::standard().scale();
        let names: Vec<String> = scale.iter().map(|n| n.to_string()).collect();
        assert_eq!(names, ["C4", "D4", "E4", "F4", "G4", "A4", "B4", "C5"]);
    }
}
