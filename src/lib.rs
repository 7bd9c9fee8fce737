// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

pub mod catalog;
pub mod effects;
pub mod engine;
pub mod melody;
pub mod metronome;
pub mod note;
pub mod output;
pub mod practice;
pub mod scheduler;
pub mod songbook;
pub mod storage;
pub mod synth;
pub mod timer;
pub mod tutor;
pub mod wave;

// Utility modules
pub mod rational;
