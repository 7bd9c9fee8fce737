// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Audio output devices.

pub mod sox;

use std::fmt;
use std::io;

use log::debug;
use snafu::Snafu;

use crate::wave::Stereo;

/// Life cycle of an output device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeviceState {
    /// Not yet started, or paused. Written audio is dropped.
    Suspended,
    Running,
    /// Permanently unusable.
    Closed,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceState::Suspended => "suspended",
            DeviceState::Running => "running",
            DeviceState::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum DeviceError {
    #[snafu(display("The output device can only be started by a user gesture"))]
    NeedsGesture,
    #[snafu(display("The output device is closed"))]
    Closed,
    #[snafu(display("Could not start {}: {}", program, source))]
    Spawn { program: String, source: io::Error },
    #[snafu(display("Failed to write audio: {}", source))]
    Write { source: io::Error },
}

pub trait OutputDevice {
    fn sample_rate(&self) -> f64;

    fn state(&self) -> DeviceState;

    /// Start or continue the device. `gesture` tells whether the call originates
    /// from a user interaction.
    fn resume(&mut self, gesture: bool) -> Result<(), DeviceError>;

    /// Send audio to a running device.
    fn write(&mut self, samples: &[Stereo<f64>]) -> Result<(), DeviceError>;

    fn close(&mut self);

    /// Whether the device can afford a convolution reverb.
    fn supports_convolution(&self) -> bool {
        true
    }
}

/// Keeps everything written to it, mostly for tests.
pub struct MemoryDevice {
    sample_rate: f64,
    state: DeviceState,
    requires_gesture: bool,
    convolution: bool,
    captured: Vec<Stereo<f64>>,
}

impl MemoryDevice {
    pub fn new(sample_rate: f64) -> Self {
        MemoryDevice {
            sample_rate,
            state: DeviceState::Suspended,
            requires_gesture: false,
            convolution: true,
            captured: Vec::new(),
        }
    }

    /// A device that refuses to start without a user gesture.
    pub fn requiring_gesture(mut self) -> Self {
        self.requires_gesture = true;
        self
    }

    pub fn without_convolution(mut self) -> Self {
        self.convolution = false;
        self
    }

    pub fn captured(&self) -> &[Stereo<f64>] {
        &self.captured
    }
}

impl OutputDevice for MemoryDevice {
    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn state(&self) -> DeviceState {
        self.state
    }

    fn resume(&mut self, gesture: bool) -> Result<(), DeviceError> {
        match self.state {
            DeviceState::Running => Ok(()),
            DeviceState::Closed => Closed.fail(),
            DeviceState::Suspended if self.requires_gesture && !gesture => NeedsGesture.fail(),
            DeviceState::Suspended => {
                debug!("memory device running");
                self.state = DeviceState::Running;
                Ok(())
            }
        }
    }

    fn write(&mut self, samples: &[Stereo<f64>]) -> Result<(), DeviceError> {
        match self.state {
            DeviceState::Running => {
                self.captured.extend_from_slice(samples);
                Ok(())
            }
            DeviceState::Closed => Closed.fail(),
            DeviceState::Suspended => Ok(()),
        }
    }

    fn close(&mut self) {
        self.state = DeviceState::Closed;
    }

    fn supports_convolution(&self) -> bool {
        self.convolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gesture_policy() {
        let mut device = MemoryDevice::new(8000.0).requiring_gesture();
        assert!(matches!(device.resume(false), Err(DeviceError::NeedsGesture)));
        assert_eq!(device.state(), DeviceState::Suspended);
        device.resume(true).unwrap();
        assert_eq!(device.state(), DeviceState::Running);
        // once running, no gesture is needed anymore
        device.resume(false).unwrap();
    }

    #[test]
    fn only_running_devices_capture() {
        let mut device = MemoryDevice::new(8000.0);
        device.write(&[Stereo::mono(0.5)]).unwrap();
        assert!(device.captured().is_empty());
        device.resume(false).unwrap();
        device.write(&[Stereo::mono(0.5)]).unwrap();
        assert_eq!(device.captured(), &[Stereo::mono(0.5)]);

        device.close();
        assert!(matches!(device.write(&[Stereo::mono(0.5)]), Err(DeviceError::Closed)));
        assert!(matches!(device.resume(true), Err(DeviceError::Closed)));
    }
}
