// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Getting sound to play using a sox subprocess.

use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use log::{debug, error, info};
use snafu::ResultExt;

use super::{Closed, DeviceError, DeviceState, OutputDevice, Spawn, Write as WriteFailed};
use crate::wave::{byte_len, copy_bytes_to, Stereo};

#[derive(Debug, Clone, PartialEq)]
pub enum SoxTarget {
    /// The default audio device, through `play`.
    Play,
    /// An audio file, through `sox`. The format follows the extension.
    File(PathBuf),
}

struct Stream {
    child: Child,
    stdin: ChildStdin,
}

/// Streams interleaved `f64` stereo into `play` or `sox`.
///
/// The subprocess is only spawned on the first `resume`, so constructing the
/// device never fails.
pub struct SoxDevice {
    sample_rate: f64,
    target: SoxTarget,
    stream: Option<Stream>,
    state: DeviceState,
    buffer: Vec<u8>,
}

impl SoxDevice {
    pub fn new(sample_rate: f64, target: SoxTarget) -> Self {
        SoxDevice {
            sample_rate,
            target,
            stream: None,
            state: DeviceState::Suspended,
            buffer: Vec::new(),
        }
    }

    fn spawn(&self) -> Result<Stream, DeviceError> {
        let sample_rate_str = format!("{}", self.sample_rate.round() as i64);
        let input_args = [
            "-R", // make the output reproducible
            "--channels",
            "2",
            "--rate",
            &sample_rate_str,
            "--type",
            "f64",
            "/dev/stdin",
        ];

        // For properly recording the sox dependency on nix:
        let (play, sox) = if let Some(sox_bin) = option_env!("NIX_SOX_BIN") {
            debug!("using sox from nix store {}", sox_bin);
            (Path::new(sox_bin).join("play"), Path::new(sox_bin).join("sox"))
        } else {
            ("play".into(), "sox".into())
        };

        let (program, mut command) = match &self.target {
            SoxTarget::Play => {
                let mut command = Command::new(&play);
                command
                    .args(&input_args)
                    .stdout(Stdio::null())
                    .stderr(Stdio::null());
                (play, command)
            }
            SoxTarget::File(outfile) => {
                let mut command = Command::new(&sox);
                command.args(&input_args).arg(outfile);
                (sox, command)
            }
        };

        let program = program.display().to_string();
        let mut child = command
            .stdin(Stdio::piped())
            .spawn()
            .context(Spawn { program: program.clone() })?;
        let stdin = match child.stdin.take() {
            Some(stdin) => stdin,
            None => {
                return Err(DeviceError::Spawn {
                    program,
                    source: io::Error::new(io::ErrorKind::BrokenPipe, "no stdin"),
                })
            }
        };
        info!("streaming audio to {}", program);
        Ok(Stream { child, stdin })
    }
}

impl OutputDevice for SoxDevice {
    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn state(&self) -> DeviceState {
        self.state
    }

    fn resume(&mut self, _gesture: bool) -> Result<(), DeviceError> {
        match self.state {
            DeviceState::Running => Ok(()),
            DeviceState::Closed => Closed.fail(),
            DeviceState::Suspended => {
                if self.stream.is_none() {
                    self.stream = Some(self.spawn()?);
                }
                self.state = DeviceState::Running;
                Ok(())
            }
        }
    }

    fn write(&mut self, samples: &[Stereo<f64>]) -> Result<(), DeviceError> {
        let stream = match (self.state, self.stream.as_mut()) {
            (DeviceState::Running, Some(stream)) => stream,
            (DeviceState::Closed, _) => return Closed.fail(),
            _ => return Ok(()),
        };

        if self.buffer.len() < byte_len(samples) {
            self.buffer.resize(byte_len(samples), 0);
        }
        copy_bytes_to(samples, &mut self.buffer);

        let status = stream
            .stdin
            .write_all(&self.buffer[..byte_len(samples)])
            .and_then(|_| stream.stdin.flush());
        if let Err(err) = status {
            error!("Failed to write audio to sox stream: {}", err);
            self.close();
            return Err(err).context(WriteFailed);
        }
        Ok(())
    }

    fn close(&mut self) {
        self.state = DeviceState::Closed;
        // sox exits once its input is closed
        if let Some(Stream { mut child, stdin }) = self.stream.take() {
            drop(stdin);
            if let Err(err) = child.wait() {
                error!("sox did not exit cleanly: {}", err);
            }
        }
    }
}

impl Drop for SoxDevice {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suspended_devices_do_not_spawn() {
        let mut device = SoxDevice::new(44100.0, SoxTarget::File("unused.wav".into()));
        assert_eq!(device.state(), DeviceState::Suspended);
        // dropped silently while suspended
        device.write(&[Stereo::mono(0.1)]).unwrap();
        assert!(device.stream.is_none());
        device.close();
        assert!(matches!(device.resume(true), Err(DeviceError::Closed)));
    }
}
