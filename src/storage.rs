// ocarina-tutor -- fingering tutor and practice synthesizer for the 12-hole ocarina
// Copyright (C) 2024  The ocarina-tutor authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Persisted settings, progress and practice history.
//!
//! Every blob is JSON stored under a fixed key. Reading never fails: missing or
//! corrupt blobs are logged and replaced by defaults.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, error, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

use crate::songbook::Difficulty;

pub const SETTINGS_KEY: &str = "ocarina_settings";
pub const PROGRESS_KEY: &str = "ocarina_user_progress";
pub const HISTORY_KEY: &str = "ocarina_practice_history";

#[derive(Debug, Snafu)]
pub enum StoreError {
    #[snafu(display("Could not access {:?}: {}", key, source))]
    Io { key: String, source: io::Error },
    #[snafu(display("Could not create {}: {}", path.display(), source))]
    CreateDir { path: PathBuf, source: io::Error },
    #[snafu(display("Stored {:?} is not valid: {}", key, source))]
    Json {
        key: String,
        source: serde_json::Error,
    },
}

/// String blobs by key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path(key)) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).context(Io { key }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).context(CreateDir { path: &self.dir })?;
        fs::write(self.path(key), value).context(Io { key })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path(key)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err).context(Io { key }),
            _ => Ok(()),
        }
    }
}

/// Keeps the blobs in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub theme: Theme,
    /// Master volume, 0 to 1.
    pub volume: f64,
    pub metronome_sound: bool,
    pub auto_play: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            theme: Theme::Light,
            volume: 0.3,
            metronome_sound: true,
            auto_play: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProgress {
    pub level: Difficulty,
    /// Ids of songs played to the end, without duplicates.
    pub completed_songs: Vec<String>,
    /// Milliseconds.
    pub total_practice_time: u64,
    /// Percent.
    pub accuracy: u32,
    pub name: String,
}

impl Default for UserProgress {
    fn default() -> Self {
        UserProgress {
            level: Difficulty::Beginner,
            completed_songs: Vec::new(),
            total_practice_time: 0,
            accuracy: 85,
            name: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeRecord {
    pub song_id: String,
    /// Seconds since the unix epoch.
    pub date: u64,
    /// Milliseconds.
    pub duration: u64,
    pub completed: bool,
}

/// The learner's persisted state on top of a store.
pub struct Profile<S> {
    store: S,
    settings: Settings,
    progress: UserProgress,
    history: Vec<PracticeRecord>,
}

impl<S: KeyValueStore> Profile<S> {
    /// Read everything from `store`, falling back to defaults.
    pub fn load(store: S) -> Self {
        let settings = load_or_default(&store, SETTINGS_KEY);
        let progress = load_or_default(&store, PROGRESS_KEY);
        let history: Vec<PracticeRecord> = load_or_default(&store, HISTORY_KEY);
        debug!("loaded profile with {} practice records", history.len());
        Profile {
            store,
            settings,
            progress,
            history,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn progress(&self) -> &UserProgress {
        &self.progress
    }

    pub fn history(&self) -> &[PracticeRecord] {
        &self.history
    }

    /// Change the settings and persist them.
    pub fn update_settings(&mut self, update: impl FnOnce(&mut Settings)) {
        update(&mut self.settings);
        self.settings.volume = self.settings.volume.max(0.0).min(1.0);
        persist(&mut self.store, SETTINGS_KEY, &self.settings);
    }

    pub fn update_progress(&mut self, update: impl FnOnce(&mut UserProgress)) {
        update(&mut self.progress);
        persist(&mut self.store, PROGRESS_KEY, &self.progress);
    }

    /// Append to the practice history and persist it.
    pub fn record_practice(&mut self, record: PracticeRecord) {
        debug!(
            "practiced {} for {} ms",
            record.song_id, record.duration
        );
        self.history.push(record);
        persist(&mut self.store, HISTORY_KEY, &self.history);
    }

    /// Remember a song as played to the end, adding to the total practice time.
    pub fn mark_completed(&mut self, song_id: &str, practice_ms: u64) {
        self.update_progress(|progress| {
            if !progress.completed_songs.iter().any(|id| id == song_id) {
                progress.completed_songs.push(song_id.to_string());
            }
            progress.total_practice_time += practice_ms;
        });
    }
}

fn load_or_default<S: KeyValueStore, T: DeserializeOwned + Default>(store: &S, key: &str) -> T {
    let parsed = store.get(key).and_then(|text| match text {
        Some(text) => serde_json::from_str(&text).context(Json { key }).map(Some),
        None => Ok(None),
    });
    match parsed {
        Ok(Some(value)) => value,
        Ok(None) => {
            debug!("nothing stored for {:?}, using defaults", key);
            T::default()
        }
        Err(err) => {
            warn!("{}, using defaults", err);
            T::default()
        }
    }
}

fn persist<S: KeyValueStore, T: Serialize>(store: &mut S, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .context(Json { key })
        .and_then(|text| store.set(key, &text));
    if let Err(err) = result {
        error!("failed to save {:?}: {}", key, err);
    }
}
