//! JSON files on disk.
//!
//! Layout under a data directory:
//!
//! ```text
//! <root>/players/<uuid>.json   one per player
//! <root>/specials-data.json    server locks
//! ```
//!
//! Loading is lenient: a bad file is skipped with a warning and the rest
//! load. Saving writes every file it can and reports the ones it could not.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::core::PlayerId;
use crate::engine::{ProgressionHost, TriggerEngine};
use crate::record::{BonusRecord, GlobalLocks};

use super::record_file::{GlobalFile, PlayerFile};

/// Persistence failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not create directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not encode specials data")]
    Encode(#[source] serde_json::Error),

    #[error("player file name is not a uuid: {}", path.display())]
    InvalidFileName { path: PathBuf },

    #[error("snapshot codec failed")]
    Snapshot(#[from] bincode::Error),
}

/// Per-player and global JSON files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsonStore {
    players_dir: PathBuf,
    global_file: PathBuf,
}

impl JsonStore {
    /// Store rooted at a data directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            players_dir: root.join("players"),
            global_file: root.join("specials-data.json"),
        }
    }

    /// Store with explicit locations.
    pub fn with_paths(players_dir: impl Into<PathBuf>, global_file: impl Into<PathBuf>) -> Self {
        Self {
            players_dir: players_dir.into(),
            global_file: global_file.into(),
        }
    }

    #[must_use]
    pub fn players_dir(&self) -> &Path {
        &self.players_dir
    }

    #[must_use]
    pub fn global_file(&self) -> &Path {
        &self.global_file
    }

    /// Path of one player's file.
    #[must_use]
    pub fn player_path(&self, player: PlayerId) -> PathBuf {
        self.players_dir.join(format!("{player}.json"))
    }

    /// Load every player record.
    ///
    /// A missing directory yields no records. Files that are not `.json` are
    /// ignored; files with a non-uuid name or unreadable content are skipped
    /// with a warning.
    pub fn load_records(&self) -> Result<FxHashMap<PlayerId, BonusRecord>, StoreError> {
        let mut records = FxHashMap::default();
        if !self.players_dir.is_dir() {
            return Ok(records);
        }

        let entries = fs::read_dir(&self.players_dir).map_err(|source| StoreError::Read {
            path: self.players_dir.clone(),
            source,
        })?;

        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(err) => {
                    warn!("Skipping unreadable entry in {}: {err}", self.players_dir.display());
                    continue;
                }
            };
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            match Self::load_player(&path) {
                Ok((player, record)) => {
                    records.insert(player, record);
                }
                Err(err) => warn!("{err}"),
            }
        }

        info!("Loaded specials data for {} players", records.len());
        Ok(records)
    }

    fn load_player(path: &Path) -> Result<(PlayerId, BonusRecord), StoreError> {
        let player = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse::<PlayerId>().ok())
            .ok_or_else(|| StoreError::InvalidFileName {
                path: path.to_path_buf(),
            })?;

        let text = fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: PlayerFile = serde_json::from_str(&text).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        Ok((player, file.into_record(player)))
    }

    /// Write one file per player.
    ///
    /// Returns the failures; each is also logged.
    pub fn save_records<'a>(
        &self,
        records: impl IntoIterator<Item = (PlayerId, &'a BonusRecord)>,
    ) -> Vec<StoreError> {
        if let Err(source) = fs::create_dir_all(&self.players_dir) {
            let err = StoreError::CreateDir {
                path: self.players_dir.clone(),
                source,
            };
            warn!("{err}");
            return vec![err];
        }

        let mut failures = Vec::new();
        for (player, record) in records {
            let path = self.player_path(player);
            if let Err(err) = write_json(&path, &PlayerFile::from_record(record)) {
                warn!("Could not save specials data for {player}: {err}");
                failures.push(err);
            }
        }
        failures
    }

    /// Load the server locks. A missing file yields no locks.
    pub fn load_locks(&self) -> Result<GlobalLocks, StoreError> {
        if !self.global_file.exists() {
            return Ok(GlobalLocks::new());
        }
        let text = fs::read_to_string(&self.global_file).map_err(|source| StoreError::Read {
            path: self.global_file.clone(),
            source,
        })?;
        let file: GlobalFile = serde_json::from_str(&text).map_err(|source| StoreError::Parse {
            path: self.global_file.clone(),
            source,
        })?;
        Ok(file.into_locks())
    }

    /// Write the server locks.
    pub fn save_locks(&self, locks: &GlobalLocks) -> Result<(), StoreError> {
        if let Some(parent) = self.global_file.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        write_json(&self.global_file, &GlobalFile::from_locks(locks))
    }

    /// Load records and locks into an engine, replacing its state.
    ///
    /// Fails without touching the engine when the global file is unreadable,
    /// since saving over it would drop every server lock.
    pub fn load_into<H: ProgressionHost>(&self, engine: &mut TriggerEngine<H>) -> Result<(), StoreError> {
        let locks = self.load_locks()?;
        let records = self.load_records()?;
        engine.restore(records, locks);
        Ok(())
    }

    /// Save an engine's records and locks. Returns every failure.
    pub fn save_engine<H: ProgressionHost>(&self, engine: &TriggerEngine<H>) -> Vec<StoreError> {
        let mut failures = self.save_records(engine.records());
        if let Err(err) = self.save_locks(engine.locks()) {
            warn!("Could not save specials-data: {err}");
            failures.push(err);
        }
        failures
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let text = serde_json::to_string_pretty(value).map_err(StoreError::Encode)?;
    fs::write(path, text).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}
