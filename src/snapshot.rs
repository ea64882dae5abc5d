//! JSON snapshots of intermediate state shared between pipeline stages.
//!
//! The analysis commands run as independent batch jobs; author-to-texts maps
//! and metric tables produced by one stage are reloaded by the next from a
//! snapshot directory, one JSON file per named object.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub struct Snapshots {
    dir: PathBuf,
}

impl Snapshots {
    /// Opens (and creates if needed) a snapshot directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, String> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| format!("Create snapshot dir {} failed: {e}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Path of the snapshot file backing `name`.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Serializes `value` under `name`, replacing any previous snapshot.
    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf, String> {
        let path = self.path(name);
        let file =
            File::create(&path).map_err(|e| format!("Create {} failed: {e}", path.display()))?;
        serde_json::to_writer(BufWriter::new(file), value)
            .map_err(|e| format!("Write {} failed: {e}", path.display()))?;
        Ok(path)
    }

    /// Loads the snapshot saved under `name`.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T, String> {
        let path = self.path(name);
        let file = File::open(&path).map_err(|e| format!("Open {} failed: {e}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| format!("Read {} failed: {e}", path.display()))
    }
}
