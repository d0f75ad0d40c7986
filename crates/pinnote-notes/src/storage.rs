//! JSON file persistence for the note list.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::note::Note;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read or write the notes file: {0}")]
    Io(#[from] io::Error),
    #[error("notes file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reads and writes the whole note list as one JSON document. A missing
/// file is an empty list, never an error.
#[derive(Debug, Clone)]
pub struct NoteStore {
    path: PathBuf,
}

impl NoteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<Note>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no notes file yet");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };
        let notes: Vec<Note> = serde_json::from_str(&raw)?;
        tracing::debug!(count = notes.len(), "loaded notes");
        Ok(notes)
    }

    pub fn save(&self, notes: &[Note]) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(notes)?;
        fs::write(&self.path, json)?;
        tracing::debug!(count = notes.len(), "saved notes");
        Ok(())
    }
}
