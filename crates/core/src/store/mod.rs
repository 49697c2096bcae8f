//! Corpus snapshot persistence.
//!
//! The corpus is persisted as one JSON snapshot holding the full ordered
//! record sequence. There is no incremental encoding: the store loads the
//! whole file at construction time and rewrites the whole file after every
//! successful addition. Writes go through a temp file in the snapshot's
//! directory followed by a rename, so a crashed flush never leaves a
//! half-written snapshot behind.
//!
//! The store assumes a single process and single writer; concurrent writers
//! against the same snapshot path are undefined.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::{Corpus, FunctionRecord, VECTOR_DIM};

/// Error type for corpus snapshot operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The snapshot file exists but could not be read or decoded. Fatal: the
    /// caller should surface the offending path and abort rather than clobber
    /// a corpus it cannot interpret.
    #[error("Failed to load corpus snapshot at {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// Rewriting the snapshot failed. Recoverable: the in-memory append has
    /// already happened, so the caller may retry the flush or abort.
    #[error("Failed to persist corpus snapshot at {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `append_and_persist` was handed a record that never went through the
    /// embedding generator.
    #[error("Record {binary}::{function} has no vector; embed it before appending")]
    MissingVector { binary: String, function: String },

    /// The record's vector is not exactly [`VECTOR_DIM`] long.
    #[error(
        "Record {binary}::{function} has a vector of length {found}, expected {VECTOR_DIM}"
    )]
    WrongVectorLen { binary: String, function: String, found: usize },
}

/// Convenience result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Loads and rewrites the corpus snapshot at a fixed path.
#[derive(Debug, Clone)]
pub struct CorpusStore {
    path: PathBuf,
}

impl CorpusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the snapshot file this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted corpus.
    ///
    /// A missing snapshot is not an error: it means no corpus has been
    /// trained yet, and an empty corpus is returned. A snapshot that exists
    /// but cannot be decoded is a [`StoreError::Load`].
    pub fn load(&self) -> StoreResult<Corpus> {
        if !self.path.exists() {
            return Ok(Corpus::new());
        }

        let raw = fs::read_to_string(&self.path).map_err(|e| StoreError::Load {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| StoreError::Load {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Append an embedded record to the corpus and rewrite the snapshot.
    ///
    /// The record must already carry a vector of length [`VECTOR_DIM`].
    /// The append happens before the flush, so on [`StoreError::Persist`] the
    /// record is still visible to the current process and the caller decides
    /// whether to retry the flush or abort.
    pub fn append_and_persist(
        &self,
        corpus: &mut Corpus,
        record: FunctionRecord,
    ) -> StoreResult<()> {
        match &record.vector {
            None => {
                return Err(StoreError::MissingVector {
                    binary: record.binary_name,
                    function: record.function_name,
                })
            }
            Some(v) if v.len() != VECTOR_DIM => {
                return Err(StoreError::WrongVectorLen {
                    binary: record.binary_name,
                    function: record.function_name,
                    found: v.len(),
                })
            }
            Some(_) => {}
        }

        corpus.records.push(record);
        self.persist(corpus)
    }

    /// Rewrite the whole snapshot from the in-memory corpus.
    pub fn persist(&self, corpus: &Corpus) -> StoreResult<()> {
        let persist_err = |source| StoreError::Persist { path: self.path.clone(), source };

        let json = serde_json::to_string(corpus).map_err(|e| persist_err(e.into()))?;

        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = dir {
            fs::create_dir_all(dir).map_err(&persist_err)?;
        }

        let mut tmp = match dir {
            Some(dir) => tempfile::NamedTempFile::new_in(dir),
            None => tempfile::NamedTempFile::new_in("."),
        }
        .map_err(&persist_err)?;
        tmp.write_all(json.as_bytes()).map_err(&persist_err)?;
        tmp.persist(&self.path).map_err(|e| persist_err(e.error))?;
        Ok(())
    }
}
