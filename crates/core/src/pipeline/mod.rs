//! The matching pipeline: decompile, filter, embed, grow the corpus, query.
//!
//! This is the coordinator the frontends drive. It owns the corpus store and
//! the embedder, talks to a [`Decompiler`] for anything that needs artifacts
//! produced, and implements the three workflows: training, single-function
//! query, and whole-binary rename mapping.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::decompiler::{DecompileError, Decompiler};
use crate::embedding::Embedder;
use crate::extract;
use crate::matcher::{self, Scored};
use crate::model::{Corpus, FunctionRecord};
use crate::store::{CorpusStore, StoreError};

/// Default number of matches reported by a single-function query.
pub const DEFAULT_TOP_K: usize = 10;

/// Error type for pipeline workflows.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Decompile(#[from] DecompileError),

    #[error("Failed to read query file {path}: {source}")]
    QueryFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What happened during one training run.
///
/// Skips are expected, not errors: the pipeline filters decompiler-synthesized
/// names and empty bodies out of the corpus by design. Failures are isolated
/// per artifact or per folder so one bad file never aborts a batch; the
/// frontend decides how loudly to report them.
#[derive(Debug, Default, Serialize)]
pub struct TrainingSummary {
    /// Records embedded, appended, and persisted.
    pub learned: usize,
    /// Artifacts skipped because the function name was decompiler-synthesized.
    pub skipped_unnamed: Vec<String>,
    /// Artifacts skipped because no code could be extracted.
    pub skipped_empty: Vec<String>,
    /// Per-artifact or per-folder failures, as (path, reason) pairs.
    pub failures: Vec<(PathBuf, String)>,
}

/// Result of a single-function query.
#[derive(Debug, Serialize)]
pub enum QueryOutcome {
    /// The closest corpus records, ascending by distance, at most `k` of them.
    Matches(Vec<Scored>),
    /// The query file yielded no usable code; nothing to rank.
    NoResult,
}

/// Best-guess identity for one unnamed function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameTarget {
    pub function_name: String,
    pub binary_name: String,
}

/// Whole-binary query output: unnamed function name → best corpus match.
pub type RenameMap = BTreeMap<String, RenameTarget>;

/// Drives the embed, store, and match stages against one corpus snapshot.
pub struct MatchPipeline {
    store: CorpusStore,
    embedder: Embedder,
}

impl MatchPipeline {
    /// Pipeline over the corpus snapshot at `snapshot_path`.
    pub fn new(snapshot_path: impl Into<PathBuf>) -> Self {
        Self { store: CorpusStore::new(snapshot_path), embedder: Embedder::new() }
    }

    pub fn store(&self) -> &CorpusStore {
        &self.store
    }

    /// Train (or extend training of) the corpus from folders of binaries.
    ///
    /// Each folder is decompiled into a scratch directory; every artifact with
    /// a known (non-synthesized) function name and a non-empty body is
    /// embedded and appended to the corpus, with the snapshot rewritten after
    /// each addition. A binary that fails to decompile is recorded in the
    /// summary and costs only its own functions: artifacts the rest of the
    /// folder produced are still learned, and the remaining folders are still
    /// attempted.
    pub fn train(
        &self,
        decompiler: &dyn Decompiler,
        folders: &[PathBuf],
    ) -> Result<TrainingSummary, PipelineError> {
        let mut corpus = self.store.load()?;
        let mut summary = TrainingSummary::default();

        for folder in folders {
            let scratch = match tempfile::tempdir() {
                Ok(d) => d,
                Err(e) => {
                    summary.failures.push((folder.clone(), format!("scratch dir: {e}")));
                    continue;
                }
            };

            match decompiler.decompile_all(folder, scratch.path()) {
                Ok(binary_failures) => {
                    for (binary, error) in binary_failures {
                        summary.failures.push((binary, error.to_string()));
                    }
                }
                Err(e) => {
                    summary.failures.push((folder.clone(), e.to_string()));
                    continue;
                }
            }

            let artifacts = match sorted_artifact_paths(scratch.path()) {
                Ok(paths) => paths,
                Err(e) => {
                    summary.failures.push((folder.clone(), e.to_string()));
                    continue;
                }
            };
            for artifact in artifacts {
                self.learn_artifact(&artifact, &mut corpus, &mut summary)?;
            }
        }

        Ok(summary)
    }

    /// Embed and learn one artifact, or record why it was skipped.
    ///
    /// Only store errors propagate: a snapshot that cannot be loaded or
    /// rewritten is fatal, while a single unreadable artifact is not.
    fn learn_artifact(
        &self,
        artifact: &Path,
        corpus: &mut Corpus,
        summary: &mut TrainingSummary,
    ) -> Result<(), PipelineError> {
        let file_name = match artifact.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_string(),
            None => return Ok(()),
        };

        let Some(identity) = extract::parse_artifact_name(&file_name) else {
            summary.failures.push((artifact.to_path_buf(), "unparseable artifact name".into()));
            return Ok(());
        };

        // The corpus must only contain known-name functions; learning from
        // synthesized names would pollute the reference set with meaningless
        // labels.
        if extract::is_unnamed(&identity.function_name) {
            summary.skipped_unnamed.push(file_name);
            return Ok(());
        }

        let text = match fs::read_to_string(artifact) {
            Ok(t) => t,
            Err(e) => {
                summary.failures.push((artifact.to_path_buf(), e.to_string()));
                return Ok(());
            }
        };

        let mut record = FunctionRecord::new(
            identity.binary_name,
            identity.function_name,
            extract::split_lines(extract::extract_body(&text)),
        );
        if record.is_empty_code() {
            summary.skipped_empty.push(file_name);
            return Ok(());
        }

        record.vector = Some(self.embedder.embed(&record.code));
        record.learned_at = Some(Utc::now().to_rfc3339());
        self.store.append_and_persist(corpus, record)?;
        summary.learned += 1;
        Ok(())
    }

    /// Rank the corpus against one decompiled function file.
    ///
    /// Returns at most `k` matches, closest first. A file yielding no code
    /// lines produces the [`QueryOutcome::NoResult`] sentinel rather than an
    /// error.
    pub fn query_function(&self, file: &Path, k: usize) -> Result<QueryOutcome, PipelineError> {
        let corpus = self.store.load()?;
        self.query_against(&corpus, file, k)
    }

    /// Build a rename map for every unnamed function in `binary`.
    ///
    /// The binary is decompiled; each artifact whose function name is
    /// decompiler-synthesized is queried with k = 1 and its best match
    /// recorded. Functions with no usable match are omitted, not errors.
    pub fn query_binary(
        &self,
        decompiler: &dyn Decompiler,
        binary: &Path,
    ) -> Result<RenameMap, PipelineError> {
        let corpus = self.store.load()?;
        let scratch = tempfile::tempdir()
            .map_err(|e| DecompileError::Backend(format!("scratch dir: {e}")))?;
        decompiler.decompile_binary(binary, scratch.path())?;

        let artifacts = sorted_artifact_paths(scratch.path())
            .map_err(|e| DecompileError::Backend(format!("{}: {e}", scratch.path().display())))?;

        let mut map = RenameMap::new();
        for artifact in artifacts {
            let Some(file_name) = artifact.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(identity) = extract::parse_artifact_name(file_name) else {
                continue;
            };
            if !extract::is_unnamed(&identity.function_name) {
                continue;
            }

            let outcome = match self.query_against(&corpus, &artifact, 1) {
                Ok(o) => o,
                // Unreadable artifact: skip it, keep mapping the rest.
                Err(PipelineError::QueryFile { .. }) => continue,
                Err(e) => return Err(e),
            };
            if let QueryOutcome::Matches(matches) = outcome {
                if let Some(best) = matches.first() {
                    map.insert(
                        identity.function_name,
                        RenameTarget {
                            function_name: best.record.function_name.clone(),
                            binary_name: best.record.binary_name.clone(),
                        },
                    );
                }
            }
        }
        Ok(map)
    }

    fn query_against(
        &self,
        corpus: &Corpus,
        file: &Path,
        k: usize,
    ) -> Result<QueryOutcome, PipelineError> {
        let text = fs::read_to_string(file)
            .map_err(|e| PipelineError::QueryFile { path: file.to_path_buf(), source: e })?;
        let lines = extract::split_lines(extract::extract_body(&text));
        if lines.iter().all(|line| line.trim().is_empty()) {
            return Ok(QueryOutcome::NoResult);
        }

        let vector = self.embedder.embed(&lines);
        let mut ranked = matcher::rank(corpus, &vector);
        ranked.truncate(k);
        Ok(QueryOutcome::Matches(ranked))
    }
}

/// Collect artifact file paths under `dir`, sorted by file name so training
/// order (and therefore corpus order) is reproducible.
fn sorted_artifact_paths(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();
    Ok(paths)
}
