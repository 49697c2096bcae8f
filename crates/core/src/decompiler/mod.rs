//! Decompiler adapters.
//!
//! The matching engine does not decompile anything itself; it consumes
//! artifacts produced by an external decompiler, one file per function named
//! `<binary_name>__<function_name>__<suffix...>`. This module defines the
//! trait boundary to that collaborator, a registry so frontends can select a
//! backend by name, and the shipped implementations.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod ghidra;
pub mod prebuilt;

pub use ghidra::GhidraDecompiler;
pub use prebuilt::PrebuiltDecompiler;

/// Error type for decompiler invocations.
#[derive(Debug, Error)]
pub enum DecompileError {
    #[error("Binary not found at {0}")]
    MissingBinary(PathBuf),

    #[error("Decompiler backend not found: {0}")]
    MissingBackend(String),

    #[error("Decompiler backend error: {0}")]
    Backend(String),
}

/// Trait implemented by decompiler backends (e.g., Ghidra headless).
///
/// Backends write one artifact file per discovered function into `out_dir`
/// and report nothing else; the caller owns artifact parsing.
pub trait Decompiler: Send + Sync {
    /// Decompile every function of one binary into `out_dir`.
    fn decompile_binary(&self, binary: &Path, out_dir: &Path) -> Result<(), DecompileError>;

    /// Decompile every binary in `binary_dir` into `out_dir`.
    ///
    /// The default walks the directory's regular files and decompiles each
    /// one. A failure on one binary is fatal for that binary only: the
    /// remaining binaries are still attempted, their artifacts stay in
    /// `out_dir`, and the per-binary failures are returned so the caller can
    /// report them. Only an unreadable `binary_dir` fails the whole call.
    fn decompile_all(
        &self,
        binary_dir: &Path,
        out_dir: &Path,
    ) -> Result<Vec<(PathBuf, DecompileError)>, DecompileError> {
        let entries = fs::read_dir(binary_dir)
            .map_err(|e| DecompileError::Backend(format!("{}: {e}", binary_dir.display())))?;

        let mut failures = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| DecompileError::Backend(format!("{}: {e}", binary_dir.display())))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Err(e) = self.decompile_binary(&path, out_dir) {
                failures.push((path, e));
            }
        }
        Ok(failures)
    }

    fn name(&self) -> &'static str;
}

/// Registry for decompiler backends; callers select by name.
#[derive(Default)]
pub struct DecompilerRegistry {
    backends: HashMap<String, Box<dyn Decompiler>>,
}

impl DecompilerRegistry {
    pub fn new() -> Self {
        Self { backends: HashMap::new() }
    }

    pub fn register<D: Decompiler + 'static>(&mut self, backend: D) -> &mut Self {
        self.backends.insert(backend.name().to_string(), Box::new(backend));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Decompiler> {
        self.backends.get(name).map(|b| &**b)
    }

    /// Return a sorted list of registered backend names for error messages/help.
    pub fn names(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.backends.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Registry populated with the shipped backends.
pub fn default_registry() -> DecompilerRegistry {
    let mut registry = DecompilerRegistry::new();
    registry.register(PrebuiltDecompiler);
    registry.register(GhidraDecompiler);
    registry
}
