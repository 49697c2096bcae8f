//! Backend for artifacts that already exist on disk.
//!
//! Useful when functions were decompiled out-of-band (or checked in as
//! fixtures): no decompiler needs to be installed, the "decompilation" is a
//! copy of existing artifact files into the requested output directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::decompiler::{DecompileError, Decompiler};
use crate::extract;

/// Serves pre-decompiled artifacts.
///
/// - A directory target: every file inside whose name parses as an artifact
///   (`<binary>__<function>__...`) is copied into `out_dir`.
/// - A file target: treated as a binary whose artifacts live next to it as
///   `<file_stem>__*` siblings; those are copied instead.
pub struct PrebuiltDecompiler;

impl PrebuiltDecompiler {
    fn copy_artifacts(
        &self,
        source_dir: &Path,
        out_dir: &Path,
        prefix: Option<&str>,
    ) -> Result<usize, DecompileError> {
        let backend_err =
            |e: std::io::Error| DecompileError::Backend(format!("{}: {e}", source_dir.display()));

        let mut copied = 0;
        for entry in fs::read_dir(source_dir).map_err(backend_err)? {
            let entry = entry.map_err(backend_err)?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(parsed) = extract::parse_artifact_name(file_name) else {
                continue;
            };
            if let Some(prefix) = prefix {
                if parsed.binary_name != prefix {
                    continue;
                }
            }
            fs::copy(&path, out_dir.join(file_name)).map_err(backend_err)?;
            copied += 1;
        }
        Ok(copied)
    }
}

impl Decompiler for PrebuiltDecompiler {
    fn decompile_binary(&self, binary: &Path, out_dir: &Path) -> Result<(), DecompileError> {
        if binary.is_dir() {
            self.copy_artifacts(binary, out_dir, None)?;
            return Ok(());
        }
        if !binary.is_file() {
            return Err(DecompileError::MissingBinary(binary.to_path_buf()));
        }

        let stem = binary
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| DecompileError::MissingBinary(binary.to_path_buf()))?;
        let parent = binary.parent().unwrap_or_else(|| Path::new("."));

        let copied = self.copy_artifacts(parent, out_dir, Some(stem))?;
        if copied == 0 {
            return Err(DecompileError::Backend(format!(
                "no prebuilt artifacts named {stem}__* next to {}",
                binary.display()
            )));
        }
        Ok(())
    }

    /// A directory handed to the prebuilt backend already *is* the artifact
    /// set, so the default walk-and-decompile-each-file behavior would
    /// misread artifacts as binaries.
    fn decompile_all(
        &self,
        binary_dir: &Path,
        out_dir: &Path,
    ) -> Result<Vec<(PathBuf, DecompileError)>, DecompileError> {
        self.copy_artifacts(binary_dir, out_dir, None)?;
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "prebuilt"
    }
}
