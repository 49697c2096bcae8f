//! Ghidra headless decompiler backend.
//!
//! Runs `analyzeHeadless` against one binary with a generated post-script
//! that dumps each function's decompilation to its own artifact file. Every
//! invocation uses a throwaway project directory, so no Ghidra state leaks
//! between binaries.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::decompiler::{DecompileError, Decompiler};

/// Post-script executed inside Ghidra's headless analyzer. Receives the
/// artifact output directory as its single argument and writes one file per
/// function, named `<binary>__<function>__<epoch>`.
const DUMP_SCRIPT: &str = r#"# Dump every function's decompilation to one file per function.
# @category: Sleuth
import os
import time

from ghidra.app.decompiler import DecompInterface

args = getScriptArgs()
out_dir = args[0]

decomp = DecompInterface()
decomp.openProgram(currentProgram)

binary_name = currentProgram.getName()
epoch = int(time.time())

for function in currentProgram.getFunctionManager().getFunctions(True):
    results = decomp.decompileFunction(function, 30, monitor)
    if not results.decompileCompleted():
        continue
    text = results.getDecompiledFunction().getC()
    name = "%s__%s__%d" % (binary_name, function.getName(), epoch)
    with open(os.path.join(out_dir, name), "w") as handle:
        handle.write(text)
"#;

/// Resolve the analyzeHeadless executable path from environment variables.
///
/// Precedence:
/// - `GHIDRA_ANALYZE_HEADLESS` pointing directly to the executable.
/// - `GHIDRA_INSTALL_DIR`, appended with the platform-specific name.
fn resolve_headless_path() -> Result<PathBuf, String> {
    if let Ok(p) = env::var("GHIDRA_ANALYZE_HEADLESS") {
        let path = PathBuf::from(p);
        if path.is_file() {
            return Ok(path);
        }
    }

    if let Ok(dir) = env::var("GHIDRA_INSTALL_DIR") {
        let mut p = PathBuf::from(dir);
        if cfg!(windows) {
            p = p.join("analyzeHeadless.bat");
        } else {
            p = p.join("analyzeHeadless");
        }
        if p.is_file() {
            return Ok(p);
        }
    }

    Err("Set GHIDRA_ANALYZE_HEADLESS (path to analyzeHeadless) or GHIDRA_INSTALL_DIR".to_string())
}

/// Ghidra headless backend: imports the binary into a scratch project and
/// dumps per-function decompilation artifacts via [`DUMP_SCRIPT`].
pub struct GhidraDecompiler;

impl Decompiler for GhidraDecompiler {
    fn decompile_binary(&self, binary: &Path, out_dir: &Path) -> Result<(), DecompileError> {
        if !binary.is_file() {
            return Err(DecompileError::MissingBinary(binary.to_path_buf()));
        }

        let headless = resolve_headless_path().map_err(DecompileError::Backend)?;

        let scratch = tempfile::tempdir()
            .map_err(|e| DecompileError::Backend(format!("scratch dir: {e}")))?;
        let script_path = scratch.path().join("sleuth_dump_functions.py");
        fs::write(&script_path, DUMP_SCRIPT)
            .map_err(|e| DecompileError::Backend(format!("write post-script: {e}")))?;

        let output = Command::new(&headless)
            .arg(scratch.path())
            .arg("sleuth_scratch")
            .arg("-import")
            .arg(binary)
            .arg("-scriptPath")
            .arg(scratch.path())
            .arg("-postScript")
            .arg("sleuth_dump_functions.py")
            .arg(out_dir)
            .arg("-deleteProject")
            .output()
            .map_err(|e| DecompileError::Backend(format!("failed to spawn analyzeHeadless: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DecompileError::Backend(format!(
                "analyzeHeadless exited with {} for {}: {}",
                output.status,
                binary.display(),
                stderr.trim()
            )));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ghidra"
    }
}
