//! Helper library for the `namesleuth` CLI.
//!
//! Substantive matching logic lives in `sleuth-core`; this crate only carries
//! the argument surface and the small filesystem utilities it needs, kept in a
//! library so they are unit-testable.

use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of a file and return it as a hex string.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open binary for hashing: {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("Failed to read binary for hashing: {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    let digest = hasher.finalize();
    Ok(format!("{:x}", digest))
}

/// True when the file starts with the ELF magic bytes.
///
/// The staging workflow only wants native executables; this is a cheap filter
/// that avoids shelling out to `file(1)`.
pub fn is_elf(path: &Path) -> Result<bool> {
    let mut file = fs::File::open(path)
        .with_context(|| format!("Failed to open file for type check: {}", path.display()))?;
    let mut magic = [0u8; 4];
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(&magic == b"\x7fELF"),
        // Shorter than four bytes: certainly not an ELF.
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => {
            Err(e).with_context(|| format!("Failed to read file header: {}", path.display()))
        }
    }
}

/// Find ELF binaries with one of the wanted names under `source` (recursive)
/// and copy each into `dest` as `<name>_<sha256>` so identical names from
/// different firmware images never collide. Returns the staged paths.
pub fn stage_binaries(source: &Path, names: &[String], dest: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create staging dir: {}", dest.display()))?;

    let mut staged = Vec::new();
    let mut pending = vec![source.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir)
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
        for entry in entries {
            let entry = entry
                .with_context(|| format!("Failed to read directory entry in {}", dir.display()))?;
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }

            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !names.iter().any(|n| n == file_name) {
                continue;
            }
            if !is_elf(&path)? {
                continue;
            }

            let hash = sha256_file(&path)?;
            let target = dest.join(format!("{file_name}_{hash}"));
            fs::copy(&path, &target).with_context(|| {
                format!("Failed to copy {} to {}", path.display(), target.display())
            })?;
            staged.push(target);
        }
    }

    staged.sort();
    Ok(staged)
}
