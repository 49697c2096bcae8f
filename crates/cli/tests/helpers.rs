use std::fs;

use namesleuth::{is_elf, sha256_file, stage_binaries};
use tempfile::tempdir;

// Minimal ELF header prefix; enough for the magic check.
const ELF_MAGIC: &[u8] = b"\x7fELF\x01\x01\x01\x00";

#[test]
fn sha256_file_matches_known_digest() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("payload");
    fs::write(&path, "hello world").expect("write");

    let digest = sha256_file(&path).expect("hash");
    assert_eq!(digest, "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9");
}

#[test]
fn is_elf_recognizes_magic_and_rejects_others() {
    let dir = tempdir().expect("tempdir");

    let elf = dir.path().join("prog");
    fs::write(&elf, ELF_MAGIC).expect("write elf");
    assert!(is_elf(&elf).expect("check elf"));

    let text = dir.path().join("notes.txt");
    fs::write(&text, "just text").expect("write text");
    assert!(!is_elf(&text).expect("check text"));

    let tiny = dir.path().join("tiny");
    fs::write(&tiny, "ab").expect("write tiny");
    assert!(!is_elf(&tiny).expect("check tiny"));
}

#[test]
fn stage_binaries_copies_named_elves_with_hash_suffix() {
    let source = tempdir().expect("source");
    let nested = source.path().join("firmware/rootfs/usr/bin");
    fs::create_dir_all(&nested).expect("nested dirs");

    // Wanted name, is an ELF: staged.
    fs::write(nested.join("bmminer"), ELF_MAGIC).expect("write bmminer");
    // Wanted name, not an ELF: ignored.
    fs::write(source.path().join("cgminer"), "#!/bin/sh\nexit 0\n").expect("write script");
    // ELF but not a wanted name: ignored.
    fs::write(nested.join("dropbear"), ELF_MAGIC).expect("write dropbear");

    let dest = tempdir().expect("dest");
    let staged = stage_binaries(
        source.path(),
        &["bmminer".to_string(), "cgminer".to_string()],
        dest.path(),
    )
    .expect("stage");

    assert_eq!(staged.len(), 1);
    let file_name = staged[0].file_name().and_then(|n| n.to_str()).expect("name");
    assert!(file_name.starts_with("bmminer_"), "got {file_name}");
    // Name carries the full sha256 hex digest.
    assert_eq!(file_name.len(), "bmminer_".len() + 64);
    assert!(staged[0].is_file());
}

#[test]
fn stage_binaries_with_no_matches_stages_nothing() {
    let source = tempdir().expect("source");
    let dest = tempdir().expect("dest");
    let staged =
        stage_binaries(source.path(), &["bmminer".to_string()], dest.path()).expect("stage");
    assert!(staged.is_empty());
}
