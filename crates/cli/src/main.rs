use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use namesleuth::stage_binaries;
use serde::Serialize;
use sleuth_core::decompiler::{default_registry, Decompiler, DecompilerRegistry};
use sleuth_core::matcher::Scored;
use sleuth_core::pipeline::{MatchPipeline, QueryOutcome, DEFAULT_TOP_K};

/// Stripped-function name recovery CLI.
///
/// This CLI is a thin wrapper around `sleuth-core` (exposed in code as
/// `sleuth_core`). All substantive logic lives in the library so it can be
/// tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "namesleuth",
    version,
    about = "Recover probable names for stripped binary functions",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train (or extend) the corpus from folders of binaries.
    ///
    /// Each folder is decompiled one binary at a time; every function with a
    /// recovered (non-synthesized) name and a non-empty body is embedded and
    /// added to the corpus. The snapshot is rewritten after each addition.
    Train {
        /// Path to the corpus snapshot to create or extend.
        #[arg(long)]
        model: String,

        /// Decompiler backend to use.
        #[arg(long, default_value = "ghidra")]
        backend: String,

        /// Folders containing binaries to learn from.
        #[arg(required = true)]
        folders: Vec<String>,
    },

    /// Rank the corpus against one decompiled function file.
    QueryFunction {
        /// Path to the corpus snapshot.
        #[arg(long)]
        model: String,

        /// Number of closest matches to report.
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top: usize,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Path to a decompiled function file.
        file: String,
    },

    /// Decompile a binary and map each unnamed function to its best-known name.
    QueryBinary {
        /// Path to the corpus snapshot.
        #[arg(long)]
        model: String,

        /// Decompiler backend to use.
        #[arg(long, default_value = "ghidra")]
        backend: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Path to the binary to analyze.
        binary: String,
    },

    /// Stage named ELF binaries from source trees into one analysis folder.
    ///
    /// Files are copied as `<name>_<sha256>` so identically named binaries
    /// from different firmware images never collide.
    Stage {
        /// Directory to copy the staged binaries into.
        #[arg(long)]
        dest: String,

        /// Binary names to look for (repeatable).
        #[arg(long = "name", required = true)]
        names: Vec<String>,

        /// Source directories to search recursively.
        #[arg(required = true)]
        sources: Vec<String>,
    },
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Command::Train { model, backend, folders } => train_command(&model, &backend, &folders),
        Command::QueryFunction { model, top, json, file } => {
            query_function_command(&model, top, json, &file)
        }
        Command::QueryBinary { model, backend, json, binary } => {
            query_binary_command(&model, &backend, json, &binary)
        }
        Command::Stage { dest, names, sources } => stage_command(&dest, &names, &sources),
    }
}

/// Look up a decompiler backend by name, with a helpful error listing the
/// registered ones.
fn resolve_backend<'a>(
    registry: &'a DecompilerRegistry,
    name: &str,
) -> Result<&'a dyn Decompiler> {
    registry.get(name).ok_or_else(|| {
        anyhow!("Unknown backend '{name}'. Available backends: {}", registry.names().join(", "))
    })
}

fn train_command(model: &str, backend: &str, folders: &[String]) -> Result<()> {
    let registry = default_registry();
    let decompiler = resolve_backend(&registry, backend)?;

    let folder_paths: Vec<PathBuf> = folders.iter().map(PathBuf::from).collect();
    for folder in &folder_paths {
        if !folder.exists() {
            return Err(anyhow!("Training folder does not exist: {}", folder.display()));
        }
    }

    let pipeline = MatchPipeline::new(model);
    let summary = pipeline.train(decompiler, &folder_paths)?;

    for name in &summary.skipped_unnamed {
        eprintln!("skipped (unnamed function): {name}");
    }
    for name in &summary.skipped_empty {
        eprintln!("skipped (no extractable code): {name}");
    }
    for (path, reason) in &summary.failures {
        eprintln!("failed: {}: {reason}", path.display());
    }

    println!(
        "Learned {} function(s) ({} unnamed skipped, {} empty skipped, {} failure(s)).",
        summary.learned,
        summary.skipped_unnamed.len(),
        summary.skipped_empty.len(),
        summary.failures.len()
    );
    println!("Corpus snapshot: {}", pipeline.store().path().display());
    Ok(())
}

/// Flat report row for one match, for both text and JSON output.
#[derive(Debug, Serialize)]
struct MatchReport {
    function_name: String,
    binary_name: String,
    distance: f32,
    indeterminate: bool,
}

impl From<&Scored> for MatchReport {
    fn from(scored: &Scored) -> Self {
        Self {
            function_name: scored.record.function_name.clone(),
            binary_name: scored.record.binary_name.clone(),
            distance: scored.distance.value(),
            indeterminate: scored.distance.is_indeterminate(),
        }
    }
}

/// The store treats a missing snapshot as an empty corpus so that training
/// can bootstrap one; for queries a missing snapshot is a user error (likely
/// a mistyped path) and must fail loudly instead of reporting zero matches.
fn require_model(model: &str) -> Result<()> {
    let path = Path::new(model);
    if !path.is_file() {
        return Err(anyhow!(
            "Model snapshot at '{}' does not exist; train a corpus first with the 'train' command",
            path.display()
        ));
    }
    Ok(())
}

fn query_function_command(model: &str, top: usize, json: bool, file: &str) -> Result<()> {
    let file_path = Path::new(file);
    if !file_path.is_file() {
        return Err(anyhow!(
            "Provided function file '{}' is not a file or does not exist; provide a decompiled \
             function file",
            file_path.display()
        ));
    }
    require_model(model)?;

    let pipeline = MatchPipeline::new(model);
    match pipeline.query_function(file_path, top)? {
        QueryOutcome::NoResult => {
            if json {
                println!("null");
            } else {
                println!("no result: the file yielded no usable code");
            }
        }
        QueryOutcome::Matches(matches) => {
            let reports: Vec<MatchReport> = matches.iter().map(MatchReport::from).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else if reports.is_empty() {
                println!("no matches: the corpus is empty");
            } else {
                for (i, report) in reports.iter().enumerate() {
                    let marker = if report.indeterminate { " (indeterminate)" } else { "" };
                    println!(
                        "{:>3}. {}  [{}]  distance {:.6}{marker}",
                        i + 1,
                        report.function_name,
                        report.binary_name,
                        report.distance
                    );
                }
            }
        }
    }
    Ok(())
}

fn query_binary_command(model: &str, backend: &str, json: bool, binary: &str) -> Result<()> {
    let registry = default_registry();
    let decompiler = resolve_backend(&registry, backend)?;

    let binary_path = Path::new(binary);
    if !binary_path.exists() {
        return Err(anyhow!(
            "Provided binary '{}' does not exist; provide a binary the decompiler can process",
            binary_path.display()
        ));
    }
    require_model(model)?;

    let pipeline = MatchPipeline::new(model);
    let map = pipeline.query_binary(decompiler, binary_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&map)?);
    } else if map.is_empty() {
        println!("no unnamed functions matched");
    } else {
        for (unnamed, target) in &map {
            println!("{unnamed} -> {} [{}]", target.function_name, target.binary_name);
        }
    }
    Ok(())
}

fn stage_command(dest: &str, names: &[String], sources: &[String]) -> Result<()> {
    let dest_path = Path::new(dest);
    let mut staged_total = 0;
    for source in sources {
        let source_path = Path::new(source);
        if !source_path.is_dir() {
            return Err(anyhow!("Source directory does not exist: {}", source_path.display()));
        }
        let staged = stage_binaries(source_path, names, dest_path)?;
        for path in &staged {
            println!("staged {}", path.display());
        }
        staged_total += staged.len();
    }
    println!("Staged {staged_total} binaries into {}", dest_path.display());
    Ok(())
}
