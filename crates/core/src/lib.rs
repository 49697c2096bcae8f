//! sleuth-core
//!
//! Core library for recovering the probable original names of stripped binary
//! functions. A function's decompiled source text is embedded into a
//! fixed-length vector; a persisted corpus of previously seen, named functions
//! is scanned for the nearest neighbors by cosine distance.
//!
//! This crate defines the record model, the per-function embedding generator,
//! the corpus snapshot store, the similarity matcher, decompiler adapters, and
//! the pipeline that ties them together.
//!
//! The goal is to keep all substantive logic here so it is fully testable and
//! reusable from multiple frontends (CLI, Python bindings, etc.).

pub mod decompiler;
pub mod embedding;
pub mod extract;
pub mod matcher;
pub mod model;
pub mod pipeline;
pub mod store;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
