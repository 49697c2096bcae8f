//! Core data model for embedded function records and the reference corpus.

use serde::{Deserialize, Serialize};

/// Fixed length of every embedding vector in the system.
///
/// All persisted records carry a vector of exactly this length; the embedding
/// generator pads or truncates to enforce it.
pub const VECTOR_DIM: usize = 500;

/// One decompiled function, either a corpus entry or a query subject.
///
/// `vector` is `None` until the record has been through the embedding
/// generator; records never enter the corpus without one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// Name of the binary the function came from.
    pub binary_name: String,
    /// Function name, possibly decompiler-synthesized (e.g., `FUN_00401000`).
    pub function_name: String,
    /// Decompiled source text, one entry per line.
    pub code: Vec<String>,
    /// Embedding of `code`, length [`VECTOR_DIM`] once present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    /// RFC 3339 timestamp of when the record was learned, if it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learned_at: Option<String>,
}

impl FunctionRecord {
    /// Create an un-embedded record from its identity and code lines.
    pub fn new(
        binary_name: impl Into<String>,
        function_name: impl Into<String>,
        code: Vec<String>,
    ) -> Self {
        Self {
            binary_name: binary_name.into(),
            function_name: function_name.into(),
            code,
            vector: None,
            learned_at: None,
        }
    }

    /// True when the decompiled body has no code lines at all.
    pub fn is_empty_code(&self) -> bool {
        self.code.iter().all(|line| line.trim().is_empty())
    }
}

/// Ordered, append-only collection of embedded function records.
///
/// The corpus is the unit of persistence: it is loaded whole at construction
/// and rewritten whole after every successful addition. No uniqueness is
/// enforced; identical (binary, function) pairs may coexist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Corpus {
    pub records: Vec<FunctionRecord>,
}

impl Corpus {
    pub fn new() -> Self {
        Self { records: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FunctionRecord> {
        self.records.iter()
    }
}
