//! Decompiler artifact parsing: filenames and function bodies.
//!
//! Decompilers in this system emit one file per function, named
//! `<binary_name>__<function_name>__<opaque_suffix...>`, containing decompiled
//! pseudo-source text. This module recovers the identity from the filename,
//! classifies decompiler-synthesized names, and pulls the function body out of
//! the raw text.

/// Separator between the fields of an artifact filename.
pub const ARTIFACT_SEPARATOR: &str = "__";

/// Substring marking a decompiler-synthesized name for a function whose real
/// symbol was not recovered (e.g., `FUN_00401000`).
pub const UNNAMED_MARKER: &str = "FUN";

/// Identity recovered from an artifact filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    pub binary_name: String,
    pub function_name: String,
}

/// Parse `<binary>__<function>__<suffix...>` from a file name.
///
/// Anything past the second field is an opaque suffix (typically an epoch
/// timestamp) and is discarded. Returns `None` when the name does not carry
/// at least a binary and a function field.
pub fn parse_artifact_name(file_name: &str) -> Option<ArtifactName> {
    let mut parts = file_name.split(ARTIFACT_SEPARATOR);
    let binary_name = parts.next()?.to_string();
    let function_name = parts.next()?.to_string();
    if binary_name.is_empty() || function_name.is_empty() {
        return None;
    }
    Some(ArtifactName { binary_name, function_name })
}

/// True when the function name was synthesized by the decompiler rather than
/// recovered from a symbol. Such functions carry no usable label and must not
/// enter the training corpus.
pub fn is_unnamed(function_name: &str) -> bool {
    function_name.contains(UNNAMED_MARKER)
}

/// Extract the function body from raw decompiled text.
///
/// Takes the interior of the first non-nested brace block: everything between
/// the first `{` and the first `}` after it. Falls back to the full text when
/// there is no such block, or when its interior is blank (a body like `{ }`
/// carries less signal than the signature around it).
pub fn extract_body(text: &str) -> &str {
    if let Some(open) = text.find('{') {
        let interior = &text[open + 1..];
        if let Some(close) = interior.find('}') {
            let body = interior[..close].trim();
            if !body.is_empty() {
                return body;
            }
        }
    }
    text
}

/// Split extracted body text into the line sequence the embedder consumes.
///
/// Blank lines are kept: the embedder's averaging divisor is line count, and
/// dropping lines here would change vectors for previously learned code.
pub fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.lines().map(|line| line.to_string()).collect()
}
