//! Error types for schema compilation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unrecognized schema shape at {path}: {message}")]
    UnrecognizedShape { path: String, message: String },

    #[error("Unresolvable $ref at {path}: {reference}")]
    UnresolvedReference { path: String, reference: String },

    #[error("Recursion depth exceeded at {path} (max: {max_depth})")]
    RecursionDepthExceeded { path: String, max_depth: usize },
}
