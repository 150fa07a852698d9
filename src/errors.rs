//! Typed errors for the slicing pipeline.
//!
//! Two failure families matter to callers: fatal construction errors (the
//! program model is structurally broken, nothing was built) and a bad slice
//! request (the target signature resolves to nothing in the program). Both
//! are distinct variants so a consumer can tell "no callers" apart from
//! "bad input". Recoverable imprecision — phantom call targets, empty
//! receiver points-to sets — is never an error; it shows up in build stats
//! and log output only.

use crate::program::MethodRef;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SliceError {
    /// The requested target method does not exist anywhere in the program
    /// model. Distinct from a method that exists but has no callers.
    #[error("target method not found in program: {0}")]
    UnresolvedTarget(MethodRef),

    /// A method signature string that does not parse as `<C: ret name(p)>`.
    #[error("invalid method signature: {0}")]
    InvalidSignature(String),

    /// Structurally inconsistent program model input; the whole build is
    /// discarded, there is no partial call graph.
    #[error("malformed program model: {message}")]
    MalformedProgram { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SliceError>;
