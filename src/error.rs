//! Error types for hydro_gen.
//!
//! Only configuration problems at the boundary and host-side failures surface
//! as errors. Unparsable values (in permissive mode), unknown component kinds
//! and degenerate counts are recovered where they happen and recorded as notes.

use std::path::PathBuf;
use thiserror::Error;

use crate::systems::hydro::primitive::PrimitiveId;

/// Failures loading a generation request from disk.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file {path:?} could not be read: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {path:?} is not a valid request: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures inside a generation pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// A typed record asked for a key that neither the input nor the schema provided.
    #[error("parameter `{0}` is missing from both the input and the schema")]
    MissingParameter(String),

    /// Only raised under the strict resolve policy.
    #[error("parameter `{key}` has non-numeric value {raw:?}")]
    UnparsableValue { key: String, raw: String },
}

/// Failures reported by a scene host while materializing commands.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("primitive {0:?} was never created on this host")]
    UnknownPrimitive(PrimitiveId),

    #[error("host rejected command: {0}")]
    Rejected(String),
}

/// A host failure tagged with the position of the command that caused it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("command #{index} ({command}) failed: {source}")]
pub struct SubmitError {
    pub index: usize,
    pub command: &'static str,
    #[source]
    pub source: HostError,
}

/// Failures writing generated output to disk.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("could not write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("command log could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("scene could not be submitted: {0}")]
    Submit(#[from] SubmitError),
}
