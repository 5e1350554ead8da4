use std::path::PathBuf;

use crate::interrupt::InterruptedError;
use crate::model::Origin;

/// Errors produced while running the hook pipeline.
///
/// All of them are fatal for the run: nothing is written to the patch sink
/// once one has occurred.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The binding context could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The patch document could not be serialized.
    #[error("could not encode patch document: {0}")]
    Encode(#[source] serde_json::Error),

    /// Reading the input or writing the output failed.
    #[error("could not {operation} {}: {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run was cancelled before output was written.
    #[error(transparent)]
    Interrupted(#[from] InterruptedError),
}

impl Error {
    pub(crate) fn io(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Error::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("binding context is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("binding context {origin}: missing required field `{field}`")]
    MissingField { origin: Origin, field: &'static str },
}
