use std::path::PathBuf;

use thiserror::Error;

use crate::model::ArtifactFormat;

/// Per-sample failures. None of these abort an evaluation run.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("artifact missing or unreadable: {}", path.display())]
    MissingArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {} payload: {reason}", format.as_str())]
    ParseFailure {
        format: ArtifactFormat,
        reason: String,
    },

    #[error("{} payload is empty", format.as_str())]
    EmptyPayload { format: ArtifactFormat },

    #[error("no ground truth entry for sample key {key}")]
    UnmatchedGroundTruth { key: String },

    #[error("{count} fragment(s) without usable geometry were left out of the reading order")]
    UnplacedFragments { count: usize },
}

impl SampleError {
    pub fn parse_failure(format: ArtifactFormat, reason: impl ToString) -> Self {
        Self::ParseFailure {
            format,
            reason: reason.to_string(),
        }
    }
}
