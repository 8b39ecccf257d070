use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Result type used by the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced by engine commands, persistence and transcript decoding.
///
/// The overlay pipeline itself never fails; only edits addressed to missing
/// segments and the I/O collaborators report errors.
#[derive(Debug)]
pub enum EngineError {
    SegmentIndexOutOfRange {
        index: usize,
        len: usize,
    },
    InvalidProjectId {
        id: String,
    },
    ProjectNotFound {
        id: String,
    },
    ProjectIo {
        context: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    ProjectSerialization {
        path: PathBuf,
        source: serde_json::Error,
    },
    TranscriptIo(std::io::Error),
    TranscriptionFailed {
        message: String,
    },
    TranscriptIncomplete,
    InvalidFrameRate(f64),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SegmentIndexOutOfRange { index, len } => {
                write!(f, "segment index {index} out of range (segments: {len})")
            }
            Self::InvalidProjectId { id } => write!(f, "invalid project id: {id:?}"),
            Self::ProjectNotFound { id } => write!(f, "project not found: {id}"),
            Self::ProjectIo {
                context,
                path,
                source,
            } => write!(f, "{context}: {} ({source})", path.display()),
            Self::ProjectSerialization { path, source } => {
                write!(
                    f,
                    "project serialization/deserialization failed at {} ({source})",
                    path.display()
                )
            }
            Self::TranscriptIo(err) => write!(f, "transcript stream read failed: {err}"),
            Self::TranscriptionFailed { message } => {
                write!(f, "transcription service reported an error: {message}")
            }
            Self::TranscriptIncomplete => {
                write!(f, "transcript stream ended without a result")
            }
            Self::InvalidFrameRate(fps) => write!(f, "invalid export frame rate: {fps}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ProjectIo { source, .. } => Some(source),
            Self::ProjectSerialization { source, .. } => Some(source),
            Self::TranscriptIo(err) => Some(err),
            _ => None,
        }
    }
}
