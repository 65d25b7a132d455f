use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed caption line {line}: {content:?}")]
    Format { line: usize, content: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Feature vector for '{image_id}' has dimension {found}, expected {expected}")]
    FeatureDimension {
        image_id: String,
        expected: usize,
        found: usize,
    },

    #[error("Unsupported vocabulary format version {found} (supported: {supported})")]
    VocabularyVersion { found: String, supported: String },

    #[error("Invalid vocabulary: {0}")]
    InvalidVocabulary(String),

    #[error("Validation ratio must be within [0, 1], got {0}")]
    InvalidSplit(f32),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
