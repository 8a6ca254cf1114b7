use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Every failure the pipeline can report to its caller.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A stage was requested before any document was loaded.
    #[error("No document loaded; open a text file first")]
    MissingDocument,

    /// The vocabulary backing a custom entity category does not exist.
    #[error("Vocabulary for category '{category}' not found at {}", path.display())]
    MissingVocabulary { category: String, path: PathBuf },

    /// A custom category was requested that has no vocabulary configured.
    #[error("Unknown category '{category}': no vocabulary configured")]
    UnknownCategory { category: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("Tagger failed: {0}")]
    Tagger(String),

    #[error("Invalid relationship {source_entity} - {target_entity}: weight {weight} must be a positive number")]
    InvalidRelationship {
        source_entity: String,
        target_entity: String,
        weight: f64,
    },

    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    /// Wrap an I/O error with the action and path that caused it.
    pub fn io(action: &str, path: &Path, source: io::Error) -> Self {
        AnalysisError::Io {
            context: format!("{action} {} failed", path.display()),
            source,
        }
    }

    /// Same as [`AnalysisError::io`] for errors coming out of the csv writer.
    pub fn csv(action: &str, path: &Path, source: csv::Error) -> Self {
        Self::io(action, path, source.into())
    }

    /// User-correctable conditions: the caller can fix them and try again
    /// without anything being wrong with the pipeline itself.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnalysisError::MissingDocument
                | AnalysisError::MissingVocabulary { .. }
                | AnalysisError::UnknownCategory { .. }
        )
    }
}
