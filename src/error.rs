use std::path::PathBuf;
use thiserror::Error;

/// Storage-level errors raised by the line index
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("no index found at {}", .0.display())]
    Missing(PathBuf),

    #[error("an index already exists at {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("index at {} cannot be opened: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("index writer is already closed")]
    Closed,

    #[error("stored document is missing field `{0}`")]
    Schema(&'static str),

    #[error("search engine error: {0}")]
    Engine(#[from] tantivy::TantivyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    /// Whether the index location is simply empty, as opposed to unreadable
    pub fn is_missing(&self) -> bool {
        matches!(self, IndexError::Missing(_))
    }
}

/// Errors that abort the startup load. None of them are recoverable.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("corpus {} is unavailable: {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("existing index cannot be opened: {0}")]
    IndexUnreadable(#[source] IndexError),

    #[error("failed to write index: {0}")]
    IndexWriteFailed(#[source] IndexError),
}

/// Per-request search errors
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("search index unavailable: {0}")]
    IndexUnavailable(#[source] IndexError),

    /// Reserved for input validation; query strings are currently accepted as-is.
    #[error("malformed query: {0}")]
    MalformedQuery(String),

    #[error("search failed: {0}")]
    SearchFailed(#[source] IndexError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IndexError::Missing(PathBuf::from("idx"));
        assert_eq!(err.to_string(), "no index found at idx");
        assert!(err.is_missing());

        let err = IndexError::Corrupt {
            path: PathBuf::from("idx"),
            reason: "bad meta".to_string(),
        };
        assert!(!err.is_missing());
        assert!(err.to_string().contains("bad meta"));
    }

    #[test]
    fn test_load_error_keeps_cause() {
        let err = LoadError::IndexWriteFailed(IndexError::Closed);
        assert!(err.to_string().contains("already closed"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_query_error_display() {
        let err = QueryError::IndexUnavailable(IndexError::Missing(PathBuf::from("x")));
        assert!(err.to_string().starts_with("search index unavailable"));
    }
}
