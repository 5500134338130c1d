//! Build error types.
//!
//! Every failure the pipeline can hit while loading a manifest, resolving
//! files, running processors or persisting output is a [`MendError`]. Callers
//! of the batch build see it as a hard failure; the live server logs it and
//! keeps serving its previous snapshot.

use std::error::Error as StdError;
use std::path::PathBuf;
use thiserror::Error;

use crate::processor::ProcessError;

pub type Result<T, E = MendError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum MendError {
    #[error("failed to read manifest `{}`", .0.display())]
    ManifestRead(PathBuf, #[source] std::io::Error),

    #[error("malformed manifest `{}`", .0.display())]
    ManifestParse(PathBuf, #[source] serde_json::Error),

    #[error("invalid pattern `{pattern}` in bundle `{bundle}`")]
    Pattern {
        bundle: String,
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to expand pattern for bundle `{bundle}`")]
    Glob {
        bundle: String,
        #[source]
        source: glob::GlobError,
    },

    #[error("pattern for bundle `{0}` is not valid UTF-8")]
    NonUtf8Pattern(String),

    #[error("failed to read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("processor `{processor}` failed for bundle `{bundle}`")]
    Processor {
        bundle: String,
        processor: String,
        #[source]
        source: ProcessError,
    },

    #[error("failed to write `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode version map")]
    EncodeVersions(#[source] serde_json::Error),

    #[error("malformed version map `{}`", .0.display())]
    VersionMapParse(PathBuf, #[source] serde_json::Error),
}

/// Render an error with its whole source chain on one line, `a: b: c`.
pub fn chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_read_error_display() {
        let err = MendError::Read {
            path: PathBuf::from("js/app.js"),
            source: Error::new(ErrorKind::NotFound, "file not found"),
        };
        assert_eq!(err.to_string(), "failed to read `js/app.js`");
        assert_eq!(chain(&err), "failed to read `js/app.js`: file not found");
    }

    #[test]
    fn test_processor_error_chain() {
        let err = MendError::Processor {
            bundle: "app.js".into(),
            processor: "broken".into(),
            source: ProcessError::Failed("unexpected token".into()),
        };
        let rendered = chain(&err);
        assert!(rendered.starts_with("processor `broken` failed for bundle `app.js`"));
        assert!(rendered.ends_with("unexpected token"));
    }
}
