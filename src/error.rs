use std::path::PathBuf;
use thiserror::Error;

/// The remote source was unreachable or returned unusable data
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("request to {url} failed with status {status}")]
    Http { url: String, status: u16 },

    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("malformed payload from {url}: {message}")]
    MalformedPayload { url: String, message: String },

    #[error("failed to fetch JSON from all mirrors, last error: {last}")]
    AllMirrorsFailed { last: Box<RetrievalError> },

    #[error("no mirrors configured")]
    NoMirrors,
}

/// The destination filesystem could not be used
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Any error that ends a fetch-and-export run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("retrieval failed for industry {code}: {source}")]
    Retrieval {
        code: String,
        #[source]
        source: RetrievalError,
    },

    #[error("industry discovery failed: {0}")]
    Discovery(#[source] RetrievalError),

    #[error(transparent)]
    Write(#[from] WriteError),
}
