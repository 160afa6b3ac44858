use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Input could not be turned into a dataset.
///
/// Every variant is fatal at startup: no partially loaded dataset is ever
/// served.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Reading the input file failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The input file is zstd-compressed but could not be decompressed.
    #[error("failed to decompress {}: {source}", path.display())]
    Decompress {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The bytes are not a JSON document of the expected shape.
    #[error("malformed {what}: {source}")]
    Malformed {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// One line of a JSON Lines action log is not a valid action.
    #[error("malformed action on line {line}: {source}")]
    MalformedLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Startup or serving failure of the HTTP process.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("invalid listen address '{addr}': {source}")]
    Addr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("server error: {0}")]
    Io(#[from] io::Error),
}
