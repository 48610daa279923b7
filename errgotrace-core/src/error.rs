use std::path::PathBuf;

/// Everything that can go wrong while processing files
///
/// Every per-file variant names its file so a diagnostic line is
/// self-contained.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid {kind} pattern `{pattern}`: {source}")]
    Pattern {
        kind: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("{}: failed to open ({source})", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: failed to write ({source})", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: formatting error ({reason})", path.display())]
    Format { path: PathBuf, reason: String },

    #[error("{}: parse error ({reason})", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("{}: already processed", path.display())]
    AlreadyProcessed { path: PathBuf },

    #[error("{}: generated code does not format ({reason})", path.display())]
    Generated { path: PathBuf, reason: String },

    #[error("{}: {reason}", path.display())]
    Edit { path: PathBuf, reason: String },
}
