use thiserror::Error;

/// Failures surfaced by the FTP core.
///
/// A listing line that cannot be parsed is not an error: it is dropped and
/// counted in `Listing::skipped`.
#[derive(Debug, Error)]
pub enum FtpError {
    #[error("FTP connection failed: {0}")]
    Connection(String),

    #[error("Cannot access {path}: {reason}")]
    Path { path: String, reason: String },

    #[error("FTP transfer failed: {0}")]
    Transfer(String),

    #[error("Invalid connection settings: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FtpError>;
