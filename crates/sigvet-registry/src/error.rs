//! Error types for the registry-side collaborators.

/// Registry errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Certificate manifest could not be read or parsed.
    #[error("invalid certificate manifest: {message}")]
    Manifest { message: String },

    /// Certificate or key material could not be decoded.
    #[error("invalid certificate: {message}")]
    Certificate { message: String },

    /// Detached signature file could not be read or parsed.
    #[error("invalid signature file: {message}")]
    SignatureFile { message: String },

    /// Refused to replace an existing file.
    #[error("{message} already exists")]
    Exists { message: String },

    /// Filesystem error.
    #[error("io error: {message}")]
    Io { message: String },

    /// SQLite error.
    #[error("database error: {message}")]
    Database { message: String },
}

impl RegistryError {
    /// Whether the error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Database { .. })
    }
}

impl From<rusqlite::Error> for RegistryError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database {
            message: err.to_string(),
        }
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
