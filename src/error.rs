use thiserror::Error;

/// The five error classes from the vault's error-handling design: user
/// input, authentication failure (never fatal on its own), data
/// corruption, internal error, and precondition violation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    UserInput(String),

    /// Wrong master passphrase. Callers (namely `vault::authenticate`)
    /// catch this and retry with backoff instead of propagating it.
    #[error("authentication failed")]
    AuthFailed,

    #[error("Data corrupted: {0}")]
    DataCorrupted(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Precondition(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    pub fn corrupted(msg: impl Into<String>) -> Self {
        Error::DataCorrupted(msg.into())
    }

    pub fn user(msg: impl Into<String>) -> Self {
        Error::UserInput(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Error::Precondition(msg.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Internal(e.to_string())
    }
}
