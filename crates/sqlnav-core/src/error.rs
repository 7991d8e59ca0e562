use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The schema catalog could not be read (connectivity, permissions, bad SQL).
    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A statement was refused by the read/write policy before reaching the database.
    #[error("Query rejected: {0}")]
    QueryRejected(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Helper for creating configuration errors
    ///
    /// # Example
    /// ```
    /// use sqlnav_core::Error;
    /// let err = Error::config_error("schema must not be empty");
    /// ```
    pub fn config_error(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Helper for creating catalog errors
    ///
    /// # Example
    /// ```
    /// use sqlnav_core::Error;
    /// let err = Error::catalog_error("permission denied for schema sales");
    /// ```
    pub fn catalog_error(msg: impl Into<String>) -> Self {
        Error::Catalog(msg.into())
    }

    /// Helper for reporting a missing or malformed tool parameter
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }

    /// Helper for creating general errors with a message
    ///
    /// # Example
    /// ```
    /// use sqlnav_core::Error;
    /// let err = Error::message("Something went wrong");
    /// ```
    pub fn message(msg: impl Into<String>) -> Self {
        Error::Other(anyhow::anyhow!("{}", msg.into()))
    }
}
