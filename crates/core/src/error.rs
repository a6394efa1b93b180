/// Result alias that carries the custom [`BeatsyncError`] type.
pub type Result<T> = std::result::Result<T, BeatsyncError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum BeatsyncError {
    /// Free-form error wrapping a plain message.
    #[error("{0}")]
    Message(String),
    /// A chart document failed structured parsing.
    #[error("malformed chart document: {0}")]
    Json(#[from] serde_json::Error),
    /// A chart document parsed but violated a schema rule.
    #[error("invalid chart document: {0}")]
    InvalidDocument(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl BeatsyncError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn invalid<T: Into<String>>(msg: T) -> Self {
        Self::InvalidDocument(msg.into())
    }
}

impl From<&str> for BeatsyncError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for BeatsyncError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
