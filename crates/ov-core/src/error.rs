use thiserror::Error;

/// The stable error taxonomy carried across every HTTP response and trace
/// summary (§6/§7). Every crate's own error type maps into one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorCode {
    NotFound,
    AlreadyExists,
    InvalidArgument,
    PermissionDenied,
    Unauthenticated,
    NotInitialized,
    Timeout,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::AlreadyExists => "AlreadyExists",
            Self::InvalidArgument => "InvalidArgument",
            Self::PermissionDenied => "PermissionDenied",
            Self::Unauthenticated => "Unauthenticated",
            Self::NotInitialized => "NotInitialized",
            Self::Timeout => "Timeout",
            Self::Internal => "Internal",
        }
    }

    /// The HTTP status this code maps to, per the single table in §7.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::AlreadyExists => 409,
            Self::InvalidArgument => 400,
            Self::PermissionDenied => 403,
            Self::Unauthenticated => 401,
            Self::NotInitialized => 503,
            Self::Timeout => 504,
            Self::Internal => 500,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum OvError {
    #[error("Context not found: {uri}")]
    ContextNotFound { uri: String },
    #[error("Collection not found: {name}")]
    CollectionNotFound { name: String },
    #[error("Invalid URI: {0}")]
    InvalidUri(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Embedding error: {0}")]
    Embedding(String),
    #[error("Transaction error: {0}")]
    Transaction(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("not initialized: {0}")]
    NotInitialized(String),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OvError {
    /// Map onto the shared error taxonomy.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ContextNotFound { .. } | Self::CollectionNotFound { .. } | Self::NotFound(_) => {
                ErrorCode::NotFound
            }
            Self::AlreadyExists(_) => ErrorCode::AlreadyExists,
            Self::InvalidUri(_) | Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::PermissionDenied(_) => ErrorCode::PermissionDenied,
            Self::Unauthenticated(_) => ErrorCode::Unauthenticated,
            Self::NotInitialized(_) => ErrorCode::NotInitialized,
            Self::Timeout(_) => ErrorCode::Timeout,
            Self::Storage(_)
            | Self::Embedding(_)
            | Self::Transaction(_)
            | Self::Serialization(_)
            | Self::Other(_) => ErrorCode::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, OvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_http_status_table() {
        assert_eq!(ErrorCode::NotFound.http_status(), 404);
        assert_eq!(ErrorCode::AlreadyExists.http_status(), 409);
        assert_eq!(ErrorCode::InvalidArgument.http_status(), 400);
        assert_eq!(ErrorCode::PermissionDenied.http_status(), 403);
        assert_eq!(ErrorCode::Unauthenticated.http_status(), 401);
        assert_eq!(ErrorCode::NotInitialized.http_status(), 503);
        assert_eq!(ErrorCode::Timeout.http_status(), 504);
        assert_eq!(ErrorCode::Internal.http_status(), 500);
    }

    #[test]
    fn ov_error_code_mapping() {
        assert_eq!(OvError::NotFound("x".into()).code(), ErrorCode::NotFound);
        assert_eq!(OvError::PermissionDenied("x".into()).code(), ErrorCode::PermissionDenied);
        assert_eq!(OvError::Storage("x".into()).code(), ErrorCode::Internal);
    }
}
