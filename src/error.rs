//! Error type shared by every fallible operation in the library.

/// Errors raised while computing or attaching an omega rescalar.
///
/// All checks run eagerly at construction time, so a returned error means no
/// combiner was built and nothing was attached to the host network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdminError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl AdminError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, AdminError>;
