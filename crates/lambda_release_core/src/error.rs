//! Error taxonomy for the release workflow.

/// Result type alias using [`ReleaseError`].
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Errors raised while driving a function through a release.
///
/// None of these are retried. A failure aborts the run at the failing step and
/// leaves the side effects of earlier steps in place.
#[derive(Debug, thiserror::Error)]
pub enum ReleaseError {
    /// The function registry rejected a call.
    #[error("registry error: {0}")]
    Registry(String),

    /// The autoscaling registrar rejected a call.
    #[error("autoscaling error: {0}")]
    Autoscaling(String),

    /// A local precondition of the release lifecycle was violated.
    #[error("deployment error: {0}")]
    Deployment(String),

    /// A settings or version file is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The code archive could not be built.
    #[error("packaging error: {0}")]
    Package(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReleaseError {
    #[must_use]
    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }

    #[must_use]
    pub fn autoscaling(msg: impl Into<String>) -> Self {
        Self::Autoscaling(msg.into())
    }

    #[must_use]
    pub fn deployment(msg: impl Into<String>) -> Self {
        Self::Deployment(msg.into())
    }

    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    #[must_use]
    pub fn package(msg: impl Into<String>) -> Self {
        Self::Package(msg.into())
    }
}

impl From<zip::result::ZipError> for ReleaseError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Package(err.to_string())
    }
}
