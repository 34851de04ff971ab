use thiserror::Error;

pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Not signed in. Run `reps login <user>` first")]
    NotAuthenticated,

    /// Raised while validating settings input. Callers substitute a default
    /// instead of surfacing it.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid date '{0}'. Must be YYYY-MM-DD")]
    InvalidDateKey(String),

    #[error("Workout {0} not found")]
    WorkoutNotFound(i64),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Upstream failure: {0:#}")]
    Upstream(anyhow::Error),
}

impl From<anyhow::Error> for CoreError {
    fn from(err: anyhow::Error) -> Self {
        Self::Upstream(err)
    }
}

impl CoreError {
    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
