use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A configuration value was out of range (negative delay, zero capacity, ...).
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    /// A snapshot could not be cloned, or cloning it would have lost data.
    #[error("failed to clone snapshot: {0}")]
    CloneFailure(String),

    /// An operation was attempted on a history that has already been disposed.
    #[error("`{0}` called after dispose")]
    DisposedUse(&'static str),
}

impl Error {
    pub fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}
