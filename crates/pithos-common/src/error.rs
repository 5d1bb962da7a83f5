//! Error types for Pithos
//!
//! `PithosError` covers failures that are meaningful to the person talking to
//! the bot (unknown motion, closed motion, rejected delegation) as well as
//! infrastructure failures (database, configuration, messaging). Command
//! handlers downcast `anyhow::Error` values to decide what to tell the user.

/// Application-specific error types
#[derive(thiserror::Error, Debug)]
pub enum PithosError {
    #[error("{0}")]
    IllegalArgument(String),

    #[error("member {0} is not known")]
    MemberNotFound(i64),

    #[error("motion #{0} does not exist")]
    MotionNotFound(i32),

    #[error("motion #{0} is no longer accepting votes")]
    MotionClosed(i32),

    #[error("motion #{motion_id} has no option {option_no}")]
    InvalidOption { motion_id: i32, option_no: i32 },

    #[error("delegation rejected: {0}")]
    DelegationRejected(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("messaging error: {0}")]
    MessagingError(String),
}

impl PithosError {
    /// Whether the error describes a mistake in the user's request, as opposed
    /// to a failure of the bot itself.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            PithosError::IllegalArgument(_)
                | PithosError::MemberNotFound(_)
                | PithosError::MotionNotFound(_)
                | PithosError::MotionClosed(_)
                | PithosError::InvalidOption { .. }
                | PithosError::DelegationRejected(_)
        )
    }
}

/// Find the user-facing `PithosError` inside an `anyhow` chain, if any.
pub fn user_facing(err: &anyhow::Error) -> Option<&PithosError> {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<PithosError>())
        .find(|e| e.is_user_facing())
}
