use uuid::Uuid;

/// Per-user failure taxonomy for the sync pipeline. `Store` errors are
/// fatal to the whole run; the other variants are caught per user and
/// collected into the final report.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("user {0} does not exist")]
    NotFound(Uuid),

    #[error("upstream data for user {user_id} unavailable: {detail}")]
    UpstreamUnavailable { user_id: Uuid, detail: String },

    #[error("consistency violation: {0}")]
    ConsistencyViolation(String),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl SyncError {
    /// A store-level failure means the database itself is unhealthy, so
    /// continuing the batch would only repeat it for every user.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::Store(_))
    }
}
