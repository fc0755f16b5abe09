use thiserror::Error;

/// Errors produced by the store layer.
///
/// The domain variants (`ForbiddenRole`, `QuotaExceeded`, `InvalidTarget`,
/// `NotFound`) are terminal for a request and guarantee that no state change
/// occurred: every validating operation runs its checks and its write inside
/// one transaction.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The caller's role is not allowed to perform the operation
    /// (competitors may not vote; admins and promoters may not register
    /// as competitors).
    #[error("Role '{0}' may not perform this action")]
    ForbiddenRole(fitstage_shared::Role),

    /// The spectator has no remaining votes in the category.
    #[error("Vote quota exceeded: {used} of {max} votes used")]
    QuotaExceeded { used: u32, max: u32 },

    /// The competitor does not belong to the category (or is unknown).
    #[error("Invalid vote target: {0}")]
    InvalidTarget(String),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// UUID parsing error.
    #[error("UUID error: {0}")]
    Uuid(#[from] uuid::Error),

    /// Chrono parsing error.
    #[error("Timestamp parse error: {0}")]
    ChronoParse(#[from] chrono::ParseError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
