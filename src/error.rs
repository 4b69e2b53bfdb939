use rusqlite::ErrorCode;
use thiserror::Error;

/// What users see in place of a store failure; the detail goes to the log.
pub const DB_ERROR_STATUS: &str = "Database error. See the log for details.";

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Password hashing error: {0}")]
    Hash(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("{0}")]
    Other(String),
}

/// Coarse failure reason, so callers can tell "nothing there" apart from
/// "couldn't ask".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    Unavailable,
    Constraint,
    Invalid,
    Internal,
}

impl OracleError {
    pub fn kind(&self) -> FailureKind {
        match self {
            OracleError::NotFound(_) | OracleError::Db(rusqlite::Error::QueryReturnedNoRows) => {
                FailureKind::NotFound
            }
            OracleError::Db(rusqlite::Error::SqliteFailure(e, _)) => match e.code {
                ErrorCode::ConstraintViolation => FailureKind::Constraint,
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::NotADatabase
                | ErrorCode::PermissionDenied
                | ErrorCode::SystemIoFailure => FailureKind::Unavailable,
                _ => FailureKind::Internal,
            },
            OracleError::Pool(_) | OracleError::Io(_) => FailureKind::Unavailable,
            OracleError::Invalid(_) => FailureKind::Invalid,
            _ => FailureKind::Internal,
        }
    }
}

impl OracleError {
    /// Keep input and lookup errors as they are; replace store failures with
    /// the generic message after logging them.
    pub fn redacted(self) -> OracleError {
        match self.kind() {
            FailureKind::Invalid | FailureKind::NotFound => self,
            FailureKind::Unavailable | FailureKind::Constraint | FailureKind::Internal => {
                log::warn!("{self}");
                OracleError::Other(DB_ERROR_STATUS.to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, OracleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_kinds() {
        assert_eq!(OracleError::NotFound("staff".into()).kind(), FailureKind::NotFound);
        assert_eq!(
            OracleError::Db(rusqlite::Error::QueryReturnedNoRows).kind(),
            FailureKind::NotFound
        );
    }

    #[test]
    fn test_constraint_kind() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT),
            Some("UNIQUE constraint failed: users.username".into()),
        );
        assert_eq!(OracleError::Db(err).kind(), FailureKind::Constraint);
    }

    #[test]
    fn test_redacted_hides_store_detail() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_NOTADB),
            Some("file is not a database".into()),
        );
        let shown = OracleError::Db(err).redacted().to_string();
        assert_eq!(shown, DB_ERROR_STATUS);

        let invalid = OracleError::Invalid("--country is required for by-country".into());
        assert_eq!(
            invalid.redacted().to_string(),
            "Invalid input: --country is required for by-country"
        );
    }

    #[test]
    fn test_io_is_unavailable() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(OracleError::Io(err).kind(), FailureKind::Unavailable);
    }
}
