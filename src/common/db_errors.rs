//! Database error categorization.
//!
//! Bulk upserts lean on the store's unique indexes (external_id per dataset,
//! the child upsert keys), so constraint violations are an expected failure
//! mode that must map to a conflict rather than a generic 500.

use sea_orm::DbErr;

/// Categories of database errors the services care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorKind {
    /// Query returned no results.
    NotFound,
    /// Unique constraint violation, surfaced as a conflict.
    UniqueViolation,
    /// Foreign key constraint violation.
    ForeignKeyViolation,
    /// Connection failure.
    ConnectionError,
    /// Anything else.
    Unknown,
}

impl DbErrorKind {
    pub fn from_db_err(err: &DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(_) => Self::NotFound,
            DbErr::Conn(_) => Self::ConnectionError,
            DbErr::Exec(msg) | DbErr::Query(msg) => {
                let msg_lower = msg.to_string().to_lowercase();
                if msg_lower.contains("unique") || msg_lower.contains("duplicate") {
                    Self::UniqueViolation
                } else if msg_lower.contains("foreign key") {
                    Self::ForeignKeyViolation
                } else {
                    Self::Unknown
                }
            }
            _ => Self::Unknown,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::UniqueViolation)
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::UniqueViolation => 409,
            Self::ForeignKeyViolation => 400,
            Self::ConnectionError => 503,
            Self::Unknown => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_not_found() {
        let err = DbErr::RecordNotFound("record".to_string());
        assert_eq!(DbErrorKind::from_db_err(&err), DbErrorKind::NotFound);
        assert_eq!(DbErrorKind::NotFound.http_status_code(), 404);
    }

    #[test]
    fn test_categorize_unique_violation() {
        let err = DbErr::Exec(sea_orm::RuntimeErr::Internal(
            "UNIQUE constraint failed: records.external_id".to_string(),
        ));
        let kind = DbErrorKind::from_db_err(&err);
        assert_eq!(kind, DbErrorKind::UniqueViolation);
        assert!(kind.is_conflict());
    }

    #[test]
    fn test_categorize_foreign_key() {
        let err = DbErr::Query(sea_orm::RuntimeErr::Internal(
            "FOREIGN KEY constraint failed".to_string(),
        ));
        assert_eq!(
            DbErrorKind::from_db_err(&err),
            DbErrorKind::ForeignKeyViolation
        );
    }
}
