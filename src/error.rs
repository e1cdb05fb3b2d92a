//! Error taxonomy for the core.

use thiserror::Error;

/// Failures surfaced by the core. Store-level failures propagate unchanged
/// (fail closed); absence of a row is `Ok(None)`, never an error.
#[derive(Debug, Error)]
pub enum Error {
    /// The persistent store rejected or failed the operation.
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    /// A session token collided with an existing one. Callers regenerate
    /// the token and retry instead of treating this as a generic failure.
    #[error("session token already exists")]
    DuplicateSessionToken,

    /// The credential verifier itself failed (not a wrong password).
    #[error("credential verification failed: {0}")]
    Verify(#[source] anyhow::Error),

    /// The system RNG failed while generating a session token.
    #[error("failed to generate session token: {0}")]
    TokenGeneration(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Postgres SQLSTATE 23505 (unique_violation).
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }

    #[test]
    fn duplicate_token_is_distinguishable() {
        let err = Error::DuplicateSessionToken;
        assert!(matches!(err, Error::DuplicateSessionToken));
        assert_eq!(err.to_string(), "session token already exists");
    }

    #[test]
    fn store_error_wraps_sqlx() {
        let err = Error::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, Error::Store(_)));
    }
}
