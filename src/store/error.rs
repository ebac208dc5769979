//! Result types for record-store operations.
//!
//! Expected, user-caused conditions are reported as [`Outcome::Rejected`] so the
//! caller can branch on them. Only a missing identity and persistence failures
//! are real errors ([`StoreError`]).

use thiserror::Error;

/// Error taxonomy shared by outcomes and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    AlreadyExists,
    HasDependents,
    LimitExceeded,
    Unauthorized,
    StorageError,
}

/// Why an operation was refused. The store is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("invalid class name '{0}'")]
    InvalidClassName(String),

    #[error("invalid class level '{0}' (expected 1AC, 2AC or 3AC)")]
    InvalidClassLevel(String),

    #[error("invalid student name '{0}'")]
    InvalidStudentName(String),

    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    #[error("class '{0}' already exists")]
    ClassExists(String),

    #[error("a student named '{name}' already exists in class '{class}'")]
    StudentExists { name: String, class: String },

    #[error("class '{0}' not found")]
    ClassNotFound(String),

    #[error("student '{0}' not found")]
    StudentNotFound(String),

    #[error("evaluation #{index} not found for student '{student}'")]
    EvaluationNotFound { student: String, index: usize },

    #[error("backup #{0} not found")]
    BackupNotFound(usize),

    #[error("class '{name}' still has {count} student(s)")]
    ClassHasStudents { name: String, count: usize },

    #[error("class limit of {0} reached")]
    ClassLimit(usize),

    #[error("class '{class}' already has the maximum of {limit} students")]
    StudentLimit { class: String, limit: usize },

    #[error("student '{student}' already has the maximum of {limit} evaluations")]
    EvaluationLimit { student: String, limit: usize },
}

impl Rejection {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Rejection::InvalidClassName(_)
            | Rejection::InvalidClassLevel(_)
            | Rejection::InvalidStudentName(_)
            | Rejection::InvalidSetting(_) => ErrorKind::InvalidInput,
            Rejection::ClassExists(_) | Rejection::StudentExists { .. } => ErrorKind::AlreadyExists,
            Rejection::ClassNotFound(_)
            | Rejection::StudentNotFound(_)
            | Rejection::EvaluationNotFound { .. }
            | Rejection::BackupNotFound(_) => ErrorKind::NotFound,
            Rejection::ClassHasStudents { .. } => ErrorKind::HasDependents,
            Rejection::ClassLimit(_) | Rejection::StudentLimit { .. } | Rejection::EvaluationLimit { .. } => {
                ErrorKind::LimitExceeded
            }
        }
    }
}

/// Faults that callers should not branch on: programming or environment errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no active teacher identity")]
    Unauthorized,

    #[error("stored data is corrupted: {0}")]
    Corrupted(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Unauthorized => ErrorKind::Unauthorized,
            StoreError::Corrupted(_) | StoreError::Storage(_) => ErrorKind::StorageError,
        }
    }
}

/// Result of a store operation: `{success, message}` plus the created id, if any.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied { message: String, id: Option<String> },
    Rejected(Rejection),
}

impl Outcome {
    pub(crate) fn applied(message: impl Into<String>) -> Self {
        Outcome::Applied {
            message: message.into(),
            id: None,
        }
    }

    pub(crate) fn created(message: impl Into<String>, id: String) -> Self {
        Outcome::Applied {
            message: message.into(),
            id: Some(id),
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, Outcome::Applied { .. })
    }

    pub fn message(&self) -> String {
        match self {
            Outcome::Applied { message, .. } => message.clone(),
            Outcome::Rejected(rejection) => rejection.to_string(),
        }
    }

    /// Id of the record the operation created.
    pub fn id(&self) -> Option<&str> {
        match self {
            Outcome::Applied { id, .. } => id.as_deref(),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Outcome::Rejected(rejection) => Some(rejection),
            Outcome::Applied { .. } => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.rejection().map(Rejection::kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_kinds() {
        assert_eq!(
            Rejection::ClassHasStudents {
                name: "3A".into(),
                count: 2
            }
            .kind(),
            ErrorKind::HasDependents
        );
        assert_eq!(Rejection::ClassLimit(50).kind(), ErrorKind::LimitExceeded);
        assert_eq!(Rejection::BackupNotFound(3).kind(), ErrorKind::NotFound);
        assert_eq!(Rejection::InvalidSetting("x".into()).kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_outcome_message() {
        let ok = Outcome::created("Student added.", "student_1".into());
        assert!(ok.success());
        assert_eq!(ok.id(), Some("student_1"));
        assert_eq!(ok.kind(), None);

        let rejected = Outcome::Rejected(Rejection::ClassExists("3A".into()));
        assert!(!rejected.success());
        assert_eq!(rejected.message(), "class '3A' already exists");
        assert_eq!(rejected.kind(), Some(ErrorKind::AlreadyExists));
    }

    #[test]
    fn test_store_error_kinds() {
        assert_eq!(StoreError::Unauthorized.kind(), ErrorKind::Unauthorized);
        let err: StoreError = anyhow::anyhow!("disk full").into();
        assert_eq!(err.kind(), ErrorKind::StorageError);
        assert_eq!(err.to_string(), "disk full");
    }
}
