use super::error::StoreError;
use crate::identity::normalize_identity;

/// Prefix of the persistence key holding a teacher's records.
pub const STORAGE_KEY_PREFIX: &str = "calgym_app_data_";

/// Context passed to every store call: whose records are being touched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    teacher: Option<String>,
}

impl Session {
    /// Session with no identity. Every store call made with it is unauthorized.
    pub fn anonymous() -> Self {
        Self { teacher: None }
    }

    pub fn for_teacher(teacher: impl Into<String>) -> Self {
        Self {
            teacher: Some(teacher.into()),
        }
    }

    pub fn teacher(&self) -> Option<&str> {
        self.teacher.as_deref()
    }

    pub fn storage_key(&self) -> Result<String, StoreError> {
        let teacher = self
            .teacher
            .as_deref()
            .and_then(normalize_identity)
            .ok_or(StoreError::Unauthorized)?;
        Ok(format!("{}{}", STORAGE_KEY_PREFIX, teacher))
    }
}
