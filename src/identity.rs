//! Which teacher's records are active.
//!
//! Authentication happens elsewhere; this only picks the opaque identifier
//! that scopes the record store.

/// Environment variable naming the active teacher
pub const ENV_TEACHER_VAR: &str = "CALGYM_TEACHER";

const MAX_IDENTITY_LEN: usize = 128;

/// Trim an identity and check it is usable as part of a storage key.
pub fn normalize_identity(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let valid = !trimmed.is_empty()
        && trimmed.len() <= MAX_IDENTITY_LEN
        && !trimmed.starts_with('.')
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '@'));
    if valid {
        Some(trimmed.to_string())
    } else {
        None
    }
}

/// Check for a teacher identity in the CALGYM_TEACHER environment variable.
/// Returns Some(id) if the env var is set and non-empty, None otherwise.
pub fn get_teacher_from_env() -> Option<String> {
    match std::env::var(ENV_TEACHER_VAR) {
        Ok(val) => {
            let trimmed = val.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        Err(_) => None,
    }
}

/// First non-empty identity among the CLI flag, the environment and the config file.
/// The winner is returned untouched so an invalid value surfaces as unauthorized.
pub fn resolve_teacher(flag: Option<&str>, env: Option<String>, config: Option<&str>) -> Option<String> {
    flag.map(str::to_string)
        .filter(|s| !s.trim().is_empty())
        .or(env)
        .or_else(|| config.map(str::to_string).filter(|s| !s.trim().is_empty()))
}
