use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::store::types::{Settings, DEFAULT_REPORT_TITLE, DEFAULT_TEACHER_NAME};

pub const DEFAULT_MAX_CLASSES: usize = 50;
pub const DEFAULT_MAX_STUDENTS_PER_CLASS: usize = 100;
pub const DEFAULT_MAX_EVALUATIONS_PER_STUDENT: usize = 200;
pub const DEFAULT_MAX_BACKUPS: usize = 10;

/// Top-level configuration.
///
/// Example YAML:
/// ```yaml
/// teacher: "t-42"
/// limits:
///   max_students_per_class: 40
/// defaults:
///   teacher_name: "Pr. Djalil Youness"
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Identity used when neither --teacher nor CALGYM_TEACHER is given
    #[serde(default)]
    pub teacher: Option<String>,

    /// Where per-teacher data files live (default: ~/.config/calgym/data)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub limits: Limits,

    #[serde(default)]
    pub defaults: DefaultSettings,
}

/// Collection ceilings enforced by the record store.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct Limits {
    pub max_classes: usize,
    pub max_students_per_class: usize,
    pub max_evaluations_per_student: usize,
    /// Snapshots retained; the oldest is dropped first
    pub max_backups: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_classes: DEFAULT_MAX_CLASSES,
            max_students_per_class: DEFAULT_MAX_STUDENTS_PER_CLASS,
            max_evaluations_per_student: DEFAULT_MAX_EVALUATIONS_PER_STUDENT,
            max_backups: DEFAULT_MAX_BACKUPS,
        }
    }
}

/// Settings a teacher's store starts with.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct DefaultSettings {
    pub teacher_name: String,
    pub report_title: String,
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            teacher_name: DEFAULT_TEACHER_NAME.to_string(),
            report_title: DEFAULT_REPORT_TITLE.to_string(),
        }
    }
}

impl DefaultSettings {
    pub fn to_settings(&self) -> Settings {
        Settings {
            teacher_name: self.teacher_name.clone(),
            report_title: self.report_title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_classes, 50);
        assert_eq!(limits.max_students_per_class, 100);
        assert_eq!(limits.max_evaluations_per_student, 200);
        assert_eq!(limits.max_backups, 10);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "teacher: t-42\nlimits:\n  max_backups: 3\n";
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.teacher.as_deref(), Some("t-42"));
        assert_eq!(config.limits.max_backups, 3);
        assert_eq!(config.limits.max_classes, 50);
        assert_eq!(config.defaults, DefaultSettings::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "limits:\n  max_pupils: 3\n";
        assert!(serde_saphyr::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config {
            teacher: Some("t-1".to_string()),
            data_dir: Some(PathBuf::from("/tmp/calgym")),
            limits: Limits::default(),
            defaults: DefaultSettings::default(),
        };
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: Config = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }
}
