use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::rubric::{ClassLevel, LinkingQuality};

/// Current on-disk layout of [`AppData`].
pub const DATA_VERSION: u32 = 1;

pub const DEFAULT_TEACHER_NAME: &str = "Pr. Djalil Youness";
pub const DEFAULT_REPORT_TITLE: &str = "Test Bilan Gymnastique au sol";

/// A single graded attempt. Never mutated once stored.
///
/// Field names follow the records the grading app has always written
/// (`year`, `pA`, `linkingQualityValue`, ...), so older exports load as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub date: DateTime<Utc>,
    #[serde(rename = "year")]
    pub level: ClassLevel,
    #[serde(rename = "pA")]
    pub performed_a: u32,
    #[serde(rename = "pB")]
    pub performed_b: u32,
    #[serde(rename = "pC")]
    pub performed_c: u32,
    pub specific_req_score: f64,
    #[serde(rename = "linkingQualityValue")]
    pub linking_quality: LinkingQuality,
    pub execution_score: f64,
    pub co_cn_score: f64,
    pub co_cm_score: f64,
    pub difficulty_score: f64,
    pub linking_score: f64,
    pub total_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub name: String,
    pub level: ClassLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    /// Name of the class this student belongs to.
    #[serde(rename = "class")]
    pub class_id: String,
    /// Chronological, most recent last.
    #[serde(default)]
    pub evaluations: Vec<Evaluation>,
}

impl Student {
    pub fn latest_evaluation(&self) -> Option<&Evaluation> {
        self.evaluations.last()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_teacher_name")]
    pub teacher_name: String,
    #[serde(default = "default_report_title")]
    pub report_title: String,
}

fn default_teacher_name() -> String {
    DEFAULT_TEACHER_NAME.to_string()
}

fn default_report_title() -> String {
    DEFAULT_REPORT_TITLE.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            teacher_name: default_teacher_name(),
            report_title: default_report_title(),
        }
    }
}

/// Full copy of the records taken before a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    #[serde(default)]
    pub classes: BTreeMap<String, Class>,
    #[serde(default)]
    pub students: BTreeMap<String, Student>,
    #[serde(default)]
    pub settings: Settings,
}

/// Summary of a retained snapshot for listing.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupInfo {
    pub index: usize,
    pub taken_at: DateTime<Utc>,
    pub classes: usize,
    pub students: usize,
}

/// Everything persisted for one teacher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppData {
    /// Blobs written before versioning have no version and read as current.
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub classes: BTreeMap<String, Class>,
    #[serde(default)]
    pub students: BTreeMap<String, Student>,
    #[serde(default)]
    pub settings: Settings,
    /// Oldest first.
    #[serde(default)]
    pub backups: Vec<Snapshot>,
}

fn default_version() -> u32 {
    DATA_VERSION
}

impl Default for AppData {
    fn default() -> Self {
        Self::new()
    }
}

impl AppData {
    pub fn new() -> Self {
        Self {
            version: DATA_VERSION,
            classes: BTreeMap::new(),
            students: BTreeMap::new(),
            settings: Settings::default(),
            backups: Vec::new(),
        }
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::new()
        }
    }

    /// Students of a class, sorted by name.
    pub fn students_in_class(&self, class_name: &str) -> Vec<&Student> {
        let mut students: Vec<&Student> = self
            .students
            .values()
            .filter(|s| s.class_id == class_name)
            .collect();
        students.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        students
    }

    pub fn count_in_class(&self, class_name: &str) -> usize {
        self.students
            .values()
            .filter(|s| s.class_id == class_name)
            .count()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            taken_at: Utc::now(),
            classes: self.classes.clone(),
            students: self.students.clone(),
            settings: self.settings.clone(),
        }
    }

    /// Append a snapshot, keeping only the newest `max_backups`.
    pub fn push_backup(&mut self, snapshot: Snapshot, max_backups: usize) {
        self.backups.push(snapshot);
        if self.backups.len() > max_backups {
            let excess = self.backups.len() - max_backups;
            self.backups.drain(..excess);
            tracing::debug!("pruned {} old backup(s)", excess);
        }
    }

    pub fn backup_infos(&self) -> Vec<BackupInfo> {
        self.backups
            .iter()
            .enumerate()
            .map(|(index, snapshot)| BackupInfo {
                index,
                taken_at: snapshot.taken_at,
                classes: snapshot.classes.len(),
                students: snapshot.students.len(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_student(id: &str, name: &str, class: &str) -> Student {
        Student {
            id: id.to_string(),
            name: name.to_string(),
            class_id: class.to_string(),
            evaluations: vec![],
        }
    }

    #[test]
    fn test_new_data_empty() {
        let data = AppData::new();
        assert_eq!(data.version, DATA_VERSION);
        assert!(data.classes.is_empty());
        assert!(data.students.is_empty());
        assert_eq!(data.settings.teacher_name, DEFAULT_TEACHER_NAME);
    }

    #[test]
    fn test_backups_keep_newest() {
        let mut data = AppData::new();
        for i in 0..5 {
            data.classes.insert(
                format!("C{}", i),
                Class {
                    name: format!("C{}", i),
                    level: ClassLevel::Level1,
                },
            );
            let snapshot = data.snapshot();
            data.push_backup(snapshot, 3);
        }
        assert_eq!(data.backups.len(), 3);
        // Snapshots taken after inserting C2, C3, C4 survive.
        let sizes: Vec<usize> = data.backups.iter().map(|b| b.classes.len()).collect();
        assert_eq!(sizes, vec![3, 4, 5]);
    }

    #[test]
    fn test_students_in_class_sorted() {
        let mut data = AppData::new();
        data.students.insert("s1".into(), sample_student("s1", "Zineb", "3A"));
        data.students.insert("s2".into(), sample_student("s2", "Amine", "3A"));
        data.students.insert("s3".into(), sample_student("s3", "Omar", "3B"));

        let names: Vec<&str> = data
            .students_in_class("3A")
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["Amine", "Zineb"]);
        assert_eq!(data.count_in_class("3B"), 1);
    }

    #[test]
    fn test_legacy_record_fields() {
        let json = r#"{
            "version": 1,
            "classes": {"3A": {"name": "3A", "level": "2AC"}},
            "students": {
                "student_1": {
                    "id": "student_1",
                    "name": "Amine",
                    "class": "3A",
                    "evaluations": [{
                        "date": "2024-03-01T10:00:00Z",
                        "year": "2AC",
                        "pA": 3, "pB": 2, "pC": 1,
                        "specificReqScore": 1.5,
                        "linkingQualityValue": "poor",
                        "executionScore": 2,
                        "coCnScore": 3,
                        "coCmScore": 4,
                        "difficultyScore": 6,
                        "linkingScore": 0.5,
                        "totalScore": 17
                    }]
                }
            }
        }"#;
        let data: AppData = serde_json::from_str(json).unwrap();
        let student = &data.students["student_1"];
        assert_eq!(student.class_id, "3A");
        let eval = student.latest_evaluation().unwrap();
        assert_eq!(eval.linking_quality, LinkingQuality::Weak);
        assert_eq!(eval.performed_c, 1);
        assert_eq!(data.settings, Settings::default());
    }

    #[test]
    fn test_unversioned_blob_reads_as_current() {
        let json = r#"{
            "classes": {"3A": {"name": "3A", "level": "2AC"}},
            "students": {
                "student_1": {"id": "student_1", "name": "Amine", "class": "3A", "evaluations": []}
            },
            "settings": {"teacherName": "Pr. X", "reportTitle": "Bilan test"}
        }"#;
        let data: AppData = serde_json::from_str(json).unwrap();
        assert_eq!(data.version, DATA_VERSION);
        assert_eq!(data.students["student_1"].class_id, "3A");
        assert_eq!(data.settings.teacher_name, "Pr. X");
        assert!(data.backups.is_empty());
    }
}
