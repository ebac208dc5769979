use uuid::Uuid;

use super::error::{Outcome, Rejection, StoreError};
use super::persistence::Persistence;
use super::session::Session;
use super::types::{AppData, BackupInfo, Class, Settings, Student, DATA_VERSION};
use crate::config::Limits;
use crate::rubric::ClassLevel;
use crate::validation::{
    validate_class_name, validate_evaluation_input, validate_report_title, validate_student_name,
    validate_teacher_name, RawEvaluation,
};

/// Owns one teacher's classes, students and evaluations at a time.
///
/// Every call loads the teacher's records through the persistence collaborator,
/// applies the change and writes them back. A successful mutation first records
/// a snapshot of the previous state; rejected operations write nothing.
/// Single writer only: nothing here guards against concurrent sessions on the
/// same identity.
pub struct RecordStore<P: Persistence> {
    persistence: P,
    limits: Limits,
    default_settings: Settings,
}

impl<P: Persistence> RecordStore<P> {
    pub fn new(persistence: P, limits: Limits) -> Self {
        Self {
            persistence,
            limits,
            default_settings: Settings::default(),
        }
    }

    /// Settings a teacher starts with when their store is first created.
    pub fn with_default_settings(mut self, settings: Settings) -> Self {
        self.default_settings = settings;
        self
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// All of the teacher's records. Empty on first access.
    pub fn load(&self, session: &Session) -> Result<AppData, StoreError> {
        let key = session.storage_key()?;
        self.load_key(&key)
    }

    fn load_key(&self, key: &str) -> Result<AppData, StoreError> {
        let Some(blob) = self.persistence.load(key)? else {
            tracing::debug!("no records under {}, starting empty", key);
            return Ok(AppData::with_settings(self.default_settings.clone()));
        };

        let data: AppData =
            serde_json::from_str(&blob).map_err(|e| StoreError::Corrupted(e.to_string()))?;
        if data.version != DATA_VERSION {
            return Err(StoreError::Corrupted(format!(
                "unsupported data version {}",
                data.version
            )));
        }
        Ok(data)
    }

    fn save_key(&mut self, key: &str, data: &AppData) -> Result<(), StoreError> {
        let blob = serde_json::to_string_pretty(data).map_err(anyhow::Error::from)?;
        self.persistence.store(key, &blob)?;
        Ok(())
    }

    /// Run `op` on the teacher's records. If it succeeds, the prior state is
    /// pushed as a backup and everything is persisted.
    fn mutate<F>(&mut self, session: &Session, action: &str, op: F) -> Result<Outcome, StoreError>
    where
        F: FnOnce(&mut AppData, &Limits) -> Result<Outcome, Rejection>,
    {
        let key = session.storage_key()?;
        let mut data = self.load_key(&key)?;
        let snapshot = data.snapshot();

        match op(&mut data, &self.limits) {
            Ok(outcome) => {
                data.push_backup(snapshot, self.limits.max_backups);
                self.save_key(&key, &data)?;
                tracing::info!("{}: {}", action, outcome.message());
                Ok(outcome)
            }
            Err(rejection) => {
                tracing::warn!("{} rejected: {}", action, rejection);
                Ok(Outcome::Rejected(rejection))
            }
        }
    }

    pub fn add_class(&mut self, session: &Session, name: &str, level: &str) -> Result<Outcome, StoreError> {
        let name = name.trim().to_string();
        let level_code = level.to_string();
        self.mutate(session, "add class", move |data, limits| {
            if !validate_class_name(&name) {
                return Err(Rejection::InvalidClassName(name));
            }
            let level = ClassLevel::from_code(&level_code).ok_or(Rejection::InvalidClassLevel(level_code))?;
            if data.classes.contains_key(&name) {
                return Err(Rejection::ClassExists(name));
            }
            if data.classes.len() >= limits.max_classes {
                return Err(Rejection::ClassLimit(limits.max_classes));
            }

            data.classes.insert(name.clone(), Class { name: name.clone(), level });
            Ok(Outcome::created("Class added.", name))
        })
    }

    /// Rename and/or re-level a class. Students of the old name follow the rename.
    pub fn edit_class(
        &mut self,
        session: &Session,
        old_name: &str,
        new_name: &str,
        new_level: &str,
    ) -> Result<Outcome, StoreError> {
        let old_name = old_name.trim().to_string();
        let new_name = new_name.trim().to_string();
        let level_code = new_level.to_string();
        self.mutate(session, "edit class", move |data, _| {
            if !data.classes.contains_key(&old_name) {
                return Err(Rejection::ClassNotFound(old_name));
            }
            if !validate_class_name(&new_name) {
                return Err(Rejection::InvalidClassName(new_name));
            }
            let level = ClassLevel::from_code(&level_code).ok_or(Rejection::InvalidClassLevel(level_code))?;
            if new_name != old_name && data.classes.contains_key(&new_name) {
                return Err(Rejection::ClassExists(new_name));
            }

            data.classes.remove(&old_name);
            data.classes.insert(
                new_name.clone(),
                Class {
                    name: new_name.clone(),
                    level,
                },
            );

            let mut moved = 0;
            for student in data.students.values_mut() {
                if student.class_id == old_name {
                    student.class_id = new_name.clone();
                    moved += 1;
                }
            }
            if moved > 0 {
                tracing::debug!("moved {} student(s) from '{}' to '{}'", moved, old_name, new_name);
            }
            Ok(Outcome::applied("Class updated."))
        })
    }

    /// Delete a class. Refused while any student still belongs to it.
    pub fn delete_class(&mut self, session: &Session, name: &str) -> Result<Outcome, StoreError> {
        let name = name.trim().to_string();
        self.mutate(session, "delete class", move |data, _| {
            if !data.classes.contains_key(&name) {
                return Err(Rejection::ClassNotFound(name));
            }
            let count = data.count_in_class(&name);
            if count > 0 {
                return Err(Rejection::ClassHasStudents { name, count });
            }

            data.classes.remove(&name);
            Ok(Outcome::applied("Class deleted."))
        })
    }

    /// Add a student to an existing class. The class is never created implicitly.
    pub fn add_student(&mut self, session: &Session, name: &str, class_id: &str) -> Result<Outcome, StoreError> {
        let name = name.trim().to_string();
        let class_id = class_id.trim().to_string();
        self.mutate(session, "add student", move |data, limits| {
            if !validate_student_name(&name) {
                return Err(Rejection::InvalidStudentName(name));
            }
            if !data.classes.contains_key(&class_id) {
                return Err(Rejection::ClassNotFound(class_id));
            }
            if data
                .students
                .values()
                .any(|s| s.class_id == class_id && s.name == name)
            {
                return Err(Rejection::StudentExists { name, class: class_id });
            }
            if data.count_in_class(&class_id) >= limits.max_students_per_class {
                return Err(Rejection::StudentLimit {
                    class: class_id,
                    limit: limits.max_students_per_class,
                });
            }

            let id = format!("student_{}", Uuid::new_v4().simple());
            data.students.insert(
                id.clone(),
                Student {
                    id: id.clone(),
                    name,
                    class_id,
                    evaluations: Vec::new(),
                },
            );
            Ok(Outcome::created("Student added.", id))
        })
    }

    /// Rename a student and/or move them to another existing class.
    pub fn edit_student(
        &mut self,
        session: &Session,
        student_id: &str,
        new_name: &str,
        new_class: &str,
    ) -> Result<Outcome, StoreError> {
        let student_id = student_id.to_string();
        let new_name = new_name.trim().to_string();
        let new_class = new_class.trim().to_string();
        self.mutate(session, "edit student", move |data, limits| {
            let Some(current_class) = data.students.get(&student_id).map(|s| s.class_id.clone()) else {
                return Err(Rejection::StudentNotFound(student_id));
            };
            if !validate_student_name(&new_name) {
                return Err(Rejection::InvalidStudentName(new_name));
            }
            if !data.classes.contains_key(&new_class) {
                return Err(Rejection::ClassNotFound(new_class));
            }
            if data
                .students
                .values()
                .any(|s| s.id != student_id && s.class_id == new_class && s.name == new_name)
            {
                return Err(Rejection::StudentExists {
                    name: new_name,
                    class: new_class,
                });
            }
            if new_class != current_class && data.count_in_class(&new_class) >= limits.max_students_per_class {
                return Err(Rejection::StudentLimit {
                    class: new_class,
                    limit: limits.max_students_per_class,
                });
            }

            if let Some(student) = data.students.get_mut(&student_id) {
                student.name = new_name;
                student.class_id = new_class;
            }
            Ok(Outcome::applied("Student updated."))
        })
    }

    pub fn delete_student(&mut self, session: &Session, student_id: &str) -> Result<Outcome, StoreError> {
        let student_id = student_id.to_string();
        self.mutate(session, "delete student", move |data, _| {
            if data.students.remove(&student_id).is_none() {
                return Err(Rejection::StudentNotFound(student_id));
            }
            Ok(Outcome::applied("Student deleted."))
        })
    }

    /// Normalize `raw` and append it to the student's history.
    pub fn save_evaluation(
        &mut self,
        session: &Session,
        student_id: &str,
        raw: &RawEvaluation,
    ) -> Result<Outcome, StoreError> {
        let student_id = student_id.to_string();
        self.mutate(session, "save evaluation", move |data, limits| {
            let Some(student) = data.students.get_mut(&student_id) else {
                return Err(Rejection::StudentNotFound(student_id));
            };
            if student.evaluations.len() >= limits.max_evaluations_per_student {
                return Err(Rejection::EvaluationLimit {
                    student: student_id,
                    limit: limits.max_evaluations_per_student,
                });
            }

            let evaluation = validate_evaluation_input(raw);
            let message = format!("Evaluation saved ({:.2} / 20).", evaluation.total_score);
            student.evaluations.push(evaluation);
            Ok(Outcome::applied(message))
        })
    }

    /// Save several evaluations (a class graded in one sitting). Each entry is
    /// applied on its own; one outcome per entry, in order.
    pub fn save_evaluations(
        &mut self,
        session: &Session,
        entries: &[(String, RawEvaluation)],
    ) -> Result<Vec<Outcome>, StoreError> {
        entries
            .iter()
            .map(|(student_id, raw)| self.save_evaluation(session, student_id, raw))
            .collect()
    }

    /// Remove an evaluation by position. Later evaluations shift down.
    pub fn delete_evaluation(
        &mut self,
        session: &Session,
        student_id: &str,
        index: usize,
    ) -> Result<Outcome, StoreError> {
        let student_id = student_id.to_string();
        self.mutate(session, "delete evaluation", move |data, _| {
            let Some(student) = data.students.get_mut(&student_id) else {
                return Err(Rejection::StudentNotFound(student_id));
            };
            if index >= student.evaluations.len() {
                return Err(Rejection::EvaluationNotFound {
                    student: student_id,
                    index,
                });
            }

            student.evaluations.remove(index);
            Ok(Outcome::applied("Evaluation deleted."))
        })
    }

    pub fn update_settings(
        &mut self,
        session: &Session,
        teacher_name: &str,
        report_title: &str,
    ) -> Result<Outcome, StoreError> {
        let teacher_name = teacher_name.trim().to_string();
        let report_title = report_title.trim().to_string();
        self.mutate(session, "update settings", move |data, _| {
            if !validate_teacher_name(&teacher_name) {
                return Err(Rejection::InvalidSetting(format!(
                    "teacher name '{}' must be 2-100 characters",
                    teacher_name
                )));
            }
            if !validate_report_title(&report_title) {
                return Err(Rejection::InvalidSetting(format!(
                    "report title '{}' must be 5-200 characters",
                    report_title
                )));
            }

            data.settings = Settings {
                teacher_name,
                report_title,
            };
            Ok(Outcome::applied("Settings updated."))
        })
    }

    /// Bring back the records of backup `index` (0 is the oldest retained).
    /// The state being replaced is itself backed up, so a restore can be undone.
    pub fn restore_backup(&mut self, session: &Session, index: usize) -> Result<Outcome, StoreError> {
        self.mutate(session, "restore backup", move |data, _| {
            let Some(snapshot) = data.backups.get(index).cloned() else {
                return Err(Rejection::BackupNotFound(index));
            };

            data.classes = snapshot.classes;
            data.students = snapshot.students;
            data.settings = snapshot.settings;
            Ok(Outcome::applied(format!(
                "Data restored from backup taken {}.",
                snapshot.taken_at.format("%Y-%m-%d %H:%M:%S")
            )))
        })
    }

    /// Classes sorted by name.
    pub fn classes(&self, session: &Session) -> Result<Vec<Class>, StoreError> {
        Ok(self.load(session)?.classes.into_values().collect())
    }

    pub fn class(&self, session: &Session, name: &str) -> Result<Option<Class>, StoreError> {
        Ok(self.load(session)?.classes.remove(name.trim()))
    }

    /// All students with their evaluation history, sorted by class then name.
    pub fn students(&self, session: &Session) -> Result<Vec<Student>, StoreError> {
        let mut students: Vec<Student> = self.load(session)?.students.into_values().collect();
        students.sort_by(|a, b| {
            a.class_id
                .cmp(&b.class_id)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(students)
    }

    pub fn students_in_class(&self, session: &Session, class_name: &str) -> Result<Vec<Student>, StoreError> {
        let data = self.load(session)?;
        Ok(data
            .students_in_class(class_name.trim())
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn student(&self, session: &Session, student_id: &str) -> Result<Option<Student>, StoreError> {
        Ok(self.load(session)?.students.remove(student_id))
    }

    pub fn settings(&self, session: &Session) -> Result<Settings, StoreError> {
        Ok(self.load(session)?.settings)
    }

    pub fn list_backups(&self, session: &Session) -> Result<Vec<BackupInfo>, StoreError> {
        Ok(self.load(session)?.backup_infos())
    }
}
