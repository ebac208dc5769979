//! Bulk student import from a CSV roster.
//!
//! The roster needs a header row with a name column (`name`, `Name`, `nom` or
//! `Nom`) and a class column (`class`, `Class`, `classe` or `Classe`). Other
//! columns are ignored. Each row goes through the regular record-store path,
//! so one bad row never blocks the rest.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use crate::rubric::ClassLevel;
use crate::store::{Persistence, RecordStore, Session};
use crate::validation::names::{CLASS_NAME_MAX, STUDENT_NAME_MAX};
use crate::validation::{sanitize_text_input, validate_class_name, validate_student_name};

/// Largest roster file accepted from disk.
pub const MAX_IMPORT_BYTES: u64 = 5 * 1024 * 1024;

const NAME_HEADERS: [&str; 4] = ["name", "Name", "nom", "Nom"];
const CLASS_HEADERS: [&str; 4] = ["class", "Class", "classe", "Classe"];

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Create classes the roster mentions but the store lacks, at this level.
    /// When None, rows naming an unknown class fail.
    pub create_missing_classes: Option<ClassLevel>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    pub imported: usize,
    pub failed: usize,
    pub created_classes: Vec<String>,
    /// One `Row N: message` line per failed row, N counted from the first data row.
    pub errors: Vec<String>,
}

impl ImportSummary {
    fn fail(&mut self, row: usize, message: impl std::fmt::Display) {
        self.failed += 1;
        self.errors.push(format!("Row {}: {}", row, message));
    }
}

fn find_column(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| candidates.contains(&h.trim()))
}

/// Import students from a CSV file on disk.
///
/// Only `.csv` files of at most [`MAX_IMPORT_BYTES`] are read.
pub fn import_students_from_path<P: Persistence>(
    store: &mut RecordStore<P>,
    session: &Session,
    path: &Path,
    options: &ImportOptions,
) -> Result<ImportSummary> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if !is_csv {
        anyhow::bail!("{} is not a .csv file", path.display());
    }
    let size = fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?
        .len();
    if size > MAX_IMPORT_BYTES {
        anyhow::bail!("{} is larger than 5 MB", path.display());
    }

    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    import_students(store, session, file, options)
}

/// Import students from CSV data.
///
/// # Errors
///
/// Fails without importing anything when the identity is missing, the CSV
/// cannot be read, or the header lacks a name or class column. Row-level
/// problems are tallied in the returned summary instead.
///
/// Every imported row (and every class created for it) is a separate change
/// with its own backup. Importing `max_backups` rows or more therefore
/// replaces all backups taken before the import.
pub fn import_students<P: Persistence, R: Read>(
    store: &mut RecordStore<P>,
    session: &Session,
    reader: R,
    options: &ImportOptions,
) -> Result<ImportSummary> {
    // Surface a missing identity before touching the roster.
    store.load(session)?;

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers().context("Failed to read CSV header")?.clone();
    let name_col = find_column(&headers, &NAME_HEADERS).context("CSV header has no name column")?;
    let class_col = find_column(&headers, &CLASS_HEADERS).context("CSV header has no class column")?;

    let mut summary = ImportSummary::default();
    for (index, record) in reader.records().enumerate() {
        let row = index + 1;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                summary.fail(row, format!("unreadable row ({})", e));
                continue;
            }
        };

        let name = sanitize_text_input(record.get(name_col).unwrap_or(""), STUDENT_NAME_MAX);
        let class = sanitize_text_input(record.get(class_col).unwrap_or(""), CLASS_NAME_MAX);
        if name.is_empty() && class.is_empty() && record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        if name.is_empty() || class.is_empty() {
            summary.fail(row, "missing name or class");
            continue;
        }
        if !validate_student_name(&name) {
            summary.fail(row, format!("invalid name \"{}\"", name));
            continue;
        }
        if !validate_class_name(&class) {
            summary.fail(row, format!("invalid class \"{}\"", class));
            continue;
        }

        if let Some(level) = options.create_missing_classes {
            if store.class(session, &class)?.is_none() {
                let outcome = store.add_class(session, &class, level.code())?;
                if !outcome.success() {
                    summary.fail(row, outcome.message());
                    continue;
                }
                summary.created_classes.push(class.clone());
            }
        }

        let outcome = store.add_student(session, &name, &class)?;
        if outcome.success() {
            summary.imported += 1;
        } else {
            summary.fail(row, outcome.message());
        }
    }

    tracing::info!(
        "import finished: {} imported, {} failed, {} class(es) created",
        summary.imported,
        summary.failed,
        summary.created_classes.len()
    );
    Ok(summary)
}
