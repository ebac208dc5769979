//! Class report as CSV: one row per graded student, from their latest evaluation.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

use crate::store::Student;

#[derive(Debug, Serialize, PartialEq)]
pub struct ReportRow {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Difficulty")]
    pub difficulty: String,
    #[serde(rename = "Execution")]
    pub execution: String,
    #[serde(rename = "Specific")]
    pub specific: String,
    #[serde(rename = "Linking")]
    pub linking: String,
    #[serde(rename = "CO CN")]
    pub co_cn: String,
    #[serde(rename = "CO CM")]
    pub co_cm: String,
    #[serde(rename = "Total")]
    pub total: String,
    #[serde(rename = "Date")]
    pub date: String,
}

/// Default file name for a class report.
pub fn report_file_name(class_name: &str) -> String {
    format!("rapport-{}.csv", class_name)
}

/// Rows for the students that have at least one evaluation, in the given order.
pub fn report_rows(students: &[Student]) -> Vec<ReportRow> {
    students
        .iter()
        .filter_map(|student| {
            let eval = student.latest_evaluation()?;
            Some(ReportRow {
                id: student.id.clone(),
                name: student.name.clone(),
                difficulty: format!("{:.2}", eval.difficulty_score),
                execution: format!("{:.2}", eval.execution_score),
                specific: format!("{:.2}", eval.specific_req_score),
                linking: format!("{:.2}", eval.linking_score),
                co_cn: format!("{:.2}", eval.co_cn_score),
                co_cm: format!("{:.2}", eval.co_cm_score),
                total: format!("{:.2}", eval.total_score),
                date: eval.date.format("%Y-%m-%d").to_string(),
            })
        })
        .collect()
}

/// Write the report for `students` to `writer`. Returns the number of data rows.
pub fn write_class_report<W: Write>(students: &[Student], writer: W) -> Result<usize> {
    let rows = report_rows(students);
    let mut csv_writer = csv::Writer::from_writer(writer);

    if rows.is_empty() {
        csv_writer
            .write_record([
                "ID", "Name", "Difficulty", "Execution", "Specific", "Linking", "CO CN", "CO CM", "Total", "Date",
            ])
            .context("Failed to write CSV header")?;
    }
    for row in &rows {
        csv_writer.serialize(row).context("Failed to write CSV row")?;
    }
    csv_writer.flush().context("Failed to flush CSV output")?;

    tracing::debug!("wrote class report with {} row(s)", rows.len());
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rubric::{ClassLevel, LinkingQuality};
    use crate::store::Evaluation;
    use chrono::{TimeZone, Utc};

    fn evaluation(total: f64, day: u32) -> Evaluation {
        Evaluation {
            date: Utc.with_ymd_and_hms(2024, 3, day, 9, 30, 0).unwrap(),
            level: ClassLevel::Level2,
            performed_a: 3,
            performed_b: 2,
            performed_c: 1,
            specific_req_score: 1.5,
            linking_quality: LinkingQuality::Good,
            execution_score: 1.25,
            co_cn_score: 3.0,
            co_cm_score: 4.0,
            difficulty_score: 6.0,
            linking_score: 2.5,
            total_score: total,
        }
    }

    fn student(id: &str, name: &str, evaluations: Vec<Evaluation>) -> Student {
        Student {
            id: id.to_string(),
            name: name.to_string(),
            class_id: "3A".to_string(),
            evaluations,
        }
    }

    #[test]
    fn test_report_uses_latest_and_skips_ungraded() {
        let students = vec![
            student("s1", "Amine", vec![evaluation(12.0, 1), evaluation(18.25, 8)]),
            student("s2", "Sara", vec![]),
        ];
        let mut out = Vec::new();
        let written = write_class_report(&students, &mut out).unwrap();
        assert_eq!(written, 1);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "ID,Name,Difficulty,Execution,Specific,Linking,CO CN,CO CM,Total,Date"
        );
        assert_eq!(lines[1], "s1,Amine,6.00,1.25,1.50,2.50,3.00,4.00,18.25,2024-03-08");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_empty_report_has_header() {
        let mut out = Vec::new();
        assert_eq!(write_class_report(&[], &mut out).unwrap(), 0);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("ID,Name,"));
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(report_file_name("3A"), "rapport-3A.csv");
    }
}
