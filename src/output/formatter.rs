use std::io::IsTerminal;
use owo_colors::OwoColorize;

use crate::rubric::MAX_TOTAL;
use crate::scoring::ScoreBreakdown;
use crate::store::{BackupInfo, Class, Evaluation, Settings, Student};

/// Width of the component label column in a score breakdown
const LABEL_WIDTH: usize = 26;

/// Width of the name column in student listings
const NAME_WIDTH: usize = 32;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a 0-20 total as "12.50 / 20", or "No grade" when there is none
pub fn format_total(total: Option<f64>) -> String {
    match total {
        Some(total) => format!("{:.2} / {}", total, MAX_TOTAL),
        None => "No grade".to_string(),
    }
}

/// Colour a total by band: green from 15, yellow from 10, red below
fn colorize_total(total: Option<f64>, text: &str) -> String {
    match total {
        Some(t) if t >= 15.0 => text.green().to_string(),
        Some(t) if t >= 10.0 => text.yellow().to_string(),
        Some(_) => text.red().to_string(),
        None => text.dimmed().to_string(),
    }
}

/// Truncate a name to fit a column, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Pad by char count so accented names line up
fn pad_right(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - len))
    }
}

/// Format the six-component breakdown followed by the total.
/// Notes (the difficulty trail) are indented under their component.
pub fn format_breakdown(breakdown: &ScoreBreakdown, use_colors: bool) -> String {
    let mut lines = Vec::new();
    let header = format!("Level {}", breakdown.level);
    lines.push(if use_colors { header.bold().to_string() } else { header });

    for component in &breakdown.components {
        let value = format!("{:>5.2} / {}", component.value, component.max);
        let label = pad_right(component.label, LABEL_WIDTH);
        if use_colors {
            lines.push(format!("{}{}", label, value.bold()));
        } else {
            lines.push(format!("{}{}", label, value));
        }
        for note in &component.notes {
            if use_colors {
                lines.push(format!("    {}", note.dimmed()));
            } else {
                lines.push(format!("    {}", note));
            }
        }
    }

    let total = format_total(Some(breakdown.total));
    let label = pad_right("Total", LABEL_WIDTH);
    if use_colors {
        lines.push(format!("{}{}", label.bold(), colorize_total(Some(breakdown.total), &total)));
    } else {
        lines.push(format!("{}{}", label, total));
    }
    lines.join("\n")
}

/// Format classes as one line per class: name, level, student count
pub fn format_class_list(classes: &[(Class, usize)], use_colors: bool) -> String {
    if classes.is_empty() {
        return "No classes yet.".to_string();
    }

    classes
        .iter()
        .map(|(class, count)| {
            if use_colors {
                format!("{}  [{}]  {} student(s)", class.name.bold(), class.level.cyan(), count)
            } else {
                format!("{}  [{}]  {} student(s)", class.name, class.level, count)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format students as a table: index, name, latest total, id
/// No headers; index is 1-based and right-aligned
pub fn format_student_list(students: &[Student], use_colors: bool) -> String {
    if students.is_empty() {
        return "No students found.".to_string();
    }

    students
        .iter()
        .enumerate()
        .map(|(idx, student)| {
            let index_str = format!("{:>3}.", idx + 1);
            let name = pad_right(&truncate_name(&student.name, NAME_WIDTH), NAME_WIDTH);
            let latest = student.latest_evaluation().map(|e| e.total_score);
            let total = format!("{:>12}", format_total(latest));

            if use_colors {
                format!(
                    "{} {}  {}  {}",
                    index_str.dimmed(),
                    name,
                    colorize_total(latest, &total),
                    student.id.dimmed()
                )
            } else {
                format!("{} {}  {}  {}", index_str, name, total, student.id)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format students as tab-separated values for scripting
/// Columns: id, name, class, latest total (empty when ungraded)
pub fn format_student_tsv(students: &[Student]) -> String {
    students
        .iter()
        .map(|student| {
            let total = student
                .latest_evaluation()
                .map(|e| format!("{:.2}", e.total_score))
                .unwrap_or_default();
            format!("{}\t{}\t{}\t{}", student.id, student.name, student.class_id, total)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_evaluation_line(index: usize, eval: &Evaluation) -> String {
    format!(
        "  #{:<3} {}  {}  {}A {}B {}C  {}",
        index,
        eval.date.format("%Y-%m-%d"),
        eval.level,
        eval.performed_a,
        eval.performed_b,
        eval.performed_c,
        format_total(Some(eval.total_score))
    )
}

/// Format a single student with their evaluation history (oldest first)
pub fn format_student_detail(student: &Student, use_colors: bool) -> String {
    let latest = student.latest_evaluation().map(|e| e.total_score);
    let mut lines = Vec::new();

    if use_colors {
        lines.push(format!("{}", student.name.bold()));
        lines.push(format!("  Class: {}", student.class_id.cyan()));
        lines.push(format!("  Id: {}", student.id.dimmed()));
        lines.push(format!("  Latest: {}", colorize_total(latest, &format_total(latest))));
    } else {
        lines.push(student.name.clone());
        lines.push(format!("  Class: {}", student.class_id));
        lines.push(format!("  Id: {}", student.id));
        lines.push(format!("  Latest: {}", format_total(latest)));
    }

    if student.evaluations.is_empty() {
        lines.push("  No evaluations yet.".to_string());
    } else {
        lines.push(format!("  Evaluations ({}):", student.evaluations.len()));
        for (index, eval) in student.evaluations.iter().enumerate() {
            lines.push(format_evaluation_line(index, eval));
        }
    }
    lines.join("\n")
}

pub fn format_settings(settings: &Settings) -> String {
    format!(
        "Teacher: {}\nReport title: {}",
        settings.teacher_name, settings.report_title
    )
}

/// Format retained backups, oldest first
pub fn format_backups(backups: &[BackupInfo], use_colors: bool) -> String {
    if backups.is_empty() {
        return "No backups yet.".to_string();
    }

    backups
        .iter()
        .map(|info| {
            let taken = info.taken_at.format("%Y-%m-%d %H:%M:%S").to_string();
            let index_str = format!("{:>3}.", info.index);
            if use_colors {
                format!(
                    "{} {}  {} class(es), {} student(s)",
                    index_str.dimmed(),
                    taken.bold(),
                    info.classes,
                    info.students
                )
            } else {
                format!(
                    "{} {}  {} class(es), {} student(s)",
                    index_str, taken, info.classes, info.students
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
