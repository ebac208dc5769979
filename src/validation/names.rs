use crate::rubric::ClassLevel;

pub const CLASS_NAME_MAX: usize = 50;
pub const STUDENT_NAME_MAX: usize = 100;
pub const TEACHER_NAME_MIN: usize = 2;
pub const TEACHER_NAME_MAX: usize = 100;
pub const REPORT_TITLE_MIN: usize = 5;
pub const REPORT_TITLE_MAX: usize = 200;

/// Latin-1 accented letters (À through ÿ), accepted in names.
fn is_latin1_letter(c: char) -> bool {
    ('\u{C0}'..='\u{FF}').contains(&c)
}

fn length_within(value: &str, min: usize, max: usize) -> bool {
    let len = value.chars().count();
    len >= min && len <= max
}

pub fn validate_class_level(code: &str) -> bool {
    ClassLevel::from_code(code).is_some()
}

/// 1-50 characters of letters, digits, spaces, hyphens and underscores.
pub fn validate_class_name(name: &str) -> bool {
    let name = name.trim();
    length_within(name, 1, CLASS_NAME_MAX)
        && name.chars().all(|c| {
            c.is_ascii_alphanumeric() || c.is_whitespace() || c == '-' || c == '_' || is_latin1_letter(c)
        })
}

/// 1-100 characters of letters, spaces, hyphens, apostrophes and periods.
pub fn validate_student_name(name: &str) -> bool {
    let name = name.trim();
    length_within(name, 1, STUDENT_NAME_MAX)
        && name.chars().all(|c| {
            c.is_ascii_alphabetic()
                || c.is_whitespace()
                || c == '-'
                || c == '\''
                || c == '.'
                || is_latin1_letter(c)
        })
}

pub fn validate_teacher_name(name: &str) -> bool {
    length_within(name.trim(), TEACHER_NAME_MIN, TEACHER_NAME_MAX)
}

pub fn validate_report_title(title: &str) -> bool {
    length_within(title.trim(), REPORT_TITLE_MIN, REPORT_TITLE_MAX)
}

/// Trim a free-text field and cut it to `max_len` characters.
pub fn sanitize_text_input(input: &str, max_len: usize) -> String {
    input.trim().chars().take(max_len).collect()
}
