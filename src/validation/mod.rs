pub mod evaluation;
pub mod names;

pub use evaluation::{validate_evaluation_input, validate_evaluation_json, RawEvaluation};
pub use names::{
    sanitize_text_input, validate_class_level, validate_class_name, validate_report_title,
    validate_student_name, validate_teacher_name,
};
