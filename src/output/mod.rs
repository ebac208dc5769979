pub mod formatter;

pub use formatter::{
    format_backups, format_breakdown, format_class_list, format_settings, format_student_detail,
    format_student_list, format_student_tsv, format_total, should_use_colors,
};
