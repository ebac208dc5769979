mod schema;

pub use schema::{
    Config, DefaultSettings, Limits, DEFAULT_MAX_BACKUPS, DEFAULT_MAX_CLASSES,
    DEFAULT_MAX_EVALUATIONS_PER_STUDENT, DEFAULT_MAX_STUDENTS_PER_CLASS,
};

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::validation::{validate_report_title, validate_teacher_name};

/// Get the config directory path (~/.config/calgym/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("calgym"))
}

/// Get the default config file path (~/.config/calgym/config.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.yaml"))
}

/// Directory holding per-teacher data files: `data_dir` from config, else ~/.config/calgym/data
pub fn data_dir(config: &Config) -> Result<PathBuf> {
    match &config.data_dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(get_config_dir()?.join("data")),
    }
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, uses the default path and
///   falls back to built-in defaults when that file does not exist.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let (config_path, explicit) = match path {
        Some(p) => (p, true),
        None => (get_config_path()?, false),
    };

    if !config_path.exists() {
        if explicit {
            anyhow::bail!("Config file not found at {}", config_path.display());
        }
        tracing::debug!("no config at {}, using defaults", config_path.display());
        return Ok(Config::default());
    }

    parse_config_file(&config_path)
}

fn parse_config_file(config_path: &Path) -> Result<Config> {
    let config_content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    if config_content.trim().is_empty() {
        return Ok(Config::default());
    }

    let config: Config = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?;

    Ok(config)
}

/// Validate configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let limits = [
        ("limits.max_classes", config.limits.max_classes),
        ("limits.max_students_per_class", config.limits.max_students_per_class),
        ("limits.max_evaluations_per_student", config.limits.max_evaluations_per_student),
        ("limits.max_backups", config.limits.max_backups),
    ];
    for (name, value) in limits {
        if value == 0 {
            errors.push(format!("{}: must be at least 1", name));
        }
    }

    if !validate_teacher_name(&config.defaults.teacher_name) {
        errors.push(format!(
            "defaults.teacher_name: '{}' must be 2-100 characters",
            config.defaults.teacher_name
        ));
    }
    if !validate_report_title(&config.defaults.report_title) {
        errors.push(format!(
            "defaults.report_title: '{}' must be 5-200 characters",
            config.defaults.report_title
        ));
    }

    if let Some(ref teacher) = config.teacher {
        if crate::identity::normalize_identity(teacher).is_none() {
            errors.push(format!("teacher: '{}' is not a valid identity", teacher));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
