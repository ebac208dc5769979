use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::path::PathBuf;

use calgym::config::Config;
use calgym::identity::{get_teacher_from_env, resolve_teacher};
use calgym::import::ImportOptions;
use calgym::output;
use calgym::rubric::{ClassLevel, LinkingQuality};
use calgym::scoring::{score_evaluation, RoutineInputs};
use calgym::store::{FilePersistence, Outcome, RecordStore, Session, StoreError};
use calgym::validation::RawEvaluation;

const EXIT_SUCCESS: i32 = 0;
const EXIT_AUTH: i32 = 1;
const EXIT_STORAGE: i32 = 2;
const EXIT_CONFIG: i32 = 4;
const EXIT_REJECTED: i32 = 5;

/// Rubric inputs shared by `calc` and `eval add`
#[derive(Args, Debug)]
struct RoutineArgs {
    /// Performed A elements
    #[arg(short = 'a', long = "a-count", default_value_t = 0)]
    a: u32,

    /// Performed B elements
    #[arg(short = 'b', long = "b-count", default_value_t = 0)]
    b: u32,

    /// Performed C elements
    #[arg(short = 'C', long = "c-count", default_value_t = 0)]
    c: u32,

    /// Specific requirements score (0-1.5)
    #[arg(long, default_value_t = 0.0)]
    specific: f64,

    /// Linking quality: excellent, good, average or weak
    #[arg(long, default_value_t = LinkingQuality::Average)]
    linking: LinkingQuality,

    /// Execution score (0-2)
    #[arg(long, default_value_t = 0.0)]
    execution: f64,

    /// Knowledge score, CO CN (0-3)
    #[arg(long, default_value_t = 0.0)]
    co_cn: f64,

    /// Conduct score, CO CM (0 to 3, 4 or 5 depending on level)
    #[arg(long, default_value_t = 0.0)]
    co_cm: f64,
}

impl RoutineArgs {
    fn to_inputs(&self) -> RoutineInputs {
        RoutineInputs {
            performed_a: self.a,
            performed_b: self.b,
            performed_c: self.c,
            specific_req_score: self.specific,
            linking_quality: self.linking,
            execution_score: self.execution,
            co_cn_score: self.co_cn,
            co_cm_score: self.co_cm,
        }
    }
}

#[derive(Subcommand, Debug)]
enum ClassCommand {
    /// Create a class
    Add {
        name: String,
        /// 1AC, 2AC or 3AC
        #[arg(long, default_value = "2AC")]
        level: String,
    },
    /// Rename a class and/or change its level; its students follow
    Edit {
        name: String,
        new_name: String,
        /// New level; keeps the current one when omitted
        #[arg(long)]
        level: Option<String>,
    },
    /// Delete a class that has no students
    Delete { name: String },
    /// List classes with their student counts
    List,
}

#[derive(Subcommand, Debug)]
enum StudentCommand {
    /// Add a student to an existing class
    Add { name: String, class: String },
    /// Rename a student and/or move them to another class
    Edit { id: String, name: String, class: String },
    /// Delete a student and their evaluations
    Delete { id: String },
    /// List students, optionally for a single class
    List {
        #[arg(long)]
        class: Option<String>,
        /// Tab-separated output for scripting
        #[arg(long)]
        tsv: bool,
    },
    /// Show a student's evaluation history
    Show { id: String },
}

#[derive(Subcommand, Debug)]
enum EvalCommand {
    /// Grade a routine and store it (level comes from the student's class)
    Add {
        student_id: String,
        #[command(flatten)]
        routine: RoutineArgs,
        /// Evaluation date (YYYY-MM-DD or RFC 3339); defaults to now
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete an evaluation by its index in the student's history
    Delete { student_id: String, index: usize },
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    Show,
    /// Change the teacher name and/or report title
    Set {
        #[arg(long)]
        teacher_name: Option<String>,
        #[arg(long)]
        report_title: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum BackupCommand {
    /// List retained snapshots, oldest first
    List,
    /// Replace current records with a snapshot (the current state is backed up first)
    Restore { index: usize },
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score a routine without storing it
    Calc {
        /// 1AC, 2AC or 3AC
        #[arg(long, default_value_t = ClassLevel::Level2)]
        level: ClassLevel,
        #[command(flatten)]
        routine: RoutineArgs,
    },
    #[command(subcommand)]
    Class(ClassCommand),
    #[command(subcommand)]
    Student(StudentCommand),
    #[command(subcommand)]
    Eval(EvalCommand),
    /// Import students from a CSV roster (name and class columns)
    Import {
        csv: PathBuf,
        /// Create classes missing from the store at this level
        #[arg(long)]
        create_classes: Option<ClassLevel>,
    },
    /// Export a class report as CSV (stdout unless --output is given)
    Export {
        class: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    #[command(subcommand)]
    Settings(SettingsCommand),
    #[command(subcommand)]
    Backup(BackupCommand),
}

#[derive(Parser, Debug)]
#[command(name = "calgym")]
#[command(about = "Floor-gymnastics grading and class records", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/calgym/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Teacher identity (overrides CALGYM_TEACHER and the config file)
    #[arg(long, global = true)]
    teacher: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "calgym=debug" } else { "calgym=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Print an outcome and map it to an exit code
fn report(outcome: &Outcome) -> i32 {
    match outcome.id() {
        Some(id) if outcome.success() => {
            println!("{} ({})", outcome.message(), id);
            EXIT_SUCCESS
        }
        _ if outcome.success() => {
            println!("{}", outcome.message());
            EXIT_SUCCESS
        }
        _ => {
            eprintln!("Rejected: {}", outcome.message());
            EXIT_REJECTED
        }
    }
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<StoreError>() {
        Some(StoreError::Unauthorized) => EXIT_AUTH,
        _ => EXIT_STORAGE,
    }
}

fn open_store(config: &Config) -> Result<RecordStore<FilePersistence>> {
    let dir = calgym::config::data_dir(config)?;
    tracing::debug!("data directory: {}", dir.display());
    Ok(RecordStore::new(FilePersistence::new(dir), config.limits)
        .with_default_settings(config.defaults.to_settings()))
}

fn run_class(store: &mut RecordStore<FilePersistence>, session: &Session, command: ClassCommand) -> Result<i32> {
    let use_colors = output::should_use_colors();
    let code = match command {
        ClassCommand::Add { name, level } => report(&store.add_class(session, &name, &level)?),
        ClassCommand::Edit { name, new_name, level } => {
            let level = match level {
                Some(level) => level,
                None => store
                    .class(session, &name)?
                    .map(|class| class.level)
                    .unwrap_or_default()
                    .to_string(),
            };
            report(&store.edit_class(session, &name, &new_name, &level)?)
        }
        ClassCommand::Delete { name } => report(&store.delete_class(session, &name)?),
        ClassCommand::List => {
            let data = store.load(session)?;
            let classes: Vec<_> = data
                .classes
                .values()
                .map(|class| (class.clone(), data.count_in_class(&class.name)))
                .collect();
            println!("{}", output::format_class_list(&classes, use_colors));
            EXIT_SUCCESS
        }
    };
    Ok(code)
}

fn run_student(
    store: &mut RecordStore<FilePersistence>,
    session: &Session,
    command: StudentCommand,
) -> Result<i32> {
    let use_colors = output::should_use_colors();
    let code = match command {
        StudentCommand::Add { name, class } => report(&store.add_student(session, &name, &class)?),
        StudentCommand::Edit { id, name, class } => report(&store.edit_student(session, &id, &name, &class)?),
        StudentCommand::Delete { id } => report(&store.delete_student(session, &id)?),
        StudentCommand::List { class, tsv } => {
            let students = match class {
                Some(ref class) => store.students_in_class(session, class)?,
                None => store.students(session)?,
            };
            if tsv {
                println!("{}", output::format_student_tsv(&students));
            } else {
                println!("{}", output::format_student_list(&students, use_colors));
            }
            EXIT_SUCCESS
        }
        StudentCommand::Show { id } => match store.student(session, &id)? {
            Some(student) => {
                println!("{}", output::format_student_detail(&student, use_colors));
                EXIT_SUCCESS
            }
            None => {
                eprintln!("Rejected: student '{}' not found", id);
                EXIT_REJECTED
            }
        },
    };
    Ok(code)
}

fn run_eval(store: &mut RecordStore<FilePersistence>, session: &Session, command: EvalCommand) -> Result<i32> {
    let code = match command {
        EvalCommand::Add {
            student_id,
            routine,
            date,
        } => {
            let data = store.load(session)?;
            // Unknown students fall through to the store's own rejection.
            let level = data
                .students
                .get(&student_id)
                .and_then(|s| data.classes.get(&s.class_id))
                .map(|c| c.level)
                .unwrap_or_default();

            let inputs = routine.to_inputs();
            let mut raw = RawEvaluation::from_routine(level, &inputs);
            raw.date = date;

            let outcome = store.save_evaluation(session, &student_id, &raw)?;
            if outcome.success() {
                println!(
                    "{}",
                    output::format_breakdown(&score_evaluation(level, &inputs), output::should_use_colors())
                );
            }
            report(&outcome)
        }
        EvalCommand::Delete { student_id, index } => {
            report(&store.delete_evaluation(session, &student_id, index)?)
        }
    };
    Ok(code)
}

fn run_export(store: &RecordStore<FilePersistence>, session: &Session, class: &str, path: Option<PathBuf>) -> Result<i32> {
    if store.class(session, class)?.is_none() {
        eprintln!("Rejected: class '{}' not found", class.trim());
        return Ok(EXIT_REJECTED);
    }
    let students = store.students_in_class(session, class)?;

    match path {
        Some(path) => {
            let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
            let rows = calgym::export::write_class_report(&students, file)?;
            println!("Wrote {} row(s) to {}", rows, path.display());
        }
        None => {
            calgym::export::write_class_report(&students, std::io::stdout().lock())?;
        }
    }
    Ok(EXIT_SUCCESS)
}

fn run(cli_command: Commands, store: &mut RecordStore<FilePersistence>, session: &Session) -> Result<i32> {
    let use_colors = output::should_use_colors();
    match cli_command {
        // Handled before the store is opened.
        Commands::Calc { .. } => Ok(EXIT_SUCCESS),
        Commands::Class(command) => run_class(store, session, command),
        Commands::Student(command) => run_student(store, session, command),
        Commands::Eval(command) => run_eval(store, session, command),
        Commands::Import { csv, create_classes } => {
            let options = ImportOptions {
                create_missing_classes: create_classes,
            };
            let summary = calgym::import::import_students_from_path(store, session, &csv, &options)?;
            println!("{} student(s) imported, {} failed", summary.imported, summary.failed);
            for class in &summary.created_classes {
                println!("  created class {}", class);
            }
            for error in &summary.errors {
                eprintln!("  {}", error);
            }
            let changes = summary.imported + summary.created_classes.len();
            if changes > 0 && changes >= store.limits().max_backups {
                println!("note: this import replaced every backup taken before it");
            }
            Ok(if summary.failed > 0 && summary.imported == 0 {
                EXIT_REJECTED
            } else {
                EXIT_SUCCESS
            })
        }
        Commands::Export { class, output } => run_export(store, session, &class, output),
        Commands::Settings(SettingsCommand::Show) => {
            println!("{}", output::format_settings(&store.settings(session)?));
            Ok(EXIT_SUCCESS)
        }
        Commands::Settings(SettingsCommand::Set {
            teacher_name,
            report_title,
        }) => {
            let current = store.settings(session)?;
            let teacher_name = teacher_name.unwrap_or(current.teacher_name);
            let report_title = report_title.unwrap_or(current.report_title);
            Ok(report(&store.update_settings(session, &teacher_name, &report_title)?))
        }
        Commands::Backup(BackupCommand::List) => {
            println!("{}", output::format_backups(&store.list_backups(session)?, use_colors));
            Ok(EXIT_SUCCESS)
        }
        Commands::Backup(BackupCommand::Restore { index }) => Ok(report(&store.restore_backup(session, index)?)),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Load config
    let config = match calgym::config::load_config(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate config at startup
    if let Err(errors) = calgym::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    if let Commands::Calc { level, ref routine } = cli.command {
        let breakdown = score_evaluation(level, &routine.to_inputs());
        println!("{}", output::format_breakdown(&breakdown, output::should_use_colors()));
        std::process::exit(EXIT_SUCCESS);
    }

    let session = match resolve_teacher(cli.teacher.as_deref(), get_teacher_from_env(), config.teacher.as_deref()) {
        Some(teacher) => Session::for_teacher(teacher),
        None => Session::anonymous(),
    };

    let mut store = match open_store(&config) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let code = match run(cli.command, &mut store, &session) {
        Ok(code) => code,
        Err(e) => {
            let code = exit_code_for(&e);
            if code == EXIT_AUTH {
                eprintln!("No teacher identity. Pass --teacher, set CALGYM_TEACHER or add `teacher:` to the config file.");
            } else {
                eprintln!("Error: {:#}", e);
            }
            code
        }
    };

    std::process::exit(code);
}
