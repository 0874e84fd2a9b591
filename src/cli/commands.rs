use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use crate::config::{Config, USER_ENV};
use crate::db::DbConnection;
use crate::models::{EmailList, ValidationResult};
use crate::pipeline::{
    BatchReport, BatchRun, ColumnMapping, CsvUpload, DohResolver, EmailValidator, Persist,
    Persistence, PipelineError, RequiredField, ResultFilter, ValidationConfigError,
    write_results,
};
use crate::repo::ListStore;
use crate::session::Session;
use crate::cli::output::{
    format_list_summary, format_list_table, format_results_table, format_summary_counts,
    is_tty, list_to_json, TerminalProgress, DEFAULT_RESULT_LIMIT,
};
use crate::cli::error::{user_error, validate_list_id};
use anyhow::{anyhow, Context, Result};

#[derive(Parser)]
#[command(name = "mxsift")]
#[command(about = "Mail list sifter - validate CSV email lists by syntax and DNS MX records")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the columns found in a CSV file
    Columns {
        /// CSV file with a header row
        file: PathBuf,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Validate every address in a CSV file and save the results
    Validate {
        /// CSV file with a header row
        file: PathBuf,
        /// Column holding the email addresses
        #[arg(short = 'e', long = "email-column")]
        email_column: Option<String>,
        /// Column holding contact names (optional)
        #[arg(short = 'n', long = "name-column")]
        name_column: Option<String>,
        /// Name for the saved list (defaults to the file name without extension)
        #[arg(short = 'l', long = "list-name")]
        list_name: Option<String>,
        /// Also write the results as CSV to this path
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Don't draw progress
        #[arg(short = 'q', long)]
        quiet: bool,
    },
    /// Validate a single address
    Check {
        /// Email address
        email: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// List your saved lists, newest first
    Lists {
        /// Only lists whose name contains this text (case-insensitive)
        search: Option<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show a saved list and its results
    Show {
        /// List ID
        id: String,
        /// Maximum number of results to print
        #[arg(long, default_value_t = DEFAULT_RESULT_LIMIT)]
        limit: usize,
        /// Output in JSON format (includes all results)
        #[arg(long)]
        json: bool,
    },
    /// Export a saved list as CSV (Email, Name, Valid, Reason)
    Export {
        /// List ID
        id: String,
        /// Only valid addresses
        #[arg(long, conflicts_with = "invalid")]
        valid: bool,
        /// Only invalid addresses
        #[arg(long)]
        invalid: bool,
        /// Write to this path instead of stdout
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Delete a saved list
    Delete {
        /// List ID
        id: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    handle_command(cli)
}

fn handle_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Columns { file, json } => handle_columns(&file, json),
        Commands::Validate { file, email_column, name_column, list_name, output, json, quiet } => {
            let mapping = ColumnMapping::new(email_column.unwrap_or_default(), name_column);
            handle_validate(&file, mapping, list_name, output, json, quiet)
        }
        Commands::Check { email, json } => handle_check(&email, json),
        Commands::Lists { search, json } => handle_lists(search, json),
        Commands::Show { id, limit, json } => handle_show(&id, limit, json),
        Commands::Export { id, valid, invalid, output } => {
            let filter = if valid {
                ResultFilter::Valid
            } else if invalid {
                ResultFilter::Invalid
            } else {
                ResultFilter::All
            };
            handle_export(&id, filter, output)
        }
        Commands::Delete { id } => handle_delete(&id),
    }
}

/// Build the single-threaded runtime lookups run on
fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

fn load_config() -> Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => user_error(&format!("{:#}", e)),
    }
}

fn read_file(path: &Path) -> Vec<u8> {
    match std::fs::read(path) {
        Ok(content) => content,
        Err(e) => user_error(&format!("Failed to read file {}: {}", path.display(), e)),
    }
}

fn parse_failure(e: &PipelineError) -> ! {
    log::debug!("{}", e);
    user_error(&format!("{}. Please ensure it's a valid CSV format.", e))
}

fn require_session(config: &Config) -> Session {
    match Session::current(config) {
        Some(session) => session,
        None => user_error(&format!(
            "No current user. Set user.id in ~/.mxsift/rc or the {} environment variable.",
            USER_ENV
        )),
    }
}

fn parse_list_id(id: &str) -> i64 {
    match validate_list_id(id) {
        Ok(id) => id,
        Err(e) => user_error(&e),
    }
}

/// Default list name: the file name without its extension
fn default_list_name(file: &Path) -> String {
    file.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn handle_columns(file: &Path, json: bool) -> Result<()> {
    let content = read_file(file);
    let upload = match CsvUpload::parse(&content) {
        Ok(upload) => upload,
        Err(e) => parse_failure(&e),
    };

    if json {
        let value = serde_json::json!({
            "columns": upload.headers,
            "rows": upload.len(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{:<4} {}", "#", "Column");
        println!("{}", "-".repeat(30));
        for (index, header) in upload.headers.iter().enumerate() {
            println!("{:<4} {}", index + 1, header);
        }
        println!();
        println!("{} data rows", upload.len());
    }
    Ok(())
}

fn handle_validate(
    file: &Path,
    mapping: ColumnMapping,
    list_name: Option<String>,
    output: Option<PathBuf>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let config = load_config()?;

    let content = read_file(file);
    let mut run = BatchRun::new();
    if let Err(e) = run.load(&content) {
        parse_failure(&e);
    }

    let list_name = list_name.unwrap_or_else(|| default_list_name(file));
    let session = Session::current(&config);

    // A store that can't be opened is reported after the batch, like a failed save
    let mut store_error = None;
    let conn: Option<Connection> = match &session {
        Some(_) => match DbConnection::connect(&config) {
            Ok(conn) => Some(conn),
            Err(e) => {
                log::warn!("Failed to open list database: {:#}", e);
                store_error = Some(format!("{:#}", e));
                None
            }
        },
        None => None,
    };
    let persist = match (&session, &conn) {
        (Some(session), Some(conn)) => Some(Persist { store: conn, session }),
        _ => None,
    };

    let validator = EmailValidator::new(DohResolver::new(config.resolver.clone(), config.timeout)?);
    let mut progress = TerminalProgress::new(quiet || json);

    let rt = runtime()?;
    let mut report = match rt.block_on(run.process(&mapping, &list_name, &validator, &mut progress, persist)) {
        Ok(report) => report,
        Err(PipelineError::Config(e)) => config_failure(&e, run.headers().unwrap_or_default()),
        Err(e) => return Err(e.into()),
    };
    if let Some(message) = store_error {
        report.persistence = Persistence::Failed(message);
    }

    if let Some(path) = &output {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_results(&report.results, ResultFilter::All, file)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if json {
        print_report_json(&report)?;
    } else {
        print_report(&report, mapping.name.is_some());
        if let Some(path) = &output {
            println!("Wrote results to {}", path.display());
        }
    }

    match &report.persistence {
        Persistence::Saved { .. } => Ok(()),
        Persistence::NoSession => {
            eprintln!(
                "Note: no current user, results were not saved. Set user.id in ~/.mxsift/rc or {}.",
                USER_ENV
            );
            Ok(())
        }
        Persistence::Failed(message) => {
            Err(anyhow!("Failed to save list '{}': {}", report.list_name, message))
        }
    }
}

fn config_failure(e: &ValidationConfigError, headers: &[String]) -> ! {
    match e {
        ValidationConfigError::Missing(RequiredField::EmailColumn) => user_error(&format!(
            "{} (use --email-column). Available columns: {}",
            e,
            headers.join(", ")
        )),
        ValidationConfigError::Missing(RequiredField::ListName) => {
            user_error(&format!("{} (use --list-name)", e))
        }
        ValidationConfigError::UnknownColumn { .. } => user_error(&e.to_string()),
    }
}

fn print_report(report: &BatchReport, show_name: bool) {
    println!("Validated list '{}'", report.list_name);
    println!("{}", format_summary_counts(&report.summary));
    if let Persistence::Saved { id, .. } = report.persistence {
        println!("Saved as list {}", id);
    }
    println!();
    print!("{}", format_results_table(&report.results, show_name, DEFAULT_RESULT_LIMIT, is_tty()));
}

fn print_report_json(report: &BatchReport) -> Result<()> {
    let saved_id = match report.persistence {
        Persistence::Saved { id, .. } => Some(id),
        _ => None,
    };
    let value = serde_json::json!({
        "run_id": report.run_id.to_string(),
        "name": report.list_name,
        "total_emails": report.summary.total,
        "valid_emails": report.summary.valid,
        "invalid_emails": report.summary.invalid,
        "saved_id": saved_id,
        "results": report.results,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn handle_check(email: &str, json: bool) -> Result<()> {
    let config = load_config()?;
    let validator = EmailValidator::new(DohResolver::new(config.resolver.clone(), config.timeout)?);

    let rt = runtime()?;
    let result: ValidationResult = rt.block_on(validator.validate(email));

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.is_valid {
        println!("{}: valid", result.email);
    } else {
        println!(
            "{}: invalid ({})",
            result.email,
            result.reason.map(|r| r.as_str()).unwrap_or("unknown")
        );
    }
    Ok(())
}

fn handle_lists(search: Option<String>, json: bool) -> Result<()> {
    let config = load_config()?;
    let session = require_session(&config);
    let conn = DbConnection::connect(&config)
        .context("Failed to connect to database")?;

    let mut lists = conn.list_by_user(&session.user_id)
        .context("Failed to list email lists")?;
    // Case-insensitive substring match on the list name
    if let Some(term) = search.map(|s| s.to_lowercase()).filter(|s| !s.is_empty()) {
        lists.retain(|list| list.name.to_lowercase().contains(&term));
    }

    if json {
        let json_lists: Vec<serde_json::Value> = lists.iter()
            .map(|list| list_to_json(list, false))
            .collect();
        println!("{}", serde_json::to_string_pretty(&json_lists)?);
    } else {
        print!("{}", format_list_table(&lists));
    }
    Ok(())
}

fn handle_show(id: &str, limit: usize, json: bool) -> Result<()> {
    let id = parse_list_id(id);
    let config = load_config()?;
    let session = require_session(&config);
    let conn = DbConnection::connect(&config)
        .context("Failed to connect to database")?;

    let Some(list) = owned_list(&conn, id, &session)? else {
        user_error(&format!("List {} not found", id));
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&list_to_json(&list, true))?);
    } else {
        // Only show the Name column when the list was built with one
        let show_name = list.results.iter().any(|r| r.name.is_some());
        print!("{}", format_list_summary(&list));
        println!();
        print!("{}", format_results_table(&list.results, show_name, limit, is_tty()));
    }
    Ok(())
}

fn handle_export(id: &str, filter: ResultFilter, output: Option<PathBuf>) -> Result<()> {
    let id = parse_list_id(id);
    let config = load_config()?;
    let session = require_session(&config);
    let conn = DbConnection::connect(&config)
        .context("Failed to connect to database")?;

    let Some(list) = owned_list(&conn, id, &session)? else {
        user_error(&format!("List {} not found", id));
    };

    match output {
        Some(path) => {
            let file = std::fs::File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_results(&list.results, filter, file)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            // stdout stays clean for piping, so the confirmation goes to stderr
            eprintln!("Exported list {} to {}", id, path.display());
        }
        None => {
            let stdout = std::io::stdout();
            write_results(&list.results, filter, stdout.lock())
                .context("Failed to write export")?;
        }
    }
    Ok(())
}

fn handle_delete(id: &str) -> Result<()> {
    let id = parse_list_id(id);
    let config = load_config()?;
    let session = require_session(&config);
    let conn = DbConnection::connect(&config)
        .context("Failed to connect to database")?;

    // Another user's list is reported like a missing one
    if let Some(list) = conn.get_by_id(id)? {
        if list.user_id != session.user_id {
            user_error(&format!("List {} not found", id));
        }
    }

    // Best-effort: an id that is already gone still counts as deleted
    conn.delete_by_id(id)
        .with_context(|| format!("Failed to delete list {}", id))?;
    println!("Deleted list {}", id);
    Ok(())
}

/// Fetch a list, treating lists owned by someone else as absent
fn owned_list(conn: &Connection, id: i64, session: &Session) -> Result<Option<EmailList>> {
    let list = conn.get_by_id(id)
        .with_context(|| format!("Failed to load list {}", id))?;
    Ok(list.filter(|l| l.user_id == session.user_id))
}
