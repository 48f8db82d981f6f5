// sheetmatch CLI - reconcile two spreadsheets on a key column

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, LevelFilter};
use serde::Serialize;

use sheetmatch_cli::exit_codes::{service_exit_code, ErrorOutput, EXIT_ERROR, EXIT_SUCCESS};
use sheetmatch_cli::service::{self, ColumnsRequest, MatchRequest, ServiceError};
use sheetmatch_io::json::{ColumnsResponse, MatchResponse};
use sheetmatch_io::xlsx::ExportDocument;
use sheetmatch_recon::{MatchJob, MatchMode, MatchResult, MissingKeys, ReconError};

#[derive(Parser)]
#[command(name = "sheetmatch")]
#[command(about = "Reconcile two spreadsheets on a key column")]
#[command(version)]
struct Cli {
    /// Log progress to stderr (RUST_LOG still takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the column names of both files
    #[command(after_help = "\
Examples:
  sheetmatch columns bank.xlsx ledger.csv
  sheetmatch columns bank.xlsx ledger.csv --json")]
    Columns {
        /// First dataset (xlsx, xls, xlsb, ods, csv, tsv)
        file1: Option<PathBuf>,

        /// Second dataset
        file2: Option<PathBuf>,

        /// Emit {"columns1": [...], "columns2": [...]} on stdout
        #[arg(long)]
        json: bool,
    },

    /// Match two files and print all three partitions as JSON
    #[command(after_help = "\
Examples:
  sheetmatch match bank.xlsx ledger.xlsx --col1 Reference --col2 'Txn ID'
  sheetmatch match a.csv b.csv --col1 id --col2 id --mode missing_in_2 -o diff.json

Modes:
  inner          rows whose key appears in both files
  full           every row, matched or not (default)
  missing_in_1   rows of file 2 whose key is absent from file 1
  missing_in_2   rows of file 1 whose key is absent from file 2

Exit codes:
  0  success
  2  missing argument
  3  a file could not be read
  4  a key column does not exist")]
    Match {
        file1: Option<PathBuf>,
        file2: Option<PathBuf>,

        #[command(flatten)]
        keys: KeyArgs,

        /// Write the JSON to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Match two files and write the result workbook
    #[command(after_help = "\
Examples:
  sheetmatch export bank.xlsx ledger.xlsx --col1 Reference --col2 'Txn ID'
  sheetmatch export a.csv b.csv --col1 id --col2 id --mode inner -o out.xlsx

The workbook has one sheet per non-empty partition:
  Matched Rows, Unmatched in File 1, Unmatched in File 2")]
    Export {
        file1: Option<PathBuf>,
        file2: Option<PathBuf>,

        #[command(flatten)]
        keys: KeyArgs,

        /// Output path (default: comparison_results.xlsx)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Run a .match.toml job file
    #[command(after_help = "\
Example job:
  file1 = \"bank.xlsx\"
  file2 = \"ledger.xlsx\"
  col1 = \"Reference\"
  col2 = \"Txn ID\"
  mode = \"full\"

  [output]
  xlsx = \"comparison_results.xlsx\"
  json = \"result.json\"

Relative paths resolve against the job file's directory. Without an
[output] table the match JSON is printed on stdout.")]
    Run {
        /// Path to the job file
        job: PathBuf,

        /// Report failures as {"error": ...} on stdout
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct KeyArgs {
    /// Key column in file 1
    #[arg(long)]
    col1: Option<String>,

    /// Key column in file 2
    #[arg(long)]
    col2: Option<String>,

    /// Match mode: inner, full, missing_in_1, missing_in_2
    #[arg(long, value_parser = parse_mode, env = "SHEETMATCH_MODE")]
    mode: Option<MatchMode>,

    /// How empty key cells match
    #[arg(long, value_enum, default_value_t = MissingKeysArg::Sentinel)]
    missing_keys: MissingKeysArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum MissingKeysArg {
    /// Empty keys match each other (and a literal "nan")
    Sentinel,
    /// Empty keys never match
    NeverMatch,
}

impl From<MissingKeysArg> for MissingKeys {
    fn from(arg: MissingKeysArg) -> Self {
        match arg {
            MissingKeysArg::Sentinel => MissingKeys::Sentinel,
            MissingKeysArg::NeverMatch => MissingKeys::NeverMatch,
        }
    }
}

fn parse_mode(s: &str) -> Result<MatchMode, String> {
    s.parse().map_err(|e: sheetmatch_recon::model::UnknownMode| e.to_string())
}

impl KeyArgs {
    fn into_request(self, file1: Option<PathBuf>, file2: Option<PathBuf>) -> MatchRequest {
        MatchRequest {
            file1,
            file2,
            col1: self.col1,
            col2: self.col2,
            mode: self.mode,
            missing_keys: self.missing_keys.into(),
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(default)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Columns { file1, file2, json } => cmd_columns(ColumnsRequest { file1, file2 }, json),
        Commands::Match { file1, file2, keys, output } => cmd_match(keys.into_request(file1, file2), output),
        Commands::Export { file1, file2, keys, output } => cmd_export(keys.into_request(file1, file2), output),
        Commands::Run { job, json } => cmd_run(&job, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Classify a service failure. In JSON mode the error object also goes to stdout.
    pub fn service(err: ServiceError, json: bool) -> Self {
        if json {
            if let Err(e) = emit_json(&ErrorOutput::from_service_error(&err)) {
                debug!("could not write JSON error to stdout: {}", e.message);
            }
        }
        let hint = match &err {
            ServiceError::InputMissing(_) => Some("see --help for the required arguments".to_string()),
            ServiceError::Match(_) => Some("run `sheetmatch columns` to list the available names".to_string()),
            _ => None,
        };
        Self { code: service_exit_code(&err), message: err.public_message(), hint }
    }
}

// ============================================================================
// output helpers
// ============================================================================

fn emit_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value).map_err(|e| CliError::io(e.to_string()))?;
    writeln!(handle).map_err(|e| CliError::io(e.to_string()))
}

fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), CliError> {
    let body = serde_json::to_vec_pretty(value).map_err(|e| CliError::io(e.to_string()))?;
    fs::write(path, body).map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))
}

fn write_document(path: &Path, doc: &ExportDocument) -> Result<(), CliError> {
    fs::write(path, &doc.bytes).map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))?;
    debug!("wrote {} ({} bytes, {})", path.display(), doc.bytes.len(), doc.content_type);
    eprintln!("Wrote {} ({})", path.display(), doc.sheets.join(", "));
    Ok(())
}

fn print_summary(result: &MatchResult) {
    let s = result.summary();
    eprintln!(
        "{} matched, {} only in file 1, {} only in file 2",
        s.matched, s.unmatched_first, s.unmatched_second
    );
}

// ============================================================================
// columns
// ============================================================================

fn cmd_columns(req: ColumnsRequest, json: bool) -> Result<(), CliError> {
    let columns = service::list_columns(&req).map_err(|e| CliError::service(e, json))?;
    if json {
        return emit_json(&columns);
    }

    let ColumnsResponse { columns1, columns2 } = columns;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for (label, names) in [("file 1", columns1), ("file 2", columns2)] {
        writeln!(handle, "{label}:").map_err(|e| CliError::io(e.to_string()))?;
        for name in names {
            writeln!(handle, "  {name}").map_err(|e| CliError::io(e.to_string()))?;
        }
    }
    Ok(())
}

// ============================================================================
// match
// ============================================================================

fn cmd_match(req: MatchRequest, output: Option<PathBuf>) -> Result<(), CliError> {
    let result = service::reconcile(&req).map_err(|e| CliError::service(e, true))?;
    let response = MatchResponse::new(&result);
    match output {
        Some(path) => write_json_file(&path, &response)?,
        None => emit_json(&response)?,
    }
    print_summary(&result);
    Ok(())
}

// ============================================================================
// export
// ============================================================================

fn cmd_export(req: MatchRequest, output: Option<PathBuf>) -> Result<(), CliError> {
    let doc = service::export(&req).map_err(|e| CliError::service(e, false))?;
    let path = output.unwrap_or_else(|| PathBuf::from(doc.filename));
    write_document(&path, &doc)
}

// ============================================================================
// run
// ============================================================================

fn read_job(path: &Path) -> Result<MatchJob, ServiceError> {
    let text = fs::read_to_string(path).map_err(|e| {
        ServiceError::InvalidJob(ReconError::ConfigParse(format!(
            "{}: {}",
            path.display(),
            e
        )))
    })?;
    let mut job = MatchJob::from_toml(&text).map_err(ServiceError::InvalidJob)?;
    if let Some(dir) = path.parent() {
        job.resolve_paths(dir);
    }
    Ok(job)
}

fn cmd_run(job_path: &Path, json: bool) -> Result<(), CliError> {
    let job = read_job(job_path).map_err(|e| CliError::service(e, json))?;
    let req = MatchRequest::from(&job);
    debug!("job {}: mode {}", job_path.display(), job.options().mode);

    let result = service::reconcile(&req).map_err(|e| CliError::service(e, json))?;

    // Produce everything before writing anything.
    let doc = match &job.output.xlsx {
        Some(_) => Some(service::export_result(&result).map_err(|e| CliError::service(e, json))?),
        None => None,
    };
    let response = MatchResponse::new(&result);

    match (&job.output.json, &job.output.xlsx, doc) {
        (None, None, _) => emit_json(&response)?,
        (json_path, xlsx_path, doc) => {
            if let Some(path) = json_path {
                write_json_file(path, &response)?;
                eprintln!("Wrote {}", path.display());
            }
            if let (Some(path), Some(doc)) = (xlsx_path, doc) {
                write_document(path, &doc)?;
            }
        }
    }
    print_summary(&result);
    Ok(())
}

