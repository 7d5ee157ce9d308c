// LedgerPost CLI - reconcile vendor payment workbooks and mail statements

mod exit_codes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};

use ledgerpost_io::directory::DirectoryStore;
use ledgerpost_io::{export, normalize_workbook, verify_secret};
use ledgerpost_mail::{
    append_match_logs, AuditLog, DedupStore, Dispatcher, NoopDedup, SmtpMailer, SqliteDedup,
};
use ledgerpost_recon::matcher::{match_parties, MatchOptions};
use ledgerpost_recon::model::{MatchReport, SheetVariant};
use ledgerpost_recon::RunConfig;

use exit_codes::{
    EXIT_AUTH, EXIT_CONFIG, EXIT_DISPATCH, EXIT_ERROR, EXIT_EXPORT, EXIT_SCHEMA, EXIT_STORE,
    EXIT_SUCCESS, EXIT_USAGE,
};

const DEFAULT_CONFIG_FILE: &str = "lpost.toml";

#[derive(Parser)]
#[command(name = "lpost")]
#[command(about = "Reconcile vendor payment workbooks and mail statements")]
#[command(version)]
struct Cli {
    /// Path to the run config (defaults to ./lpost.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a workbook against the directory without sending anything
    #[command(name = "match", after_help = "\
Examples:
  lpost match Invoices.xlsx
  lpost match Invoices.xlsx --json
  lpost match Invoices.xlsx --output report.json
  lpost match Invoices.xlsx --partywise All_Partywise_Payments.xlsx")]
    Match {
        /// Uploaded payment workbook (legacy two-sheet or ledger layout)
        workbook: PathBuf,

        /// Output the full match report as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON match report to a file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write one sheet per READY party to an xlsx file
        #[arg(long)]
        partywise: Option<PathBuf>,
    },

    /// Reconcile a workbook and mail one statement per READY party
    #[command(after_help = "\
Examples:
  lpost send Invoices.xlsx --smtp-user ops@example.com --smtp-pass app-password
  LPOST_SMTP_PASS=app-password lpost send Invoices.xlsx --smtp-user ops@example.com")]
    Send {
        /// Uploaded payment workbook (legacy two-sheet or ledger layout)
        workbook: PathBuf,

        /// SMTP account; also the From address of every message
        #[arg(long)]
        smtp_user: String,

        /// SMTP app password (per run, never stored)
        #[arg(long, env = "LPOST_SMTP_PASS", hide_env_values = true)]
        smtp_pass: String,
    },

    /// Inspect or mutate the party email directory
    Contacts {
        #[command(subcommand)]
        command: ContactsCommands,
    },

    /// Write the sample payment workbook for operator onboarding
    #[command(after_help = "\
Examples:
  lpost sample SampleInvoices.xlsx")]
    Sample {
        /// Output xlsx path
        out: PathBuf,
    },

    /// Audit log tools
    Log {
        #[command(subcommand)]
        command: LogCommands,
    },
}

#[derive(Subcommand)]
enum ContactsCommands {
    /// List directory entries
    List {
        /// Output JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Replace one party's recipient list (requires the admin secret)
    #[command(after_help = "\
Examples:
  lpost contacts set PC123 'a@x.com,b@x.com' --secret hunter2")]
    Set {
        /// Party code to update
        party_code: String,

        /// Comma-separated recipient list
        emails: String,

        /// Administrative secret from the run config
        #[arg(long)]
        secret: String,
    },

    /// Replace the whole directory from a workbook (requires the admin secret)
    #[command(after_help = "\
Examples:
  lpost contacts import PartyEmails.xlsx --secret hunter2")]
    Import {
        /// Workbook with Party Code, Party Name, Email (CC optional)
        workbook: PathBuf,

        /// Administrative secret from the run config
        #[arg(long)]
        secret: String,
    },

    /// Write the sample directory workbook
    Sample {
        /// Output xlsx path
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum LogCommands {
    /// Render the audit log into a 4-column xlsx report
    #[command(after_help = "\
Examples:
  lpost log export FinalEmailLog.xlsx
  lpost log export --log runs/FinalEmailLog.txt FinalEmailLog.xlsx")]
    Export {
        /// Output xlsx path
        out: PathBuf,

        /// Audit log to read (defaults to the configured store path)
        #[arg(long)]
        log: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Match {
            workbook,
            json,
            output,
            partywise,
        } => cmd_match(cli.config, workbook, json, output, partywise),
        Commands::Send {
            workbook,
            smtp_user,
            smtp_pass,
        } => cmd_send(cli.config, workbook, smtp_user, smtp_pass),
        Commands::Contacts { command } => match command {
            ContactsCommands::List { json } => cmd_contacts_list(cli.config, json),
            ContactsCommands::Set {
                party_code,
                emails,
                secret,
            } => cmd_contacts_set(cli.config, party_code, emails, secret),
            ContactsCommands::Import { workbook, secret } => {
                cmd_contacts_import(cli.config, workbook, secret)
            }
            ContactsCommands::Sample { out } => cmd_contacts_sample(out),
        },
        Commands::Sample { out } => cmd_sample(out),
        Commands::Log { command } => match command {
            LogCommands::Export { out, log } => cmd_log_export(cli.config, out, log),
        },
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {message}");
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {hint}");
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
    fn new(code: u8, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            hint: None,
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<RunConfig, CliError> {
    let path = match path {
        Some(path) => path,
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                return Ok(RunConfig::default());
            }
            default
        }
    };
    let text = std::fs::read_to_string(&path).map_err(|e| {
        CliError::new(EXIT_USAGE, format!("cannot read config {}: {e}", path.display()))
    })?;
    RunConfig::from_toml(&text).map_err(|e| CliError::new(EXIT_CONFIG, e.to_string()))
}

/// Normalize, load the directory, match, and append the diagnostic logs.
fn reconcile(
    config: &RunConfig,
    workbook: &Path,
) -> Result<(SheetVariant, MatchReport), CliError> {
    let tables =
        normalize_workbook(workbook).map_err(|e| CliError::new(EXIT_SCHEMA, e.to_string()))?;
    if tables.parse_warnings > 0 {
        eprintln!(
            "note: {} cell(s) failed to parse and were coerced",
            tables.parse_warnings
        );
    }

    let store = DirectoryStore::new(&config.store.directory);
    let directory = store.load().map_err(|e| CliError::new(EXIT_STORE, e.to_string()))?;

    let options = MatchOptions::new(config.match_key, config.row_policy);
    let report = match_parties(&tables.payments, &tables.notes, &directory, &options);

    append_match_logs(
        &report,
        Path::new(&config.store.skip_log),
        Path::new(&config.store.mismatch_log),
    )
    .map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;

    Ok((tables.variant, report))
}

fn print_report_summary(report: &MatchReport) {
    eprintln!(
        "matched: {} ready, {} skipped, {} missing contact(s), {} row mismatch(es)",
        report.ready.len(),
        report.skips.len(),
        report.missing_contacts.len(),
        report.mismatches.len(),
    );
    for skip in &report.skips {
        eprintln!("  {skip}");
    }
    for missing in &report.missing_contacts {
        eprintln!(
            "  MISSING CONTACT: {} — {} payment row(s)",
            missing.key, missing.payment_rows
        );
    }
}

fn cmd_match(
    config: Option<PathBuf>,
    workbook: PathBuf,
    json: bool,
    output: Option<PathBuf>,
    partywise: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = load_config(config)?;
    let (variant, report) = reconcile(&config, &workbook)?;

    let json_str = serde_json::to_string_pretty(&report)
        .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
    if let Some(ref path) = output {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }
    if json {
        println!("{json_str}");
    }

    if let Some(ref path) = partywise {
        export::partywise_workbook(path, &report.ready)
            .map_err(|e| CliError::new(EXIT_EXPORT, e.to_string()))?;
        eprintln!("wrote {}", path.display());
    }

    eprintln!("layout: {variant}");
    print_report_summary(&report);
    Ok(())
}

fn cmd_send(
    config: Option<PathBuf>,
    workbook: PathBuf,
    smtp_user: String,
    smtp_pass: String,
) -> Result<(), CliError> {
    let config = load_config(config)?;
    let (variant, report) = reconcile(&config, &workbook)?;
    print_report_summary(&report);

    let transport = SmtpMailer::new(&config.smtp.host, config.smtp.port, &smtp_user, &smtp_pass);
    let dedup: Box<dyn DedupStore> = match &config.store.dedup_db {
        Some(path) => Box::new(
            SqliteDedup::open(Path::new(path))
                .map_err(|e| CliError::new(EXIT_STORE, e.to_string()))?,
        ),
        None => Box::new(NoopDedup),
    };
    let audit = AuditLog::new(&config.store.audit_log);

    let dispatcher = Dispatcher {
        transport: &transport,
        dedup: dedup.as_ref(),
        audit: &audit,
        from: smtp_user,
        throttle: Duration::from_secs(config.throttle_secs),
    };
    let outcome = dispatcher
        .run(&report.ready, variant)
        .map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))?;

    eprintln!(
        "Emails sent: {}, Failed: {}, Skipped: {}",
        outcome.sent, outcome.failed, outcome.skipped
    );
    if outcome.failed > 0 {
        return Err(CliError::new(EXIT_DISPATCH, "one or more dispatches failed"));
    }
    Ok(())
}

fn cmd_contacts_list(config: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let config = load_config(config)?;
    let store = DirectoryStore::new(&config.store.directory);
    let entries = store.load().map_err(|e| CliError::new(EXIT_STORE, e.to_string()))?;

    if json {
        let json_str = serde_json::to_string_pretty(&entries)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        for entry in &entries {
            let cc = if entry.cc_emails.is_empty() {
                String::new()
            } else {
                format!(" | CC: {}", entry.cc_emails.join(", "))
            };
            println!(
                "{} | {} | {}{}",
                entry.party_code,
                entry.party_name,
                entry.to_emails.join(", "),
                cc,
            );
        }
    }
    Ok(())
}

fn cmd_contacts_set(
    config: Option<PathBuf>,
    party_code: String,
    emails: String,
    secret: String,
) -> Result<(), CliError> {
    let config = load_config(config)?;
    verify_secret(config.admin_secret.as_deref(), &secret)
        .map_err(|e| CliError::new(EXIT_AUTH, e.to_string()))?;

    let store = DirectoryStore::new(&config.store.directory);
    store
        .update(&party_code, &[emails])
        .map_err(|e| CliError::new(EXIT_STORE, e.to_string()))?;
    eprintln!("updated emails for {party_code}");
    Ok(())
}

fn cmd_contacts_import(
    config: Option<PathBuf>,
    workbook: PathBuf,
    secret: String,
) -> Result<(), CliError> {
    let config = load_config(config)?;
    verify_secret(config.admin_secret.as_deref(), &secret)
        .map_err(|e| CliError::new(EXIT_AUTH, e.to_string()))?;

    let store = DirectoryStore::new(&config.store.directory);
    let outcome = store
        .import_workbook(&workbook)
        .map_err(|e| CliError::new(EXIT_STORE, e.to_string()))?;
    eprintln!("imported {} directory entries", outcome.imported);
    if !outcome.missing_emails.is_empty() {
        eprintln!("warning: the following parties have no email address:");
        for party in &outcome.missing_emails {
            eprintln!("  {party}");
        }
    }
    Ok(())
}

fn cmd_contacts_sample(out: PathBuf) -> Result<(), CliError> {
    export::sample_directory_workbook(&out)
        .map_err(|e| CliError::new(EXIT_EXPORT, e.to_string()))?;
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_sample(out: PathBuf) -> Result<(), CliError> {
    export::sample_payment_workbook(&out)
        .map_err(|e| CliError::new(EXIT_EXPORT, e.to_string()))?;
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_log_export(
    config: Option<PathBuf>,
    out: PathBuf,
    log: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = load_config(config)?;
    let log_path = log.unwrap_or_else(|| PathBuf::from(&config.store.audit_log));
    let rows = export::audit_log_workbook(&log_path, &out)
        .map_err(|e| CliError::new(EXIT_EXPORT, e.to_string()))?;
    eprintln!("wrote {} ({rows} row(s))", out.display());
    Ok(())
}
