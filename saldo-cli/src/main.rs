use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use saldo_finance::{Importer, MemoryLedger, account_label};
use saldo_ingest::{StatementDocument, StatementParser};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;
mod report;
mod source;
mod state;

#[derive(Parser, Debug)]
#[command(name = "saldo", version, about = "Bank statement parser and ledger importer")]
struct Cli {
    /// Debug logging on stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse statements (.pdf through pdftotext, anything else as form-feed separated text)
    Parse {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
        format: OutputFormat,

        /// Write output here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,

        /// Fail a statement on the first recorded issue
        #[arg(long)]
        strict: bool,
    },

    /// Parse one statement and book it into the JSON ledger
    Import {
        file: PathBuf,

        /// Account the entries are booked on
        /// (default: "BPER - <branch> (<last 4 IBAN digits>)")
        #[arg(long)]
        account: Option<String>,

        /// Ledger file (default: ~/.saldo/ledger.json)
        #[arg(long)]
        ledger: Option<PathBuf>,

        #[arg(long)]
        strict: bool,
    },

    /// Manage ~/.saldo/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Summary,
    Json,
    Csv,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Parse {
            files,
            format,
            out,
            strict,
        } => {
            parse_command(files, format, out, strict).await?;
        }

        Command::Import {
            file,
            account,
            ledger,
            strict,
        } => {
            import_command(file, account, ledger, strict).await?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },
    }

    Ok(())
}

/// One blocking parse task per file; results come back in argument order.
async fn parse_files(
    files: Vec<PathBuf>,
    parser: Arc<StatementParser>,
) -> Vec<(PathBuf, Result<StatementDocument>)> {
    let handles: Vec<_> = files
        .into_iter()
        .map(|path| {
            let parser = Arc::clone(&parser);
            let task_path = path.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let source = source::source_for(&task_path);
                parser.parse_source(source.as_ref())
            });
            (path, handle)
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (path, handle) in handles {
        let result = handle
            .await
            .context("parse task failed")
            .and_then(|r| r.with_context(|| format!("parsing {}", path.display())));
        results.push((path, result));
    }
    results
}

async fn parse_command(
    files: Vec<PathBuf>,
    format: OutputFormat,
    out: Option<PathBuf>,
    strict: bool,
) -> Result<()> {
    let cfg = config::load_config()?;
    let parser = Arc::new(cfg.statement_parser(strict)?);
    let total = files.len();

    let mut docs = Vec::new();
    let mut failed = 0;
    for (path, result) in parse_files(files, parser).await {
        match result {
            Ok(doc) => docs.push((path, doc)),
            Err(e) => {
                failed += 1;
                eprintln!("error: {e:#}");
            }
        }
    }

    let mut writer: Box<dyn Write> = match &out {
        Some(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("create {}", p.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    match format {
        OutputFormat::Summary => {
            for (path, doc) in &docs {
                report::write_summary(&mut writer, path, doc, cfg.reconcile.tolerance)?;
            }
        }
        OutputFormat::Json => report::write_json(&mut writer, &docs)?,
        OutputFormat::Csv => report::write_csv(&mut writer, docs.iter().map(|(_, d)| d))?,
    }
    writer.flush()?;

    if let Some(p) = &out {
        eprintln!("Wrote {}", p.display());
    }
    if failed > 0 {
        bail!("{failed} of {total} statement(s) failed to parse");
    }
    Ok(())
}

async fn import_command(
    file: PathBuf,
    account: Option<String>,
    ledger: Option<PathBuf>,
    strict: bool,
) -> Result<()> {
    let cfg = config::load_config()?;
    let parser = Arc::new(cfg.statement_parser(strict)?);

    let (_, result) = parse_files(vec![file], parser)
        .await
        .pop()
        .context("no parse result")?;
    let doc = result?;

    let account = match account.or_else(|| account_label(&doc.account)) {
        Some(a) => a,
        None => bail!("no IBAN found in the statement; pass --account"),
    };
    tracing::debug!(%account, "booking account");

    let ledger_path = match ledger {
        Some(p) => p,
        None => state::default_ledger_path()?,
    };
    let mut store = MemoryLedger::load(&ledger_path)
        .with_context(|| format!("load ledger {}", ledger_path.display()))?;

    let report = Importer::new(cfg.reconcile.tolerance).import(&mut store, &doc, &account)?;
    store
        .save(&ledger_path)
        .with_context(|| format!("save ledger {}", ledger_path.display()))?;

    report::write_import_report(&mut io::stdout().lock(), &report, &ledger_path)?;
    Ok(())
}
