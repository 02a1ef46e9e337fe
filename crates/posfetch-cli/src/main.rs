// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use clap::{ArgAction, Parser, Subcommand};
use posfetch_client::HttpTransport;
use posfetch_ingest::{
    posidents_from_json_file, posidents_from_text_file, write_csv, write_json, write_rejects_json,
    DestinationStore, Pipeline, RunReport,
};
use posfetch_model::{AppConfig, Posident};
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "posfetch")]
#[command(about = "Bulk identifier lookups reconciled into a local SQLite store")]
struct Cli {
    #[arg(long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the pipeline: batch, send, decode, reconcile.
    Run {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        db: PathBuf,
        /// Identifier given directly; repeatable.
        #[arg(long = "posident")]
        posidents: Vec<String>,
        /// Text file with one identifier per line.
        #[arg(long)]
        input_text: Option<PathBuf>,
        /// JSON file of the form {"posidents": [...]}.
        #[arg(long)]
        input_json: Option<PathBuf>,
        /// Reads identifiers from the destination table itself.
        #[arg(long, default_value_t = false)]
        from_db: bool,
        /// Custom identifier query; implies --from-db.
        #[arg(long)]
        sql: Option<String>,
        #[arg(long)]
        batch_size: Option<usize>,
        #[arg(long)]
        out_csv: Option<PathBuf>,
        #[arg(long)]
        out_json: Option<PathBuf>,
        #[arg(long)]
        rejects_json: Option<PathBuf>,
    },
    /// Parses a configuration file and reports what it resolves to.
    CheckConfig {
        #[arg(long)]
        config: PathBuf,
    },
    /// Shows destination table shape and row count.
    InspectDb {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        db: PathBuf,
    },
}

struct RunArgs {
    config: PathBuf,
    db: PathBuf,
    posidents: Vec<String>,
    input_text: Option<PathBuf>,
    input_json: Option<PathBuf>,
    from_db: bool,
    sql: Option<String>,
    batch_size: Option<usize>,
    out_csv: Option<PathBuf>,
    out_json: Option<PathBuf>,
    rejects_json: Option<PathBuf>,
}

fn main() -> ProcessExitCode {
    match run() {
        Ok(()) => ProcessExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ProcessExitCode::from(1)
        }
    }
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            db,
            posidents,
            input_text,
            input_json,
            from_db,
            sql,
            batch_size,
            out_csv,
            out_json,
            rejects_json,
        } => run_pipeline(RunArgs {
            config,
            db,
            posidents,
            input_text,
            input_json,
            from_db,
            sql,
            batch_size,
            out_csv,
            out_json,
            rejects_json,
        }),
        Commands::CheckConfig { config } => check_config(config),
        Commands::InspectDb { config, db } => inspect_db(config, db),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(path: &PathBuf) -> Result<AppConfig, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    toml::from_str(&raw).map_err(|e| format!("{}: {e}", path.display()))
}

fn run_pipeline(args: RunArgs) -> Result<(), String> {
    let mut config = load_config(&args.config)?;
    if let Some(batch_size) = args.batch_size {
        if batch_size == 0 {
            return Err("--batch-size must be at least 1".to_string());
        }
        config.pipeline.batch_size = batch_size;
    }

    let mut store = DestinationStore::open(&args.db, &config.pipeline.destination_table)
        .map_err(|e| e.to_string())?;
    let posidents = collect_posidents(&args, &store)?;

    let transport = HttpTransport::new(config.service.clone()).map_err(|e| e.to_string())?;
    let pipeline = Pipeline::new(&transport, &config.credentials, &config.pipeline);
    let report = pipeline
        .run(&posidents, &mut store)
        .map_err(|e| e.to_string())?;

    if let Some(path) = &args.out_csv {
        write_csv(path, &report.committed).map_err(|e| e.to_string())?;
    }
    if let Some(path) = &args.out_json {
        write_json(path, &report.committed).map_err(|e| e.to_string())?;
    }
    if let Some(path) = &args.rejects_json {
        write_rejects_json(path, &report.rejects()).map_err(|e| e.to_string())?;
    }

    print_summary(&report);
    Ok(())
}

/// Exactly one identifier source per run. Mixing them would make it
/// ambiguous which order the service sees.
fn collect_posidents(args: &RunArgs, store: &DestinationStore) -> Result<Vec<Posident>, String> {
    let from_db = args.from_db || args.sql.is_some();
    let sources = usize::from(!args.posidents.is_empty())
        + usize::from(args.input_text.is_some())
        + usize::from(args.input_json.is_some())
        + usize::from(from_db);
    if sources != 1 {
        return Err(
            "give exactly one identifier source: --posident, --input-text, --input-json, or --from-db"
                .to_string(),
        );
    }

    if !args.posidents.is_empty() {
        return args
            .posidents
            .iter()
            .map(|s| Posident::parse(s).map_err(|e| format!("--posident {s:?}: {e}")))
            .collect();
    }
    if let Some(path) = &args.input_text {
        return posidents_from_text_file(path).map_err(|e| e.to_string());
    }
    if let Some(path) = &args.input_json {
        return posidents_from_json_file(path).map_err(|e| e.to_string());
    }
    store
        .posidents(args.sql.as_deref())
        .map_err(|e| e.to_string())
}

fn print_summary(report: &RunReport) {
    let tally = &report.tally;
    println!("identifiers submitted: {}", tally.total_submitted);
    println!("duplicates removed: {}", tally.duplicates_removed);
    println!("batches sent: {}", tally.batch_count);
    println!("downloaded: {}", tally.success);
    println!("invalid identifier: {}", tally.invalid_identifier);
    println!("expired identifier: {}", tally.expired_identifier);
    println!("subject not found: {}", tally.subject_not_found);
    println!("unrecognized error codes: {}", report.violations.len());
    println!("unconvertible records: {}", report.mapping_failures.len());
    println!("rows updated: {}", report.committed.len());
}

fn check_config(path: PathBuf) -> Result<(), String> {
    let config = load_config(&path)?;
    println!("endpoint: {}", config.service.endpoint);
    println!("soap action: {}", config.service.soap_action);
    println!("destination table: {}", config.pipeline.destination_table);
    println!("external id column: {}", config.pipeline.external_id_column);
    println!("batch size: {}", config.pipeline.batch_size);
    println!("attribute overrides: {}", config.pipeline.overrides.len());
    println!("config: OK");
    Ok(())
}

fn inspect_db(config: PathBuf, db: PathBuf) -> Result<(), String> {
    let config = load_config(&config)?;
    let table = &config.pipeline.destination_table;
    let store = DestinationStore::open(&db, table).map_err(|e| e.to_string())?;
    let columns = store.columns().map_err(|e| e.to_string())?;
    println!(
        "columns={}",
        serde_json::to_string(&columns).map_err(|e| e.to_string())?
    );

    let conn = Connection::open(&db).map_err(|e| e.to_string())?;
    let count: i64 = conn
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })
        .map_err(|e| e.to_string())?;
    println!("row_count={count}");
    Ok(())
}
