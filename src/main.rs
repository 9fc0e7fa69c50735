//! kvam command-line tool
//!
//! Inspects and edits a store through the same code paths the access method
//! uses.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Command failed
//!   3 - Storage could not be opened

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::builder::BoolishValueParser;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kvam::catalog;
use kvam::executor::{
    insert_row, max_row_id, Datum, ExecutorResult, Row, ScanCursor, ScanDirection,
};
use kvam::storage::config::DEFAULT_DATA_DIR;
use kvam::storage::{Backend, StoreConfig, StoreHandle};

#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and edit a kvam store")]
struct Cli {
    #[arg(long, default_value = DEFAULT_DATA_DIR, env = "KVAM_DATA_DIR", global = true)]
    data_dir: PathBuf,

    /// memory or rocksdb
    #[arg(long, env = "KVAM_BACKEND", global = true)]
    backend: Option<Backend>,

    /// Sync every write to disk
    #[arg(long, env = "KVAM_SYNC_WRITES", global = true, value_parser = BoolishValueParser::new())]
    sync_writes: bool,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn store_config(&self) -> StoreConfig {
        StoreConfig {
            backend: self.backend.unwrap_or_default(),
            dir: self.data_dir.clone(),
            sync_writes: self.sync_writes,
            ..StoreConfig::default()
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List tables
    Tables,
    /// Register a table
    Create { name: String },
    /// Append a row; values are NULL, numbers, true/false, or text
    Insert {
        table: String,
        #[arg(required = true, allow_hyphen_values = true)]
        values: Vec<String>,
    },
    /// Print every row of a table
    Scan { table: String },
    /// Print the largest row id of a table
    MaxRowId { table: String },
    /// Read commands line by line from stdin
    Shell,
}

/// One line of shell input
#[derive(Parser)]
#[command(no_binary_name = true, disable_help_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

fn run(store: &Arc<StoreHandle>, command: Command, out: &mut impl Write) -> ExecutorResult<()> {
    match command {
        Command::Tables => {
            for table in catalog::get_tables(store)? {
                let _ = writeln!(out, "{}", table);
            }
        }
        Command::Create { name } => {
            if catalog::create_table(store, &name)? {
                let _ = writeln!(out, "created {}", name);
            } else {
                let _ = writeln!(out, "{} already exists", name);
            }
        }
        Command::Insert { table, values } => {
            let row = Row::new(values.iter().map(|v| Datum::parse_literal(v)).collect());
            let row_id = insert_row(store, &table, &row)?;
            let _ = writeln!(out, "inserted row {}", row_id);
        }
        Command::Scan { table } => {
            let mut cursor = ScanCursor::begin(Arc::clone(store), &table, vec![], None)?;
            while let Some(next) = cursor.next(ScanDirection::Forward) {
                let (row_id, row) = next?;
                let values: Vec<String> = row.iter().map(Datum::to_string).collect();
                let _ = writeln!(out, "{}\t{}", row_id, values.join("\t"));
            }
            cursor.end();
        }
        Command::MaxRowId { table } => match max_row_id(store, &table)? {
            Some(id) => {
                let _ = writeln!(out, "{}", id);
            }
            None => {
                let _ = writeln!(out, "none");
            }
        },
        Command::Shell => {
            let _ = writeln!(out, "already in a shell");
        }
    }
    Ok(())
}

/// Run commands from stdin; returns whether every line succeeded
fn shell(store: &Arc<StoreHandle>) -> bool {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut ok = true;

    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                return false;
            }
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() || words[0].starts_with('#') {
            continue;
        }

        match ShellLine::try_parse_from(words) {
            Ok(ShellLine { command }) => {
                if let Err(e) = run(store, command, &mut out) {
                    eprintln!("ERROR: {}", e);
                    ok = false;
                }
            }
            Err(e) => {
                let _ = e.print();
                ok = false;
            }
        }
    }
    ok
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.store_config();
    tracing::debug!(
        backend = %config.backend,
        dir = %config.dir.display(),
        sync_writes = config.sync_writes,
        "opening store"
    );

    let store = match StoreHandle::open(&config) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("ERROR: Failed to open storage: {}", e);
            std::process::exit(3);
        }
    };
    if let Err(e) = catalog::init_catalog(&store) {
        eprintln!("ERROR: Failed to initialize catalog: {}", e);
        std::process::exit(3);
    }

    let ok = match cli.command {
        Command::Shell => shell(&store),
        command => match run(&store, command, &mut io::stdout().lock()) {
            Ok(()) => true,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                false
            }
        },
    };

    if let Err(e) = store.close() {
        eprintln!("ERROR: Failed to close storage: {}", e);
        std::process::exit(1);
    }
    if !ok {
        std::process::exit(1);
    }
}
