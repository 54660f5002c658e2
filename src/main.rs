//! Townsmith - command-line front end
//!
//! Repairs, audits and builds generator-authored town documents. Built
//! placements are written to stdout as JSON lines; logs and summaries go
//! to stderr.

use clap::{Parser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use townsmith::core::error::Result;
use townsmith::core::types::Vec3;
use townsmith::core::TownConfig;
use townsmith::llm::extract_documents;
use townsmith::spawn::{
    BatchEntry, FileStore, JsonLinesBuilder, MemoryStore, OpenWorld, TownSpawner, TownStore,
};
use townsmith::town::{Auditor, TownDocument, ZoneCatalog};

/// Repair, audit and spawn LLM-generated towns
#[derive(Parser, Debug)]
#[command(name = "townsmith")]
#[command(about = "Turn LLM-generated town definitions into world placements")]
struct Cli {
    /// Pipeline configuration (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the repaired JSON of a document
    Repair {
        /// Input file, or `-` for stdin
        file: PathBuf,
    },

    /// Audit every document in a response; exits 1 on findings
    Audit {
        /// Input file, or `-` for stdin
        file: PathBuf,
    },

    /// Build every document in a response
    Build {
        /// Input file, or `-` for stdin
        file: PathBuf,

        /// Default origin as `x,y,z`
        #[arg(long, value_parser = parse_origin, default_value = "0,0,0")]
        origin: Vec3,

        /// Directory to persist built towns in
        #[arg(long)]
        store: Option<PathBuf>,

        /// Build even when the audit has findings
        #[arg(long)]
        force: bool,
    },

    /// Rebuild saved towns at their stored origins
    Restore {
        /// Town to restore; all saved towns when omitted
        name: Option<String>,

        #[arg(long)]
        store: PathBuf,
    },

    /// Remove a saved town
    Remove {
        name: String,

        #[arg(long)]
        store: PathBuf,
    },

    /// List saved towns
    List {
        #[arg(long)]
        store: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("townsmith=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => TownConfig::load_from_toml(path)?,
        None => TownConfig::default(),
    };

    match cli.command {
        Command::Repair { file } => {
            let parsed = TownDocument::parse(&read_input(&file)?)?;
            if parsed.repaired {
                eprintln!("note: document was truncated and has been closed");
            }
            println!("{}", parsed.text);
            Ok(ExitCode::SUCCESS)
        }
        Command::Audit { file } => {
            let text = read_input(&file)?;
            Ok(if audit_response(&config, &text) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Build {
            file,
            origin,
            store,
            force,
        } => {
            let text = read_input(&file)?;
            if !audit_response(&config, &text) && !force {
                eprintln!("Audit failed; fix the findings above or pass --force");
                return Ok(ExitCode::FAILURE);
            }
            let entries = match store {
                Some(dir) => build(config, FileStore::open(dir)?, &text, origin),
                None => build(config, MemoryStore::new(), &text, origin),
            };
            Ok(report_batch(&entries))
        }
        Command::Restore { name, store } => {
            let mut spawner = spawner(config, FileStore::open(store)?);
            let mut failed = false;
            match name {
                Some(name) => {
                    let outcome = spawner.restore(&name)?;
                    eprintln!("{} at {}", outcome.summary, outcome.origin);
                }
                None => {
                    for (name, result) in spawner.restore_all()? {
                        match result {
                            Ok(outcome) => eprintln!("{} at {}", outcome.summary, outcome.origin),
                            Err(e) => {
                                failed = true;
                                eprintln!("{}: {}", name, e);
                            }
                        }
                    }
                }
            }
            Ok(if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Command::Remove { name, store } => {
            let mut spawner = spawner(config, FileStore::open(store)?);
            Ok(if spawner.remove(&name)? {
                ExitCode::SUCCESS
            } else {
                eprintln!("No saved town named '{}'", name);
                ExitCode::FAILURE
            })
        }
        Command::List { store } => {
            let store = FileStore::open(store)?;
            for name in store.names()? {
                match store.load(&name)? {
                    Some(town) => println!("{}\t{}", name, town.origin()),
                    None => println!("{}", name),
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

type CliSpawner<S> = TownSpawner<JsonLinesBuilder<io::Stdout>, S, OpenWorld>;

fn spawner<S: TownStore>(config: TownConfig, store: S) -> CliSpawner<S> {
    TownSpawner::new(config, JsonLinesBuilder::new(io::stdout()), store, OpenWorld)
}

fn build<S: TownStore>(config: TownConfig, store: S, text: &str, origin: Vec3) -> Vec<BatchEntry> {
    let mut spawner = spawner(config, store);
    let entries = spawner.build_response(text, origin);
    if let Err(e) = spawner.builder_mut().flush() {
        tracing::warn!("Failed to flush placements: {}", e);
    }
    entries
}

/// Audit each document of a response, printing findings; true when clean
fn audit_response(config: &TownConfig, text: &str) -> bool {
    let zones = ZoneCatalog::with_extra(&config.extra_zones);
    let auditor = Auditor::from_config(&zones, config);

    let mut documents = extract_documents(text);
    if documents.is_empty() {
        documents.push(text);
    }

    let mut clean = true;
    for (index, document) in documents.iter().enumerate() {
        let report = auditor.audit(document);
        if report.is_clean() {
            eprintln!("Document {}: clean", index);
        } else {
            clean = false;
            eprintln!("Document {}: {} finding(s)", index, report.len());
            eprintln!("{}", report.feedback());
        }
    }
    clean
}

fn report_batch(entries: &[BatchEntry]) -> ExitCode {
    let mut failed = false;
    for entry in entries {
        match &entry.result {
            Ok(outcome) => eprintln!("{} at {}", outcome.summary, outcome.origin),
            Err(e) => {
                failed = true;
                eprintln!("Document {} failed: {}", entry.index, e);
            }
        }
    }
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    Ok(std::fs::read_to_string(path)?)
}

fn parse_origin(value: &str) -> std::result::Result<Vec3, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected x,y,z but got '{}'", value));
    };
    let coord = |s: &str| {
        s.parse::<f32>()
            .map_err(|e| format!("bad coordinate '{}': {}", s, e))
    };
    Ok(Vec3::new(coord(*x)?, coord(*y)?, coord(*z)?))
}
