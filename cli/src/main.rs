//! `nidx` command line front end.
//!
//! Every command opens the index described by the config file, runs, and
//! stops the index again so the database is flushed. Results are printed as
//! JSON, bulk output as JSON lines.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nidx_core::NameIndex;
use nidx_core::types::{IndexConfig, MatchType, Name, NameType, NomCode, Rank};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::UNIX_EPOCH;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "nidx")]
#[command(about = "Scientific names index")]
struct Cli {
    /// Config file (TOML)
    #[arg(short, long, value_name = "PATH", default_value = "nidx.toml")]
    config: PathBuf,

    /// Database directory, overrides the config file location
    #[arg(short, long, value_name = "DIR")]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Match a single name
    Match {
        scientific_name: String,
        #[arg(short, long)]
        authorship: Option<String>,
        #[arg(short, long)]
        rank: Option<Rank>,
        #[arg(long)]
        code: Option<NomCode>,
        #[arg(long = "type", default_value = "scientific")]
        name_type: NameType,
        /// Insert the name when no exact or variant match exists
        #[arg(short, long)]
        insert: bool,
        /// Include the other candidates in the result
        #[arg(short, long)]
        verbose: bool,
    },
    /// Print a record by key
    Get { key: u32 },
    /// Print the qualified records of a canonical key
    Group { key: u32 },
    /// Delete a record and, for canonical records, its group
    Delete { key: u32 },
    /// Match JSON lines of names with inserts
    Import {
        /// Input file, stdin when absent
        file: Option<PathBuf>,
    },
    /// Write all records as JSON lines
    Export {
        /// Output file, stdout when absent
        file: Option<PathBuf>,
    },
    /// Print index size and creation time
    Stats,
    /// Compact the database file
    Compact,
    /// Remove all records
    Reset,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut config = IndexConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    if let Some(dir) = cli.data {
        config.file = Some(dir);
    }

    let index = NameIndex::open(&config, None).context("failed to open names index")?;
    let outcome = run(&index, cli.command);
    index.stop().context("failed to stop names index")?;
    outcome
}

fn run(index: &NameIndex, command: Command) -> Result<()> {
    match command {
        Command::Match {
            scientific_name,
            authorship,
            rank,
            code,
            name_type,
            insert,
            verbose,
        } => {
            let mut name = Name::new(scientific_name).with_type(name_type);
            if let Some(authorship) = authorship {
                name = name.with_authorship(&authorship);
            }
            name.rank = rank;
            name.code = code;
            let result = index.match_name(&name, insert, verbose)?;
            print_json(&result)
        }
        Command::Get { key } => print_json(&index.get(key)?),
        Command::Group { key } => print_json(&index.get_canonical_group(key)?),
        Command::Delete { key } => print_json(&index.delete(key, false)?),
        Command::Import { file } => {
            let reader: Box<dyn BufRead> = match file {
                Some(path) => Box::new(BufReader::new(
                    File::open(&path).with_context(|| format!("failed to open {}", path.display()))?,
                )),
                None => Box::new(io::stdin().lock()),
            };
            let summary = import(index, reader)?;
            print_json(&summary)
        }
        Command::Export { file } => {
            let writer: Box<dyn Write> = match file {
                Some(path) => Box::new(
                    File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?,
                ),
                None => Box::new(io::stdout().lock()),
            };
            let mut writer = BufWriter::new(writer);
            let all = index.all()?;
            for name in &all {
                serde_json::to_writer(&mut writer, name)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
            info!(records = all.len(), "export finished");
            Ok(())
        }
        Command::Stats => {
            let created = index
                .created()?
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs());
            print_json(&serde_json::json!({
                "size": index.size()?,
                "created": created,
            }))
        }
        Command::Compact => {
            index.compact()?;
            print_json(&serde_json::json!({ "compacted": true }))
        }
        Command::Reset => {
            index.reset()?;
            print_json(&serde_json::json!({ "size": index.size()? }))
        }
    }
}

/// Matches every line with inserts and counts the outcome per match type.
fn import(index: &NameIndex, reader: Box<dyn BufRead>) -> Result<BTreeMap<String, usize>> {
    let mut summary = BTreeMap::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let name: Name = match serde_json::from_str(&line) {
            Ok(name) => name,
            Err(err) => {
                warn!(line = line_no + 1, error = %err, "skipping unreadable name");
                *summary.entry("invalid".to_string()).or_insert(0) += 1;
                continue;
            }
        };
        let result = index.match_name(&name, true, false)?;
        *summary.entry(kind_label(result.kind).to_string()).or_insert(0) += 1;
    }
    Ok(summary)
}

fn kind_label(kind: MatchType) -> &'static str {
    match kind {
        MatchType::Exact => "exact",
        MatchType::Variant => "variant",
        MatchType::Canonical => "canonical",
        MatchType::Ambiguous => "ambiguous",
        MatchType::None => "none",
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
