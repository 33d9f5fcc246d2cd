use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use std::path::{Path, PathBuf};
use tracing::info;

use stock_valuator::commands::copy_records;
use stock_valuator::database::open_store;
use stock_valuator::models::{StoreBackend, DEFAULT_HISTORY_LEN};
use stock_valuator::utils::init_logging;

fn backend_for(path: &Path, explicit: Option<&String>) -> Result<StoreBackend> {
    match explicit {
        Some(name) => name.parse().map_err(anyhow::Error::msg),
        None => Ok(StoreBackend::infer(path)),
    }
}

fn main() -> Result<()> {
    init_logging("stock_valuator=info,convert_store=info");

    let matches = Command::new("Company Store Converter")
        .version("1.0")
        .about("Copy saved companies between SQLite, JSON and CSV stores")
        .arg(Arg::new("from")
            .long("from")
            .value_name("FILE")
            .help("Store to read from")
            .required(true))
        .arg(Arg::new("to")
            .long("to")
            .value_name("FILE")
            .help("Store to write into (created if missing)")
            .required(true))
        .arg(Arg::new("from_backend")
            .long("from-backend")
            .help("Format of the source: sqlite, json or csv (default: by extension)"))
        .arg(Arg::new("to_backend")
            .long("to-backend")
            .help("Format of the target: sqlite, json or csv (default: by extension)"))
        .arg(Arg::new("history_len")
            .long("history-len")
            .value_parser(clap::value_parser!(usize))
            .help("Number of historical multiples per company"))
        .arg(Arg::new("overwrite")
            .long("overwrite")
            .help("Replace companies that already exist in the target")
            .action(ArgAction::SetTrue))
        .get_matches();

    let from = PathBuf::from(matches.get_one::<String>("from").context("--from is required")?);
    let to = PathBuf::from(matches.get_one::<String>("to").context("--to is required")?);
    let history_len = matches
        .get_one::<usize>("history_len")
        .copied()
        .unwrap_or(DEFAULT_HISTORY_LEN);
    let overwrite = matches.get_flag("overwrite");

    anyhow::ensure!(from != to, "source and target are the same file");

    let from_backend = backend_for(&from, matches.get_one::<String>("from_backend"))?;
    let to_backend = backend_for(&to, matches.get_one::<String>("to_backend"))?;

    println!("🔄 COMPANY STORE CONVERTER");
    println!("📥 From: {} ({})", from.display(), from_backend);
    println!("📤 To:   {} ({})", to.display(), to_backend);
    println!("{}", "=".repeat(60));

    let source = open_store(from_backend, &from, history_len)
        .with_context(|| format!("Failed to open {}", from.display()))?;
    let mut target = open_store(to_backend, &to, history_len)
        .with_context(|| format!("Failed to open {}", to.display()))?;

    let report = copy_records(source.as_ref(), target.as_mut(), overwrite)?;

    println!("✅ Copied:   {}", report.copied);
    if !report.kept.is_empty() {
        println!("⏭️  Kept existing ({}): {}", report.kept.len(), report.kept.join(", "));
        println!("💡 Use --overwrite to replace them");
    }
    for (name, reason) in &report.rejected {
        println!("❌ {}: {}", name, reason);
    }

    info!("Conversion finished");
    Ok(())
}
