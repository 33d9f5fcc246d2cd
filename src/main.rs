use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use stock_valuator::analysis::{BucketSelector, ValuationEngine, ValuationResult};
use stock_valuator::commands::{self, DeleteOutcome, ShowOutcome};
use stock_valuator::database::{open_store, RecordStore};
use stock_valuator::models::{
    parse_margins, Aggregation, CompanyRecord, Config, PercentBasis, StoreBackend, ValuationConfig,
};
use stock_valuator::ui::{self, format, CompanyForm};
use stock_valuator::utils::init_logging;

#[derive(Parser, Debug)]
#[command(name = "stock-valuator", version, about = "Target prices and buy-below levels from historical multiples")]
struct Cli {
    /// Store location (defaults to DATABASE_PATH or companies.db)
    #[arg(long, global = true, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Store format: sqlite, json or csv
    #[arg(long, global = true)]
    backend: Option<StoreBackend>,

    /// How historical multiples are averaged: mean or median
    #[arg(long, global = true)]
    aggregation: Option<Aggregation>,

    /// Undervaluation denominator: target or current
    #[arg(long, global = true)]
    basis: Option<PercentBasis>,

    /// Safety margins, e.g. "0.30,0.40" or "30,40"
    #[arg(long, global = true)]
    margins: Option<String>,

    /// Number of historical multiples per company
    #[arg(long, global = true)]
    history_len: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Save a company, replacing any record with the same name
    #[command(allow_negative_numbers = true)]
    Save {
        name: String,
        #[command(flatten)]
        fields: CompanyArgs,
    },
    /// Change some fields of a saved company
    #[command(allow_negative_numbers = true)]
    Edit {
        name: String,
        /// Give the company a new name
        #[arg(long)]
        rename: Option<String>,
        #[command(flatten)]
        fields: CompanyArgs,
    },
    /// Show the valuation of one company
    Show { name: String },
    /// List companies, optionally filtered by undervaluation
    List {
        /// all, undervalued, overvalued, low, 30-40 or 40+
        #[arg(long, short, default_value = "all")]
        filter: BucketSelector,
    },
    /// Delete a company
    Delete { name: String },
    /// Browse companies interactively
    Tui,
}

/// Company fields as typed; numbers are coerced by the form
#[derive(Args, Debug, Default)]
struct CompanyArgs {
    /// Current share price
    #[arg(long)]
    price: Option<String>,
    /// Historical P/E values
    #[arg(long, num_args = 1.., value_name = "P/E")]
    pe: Option<Vec<String>>,
    /// Historical P/S values
    #[arg(long, num_args = 1.., value_name = "P/S")]
    ps: Option<Vec<String>>,
    /// Historical PEG values
    #[arg(long, num_args = 1.., value_name = "PEG")]
    peg: Option<Vec<String>>,
    /// Expected earnings per share this year
    #[arg(long)]
    eps_this: Option<String>,
    /// Expected earnings per share next year
    #[arg(long)]
    eps_next: Option<String>,
    /// Expected revenue growth this year, percent
    #[arg(long)]
    growth_this: Option<String>,
    /// Expected revenue growth next year, percent
    #[arg(long)]
    growth_next: Option<String>,
}

impl CompanyArgs {
    fn apply(self, form: &mut CompanyForm) {
        if let Some(v) = self.price {
            form.current_price = v;
        }
        if let Some(v) = self.pe {
            form.pe = v;
        }
        if let Some(v) = self.ps {
            form.ps = v;
        }
        if let Some(v) = self.peg {
            form.peg = v;
        }
        if let Some(v) = self.eps_this {
            form.earnings_this_year = v;
        }
        if let Some(v) = self.eps_next {
            form.earnings_next_year = v;
        }
        if let Some(v) = self.growth_this {
            form.growth_this_year = v;
        }
        if let Some(v) = self.growth_next {
            form.growth_next_year = v;
        }
    }
}

/// Environment configuration with command line overrides applied
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env()?;

    if let Some(db) = &cli.db {
        config.database_path = db.clone();
        config.backend = StoreBackend::infer(db);
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(len) = cli.history_len {
        anyhow::ensure!(len > 0, "--history-len must be at least 1");
        config.history_len = len;
    }

    let margins = match &cli.margins {
        Some(text) => parse_margins(text).map_err(anyhow::Error::msg)?,
        None => config.valuation.margins.clone(),
    };
    config.valuation = ValuationConfig::new(
        cli.aggregation.unwrap_or(config.valuation.aggregation),
        margins,
        cli.basis.unwrap_or(config.valuation.percent_basis),
    )?;

    debug!("Resolved configuration: {:?}", config);
    Ok(config)
}

fn print_valuation(record: &CompanyRecord, valuation: &ValuationResult) {
    let bucket = valuation.bucket();
    println!("📈 Analysis for {}", record.name);
    println!("   Current price:   {}", format::money(record.current_price));
    println!("   Target price:    {}", format::money(valuation.target_price));
    println!(
        "   Undervaluation:  {} ({})",
        format::percent(valuation.undervaluation_pct),
        format::bucket_label(bucket)
    );
    for mp in &valuation.buy_prices {
        println!(
            "   Buy below at {} safety margin: {}",
            format::margin_label(mp.margin),
            format::money(mp.price)
        );
    }
    println!(
        "   Avg P/E {} • Avg P/S {} • Avg EPS {} • Growth factor {:.4}",
        format::money(valuation.avg_pe),
        format::money(valuation.avg_ps),
        format::money(valuation.avg_earnings),
        valuation.growth_factor
    );
    if let Some(peg) = valuation.avg_peg {
        println!("   Avg PEG {}", format::money(peg));
    }
}

fn print_suggestions(name: &str, suggestions: &[String]) {
    println!("⚠️  No company named '{}'", name);
    if !suggestions.is_empty() {
        println!("   Did you mean: {}?", suggestions.join(", "));
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    let engine = ValuationEngine::new(config.valuation.clone());
    let mut store: Box<dyn RecordStore> = open_store(config.backend, &config.database_path, config.history_len)
        .with_context(|| format!("Failed to open store at {}", config.database_path.display()))?;

    match cli.command {
        Commands::Save { name, fields } => {
            let mut form = CompanyForm::blank(config.history_len);
            form.name = name;
            fields.apply(&mut form);

            let record = commands::save_company(store.as_mut(), &form)?;
            println!("💾 {} saved", record.name);
            match engine.evaluate(&record) {
                Ok(valuation) => print_valuation(&record, &valuation),
                Err(e) => println!("❌ {}", format::valuation_error(&e)),
            }
        }
        Commands::Edit { name, rename, fields } => {
            let record = commands::edit_company(store.as_mut(), &name, |form| {
                if let Some(new_name) = rename {
                    form.name = new_name;
                }
                fields.apply(form);
            })?;
            println!("💾 {} updated", record.name);
        }
        Commands::Show { name } => match commands::show_company(store.as_ref(), &engine, &name)? {
            ShowOutcome::Valued { record, valuation } => print_valuation(&record, &valuation),
            ShowOutcome::Unvalued { record, error } => {
                println!("📈 Analysis for {}", record.name);
                println!("❌ {}", format::valuation_error(&error));
            }
            ShowOutcome::NotFound { suggestions } => print_suggestions(&name, &suggestions),
        },
        Commands::List { filter } => {
            let listing = commands::list_companies(store.as_ref(), &engine, filter)?;
            println!("🔍 {}", format::selector_label(filter));

            if listing.shown.is_empty() {
                println!("No companies match the selected filter.");
            } else {
                println!(
                    "{:<28} {:>10} {:>10} {:>10}  {}",
                    "Company", "Price", "Target", "Under %", "Bucket"
                );
                for company in &listing.shown {
                    let v = &company.valuation;
                    println!(
                        "{:<28} {:>10} {:>10} {:>10}  {}",
                        company.record.name,
                        format::money(company.record.current_price),
                        format::money(v.target_price),
                        format::percent(v.undervaluation_pct),
                        format::bucket_label(v.bucket())
                    );
                }
            }

            if !listing.unvalued.is_empty() {
                println!();
                println!("⚠️  {} companies could not be valued:", listing.unvalued.len());
                for (name, error) in &listing.unvalued {
                    println!("   {}: {}", name, format::valuation_error(error));
                }
            }
        }
        Commands::Delete { name } => match commands::delete_company(store.as_mut(), &name)? {
            DeleteOutcome::Deleted => println!("🗑️  {} deleted", name),
            DeleteOutcome::NotFound { suggestions } => print_suggestions(&name, &suggestions),
        },
        Commands::Tui => ui::run_app(store, engine)?,
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // Keep the terminal clean while the TUI owns it
    let default_filter = if matches!(cli.command, Commands::Tui) {
        "stock_valuator=error"
    } else {
        "stock_valuator=warn"
    };
    init_logging(default_filter);

    if let Err(e) = run(cli) {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}
