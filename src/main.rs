//! phone-recon: search the web for traces of a phone number
//!
//! This is the main entry point for the command-line tool.

use anyhow::{bail, Context, Result};
use phone_recon::{
    analysis::{AnalysisReport, Category},
    config,
    output::ResultStore,
    PhoneQuery, ResultSet, SearchOrchestrator,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Default)]
struct CliArgs {
    phone: Option<String>,
    config: Option<PathBuf>,
    all_variants: bool,
    no_save: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let Some(args) = parse_args(std::env::args().skip(1))? else {
        return Ok(());
    };

    // Initialize logging; the report itself goes to stdout
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    info!("Starting phone-recon v{}", phone_recon::VERSION);

    let settings = config::init(config::load(args.config)?)?;
    info!(
        "Loaded configuration: {} engines enabled",
        settings.enabled_engines().len()
    );

    let raw = match args.phone {
        Some(phone) => phone,
        None => prompt_phone_number()?,
    };
    let phone = PhoneQuery::parse(&raw)?;

    let orchestrator = SearchOrchestrator::from_settings(settings)?;
    info!("Searching {} engines", orchestrator.engine_names().join(", "));

    let results = if args.all_variants {
        orchestrator.search_all(&phone.variants()).await
    } else {
        orchestrator.search(phone.primary()).await
    };
    if results.is_empty() {
        warn!("No valid search results found");
    }

    let analysis = phone_recon::analyze(&results);
    print_report(&phone, &results, &analysis);

    if !args.no_save {
        let store = ResultStore::from_settings(&settings.output);
        let path = store.save(&phone.raw, &results, &analysis).await?;
        println!("\nResults saved to {}", path.display());
    }

    for (engine, stats) in orchestrator.metrics().engine_stats() {
        info!(
            "{}: {} fetches, {:.0}% reliable, avg {} ms",
            engine,
            stats.attempts,
            stats.reliability,
            stats.avg_latency_ms.unwrap_or_default()
        );
    }

    Ok(())
}

/// Parse arguments; `None` when the invocation only printed help or version
fn parse_args<I>(args: I) -> Result<Option<CliArgs>>
where
    I: IntoIterator<Item = String>,
{
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                return Ok(None);
            }
            "-V" | "--version" => {
                println!("phone-recon {}", phone_recon::VERSION);
                return Ok(None);
            }
            "-c" | "--config" => {
                let path = args.next().context("--config requires a file path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--all-variants" => parsed.all_variants = true,
            "--no-save" => parsed.no_save = true,
            flag if flag.starts_with("--") => bail!("unknown option: {flag}"),
            phone => {
                if parsed.phone.is_some() {
                    bail!("only one phone number can be searched at a time");
                }
                parsed.phone = Some(phone.to_string());
            }
        }
    }

    Ok(Some(parsed))
}

fn prompt_phone_number() -> Result<String> {
    print!("Enter phone number with country code (e.g., +861xxxxxxxxx): ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn print_report(phone: &PhoneQuery, results: &ResultSet, analysis: &AnalysisReport) {
    println!("\nSearch results for {phone}");
    println!("Found {} unique results", results.len());

    for category in [
        Category::SocialMedia,
        Category::Government,
        Category::Documents,
        Category::ContactInfo,
        Category::Others,
    ] {
        let urls = analysis.category(category);
        if urls.is_empty() {
            continue;
        }
        println!("\n{} ({})", category, urls.len());
        for url in urls {
            println!("  {url}");
        }
    }

    let top = analysis.top_domains(5);
    if !top.is_empty() {
        println!("\nTop domains");
        for (domain, count) in top {
            println!("  {domain}: {count}");
        }
    }
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
phone-recon v{}
Search the web for traces of a phone number

USAGE:
    phone-recon [OPTIONS] [PHONE_NUMBER]

OPTIONS:
    -c, --config <FILE>    Path to configuration file
        --all-variants     Also search digit-only and operator query variants
        --no-save          Do not write a result file
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT VARIABLES:
    PHONE_RECON_SETTINGS_PATH  Path to settings.yml
    PHONE_RECON_CACHE_DIR      Cache directory
    PHONE_RECON_OUTPUT_DIR     Result file directory
    PHONE_RECON_BATCH_SIZE     Engines fetched concurrently per batch
    PHONE_RECON_TIMEOUT        Per-request timeout in seconds
    PHONE_RECON_PROXY          Comma-separated proxy list
    RUST_LOG                   Log filter (default: info)
"#,
        phone_recon::VERSION
    );
}
