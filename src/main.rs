use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use shelfload::config::DEFAULT_STORE_FILE;
use shelfload::ingest::{self, IngestOptions, PhaseReport};
use shelfload::models::EntityKind;
use shelfload::normalize::DatePolicy;
use shelfload::snapshot;
use shelfload::store::MemoryStore;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "shelfload")]
#[command(about = "Normalize Open Library author and work dumps into a keyed store")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load author and/or work dumps into the store
    Load(LoadArgs),
    /// Print a stored author or book as JSON
    Show(ShowArgs),
}

#[derive(Args)]
struct LoadArgs {
    /// Authors dump (plain text or .bz2); loaded before books
    #[arg(long, env = "DATADUMP_AUTHORS_PATH")]
    authors: Option<PathBuf>,

    /// Works dump (plain text or .bz2)
    #[arg(long, env = "DATADUMP_BOOKS_PATH")]
    books: Option<PathBuf>,

    /// Store snapshot file, read at start and rewritten at the end
    #[arg(long, default_value = DEFAULT_STORE_FILE)]
    store: PathBuf,

    /// Limit number of lines processed per dump (for testing)
    #[arg(long)]
    limit: Option<u64>,

    /// Keep books whose created date cannot be parsed, with the date unset
    #[arg(long)]
    lenient_dates: bool,

    /// Dry run - don't write the store snapshot
    #[arg(long)]
    dry_run: bool,

    /// Ignore any existing store snapshot and start empty (it is overwritten on save)
    #[arg(long)]
    reset_store: bool,
}

#[derive(Args)]
struct ShowArgs {
    /// Store snapshot file
    #[arg(long, default_value = DEFAULT_STORE_FILE)]
    store: PathBuf,

    #[arg(value_enum)]
    kind: EntityKind,

    /// Entity id without prefix (e.g. OL1W)
    id: String,
}

fn run_load(args: LoadArgs) -> Result<()> {
    if args.authors.is_none() && args.books.is_none() {
        bail!("Nothing to load: pass --authors and/or --books");
    }

    let mut store = if args.reset_store {
        info!(path = %args.store.display(), "Resetting store");
        MemoryStore::new()
    } else {
        snapshot::load(&args.store)
            .with_context(|| {
                format!(
                    "Failed to read store: {} (pass --reset-store to start over)",
                    args.store.display()
                )
            })?
            .unwrap_or_else(|| {
                info!("Starting with an empty store");
                MemoryStore::new()
            })
    };

    let options = IngestOptions {
        date_policy: if args.lenient_dates {
            DatePolicy::Lenient
        } else {
            DatePolicy::Strict
        },
        limit: args.limit,
    };

    let start = Instant::now();
    let report = ingest::run_pipeline(
        args.authors.as_deref(),
        args.books.as_deref(),
        &mut store,
        options,
    )?;
    let duration = start.elapsed();

    if !args.dry_run {
        snapshot::save(&store, &args.store)
            .with_context(|| format!("Failed to write store: {}", args.store.display()))?;
    }

    println!();
    println!("=== Summary ===");
    println!("Load time:          {:.2}s", duration.as_secs_f64());
    for phase in [&report.authors, &report.books].into_iter().flatten() {
        print_phase(phase);
    }
    println!();
    println!("Authors in store:   {}", store.author_count());
    println!("Books in store:     {}", store.book_count());

    Ok(())
}

fn print_phase(phase: &PhaseReport) {
    println!();
    println!("[{}] {}", phase.kind, phase.path.display());
    println!("  Lines read:       {}", phase.stats.lines_read);
    println!("  Upserted:         {}", phase.stats.upserted);
    println!("  Skipped:          {}", phase.stats.skipped);
    for (kind, count) in phase.stats.skipped_by_kind() {
        println!("    {kind:<16}{count}");
    }
    if phase.kind == EntityKind::Book {
        println!("  Unknown authors:  {}", phase.stats.unresolved_authors);
    }
    for failure in phase.failures.iter().take(10) {
        println!("  line {}: {}", failure.line, failure.error);
    }
}

fn run_show(args: ShowArgs) -> Result<()> {
    let store = match snapshot::load(&args.store)
        .with_context(|| format!("Failed to read store: {}", args.store.display()))?
    {
        Some(store) => store,
        None => bail!("No usable store at {}", args.store.display()),
    };

    let json = match args.kind {
        EntityKind::Author => store.author(&args.id).map(serde_json::to_string_pretty),
        EntityKind::Book => store.book(&args.id).map(serde_json::to_string_pretty),
    };

    match json {
        Some(json) => {
            println!("{}", json?);
            Ok(())
        }
        None => bail!("No {} with id {}", args.kind, args.id),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::Load(args) => run_load(args),
        Commands::Show(args) => run_show(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
