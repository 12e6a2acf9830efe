//! Loads the Project Gutenberg RDF catalog into a SQLite database.

use clap::{Parser, Subcommand};
use derive_more::{Display, Error};
use exn::ResultExt;
use pgrdf_cache::{Database, Repository};
use pgrdf_config::Config;
use pgrdf_ingest::{record, records, run_full_reload, run_incremental};
use pgrdf_source::SourceHandle;
use pgrdf_source::backend::LocalSource;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Display, Error)]
enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open document directory")]
    Source,
    #[display("could not open catalog database")]
    Database,
    #[display("could not extract document")]
    Extract,
    #[display("load did not complete")]
    Ingest,
}
type Result<T> = std::result::Result<T, exn::Exn<ErrorKind>>;

#[derive(Parser)]
#[command(name = "pgrdf")]
#[command(about = "Load the Project Gutenberg RDF catalog into a relational store")]
#[command(version)]
struct Cli {
    /// Configuration file path (defaults to `config.toml` in the platform
    /// config directory, if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one catalog document and print the record
    Parse {
        /// Catalog number
        id: u64,
    },
    /// Load every catalog document not yet in the database
    Load {
        /// Delete everything first and load from scratch
        #[arg(long)]
        clean: bool,
        /// Read and extract everything, but write nothing
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match pgrdf_config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{:?}", err.raise(ErrorKind::Config));
            return ExitCode::FAILURE;
        },
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log.level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let result = match cli.command {
        Commands::Parse { id } => parse(&config, id).await,
        Commands::Load { clean, dry_run } => load(&config, clean, dry_run).await,
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:?}");
            ExitCode::FAILURE
        },
    }
}

fn source(config: &Config) -> Result<SourceHandle> {
    let root = std::path::absolute(&config.documents).or_raise(|| ErrorKind::Source)?;
    let source = LocalSource::new("documents", root).or_raise(|| ErrorKind::Source)?;
    Ok(Arc::new(source))
}

async fn parse(config: &Config, id: u64) -> Result<()> {
    let source = source(config)?;
    let book = record(&source, id).await.or_raise(|| ErrorKind::Extract)?;
    println!("{book:#?}");
    Ok(())
}

async fn load(config: &Config, clean: bool, dry_run: bool) -> Result<()> {
    let source = source(config)?;
    tracing::info!(
        documents = %config.documents.display(),
        database = %config.database.display(),
        clean,
        dry_run,
        "starting load"
    );
    let db = Database::connect(&config.database).await.or_raise(|| ErrorKind::Database)?;
    let repo = Repository::new(db.pool().clone(), dry_run);
    let records = records(&source).await.or_raise(|| ErrorKind::Ingest)?;
    let outcome = match clean {
        true => run_full_reload(&repo, records).await,
        false => run_incremental(&repo, records).await,
    };
    let counts = repo.counts().await;
    db.close().await;
    let progress = outcome.or_raise(|| ErrorKind::Ingest)?;
    let counts = counts.or_raise(|| ErrorKind::Database)?;
    println!(
        "processed {}, stored {}, skipped {}, rejected {}{}",
        progress.processed,
        progress.stored,
        progress.skipped,
        progress.rejected,
        if dry_run { " (dry run)" } else { "" },
    );
    println!(
        "catalog now holds {} books, {} authors, {} author links, {} subjects",
        counts.books, counts.authors, counts.book_authors, counts.book_subjects,
    );
    Ok(())
}
