//! exegete: ingest scripture corpora into modules and query them.

mod error;
mod fetch;
mod ingest;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use exegete_catalog::Catalog;
use exegete_config::Config;
use exegete_ingest::{NetBible, Njps, Sblgnt};
use exegete_modules::{Database, Manager};
use exn::ResultExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::{ErrorKind, Result};

#[derive(Parser)]
#[command(name = "exegete", author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a source corpus into a new module and finalize it
    Ingest {
        #[arg(value_enum)]
        source: SourceKind,
        /// Root directory of the corpus
        path: PathBuf,
    },
    /// Download a source corpus that is published online
    Fetch {
        #[arg(value_enum)]
        source: FetchKind,
        /// Directory to download into
        path: PathBuf,
    },
    /// List module namespaces and whether they are finalized
    Modules,
    /// Print the table of contents of every finalized module as JSON
    Toc,
    /// Print the objects starting inside a chapter/verse range as JSON
    Scripture {
        /// Module shortcode, e.g. NET
        shortcode: String,
        /// Book name as listed in the table of contents
        book: String,
        chapter_start: u32,
        verse_start: u32,
        chapter_end: u32,
        verse_end: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceKind {
    Net,
    Njps,
    Sblgnt,
}

#[derive(Clone, Copy, ValueEnum)]
enum FetchKind {
    Njps,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err:?}");
            return ExitCode::FAILURE;
        },
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(retryable = err.is_retryable(), "{err:?}");
            ExitCode::FAILURE
        },
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path).or_raise(|| ErrorKind::Config)
}

async fn run(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Ingest { source, path } => {
            let db = open_for_ingest(config).await?;
            let ingested = match source {
                SourceKind::Net => ingest::ingest(&db, NetBible::new(path).with_stemming(config.stem)).await?,
                SourceKind::Njps => ingest::ingest(&db, Njps::new(path).with_stemming(config.stem)).await?,
                SourceKind::Sblgnt => ingest::ingest(&db, Sblgnt::new(path)).await?,
            };
            db.close().await;
            println!("{} {} ({} objects)", ingested.namespace, ingested.content_hash, ingested.objects);
        },
        Commands::Fetch {
            source: FetchKind::Njps,
            path,
        } => {
            let fetched = fetch::fetch_njps(&path).await?;
            println!("downloaded {fetched} books into {}", path.display());
        },
        Commands::Modules => {
            let db = open_for_reading(config).await?;
            let modules = Manager::from(&db).list_module_info().await.or_raise(|| ErrorKind::Storage)?;
            db.close().await;
            let mut out = std::io::stdout().lock();
            for module in modules {
                let status = module.content_hash.as_deref().unwrap_or("incomplete");
                writeln!(out, "{}\t{}\t{}", module.namespace, module.metadata.shortcode, status)
                    .or_raise(|| ErrorKind::Output)?;
            }
        },
        Commands::Toc => {
            let db = open_for_reading(config).await?;
            let catalog = Catalog::load(&db).await.or_raise(|| ErrorKind::Catalog)?;
            let json = catalog.to_json().await.or_raise(|| ErrorKind::Catalog)?;
            db.close().await;
            println!("{json}");
        },
        Commands::Scripture {
            shortcode,
            book,
            chapter_start,
            verse_start,
            chapter_end,
            verse_end,
        } => {
            let db = open_for_reading(config).await?;
            let catalog = Catalog::load(&db).await.or_raise(|| ErrorKind::Catalog)?;
            let passages = catalog
                .get_scripture(&shortcode, &book, chapter_start, verse_start, chapter_end, verse_end)
                .await
                .or_raise(|| ErrorKind::Catalog)?;
            db.close().await;
            println!("{}", serde_json::to_string(&passages).or_raise(|| ErrorKind::Output)?);
        },
    }
    Ok(())
}

async fn open_for_ingest(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Io(parent.to_path_buf()))?;
    }
    Database::open(&config.database, config.max_connections)
        .await
        .or_raise(|| ErrorKind::Storage)
}

async fn open_for_reading(config: &Config) -> Result<Database> {
    Database::open_read_only(&config.database, config.max_connections)
        .await
        .or_raise(|| ErrorKind::Storage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Config));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_only_downloads_are_retryable() {
        assert!(ErrorKind::Fetch("https://example.org".into()).is_retryable());
        assert!(!ErrorKind::Storage.is_retryable());
        assert!(!ErrorKind::Io(PathBuf::from("/tmp")).is_retryable());
    }
}
