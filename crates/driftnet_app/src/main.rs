mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use driftnet_core::{validate_link, DeviceProfile};
use driftnet_engine::{
    load_blocklist, load_feed_sources, rewrite, Config, ContentStore, FeedIngestor, HttpRenderer,
    Ingestor, JobPool, SqliteStore, Worker,
};
use ingest_logging::ingest_info;

#[derive(Parser)]
#[command(name = "driftnet", about = "Feed and link ingestion pipeline")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest every configured feed once, for both device profiles.
    Feeds,
    /// Drain the job pool forever.
    Worker,
    /// Queue a link for later ingestion.
    Submit {
        link: String,
        #[arg(long, default_value = "")]
        title: String,
        /// Submitter recorded as the job's owner.
        #[arg(long)]
        user: String,
        /// Device profile checked for an existing item: desktop or mobile.
        #[arg(long, default_value = "desktop")]
        profile: String,
    },
    /// Print the rewritten markup of a random stored item.
    Sample {
        #[arg(long, default_value = "desktop")]
        profile: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize(logging::LogDestination::Both);

    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        ingest_info!("no config at {:?}, using defaults", cli.config);
        Config::default()
    };

    let store: Arc<dyn ContentStore> = Arc::new(
        SqliteStore::connect(&config.db_path)
            .await
            .with_context(|| format!("opening store at {:?}", config.db_path))?,
    );
    let renderer = Arc::new(HttpRenderer::new(config.render_settings()));

    match cli.command {
        Command::Feeds => {
            let sources = load_feed_sources(&config.feed_sources_path)?;
            let ingestor = Ingestor::new(store.clone(), renderer.clone());
            let feeder = FeedIngestor::new(renderer, ingestor, config.feeder_settings());
            feeder.ingest_all_feeds(&sources).await;
        }
        Command::Worker => {
            let ingestor = Ingestor::new(store.clone(), renderer.clone());
            let pool = JobPool::new(store);
            Worker::new(ingestor, pool, config.worker_settings()).run().await;
        }
        Command::Submit {
            link,
            title,
            user,
            profile,
        } => {
            let profile = parse_profile(&profile)?;
            let blocklist = load_blocklist(&config.blocklist_path)?;
            validate_link(&link, &blocklist)?;
            let pool = JobPool::new(store);
            if pool.submit(&link, &title, &user, profile).await? {
                println!("queued {link}");
            } else {
                println!("{link} is already ingested or queued");
            }
        }
        Command::Sample { profile } => {
            let profile = parse_profile(&profile)?;
            match store.sample_random(profile).await? {
                Some(item) => {
                    let content = String::from_utf8_lossy(&item.content);
                    println!("{}", rewrite(&content, &item.link)?);
                }
                None => println!("store is empty"),
            }
        }
    }

    Ok(())
}

fn parse_profile(raw: &str) -> anyhow::Result<DeviceProfile> {
    match raw {
        "desktop" => Ok(DeviceProfile::Desktop),
        "mobile" => Ok(DeviceProfile::Mobile),
        other => Err(anyhow!("unknown profile {other:?}, expected desktop or mobile")),
    }
}
