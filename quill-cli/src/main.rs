use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use quill_common::memory::{Dataset, MemoryStore};
use quill_common::page;
use quill_common::store::BlogStore;
use serde::Serialize;
use sqlx::PgPool;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Which page to build the view context for.
#[derive(Clone, Eq, PartialEq, Debug, Subcommand)]
enum Command {
    Home,
    Post { slug: String },
    Tag { title: String },
    Contacts,
}

#[derive(Clone, Eq, PartialEq, Debug, Parser)]
struct Args {
    /// Read posts from a JSON dataset instead of the DATABASE_URL database
    #[arg(short, long, global = true)]
    dataset: Option<PathBuf>,
    #[arg(short, long, global = true)]
    pretty: bool,
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    _ = dotenv::dotenv();
    color_eyre::install()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill_cli=debug,quill_common=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let store: Box<dyn BlogStore> = match &args.dataset {
        Some(path) => Box::new(load_dataset(path)?),
        None => Box::new(connect_database().await?),
    };

    let json = context_json(&*store, &args.command, args.pretty).await?;
    println!("{json}");

    Ok(())
}

fn load_dataset(path: &Path) -> color_eyre::Result<MemoryStore> {
    let file = File::open(path).wrap_err("Opening dataset failed")?;
    let dataset: Dataset =
        serde_json::from_reader(BufReader::new(file)).wrap_err("Dataset was not valid json")?;

    MemoryStore::new(dataset).wrap_err("Dataset is inconsistent")
}

async fn connect_database() -> color_eyre::Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL").wrap_err("DATABASE_URL env var error")?;

    PgPool::connect(&database_url)
        .await
        .wrap_err("Could not connect to database")
}

fn to_json<T: Serialize>(context: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(context)
    } else {
        serde_json::to_string(context)
    }
}

async fn context_json(
    store: &dyn BlogStore,
    command: &Command,
    pretty: bool,
) -> color_eyre::Result<String> {
    let json = match command {
        Command::Home => to_json(&page::build_home_context(store).await?, pretty),
        Command::Post { slug } => to_json(
            &page::build_post_detail_context(store, slug).await?,
            pretty,
        ),
        Command::Tag { title } => to_json(
            &page::build_tag_filter_context(store, title).await?,
            pretty,
        ),
        Command::Contacts => to_json(&page::build_contacts_context(), pretty),
    };

    json.wrap_err("Serializing context failed")
}
