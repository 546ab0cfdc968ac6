use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use std::path::Path;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use loam_cli::{Command, Config};
use loam_client::CmsClient;
use loam_core::{
    BindingsCatalog, CollectionBinding, ContentStore, DatasetSource, JsonSource, Reconciler,
    SeedError, Stage, load_bindings,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Setup logging (stderr to keep stdout clean for list output)
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    // Parse command line arguments
    let config = Config::parse();

    // Initialize the content API client
    let client = CmsClient::new(&config.endpoint, &config.token).map_err(friendly)?;

    // Execute command
    match config.command {
        Command::Seed {
            collection,
            data,
            bindings,
        } => {
            seed(&client, &collection, &data, bindings.as_deref()).await?;
        }
        Command::List {
            collection,
            stage,
            limit,
            bindings,
        } => {
            list(&client, &collection, stage.into(), limit, bindings.as_deref()).await?;
        }
    }

    Ok(())
}

/// Reconcile a dataset into one collection and publish converged entries
async fn seed(
    client: &CmsClient,
    collection: &str,
    data: &Path,
    bindings: Option<&Path>,
) -> anyhow::Result<()> {
    let catalog = load_bindings(bindings).map_err(friendly)?;
    let binding = select_binding(&catalog, collection)?;

    info!("Loading dataset from {}", data.display());
    let records = JsonSource::new(data).load().map_err(friendly)?;

    let reconciler = Reconciler::new(client, binding);
    let summary = reconciler.run(&records).await;

    info!("Seeding complete: {}", summary);

    if summary.has_failures() {
        anyhow::bail!(
            "{} of {} records did not converge",
            summary.failures(),
            summary.processed()
        );
    }

    Ok(())
}

/// Print the entries of a collection at the selected stage
async fn list(
    client: &CmsClient,
    collection: &str,
    stage: Stage,
    limit: usize,
    bindings: Option<&Path>,
) -> anyhow::Result<()> {
    let catalog = load_bindings(bindings).map_err(friendly)?;
    let binding = select_binding(&catalog, collection)?;

    info!("Listing '{}' at {} (limit: {})", collection, stage, limit);
    let entries = client.list(binding, stage, limit).await.map_err(friendly)?;

    if entries.is_empty() {
        eprintln!("No '{}' entries found at {}.", collection, stage);
        return Ok(());
    }

    for entry in &entries {
        println!("{}\t{}\t{}", entry.id, entry.key, entry.stage);
    }

    info!("Listed {} entries", entries.len());
    Ok(())
}

/// Look up a collection binding, reporting the known names on a miss
fn select_binding<'a>(
    catalog: &'a BindingsCatalog,
    collection: &str,
) -> anyhow::Result<&'a CollectionBinding> {
    catalog.get(collection).with_context(|| {
        format!(
            "unknown collection '{}' (known collections: {})",
            collection,
            catalog.names().join(", ")
        )
    })
}

/// Convert a seeding error into its user-facing message
fn friendly(err: SeedError) -> anyhow::Error {
    anyhow::anyhow!(err.user_message())
}
