use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use loam_core::Stage;

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "loam")]
#[command(
    author,
    version,
    about = "Reconciliation-driven content seeder for staged GraphQL repositories"
)]
#[command(after_help = "Examples:
  loam seed industries --data data/industries.json
  loam seed applications --data data/applications.json
  loam list technologies --stage published --limit 50")]
pub struct Config {
    /// GraphQL endpoint of the content repository
    #[arg(long, env = "LOAM_ENDPOINT")]
    pub endpoint: String,

    /// Access token with draft read, mutation, and publish permissions
    #[arg(long, env = "LOAM_TOKEN")]
    pub token: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reconcile a dataset into a collection and publish the result
    #[command(after_help = "Examples:
  loam seed industries --data data/industries.json
  loam seed components --data data/components.json
  loam seed applications --data datasets/ --bindings custom-bindings.toml")]
    Seed {
        /// Collection to seed, by catalog name
        #[arg(value_name = "COLLECTION")]
        collection: String,

        /// Path to a JSON dataset file, or a directory of JSON files
        #[arg(short, long, value_name = "PATH")]
        data: PathBuf,

        /// Path to a bindings file overriding the built-in catalog
        #[arg(short, long, value_name = "PATH")]
        bindings: Option<PathBuf>,
    },

    /// List the entries of a collection at a content stage
    #[command(after_help = "Examples:
  loam list industries
  loam list applications --stage published --limit 200")]
    List {
        /// Collection to list, by catalog name
        #[arg(value_name = "COLLECTION")]
        collection: String,

        /// Content stage to read from
        #[arg(short, long, default_value = "draft")]
        stage: StageArg,

        /// Maximum number of entries to fetch
        #[arg(short, long, default_value = "100")]
        limit: usize,

        /// Path to a bindings file overriding the built-in catalog
        #[arg(short, long, value_name = "PATH")]
        bindings: Option<PathBuf>,
    },
}

/// Content stages selectable on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StageArg {
    /// Work-in-progress content
    Draft,
    /// Live content
    Published,
}

impl From<StageArg> for Stage {
    fn from(value: StageArg) -> Self {
        match value {
            StageArg::Draft => Stage::Draft,
            StageArg::Published => Stage::Published,
        }
    }
}
