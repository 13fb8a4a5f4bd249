pub mod commands;
pub mod utils;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{self, AppConfig};
use crate::database::DatabaseManager;
use crate::store::{CallPolicy, PgStore, Store};

#[derive(Parser)]
#[command(name = "mentor")]
#[command(about = "Mentor CLI - operate the assessment pipeline from the command line")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply database migrations")]
    Migrate,

    #[command(about = "Insert a demo organization, its members and the disc-basic test")]
    Seed,

    #[command(about = "Browse and publish tests")]
    Test {
        #[command(subcommand)]
        cmd: commands::test::TestCommands,
    },

    #[command(about = "Assign a test to a leader")]
    Assign(commands::assignment::AssignArgs),

    #[command(about = "List assignments of an organization or a leader")]
    Assignments(commands::assignment::ListArgs),

    #[command(about = "Assignment totals for an organization")]
    Stats(commands::assignment::StatsArgs),

    #[command(about = "Answer an assignment interactively and submit it")]
    Take(commands::take::TakeArgs),

    #[command(about = "Show the stored result of an assignment")]
    Result(commands::assignment::ResultArgs),

    #[command(about = "Score an answer file offline, without touching the database")]
    Score(commands::score::ScoreArgs),

    #[command(about = "Mint an API token for a user")]
    Token(commands::token::TokenArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Database-backed store plus the call policy from configuration
pub struct Backend {
    pub database: DatabaseManager,
    pub store: Arc<dyn Store>,
    pub policy: CallPolicy,
}

impl Backend {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let database = DatabaseManager::connect(&config.database)
            .await
            .context("could not connect to the database (is DATABASE_URL set?)")?;
        let store: Arc<dyn Store> = Arc::new(PgStore::new(&database));
        Ok(Self {
            database,
            store,
            policy: CallPolicy::from_config(&config.pipeline),
        })
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = config::config();

    match cli.command {
        Commands::Migrate => commands::db::migrate(config, output_format).await,
        Commands::Seed => commands::db::seed(config, output_format).await,
        Commands::Test { cmd } => commands::test::handle(cmd, config, output_format).await,
        Commands::Assign(args) => commands::assignment::assign(args, config, output_format).await,
        Commands::Assignments(args) => commands::assignment::list(args, config, output_format).await,
        Commands::Stats(args) => commands::assignment::stats(args, config, output_format).await,
        Commands::Take(args) => commands::take::handle(args, config, output_format).await,
        Commands::Result(args) => commands::assignment::result(args, config, output_format).await,
        Commands::Score(args) => commands::score::handle(args, output_format),
        Commands::Token(args) => commands::token::handle(args, config, output_format),
    }
}
