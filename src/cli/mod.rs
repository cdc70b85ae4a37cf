pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "orgchart")]
#[command(about = "Org chart CLI - inspect staff hierarchies and manage share links")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Print the reporting-line forest of a staff file")]
    Tree(commands::tree::TreeArgs),

    #[command(about = "Print head counts and depth of a staff file")]
    Stats(commands::stats::StatsArgs),

    #[command(about = "Compute chart geometry for a staff file")]
    Layout(commands::layout::LayoutArgs),

    #[command(about = "Mint a JWT signed with the local ORGCHART_JWT_SECRET")]
    Token(commands::token::TokenArgs),

    #[command(about = "Create, inspect and revoke share links on a running server")]
    Share {
        #[command(subcommand)]
        cmd: commands::share::ShareCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
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

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Tree(args) => commands::tree::handle(args, output_format).await,
        Commands::Stats(args) => commands::stats::handle(args, output_format).await,
        Commands::Layout(args) => commands::layout::handle(args, output_format).await,
        Commands::Token(args) => commands::token::handle(args, output_format).await,
        Commands::Share { cmd } => commands::share::handle(cmd, output_format).await,
    }
}
