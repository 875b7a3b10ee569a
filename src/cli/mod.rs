pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "jobly")]
#[command(about = "Jobly API - jobs and companies REST backend")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve {
        #[arg(long, help = "Port to bind (defaults to PORT or 3001)")]
        port: Option<u16>,
        #[arg(long, help = "Apply pending migrations before serving")]
        migrate: bool,
    },

    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "Mint a signed bearer token with the configured secret")]
    Token {
        #[arg(help = "Username to embed in the token")]
        username: String,
        #[arg(long, help = "Grant the admin flag")]
        admin: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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
        Commands::Serve { port, migrate } => commands::serve::handle(port, migrate).await,
        Commands::Migrate => commands::serve::migrate().await,
        Commands::Token { username, admin } => commands::token::handle(&username, admin, output_format),
    }
}
