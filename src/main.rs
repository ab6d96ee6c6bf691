mod azure_client;
mod cli;
mod config;
mod error;

use std::io;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use eyre::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use crate::cli::reflect::ReflectContext;
use crate::cli::reflect::graph::{self, DEFAULT_MAX_MESSAGES, GraphConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Tweet to improve
    #[arg(short, long)]
    input: Option<String>,

    /// Stop once a draft pushes the conversation past this many messages
    #[arg(short, long, default_value_t = DEFAULT_MAX_MESSAGES)]
    max_messages: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Improve a tweet with the generate/reflect loop
    Run {
        /// Tweet to improve
        #[arg(short, long)]
        input: Option<String>,

        /// Stop once a draft pushes the conversation past this many messages
        #[arg(short, long, default_value_t = DEFAULT_MAX_MESSAGES)]
        max_messages: usize,

        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// Print the loop as a Mermaid flowchart and an ASCII sketch
    Graph {
        /// Threshold shown on the conditional edge
        #[arg(short, long, default_value_t = DEFAULT_MAX_MESSAGES)]
        max_messages: usize,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    let verbose = match &cli.command {
        Some(Commands::Run { verbose, .. }) => *verbose,
        _ => cli.verbose,
    };

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Some(Commands::Graph { max_messages }) => {
            println!("{}", graph::draw_mermaid(max_messages));
            println!("{}", graph::draw_ascii(max_messages));
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Run {
            input,
            max_messages,
            ..
        }) => run(input, max_messages).await,
        None => run(cli.input, cli.max_messages).await,
    }
}

async fn run(input: Option<String>, max_messages: usize) -> Result<ExitCode> {
    info!("Starting tweet reflection loop");

    let graph_config = GraphConfig {
        max_messages,
        ..GraphConfig::default()
    };
    let mut context = ReflectContext::new(Box::new(io::stdout()), input, true, graph_config);
    context.run().await
}
