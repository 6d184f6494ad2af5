use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod routes;
mod state;

#[derive(Parser)]
#[command(name = "vapi-todo-server", version, about = "Voice-assistant todo tools with Google Calendar sync")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the tool-calling HTTP API
    Serve {
        /// Address to listen on (overrides `server.bind`)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Authorize Google Calendar access and cache the token
    Authorize {
        /// Print a GOOGLE_TOKEN_B64 line for use in `.env`
        #[arg(long)]
        print_env: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Serve { bind } => commands::serve::run(bind).await,
        Commands::Authorize { print_env } => commands::authorize::run(print_env).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
