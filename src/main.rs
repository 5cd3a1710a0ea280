//! Sibyl CLI binary entry point.

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sibyl::completion::{ChatCompletion, OpenAiCompatClient};
use sibyl::config::SibylConfig;
use sibyl::dispatch::LiveKitDispatcher;
use sibyl::server::{app, AppState};
use sibyl::session::SessionHost;
use sibyl::types::Turn;

/// Worker/agent type name sessions are dispatched under.
const AGENT_NAME: &str = "AgentVoice";

#[derive(Parser)]
#[command(name = "sibyl", about = "Voice session relay host", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the session host.
    Serve,
    /// Send one prompt to a hosted session's stream endpoint.
    Chat(ChatArgs),
}

#[derive(Args)]
struct ChatArgs {
    /// Stream endpoint base, e.g.
    /// `http://localhost:5233/stream/agents/AgentVoice/<agent-id>/<run-id>`.
    #[arg(long)]
    url: String,
    prompt: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve => serve().await,
        Commands::Chat(args) => chat(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn serve() -> Result<(), Box<dyn std::error::Error>> {
    let config = SibylConfig::from_env();
    config.validate();

    let api_key = config.openai_api_key.clone().unwrap_or_default();
    let completion = match &config.openai_base_url {
        Some(base_url) => OpenAiCompatClient::new_with_base_url(api_key, base_url.clone()),
        None => OpenAiCompatClient::new(api_key),
    };

    let dispatcher = LiveKitDispatcher::new(
        config.livekit_api_url.clone().unwrap_or_default(),
        config.livekit_api_key.clone().unwrap_or_default(),
        config.livekit_api_secret.clone().unwrap_or_default(),
    );

    let state = AppState {
        host: Arc::new(SessionHost::new()),
        completion: Arc::new(completion),
        dispatcher: Arc::new(dispatcher),
        agent_name: AGENT_NAME.to_string(),
        auto_end: config.session_timeout,
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!(address = %config.bind_address, "session host listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

async fn chat(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let client = OpenAiCompatClient::new_with_base_url("cli-livekit".to_string(), args.url);
    let reply = client.complete(&[Turn::user(args.prompt)]).await?;
    println!("{reply}");
    Ok(())
}
