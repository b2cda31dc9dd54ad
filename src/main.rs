use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use medeasy_voice::{
    create_router, AppState, Config, EnvCredentials, SessionResult, VoiceChat, WsConnector,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "medeasy-voice", version, about = "Voice assistant session client")]
struct Cli {
    /// Config file (extension optional)
    #[arg(long, global = true, default_value = "config/medeasy-voice")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the local HTTP control API
    Serve,
    /// Send a free-form message and print the reply
    Ask {
        message: String,
        /// Server action to attach
        #[arg(long)]
        action: Option<String>,
        /// JSON payload to attach
        #[arg(long)]
        data: Option<String>,
    },
    /// Ask for today's medication routine
    Routine,
    /// Search medicines by name
    Search { query: String },
    /// Delete expired voice replies
    Sweep,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("MedEasy Voice v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let chat = Arc::new(VoiceChat::build(
        cfg.session_config(),
        cfg.artifact_config()?,
        Arc::new(WsConnector::new()),
        Arc::new(EnvCredentials::new(cfg.credentials.token_env.clone())),
    )?);

    match cli.command {
        Command::Serve => serve(&cfg, chat).await,
        Command::Ask {
            message,
            action,
            data,
        } => {
            let data = data
                .map(|raw| serde_json::from_str(&raw))
                .transpose()
                .context("--data must be valid JSON")?;
            let result = chat.send_message(&message, action.as_deref(), data).await;
            finish(&chat, result)
        }
        Command::Routine => {
            let result = chat.routine_today().await;
            finish(&chat, result)
        }
        Command::Search { query } => {
            let result = chat.search_medicines(&query).await;
            finish(&chat, result)
        }
        Command::Sweep => {
            let report = chat.sweep_artifacts().await?;
            info!(
                "Scanned {} artifacts: removed {}, retained {}, failed {}",
                report.scanned, report.removed, report.retained, report.failed
            );
            Ok(())
        }
    }
}

async fn serve(cfg: &Config, chat: Arc<VoiceChat>) -> Result<()> {
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let router = create_router(AppState::new(Arc::clone(&chat)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    chat.disconnect();
    Ok(())
}

fn finish(chat: &VoiceChat, result: medeasy_voice::Result<SessionResult>) -> Result<()> {
    let result = result?;
    chat.route_action(&result);
    println!("{}", serde_json::to_string_pretty(&result)?);
    chat.disconnect();
    Ok(())
}
