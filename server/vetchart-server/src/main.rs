use std::{env, net::SocketAddr};

use clap::Parser;
use colored::Colorize;
use tracing::{info, Level};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use error_common::{ChartError, Result};
use vetchart_server::{create_app, VetChartServer};

/// VetChart HTTP Server
#[derive(Parser, Debug)]
#[command(name = "vetchart-server")]
#[command(about = "Veterinary clinic records, SOAP notes and dictation API server")]
struct Args {
    /// Server bind address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Server port
    #[arg(short, long, env = "PORT", default_value = "8000")]
    port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_tracing(args.verbose)?;

    info!("🐄 {}", "Starting VetChart HTTP Server".bright_cyan());
    info!("📋 Version: {}", env!("CARGO_PKG_VERSION").bright_white());
    info!("🌐 Bind address: {}", format!("{}:{}", args.host, args.port).bright_yellow());

    let server = VetChartServer::from_env().await?;
    info!(
        "🗂️  Storage: {} | generation: {} | transcription: {}",
        server.storage_mode().bright_white(),
        enabled(server.notes.is_some()),
        enabled(server.voice.is_some()),
    );
    server.initial_load().await;

    let app = create_app(server);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|e| ChartError::ConfigError(format!("Invalid bind address: {}", e)))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ChartError::NetworkError(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("🚀 {}", format!("VetChart server running on http://{}", addr).bright_green());
    info!("📋 {}", format!("Health check available at: http://{}/health", addr).bright_blue());
    info!("📋 {}", format!("API available at: http://{}/api", addr).bright_blue());

    axum::serve(listener, app)
        .await
        .map_err(|e| ChartError::ServerError(format!("HTTP server error: {}", e)))
}

fn enabled(flag: bool) -> colored::ColoredString {
    if flag {
        "enabled".bright_green()
    } else {
        "disabled".bright_red()
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    // Check if we're in development or production
    let is_development =
        env::var("VETCHART_ENV").unwrap_or_else(|_| "development".to_string()) == "development";

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "vetchart_server={level},database_layer={level},voice_recognition_service={level},\
             note_generation_service={level},auth_oauth={level},tower_http=info,reqwest=info"
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    let initialized = if is_development {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(env::var("NO_COLOR").is_err())
                    .with_level(true),
            )
            .try_init()
    } else {
        // Structured JSON logging for production
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .json(),
            )
            .try_init()
    };

    initialized.map_err(|e| ChartError::InternalError(format!("Tracing init failed: {}", e)))?;
    if is_development {
        print_startup_banner();
    }
    Ok(())
}

fn print_startup_banner() {
    println!("{}", "╔══════════════════════════════════════════════════════════════╗".bright_cyan());
    println!("{}", "║                        🐄 VETCHART                           ║".bright_cyan());
    println!("{}", "║          Veterinary Records, SOAP Notes and Dictation        ║".bright_cyan());
    println!("{}", "╚══════════════════════════════════════════════════════════════╝".bright_cyan());
    println!();
}
