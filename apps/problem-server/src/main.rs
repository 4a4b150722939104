use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use errors_demo::ErrorsDemoConfig;
use problemkit::ProblemState;
use problemkit_bootstrap::{AppConfig, CliArgs, module_config_or_default};

/// Problem Server - RFC 9457 problem details demo service
#[derive(Parser)]
#[command(name = "problem-server")]
#[command(about = "Problem Server - RFC 9457 problem details demo service")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration (JSON) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        port: cli.port,
        verbose: cli.verbose,
    };

    // 1) defaults -> 2) YAML (if provided) -> 3) env (APP__*) -> 4) CLI overrides
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    problemkit_bootstrap::init_logging(&config.logging, cli.verbose)?;

    if cli.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
    }
}

fn demo_config(config: &AppConfig) -> Result<ErrorsDemoConfig> {
    module_config_or_default(config, errors_demo::MODULE_NAME)
        .context("invalid errors demo configuration")
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    let demo = demo_config(config)?;
    tracing::debug!(style = ?demo.style, "errors demo config resolved");
    println!("Configuration is valid");
    println!("{}", config.to_json_pretty()?);
    Ok(())
}

async fn run_server(config: AppConfig) -> Result<()> {
    let demo = demo_config(&config)?;
    let state = ProblemState::from_settings(config.problem.clone());
    let timeout = Duration::from_secs(config.server.request_timeout_secs);
    let app = problemkit::apply_problem_stack(errors_demo::router(demo.style), state, timeout);

    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| {
            format!(
                "failed to bind {}:{}",
                config.server.host, config.server.port
            )
        })?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, style = ?demo.style, "Problem Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(problemkit_bootstrap::shutdown_signal())
        .await
        .context("server terminated with an error")?;

    tracing::info!("Problem Server stopped");
    Ok(())
}
