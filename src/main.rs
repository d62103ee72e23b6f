use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod api;
mod app;
mod chat;
mod clipboard;
mod config;
mod handler;
mod input;
mod markdown;
mod prompt_form;
mod provider;
mod transform;
mod tui;
mod ui;

use app::App;
use config::Config;
use provider::Provider;

const TICK_RATE: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "prompt-studio")]
#[command(version, about = "Generate optimized prompts and chat with the prompt assistant")]
struct Cli {
    /// Server base URL (overrides PROMPT_STUDIO_URL and the config file)
    #[arg(short, long)]
    base_url: Option<String>,

    /// Provider to start with
    #[arg(short, long, value_enum)]
    provider: Option<Provider>,

    /// Log file path (defaults to the config directory)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Logs go to a file since the terminal belongs to the TUI
fn init_logging(path: &Path) -> Result<WorkerGuard> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_owned())
        .unwrap_or_else(|| "prompt-studio.log".into());

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let default_level = "prompt_studio=info";
    let _ = tracing_subscriber::fmt()
        // Fallback to the default filter if RUST_LOG is unset or invalid
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(writer)
        .with_ansi(false)
        .try_init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Ignoring unreadable config: {:#}", e);
        Config::new()
    });

    let log_path = match cli.log_file.clone() {
        Some(path) => path,
        None => Config::config_dir()?.join("prompt-studio.log"),
    };
    let _log_guard = init_logging(&log_path)?;

    let env_url = std::env::var(config::BASE_URL_ENV).ok();
    let base_url = config.resolve_base_url(cli.base_url.as_deref(), env_url.as_deref());
    let provider = cli.provider.unwrap_or_else(|| config.provider());

    tracing::info!(%base_url, provider = provider.as_str(), "starting prompt-studio");
    let mut app = App::new(&config, &base_url, provider);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    if let Err(e) = &result {
        tracing::error!(error = %format!("{:#}", e), "exiting with error");
    }
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = tui::EventHandler::new(TICK_RATE);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        app.poll_tasks().await;
        handler::handle_event(app, event)?;
    }

    tracing::info!("shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_flag_is_validated() {
        let cli = Cli::try_parse_from(["prompt-studio", "--provider", "gemma"]).unwrap();
        assert_eq!(cli.provider, Some(Provider::Gemma));

        assert!(Cli::try_parse_from(["prompt-studio", "--provider", "lama"]).is_err());
    }

    #[test]
    fn test_flags_default_to_unset() {
        let cli = Cli::try_parse_from(["prompt-studio"]).unwrap();
        assert!(cli.base_url.is_none());
        assert!(cli.provider.is_none());
        assert!(cli.log_file.is_none());
    }
}
