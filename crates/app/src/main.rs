use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nowplaying_status_core::{AppConfig, MonitorEvent};
use nowplaying_status_engine::{PollingChangeDetector, StatusLifecycleController};
use nowplaying_status_github::GitHubStatusClient;
use nowplaying_status_sources::build_track_source;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "nowplaying-status",
    about = "Now Playing -> change detector -> GitHub profile status"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Run,
    Doctor,
    Status,
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cmd = cli.command.unwrap_or(Commands::Run);
    let cfg_path = cli.config.unwrap_or_else(default_config_path);

    match cmd {
        Commands::Config {
            action: ConfigAction::Init,
        } => {
            init_config(&cfg_path)?;
            println!("Initialized config at {}", cfg_path.display());
            Ok(())
        }
        Commands::Doctor => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            doctor(&cfg).await
        }
        Commands::Status => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            status(&cfg).await
        }
        Commands::Run => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            run(cfg, cfg_path).await
        }
    }
}

async fn run(cfg: AppConfig, cfg_path: PathBuf) -> Result<()> {
    let publisher = GitHubStatusClient::new(cfg.github.token.clone(), &cfg.github.api_url)?;
    let controller = StatusLifecycleController::new(Arc::new(publisher));
    let mut events = controller.subscribe();

    controller.set_source(build_detector(&cfg)?);
    controller.listen()?;
    info!(source = %cfg.source, "nowplaying-status started");

    let (reload_tx, mut reload_rx) = mpsc::channel::<()>(4);
    spawn_reload_watchers(cfg_path.clone(), reload_tx);

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(event) => log_event(&event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "monitor events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = reload_rx.recv() => {
                if msg.is_some() {
                    match load_or_default(&cfg_path).and_then(|cfg| build_detector(&cfg)) {
                        Ok(detector) => {
                            controller.set_source(detector);
                            info!("configuration reloaded");
                        }
                        Err(err) => {
                            let cause = format!("{err:#}");
                            error!(error = %cause, "failed to reload config; keeping current source");
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received ctrl-c; shutting down");
                break;
            }
        }
    }

    controller.stop().await?;
    while let Ok(event) = events.try_recv() {
        log_event(&event);
    }

    Ok(())
}

fn build_detector(cfg: &AppConfig) -> Result<PollingChangeDetector> {
    let source = build_track_source(cfg)?;
    Ok(PollingChangeDetector::new(
        source,
        Duration::from_millis(cfg.update_frequency_ms()),
    ))
}

fn log_event(event: &MonitorEvent) {
    match event {
        MonitorEvent::StatusUpdated(status) => {
            info!(event = event.name(), message = ?status.message, "status updated");
        }
        MonitorEvent::Error(err) => {
            warn!(event = event.name(), error = %err, "monitor error");
        }
        _ => info!(event = event.name(), "monitor event"),
    }
}

async fn doctor(cfg: &AppConfig) -> Result<()> {
    println!("== nowplaying-status doctor ==");
    println!("Source: {}", cfg.source);
    println!("Update frequency: {} ms", cfg.update_frequency_ms());

    match build_track_source(cfg) {
        Ok(source) => match source.fetch_current_track().await {
            Ok(Some(track)) => println!("Now playing: {} - {}", track.artist, track.title),
            Ok(None) => println!("Source reachable; nothing playing"),
            Err(err) => println!("Source error: {err:#}"),
        },
        Err(err) => println!("Source misconfigured: {err:#}"),
    }

    println!(
        "GitHub token: {}",
        if cfg.github.token.trim().is_empty() {
            "missing"
        } else {
            "configured"
        }
    );

    #[cfg(target_os = "macos")]
    {
        println!(
            "macOS automation: verify System Settings > Privacy & Security > Automation allows Terminal (or your shell) to control iTunes/Spotify"
        );
    }

    Ok(())
}

async fn status(cfg: &AppConfig) -> Result<()> {
    let source = build_track_source(cfg)?;
    println!("source: {}", source.name());

    match source.fetch_current_track().await? {
        Some(track) => println!("track: {} - {}", track.artist, track.title),
        None => println!("track: <none>"),
    }

    Ok(())
}

fn default_config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("nowplaying-status").join("config.toml")
}

fn init_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let cfg = AppConfig::default();
    let toml = toml::to_string_pretty(&cfg)?;
    std::fs::write(path, toml)
        .with_context(|| format!("failed to write config file {}", path.display()))?;
    Ok(())
}

fn load_or_default(path: &Path) -> Result<AppConfig> {
    let mut cfg = if !path.exists() {
        AppConfig::default()
    } else {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))?
    };
    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

fn init_logging(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init();
}

const RELOAD_POLL: Duration = Duration::from_secs(5);

fn spawn_reload_watchers(path: PathBuf, tx: mpsc::Sender<()>) {
    let tx_poll = tx.clone();
    tokio::spawn(async move {
        let mut known_mtime = file_mtime(&path);
        loop {
            tokio::time::sleep(RELOAD_POLL).await;
            let current = file_mtime(&path);
            if current.is_some() && current != known_mtime {
                known_mtime = current;
                let _ = tx_poll.send(()).await;
            }
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let tx_hup = tx.clone();
        tokio::spawn(async move {
            if let Ok(mut sig) = signal(SignalKind::hangup()) {
                while sig.recv().await.is_some() {
                    let _ = tx_hup.send(()).await;
                }
            }
        });
    }
}

fn file_mtime(path: &Path) -> Option<std::time::SystemTime> {
    std::fs::metadata(path).ok()?.modified().ok()
}

fn apply_env_overrides(cfg: &mut AppConfig, var: impl Fn(&str) -> Option<String>) {
    let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("NOWPLAYING_STATUS_SOURCE") {
        match v.parse() {
            Ok(kind) => cfg.source = kind,
            Err(err) => warn!(error = %err, "ignoring NOWPLAYING_STATUS_SOURCE"),
        }
    }
    if let Some(v) = non_empty("NOWPLAYING_STATUS_GITHUB_TOKEN") {
        cfg.github.token = v;
    }
    if let Some(v) = non_empty("NOWPLAYING_STATUS_LASTFM_API_KEY") {
        cfg.lastfm.api_key = v;
    }
    if let Some(v) = non_empty("NOWPLAYING_STATUS_LASTFM_USER") {
        cfg.lastfm.user = v;
    }
    if let Some(v) = non_empty("NOWPLAYING_STATUS_LOG_LEVEL") {
        cfg.log_level = v;
    }
    if let Some(v) = non_empty("NOWPLAYING_STATUS_UPDATE_FREQUENCY_MS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            cfg.update_frequency_ms = parsed;
        }
    }
}
