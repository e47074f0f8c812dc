use anyhow::Context;
use clap::{Parser, Subcommand};
use owo_colors::{OwoColorize, Stream};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use wc_core::types::HarnessResult;
use wc_core::{
    AlarmRegistry, ChallengeCatalog, Clock, LoggingActuator, PresenceMonitor, Scheduler,
    SystemClock, WakeConfig,
};
use wc_events::bus::EventBus;
use wc_harness::Harness;
use wc_serve::AppState;

#[derive(Parser)]
#[command(name = "wakecode", version, about = "An alarm you switch off by solving a coding challenge")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP API and the alarm scheduler.
    Serve,
    /// Run a solution file against a challenge and print the result.
    Run {
        #[arg(long)]
        challenge: String,
        file: PathBuf,
    },
    /// List the challenges in the configured directory.
    Challenges,
    /// Print the OpenAPI document.
    Openapi,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config();
    let _log_guard = init_tracing(config.as_ref().ok().and_then(|c| c.log_file.as_deref()))?;

    match cli.command {
        Command::Serve => {
            serve(config?).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Run { challenge, file } => run_solution(&config?, challenge, &file).await,
        Command::Challenges => {
            let config = config?;
            let catalog = load_catalog(&config.challenges_dir)?;
            for name in catalog.names() {
                let cases = catalog.by_name(&name).map_or(0, |c| c.test_cases.len());
                println!("{name}\t{cases} tests");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Openapi => {
            println!("{}", wc_serve::openapi::generate_spec());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Logs to stderr, and to `log_file` as well when one is configured. The
/// returned guard flushes the file writer on drop.
fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (file_layer, guard) = match log_file {
        Some(path) => {
            let name = path
                .file_name()
                .with_context(|| format!("log file {} has no file name", path.display()))?;
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(name.to_string_lossy())
                .build(dir)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    if let Some(path) = log_file {
        tracing::info!(path = %path.display(), "file logging enabled");
    }
    Ok(guard)
}

fn load_config() -> anyhow::Result<WakeConfig> {
    WakeConfig::load().context("failed to load configuration")
}

fn load_catalog(dir: &Path) -> anyhow::Result<Arc<ChallengeCatalog>> {
    let catalog = ChallengeCatalog::load_dir(dir)
        .with_context(|| format!("failed to load challenges from {}", dir.display()))?;
    tracing::info!(dir = %dir.display(), count = catalog.len(), "challenges loaded");
    Ok(Arc::new(catalog))
}

async fn serve(config: WakeConfig) -> anyhow::Result<()> {
    let catalog = load_catalog(&config.challenges_dir)?;
    if catalog.is_empty() {
        tracing::warn!("challenge catalog is empty; alarms cannot fire until challenges are added");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let registry = Arc::new(AlarmRegistry::new());
    let presence = Arc::new(PresenceMonitor::new(clock.clone()));
    let event_bus = EventBus::new(config.event_capacity);
    let scheduler = Arc::new(Scheduler::new(
        registry.clone(),
        catalog.clone(),
        presence.clone(),
        Arc::new(LoggingActuator::new()),
        clock,
        event_bus.clone(),
        config.scheduler.idle_threshold(),
    ));
    let handle = scheduler.spawn(config.scheduler.tick_interval());

    let state = AppState {
        registry,
        catalog: catalog.clone(),
        scheduler,
        presence,
        harness: Harness::new(catalog, config.harness.clone()),
        event_bus,
    };
    let served = wc_serve::serve(state, config.socket_addr(), shutdown_signal()).await;

    let outcome = handle.shutdown(config.scheduler.shutdown_grace()).await;
    tracing::info!(?outcome, "scheduler stopped");
    served.context("http server failed")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

async fn run_solution(
    config: &WakeConfig,
    challenge: String,
    file: &Path,
) -> anyhow::Result<ExitCode> {
    let catalog = load_catalog(&config.challenges_dir)?;
    let code = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let harness = Harness::new(catalog, config.harness.clone());
    let result = tokio::task::spawn_blocking(move || harness.run(&challenge, &code))
        .await
        .context("harness task failed")?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    print_summary(&result);
    Ok(if result.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_summary(result: &HarnessResult) {
    if let HarnessResult::Failed { error, .. } = result {
        eprintln!(
            "{} {error}",
            "ERROR".if_supports_color(Stream::Stderr, |text| text.red())
        );
        return;
    }
    let tests = result.test_results();
    for test in tests {
        if test.passed {
            eprintln!(
                "{} {}",
                "PASS".if_supports_color(Stream::Stderr, |text| text.green()),
                test.description
            );
        } else {
            eprintln!(
                "{} {}",
                "FAIL".if_supports_color(Stream::Stderr, |text| text.red()),
                test.description
            );
            if let Some(error) = &test.error {
                eprintln!("     {error}");
            }
        }
    }
    let passed = tests.iter().filter(|test| test.passed).count();
    eprintln!(
        "{}",
        format!("{passed}/{} passed", tests.len()).if_supports_color(Stream::Stderr, |text| text.bold())
    );
}
