use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use portal_http::PortalClient;
use portal_session::{
    ActivityHub, GuardExit, HistoryNavigator, LogoutInvoker, LogoutReport, LogoutTrigger,
    MemorySessionStore, PortalConfig, RemoteOutcome, SessionContext, SessionGuard,
    TracingNotifier,
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portal-tools", version, about = "Session tooling for the campus portal")]
struct Cli {
    /// Tracing filter, e.g. `info` or `portal_session=debug`
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate a configuration file
    CheckConfig {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Run the logout sequence once against the backend.
    ///
    /// Starts from a fresh cookie store, so this checks connectivity and the
    /// token exchange rather than ending an existing browser session.
    Logout {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Run the inactivity guard; each stdin line is an activity event name
    Watch {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &Path) -> Result<PortalConfig> {
    PortalConfig::from_file(path).with_context(|| format!("loading {}", path.display()))
}

fn build_invoker(
    config: &PortalConfig,
    navigator: Arc<HistoryNavigator>,
) -> Result<LogoutInvoker> {
    let client =
        Arc::new(PortalClient::new(config.api_url.clone()).context("creating http client")?);
    let invoker = LogoutInvoker::new(
        SessionContext::in_memory(),
        client.clone(),
        client,
        Arc::new(TracingNotifier),
        navigator,
    )
    .with_ui_cache(Arc::new(MemorySessionStore::new()))
    .with_login_route(config.login_route.clone())
    .with_notices(config.notices.inactivity.clone(), config.notices.manual.clone());
    Ok(invoker)
}

fn print_report(report: &LogoutReport, navigator: &HistoryNavigator) {
    match &report.remote {
        RemoteOutcome::Acknowledged => {
            println!("Logout ({}) acknowledged by backend", report.trigger)
        }
        RemoteOutcome::Failed(err) => {
            println!("Logout ({}) completed locally; backend: {}", report.trigger, err)
        }
    }
    println!("Cleared entries: {}", report.cleared_entries);
    println!("Now at: {}", navigator.current().unwrap_or_default());
}

async fn watch(mut config: PortalConfig, timeout_ms: Option<u64>) -> Result<()> {
    if let Some(timeout_ms) = timeout_ms {
        config.guard.timeout_ms = timeout_ms;
    }
    config.validate()?;

    let navigator = Arc::new(HistoryNavigator::new("/"));
    let invoker = Arc::new(build_invoker(&config, navigator.clone())?);
    let hub = ActivityHub::new();
    let mut guard = SessionGuard::mount(&config.guard, &hub, invoker)?;
    println!(
        "Watching for activity ({} ms timeout); events: {}",
        config.guard.timeout_ms,
        config
            .guard
            .activity_events
            .iter()
            .map(|kind| kind.event_name())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let exit = loop {
        tokio::select! {
            exit = guard.wait() => break exit?,
            line = lines.next_line() => match line.context("reading stdin")? {
                Some(line) => {
                    let event = line.trim();
                    if !event.is_empty() && hub.dispatch(event) == 0 {
                        tracing::warn!(event, "not a watched activity event");
                    }
                }
                None => {
                    guard.unmount().await;
                    break guard.wait().await?;
                }
            },
        }
    };

    match exit {
        GuardExit::LoggedOut(report) => print_report(&report, &navigator),
        GuardExit::Unmounted => println!("Input closed, guard unmounted"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::CheckConfig { config } => {
            let config = load_config(&config)?;
            println!("api_url: {}", config.api_url);
            println!("login_route: {}", config.login_route);
            println!("timeout: {} ms", config.guard.timeout_ms);
            println!("mailbox_capacity: {}", config.guard.mailbox_capacity);
            println!("activity_events: {:?}", config.guard.activity_events);
        }
        Commands::Logout { config } => {
            let config = load_config(&config)?;
            let navigator = Arc::new(HistoryNavigator::new("/"));
            let invoker = build_invoker(&config, navigator.clone())?;
            let report = invoker.invoke(LogoutTrigger::Manual).await;
            print_report(&report, &navigator);
        }
        Commands::Watch { config, timeout_ms } => {
            let config = load_config(&config)?;
            if timeout_ms == Some(0) {
                bail!("--timeout-ms must be greater than zero");
            }
            watch(config, timeout_ms).await?;
        }
    }
    Ok(())
}
