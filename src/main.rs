//! Ruster Console - operator CLI for a generated REST API server
//!
//! Architecture:
//! - Lifecycle monitor - status polling and control calls over the control surface
//! - Monitor actor (Tokio) - periodic schedule for `watch`
//! - Workbench - endpoint selection and test requests

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};

use ruster_console::config::ApiConfiguration;
use ruster_console::constants::{APP_NAME, APP_VERSION};
use ruster_console::monitor::{ControlOutcome, FetchOutcome, LifecycleMonitor, MonitorActor};
use ruster_console::network::{self, ParameterResolver, PromptResolver};
use ruster_console::{
    sample_payload, to_curl, ControlAction, HttpBackend, MonitorSnapshot, Settings, Workbench,
};

#[derive(Parser)]
#[command(name = "ruster-console")]
#[command(version, about = "Endpoint testing and lifecycle monitoring for a generated REST API", long_about = None)]
struct Cli {
    /// Control surface URL, overrides the settings file
    #[arg(long, global = true)]
    control_url: Option<String>,

    /// Settings file (default: ~/.ruster/settings.yaml)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the server status once
    Status,

    /// Poll continuously and print every change until Ctrl+C
    Watch,

    /// Start the API server
    Start,

    /// Stop the API server
    Stop,

    /// Restart the API server
    Restart,

    /// Print the current entity configuration
    Config,

    /// List the endpoints derived for an entity
    Endpoints {
        /// Table name of the entity
        table: String,
    },

    /// Print a sample JSON body for an entity
    Payload {
        /// Table name of the entity
        table: String,
    },

    /// Send a test request to one of an entity's endpoints
    Send {
        /// Table name of the entity
        table: String,

        /// Endpoint index as listed by `endpoints`
        index: usize,

        /// Request body (default: sample payload for write endpoints)
        #[arg(short, long)]
        body: Option<String>,

        /// Path parameter value, repeatable
        #[arg(short, long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,

        /// Print the request as cURL instead of sending it
        #[arg(long)]
        curl: bool,

        /// Never prompt for missing path parameters
        #[arg(long)]
        no_prompt: bool,
    },

    /// Ask the server to test its database connection
    DbCheck,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize logging to file
    let file_appender = tracing_appender::rolling::never(".", "ruster-console.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!(version = APP_VERSION, "{} starting", APP_NAME);

    let mut settings = match &cli.settings {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    if let Some(url) = cli.control_url {
        settings.control_url = url;
    }

    let backend = Arc::new(HttpBackend::new(
        settings.control_url.clone(),
        settings.auth.clone(),
        settings.request_timeout(),
    ));
    let monitor = Arc::new(LifecycleMonitor::new(backend, settings.timings()));

    match cli.command {
        Commands::Status => {
            monitor.poll().await;
            print_snapshot(&monitor.snapshot());
        }
        Commands::Watch => watch(monitor).await?,
        Commands::Start => control(&monitor, ControlAction::Start).await?,
        Commands::Stop => control(&monitor, ControlAction::Stop).await?,
        Commands::Restart => control(&monitor, ControlAction::Restart).await?,
        Commands::Config => {
            let config = load_configuration(&monitor).await?;
            println!("{}", serde_json::to_string_pretty(config.as_ref())?);
        }
        Commands::Endpoints { table } => {
            let mut bench = Workbench::new();
            bench.load_configuration(load_configuration(&monitor).await?);
            if !bench.select_entity(&table) {
                bail!("No entity configured for table '{}'", table);
            }
            for (index, endpoint) in bench.endpoints.iter().enumerate() {
                println!(
                    "{:>3}  {:<6} {:<32} {}",
                    index,
                    endpoint.method.as_str(),
                    endpoint.path,
                    endpoint.description
                );
            }
        }
        Commands::Payload { table } => {
            let config = load_configuration(&monitor).await?;
            let entity = config
                .entity(&table)
                .ok_or_else(|| anyhow!("No entity configured for table '{}'", table))?;
            println!("{}", sample_payload(Some(entity)));
        }
        Commands::Send {
            table,
            index,
            body,
            params,
            curl,
            no_prompt,
        } => {
            let params = parse_params(&params)?;
            send(&monitor, &table, index, body, params, curl, no_prompt).await?;
        }
        Commands::DbCheck => {
            let message = monitor.check_database().await?;
            println!("{}", message.trim());
        }
    }

    Ok(())
}

fn print_snapshot(snapshot: &MonitorSnapshot) {
    println!("Status: {}", snapshot.describe());
    if !snapshot.is_running() {
        return;
    }
    if let Some(metrics) = &snapshot.metrics {
        println!(
            "Uptime: {}s  Requests: {}  Errors: {}",
            metrics.uptime_seconds, metrics.request_count, metrics.error_count
        );
    }
    if let Some(entry) = snapshot.logs.last() {
        println!("Last log: [{}] {}", entry.level, entry.message);
    }
}

async fn control(
    monitor: &LifecycleMonitor<HttpBackend>,
    action: ControlAction,
) -> anyhow::Result<()> {
    match monitor.control_and_confirm(action).await {
        ControlOutcome::Coalesced => println!("{} already in progress", action),
        ControlOutcome::Settled { result, .. } => {
            let reply = result?;
            if !reply.trim().is_empty() {
                println!("{}", reply.trim());
            }
            print_snapshot(&monitor.snapshot());
        }
    }
    Ok(())
}

async fn load_configuration(
    monitor: &LifecycleMonitor<HttpBackend>,
) -> anyhow::Result<Arc<ApiConfiguration>> {
    match monitor.fetch_configuration().await {
        FetchOutcome::Loaded(config) => Ok(config),
        FetchOutcome::Failed(e) => Err(e).context("Could not load the entity configuration"),
        FetchOutcome::Skipped | FetchOutcome::Superseded => monitor
            .snapshot()
            .configuration
            .configuration()
            .cloned()
            .ok_or_else(|| anyhow!("Entity configuration is not available")),
    }
}

fn parse_params(raw: &[String]) -> anyhow::Result<HashMap<String, String>> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(name, value)| (name.trim().to_string(), value.to_string()))
                .ok_or_else(|| anyhow!("Expected NAME=VALUE, got '{}'", pair))
        })
        .collect()
}

async fn send(
    monitor: &LifecycleMonitor<HttpBackend>,
    table: &str,
    index: usize,
    body: Option<String>,
    params: HashMap<String, String>,
    curl: bool,
    no_prompt: bool,
) -> anyhow::Result<()> {
    let mut bench = Workbench::new();
    bench.load_configuration(load_configuration(monitor).await?);
    if !bench.select_entity(table) {
        bail!("No entity configured for table '{}'", table);
    }
    if !bench.select_endpoint(index) {
        bail!("Entity '{}' has no endpoint {}", table, index);
    }
    if let Some(body) = body {
        bench.edit_body(body);
    }

    let resolver = |name: &str| {
        params
            .resolve(name)
            .or_else(|| (!no_prompt).then(|| PromptResolver.resolve(name)).flatten())
    };

    if curl {
        let endpoint = bench
            .current_endpoint()
            .ok_or_else(|| anyhow!("No endpoint selected"))?;
        let base_url = bench.base_url().unwrap_or_default();
        let body = (!bench.body.trim().is_empty()).then_some(bench.body.as_str());
        let request = network::prepare_request(endpoint, &base_url, body, &resolver)?;
        println!("{}", to_curl(&request));
        return Ok(());
    }

    let status = monitor.poll_status().await;
    let Some(pending) = bench.begin_send(status) else {
        bail!("Server is {}, requests can only be sent while it is running", status);
    };

    let text = network::send_for_display(
        monitor.backend().as_ref(),
        &pending.endpoint,
        &pending.base_url,
        pending.body.as_deref(),
        &resolver,
    )
    .await;
    bench.finish_send(pending.id, text);
    println!("{}", bench.response);
    Ok(())
}

async fn watch(monitor: Arc<LifecycleMonitor<HttpBackend>>) -> anyhow::Result<()> {
    let (handle, task) = MonitorActor::spawn(monitor);
    let mut rx = handle.subscribe();
    let mut last_line = String::new();
    let mut last_requests = None;

    loop {
        {
            let snapshot = rx.borrow_and_update().clone();
            let line = snapshot.describe();
            let requests = snapshot.metrics.as_ref().map(|m| m.request_count);
            if snapshot.has_polled() && (line != last_line || requests != last_requests) {
                print_snapshot(&snapshot);
                last_line = line;
                last_requests = requests;
            }
        }

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                handle.shutdown();
                break;
            }
        }
    }

    task.await?;
    Ok(())
}
