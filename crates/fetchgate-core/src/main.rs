use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use fetchgate_broker::{BrokerError, FetchgateConfig, ProviderManager, Strategy};
use serde_json::{json, Value};

mod cli;
use cli::{Args, Command, RequestArgs};

const LOG_ENV: &str = "FETCHGATE_LOG";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var(LOG_ENV).unwrap_or_else(|_| "fetchgate=info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "fetchgate starting");

    match run(args).await {
        Ok(Output::Json(value)) => {
            println!("{}", render(&value));
            ExitCode::SUCCESS
        }
        Ok(Output::Raw(text)) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            println!("{}", render(&error_json(&error)));
            ExitCode::FAILURE
        }
    }
}

enum Output {
    Json(Value),
    Raw(String),
}

async fn run(args: Args) -> Result<Output> {
    let mut config = FetchgateConfig::discover(args.config.as_deref())?;
    if let Command::Fetch { request, .. } | Command::Plan { request, .. } = &args.command {
        apply_overrides(&mut config, request);
    }
    let manager = config.build_manager()?;
    tracing::debug!(providers = ?manager.list_providers(), "providers registered");

    let output = execute(&manager, args.command).await;
    manager.shutdown().await;
    output
}

fn apply_overrides(config: &mut FetchgateConfig, request: &RequestArgs) {
    if let Some(strategy) = request.strategy {
        config.manager.strategy = strategy.into();
    }
    if let Some(max_cost) = request.max_cost {
        config.manager.max_cost_per_request = max_cost;
    }
}

async fn execute(manager: &ProviderManager, command: Command) -> Result<Output> {
    match command {
        Command::Fetch { url, request, html } => {
            let options = request.fetch_options();
            let outcome = manager.fetch_detailed(&url, &options).await?;
            if html {
                Ok(Output::Raw(outcome.result.html))
            } else {
                Ok(Output::Json(serde_json::to_value(&outcome)?))
            }
        }
        Command::Plan { url, request } => {
            let options = request.fetch_options();
            let strategy = options
                .priority
                .map(Strategy::from)
                .unwrap_or(manager.config().strategy);
            let order = manager.plan(&url, &options).await?;
            Ok(Output::Json(json!({
                "url": url,
                "strategy": strategy,
                "needs_javascript": manager.requires_javascript(&url, &options),
                "order": order,
            })))
        }
        Command::Probe => {
            let available = manager.availability().await;
            Ok(Output::Json(json!({
                "available": available,
                "health": manager.health_snapshot_all(),
                "metrics": manager.metrics_snapshot_all(),
            })))
        }
    }
}

fn error_json(error: &anyhow::Error) -> Value {
    let attempts = error
        .downcast_ref::<BrokerError>()
        .map(BrokerError::attempts)
        .unwrap_or_default();
    json!({
        "error": format!("{error:#}"),
        "attempts": attempts,
    })
}

fn render(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
