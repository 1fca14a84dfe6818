use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use fetchgate_broker::Strategy;
use fetchgate_providers::{FetchOptions, Priority};

#[derive(Debug, Parser)]
#[command(name = "fetchgate", version, about = "Fetch web content through ranked, fallback-aware providers")]
pub struct Args {
    /// TOML configuration file.
    #[arg(long, global = true, env = "FETCHGATE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch a URL and print the result as JSON.
    Fetch {
        url: String,
        #[command(flatten)]
        request: RequestArgs,
        /// Print only the retrieved HTML.
        #[arg(long, default_value_t = false)]
        html: bool,
    },
    /// Show the order in which providers would be attempted.
    Plan {
        url: String,
        #[command(flatten)]
        request: RequestArgs,
    },
    /// Probe provider availability and print the health snapshot.
    Probe,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct RequestArgs {
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyChoice>,
    #[arg(long, value_enum)]
    pub priority: Option<PriorityChoice>,
    #[arg(long)]
    pub max_cost: Option<f64>,
    #[arg(long, default_value_t = 30_000)]
    pub timeout_ms: u64,
    #[arg(long)]
    pub user_agent: Option<String>,
    /// Extra request header, `Name: value`. Repeatable.
    #[arg(long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
    #[arg(long)]
    pub wait_for_selector: Option<String>,
    #[arg(long, default_value_t = false)]
    pub wait_for_network: bool,
    #[arg(long, default_value_t = false)]
    pub block_resources: bool,
    #[arg(long, default_value_t = false)]
    pub stealth: bool,
    #[arg(long, default_value_t = 2)]
    pub max_retries: u32,
}

impl RequestArgs {
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: Duration::from_millis(self.timeout_ms),
            user_agent: self.user_agent.clone(),
            headers: self.headers.iter().cloned().collect::<BTreeMap<_, _>>(),
            wait_for_selector: self.wait_for_selector.clone(),
            wait_for_network: self.wait_for_network,
            block_resources: self.block_resources,
            stealth: self.stealth,
            max_retries: self.max_retries,
            priority: self.priority.map(Into::into),
        }
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `Name: value`, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in `{raw}`"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyChoice {
    CostOptimized,
    SpeedOptimized,
    ReliabilityFirst,
    JavascriptFirst,
    Adaptive,
}

impl From<StrategyChoice> for Strategy {
    fn from(value: StrategyChoice) -> Self {
        match value {
            StrategyChoice::CostOptimized => Strategy::CostOptimized,
            StrategyChoice::SpeedOptimized => Strategy::SpeedOptimized,
            StrategyChoice::ReliabilityFirst => Strategy::ReliabilityFirst,
            StrategyChoice::JavascriptFirst => Strategy::JavascriptFirst,
            StrategyChoice::Adaptive => Strategy::Adaptive,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PriorityChoice {
    Speed,
    Cost,
    Reliability,
}

impl From<PriorityChoice> for Priority {
    fn from(value: PriorityChoice) -> Self {
        match value {
            PriorityChoice::Speed => Priority::Speed,
            PriorityChoice::Cost => Priority::Cost,
            PriorityChoice::Reliability => Priority::Reliability,
        }
    }
}
