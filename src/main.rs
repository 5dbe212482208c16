use anyhow::Result;
use clap::{Parser, Subcommand};

use oxbow::cli::{self, OutputFormat, ParamOverrides};

#[derive(Debug, Parser)]
#[command(name = "oxbow")]
#[command(about = "Terminal client for the oxbow intelligent LLM router")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Interactive playground — stream queries and watch the routing live
    Chat {
        #[command(flatten)]
        params: ParamArgs,
    },
    /// Submit a single query and print the answer
    Ask {
        /// The query text
        #[arg(trailing_var_arg = true, required = true, allow_hyphen_values = true)]
        query: Vec<String>,
        /// Print routing steps as they arrive
        #[arg(long)]
        show_steps: bool,
        #[command(flatten)]
        params: ParamArgs,
    },
    /// Show the selectable-model catalog
    Models {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show the valid constraint ranges
    Ranges {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show the wallet balance
    Wallet,
    /// List recent queries from the local history log
    History {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Only include the last N days
        #[arg(long)]
        days: Option<u32>,
        /// Maximum number of entries to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Show aggregated query statistics
    Stats {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Only include the last N days
        #[arg(long)]
        days: Option<u32>,
    },
    /// Check backend reachability, session, and local files
    Health,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Routing parameters shared by `chat` and `ask`.
#[derive(Debug, clap::Args)]
struct ParamArgs {
    /// Pick this model explicitly instead of automatic selection
    #[arg(long)]
    model: Option<String>,
    /// Cost priority weight (0-10)
    #[arg(long)]
    cost_priority: Option<f64>,
    /// Accuracy priority weight (0-10)
    #[arg(long)]
    accuracy_priority: Option<f64>,
    /// Latency priority weight (0-10)
    #[arg(long)]
    latency_priority: Option<f64>,
    /// Cost ceiling
    #[arg(long)]
    cost_max: Option<f64>,
    /// Performance floor
    #[arg(long)]
    perf_min: Option<f64>,
    /// Latency ceiling
    #[arg(long)]
    lat_max: Option<f64>,
}

impl From<ParamArgs> for ParamOverrides {
    fn from(args: ParamArgs) -> Self {
        Self {
            model: args.model,
            cost_priority: args.cost_priority,
            accuracy_priority: args.accuracy_priority,
            latency_priority: args.latency_priority,
            cost_max: args.cost_max,
            perf_min: args.perf_min,
            lat_max: args.lat_max,
        }
    }
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective merged configuration
    Show,
    /// Write a default config file to ~/.oxbow/config.toml
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Set a config value, e.g. `oxbow config set backend.base_url https://…`
    Set { key: String, value: String },
    /// Reset the config file to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Chat { params } => cli::run_chat(&params.into()),
        Commands::Ask {
            query,
            show_steps,
            params,
        } => {
            let query = query.join(" ");
            cli::run_ask(&query, &params.into(), show_steps)
        }
        Commands::Models { format } => {
            cli::run_models(OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Ranges { format } => {
            cli::run_ranges(OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Wallet => cli::run_wallet(),
        Commands::History {
            format,
            days,
            limit,
        } => cli::run_history(OutputFormat::from_str_opt(Some(&format)), days, limit),
        Commands::Stats { format, days } => {
            cli::run_stats(OutputFormat::from_str_opt(Some(&format)), days)
        }
        Commands::Health => cli::run_health(),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
