//! Command-line interface definitions using clap
//!
//! This module defines the CLI structure for deeplinker using clap's derive macros.

use clap::{Parser, Subcommand, ValueEnum};

use crate::analytics::Granularity;

/// Deeplinker - campaign deep-link attribution and ad statistics ingestion
#[derive(Parser)]
#[command(name = "deeplinker")]
#[command(version)]
#[command(about = "Campaign deep-link attribution and ad statistics ingestion", long_about = None)]
pub struct Cli {
    /// Configuration file path (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the ad statistics ingestion worker
    Worker {
        /// Run a single pass and exit (overrides worker.single_run)
        #[arg(long)]
        once: bool,

        /// Fetch from the provider without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Print reports as JSON
    Report {
        #[command(subcommand)]
        action: ReportCommands,
    },

    /// Manage campaigns
    Campaign {
        #[command(subcommand)]
        action: CampaignCommands,
    },

    /// Manage ad provider tokens
    Token {
        #[command(subcommand)]
        action: TokenCommands,
    },

    /// Manage ad accounts
    Account {
        #[command(subcommand)]
        action: AccountCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Report grouping for the conversions report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GroupBy {
    Day,
    Week,
    Month,
    Campaign,
}

impl GroupBy {
    /// 按周期分组时的粒度；按推广分组时为 None
    pub fn granularity(self) -> Option<Granularity> {
        match self {
            GroupBy::Day => Some(Granularity::Day),
            GroupBy::Week => Some(Granularity::Week),
            GroupBy::Month => Some(Granularity::Month),
            GroupBy::Campaign => None,
        }
    }
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Metric rows (all-time, current, previous, diff) for a bot
    Metrics {
        #[arg(long)]
        bot: i64,

        /// First day of the range (YYYY-MM-DD, inclusive)
        #[arg(long)]
        start: Option<String>,

        /// Last day of the range (YYYY-MM-DD, inclusive)
        #[arg(long)]
        end: Option<String>,
    },

    /// Conversion rows grouped by period or campaign
    Conversions {
        #[arg(long)]
        bot: i64,

        #[arg(long, value_enum, default_value = "day")]
        group_by: GroupBy,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        end: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CampaignCommands {
    /// Create a campaign (or return the existing one)
    Add {
        #[arg(long)]
        bot: i64,

        #[arg(long, default_value = "")]
        label: String,

        /// Referral subject id; forces the label "referral"
        #[arg(long, default_value_t = 0)]
        referral: i64,

        /// Use this hash instead of generating one
        #[arg(long)]
        hash: Option<String>,
    },

    /// List campaigns of a bot
    List {
        #[arg(long)]
        bot: i64,
    },

    /// Change a campaign label
    Rename {
        #[arg(long)]
        bot: i64,

        hash: String,

        label: String,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Register a provider access token
    Add {
        token: String,

        /// Lookback window in days (default: worker.default_days_to_fetch)
        #[arg(long)]
        days: Option<i32>,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// List known ad accounts
    List,

    /// Re-enable an account disabled by the no-data circuit breaker
    Enable { account_id: i64 },

    /// Stop fetching an account
    Disable { account_id: i64 },
}

/// Configuration management commands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}
