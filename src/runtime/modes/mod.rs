//! Mode routing
//!
//! One entry point per command group:
//! - `worker`: ad statistics ingestion
//! - `report`: metric and conversion reports
//! - `manage`: campaigns, tokens and ad accounts
//! - `config`: configuration file helpers

pub mod config;
pub mod manage;
pub mod report;
pub mod worker;

pub use worker::run_worker;

use anyhow::Result;

use crate::cli::Commands;

/// 执行命令
pub async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Worker { once, dry_run } => run_worker(once, dry_run).await,
        Commands::Report { action } => report::run_report(action).await,
        Commands::Campaign { action } => manage::run_campaign(action).await,
        Commands::Token { action } => manage::run_token(action).await,
        Commands::Account { action } => manage::run_account(action).await,
        Commands::Config { action } => config::run_config(action),
    }
}
