//! Campaign, token and ad account management

use anyhow::{Context, Result};
use colored::Colorize;

use crate::cli::{AccountCommands, CampaignCommands, TokenCommands};
use crate::config::get_config;
use crate::runtime::lifetime;

pub async fn run_campaign(action: CampaignCommands) -> Result<()> {
    let storage = lifetime::startup::prepare_startup().await?.storage;

    match action {
        CampaignCommands::Add {
            bot,
            label,
            referral,
            hash,
        } => {
            let campaign = storage
                .create_campaign(bot, &label, referral, hash.as_deref())
                .await
                .context("Failed to create campaign")?;
            println!(
                "{} {} {}",
                "Campaign:".green(),
                campaign.hash.blue(),
                campaign.label
            );
        }
        CampaignCommands::List { bot } => {
            let campaigns = storage.list_campaigns(bot).await?;
            println!("{}", serde_json::to_string_pretty(&campaigns)?);
        }
        CampaignCommands::Rename { bot, hash, label } => {
            let campaign = storage.update_campaign_label(bot, &hash, &label).await?;
            println!(
                "{} {} -> {}",
                "Campaign renamed:".green(),
                campaign.hash.blue(),
                campaign.label
            );
        }
    }
    Ok(())
}

pub async fn run_token(action: TokenCommands) -> Result<()> {
    let storage = lifetime::startup::prepare_startup().await?.storage;

    match action {
        TokenCommands::Add { token, days } => {
            let days = days.unwrap_or(get_config().worker.default_days_to_fetch);
            let token = storage.add_ad_token(&token, days).await?;
            println!(
                "{} id={} days_to_fetch={}",
                "Token added:".green(),
                token.id,
                token.days_to_fetch
            );
        }
    }
    Ok(())
}

pub async fn run_account(action: AccountCommands) -> Result<()> {
    let storage = lifetime::startup::prepare_startup().await?.storage;

    match action {
        AccountCommands::List => {
            let accounts = storage.list_ad_accounts().await?;
            println!("{}", serde_json::to_string_pretty(&accounts)?);
        }
        AccountCommands::Enable { account_id } => {
            storage.set_ad_account_active(account_id, true).await?;
            println!("{} {}", "Account enabled:".green(), account_id);
        }
        AccountCommands::Disable { account_id } => {
            storage.set_ad_account_active(account_id, false).await?;
            println!("{} {}", "Account disabled:".yellow(), account_id);
        }
    }
    Ok(())
}
