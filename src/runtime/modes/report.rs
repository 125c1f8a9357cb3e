//! Report mode: prints JSON to stdout

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::analytics::ReportWindow;
use crate::cli::ReportCommands;
use crate::config::get_config;
use crate::runtime::lifetime;
use crate::services::ReportService;

fn parse_day(value: Option<&str>, name: &str) -> Result<Option<NaiveDate>> {
    value
        .map(|s| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .with_context(|| format!("Invalid --{} '{}', expected YYYY-MM-DD", name, s))
        })
        .transpose()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn run_report(action: ReportCommands) -> Result<()> {
    let config = get_config();
    let today = Utc::now().date_naive();
    let range_days = config.report.default_range_days;

    let ctx = lifetime::startup::prepare_startup().await?;
    let service = ReportService::new(ctx.storage);

    match action {
        ReportCommands::Metrics { bot, start, end } => {
            let window = ReportWindow::resolve(
                parse_day(start.as_deref(), "start")?,
                parse_day(end.as_deref(), "end")?,
                today,
                range_days,
            );
            print_json(&service.bot_metrics(bot, &window).await)
        }
        ReportCommands::Conversions {
            bot,
            group_by,
            start,
            end,
        } => {
            let window = ReportWindow::resolve(
                parse_day(start.as_deref(), "start")?,
                parse_day(end.as_deref(), "end")?,
                today,
                range_days,
            );
            let rows = match group_by.granularity() {
                Some(granularity) => {
                    service
                        .conversions_by_period(bot, granularity, &window.current, today)
                        .await
                }
                None => service.conversions_by_campaign(bot, &window.current).await,
            };
            print_json(&rows)
        }
    }
}
