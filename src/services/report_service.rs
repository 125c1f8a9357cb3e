//! Report service layer
//!
//! Composes storage range reads with the pure aggregators in `analytics`.
//! Each metric family is read independently: a failed read is logged and
//! that family is zero-filled, the rest of the report is still returned.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, error};

use crate::analytics::{
    AttributionKey, ConversionRow, DayWindow, Granularity, MetricRow, ReportWindow, bucketize,
    count_metric, merge_by_label, merge_by_period, rate_metric, sum_metric, tally_acquisitions,
    tally_leads, tally_spend,
};
use crate::errors::Result;
use crate::storage::SeaOrmStorage;

/// bot 指标报表
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BotMetrics {
    pub users: MetricRow<i64>,
    /// 首次获取占比（%）
    pub users_unique: MetricRow<f64>,
    /// 推荐链接获取占比（%）
    pub users_referrals: MetricRow<f64>,
    pub leads: MetricRow<i64>,
    pub income: MetricRow<f64>,
    pub expense: MetricRow<f64>,
    pub clicks: MetricRow<i64>,
    pub impressions: MetricRow<i64>,
    pub profit: MetricRow<f64>,
    pub date_range: ReportWindow,
}

/// 读取失败时记录日志并返回默认值
fn or_zero<T: Default>(family: &str, bot_id: i64, result: Result<T>) -> T {
    result.unwrap_or_else(|e| {
        error!("Report read '{}' failed for bot {}: {}", family, bot_id, e);
        T::default()
    })
}

pub struct ReportService {
    storage: Arc<SeaOrmStorage>,
}

impl ReportService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 当前 / 上一周期的 bot 指标
    pub async fn bot_metrics(&self, bot_id: i64, window: &ReportWindow) -> BotMetrics {
        let span = window.span();
        let storage = &self.storage;

        let totals = or_zero("bot_totals", bot_id, storage.bot_totals(bot_id).await);
        let spend_totals = or_zero("spend_totals", bot_id, storage.spend_totals(bot_id).await);
        let acquisitions = or_zero(
            "acquisitions",
            bot_id,
            storage.acquisition_facts(bot_id, &span).await,
        );
        let leads = or_zero("leads", bot_id, storage.lead_facts(bot_id, &span).await);
        let deposits = or_zero("deposits", bot_id, storage.deposit_facts(bot_id, &span).await);
        let spend = or_zero("spend", bot_id, storage.spend_facts(bot_id, &span).await);

        debug!(
            "bot {} metrics: {} acquisitions, {} leads, {} deposits, {} spend rows",
            bot_id,
            acquisitions.len(),
            leads.len(),
            deposits.len(),
            spend.len()
        );

        let users = count_metric(totals.users, acquisitions.iter().map(|a| a.acquired_on), window);
        let users_unique = rate_metric(
            (totals.users_unique, totals.users),
            acquisitions.iter().map(|a| (a.acquired_on, a.is_unique())),
            window,
        );
        let users_referrals = rate_metric(
            (totals.users_referral, totals.users),
            acquisitions.iter().map(|a| (a.acquired_on, a.referral)),
            window,
        );
        let leads = count_metric(totals.leads, leads.iter().map(|l| l.deposited_on), window);
        let income = sum_metric(
            totals.income,
            deposits.iter().map(|d| (d.occurred_on, d.value)),
            window,
        );
        let expense = sum_metric(
            spend_totals.spend,
            spend.iter().map(|s| (s.stat_date, s.spend)),
            window,
        );
        let clicks = sum_metric(
            spend_totals.clicks,
            spend.iter().map(|s| (s.stat_date, s.clicks)),
            window,
        );
        let impressions = sum_metric(
            spend_totals.impressions,
            spend.iter().map(|s| (s.stat_date, s.impressions)),
            window,
        );
        let profit = income.minus(&expense);

        BotMetrics {
            users,
            users_unique,
            users_referrals,
            leads,
            income,
            expense,
            clicks,
            impressions,
            profit,
            date_range: *window,
        }
    }

    /// 按周期的转化报表（新到旧），起始日晚于 today 的周期不输出
    pub async fn conversions_by_period(
        &self,
        bot_id: i64,
        granularity: Granularity,
        window: &DayWindow,
        today: NaiveDate,
    ) -> Vec<ConversionRow> {
        let buckets: Vec<_> = bucketize(granularity, window.start, window.end)
            .into_iter()
            .filter(|b| b.start <= today)
            .collect();
        let storage = &self.storage;

        let acquisitions = or_zero(
            "acquisitions",
            bot_id,
            storage.acquisition_facts(bot_id, window).await,
        );
        let leads = or_zero("leads", bot_id, storage.lead_facts(bot_id, window).await);
        let spend = or_zero("spend", bot_id, storage.spend_facts(bot_id, window).await);

        let by_users = tally_acquisitions(&acquisitions, window, |f| {
            Some(granularity.period_start(f.acquired_on))
        });
        let by_leads = tally_leads(&leads, window, |f| {
            Some(granularity.period_start(f.deposited_on))
        });
        let by_spend = tally_spend(&spend, window, |f| {
            Some(granularity.period_start(f.stat_date))
        });

        merge_by_period(&buckets, &by_users, &by_leads, &by_spend)
    }

    /// 按推广标签的转化报表
    pub async fn conversions_by_campaign(
        &self,
        bot_id: i64,
        window: &DayWindow,
    ) -> Vec<ConversionRow> {
        let storage = &self.storage;

        let labels: Vec<String> = or_zero("campaigns", bot_id, storage.list_campaigns(bot_id).await)
            .into_iter()
            .map(|c| c.label)
            .collect();
        let acquisitions = or_zero(
            "acquisitions",
            bot_id,
            storage.acquisition_facts(bot_id, window).await,
        );
        let leads = or_zero("leads", bot_id, storage.lead_facts(bot_id, window).await);
        let spend = or_zero("spend", bot_id, storage.spend_facts(bot_id, window).await);

        let by_users = tally_acquisitions(&acquisitions, window, |f| {
            f.label.as_deref().map(AttributionKey::new)
        });
        let by_leads = tally_leads(&leads, window, |f| {
            f.label.as_deref().map(AttributionKey::new)
        });
        let by_spend = tally_spend(&spend, window, |f| Some(AttributionKey::new(&f.label)));

        merge_by_label(&labels, &by_users, &by_leads, &by_spend)
    }
}
