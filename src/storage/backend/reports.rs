//! 报表读取
//!
//! 按日期范围把数据库行转换为 `analytics::facts` 中的输入行；
//! 全量汇总（all_time）直接用聚合查询完成。

use std::collections::HashMap;

use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{
    ColumnTrait, EntityTrait, ExprTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait,
};
use sea_orm::JoinType;
use tracing::trace;

use super::SeaOrmStorage;
use crate::analytics::{
    AcquisitionFact, AttributionResolver, DayWindow, DepositFact, LeadFact, SpendFact,
};
use crate::errors::Result;
use crate::storage::models::{BotTotals, SpendTotals};
use migration::entities::{ad_account, ad_campaign_stats_daily, acquisition, campaign, deposit};

#[derive(Debug, FromQueryResult)]
struct BotTotalsRow {
    users: i64,
    users_unique: Option<i64>,
    leads: Option<i64>,
    income: Option<f64>,
}

#[derive(Debug, FromQueryResult)]
struct SpendTotalsRow {
    impressions: Option<i64>,
    clicks: Option<i64>,
    spend: Option<f64>,
}

/// 推广 id -> (标签, 是否推荐链接)
struct CampaignIndex {
    by_id: HashMap<i64, (String, bool)>,
}

impl CampaignIndex {
    fn label(&self, campaign_id: Option<i64>) -> Option<String> {
        campaign_id
            .and_then(|id| self.by_id.get(&id))
            .map(|(label, _)| label.clone())
    }

    fn is_referral(&self, campaign_id: Option<i64>) -> bool {
        campaign_id
            .and_then(|id| self.by_id.get(&id))
            .is_some_and(|(_, referral)| *referral)
    }

    fn referral_ids(&self) -> Vec<i64> {
        self.by_id
            .iter()
            .filter(|(_, (_, referral))| *referral)
            .map(|(id, _)| *id)
            .collect()
    }
}

impl SeaOrmStorage {
    async fn campaign_index(&self, bot_id: i64) -> Result<CampaignIndex> {
        let models = campaign::Entity::find()
            .filter(campaign::Column::BotId.eq(bot_id))
            .all(&self.db)
            .await?;

        Ok(CampaignIndex {
            by_id: models
                .into_iter()
                .map(|m| (m.id, (m.label, m.referral_subject_id != 0)))
                .collect(),
        })
    }

    /// 归因到该 bot 推广标签的广告账户：外部账户 id -> 标签
    pub async fn attributed_accounts(&self, bot_id: i64) -> Result<HashMap<i64, String>> {
        let labels: Vec<String> = self
            .list_campaigns(bot_id)
            .await?
            .into_iter()
            .map(|c| c.label)
            .collect();
        let resolver = AttributionResolver::new(&labels);
        if resolver.is_empty() {
            return Ok(HashMap::new());
        }

        let accounts = ad_account::Entity::find().all(&self.db).await?;
        let attributed = resolver.resolve_accounts(
            accounts
                .iter()
                .map(|a| (a.external_account_id, a.display_name.as_str())),
        );

        trace!(
            "bot {}: {} of {} ad accounts attributed",
            bot_id,
            attributed.len(),
            accounts.len()
        );
        Ok(attributed)
    }

    // ============ 窗口内的输入行 ============

    /// 窗口内的用户获取
    pub async fn acquisition_facts(
        &self,
        bot_id: i64,
        window: &DayWindow,
    ) -> Result<Vec<AcquisitionFact>> {
        let index = self.campaign_index(bot_id).await?;
        let (from, to) = window.utc_bounds();

        let models = acquisition::Entity::find()
            .filter(acquisition::Column::BotId.eq(bot_id))
            .filter(acquisition::Column::CreatedAt.gte(from))
            .filter(acquisition::Column::CreatedAt.lt(to))
            .order_by_asc(acquisition::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(models
            .into_iter()
            .map(|m| AcquisitionFact {
                acquired_on: m.created_at.date_naive(),
                seen: m.seen,
                label: index.label(m.campaign_id),
                referral: index.is_referral(m.campaign_id),
            })
            .collect())
    }

    /// 窗口内首次充值的用户，以及他们在窗口内的充值
    pub async fn lead_facts(&self, bot_id: i64, window: &DayWindow) -> Result<Vec<LeadFact>> {
        let index = self.campaign_index(bot_id).await?;
        let (from, to) = window.utc_bounds();

        let leads = acquisition::Entity::find()
            .filter(acquisition::Column::BotId.eq(bot_id))
            .filter(acquisition::Column::Deposited.eq(true))
            .filter(acquisition::Column::DepositedAt.gte(from))
            .filter(acquisition::Column::DepositedAt.lt(to))
            .all(&self.db)
            .await?;
        if leads.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = leads.iter().map(|m| m.id).collect();
        let deposits = deposit::Entity::find()
            .filter(deposit::Column::AcquisitionId.is_in(ids))
            .filter(deposit::Column::OccurredAt.gte(from))
            .filter(deposit::Column::OccurredAt.lt(to))
            .all(&self.db)
            .await?;

        let mut by_owner: HashMap<i64, Vec<DepositFact>> = HashMap::new();
        for d in deposits {
            by_owner.entry(d.acquisition_id).or_default().push(DepositFact {
                occurred_on: d.occurred_at.date_naive(),
                value: d.amount * d.unit_price,
            });
        }

        Ok(leads
            .into_iter()
            .filter_map(|m| {
                let deposited_on = m.deposited_at?.date_naive();
                Some(LeadFact {
                    deposited_on,
                    label: index.label(m.campaign_id),
                    deposits: by_owner.remove(&m.id).unwrap_or_default(),
                })
            })
            .collect())
    }

    /// 窗口内该 bot 的全部充值
    pub async fn deposit_facts(&self, bot_id: i64, window: &DayWindow) -> Result<Vec<DepositFact>> {
        let (from, to) = window.utc_bounds();

        let models = deposit::Entity::find()
            .join(JoinType::InnerJoin, deposit::Relation::Acquisition.def())
            .filter(acquisition::Column::BotId.eq(bot_id))
            .filter(deposit::Column::OccurredAt.gte(from))
            .filter(deposit::Column::OccurredAt.lt(to))
            .all(&self.db)
            .await?;

        Ok(models
            .into_iter()
            .map(|d| DepositFact {
                occurred_on: d.occurred_at.date_naive(),
                value: d.amount * d.unit_price,
            })
            .collect())
    }

    /// 窗口内已归因账户的广告日统计
    pub async fn spend_facts(&self, bot_id: i64, window: &DayWindow) -> Result<Vec<SpendFact>> {
        let attributed = self.attributed_accounts(bot_id).await?;
        if attributed.is_empty() {
            return Ok(Vec::new());
        }

        let account_ids: Vec<i64> = attributed.keys().copied().collect();
        let models = ad_campaign_stats_daily::Entity::find()
            .filter(ad_campaign_stats_daily::Column::ExternalAccountId.is_in(account_ids))
            .filter(ad_campaign_stats_daily::Column::StatDate.gt(window.start))
            .filter(ad_campaign_stats_daily::Column::StatDate.lte(window.end))
            .all(&self.db)
            .await?;

        Ok(models
            .into_iter()
            .filter_map(|m| {
                let label = attributed.get(&m.external_account_id)?.clone();
                Some(SpendFact {
                    stat_date: m.stat_date,
                    label,
                    impressions: m.impressions,
                    clicks: m.clicks,
                    spend: m.spend,
                })
            })
            .collect())
    }

    // ============ 全量汇总 ============

    /// bot 的全量用户 / 充值汇总
    pub async fn bot_totals(&self, bot_id: i64) -> Result<BotTotals> {
        let row = acquisition::Entity::find()
            .select_only()
            .column_as(acquisition::Column::Id.count(), "users")
            .column_as(
                Expr::case(acquisition::Column::Seen.lt(1), 1).finally(0).sum(),
                "users_unique",
            )
            .column_as(
                Expr::case(acquisition::Column::Deposited.eq(true), 1)
                    .finally(0)
                    .sum(),
                "leads",
            )
            .column_as(acquisition::Column::DepositsSum.sum(), "income")
            .filter(acquisition::Column::BotId.eq(bot_id))
            .into_model::<BotTotalsRow>()
            .one(&self.db)
            .await?;

        let referral_ids = self.campaign_index(bot_id).await?.referral_ids();
        let users_referral = if referral_ids.is_empty() {
            0
        } else {
            acquisition::Entity::find()
                .filter(
                    Condition::all()
                        .add(acquisition::Column::BotId.eq(bot_id))
                        .add(acquisition::Column::CampaignId.is_in(referral_ids)),
                )
                .count(&self.db)
                .await? as i64
        };

        Ok(match row {
            Some(row) => BotTotals {
                users: row.users,
                users_unique: row.users_unique.unwrap_or(0),
                users_referral,
                leads: row.leads.unwrap_or(0),
                income: row.income.unwrap_or(0.0),
            },
            None => BotTotals::default(),
        })
    }

    /// 已归因账户的全量广告汇总
    pub async fn spend_totals(&self, bot_id: i64) -> Result<SpendTotals> {
        let attributed = self.attributed_accounts(bot_id).await?;
        if attributed.is_empty() {
            return Ok(SpendTotals::default());
        }

        let account_ids: Vec<i64> = attributed.keys().copied().collect();
        let row = ad_campaign_stats_daily::Entity::find()
            .select_only()
            .column_as(ad_campaign_stats_daily::Column::Impressions.sum(), "impressions")
            .column_as(ad_campaign_stats_daily::Column::Clicks.sum(), "clicks")
            .column_as(ad_campaign_stats_daily::Column::Spend.sum(), "spend")
            .filter(ad_campaign_stats_daily::Column::ExternalAccountId.is_in(account_ids))
            .into_model::<SpendTotalsRow>()
            .one(&self.db)
            .await?;

        Ok(row
            .map(|row| SpendTotals {
                impressions: row.impressions.unwrap_or(0),
                clicks: row.clicks.unwrap_or(0),
                spend: row.spend.unwrap_or(0.0),
            })
            .unwrap_or_default())
    }
}
