//! 广告统计采集相关的存储操作
//!
//! 令牌 / 账户状态维护，以及按 (账户, 广告活动, 日期) 的幂等 upsert。

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::{debug, info};

use super::SeaOrmStorage;
use super::converters::{model_to_ad_account, model_to_ad_token, stat_to_active_model};
use super::retry;
use crate::errors::{DeeplinkerError, Result};
use crate::ingest::CampaignStatStore;
use crate::storage::models::{AccountFetchResult, AdAccount, AdToken, CampaignStatDay};
use migration::entities::{ad_account, ad_campaign_stats_daily, ad_token};

#[async_trait]
impl CampaignStatStore for SeaOrmStorage {
    async fn unfetched_tokens(&self, fetched_before: DateTime<Utc>) -> Result<Vec<AdToken>> {
        let models = ad_token::Entity::find()
            .filter(ad_token::Column::Active.eq(true))
            .filter(ad_token::Column::FetchedAt.lt(fetched_before))
            .order_by_asc(ad_token::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(model_to_ad_token).collect())
    }

    async fn ensure_account(
        &self,
        token_id: i64,
        external_account_id: i64,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let existing = ad_account::Entity::find()
            .filter(ad_account::Column::ExternalAccountId.eq(external_account_id))
            .one(&self.db)
            .await?;

        if let Some(model) = existing {
            if model.display_name != display_name {
                debug!(
                    "Ad account {} renamed: '{}' -> '{}'",
                    external_account_id, model.display_name, display_name
                );
                let mut active: ad_account::ActiveModel = model.into();
                active.display_name = Set(display_name.to_string());
                active.update(&self.db).await?;
            }
            return Ok(false);
        }

        let model = ad_account::ActiveModel {
            token_id: Set(token_id),
            external_account_id: Set(external_account_id),
            display_name: Set(display_name.to_string()),
            active: Set(true),
            no_data_streak: Set(0),
            fetch_duration_secs: Set(0),
            created_at: Set(now),
            fetched_at: Set(DateTime::<Utc>::UNIX_EPOCH),
            ..Default::default()
        };
        ad_account::Entity::insert(model).exec(&self.db).await?;

        info!(
            "Ad account created: {} ({}) under token {}",
            external_account_id, display_name, token_id
        );
        Ok(true)
    }

    async fn mark_token_fetched(&self, token_id: i64, at: DateTime<Utc>) -> Result<()> {
        let db = &self.db;
        retry::with_retry("mark_token_fetched", self.retry_config, || async move {
            ad_token::Entity::update_many()
                .col_expr(ad_token::Column::FetchedAt, Expr::value(at))
                .filter(ad_token::Column::Id.eq(token_id))
                .exec(db)
                .await
        })
        .await?;
        Ok(())
    }

    async fn unfetched_accounts(
        &self,
        token_id: i64,
        fetched_before: DateTime<Utc>,
    ) -> Result<Vec<AdAccount>> {
        let models = ad_account::Entity::find()
            .filter(ad_account::Column::TokenId.eq(token_id))
            .filter(ad_account::Column::Active.eq(true))
            .filter(ad_account::Column::FetchedAt.lt(fetched_before))
            .order_by_asc(ad_account::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(model_to_ad_account).collect())
    }

    async fn upsert_campaign_stat(&self, stat: &CampaignStatDay) -> Result<()> {
        use ad_campaign_stats_daily::Column;

        let db = &self.db;
        let model = stat_to_active_model(stat, Utc::now());

        retry::with_retry("upsert_campaign_stat", self.retry_config, || {
            let model = model.clone();
            async move {
                ad_campaign_stats_daily::Entity::insert(model)
                    .on_conflict(
                        OnConflict::columns([
                            Column::ExternalAccountId,
                            Column::CampaignId,
                            Column::StatDate,
                        ])
                        .update_columns([
                            Column::CampaignName,
                            Column::Status,
                            Column::EffectiveStatus,
                            Column::Impressions,
                            Column::Clicks,
                            Column::Spend,
                            Column::UpdatedAt,
                        ])
                        .to_owned(),
                    )
                    .exec(db)
                    .await
            }
        })
        .await
        .map_err(|e| {
            DeeplinkerError::database_operation(format!(
                "Upsert campaign stat (account {}, campaign {}, {}) failed: {}",
                stat.external_account_id, stat.campaign_id, stat.stat_date, e
            ))
        })?;

        Ok(())
    }

    async fn record_account_result(
        &self,
        external_account_id: i64,
        result: &AccountFetchResult,
    ) -> Result<()> {
        let streak = i32::try_from(result.no_data_streak).unwrap_or(i32::MAX);
        let db = &self.db;

        retry::with_retry("record_account_result", self.retry_config, || async move {
            let mut update = ad_account::Entity::update_many()
                .col_expr(ad_account::Column::FetchedAt, Expr::value(result.finished_at))
                .col_expr(ad_account::Column::NoDataStreak, Expr::value(streak))
                .col_expr(
                    ad_account::Column::FetchDurationSecs,
                    Expr::value(result.duration_secs),
                );
            if result.disabled {
                update = update.col_expr(ad_account::Column::Active, Expr::value(false));
            }
            update
                .filter(ad_account::Column::ExternalAccountId.eq(external_account_id))
                .exec(db)
                .await
        })
        .await?;

        Ok(())
    }
}

// ============ 令牌与账户管理 ============

impl SeaOrmStorage {
    /// 添加访问令牌，立即可被采集
    pub async fn add_ad_token(&self, token: &str, days_to_fetch: i32) -> Result<AdToken> {
        let token = token.trim();
        if token.is_empty() {
            return Err(DeeplinkerError::validation("token must not be empty"));
        }
        if days_to_fetch < 1 {
            return Err(DeeplinkerError::validation(format!(
                "days_to_fetch must be >= 1, got {}",
                days_to_fetch
            )));
        }

        let model = ad_token::ActiveModel {
            token: Set(token.to_string()),
            active: Set(true),
            days_to_fetch: Set(days_to_fetch),
            created_at: Set(Utc::now()),
            fetched_at: Set(DateTime::<Utc>::UNIX_EPOCH),
            ..Default::default()
        };
        let model = model.insert(&self.db).await?;
        Ok(model_to_ad_token(model))
    }

    pub async fn list_ad_accounts(&self) -> Result<Vec<AdAccount>> {
        let models = ad_account::Entity::find()
            .order_by_asc(ad_account::Column::ExternalAccountId)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(model_to_ad_account).collect())
    }

    pub async fn get_ad_account(&self, external_account_id: i64) -> Result<Option<AdAccount>> {
        let model = ad_account::Entity::find()
            .filter(ad_account::Column::ExternalAccountId.eq(external_account_id))
            .one(&self.db)
            .await?;
        Ok(model.map(model_to_ad_account))
    }

    /// 手动启用 / 停用账户；启用时清零无数据计数
    pub async fn set_ad_account_active(&self, external_account_id: i64, active: bool) -> Result<()> {
        let mut update = ad_account::Entity::update_many()
            .col_expr(ad_account::Column::Active, Expr::value(active));
        if active {
            update = update.col_expr(ad_account::Column::NoDataStreak, Expr::value(0));
        }
        let res = update
            .filter(ad_account::Column::ExternalAccountId.eq(external_account_id))
            .exec(&self.db)
            .await?;

        if res.rows_affected == 0 {
            return Err(DeeplinkerError::not_found(format!(
                "Ad account {} not found",
                external_account_id
            )));
        }
        Ok(())
    }

    /// 某个账户在日期范围内（含两端）的统计行
    pub async fn campaign_stats_for_account(
        &self,
        external_account_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CampaignStatDay>> {
        let models = ad_campaign_stats_daily::Entity::find()
            .filter(ad_campaign_stats_daily::Column::ExternalAccountId.eq(external_account_id))
            .filter(ad_campaign_stats_daily::Column::StatDate.gte(from))
            .filter(ad_campaign_stats_daily::Column::StatDate.lte(to))
            .order_by_desc(ad_campaign_stats_daily::Column::StatDate)
            .order_by_asc(ad_campaign_stats_daily::Column::CampaignId)
            .all(&self.db)
            .await?;

        Ok(models
            .into_iter()
            .map(|m| CampaignStatDay {
                external_account_id: m.external_account_id,
                campaign_id: m.campaign_id,
                campaign_name: m.campaign_name,
                status: m.status,
                effective_status: m.effective_status,
                impressions: m.impressions,
                clicks: m.clicks,
                spend: m.spend,
                stat_date: m.stat_date,
            })
            .collect())
    }
}
