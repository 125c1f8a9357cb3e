//! 推广活动、用户获取与充值的写入

use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DbErr, EntityTrait, ExprTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use tracing::{debug, info};

use super::SeaOrmStorage;
use super::converters::model_to_campaign;
use crate::errors::{DeeplinkerError, Result};
use crate::storage::models::{Campaign, NewAcquisition, NewDeposit};
use crate::utils::{generate_campaign_hash, is_valid_campaign_hash};
use migration::entities::{acquisition, campaign, deposit};

/// 推荐链接的固定标签
pub const REFERRAL_LABEL: &str = "referral";

const HASH_GENERATION_ATTEMPTS: usize = 5;

/// do_nothing 冲突时没有插入任何行
fn is_not_inserted(err: &DbErr) -> bool {
    matches!(err, DbErr::RecordNotInserted)
}

impl SeaOrmStorage {
    // ============ 推广活动 ============

    /// 创建推广活动
    ///
    /// - 指定的 hash 已属于该 bot 时直接返回已有活动
    /// - 推荐链接的标签固定为 `referral`，同一 (bot, 推荐人) 只有一条
    pub async fn create_campaign(
        &self,
        bot_id: i64,
        label: &str,
        referral_subject_id: i64,
        requested_hash: Option<&str>,
    ) -> Result<Campaign> {
        let label = if referral_subject_id != 0 {
            REFERRAL_LABEL
        } else {
            label.trim()
        };
        if label.is_empty() {
            return Err(DeeplinkerError::validation("campaign label must not be empty"));
        }

        if let Some(hash) = requested_hash {
            if !is_valid_campaign_hash(hash) {
                return Err(DeeplinkerError::validation(format!(
                    "invalid campaign hash '{}'",
                    hash
                )));
            }
            if let Some(existing) = self.find_campaign_by_hash(hash).await? {
                if existing.bot_id == bot_id {
                    return Ok(existing);
                }
                return Err(DeeplinkerError::validation(format!(
                    "campaign hash '{}' is already used by another bot",
                    hash
                )));
            }
        }

        if referral_subject_id != 0 {
            let existing = campaign::Entity::find()
                .filter(campaign::Column::BotId.eq(bot_id))
                .filter(campaign::Column::ReferralSubjectId.eq(referral_subject_id))
                .one(&self.db)
                .await?;
            if let Some(model) = existing {
                return Ok(model_to_campaign(model));
            }
        }

        let hash = match requested_hash {
            Some(hash) => hash.to_string(),
            None => self.unused_campaign_hash().await?,
        };

        let now = Utc::now();
        let model = campaign::ActiveModel {
            bot_id: Set(bot_id),
            label: Set(label.to_string()),
            referral_subject_id: Set(referral_subject_id),
            hash: Set(hash),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let model = model.insert(&self.db).await?;

        info!(
            "Campaign created: bot={} label='{}' hash={}",
            model.bot_id, model.label, model.hash
        );
        Ok(model_to_campaign(model))
    }

    async fn unused_campaign_hash(&self) -> Result<String> {
        for _ in 0..HASH_GENERATION_ATTEMPTS {
            let hash = generate_campaign_hash();
            if self.find_campaign_by_hash(&hash).await?.is_none() {
                return Ok(hash);
            }
            debug!("Campaign hash collision: {}", hash);
        }
        Err(DeeplinkerError::database_operation(
            "failed to generate an unused campaign hash",
        ))
    }

    pub async fn find_campaign_by_hash(&self, hash: &str) -> Result<Option<Campaign>> {
        let model = campaign::Entity::find()
            .filter(campaign::Column::Hash.eq(hash))
            .one(&self.db)
            .await?;
        Ok(model.map(model_to_campaign))
    }

    /// bot 的全部推广活动，按创建顺序
    pub async fn list_campaigns(&self, bot_id: i64) -> Result<Vec<Campaign>> {
        let models = campaign::Entity::find()
            .filter(campaign::Column::BotId.eq(bot_id))
            .order_by_asc(campaign::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(model_to_campaign).collect())
    }

    pub async fn update_campaign_label(
        &self,
        bot_id: i64,
        hash: &str,
        label: &str,
    ) -> Result<Campaign> {
        let label = label.trim();
        if label.is_empty() {
            return Err(DeeplinkerError::validation("campaign label must not be empty"));
        }

        let model = campaign::Entity::find()
            .filter(campaign::Column::BotId.eq(bot_id))
            .filter(campaign::Column::Hash.eq(hash))
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                DeeplinkerError::not_found(format!("campaign '{}' not found for bot {}", hash, bot_id))
            })?;

        if model.referral_subject_id != 0 {
            return Err(DeeplinkerError::validation(
                "referral campaigns keep their fixed label",
            ));
        }

        let mut active: campaign::ActiveModel = model.into();
        active.label = Set(label.to_string());
        active.updated_at = Set(Utc::now());
        let model = active.update(&self.db).await?;
        Ok(model_to_campaign(model))
    }

    // ============ 用户获取与充值 ============

    /// 记录一次用户获取；同一 (bot, subject) 只记录第一次。返回是否插入
    pub async fn record_acquisition(&self, new: &NewAcquisition) -> Result<bool> {
        let model = acquisition::ActiveModel {
            bot_id: Set(new.bot_id),
            subject_id: Set(new.subject_id),
            campaign_id: Set(new.campaign_id),
            seen: Set(new.seen),
            deposited: Set(false),
            deposited_at: Set(None),
            deposits_total: Set(0),
            deposits_sum: Set(0.0),
            created_at: Set(new.created_at),
            ..Default::default()
        };

        let result = acquisition::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([acquisition::Column::BotId, acquisition::Column::SubjectId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&self.db)
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_not_inserted(&e) => Ok(false),
            Err(e) => Err(DeeplinkerError::database_operation(format!(
                "Failed to record acquisition (bot {}, subject {}): {}",
                new.bot_id, new.subject_id, e
            ))),
        }
    }

    /// 记录一笔充值
    ///
    /// 同一外部交易号只记录一次；首次充值时标记用户为已转化。返回是否插入
    pub async fn record_deposit(&self, new: &NewDeposit) -> Result<bool> {
        if !new.amount.is_finite() || !new.unit_price.is_finite() {
            return Err(DeeplinkerError::validation("deposit amount must be finite"));
        }

        let owner = acquisition::Entity::find()
            .filter(acquisition::Column::BotId.eq(new.bot_id))
            .filter(acquisition::Column::SubjectId.eq(new.subject_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                DeeplinkerError::not_found(format!(
                    "acquisition (bot {}, subject {}) not found",
                    new.bot_id, new.subject_id
                ))
            })?;

        let txn = self.db.begin().await.map_err(|e| {
            DeeplinkerError::database_operation(format!("Failed to begin transaction: {}", e))
        })?;

        let model = deposit::ActiveModel {
            acquisition_id: Set(owner.id),
            external_tx_id: Set(new.external_tx_id.clone()),
            amount: Set(new.amount),
            unit_price: Set(new.unit_price),
            occurred_at: Set(new.occurred_at),
            ..Default::default()
        };
        let inserted = deposit::Entity::insert(model)
            .on_conflict(
                OnConflict::column(deposit::Column::ExternalTxId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&txn)
            .await;

        match inserted {
            Ok(_) => {}
            Err(e) if is_not_inserted(&e) => {
                debug!("Deposit {} already recorded", new.external_tx_id);
                txn.rollback().await?;
                return Ok(false);
            }
            Err(e) => {
                return Err(DeeplinkerError::database_operation(format!(
                    "Failed to record deposit {}: {}",
                    new.external_tx_id, e
                )));
            }
        }

        acquisition::Entity::update_many()
            .col_expr(
                acquisition::Column::DepositsTotal,
                Expr::col(acquisition::Column::DepositsTotal).add(1),
            )
            .col_expr(
                acquisition::Column::DepositsSum,
                Expr::col(acquisition::Column::DepositsSum).add(new.amount * new.unit_price),
            )
            .filter(acquisition::Column::Id.eq(owner.id))
            .exec(&txn)
            .await?;

        acquisition::Entity::update_many()
            .col_expr(acquisition::Column::Deposited, Expr::value(true))
            .col_expr(acquisition::Column::DepositedAt, Expr::value(Some(new.occurred_at)))
            .filter(acquisition::Column::Id.eq(owner.id))
            .filter(acquisition::Column::Deposited.eq(false))
            .exec(&txn)
            .await?;

        txn.commit().await.map_err(|e| {
            DeeplinkerError::database_operation(format!("Failed to commit transaction: {}", e))
        })?;

        Ok(true)
    }
}
