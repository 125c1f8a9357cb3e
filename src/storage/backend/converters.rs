use chrono::{DateTime, Utc};

use crate::storage::models::{AdAccount, AdToken, Campaign, CampaignStatDay};
use migration::entities::{ad_account, ad_campaign_stats_daily, ad_token, campaign};

/// 将 Sea-ORM Model 转换为 Campaign
pub fn model_to_campaign(model: campaign::Model) -> Campaign {
    Campaign {
        id: model.id,
        bot_id: model.bot_id,
        label: model.label,
        referral_subject_id: model.referral_subject_id,
        hash: model.hash,
        active: model.active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub fn model_to_ad_token(model: ad_token::Model) -> AdToken {
    AdToken {
        id: model.id,
        token: model.token,
        active: model.active,
        days_to_fetch: model.days_to_fetch,
        created_at: model.created_at,
        fetched_at: model.fetched_at,
    }
}

pub fn model_to_ad_account(model: ad_account::Model) -> AdAccount {
    AdAccount {
        id: model.id,
        token_id: model.token_id,
        external_account_id: model.external_account_id,
        display_name: model.display_name,
        active: model.active,
        no_data_streak: model.no_data_streak,
        fetch_duration_secs: model.fetch_duration_secs,
        fetched_at: model.fetched_at,
    }
}

/// 将 CampaignStatDay 转换为 ActiveModel（用于 upsert）
///
/// created_at 只在插入时生效，冲突更新时不会覆盖。
pub fn stat_to_active_model(
    stat: &CampaignStatDay,
    now: DateTime<Utc>,
) -> ad_campaign_stats_daily::ActiveModel {
    use sea_orm::ActiveValue::*;

    ad_campaign_stats_daily::ActiveModel {
        id: NotSet,
        external_account_id: Set(stat.external_account_id),
        campaign_id: Set(stat.campaign_id.clone()),
        campaign_name: Set(stat.campaign_name.clone()),
        status: Set(stat.status.clone()),
        effective_status: Set(stat.effective_status.clone()),
        impressions: Set(stat.impressions),
        clicks: Set(stat.clicks),
        spend: Set(stat.spend),
        stat_date: Set(stat.stat_date),
        created_at: Set(now),
        updated_at: Set(now),
    }
}
