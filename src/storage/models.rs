use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 推广链接
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub bot_id: i64,
    pub label: String,
    pub referral_subject_id: i64,
    pub hash: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    pub fn is_referral(&self) -> bool {
        self.referral_subject_id != 0
    }
}

/// 广告平台访问令牌
#[derive(Clone, PartialEq)]
pub struct AdToken {
    pub id: i64,
    pub token: String,
    pub active: bool,
    pub days_to_fetch: i32,
    pub created_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
}

// token 不输出到日志
impl std::fmt::Debug for AdToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdToken")
            .field("id", &self.id)
            .field("active", &self.active)
            .field("days_to_fetch", &self.days_to_fetch)
            .field("fetched_at", &self.fetched_at)
            .finish_non_exhaustive()
    }
}

/// 广告账户
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdAccount {
    pub id: i64,
    pub token_id: i64,
    pub external_account_id: i64,
    pub display_name: String,
    pub active: bool,
    pub no_data_streak: i32,
    pub fetch_duration_secs: i64,
    pub fetched_at: DateTime<Utc>,
}

/// 单个 (账户, 广告活动, 日期) 的统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignStatDay {
    pub external_account_id: i64,
    pub campaign_id: String,
    pub campaign_name: String,
    pub status: String,
    pub effective_status: String,
    pub impressions: i64,
    pub clicks: i64,
    pub spend: f64,
    pub stat_date: NaiveDate,
}

/// 账户一轮采集的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountFetchResult {
    pub finished_at: DateTime<Utc>,
    pub no_data_streak: u32,
    pub duration_secs: i64,
    pub disabled: bool,
}

/// 新的用户获取
#[derive(Debug, Clone, PartialEq)]
pub struct NewAcquisition {
    pub bot_id: i64,
    pub subject_id: i64,
    pub campaign_id: Option<i64>,
    pub seen: i32,
    pub created_at: DateTime<Utc>,
}

/// 新的充值
#[derive(Debug, Clone, PartialEq)]
pub struct NewDeposit {
    pub bot_id: i64,
    pub subject_id: i64,
    pub external_tx_id: String,
    pub amount: f64,
    pub unit_price: f64,
    pub occurred_at: DateTime<Utc>,
}

/// bot 的全量历史汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BotTotals {
    pub users: i64,
    pub users_unique: i64,
    pub users_referral: i64,
    pub leads: i64,
    pub income: f64,
}

/// 已归因广告账户的全量历史汇总
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SpendTotals {
    pub impressions: i64,
    pub clicks: i64,
    pub spend: f64,
}
