//! 外部广告统计接口

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use crate::errors::Result;
use crate::storage::models::CampaignStatDay;

/// 令牌下的广告账户
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderAccount {
    pub account_id: i64,
    pub display_name: String,
}

/// 某一天某个广告活动的统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderCampaignStat {
    pub campaign_id: String,
    pub campaign_name: String,
    pub status: String,
    pub effective_status: String,
    pub impressions: i64,
    pub clicks: i64,
    pub spend: f64,
}

impl ProviderCampaignStat {
    pub fn into_stat_day(self, external_account_id: i64, day: NaiveDate) -> CampaignStatDay {
        CampaignStatDay {
            external_account_id,
            campaign_id: self.campaign_id,
            campaign_name: self.campaign_name,
            status: self.status,
            effective_status: self.effective_status,
            impressions: self.impressions,
            clicks: self.clicks,
            spend: self.spend,
            stat_date: day,
        }
    }
}

/// 第三方广告统计接口
///
/// 返回空列表表示当天无数据；错误（网络、状态码、报文）由调用方按无数据处理。
#[async_trait]
pub trait StatsProvider: Send + Sync {
    async fn list_accounts(&self, credential: &str) -> Result<Vec<ProviderAccount>>;

    async fn get_daily_stats(
        &self,
        credential: &str,
        account_id: i64,
        day: NaiveDate,
    ) -> Result<Vec<ProviderCampaignStat>>;
}
