use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::storage::models::{AccountFetchResult, AdAccount, AdToken, CampaignStatDay};

/// 采集 worker 使用的存储接口
///
/// 统计行以 (账户, 广告活动, 日期) 为键 upsert，重复写入收敛到同一行。
#[async_trait]
pub trait CampaignStatStore: Send + Sync {
    /// active 且 fetched_at 早于 `fetched_before` 的令牌
    async fn unfetched_tokens(&self, fetched_before: DateTime<Utc>) -> Result<Vec<AdToken>>;

    /// 按外部账户 id 创建账户，已存在时只刷新名称。返回是否新建
    async fn ensure_account(
        &self,
        token_id: i64,
        external_account_id: i64,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    async fn mark_token_fetched(&self, token_id: i64, at: DateTime<Utc>) -> Result<()>;

    /// 令牌下 active 且 fetched_at 早于 `fetched_before` 的账户
    async fn unfetched_accounts(
        &self,
        token_id: i64,
        fetched_before: DateTime<Utc>,
    ) -> Result<Vec<AdAccount>>;

    async fn upsert_campaign_stat(&self, stat: &CampaignStatDay) -> Result<()>;

    /// 写入账户一轮采集的结果；`disabled` 时同时清除 active
    async fn record_account_result(
        &self,
        external_account_id: i64,
        result: &AccountFetchResult,
    ) -> Result<()>;
}
