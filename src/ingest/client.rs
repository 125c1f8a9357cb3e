//! 广告统计 HTTP 客户端
//!
//! 同步 ureq 请求放在 spawn_blocking 中执行；数值字段在接口中以字符串返回。

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use tracing::{trace, warn};
use ureq::Agent;

use super::provider::{ProviderAccount, ProviderCampaignStat, StatsProvider};
use crate::config::ProviderConfig;
use crate::errors::{DeeplinkerError, Result};

// ============ 接口报文 ============

#[derive(Debug, Deserialize)]
struct RawAccount {
    #[serde(deserialize_with = "lenient_string")]
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct StatisticsResponse {
    #[serde(default)]
    data: Vec<StatisticsAccount>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatisticsAccount {
    #[serde(default)]
    ads: AdList,
}

#[derive(Debug, Default, Deserialize)]
struct AdList {
    #[serde(default)]
    data: Vec<Ad>,
}

#[derive(Debug, Deserialize)]
struct Ad {
    #[serde(deserialize_with = "lenient_string")]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    effective_status: String,
    #[serde(default)]
    insights: InsightList,
}

#[derive(Debug, Default, Deserialize)]
struct InsightList {
    #[serde(default)]
    data: Vec<Insight>,
}

#[derive(Debug, Deserialize)]
struct Insight {
    #[serde(default, deserialize_with = "lenient_number")]
    impressions: i64,
    #[serde(default, deserialize_with = "lenient_number")]
    clicks: i64,
    #[serde(default, deserialize_with = "lenient_number")]
    spend: f64,
}

/// 接受 "123" / 123 / "" / null，空值为 0
fn lenient_number<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
    T::Err: std::fmt::Display,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(T::default()),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(T::default()),
        serde_json::Value::String(s) => s.trim().parse().map_err(D::Error::custom),
        serde_json::Value::Number(n) => n.to_string().parse().map_err(D::Error::custom),
        other => Err(D::Error::custom(format!("expected number, got {}", other))),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("expected string id, got {}", other))),
    }
}

/// 解析账户列表：`{"<key>": {"id": "123", "name": "..."}}`
///
/// id 无法解析或为 0 的条目被跳过，结果按账户 id 排序。
pub(crate) fn parse_accounts(body: &str) -> Result<Vec<ProviderAccount>> {
    let raw: HashMap<String, RawAccount> = serde_json::from_str(body)
        .map_err(|e| DeeplinkerError::provider_payload(format!("accounts payload: {}", e)))?;

    let mut accounts: Vec<ProviderAccount> = raw
        .into_values()
        .filter_map(|a| match a.id.trim().parse::<i64>() {
            Ok(0) => None,
            Ok(account_id) => Some(ProviderAccount {
                account_id,
                display_name: a.name,
            }),
            Err(_) => {
                warn!("Skipping ad account with invalid id '{}'", a.id);
                None
            }
        })
        .collect();
    accounts.sort_by_key(|a| a.account_id);
    Ok(accounts)
}

/// 解析单日统计：每条 insight 对应一行
pub(crate) fn parse_statistics(body: &str) -> Result<Vec<ProviderCampaignStat>> {
    let response: StatisticsResponse = serde_json::from_str(body)
        .map_err(|e| DeeplinkerError::provider_payload(format!("statistics payload: {}", e)))?;

    if response.success == Some(false) {
        return Err(DeeplinkerError::provider_payload(format!(
            "statistics request rejected: {}",
            response.message.unwrap_or_default()
        )));
    }

    let stats = response
        .data
        .into_iter()
        .flat_map(|account| account.ads.data)
        .flat_map(|ad| {
            let Ad {
                id,
                name,
                status,
                effective_status,
                insights,
            } = ad;
            insights
                .data
                .into_iter()
                .map(move |insight| ProviderCampaignStat {
                    campaign_id: id.clone(),
                    campaign_name: name.clone(),
                    status: status.clone(),
                    effective_status: effective_status.clone(),
                    impressions: insight.impressions,
                    clicks: insight.clicks,
                    spend: insight.spend,
                })
        })
        .collect();

    Ok(stats)
}

// ============ 客户端 ============

/// 广告统计接口客户端
pub struct AdReportClient {
    agent: Agent,
    base_url: String,
}

impl AdReportClient {
    pub fn new(config: &ProviderConfig) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs.max(1))))
            .build()
            .into();

        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// GET 并返回响应体（同步，在 spawn_blocking 中调用）
    fn get_body_sync(agent: Agent, url: String, endpoint: &'static str) -> Result<String> {
        let resp = agent.get(&url).call().map_err(|e| {
            DeeplinkerError::provider_request(format!("{} request failed: {}", endpoint, e))
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DeeplinkerError::provider_request(format!(
                "{} returned status {}",
                endpoint, status
            )));
        }

        resp.into_body().read_to_string().map_err(|e| {
            DeeplinkerError::provider_request(format!("{} body read failed: {}", endpoint, e))
        })
    }

    async fn get_body(&self, url: String, endpoint: &'static str) -> Result<String> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || Self::get_body_sync(agent, url, endpoint))
            .await
            .map_err(|e| {
                DeeplinkerError::provider_request(format!("{} task failed: {}", endpoint, e))
            })?
    }
}

#[async_trait]
impl StatsProvider for AdReportClient {
    async fn list_accounts(&self, credential: &str) -> Result<Vec<ProviderAccount>> {
        let url = format!(
            "{}/api/get-accounts?key={}",
            self.base_url,
            urlencoding::encode(credential)
        );
        let body = self.get_body(url, "get-accounts").await?;
        let accounts = parse_accounts(&body)?;
        trace!("get-accounts returned {} accounts", accounts.len());
        Ok(accounts)
    }

    async fn get_daily_stats(
        &self,
        credential: &str,
        account_id: i64,
        day: NaiveDate,
    ) -> Result<Vec<ProviderCampaignStat>> {
        let date = day.format("%Y-%m-%d");
        let url = format!(
            "{}/api/get-statistics?key={}&account={}&dates={}+-+{}",
            self.base_url,
            urlencoding::encode(credential),
            account_id,
            date,
            date
        );
        let body = self.get_body(url, "get-statistics").await?;
        let stats = parse_statistics(&body)?;
        trace!(
            "get-statistics account={} day={} returned {} rows",
            account_id,
            day,
            stats.len()
        );
        Ok(stats)
    }
}
