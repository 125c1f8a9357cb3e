//! 转化报表：按周期或按推广标签合并各指标族的分组结果
//!
//! 每个指标族先独立分组汇总（tally_*），再由合并器按同一组键拼成一行。
//! 缺失的分组一律补 0，不丢行。

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

use chrono::NaiveDate;
use serde::Serialize;

use super::attribution::AttributionKey;
use super::facts::{AcquisitionFact, LeadFact, SpendFact};
use super::metric::rate;
use super::period::{DayWindow, PeriodBucket};

// ============ 分组汇总 ============

/// 用户获取汇总
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AcquisitionTally {
    pub total: i64,
    pub unique: i64,
}

/// 充值用户汇总
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LeadTally {
    /// 窗口内首次充值的用户数
    pub users: i64,
    /// 这些用户窗口内的充值笔数（每个用户至少 1）
    pub total: i64,
    pub income: f64,
}

/// 广告花费汇总
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpendTally {
    pub impressions: i64,
    pub clicks: i64,
    pub expense: f64,
}

/// 按 key 汇总窗口内的用户获取
pub fn tally_acquisitions<K, F>(
    facts: &[AcquisitionFact],
    window: &DayWindow,
    key: F,
) -> HashMap<K, AcquisitionTally>
where
    K: Eq + Hash,
    F: Fn(&AcquisitionFact) -> Option<K>,
{
    let mut out: HashMap<K, AcquisitionTally> = HashMap::new();
    for fact in facts.iter().filter(|f| window.contains(f.acquired_on)) {
        let Some(k) = key(fact) else { continue };
        let tally = out.entry(k).or_default();
        tally.total += 1;
        if fact.is_unique() {
            tally.unique += 1;
        }
    }
    out
}

/// 按 key 汇总窗口内首次充值的用户
pub fn tally_leads<K, F>(facts: &[LeadFact], window: &DayWindow, key: F) -> HashMap<K, LeadTally>
where
    K: Eq + Hash,
    F: Fn(&LeadFact) -> Option<K>,
{
    let mut out: HashMap<K, LeadTally> = HashMap::new();
    for fact in facts.iter().filter(|f| window.contains(f.deposited_on)) {
        let Some(k) = key(fact) else { continue };
        let (count, income) = fact
            .deposits
            .iter()
            .filter(|d| window.contains(d.occurred_on))
            .fold((0i64, 0.0f64), |(n, sum), d| (n + 1, sum + d.value));

        let tally = out.entry(k).or_default();
        tally.users += 1;
        tally.total += count.max(1);
        tally.income += income;
    }
    out
}

/// 按 key 汇总窗口内的广告统计
pub fn tally_spend<K, F>(facts: &[SpendFact], window: &DayWindow, key: F) -> HashMap<K, SpendTally>
where
    K: Eq + Hash,
    F: Fn(&SpendFact) -> Option<K>,
{
    let mut out: HashMap<K, SpendTally> = HashMap::new();
    for fact in facts.iter().filter(|f| window.contains(f.stat_date)) {
        let Some(k) = key(fact) else { continue };
        let tally = out.entry(k).or_default();
        tally.impressions += fact.impressions;
        tally.clicks += fact.clicks;
        tally.expense += fact.spend;
    }
    out
}

// ============ 合并 ============

/// 转化报表行
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversionRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<PeriodBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub users_total: i64,
    pub users_unique: i64,
    pub users_unique_rate: f64,
    pub leads_users: i64,
    pub leads_total: i64,
    pub leads_per_user: f64,
    pub leads_conversion_rate: f64,
    pub income: f64,
    pub expense: f64,
    pub profit: f64,
    pub impressions: i64,
    pub clicks: i64,
}

impl ConversionRow {
    /// 由三组汇总组成一行，缺失的汇总按 0 处理
    pub fn from_tallies(
        acquisitions: Option<&AcquisitionTally>,
        leads: Option<&LeadTally>,
        spend: Option<&SpendTally>,
    ) -> Self {
        let acq = acquisitions.copied().unwrap_or_default();
        let lead = leads.copied().unwrap_or_default();
        let spend = spend.copied().unwrap_or_default();

        let leads_per_user = if lead.users == 0 {
            0.0
        } else {
            lead.total as f64 / lead.users as f64
        };

        Self {
            period: None,
            label: None,
            users_total: acq.total,
            users_unique: acq.unique,
            users_unique_rate: rate(acq.unique, acq.total),
            leads_users: lead.users,
            leads_total: lead.total,
            leads_per_user,
            leads_conversion_rate: rate(lead.users, acq.total),
            income: lead.income,
            expense: spend.expense,
            profit: lead.income - spend.expense,
            impressions: spend.impressions,
            clicks: spend.clicks,
        }
    }
}

/// 按周期合并，行顺序与 `buckets` 一致（新到旧）
///
/// 各汇总以周期起始日为键。
pub fn merge_by_period(
    buckets: &[PeriodBucket],
    acquisitions: &HashMap<NaiveDate, AcquisitionTally>,
    leads: &HashMap<NaiveDate, LeadTally>,
    spend: &HashMap<NaiveDate, SpendTally>,
) -> Vec<ConversionRow> {
    buckets
        .iter()
        .map(|bucket| ConversionRow {
            period: Some(*bucket),
            ..ConversionRow::from_tallies(
                acquisitions.get(&bucket.start),
                leads.get(&bucket.start),
                spend.get(&bucket.start),
            )
        })
        .collect()
}

/// 按推广标签合并
///
/// 行顺序：用户获取数降序（同数按标签名升序），其后是没有用户获取的已知标签，
/// 保持 `known_labels` 中的顺序。已知标签之外但有花费或充值的标签追加在最后。
pub fn merge_by_label(
    known_labels: &[String],
    acquisitions: &HashMap<AttributionKey, AcquisitionTally>,
    leads: &HashMap<AttributionKey, LeadTally>,
    spend: &HashMap<AttributionKey, SpendTally>,
) -> Vec<ConversionRow> {
    let mut display: HashMap<AttributionKey, String> = HashMap::new();
    let mut order: Vec<AttributionKey> = Vec::new();

    let mut ranked: Vec<(&AttributionKey, &AcquisitionTally)> = acquisitions.iter().collect();
    ranked.sort_by(|a, b| match b.1.total.cmp(&a.1.total) {
        Ordering::Equal => a.0.cmp(b.0),
        other => other,
    });
    order.extend(ranked.into_iter().map(|(k, _)| k.clone()));

    for label in known_labels {
        let key = AttributionKey::new(label);
        if key.is_empty() {
            continue;
        }
        display
            .entry(key.clone())
            .or_insert_with(|| label.trim().to_string());
        if !order.contains(&key) {
            order.push(key);
        }
    }

    let mut extras: Vec<&AttributionKey> = leads
        .keys()
        .chain(spend.keys())
        .filter(|k| !order.contains(k))
        .collect();
    extras.sort();
    extras.dedup();
    order.extend(extras.into_iter().cloned());

    order
        .into_iter()
        .map(|key| {
            let label = display
                .get(&key)
                .cloned()
                .unwrap_or_else(|| key.as_str().to_string());
            ConversionRow {
                label: Some(label),
                ..ConversionRow::from_tallies(
                    acquisitions.get(&key),
                    leads.get(&key),
                    spend.get(&key),
                )
            }
        })
        .collect()
}
