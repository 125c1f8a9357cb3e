//! 报表聚合的输入行
//!
//! 由存储层按日期范围读取，聚合器只依赖这些结构，不直接访问数据库。

use chrono::NaiveDate;

/// 一次用户获取
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionFact {
    pub acquired_on: NaiveDate,
    /// 之前见过的次数，0 表示首次获取
    pub seen: i32,
    /// 所属推广的标签（无推广时为 None）
    pub label: Option<String>,
    /// 是否来自推荐链接
    pub referral: bool,
}

impl AcquisitionFact {
    pub fn is_unique(&self) -> bool {
        self.seen < 1
    }
}

/// 一笔充值
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepositFact {
    pub occurred_on: NaiveDate,
    /// amount * unit_price
    pub value: f64,
}

/// 一个已充值用户（lead）及其窗口内的充值
#[derive(Debug, Clone, PartialEq)]
pub struct LeadFact {
    pub deposited_on: NaiveDate,
    pub label: Option<String>,
    pub deposits: Vec<DepositFact>,
}

/// 一条已归因到推广标签的广告日统计
#[derive(Debug, Clone, PartialEq)]
pub struct SpendFact {
    pub stat_date: NaiveDate,
    pub label: String,
    pub impressions: i64,
    pub clicks: i64,
    pub spend: f64,
}
