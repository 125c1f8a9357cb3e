//! 广告账户采集状态机（连续无数据熔断）

use serde::Serialize;
use strum::{AsRefStr, Display};

/// 单个账户在一轮采集中的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AccountState {
    Unfetched,
    Fetching,
    Fetched,
    NoData,
    /// 终态，需要手动重新启用
    Disabled,
}

/// 账户状态跟踪
///
/// 连续无数据天数超过阈值（严格大于）时进入 `Disabled`。
/// 计数只在一轮采集内累计，每轮从 0 开始。
#[derive(Debug, Clone)]
pub struct AccountTracker {
    state: AccountState,
    no_data_streak: u32,
    threshold: u32,
    days_with_data: u32,
}

impl AccountTracker {
    pub fn new(threshold: u32) -> Self {
        Self {
            state: AccountState::Unfetched,
            no_data_streak: 0,
            threshold,
            days_with_data: 0,
        }
    }

    /// 开始采集下一天；已停用时返回 false
    pub fn begin_day(&mut self) -> bool {
        if self.is_disabled() {
            return false;
        }
        self.state = AccountState::Fetching;
        true
    }

    /// 当天有数据
    pub fn on_records(&mut self) -> AccountState {
        if self.state == AccountState::Fetching {
            self.no_data_streak = 0;
            self.days_with_data += 1;
            self.state = AccountState::Fetched;
        }
        self.state
    }

    /// 当天无数据或请求失败
    pub fn on_no_data(&mut self) -> AccountState {
        if self.state == AccountState::Fetching {
            self.no_data_streak += 1;
            self.state = if self.no_data_streak > self.threshold {
                AccountState::Disabled
            } else {
                AccountState::NoData
            };
        }
        self.state
    }

    pub fn state(&self) -> AccountState {
        self.state
    }

    pub fn is_disabled(&self) -> bool {
        self.state == AccountState::Disabled
    }

    pub fn no_data_streak(&self) -> u32 {
        self.no_data_streak
    }

    pub fn days_with_data(&self) -> u32 {
        self.days_with_data
    }
}
