//! 指标行计算
//!
//! 每个指标族独立计算 all_time / period / last_period / diff 四个值，
//! 同一指标行内数值类型一致（计数用 i64，金额和比率用 f64）。

use std::ops::{Add, Sub};

use chrono::NaiveDate;
use serde::Serialize;

use super::period::{DayWindow, ReportWindow};

/// 指标数值类型
pub trait MetricValue:
    Copy + Default + PartialEq + Add<Output = Self> + Sub<Output = Self> + Serialize
{
    fn to_f64(self) -> f64;
}

impl MetricValue for i64 {
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl MetricValue for f64 {
    fn to_f64(self) -> f64 {
        self
    }
}

/// 当前周期相对上一周期的百分比变化
///
/// 上一周期 <= 0 时无意义，返回 0。
pub fn percent_diff(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current / previous - 1.0) * 100.0
    } else {
        0.0
    }
}

/// part / total * 100，total 为 0 时返回 0
pub fn rate(part: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// 单个指标的四值行
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MetricRow<T> {
    pub all_time: T,
    pub period: T,
    pub last_period: T,
    pub diff: f64,
}

impl<T: MetricValue> MetricRow<T> {
    pub fn new(all_time: T, period: T, last_period: T) -> Self {
        Self {
            all_time,
            period,
            last_period,
            diff: percent_diff(period.to_f64(), last_period.to_f64()),
        }
    }

    /// 按字段相减并重新计算 diff（profit = income - expense）
    pub fn minus(&self, other: &Self) -> Self {
        Self::new(
            self.all_time - other.all_time,
            self.period - other.period,
            self.last_period - other.last_period,
        )
    }
}

/// 窗口内累计值
fn window_sum<T, I>(values: I, window: &DayWindow) -> T
where
    T: MetricValue,
    I: IntoIterator<Item = (NaiveDate, T)>,
{
    values
        .into_iter()
        .filter(|(day, _)| window.contains(*day))
        .fold(T::default(), |acc, (_, v)| acc + v)
}

/// 求和类指标（计数、金额）
///
/// `all_time` 由调用方从全量历史得到，不受窗口限制。
pub fn sum_metric<T, I>(all_time: T, values: I, window: &ReportWindow) -> MetricRow<T>
where
    T: MetricValue,
    I: IntoIterator<Item = (NaiveDate, T)>,
    I::IntoIter: Clone,
{
    let values = values.into_iter();
    let period = window_sum(values.clone(), &window.current);
    let last_period = window_sum(values, &window.previous);
    MetricRow::new(all_time, period, last_period)
}

/// 计数类指标：每个日期计 1
pub fn count_metric<I>(all_time: i64, days: I, window: &ReportWindow) -> MetricRow<i64>
where
    I: IntoIterator<Item = NaiveDate>,
    I::IntoIter: Clone,
{
    sum_metric(all_time, days.into_iter().map(|d| (d, 1i64)), window)
}

/// 比率类指标：命中数 / 总数 * 100
///
/// `all_time` 为全量历史的 (命中数, 总数)。
pub fn rate_metric<I>(all_time: (i64, i64), samples: I, window: &ReportWindow) -> MetricRow<f64>
where
    I: IntoIterator<Item = (NaiveDate, bool)>,
    I::IntoIter: Clone,
{
    let samples = samples.into_iter();
    let tally = |w: &DayWindow| {
        samples
            .clone()
            .filter(|(day, _)| w.contains(*day))
            .fold((0i64, 0i64), |(hit, total), (_, is_hit)| {
                (hit + i64::from(is_hit), total + 1)
            })
    };
    let (hit, total) = tally(&window.current);
    let (last_hit, last_total) = tally(&window.previous);

    MetricRow::new(
        rate(all_time.0, all_time.1),
        rate(hit, total),
        rate(last_hit, last_total),
    )
}
