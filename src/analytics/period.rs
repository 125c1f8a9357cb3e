//! 报表时间窗口与周期分桶
//!
//! 所有窗口统一使用左开右闭 `(start, end]` 的日历日语义：
//! `start` 当天不计入，`end` 当天计入。

use chrono::{Datelike, Days, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// 报表粒度
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Granularity {
    Day,
    Week,
    Month,
}

impl Granularity {
    /// 包含 `day` 的周期的第一天（周从周一开始）
    pub fn period_start(self, day: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Day => day,
            Granularity::Week => {
                let offset = u64::from(day.weekday().num_days_from_monday());
                day.checked_sub_days(Days::new(offset)).unwrap_or(day)
            }
            Granularity::Month => day.with_day(1).unwrap_or(day),
        }
    }

    /// 周期的展示结束日（含）
    pub fn period_end(self, start: NaiveDate) -> NaiveDate {
        let next = match self {
            Granularity::Day => return start,
            Granularity::Week => start.checked_add_days(Days::new(7)),
            Granularity::Month => start.checked_add_months(Months::new(1)),
        };
        next.and_then(|d| d.pred_opt()).unwrap_or(start)
    }

    /// 上一个周期的起始日
    pub fn decrement(self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Granularity::Day => start.pred_opt(),
            Granularity::Week => start.checked_sub_days(Days::new(7)),
            Granularity::Month => start.checked_sub_months(Months::new(1)),
        }
    }
}

/// 单个分桶
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodBucket {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodBucket {
    pub fn new(granularity: Granularity, start: NaiveDate) -> Self {
        Self {
            start,
            end: granularity.period_end(start),
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && day <= self.end
    }
}

/// 将 `(start, end]` 划分为周期分桶，从最新到最旧排列
///
/// 返回覆盖 `start+1 ..= end` 各天的周期；周/月粒度下首尾周期会超出窗口。
/// `end <= start` 时只返回包含 `start+1` 的单个周期。
/// 不过滤未来周期，调用方自行处理。
pub fn bucketize(granularity: Granularity, start: NaiveDate, end: NaiveDate) -> Vec<PeriodBucket> {
    let first_day = start.succ_opt().unwrap_or(start);
    let oldest = granularity.period_start(first_day);
    let mut cursor = granularity.period_start(end.max(first_day));

    let mut buckets = Vec::new();
    loop {
        buckets.push(PeriodBucket::new(granularity, cursor));
        if cursor <= oldest {
            break;
        }
        match granularity.decrement(cursor) {
            Some(prev) if prev < cursor => cursor = prev,
            _ => break,
        }
    }
    buckets
}

/// 左开右闭的日历日窗口 `(start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DayWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day > self.start && day <= self.end
    }

    /// 窗口包含的天数
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days().max(0)
    }

    /// 第一天（含）
    pub fn first_day(&self) -> NaiveDate {
        self.start.succ_opt().unwrap_or(self.start)
    }

    /// 对应的 UTC 时间范围 `[first_day 00:00, end+1 00:00)`，用于数据库范围查询
    pub fn utc_bounds(&self) -> (chrono::DateTime<Utc>, chrono::DateTime<Utc>) {
        let upper = self.end.succ_opt().unwrap_or(self.end);
        (midnight_utc(self.first_day()), midnight_utc(upper))
    }

    /// 同时覆盖两个窗口的最小窗口
    pub fn union(&self, other: &DayWindow) -> DayWindow {
        DayWindow {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// 当前 / 上一周期对比窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportWindow {
    pub current: DayWindow,
    pub previous: DayWindow,
}

impl ReportWindow {
    /// 根据用户输入的闭区间 `[start, end]` 计算报表窗口
    ///
    /// - start 缺省为 today - default_range_days，end 缺省为 today
    /// - end 不超过 today
    /// - end < start 时按单日处理
    /// - previous 与 current 等长且紧邻
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
        default_range_days: i64,
    ) -> Self {
        let default_start = today
            .checked_sub_days(Days::new(default_range_days.max(0) as u64))
            .unwrap_or(today);
        let start = start.unwrap_or(default_start);
        let end = end.unwrap_or(today).min(today).max(start);

        let before_start = start.pred_opt().unwrap_or(start);
        let current = DayWindow::new(before_start, end);
        let span = Days::new(current.days().max(1) as u64);
        let previous = DayWindow::new(
            before_start.checked_sub_days(span).unwrap_or(before_start),
            end.checked_sub_days(span).unwrap_or(end),
        );

        Self { current, previous }
    }

    /// 两个窗口的并集（一次性读取源数据用）
    pub fn span(&self) -> DayWindow {
        self.current.union(&self.previous)
    }
}

pub(crate) fn midnight_utc(day: NaiveDate) -> chrono::DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_day_buckets_exclude_start() {
        let buckets = bucketize(Granularity::Day, d(2024, 6, 1), d(2024, 6, 4));
        let starts: Vec<_> = buckets.iter().map(|b| b.start).collect();
        assert_eq!(starts, vec![d(2024, 6, 4), d(2024, 6, 3), d(2024, 6, 2)]);
        assert!(buckets.iter().all(|b| b.start == b.end));
    }

    #[test]
    fn test_week_buckets_align_to_monday() {
        // 2024-06-05 是周三
        let buckets = bucketize(Granularity::Week, d(2024, 6, 4), d(2024, 6, 19));
        let starts: Vec<_> = buckets.iter().map(|b| b.start).collect();
        assert_eq!(starts, vec![d(2024, 6, 17), d(2024, 6, 10), d(2024, 6, 3)]);
        assert_eq!(buckets[0].end, d(2024, 6, 23));
        assert!(buckets[0].end >= d(2024, 6, 19));
    }

    #[test]
    fn test_month_buckets_span_year_boundary() {
        let buckets = bucketize(Granularity::Month, d(2023, 11, 20), d(2024, 2, 10));
        let ranges: Vec<_> = buckets.iter().map(|b| (b.start, b.end)).collect();
        assert_eq!(
            ranges,
            vec![
                (d(2024, 2, 1), d(2024, 2, 29)),
                (d(2024, 1, 1), d(2024, 1, 31)),
                (d(2023, 12, 1), d(2023, 12, 31)),
                (d(2023, 11, 1), d(2023, 11, 30)),
            ]
        );
    }

    #[test]
    fn test_degenerate_range_yields_single_bucket() {
        for g in [Granularity::Day, Granularity::Week, Granularity::Month] {
            let buckets = bucketize(g, d(2024, 3, 10), d(2024, 3, 5));
            assert_eq!(buckets.len(), 1, "{g}");
            assert!(buckets[0].contains(d(2024, 3, 11)));
        }
    }

    #[test]
    fn test_buckets_are_contiguous_and_cover_range() {
        let start = d(2023, 12, 28);
        for g in [Granularity::Day, Granularity::Week, Granularity::Month] {
            for len in [1u64, 6, 7, 8, 30, 31, 95] {
                let end = start.checked_add_days(Days::new(len)).unwrap();
                let buckets = bucketize(g, start, end);

                // 新到旧，相邻无间隙无重叠
                for pair in buckets.windows(2) {
                    assert_eq!(pair[1].end.succ_opt().unwrap(), pair[0].start);
                }
                let newest = buckets.first().unwrap();
                let oldest = buckets.last().unwrap();
                assert!(newest.end >= end);
                assert!(oldest.start <= start.succ_opt().unwrap());
                assert!(newest.contains(end));
            }
        }
    }

    #[test]
    fn test_granularity_parse() {
        assert_eq!("week".parse::<Granularity>().unwrap(), Granularity::Week);
        assert_eq!("MONTH".parse::<Granularity>().unwrap(), Granularity::Month);
        assert!("year".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_day_window_membership_is_half_open() {
        let w = DayWindow::new(d(2024, 6, 1), d(2024, 6, 3));
        assert!(!w.contains(d(2024, 6, 1)));
        assert!(w.contains(d(2024, 6, 2)));
        assert!(w.contains(d(2024, 6, 3)));
        assert!(!w.contains(d(2024, 6, 4)));
        assert_eq!(w.days(), 2);
    }

    #[test]
    fn test_resolve_windows_are_adjacent_and_equal_length() {
        let today = d(2024, 6, 30);
        let w = ReportWindow::resolve(Some(d(2024, 6, 10)), Some(d(2024, 6, 16)), today, 30);
        assert_eq!(w.current, DayWindow::new(d(2024, 6, 9), d(2024, 6, 16)));
        assert_eq!(w.previous, DayWindow::new(d(2024, 6, 2), d(2024, 6, 9)));
        assert_eq!(w.current.days(), w.previous.days());
    }

    #[test]
    fn test_resolve_defaults_and_clamps() {
        let today = d(2024, 6, 30);
        let w = ReportWindow::resolve(None, None, today, 30);
        assert_eq!(w.current.end, today);
        assert_eq!(w.current.first_day(), d(2024, 5, 31));

        let future = ReportWindow::resolve(Some(d(2024, 6, 20)), Some(d(2024, 8, 1)), today, 30);
        assert_eq!(future.current.end, today);
    }

    #[test]
    fn test_resolve_degenerate_becomes_single_day() {
        let today = d(2024, 6, 30);
        let w = ReportWindow::resolve(Some(d(2024, 6, 20)), Some(d(2024, 6, 10)), today, 30);
        assert_eq!(w.current.days(), 1);
        assert!(w.current.contains(d(2024, 6, 20)));
        assert_eq!(w.previous, DayWindow::new(d(2024, 6, 18), d(2024, 6, 19)));
    }

    #[test]
    fn test_utc_bounds() {
        let w = DayWindow::new(d(2024, 6, 1), d(2024, 6, 3));
        let (lo, hi) = w.utc_bounds();
        assert_eq!(lo.to_rfc3339(), "2024-06-02T00:00:00+00:00");
        assert_eq!(hi.to_rfc3339(), "2024-06-04T00:00:00+00:00");
    }
}
