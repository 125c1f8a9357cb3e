//! Report service tests
//!
//! One bot with one promoted campaign, two days of acquisitions, deposits and
//! attributed ad spend, read back through every report.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use deeplinker::analytics::{DayWindow, Granularity, ReportWindow};
use deeplinker::config::init_config;
use deeplinker::ingest::CampaignStatStore;
use deeplinker::services::ReportService;
use deeplinker::storage::{CampaignStatDay, NewAcquisition, NewDeposit, SeaOrmStorage};
use std::sync::{Arc, Once};
use tempfile::TempDir;

static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

async fn create_temp_storage() -> (Arc<SeaOrmStorage>, TempDir) {
    init_test_config();

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = SeaOrmStorage::new(&db_url, "sqlite")
        .await
        .expect("Failed to create storage");

    (Arc::new(storage), temp_dir)
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

fn at(d: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, d, hour, 0, 0).unwrap()
}

fn approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

const BOT: i64 = 1;

/// 填充场景数据
///
/// - 06-08：5 个无推广用户（上一周期）
/// - 06-10：10 个用户，其中 2 个当天充值 10
/// - 06-11：20 个用户，其中 8 个当天充值 10
/// - 广告账户 " summer promo " 两天花费 5 / 15，另一个未归因账户花费 100
async fn seed(storage: &SeaOrmStorage) {
    let campaign = storage
        .create_campaign(BOT, "Summer Promo", 0, None)
        .await
        .unwrap();
    storage
        .create_campaign(BOT, "Winter Sale", 0, None)
        .await
        .unwrap();

    let mut subject = 0;
    for (d, users, leads, campaign_id) in [
        (8, 5, 0, None),
        (10, 10, 2, Some(campaign.id)),
        (11, 20, 8, Some(campaign.id)),
    ] {
        for i in 0..users {
            subject += 1;
            storage
                .record_acquisition(&NewAcquisition {
                    bot_id: BOT,
                    subject_id: subject,
                    campaign_id,
                    seen: i % 2,
                    created_at: at(d, 8),
                })
                .await
                .unwrap();

            if i < leads {
                storage
                    .record_deposit(&NewDeposit {
                        bot_id: BOT,
                        subject_id: subject,
                        external_tx_id: format!("tx-{}", subject),
                        amount: 10.0,
                        unit_price: 1.0,
                        occurred_at: at(d, 18),
                    })
                    .await
                    .unwrap();
            }
        }
    }

    let token = storage.add_ad_token("key", 7).await.unwrap();
    storage
        .ensure_account(token.id, 501, " summer promo ", at(1, 0))
        .await
        .unwrap();
    storage
        .ensure_account(token.id, 502, "unrelated", at(1, 0))
        .await
        .unwrap();

    for (account, d, spend) in [(501, 10, 5.0), (501, 11, 15.0), (502, 11, 100.0)] {
        storage
            .upsert_campaign_stat(&CampaignStatDay {
                external_account_id: account,
                campaign_id: "c1".to_string(),
                campaign_name: "Campaign c1".to_string(),
                status: "ACTIVE".to_string(),
                effective_status: "ACTIVE".to_string(),
                impressions: 1000,
                clicks: 40,
                spend,
                stat_date: day(d),
            })
            .await
            .unwrap();
    }
}

// =============================================================================
// 转化报表
// =============================================================================

#[cfg(test)]
mod conversion_tests {
    use super::*;

    #[tokio::test]
    async fn test_conversions_by_day() {
        let (storage, _dir) = create_temp_storage().await;
        seed(&storage).await;
        let service = ReportService::new(storage);

        let rows = service
            .conversions_by_period(BOT, Granularity::Day, &DayWindow::new(day(9), day(11)), day(11))
            .await;
        assert_eq!(rows.len(), 2);

        let latest = &rows[0];
        assert_eq!(latest.period.unwrap().start, day(11));
        assert_eq!(latest.users_total, 20);
        assert_eq!(latest.users_unique, 10);
        approx(latest.users_unique_rate, 50.0);
        assert_eq!(latest.leads_users, 8);
        assert_eq!(latest.leads_total, 8);
        approx(latest.leads_per_user, 1.0);
        approx(latest.leads_conversion_rate, 40.0);
        approx(latest.income, 80.0);
        approx(latest.expense, 15.0);
        approx(latest.profit, 65.0);
        assert_eq!(latest.impressions, 1000);
        assert_eq!(latest.clicks, 40);

        let earlier = &rows[1];
        assert_eq!(earlier.period.unwrap().start, day(10));
        assert_eq!(earlier.users_total, 10);
        approx(earlier.leads_conversion_rate, 20.0);
        approx(earlier.income, 20.0);
        approx(earlier.profit, 15.0);
    }

    #[tokio::test]
    async fn test_conversions_by_week_single_bucket() {
        let (storage, _dir) = create_temp_storage().await;
        seed(&storage).await;
        let service = ReportService::new(storage);

        // 2024-06-10 是周一
        let rows = service
            .conversions_by_period(BOT, Granularity::Week, &DayWindow::new(day(9), day(11)), day(11))
            .await;
        assert_eq!(rows.len(), 1);
        let period = rows[0].period.unwrap();
        assert_eq!(period.start, day(10));
        assert_eq!(period.end, day(16));
        assert_eq!(rows[0].users_total, 30);
        approx(rows[0].expense, 20.0);
    }

    #[tokio::test]
    async fn test_future_periods_are_dropped() {
        let (storage, _dir) = create_temp_storage().await;
        seed(&storage).await;
        let service = ReportService::new(storage);

        let rows = service
            .conversions_by_period(BOT, Granularity::Day, &DayWindow::new(day(9), day(14)), day(11))
            .await;
        let starts: Vec<_> = rows.iter().map(|r| r.period.unwrap().start).collect();
        assert_eq!(starts, vec![day(11), day(10)]);
    }

    #[tokio::test]
    async fn test_empty_days_are_zero_rows() {
        let (storage, _dir) = create_temp_storage().await;
        seed(&storage).await;
        let service = ReportService::new(storage);

        let rows = service
            .conversions_by_period(BOT, Granularity::Day, &DayWindow::new(day(1), day(4)), day(30))
            .await;
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.users_total == 0 && r.income == 0.0));
    }

    #[tokio::test]
    async fn test_conversions_by_campaign() {
        let (storage, _dir) = create_temp_storage().await;
        seed(&storage).await;
        let service = ReportService::new(storage);

        let rows = service
            .conversions_by_campaign(BOT, &DayWindow::new(day(9), day(11)))
            .await;
        assert_eq!(rows.len(), 2);

        let promo = &rows[0];
        assert_eq!(promo.label.as_deref(), Some("Summer Promo"));
        assert_eq!(promo.users_total, 30);
        assert_eq!(promo.leads_users, 10);
        approx(promo.income, 100.0);
        approx(promo.expense, 20.0);
        approx(promo.profit, 80.0);
        approx(promo.leads_conversion_rate, 100.0 / 3.0);

        let winter = &rows[1];
        assert_eq!(winter.label.as_deref(), Some("Winter Sale"));
        assert_eq!(winter.users_total, 0);
        approx(winter.expense, 0.0);
    }

    #[tokio::test]
    async fn test_unknown_bot_has_no_rows() {
        let (storage, _dir) = create_temp_storage().await;
        seed(&storage).await;
        let service = ReportService::new(storage);

        let rows = service
            .conversions_by_campaign(99, &DayWindow::new(day(9), day(11)))
            .await;
        assert!(rows.is_empty());
    }
}

// =============================================================================
// 指标报表
// =============================================================================

#[cfg(test)]
mod metrics_tests {
    use super::*;

    #[tokio::test]
    async fn test_bot_metrics() {
        let (storage, _dir) = create_temp_storage().await;
        seed(&storage).await;
        let service = ReportService::new(storage);

        let window = ReportWindow::resolve(Some(day(10)), Some(day(11)), day(11), 30);
        assert_eq!(window.current, DayWindow::new(day(9), day(11)));
        assert_eq!(window.previous, DayWindow::new(day(7), day(9)));

        let metrics = service.bot_metrics(BOT, &window).await;

        assert_eq!(metrics.users.all_time, 35);
        assert_eq!(metrics.users.period, 30);
        assert_eq!(metrics.users.last_period, 5);
        approx(metrics.users.diff, 500.0);

        approx(metrics.users_unique.period, 50.0);
        approx(metrics.users_referrals.period, 0.0);

        assert_eq!(metrics.leads.period, 10);
        assert_eq!(metrics.leads.last_period, 0);
        approx(metrics.leads.diff, 0.0);

        approx(metrics.income.all_time, 100.0);
        approx(metrics.income.period, 100.0);
        approx(metrics.expense.all_time, 20.0);
        approx(metrics.expense.period, 20.0);
        approx(metrics.profit.period, 80.0);
        assert_eq!(metrics.clicks.period, 80);
        assert_eq!(metrics.impressions.period, 2000);
        assert_eq!(metrics.date_range, window);
    }

    #[tokio::test]
    async fn test_bot_metrics_for_empty_bot() {
        let (storage, _dir) = create_temp_storage().await;
        let service = ReportService::new(storage);

        let window = ReportWindow::resolve(None, None, day(11), 30);
        let metrics = service.bot_metrics(BOT, &window).await;
        assert_eq!(metrics.users.all_time, 0);
        approx(metrics.users_unique.all_time, 0.0);
        approx(metrics.profit.diff, 0.0);
    }
}
