//! Ingestion worker tests
//!
//! Runs single passes against a scripted provider and a temporary SQLite store,
//! plus the run loop against a counting store on a paused clock.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use deeplinker::config::{WorkerConfig, init_config};
use deeplinker::errors::{DeeplinkerError, Result};
use deeplinker::ingest::{
    AccountState, CampaignStatStore, IngestionWorker, ProviderAccount, ProviderCampaignStat,
    StatsProvider,
};
use deeplinker::storage::{AccountFetchResult, AdAccount, AdToken, CampaignStatDay, SeaOrmStorage};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;

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

fn day(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

fn at(m: u32, d: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, m, d, hour, 0, 0).unwrap()
}

fn test_worker_config() -> WorkerConfig {
    WorkerConfig {
        single_run: true,
        request_delay_ms: 0,
        token_refresh_hours: 6,
        account_refresh_hours: 24,
        no_data_threshold: 3,
        default_days_to_fetch: 7,
        ..WorkerConfig::default()
    }
}

fn campaign_stat(id: &str, spend: f64) -> ProviderCampaignStat {
    ProviderCampaignStat {
        campaign_id: id.to_string(),
        campaign_name: format!("Campaign {}", id),
        status: "ACTIVE".to_string(),
        effective_status: "ACTIVE".to_string(),
        impressions: 500,
        clicks: 25,
        spend,
    }
}

// =============================================================================
// Scripted provider
// =============================================================================

#[derive(Default)]
struct MockProvider {
    accounts: Mutex<Vec<ProviderAccount>>,
    stats: Mutex<HashMap<(i64, NaiveDate), Vec<ProviderCampaignStat>>>,
    failing_credentials: Mutex<HashSet<String>>,
    failing_days: Mutex<HashSet<(i64, NaiveDate)>>,
    calls: Mutex<Vec<(i64, NaiveDate)>>,
}

impl MockProvider {
    fn with_accounts(accounts: &[(i64, &str)]) -> Self {
        let provider = Self::default();
        *provider.accounts.lock().unwrap() = accounts
            .iter()
            .map(|(id, name)| ProviderAccount {
                account_id: *id,
                display_name: name.to_string(),
            })
            .collect();
        provider
    }

    fn set_stats(&self, account: i64, day: NaiveDate, stats: Vec<ProviderCampaignStat>) {
        self.stats.lock().unwrap().insert((account, day), stats);
    }

    fn fail_credential(&self, credential: &str) {
        self.failing_credentials
            .lock()
            .unwrap()
            .insert(credential.to_string());
    }

    /// 该账户该日的统计请求返回错误
    fn fail_daily(&self, account: i64, day: NaiveDate) {
        self.failing_days.lock().unwrap().insert((account, day));
    }

    fn calls(&self) -> Vec<(i64, NaiveDate)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatsProvider for MockProvider {
    async fn list_accounts(&self, credential: &str) -> Result<Vec<ProviderAccount>> {
        if self.failing_credentials.lock().unwrap().contains(credential) {
            return Err(DeeplinkerError::provider_request("status 401"));
        }
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn get_daily_stats(
        &self,
        _credential: &str,
        account_id: i64,
        day: NaiveDate,
    ) -> Result<Vec<ProviderCampaignStat>> {
        self.calls.lock().unwrap().push((account_id, day));
        if self.failing_days.lock().unwrap().contains(&(account_id, day)) {
            return Err(DeeplinkerError::provider_request("status 500"));
        }
        Ok(self
            .stats
            .lock()
            .unwrap()
            .get(&(account_id, day))
            .cloned()
            .unwrap_or_default())
    }
}

// =============================================================================
// Store wrappers
// =============================================================================

/// 指定广告活动的 upsert 失败，其余调用透传
struct FailingCampaignStore {
    inner: Arc<SeaOrmStorage>,
    failing_campaign: String,
}

#[async_trait]
impl CampaignStatStore for FailingCampaignStore {
    async fn unfetched_tokens(&self, fetched_before: DateTime<Utc>) -> Result<Vec<AdToken>> {
        self.inner.unfetched_tokens(fetched_before).await
    }

    async fn ensure_account(
        &self,
        token_id: i64,
        external_account_id: i64,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        self.inner
            .ensure_account(token_id, external_account_id, display_name, now)
            .await
    }

    async fn mark_token_fetched(&self, token_id: i64, at: DateTime<Utc>) -> Result<()> {
        self.inner.mark_token_fetched(token_id, at).await
    }

    async fn unfetched_accounts(
        &self,
        token_id: i64,
        fetched_before: DateTime<Utc>,
    ) -> Result<Vec<AdAccount>> {
        self.inner.unfetched_accounts(token_id, fetched_before).await
    }

    async fn upsert_campaign_stat(&self, stat: &CampaignStatDay) -> Result<()> {
        if stat.campaign_id == self.failing_campaign {
            return Err(DeeplinkerError::database_operation(format!(
                "Failed to upsert campaign stat {}",
                stat.campaign_id
            )));
        }
        self.inner.upsert_campaign_stat(stat).await
    }

    async fn record_account_result(
        &self,
        external_account_id: i64,
        result: &AccountFetchResult,
    ) -> Result<()> {
        self.inner
            .record_account_result(external_account_id, result)
            .await
    }
}

/// 只统计轮数的空存储
#[derive(Default)]
struct PassCounter {
    passes: AtomicUsize,
}

impl PassCounter {
    fn passes(&self) -> usize {
        self.passes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CampaignStatStore for PassCounter {
    async fn unfetched_tokens(&self, _fetched_before: DateTime<Utc>) -> Result<Vec<AdToken>> {
        self.passes.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn ensure_account(
        &self,
        _token_id: i64,
        _external_account_id: i64,
        _display_name: &str,
        _now: DateTime<Utc>,
    ) -> Result<bool> {
        Ok(false)
    }

    async fn mark_token_fetched(&self, _token_id: i64, _at: DateTime<Utc>) -> Result<()> {
        Ok(())
    }

    async fn unfetched_accounts(
        &self,
        _token_id: i64,
        _fetched_before: DateTime<Utc>,
    ) -> Result<Vec<AdAccount>> {
        Ok(Vec::new())
    }

    async fn upsert_campaign_stat(&self, _stat: &CampaignStatDay) -> Result<()> {
        Ok(())
    }

    async fn record_account_result(
        &self,
        _external_account_id: i64,
        _result: &AccountFetchResult,
    ) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// Pass behaviour
// =============================================================================

#[cfg(test)]
mod pass_tests {
    use super::*;

    #[tokio::test]
    async fn test_no_tokens_is_a_noop() {
        let (storage, _dir) = create_temp_storage().await;
        let provider = Arc::new(MockProvider::default());
        let worker = IngestionWorker::new(storage, provider.clone(), test_worker_config());

        let summary = worker.run_pass(at(6, 15, 12)).await.unwrap();
        assert_eq!(summary.tokens, 0);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_token_without_accounts() {
        let (storage, _dir) = create_temp_storage().await;
        storage.add_ad_token("key-a", 7).await.unwrap();

        let provider = Arc::new(MockProvider::default());
        let worker = IngestionWorker::new(storage.clone(), provider.clone(), test_worker_config());

        let now = at(6, 15, 12);
        let summary = worker.run_pass(now).await.unwrap();
        assert_eq!(summary.tokens, 1);
        assert_eq!(summary.accounts_created, 0);
        assert!(storage.list_ad_accounts().await.unwrap().is_empty());

        // 令牌已标记，下一轮不再处理
        let summary = worker.run_pass(at(6, 15, 13)).await.unwrap();
        assert_eq!(summary.tokens, 0);
    }

    #[tokio::test]
    async fn test_account_disabled_after_empty_streak() {
        let (storage, _dir) = create_temp_storage().await;
        storage.add_ad_token("key-a", 7).await.unwrap();

        let provider = Arc::new(MockProvider::with_accounts(&[(501, "Quiet account")]));
        let worker = IngestionWorker::new(storage.clone(), provider.clone(), test_worker_config());

        let summary = worker.run_pass(at(6, 15, 12)).await.unwrap();
        assert_eq!(summary.accounts_created, 1);
        assert_eq!(summary.accounts_fetched, 1);
        assert_eq!(summary.accounts_disabled, 1);
        assert_eq!(summary.rows_written, 0);

        // 昨天开始逐日向前，第 4 个空日后停止
        assert_eq!(
            provider.calls(),
            vec![
                (501, day(6, 14)),
                (501, day(6, 13)),
                (501, day(6, 12)),
                (501, day(6, 11)),
            ]
        );

        let account = storage.get_ad_account(501).await.unwrap().unwrap();
        assert!(!account.active);
        assert_eq!(account.no_data_streak, 4);

        let summary = worker.run_pass(at(6, 17, 12)).await.unwrap();
        assert_eq!(summary.tokens, 1);
        assert_eq!(summary.accounts_fetched, 0);
        assert_eq!(provider.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_rows_upserted_and_refetch_is_idempotent() {
        let (storage, _dir) = create_temp_storage().await;
        storage.add_ad_token("key-a", 5).await.unwrap();

        let provider = Arc::new(MockProvider::with_accounts(&[(501, "Summer Promo")]));
        provider.set_stats(501, day(6, 13), vec![campaign_stat("c1", 5.0)]);
        provider.set_stats(501, day(6, 12), vec![campaign_stat("c1", 15.0)]);

        let worker = IngestionWorker::new(storage.clone(), provider.clone(), test_worker_config());

        let summary = worker.run_pass(at(6, 15, 12)).await.unwrap();
        assert_eq!(summary.rows_written, 2);
        assert_eq!(summary.accounts_disabled, 0);
        assert_eq!(provider.calls().len(), 5);

        let account = storage.get_ad_account(501).await.unwrap().unwrap();
        assert!(account.active);
        assert_eq!(account.no_data_streak, 2);

        // 平台修正了历史数据，第二轮覆盖而不是新增
        provider.set_stats(501, day(6, 13), vec![campaign_stat("c1", 6.5)]);
        let summary = worker.run_pass(at(6, 16, 13)).await.unwrap();
        assert_eq!(summary.accounts_fetched, 1);
        assert_eq!(summary.rows_written, 2);

        let rows = storage
            .campaign_stats_for_account(501, day(6, 1), day(6, 30))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].stat_date, day(6, 13));
        assert_eq!(rows[0].spend, 6.5);
        assert_eq!(rows[1].spend, 15.0);
    }

    #[tokio::test]
    async fn test_account_not_due_is_skipped() {
        let (storage, _dir) = create_temp_storage().await;
        storage.add_ad_token("key-a", 2).await.unwrap();

        let provider = Arc::new(MockProvider::with_accounts(&[(501, "A")]));
        provider.set_stats(501, day(6, 14), vec![campaign_stat("c1", 1.0)]);
        let worker = IngestionWorker::new(storage.clone(), provider.clone(), test_worker_config());

        worker.run_pass(at(6, 15, 0)).await.unwrap();
        let calls = provider.calls().len();

        // 令牌到期但账户 24 小时内已采集
        let summary = worker.run_pass(at(6, 15, 8)).await.unwrap();
        assert_eq!(summary.tokens, 1);
        assert_eq!(summary.accounts_fetched, 0);
        assert_eq!(provider.calls().len(), calls);
    }

    #[tokio::test]
    async fn test_failing_token_does_not_block_others() {
        let (storage, _dir) = create_temp_storage().await;
        storage.add_ad_token("bad-key", 3).await.unwrap();
        storage.add_ad_token("good-key", 3).await.unwrap();

        let provider = Arc::new(MockProvider::with_accounts(&[(501, "A")]));
        provider.fail_credential("bad-key");
        provider.set_stats(501, day(6, 14), vec![campaign_stat("c1", 1.0)]);

        let worker = IngestionWorker::new(storage.clone(), provider.clone(), test_worker_config());
        let summary = worker.run_pass(at(6, 15, 12)).await.unwrap();

        assert_eq!(summary.tokens, 2);
        assert_eq!(summary.tokens_failed, 1);
        assert_eq!(summary.rows_written, 1);

        // 失败的令牌没有被标记，下一轮会重试
        let summary = worker.run_pass(at(6, 15, 13)).await.unwrap();
        assert_eq!(summary.tokens, 1);
        assert_eq!(summary.tokens_failed, 1);
    }

    #[tokio::test]
    async fn test_zero_account_id_is_ignored() {
        let (storage, _dir) = create_temp_storage().await;
        storage.add_ad_token("key-a", 1).await.unwrap();

        let provider = Arc::new(MockProvider::with_accounts(&[(0, "Broken"), (77, "Real")]));
        let worker = IngestionWorker::new(storage.clone(), provider, test_worker_config());

        let summary = worker.run_pass(at(6, 15, 12)).await.unwrap();
        assert_eq!(summary.accounts_created, 1);

        let accounts = storage.list_ad_accounts().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].external_account_id, 77);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let (storage, _dir) = create_temp_storage().await;
        let token = storage.add_ad_token("key-a", 2).await.unwrap();
        // 之前一轮已经登记过的账户
        storage
            .ensure_account(token.id, 501, "Summer Promo", at(6, 1, 0))
            .await
            .unwrap();

        let provider = Arc::new(MockProvider::with_accounts(&[(501, "Summer Promo"), (502, "B")]));
        provider.set_stats(501, day(6, 14), vec![campaign_stat("c1", 3.0)]);

        let config = WorkerConfig {
            dry_run: true,
            ..test_worker_config()
        };
        let worker = IngestionWorker::new(storage.clone(), provider.clone(), config);

        let summary = worker.run_pass(at(6, 15, 12)).await.unwrap();
        assert_eq!(summary.accounts_created, 0);
        assert_eq!(summary.rows_written, 1);
        assert_eq!(provider.calls().len(), 2);

        // 未新增账户、未写统计、未标记令牌
        assert_eq!(storage.list_ad_accounts().await.unwrap().len(), 1);
        let rows = storage
            .campaign_stats_for_account(501, day(6, 1), day(6, 30))
            .await
            .unwrap();
        assert!(rows.is_empty());
        let account = storage.get_ad_account(501).await.unwrap().unwrap();
        assert_eq!(account.fetched_at, DateTime::<Utc>::UNIX_EPOCH);

        let summary = worker.run_pass(at(6, 15, 13)).await.unwrap();
        assert_eq!(summary.tokens, 1);
    }

    #[tokio::test]
    async fn test_provider_errors_disable_account() {
        let (storage, _dir) = create_temp_storage().await;
        storage.add_ad_token("key-a", 7).await.unwrap();

        let provider = Arc::new(MockProvider::with_accounts(&[(501, "Flaky account")]));
        for d in 8..=14 {
            provider.fail_daily(501, day(6, d));
        }
        let worker = IngestionWorker::new(storage.clone(), provider.clone(), test_worker_config());

        let summary = worker.run_pass(at(6, 15, 12)).await.unwrap();
        assert_eq!(summary.tokens_failed, 0);
        assert_eq!(summary.accounts_fetched, 1);
        assert_eq!(summary.accounts_disabled, 1);
        assert_eq!(summary.rows_written, 0);

        // 请求失败与空日同样计数
        assert_eq!(provider.calls().len(), 4);
        let account = storage.get_ad_account(501).await.unwrap().unwrap();
        assert!(!account.active);
        assert_eq!(account.no_data_streak, 4);
    }

    #[tokio::test]
    async fn test_data_day_resets_error_streak() {
        let (storage, _dir) = create_temp_storage().await;
        storage.add_ad_token("key-a", 5).await.unwrap();

        let provider = Arc::new(MockProvider::with_accounts(&[(501, "A")]));
        provider.fail_daily(501, day(6, 14));
        provider.fail_daily(501, day(6, 13));
        provider.fail_daily(501, day(6, 12));
        provider.set_stats(501, day(6, 11), vec![campaign_stat("c1", 4.0)]);
        provider.fail_daily(501, day(6, 10));
        let worker = IngestionWorker::new(storage.clone(), provider.clone(), test_worker_config());

        let summary = worker.run_pass(at(6, 15, 12)).await.unwrap();
        assert_eq!(summary.accounts_disabled, 0);
        assert_eq!(summary.rows_written, 1);
        assert_eq!(provider.calls().len(), 5);

        // 06-11 有数据，之前的 3 次失败清零，只剩 06-10 一次
        let account = storage.get_ad_account(501).await.unwrap().unwrap();
        assert!(account.active);
        assert_eq!(account.no_data_streak, 1);
    }

    #[tokio::test]
    async fn test_failed_upsert_skips_only_that_row() {
        let (storage, _dir) = create_temp_storage().await;
        storage.add_ad_token("key-a", 2).await.unwrap();

        let provider = Arc::new(MockProvider::with_accounts(&[(501, "A")]));
        for d in [13, 14] {
            provider.set_stats(
                501,
                day(6, d),
                vec![campaign_stat("c1", 1.0), campaign_stat("c2", 2.0)],
            );
        }
        let store = Arc::new(FailingCampaignStore {
            inner: storage.clone(),
            failing_campaign: "c1".to_string(),
        });
        let worker = IngestionWorker::new(store, provider.clone(), test_worker_config());

        let summary = worker.run_pass(at(6, 15, 12)).await.unwrap();
        assert_eq!(summary.rows_written, 2);
        assert_eq!(summary.rows_failed, 2);
        assert_eq!(summary.accounts_disabled, 0);

        let rows = storage
            .campaign_stats_for_account(501, day(6, 1), day(6, 30))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.campaign_id == "c2"));

        // 部分写入失败的日期仍算有数据
        let account = storage.get_ad_account(501).await.unwrap().unwrap();
        assert!(account.active);
        assert_eq!(account.no_data_streak, 0);
    }
}

// =============================================================================
// Single account
// =============================================================================

#[cfg(test)]
mod account_tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_account_reports_outcome() {
        let (storage, _dir) = create_temp_storage().await;
        let token = storage.add_ad_token("key-a", 3).await.unwrap();
        storage
            .ensure_account(token.id, 501, "A", at(6, 1, 0))
            .await
            .unwrap();
        let account = storage.get_ad_account(501).await.unwrap().unwrap();

        let provider = Arc::new(MockProvider::default());
        provider.set_stats(
            501,
            day(6, 13),
            vec![campaign_stat("c1", 1.0), campaign_stat("c2", 2.0)],
        );
        let worker = IngestionWorker::new(storage.clone(), provider, test_worker_config());

        let now = at(6, 15, 12);
        let outcome = worker.fetch_account(&token, &account, now, 3).await;
        assert_eq!(outcome.state, AccountState::NoData);
        assert_eq!(outcome.days_with_data, 1);
        assert_eq!(outcome.rows_written, 2);
        assert_eq!(outcome.rows_failed, 0);

        let account = storage.get_ad_account(501).await.unwrap().unwrap();
        assert!(account.fetched_at >= now);
        assert_eq!(account.no_data_streak, 1);
    }

    #[tokio::test]
    async fn test_fetch_account_counts_failed_rows() {
        let (storage, _dir) = create_temp_storage().await;
        let token = storage.add_ad_token("key-a", 2).await.unwrap();
        storage
            .ensure_account(token.id, 501, "A", at(6, 1, 0))
            .await
            .unwrap();
        let account = storage.get_ad_account(501).await.unwrap().unwrap();

        let provider = Arc::new(MockProvider::default());
        provider.set_stats(
            501,
            day(6, 14),
            vec![campaign_stat("c1", 1.0), campaign_stat("c2", 2.0)],
        );
        provider.set_stats(501, day(6, 13), vec![campaign_stat("c1", 3.0)]);
        let store = Arc::new(FailingCampaignStore {
            inner: storage.clone(),
            failing_campaign: "c1".to_string(),
        });
        let worker = IngestionWorker::new(store, provider, test_worker_config());

        let outcome = worker.fetch_account(&token, &account, at(6, 15, 12), 2).await;
        assert_eq!(outcome.state, AccountState::Fetched);
        assert_eq!(outcome.days_with_data, 2);
        assert_eq!(outcome.rows_written, 1);
        assert_eq!(outcome.rows_failed, 2);
    }
}

// =============================================================================
// Run loop
// =============================================================================

#[cfg(test)]
mod run_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_single_run_stops_after_one_pass() {
        let store = Arc::new(PassCounter::default());
        let worker = IngestionWorker::new(
            store.clone(),
            Arc::new(MockProvider::default()),
            test_worker_config(),
        );

        let (_tx, rx) = watch::channel(false);
        worker.run(rx).await;
        assert_eq!(store.passes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_during_sleep_stops_loop() {
        let store = Arc::new(PassCounter::default());
        let config = WorkerConfig {
            single_run: false,
            pass_interval_secs: 60,
            ..test_worker_config()
        };
        let worker = Arc::new(IngestionWorker::new(
            store.clone(),
            Arc::new(MockProvider::default()),
            config,
        ));

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn({
            let worker = worker.clone();
            async move { worker.run(rx).await }
        });

        // 0s、60s、120s 各一轮，150s 时处于休眠中
        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(store.passes(), 3);

        tx.send(true).unwrap();
        handle.await.unwrap();
        assert_eq!(store.passes(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_before_start_runs_one_pass() {
        let store = Arc::new(PassCounter::default());
        let config = WorkerConfig {
            single_run: false,
            pass_interval_secs: 60,
            ..test_worker_config()
        };
        let worker = IngestionWorker::new(store.clone(), Arc::new(MockProvider::default()), config);

        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        worker.run(rx).await;
        assert_eq!(store.passes(), 1);
    }
}
