//! 广告统计采集 worker
//!
//! 一轮采集：
//! 1. 选出需要刷新的令牌，拉取其账户列表并补齐账户
//! 2. 标记令牌已采集
//! 3. 对需要刷新的账户按日期从近到远逐日拉取统计并 upsert
//!
//! 账户之间串行处理，每次外部调用前固定等待 `request_delay_ms`。

use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Days, Duration, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::provider::StatsProvider;
use super::store::CampaignStatStore;
use super::tracker::{AccountState, AccountTracker};
use crate::config::WorkerConfig;
use crate::errors::Result;
use crate::storage::models::{AccountFetchResult, AdAccount, AdToken};

/// 一轮采集的统计
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PassSummary {
    pub tokens: usize,
    /// 账户列表拉取失败的令牌
    pub tokens_failed: usize,
    pub accounts_created: usize,
    pub accounts_fetched: usize,
    pub accounts_disabled: usize,
    pub rows_written: usize,
    pub rows_failed: usize,
}

/// 单个账户一轮采集的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountOutcome {
    pub state: AccountState,
    pub days_with_data: u32,
    pub rows_written: usize,
    pub rows_failed: usize,
}

pub struct IngestionWorker<S: ?Sized, P: ?Sized> {
    store: Arc<S>,
    provider: Arc<P>,
    config: WorkerConfig,
}

impl<S, P> IngestionWorker<S, P>
where
    S: CampaignStatStore + ?Sized,
    P: StatsProvider + ?Sized,
{
    pub fn new(store: Arc<S>, provider: Arc<P>, config: WorkerConfig) -> Self {
        Self {
            store,
            provider,
            config,
        }
    }

    /// 持续运行，直到单次模式结束或收到关闭信号
    ///
    /// 关闭信号只在两轮之间检查，进行中的一轮会完整结束。
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Ingestion worker '{}' started (single_run={}, dry_run={})",
            self.config.name, self.config.single_run, self.config.dry_run
        );

        loop {
            match self.run_pass(Utc::now()).await {
                Ok(summary) => info!(
                    "Pass finished: tokens={} accounts_fetched={} disabled={} rows={} failed_rows={}",
                    summary.tokens,
                    summary.accounts_fetched,
                    summary.accounts_disabled,
                    summary.rows_written,
                    summary.rows_failed
                ),
                Err(e) => error!("Pass failed: {}", e),
            }

            if self.config.single_run || *shutdown.borrow() {
                break;
            }

            let interval = StdDuration::from_secs(self.config.pass_interval_secs);
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Ingestion worker '{}' stopped", self.config.name);
    }

    /// 执行一轮采集
    ///
    /// 只有读取令牌失败会返回错误；单个令牌或账户的失败记录日志后继续。
    pub async fn run_pass(&self, now: DateTime<Utc>) -> Result<PassSummary> {
        let mut summary = PassSummary::default();
        let token_cutoff = now - Duration::hours(self.config.token_refresh_hours);
        let tokens = self.store.unfetched_tokens(token_cutoff).await?;
        summary.tokens = tokens.len();

        if tokens.is_empty() {
            debug!("No ad tokens due for refresh");
            return Ok(summary);
        }
        info!("Fetching ad statistics for {} tokens", tokens.len());

        for token in &tokens {
            if let Err(e) = self.process_token(token, now, &mut summary).await {
                summary.tokens_failed += 1;
                warn!("Token {} skipped this pass: {}", token.id, e);
            }
        }

        Ok(summary)
    }

    async fn process_token(
        &self,
        token: &AdToken,
        now: DateTime<Utc>,
        summary: &mut PassSummary,
    ) -> Result<()> {
        let accounts = self.provider.list_accounts(&token.token).await?;
        info!("Token {}: provider returned {} accounts", token.id, accounts.len());

        if !self.config.dry_run {
            for account in accounts.iter().filter(|a| a.account_id != 0) {
                match self
                    .store
                    .ensure_account(token.id, account.account_id, &account.display_name, now)
                    .await
                {
                    Ok(true) => summary.accounts_created += 1,
                    Ok(false) => {}
                    Err(e) => error!("Failed to register ad account {}: {}", account.account_id, e),
                }
            }
            self.store.mark_token_fetched(token.id, now).await?;
        }

        let account_cutoff = now - Duration::hours(self.config.account_refresh_hours);
        let due = self.store.unfetched_accounts(token.id, account_cutoff).await?;
        let days_to_fetch = if token.days_to_fetch > 0 {
            token.days_to_fetch
        } else {
            self.config.default_days_to_fetch
        };

        for account in &due {
            let outcome = self
                .fetch_account(token, account, now, days_to_fetch)
                .await;
            summary.accounts_fetched += 1;
            summary.rows_written += outcome.rows_written;
            summary.rows_failed += outcome.rows_failed;
            if outcome.state == AccountState::Disabled {
                summary.accounts_disabled += 1;
            }
        }

        Ok(())
    }

    /// 逐日拉取一个账户的统计：昨天开始，向前 `days_to_fetch` 天
    pub async fn fetch_account(
        &self,
        token: &AdToken,
        account: &AdAccount,
        now: DateTime<Utc>,
        days_to_fetch: i32,
    ) -> AccountOutcome {
        let today = now.date_naive();
        let started = Instant::now();
        let mut tracker = AccountTracker::new(self.config.no_data_threshold);
        let mut rows_written = 0;
        let mut rows_failed = 0;

        for offset in 1..=u64::try_from(days_to_fetch).unwrap_or(0) {
            let Some(day) = today.checked_sub_days(Days::new(offset)) else {
                break;
            };
            if !tracker.begin_day() {
                break;
            }

            if self.config.request_delay_ms > 0 {
                tokio::time::sleep(StdDuration::from_millis(self.config.request_delay_ms)).await;
            }

            match self
                .provider
                .get_daily_stats(&token.token, account.external_account_id, day)
                .await
            {
                Ok(stats) if !stats.is_empty() => {
                    for stat in stats {
                        let row = stat.into_stat_day(account.external_account_id, day);
                        if self.config.dry_run {
                            debug!("[dry-run] {:?}", row);
                            rows_written += 1;
                            continue;
                        }
                        match self.store.upsert_campaign_stat(&row).await {
                            Ok(()) => rows_written += 1,
                            Err(e) => {
                                rows_failed += 1;
                                error!("{}", e);
                            }
                        }
                    }
                    tracker.on_records();
                }
                Ok(_) => {
                    debug!("Account {}: no data for {}", account.external_account_id, day);
                    tracker.on_no_data();
                }
                Err(e) => {
                    warn!(
                        "Account {}: statistics for {} unavailable: {}",
                        account.external_account_id, day, e
                    );
                    tracker.on_no_data();
                }
            }

            if tracker.is_disabled() {
                warn!(
                    "Account {} ({}) disabled after {} consecutive days without data",
                    account.external_account_id,
                    account.display_name,
                    tracker.no_data_streak()
                );
                break;
            }
        }

        let elapsed = started.elapsed();
        let duration_secs = i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX);
        let result = AccountFetchResult {
            finished_at: now + Duration::from_std(elapsed).unwrap_or(Duration::zero()),
            no_data_streak: tracker.no_data_streak(),
            duration_secs,
            disabled: tracker.is_disabled(),
        };

        if !self.config.dry_run
            && let Err(e) = self
                .store
                .record_account_result(account.external_account_id, &result)
                .await
        {
            error!(
                "Failed to record fetch result for account {}: {}",
                account.external_account_id, e
            );
        }

        info!(
            "Account {} fetched: state={} days_with_data={} rows={} duration={}s",
            account.external_account_id,
            tracker.state(),
            tracker.days_with_data(),
            rows_written,
            duration_secs
        );

        AccountOutcome {
            state: tracker.state(),
            days_with_data: tracker.days_with_data(),
            rows_written,
            rows_failed,
        }
    }
}
