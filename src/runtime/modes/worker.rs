//! Worker mode

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::get_config;
use crate::ingest::{AdReportClient, IngestionWorker};
use crate::runtime::lifetime;

/// 运行采集 worker
///
/// `once` / `dry_run` 为 true 时覆盖配置文件中的对应项。
pub async fn run_worker(once: bool, dry_run: bool) -> Result<()> {
    let config = get_config();
    let ctx = lifetime::startup::prepare_startup().await?;

    let mut worker_config = config.worker.clone();
    worker_config.single_run |= once;
    worker_config.dry_run |= dry_run;

    let provider = Arc::new(AdReportClient::new(&config.provider));
    info!("Ad statistics provider: {}", config.provider.base_url);

    let worker = IngestionWorker::new(ctx.storage, provider, worker_config);
    let shutdown = lifetime::shutdown::shutdown_signal();
    worker.run(shutdown).await;

    Ok(())
}
