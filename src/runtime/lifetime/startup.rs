use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::storage::{SeaOrmStorage, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
}

/// 连接数据库并执行迁移
pub async fn prepare_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let storage = StorageFactory::create()
        .await
        .context("Failed to initialize storage")?;

    info!(
        "Using {} storage, ready in {} ms",
        storage.backend_name(),
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext { storage })
}
