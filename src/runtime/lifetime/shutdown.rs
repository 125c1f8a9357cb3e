use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

/// 监听 Ctrl+C，收到后把通道置为 true
///
/// worker 只在两轮采集之间检查该信号。
pub fn shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, finishing current pass...");
                let _ = tx.send(true);
            }
            Err(e) => {
                warn!("Failed to listen for Ctrl+C: {}. Worker will run until killed.", e);
                // 保持 sender 存活，避免接收端把关闭通道当作关闭信号
                tx.closed().await;
            }
        }
    });

    rx
}
