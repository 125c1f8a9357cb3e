use std::path::Path;

use serde::{Deserialize, Serialize};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 静态配置（从 TOML 加载，启动时使用）
///
/// - database: 数据库连接配置
/// - logging: 日志配置
/// - worker: 广告统计采集 worker
/// - provider: 外部统计接口
/// - report: 报表默认值
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl StaticConfig {
    /// 从 config.toml 和环境变量加载配置
    pub fn load() -> Self {
        Self::load_from(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// 从指定 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > TOML > 默认值
    /// ENV 前缀：DL，分隔符：__
    /// 示例：DL__WORKER__SINGLE_RUN=false
    pub fn load_from(path: &Path) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("DL")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if path.exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path.display());
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> crate::errors::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::errors::DeeplinkerError::serialization(e.to_string()))?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// 采集 worker 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// 实例名称（仅用于日志）
    #[serde(default = "default_worker_name")]
    pub name: String,
    /// true: 执行一轮后退出；false: 按 pass_interval_secs 循环
    #[serde(default = "default_single_run")]
    pub single_run: bool,
    #[serde(default = "default_pass_interval_secs")]
    pub pass_interval_secs: u64,
    /// 每次外部调用前的固定等待（限流）
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_token_refresh_hours")]
    pub token_refresh_hours: i64,
    #[serde(default = "default_account_refresh_hours")]
    pub account_refresh_hours: i64,
    /// 连续无数据天数超过该值时停用账户
    #[serde(default = "default_no_data_threshold")]
    pub no_data_threshold: u32,
    #[serde(default = "default_days_to_fetch")]
    pub default_days_to_fetch: i32,
    /// 只请求外部接口，不写库
    #[serde(default)]
    pub dry_run: bool,
}

/// 外部统计接口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

/// 报表配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// 未指定开始日期时向前回溯的天数
    #[serde(default = "default_range_days")]
    pub default_range_days: i64,
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_database_url() -> String {
    "deeplinker.db".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_worker_name() -> String {
    "deeplinker-worker".to_string()
}

fn default_single_run() -> bool {
    true
}

fn default_pass_interval_secs() -> u64 {
    30
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_token_refresh_hours() -> i64 {
    6
}

fn default_account_refresh_hours() -> i64 {
    24
}

fn default_no_data_threshold() -> u32 {
    3
}

fn default_days_to_fetch() -> i32 {
    7
}

fn default_provider_base_url() -> String {
    "https://fbtool.pro".to_string()
}

fn default_provider_timeout_secs() -> u64 {
    30
}

fn default_range_days() -> i64 {
    30
}

// ============================================================
// Default implementations
// ============================================================

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: default_worker_name(),
            single_run: default_single_run(),
            pass_interval_secs: default_pass_interval_secs(),
            request_delay_ms: default_request_delay_ms(),
            token_refresh_hours: default_token_refresh_hours(),
            account_refresh_hours: default_account_refresh_hours(),
            no_data_threshold: default_no_data_threshold(),
            default_days_to_fetch: default_days_to_fetch(),
            dry_run: false,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_base_url(),
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_range_days: default_range_days(),
        }
    }
}
