use std::fmt;

#[derive(Debug, Clone)]
pub enum DeeplinkerError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    Serialization(String),
    DateParse(String),
    ProviderRequest(String),
    ProviderPayload(String),
}

impl DeeplinkerError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            DeeplinkerError::DatabaseConfig(_) => "E001",
            DeeplinkerError::DatabaseConnection(_) => "E002",
            DeeplinkerError::DatabaseOperation(_) => "E003",
            DeeplinkerError::FileOperation(_) => "E004",
            DeeplinkerError::Validation(_) => "E005",
            DeeplinkerError::NotFound(_) => "E006",
            DeeplinkerError::Serialization(_) => "E007",
            DeeplinkerError::DateParse(_) => "E008",
            DeeplinkerError::ProviderRequest(_) => "E009",
            DeeplinkerError::ProviderPayload(_) => "E010",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            DeeplinkerError::DatabaseConfig(_) => "Database Configuration Error",
            DeeplinkerError::DatabaseConnection(_) => "Database Connection Error",
            DeeplinkerError::DatabaseOperation(_) => "Database Operation Error",
            DeeplinkerError::FileOperation(_) => "File Operation Error",
            DeeplinkerError::Validation(_) => "Validation Error",
            DeeplinkerError::NotFound(_) => "Resource Not Found",
            DeeplinkerError::Serialization(_) => "Serialization Error",
            DeeplinkerError::DateParse(_) => "Date Parse Error",
            DeeplinkerError::ProviderRequest(_) => "Stats Provider Request Error",
            DeeplinkerError::ProviderPayload(_) => "Stats Provider Payload Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            DeeplinkerError::DatabaseConfig(msg)
            | DeeplinkerError::DatabaseConnection(msg)
            | DeeplinkerError::DatabaseOperation(msg)
            | DeeplinkerError::FileOperation(msg)
            | DeeplinkerError::Validation(msg)
            | DeeplinkerError::NotFound(msg)
            | DeeplinkerError::Serialization(msg)
            | DeeplinkerError::DateParse(msg)
            | DeeplinkerError::ProviderRequest(msg)
            | DeeplinkerError::ProviderPayload(msg) => msg,
        }
    }

    /// 外部统计接口的错误（采集时按"无数据"处理）
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            DeeplinkerError::ProviderRequest(_) | DeeplinkerError::ProviderPayload(_)
        )
    }

    /// 格式化为彩色输出（用于终端）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于日志）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for DeeplinkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for DeeplinkerError {}

// 便捷的构造函数
impl DeeplinkerError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        DeeplinkerError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        DeeplinkerError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        DeeplinkerError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        DeeplinkerError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        DeeplinkerError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        DeeplinkerError::NotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        DeeplinkerError::Serialization(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        DeeplinkerError::DateParse(msg.into())
    }

    pub fn provider_request<T: Into<String>>(msg: T) -> Self {
        DeeplinkerError::ProviderRequest(msg.into())
    }

    pub fn provider_payload<T: Into<String>>(msg: T) -> Self {
        DeeplinkerError::ProviderPayload(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for DeeplinkerError {
    fn from(err: sea_orm::DbErr) -> Self {
        DeeplinkerError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for DeeplinkerError {
    fn from(err: std::io::Error) -> Self {
        DeeplinkerError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for DeeplinkerError {
    fn from(err: serde_json::Error) -> Self {
        DeeplinkerError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for DeeplinkerError {
    fn from(err: chrono::ParseError) -> Self {
        DeeplinkerError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DeeplinkerError>;
