use std::fmt;

/// Sonar Chat 项目的统一错误类型
#[derive(Debug)]
pub enum ChatError {
    /// 启动时缺少 API 凭证（致命，服务拒绝启动）
    MissingCredential,
    /// 输入校验错误（不改变任何状态）
    Validation(ValidationError),
    /// 上游补全 API 错误
    Provider(ProviderError),
    /// 会话导出错误
    Persistence(PersistenceError),
    /// 服务配置错误
    Config(ConfigError),
    /// 调用方取消了进行中的请求
    Cancelled,
}

/// 上游补全 API 相关错误
#[derive(Debug)]
pub enum ProviderError {
    /// 网络请求失败
    Network(String),
    /// API 返回错误状态码
    Api { status: u16, message: String },
    /// 响应格式无效
    InvalidResponse(String),
    /// choices 为空，没有返回内容
    EmptyResponse,
}

/// 输入校验错误
#[derive(Debug)]
pub enum ValidationError {
    /// 消息为空或仅含空白字符
    EmptyMessage,
    /// 配置更新中存在非法字段（整个更新被拒绝）
    InvalidFields(Vec<FieldError>),
}

/// 单个配置字段的校验失败信息
#[derive(Debug, Clone)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// 会话导出错误
#[derive(Debug)]
pub enum PersistenceError {
    /// 文件写入/读取失败
    Io(String),
    /// 序列化失败
    Serialization(String),
}

/// 服务配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),
    /// 配置解析失败
    ParseFailed(String),
}

// 实现 Display trait
impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::MissingCredential => {
                write!(f, "PERPLEXITY_API_KEY not set; refusing to start")
            }
            ChatError::Validation(e) => write!(f, "Validation error: {}", e),
            ChatError::Provider(e) => write!(f, "Provider error: {}", e),
            ChatError::Persistence(e) => write!(f, "Persistence error: {}", e),
            ChatError::Config(e) => write!(f, "Config error: {}", e),
            ChatError::Cancelled => write!(f, "Request cancelled by caller"),
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Network(msg) => write!(f, "Network error: {}", msg),
            ProviderError::Api { status, message } => {
                write!(f, "API error (status {}): {}", status, message)
            }
            ProviderError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            ProviderError::EmptyResponse => write!(f, "Empty response from provider"),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyMessage => write!(f, "Message is empty"),
            ValidationError::InvalidFields(errors) => {
                let details: Vec<String> = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect();
                write!(f, "Invalid config fields: {}", details.join("; "))
            }
        }
    }
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Io(msg) => write!(f, "IO error: {}", msg),
            PersistenceError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseFailed(msg) => write!(f, "Failed to parse config: {}", msg),
        }
    }
}

// 实现 std::error::Error trait
impl std::error::Error for ChatError {}
impl std::error::Error for ProviderError {}
impl std::error::Error for ValidationError {}
impl std::error::Error for PersistenceError {}
impl std::error::Error for ConfigError {}

// From 转换实现
impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChatError::Provider(ProviderError::Network("Request timeout".to_string()))
        } else if err.is_connect() {
            ChatError::Provider(ProviderError::Network(format!("Connection failed: {}", err)))
        } else {
            ChatError::Provider(ProviderError::Network(err.to_string()))
        }
    }
}

impl From<serde_yaml::Error> for ChatError {
    fn from(err: serde_yaml::Error) -> Self {
        ChatError::Config(ConfigError::ParseFailed(err.to_string()))
    }
}

impl From<ProviderError> for ChatError {
    fn from(err: ProviderError) -> Self {
        ChatError::Provider(err)
    }
}

impl From<ValidationError> for ChatError {
    fn from(err: ValidationError) -> Self {
        ChatError::Validation(err)
    }
}

impl From<PersistenceError> for ChatError {
    fn from(err: PersistenceError) -> Self {
        ChatError::Persistence(err)
    }
}

impl From<ConfigError> for ChatError {
    fn from(err: ConfigError) -> Self {
        ChatError::Config(err)
    }
}

// 便捷的 Result 类型别名
pub type Result<T> = std::result::Result<T, ChatError>;
