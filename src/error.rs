use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("API 请求失败: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("JSON 解析错误: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP 状态错误 [{status}]: {url}")]
    HttpStatus { status: StatusCode, url: String },

    #[error("配置错误: {0}")]
    ConfigError(String),
}

impl BotError {
    /// 认证失败（令牌或会话过期），重试不会自行恢复
    pub fn is_auth_failure(&self) -> bool {
        let status = match self {
            BotError::HttpStatus { status, .. } => Some(*status),
            BotError::ApiError(e) => e.status(),
            _ => None,
        };
        matches!(status, Some(s) if s == StatusCode::UNAUTHORIZED || s == StatusCode::FORBIDDEN)
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
