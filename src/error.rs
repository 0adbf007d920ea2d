//! 错误处理模块

use crate::types::ApiErrorResponse;
use reqwest::StatusCode;
use thiserror::Error;

/// NanoGemini 库的统一错误类型
///
/// 提供了完整的错误分类，便于上层应用进行精确的错误处理
#[derive(Debug, Error)]
pub enum NanoError {
    /// HTTP 请求相关错误
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    /// JSON 序列化/反序列化错误
    #[error("JSON error: {0}")]
    Json(String),

    /// API 服务端错误
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// 请求超时错误
    #[error("request timed out")]
    Timeout,

    /// 响应内容为空
    #[error("response contained no text")]
    NoContent,

    /// 提示被安全策略拦截
    #[error("prompt was blocked: {0}")]
    Blocked(String),

    /// 流处理相关错误
    #[error("stream error: {0}")]
    StreamError(String),

    /// API 请求频率限制
    #[error("rate limit exceeded: {0}")]
    RateLimit(String),

    /// 身份验证失败
    #[error("authentication failed: {0}")]
    Auth(String),

    /// 指定的模型不存在
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// 请求参数无效
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// 配置相关错误
    #[error("{0}")]
    Config(String),

    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// NanoGemini 库的 Result 类型别名
pub type Result<T> = std::result::Result<T, NanoError>;

impl NanoError {
    /// 根据 HTTP 状态码和响应体构造错误
    ///
    /// 响应体若是 API 的标准错误信封，则取其中的 `message`，否则保留原文。
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ApiErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.trim().to_string());
        let message = if message.is_empty() {
            status.to_string()
        } else {
            message
        };

        match status.as_u16() {
            400 => NanoError::InvalidRequest(message),
            401 | 403 => NanoError::Auth(message),
            404 => NanoError::ModelNotFound(message),
            429 => NanoError::RateLimit(message),
            code => NanoError::Api {
                status: code,
                message,
            },
        }
    }
}

impl From<reqwest::Error> for NanoError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NanoError::Timeout
        } else {
            NanoError::Http(e)
        }
    }
}

impl From<serde_json::Error> for NanoError {
    fn from(e: serde_json::Error) -> Self {
        NanoError::Json(e.to_string())
    }
}
