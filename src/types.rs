//! API 数据结构模块

use serde::{Deserialize, Serialize};

// ================================================================================================
// API 请求结构
// ================================================================================================

/// 对话中的一轮内容
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Content {
    /// 角色，系统指令中可省略
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// 内容片段
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// 用户轮次
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some(Role::User),
            parts: vec![Part::text(text)],
        }
    }

    /// 模型轮次
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Some(Role::Model),
            parts: vec![Part::text(text)],
        }
    }

    /// 拼接所有文本片段，没有文本时返回 `None`
    pub fn text(&self) -> Option<String> {
        crate::utils::join_text(&self.parts)
    }
}

/// 内容片段，目前只处理文本
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// 角色枚举
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 用户
    #[default]
    User,
    /// 模型
    Model,
}

/// 生成参数
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_count: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i32>,
}

impl GenerationConfig {
    /// 所有字段均未设置
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// `generateContent` 请求体
#[derive(Debug, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

// ================================================================================================
// API 响应结构
// ================================================================================================

/// `generateContent` 响应体，流式接口的每个事件也是这个结构
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// 候选回复
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// 提示反馈，提示被拦截时出现
    pub prompt_feedback: Option<PromptFeedback>,
    /// token 使用情况
    pub usage_metadata: Option<UsageMetadata>,
    /// 实际使用的模型版本
    pub model_version: Option<String>,
}

impl GenerateContentResponse {
    /// 第一个候选回复的文本
    pub fn text(&self) -> Option<String> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(Content::text)
    }

    /// 提示被拦截的原因
    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
    }
}

/// 候选回复
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
    pub index: Option<u32>,
}

/// 提示反馈
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

/// token 使用情况
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
    pub total_token_count: Option<u32>,
}

/// API 错误信封 `{"error": {...}}`
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

// ================================================================================================
// 应用内部数据模型
// ================================================================================================

/// 请求统计信息
///
/// 记录 API 请求的详细统计数据，用于性能监控和分析
#[derive(Debug, Clone, Default)]
pub struct RequestStats {
    /// 请求耗时（毫秒）
    pub duration_ms: u64,
    /// 输入 token 数量
    pub prompt_tokens: Option<u32>,
    /// 输出 token 数量
    pub completion_tokens: Option<u32>,
    /// 总 token 数量
    pub total_tokens: Option<u32>,
    /// 使用的模型名称
    pub model: String,
    /// 请求时间戳
    pub timestamp: Option<std::time::SystemTime>,
}

/// 带统计信息的响应结果
#[derive(Debug)]
pub struct ResponseWithStats {
    /// 生成的文本内容
    pub content: String,
    /// 请求统计信息
    pub stats: RequestStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serializes_camel_case() {
        let request = GenerateContentRequest {
            contents: vec![Content::user("Hi")],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::text("Be brief.")],
            }),
            generation_config: Some(GenerationConfig {
                temperature: Some(0.5),
                max_output_tokens: Some(64),
                ..Default::default()
            }),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{"role": "user", "parts": [{"text": "Hi"}]}],
                "systemInstruction": {"parts": [{"text": "Be brief."}]},
                "generationConfig": {"temperature": 0.5, "maxOutputTokens": 64}
            })
        );
    }

    #[test]
    fn test_response_text_joins_parts_of_first_candidate() {
        let body = json!({
            "candidates": [
                {
                    "content": {"role": "model", "parts": [{"text": "A pup "}, {"text": "sniffs."}]},
                    "finishReason": "STOP",
                    "index": 0
                },
                {
                    "content": {"role": "model", "parts": [{"text": "ignored"}]}
                }
            ],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 4, "totalTokenCount": 16},
            "modelVersion": "gemini-2.0-flash-lite"
        });

        let response: GenerateContentResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.text().as_deref(), Some("A pup sniffs."));
        assert_eq!(response.usage_metadata.unwrap().total_token_count, Some(16));
        assert_eq!(response.candidates[0].finish_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn test_blocked_response_has_no_text() {
        let body = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let response: GenerateContentResponse = serde_json::from_value(body).unwrap();
        assert!(response.text().is_none());
        assert_eq!(response.block_reason(), Some("SAFETY"));
    }

    #[test]
    fn test_candidate_without_content() {
        let body = json!({"candidates": [{"finishReason": "SAFETY"}]});
        let response: GenerateContentResponse = serde_json::from_value(body).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_generation_config_is_empty() {
        assert!(GenerationConfig::default().is_empty());
        let config = GenerationConfig {
            top_k: Some(3),
            ..Default::default()
        };
        assert!(!config.is_empty());
    }
}
