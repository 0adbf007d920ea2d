//! Gemini 客户端核心模块
use crate::{
    chat::ChatSession,
    config::Config,
    error::{NanoError, Result},
    stream::{StreamWrapper, TextStream},
    types::{
        Content, GenerateContentRequest, GenerateContentResponse, RequestStats,
        ResponseWithStats,
    },
    utils::prepare_system_instruction,
};
use futures::{StreamExt, stream::BoxStream};
use log::{debug, error, warn};
use reqwest::{
    Client, RequestBuilder, Response,
    header::{CONTENT_TYPE, HeaderMap, HeaderValue},
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

// ================================================================================================
// 核心客户端模块
// ================================================================================================

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini 客户端
///
/// 提供与 Gemini `generateContent` 接口交互的核心功能，支持普通和流式请求
#[derive(Debug, Clone)]
pub struct LLMClient {
    client: Arc<Client>,
    config: Arc<Config>,
    semaphore: Arc<Semaphore>,
    stream_handler: StreamWrapper,
}

impl LLMClient {
    /// 创建一个新的 `LLMClient` 实例
    pub fn new(config: Config) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .tcp_keepalive(config.tcp_keepalive)
            .tcp_nodelay(config.tcp_nodelay)
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|e| {
                error!("Failed to build reqwest client: {}", e);
                Client::new()
            });

        let semaphore = Semaphore::new(config.max_concurrent_requests.unwrap_or(64));

        Self {
            client: Arc::new(client),
            config: Arc::new(config),
            semaphore: Arc::new(semaphore),
            stream_handler: StreamWrapper::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 构建 API 请求所需的 HTTP 标头
    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_str(&self.config.api_key)
                .map_err(|e| NanoError::InvalidRequest(format!("Invalid API key: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.model,
            method
        )
    }

    /// 组装请求体，附加配置中的系统指令和生成参数
    pub(crate) fn build_request(&self, contents: &[Content]) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: contents.to_vec(),
            system_instruction: prepare_system_instruction(&self.config.system_instruction),
            generation_config: self.config.generation_config(),
        }
    }

    /// 发送 HTTP 请求，非 2xx 响应按状态码归类为错误
    async fn call_api(&self, request_builder: RequestBuilder) -> Result<Response> {
        let permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| NanoError::Api {
                status: 0,
                message: format!("Semaphore acquisition failed: {}", e),
            })?;

        let response_result = request_builder.send().await;
        drop(permit);

        let response = response_result?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!("Request failed with status {}: {}", status, body);
            Err(NanoError::from_status(status, &body))
        }
    }

    /// 以完整的对话内容调用 `generateContent`
    pub async fn generate_content(&self, contents: &[Content]) -> Result<GenerateContentResponse> {
        let endpoint = self.endpoint("generateContent");
        debug!("POST {}", endpoint);
        let headers = self.build_headers()?;
        let body = self.build_request(contents);
        let request_builder = self.client.post(&endpoint).headers(headers).json(&body);

        let response = self.call_api(request_builder).await?;
        let response = response.json::<GenerateContentResponse>().await?;
        if let Some(reason) = response.block_reason() {
            warn!("Prompt blocked by the API: {}", reason);
        }
        Ok(response)
    }

    /// 为给定的提示生成响应
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_stats(prompt)
            .await
            .map(|res| res.content)
    }

    /// 为给定的提示生成响应，包括性能统计信息
    pub async fn generate_with_stats(&self, prompt: &str) -> Result<ResponseWithStats> {
        let start_time = Instant::now();
        let response = self.generate_content(&[Content::user(prompt)]).await?;
        let content = response_text(&response)?;

        let usage = response.usage_metadata.unwrap_or_default();
        let stats = RequestStats {
            duration_ms: start_time.elapsed().as_millis() as u64,
            prompt_tokens: usage.prompt_token_count,
            completion_tokens: usage.candidates_token_count,
            total_tokens: usage.total_token_count,
            model: response
                .model_version
                .unwrap_or_else(|| self.config.model.clone()),
            timestamp: Some(std::time::SystemTime::now()),
        };

        Ok(ResponseWithStats { content, stats })
    }

    /// 为给定的提示生成流式响应
    pub async fn stream_generate(&self, prompt: &str) -> Result<TextStream> {
        self.stream_contents(&[Content::user(prompt)]).await
    }

    /// 以完整的对话内容调用 `streamGenerateContent`，逐块产出文本
    pub async fn stream_contents(&self, contents: &[Content]) -> Result<TextStream> {
        let stream = self.stream_responses(contents).await?;
        Ok(TextStream::new(stream.filter_map(|res| async move {
            match res {
                Ok(chunk) => match (chunk.text(), chunk.block_reason()) {
                    (Some(text), _) => Some(Ok(text)),
                    (None, Some(reason)) => Some(Err(NanoError::Blocked(reason.to_string()))),
                    (None, None) => None,
                },
                Err(e) => Some(Err(e)),
            }
        })))
    }

    async fn stream_responses(
        &self,
        contents: &[Content],
    ) -> Result<BoxStream<'static, Result<GenerateContentResponse>>> {
        let endpoint = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        debug!("POST {}", endpoint);
        let mut headers = self.build_headers()?;
        headers.insert("Accept", HeaderValue::from_static("text/event-stream"));

        let body = self.build_request(contents);
        let request_builder = self.client.post(&endpoint).headers(headers).json(&body);
        let response = self.call_api(request_builder).await?;

        Ok(self
            .stream_handler
            .stream(response.bytes_stream().boxed())
            .boxed())
    }

    /// 以给定历史开始一个对话
    pub fn start_chat(&self, history: Vec<Content>) -> ChatSession {
        ChatSession::new(self.clone(), history)
    }
}

/// 取出回复文本；提示被拦截时返回 `Blocked`，没有文本时返回 `NoContent`
pub(crate) fn response_text(response: &GenerateContentResponse) -> Result<String> {
    if let Some(text) = response.text() {
        return Ok(text);
    }
    match response.block_reason() {
        Some(reason) => Err(NanoError::Blocked(reason.to_string())),
        None => Err(NanoError::NoContent),
    }
}
