//! # NanoGemini - 轻量级 Gemini 客户端库
//!
//! NanoGemini 是一个面向 Gemini `generateContent` 接口的轻量级 Rust 客户端库，
//! 附带两个命令行程序：单次文本生成 (`text_generation`) 与交互式对话 (`conversation`)。
//!
//! ## 主要特性
//!
//! - 🚀 **异步支持**：基于 `tokio` 的完全异步实现。
//! - 🔄 **流式响应**：通过 `streamGenerateContent` 实时输出文本。
//! - 💬 **多轮对话**：`ChatSession` 在客户端保存对话历史。
//! - 🔧 **灵活配置**：支持环境变量、`.env` 文件和 Builder 模式。
//! - 🛡️ **错误处理**：按 HTTP 状态码归类的错误类型。
//!
//! ## 快速开始
//!
//! ```rust,no_run
//! use nanogemini::client::LLMClient;
//! use nanogemini::config::Config;
//! use nanogemini::error::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // 从环境变量加载配置 (需要设置 GOOGLE_API_KEY)
//!     let config = Config::from_env()?;
//!     let client = LLMClient::new(config);
//!
//!     let response = client.generate("Write a four-line poem about a curious puppy.").await?;
//!     println!("{}", response);
//!
//!     Ok(())
//! }
//! ```

// 模块定义
pub mod chat;
pub mod cli;
pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod stream;
pub mod types;
pub mod utils;

pub use chat::ChatSession;
pub use client::LLMClient;
pub use config::Config;
pub use error::{NanoError, Result};
pub use types::{Content, GenerateContentResponse, Role};

use futures::future::join_all;
use types::ResponseWithStats;

// ================================================================================================
//  并发工具函数
// ================================================================================================

/// 批量生成文本响应
///
/// 并发处理多个提示，返回所有结果的向量，顺序与输入一致。
/// 并发数受客户端配置中的 `max_concurrent_requests` 限制。
///
/// # 示例
///
/// ```rust,no_run
/// use nanogemini::{batch_generate, Config, LLMClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = LLMClient::new(Config::from_env()?);
///     let prompts = vec!["What is a haiku?", "Name a garden flower."];
///
///     for result in batch_generate(&client, &prompts).await {
///         match result {
///             Ok(response) => println!("{}", response),
///             Err(e) => eprintln!("{}", e),
///         }
///     }
///     Ok(())
/// }
/// ```
pub async fn batch_generate(client: &LLMClient, prompts: &[&str]) -> Vec<Result<String>> {
    let futures = prompts.iter().map(|p| client.generate(p)).collect::<Vec<_>>();
    join_all(futures).await
}

/// 批量生成文本响应（带统计信息）
pub async fn batch_generate_with_stats(
    client: &LLMClient,
    prompts: &[&str],
) -> Vec<Result<ResponseWithStats>> {
    let futures = prompts
        .iter()
        .map(|p| client.generate_with_stats(p))
        .collect::<Vec<_>>();
    join_all(futures).await
}
