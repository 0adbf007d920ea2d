//! 配置模块
use crate::error::{NanoError, Result};
use crate::types::GenerationConfig;
use nanorand::{Rng, WyRand};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;

// ===============================================================================================
// 配置模块
// ===============================================================================================

/// API 密钥所在的环境变量
pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";
/// 模型名称所在的环境变量
pub const MODEL_VAR: &str = "GEMINI_MODEL";
/// API 基础 URL 所在的环境变量
pub const API_BASE_VAR: &str = "GEMINI_API_BASE";

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini 客户端配置
///
/// 包含所有必要的配置参数，支持 Builder 模式和环境变量配置
#[derive(Debug, Clone)]
pub struct Config {
    /// 模型名称
    pub(crate) model: String,
    /// 系统指令，为空时不发送
    pub(crate) system_instruction: String,
    /// 温度参数 (0.0-2.0)
    pub(crate) temperature: Option<f32>,
    /// Top-p 参数 (0.0-1.0)
    pub(crate) top_p: Option<f32>,
    /// Top-k 参数
    pub(crate) top_k: Option<u32>,
    /// 最大生成 token 数
    pub(crate) max_output_tokens: Option<u32>,
    /// 请求超时时间
    pub(crate) timeout: Duration,
    /// API 基础 URL
    pub(crate) api_base: String,
    /// API 密钥
    pub(crate) api_key: String,
    /// 随机种子
    pub(crate) random_seed: Option<i32>,
    /// 最大并发请求数
    pub(crate) max_concurrent_requests: Option<usize>,
    /// 连接池空闲超时时间
    pub(crate) pool_idle_timeout: Duration,
    /// 每个主机的最大空闲连接数
    pub(crate) pool_max_idle_per_host: usize,
    /// TCP Keepalive
    pub(crate) tcp_keepalive: Duration,
    /// TCP Nodelay
    pub(crate) tcp_nodelay: bool,
}

impl Default for Config {
    /// 创建默认配置
    ///
    /// 使用 `gemini-2.0-flash-lite` 作为默认模型，生成参数交给服务端决定
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            system_instruction: String::new(),
            temperature: None,
            top_p: None,
            top_k: None,
            max_output_tokens: None,
            timeout: Duration::from_secs(60),
            api_base: DEFAULT_API_BASE.into(),
            api_key: String::new(),
            random_seed: None,
            max_concurrent_requests: Some(64),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 16,
            tcp_keepalive: Duration::from_secs(60),
            tcp_nodelay: true,
        }
    }
}

/// 生成 Config Builder 方法的宏
///
/// 自动生成 `with_field_name` 形式的 builder 方法
macro_rules! config_builder {
    ($field:ident, $type:ty) => {
        paste::paste! {
            #[doc = "设置 `"]
            #[doc = stringify!($field)]
            #[doc = "`"]
            pub fn [<with_ $field>](mut self, $field: $type) -> Self {
                self.$field = $field;
                self
            }
        }
    };
    ($field:ident, $type:ty, option) => {
        paste::paste! {
            #[doc = "设置 `"]
            #[doc = stringify!($field)]
            #[doc = "`"]
            pub fn [<with_ $field>](mut self, $field: $type) -> Self {
                self.$field = Some($field);
                self
            }
        }
    };
}

impl Config {
    pub fn model(&self) -> &str { &self.model }
    pub fn system_instruction(&self) -> &str { &self.system_instruction }
    pub fn temperature(&self) -> Option<f32> { self.temperature }
    pub fn top_p(&self) -> Option<f32> { self.top_p }
    pub fn top_k(&self) -> Option<u32> { self.top_k }
    pub fn max_output_tokens(&self) -> Option<u32> { self.max_output_tokens }
    pub fn random_seed(&self) -> Option<i32> { self.random_seed }
    pub fn timeout(&self) -> Duration { self.timeout }
    pub fn api_base(&self) -> &str { &self.api_base }
    pub fn api_key(&self) -> &str { &self.api_key }

    /// 从环境变量和 `.env` 文件加载配置
    ///
    /// 环境变量会覆盖 `.env` 文件中的设置
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// 从指定的 `.env` 文件加载配置，进程环境变量优先
    ///
    /// 不会修改进程环境。
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file_and_vars(path.as_ref(), |key| env::var(key).ok())
    }

    pub(crate) fn from_file_and_vars<F>(path: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_vars = dotenvy::from_path_iter(path)
            .map_err(|e| NanoError::Config(format!("Failed to read {}: {}", path.display(), e)))?
            .collect::<std::result::Result<HashMap<_, _>, _>>()
            .map_err(|e| NanoError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        Self::from_vars(|key| lookup(key).or_else(|| file_vars.get(key).cloned()))
    }

    /// 通过任意查找函数解析配置
    ///
    /// `GOOGLE_API_KEY` 必须存在且非空，`GEMINI_MODEL` 与 `GEMINI_API_BASE` 可选。
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                NanoError::Config(format!(
                    "API key not found. Set the {} environment variable.",
                    API_KEY_VAR
                ))
            })?;

        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let model = non_empty(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_base = non_empty(API_BASE_VAR).unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(Config {
            api_key,
            model,
            api_base,
            ..Default::default()
        })
    }

    /// 转换为请求中的 `generationConfig`，未设置任何参数时返回 `None`
    pub fn generation_config(&self) -> Option<GenerationConfig> {
        let config = GenerationConfig {
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            max_output_tokens: self.max_output_tokens,
            seed: self.random_seed,
            ..Default::default()
        };
        (!config.is_empty()).then_some(config)
    }

    // 使用宏生成 builder 方法
    config_builder!(api_base, String);
    config_builder!(model, String);
    config_builder!(api_key, String);
    config_builder!(system_instruction, String);
    config_builder!(temperature, f32, option);
    config_builder!(top_p, f32, option);
    config_builder!(top_k, u32, option);
    config_builder!(max_output_tokens, u32, option);
    config_builder!(timeout, Duration);
    config_builder!(random_seed, i32, option);
    config_builder!(max_concurrent_requests, usize, option);
    config_builder!(pool_idle_timeout, Duration);
    config_builder!(pool_max_idle_per_host, usize);
    config_builder!(tcp_keepalive, Duration);
    config_builder!(tcp_nodelay, bool);

    /// 自动生成随机种子
    ///
    /// 使用高性能的 WyRand 算法生成非负种子
    pub fn with_random_seed_auto(mut self) -> Self {
        let seed = WyRand::new().generate::<u32>() >> 1;
        self.random_seed = Some(seed as i32);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Tests that the default configuration is created correctly.
    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.model, "gemini-2.0-flash-lite");
        assert_eq!(config.system_instruction, "");
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.api_key, "");
        assert!(config.temperature.is_none());
        assert!(config.random_seed.is_none());
        assert!(config.generation_config().is_none());
    }

    /// Tests the builder methods for setting configuration fields.
    #[test]
    fn test_config_builder_methods() {
        let config = Config::default()
            .with_model("gemini-1.5-pro".to_string())
            .with_api_key("test_key".to_string())
            .with_temperature(0.9)
            .with_random_seed(12345);

        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.api_key, "test_key");
        assert_eq!(config.temperature, Some(0.9));
        assert_eq!(config.random_seed, Some(12345));
    }

    #[test]
    fn test_generation_config_from_builder() {
        let config = Config::default()
            .with_temperature(0.2)
            .with_max_output_tokens(256);
        let generation = config.generation_config().unwrap();
        assert_eq!(generation.temperature, Some(0.2));
        assert_eq!(generation.max_output_tokens, Some(256));
        assert!(generation.top_p.is_none());
    }

    /// Tests that `with_random_seed_auto` sets a non-negative seed.
    #[test]
    fn test_with_random_seed_auto() {
        let config = Config::default().with_random_seed_auto();
        assert!(config.random_seed.is_some_and(|s| s >= 0));
    }

    #[test]
    fn test_from_vars_reads_all_keys() {
        let env = vars(&[
            ("GOOGLE_API_KEY", "env_key"),
            ("GEMINI_MODEL", "gemini-1.5-flash"),
            ("GEMINI_API_BASE", "http://localhost:9000/v1beta"),
        ]);
        let config = Config::from_vars(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.api_key, "env_key");
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.api_base, "http://localhost:9000/v1beta");
    }

    #[test]
    fn test_from_vars_uses_defaults() {
        let env = vars(&[("GOOGLE_API_KEY", "k"), ("GEMINI_MODEL", "  ")]);
        let config = Config::from_vars(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    /// Tests that an error is returned if the API key is not found.
    #[test]
    fn test_from_vars_missing_api_key() {
        let result = Config::from_vars(|_| None);
        match result {
            Err(NanoError::Config(msg)) => assert_eq!(
                msg,
                "API key not found. Set the GOOGLE_API_KEY environment variable."
            ),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_from_vars_blank_api_key_is_missing() {
        let env = vars(&[("GOOGLE_API_KEY", "   ")]);
        let result = Config::from_vars(|k| env.get(k).cloned());
        assert!(matches!(result, Err(NanoError::Config(_))));
    }

    /// Tests loading configuration from a .env file.
    #[test]
    fn test_from_file_and_vars_reads_dotenv_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(".env");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "GOOGLE_API_KEY=dotenv_key").unwrap();
        writeln!(file, "GEMINI_MODEL=dotenv_model").unwrap();

        let config = Config::from_file_and_vars(&file_path, |_| None).unwrap();
        assert_eq!(config.api_key, "dotenv_key");
        assert_eq!(config.model, "dotenv_model");
    }

    /// Tests that environment variables have priority over the .env file.
    #[test]
    fn test_from_file_and_vars_priority() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(".env");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "GOOGLE_API_KEY=dotenv_key").unwrap();
        writeln!(file, "GEMINI_MODEL=dotenv_model").unwrap();

        let env = vars(&[("GOOGLE_API_KEY", "env_var_key")]);
        let config = Config::from_file_and_vars(&file_path, |k| env.get(k).cloned()).unwrap();
        assert_eq!(config.api_key, "env_var_key");
        assert_eq!(config.model, "dotenv_model");
    }

    #[test]
    fn test_from_file_and_vars_missing_file() {
        let dir = tempdir().unwrap();
        let result = Config::from_file_and_vars(&dir.path().join("absent.env"), |_| None);
        assert!(matches!(result, Err(NanoError::Config(_))));
    }
}
