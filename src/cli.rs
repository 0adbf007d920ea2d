//! 命令行程序共用的初始化逻辑
use crate::{config::Config, error::Result};
use clap::Args;
use log::{debug, error};

/// 两个命令行程序共用的参数，覆盖环境变量中的配置
#[derive(Debug, Clone, Default, Args)]
pub struct CommonArgs {
    /// 模型名称
    #[arg(short, long)]
    pub model: Option<String>,

    /// API 基础 URL
    #[arg(long)]
    pub api_base: Option<String>,

    /// 系统指令
    #[arg(short, long)]
    pub system: Option<String>,

    /// 温度参数
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// 最大生成 token 数
    #[arg(long)]
    pub max_output_tokens: Option<u32>,

    /// 日志详细程度，可重复
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl CommonArgs {
    /// 把命令行参数叠加到配置上
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(api_base) = &self.api_base {
            config = config.with_api_base(api_base.clone());
        }
        if let Some(system) = &self.system {
            config = config.with_system_instruction(system.clone());
        }
        if let Some(temperature) = self.temperature {
            config = config.with_temperature(temperature);
        }
        if let Some(max_output_tokens) = self.max_output_tokens {
            config = config.with_max_output_tokens(max_output_tokens);
        }
        config
    }
}

/// 日志级别，`RUST_LOG` 未设置时使用
pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// 初始化 env_logger，`RUST_LOG` 优先
pub fn init_logging(verbose: u8) {
    let env = env_logger::Env::default().default_filter_or(log_level(verbose));
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// 加载 API 密钥并配置客户端
pub fn api_config() -> Result<Config> {
    let config = Config::from_env()?;
    debug!("Using model {} at {}", config.model(), config.api_base());
    println!("API Key configured.");
    Ok(config)
}

/// 同 [`api_config`]，失败时打印原因并退出进程
pub fn api_config_or_exit() -> Config {
    match api_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration failed: {}", e);
            println!("{}", e);
            std::process::exit(1);
        }
    }
}
