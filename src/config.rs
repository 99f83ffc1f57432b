//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `GENUI__*` 覆盖（双下划线表示嵌套，如 `GENUI__RETRY__MAX_RETRIES=5`）。

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub generation: GenerationSection,
    pub retry: RetrySection,
    pub sandbox: SandboxSection,
}

/// [generation] 段：后端选择、服务地址、超时
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationSection {
    /// 后端：http / mock
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// 单次请求超时（秒）
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            timeout_secs: default_request_timeout(),
        }
    }
}

fn default_provider() -> String {
    "http".to_string()
}

fn default_base_url() -> String {
    crate::generation::DEFAULT_BASE_URL.to_string()
}

fn default_api_prefix() -> String {
    crate::generation::DEFAULT_API_PREFIX.to_string()
}

fn default_request_timeout() -> u64 {
    60
}

/// [retry] 段：渲染失败后的自动重试次数与间隔
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// 两次自动重试之间的固定等待（毫秒）
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

impl RetrySection {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// [sandbox] 段：渲染沉降窗口与外部求值命令
#[derive(Debug, Clone, Deserialize)]
pub struct SandboxSection {
    /// 挂载后等待错误上报的时间（毫秒），期间无错误即视为渲染成功
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// 外部求值程序，未设置时使用 NullSandbox
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_sandbox_timeout")]
    pub timeout_secs: u64,
}

impl Default for SandboxSection {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            command: None,
            args: Vec::new(),
            timeout_secs: default_sandbox_timeout(),
        }
    }
}

fn default_settle_ms() -> u64 {
    1500
}

fn default_sandbox_timeout() -> u64 {
    10
}

impl SandboxSection {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// 从 config 目录加载配置，环境变量 GENUI__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 GENUI__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("GENUI")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
