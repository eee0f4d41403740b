// 配置管理模块

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 应用配置
///
/// 启动时加载一次，此后作为不可变配置显式注入各组件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,
    /// 认证配置
    #[serde(default)]
    pub auth: AuthConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            auth: AuthConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 对外暴露的唯一根目录
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
    /// 单次上传大小上限（字节，默认 100 MiB）
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
    /// 是否允许递归删除非空目录
    ///
    /// 删除不可恢复，默认关闭，必须显式开启
    #[serde(default)]
    pub allow_delete_non_empty: bool,
}

fn default_root_dir() -> PathBuf {
    PathBuf::from("./drive")
}

fn default_max_upload_size() -> u64 {
    100 * 1024 * 1024 // 100 MiB
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            max_upload_size: default_max_upload_size(),
            allow_delete_non_empty: false,
        }
    }
}

/// 认证配置（单组共享凭证）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// 用户名
    #[serde(default = "default_username")]
    pub username: String,
    /// 密码
    #[serde(default)]
    pub password: String,
    /// Basic 认证领域名
    #[serde(default = "default_realm")]
    pub realm: String,
}

fn default_username() -> String {
    "username".to_string()
}

fn default_realm() -> String {
    "My Private Drive".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: String::new(),
            realm: default_realm(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 是否启用日志文件持久化
    #[serde(default = "default_log_enabled")]
    pub enabled: bool,
    /// 日志文件保存目录
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// 日志保留天数（默认 7 天）
    #[serde(default = "default_log_retention_days")]
    pub retention_days: u32,
    /// 日志级别（默认 info）
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_enabled() -> bool {
    true
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_retention_days() -> u32 {
    7
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: default_log_enabled(),
            log_dir: default_log_dir(),
            retention_days: default_log_retention_days(),
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// 从文件加载配置
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {:?}", path))?;
        let config: AppConfig =
            toml::from_str(&content).with_context(|| format!("解析配置文件失败: {:?}", path))?;
        Ok(config)
    }

    /// 加载配置，文件缺失或无效时回退到默认值，随后应用环境变量覆盖
    pub fn load_or_default(path: &Path) -> Self {
        let mut config = match Self::load_from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("使用默认配置（{:#}）", e);
                Self::default()
            }
        };
        config.apply_env_overrides();
        config
    }

    /// 环境变量覆盖，便于容器化部署
    ///
    /// DRIVE_ROOT / DRIVE_PORT / DRIVE_USERNAME / DRIVE_PASSWORD
    pub fn apply_env_overrides(&mut self) {
        if let Ok(root) = std::env::var("DRIVE_ROOT") {
            if !root.is_empty() {
                self.storage.root_dir = PathBuf::from(root);
            }
        }
        if let Ok(port) = std::env::var("DRIVE_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(username) = std::env::var("DRIVE_USERNAME") {
            if !username.is_empty() {
                self.auth.username = username;
            }
        }
        if let Ok(password) = std::env::var("DRIVE_PASSWORD") {
            self.auth.password = password;
        }
    }

    /// 确保根目录存在并可写
    ///
    /// 不存在时自动创建；可写性通过创建探测文件验证
    pub fn ensure_root_dir(&self) -> Result<()> {
        let root = &self.storage.root_dir;
        if !root.exists() {
            fs::create_dir_all(root).with_context(|| format!("无法创建根目录: {:?}", root))?;
            tracing::info!("已创建根目录: {:?}", root);
        }
        if !root.is_dir() {
            anyhow::bail!("根目录不是目录: {:?}", root);
        }

        let probe = root.join(".write_test");
        match fs::File::create(&probe) {
            Ok(_) => {
                let _ = fs::remove_file(&probe);
                Ok(())
            }
            Err(e) => {
                anyhow::bail!("根目录不可写: {:?}: {}", root, e);
            }
        }
    }
}
