// 应用状态

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::filesystem::{DriveService, UploadReceiver};

/// 应用全局状态
///
/// 配置在启动时固定，组件全部不可变共享
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Arc<AppConfig>,
    /// 驱动器文件服务
    pub drive: Arc<DriveService>,
    /// 上传接收器
    pub uploads: Arc<UploadReceiver>,
}

impl AppState {
    /// 创建新的应用状态
    ///
    /// 确保根目录存在可写，并在此处做唯一一次根目录规范化
    pub fn new(config: AppConfig) -> Result<Self> {
        config.ensure_root_dir().context("根目录检查失败")?;

        let drive = DriveService::new(
            &config.storage.root_dir,
            config.storage.allow_delete_non_empty,
        )
        .with_context(|| format!("初始化文件服务失败: {:?}", config.storage.root_dir))?;

        let uploads = UploadReceiver::new(config.storage.max_upload_size);

        Ok(Self {
            config: Arc::new(config),
            drive: Arc::new(drive),
            uploads: Arc::new(uploads),
        })
    }
}
