// Personal Drive Rust Library
// 个人文件网盘服务核心库

// 配置管理模块
pub mod config;

// 本地文件系统模块
pub mod filesystem;

// 日志模块
pub mod logging;

// Web服务器模块
pub mod server;

// 导出常用类型
pub use config::AppConfig;
pub use filesystem::{DirectoryEntry, DriveService, FsError, PathResolver, UploadReceiver};
pub use server::{AppState, AuthGate};
