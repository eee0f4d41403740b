// 文件系统模块数据类型定义

use serde::Serialize;
use std::path::Path;

/// 文件系统错误码
/// 错误码范围：51001 - 51099
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsErrorCode {
    /// 路径越出根目录被拒绝
    PathRejected = 51001,
    /// 目标不存在
    NotFound = 51002,
    /// 权限不足
    PermissionDenied = 51003,
    /// 目录非空，拒绝删除
    NotEmpty = 51004,
    /// 重命名目标已存在
    Conflict = 51005,
    /// 上传超出大小上限
    TooLarge = 51006,
    /// 新名称格式无效
    InvalidName = 51007,
    /// 禁止对根目录执行该操作
    RootProtected = 51008,
    /// 表单缺少文件字段
    MissingFile = 51009,
    /// 上传目标目录无效
    InvalidTarget = 51010,
    /// 指定路径不是目录
    NotADirectory = 51011,
    /// 请求缺少有效的内容长度
    LengthRequired = 51012,
    /// 其他 IO 错误
    IoError = 51013,
    /// 请求体不是 multipart 表单
    UnsupportedMediaType = 51014,
}

impl FsErrorCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::PathRejected => "路径无效",
            Self::NotFound => "目标不存在",
            Self::PermissionDenied => "没有权限访问该路径",
            Self::NotEmpty => "目录非空，无法删除",
            Self::Conflict => "同名条目已存在",
            Self::TooLarge => "文件超出大小上限",
            Self::InvalidName => "新名称无效，不能为空、包含斜杠或为 . / ..",
            Self::RootProtected => "不能对根目录执行该操作",
            Self::MissingFile => "表单中缺少 file 字段",
            Self::InvalidTarget => "上传目标目录不存在",
            Self::NotADirectory => "指定路径不是目录",
            Self::LengthRequired => "上传请求必须携带有效的 Content-Length",
            Self::IoError => "文件系统操作失败",
            Self::UnsupportedMediaType => "上传必须使用 multipart/form-data 表单",
        }
    }
}

/// 文件系统错误
///
/// `item` 只携带用户已知的相对名称，绝不包含服务器端绝对路径
#[derive(Debug)]
pub struct FsError {
    pub code: FsErrorCode,
    pub message: String,
    pub item: Option<String>,
}

impl FsError {
    pub fn new(code: FsErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            item: None,
        }
    }

    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.item = Some(item.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// 将底层 IO 错误映射为错误码，保留条目名用于用户提示
    pub fn from_io(err: &std::io::Error, item: impl Into<String>) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => FsErrorCode::NotFound,
            std::io::ErrorKind::PermissionDenied => FsErrorCode::PermissionDenied,
            _ => FsErrorCode::IoError,
        };
        Self::new(code).with_item(item)
    }
}

impl std::fmt::Display for FsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref item) = self.item {
            write!(f, "{}: {}", self.message, item)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for FsError {}

/// 条目类型
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// 目录条目
///
/// 每次列目录请求重新生成，不做缓存
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryEntry {
    /// 条目名
    pub name: String,
    /// 条目类型
    pub kind: EntryKind,
    /// 相对根目录的路径
    #[serde(rename = "relPath")]
    pub rel_path: String,
    /// 文件大小（字节，目录为 None）
    #[serde(rename = "sizeBytes", skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// 修改时间（本地时区，DD-MM-YYYY HH:MM）
    #[serde(rename = "modifiedAt", skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    /// 元数据读取失败时为 true，此时大小为 0 且无时间戳
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub inaccessible: bool,
}

/// 根据扩展名推断 Content-Type
pub fn content_type_for_extension(path: &Path) -> &'static str {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e.to_lowercase(),
        None => return "application/octet-stream",
    };
    match ext.as_str() {
        // 图片
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        // 文本
        "txt" | "log" => "text/plain; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        // 文档
        "pdf" => "application/pdf",
        "json" => "application/json",
        "xml" => "application/xml",
        // 音视频
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        // 压缩包
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "7z" => "application/x-7z-compressed",
        "rar" => "application/vnd.rar",
        _ => "application/octet-stream",
    }
}

/// 判断该类型是否内联展示（图片 / 文本 / PDF），否则作为附件下载
pub fn is_inline_type(content_type: &str) -> bool {
    content_type.starts_with("image/")
        || content_type.starts_with("text/")
        || content_type.starts_with("application/pdf")
}
