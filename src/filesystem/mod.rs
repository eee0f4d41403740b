// 文件系统核心模块
//
// 路径安全与文件系统变更的核心：解析、列目录、上传、删除、重命名

pub mod resolver;
pub mod service;
pub mod types;
pub mod upload;

pub use resolver::{PathResolver, ValidatedPath};
pub use service::DriveService;
pub use types::{
    content_type_for_extension, is_inline_type, DirectoryEntry, EntryKind, FsError, FsErrorCode,
};
pub use upload::{UploadReceiver, UploadTransaction, UPLOAD_SUFFIX};
