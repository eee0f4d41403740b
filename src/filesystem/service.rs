// 驱动器文件服务
//
// 在 ValidatedPath 之上提供目录列表、删除与重命名操作

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use tracing::{info, warn};

use super::resolver::{PathResolver, ValidatedPath};
use super::types::{DirectoryEntry, EntryKind, FsError, FsErrorCode};
use super::upload::UPLOAD_SUFFIX;

/// 驱动器文件服务
///
/// 持有路径解析器与删除策略，所有操作只接受解析器产出的 ValidatedPath
pub struct DriveService {
    resolver: PathResolver,
    allow_delete_non_empty: bool,
}

impl DriveService {
    /// 创建服务，根目录在此处规范化一次
    pub fn new(root: &Path, allow_delete_non_empty: bool) -> std::io::Result<Self> {
        Ok(Self {
            resolver: PathResolver::new(root)?,
            allow_delete_non_empty,
        })
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// 列出目录的直接子条目
    ///
    /// 子条目元数据读取失败时仍然保留该条目并打上 inaccessible 标记，
    /// 单个不可读文件不应使整个列表失败。
    /// 排序：目录在前、文件在后，各自按名称不区分大小写升序，
    /// 折叠后同名时按原始名称稳定排序。
    pub fn list_directory(&self, vp: &ValidatedPath) -> Result<Vec<DirectoryEntry>, FsError> {
        let read_dir = fs::read_dir(vp.abs()).map_err(|e| FsError::from_io(&e, vp.name()))?;

        let mut dirs: Vec<DirectoryEntry> = Vec::new();
        let mut files: Vec<DirectoryEntry> = Vec::new();

        for entry in read_dir {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            let name = entry.file_name().to_string_lossy().to_string();

            // 上传暂存文件只在原子改名后才对外可见，列表中永远过滤
            if name.ends_with(UPLOAD_SUFFIX) {
                continue;
            }

            let rel_path = if vp.rel().is_empty() {
                name.clone()
            } else {
                format!("{}/{}", vp.rel(), name)
            };

            match fs::metadata(entry.path()) {
                Ok(meta) if meta.is_dir() => dirs.push(DirectoryEntry {
                    name,
                    kind: EntryKind::Directory,
                    rel_path,
                    size_bytes: None,
                    modified_at: None,
                    inaccessible: false,
                }),
                Ok(meta) if meta.is_file() => {
                    let modified_at = meta
                        .modified()
                        .ok()
                        .map(|t| DateTime::<Local>::from(t).format("%d-%m-%Y %H:%M").to_string());
                    files.push(DirectoryEntry {
                        name,
                        kind: EntryKind::File,
                        rel_path,
                        size_bytes: Some(meta.len()),
                        modified_at,
                        inaccessible: false,
                    });
                }
                // 既非文件也非目录（套接字等）不列出
                Ok(_) => {}
                Err(_) => files.push(DirectoryEntry {
                    name,
                    kind: EntryKind::File,
                    rel_path,
                    size_bytes: Some(0),
                    modified_at: None,
                    inaccessible: true,
                }),
            }
        }

        sort_entries(&mut dirs);
        sort_entries(&mut files);
        dirs.extend(files);
        Ok(dirs)
    }

    /// 删除条目
    ///
    /// 根目录永远不可删除；非空目录仅在显式开启
    /// `allow_delete_non_empty` 时递归删除，默认拒绝。
    pub fn delete_entry(&self, vp: &ValidatedPath) -> Result<(), FsError> {
        if vp.is_root() {
            return Err(FsError::new(FsErrorCode::RootProtected));
        }

        let meta = match fs::metadata(vp.abs()) {
            Ok(m) => m,
            Err(_) => return Err(FsError::new(FsErrorCode::NotFound).with_item(vp.name())),
        };

        if meta.is_dir() {
            let mut contents = fs::read_dir(vp.abs())
                .map_err(|e| FsError::from_io(&e, vp.name()))?;
            let is_empty = contents.next().is_none();

            if is_empty {
                fs::remove_dir(vp.abs()).map_err(|e| FsError::from_io(&e, vp.name()))?;
                info!("已删除空目录: {}", vp.rel());
            } else if self.allow_delete_non_empty {
                warn!("递归删除非空目录: {}", vp.rel());
                fs::remove_dir_all(vp.abs()).map_err(|e| FsError::from_io(&e, vp.name()))?;
            } else {
                return Err(FsError::new(FsErrorCode::NotEmpty).with_item(vp.name()));
            }
        } else {
            fs::remove_file(vp.abs()).map_err(|e| FsError::from_io(&e, vp.name()))?;
            info!("已删除文件: {}", vp.rel());
        }

        Ok(())
    }

    /// 重命名条目，成功时返回新的相对路径
    ///
    /// 目标已存在时拒绝（Conflict），唯一例外是大小写不敏感文件系统上
    /// 仅大小写不同的自我重命名，该情形必须放行。
    pub fn rename_entry(&self, vp: &ValidatedPath, new_name: &str) -> Result<String, FsError> {
        if vp.is_root() {
            return Err(FsError::new(FsErrorCode::RootProtected));
        }
        if !vp.abs().exists() {
            return Err(FsError::new(FsErrorCode::NotFound).with_item(vp.name()));
        }

        let new_name = new_name.trim();
        if new_name.is_empty()
            || new_name.contains('/')
            || new_name.contains('\\')
            || new_name == "."
            || new_name == ".."
        {
            return Err(FsError::new(FsErrorCode::InvalidName).with_item(new_name));
        }

        let parent = vp
            .abs()
            .parent()
            .ok_or_else(|| FsError::new(FsErrorCode::IoError).with_item(vp.name()))?;
        let dest = parent.join(new_name);

        if dest.exists() {
            let same_ignoring_case = dest.to_string_lossy().to_lowercase()
                == vp.abs().to_string_lossy().to_lowercase();
            // 大小写不敏感文件系统上的同路径改大小写，existence 检查会误报冲突
            if !(same_ignoring_case && dest != vp.abs()) {
                return Err(FsError::new(FsErrorCode::Conflict).with_item(new_name));
            }
        }

        fs::rename(vp.abs(), &dest).map_err(|e| FsError::from_io(&e, vp.name()))?;
        info!("已重命名: {} -> {}", vp.rel(), new_name);

        let new_rel = if vp.parent_rel().is_empty() {
            new_name.to_string()
        } else {
            format!("{}/{}", vp.parent_rel(), new_name)
        };
        Ok(new_rel)
    }
}

/// 名称不区分大小写排序，折叠相同时按原始名称稳定决胜
fn sort_entries(entries: &mut [DirectoryEntry]) {
    entries.sort_by(|a, b| {
        match a.name.to_lowercase().cmp(&b.name.to_lowercase()) {
            Ordering::Equal => a.name.cmp(&b.name),
            other => other,
        }
    });
}
