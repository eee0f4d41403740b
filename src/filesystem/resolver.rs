// 路径解析器
//
// 将客户端提交的不可信路径字符串解析为限制在根目录内的绝对路径，
// 防止路径穿越攻击。所有文件系统操作只接受 ValidatedPath。

use std::path::{Component, Path, PathBuf};

use super::types::{FsError, FsErrorCode};

/// 经过校验的路径
///
/// 只能由 [`PathResolver::resolve`] 构造，保证绝对路径等于根目录
/// 或是根目录的后代。字段私有，其他模块无法伪造可信路径。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPath {
    abs: PathBuf,
    rel: String,
}

impl ValidatedPath {
    /// 系统绝对路径
    pub fn abs(&self) -> &Path {
        &self.abs
    }

    /// 规范化后的相对路径（根目录为空串，段之间以 / 分隔）
    pub fn rel(&self) -> &str {
        &self.rel
    }

    /// 是否指向根目录本身
    pub fn is_root(&self) -> bool {
        self.rel.is_empty()
    }

    /// 最后一段名称（根目录为空串）
    pub fn name(&self) -> &str {
        self.rel.rsplit('/').next().unwrap_or("")
    }

    /// 父目录的相对路径（根目录或一级条目为空串）
    pub fn parent_rel(&self) -> &str {
        match self.rel.rfind('/') {
            Some(idx) => &self.rel[..idx],
            None => "",
        }
    }
}

/// 路径解析器
///
/// 持有进程生命周期内不变的根目录，对每个请求中的不可信路径
/// 执行一次解码、归一化与前缀校验。
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// 创建解析器，根目录必须已存在（启动时规范化一次）
    pub fn new(root: &Path) -> std::io::Result<Self> {
        let root = dunce::canonicalize(root)?;
        Ok(Self { root })
    }

    /// 根目录绝对路径
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 解析不可信路径
    ///
    /// 步骤：URL 解码 → 去掉单个前导分隔符 → 逐段折叠 `.` 与 `..` →
    /// 拼接到根目录 → 按完整路径段做前缀校验。
    /// 空路径是唯一的隐式成功情形，直接映射为根目录本身。
    pub fn resolve(&self, raw: Option<&str>) -> Result<ValidatedPath, FsError> {
        let raw = match raw {
            None => return Ok(self.root_path()),
            Some(r) if r.is_empty() || r == "/" => return Ok(self.root_path()),
            Some(r) => r,
        };

        let decoded = match urlencoding::decode(raw) {
            Ok(d) => d,
            Err(_) => return Err(self.reject(raw)),
        };
        let trimmed = decoded.strip_prefix('/').unwrap_or(&decoded);

        // 逐段归一化：`..` 越出根目录即拒绝，绝对路径注入即拒绝
        let mut segments: Vec<&str> = Vec::new();
        for comp in Path::new(trimmed).components() {
            match comp {
                Component::Normal(seg) => match seg.to_str() {
                    Some(s) => segments.push(s),
                    None => return Err(self.reject(raw)),
                },
                Component::CurDir => {}
                Component::ParentDir => {
                    if segments.pop().is_none() {
                        return Err(self.reject(raw));
                    }
                }
                Component::RootDir | Component::Prefix(_) => return Err(self.reject(raw)),
            }
        }

        let rel = segments.join("/");
        let abs = if rel.is_empty() {
            self.root.clone()
        } else {
            self.root.join(&rel)
        };

        // 按完整路径段比较前缀，兄弟目录（如 Root2）不会误判为后代
        if abs != self.root && !abs.starts_with(&self.root) {
            return Err(self.reject(raw));
        }

        Ok(ValidatedPath { abs, rel })
    }

    fn root_path(&self) -> ValidatedPath {
        ValidatedPath {
            abs: self.root.clone(),
            rel: String::new(),
        }
    }

    fn reject(&self, raw: &str) -> FsError {
        tracing::warn!("安全警告: 拒绝越界路径请求: {:?}", raw);
        FsError::new(FsErrorCode::PathRejected)
    }
}
