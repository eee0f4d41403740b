// 上传接收器
//
// 上传先写入目标目录内的暂存文件 `<最终名>.uploading`，
// 全部写入成功后通过原子改名发布。部分写入的文件在最终名下永远不可见，
// 任何失败（包括连接中断）都会清理暂存文件。

use std::path::PathBuf;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::resolver::ValidatedPath;
use super::types::{FsError, FsErrorCode};

/// 暂存文件后缀，列表永远过滤该后缀
pub const UPLOAD_SUFFIX: &str = ".uploading";

/// 客户端文件名清洗后为空时的回退名
const FALLBACK_FILENAME: &str = "uploaded_file";

/// 上传接收器
///
/// 无状态，仅持有大小上限；每次上传产生一个独立的 [`UploadTransaction`]
pub struct UploadReceiver {
    max_upload_size: u64,
}

impl UploadReceiver {
    pub fn new(max_upload_size: u64) -> Self {
        Self { max_upload_size }
    }

    pub fn max_upload_size(&self) -> u64 {
        self.max_upload_size
    }

    /// 清洗客户端文件名：去掉所有目录成分，空结果回退为占位名
    pub fn sanitize_filename(raw: &str) -> String {
        let name = raw
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or("")
            .to_string();
        if name.is_empty() {
            FALLBACK_FILENAME.to_string()
        } else {
            name
        }
    }

    /// 开始一次上传事务
    ///
    /// 声明长度为 0 或超过上限时直接拒绝；目标必须是已存在的目录。
    pub async fn begin(
        &self,
        target: &ValidatedPath,
        filename: &str,
        declared_len: u64,
    ) -> Result<UploadTransaction, FsError> {
        if declared_len == 0 {
            return Err(FsError::new(FsErrorCode::LengthRequired));
        }
        if declared_len > self.max_upload_size {
            return Err(FsError::new(FsErrorCode::TooLarge).with_message(format!(
                "文件超出大小上限（{} MB）",
                self.max_upload_size / (1024 * 1024)
            )));
        }
        if !target.abs().is_dir() {
            return Err(FsError::new(FsErrorCode::InvalidTarget).with_item(target.name()));
        }

        let name = Self::sanitize_filename(filename);
        // "." 和 ".." 过得了目录剥离但当不了文件名，提前拒绝
        if name == "." || name == ".." {
            return Err(FsError::new(FsErrorCode::InvalidName).with_item(name));
        }
        let temp_path = target.abs().join(format!("{}{}", name, UPLOAD_SUFFIX));
        let final_path = target.abs().join(&name);
        let final_rel = if target.rel().is_empty() {
            name.clone()
        } else {
            format!("{}/{}", target.rel(), name)
        };

        let file = File::create(&temp_path)
            .await
            .map_err(|e| FsError::from_io(&e, &name))?;
        debug!("开始上传事务: {} (声明长度 {} 字节)", final_rel, declared_len);

        Ok(UploadTransaction {
            temp_path,
            final_path,
            final_rel,
            name,
            file: Some(file),
            written: 0,
            max: self.max_upload_size,
            committed: false,
        })
    }
}

/// 进行中的上传事务
///
/// 独占持有暂存文件；`commit` 原子发布，未提交即销毁时
/// 在 Drop 中清理暂存文件，保证失败后磁盘无残留。
#[derive(Debug)]
pub struct UploadTransaction {
    temp_path: PathBuf,
    final_path: PathBuf,
    final_rel: String,
    name: String,
    file: Option<File>,
    written: u64,
    max: u64,
    committed: bool,
}

impl UploadTransaction {
    /// 写入一块数据
    ///
    /// 每块都重新核对累计字节数，声明长度造假时也能在传输中途拦截
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), FsError> {
        self.written += chunk.len() as u64;
        if self.written > self.max {
            return Err(FsError::new(FsErrorCode::TooLarge).with_message(format!(
                "传输中超出大小上限（{} MB）",
                self.max / (1024 * 1024)
            )));
        }

        let file = self
            .file
            .as_mut()
            .ok_or_else(|| FsError::new(FsErrorCode::IoError).with_item(&self.name))?;
        file.write_all(chunk)
            .await
            .map_err(|e| FsError::from_io(&e, &self.name))
    }

    /// 已写入的字节数
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// 提交：刷新缓冲并原子改名为最终文件名
    ///
    /// 同名文件会被直接覆盖（与原始行为一致，属于文档化行为）。
    /// 成功时返回最终文件的相对路径。
    pub async fn commit(mut self) -> Result<String, FsError> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| FsError::new(FsErrorCode::IoError).with_item(&self.name))?;
        file.flush()
            .await
            .map_err(|e| FsError::from_io(&e, &self.name))?;
        // 改名前必须先关闭句柄（Windows）
        drop(file);

        tokio::fs::rename(&self.temp_path, &self.final_path)
            .await
            .map_err(|e| FsError::from_io(&e, &self.name))?;
        self.committed = true;

        info!("上传完成: {} ({} 字节)", self.final_rel, self.written);
        Ok(self.final_rel.clone())
    }
}

impl Drop for UploadTransaction {
    fn drop(&mut self) {
        if !self.committed {
            // 先关句柄再删除，删除失败只记录不传播
            self.file.take();
            if let Err(e) = std::fs::remove_file(&self.temp_path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("清理上传暂存文件失败: {}: {}", self.name, e);
                }
            } else {
                debug!("已清理上传暂存文件: {}", self.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::resolver::PathResolver;
    use tempfile::TempDir;

    fn setup(max: u64) -> (TempDir, PathResolver, UploadReceiver) {
        let dir = TempDir::new().unwrap();
        let resolver = PathResolver::new(dir.path()).unwrap();
        (dir, resolver, UploadReceiver::new(max))
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(UploadReceiver::sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(UploadReceiver::sanitize_filename("a/b/c.txt"), "c.txt");
        assert_eq!(UploadReceiver::sanitize_filename("..\\evil.exe"), "evil.exe");
        assert_eq!(UploadReceiver::sanitize_filename("/"), "uploaded_file");
        assert_eq!(UploadReceiver::sanitize_filename(""), "uploaded_file");
    }

    #[tokio::test]
    async fn test_begin_rejects_bad_declared_length() {
        let (_dir, resolver, rx) = setup(100);
        let root = resolver.resolve(None).unwrap();

        let err = rx.begin(&root, "a.txt", 0).await.unwrap_err();
        assert_eq!(err.code, FsErrorCode::LengthRequired);

        let err = rx.begin(&root, "a.txt", 101).await.unwrap_err();
        assert_eq!(err.code, FsErrorCode::TooLarge);
    }

    #[tokio::test]
    async fn test_begin_rejects_dot_names() {
        let (dir, resolver, rx) = setup(100);
        let root = resolver.resolve(None).unwrap();

        for raw in [".", "..", "a/..", "b\\."] {
            let err = rx.begin(&root, raw, 10).await.unwrap_err();
            assert_eq!(err.code, FsErrorCode::InvalidName, "raw: {:?}", raw);
        }
        // 拒绝发生在暂存文件创建之前
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_begin_rejects_missing_target_dir() {
        let (_dir, resolver, rx) = setup(100);
        let target = resolver.resolve(Some("no_such_dir")).unwrap();

        let err = rx.begin(&target, "a.txt", 10).await.unwrap_err();
        assert_eq!(err.code, FsErrorCode::InvalidTarget);
    }

    #[tokio::test]
    async fn test_successful_upload_publishes_atomically() {
        let (dir, resolver, rx) = setup(1024);
        let root = resolver.resolve(None).unwrap();

        let mut tx = rx.begin(&root, "hello.txt", 11).await.unwrap();
        tx.write_chunk(b"hello ").await.unwrap();
        // 提交前最终名不可见
        assert!(!dir.path().join("hello.txt").exists());
        assert!(dir.path().join("hello.txt.uploading").exists());

        tx.write_chunk(b"world").await.unwrap();
        let rel = tx.commit().await.unwrap();

        assert_eq!(rel, "hello.txt");
        assert!(!dir.path().join("hello.txt.uploading").exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("hello.txt")).unwrap(),
            "hello world"
        );
    }

    #[tokio::test]
    async fn test_mid_stream_ceiling_leaves_no_residue() {
        let (dir, resolver, rx) = setup(10);
        let root = resolver.resolve(None).unwrap();

        // 声明长度撒谎，传输中超限
        let mut tx = rx.begin(&root, "big.bin", 5).await.unwrap();
        tx.write_chunk(&[0u8; 8]).await.unwrap();
        let err = tx.write_chunk(&[0u8; 8]).await.unwrap_err();
        assert_eq!(err.code, FsErrorCode::TooLarge);
        drop(tx);

        assert!(!dir.path().join("big.bin").exists());
        assert!(!dir.path().join("big.bin.uploading").exists());
    }

    #[tokio::test]
    async fn test_drop_without_commit_cleans_staging() {
        let (dir, resolver, rx) = setup(1024);
        let root = resolver.resolve(None).unwrap();

        let mut tx = rx.begin(&root, "partial.dat", 100).await.unwrap();
        tx.write_chunk(b"half").await.unwrap();
        // 模拟连接中断：事务未提交即被销毁
        drop(tx);

        assert!(!dir.path().join("partial.dat").exists());
        assert!(!dir.path().join("partial.dat.uploading").exists());
    }

    #[tokio::test]
    async fn test_overwrite_existing_file() {
        let (dir, resolver, rx) = setup(1024);
        std::fs::write(dir.path().join("a.txt"), "old").unwrap();
        let root = resolver.resolve(None).unwrap();

        let mut tx = rx.begin(&root, "a.txt", 3).await.unwrap();
        tx.write_chunk(b"new").await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_upload_into_subdirectory() {
        let (dir, resolver, rx) = setup(1024);
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        let target = resolver.resolve(Some("docs")).unwrap();

        let mut tx = rx.begin(&target, "nested/evil.txt", 4).await.unwrap();
        tx.write_chunk(b"body").await.unwrap();
        let rel = tx.commit().await.unwrap();

        // 目录成分被剥离，文件落在目标目录内
        assert_eq!(rel, "docs/evil.txt");
        assert!(dir.path().join("docs/evil.txt").exists());
    }
}
