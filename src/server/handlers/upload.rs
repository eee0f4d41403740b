// 上传处理器
//
// POST /upload?path=<目标目录相对路径>，multipart 的 file 字段为文件内容。
// 成功后 303 跳转回目标目录列表。

use axum::{
    extract::{
        multipart::MultipartRejection,
        Multipart, Query, State,
    },
    http::{header, HeaderMap},
    response::Redirect,
};
use serde::Deserialize;
use tracing::info;

use crate::filesystem::{FsError, FsErrorCode};
use crate::server::state::AppState;

use super::href_for;

/// 上传查询参数
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// 目标目录相对路径，缺省为根目录
    #[serde(default)]
    pub path: String,
}

/// POST /upload?path=xxx
pub async fn upload_file(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Redirect, FsError> {
    // Content-Type 不是 multipart/form-data（或缺少边界）时返回 415
    let mut multipart =
        multipart.map_err(|_| FsError::new(FsErrorCode::UnsupportedMediaType))?;

    let declared_len = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    let target = state.drive.resolver().resolve(Some(&query.path))?;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| FsError::new(FsErrorCode::IoError).with_message(format!("读取表单失败: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = match field.file_name() {
            Some(f) if !f.is_empty() => f.to_string(),
            _ => return Err(FsError::new(FsErrorCode::MissingFile)),
        };

        let mut tx = state.uploads.begin(&target, &filename, declared_len).await?;
        while let Some(chunk) = field.chunk().await.map_err(|e| {
            // 连接中断或载荷损坏，事务随 Err 返回被销毁并清理暂存文件
            FsError::new(FsErrorCode::IoError).with_message(format!("接收上传数据失败: {}", e))
        })? {
            tx.write_chunk(&chunk).await?;
        }
        let final_rel = tx.commit().await?;

        info!("已保存上传文件: {}", final_rel);
        return Ok(Redirect::to(&href_for(target.rel())));
    }

    Err(FsError::new(FsErrorCode::MissingFile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode, routing::post, Router};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::server::state::AppState;

    fn app() -> (TempDir, Router) {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.storage.root_dir = dir.path().to_path_buf();
        let state = AppState::new(config).unwrap();
        let router = Router::new()
            .route("/upload", post(upload_file))
            .with_state(state);
        (dir, router)
    }

    #[tokio::test]
    async fn test_non_multipart_body_gets_415() {
        let (_dir, router) = app();
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header("content-type", "application/json")
            .header("content-length", "2")
            .body(Body::from("{}"))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_multipart_upload_redirects_and_saves() {
        let (dir, router) = app();
        let body = "--xyz\r\n\
                    Content-Disposition: form-data; name=\"file\"; filename=\"hello.txt\"\r\n\
                    \r\n\
                    hello world\r\n\
                    --xyz--\r\n";
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header("content-type", "multipart/form-data; boundary=xyz")
            .header("content-length", body.len().to_string())
            .body(Body::from(body))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("hello.txt")).unwrap(),
            "hello world"
        );
    }
}
