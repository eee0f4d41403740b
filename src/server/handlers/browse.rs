// 浏览处理器
//
// GET 任意路径：目录返回列表页（或 JSON），文件返回字节流，其余 404。
// 文件与目录的分发在每个请求中只判定一次。

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::filesystem::{
    content_type_for_extension, is_inline_type, DirectoryEntry, FsError, FsErrorCode,
    ValidatedPath,
};
use crate::server::state::AppState;

use super::{page, ApiResponse};

/// 浏览查询参数
#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    /// format=json 时返回结构化列表
    pub format: Option<String>,
}

/// 目录列表数据
#[derive(Debug, Serialize)]
pub struct ListingData {
    /// 当前相对路径（根目录为空串）
    #[serde(rename = "currentPath")]
    pub current_path: String,
    /// 条目列表
    pub entries: Vec<DirectoryEntry>,
}

/// GET /{*path}
/// 目录 → 列表页；文件 → 内容；不存在 → 404
pub async fn browse(
    State(state): State<AppState>,
    uri: Uri,
    Query(query): Query<BrowseQuery>,
) -> Result<Response, FsError> {
    // uri.path() 保持百分号编码原样，解码只在解析器内做一次
    let vp = state.drive.resolver().resolve(Some(uri.path()))?;

    if vp.abs().is_dir() {
        let entries = state.drive.list_directory(&vp)?;
        debug!("列目录: {:?} ({} 个条目)", vp.rel(), entries.len());

        if query.format.as_deref() == Some("json") {
            let data = ListingData {
                current_path: vp.rel().to_string(),
                entries,
            };
            return Ok(Json(ApiResponse::success(data)).into_response());
        }

        let html = page::render_listing(vp.rel(), &entries);
        return Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/html; charset=utf-8"),
                (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
                (header::PRAGMA, "no-cache"),
                (header::EXPIRES, "0"),
            ],
            html,
        )
            .into_response());
    }

    if vp.abs().is_file() {
        return serve_file(&vp).await;
    }

    Err(FsError::new(FsErrorCode::NotFound).with_item(vp.name()))
}

/// 以流式响应返回文件内容
async fn serve_file(vp: &ValidatedPath) -> Result<Response, FsError> {
    let file = tokio::fs::File::open(vp.abs())
        .await
        .map_err(|e| FsError::from_io(&e, vp.name()))?;
    let metadata = file
        .metadata()
        .await
        .map_err(|e| FsError::from_io(&e, vp.name()))?;

    let content_type = content_type_for_extension(vp.abs());
    let disposition = content_disposition(vp.name(), content_type);
    debug!("发送文件: {} ({} 字节)", vp.rel(), metadata.len());

    let body = Body::from_stream(ReaderStream::new(file));
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, metadata.len())
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(body)
        .map_err(|_| FsError::new(FsErrorCode::IoError).with_item(vp.name()))
}

/// 构造 Content-Disposition 头
///
/// 图片 / 文本 / PDF 内联展示，其余作为附件下载；
/// 文件名含非 ASCII 字符时按 RFC 5987 编码为 filename*。
fn content_disposition(name: &str, content_type: &str) -> String {
    let kind = if is_inline_type(content_type) {
        "inline"
    } else {
        "attachment"
    };
    if name.is_ascii() {
        format!("{}; filename=\"{}\"", kind, name.replace('"', "_"))
    } else {
        format!("{}; filename*=UTF-8''{}", kind, urlencoding::encode(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_json_shape() {
        use crate::filesystem::EntryKind;

        let data = ListingData {
            current_path: "docs".to_string(),
            entries: vec![DirectoryEntry {
                name: "a.txt".to_string(),
                kind: EntryKind::File,
                rel_path: "docs/a.txt".to_string(),
                size_bytes: Some(3),
                modified_at: Some("27-08-2026 10:15".to_string()),
                inaccessible: false,
            }],
        };
        let value = serde_json::to_value(ApiResponse::success(data)).unwrap();

        assert_eq!(value["code"], 0);
        assert_eq!(value["data"]["currentPath"], "docs");
        let entry = &value["data"]["entries"][0];
        assert_eq!(entry["name"], "a.txt");
        assert_eq!(entry["kind"], "file");
        assert_eq!(entry["relPath"], "docs/a.txt");
        assert_eq!(entry["sizeBytes"], 3);
        assert_eq!(entry["modifiedAt"], "27-08-2026 10:15");
        // 可访问条目不序列化 inaccessible 字段
        assert!(entry.get("inaccessible").is_none());
    }

    #[test]
    fn test_content_disposition_inline_kinds() {
        assert_eq!(
            content_disposition("a.pdf", "application/pdf"),
            "inline; filename=\"a.pdf\""
        );
        assert_eq!(
            content_disposition("a.png", "image/png"),
            "inline; filename=\"a.png\""
        );
        assert_eq!(
            content_disposition("a.zip", "application/zip"),
            "attachment; filename=\"a.zip\""
        );
    }

    #[test]
    fn test_content_disposition_rfc5987() {
        let header = content_disposition("报告.pdf", "application/pdf");
        assert!(header.starts_with("inline; filename*=UTF-8''"));
        assert!(!header.contains("报告"));
    }

    #[test]
    fn test_content_disposition_quote_in_name() {
        let header = content_disposition("a\"b.txt", "text/plain; charset=utf-8");
        assert_eq!(header, "inline; filename=\"a_b.txt\"");
    }
}
