// API处理器模块

pub mod browse;
pub mod mutate;
pub mod page;
pub mod upload;

pub use browse::browse;
pub use mutate::{delete_entry, rename_entry};
pub use upload::upload_file;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;

use crate::filesystem::{FsError, FsErrorCode};

/// 统一API响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// 状态码 (0: 成功, 其他: 错误码)
    pub code: i32,
    /// 消息
    pub message: String,
    /// 数据
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            message: "Success".to_string(),
            data: Some(data),
        }
    }
}

/// 错误响应体
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    item: Option<String>,
}

/// 错误码到 HTTP 状态码的唯一映射表，所有端点统一使用
pub fn status_for(code: FsErrorCode) -> StatusCode {
    match code {
        FsErrorCode::PathRejected => StatusCode::FORBIDDEN,
        FsErrorCode::NotFound => StatusCode::NOT_FOUND,
        FsErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
        FsErrorCode::NotEmpty => StatusCode::BAD_REQUEST,
        FsErrorCode::Conflict => StatusCode::CONFLICT,
        FsErrorCode::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        FsErrorCode::InvalidName => StatusCode::BAD_REQUEST,
        FsErrorCode::RootProtected => StatusCode::BAD_REQUEST,
        FsErrorCode::MissingFile => StatusCode::BAD_REQUEST,
        FsErrorCode::InvalidTarget => StatusCode::BAD_REQUEST,
        FsErrorCode::NotADirectory => StatusCode::BAD_REQUEST,
        FsErrorCode::LengthRequired => StatusCode::LENGTH_REQUIRED,
        FsErrorCode::IoError => StatusCode::INTERNAL_SERVER_ERROR,
        FsErrorCode::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
    }
}

impl IntoResponse for FsError {
    fn into_response(self) -> axum::response::Response {
        let status = status_for(self.code);
        let body = Json(ErrorResponse {
            code: self.code.code(),
            message: self.message,
            item: self.item,
        });
        (status, body).into_response()
    }
}

/// 把相对路径编码为站内链接（逐段编码，保留 / 分隔符）
pub fn href_for(rel: &str) -> String {
    if rel.is_empty() {
        return "/".to_string();
    }
    let encoded: Vec<String> = rel
        .split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect();
    format!("/{}", encoded.join("/"))
}
