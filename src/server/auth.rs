// Web 访问认证（HTTP Basic）
//
// 每个请求必须携带配置中的共享凭证；缺失或无效时返回
// 401 + WWW-Authenticate 质询，浏览器据此弹出登录框。

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::warn;

use crate::config::AuthConfig;

/// 认证门卫
///
/// 只做一件事：把请求头里的凭证和配置里的共享凭证做一次比对
pub struct AuthGate {
    username: String,
    password: String,
    realm: String,
}

impl AuthGate {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
            realm: config.realm.clone(),
        }
    }

    /// 校验 Authorization 头
    pub fn is_authorized(&self, header_value: Option<&str>) -> bool {
        let encoded = match header_value.and_then(|h| h.strip_prefix("Basic ")) {
            Some(e) => e,
            None => return false,
        };
        let decoded = match BASE64.decode(encoded) {
            Ok(d) => d,
            Err(_) => return false,
        };
        let decoded = match String::from_utf8(decoded) {
            Ok(s) => s,
            Err(_) => return false,
        };
        match decoded.split_once(':') {
            Some((user, pass)) => user == self.username && pass == self.password,
            None => false,
        }
    }

    /// 构造 401 质询响应
    pub fn challenge(&self) -> Response {
        let body = Html(
            "<!DOCTYPE html>\n<html>\n<head><title>401 Unauthorized</title></head>\n\
             <body><h1>401 Unauthorized</h1>\
             <p>You need to provide credentials to access this resource.</p></body>\n</html>",
        );
        (
            StatusCode::UNAUTHORIZED,
            [(
                header::WWW_AUTHENTICATE,
                format!("Basic realm=\"{}\"", self.realm),
            )],
            body,
        )
            .into_response()
    }
}

/// Basic 认证中间件，应用于除健康检查外的所有路由
pub async fn require_basic_auth(
    State(gate): State<Arc<AuthGate>>,
    request: Request,
    next: Next,
) -> Response {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    if !gate.is_authorized(header_value) {
        warn!("认证失败: {} {}", request.method(), request.uri().path());
        return gate.challenge();
    }

    next.run(request).await
}
