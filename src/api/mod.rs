// HTTP 接口
//
// - discovery: 主机发现与登记表
// - scheme: 方案图读写
// - tree: 菜单树
// 其余路径交给静态文件服务

pub mod discovery;
pub mod scheme;
pub mod tree;

use std::path::Path;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;

use crate::logging;
use crate::state::AppState;

/// 纯文本错误响应（前端按 text 读取）
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/api/discovery/facts", post(discovery::collect_facts))
        .route("/api/discovery/hosts", get(discovery::list_hosts))
        .route("/api/tree", get(tree::get_tree))
        .route(
            "/api/scheme/current",
            get(scheme::get_current).post(scheme::save_current),
        )
        .fallback_service(ServeDir::new(static_dir))
        .layer(middleware::from_fn(logging::request_logging))
        .with_state(state)
}
