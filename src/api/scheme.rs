// 方案图接口

use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{Map, Value};
use tracing::{error, info};

use super::ApiError;
use crate::models::Scheme;
use crate::state::AppState;

/// GET /api/scheme/current
/// 文件不存在时返回默认方案
pub async fn get_current(State(state): State<AppState>) -> Result<Json<Scheme>, ApiError> {
    match state.schemes.load() {
        Ok(scheme) => Ok(Json(scheme)),
        Err(e) if e.is_not_found() => Ok(Json(Scheme::default())),
        Err(e) => {
            error!("[Scheme] Failed to read scheme: {}", e);
            Err(ApiError::internal(format!("failed to read scheme: {}", e)))
        }
    }
}

/// POST /api/scheme/current
/// 请求体必须是单个 JSON 对象，规范化后保存
pub async fn save_current(
    State(state): State<AppState>,
    body: Body,
) -> Result<StatusCode, ApiError> {
    let bytes = to_bytes(body, state.limits.scheme_body_bytes)
        .await
        .map_err(|_| ApiError::bad_request("invalid json payload"))?;
    // from_slice 拒绝对象之后的多余数据
    let payload: Map<String, Value> = serde_json::from_slice(&bytes)
        .map_err(|_| ApiError::bad_request("invalid json payload"))?;

    let scheme = Scheme::normalize(&payload);
    state.schemes.save(&scheme).map_err(|e| {
        error!("[Scheme] Failed to persist scheme: {}", e);
        ApiError::internal(format!("failed to persist scheme: {}", e))
    })?;

    info!(
        "[Scheme] Saved scheme with {} nodes, {} links",
        scheme.nodes.len(),
        scheme.links.len()
    );
    Ok(StatusCode::NO_CONTENT)
}
