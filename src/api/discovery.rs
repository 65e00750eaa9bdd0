// 主机发现接口

use std::net::IpAddr;

use axum::body::{to_bytes, Body};
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::ApiError;
use crate::discovery::{DiscoveryContext, DiscoveryError, SshAuth};
use crate::logging::TraceId;
use crate::models::{find_host_by_ip, DiscoveryHostPublic};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct FactsRequest {
    #[serde(default)]
    ip: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactsResponse {
    pub ip: String,
    pub facts: String,
    pub log_file: String,
}

/// POST /api/discovery/facts
pub async fn collect_facts(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    body: Body,
) -> Result<Json<FactsResponse>, ApiError> {
    // 超出上限与非法 JSON 同样处理
    let bytes = to_bytes(body, state.limits.discovery_body_bytes)
        .await
        .map_err(|_| ApiError::bad_request("invalid json payload"))?;
    let request: FactsRequest = serde_json::from_slice(&bytes)
        .map_err(|_| ApiError::bad_request("invalid json payload"))?;

    if request.ip.parse::<IpAddr>().is_err() {
        return Err(ApiError::bad_request("invalid ip"));
    }
    let ip = request.ip;

    // 登记表读不出来是服务端故障，返回 500 而不是 400
    let hosts = state.hosts.load().map_err(|e| {
        warn!("[Discovery] Failed to read hosts registry: {}", e);
        ApiError::internal(format!("failed to read discovery hosts: {}", e))
    })?;
    let host = find_host_by_ip(&hosts, &ip).ok_or_else(|| {
        ApiError::bad_request(format!(
            "failed to resolve host credentials: host with ip {} not found",
            ip
        ))
    })?;
    let auth = SshAuth::from_host(host);

    // 客户端断开时 handler future 被 drop，guard 随之取消采集
    let root = DiscoveryContext::new();
    let _guard = root.drop_guard();
    let ctx = root.with_timeout(state.limits.request_timeout);

    info!(trace_id = %*trace_id, "[Discovery] Collecting facts from {}", ip);
    match state.collector.collect_facts(&ctx, &ip, &auth).await {
        Ok(collected) => Ok(Json(FactsResponse {
            ip,
            facts: collected.facts,
            log_file: collected.log_file.display().to_string(),
        })),
        Err(failure) => {
            warn!(trace_id = %*trace_id, "[Discovery] Collection from {} failed: {}", ip, failure);
            let status = match failure.error {
                DiscoveryError::MissingCredential(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err(ApiError::new(
                status,
                format!("failed to collect discovery facts: {}", failure),
            ))
        }
    }
}

/// GET /api/discovery/hosts
/// 只返回公开字段
pub async fn list_hosts(
    State(state): State<AppState>,
) -> Result<Json<Vec<DiscoveryHostPublic>>, ApiError> {
    let hosts = state.hosts.load().map_err(|e| {
        warn!("[Discovery] Failed to read hosts registry: {}", e);
        ApiError::internal(format!("failed to read discovery hosts: {}", e))
    })?;
    Ok(Json(hosts.iter().map(|h| h.public_view()).collect()))
}
