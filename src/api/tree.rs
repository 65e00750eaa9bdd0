// 菜单树接口

use axum::extract::State;
use axum::Json;
use tracing::error;

use super::ApiError;
use crate::models::TreeData;
use crate::state::AppState;

/// GET /api/tree
pub async fn get_tree(State(state): State<AppState>) -> Result<Json<TreeData>, ApiError> {
    state.tree.load().map(Json).map_err(|e| {
        error!("[Tree] Failed to read tree data: {}", e);
        ApiError::internal(format!("failed to read tree data: {}", e))
    })
}
