use axum::{extract::State, http::StatusCode};
use object_store::path::Path;
use tracing::{error, warn};

use crate::state::AppState;

// Probed with HEAD; a missing object still proves the bucket answers.
const STORAGE_PROBE: &str = "bundles/.ready";

pub async fn live() -> StatusCode {
    StatusCode::OK
}

/// Ready once both Postgres and the bundle store answer.
pub async fn ready(State(state): State<AppState>) -> StatusCode {
    if !database_ready(&state).await {
        return StatusCode::SERVICE_UNAVAILABLE;
    }

    match state.storage.head(&Path::from(STORAGE_PROBE)).await {
        Ok(_) | Err(object_store::Error::NotFound { .. }) => StatusCode::OK,
        Err(err) => {
            warn!("Health check failed to reach object storage: {}", err);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn database_ready(state: &AppState) -> bool {
    let mut conn = match state.repo.acquire().await {
        Ok(conn) => conn,
        Err(err) => {
            error!("Health check failed to get database connection: {}", err);
            return false;
        }
    };

    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&mut *conn).await {
        Ok(_) => true,
        Err(err) => {
            error!("Health check query failed: {}", err);
            false
        }
    }
}
