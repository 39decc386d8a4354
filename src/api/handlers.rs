use std::sync::Arc;

use axum::extract::State;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    api::response::{success_response, ApiResult},
    app_state::AppState,
};

#[derive(Serialize, ToSchema)]
pub struct Healthz {
    pub status: String,
    /// postgres / memory
    pub storage: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "OK", body = Healthz))
)]
pub async fn healthz(State(st): State<Arc<AppState>>) -> ApiResult<Healthz> {
    let (status, storage) = match &st.pool {
        Some(pool) => {
            let db_ok = crate::infrastructure::db::health_check(pool).await.is_ok();
            let status = if db_ok { "ok" } else { "degraded" };
            (status, "postgres")
        }
        None => ("ok", "memory"),
    };
    let version = format!(
        "{}+{}",
        env!("CARGO_PKG_VERSION"),
        option_env!("GIT_HASH").unwrap_or("dev")
    );

    success_response(Healthz {
        status: status.into(),
        storage: storage.into(),
        version,
    })
}
