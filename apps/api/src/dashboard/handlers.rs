use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::errors::AppError;
use crate::ledger::statistics::Statistics;
use crate::ledger::{Ledger, LedgerError};
use crate::models::interview::Interview;
use crate::models::run::Run;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub success: bool,
    pub store_available: bool,
    pub runs: Vec<Run>,
    pub interviews: Vec<Interview>,
}

#[derive(Serialize)]
pub struct StatisticsResponse {
    pub success: bool,
    pub statistics: Statistics,
}

async fn recent_activity(ledger: &Ledger) -> Result<(Vec<Run>, Vec<Interview>), LedgerError> {
    Ok((ledger.list_runs().await?, ledger.list_interviews().await?))
}

/// GET /api/dashboard
///
/// An unreachable store degrades to empty lists with `storeAvailable: false`.
pub async fn handle_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, AppError> {
    let (runs, interviews, reachable) = match recent_activity(&state.ledger).await {
        Ok((runs, interviews)) => (runs, interviews, true),
        Err(e) if e.is_unreachable() => {
            warn!("Store unreachable; dashboard degraded to empty: {e}");
            (Vec::new(), Vec::new(), false)
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Json(DashboardResponse {
        success: true,
        store_available: state.ledger.is_available() && reachable,
        runs,
        interviews,
    }))
}

/// GET /api/dashboard/stats
pub async fn handle_statistics(
    State(state): State<AppState>,
) -> Result<Json<StatisticsResponse>, AppError> {
    let statistics = state
        .ledger
        .statistics(&state.config.shortlist_policy)
        .await?;
    Ok(Json(StatisticsResponse {
        success: true,
        statistics,
    }))
}
