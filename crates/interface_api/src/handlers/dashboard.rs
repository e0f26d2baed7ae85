//! Consumption dashboard handlers

use axum::{extract::State, Json};
use chrono::Utc;

use domain_cashflow::{CashflowError, ConsumptionView};

use crate::dto::dashboard::ConsumptionQuery;
use crate::extract::ApiQuery;
use crate::{error::ApiError, AppState};

/// Revenue, expense and budget comparison for a period
pub async fn consumption(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ConsumptionQuery>,
) -> Result<Json<ConsumptionView>, ApiError> {
    let period = query
        .period(Utc::now().date_naive())
        .map_err(CashflowError::from)?;
    let view = state.cashflow.consumption(query.organization_id, period).await?;
    Ok(Json(view))
}
