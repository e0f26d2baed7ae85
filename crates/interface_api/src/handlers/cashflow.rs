//! Cash-flow projection handlers

use axum::{extract::State, Json};
use chrono::Utc;
use validator::Validate;

use domain_cashflow::ProjectionView;

use crate::dto::cashflow::ProjectionQuery;
use crate::extract::ApiQuery;
use crate::{error::ApiError, AppState};

/// Projects active payment terms over the requested horizon
pub async fn projection(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProjectionQuery>,
) -> Result<Json<ProjectionView>, ApiError> {
    query.validate()?;
    let filters = query.filters()?;

    let months_ahead = query
        .months_ahead
        .unwrap_or(state.config.default_months_ahead);
    let view = state
        .cashflow
        .projection(
            query.organization_id,
            Utc::now().date_naive(),
            months_ahead,
            &filters,
        )
        .await?;
    Ok(Json(view))
}
