//! Bill payment handlers

use axum::{extract::State, http::StatusCode, Json};
use tracing::info;
use validator::Validate;

use core_kernel::BillId;
use domain_treasury::BillPayment;

use crate::dto::payments::*;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::{error::ApiError, AppState};

/// Applies a payment against a bill
pub async fn apply_payment(
    State(state): State<AppState>,
    ApiPath(bill_id): ApiPath<BillId>,
    ApiJson(request): ApiJson<ApplyPaymentRequest>,
) -> Result<(StatusCode, Json<ApplyPaymentResponse>), ApiError> {
    request.validate()?;

    let command = request.into_command(bill_id)?;
    let receipt = state.processor.apply_payment(command).await?;

    info!(
        bill_id = %bill_id,
        payment_id = %receipt.payment.id,
        bill_paid = receipt.bill_paid,
        "Bill payment applied"
    );

    Ok((StatusCode::CREATED, Json(receipt.into())))
}

/// Lists the payments of a bill, newest first
pub async fn list_payments(
    State(state): State<AppState>,
    ApiPath(bill_id): ApiPath<BillId>,
    ApiQuery(query): ApiQuery<OrganizationQuery>,
) -> Result<Json<Vec<BillPayment>>, ApiError> {
    let payments = state
        .processor
        .list_payments(query.organization_id, bill_id)
        .await?;
    Ok(Json(payments))
}
