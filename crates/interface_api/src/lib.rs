//! HTTP API Layer
//!
//! REST API for bill payments, cash-flow projections and the consumption
//! dashboard, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers per resource
//! - **Middleware**: Tracing and audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses keyed by error kind,
//!   including rejected paths, query strings and bodies
//!
//! Handlers only talk to domain services; which store backs them is decided
//! when the [`AppState`] is built.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(store, source, notifier, config);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod handlers;
pub mod dto;

use axum::{
    middleware as axum_middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use core_kernel::HealthCheckable;
use domain_cashflow::{CashflowService, ConsumptionSource, PaymentTermSource};
use domain_treasury::{AccountBalanceLedger, BillNotifier, BillPaymentProcessor, TreasuryStore};

use crate::config::ApiConfig;
use crate::handlers::{cashflow, dashboard, health, payments};
use crate::middleware::audit_middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<BillPaymentProcessor>,
    pub cashflow: Arc<CashflowService>,
    pub store_health: Arc<dyn HealthCheckable>,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires the domain services over a treasury store and a cash-flow source
    ///
    /// The store also serves as the balance ledger read by projections.
    pub fn new<S, C>(
        store: Arc<S>,
        source: Arc<C>,
        notifier: Arc<dyn BillNotifier>,
        config: ApiConfig,
    ) -> Self
    where
        S: TreasuryStore + AccountBalanceLedger + HealthCheckable,
        C: PaymentTermSource + ConsumptionSource,
    {
        let processor = BillPaymentProcessor::new(store.clone(), notifier)
            .with_retry(config.retry_policy());
        let cashflow = CashflowService::new(source.clone(), store.clone(), source);

        Self {
            processor: Arc::new(processor),
            cashflow: Arc::new(cashflow),
            store_health: store,
            config,
        }
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Bill routes
    let bill_routes = Router::new().route(
        "/:bill_id/payments",
        get(payments::list_payments).post(payments::apply_payment),
    );

    let api_routes = Router::new()
        .nest("/bills", bill_routes)
        .route("/cashflow/projection", get(cashflow::projection))
        .route("/dashboard/consumption", get(dashboard::consumption))
        .layer(axum_middleware::from_fn_with_state(state.clone(), audit_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
