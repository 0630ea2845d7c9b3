//! HTTP API server with observability for the ledger core.
//!
//! Provides REST endpoints for invoice and payment management, with
//! structured logging (tracing) and Prometheus metrics. Every request is
//! tenant-scoped through the `X-Tenant-Id` header; requests without one
//! are rejected.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use event_store::EventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use projections::{InvoiceLedgerView, PaymentLedgerView, ProjectionProcessor};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EventStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/invoices", post(routes::invoices::create::<S>))
        .route("/invoices", get(routes::invoices::list::<S>))
        .route("/invoices/{id}", get(routes::invoices::get::<S>))
        .route(
            "/invoices/{id}/line-items",
            post(routes::invoices::add_line_item::<S>),
        )
        .route(
            "/invoices/{id}/line-items/{index}",
            delete(routes::invoices::remove_line_item::<S>),
        )
        .route("/invoices/{id}/approve", post(routes::invoices::approve::<S>))
        .route("/invoices/{id}/cancel", post(routes::invoices::cancel::<S>))
        .route("/payments", post(routes::payments::create::<S>))
        .route("/payments", get(routes::payments::list::<S>))
        .route("/payments/{id}", get(routes::payments::get::<S>))
        .route(
            "/payments/{id}/complete",
            post(routes::payments::complete::<S>),
        )
        .route("/payments/{id}/fail", post(routes::payments::fail::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state: services wired to the store,
/// projections registered on a processor, and the processor injected as
/// the services' event publisher.
pub fn create_default_state<S: EventStore + Clone + 'static>(
    event_store: S,
) -> Arc<AppState<S>> {
    use domain::{InvoiceService, PaymentService};
    use projections::Projection;
    use settlement::SettlementCoordinator;

    let invoice_view = Arc::new(InvoiceLedgerView::new());
    let payment_view = Arc::new(PaymentLedgerView::new());

    let mut processor = ProjectionProcessor::new(event_store.clone());
    processor.register(Box::new(invoice_view.as_ref().clone()) as Box<dyn Projection>);
    processor.register(Box::new(payment_view.as_ref().clone()) as Box<dyn Projection>);
    let processor = Arc::new(processor);

    let publisher = processor.clone() as Arc<dyn event_store::EventPublisher>;

    let invoice_service =
        InvoiceService::new(event_store.clone()).with_publisher(publisher.clone());
    let payment_service =
        PaymentService::new(event_store.clone()).with_publisher(publisher.clone());
    let settlement = SettlementCoordinator::with_publisher(event_store.clone(), publisher);

    Arc::new(AppState {
        invoice_service,
        payment_service,
        settlement,
        invoice_view,
        payment_view,
        event_store,
        projection_processor: processor,
    })
}
