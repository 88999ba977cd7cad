use crate::errors::AppError;
use crate::models::{
    PartnerChangeRequest, PartnerChangeResponse, RegistryLookupResult, SaleOrder,
};
use crate::rd_client::RdVatClient;
use crate::vat_lookup::{is_vat_candidate, VatLookupHandler};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Partner-change VAT lookup.
    pub vat_lookup: VatLookupHandler,
    /// Raw access to the RD registry.
    pub registry: RdVatClient,
}

/// Builds the HTTP router with its middleware stack.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/v1/sale-orders/onchange-partner",
            post(onchange_partner),
        )
        .route("/api/v1/registry/:tin", get(registry_lookup))
        .layer(
            // Request size limit: 1MB max payload
            ServiceBuilder::new().layer(RequestBodyLimitLayer::new(1024 * 1024)),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "partner-vat-lookup",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/v1/sale-orders/onchange-partner
///
/// Called by the ERP front end whenever the customer on a sales order changes.
/// Always answers 200; failures are reported through the `warning` field with
/// the customer cleared.
pub async fn onchange_partner(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PartnerChangeRequest>,
) -> Json<PartnerChangeResponse> {
    tracing::info!(
        "POST /sale-orders/onchange-partner - order {:?}, partner {:?}",
        request.order_id,
        request.partner.as_ref().map(|p| p.id)
    );

    let mut order = SaleOrder {
        id: request.order_id,
        partner: request.partner,
    };

    let outcome = state.vat_lookup.handle_partner_change(&order).await;
    let warning = outcome.apply_to(&mut order);

    if let Some(ref w) = warning {
        tracing::warn!("Partner change on order {:?} rejected: {}", order.id, w.title);
    }

    Json(PartnerChangeResponse {
        order_id: order.id,
        partner: order.partner,
        warning,
    })
}

/// GET /api/v1/registry/:tin
///
/// Returns the decoded RD registry record for a TIN, without touching any partner.
pub async fn registry_lookup(
    State(state): State<Arc<AppState>>,
    Path(tin): Path<String>,
) -> Result<Json<RegistryLookupResult>, AppError> {
    tracing::info!("GET /registry/{}", tin);

    if !is_vat_candidate(&tin) {
        return Err(AppError::BadRequest(
            "TIN must be exactly 13 digits".to_string(),
        ));
    }

    let record = state.registry.lookup(&tin).await?;
    Ok(Json(record))
}
