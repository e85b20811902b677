// 🌐 JSON API - card-input operations and the in-memory wallet over HTTP

use crate::card_input::{detect_brand, format_card_number, format_expiry, sanitize_cvv, CardBrand};
use crate::form::{validate, CardForm, Validation};
use crate::wallet::{CardRegistry, WalletError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use log::error;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub wallet: CardRegistry,
}

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    fn fail(data: T, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormatRequest {
    pub card_number: Option<String>,
    pub expiry_date: Option<String>,
    pub cvv: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cvv: Option<String>,
    pub brand: CardBrand,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BrandResponse {
    pub brand: CardBrand,
}

fn wallet_failure(e: WalletError) -> Response {
    match e {
        WalletError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::fail((), format!("Card not found: {}", id))),
        )
            .into_response(),
        WalletError::InvalidForm(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::fail(errors, "Card form is invalid")),
        )
            .into_response(),
        WalletError::Poisoned => {
            error!("Wallet lock poisoned");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::fail((), "Wallet unavailable")),
            )
                .into_response()
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/card/format - Normalize raw field input
async fn format_fields(Json(req): Json<FormatRequest>) -> impl IntoResponse {
    let brand = req
        .card_number
        .as_deref()
        .map(detect_brand)
        .unwrap_or(CardBrand::Unknown);
    let response = FormatResponse {
        card_number: req.card_number.as_deref().map(format_card_number),
        expiry_date: req.expiry_date.as_deref().map(format_expiry),
        cvv: req.cvv.as_deref().map(sanitize_cvv),
        brand,
    };
    Json(ApiResponse::ok(response))
}

/// GET /api/card/brand/:number - Brand for a (partial) card number
async fn brand_for(Path(number): Path<String>) -> impl IntoResponse {
    Json(ApiResponse::ok(BrandResponse {
        brand: detect_brand(&number),
    }))
}

/// POST /api/card/validate - Submit-time validation pass
async fn validate_form(Json(form): Json<CardForm>) -> impl IntoResponse {
    let validation: Validation = validate(&form);
    Json(ApiResponse::ok(validation))
}

/// GET /api/cards - All cards in the wallet
async fn list_cards(State(state): State<AppState>) -> Response {
    match state.wallet.all_cards() {
        Ok(cards) => (StatusCode::OK, Json(ApiResponse::ok(cards))).into_response(),
        Err(e) => wallet_failure(e),
    }
}

/// POST /api/cards - Validate and add a card
async fn add_card(State(state): State<AppState>, Json(form): Json<CardForm>) -> Response {
    match state.wallet.add_from_form(&form) {
        Ok(card) => (StatusCode::CREATED, Json(ApiResponse::ok(card))).into_response(),
        Err(e) => wallet_failure(e),
    }
}

/// DELETE /api/cards - Delete all data in the wallet
async fn clear_cards(State(state): State<AppState>) -> Response {
    match state.wallet.clear() {
        Ok(removed) => (StatusCode::OK, Json(ApiResponse::ok(removed))).into_response(),
        Err(e) => wallet_failure(e),
    }
}

/// DELETE /api/cards/:id - Remove a card
async fn remove_card(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.wallet.remove(&id) {
        Ok(card) => (StatusCode::OK, Json(ApiResponse::ok(card))).into_response(),
        Err(e) => wallet_failure(e),
    }
}

/// Build the full application router
pub fn router(wallet: CardRegistry) -> Router {
    let state = AppState { wallet };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/card/format", post(format_fields))
        .route("/card/brand/:number", get(brand_for))
        .route("/card/validate", post(validate_form))
        .route("/cards", get(list_cards).post(add_card).delete(clear_cards))
        .route("/cards/:id", delete(remove_card))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
