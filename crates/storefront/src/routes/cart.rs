//! Cart route handlers.
//!
//! Every mutation answers with the updated cart view so the client can
//! re-render the drawer without a second request.

use axum::{Json, extract::State, http::StatusCode};
use lumina_core::cart::{CartKey, CartSelection};
use lumina_core::checkout::CartView;
use lumina_core::shop::CheckoutReceipt;
use lumina_core::{ProductId, SizeId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::Result;
use crate::state::AppState;

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    #[serde(flatten)]
    pub selection: CartSelection,
    pub qty: Option<i64>,
}

/// Identifies a cart line.
#[derive(Debug, Deserialize)]
pub struct LineRef {
    pub product_id: ProductId,
    #[serde(default = "SizeId::default_size")]
    pub size_id: SizeId,
    #[serde(default)]
    pub color: String,
}

impl LineRef {
    fn key(&self) -> CartKey {
        CartKey::new(
            self.product_id.clone(),
            self.size_id.clone(),
            self.color.clone(),
        )
    }
}

/// Set-quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateLineRequest {
    #[serde(flatten)]
    pub line: LineRef,
    pub qty: i64,
}

/// Cart count badge.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
}

/// Display the cart.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Json<CartView> {
    Json(state.shop().await.cart_view())
}

/// Cart count badge.
#[instrument(skip(state))]
pub async fn count(State(state): State<AppState>) -> Json<CartCount> {
    Json(CartCount {
        count: state.shop().await.cart_count(),
    })
}

/// Add a selection to the cart.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    Json(request): Json<AddToCartRequest>,
) -> Result<(StatusCode, Json<CartView>)> {
    let mut shop = state.shop().await;
    let line = shop.add_to_cart(request.selection, request.qty)?;
    tracing::info!(
        product_id = %line.product_id,
        size_id = %line.size_id,
        qty = line.qty,
        "Added to cart"
    );
    Ok((StatusCode::CREATED, Json(shop.cart_view())))
}

/// Set a line's quantity. Unknown lines are left alone.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Json(request): Json<UpdateLineRequest>,
) -> Result<Json<CartView>> {
    let mut shop = state.shop().await;
    shop.set_cart_quantity(&request.line.key(), request.qty)?;
    Ok(Json(shop.cart_view()))
}

/// Remove a line. Unknown lines are left alone.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Json(line): Json<LineRef>,
) -> Result<Json<CartView>> {
    let mut shop = state.shop().await;
    shop.remove_from_cart(&line.key())?;
    Ok(Json(shop.cart_view()))
}

/// Empty the cart.
#[instrument(skip(state))]
pub async fn clear(State(state): State<AppState>) -> Result<Json<CartView>> {
    let mut shop = state.shop().await;
    shop.clear_cart()?;
    Ok(Json(shop.cart_view()))
}

/// Simulated checkout. The cart is kept.
#[instrument(skip(state))]
pub async fn checkout(State(state): State<AppState>) -> Result<Json<CheckoutReceipt>> {
    let receipt = state.shop().await.checkout()?;
    Ok(Json(receipt))
}
