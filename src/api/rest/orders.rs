use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::engine::pager;
use crate::error::{AppError, PagingParameter, PagingProblem};
use crate::models::order::{OrderStatus, OrderSummary};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(place_order).get(list_orders))
        .route("/orders/:id", get(get_order).patch(claim_order))
}

/// A coordinate as sent by clients: either a JSON number or a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CoordinateInput {
    Number(f64),
    Text(String),
}

impl CoordinateInput {
    fn to_f64(&self) -> Result<f64, AppError> {
        match self {
            CoordinateInput::Number(value) => Ok(*value),
            CoordinateInput::Text(raw) => raw
                .trim()
                .parse::<f64>()
                .map_err(|err| AppError::MalformedRequest(format!("coordinate {raw:?}: {err}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub origin: Vec<CoordinateInput>,
    pub destination: Vec<CoordinateInput>,
}

#[derive(Debug, Deserialize)]
pub struct ClaimOrderRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ClaimOrderResponse {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

fn parse_coordinates(values: &[CoordinateInput]) -> Result<Vec<f64>, AppError> {
    values.iter().map(CoordinateInput::to_f64).collect()
}

fn parse_order_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::InvalidOrderId(raw.to_string()))
}

async fn place_order(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<Json<OrderSummary>, AppError> {
    let Json(payload) = payload.map_err(|err| AppError::MalformedRequest(err.body_text()))?;

    let origin = parse_coordinates(&payload.origin)?;
    let destination = parse_coordinates(&payload.destination)?;

    let order = state.orders.place_order(&origin, &destination).await?;
    Ok(Json(OrderSummary::from(&order)))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderSummary>, AppError> {
    let id = parse_order_id(&id)?;
    let order = state.orders.get_order(id).await?;
    Ok(Json(OrderSummary::from(&order)))
}

async fn claim_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<ClaimOrderRequest>, JsonRejection>,
) -> Result<Json<ClaimOrderResponse>, AppError> {
    let Json(payload) = payload.map_err(|err| AppError::MalformedRequest(err.body_text()))?;
    let id = parse_order_id(&id)?;

    let status = state.orders.claim_order(id, &payload.status).await?;
    Ok(Json(ClaimOrderResponse { status }))
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListOrdersParams>, QueryRejection>,
) -> Result<Json<Vec<OrderSummary>>, AppError> {
    let Query(params) = params.map_err(|_| {
        AppError::InvalidPagingParameter(PagingParameter::Page, PagingProblem::NotInteger)
    })?;

    let page_number = pager::parse_param(PagingParameter::Page, params.page.as_deref())?;
    let page_size = pager::parse_param(PagingParameter::Limit, params.limit.as_deref())?;

    let orders = state.orders.list_orders().await?;
    let summaries: Vec<OrderSummary> = orders.iter().map(OrderSummary::from).collect();

    Ok(Json(pager::page(summaries, page_number, page_size)?))
}
