//! Purchase order API endpoints

use api_types::DocumentListQuery;
use api_types::purchase_order::{PurchaseOrderListResponse, PurchaseOrderNew, PurchaseOrderView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{DocumentListing, MoneyCents, NewPurchaseOrder, PurchaseOrder, users};
use uuid::Uuid;

use crate::line_items::{map_buckets, parse_list_query, to_engine_items};
use crate::{ServerError, server::ServerState};

fn map_order(order: PurchaseOrder) -> PurchaseOrderView {
    PurchaseOrderView {
        id: order.id,
        number: order.number,
        vendor: order.vendor,
        project_id: order.project_id,
        amount_minor: order.amount.cents(),
        status: order.status.as_str().to_string(),
        description: order.description,
        issued_on: order.issued_on,
        created_by: order.created_by,
    }
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<PurchaseOrderNew>,
) -> Result<(StatusCode, Json<api_types::DocumentCreated>), ServerError> {
    let id = state
        .engine
        .create_purchase_order(
            &user.username,
            NewPurchaseOrder {
                vendor: payload.vendor,
                project_id: payload.project_id,
                amount: MoneyCents::new(payload.amount_minor.unwrap_or(0)),
                items: to_engine_items(payload.items),
                description: payload.description,
                issued_on: payload.issued_on,
                idempotency_key: payload.idempotency_key,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(api_types::DocumentCreated { id })))
}

pub async fn get_one(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PurchaseOrderView>, ServerError> {
    let order = state.engine.purchase_order(&user.username, id).await?;
    Ok(Json(map_order(order)))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<DocumentListQuery>,
) -> Result<Json<PurchaseOrderListResponse>, ServerError> {
    let filter = parse_list_query(query)?;
    let listing = state
        .engine
        .list_purchase_orders(&user.username, filter)
        .await?;

    let response = match listing {
        DocumentListing::Rows(orders) => PurchaseOrderListResponse::Rows {
            purchase_orders: orders.into_iter().map(map_order).collect(),
        },
        DocumentListing::Groups(buckets) => PurchaseOrderListResponse::Groups {
            groups: map_buckets(buckets),
        },
    };
    Ok(Json(response))
}

pub async fn approve(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PurchaseOrderView>, ServerError> {
    let order = state
        .engine
        .approve_purchase_order(&user.username, id)
        .await?;
    Ok(Json(map_order(order)))
}

pub async fn mark_paid(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PurchaseOrderView>, ServerError> {
    let order = state
        .engine
        .mark_purchase_order_paid(&user.username, id)
        .await?;
    Ok(Json(map_order(order)))
}
