//! Sales order API endpoints

use api_types::DocumentListQuery;
use api_types::sales_order::{
    ConvertedInvoiceView, SalesOrderListResponse, SalesOrderNew, SalesOrderView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{DocumentListing, MoneyCents, NewSalesOrder, SalesOrder, users};
use uuid::Uuid;

use crate::line_items::{map_buckets, parse_list_query, to_engine_items};
use crate::{ServerError, server::ServerState};

fn map_order(order: SalesOrder) -> SalesOrderView {
    SalesOrderView {
        id: order.id,
        number: order.number,
        customer: order.customer,
        project_id: order.project_id,
        amount_minor: order.amount.cents(),
        status: order.status.as_str().to_string(),
        converted_invoice_id: order.converted_invoice_id,
        description: order.description,
        issued_on: order.issued_on,
        created_by: order.created_by,
    }
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<SalesOrderNew>,
) -> Result<(StatusCode, Json<api_types::DocumentCreated>), ServerError> {
    let id = state
        .engine
        .create_sales_order(
            &user.username,
            NewSalesOrder {
                customer: payload.customer,
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
) -> Result<Json<SalesOrderView>, ServerError> {
    let order = state.engine.sales_order(&user.username, id).await?;
    Ok(Json(map_order(order)))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<DocumentListQuery>,
) -> Result<Json<SalesOrderListResponse>, ServerError> {
    let filter = parse_list_query(query)?;
    let listing = state.engine.list_sales_orders(&user.username, filter).await?;

    let response = match listing {
        DocumentListing::Rows(orders) => SalesOrderListResponse::Rows {
            sales_orders: orders.into_iter().map(map_order).collect(),
        },
        DocumentListing::Groups(buckets) => SalesOrderListResponse::Groups {
            groups: map_buckets(buckets),
        },
    };
    Ok(Json(response))
}

pub async fn confirm(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SalesOrderView>, ServerError> {
    let order = state.engine.confirm_sales_order(&user.username, id).await?;
    Ok(Json(map_order(order)))
}

pub async fn mark_paid(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SalesOrderView>, ServerError> {
    let order = state.engine.mark_sales_order_paid(&user.username, id).await?;
    Ok(Json(map_order(order)))
}

pub async fn convert_invoice(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConvertedInvoiceView>, ServerError> {
    let converted = state
        .engine
        .convert_sales_order_to_invoice(&user.username, id)
        .await?;

    Ok(Json(ConvertedInvoiceView {
        invoice_id: converted.invoice_id,
        number: converted.number,
        amount_minor: converted.amount.cents(),
    }))
}
