//! Customer invoice API endpoints

use api_types::DocumentListQuery;
use api_types::invoice::{InvoiceListResponse, InvoiceNew, InvoiceView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{DocumentListing, Invoice, MoneyCents, NewInvoice, users};
use uuid::Uuid;

use crate::line_items::{map_buckets, map_item, parse_list_query, to_engine_items};
use crate::{ServerError, server::ServerState};

fn map_invoice(invoice: Invoice) -> InvoiceView {
    InvoiceView {
        id: invoice.id,
        number: invoice.number,
        customer: invoice.customer,
        project_id: invoice.project_id,
        amount_minor: invoice.amount.cents(),
        status: invoice.status.as_str().to_string(),
        sales_order_id: invoice.sales_order_id,
        issued_on: invoice.issued_on,
        created_by: invoice.created_by,
        line_items: invoice.line_items.into_iter().map(map_item).collect(),
    }
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<InvoiceNew>,
) -> Result<(StatusCode, Json<api_types::DocumentCreated>), ServerError> {
    let id = state
        .engine
        .create_invoice(
            &user.username,
            NewInvoice {
                customer: payload.customer,
                project_id: payload.project_id,
                amount: MoneyCents::new(payload.amount_minor.unwrap_or(0)),
                items: to_engine_items(payload.items),
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
) -> Result<Json<InvoiceView>, ServerError> {
    let invoice = state.engine.invoice(&user.username, id).await?;
    Ok(Json(map_invoice(invoice)))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<DocumentListQuery>,
) -> Result<Json<InvoiceListResponse>, ServerError> {
    let filter = parse_list_query(query)?;
    let listing = state.engine.list_invoices(&user.username, filter).await?;

    let response = match listing {
        DocumentListing::Rows(invoices) => InvoiceListResponse::Rows {
            invoices: invoices.into_iter().map(map_invoice).collect(),
        },
        DocumentListing::Groups(buckets) => InvoiceListResponse::Groups {
            groups: map_buckets(buckets),
        },
    };
    Ok(Json(response))
}

pub async fn mark_paid(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceView>, ServerError> {
    let invoice = state.engine.mark_invoice_paid(&user.username, id).await?;
    Ok(Json(map_invoice(invoice)))
}
