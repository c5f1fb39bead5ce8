//! Vendor bill API endpoints

use api_types::DocumentListQuery;
use api_types::vendor_bill::{VendorBillListResponse, VendorBillNew, VendorBillView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{DocumentListing, MoneyCents, NewVendorBill, VendorBill, users};
use uuid::Uuid;

use crate::line_items::{map_buckets, parse_list_query, to_engine_items};
use crate::{ServerError, server::ServerState};

fn map_bill(bill: VendorBill) -> VendorBillView {
    VendorBillView {
        id: bill.id,
        number: bill.number,
        vendor: bill.vendor,
        project_id: bill.project_id,
        amount_minor: bill.amount.cents(),
        status: bill.status.as_str().to_string(),
        purchase_order_id: bill.purchase_order_id,
        attachment_url: bill.attachment_url,
        issued_on: bill.issued_on,
        created_by: bill.created_by,
    }
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<VendorBillNew>,
) -> Result<(StatusCode, Json<api_types::DocumentCreated>), ServerError> {
    let id = state
        .engine
        .create_vendor_bill(
            &user.username,
            NewVendorBill {
                vendor: payload.vendor,
                project_id: payload.project_id,
                amount: MoneyCents::new(payload.amount_minor.unwrap_or(0)),
                items: to_engine_items(payload.items),
                purchase_order_id: payload.purchase_order_id,
                attachment_url: payload.attachment_url,
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
) -> Result<Json<VendorBillView>, ServerError> {
    let bill = state.engine.vendor_bill(&user.username, id).await?;
    Ok(Json(map_bill(bill)))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<DocumentListQuery>,
) -> Result<Json<VendorBillListResponse>, ServerError> {
    let filter = parse_list_query(query)?;
    let listing = state.engine.list_vendor_bills(&user.username, filter).await?;

    let response = match listing {
        DocumentListing::Rows(bills) => VendorBillListResponse::Rows {
            vendor_bills: bills.into_iter().map(map_bill).collect(),
        },
        DocumentListing::Groups(buckets) => VendorBillListResponse::Groups {
            groups: map_buckets(buckets),
        },
    };
    Ok(Json(response))
}

pub async fn mark_paid(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<VendorBillView>, ServerError> {
    let bill = state.engine.mark_vendor_bill_paid(&user.username, id).await?;
    Ok(Json(map_bill(bill)))
}
