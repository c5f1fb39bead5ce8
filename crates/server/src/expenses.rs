//! Expense API endpoints

use api_types::expense::{
    ApproveResponse, AttachmentView, ExpenseListQuery, ExpenseListResponse, ExpenseNew, ExpenseView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{AttachReport, Expense, ExpenseListFilter, ExpenseStatus, MoneyCents, users};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn map_expense(expense: Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        project_id: expense.project_id,
        description: expense.description,
        amount_minor: expense.amount.cents(),
        billable: expense.billable,
        submitted_by: expense.submitted_by,
        receipt_url: expense.receipt_url,
        status: expense.status.as_str().to_string(),
        reimbursed: expense.reimbursed,
        reimbursed_at: expense.reimbursed_at,
        billed: expense.billed,
        billed_at: expense.billed_at,
        invoice_id: expense.invoice_id,
        submitted_on: expense.submitted_on,
    }
}

fn map_attachment(report: AttachReport) -> AttachmentView {
    match report {
        AttachReport::Attached {
            invoice_id,
            invoice_created,
        } => AttachmentView::Attached {
            invoice_id,
            invoice_created,
        },
        AttachReport::NotBillable => AttachmentView::NotBillable,
        AttachReport::Failed { reason } => AttachmentView::Failed { reason },
    }
}

pub async fn submit(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<api_types::DocumentCreated>), ServerError> {
    let id = state
        .engine
        .submit_expense(
            &user.username,
            engine::NewExpense {
                project_id: payload.project_id,
                description: payload.description,
                amount: MoneyCents::new(payload.amount_minor),
                billable: payload.billable,
                receipt_url: payload.receipt_url,
                submitted_on: payload.submitted_on,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(api_types::DocumentCreated { id })))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<ExpenseListQuery>,
) -> Result<Json<ExpenseListResponse>, ServerError> {
    let status = query
        .status
        .as_deref()
        .map(ExpenseStatus::try_from)
        .transpose()?;
    let filter = ExpenseListFilter {
        project_id: query.project_id,
        status,
        from: query.from,
        to: query.to,
    };

    let expenses = state
        .engine
        .list_expenses(&user.username, filter)
        .await?
        .into_iter()
        .map(map_expense)
        .collect();

    Ok(Json(ExpenseListResponse { expenses }))
}

pub async fn approve(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApproveResponse>, ServerError> {
    let outcome = state.engine.approve_expense(&user.username, id).await?;

    Ok(Json(ApproveResponse {
        expense: map_expense(outcome.expense),
        attachment: map_attachment(outcome.attachment),
    }))
}

pub async fn reject(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state.engine.reject_expense(&user.username, id).await?;
    Ok(Json(map_expense(expense)))
}

pub async fn reimburse(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state.engine.reimburse_expense(&user.username, id).await?;
    Ok(Json(map_expense(expense)))
}
