use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{run, run_with_listener, spawn_with_listener};

mod dashboard;
mod expenses;
mod invoices;
mod line_items;
mod projects;
mod purchase_orders;
mod sales_orders;
mod server;
mod timesheets;
mod vendor_bills;

pub mod types {
    pub mod sales_order {
        pub use api_types::sales_order::{
            ConvertedInvoiceView, SalesOrderListResponse, SalesOrderNew, SalesOrderView,
        };
    }

    pub mod purchase_order {
        pub use api_types::purchase_order::{
            PurchaseOrderListResponse, PurchaseOrderNew, PurchaseOrderView,
        };
    }

    pub mod invoice {
        pub use api_types::invoice::{InvoiceListResponse, InvoiceNew, InvoiceView};
    }

    pub mod vendor_bill {
        pub use api_types::vendor_bill::{VendorBillListResponse, VendorBillNew, VendorBillView};
    }

    pub mod project {
        pub use api_types::project::{
            LedgerRebuildView, MemberAdd, ProjectCreated, ProjectListResponse, ProjectNew,
            ProjectView,
        };
    }

    pub mod expense {
        pub use api_types::expense::{
            ApproveResponse, AttachmentView, ExpenseListQuery, ExpenseListResponse, ExpenseNew,
            ExpenseView,
        };
    }

    pub mod timesheet {
        pub use api_types::timesheet::{
            TimesheetListQuery, TimesheetListResponse, TimesheetNew, TimesheetView,
        };
    }

    pub mod dashboard {
        pub use api_types::dashboard::{DashboardResponse, ProjectBucketView, VendorSpendView};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Conflict(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::Validation(_)
        | EngineError::InvalidTransition(_)
        | EngineError::InvalidAmount(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_forbidden_maps_to_403() {
        let res = ServerError::from(EngineError::Forbidden("forbidden".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::NotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::Conflict("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_invalid_transition_maps_to_422() {
        let res =
            ServerError::from(EngineError::InvalidTransition("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        let res = ServerError::from(EngineError::Validation("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
