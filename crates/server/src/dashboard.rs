//! Finance dashboard endpoint

use api_types::dashboard::{DashboardResponse, ProjectBucketView, VendorSpendView};
use axum::{Extension, Json, extract::State};
use engine::users;

use crate::{ServerError, server::ServerState};

pub async fn get_dashboard(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<DashboardResponse>, ServerError> {
    let report = state.engine.finance_dashboard(&user.username).await?;

    Ok(Json(DashboardResponse {
        revenue_minor: report.revenue.cents(),
        cost_minor: report.cost.cents(),
        gross_profit_minor: report.gross_profit.cents(),
        outstanding_minor: report.outstanding.cents(),
        projects: report
            .projects
            .into_iter()
            .map(|bucket| ProjectBucketView {
                project_id: bucket.project_id,
                name: bucket.name,
                revenue_minor: bucket.revenue.cents(),
                cost_minor: bucket.cost.cents(),
            })
            .collect(),
        vendor_spend: report
            .vendor_spend
            .into_iter()
            .map(|spend| VendorSpendView {
                vendor: spend.vendor,
                total_minor: spend.total.cents(),
            })
            .collect(),
    }))
}
