//! Project API endpoints

use api_types::project::{
    LedgerRebuildView, MemberAdd, ProjectCreated, ProjectListResponse, ProjectNew, ProjectView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{MoneyCents, Project, users};

use crate::{ServerError, server::ServerState};

fn map_project(project: Project) -> ProjectView {
    let profit = project.profit();
    ProjectView {
        id: project.id,
        name: project.name,
        client: project.client,
        manager_id: project.manager_id,
        budget_minor: project.budget.cents(),
        revenue_minor: project.revenue.cents(),
        cost_minor: project.cost.cents(),
        profit_minor: profit.cents(),
    }
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ProjectNew>,
) -> Result<(StatusCode, Json<ProjectCreated>), ServerError> {
    let id = state
        .engine
        .create_project(
            &user.username,
            &payload.name,
            payload.client.as_deref(),
            &payload.manager_id,
            MoneyCents::new(payload.budget_minor.unwrap_or(0)),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ProjectCreated { id })))
}

pub async fn get_one(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<ProjectView>, ServerError> {
    let project = state.engine.project(&user.username, &id).await?;
    Ok(Json(map_project(project)))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<ProjectListResponse>, ServerError> {
    let projects = state
        .engine
        .list_projects(&user.username)
        .await?
        .into_iter()
        .map(map_project)
        .collect();

    Ok(Json(ProjectListResponse { projects }))
}

pub async fn add_member(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<MemberAdd>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .add_project_member(&user.username, &id, &payload.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rebuild_ledger(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<LedgerRebuildView>, ServerError> {
    let report = state
        .engine
        .rebuild_project_ledger(&user.username, &id)
        .await?;

    Ok(Json(LedgerRebuildView {
        drift: report.has_drift(),
        project_id: report.project_id,
        stored_revenue_minor: report.stored_revenue.cents(),
        computed_revenue_minor: report.computed_revenue.cents(),
        stored_cost_minor: report.stored_cost.cents(),
        computed_cost_minor: report.computed_cost.cents(),
    }))
}
