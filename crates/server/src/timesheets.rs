//! Timesheet API endpoints

use api_types::timesheet::{TimesheetListQuery, TimesheetListResponse, TimesheetNew, TimesheetView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{NewTimesheet, Timesheet, TimesheetListFilter, users};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn map_entry(entry: Timesheet) -> TimesheetView {
    TimesheetView {
        id: entry.id,
        project_id: entry.project_id,
        username: entry.username,
        hours: entry.hours,
        billable: entry.billable,
        notes: entry.notes,
        cost_minor: entry.cost.cents(),
        worked_on: entry.worked_on,
        logged_at: entry.logged_at,
    }
}

pub async fn log(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TimesheetNew>,
) -> Result<(StatusCode, Json<api_types::DocumentCreated>), ServerError> {
    let id = state
        .engine
        .log_timesheet(
            &user.username,
            NewTimesheet {
                project_id: payload.project_id,
                hours: payload.hours,
                billable: payload.billable,
                notes: payload.notes,
                worked_on: payload.worked_on,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(api_types::DocumentCreated { id })))
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<TimesheetListQuery>,
) -> Result<Json<TimesheetListResponse>, ServerError> {
    let filter = TimesheetListFilter {
        project_id: query.project_id,
        from: query.from,
        to: query.to,
    };

    let timesheets = state
        .engine
        .list_my_timesheets(&user.username, filter)
        .await?
        .into_iter()
        .map(map_entry)
        .collect();

    Ok(Json(TimesheetListResponse { timesheets }))
}

pub async fn remove(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_my_timesheet(&user.username, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
