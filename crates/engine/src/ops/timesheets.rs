//! Timesheet store: log, list own entries, delete own entries.

use chrono::NaiveDate;
use chrono::Utc;
use uuid::Uuid;

use sea_orm::{ModelTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{EngineError, MoneyCents, ResultEngine, Timesheet, timesheets};

use super::{Engine, normalize_optional_text, with_tx};

/// Payload for logging a timesheet entry.
#[derive(Clone, Debug, Default)]
pub struct NewTimesheet {
    pub project_id: String,
    pub hours: f64,
    pub billable: bool,
    pub notes: Option<String>,
    pub worked_on: NaiveDate,
}

/// Filters for listing one's own timesheet entries.
#[derive(Clone, Debug, Default)]
pub struct TimesheetListFilter {
    pub project_id: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl Engine {
    /// Log hours against a project the caller belongs to.
    ///
    /// When the caller has an hourly rate, `round(hours × rate)` is added
    /// to project cost in the same transaction; the applied cost is stored
    /// on the entry so deletion reverses exactly that amount even if the
    /// rate changes later.
    pub async fn log_timesheet(&self, username: &str, cmd: NewTimesheet) -> ResultEngine<Uuid> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            self.require_project_member(&db_tx, &cmd.project_id, &user)
                .await?;

            let cost = if user.hourly_rate_minor > 0 {
                MoneyCents::new((cmd.hours * user.hourly_rate_minor as f64).round() as i64)
            } else {
                MoneyCents::ZERO
            };
            let entry = Timesheet::new(
                cmd.project_id.clone(),
                username.to_string(),
                cmd.hours,
                cmd.billable,
                normalize_optional_text(cmd.notes.as_deref()),
                cost,
                cmd.worked_on,
                Utc::now(),
            )?;
            timesheets::ActiveModel::from(&entry).insert(&db_tx).await?;
            if !cost.is_zero() {
                self.apply_cost(&db_tx, &cmd.project_id, cost).await?;
            }
            Ok(entry.id)
        })
    }

    /// List the caller's own entries, newest working day first.
    pub async fn list_my_timesheets(
        &self,
        username: &str,
        filter: TimesheetListFilter,
    ) -> ResultEngine<Vec<Timesheet>> {
        if let (Some(from), Some(to)) = (filter.from, filter.to)
            && from > to
        {
            return Err(EngineError::Validation(
                "invalid range: from must be <= to".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, username).await?;
            let mut select = timesheets::Entity::find()
                .filter(timesheets::Column::Username.eq(username));
            if let Some(project_id) = &filter.project_id {
                select = select.filter(timesheets::Column::ProjectId.eq(project_id.clone()));
            }
            if let Some(from) = filter.from {
                select = select.filter(timesheets::Column::WorkedOn.gte(from));
            }
            if let Some(to) = filter.to {
                select = select.filter(timesheets::Column::WorkedOn.lte(to));
            }
            let models = select
                .order_by_desc(timesheets::Column::WorkedOn)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Timesheet::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Delete one of the caller's own entries, reversing its cost.
    pub async fn delete_my_timesheet(&self, username: &str, id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, username).await?;
            let model = timesheets::Entity::find_by_id(id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("timesheet not exists".to_string()))?;
            if model.username != username {
                return Err(EngineError::Forbidden(
                    "only the author can delete a timesheet entry".to_string(),
                ));
            }
            let entry = Timesheet::try_from(model.clone())?;
            model.delete(&db_tx).await?;
            if !entry.cost.is_zero() {
                self.apply_cost(&db_tx, &entry.project_id, -entry.cost)
                    .await?;
            }
            Ok(())
        })
    }
}
