//! Timesheet entries.
//!
//! A logged entry adds `hours * hourly_rate` to project cost when the
//! author has a rate; deleting the entry reverses the same amount.
//! Entries have no status, only the `billable` flag.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timesheet {
    pub id: Uuid,
    pub project_id: String,
    pub username: String,
    pub hours: f64,
    pub billable: bool,
    pub notes: Option<String>,
    /// Cost applied to the project ledger at log time, kept so the
    /// deletion reversal matches even if the user's rate changes later.
    pub cost: MoneyCents,
    pub worked_on: NaiveDate,
    pub logged_at: DateTime<Utc>,
}

impl Timesheet {
    pub fn new(
        project_id: String,
        username: String,
        hours: f64,
        billable: bool,
        notes: Option<String>,
        cost: MoneyCents,
        worked_on: NaiveDate,
        logged_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if !hours.is_finite() || hours <= 0.0 {
            return Err(EngineError::Validation(
                "hours must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            project_id,
            username,
            hours,
            billable,
            notes,
            cost,
            worked_on,
            logged_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "timesheets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub project_id: String,
    pub username: String,
    pub hours: f64,
    pub billable: bool,
    pub notes: Option<String>,
    pub cost_minor: i64,
    pub worked_on: Date,
    pub logged_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::Username",
        to = "super::users::Column::Username"
    )]
    User,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Timesheet> for ActiveModel {
    fn from(ts: &Timesheet) -> Self {
        Self {
            id: ActiveValue::Set(ts.id.to_string()),
            project_id: ActiveValue::Set(ts.project_id.clone()),
            username: ActiveValue::Set(ts.username.clone()),
            hours: ActiveValue::Set(ts.hours),
            billable: ActiveValue::Set(ts.billable),
            notes: ActiveValue::Set(ts.notes.clone()),
            cost_minor: ActiveValue::Set(ts.cost.cents()),
            worked_on: ActiveValue::Set(ts.worked_on),
            logged_at: ActiveValue::Set(ts.logged_at),
        }
    }
}

impl TryFrom<Model> for Timesheet {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("timesheet not exists".to_string()))?,
            project_id: model.project_id,
            username: model.username,
            hours: model.hours,
            billable: model.billable,
            notes: model.notes,
            cost: MoneyCents::new(model.cost_minor),
            worked_on: model.worked_on,
            logged_at: model.logged_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_hours() {
        let entry = Timesheet::new(
            "p1".to_string(),
            "mario".to_string(),
            0.0,
            true,
            None,
            MoneyCents::ZERO,
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            Utc::now(),
        );
        assert!(matches!(entry, Err(EngineError::Validation(_))));
    }
}
