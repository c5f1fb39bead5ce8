//! Project records.
//!
//! The engine owns only the two ledger accumulators; the rest of the row
//! (name, client, manager, budget) is reference data maintained elsewhere.
//! `revenue_minor` and `cost_minor` are mutated exclusively by the rollup
//! ops and the reconciliation rebuild, never recomputed on read paths.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EngineError, MoneyCents};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    /// Customer the project is billed to; default party for implicitly
    /// created draft invoices.
    pub client: Option<String>,
    pub manager_id: String,
    pub budget_minor: i64,
    pub revenue_minor: i64,
    pub cost_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::project_members::Entity")]
    Members,
}

impl Related<super::project_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Ledger view of a project.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub client: Option<String>,
    pub manager_id: String,
    pub budget: MoneyCents,
    pub revenue: MoneyCents,
    pub cost: MoneyCents,
}

impl Project {
    pub fn profit(&self) -> MoneyCents {
        self.revenue - self.cost
    }
}

impl TryFrom<Model> for Project {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            name: model.name,
            client: model.client,
            manager_id: model.manager_id,
            budget: MoneyCents::new(model.budget_minor),
            revenue: MoneyCents::new(model.revenue_minor),
            cost: MoneyCents::new(model.cost_minor),
        })
    }
}
