//! Project provisioning and reads.
//!
//! Projects are reference data for the ledger; the accumulators on the
//! row are owned by the rollup ops.

use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, Project, ResultEngine, Role, project_members, projects,
};

use super::{Engine, Scope, normalize_optional_text, normalize_required_text, with_tx};

impl Engine {
    /// Create a project. Admin/finance only; the manager must exist.
    pub async fn create_project(
        &self,
        username: &str,
        name: &str,
        client: Option<&str>,
        manager_id: &str,
        budget: MoneyCents,
    ) -> ResultEngine<String> {
        let name = normalize_required_text(name, "name")?;
        if budget.is_negative() {
            return Err(EngineError::InvalidAmount(
                "budget must be >= 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            self.require_finance_writer(&user)?;
            self.require_user(&db_tx, manager_id).await?;

            let id = Uuid::new_v4().to_string();
            let model = projects::ActiveModel {
                id: ActiveValue::Set(id.clone()),
                name: ActiveValue::Set(name),
                client: ActiveValue::Set(normalize_optional_text(client)),
                manager_id: ActiveValue::Set(manager_id.to_string()),
                budget_minor: ActiveValue::Set(budget.cents()),
                revenue_minor: ActiveValue::Set(0),
                cost_minor: ActiveValue::Set(0),
            };
            model.insert(&db_tx).await?;
            Ok(id)
        })
    }

    /// Add a user to a project's member list.
    pub async fn add_project_member(
        &self,
        username: &str,
        project_id: &str,
        member: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            let role = self.user_role(&user)?;
            let project = self.find_project(&db_tx, project_id).await?;
            if !role.is_unrestricted()
                && !(role == Role::ProjectManager && project.manager_id == user.username)
            {
                return Err(EngineError::Forbidden(
                    "only admin, finance or the manager can add members".to_string(),
                ));
            }
            self.require_user(&db_tx, member).await?;

            let exists = project_members::Entity::find_by_id((
                project_id.to_string(),
                member.to_string(),
            ))
            .one(&db_tx)
            .await?
            .is_some();
            if exists {
                return Ok(());
            }
            let row = project_members::ActiveModel {
                project_id: ActiveValue::Set(project_id.to_string()),
                username: ActiveValue::Set(member.to_string()),
            };
            row.insert(&db_tx).await?;
            Ok(())
        })
    }

    /// Return one project's ledger view under the caller's scope.
    pub async fn project(&self, username: &str, project_id: &str) -> ResultEngine<Project> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            let scope = self.resolve_scope(&db_tx, &user).await?;
            let model = self.require_project_read(&db_tx, project_id, &scope).await?;
            Project::try_from(model)
        })
    }

    /// List the projects visible to the caller.
    pub async fn list_projects(&self, username: &str) -> ResultEngine<Vec<Project>> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, username).await?;
            let scope = self.resolve_scope(&db_tx, &user).await?;
            let models = match &scope {
                Scope::All => projects::Entity::find().all(&db_tx).await?,
                Scope::Projects(ids) => {
                    projects::Entity::find()
                        .filter(projects::Column::Id.is_in(ids.clone()))
                        .all(&db_tx)
                        .await?
                }
                Scope::OwnOnly => Vec::new(),
            };
            models
                .into_iter()
                .map(Project::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
