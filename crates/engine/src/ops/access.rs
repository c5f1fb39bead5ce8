//! Access scope resolution.
//!
//! Every list/read/mutation path resolves the caller's scope once from
//! their user row and filters inside the query; no op touches billing
//! documents without going through these helpers.

use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*};

use crate::{EngineError, ResultEngine, project_members, projects, users, Role};

use super::Engine;

/// What the caller is allowed to see.
///
/// `Projects` carries the ids a project manager can reach, either as the
/// manager of record or as a plain team member (legacy rows exist where a
/// manager was added only to the members table). `OwnOnly` callers have no
/// billing-document visibility at all; their expense and timesheet lists
/// are restricted to their own submissions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    All,
    Projects(Vec<String>),
    OwnOnly,
}

impl Scope {
    pub fn can_see_project(&self, project_id: &str) -> bool {
        match self {
            Self::All => true,
            Self::Projects(ids) => ids.iter().any(|id| id == project_id),
            Self::OwnOnly => false,
        }
    }
}

impl Engine {
    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("user not exists".to_string()))
    }

    pub(super) fn user_role(&self, user: &users::Model) -> ResultEngine<Role> {
        Role::try_from(user.role.as_str())
    }

    /// Resolve the caller's scope from their user row.
    pub(super) async fn resolve_scope(
        &self,
        db: &DatabaseTransaction,
        user: &users::Model,
    ) -> ResultEngine<Scope> {
        let role = self.user_role(user)?;
        if role.is_unrestricted() {
            return Ok(Scope::All);
        }
        if role != Role::ProjectManager {
            return Ok(Scope::OwnOnly);
        }

        let mut ids: Vec<String> = projects::Entity::find()
            .filter(projects::Column::ManagerId.eq(user.username.clone()))
            .all(db)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();
        let member_rows: Vec<project_members::Model> = project_members::Entity::find()
            .filter(project_members::Column::Username.eq(user.username.clone()))
            .all(db)
            .await?;
        for row in member_rows {
            if !ids.contains(&row.project_id) {
                ids.push(row.project_id);
            }
        }
        Ok(Scope::Projects(ids))
    }

    pub(super) async fn find_project(
        &self,
        db: &DatabaseTransaction,
        project_id: &str,
    ) -> ResultEngine<projects::Model> {
        projects::Entity::find_by_id(project_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("project not exists".to_string()))
    }

    /// Project must exist and be visible to the caller's scope.
    pub(super) async fn require_project_read(
        &self,
        db: &DatabaseTransaction,
        project_id: &str,
        scope: &Scope,
    ) -> ResultEngine<projects::Model> {
        let project = self.find_project(db, project_id).await?;
        if !scope.can_see_project(project_id) {
            return Err(EngineError::Forbidden(
                "project out of scope".to_string(),
            ));
        }
        Ok(project)
    }

    /// Write access to billing documents of a project: admin/finance, or
    /// the managing project manager.
    pub(super) async fn require_project_write(
        &self,
        db: &DatabaseTransaction,
        project_id: &str,
        user: &users::Model,
    ) -> ResultEngine<projects::Model> {
        let role = self.user_role(user)?;
        let project = self.find_project(db, project_id).await?;
        if role.is_unrestricted() {
            return Ok(project);
        }
        if role == Role::ProjectManager && project.manager_id == user.username {
            return Ok(project);
        }
        Err(EngineError::Forbidden(
            "not allowed to write billing documents for this project".to_string(),
        ))
    }

    /// Admin/finance only operations (dashboard, ledger rebuild).
    pub(super) fn require_finance_writer(&self, user: &users::Model) -> ResultEngine<Role> {
        let role = self.user_role(user)?;
        if !role.is_unrestricted() {
            return Err(EngineError::Forbidden(
                "finance or admin role required".to_string(),
            ));
        }
        Ok(role)
    }

    /// Membership or management of the project; what submitting an expense
    /// or logging a timesheet requires.
    pub(super) async fn require_project_member(
        &self,
        db: &DatabaseTransaction,
        project_id: &str,
        user: &users::Model,
    ) -> ResultEngine<projects::Model> {
        let role = self.user_role(user)?;
        let project = self.find_project(db, project_id).await?;
        if role.is_unrestricted() || project.manager_id == user.username {
            return Ok(project);
        }
        let member = project_members::Entity::find_by_id((
            project_id.to_string(),
            user.username.clone(),
        ))
        .one(db)
        .await?;
        if member.is_none() {
            return Err(EngineError::Forbidden(
                "not a member of this project".to_string(),
            ));
        }
        Ok(project)
    }
}
