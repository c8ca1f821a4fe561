//! Authenticated actor model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role held inside an organization. Applies to every project of the
/// organization unless a project membership grants more.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum OrganizationRole {
    Member,
    Viewer,
    Editor,
    Developer,
    Admin,
}

/// Role held on a single project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProjectRole {
    Viewer,
    Editor,
    Developer,
    Admin,
}

impl OrganizationRole {
    /// The project role implied for every project of the organization.
    pub fn implied_project_role(self) -> Option<ProjectRole> {
        match self {
            OrganizationRole::Member => None,
            OrganizationRole::Viewer => Some(ProjectRole::Viewer),
            OrganizationRole::Editor => Some(ProjectRole::Editor),
            OrganizationRole::Developer => Some(ProjectRole::Developer),
            OrganizationRole::Admin => Some(ProjectRole::Admin),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrganizationMembership {
    pub organization_id: Uuid,
    pub role: OrganizationRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectMembership {
    pub project_id: Uuid,
    pub role: ProjectRole,
}

/// The identity performing an operation.
///
/// Built once at session/token validation and immutable for the rest of
/// the request. Capabilities are derived from it by
/// [`crate::ability::can`]; they are never stored on the actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Uuid,
    pub organization: Option<OrganizationMembership>,
    pub projects: Vec<ProjectMembership>,
}

impl Actor {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            organization: None,
            projects: Vec::new(),
        }
    }

    pub fn in_organization(mut self, organization_id: Uuid, role: OrganizationRole) -> Self {
        self.organization = Some(OrganizationMembership {
            organization_id,
            role,
        });
        self
    }

    pub fn with_project_role(mut self, project_id: Uuid, role: ProjectRole) -> Self {
        self.projects.push(ProjectMembership { project_id, role });
        self
    }

    pub fn organization_id(&self) -> Option<Uuid> {
        self.organization.as_ref().map(|m| m.organization_id)
    }

    /// Effective role on a project: the stronger of the organization-wide
    /// role and any explicit project membership.
    pub fn project_role(&self, project_id: Uuid) -> Option<ProjectRole> {
        let inherited = self
            .organization
            .as_ref()
            .and_then(|m| m.role.implied_project_role());
        let explicit = self
            .projects
            .iter()
            .filter(|m| m.project_id == project_id)
            .map(|m| m.role)
            .max();
        inherited.max(explicit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_project_role_upgrades_org_role() {
        let org = Uuid::new_v4();
        let project = Uuid::new_v4();
        let actor = Actor::new(Uuid::new_v4())
            .in_organization(org, OrganizationRole::Viewer)
            .with_project_role(project, ProjectRole::Editor);

        assert_eq!(actor.project_role(project), Some(ProjectRole::Editor));
        assert_eq!(actor.project_role(Uuid::new_v4()), Some(ProjectRole::Viewer));
    }

    #[test]
    fn plain_member_has_no_project_role() {
        let actor =
            Actor::new(Uuid::new_v4()).in_organization(Uuid::new_v4(), OrganizationRole::Member);
        assert_eq!(actor.project_role(Uuid::new_v4()), None);
    }
}
