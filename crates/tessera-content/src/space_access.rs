//! Space Access Resolver.
//!
//! Access is decided from a fresh space summary on every call. A lookup
//! failure of any kind denies access.

use std::collections::HashMap;

use tessera_core::ability::{self, Action, ResourceDescriptor, ResourceKind};
use tessera_core::error::{TesseraError, TesseraResult};
use tessera_core::models::actor::Actor;
use tessera_core::models::space::{SpaceSummary, SpaceVisibility};
use tessera_core::repository::SpaceRepository;
use tracing::debug;
use uuid::Uuid;

/// Whether `actor` may reach a space described by `summary`.
pub fn evaluate(actor: &Actor, summary: &SpaceSummary) -> bool {
    let descriptor = ResourceDescriptor::project(
        ResourceKind::Space,
        summary.organization_id,
        summary.project_id,
    )
    .in_space(Some(summary.id));

    if !ability::can(actor, Action::View, &descriptor) {
        return false;
    }
    match summary.visibility {
        SpaceVisibility::Public => true,
        SpaceVisibility::Restricted => summary.members.contains(&actor.user_id),
    }
}

pub struct SpaceAccessResolver<S: SpaceRepository> {
    spaces: S,
}

impl<S: SpaceRepository> SpaceAccessResolver<S> {
    pub fn new(spaces: S) -> Self {
        Self { spaces }
    }

    /// Visibility and membership of a space.
    pub async fn summary(&self, space_id: Uuid) -> TesseraResult<SpaceSummary> {
        self.spaces.get_space_summary(space_id).await
    }

    pub async fn has_access(&self, actor: &Actor, space_id: Uuid) -> bool {
        match self.spaces.get_space_summary(space_id).await {
            Ok(summary) => evaluate(actor, &summary),
            Err(e) => {
                debug!(%space_id, error = %e, "Space lookup failed, denying access");
                false
            }
        }
    }

    /// As [`has_access`](Self::has_access), reusing decisions already made
    /// in `cache`. The cache must not outlive the request that created it.
    pub async fn has_access_cached(
        &self,
        actor: &Actor,
        space_id: Uuid,
        cache: &mut HashMap<Uuid, bool>,
    ) -> bool {
        if let Some(&allowed) = cache.get(&space_id) {
            return allowed;
        }
        let allowed = self.has_access(actor, space_id).await;
        cache.insert(space_id, allowed);
        allowed
    }

    /// `Forbidden` unless the actor can reach `space_id`. A resource whose
    /// space cannot be resolved (`None`) is never reachable.
    pub async fn check(&self, actor: &Actor, space_id: Option<Uuid>) -> TesseraResult<()> {
        let Some(space_id) = space_id else {
            debug!(user_id = %actor.user_id, "Resource has no space, denying access");
            return Err(TesseraError::forbidden(
                "The space this resource belongs to no longer exists",
            ));
        };
        if !self.has_access(actor, space_id).await {
            debug!(user_id = %actor.user_id, %space_id, "Space access denied");
            return Err(TesseraError::forbidden(
                "You don't have access to the space this resource belongs to",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::models::actor::{OrganizationRole, ProjectRole};

    fn summary(visibility: SpaceVisibility, members: Vec<Uuid>) -> (Uuid, SpaceSummary) {
        let org = Uuid::new_v4();
        (
            org,
            SpaceSummary {
                id: Uuid::new_v4(),
                organization_id: org,
                project_id: Uuid::new_v4(),
                visibility,
                members,
            },
        )
    }

    #[test]
    fn public_space_needs_project_view() {
        let (org, space) = summary(SpaceVisibility::Public, vec![]);
        let viewer = Actor::new(Uuid::new_v4()).in_organization(org, OrganizationRole::Viewer);
        let member_only = Actor::new(Uuid::new_v4()).in_organization(org, OrganizationRole::Member);

        assert!(evaluate(&viewer, &space));
        assert!(!evaluate(&member_only, &space));
    }

    #[test]
    fn restricted_space_needs_membership() {
        let user = Uuid::new_v4();
        let (org, space) = summary(SpaceVisibility::Restricted, vec![user]);
        let member = Actor::new(user).in_organization(org, OrganizationRole::Editor);
        let outsider =
            Actor::new(Uuid::new_v4()).in_organization(org, OrganizationRole::Admin);

        assert!(evaluate(&member, &space));
        assert!(!evaluate(&outsider, &space));
    }

    #[test]
    fn other_organization_is_denied() {
        let user = Uuid::new_v4();
        let (_, space) = summary(SpaceVisibility::Public, vec![user]);
        let foreign = Actor::new(user)
            .in_organization(Uuid::new_v4(), OrganizationRole::Admin)
            .with_project_role(space.project_id, ProjectRole::Admin);

        assert!(!evaluate(&foreign, &space));
    }
}
