//! Capability model.
//!
//! [`can`] answers "may this actor perform this action on this resource"
//! from the actor's memberships and the resource's attributes alone. The
//! rules are a static table keyed by `(resource kind, action)`; anything
//! not in the table is denied.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{TesseraError, TesseraResult};
use crate::models::actor::{Actor, ProjectRole};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
    /// Grants every other action on the same resource kind.
    Manage,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResourceKind {
    SavedChart,
    PinnedItems,
    Space,
    /// A kind this build has no rules for. Always denied.
    Unknown(String),
}

impl ResourceKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "SavedChart" => ResourceKind::SavedChart,
            "PinnedItems" => ResourceKind::PinnedItems,
            "Space" => ResourceKind::Space,
            other => ResourceKind::Unknown(other.into()),
        }
    }
}

/// The attribute tuple a capability check is evaluated against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub organization_id: Uuid,
    pub project_id: Option<Uuid>,
    pub space_id: Option<Uuid>,
}

impl ResourceDescriptor {
    pub fn project(kind: ResourceKind, organization_id: Uuid, project_id: Uuid) -> Self {
        Self {
            kind,
            organization_id,
            project_id: Some(project_id),
            space_id: None,
        }
    }

    pub fn in_space(mut self, space_id: Option<Uuid>) -> Self {
        self.space_id = space_id;
        self
    }
}

/// Attributes a descriptor must carry for a rule to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredAttributes {
    pub project: bool,
    pub space: bool,
}

const ORG_PROJECT: RequiredAttributes = RequiredAttributes {
    project: true,
    space: false,
};

const ORG_PROJECT_SPACE: RequiredAttributes = RequiredAttributes {
    project: true,
    space: true,
};

struct Rule {
    kind: ResourceKind,
    action: Action,
    requires: RequiredAttributes,
    min_role: ProjectRole,
}

static RULES: &[Rule] = &[
    Rule {
        kind: ResourceKind::SavedChart,
        action: Action::View,
        requires: ORG_PROJECT,
        min_role: ProjectRole::Viewer,
    },
    Rule {
        kind: ResourceKind::SavedChart,
        action: Action::Create,
        requires: ORG_PROJECT,
        min_role: ProjectRole::Editor,
    },
    Rule {
        kind: ResourceKind::SavedChart,
        action: Action::Update,
        requires: ORG_PROJECT_SPACE,
        min_role: ProjectRole::Editor,
    },
    Rule {
        kind: ResourceKind::SavedChart,
        action: Action::Delete,
        requires: ORG_PROJECT_SPACE,
        min_role: ProjectRole::Editor,
    },
    Rule {
        kind: ResourceKind::PinnedItems,
        action: Action::View,
        requires: ORG_PROJECT,
        min_role: ProjectRole::Viewer,
    },
    Rule {
        kind: ResourceKind::PinnedItems,
        action: Action::Manage,
        requires: ORG_PROJECT,
        min_role: ProjectRole::Editor,
    },
    Rule {
        kind: ResourceKind::Space,
        action: Action::View,
        requires: ORG_PROJECT_SPACE,
        min_role: ProjectRole::Viewer,
    },
    Rule {
        kind: ResourceKind::Space,
        action: Action::Manage,
        requires: ORG_PROJECT_SPACE,
        min_role: ProjectRole::Admin,
    },
];

fn rule_for(kind: &ResourceKind, action: Action) -> Option<&'static Rule> {
    RULES
        .iter()
        .find(|rule| rule.kind == *kind && rule.action == action)
}

fn satisfies(actor: &Actor, rule: &Rule, resource: &ResourceDescriptor) -> bool {
    let Some(membership) = &actor.organization else {
        return false;
    };
    if membership.organization_id != resource.organization_id {
        return false;
    }
    if (rule.requires.project && resource.project_id.is_none())
        || (rule.requires.space && resource.space_id.is_none())
    {
        return false;
    }
    let role = match resource.project_id {
        Some(project_id) => actor.project_role(project_id),
        None => membership.role.implied_project_role(),
    };
    role.is_some_and(|role| role >= rule.min_role)
}

/// Whether `actor` may perform `action` on `resource`.
///
/// Pure and synchronous. A `false` result is not an error; callers turn
/// it into one with [`ensure`].
pub fn can(actor: &Actor, action: Action, resource: &ResourceDescriptor) -> bool {
    let direct =
        rule_for(&resource.kind, action).is_some_and(|rule| satisfies(actor, rule, resource));
    direct
        || (action != Action::Manage
            && rule_for(&resource.kind, Action::Manage)
                .is_some_and(|rule| satisfies(actor, rule, resource)))
}

/// [`can`], turned into a [`TesseraError::Forbidden`] on denial.
pub fn ensure(actor: &Actor, action: Action, resource: &ResourceDescriptor) -> TesseraResult<()> {
    if can(actor, action, resource) {
        Ok(())
    } else {
        Err(TesseraError::forbidden(format!(
            "cannot {action:?} {:?} in project {}",
            resource.kind,
            resource
                .project_id
                .map_or_else(|| "-".to_string(), |id| id.to_string())
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::actor::OrganizationRole;

    struct Fixture {
        org: Uuid,
        project: Uuid,
        space: Uuid,
    }

    fn fixture() -> Fixture {
        Fixture {
            org: Uuid::new_v4(),
            project: Uuid::new_v4(),
            space: Uuid::new_v4(),
        }
    }

    fn chart(f: &Fixture) -> ResourceDescriptor {
        ResourceDescriptor::project(ResourceKind::SavedChart, f.org, f.project)
            .in_space(Some(f.space))
    }

    #[test]
    fn editor_can_mutate_charts() {
        let f = fixture();
        let editor = Actor::new(Uuid::new_v4()).in_organization(f.org, OrganizationRole::Editor);
        for action in [Action::View, Action::Create, Action::Update, Action::Delete] {
            assert!(can(&editor, action, &chart(&f)), "{action:?}");
        }
    }

    #[test]
    fn viewer_can_only_view() {
        let f = fixture();
        let viewer = Actor::new(Uuid::new_v4()).in_organization(f.org, OrganizationRole::Viewer);
        assert!(can(&viewer, Action::View, &chart(&f)));
        assert!(!can(&viewer, Action::Update, &chart(&f)));
        assert!(!can(&viewer, Action::Create, &chart(&f)));
    }

    #[test]
    fn other_organization_is_denied() {
        let f = fixture();
        let admin =
            Actor::new(Uuid::new_v4()).in_organization(Uuid::new_v4(), OrganizationRole::Admin);
        assert!(!can(&admin, Action::View, &chart(&f)));
    }

    #[test]
    fn orgless_actor_is_denied() {
        let f = fixture();
        let actor = Actor::new(Uuid::new_v4()).with_project_role(f.project, ProjectRole::Admin);
        assert!(!can(&actor, Action::View, &chart(&f)));
    }

    #[test]
    fn update_requires_space_attribute() {
        let f = fixture();
        let editor = Actor::new(Uuid::new_v4()).in_organization(f.org, OrganizationRole::Editor);
        let no_space = chart(&f).in_space(None);
        assert!(!can(&editor, Action::Update, &no_space));
        assert!(can(&editor, Action::Create, &no_space));
    }

    #[test]
    fn manage_covers_view_for_pinned_items() {
        let f = fixture();
        let editor = Actor::new(Uuid::new_v4())
            .in_organization(f.org, OrganizationRole::Member)
            .with_project_role(f.project, ProjectRole::Editor);
        let pins = ResourceDescriptor::project(ResourceKind::PinnedItems, f.org, f.project);
        assert!(can(&editor, Action::Manage, &pins));
        assert!(can(&editor, Action::View, &pins));
        assert!(!can(&editor, Action::Delete, &chart(&f).in_space(None)));
    }

    #[test]
    fn viewer_cannot_manage_pins() {
        let f = fixture();
        let viewer = Actor::new(Uuid::new_v4()).in_organization(f.org, OrganizationRole::Viewer);
        let pins = ResourceDescriptor::project(ResourceKind::PinnedItems, f.org, f.project);
        assert!(!can(&viewer, Action::Manage, &pins));
        assert!(ensure(&viewer, Action::Manage, &pins).is_err());
    }

    #[test]
    fn unknown_kinds_fail_closed() {
        let f = fixture();
        let admin = Actor::new(Uuid::new_v4()).in_organization(f.org, OrganizationRole::Admin);
        let resource = ResourceDescriptor::project(ResourceKind::parse("Widget"), f.org, f.project);
        assert_eq!(resource.kind, ResourceKind::Unknown("Widget".into()));
        for action in [
            Action::View,
            Action::Create,
            Action::Update,
            Action::Delete,
            Action::Manage,
        ] {
            assert!(!can(&admin, action, &resource));
        }
    }

    #[test]
    fn project_membership_is_scoped_to_its_project() {
        let f = fixture();
        let actor = Actor::new(Uuid::new_v4())
            .in_organization(f.org, OrganizationRole::Member)
            .with_project_role(f.project, ProjectRole::Editor);
        let elsewhere =
            ResourceDescriptor::project(ResourceKind::SavedChart, f.org, Uuid::new_v4());
        assert!(!can(&actor, Action::View, &elsewhere));
    }
}
