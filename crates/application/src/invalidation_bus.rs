//! Invalidation bus (C8): evicts cached decisions when the data they were
//! computed from changes, and fans the event out to subscribers.
//!
//! Role assignment events evict just the affected principal's cached
//! decisions. Role and permission lifecycle events affect every principal
//! whose effective role closure includes the role, which this bus finds by
//! walking the role's descendant subtree (roles inherit their ancestors'
//! permissions, so a change at a role propagates down to every descendant
//! that was assigned it) and evicting each assignee. Policy changes can
//! affect any principal in the tenant and evict the whole tenant's
//! decision cache.

use std::sync::Arc;

use authz_core::{PrincipalId, RoleId, TenantId};
use tracing::warn;
use uuid::Uuid;

use crate::cache::{decision_prefix_for_principal, decision_prefix_for_tenant, CachedDecisionStore};
use crate::ports::{AssignmentRepository, InvalidationEvent, InvalidationEventKind, InvalidationSubscriber, RoleRepository};

/// Publishes invalidation events: evicts the affected decision cache
/// entries, then notifies subscribers, isolating any subscriber failure.
pub struct InvalidationBus {
    cache: Arc<CachedDecisionStore>,
    roles: Arc<dyn RoleRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    subscribers: Vec<Arc<dyn InvalidationSubscriber>>,
}

impl InvalidationBus {
    /// Creates a bus over the given cache and repositories, with no
    /// subscribers yet registered.
    #[must_use]
    pub fn new(
        cache: Arc<CachedDecisionStore>,
        roles: Arc<dyn RoleRepository>,
        assignments: Arc<dyn AssignmentRepository>,
    ) -> Self {
        Self { cache, roles, assignments, subscribers: Vec::new() }
    }

    /// Registers a subscriber to be notified of every published event.
    pub fn subscribe(&mut self, subscriber: Arc<dyn InvalidationSubscriber>) {
        self.subscribers.push(subscriber);
    }

    /// Publishes `event`: performs the cache eviction this event kind
    /// requires, then notifies every subscriber. Subscriber errors are
    /// logged and otherwise ignored; they never propagate to the caller,
    /// which has already committed the underlying mutation.
    pub async fn publish(&self, event: InvalidationEvent) {
        if let Err(error) = self.evict(&event).await {
            warn!(%error, kind = ?event.kind, "failed to evict decision cache on invalidation event");
        }

        for subscriber in &self.subscribers {
            if let Err(error) = subscriber.on_event(&event).await {
                warn!(%error, kind = ?event.kind, "invalidation subscriber failed, continuing");
            }
        }
    }

    async fn evict(&self, event: &InvalidationEvent) -> Result<(), authz_core::AppError> {
        match event.kind {
            InvalidationEventKind::RoleAssigned | InvalidationEventKind::RoleRevoked => {
                let principal_id = PrincipalId::from_uuid(event.entity_id);
                let prefix = decision_prefix_for_principal(event.tenant_id, principal_id);
                self.cache.invalidate_prefix(&prefix).await
            }
            InvalidationEventKind::PermissionGranted
            | InvalidationEventKind::PermissionRevoked
            | InvalidationEventKind::RoleCreated
            | InvalidationEventKind::RoleDeleted => {
                let role_id = RoleId::from_uuid(event.entity_id);
                self.evict_descendant_assignees(event.tenant_id, role_id).await
            }
            InvalidationEventKind::PolicyChanged => {
                let prefix = decision_prefix_for_tenant(event.tenant_id);
                self.cache.invalidate_prefix(&prefix).await
            }
        }
    }

    async fn evict_descendant_assignees(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> Result<(), authz_core::AppError> {
        let mut subtree = vec![role_id];
        let mut frontier = vec![role_id];
        while let Some(current) = frontier.pop() {
            let children = self.roles.find_children(tenant_id, current).await?;
            for child in children {
                subtree.push(child.id());
                frontier.push(child.id());
            }
        }

        for role in subtree {
            let assignments = self.assignments.list_for_role(tenant_id, role).await?;
            for assignment in assignments.into_iter().filter(|a| a.is_effective(chrono::Utc::now())) {
                let prefix = decision_prefix_for_principal(tenant_id, assignment.principal_id());
                self.cache.invalidate_prefix(&prefix).await?;
            }
        }

        Ok(())
    }
}

/// Convenience constructor for an `entity_id` field from a typed id.
#[must_use]
pub fn entity_id_from_principal(principal_id: PrincipalId) -> Uuid {
    principal_id.as_uuid()
}

/// Convenience constructor for an `entity_id` field from a typed role id.
#[must_use]
pub fn entity_id_from_role(role_id: RoleId) -> Uuid {
    role_id.as_uuid()
}
