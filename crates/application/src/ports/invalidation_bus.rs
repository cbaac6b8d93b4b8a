use async_trait::async_trait;
use authz_core::TenantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use authz_domain::AttributeMap;

/// The kind of mutation that occurred, driving which cache keys get evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationEventKind {
    /// A role was assigned to a principal.
    RoleAssigned,
    /// A role assignment was revoked.
    RoleRevoked,
    /// A permission was granted to a role.
    PermissionGranted,
    /// A permission was revoked from a role.
    PermissionRevoked,
    /// A role was created.
    RoleCreated,
    /// A role was deleted.
    RoleDeleted,
    /// A policy was created, updated, or had its status changed.
    PolicyChanged,
}

/// A mutation event published to the invalidation bus after its write commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationEvent {
    /// What happened.
    pub kind: InvalidationEventKind,
    /// The tenant the mutation occurred in.
    pub tenant_id: TenantId,
    /// The id of the entity the event concerns (principal id for role
    /// assignment events, role id for permission/role lifecycle events,
    /// policy id for policy events).
    pub entity_id: Uuid,
    /// When the mutation committed.
    pub timestamp: DateTime<Utc>,
    /// Additional context for subscribers.
    pub metadata: AttributeMap,
}

/// A subscriber notified of every invalidation event, after the bus has
/// already performed its own cache evictions. Subscriber failures are
/// isolated by the bus and must never block or fail the publishing call.
#[async_trait]
pub trait InvalidationSubscriber: Send + Sync {
    /// Handles one event. Errors are logged by the bus and otherwise ignored.
    async fn on_event(&self, event: &InvalidationEvent) -> Result<(), String>;
}
