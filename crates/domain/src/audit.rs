use authz_core::{AuditEntryId, NonEmptyString, PrincipalId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attributes::AttributeMap;

/// The outcome recorded for an authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// The request was allowed.
    Allowed,
    /// The request was denied.
    Denied,
}

/// The fields hashed into an audit entry's `request_hash`, before chaining.
///
/// Kept as a standalone builder-input type, distinct from the persisted
/// `AuditEntry`, so the hash chain's input shape is fixed independently of
/// how the entry is eventually stored (e.g. without `id` or `previous_hash`,
/// which do not exist until the entry is appended).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntryInput {
    /// Tenant the decision was made for.
    pub tenant_id: TenantId,
    /// Principal the decision was made for.
    pub principal_id: PrincipalId,
    /// The action requested.
    pub action: String,
    /// The type of resource the action targets.
    pub resource_type: String,
    /// The identifier of the resource the action targets.
    pub resource_id: String,
    /// The decision outcome.
    pub decision: Decision,
    /// A human-readable reason for the outcome.
    pub reason: String,
    /// The name of the policy that produced the decision, if any.
    pub policy_evaluated: Option<String>,
    /// Additional context attached to the decision for later inspection.
    pub metadata: AttributeMap,
}

/// The identifying fields a `request_hash`/`derived_hash` is computed over:
/// `{tenant_id, principal_id, action, resource:{type,id}}`, nothing else.
/// `decision`/`reason`/`policy_evaluated`/`metadata` are recorded on the
/// entry but excluded from the hash, so re-deriving a stored entry's reason
/// text (which may legitimately differ in wording across implementations)
/// never changes its hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestHashFields {
    tenant_id: TenantId,
    principal_id: PrincipalId,
    action: String,
    resource: ResourceHashFields,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResourceHashFields {
    #[serde(rename = "type")]
    resource_type: String,
    id: String,
}

impl From<&AuditEntryInput> for RequestHashFields {
    fn from(input: &AuditEntryInput) -> Self {
        Self {
            tenant_id: input.tenant_id,
            principal_id: input.principal_id,
            action: input.action.clone(),
            resource: ResourceHashFields {
                resource_type: input.resource_type.clone(),
                id: input.resource_id.clone(),
            },
        }
    }
}

/// An immutable, hash-chained audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    id: AuditEntryId,
    tenant_id: TenantId,
    principal_id: PrincipalId,
    action: NonEmptyString,
    resource_type: NonEmptyString,
    resource_id: NonEmptyString,
    decision: Decision,
    reason: String,
    policy_evaluated: Option<String>,
    request_hash: String,
    previous_hash: String,
    derived_hash: String,
    timestamp: DateTime<Utc>,
    metadata: AttributeMap,
}

impl AuditEntry {
    /// Assembles a persisted audit entry from its input fields and the
    /// already-computed hash chain values. The hashes themselves are
    /// computed by `authz_core::hashing` against `AuditEntryInput`, not
    /// here, so the chaining algorithm has exactly one implementation.
    /// `derived_hash` becomes the tenant's new chain head once this entry
    /// is durably appended.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: AuditEntryId,
        input: AuditEntryInput,
        request_hash: String,
        previous_hash: String,
        derived_hash: String,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, authz_core::AppError> {
        Ok(Self {
            id,
            tenant_id: input.tenant_id,
            principal_id: input.principal_id,
            action: NonEmptyString::new(input.action)?,
            resource_type: NonEmptyString::new(input.resource_type)?,
            resource_id: NonEmptyString::new(input.resource_id)?,
            decision: input.decision,
            reason: input.reason,
            policy_evaluated: input.policy_evaluated,
            request_hash,
            previous_hash,
            derived_hash,
            timestamp,
            metadata: input.metadata,
        })
    }

    /// Returns the audit entry identifier.
    #[must_use]
    pub fn id(&self) -> AuditEntryId {
        self.id
    }

    /// Returns the owning tenant identifier.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the principal the decision was made for.
    #[must_use]
    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    /// Returns the requested action.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_str()
    }

    /// Returns the targeted resource type.
    #[must_use]
    pub fn resource_type(&self) -> &str {
        self.resource_type.as_str()
    }

    /// Returns the targeted resource id.
    #[must_use]
    pub fn resource_id(&self) -> &str {
        self.resource_id.as_str()
    }

    /// Returns the decision outcome.
    #[must_use]
    pub fn decision(&self) -> Decision {
        self.decision
    }

    /// Returns the human-readable reason for the outcome.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Returns the name of the policy that produced the decision, if any.
    #[must_use]
    pub fn policy_evaluated(&self) -> Option<&str> {
        self.policy_evaluated.as_deref()
    }

    /// Returns this entry's own request hash.
    #[must_use]
    pub fn request_hash(&self) -> &str {
        &self.request_hash
    }

    /// Returns the previous entry's derived hash, chaining this entry to it.
    #[must_use]
    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    /// Returns this entry's derived hash, the chain head once appended.
    #[must_use]
    pub fn derived_hash(&self) -> &str {
        &self.derived_hash
    }

    /// Returns when the decision was recorded.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the entry's additional metadata.
    #[must_use]
    pub fn metadata(&self) -> &AttributeMap {
        &self.metadata
    }
}
