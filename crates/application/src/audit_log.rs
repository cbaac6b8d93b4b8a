//! Tamper-evident audit log service (C9).
//!
//! Every decision is appended as a hash-chained entry: `request_hash` binds
//! the entry's own fields, `previous_hash` binds it to the chain, and
//! `derived_hash` becomes the new chain head. Appends for a single tenant
//! are serialized through a keyed async mutex so the read of the current
//! head and the subsequent write can never interleave across concurrent
//! requests for that tenant; different tenants append fully in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use authz_core::{hashing, AppResult, AuditEntryId, TenantId};
use authz_domain::{AuditEntry, AuditEntryInput, RequestHashFields};
use chrono::Utc;
use tokio::sync::Mutex;

use crate::ports::{AuditQuery, AuditRepository};

/// The result of re-deriving a tenant's audit chain from scratch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainVerification {
    /// Every entry's hashes re-derive correctly and chain to the next.
    Intact,
    /// The entry at `entry_id` does not match its expected hash.
    Broken {
        /// The first entry found to be inconsistent with the chain.
        entry_id: AuditEntryId,
        /// A human-readable description of the mismatch.
        reason: String,
    },
}

/// Appends and verifies the hash-chained audit log for every tenant.
pub struct AuditLogService {
    repository: Arc<dyn AuditRepository>,
    tenant_locks: Mutex<HashMap<TenantId, Arc<Mutex<()>>>>,
}

impl AuditLogService {
    /// Creates a service backed by `repository`.
    #[must_use]
    pub fn new(repository: Arc<dyn AuditRepository>) -> Self {
        Self {
            repository,
            tenant_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, tenant_id: TenantId) -> Arc<Mutex<()>> {
        let mut locks = self.tenant_locks.lock().await;
        locks.entry(tenant_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Computes the entry's hashes against the tenant's current chain head
    /// and appends it, advancing the head to the new `derived_hash`.
    ///
    /// Holds a per-tenant lock across the head read and the append so two
    /// concurrent decisions for the same tenant can never derive from the
    /// same head and silently fork the chain.
    pub async fn append(&self, input: AuditEntryInput) -> AppResult<AuditEntry> {
        let tenant_id = input.tenant_id;
        let tenant_lock = self.lock_for(tenant_id).await;
        let _guard = tenant_lock.lock().await;

        let previous_hash = self.repository.chain_head(tenant_id).await?;
        let hash_fields = RequestHashFields::from(&input);
        let request_hash = hashing::request_hash(&hash_fields)?;
        let derived = hashing::derived_hash(&previous_hash, &hash_fields)?;

        let entry = AuditEntry::new(
            AuditEntryId::new(),
            input,
            request_hash,
            previous_hash,
            derived,
            Utc::now(),
        )?;

        self.repository.append(entry).await
    }

    /// Queries the tenant's audit log.
    pub async fn query(&self, tenant_id: TenantId, query: AuditQuery) -> AppResult<Vec<AuditEntry>> {
        self.repository.query(tenant_id, query).await
    }

    /// Re-derives every entry's hashes from its recorded fields and checks
    /// that the chain is unbroken, reporting the first inconsistency found.
    pub async fn verify_chain(&self, tenant_id: TenantId) -> AppResult<ChainVerification> {
        let entries = self.repository.query(tenant_id, AuditQuery::default()).await?;

        let mut expected_previous = hashing::GENESIS_HASH.to_owned();
        for entry in entries {
            let input = AuditEntryInput {
                tenant_id: entry.tenant_id(),
                principal_id: entry.principal_id(),
                action: entry.action().to_owned(),
                resource_type: entry.resource_type().to_owned(),
                resource_id: entry.resource_id().to_owned(),
                decision: entry.decision(),
                reason: entry.reason().to_owned(),
                policy_evaluated: entry.policy_evaluated().map(str::to_owned),
                metadata: entry.metadata().clone(),
            };
            let hash_fields = RequestHashFields::from(&input);

            let expected_request_hash = hashing::request_hash(&hash_fields)?;
            if expected_request_hash != entry.request_hash() {
                return Ok(ChainVerification::Broken {
                    entry_id: entry.id(),
                    reason: "request_hash does not match recorded fields".to_owned(),
                });
            }

            if entry.previous_hash() != expected_previous {
                return Ok(ChainVerification::Broken {
                    entry_id: entry.id(),
                    reason: "previous_hash does not match the prior entry's derived_hash".to_owned(),
                });
            }

            let expected_derived = hashing::derived_hash(entry.previous_hash(), &hash_fields)?;
            if expected_derived != entry.derived_hash() {
                return Ok(ChainVerification::Broken {
                    entry_id: entry.id(),
                    reason: "derived_hash does not match the recomputed value".to_owned(),
                });
            }

            expected_previous = entry.derived_hash().to_owned();
        }

        Ok(ChainVerification::Intact)
    }
}

#[cfg(test)]
mod tests {
    use super::{AuditLogService, ChainVerification};
    use crate::ports::AuditQuery;
    use crate::test_support::InMemoryAuditRepository;
    use authz_core::{PrincipalId, TenantId};
    use authz_domain::{AttributeMap, AuditEntryInput, Decision};
    use std::sync::Arc;

    fn input(tenant_id: TenantId) -> AuditEntryInput {
        AuditEntryInput {
            tenant_id,
            principal_id: PrincipalId::new(),
            action: "invoice.read".to_owned(),
            resource_type: "invoice".to_owned(),
            resource_id: "inv-1".to_owned(),
            decision: Decision::Allowed,
            reason: "role grants permission".to_owned(),
            policy_evaluated: None,
            metadata: AttributeMap::new(),
        }
    }

    #[tokio::test]
    async fn appended_entries_chain_together() {
        let service = AuditLogService::new(Arc::new(InMemoryAuditRepository::new()));
        let tenant_id = TenantId::new();

        let first = service.append(input(tenant_id)).await.expect("append");
        let second = service.append(input(tenant_id)).await.expect("append");

        assert_eq!(first.previous_hash(), "initial");
        assert_eq!(second.previous_hash(), first.derived_hash());
        assert_ne!(first.derived_hash(), second.derived_hash());
    }

    #[tokio::test]
    async fn verify_chain_reports_intact_for_untampered_log() {
        let service = AuditLogService::new(Arc::new(InMemoryAuditRepository::new()));
        let tenant_id = TenantId::new();
        service.append(input(tenant_id)).await.expect("append");
        service.append(input(tenant_id)).await.expect("append");

        let verification = service.verify_chain(tenant_id).await.expect("verify");
        assert_eq!(verification, ChainVerification::Intact);
    }

    #[tokio::test]
    async fn verify_chain_detects_tampering_at_the_altered_entry() {
        let repository = Arc::new(InMemoryAuditRepository::new());
        let service = AuditLogService::new(repository.clone());
        let tenant_id = TenantId::new();

        for _ in 0..5 {
            service.append(input(tenant_id)).await.expect("append");
        }

        let entries = repository.entries();
        let mut tampered_json = serde_json::to_value(&entries[2]).expect("serialize");
        tampered_json["action"] = serde_json::json!("invoice.delete-tampered");
        let tampered: authz_domain::AuditEntry = serde_json::from_value(tampered_json).expect("deserialize");
        repository.tamper(2, tampered);

        let verification = service.verify_chain(tenant_id).await.expect("verify");
        match verification {
            ChainVerification::Broken { entry_id, .. } => assert_eq!(entry_id, entries[2].id()),
            ChainVerification::Intact => panic!("expected tampering to be detected"),
        }
    }

    #[tokio::test]
    async fn query_is_scoped_to_tenant() {
        let service = AuditLogService::new(Arc::new(InMemoryAuditRepository::new()));
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        service.append(input(tenant_a)).await.expect("append");

        let entries = service.query(tenant_b, AuditQuery::default()).await.expect("query");
        assert!(entries.is_empty());
    }
}
