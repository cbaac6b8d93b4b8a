//! Decision Orchestrator (C10): the public entry point wiring the role
//! closure resolver, RBAC/ABAC evaluators, policy engine, decision cache,
//! and audit log into a single `evaluate` call.

use std::sync::Arc;
use std::time::Duration;

use authz_core::{AppResult, PrincipalId, TenantId};
use authz_domain::{AttributeMap, AttributeValue, AuditEntryInput, Decision};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::abac::AbacEvaluator;
use crate::audit_log::AuditLogService;
use crate::cache::{decision_key, CachedDecisionStore};
use crate::policy_engine::{PolicyContext, PolicyEngine};
use crate::ports::{CacheClass, PermissionRepository, PolicyRepository};
use crate::rbac::RbacEvaluator;
use crate::role_closure::RoleClosureResolver;

/// A request to decide whether `principal_id` may perform `action` on the
/// named resource, within `tenant_id`.
#[derive(Debug, Clone)]
pub struct EvaluateRequest {
    /// Tenant the request is scoped to.
    pub tenant_id: TenantId,
    /// The principal requesting access.
    pub principal_id: PrincipalId,
    /// The action requested, e.g. `"delete"`.
    pub action: String,
    /// The type of resource targeted, e.g. `"invoice"`.
    pub resource_type: String,
    /// The identifier of the resource targeted.
    pub resource_id: String,
    /// Attributes of the resource, as asserted by the caller.
    pub resource_attributes: AttributeMap,
    /// Attributes of the principal, as asserted by the caller.
    pub principal_attributes: AttributeMap,
    /// Free-form request context (e.g. time of day, originating IP class).
    pub context: AttributeMap,
}

/// The composed result of an `evaluate` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluateResponse {
    /// Whether the request is allowed.
    pub allowed: bool,
    /// A human-readable justification for the decision.
    pub reason: String,
    /// Elaborates on `reason`; echoes a matching rule's description.
    pub explanation: String,
    /// The name of the policy that produced the decision, if any.
    pub policy_evaluated: Option<String>,
    /// Descriptions of any ABAC predicates that failed.
    pub failed_conditions: Vec<String>,
    /// When this decision was computed (not when it was returned, on a cache hit).
    pub evaluated_at: DateTime<Utc>,
    /// Whether this response was served from the decision cache.
    pub cache_hit: bool,
}

/// The subset of a response that is cached; `cache_hit` is never itself
/// cached, it is set to `true` by the caller on every cache hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedDecision {
    allowed: bool,
    reason: String,
    explanation: String,
    policy_evaluated: Option<String>,
    failed_conditions: Vec<String>,
    evaluated_at: DateTime<Utc>,
}

impl EvaluateResponse {
    fn from_cached(cached: CachedDecision) -> Self {
        Self {
            allowed: cached.allowed,
            reason: cached.reason,
            explanation: cached.explanation,
            policy_evaluated: cached.policy_evaluated,
            failed_conditions: cached.failed_conditions,
            evaluated_at: cached.evaluated_at,
            cache_hit: true,
        }
    }

    fn to_cached(&self) -> CachedDecision {
        CachedDecision {
            allowed: self.allowed,
            reason: self.reason.clone(),
            explanation: self.explanation.clone(),
            policy_evaluated: self.policy_evaluated.clone(),
            failed_conditions: self.failed_conditions.clone(),
            evaluated_at: self.evaluated_at,
        }
    }
}

fn invalid_request(reason: impl Into<String>) -> EvaluateResponse {
    let reason = reason.into();
    EvaluateResponse {
        allowed: false,
        reason: reason.clone(),
        explanation: reason,
        policy_evaluated: None,
        failed_conditions: Vec::new(),
        evaluated_at: Utc::now(),
        cache_hit: false,
    }
}

fn internal_error(detail: &str) -> EvaluateResponse {
    EvaluateResponse {
        allowed: false,
        reason: "Internal authorization error".to_owned(),
        explanation: format!("Internal authorization error: {detail}"),
        policy_evaluated: None,
        failed_conditions: Vec::new(),
        evaluated_at: Utc::now(),
        cache_hit: false,
    }
}

/// Wires the decision engine's components into the public `evaluate` operation.
pub struct DecisionOrchestrator {
    role_closure: RoleClosureResolver,
    permissions: Arc<dyn PermissionRepository>,
    policies: Arc<dyn PolicyRepository>,
    cache: Arc<CachedDecisionStore>,
    audit: Arc<AuditLogService>,
    deadline: Duration,
}

impl DecisionOrchestrator {
    /// Creates an orchestrator over the given components. `deadline` bounds
    /// the whole `evaluate` call; exceeding it yields an `internal_error`
    /// denial with no cache write and no audit append.
    #[must_use]
    pub fn new(
        role_closure: RoleClosureResolver,
        permissions: Arc<dyn PermissionRepository>,
        policies: Arc<dyn PolicyRepository>,
        cache: Arc<CachedDecisionStore>,
        audit: Arc<AuditLogService>,
        deadline: Duration,
    ) -> Self {
        Self { role_closure, permissions, policies, cache, audit, deadline }
    }

    /// Decides whether the request is allowed, per spec.md §4.10's eight-step flow.
    pub async fn evaluate(&self, request: EvaluateRequest) -> EvaluateResponse {
        match tokio::time::timeout(self.deadline, self.evaluate_inner(request)).await {
            Ok(response) => response,
            Err(_elapsed) => internal_error("evaluation deadline exceeded"),
        }
    }

    async fn evaluate_inner(&self, request: EvaluateRequest) -> EvaluateResponse {
        if let Some(invalid) = Self::validate(&request) {
            return invalid;
        }

        let key = decision_key(
            request.tenant_id,
            request.principal_id,
            &request.action,
            &request.resource_type,
            &request.resource_id,
        );

        if let Some(cached) = self.cache.get::<CachedDecision>(&key).await {
            return EvaluateResponse::from_cached(cached);
        }

        let (response, depth_limit_reached) = match self.decide(&request).await {
            Ok(outcome) => outcome,
            Err(error) => {
                error!(%error, tenant_id = %request.tenant_id, "evaluation failed, returning fail-closed denial");
                return internal_error(&error.to_string());
            }
        };

        self.cache.put(&key, &response.to_cached(), CacheClass::Decision).await;
        self.append_audit(&request, &response, depth_limit_reached).await;

        response
    }

    fn validate(request: &EvaluateRequest) -> Option<EvaluateResponse> {
        if request.action.trim().is_empty() {
            return Some(invalid_request("Invalid request: action is required"));
        }
        if request.resource_type.trim().is_empty() {
            return Some(invalid_request("Invalid request: resource.type is required"));
        }
        if request.resource_id.trim().is_empty() {
            return Some(invalid_request("Invalid request: resource.id is required"));
        }
        None
    }

    async fn decide(&self, request: &EvaluateRequest) -> AppResult<(EvaluateResponse, bool)> {
        let required_permission = format!("{}.{}", request.resource_type, request.action);

        let closure = self.role_closure.resolve(request.tenant_id, request.principal_id).await?;
        let depth_limit_reached = closure.depth_limit_reached;
        let mut role_permission_names = Vec::with_capacity(closure.roles.len());
        for role in &closure.roles {
            let names = self
                .permissions
                .list_for_role(request.tenant_id, role.id())
                .await?
                .into_iter()
                .map(|permission| permission.name().to_owned())
                .collect();
            role_permission_names.push((role.clone(), names));
        }

        let rbac = RbacEvaluator::evaluate(&closure, &role_permission_names, &required_permission);
        if !rbac.allowed {
            return Ok((
                EvaluateResponse {
                    allowed: false,
                    reason: rbac.reason.clone(),
                    explanation: rbac.reason,
                    policy_evaluated: None,
                    failed_conditions: Vec::new(),
                    evaluated_at: Utc::now(),
                    cache_hit: false,
                },
                depth_limit_reached,
            ));
        }

        let abac = AbacEvaluator::evaluate(
            request.principal_id,
            &request.principal_attributes,
            &request.resource_attributes,
        );
        if !abac.allowed {
            return Ok((
                EvaluateResponse {
                    allowed: false,
                    reason: "Denied by attribute-based access control".to_owned(),
                    explanation: abac.failed_conditions.join("; "),
                    policy_evaluated: None,
                    failed_conditions: abac.failed_conditions,
                    evaluated_at: Utc::now(),
                    cache_hit: false,
                },
                depth_limit_reached,
            ));
        }

        let policies = self
            .policies
            .list_for_tenant(request.tenant_id, authz_domain::PolicyStatus::Active)
            .await?;
        let context = PolicyContext {
            principal_id: request.principal_id,
            action: &request.action,
            resource_type: &request.resource_type,
            resource_id: &request.resource_id,
            principal_attributes: &request.principal_attributes,
            resource_attributes: &request.resource_attributes,
            context: &request.context,
        };
        let policy_result = PolicyEngine::evaluate(&policies, &context);

        let response = match (policy_result.matched, policy_result.effect) {
            (true, Some(authz_domain::Effect::Deny)) => EvaluateResponse {
                allowed: false,
                reason: format!("Denied by policy {}", policy_result.policy_name.clone().unwrap_or_default()),
                explanation: policy_result.reason.unwrap_or_default(),
                policy_evaluated: policy_result.rule_id,
                failed_conditions: Vec::new(),
                evaluated_at: Utc::now(),
                cache_hit: false,
            },
            (true, Some(authz_domain::Effect::Allow)) => EvaluateResponse {
                allowed: true,
                reason: format!("Allowed by policy {}", policy_result.policy_name.clone().unwrap_or_default()),
                explanation: policy_result.reason.unwrap_or_else(|| rbac.reason.clone()),
                policy_evaluated: policy_result.rule_id,
                failed_conditions: Vec::new(),
                evaluated_at: Utc::now(),
                cache_hit: false,
            },
            _ => EvaluateResponse {
                allowed: true,
                reason: rbac.reason.clone(),
                explanation: rbac.reason,
                policy_evaluated: None,
                failed_conditions: Vec::new(),
                evaluated_at: Utc::now(),
                cache_hit: false,
            },
        };

        Ok((response, depth_limit_reached))
    }

    async fn append_audit(&self, request: &EvaluateRequest, response: &EvaluateResponse, depth_limit_reached: bool) {
        let mut metadata = request.context.clone();
        if depth_limit_reached {
            metadata.insert("depth_limit_reached", AttributeValue::Bool(true));
        }

        let input = AuditEntryInput {
            tenant_id: request.tenant_id,
            principal_id: request.principal_id,
            action: request.action.clone(),
            resource_type: request.resource_type.clone(),
            resource_id: request.resource_id.clone(),
            decision: if response.allowed { Decision::Allowed } else { Decision::Denied },
            reason: response.reason.clone(),
            policy_evaluated: response.policy_evaluated.clone(),
            metadata,
        };

        if let Err(error) = self.audit.append(input).await {
            warn!(%error, tenant_id = %request.tenant_id, "audit append failed, decision already returned");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DecisionOrchestrator, EvaluateRequest};
    use crate::audit_log::AuditLogService;
    use crate::cache::CacheTtls;
    use crate::cache::CachedDecisionStore;
    use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
    use crate::role_closure::{RoleClosureResolver, MAX_CLOSURE_DEPTH};
    use crate::test_support::{
        InMemoryAssignmentRepository, InMemoryAuditRepository, InMemoryDecisionCache, InMemoryPermissionRepository,
        InMemoryPolicyRepository, InMemoryRoleRepository,
    };
    use authz_core::{PermissionId, PolicyId, PrincipalId, RoleId, TenantId};
    use authz_domain::{
        AttributeMap, AttributeValue, Condition, Effect, GroupOperator, LeafOperator, Permission, Policy, PolicyStatus,
        PrincipalRole, Role, RoleStatus, Rule,
    };
    use chrono::Utc;
    use std::sync::Arc;
    use std::time::Duration;

    struct Harness {
        orchestrator: DecisionOrchestrator,
        audit: Arc<AuditLogService>,
    }

    fn role(tenant_id: TenantId, id: RoleId, name: &str) -> Role {
        Role::new(id, tenant_id, name, None, None, 0, false, RoleStatus::Active, Utc::now(), Utc::now()).expect("valid role")
    }

    fn permission(tenant_id: TenantId, resource_type: &str, action: &str) -> Permission {
        Permission::new(
            PermissionId::new(),
            tenant_id,
            format!("{resource_type}.{action}"),
            resource_type,
            action,
            None,
            Utc::now(),
            Utc::now(),
        )
        .expect("valid permission")
    }

    fn harness(
        roles: Vec<Role>,
        permissions: Vec<Permission>,
        grants: Vec<(RoleId, authz_core::PermissionId)>,
        assignments: Vec<PrincipalRole>,
        policies: Vec<Policy>,
    ) -> Harness {
        let role_repo = Arc::new(InMemoryRoleRepository::new(roles));
        let assignment_repo = Arc::new(InMemoryAssignmentRepository::new(assignments));
        let permission_repo = Arc::new(InMemoryPermissionRepository::with_grants(permissions, grants));
        let policy_repo = Arc::new(InMemoryPolicyRepository::new(policies));
        let audit = Arc::new(AuditLogService::new(Arc::new(InMemoryAuditRepository::new())));
        let cache = Arc::new(CachedDecisionStore::new(
            Arc::new(InMemoryDecisionCache::new()),
            CacheTtls::default(),
            CircuitBreaker::new(CircuitBreakerConfig::default()),
        ));

        let role_closure = RoleClosureResolver::new(role_repo, assignment_repo, permission_repo.clone());
        let orchestrator =
            DecisionOrchestrator::new(role_closure, permission_repo, policy_repo, cache, audit.clone(), Duration::from_secs(5));

        Harness { orchestrator, audit }
    }

    fn request(tenant_id: TenantId, principal_id: PrincipalId, action: &str, resource_type: &str) -> EvaluateRequest {
        EvaluateRequest {
            tenant_id,
            principal_id,
            action: action.to_owned(),
            resource_type: resource_type.to_owned(),
            resource_id: "inv-1".to_owned(),
            resource_attributes: AttributeMap::new(),
            principal_attributes: AttributeMap::new(),
            context: AttributeMap::new(),
        }
    }

    #[tokio::test]
    async fn s1_admin_role_grants_delete() {
        let tenant_id = TenantId::new();
        let principal_id = PrincipalId::new();
        let admin_role = role(tenant_id, RoleId::new(), "admin");
        let delete_permission = permission(tenant_id, "invoice", "delete");
        let assignment = PrincipalRole::new(principal_id, admin_role.id(), principal_id, Utc::now(), None, true);

        let harness = harness(
            vec![admin_role.clone()],
            vec![delete_permission.clone()],
            vec![(admin_role.id(), delete_permission.id())],
            vec![assignment],
            vec![],
        );

        let response = harness
            .orchestrator
            .evaluate(request(tenant_id, principal_id, "delete", "invoice"))
            .await;

        assert!(response.allowed);
        assert!(response.reason.contains("admin"));
    }

    #[tokio::test]
    async fn s2_rbac_denial_lists_held_roles() {
        let tenant_id = TenantId::new();
        let principal_id = PrincipalId::new();
        let employee_role = role(tenant_id, RoleId::new(), "Employee");
        let read_permission = permission(tenant_id, "invoice", "read");
        let assignment = PrincipalRole::new(principal_id, employee_role.id(), principal_id, Utc::now(), None, true);

        let harness = harness(
            vec![employee_role.clone()],
            vec![read_permission.clone()],
            vec![(employee_role.id(), read_permission.id())],
            vec![assignment],
            vec![],
        );

        let response = harness
            .orchestrator
            .evaluate(request(tenant_id, principal_id, "delete", "invoice"))
            .await;

        assert!(!response.allowed);
        assert!(response.reason.contains("Missing required permission: invoice.delete"));
        assert!(response.reason.contains("Employee"));
    }

    #[tokio::test]
    async fn s3_rbac_denial_short_circuits_before_policy() {
        let tenant_id = TenantId::new();
        let principal_id = PrincipalId::new();

        let condition = Condition::leaf_value(
            "resource.owner_id",
            LeafOperator::Eq,
            AttributeValue::String("principal.id".to_owned()),
        )
        .expect("valid condition");
        let rule = Rule::new("owner-rule", None, condition, Effect::Allow, 0).expect("valid rule");
        let policy =
            Policy::new(PolicyId::new(), tenant_id, "owner-policy", 1, 0, PolicyStatus::Active, vec![rule]).expect("valid policy");

        let harness = harness(vec![], vec![], vec![], vec![], vec![policy]);

        let mut req = request(tenant_id, principal_id, "delete", "invoice");
        req.resource_attributes.insert("owner_id", AttributeValue::String(principal_id.to_string()));

        let response = harness.orchestrator.evaluate(req).await;
        assert!(!response.allowed);
    }

    #[tokio::test]
    async fn s4_policy_deny_overrides_rbac_allow() {
        let tenant_id = TenantId::new();
        let principal_id = PrincipalId::new();
        let reader_role = role(tenant_id, RoleId::new(), "reader");
        let read_permission = permission(tenant_id, "document", "read");
        let assignment = PrincipalRole::new(principal_id, reader_role.id(), principal_id, Utc::now(), None, true);

        let classification_check = Condition::leaf_value(
            "resource.classification",
            LeafOperator::Eq,
            AttributeValue::String("top_secret".to_owned()),
        )
        .expect("valid");
        let clearance_check =
            Condition::leaf_value("principal.clearance_level", LeafOperator::Lt, AttributeValue::Int(3)).expect("valid");
        let condition = Condition::group(GroupOperator::And, vec![classification_check, clearance_check]).expect("valid");
        let deny_rule = Rule::new("deny-top-secret", None, condition, Effect::Deny, 0).expect("valid rule");
        let policy = Policy::new(PolicyId::new(), tenant_id, "classification-policy", 1, 0, PolicyStatus::Active, vec![deny_rule])
            .expect("valid policy");

        let harness = harness(
            vec![reader_role.clone()],
            vec![read_permission.clone()],
            vec![(reader_role.id(), read_permission.id())],
            vec![assignment],
            vec![policy],
        );

        let mut req = request(tenant_id, principal_id, "read", "document");
        req.resource_attributes.insert("classification", AttributeValue::String("top_secret".to_owned()));
        req.principal_attributes.insert("clearance_level", AttributeValue::Int(2));

        let response = harness.orchestrator.evaluate(req).await;
        assert!(!response.allowed);
        assert_eq!(response.policy_evaluated.as_deref(), Some("deny-top-secret"));
    }

    #[tokio::test]
    async fn denied_decisions_are_recorded_in_the_audit_log() {
        let tenant_id = TenantId::new();
        let principal_id = PrincipalId::new();
        let harness = harness(vec![], vec![], vec![], vec![], vec![]);

        let _response = harness.orchestrator.evaluate(request(tenant_id, principal_id, "delete", "invoice")).await;

        let entries = harness.audit.query(tenant_id, crate::ports::AuditQuery::default()).await.expect("query");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].decision(), authz_domain::Decision::Denied);
    }

    #[tokio::test]
    async fn depth_limit_reached_is_recorded_in_audit_metadata() {
        let tenant_id = TenantId::new();
        let principal_id = PrincipalId::new();
        let delete_permission = permission(tenant_id, "invoice", "delete");

        let chain_len = MAX_CLOSURE_DEPTH + 3;
        let ids: Vec<RoleId> = (0..chain_len).map(|_| RoleId::new()).collect();
        let roles: Vec<Role> = ids
            .iter()
            .enumerate()
            .map(|(index, id)| {
                let parent = if index + 1 < ids.len() { Some(ids[index + 1]) } else { None };
                Role::new(*id, tenant_id, format!("r{index}"), None, parent, index as u32, false, RoleStatus::Active, Utc::now(), Utc::now())
                    .expect("valid role")
            })
            .collect();
        let assignment = PrincipalRole::new(principal_id, ids[0], principal_id, Utc::now(), None, true);

        let harness = harness(
            roles,
            vec![delete_permission.clone()],
            vec![(ids[0], delete_permission.id())],
            vec![assignment],
            vec![],
        );

        let _response = harness
            .orchestrator
            .evaluate(request(tenant_id, principal_id, "delete", "invoice"))
            .await;

        let entries = harness.audit.query(tenant_id, crate::ports::AuditQuery::default()).await.expect("query");
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].metadata().get("depth_limit_reached").and_then(AttributeValue::as_bool),
            Some(true)
        );
    }

    #[tokio::test]
    async fn repeated_evaluation_hits_the_cache() {
        let tenant_id = TenantId::new();
        let principal_id = PrincipalId::new();
        let admin_role = role(tenant_id, RoleId::new(), "admin");
        let delete_permission = permission(tenant_id, "invoice", "delete");
        let assignment = PrincipalRole::new(principal_id, admin_role.id(), principal_id, Utc::now(), None, true);

        let harness = harness(
            vec![admin_role.clone()],
            vec![delete_permission.clone()],
            vec![(admin_role.id(), delete_permission.id())],
            vec![assignment],
            vec![],
        );

        let first = harness
            .orchestrator
            .evaluate(request(tenant_id, principal_id, "delete", "invoice"))
            .await;
        assert!(!first.cache_hit);

        let second = harness
            .orchestrator
            .evaluate(request(tenant_id, principal_id, "delete", "invoice"))
            .await;
        assert!(second.cache_hit);
        assert_eq!(second.allowed, first.allowed);
    }
}
