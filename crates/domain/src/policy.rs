use authz_core::{AppError, AppResult, NonEmptyString, PolicyId, TenantId};
use serde::{Deserialize, Serialize};

use crate::condition::Condition;

/// Whether a matching rule grants or blocks access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// The request is allowed if this rule matches.
    Allow,
    /// The request is denied if this rule matches, overriding any `Allow`.
    Deny,
}

/// Policy lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    /// Policy is evaluated.
    Active,
    /// Policy is evaluated only by dry-run tooling, never by live decisions.
    Draft,
    /// Policy is retired and skipped entirely.
    Inactive,
}

/// A single rule within a policy: a condition plus the effect it produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    id: String,
    description: Option<String>,
    condition: Condition,
    effect: Effect,
    priority: i32,
}

impl Rule {
    /// Creates a validated rule. `id` must be unique within its owning policy;
    /// uniqueness is enforced by `Policy::new`, not here, since a single rule
    /// has no visibility into its siblings.
    pub fn new(
        id: impl Into<String>,
        description: Option<String>,
        condition: Condition,
        effect: Effect,
        priority: i32,
    ) -> AppResult<Self> {
        condition.validate()?;
        let id = id.into();
        if id.trim().is_empty() {
            return Err(AppError::InvalidRequest(
                "rule id must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            id,
            description,
            condition,
            effect,
            priority,
        })
    }

    /// Returns the rule identifier, unique within its policy.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the rule description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the rule's condition tree.
    #[must_use]
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Returns the effect produced when the condition matches.
    #[must_use]
    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// Returns the rule's priority; higher values are evaluated first within a policy.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }
}

/// A versioned, ordered set of rules evaluated as a unit by the policy engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    id: PolicyId,
    tenant_id: TenantId,
    name: NonEmptyString,
    version: i32,
    priority: i32,
    status: PolicyStatus,
    rules: Vec<Rule>,
}

impl Policy {
    /// Creates a validated policy. Rejects duplicate rule ids and policies
    /// with no rules, since an empty policy can never change a decision and
    /// is almost always an authoring mistake.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: PolicyId,
        tenant_id: TenantId,
        name: impl Into<String>,
        version: i32,
        priority: i32,
        status: PolicyStatus,
        rules: Vec<Rule>,
    ) -> AppResult<Self> {
        if rules.is_empty() {
            return Err(AppError::PolicyMalformed(
                "a policy must contain at least one rule".to_owned(),
            ));
        }

        let mut ids: Vec<&str> = rules.iter().map(Rule::id).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != rules.len() {
            return Err(AppError::PolicyMalformed(
                "rule ids must be unique within a policy".to_owned(),
            ));
        }

        Ok(Self {
            id,
            tenant_id,
            name: NonEmptyString::new(name)?,
            version,
            priority,
            status,
            rules,
        })
    }

    /// Returns the policy identifier.
    #[must_use]
    pub fn id(&self) -> PolicyId {
        self.id
    }

    /// Returns the owning tenant identifier.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the policy name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the policy version.
    #[must_use]
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Returns the policy's priority relative to other policies in the same tenant.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Returns the policy's lifecycle status.
    #[must_use]
    pub fn status(&self) -> PolicyStatus {
        self.status
    }

    /// Returns the policy's rules.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Returns whether the policy is evaluated by live decisions.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.status, PolicyStatus::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::{Effect, Policy, PolicyStatus, Rule};
    use crate::condition::Condition;
    use authz_core::{PolicyId, TenantId};

    fn sample_rule(id: &str) -> Rule {
        Rule::new(id, None, Condition::leaf_exists("principal.department"), Effect::Allow, 0)
            .expect("valid rule")
    }

    #[test]
    fn rejects_empty_rule_list() {
        let result = Policy::new(
            PolicyId::new(),
            TenantId::new(),
            "default",
            1,
            0,
            PolicyStatus::Active,
            vec![],
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_duplicate_rule_ids() {
        let result = Policy::new(
            PolicyId::new(),
            TenantId::new(),
            "default",
            1,
            0,
            PolicyStatus::Active,
            vec![sample_rule("r1"), sample_rule("r1")],
        );
        assert!(result.is_err());
    }

    #[test]
    fn accepts_unique_rule_ids() {
        let policy = Policy::new(
            PolicyId::new(),
            TenantId::new(),
            "default",
            1,
            0,
            PolicyStatus::Active,
            vec![sample_rule("r1"), sample_rule("r2")],
        )
        .expect("valid policy");
        assert_eq!(policy.rules().len(), 2);
    }
}
