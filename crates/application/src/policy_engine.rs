//! Policy Engine (C5): evaluates the JSON policy language against a request.

use authz_core::PrincipalId;
use authz_domain::{AttributeMap, AttributeValue, Condition, Effect, GroupOperator, LeafOperator, Policy, PolicyStatus};

/// The literal attribute-path string substituted with the request
/// principal's id when it appears as a leaf's comparison value.
const PRINCIPAL_ID_LITERAL: &str = "principal.id";

/// The evaluation context a policy's conditions are resolved against.
pub struct PolicyContext<'a> {
    /// The requesting principal's id, used for `principal.id` resolution
    /// and substitution.
    pub principal_id: PrincipalId,
    /// The requested action.
    pub action: &'a str,
    /// The resource's type.
    pub resource_type: &'a str,
    /// The resource's id.
    pub resource_id: &'a str,
    /// The principal's attributes.
    pub principal_attributes: &'a AttributeMap,
    /// The resource's attributes.
    pub resource_attributes: &'a AttributeMap,
    /// Free-form request context attributes.
    pub context: &'a AttributeMap,
}

impl<'a> PolicyContext<'a> {
    fn resolve(&self, attribute: &str) -> Option<AttributeValue> {
        match attribute {
            "principal.id" => Some(AttributeValue::String(self.principal_id.to_string())),
            "resource.type" => Some(AttributeValue::String(self.resource_type.to_owned())),
            "resource.id" => Some(AttributeValue::String(self.resource_id.to_owned())),
            "action" => Some(AttributeValue::String(self.action.to_owned())),
            other => {
                if let Some(rest) = other.strip_prefix("principal.") {
                    self.principal_attributes.get(rest).cloned()
                } else if let Some(rest) = other.strip_prefix("resource.") {
                    self.resource_attributes.get(rest).cloned()
                } else if let Some(rest) = other.strip_prefix("context.") {
                    self.context.get(rest).cloned()
                } else {
                    None
                }
            }
        }
    }

    fn substitute_literal(&self, value: &AttributeValue) -> AttributeValue {
        match value {
            AttributeValue::String(literal) if literal == PRINCIPAL_ID_LITERAL => {
                AttributeValue::String(self.principal_id.to_string())
            }
            other => other.clone(),
        }
    }
}

/// The outcome of evaluating a tenant's active policies against a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyResult {
    /// Whether any rule in any active policy matched.
    pub matched: bool,
    /// The effect of the matching rule, if any.
    pub effect: Option<Effect>,
    /// The id of the policy that produced the decision.
    pub policy_name: Option<String>,
    /// The id of the matching rule.
    pub rule_id: Option<String>,
    /// The matching rule's description, echoed as the decision explanation.
    pub reason: Option<String>,
}

impl PolicyResult {
    fn no_match() -> Self {
        Self { matched: false, effect: None, policy_name: None, rule_id: None, reason: None }
    }
}

/// Evaluates the JSON policy language.
pub struct PolicyEngine;

impl PolicyEngine {
    /// Evaluates `policies` (only `Active` ones are considered) against
    /// `ctx`, in descending policy priority then descending rule priority,
    /// returning the first matching rule's outcome.
    #[must_use]
    pub fn evaluate(policies: &[Policy], ctx: &PolicyContext<'_>) -> PolicyResult {
        let mut active: Vec<&Policy> = policies.iter().filter(|policy| policy.status() == PolicyStatus::Active).collect();
        active.sort_by(|a, b| b.priority().cmp(&a.priority()));

        for policy in active {
            let mut rules: Vec<_> = policy.rules().iter().collect();
            rules.sort_by(|a, b| b.priority().cmp(&a.priority()));

            for rule in rules {
                let (satisfied, _failures) = Self::evaluate_condition(rule.condition(), ctx);
                if satisfied {
                    return PolicyResult {
                        matched: true,
                        effect: Some(rule.effect()),
                        policy_name: Some(policy.name().to_owned()),
                        rule_id: Some(rule.id().to_owned()),
                        reason: rule.description().map(str::to_owned),
                    };
                }
            }
        }

        PolicyResult::no_match()
    }

    fn evaluate_condition(condition: &Condition, ctx: &PolicyContext<'_>) -> (bool, Vec<String>) {
        match condition {
            Condition::Leaf { attribute, operator, value, values } => {
                Self::evaluate_leaf(attribute, *operator, value.as_ref(), values.as_deref(), ctx)
            }
            Condition::Group { operator, operands } => Self::evaluate_group(*operator, operands, ctx),
        }
    }

    fn evaluate_group(operator: GroupOperator, operands: &[Condition], ctx: &PolicyContext<'_>) -> (bool, Vec<String>) {
        match operator {
            GroupOperator::And => {
                let mut failures = Vec::new();
                let mut satisfied = true;
                for operand in operands {
                    let (ok, mut operand_failures) = Self::evaluate_condition(operand, ctx);
                    satisfied &= ok;
                    failures.append(&mut operand_failures);
                }
                (satisfied, failures)
            }
            GroupOperator::Or => {
                let mut failures = Vec::new();
                for operand in operands {
                    let (ok, operand_failures) = Self::evaluate_condition(operand, ctx);
                    if ok {
                        return (true, Vec::new());
                    }
                    failures.extend(operand_failures);
                }
                (false, failures)
            }
            GroupOperator::Not => {
                let (ok, _) = Self::evaluate_condition(&operands[0], ctx);
                (!ok, vec![format!("negated condition {}satisfied", if ok { "was " } else { "was not " })])
            }
        }
    }

    fn evaluate_leaf(
        attribute: &str,
        operator: LeafOperator,
        value: Option<&AttributeValue>,
        values: Option<&[AttributeValue]>,
        ctx: &PolicyContext<'_>,
    ) -> (bool, Vec<String>) {
        let resolved = ctx.resolve(attribute);

        if matches!(operator, LeafOperator::Exists) {
            return if resolved.is_some() {
                (true, Vec::new())
            } else {
                (false, vec![format!("attribute '{attribute}' does not exist")])
            };
        }

        let Some(resolved) = resolved else {
            return (false, vec![format!("attribute '{attribute}' did not resolve")]);
        };

        match operator {
            LeafOperator::Eq | LeafOperator::Neq | LeafOperator::Lt | LeafOperator::Gt | LeafOperator::Lte | LeafOperator::Gte => {
                let Some(raw) = value else {
                    return (false, vec![format!("operator {operator:?} missing comparison value")]);
                };
                let comparand = ctx.substitute_literal(raw);
                Self::evaluate_comparison(attribute, operator, &resolved, &comparand)
            }
            LeafOperator::In => {
                let Some(candidates) = values else {
                    return (false, vec![format!("'in' on '{attribute}' missing candidate list")]);
                };
                if candidates.iter().any(|candidate| *candidate == resolved) {
                    (true, Vec::new())
                } else {
                    (false, vec![format!("'{attribute}' is not in the allowed set")])
                }
            }
            LeafOperator::Contains => {
                let Some(list) = resolved.as_list() else {
                    return (false, vec![format!("'{attribute}' is not a list for 'contains'")]);
                };
                let Some(needle) = value else {
                    return (false, vec![format!("'contains' on '{attribute}' missing comparison value")]);
                };
                let needle = ctx.substitute_literal(needle);
                if list.contains(&needle) {
                    (true, Vec::new())
                } else {
                    (false, vec![format!("'{attribute}' does not contain the required value")])
                }
            }
            LeafOperator::Exists => unreachable!("handled above"),
        }
    }

    fn evaluate_comparison(
        attribute: &str,
        operator: LeafOperator,
        left: &AttributeValue,
        right: &AttributeValue,
    ) -> (bool, Vec<String>) {
        let ok = match operator {
            LeafOperator::Eq => left == right,
            LeafOperator::Neq => left != right,
            LeafOperator::Lt | LeafOperator::Gt | LeafOperator::Lte | LeafOperator::Gte => {
                match Self::ordering(left, right) {
                    Some(ordering) => match operator {
                        LeafOperator::Lt => ordering == std::cmp::Ordering::Less,
                        LeafOperator::Gt => ordering == std::cmp::Ordering::Greater,
                        LeafOperator::Lte => ordering != std::cmp::Ordering::Greater,
                        LeafOperator::Gte => ordering != std::cmp::Ordering::Less,
                        _ => unreachable!(),
                    },
                    None => false,
                }
            }
            LeafOperator::In | LeafOperator::Contains | LeafOperator::Exists => unreachable!("handled by caller"),
        };

        if ok {
            (true, Vec::new())
        } else {
            (false, vec![format!("'{attribute}' failed {operator:?} comparison")])
        }
    }

    fn ordering(left: &AttributeValue, right: &AttributeValue) -> Option<std::cmp::Ordering> {
        match (left, right) {
            (AttributeValue::Int(a), AttributeValue::Int(b)) => Some(a.cmp(b)),
            (AttributeValue::String(a), AttributeValue::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}
