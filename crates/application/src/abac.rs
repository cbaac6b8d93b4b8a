//! ABAC Evaluator (C4): fixed attribute predicates over principal and resource.

use authz_core::PrincipalId;
use authz_domain::AttributeMap;

/// The outcome of an ABAC check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbacDecision {
    /// Whether every applicable predicate passed.
    pub allowed: bool,
    /// Human-readable descriptions of any failed predicates.
    pub failed_conditions: Vec<String>,
}

/// Evaluates the three fixed attribute predicates: ownership, department
/// match, and clearance. A predicate whose inputs are absent is skipped
/// rather than failed.
pub struct AbacEvaluator;

impl AbacEvaluator {
    /// Evaluates the fixed predicates for `principal_id` against
    /// `principal_attributes` and `resource_attributes`.
    #[must_use]
    pub fn evaluate(
        principal_id: PrincipalId,
        principal_attributes: &AttributeMap,
        resource_attributes: &AttributeMap,
    ) -> AbacDecision {
        let mut failed = Vec::new();

        if let Some(owner_id) = resource_attributes.get("owner_id").and_then(|value| value.as_str()) {
            if owner_id != principal_id.to_string() {
                failed.push("Resource owner mismatch".to_owned());
            }
        }

        let department = principal_attributes.get("department").and_then(|value| value.as_str());
        let required_department = resource_attributes.get("required_department").and_then(|value| value.as_str());
        if let (Some(department), Some(required_department)) = (department, required_department) {
            if department != required_department {
                failed.push(format!(
                    "Department mismatch: principal is '{department}', resource requires '{required_department}'"
                ));
            }
        }

        let sensitivity = resource_attributes.get("sensitivity").and_then(|value| value.as_int());
        let clearance_level = principal_attributes.get("clearance_level").and_then(|value| value.as_int());
        if let (Some(sensitivity), Some(clearance_level)) = (sensitivity, clearance_level) {
            if clearance_level < sensitivity {
                failed.push(format!(
                    "Insufficient clearance: level {clearance_level} is below required {sensitivity}"
                ));
            }
        }

        AbacDecision { allowed: failed.is_empty(), failed_conditions: failed }
    }
}
