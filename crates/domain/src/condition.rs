use authz_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::attributes::AttributeValue;

/// The comparison applied by a leaf condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafOperator {
    /// Attribute equals the given value.
    Eq,
    /// Attribute does not equal the given value.
    Neq,
    /// Attribute is less than the given value.
    Lt,
    /// Attribute is greater than the given value.
    Gt,
    /// Attribute is less than or equal to the given value.
    Lte,
    /// Attribute is greater than or equal to the given value.
    Gte,
    /// Attribute's value is a member of the given list.
    In,
    /// Attribute's list value contains the given value.
    Contains,
    /// Attribute is present in the evaluation context at all.
    Exists,
}

/// A scalar value compared against an attribute in a leaf condition.
pub type LeafValue = AttributeValue;

/// How a group condition's operands combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupOperator {
    /// All operands must hold.
    And,
    /// At least one operand must hold.
    Or,
    /// The single operand must not hold.
    Not,
}

/// A node in a policy rule's condition tree.
///
/// Mirrors the tagged-union recursive condition shape used elsewhere in this
/// workspace for nested rule trees: a `leaf` compares one attribute, a
/// `group` combines child conditions with `and` / `or` / `not`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Compares a single attribute against a literal value or list.
    Leaf {
        /// Dotted attribute path, e.g. `"principal.department"`.
        attribute: String,
        /// The comparison to apply.
        operator: LeafOperator,
        /// The scalar operand, required for all operators except `in` and `exists`.
        /// For `contains` this is the needle checked for list membership.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        value: Option<LeafValue>,
        /// The list operand, required for `in`.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        values: Option<Vec<LeafValue>>,
    },
    /// Combines child conditions.
    Group {
        /// How the operands combine.
        operator: GroupOperator,
        /// The child conditions. Exactly one for `not`, at least one otherwise.
        operands: Vec<Condition>,
    },
}

impl Condition {
    /// Builds a validated leaf condition comparing against a single scalar.
    pub fn leaf_value(
        attribute: impl Into<String>,
        operator: LeafOperator,
        value: LeafValue,
    ) -> AppResult<Self> {
        Self::validate_leaf(operator, Some(&value), None)?;
        Ok(Self::Leaf {
            attribute: attribute.into(),
            operator,
            value: Some(value),
            values: None,
        })
    }

    /// Builds a validated leaf condition comparing against a list (`in` / `contains`).
    pub fn leaf_values(
        attribute: impl Into<String>,
        operator: LeafOperator,
        values: Vec<LeafValue>,
    ) -> AppResult<Self> {
        Self::validate_leaf(operator, None, Some(&values))?;
        Ok(Self::Leaf {
            attribute: attribute.into(),
            operator,
            value: None,
            values: Some(values),
        })
    }

    /// Builds a validated leaf condition for `exists`, which carries no operand.
    pub fn leaf_exists(attribute: impl Into<String>) -> Self {
        Self::Leaf {
            attribute: attribute.into(),
            operator: LeafOperator::Exists,
            value: None,
            values: None,
        }
    }

    /// Builds a validated group condition.
    pub fn group(operator: GroupOperator, operands: Vec<Condition>) -> AppResult<Self> {
        if operands.is_empty() {
            return Err(AppError::PolicyMalformed(
                "a group condition must have at least one operand".to_owned(),
            ));
        }
        if matches!(operator, GroupOperator::Not) && operands.len() != 1 {
            return Err(AppError::PolicyMalformed(
                "a 'not' group condition must have exactly one operand".to_owned(),
            ));
        }

        Ok(Self::Group { operator, operands })
    }

    fn validate_leaf(
        operator: LeafOperator,
        value: Option<&LeafValue>,
        values: Option<&[LeafValue]>,
    ) -> AppResult<()> {
        match operator {
            LeafOperator::In => {
                if values.is_none_or(<[_]>::is_empty) {
                    return Err(AppError::PolicyMalformed(format!(
                        "operator {operator:?} requires a non-empty 'values' list"
                    )));
                }
            }
            LeafOperator::Exists => {}
            LeafOperator::Eq
            | LeafOperator::Neq
            | LeafOperator::Lt
            | LeafOperator::Gt
            | LeafOperator::Lte
            | LeafOperator::Gte
            | LeafOperator::Contains => {
                if value.is_none() {
                    return Err(AppError::PolicyMalformed(format!(
                        "operator {operator:?} requires a 'value'"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Validates an already-constructed condition tree, recursively.
    ///
    /// Used when a `Condition` arrives pre-built from deserialized policy
    /// JSON, where the `leaf_value` / `group` smart constructors were
    /// bypassed by `serde`.
    pub fn validate(&self) -> AppResult<()> {
        match self {
            Self::Leaf {
                operator,
                value,
                values,
                ..
            } => Self::validate_leaf(*operator, value.as_ref(), values.as_deref()),
            Self::Group { operator, operands } => {
                if operands.is_empty() {
                    return Err(AppError::PolicyMalformed(
                        "a group condition must have at least one operand".to_owned(),
                    ));
                }
                if matches!(operator, GroupOperator::Not) && operands.len() != 1 {
                    return Err(AppError::PolicyMalformed(
                        "a 'not' group condition must have exactly one operand".to_owned(),
                    ));
                }
                for operand in operands {
                    operand.validate()?;
                }
                Ok(())
            }
        }
    }
}
