use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID value.
            #[must_use]
            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Returns the underlying UUID value.
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

uuid_id!(TenantId, "Tenant identifier; the partition key for every persisted resource.");
uuid_id!(PrincipalId, "Principal (user or service account) identifier.");
uuid_id!(RoleId, "Role identifier.");
uuid_id!(PermissionId, "Permission identifier.");
uuid_id!(ConstraintId, "Separation-of-duties role constraint identifier.");
uuid_id!(PolicyId, "Policy identifier.");
uuid_id!(AuditEntryId, "Audit log entry identifier.");

#[cfg(test)]
mod tests {
    use super::TenantId;

    #[test]
    fn formats_as_uuid() {
        let tenant_id = TenantId::new();
        assert_eq!(tenant_id.to_string().len(), 36);
    }

    #[test]
    fn round_trips_through_serde() {
        let tenant_id = TenantId::new();
        let json = serde_json::to_string(&tenant_id).expect("serialize");
        let decoded: TenantId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(tenant_id, decoded);
    }
}
