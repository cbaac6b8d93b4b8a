//! Repository and backend ports (C1, C7, C8) consumed by the application services.

mod assignment_repository;
mod audit_repository;
mod constraint_repository;
mod decision_cache;
mod invalidation_bus;
mod permission_repository;
mod policy_repository;
mod principal_repository;
mod rate_limit_repository;
mod role_repository;
mod tenant_repository;

pub use assignment_repository::AssignmentRepository;
pub use audit_repository::{AuditQuery, AuditRepository};
pub use constraint_repository::ConstraintRepository;
pub use decision_cache::{CacheClass, DecisionCache};
pub use invalidation_bus::{InvalidationEvent, InvalidationEventKind, InvalidationSubscriber};
pub use permission_repository::PermissionRepository;
pub use policy_repository::PolicyRepository;
pub use principal_repository::PrincipalRepository;
pub use rate_limit_repository::RateLimitRepository;
pub use role_repository::RoleRepository;
pub use tenant_repository::TenantRepository;
