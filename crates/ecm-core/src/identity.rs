//! # Domain Identity Newtypes
//!
//! Newtype wrappers for all domain identifiers in the ECM Stack.
//! These prevent accidental identifier confusion — you cannot pass
//! a `SiteId` where a `PackId` is expected.
//!
//! Display impls carry a namespace prefix (`site:…`, `pack:…`) so log
//! lines and audit entries are unambiguous without extra context.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for an operating company (the tenant).
    CompanyId,
    "company"
);

uuid_id!(
    /// Unique identifier for a permitted site.
    SiteId,
    "site"
);

uuid_id!(
    /// Unique identifier for a regulatory pack.
    PackId,
    "pack"
);

uuid_id!(
    /// Unique identifier for a readiness rule definition.
    RuleId,
    "rule"
);

uuid_id!(
    /// Unique identifier for a permit obligation.
    ObligationId,
    "obligation"
);

uuid_id!(
    /// Unique identifier for a source document.
    DocumentId,
    "document"
);

uuid_id!(
    /// Unique identifier for an evidence item linked to an obligation.
    EvidenceId,
    "evidence"
);

uuid_id!(
    /// Unique identifier for a corrective action (remediation).
    RemediationId,
    "remediation"
);

uuid_id!(
    /// Unique identifier for a recorded incident.
    IncidentId,
    "incident"
);
