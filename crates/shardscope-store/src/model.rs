//! Records stored inside a single shard.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// Shard-local subject identifier. Not unique across shards.
pub type SubjectId = String;

/// A user record living inside exactly one shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub email: String,
    /// KYC-like verification status (e.g. "pending", "verified")
    pub kyc_status: Option<String>,
    pub is_admin: bool,
    pub is_manager: bool,
    pub is_superior_manager: bool,
    /// Creation time, seconds since the Unix epoch
    pub created_at: i64,
}

impl Subject {
    /// Create a plain subject with no role flags.
    pub fn new(
        id: impl Into<SubjectId>,
        name: impl Into<String>,
        email: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            kyc_status: None,
            is_admin: false,
            is_manager: false,
            is_superior_manager: false,
            created_at,
        }
    }

    /// Set the KYC status.
    pub fn with_kyc_status(mut self, status: impl Into<String>) -> Self {
        self.kyc_status = Some(status.into());
        self
    }

    /// Set the role flags.
    pub fn with_roles(mut self, is_admin: bool, is_manager: bool, is_superior: bool) -> Self {
        self.is_admin = is_admin;
        self.is_manager = is_manager;
        self.is_superior_manager = is_superior;
        self
    }

    /// Shard-local listing order: newest first, id descending on ties.
    pub fn listing_order(a: &Subject, b: &Subject) -> Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    }
}

/// Type of a delegation edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    /// A manager has visibility over a user
    ManagerToUser,
    /// A superior manager has visibility over a manager
    SuperiorManagerToManager,
}

impl RelationshipType {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManagerToUser => "manager_to_user",
            Self::SuperiorManagerToManager => "superior_manager_to_manager",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manager_to_user" => Ok(Self::ManagerToUser),
            "superior_manager_to_manager" => Ok(Self::SuperiorManagerToManager),
            other => Err(StoreError::invalid_data(format!(
                "unknown relationship type '{}'",
                other
            ))),
        }
    }
}

/// Directed delegation `superior -> subordinate` inside one shard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DelegationEdge {
    pub superior_id: SubjectId,
    pub subordinate_id: SubjectId,
    pub relationship_type: RelationshipType,
}

impl DelegationEdge {
    pub fn new(
        superior_id: impl Into<SubjectId>,
        subordinate_id: impl Into<SubjectId>,
        relationship_type: RelationshipType,
    ) -> Self {
        Self {
            superior_id: superior_id.into(),
            subordinate_id: subordinate_id.into(),
            relationship_type,
        }
    }

    /// `manager -> user` edge.
    pub fn manages_user(manager: impl Into<SubjectId>, user: impl Into<SubjectId>) -> Self {
        Self::new(manager, user, RelationshipType::ManagerToUser)
    }

    /// `superior manager -> manager` edge.
    pub fn manages_manager(superior: impl Into<SubjectId>, manager: impl Into<SubjectId>) -> Self {
        Self::new(superior, manager, RelationshipType::SuperiorManagerToManager)
    }
}

/// Conjunction of optional shard-local predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectFilter {
    /// Case-insensitive substring over name or email
    pub search: Option<String>,
    /// Equality on KYC status
    pub kyc_status: Option<String>,
}

impl SubjectFilter {
    /// Filter matching every subject.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_kyc_status(mut self, status: impl Into<String>) -> Self {
        self.kyc_status = Some(status.into());
        self
    }

    /// Whether no predicate is set.
    pub fn is_empty(&self) -> bool {
        self.search.is_none() && self.kyc_status.is_none()
    }

    /// Evaluate the filter in memory, with the same semantics the SQL store uses.
    pub fn matches(&self, subject: &Subject) -> bool {
        if let Some(ref status) = self.kyc_status {
            if subject.kyc_status.as_deref() != Some(status.as_str()) {
                return false;
            }
        }

        if let Some(ref search) = self.search {
            let needle = search.to_lowercase();
            if !subject.name.to_lowercase().contains(&needle)
                && !subject.email.to_lowercase().contains(&needle)
            {
                return false;
            }
        }

        true
    }
}
