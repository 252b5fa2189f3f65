// Copyright 2022 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Domain types shared by the pipeline and its collaborators.

use std::{fmt, str::FromStr};

use derive_more::From;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::QueryError;

/// The page size used when the caller does not request one.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// The authenticated caller identity.
///
/// The security layer resolves the bearer token into a principal before the
/// pipeline runs; unauthenticated requests carry the anonymous sentinel.
#[derive(Clone, Debug, PartialEq, Eq, Hash, From)]
pub struct Principal(String);

impl Principal {
    /// The sentinel identity of an unauthenticated request.
    pub const ANONYMOUS: &'static str = "_anonymous";

    /// The principal of an unauthenticated request.
    pub fn anonymous() -> Self {
        Self(Self::ANONYMOUS.to_string())
    }

    /// Whether this is the anonymous sentinel.
    pub fn is_anonymous(&self) -> bool {
        self.0 == Self::ANONYMOUS
    }

    /// The principal as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Principal {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The user-facing sort choices.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Sort {
    #[default]
    NameAsc,
    NameDesc,
    UpdatedAsc,
    UpdatedDesc,
}

impl Sort {
    /// The index field this sort choice maps to.
    pub fn field(&self) -> &'static str {
        match self {
            Sort::NameAsc | Sort::NameDesc => "sort_name",
            Sort::UpdatedAsc | Sort::UpdatedDesc => "updated_at",
        }
    }

    /// The sort direction this choice maps to.
    pub fn order(&self) -> &'static str {
        match self {
            Sort::NameAsc | Sort::UpdatedAsc => "asc",
            Sort::NameDesc | Sort::UpdatedDesc => "desc",
        }
    }
}

#[derive(Debug, Error)]
#[error("invalid sort descriptor. Expected `name_asc`, `name_desc`, `updated_asc` or `updated_desc`, found `{0}`")]
#[allow(missing_docs)]
pub struct ParseSortError(String);

impl FromStr for Sort {
    type Err = ParseSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "name_asc" => Sort::NameAsc,
            "name_desc" => Sort::NameDesc,
            "updated_asc" => Sort::UpdatedAsc,
            "updated_desc" => Sort::UpdatedDesc,
            _ => Err(ParseSortError(s.to_string()))?,
        })
    }
}

/// The validated input of one query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchCriteria {
    /// Typeahead substring matched against resource names and aliases.
    pub name: Option<String>,
    /// Typed parent reference of the form `type:id`.
    pub parent: Option<String>,
    /// Exact resource type filter.
    pub resource_type: Option<String>,
    /// Any-match tags (a hit carries at least one).
    pub tags: Vec<String>,
    /// All-match tags (a hit carries every one).
    pub tags_all: Vec<String>,
    /// Result ordering.
    pub sort: Sort,
    /// Requested page size; zero or below switches to count-only mode.
    pub page_size: i64,
    /// Sealed cursor from a previous page.
    pub page_token: Option<String>,
    /// Restrict to public resources. Set by the pipeline for anonymous
    /// callers.
    pub public_only: bool,
    /// Restrict to non-public resources. Only meaningful in count mode.
    pub private_only: bool,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            name: None,
            parent: None,
            resource_type: None,
            tags: Vec::new(),
            tags_all: Vec::new(),
            sort: Sort::default(),
            page_size: DEFAULT_PAGE_SIZE,
            page_token: None,
            public_only: false,
            private_only: false,
        }
    }
}

impl SearchCriteria {
    /// Checks that the criteria narrow the index down at all.
    ///
    /// An unfiltered scan over the whole index is rejected: at least one of
    /// `name`, `parent`, `resource_type` or `tags` must be present.
    pub fn validate(&self) -> Result<(), QueryError> {
        if let Some(name) = &self.name {
            if name.is_empty() {
                return Err(QueryError::validation("name must not be empty"));
            }
        }
        if let Some(parent) = &self.parent {
            if !is_object_ref(parent) {
                return Err(QueryError::validation(format!(
                    "parent must be a `type:id` reference, found `{parent}`"
                )));
            }
        }
        if self.public_only && self.private_only {
            return Err(QueryError::validation(
                "public_only and private_only are mutually exclusive",
            ));
        }
        if self.name.is_none() && self.parent.is_none() && self.resource_type.is_none() && self.tags.is_empty() {
            return Err(QueryError::validation(
                "at least one of name, parent, type or tags is required",
            ));
        }
        Ok(())
    }
}

/// Whether `s` has the `type:id` shape of a resource reference.
fn is_object_ref(s: &str) -> bool {
    matches!(s.split_once(':'), Some((ty, id)) if !ty.is_empty() && !id.is_empty())
}

/// One indexed resource as stored by the search backend.
///
/// The access control fields come from the index, not from the caller; they
/// are the trust boundary of the permission check.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceDocument {
    /// Globally unique resource key of the form `type:id`.
    pub object_ref: String,
    /// The resource type.
    pub object_type: String,
    /// The resource id.
    pub object_id: String,
    /// Whether the resource is visible to any caller.
    #[serde(default)]
    pub public: bool,
    /// The object side of the access check relation.
    #[serde(default)]
    pub access_check_object: String,
    /// The relation to check against the object.
    #[serde(default)]
    pub access_check_relation: String,
    /// Opaque indexed payload handed back to the caller.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ResourceDocument {
    /// Whether returning this hit requires consulting the access control
    /// service.
    pub fn needs_check(&self) -> bool {
        !self.public
    }

    /// The access check key for this hit, if the index carries both check
    /// fields.
    pub fn check_key(&self, principal: &Principal) -> Option<CheckKey> {
        if self.access_check_object.is_empty() || self.access_check_relation.is_empty() {
            return None;
        }
        Some(CheckKey {
            object: self.access_check_object.clone(),
            relation: self.access_check_relation.clone(),
            principal: principal.clone(),
        })
    }
}

/// One resource as serialized to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// The resource type.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// The resource id.
    pub id: String,
    /// Opaque indexed payload.
    pub data: serde_json::Value,
}

impl From<ResourceDocument> for Resource {
    fn from(doc: ResourceDocument) -> Self {
        Self {
            resource_type: doc.object_type,
            id: doc.object_id,
            data: doc.data,
        }
    }
}

/// The ordered, authorized result of one query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchPage {
    /// Authorized resources in backend order.
    pub resources: Vec<Resource>,
    /// Sealed cursor for the next page, present only when the backend
    /// returned a full page.
    pub page_token: Option<String>,
    /// Cache-control hint for the HTTP layer.
    pub cache_control: Option<String>,
}

/// Aggregate counts of the resources matching a filter.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResourceCounts {
    /// Matching public resources.
    pub public: u64,
    /// Matching non-public resources.
    pub private: u64,
    /// Sum of both.
    pub total: u64,
}

/// The key of one access check, `object#relation@user:principal` on the
/// wire.
///
/// The same string appears in the request lines and as the lookup key of the
/// reply mapping.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CheckKey {
    /// The object whose relation is checked.
    pub object: String,
    /// The relation the principal must hold.
    pub relation: String,
    /// The calling principal.
    pub principal: Principal,
}

impl fmt::Display for CheckKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@user:{}", self.object, self.relation, self.principal)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn anonymous_sentinel() {
        assert!(Principal::anonymous().is_anonymous());
        assert!(!Principal::from("alice").is_anonymous());
    }

    #[test]
    fn sort_descriptor_round_trip() {
        assert_eq!("name_asc".parse::<Sort>().unwrap(), Sort::NameAsc);
        assert_eq!("updated_desc".parse::<Sort>().unwrap(), Sort::UpdatedDesc);
        assert!("newest".parse::<Sort>().is_err());
        assert_eq!(Sort::NameDesc.field(), "sort_name");
        assert_eq!(Sort::NameDesc.order(), "desc");
        assert_eq!(Sort::UpdatedAsc.field(), "updated_at");
        assert_eq!(Sort::UpdatedAsc.order(), "asc");
    }

    #[test]
    fn criteria_require_a_filter() {
        let criteria = SearchCriteria::default();
        assert!(matches!(criteria.validate(), Err(QueryError::Validation(_))));

        let criteria = SearchCriteria {
            tags: vec!["governance".to_string()],
            ..Default::default()
        };
        assert!(criteria.validate().is_ok());
    }

    #[test]
    fn criteria_reject_malformed_parent() {
        let criteria = SearchCriteria {
            parent: Some("project".to_string()),
            ..Default::default()
        };
        assert!(matches!(criteria.validate(), Err(QueryError::Validation(_))));

        let criteria = SearchCriteria {
            parent: Some("project:cncf".to_string()),
            ..Default::default()
        };
        assert!(criteria.validate().is_ok());
    }

    #[test]
    fn criteria_reject_empty_name() {
        let criteria = SearchCriteria {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(criteria.validate(), Err(QueryError::Validation(_))));
    }

    #[test]
    fn check_key_wire_form() {
        let key = CheckKey {
            object: "committee:2".to_string(),
            relation: "member".to_string(),
            principal: Principal::from("alice"),
        };
        assert_eq!(key.to_string(), "committee:2#member@user:alice");
    }

    #[test]
    fn check_key_requires_both_fields() {
        let principal = Principal::from("alice");
        let mut doc = ResourceDocument {
            object_ref: "committee:2".to_string(),
            object_type: "committee".to_string(),
            object_id: "2".to_string(),
            public: false,
            access_check_object: "committee:2".to_string(),
            access_check_relation: "member".to_string(),
            data: serde_json::Value::Null,
        };
        assert!(doc.check_key(&principal).is_some());
        doc.access_check_relation.clear();
        assert!(doc.check_key(&principal).is_none());
    }
}
