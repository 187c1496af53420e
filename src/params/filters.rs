//! Filter and tag parsing
//!
//! Builds [`FilterSet`]s from `Filter.N.Name` / `Filter.N.Value.M` groups and
//! tag lists from `Tag.N.Key` / `TagSpecification.N.*` groups.

use super::{ParamError, RawParams};
use crate::store::ResourceKind;
use serde::{Deserialize, Serialize};

/// One named-field match rule; matches when any value equals the field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriterion {
    pub field: String,
    pub values: Vec<String>,
}

impl FilterCriterion {
    pub fn new(field: &str, values: Vec<String>) -> Self {
        Self {
            field: field.to_string(),
            values,
        }
    }
}

/// AND-combined, ordered criteria
pub type FilterSet = Vec<FilterCriterion>;

/// Resource tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// Tags requested for a create operation, optionally scoped to one kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSpecification {
    pub resource_type: Option<String>,
    pub tags: Vec<Tag>,
}

impl TagSpecification {
    /// Applies when no resource type is given or it names `kind`
    pub fn applies_to(&self, kind: ResourceKind) -> bool {
        self.resource_type
            .as_deref()
            .map_or(true, |t| t == kind.tag_resource_type())
    }
}

/// Parse `Filter.N.Name` / `Filter.N.Value.M`
///
/// A group with a name and no values yields an empty criterion, which matches
/// nothing.
pub fn parse_filters(params: &RawParams) -> Result<FilterSet, ParamError> {
    params
        .indexed_groups("Filter")
        .iter()
        .enumerate()
        .map(|(i, group)| {
            let name = group
                .scalar("Name")
                .ok_or_else(|| ParamError::Missing(format!("Filter.{}.Name", i + 1)))?;
            Ok(FilterCriterion::new(name, group.indexed_list("Value")))
        })
        .collect()
}

/// Parse `<prefix>.N.Key` / `<prefix>.N.Value`
pub fn parse_tags(params: &RawParams, prefix: &str) -> Vec<Tag> {
    params
        .indexed_groups(prefix)
        .iter()
        .filter_map(|group| {
            let key = group.scalar("Key")?;
            Some(Tag::new(key, group.scalar("Value").unwrap_or_default()))
        })
        .collect()
}

/// Parse `TagSpecification.N.ResourceType` and its `Tag` (or `Tags`) family
pub fn parse_tag_specifications(params: &RawParams) -> Vec<TagSpecification> {
    params
        .indexed_groups("TagSpecification")
        .iter()
        .map(|group| {
            let mut tags = parse_tags(group, "Tag");
            if tags.is_empty() {
                tags = parse_tags(group, "Tags");
            }
            TagSpecification {
                resource_type: group.scalar("ResourceType").map(str::to_string),
                tags,
            }
        })
        .collect()
}

/// All tags from `specs` that apply to a new resource of `kind`
pub fn tags_for(specs: &[TagSpecification], kind: ResourceKind) -> Vec<Tag> {
    specs
        .iter()
        .filter(|spec| spec.applies_to(kind))
        .flat_map(|spec| spec.tags.iter().cloned())
        .collect()
}
