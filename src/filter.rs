//! Filter Evaluation
//!
//! Applies a [`FilterSet`] to records of any shape through the
//! [`FieldReadable`] capability. Canonical records expose their native
//! snake_case fields and their wire names; projection maps built for read
//! paths expose camelCase keys. Both are matched by the same criteria.
//!
//! Semantics:
//! - AND across criteria, OR across the values of one criterion
//! - list-valued fields match when any element is one of the values
//! - a field the record does not have never matches
//! - an empty filter set keeps every record, in input order

use crate::outcome::ApiError;
use crate::params::{FilterCriterion, FilterSet, Tag};
use crate::resource::registry;
use serde_json::{Map, Value};

/// A field value as seen by the evaluator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    fn matches_any(&self, candidates: &[String]) -> bool {
        match self {
            Self::Scalar(value) => candidates.iter().any(|c| c == value),
            Self::List(items) => items.iter().any(|item| candidates.contains(item)),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<&[String]> for FieldValue {
    fn from(values: &[String]) -> Self {
        Self::List(values.to_vec())
    }
}

impl From<&Vec<String>> for FieldValue {
    fn from(values: &Vec<String>) -> Self {
        Self::List(values.clone())
    }
}

/// Read access to named fields, independent of record shape
pub trait FieldReadable {
    /// Value of the field called `name`, if the record has one
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Tags carried by the record
    fn tags(&self) -> Vec<Tag> {
        Vec::new()
    }
}

impl FieldReadable for Map<String, Value> {
    fn field(&self, name: &str) -> Option<FieldValue> {
        json_field_value(self.get(name)?)
    }

    fn tags(&self) -> Vec<Tag> {
        let Some(items) = self
            .get("tags")
            .or_else(|| self.get("tagSet"))
            .and_then(Value::as_array)
        else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(|item| {
                let key = item.get("key").or_else(|| item.get("Key"))?.as_str()?;
                let value = item
                    .get("value")
                    .or_else(|| item.get("Value"))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                Some(Tag::new(key, value))
            })
            .collect()
    }
}

impl FieldReadable for Value {
    fn field(&self, name: &str) -> Option<FieldValue> {
        self.as_object()?.field(name)
    }

    fn tags(&self) -> Vec<Tag> {
        self.as_object().map(|m| m.tags()).unwrap_or_default()
    }
}

fn json_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn json_field_value(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Array(items) => Some(FieldValue::List(
            items.iter().filter_map(json_scalar).collect(),
        )),
        other => json_scalar(other).map(FieldValue::Scalar),
    }
}

/// `image-id` / `image_id` -> `imageId`
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '-' || c == '_' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// `image-id` / `imageId` -> `image_id`
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c == '-' {
            out.push('_');
        } else if c.is_ascii_uppercase() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Resolve `name` on `record`: exact, then camelCase, then snake_case
pub fn resolve_field<R: FieldReadable + ?Sized>(record: &R, name: &str) -> Option<FieldValue> {
    if let Some(key) = name.strip_prefix("tag:") {
        return record
            .tags()
            .into_iter()
            .find(|t| t.key == key)
            .map(|t| FieldValue::Scalar(t.value));
    }
    match name {
        "tag-key" => {
            return Some(FieldValue::List(
                record.tags().into_iter().map(|t| t.key).collect(),
            ))
        }
        "tag-value" => {
            return Some(FieldValue::List(
                record.tags().into_iter().map(|t| t.value).collect(),
            ))
        }
        _ => {}
    }

    record
        .field(name)
        .or_else(|| record.field(&to_camel_case(name)))
        .or_else(|| record.field(&to_snake_case(name)))
}

/// Does `record` satisfy `criterion`?
pub fn matches_criterion<R: FieldReadable + ?Sized>(criterion: &FilterCriterion, record: &R) -> bool {
    resolve_field(record, &criterion.field)
        .map(|value| value.matches_any(&criterion.values))
        .unwrap_or(false)
}

/// Does `record` satisfy every criterion?
pub fn matches<R: FieldReadable + ?Sized>(filters: &FilterSet, record: &R) -> bool {
    filters.iter().all(|c| matches_criterion(c, record))
}

/// Keep the records matching `filters`, preserving order
pub fn apply<R: FieldReadable>(filters: &FilterSet, records: Vec<R>) -> Vec<R> {
    if filters.is_empty() {
        return records;
    }
    records.into_iter().filter(|r| matches(filters, r)).collect()
}

fn is_tag_filter(name: &str) -> bool {
    name.starts_with("tag:") || name == "tag-key" || name == "tag-value"
}

/// Check filter names against the registry entry for `resource_key` and
/// rewrite aliased names to the field they read
///
/// Kinds without a registry entry accept any filter name.
pub fn prepare(filters: &FilterSet, resource_key: &str) -> Result<FilterSet, ApiError> {
    let Some(def) = registry::get_resource(resource_key) else {
        return Ok(filters.clone());
    };

    filters
        .iter()
        .map(|criterion| {
            if is_tag_filter(&criterion.field) {
                return Ok(criterion.clone());
            }
            if !def.filters.iter().any(|f| f == &criterion.field) {
                return Err(ApiError::new(
                    crate::outcome::ErrorCode::InvalidParameterValue,
                    format!("The filter '{}' is invalid", criterion.field),
                ));
            }
            let field = def
                .aliases
                .get(&criterion.field)
                .cloned()
                .unwrap_or_else(|| criterion.field.clone());
            Ok(FilterCriterion {
                field,
                values: criterion.values.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn criterion(field: &str, values: &[&str]) -> FilterCriterion {
        FilterCriterion::new(field, values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_case_conversions() {
        assert_eq!(to_camel_case("image-id"), "imageId");
        assert_eq!(to_camel_case("owner_id"), "ownerId");
        assert_eq!(to_camel_case("state"), "state");
        assert_eq!(to_snake_case("image-id"), "image_id");
        assert_eq!(to_snake_case("imageId"), "image_id");
        assert_eq!(to_snake_case("vpcId"), "vpc_id");
    }

    #[test]
    fn test_map_adapter_resolves_camel_case() {
        let record = json!({"imageId": "ami-1", "public": false, "instanceCount": 2});
        assert_eq!(
            resolve_field(&record, "image-id"),
            Some(FieldValue::Scalar("ami-1".into()))
        );
        assert_eq!(
            resolve_field(&record, "public"),
            Some(FieldValue::Scalar("false".into()))
        );
        assert_eq!(
            resolve_field(&record, "instance-count"),
            Some(FieldValue::Scalar("2".into()))
        );
        assert_eq!(resolve_field(&record, "missing"), None);
    }

    #[test]
    fn test_list_field_membership() {
        let record = json!({"instanceIds": ["i-1", "i-2"]});
        assert!(matches_criterion(&criterion("instance-ids", &["i-2", "i-9"]), &record));
        assert!(!matches_criterion(&criterion("instance-ids", &["i-9"]), &record));
    }

    #[test]
    fn test_tag_pseudo_fields() {
        let record = json!({
            "id": "x",
            "tags": [{"key": "Name", "value": "web"}, {"Key": "env", "Value": "prod"}]
        });
        assert!(matches_criterion(&criterion("tag:Name", &["web"]), &record));
        assert!(matches_criterion(&criterion("tag:env", &["prod", "dev"]), &record));
        assert!(!matches_criterion(&criterion("tag:Name", &["db"]), &record));
        assert!(matches_criterion(&criterion("tag-key", &["env"]), &record));
        assert!(matches_criterion(&criterion("tag-value", &["web"]), &record));
        assert!(!matches_criterion(&criterion("tag:Owner", &["web"]), &record));
    }

    #[test]
    fn test_and_or_semantics() {
        let records = vec![
            json!({"state": "available", "name": "a"}),
            json!({"state": "pending", "name": "b"}),
            json!({"state": "available", "name": "c"}),
        ];
        let filters = vec![
            criterion("state", &["available", "pending"]),
            criterion("name", &["a", "b"]),
        ];
        let out = apply(&filters, records);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["name"], "a");
        assert_eq!(out[1]["name"], "b");
    }

    #[test]
    fn test_empty_criterion_matches_nothing() {
        let records = vec![json!({"state": "available"})];
        assert!(apply(&vec![criterion("state", &[])], records).is_empty());
    }

    #[test]
    fn test_empty_filter_set_is_identity() {
        let records = vec![json!({"a": 1}), json!({"b": 2})];
        assert_eq!(apply(&Vec::new(), records.clone()), records);
        assert!(apply::<Value>(&Vec::new(), Vec::new()).is_empty());
    }

    #[test]
    fn test_non_object_never_matches() {
        let records = vec![json!("scalar"), json!(null)];
        assert!(apply(&vec![criterion("state", &["x"])], records).is_empty());
    }

    #[test]
    fn test_prepare_rejects_unknown_filter() {
        let filters = vec![criterion("no-such-filter", &["x"])];
        let err = prepare(&filters, "image").unwrap_err();
        assert_eq!(err.code.as_str(), "InvalidParameterValue");
        assert!(err.message.contains("no-such-filter"));
    }

    #[test]
    fn test_prepare_rewrites_aliases_and_keeps_tags() {
        let filters = vec![
            criterion("is-public", &["true"]),
            criterion("tag:Name", &["web"]),
        ];
        let prepared = prepare(&filters, "image").unwrap();
        assert_eq!(prepared[0].field, "public");
        assert_eq!(prepared[1].field, "tag:Name");
    }
}
