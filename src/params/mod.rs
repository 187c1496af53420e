//! Request Parameters
//!
//! Query API requests arrive as a flat map of dotted keys
//! (`Filter.1.Value.2`, `TagSpecification.1.Tag.1.Key`, ...). [`RawParams`]
//! resolves scalars, typed values and 1-based indexed families out of that
//! map without mutating it.
//!
//! # Indexing
//!
//! Indexed families start at 1 and are strictly sequential: the first missing
//! index ends the family even when higher indices are present.

mod filters;

pub use filters::{
    parse_filters, parse_tag_specifications, parse_tags, tags_for, FilterCriterion, FilterSet,
    Tag, TagSpecification,
};

use crate::outcome::ApiError;
use std::collections::HashMap;
use thiserror::Error;

/// Failure while resolving a parameter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("missing parameter {0}")]
    Missing(String),
    #[error("invalid value ({value}) for parameter {name}")]
    InvalidValue { name: String, value: String },
}

impl From<ParamError> for ApiError {
    fn from(err: ParamError) -> Self {
        match err {
            ParamError::Missing(name) => ApiError::missing_parameter(&name),
            ParamError::InvalidValue { name, value } => ApiError::invalid_value(&name, &value),
        }
    }
}

/// Flat, dotted-key request parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParams {
    values: HashMap<String, String>,
}

impl RawParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from key/value pairs (later duplicates win)
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Decode an `application/x-www-form-urlencoded` query string
    pub fn from_query(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()).into_owned())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The `Action` name of the request
    pub fn action(&self) -> Result<&str, ParamError> {
        self.require("Action")
    }

    /// Single optional string
    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Single required string
    pub fn require(&self, key: &str) -> Result<&str, ParamError> {
        self.scalar(key)
            .ok_or_else(|| ParamError::Missing(key.to_string()))
    }

    /// Optional integer; present but non-numeric input is an error
    pub fn int(&self, key: &str) -> Result<Option<i64>, ParamError> {
        let Some(raw) = self.scalar(key) else {
            return Ok(None);
        };
        raw.trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ParamError::InvalidValue {
                name: key.to_string(),
                value: raw.to_string(),
            })
    }

    /// Optional boolean (`true` / `false`, any case)
    pub fn bool(&self, key: &str) -> Result<Option<bool>, ParamError> {
        let Some(raw) = self.scalar(key) else {
            return Ok(None);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(ParamError::InvalidValue {
                name: key.to_string(),
                value: raw.to_string(),
            }),
        }
    }

    /// `key.1`, `key.2`, ... up to the first gap
    pub fn indexed_list(&self, key: &str) -> Vec<String> {
        (1..)
            .map(|i| self.scalar(&format!("{}.{}", key, i)))
            .take_while(Option::is_some)
            .flatten()
            .map(str::to_string)
            .collect()
    }

    /// Sub-parameters under `prefix.`, with the prefix stripped
    pub fn group(&self, prefix: &str) -> RawParams {
        let lead = format!("{}.", prefix);
        Self {
            values: self
                .values
                .iter()
                .filter_map(|(k, v)| {
                    k.strip_prefix(&lead)
                        .map(|rest| (rest.to_string(), v.clone()))
                })
                .collect(),
        }
    }

    /// `prefix.1.*`, `prefix.2.*`, ... up to the first index with no keys
    pub fn indexed_groups(&self, prefix: &str) -> Vec<RawParams> {
        let mut groups = Vec::new();
        for i in 1.. {
            let group = self.group(&format!("{}.{}", prefix, i));
            if group.is_empty() {
                break;
            }
            groups.push(group);
        }
        groups
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}
