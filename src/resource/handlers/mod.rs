//! Resource Handlers
//!
//! Each handler takes the request context and its structured parameters and
//! returns a payload or an [`ApiError`]; [`crate::resource::dispatch`] tags
//! the result as an [`crate::outcome::Outcome`].

pub mod compute;
pub mod network;
pub mod tags;

use crate::context::Context;
use crate::filter::{self, FieldReadable};
use crate::outcome::{ApiError, Payload};
use crate::params::{parse_filters, parse_tag_specifications, tags_for, RawParams, Tag};
use crate::resource::registry;
use crate::store::{paginate, Page, ResourceKind};
use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::Value;

/// Signature shared by every handler
pub type Handler = fn(&Context, &RawParams) -> Result<Payload, ApiError>;

/// Current time in the wire timestamp format
pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::internal(format!("failed to serialize response: {}", e)))
}

/// `{ key: value }`
pub(crate) fn single<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<Payload, ApiError> {
    let mut payload = Payload::new();
    payload.insert(key.to_string(), to_value(value)?);
    Ok(payload)
}

/// The record's own fields as the payload
pub(crate) fn flatten<T: Serialize + ?Sized>(value: &T) -> Result<Payload, ApiError> {
    match to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::internal("response is not an object")),
    }
}

/// `{ "return": true }`
pub(crate) fn return_true() -> Payload {
    let mut payload = Payload::new();
    payload.insert("return".to_string(), Value::Bool(true));
    payload
}

/// Tags from `TagSpecification.N` that apply to a new `kind`
pub(crate) fn requested_tags(
    params: &RawParams,
    kind: ResourceKind,
) -> Result<Vec<Tag>, ApiError> {
    let specs = parse_tag_specifications(params);
    if let Some(unknown) = specs
        .iter()
        .filter_map(|spec| spec.resource_type.as_deref())
        .find(|name| ResourceKind::from_tag_resource_type(name).is_none())
    {
        return Err(ApiError::invalid_value("TagSpecification.ResourceType", unknown));
    }
    Ok(tags_for(&specs, kind))
}

/// Filter, paginate and list `records` under the registry key `key`
pub(crate) fn describe<R: FieldReadable + Serialize>(
    key: &str,
    records: Vec<R>,
    params: &RawParams,
    explicit_ids: bool,
) -> Result<Payload, ApiError> {
    let filters = filter::prepare(&parse_filters(params)?, key)?;
    let matched = filter::apply(&filters, records);
    tracing::debug!(
        "describe {}: {} filter(s), {} match(es)",
        key,
        filters.len(),
        matched.len()
    );
    let page = paginate(matched, params, explicit_ids)?;
    listing(key, page)
}

fn listing<R: Serialize>(key: &str, page: Page<R>) -> Result<Payload, ApiError> {
    let mut payload = single(&registry::response_key(key), &page.items)?;
    if let Some(token) = page.next_token {
        payload.insert("nextToken".to_string(), Value::String(token));
    }
    Ok(payload)
}

/// `Owner.N` match; `self` stands for the caller's account
pub(crate) fn owned_by(owners: &[String], account_id: &str, owner_id: &str) -> bool {
    owners.is_empty()
        || owners
            .iter()
            .any(|o| o == owner_id || (o == "self" && owner_id == account_id))
}

/// IPv4 CIDR block as (network address, prefix length)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cidr {
    pub addr: u32,
    pub prefix: u8,
}

impl Cidr {
    pub fn parse(raw: &str) -> Option<Self> {
        let (ip, prefix) = raw.split_once('/')?;
        let ip: std::net::Ipv4Addr = ip.parse().ok()?;
        let prefix: u8 = prefix.parse().ok()?;
        if prefix > 32 {
            return None;
        }
        let addr = u32::from(ip);
        // host bits must be zero
        if addr & !Self::mask(prefix) != 0 {
            return None;
        }
        Some(Self { addr, prefix })
    }

    fn mask(prefix: u8) -> u32 {
        if prefix == 0 {
            0
        } else {
            u32::MAX << (32 - prefix)
        }
    }

    pub fn contains(&self, inner: &Cidr) -> bool {
        inner.prefix >= self.prefix && inner.addr & Self::mask(self.prefix) == self.addr
    }

    /// Addresses usable by instances (five per block are reserved)
    pub fn usable_addresses(&self) -> u64 {
        (1u64 << (32 - self.prefix)).saturating_sub(5)
    }
}

/// Parse a CIDR parameter whose prefix must fall within `min..=max`
pub(crate) fn cidr_param(
    params: &RawParams,
    key: &str,
    min: u8,
    max: u8,
) -> Result<Cidr, ApiError> {
    let raw = params.require(key)?;
    Cidr::parse(raw)
        .filter(|c| (min..=max).contains(&c.prefix))
        .ok_or_else(|| ApiError::invalid_value(key, raw))
}
