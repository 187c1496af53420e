//! In-memory Resource Store
//!
//! One insertion-ordered [`Collection`] per [`ResourceKind`], each behind its
//! own lock. Records stay reachable from creation until an explicit delete,
//! and a delete is refused while the record still has dependents.
//!
//! # Lock order
//!
//! Operations touching several kinds lock collections in the field order of
//! [`Store`]: vpcs, subnets, internet_gateways, route_tables, nat_gateways,
//! snapshots, images, instances.

mod kind;
mod page;

pub use kind::{generate_id, random_id, ResourceKind};
pub use page::{paginate, Page};

use crate::filter::FieldReadable;
use crate::outcome::{ApiError, ErrorCode};
use crate::params::Tag;
use crate::resource::model::{
    Image, Instance, InternetGateway, NatGateway, RouteTable, Snapshot, Subnet, Vpc,
};
use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use std::collections::HashMap;

/// Named list of child ids held by a parent record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub name: &'static str,
    pub ids: Vec<String>,
}

impl DependencyEdge {
    pub fn new(name: &'static str, ids: Vec<String>) -> Self {
        Self { name, ids }
    }
}

/// A record stored in a [`Collection`]
pub trait Resource: FieldReadable + Serialize + Clone {
    const KIND: ResourceKind;

    fn id(&self) -> &str;

    /// Edges that must all be empty before the record can be deleted
    fn dependencies(&self) -> Vec<DependencyEdge> {
        Vec::new()
    }

    /// Mutable access to a child-id list by edge name
    fn edge_mut(&mut self, _edge: &str) -> Option<&mut Vec<String>> {
        None
    }

    fn tags_mut(&mut self) -> &mut Vec<Tag>;
}

/// Keyed, insertion-ordered records of one kind
#[derive(Debug)]
pub struct Collection<R> {
    order: Vec<String>,
    records: HashMap<String, R>,
}

impl<R> Default for Collection<R> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            records: HashMap::new(),
        }
    }
}

impl<R: Resource> Collection<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Result<&R, ApiError> {
        self.records
            .get(id)
            .ok_or_else(|| ApiError::not_found(R::KIND, id))
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut R, ApiError> {
        self.records
            .get_mut(id)
            .ok_or_else(|| ApiError::not_found(R::KIND, id))
    }

    /// Insert or replace; a replaced record keeps its position
    pub fn put(&mut self, record: R) {
        let id = record.id().to_string();
        if self.records.insert(id.clone(), record).is_none() {
            self.order.push(id);
        }
    }

    /// Remove a record whose dependency edges are all empty
    pub fn delete(&mut self, id: &str) -> Result<R, ApiError> {
        let record = self.get(id)?;
        if let Some(edge) = record.dependencies().iter().find(|e| !e.ids.is_empty()) {
            tracing::warn!(
                "delete blocked: {} {} has {} dependent(s) on {}",
                R::KIND,
                id,
                edge.ids.len(),
                edge.name
            );
            return Err(ApiError::dependency_violation(R::KIND, id));
        }

        self.order.retain(|existing| existing != id);
        let removed = self
            .records
            .remove(id)
            .ok_or_else(|| ApiError::not_found(R::KIND, id))?;
        tracing::info!("deleted {} {}", R::KIND, id);
        Ok(removed)
    }

    /// Records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &R> + '_ {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    pub fn list(&self) -> Vec<R> {
        self.iter().cloned().collect()
    }

    /// `ids` in request order, or every record when `ids` is empty
    pub fn select(&self, ids: &[String]) -> Result<Vec<R>, ApiError> {
        if ids.is_empty() {
            return Ok(self.list());
        }
        ids.iter().map(|id| self.get(id).cloned()).collect()
    }

    /// Append `child` to the parent's `edge`; the parent must exist
    pub fn link_child(&mut self, parent: &str, edge: &str, child: &str) -> Result<(), ApiError> {
        let record = self.get_mut(parent)?;
        let Some(children) = record.edge_mut(edge) else {
            return Err(ApiError::internal(format!(
                "{} has no dependency edge {}",
                R::KIND,
                edge
            )));
        };
        if !children.iter().any(|c| c == child) {
            children.push(child.to_string());
        }
        tracing::debug!("linked {} -> {} via {}", parent, child, edge);
        Ok(())
    }

    /// Remove `child` from the parent's `edge`; returns whether it was there
    pub fn unlink_child(&mut self, parent: &str, edge: &str, child: &str) -> bool {
        let Some(children) = self
            .records
            .get_mut(parent)
            .and_then(|record| record.edge_mut(edge))
        else {
            return false;
        };
        let before = children.len();
        children.retain(|c| c != child);
        before != children.len()
    }
}

/// Process-wide state, one lock per collection
#[derive(Debug, Default)]
pub struct Store {
    pub vpcs: Mutex<Collection<Vpc>>,
    pub subnets: Mutex<Collection<Subnet>>,
    pub internet_gateways: Mutex<Collection<InternetGateway>>,
    pub route_tables: Mutex<Collection<RouteTable>>,
    pub nat_gateways: Mutex<Collection<NatGateway>>,
    pub snapshots: Mutex<Collection<Snapshot>>,
    pub images: Mutex<Collection<Image>>,
    pub instances: Mutex<Collection<Instance>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock every collection, in lock order
    pub fn lock_all(&self) -> StoreGuard<'_> {
        StoreGuard {
            vpcs: self.vpcs.lock(),
            subnets: self.subnets.lock(),
            internet_gateways: self.internet_gateways.lock(),
            route_tables: self.route_tables.lock(),
            nat_gateways: self.nat_gateways.lock(),
            snapshots: self.snapshots.lock(),
            images: self.images.lock(),
            instances: self.instances.lock(),
        }
    }
}

/// Every collection locked at once, for operations addressing records by id
/// across kinds
pub struct StoreGuard<'a> {
    pub vpcs: MutexGuard<'a, Collection<Vpc>>,
    pub subnets: MutexGuard<'a, Collection<Subnet>>,
    pub internet_gateways: MutexGuard<'a, Collection<InternetGateway>>,
    pub route_tables: MutexGuard<'a, Collection<RouteTable>>,
    pub nat_gateways: MutexGuard<'a, Collection<NatGateway>>,
    pub snapshots: MutexGuard<'a, Collection<Snapshot>>,
    pub images: MutexGuard<'a, Collection<Image>>,
    pub instances: MutexGuard<'a, Collection<Instance>>,
}

fn unknown_id(id: &str) -> ApiError {
    ApiError::new(
        ErrorCode::InvalidParameterValue,
        format!("Invalid id: \"{}\"", id),
    )
}

impl StoreGuard<'_> {
    /// Tags of the record `id`, whatever its kind
    pub fn tags_mut(&mut self, id: &str) -> Result<&mut Vec<Tag>, ApiError> {
        let kind = ResourceKind::from_id(id).ok_or_else(|| unknown_id(id))?;
        let tags = match kind {
            ResourceKind::Vpc => self.vpcs.get_mut(id)?.tags_mut(),
            ResourceKind::Subnet => self.subnets.get_mut(id)?.tags_mut(),
            ResourceKind::InternetGateway => self.internet_gateways.get_mut(id)?.tags_mut(),
            ResourceKind::RouteTable => self.route_tables.get_mut(id)?.tags_mut(),
            ResourceKind::NatGateway => self.nat_gateways.get_mut(id)?.tags_mut(),
            ResourceKind::Snapshot => self.snapshots.get_mut(id)?.tags_mut(),
            ResourceKind::Image => self.images.get_mut(id)?.tags_mut(),
            ResourceKind::Instance => self.instances.get_mut(id)?.tags_mut(),
        };
        Ok(tags)
    }

    /// Fail unless `id` names an existing record
    pub fn ensure_exists(&self, id: &str) -> Result<(), ApiError> {
        let kind = ResourceKind::from_id(id).ok_or_else(|| unknown_id(id))?;
        let found = match kind {
            ResourceKind::Vpc => self.vpcs.contains(id),
            ResourceKind::Subnet => self.subnets.contains(id),
            ResourceKind::InternetGateway => self.internet_gateways.contains(id),
            ResourceKind::RouteTable => self.route_tables.contains(id),
            ResourceKind::NatGateway => self.nat_gateways.contains(id),
            ResourceKind::Snapshot => self.snapshots.contains(id),
            ResourceKind::Image => self.images.contains(id),
            ResourceKind::Instance => self.instances.contains(id),
        };
        if !found {
            return Err(ApiError::not_found(kind, id));
        }
        Ok(())
    }

    /// `(id, kind, tags)` for every record, kinds in lock order
    pub fn tagged(&self) -> Vec<(String, ResourceKind, Vec<Tag>)> {
        fn collect<R: Resource>(
            out: &mut Vec<(String, ResourceKind, Vec<Tag>)>,
            collection: &Collection<R>,
        ) {
            out.extend(
                collection
                    .iter()
                    .map(|r| (r.id().to_string(), R::KIND, r.tags())),
            );
        }

        let mut out = Vec::new();
        collect(&mut out, &self.vpcs);
        collect(&mut out, &self.subnets);
        collect(&mut out, &self.internet_gateways);
        collect(&mut out, &self.route_tables);
        collect(&mut out, &self.nat_gateways);
        collect(&mut out, &self.snapshots);
        collect(&mut out, &self.images);
        collect(&mut out, &self.instances);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: &str, instances: &[&str]) -> Image {
        let mut image = Image::new(id, "test-image", "123456789012", "2024-01-01T00:00:00.000Z");
        image.instance_ids = instances.iter().map(|s| s.to_string()).collect();
        image
    }

    #[test]
    fn test_put_get_list_in_insertion_order() {
        let mut images = Collection::new();
        images.put(image("ami-3", &[]));
        images.put(image("ami-1", &[]));
        images.put(image("ami-2", &[]));

        let ids: Vec<String> = images.list().into_iter().map(|i| i.image_id).collect();
        assert_eq!(ids, vec!["ami-3", "ami-1", "ami-2"]);
        assert_eq!(images.get("ami-1").unwrap().image_id, "ami-1");
    }

    #[test]
    fn test_put_replaces_in_place() {
        let mut images = Collection::new();
        images.put(image("ami-1", &[]));
        images.put(image("ami-2", &[]));
        let mut updated = image("ami-1", &[]);
        updated.name = "renamed".to_string();
        images.put(updated);

        assert_eq!(images.len(), 2);
        assert_eq!(images.list()[0].name, "renamed");
    }

    #[test]
    fn test_get_missing_uses_kind_code() {
        let images: Collection<Image> = Collection::new();
        let err = images.get("ami-404").unwrap_err();
        assert_eq!(err.code.as_str(), "InvalidAMIID.NotFound");
    }

    #[test]
    fn test_delete_blocked_until_dependents_removed() {
        let mut images = Collection::new();
        images.put(image("ami-1", &["i-1"]));

        for _ in 0..3 {
            let err = images.delete("ami-1").unwrap_err();
            assert_eq!(err.code, ErrorCode::DependencyViolation);
            assert_eq!(images.get("ami-1").unwrap().instance_ids, vec!["i-1"]);
        }

        assert!(images.unlink_child("ami-1", Image::INSTANCES, "i-1"));
        let removed = images.delete("ami-1").unwrap();
        assert_eq!(removed.image_id, "ami-1");
        assert!(images.get("ami-1").is_err());
        assert!(images.is_empty());
    }

    #[test]
    fn test_link_child_requires_parent() {
        let mut images: Collection<Image> = Collection::new();
        let err = images
            .link_child("ami-missing", Image::INSTANCES, "i-1")
            .unwrap_err();
        assert_eq!(err.code.as_str(), "InvalidAMIID.NotFound");
    }

    #[test]
    fn test_link_child_is_idempotent() {
        let mut images = Collection::new();
        images.put(image("ami-1", &[]));
        images.link_child("ami-1", Image::INSTANCES, "i-1").unwrap();
        images.link_child("ami-1", Image::INSTANCES, "i-1").unwrap();
        assert_eq!(images.get("ami-1").unwrap().instance_ids, vec!["i-1"]);
    }

    #[test]
    fn test_link_unknown_edge_is_internal_error() {
        let mut images = Collection::new();
        images.put(image("ami-1", &[]));
        let err = images.link_child("ami-1", "nope", "i-1").unwrap_err();
        assert_eq!(err.code, ErrorCode::InternalError);
    }

    #[test]
    fn test_select_keeps_request_order_and_fails_on_missing() {
        let mut images = Collection::new();
        images.put(image("ami-1", &[]));
        images.put(image("ami-2", &[]));

        let picked = images
            .select(&["ami-2".to_string(), "ami-1".to_string()])
            .unwrap();
        assert_eq!(picked[0].image_id, "ami-2");
        assert!(images.select(&["ami-9".to_string()]).is_err());
        assert_eq!(images.select(&[]).unwrap().len(), 2);
    }

    #[test]
    fn test_guard_tags_by_prefix() {
        let store = Store::new();
        store.images.lock().put(image("ami-1", &[]));

        let mut guard = store.lock_all();
        guard.tags_mut("ami-1").unwrap().push(Tag::new("Name", "web"));
        assert_eq!(
            guard.tags_mut("ami-2").unwrap_err().code.as_str(),
            "InvalidAMIID.NotFound"
        );
        assert_eq!(
            guard.tags_mut("eni-1").unwrap_err().code,
            ErrorCode::InvalidParameterValue
        );

        let tagged = guard.tagged();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].1, ResourceKind::Image);
        assert_eq!(tagged[0].2, vec![Tag::new("Name", "web")]);
    }
}
