//! VPC networking records

use super::{list, optional, scalar};
use crate::filter::{FieldReadable, FieldValue};
use crate::params::Tag;
use crate::store::{DependencyEdge, Resource, ResourceKind};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vpc {
    pub vpc_id: String,
    pub cidr_block: String,
    pub state: String,
    pub is_default: bool,
    pub owner_id: String,
    pub subnet_ids: Vec<String>,
    pub internet_gateway_ids: Vec<String>,
    pub nat_gateway_ids: Vec<String>,
    pub route_table_ids: Vec<String>,
    #[serde(rename = "tagSet")]
    pub tags: Vec<Tag>,
}

impl Vpc {
    pub const SUBNETS: &'static str = "subnetIds";
    pub const INTERNET_GATEWAYS: &'static str = "internetGatewayIds";
    pub const NAT_GATEWAYS: &'static str = "natGatewayIds";
    pub const ROUTE_TABLES: &'static str = "routeTableIds";

    pub fn new(vpc_id: &str, cidr_block: &str, owner_id: &str) -> Self {
        Self {
            vpc_id: vpc_id.to_string(),
            cidr_block: cidr_block.to_string(),
            state: "available".to_string(),
            is_default: false,
            owner_id: owner_id.to_string(),
            subnet_ids: Vec::new(),
            internet_gateway_ids: Vec::new(),
            nat_gateway_ids: Vec::new(),
            route_table_ids: Vec::new(),
            tags: Vec::new(),
        }
    }
}

impl FieldReadable for Vpc {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "vpc_id" => scalar(&self.vpc_id),
            "cidr_block" => scalar(&self.cidr_block),
            "state" => scalar(&self.state),
            "is_default" => Some(self.is_default.into()),
            "owner_id" => scalar(&self.owner_id),
            "subnet_ids" => list(&self.subnet_ids),
            "internet_gateway_ids" => list(&self.internet_gateway_ids),
            "nat_gateway_ids" => list(&self.nat_gateway_ids),
            "route_table_ids" => list(&self.route_table_ids),
            _ => None,
        }
    }

    fn tags(&self) -> Vec<Tag> {
        self.tags.clone()
    }
}

impl Resource for Vpc {
    const KIND: ResourceKind = ResourceKind::Vpc;

    fn id(&self) -> &str {
        &self.vpc_id
    }

    fn dependencies(&self) -> Vec<DependencyEdge> {
        vec![
            DependencyEdge::new(Self::SUBNETS, self.subnet_ids.clone()),
            DependencyEdge::new(Self::INTERNET_GATEWAYS, self.internet_gateway_ids.clone()),
            DependencyEdge::new(Self::NAT_GATEWAYS, self.nat_gateway_ids.clone()),
            DependencyEdge::new(Self::ROUTE_TABLES, self.route_table_ids.clone()),
        ]
    }

    fn edge_mut(&mut self, edge: &str) -> Option<&mut Vec<String>> {
        match edge {
            Self::SUBNETS => Some(&mut self.subnet_ids),
            Self::INTERNET_GATEWAYS => Some(&mut self.internet_gateway_ids),
            Self::NAT_GATEWAYS => Some(&mut self.nat_gateway_ids),
            Self::ROUTE_TABLES => Some(&mut self.route_table_ids),
            _ => None,
        }
    }

    fn tags_mut(&mut self) -> &mut Vec<Tag> {
        &mut self.tags
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub subnet_id: String,
    pub vpc_id: String,
    pub cidr_block: String,
    pub availability_zone: String,
    pub state: String,
    pub available_ip_address_count: u64,
    pub nat_gateway_ids: Vec<String>,
    pub instance_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_table_id: Option<String>,
    #[serde(rename = "tagSet")]
    pub tags: Vec<Tag>,
}

impl Subnet {
    pub const NAT_GATEWAYS: &'static str = "natGatewayIds";
    pub const INSTANCES: &'static str = "instanceIds";
    pub const ROUTE_TABLE: &'static str = "routeTableId";
}

impl FieldReadable for Subnet {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "subnet_id" => scalar(&self.subnet_id),
            "vpc_id" => scalar(&self.vpc_id),
            "cidr_block" => scalar(&self.cidr_block),
            "availability_zone" => scalar(&self.availability_zone),
            "state" => scalar(&self.state),
            "available_ip_address_count" => {
                Some(self.available_ip_address_count.to_string().into())
            }
            "nat_gateway_ids" => list(&self.nat_gateway_ids),
            "instance_ids" => list(&self.instance_ids),
            "route_table_id" => optional(self.route_table_id.as_ref()),
            _ => None,
        }
    }

    fn tags(&self) -> Vec<Tag> {
        self.tags.clone()
    }
}

impl Resource for Subnet {
    const KIND: ResourceKind = ResourceKind::Subnet;

    fn id(&self) -> &str {
        &self.subnet_id
    }

    fn dependencies(&self) -> Vec<DependencyEdge> {
        vec![
            DependencyEdge::new(Self::NAT_GATEWAYS, self.nat_gateway_ids.clone()),
            DependencyEdge::new(Self::INSTANCES, self.instance_ids.clone()),
            DependencyEdge::new(
                Self::ROUTE_TABLE,
                self.route_table_id.iter().cloned().collect(),
            ),
        ]
    }

    fn edge_mut(&mut self, edge: &str) -> Option<&mut Vec<String>> {
        match edge {
            Self::NAT_GATEWAYS => Some(&mut self.nat_gateway_ids),
            Self::INSTANCES => Some(&mut self.instance_ids),
            _ => None,
        }
    }

    fn tags_mut(&mut self) -> &mut Vec<Tag> {
        &mut self.tags
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternetGatewayAttachment {
    pub vpc_id: String,
    pub state: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternetGateway {
    pub internet_gateway_id: String,
    pub owner_id: String,
    #[serde(rename = "attachmentSet")]
    pub attachments: Vec<InternetGatewayAttachment>,
    #[serde(rename = "tagSet")]
    pub tags: Vec<Tag>,
}

impl InternetGateway {
    pub const ATTACHMENTS: &'static str = "attachmentSet";

    pub fn attached_vpc_ids(&self) -> Vec<String> {
        self.attachments.iter().map(|a| a.vpc_id.clone()).collect()
    }
}

impl FieldReadable for InternetGateway {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "internet_gateway_id" => scalar(&self.internet_gateway_id),
            "owner_id" => scalar(&self.owner_id),
            "attached_vpc_ids" | "attachmentSet" => {
                Some(FieldValue::List(self.attached_vpc_ids()))
            }
            "attachment_states" => Some(FieldValue::List(
                self.attachments.iter().map(|a| a.state.clone()).collect(),
            )),
            _ => None,
        }
    }

    fn tags(&self) -> Vec<Tag> {
        self.tags.clone()
    }
}

impl Resource for InternetGateway {
    const KIND: ResourceKind = ResourceKind::InternetGateway;

    fn id(&self) -> &str {
        &self.internet_gateway_id
    }

    fn dependencies(&self) -> Vec<DependencyEdge> {
        vec![DependencyEdge::new(
            Self::ATTACHMENTS,
            self.attached_vpc_ids(),
        )]
    }

    fn tags_mut(&mut self) -> &mut Vec<Tag> {
        &mut self.tags
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub destination_cidr_block: String,
    pub gateway_id: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTableAssociation {
    pub route_table_association_id: String,
    pub route_table_id: String,
    pub subnet_id: String,
    pub main: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTable {
    pub route_table_id: String,
    pub vpc_id: String,
    pub owner_id: String,
    #[serde(rename = "routeSet")]
    pub routes: Vec<Route>,
    #[serde(rename = "associationSet")]
    pub associations: Vec<RouteTableAssociation>,
    #[serde(rename = "tagSet")]
    pub tags: Vec<Tag>,
}

impl RouteTable {
    pub const ASSOCIATIONS: &'static str = "associationSet";

    /// New table with the implicit local route for `vpc_cidr`
    pub fn new(route_table_id: &str, vpc_id: &str, vpc_cidr: &str, owner_id: &str) -> Self {
        Self {
            route_table_id: route_table_id.to_string(),
            vpc_id: vpc_id.to_string(),
            owner_id: owner_id.to_string(),
            routes: vec![Route {
                destination_cidr_block: vpc_cidr.to_string(),
                gateway_id: "local".to_string(),
                state: "active".to_string(),
            }],
            associations: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn associated_subnet_ids(&self) -> Vec<String> {
        self.associations.iter().map(|a| a.subnet_id.clone()).collect()
    }
}

impl FieldReadable for RouteTable {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "route_table_id" => scalar(&self.route_table_id),
            "vpc_id" => scalar(&self.vpc_id),
            "owner_id" => scalar(&self.owner_id),
            "associated_subnet_ids" => Some(FieldValue::List(self.associated_subnet_ids())),
            "association_ids" | "associationSet" => Some(FieldValue::List(
                self.associations
                    .iter()
                    .map(|a| a.route_table_association_id.clone())
                    .collect(),
            )),
            "route_destinations" | "routeSet" => Some(FieldValue::List(
                self.routes
                    .iter()
                    .map(|r| r.destination_cidr_block.clone())
                    .collect(),
            )),
            _ => None,
        }
    }

    fn tags(&self) -> Vec<Tag> {
        self.tags.clone()
    }
}

impl Resource for RouteTable {
    const KIND: ResourceKind = ResourceKind::RouteTable;

    fn id(&self) -> &str {
        &self.route_table_id
    }

    fn dependencies(&self) -> Vec<DependencyEdge> {
        vec![DependencyEdge::new(
            Self::ASSOCIATIONS,
            self.associated_subnet_ids(),
        )]
    }

    fn tags_mut(&mut self) -> &mut Vec<Tag> {
        &mut self.tags
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NatGateway {
    pub nat_gateway_id: String,
    pub subnet_id: String,
    pub vpc_id: String,
    pub state: String,
    pub connectivity_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation_id: Option<String>,
    pub create_time: String,
    #[serde(rename = "tagSet")]
    pub tags: Vec<Tag>,
}

impl FieldReadable for NatGateway {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "nat_gateway_id" => scalar(&self.nat_gateway_id),
            "subnet_id" => scalar(&self.subnet_id),
            "vpc_id" => scalar(&self.vpc_id),
            "state" => scalar(&self.state),
            "connectivity_type" => scalar(&self.connectivity_type),
            "allocation_id" => optional(self.allocation_id.as_ref()),
            "create_time" => scalar(&self.create_time),
            _ => None,
        }
    }

    fn tags(&self) -> Vec<Tag> {
        self.tags.clone()
    }
}

impl Resource for NatGateway {
    const KIND: ResourceKind = ResourceKind::NatGateway;

    fn id(&self) -> &str {
        &self.nat_gateway_id
    }

    fn tags_mut(&mut self) -> &mut Vec<Tag> {
        &mut self.tags
    }
}
