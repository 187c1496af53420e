//! VPC, subnet, gateway and route table handlers

use super::{cidr_param, describe, now, requested_tags, return_true, single};
use crate::context::Context;
use crate::outcome::{ApiError, ErrorCode, Payload};
use crate::params::RawParams;
use crate::resource::model::{
    InternetGateway, InternetGatewayAttachment, NatGateway, RouteTable, RouteTableAssociation,
    Subnet, Vpc,
};
use crate::store::{generate_id, random_id, ResourceKind};
use serde_json::Value;

// =============================================================================
// VPCs
// =============================================================================

pub fn create_vpc(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    cidr_param(params, "CidrBlock", 16, 28)?;
    let cidr_block = params.require("CidrBlock")?;

    let mut vpc = Vpc::new(&generate_id(ResourceKind::Vpc), cidr_block, &ctx.account_id);
    vpc.tags = requested_tags(params, ResourceKind::Vpc)?;

    ctx.store.vpcs.lock().put(vpc.clone());
    tracing::info!("created vpc {} ({})", vpc.vpc_id, vpc.cidr_block);
    single("vpc", &vpc)
}

pub fn describe_vpcs(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let ids = params.indexed_list("VpcId");
    let records = ctx.store.vpcs.lock().select(&ids)?;
    describe("vpc", records, params, !ids.is_empty())
}

pub fn delete_vpc(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let vpc_id = params.require("VpcId")?;
    ctx.store.vpcs.lock().delete(vpc_id)?;
    Ok(return_true())
}

// =============================================================================
// Subnets
// =============================================================================

pub fn create_subnet(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let vpc_id = params.require("VpcId")?;
    let cidr = cidr_param(params, "CidrBlock", 16, 28)?;
    let cidr_block = params.require("CidrBlock")?;
    let availability_zone = params
        .scalar("AvailabilityZone")
        .map(str::to_string)
        .unwrap_or_else(|| ctx.default_availability_zone());

    let mut vpcs = ctx.store.vpcs.lock();
    let mut subnets = ctx.store.subnets.lock();

    let vpc_cidr = super::Cidr::parse(&vpcs.get(vpc_id)?.cidr_block)
        .ok_or_else(|| ApiError::internal("stored vpc has an invalid cidr block"))?;
    if !vpc_cidr.contains(&cidr) {
        return Err(ApiError::new(
            ErrorCode::InvalidParameterValue,
            format!("The CIDR '{}' is invalid for vpc {}", cidr_block, vpc_id),
        ));
    }
    let overlaps = subnets
        .iter()
        .filter(|s| s.vpc_id == vpc_id)
        .any(|s| {
            super::Cidr::parse(&s.cidr_block)
                .map_or(false, |existing| existing.contains(&cidr) || cidr.contains(&existing))
        });
    if overlaps {
        return Err(ApiError::new(
            ErrorCode::InvalidParameterValue,
            format!("The CIDR '{}' conflicts with another subnet", cidr_block),
        ));
    }

    let subnet = Subnet {
        subnet_id: generate_id(ResourceKind::Subnet),
        vpc_id: vpc_id.to_string(),
        cidr_block: cidr_block.to_string(),
        availability_zone,
        state: "available".to_string(),
        available_ip_address_count: cidr.usable_addresses(),
        nat_gateway_ids: Vec::new(),
        instance_ids: Vec::new(),
        route_table_id: None,
        tags: requested_tags(params, ResourceKind::Subnet)?,
    };

    vpcs.link_child(vpc_id, Vpc::SUBNETS, &subnet.subnet_id)?;
    subnets.put(subnet.clone());
    tracing::info!("created subnet {} in {}", subnet.subnet_id, vpc_id);
    single("subnet", &subnet)
}

pub fn describe_subnets(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let ids = params.indexed_list("SubnetId");
    let records = ctx.store.subnets.lock().select(&ids)?;
    describe("subnet", records, params, !ids.is_empty())
}

pub fn delete_subnet(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let subnet_id = params.require("SubnetId")?;

    let mut vpcs = ctx.store.vpcs.lock();
    let mut subnets = ctx.store.subnets.lock();

    let subnet = subnets.delete(subnet_id)?;
    vpcs.unlink_child(&subnet.vpc_id, Vpc::SUBNETS, subnet_id);
    Ok(return_true())
}

// =============================================================================
// Internet gateways
// =============================================================================

pub fn create_internet_gateway(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let gateway = InternetGateway {
        internet_gateway_id: generate_id(ResourceKind::InternetGateway),
        owner_id: ctx.account_id.clone(),
        attachments: Vec::new(),
        tags: requested_tags(params, ResourceKind::InternetGateway)?,
    };

    ctx.store.internet_gateways.lock().put(gateway.clone());
    tracing::info!("created internet gateway {}", gateway.internet_gateway_id);
    single("internetGateway", &gateway)
}

pub fn attach_internet_gateway(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let gateway_id = params.require("InternetGatewayId")?;
    let vpc_id = params.require("VpcId")?;

    let mut vpcs = ctx.store.vpcs.lock();
    let mut gateways = ctx.store.internet_gateways.lock();

    let gateway = gateways.get(gateway_id)?;
    if !gateway.attachments.is_empty() {
        return Err(ApiError::new(
            ErrorCode::AlreadyAssociated,
            format!("resource {} is already attached to a network", gateway_id),
        ));
    }
    if !vpcs.get(vpc_id)?.internet_gateway_ids.is_empty() {
        return Err(ApiError::new(
            ErrorCode::AlreadyAssociated,
            format!("network {} already has an internet gateway attached", vpc_id),
        ));
    }

    vpcs.link_child(vpc_id, Vpc::INTERNET_GATEWAYS, gateway_id)?;
    gateways
        .get_mut(gateway_id)?
        .attachments
        .push(InternetGatewayAttachment {
            vpc_id: vpc_id.to_string(),
            state: "available".to_string(),
        });
    tracing::info!("attached {} to {}", gateway_id, vpc_id);
    Ok(return_true())
}

pub fn detach_internet_gateway(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let gateway_id = params.require("InternetGatewayId")?;
    let vpc_id = params.require("VpcId")?;

    let mut vpcs = ctx.store.vpcs.lock();
    let mut gateways = ctx.store.internet_gateways.lock();

    vpcs.get(vpc_id)?;
    let gateway = gateways.get_mut(gateway_id)?;
    if !gateway.attachments.iter().any(|a| a.vpc_id == vpc_id) {
        return Err(ApiError::new(
            ErrorCode::GatewayNotAttached,
            format!("resource {} is not attached to network {}", gateway_id, vpc_id),
        ));
    }

    gateway.attachments.retain(|a| a.vpc_id != vpc_id);
    vpcs.unlink_child(vpc_id, Vpc::INTERNET_GATEWAYS, gateway_id);
    tracing::info!("detached {} from {}", gateway_id, vpc_id);
    Ok(return_true())
}

pub fn describe_internet_gateways(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let ids = params.indexed_list("InternetGatewayId");
    let records = ctx.store.internet_gateways.lock().select(&ids)?;
    describe("internet-gateway", records, params, !ids.is_empty())
}

pub fn delete_internet_gateway(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let gateway_id = params.require("InternetGatewayId")?;
    ctx.store.internet_gateways.lock().delete(gateway_id)?;
    Ok(return_true())
}

// =============================================================================
// Route tables
// =============================================================================

pub fn create_route_table(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let vpc_id = params.require("VpcId")?;

    let mut vpcs = ctx.store.vpcs.lock();
    let mut tables = ctx.store.route_tables.lock();

    let vpc_cidr = vpcs.get(vpc_id)?.cidr_block.clone();
    let mut table = RouteTable::new(
        &generate_id(ResourceKind::RouteTable),
        vpc_id,
        &vpc_cidr,
        &ctx.account_id,
    );
    table.tags = requested_tags(params, ResourceKind::RouteTable)?;

    vpcs.link_child(vpc_id, Vpc::ROUTE_TABLES, &table.route_table_id)?;
    tables.put(table.clone());
    tracing::info!("created route table {} in {}", table.route_table_id, vpc_id);
    single("routeTable", &table)
}

pub fn associate_route_table(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let table_id = params.require("RouteTableId")?;
    let subnet_id = params.require("SubnetId")?;

    let mut subnets = ctx.store.subnets.lock();
    let mut tables = ctx.store.route_tables.lock();

    let table_vpc = tables.get(table_id)?.vpc_id.clone();
    let subnet = subnets.get_mut(subnet_id)?;
    if subnet.vpc_id != table_vpc {
        return Err(ApiError::new(
            ErrorCode::InvalidParameterValue,
            format!(
                "route table {} and subnet {} belong to different networks",
                table_id, subnet_id
            ),
        ));
    }
    if subnet.route_table_id.is_some() {
        return Err(ApiError::new(
            ErrorCode::AlreadyAssociated,
            format!(
                "the subnet {} is already associated with a route table",
                subnet_id
            ),
        ));
    }

    let association_id = random_id("rtbassoc");
    subnet.route_table_id = Some(table_id.to_string());
    tables
        .get_mut(table_id)?
        .associations
        .push(RouteTableAssociation {
            route_table_association_id: association_id.clone(),
            route_table_id: table_id.to_string(),
            subnet_id: subnet_id.to_string(),
            main: false,
        });

    tracing::info!("associated {} with {}", subnet_id, table_id);
    single("associationId", &association_id)
}

pub fn disassociate_route_table(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let association_id = params.require("AssociationId")?;

    let mut subnets = ctx.store.subnets.lock();
    let mut tables = ctx.store.route_tables.lock();

    let table_id = tables
        .iter()
        .find(|t| {
            t.associations
                .iter()
                .any(|a| a.route_table_association_id == association_id)
        })
        .map(|t| t.route_table_id.clone())
        .ok_or_else(|| {
            ApiError::new(
                ErrorCode::InvalidParameterValue,
                format!("The association ID '{}' does not exist", association_id),
            )
        })?;

    let table = tables.get_mut(&table_id)?;
    let mut removed = Vec::new();
    table.associations.retain(|a| {
        let keep = a.route_table_association_id != association_id;
        if !keep {
            removed.push(a.subnet_id.clone());
        }
        keep
    });
    for subnet_id in removed {
        if let Ok(subnet) = subnets.get_mut(&subnet_id) {
            subnet.route_table_id = None;
        }
    }
    Ok(return_true())
}

pub fn describe_route_tables(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let ids = params.indexed_list("RouteTableId");
    let records = ctx.store.route_tables.lock().select(&ids)?;
    describe("route-table", records, params, !ids.is_empty())
}

pub fn delete_route_table(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let table_id = params.require("RouteTableId")?;

    let mut vpcs = ctx.store.vpcs.lock();
    let mut tables = ctx.store.route_tables.lock();

    let table = tables.delete(table_id)?;
    vpcs.unlink_child(&table.vpc_id, Vpc::ROUTE_TABLES, table_id);
    Ok(return_true())
}

// =============================================================================
// NAT gateways
// =============================================================================

pub fn create_nat_gateway(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let subnet_id = params.require("SubnetId")?;
    let connectivity_type = params.scalar("ConnectivityType").unwrap_or("public");
    let allocation_id = params.scalar("AllocationId");

    match (connectivity_type, allocation_id) {
        ("public", _) => {}
        ("private", None) => {}
        ("private", Some(_)) => {
            return Err(ApiError::new(
                ErrorCode::InvalidParameterCombination,
                "AllocationId cannot be specified for a private NAT gateway",
            ));
        }
        (other, _) => return Err(ApiError::invalid_value("ConnectivityType", other)),
    }

    let mut vpcs = ctx.store.vpcs.lock();
    let mut subnets = ctx.store.subnets.lock();
    let mut gateways = ctx.store.nat_gateways.lock();

    let vpc_id = subnets.get(subnet_id)?.vpc_id.clone();
    let gateway = NatGateway {
        nat_gateway_id: generate_id(ResourceKind::NatGateway),
        subnet_id: subnet_id.to_string(),
        vpc_id: vpc_id.clone(),
        state: "available".to_string(),
        connectivity_type: connectivity_type.to_string(),
        allocation_id: allocation_id.map(str::to_string),
        create_time: now(),
        tags: requested_tags(params, ResourceKind::NatGateway)?,
    };

    vpcs.link_child(&vpc_id, Vpc::NAT_GATEWAYS, &gateway.nat_gateway_id)?;
    subnets.link_child(subnet_id, Subnet::NAT_GATEWAYS, &gateway.nat_gateway_id)?;
    gateways.put(gateway.clone());
    tracing::info!("created NAT gateway {} in {}", gateway.nat_gateway_id, subnet_id);
    single("natGateway", &gateway)
}

pub fn describe_nat_gateways(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let ids = params.indexed_list("NatGatewayId");
    let records = ctx.store.nat_gateways.lock().select(&ids)?;
    describe("natgateway", records, params, !ids.is_empty())
}

pub fn delete_nat_gateway(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let gateway_id = params.require("NatGatewayId")?;

    let mut vpcs = ctx.store.vpcs.lock();
    let mut subnets = ctx.store.subnets.lock();
    let mut gateways = ctx.store.nat_gateways.lock();

    let gateway = gateways.delete(gateway_id)?;
    subnets.unlink_child(&gateway.subnet_id, Subnet::NAT_GATEWAYS, gateway_id);
    vpcs.unlink_child(&gateway.vpc_id, Vpc::NAT_GATEWAYS, gateway_id);
    single("natGatewayId", &Value::String(gateway.nat_gateway_id))
}
