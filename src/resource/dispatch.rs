//! Action Dispatch
//!
//! Maps `Action` names to handlers and tags every handler result as an
//! [`Outcome`].

use super::handlers::{compute, network, tags, Handler};
use crate::context::Context;
use crate::outcome::{ApiError, Outcome};
use crate::params::RawParams;
use anyhow::Result;

/// Handler registered for `action`
pub fn handler_for(action: &str) -> Option<Handler> {
    let handler: Handler = match action {
        // VPCs and subnets
        "CreateVpc" => network::create_vpc,
        "DescribeVpcs" => network::describe_vpcs,
        "DeleteVpc" => network::delete_vpc,
        "CreateSubnet" => network::create_subnet,
        "DescribeSubnets" => network::describe_subnets,
        "DeleteSubnet" => network::delete_subnet,

        // Gateways
        "CreateInternetGateway" => network::create_internet_gateway,
        "AttachInternetGateway" => network::attach_internet_gateway,
        "DetachInternetGateway" => network::detach_internet_gateway,
        "DescribeInternetGateways" => network::describe_internet_gateways,
        "DeleteInternetGateway" => network::delete_internet_gateway,
        "CreateNatGateway" => network::create_nat_gateway,
        "DescribeNatGateways" => network::describe_nat_gateways,
        "DeleteNatGateway" => network::delete_nat_gateway,

        // Route tables
        "CreateRouteTable" => network::create_route_table,
        "AssociateRouteTable" => network::associate_route_table,
        "DisassociateRouteTable" => network::disassociate_route_table,
        "DescribeRouteTables" => network::describe_route_tables,
        "DeleteRouteTable" => network::delete_route_table,

        // Snapshots and images
        "CreateSnapshot" => compute::create_snapshot,
        "DescribeSnapshots" => compute::describe_snapshots,
        "DeleteSnapshot" => compute::delete_snapshot,
        "RegisterImage" => compute::register_image,
        "DescribeImages" => compute::describe_images,
        "DeregisterImage" => compute::deregister_image,

        // Instances
        "RunInstances" => compute::run_instances,
        "DescribeInstances" => compute::describe_instances,
        "StopInstances" => compute::stop_instances,
        "StartInstances" => compute::start_instances,
        "TerminateInstances" => compute::terminate_instances,
        "DescribeInstanceImageMetadata" => compute::describe_instance_image_metadata,

        // Tags
        "CreateTags" => tags::create_tags,
        "DeleteTags" => tags::delete_tags,
        "DescribeTags" => tags::describe_tags,

        _ => return None,
    };
    Some(handler)
}

/// Every action with a registered handler
pub const ACTIONS: &[&str] = &[
    "CreateVpc",
    "DescribeVpcs",
    "DeleteVpc",
    "CreateSubnet",
    "DescribeSubnets",
    "DeleteSubnet",
    "CreateInternetGateway",
    "AttachInternetGateway",
    "DetachInternetGateway",
    "DescribeInternetGateways",
    "DeleteInternetGateway",
    "CreateNatGateway",
    "DescribeNatGateways",
    "DeleteNatGateway",
    "CreateRouteTable",
    "AssociateRouteTable",
    "DisassociateRouteTable",
    "DescribeRouteTables",
    "DeleteRouteTable",
    "CreateSnapshot",
    "DescribeSnapshots",
    "DeleteSnapshot",
    "RegisterImage",
    "DescribeImages",
    "DeregisterImage",
    "RunInstances",
    "DescribeInstances",
    "StopInstances",
    "StartInstances",
    "TerminateInstances",
    "DescribeInstanceImageMetadata",
    "CreateTags",
    "DeleteTags",
    "DescribeTags",
];

/// Run the handler named by the request's `Action`
///
/// A missing `Action` is a tagged [`Outcome::Error`]; an action with no
/// handler is a dispatch failure.
pub fn dispatch(ctx: &Context, params: &RawParams) -> Result<Outcome> {
    let action = match params.action() {
        Ok(action) => action,
        Err(e) => return Ok(Outcome::Error(ApiError::from(e))),
    };
    tracing::debug!("dispatch: action={}, params={}", action, params.len());

    let Some(handler) = handler_for(action) else {
        return Err(anyhow::anyhow!("Unknown action: {}", action));
    };

    let outcome = Outcome::from(handler(ctx, params));
    if let Outcome::Error(e) = &outcome {
        tracing::warn!("{} rejected: {}", action, e);
    }
    Ok(outcome)
}
