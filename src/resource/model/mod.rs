//! Canonical resource records
//!
//! Records serialize with camelCase keys for the wire. The filter evaluator
//! reads them by native snake_case name or by wire name, so a renamed field
//! such as `Image::state` answers to both `state` and `imageState`.

mod compute;
mod network;

pub use compute::{Image, Instance, InstanceState, Snapshot};
pub use network::{
    InternetGateway, InternetGatewayAttachment, NatGateway, Route, RouteTable,
    RouteTableAssociation, Subnet, Vpc,
};

use crate::filter::FieldValue;

fn scalar(value: &str) -> Option<FieldValue> {
    Some(FieldValue::from(value))
}

fn list(values: &[String]) -> Option<FieldValue> {
    Some(FieldValue::from(values))
}

fn optional(value: Option<&String>) -> Option<FieldValue> {
    value.map(|v| FieldValue::from(v.as_str()))
}
