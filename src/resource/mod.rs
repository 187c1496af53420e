//! Resource layer
//!
//! Typed records, the handlers that operate on them and the data-driven
//! registry describing how each kind is listed and filtered.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches per-kind definitions from embedded JSON
//! - [`model`] - Typed records stored in the [`crate::store::Store`]
//! - [`handlers`] - One function per emulated action
//! - [`dispatch`] - Maps `Action` names to handlers
//!
//! # Resource Definitions
//!
//! Kinds are defined in JSON files under `src/resources/`:
//! - `network.json` - VPCs, subnets, gateways, route tables
//! - `compute.json` - snapshots, images, instances, tags
//!
//! Each entry lists the filter names a describe call accepts and the aliases
//! that map wire filter names onto record fields.
//!
//! # Example
//!
//! ```
//! use ec2emu::context::Context;
//! use ec2emu::params::RawParams;
//! use ec2emu::resource::dispatch::dispatch;
//!
//! let ctx = Context::default();
//! let params = RawParams::from_query("Action=CreateVpc&CidrBlock=10.0.0.0%2F16");
//! let outcome = dispatch(&ctx, &params).unwrap();
//! assert!(outcome.is_success());
//! ```

pub mod dispatch;
pub mod handlers;
pub mod model;
pub mod registry;

pub use dispatch::{dispatch, handler_for};
pub use registry::{get_resource, ResourceDef};
