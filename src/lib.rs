//! ec2emu - an in-memory emulator for the EC2 Query API
//!
//! Requests arrive as flat, dotted-key parameter maps. They are parsed into
//! structured parameters and filters, dispatched to a handler that reads and
//! writes the [`store::Store`], and come back as a tagged
//! [`outcome::Outcome`] that [`response`] renders for the wire.

pub mod config;
pub mod context;
pub mod filter;
pub mod outcome;
pub mod params;
pub mod resource;
pub mod response;
pub mod server;
pub mod store;

/// Version injected at compile time via EC2EMU_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("EC2EMU_VERSION") {
    Some(v) => v,
    None => "dev",
};
