//! Resource kinds and id generation

use rand::Rng;
use std::fmt;

/// Length of the random hex suffix of generated ids
const ID_SUFFIX_LEN: usize = 17;

/// Every kind of record the emulator stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Vpc,
    Subnet,
    InternetGateway,
    RouteTable,
    NatGateway,
    Snapshot,
    Image,
    Instance,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 8] = [
        Self::Vpc,
        Self::Subnet,
        Self::InternetGateway,
        Self::RouteTable,
        Self::NatGateway,
        Self::Snapshot,
        Self::Image,
        Self::Instance,
    ];

    /// Id prefix (`ami` in `ami-0123...`)
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Vpc => "vpc",
            Self::Subnet => "subnet",
            Self::InternetGateway => "igw",
            Self::RouteTable => "rtb",
            Self::NatGateway => "nat",
            Self::Snapshot => "snap",
            Self::Image => "ami",
            Self::Instance => "i",
        }
    }

    /// Not-found error code used by the emulated API for this kind
    pub fn not_found_code(&self) -> &'static str {
        match self {
            Self::Vpc => "InvalidVpcID.NotFound",
            Self::Subnet => "InvalidSubnetID.NotFound",
            Self::InternetGateway => "InvalidInternetGatewayID.NotFound",
            Self::RouteTable => "InvalidRouteTableID.NotFound",
            Self::NatGateway => "NatGatewayNotFound",
            Self::Snapshot => "InvalidSnapshot.NotFound",
            Self::Image => "InvalidAMIID.NotFound",
            Self::Instance => "InvalidInstanceID.NotFound",
        }
    }

    /// Registry key and `ResourceType` value in tag specifications
    pub fn tag_resource_type(&self) -> &'static str {
        match self {
            Self::Vpc => "vpc",
            Self::Subnet => "subnet",
            Self::InternetGateway => "internet-gateway",
            Self::RouteTable => "route-table",
            Self::NatGateway => "natgateway",
            Self::Snapshot => "snapshot",
            Self::Image => "image",
            Self::Instance => "instance",
        }
    }

    /// Human-readable name used in error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Vpc => "vpc",
            Self::Subnet => "subnet",
            Self::InternetGateway => "internet gateway",
            Self::RouteTable => "route table",
            Self::NatGateway => "NAT gateway",
            Self::Snapshot => "snapshot",
            Self::Image => "image",
            Self::Instance => "instance",
        }
    }

    /// Kind owning `id`, by prefix
    pub fn from_id(id: &str) -> Option<Self> {
        let (prefix, _) = id.split_once('-')?;
        Self::ALL.into_iter().find(|k| k.id_prefix() == prefix)
    }

    /// Kind named by a tag-specification resource type
    pub fn from_tag_resource_type(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.tag_resource_type() == name)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_resource_type())
    }
}

/// New id: `<prefix>-<17 lowercase hex chars>`
pub fn generate_id(kind: ResourceKind) -> String {
    random_id(kind.id_prefix())
}

/// `<prefix>-<17 lowercase hex chars>` for ids that are not stored kinds
/// (association ids and the like)
pub fn random_id(prefix: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| HEX[rng.gen_range(0..HEX.len())] as char)
        .collect();
    format!("{}-{}", prefix, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_shape() {
        let id = generate_id(ResourceKind::Image);
        let (prefix, suffix) = id.split_once('-').unwrap();
        assert_eq!(prefix, "ami");
        assert_eq!(suffix.len(), 17);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(
            generate_id(ResourceKind::Vpc),
            generate_id(ResourceKind::Vpc)
        );
    }

    #[test]
    fn test_from_id_round_trips_every_kind() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_id(&generate_id(kind)), Some(kind));
        }
        assert_eq!(ResourceKind::from_id("eni-123"), None);
        assert_eq!(ResourceKind::from_id("garbage"), None);
    }

    #[test]
    fn test_prefixes_are_unique() {
        for a in ResourceKind::ALL {
            for b in ResourceKind::ALL {
                if a != b {
                    assert_ne!(a.id_prefix(), b.id_prefix());
                }
            }
        }
    }
}
