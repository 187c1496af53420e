//! Snapshot, image and instance records

use super::{list, optional, scalar};
use crate::filter::{FieldReadable, FieldValue};
use crate::params::Tag;
use crate::store::{DependencyEdge, Resource, ResourceKind};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub snapshot_id: String,
    pub volume_id: String,
    pub volume_size: i64,
    pub description: String,
    #[serde(rename = "status")]
    pub state: String,
    pub start_time: String,
    pub owner_id: String,
    pub image_ids: Vec<String>,
    #[serde(rename = "tagSet")]
    pub tags: Vec<Tag>,
}

impl Snapshot {
    pub const IMAGES: &'static str = "imageIds";
}

impl FieldReadable for Snapshot {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "snapshot_id" => scalar(&self.snapshot_id),
            "volume_id" => scalar(&self.volume_id),
            "volume_size" => Some(self.volume_size.to_string().into()),
            "description" => scalar(&self.description),
            "state" | "status" => scalar(&self.state),
            "start_time" => scalar(&self.start_time),
            "owner_id" => scalar(&self.owner_id),
            "image_ids" => list(&self.image_ids),
            _ => None,
        }
    }

    fn tags(&self) -> Vec<Tag> {
        self.tags.clone()
    }
}

impl Resource for Snapshot {
    const KIND: ResourceKind = ResourceKind::Snapshot;

    fn id(&self) -> &str {
        &self.snapshot_id
    }

    fn dependencies(&self) -> Vec<DependencyEdge> {
        vec![DependencyEdge::new(Self::IMAGES, self.image_ids.clone())]
    }

    fn edge_mut(&mut self, edge: &str) -> Option<&mut Vec<String>> {
        match edge {
            Self::IMAGES => Some(&mut self.image_ids),
            _ => None,
        }
    }

    fn tags_mut(&mut self) -> &mut Vec<Tag> {
        &mut self.tags
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub image_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "imageState")]
    pub state: String,
    #[serde(rename = "imageOwnerId")]
    pub owner_id: String,
    #[serde(rename = "isPublic")]
    pub public: bool,
    pub architecture: String,
    pub root_device_name: String,
    pub snapshot_ids: Vec<String>,
    pub instance_ids: Vec<String>,
    pub creation_date: String,
    #[serde(rename = "tagSet")]
    pub tags: Vec<Tag>,
}

impl Image {
    pub const INSTANCES: &'static str = "instanceIds";

    pub fn new(image_id: &str, name: &str, owner_id: &str, creation_date: &str) -> Self {
        Self {
            image_id: image_id.to_string(),
            name: name.to_string(),
            description: None,
            state: "available".to_string(),
            owner_id: owner_id.to_string(),
            public: false,
            architecture: "x86_64".to_string(),
            root_device_name: "/dev/xvda".to_string(),
            snapshot_ids: Vec::new(),
            instance_ids: Vec::new(),
            creation_date: creation_date.to_string(),
            tags: Vec::new(),
        }
    }
}

impl FieldReadable for Image {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "image_id" => scalar(&self.image_id),
            "name" => scalar(&self.name),
            "description" => optional(self.description.as_ref()),
            "state" | "imageState" => scalar(&self.state),
            "owner_id" | "imageOwnerId" => scalar(&self.owner_id),
            "public" | "isPublic" => Some(self.public.into()),
            "architecture" => scalar(&self.architecture),
            "root_device_name" => scalar(&self.root_device_name),
            "snapshot_ids" => list(&self.snapshot_ids),
            "instance_ids" => list(&self.instance_ids),
            "creation_date" => scalar(&self.creation_date),
            _ => None,
        }
    }

    fn tags(&self) -> Vec<Tag> {
        self.tags.clone()
    }
}

impl Resource for Image {
    const KIND: ResourceKind = ResourceKind::Image;

    fn id(&self) -> &str {
        &self.image_id
    }

    fn dependencies(&self) -> Vec<DependencyEdge> {
        vec![DependencyEdge::new(Self::INSTANCES, self.instance_ids.clone())]
    }

    fn edge_mut(&mut self, edge: &str) -> Option<&mut Vec<String>> {
        match edge {
            Self::INSTANCES => Some(&mut self.instance_ids),
            _ => None,
        }
    }

    fn tags_mut(&mut self) -> &mut Vec<Tag> {
        &mut self.tags
    }
}

/// Instance lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
}

impl InstanceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::ShuttingDown => "shutting-down",
            Self::Terminated => "terminated",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        }
    }

    /// Numeric state code reported alongside the name
    pub fn code(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Running => 16,
            Self::ShuttingDown => 32,
            Self::Terminated => 48,
            Self::Stopping => 64,
            Self::Stopped => 80,
        }
    }

    /// State after a stop request, if allowed from here
    pub fn stop(self) -> Option<Self> {
        match self {
            Self::Pending | Self::Running => Some(Self::Stopped),
            _ => None,
        }
    }

    /// State after a start request, if allowed from here
    pub fn start(self) -> Option<Self> {
        match self {
            Self::Stopped => Some(Self::Running),
            _ => None,
        }
    }

    /// Terminate is accepted from every state
    pub fn terminate(self) -> Self {
        Self::Terminated
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub instance_id: String,
    pub image_id: String,
    pub instance_type: String,
    #[serde(rename = "instanceState")]
    pub state: InstanceState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,
    pub availability_zone: String,
    pub launch_time: String,
    #[serde(rename = "tagSet")]
    pub tags: Vec<Tag>,
}

impl FieldReadable for Instance {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "instance_id" => scalar(&self.instance_id),
            "image_id" => scalar(&self.image_id),
            "instance_type" => scalar(&self.instance_type),
            "state" | "instanceState" => scalar(self.state.as_str()),
            "subnet_id" => optional(self.subnet_id.as_ref()),
            "vpc_id" => optional(self.vpc_id.as_ref()),
            "availability_zone" => scalar(&self.availability_zone),
            "launch_time" => scalar(&self.launch_time),
            _ => None,
        }
    }

    fn tags(&self) -> Vec<Tag> {
        self.tags.clone()
    }
}

impl Resource for Instance {
    const KIND: ResourceKind = ResourceKind::Instance;

    fn id(&self) -> &str {
        &self.instance_id
    }

    fn tags_mut(&mut self) -> &mut Vec<Tag> {
        &mut self.tags
    }
}
