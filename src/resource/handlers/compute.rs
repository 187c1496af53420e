//! Snapshot, image and instance handlers

use super::{describe, flatten, now, owned_by, requested_tags, return_true, single, to_value};
use crate::context::Context;
use crate::outcome::{ApiError, ErrorCode, Payload};
use crate::params::RawParams;
use crate::resource::model::{Image, Instance, InstanceState, Snapshot, Subnet};
use crate::store::{generate_id, random_id, ResourceKind};
use serde_json::{json, Map, Value};

const ARCHITECTURES: &[&str] = &["i386", "x86_64", "arm64", "x86_64_mac", "arm64_mac"];

/// Upper bound on instances launched by one RunInstances call
const MAX_LAUNCH: i64 = 100;

// =============================================================================
// Snapshots
// =============================================================================

pub fn create_snapshot(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let volume_id = params.require("VolumeId")?;
    let volume_size = params.int("VolumeSize")?.unwrap_or(8);
    if volume_size < 1 {
        return Err(ApiError::invalid_value("VolumeSize", &volume_size.to_string()));
    }

    let snapshot = Snapshot {
        snapshot_id: generate_id(ResourceKind::Snapshot),
        volume_id: volume_id.to_string(),
        volume_size,
        description: params.scalar("Description").unwrap_or_default().to_string(),
        state: "completed".to_string(),
        start_time: now(),
        owner_id: ctx.account_id.clone(),
        image_ids: Vec::new(),
        tags: requested_tags(params, ResourceKind::Snapshot)?,
    };

    ctx.store.snapshots.lock().put(snapshot.clone());
    tracing::info!("created snapshot {} of {}", snapshot.snapshot_id, volume_id);
    flatten(&snapshot)
}

pub fn describe_snapshots(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let ids = params.indexed_list("SnapshotId");
    let owners = params.indexed_list("Owner");
    let records: Vec<Snapshot> = ctx
        .store
        .snapshots
        .lock()
        .select(&ids)?
        .into_iter()
        .filter(|s| owned_by(&owners, &ctx.account_id, &s.owner_id))
        .collect();
    describe("snapshot", records, params, !ids.is_empty())
}

pub fn delete_snapshot(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let snapshot_id = params.require("SnapshotId")?;
    ctx.store.snapshots.lock().delete(snapshot_id)?;
    Ok(return_true())
}

// =============================================================================
// Images
// =============================================================================

pub fn register_image(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let name = params.require("Name")?;
    let architecture = params.scalar("Architecture").unwrap_or("x86_64");
    if !ARCHITECTURES.contains(&architecture) {
        return Err(ApiError::invalid_value("Architecture", architecture));
    }
    let snapshot_ids: Vec<String> = params
        .indexed_groups("BlockDeviceMapping")
        .iter()
        .filter_map(|mapping| mapping.scalar("Ebs.SnapshotId").map(str::to_string))
        .collect();

    let mut snapshots = ctx.store.snapshots.lock();
    let mut images = ctx.store.images.lock();

    if images
        .iter()
        .any(|i| i.name == name && i.owner_id == ctx.account_id)
    {
        return Err(ApiError::new(
            ErrorCode::InvalidParameterValue,
            format!("AMI name {} is already in use by an AMI owned by you", name),
        ));
    }
    for snapshot_id in &snapshot_ids {
        snapshots.get(snapshot_id)?;
    }

    let mut image = Image::new(
        &generate_id(ResourceKind::Image),
        name,
        &ctx.account_id,
        &now(),
    );
    image.description = params.scalar("Description").map(str::to_string);
    image.architecture = architecture.to_string();
    if let Some(root) = params.scalar("RootDeviceName") {
        image.root_device_name = root.to_string();
    }
    image.snapshot_ids = snapshot_ids;
    image.tags = requested_tags(params, ResourceKind::Image)?;

    for snapshot_id in &image.snapshot_ids {
        snapshots.link_child(snapshot_id, Snapshot::IMAGES, &image.image_id)?;
    }
    images.put(image.clone());
    tracing::info!("registered image {} ({})", image.image_id, image.name);
    single("imageId", &image.image_id)
}

pub fn describe_images(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let ids = params.indexed_list("ImageId");
    let owners = params.indexed_list("Owner");
    let records: Vec<Image> = ctx
        .store
        .images
        .lock()
        .select(&ids)?
        .into_iter()
        .filter(|i| owned_by(&owners, &ctx.account_id, &i.owner_id))
        .collect();
    describe("image", records, params, !ids.is_empty())
}

pub fn deregister_image(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let image_id = params.require("ImageId")?;

    let mut snapshots = ctx.store.snapshots.lock();
    let mut images = ctx.store.images.lock();

    let image = images.delete(image_id)?;
    for snapshot_id in &image.snapshot_ids {
        snapshots.unlink_child(snapshot_id, Snapshot::IMAGES, image_id);
    }
    Ok(return_true())
}

// =============================================================================
// Instances
// =============================================================================

pub fn run_instances(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let image_id = params.require("ImageId")?;
    let min_count = params.int("MinCount")?.unwrap_or(1);
    let max_count = params.int("MaxCount")?.unwrap_or(min_count);
    if min_count < 1 {
        return Err(ApiError::invalid_value("MinCount", &min_count.to_string()));
    }
    if max_count > MAX_LAUNCH {
        return Err(ApiError::invalid_value("MaxCount", &max_count.to_string()));
    }
    if max_count < min_count {
        return Err(ApiError::new(
            ErrorCode::InvalidParameterValue,
            format!(
                "MaxCount ({}) must be greater than or equal to MinCount ({})",
                max_count, min_count
            ),
        ));
    }
    let instance_type = params.scalar("InstanceType").unwrap_or("t2.micro");
    let subnet_id = params.scalar("SubnetId");

    let mut subnets = ctx.store.subnets.lock();
    let mut images = ctx.store.images.lock();
    let mut instances = ctx.store.instances.lock();

    images.get(image_id)?;
    let (vpc_id, availability_zone) = match subnet_id {
        Some(id) => {
            let subnet = subnets.get(id)?;
            (Some(subnet.vpc_id.clone()), subnet.availability_zone.clone())
        }
        None => (
            None,
            params
                .scalar("Placement.AvailabilityZone")
                .map(str::to_string)
                .unwrap_or_else(|| ctx.default_availability_zone()),
        ),
    };

    let launch_time = now();
    let tags = requested_tags(params, ResourceKind::Instance)?;
    let mut launched = Vec::new();
    for _ in 0..max_count {
        let instance = Instance {
            instance_id: generate_id(ResourceKind::Instance),
            image_id: image_id.to_string(),
            instance_type: instance_type.to_string(),
            state: InstanceState::Running,
            subnet_id: subnet_id.map(str::to_string),
            vpc_id: vpc_id.clone(),
            availability_zone: availability_zone.clone(),
            launch_time: launch_time.clone(),
            tags: tags.clone(),
        };
        images.link_child(image_id, Image::INSTANCES, &instance.instance_id)?;
        if let Some(subnet_id) = subnet_id {
            subnets.link_child(subnet_id, Subnet::INSTANCES, &instance.instance_id)?;
        }
        instances.put(instance.clone());
        launched.push(instance);
    }
    tracing::info!("launched {} instance(s) of {}", launched.len(), image_id);

    let mut payload = Payload::new();
    payload.insert("reservationId".to_string(), Value::String(random_id("r")));
    payload.insert("ownerId".to_string(), Value::String(ctx.account_id.clone()));
    payload.insert("instancesSet".to_string(), to_value(&launched)?);
    Ok(payload)
}

pub fn describe_instances(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let ids = params.indexed_list("InstanceId");
    let records = ctx.store.instances.lock().select(&ids)?;
    describe("instance", records, params, !ids.is_empty())
}

fn instance_ids(params: &RawParams) -> Result<Vec<String>, ApiError> {
    let ids = params.indexed_list("InstanceId");
    if ids.is_empty() {
        return Err(ApiError::missing_parameter("InstanceId.1"));
    }
    Ok(ids)
}

fn state_json(state: InstanceState) -> Value {
    json!({ "code": state.code(), "name": state.as_str() })
}

fn state_changes(changes: &[(String, InstanceState, InstanceState)]) -> Payload {
    let items: Vec<Value> = changes
        .iter()
        .map(|(id, previous, current)| {
            json!({
                "instanceId": id,
                "previousState": state_json(*previous),
                "currentState": state_json(*current),
            })
        })
        .collect();
    let mut payload = Payload::new();
    payload.insert("instancesSet".to_string(), Value::Array(items));
    payload
}

/// Check every instance can move before changing any of them
fn transition(
    ctx: &Context,
    params: &RawParams,
    step: fn(InstanceState) -> Option<InstanceState>,
    verb: &str,
) -> Result<Payload, ApiError> {
    let ids = instance_ids(params)?;
    let mut instances = ctx.store.instances.lock();

    let mut changes = Vec::with_capacity(ids.len());
    for id in &ids {
        let previous = instances.get(id)?.state;
        let current = step(previous)
            .ok_or_else(|| ApiError::incorrect_state(ResourceKind::Instance, id, verb))?;
        changes.push((id.clone(), previous, current));
    }
    for (id, _, current) in &changes {
        instances.get_mut(id)?.state = *current;
    }
    Ok(state_changes(&changes))
}

pub fn stop_instances(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    transition(ctx, params, InstanceState::stop, "stopped")
}

pub fn start_instances(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    transition(ctx, params, InstanceState::start, "started")
}

pub fn terminate_instances(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let ids = instance_ids(params)?;

    let mut subnets = ctx.store.subnets.lock();
    let mut images = ctx.store.images.lock();
    let mut instances = ctx.store.instances.lock();

    for id in &ids {
        instances.get(id)?;
    }

    let mut changes = Vec::with_capacity(ids.len());
    for id in &ids {
        let instance = instances.get_mut(id)?;
        let previous = instance.state;
        instance.state = previous.terminate();
        images.unlink_child(&instance.image_id, Image::INSTANCES, id);
        if let Some(subnet_id) = &instance.subnet_id {
            subnets.unlink_child(subnet_id, Subnet::INSTANCES, id);
        }
        changes.push((id.clone(), previous, instance.state));
    }
    tracing::info!("terminated {} instance(s)", changes.len());
    Ok(state_changes(&changes))
}

/// Instance joined with its image, as a loosely-typed map
fn image_metadata(instance: &Instance, image: Option<&Image>) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert("instanceId".into(), json!(instance.instance_id));
    row.insert("instanceType".into(), json!(instance.instance_type));
    row.insert("state".into(), json!(instance.state.as_str()));
    row.insert("launchTime".into(), json!(instance.launch_time));
    row.insert("availabilityZone".into(), json!(instance.availability_zone));
    row.insert("imageId".into(), json!(instance.image_id));
    if let Some(image) = image {
        row.insert("imageName".into(), json!(image.name));
        row.insert("imageOwnerId".into(), json!(image.owner_id));
        row.insert("imageState".into(), json!(image.state));
        row.insert("creationDate".into(), json!(image.creation_date));
    }
    row.insert(
        "tagSet".into(),
        serde_json::to_value(&instance.tags).unwrap_or_else(|_| Value::Array(Vec::new())),
    );
    row
}

pub fn describe_instance_image_metadata(
    ctx: &Context,
    params: &RawParams,
) -> Result<Payload, ApiError> {
    let ids = params.indexed_list("InstanceId");

    let images = ctx.store.images.lock();
    let instances = ctx.store.instances.lock();

    let rows: Vec<Map<String, Value>> = instances
        .select(&ids)?
        .iter()
        .map(|instance| image_metadata(instance, images.get(&instance.image_id).ok()))
        .collect();
    describe("instance-image-metadata", rows, params, !ids.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> RawParams {
        RawParams::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_register_image_rejects_duplicate_name() {
        let ctx = Context::default();
        register_image(&ctx, &params(&[("Name", "golden")])).unwrap();
        let err = register_image(&ctx, &params(&[("Name", "golden")])).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParameterValue);
    }

    #[test]
    fn test_register_image_links_snapshot() {
        let ctx = Context::default();
        let snap = create_snapshot(&ctx, &params(&[("VolumeId", "vol-1")])).unwrap();
        let snap_id = snap["snapshotId"].as_str().unwrap().to_string();

        let image = register_image(
            &ctx,
            &params(&[
                ("Name", "golden"),
                ("BlockDeviceMapping.1.Ebs.SnapshotId", snap_id.as_str()),
            ]),
        )
        .unwrap();
        let image_id = image["imageId"].as_str().unwrap().to_string();

        let err = delete_snapshot(&ctx, &params(&[("SnapshotId", snap_id.as_str())])).unwrap_err();
        assert_eq!(err.code, ErrorCode::DependencyViolation);

        deregister_image(&ctx, &params(&[("ImageId", image_id.as_str())])).unwrap();
        delete_snapshot(&ctx, &params(&[("SnapshotId", snap_id.as_str())])).unwrap();
    }

    #[test]
    fn test_run_instances_requires_known_image() {
        let ctx = Context::default();
        let err = run_instances(&ctx, &params(&[("ImageId", "ami-00000000000000000")])).unwrap_err();
        assert_eq!(err.code.as_str(), "InvalidAMIID.NotFound");
        assert!(ctx.store.instances.lock().is_empty());
    }

    #[test]
    fn test_stop_is_all_or_nothing() {
        let ctx = Context::default();
        let image = register_image(&ctx, &params(&[("Name", "golden")])).unwrap();
        let image_id = image["imageId"].as_str().unwrap().to_string();
        let run = run_instances(
            &ctx,
            &params(&[("ImageId", image_id.as_str()), ("MinCount", "2"), ("MaxCount", "2")]),
        )
        .unwrap();
        let ids: Vec<String> = run["instancesSet"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["instanceId"].as_str().unwrap().to_string())
            .collect();

        stop_instances(&ctx, &params(&[("InstanceId.1", ids[0].as_str())])).unwrap();
        let err = stop_instances(
            &ctx,
            &params(&[("InstanceId.1", ids[1].as_str()), ("InstanceId.2", ids[0].as_str())]),
        )
        .unwrap_err();
        assert_eq!(err.code.as_str(), "IncorrectState");
        assert!(err.message.ends_with("can be stopped."));
        assert_eq!(
            ctx.store.instances.lock().get(&ids[1]).unwrap().state,
            InstanceState::Running
        );
    }

    #[test]
    fn test_state_change_payload() {
        let ctx = Context::default();
        let image = register_image(&ctx, &params(&[("Name", "golden")])).unwrap();
        let image_id = image["imageId"].as_str().unwrap().to_string();
        let run = run_instances(&ctx, &params(&[("ImageId", image_id.as_str())])).unwrap();
        let id = run["instancesSet"][0]["instanceId"].as_str().unwrap().to_string();

        let stopped = stop_instances(&ctx, &params(&[("InstanceId.1", id.as_str())])).unwrap();
        let change = &stopped["instancesSet"][0];
        assert_eq!(change["previousState"]["name"], "running");
        assert_eq!(change["currentState"]["code"], 80);
    }

    #[test]
    fn test_state_changes_require_ids() {
        let ctx = Context::default();
        let err = terminate_instances(&ctx, &RawParams::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingParameter);
    }
}
