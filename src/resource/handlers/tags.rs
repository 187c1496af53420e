//! Tag handlers, addressing records of any kind by id prefix

use super::{describe, return_true};
use crate::context::Context;
use crate::outcome::{ApiError, Payload};
use crate::params::{parse_tags, RawParams};
use serde_json::{json, Map, Value};

fn resource_ids(params: &RawParams) -> Result<Vec<String>, ApiError> {
    let ids = params.indexed_list("ResourceId");
    if ids.is_empty() {
        return Err(ApiError::missing_parameter("ResourceId.1"));
    }
    Ok(ids)
}

pub fn create_tags(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let ids = resource_ids(params)?;
    let tags = parse_tags(params, "Tag");
    if tags.is_empty() {
        return Err(ApiError::missing_parameter("Tag.1.Key"));
    }

    let mut store = ctx.store.lock_all();
    for id in &ids {
        store.ensure_exists(id)?;
    }
    for id in &ids {
        let existing = store.tags_mut(id)?;
        for tag in &tags {
            match existing.iter_mut().find(|t| t.key == tag.key) {
                Some(current) => current.value = tag.value.clone(),
                None => existing.push(tag.clone()),
            }
        }
    }
    tracing::info!("tagged {} resource(s) with {} tag(s)", ids.len(), tags.len());
    Ok(return_true())
}

/// `(key, value)` pairs to remove; a `None` value removes the key whatever
/// its value
fn removals(params: &RawParams) -> Vec<(String, Option<String>)> {
    params
        .indexed_groups("Tag")
        .iter()
        .filter_map(|group| {
            let key = group.scalar("Key")?;
            Some((key.to_string(), group.scalar("Value").map(str::to_string)))
        })
        .collect()
}

pub fn delete_tags(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let ids = resource_ids(params)?;
    let removals = removals(params);

    let mut store = ctx.store.lock_all();
    for id in &ids {
        store.ensure_exists(id)?;
    }
    for id in &ids {
        let tags = store.tags_mut(id)?;
        if removals.is_empty() {
            tags.clear();
            continue;
        }
        tags.retain(|tag| {
            !removals.iter().any(|(key, value)| {
                *key == tag.key && value.as_ref().map_or(true, |v| *v == tag.value)
            })
        });
    }
    Ok(return_true())
}

pub fn describe_tags(ctx: &Context, params: &RawParams) -> Result<Payload, ApiError> {
    let rows: Vec<Map<String, Value>> = ctx
        .store
        .lock_all()
        .tagged()
        .into_iter()
        .flat_map(|(id, kind, tags)| {
            tags.into_iter().map(move |tag| {
                let mut row = Map::new();
                row.insert("resourceId".into(), json!(id));
                row.insert("resourceType".into(), json!(kind.tag_resource_type()));
                row.insert("key".into(), json!(tag.key));
                row.insert("value".into(), json!(tag.value));
                row
            })
        })
        .collect();
    describe("tag", rows, params, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::handlers::network::create_vpc;

    fn params(pairs: &[(&str, &str)]) -> RawParams {
        RawParams::from_pairs(pairs.iter().copied())
    }

    fn vpc(ctx: &Context) -> String {
        let created = create_vpc(ctx, &params(&[("CidrBlock", "10.0.0.0/16")])).unwrap();
        created["vpc"]["vpcId"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_create_tags_upserts_by_key() {
        let ctx = Context::default();
        let id = vpc(&ctx);
        for value in ["a", "b"] {
            create_tags(
                &ctx,
                &params(&[
                    ("ResourceId.1", id.as_str()),
                    ("Tag.1.Key", "Name"),
                    ("Tag.1.Value", value),
                ]),
            )
            .unwrap();
        }
        let tags = ctx.store.vpcs.lock().get(&id).unwrap().tags.clone();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].value, "b");
    }

    #[test]
    fn test_create_tags_checks_every_id_first() {
        let ctx = Context::default();
        let id = vpc(&ctx);
        let err = create_tags(
            &ctx,
            &params(&[
                ("ResourceId.1", id.as_str()),
                ("ResourceId.2", "vpc-00000000000000000"),
                ("Tag.1.Key", "Name"),
            ]),
        )
        .unwrap_err();
        assert_eq!(err.code.as_str(), "InvalidVpcID.NotFound");
        assert!(ctx.store.vpcs.lock().get(&id).unwrap().tags.is_empty());
    }

    #[test]
    fn test_delete_tags_value_must_match() {
        let ctx = Context::default();
        let id = vpc(&ctx);
        create_tags(
            &ctx,
            &params(&[
                ("ResourceId.1", id.as_str()),
                ("Tag.1.Key", "env"),
                ("Tag.1.Value", "prod"),
                ("Tag.2.Key", "team"),
                ("Tag.2.Value", "core"),
            ]),
        )
        .unwrap();

        delete_tags(
            &ctx,
            &params(&[
                ("ResourceId.1", id.as_str()),
                ("Tag.1.Key", "env"),
                ("Tag.1.Value", "dev"),
            ]),
        )
        .unwrap();
        assert_eq!(ctx.store.vpcs.lock().get(&id).unwrap().tags.len(), 2);

        delete_tags(&ctx, &params(&[("ResourceId.1", id.as_str()), ("Tag.1.Key", "env")])).unwrap();
        assert_eq!(ctx.store.vpcs.lock().get(&id).unwrap().tags.len(), 1);

        delete_tags(&ctx, &params(&[("ResourceId.1", id.as_str())])).unwrap();
        assert!(ctx.store.vpcs.lock().get(&id).unwrap().tags.is_empty());
    }

    #[test]
    fn test_describe_tags_filters_projection() {
        let ctx = Context::default();
        let id = vpc(&ctx);
        create_tags(
            &ctx,
            &params(&[
                ("ResourceId.1", id.as_str()),
                ("Tag.1.Key", "env"),
                ("Tag.1.Value", "prod"),
            ]),
        )
        .unwrap();

        let listed = describe_tags(
            &ctx,
            &params(&[("Filter.1.Name", "resource-type"), ("Filter.1.Value.1", "vpc")]),
        )
        .unwrap();
        let rows = listed["tagSet"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["resourceId"], id.as_str());
        assert_eq!(rows[0]["key"], "env");
    }

    #[test]
    fn test_unknown_prefix_is_invalid_value() {
        let ctx = Context::default();
        let err = create_tags(
            &ctx,
            &params(&[("ResourceId.1", "eni-1234"), ("Tag.1.Key", "k")]),
        )
        .unwrap_err();
        assert_eq!(err.code.as_str(), "InvalidParameterValue");
    }
}
