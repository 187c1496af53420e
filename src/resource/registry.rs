//! Resource Registry - Load filter catalogs from JSON
//!
//! Each describable resource lists the filter names it accepts, the record
//! field an irregular filter name reads, and the key its listing is returned
//! under. The catalog is embedded at compile time.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[
    include_str!("../resources/network.json"),
    include_str!("../resources/compute.json"),
];

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub display_name: String,
    /// Payload key of the describe listing
    pub response_key: String,
    /// Accepted `Filter.N.Name` values
    #[serde(default)]
    pub filters: Vec<String>,
    /// Filter name -> record field, where normalization alone does not reach it
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub resources: HashMap<String, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = ResourceConfig {
            resources: HashMap::new(),
        };

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            final_config.resources.extend(partial.resources);
        }

        final_config
    })
}

/// Get a resource definition by key
pub fn get_resource(key: &str) -> Option<&'static ResourceDef> {
    get_registry().resources.get(key)
}

/// Payload key for a listing of `key`, falling back to `<key>Set`
pub fn response_key(key: &str) -> String {
    get_resource(key)
        .map(|def| def.response_key.clone())
        .unwrap_or_else(|| format!("{}Set", crate::filter::to_camel_case(key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ResourceKind;

    #[test]
    fn test_registry_loads_successfully() {
        let registry = get_registry();
        assert!(
            !registry.resources.is_empty(),
            "Registry should have resources"
        );
    }

    #[test]
    fn test_every_kind_has_a_definition() {
        for kind in ResourceKind::ALL {
            assert!(
                get_resource(kind.tag_resource_type()).is_some(),
                "missing registry entry for {}",
                kind
            );
        }
    }

    #[test]
    fn test_image_resource_exists() {
        let resource = get_resource("image").unwrap();
        assert_eq!(resource.display_name, "Images");
        assert_eq!(resource.response_key, "imagesSet");
        assert!(resource.filters.iter().any(|f| f == "image-id"));
    }

    #[test]
    fn test_aliases_name_declared_filters() {
        for (key, def) in &get_registry().resources {
            for alias in def.aliases.keys() {
                assert!(
                    def.filters.contains(alias),
                    "alias {} of {} is not a declared filter",
                    alias,
                    key
                );
            }
        }
    }

    #[test]
    fn test_response_key_fallback() {
        assert_eq!(response_key("tag"), "tagSet");
        assert_eq!(response_key("launch-template"), "launchTemplateSet");
    }
}
