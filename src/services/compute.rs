//! Compute Engine converters

use super::mapping::MappedConverter;
use crate::asset::AttributeTree;
use crate::convert::{Converter, ConverterFactory};
use crate::resource::ResourceSchema;
use std::collections::BTreeMap;

pub const COMPUTE_INSTANCE_ASSET_TYPE: &str = "compute.googleapis.com/Instance";
pub const COMPUTE_FORWARDING_RULE_ASSET_TYPE: &str = "compute.googleapis.com/ForwardingRule";
pub const COMPUTE_GLOBAL_FORWARDING_RULE_ASSET_TYPE: &str =
    "compute.googleapis.com/GlobalForwardingRule";
/// Shared by global and regional backend services; told apart by name pattern
pub const COMPUTE_BACKEND_SERVICE_ASSET_TYPE: &str = "compute.googleapis.com/BackendService";
pub const COMPUTE_HEALTH_CHECK_ASSET_TYPE: &str = "compute.googleapis.com/HealthCheck";

pub const FACTORIES: &[(&str, ConverterFactory)] = &[
    ("google_compute_instance", new_compute_instance_converter),
    ("google_compute_forwarding_rule", new_mapped_converter),
    ("google_compute_global_forwarding_rule", new_mapped_converter),
    ("google_compute_backend_service", new_backend_service_converter),
    ("google_compute_region_backend_service", new_backend_service_converter),
    ("google_compute_health_check", new_mapped_converter),
];

const INSTANCE_RENAMES: &[(&str, &str)] = &[
    ("network_interfaces", "network_interface"),
    ("access_configs", "access_config"),
    ("service_accounts", "service_account"),
];

const BACKEND_SERVICE_RENAMES: &[(&str, &str)] = &[("backends", "backend")];

fn new_mapped_converter(name: &str, schema: ResourceSchema) -> Box<dyn Converter> {
    Box::new(MappedConverter::new(name, schema))
}

fn new_compute_instance_converter(name: &str, schema: ResourceSchema) -> Box<dyn Converter> {
    Box::new(
        MappedConverter::new(name, schema)
            .with_renames(INSTANCE_RENAMES)
            .with_preprocess(flatten_instance),
    )
}

fn new_backend_service_converter(name: &str, schema: ResourceSchema) -> Box<dyn Converter> {
    Box::new(MappedConverter::new(name, schema).with_renames(BACKEND_SERVICE_RENAMES))
}

/// The API wraps instance tags as `{"items": [...], "fingerprint": ...}` and
/// reports the machine type, zone and network as URLs.
fn flatten_instance(raw: &mut BTreeMap<String, AttributeTree>) {
    if let Some(items) = raw
        .get("tags")
        .and_then(|tags| tags.get("items"))
        .cloned()
    {
        raw.insert("tags".to_string(), items);
    } else {
        raw.remove("tags");
    }

    for key in ["machineType", "zone"] {
        if let Some(short) = raw.get(key).and_then(|v| v.as_str()).map(short_name) {
            raw.insert(key.to_string(), AttributeTree::String(short));
        }
    }
}

/// Extract short name from GCP resource URL
/// e.g., "https://www.googleapis.com/compute/v1/projects/my-project/zones/us-central1-a" -> "us-central1-a"
fn short_name(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use crate::resource::{get_registry, SchemaProvider};
    use serde_json::json;

    fn converter(name: &str) -> Box<dyn Converter> {
        let schema = get_registry().resource_schema(name).expect("schema");
        let (_, factory) = FACTORIES.iter().find(|(n, _)| *n == name).expect("factory");
        factory(name, schema)
    }

    #[test]
    fn test_instance_conversion() {
        let asset = Asset::new(
            "//compute.googleapis.com/projects/demo/zones/us-central1-a/instances/vm-1",
            COMPUTE_INSTANCE_ASSET_TYPE,
            AttributeTree::from(json!({
                "name": "vm-1",
                "machineType": "https://www.googleapis.com/compute/v1/projects/demo/zones/us-central1-a/machineTypes/e2-medium",
                "zone": "https://www.googleapis.com/compute/v1/projects/demo/zones/us-central1-a",
                "tags": {"items": ["web", "ssh"], "fingerprint": "abc"},
                "canIpForward": false,
                "networkInterfaces": [{
                    "network": "global/networks/default",
                    "networkIP": "10.128.0.2",
                    "accessConfigs": [{"natIP": "34.1.2.3", "type": "ONE_TO_ONE_NAT"}]
                }],
                "scheduling": {"automaticRestart": true, "onHostMaintenance": "MIGRATE"},
                "status": "RUNNING"
            })),
        );

        let blocks = converter("google_compute_instance").convert(&[&asset]).unwrap();
        let value = blocks[0].value();
        assert_eq!(value.get("machine_type").and_then(|v| v.as_str()), Some("e2-medium"));
        assert_eq!(value.get("zone").and_then(|v| v.as_str()), Some("us-central1-a"));
        assert_eq!(value.get("project").and_then(|v| v.as_str()), Some("demo"));
        assert_eq!(value.get("tags").unwrap().to_json(), json!(["ssh", "web"]));
        assert_eq!(
            value.get("network_interface").unwrap().to_json()[0]["access_config"][0]["nat_ip"],
            json!("34.1.2.3")
        );
        assert_eq!(
            value.get("scheduling").unwrap().to_json()[0]["on_host_maintenance"],
            json!("MIGRATE")
        );
    }

    #[test]
    fn test_health_check_conversion() {
        let asset = Asset::new(
            "//compute.googleapis.com/projects/demo/global/healthChecks/hc-http",
            COMPUTE_HEALTH_CHECK_ASSET_TYPE,
            AttributeTree::from(json!({
                "name": "hc-http",
                "type": "HTTP",
                "checkIntervalSec": 5,
                "timeoutSec": "5",
                "httpHealthCheck": {"port": 80, "requestPath": "/healthz", "proxyHeader": "NONE"}
            })),
        );

        let blocks = converter("google_compute_health_check").convert(&[&asset]).unwrap();
        let json = blocks[0].value().to_json();
        assert_eq!(json["timeout_sec"], json!(5));
        assert_eq!(json["http_health_check"][0]["request_path"], json!("/healthz"));
        assert_eq!(json["project"], json!("demo"));
        assert!(json["tcp_health_check"].is_null());
    }

    #[test]
    fn test_backend_service_backends_become_set() {
        let asset = Asset::new(
            "//compute.googleapis.com/projects/demo/regions/us-east1/backendServices/bes",
            COMPUTE_BACKEND_SERVICE_ASSET_TYPE,
            AttributeTree::from(json!({
                "name": "bes",
                "backends": [{"group": "ig-b"}, {"group": "ig-a"}],
                "healthChecks": ["hc-1"]
            })),
        );

        let blocks = converter("google_compute_region_backend_service")
            .convert(&[&asset])
            .unwrap();
        let json = blocks[0].value().to_json();
        assert_eq!(json["region"], json!("us-east1"));
        assert_eq!(json["backend"][0]["group"], json!("ig-a"));
        assert_eq!(json["health_checks"], json!(["hc-1"]));
    }
}
