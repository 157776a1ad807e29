//! Resource Manager converters
//!
//! A `google_project` is described by two assets: the project itself and its
//! billing info. Both are merged into one block per project.

use super::mapping::resource_label;
use crate::asset::{Asset, AttributeTree};
use crate::convert::{
    build_typed_value, parse_field_value, Converter, ConverterFactory, ResourceBlock,
};
use crate::error::{ConvertError, Result};
use crate::resource::ResourceSchema;
use std::collections::BTreeMap;

pub const PROJECT_ASSET_TYPE: &str = "cloudresourcemanager.googleapis.com/Project";
pub const PROJECT_BILLING_ASSET_TYPE: &str = "cloudbilling.googleapis.com/ProjectBillingInfo";

pub const FACTORIES: &[(&str, ConverterFactory)] = &[("google_project", new_project_converter)];

fn new_project_converter(name: &str, schema: ResourceSchema) -> Box<dyn Converter> {
    Box::new(ProjectConverter {
        name: name.to_string(),
        schema,
    })
}

pub struct ProjectConverter {
    name: String,
    schema: ResourceSchema,
}

#[derive(Default)]
struct ProjectFields {
    seen_project: bool,
    fields: BTreeMap<String, AttributeTree>,
}

impl ProjectConverter {
    fn merge_project(
        &self,
        asset: &Asset,
        data: &AttributeTree,
        projects: &mut BTreeMap<String, ProjectFields>,
    ) -> Result<()> {
        let Some(project_id) = data.get("projectId").and_then(|v| v.as_str()) else {
            return Err(ConvertError::converter_failure(
                &self.name,
                format!("project asset {} has no projectId", asset.name),
            ));
        };

        let entry = projects.entry(project_id.to_string()).or_default();
        entry.seen_project = true;
        entry
            .fields
            .insert("project_id".to_string(), AttributeTree::from(project_id));
        for key in ["name", "labels"] {
            if let Some(value) = data.get(key) {
                entry.fields.insert(key.to_string(), value.clone());
            }
        }
        if let Some((field, id)) = data.get("parent").and_then(parse_parent) {
            entry.fields.insert(field.to_string(), AttributeTree::String(id));
        }
        Ok(())
    }

    fn merge_billing(
        &self,
        asset: &Asset,
        data: &AttributeTree,
        projects: &mut BTreeMap<String, ProjectFields>,
    ) -> Result<()> {
        let project_id = data
            .get("projectId")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| parse_field_value(&asset.name, "projects"));
        if project_id.is_empty() {
            return Err(ConvertError::converter_failure(
                &self.name,
                format!("billing asset {} names no project", asset.name),
            ));
        }

        let account = data
            .get("billingAccountName")
            .and_then(|v| v.as_str())
            .map(|name| name.trim_start_matches("billingAccounts/"))
            .unwrap_or_default();
        let entry = projects.entry(project_id).or_default();
        if !account.is_empty() {
            entry
                .fields
                .insert("billing_account".to_string(), AttributeTree::from(account));
        }
        Ok(())
    }
}

impl Converter for ProjectConverter {
    fn convert(&self, assets: &[&Asset]) -> Result<Vec<ResourceBlock>> {
        let mut projects: BTreeMap<String, ProjectFields> = BTreeMap::new();

        for asset in assets {
            let Some(data) = asset.data().filter(|data| !data.is_null()) else {
                tracing::debug!("{} carries no resource data, skipping", asset.name);
                continue;
            };
            match asset.asset_type.as_str() {
                PROJECT_ASSET_TYPE => self.merge_project(asset, data, &mut projects)?,
                PROJECT_BILLING_ASSET_TYPE => self.merge_billing(asset, data, &mut projects)?,
                other => {
                    return Err(ConvertError::converter_failure(
                        &self.name,
                        format!("unexpected asset type {}", other),
                    ))
                }
            }
        }

        let mut blocks = Vec::new();
        for (project_id, project) in projects {
            if !project.seen_project {
                tracing::debug!("Billing info for {} without project asset, skipping", project_id);
                continue;
            }
            let value = build_typed_value(&AttributeTree::Map(project.fields), &self.schema)?;
            blocks.push(ResourceBlock::new(
                vec![self.name.clone(), resource_label(&project_id)],
                value,
            )?);
        }
        Ok(blocks)
    }
}

/// `{"type": "folder", "id": "123"}` or `"folders/123"` -> `("folder_id", "123")`
fn parse_parent(parent: &AttributeTree) -> Option<(&'static str, String)> {
    let (kind, id) = match parent {
        AttributeTree::Map(_) => (
            parent.get("type")?.as_str()?.to_string(),
            parent.get("id")?.as_str()?.to_string(),
        ),
        AttributeTree::String(s) => {
            let (kind, id) = s.split_once('/')?;
            (kind.trim_end_matches('s').to_string(), id.to_string())
        }
        _ => return None,
    };
    match kind.as_str() {
        "organization" => Some(("org_id", id)),
        "folder" => Some(("folder_id", id)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{get_registry, SchemaProvider};
    use serde_json::json;

    fn converter() -> Box<dyn Converter> {
        let schema = get_registry().resource_schema("google_project").unwrap();
        new_project_converter("google_project", schema)
    }

    fn project_asset(id: &str, parent: serde_json::Value) -> Asset {
        Asset::new(
            "//cloudresourcemanager.googleapis.com/projects/1234",
            PROJECT_ASSET_TYPE,
            AttributeTree::from(json!({
                "projectId": id,
                "name": format!("Project {}", id),
                "projectNumber": "1234",
                "lifecycleState": "ACTIVE",
                "parent": parent,
                "labels": {"env": "dev"}
            })),
        )
    }

    fn billing_asset(id: &str, account: &str) -> Asset {
        Asset::new(
            &format!("//cloudbilling.googleapis.com/projects/{}/billingInfo", id),
            PROJECT_BILLING_ASSET_TYPE,
            AttributeTree::from(json!({
                "name": format!("projects/{}/billingInfo", id),
                "billingAccountName": account,
                "billingEnabled": true
            })),
        )
    }

    #[test]
    fn test_project_and_billing_merge_into_one_block() {
        let project = project_asset("demo", json!({"type": "organization", "id": "42"}));
        let billing = billing_asset("demo", "billingAccounts/000-AAA");

        let blocks = converter().convert(&[&billing, &project]).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].labels(), vec!["google_project", "demo"]);
        let json = blocks[0].value().to_json();
        assert_eq!(json["project_id"], json!("demo"));
        assert_eq!(json["org_id"], json!("42"));
        assert_eq!(json["billing_account"], json!("000-AAA"));
        assert_eq!(json["labels"], json!({"env": "dev"}));
        assert!(json["folder_id"].is_null());
    }

    #[test]
    fn test_string_parent_and_multiple_projects() {
        let a = project_asset("alpha", json!("folders/7"));
        let b = project_asset("beta", json!({"type": "organization", "id": "1"}));
        let blocks = converter().convert(&[&b, &a]).unwrap();
        let ids: Vec<&str> = blocks.iter().map(|b| b.labels()[1].as_str()).collect();
        assert_eq!(ids, vec!["alpha", "beta"]);
        assert_eq!(blocks[0].value().to_json()["folder_id"], json!("7"));
    }

    #[test]
    fn test_billing_without_project_is_skipped() {
        let billing = billing_asset("orphan", "billingAccounts/1");
        assert!(converter().convert(&[&billing]).unwrap().is_empty());
    }

    #[test]
    fn test_unexpected_asset_type_fails() {
        let asset = Asset::new(
            "//x/y",
            "compute.googleapis.com/Instance",
            AttributeTree::from(json!({"name": "vm"})),
        );
        assert!(matches!(
            converter().convert(&[&asset]),
            Err(ConvertError::ConverterFailure { .. })
        ));
    }

    #[test]
    fn test_iam_only_record_is_skipped() {
        let project = project_asset("demo", json!("folders/7"));
        let iam_only = Asset {
            resource: None,
            iam_policy: Some(json!({"bindings": [{"role": "roles/owner", "members": ["user:a@example.com"]}]})),
            ..project_asset("demo", json!(null))
        };
        let blocks = converter().convert(&[&iam_only, &project]).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].value().to_json()["folder_id"], json!("7"));
    }
}
