//! Resource manager wire models for resource groups.

use azs_core::types::{ResourceGroup, Tags};
use serde::{Deserialize, Serialize};

/// Body of `PUT /subscriptions/{sub}/resourcegroups/{name}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateResourceGroupRequest {
    /// Region of the group.
    pub location: String,
    /// Initial tags.
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

/// Body of `PATCH /subscriptions/{sub}/resourcegroups/{name}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateResourceGroupRequest {
    /// Tags replacing the current set.
    pub tags: Tags,
}

/// Resource group as serialized by the resource manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupResource {
    /// Fully qualified resource id.
    #[serde(default)]
    pub id: String,
    /// Group name.
    pub name: String,
    /// Region.
    #[serde(default)]
    pub location: String,
    /// Tags; the service omits or nulls the field for untagged groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
    /// Resource properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<ResourceGroupProperties>,
    /// Id of the resource managing this group, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_by: Option<String>,
}

/// `properties` of a resource group.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroupProperties {
    /// Provisioning state (`Succeeded`, `Deleting`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

impl From<ResourceGroupResource> for ResourceGroup {
    fn from(resource: ResourceGroupResource) -> Self {
        Self {
            id: resource.id,
            name: resource.name,
            location: resource.location,
            tags: resource.tags.unwrap_or_default(),
            provisioning_state: resource.properties.and_then(|p| p.provisioning_state),
        }
    }
}

/// One page of `GET /subscriptions/{sub}/resourcegroups`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceGroupListResult {
    /// Groups on this page.
    #[serde(default)]
    pub value: Vec<ResourceGroupResource>,
    /// Absolute URL of the next page.
    #[serde(rename = "nextLink", default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_resource_to_domain_group() {
        let resource: ResourceGroupResource = serde_json::from_value(json!({
            "id": "/subscriptions/sub-1/resourceGroups/rgRSMA0001",
            "name": "rgRSMA0001",
            "location": "local",
            "tags": { "rgRSTN01": "rgRSTV01" },
            "properties": { "provisioningState": "Succeeded" }
        }))
        .unwrap();

        let group = ResourceGroup::from(resource);
        assert_eq!(group.name, "rgRSMA0001");
        assert_eq!(group.provisioning_state.as_deref(), Some("Succeeded"));
        assert_eq!(group.tags.get("rgRSTN01").map(String::as_str), Some("rgRSTV01"));
    }

    #[test]
    fn null_tags_become_empty() {
        let resource: ResourceGroupResource = serde_json::from_value(json!({
            "name": "rg",
            "tags": null
        }))
        .unwrap();

        let group = ResourceGroup::from(resource);
        assert!(group.tags.is_empty());
        assert!(group.provisioning_state.is_none());
    }

    #[test]
    fn create_request_omits_empty_tags() {
        let request = CreateResourceGroupRequest {
            location: "local".into(),
            tags: Tags::new(),
        };
        assert_eq!(serde_json::to_value(&request).unwrap(), json!({ "location": "local" }));
    }

    #[test]
    fn list_result_reads_next_link() {
        let page: ResourceGroupListResult = serde_json::from_value(json!({
            "value": [{ "name": "a" }],
            "nextLink": "https://management.azs.local/next"
        }))
        .unwrap();
        assert_eq!(page.value.len(), 1);
        assert_eq!(page.next_link.as_deref(), Some("https://management.azs.local/next"));
    }
}
