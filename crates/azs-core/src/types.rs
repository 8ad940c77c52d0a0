//! Core domain types.
//!
//! This module provides the discovered endpoint set of an Azure Stack deployment and the
//! resource group shapes exchanged with the resource manager.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::DiscoveryError;

/// Prefix prepended to the storage suffix to form the Key Vault DNS suffix.
pub const KEY_VAULT_DNS_PREFIX: &str = ".adminvault";

/// Resource tags, ordered by key for stable request bodies.
pub type Tags = BTreeMap<String, String>;

/// Returns the part of `seed_url` starting at its first `.` character.
///
/// `https://management.local.azurestack.external` yields `.local.azurestack.external`.
/// The rest of the URL (port, path) is kept as-is.
#[must_use]
pub fn dns_suffix_of(seed_url: &str) -> Option<&str> {
    seed_url.find('.').map(|index| &seed_url[index..])
}

/// Service endpoints of an Azure Stack deployment, resolved from its management URL.
///
/// Every field is non-empty. The set can only be obtained through [`EndpointSet::derive`],
/// so a partially populated set never exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSet {
    management_url: String,
    resource_manager_url: String,
    gallery_url: String,
    active_directory_url: String,
    active_directory_resource_id: String,
    active_directory_graph_resource_id: String,
    storage_endpoint_suffix: String,
    key_vault_dns_suffix: String,
}

impl EndpointSet {
    /// Build the endpoint set from the seed URL and the advertised metadata values.
    ///
    /// The audience doubles as the management URL and the Active Directory resource id.
    /// The storage suffix is the seed URL from its first `.`, and the Key Vault suffix is
    /// [`KEY_VAULT_DNS_PREFIX`] followed by the storage suffix.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::InvalidSeedUrl`] if the seed URL has no `.`, and
    /// [`DiscoveryError::Parse`] if any advertised value is empty.
    pub fn derive(
        seed_url: &str,
        gallery_endpoint: &str,
        login_endpoint: &str,
        audience: &str,
        graph_endpoint: &str,
    ) -> Result<Self, DiscoveryError> {
        let storage_suffix = dns_suffix_of(seed_url)
            .ok_or_else(|| DiscoveryError::InvalidSeedUrl(seed_url.to_string()))?;

        for (field, value) in [
            ("galleryEndpoint", gallery_endpoint),
            ("authentication.loginEndpoint", login_endpoint),
            ("authentication.audiences[0]", audience),
            ("graphEndpoint", graph_endpoint),
        ] {
            if value.trim().is_empty() {
                return Err(DiscoveryError::Parse(format!("`{field}` is empty")));
            }
        }

        Ok(Self {
            management_url: audience.to_string(),
            resource_manager_url: seed_url.to_string(),
            gallery_url: gallery_endpoint.to_string(),
            active_directory_url: login_endpoint.to_string(),
            active_directory_resource_id: audience.to_string(),
            active_directory_graph_resource_id: graph_endpoint.to_string(),
            storage_endpoint_suffix: storage_suffix.to_string(),
            key_vault_dns_suffix: format!("{KEY_VAULT_DNS_PREFIX}{storage_suffix}"),
        })
    }

    /// Management endpoint (the token audience).
    #[must_use]
    pub fn management_url(&self) -> &str {
        &self.management_url
    }

    /// Resource manager base URL (the seed URL).
    #[must_use]
    pub fn resource_manager_url(&self) -> &str {
        &self.resource_manager_url
    }

    /// Gallery endpoint.
    #[must_use]
    pub fn gallery_url(&self) -> &str {
        &self.gallery_url
    }

    /// Active Directory login endpoint.
    #[must_use]
    pub fn active_directory_url(&self) -> &str {
        &self.active_directory_url
    }

    /// Resource id tokens are requested for.
    #[must_use]
    pub fn active_directory_resource_id(&self) -> &str {
        &self.active_directory_resource_id
    }

    /// Graph endpoint.
    #[must_use]
    pub fn active_directory_graph_resource_id(&self) -> &str {
        &self.active_directory_graph_resource_id
    }

    /// Storage endpoint DNS suffix.
    #[must_use]
    pub fn storage_endpoint_suffix(&self) -> &str {
        &self.storage_endpoint_suffix
    }

    /// Key Vault DNS suffix.
    #[must_use]
    pub fn key_vault_dns_suffix(&self) -> &str {
        &self.key_vault_dns_suffix
    }
}

/// Desired state of a resource group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroupSpec {
    /// Resource group name, unique per subscription
    pub name: String,
    /// Region the group is placed in
    pub location: String,
    /// Tags applied to the group
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: Tags,
}

impl ResourceGroupSpec {
    /// Create an untagged resource group spec.
    #[must_use]
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            tags: Tags::new(),
        }
    }

    /// Add a tag.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// A resource group as reported by the resource manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    /// Fully qualified resource id
    #[serde(default)]
    pub id: String,
    /// Resource group name
    pub name: String,
    /// Region
    #[serde(default)]
    pub location: String,
    /// Tags
    #[serde(default)]
    pub tags: Tags,
    /// Provisioning state reported in `properties.provisioningState`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}
