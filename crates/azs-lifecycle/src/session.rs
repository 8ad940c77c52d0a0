//! Names generated for a single provisioning run.

use azs_core::naming::random_resource_name;
use azs_core::types::{ResourceGroupSpec, Tags};
use serde::Serialize;

/// Prefix of both generated resource group names.
pub const RESOURCE_GROUP_PREFIX: &str = "rgRSMA";

/// Prefix of the generated tag key.
pub const TAG_NAME_PREFIX: &str = "rgRSTN";

/// Prefix of the generated tag value.
pub const TAG_VALUE_PREFIX: &str = "rgRSTV";

/// Length of every generated name.
pub const GENERATED_NAME_LENGTH: usize = 24;

/// The resource group names and tag pair owned by one orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningSession {
    /// Group created first and always targeted by cleanup
    pub primary_group: String,
    /// Group created after tagging and deleted on the success path only
    pub secondary_group: String,
    /// Tag key applied to the primary group
    pub tag_name: String,
    /// Tag value applied to the primary group
    pub tag_value: String,
}

impl ProvisioningSession {
    /// Generate fresh random names.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            primary_group: random_resource_name(RESOURCE_GROUP_PREFIX, GENERATED_NAME_LENGTH),
            secondary_group: random_resource_name(RESOURCE_GROUP_PREFIX, GENERATED_NAME_LENGTH),
            tag_name: random_resource_name(TAG_NAME_PREFIX, GENERATED_NAME_LENGTH),
            tag_value: random_resource_name(TAG_VALUE_PREFIX, GENERATED_NAME_LENGTH),
        }
    }

    /// Use caller-chosen names.
    #[must_use]
    pub fn new(
        primary_group: impl Into<String>,
        secondary_group: impl Into<String>,
        tag_name: impl Into<String>,
        tag_value: impl Into<String>,
    ) -> Self {
        Self {
            primary_group: primary_group.into(),
            secondary_group: secondary_group.into(),
            tag_name: tag_name.into(),
            tag_value: tag_value.into(),
        }
    }

    pub(crate) fn primary_spec(&self, location: &str) -> ResourceGroupSpec {
        ResourceGroupSpec::new(&self.primary_group, location)
    }

    pub(crate) fn secondary_spec(&self, location: &str) -> ResourceGroupSpec {
        ResourceGroupSpec::new(&self.secondary_group, location)
    }

    /// The single tag applied to the primary group.
    #[must_use]
    pub fn tags(&self) -> Tags {
        let mut tags = Tags::new();
        tags.insert(self.tag_name.clone(), self.tag_value.clone());
        tags
    }
}
