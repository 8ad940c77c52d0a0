//! Wire models of the metadata endpoint document.

use serde::{Deserialize, Serialize};

/// Response of `GET {management}/metadata/endpoints?api-version=1.0`.
///
/// Only the fields endpoint discovery depends on are required; anything else the
/// deployment advertises is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetadataEndpoints {
    /// Marketplace gallery endpoint.
    pub gallery_endpoint: String,
    /// Graph endpoint.
    pub graph_endpoint: String,
    /// Identity provider settings.
    pub authentication: AuthenticationMetadata,
    /// Portal endpoint, when advertised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal_endpoint: Option<String>,
}

/// The `authentication` section of the metadata document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationMetadata {
    /// Login endpoint of the identity provider.
    pub login_endpoint: String,
    /// Token audiences accepted by the resource manager; the first one is used.
    pub audiences: Vec<String>,
}

impl AuthenticationMetadata {
    /// The audience tokens are requested for.
    #[must_use]
    pub fn primary_audience(&self) -> Option<&str> {
        self.audiences.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_minimal_document() {
        let metadata: MetadataEndpoints = serde_json::from_value(json!({
            "galleryEndpoint": "https://gallery.example.local",
            "graphEndpoint": "https://graph.example.local",
            "authentication": {
                "loginEndpoint": "https://login.example.local",
                "audiences": ["aud1", "aud2"]
            }
        }))
        .unwrap();

        assert_eq!(metadata.gallery_endpoint, "https://gallery.example.local");
        assert_eq!(metadata.authentication.primary_audience(), Some("aud1"));
        assert!(metadata.portal_endpoint.is_none());
    }

    #[test]
    fn missing_graph_endpoint_is_an_error() {
        let result = serde_json::from_value::<MetadataEndpoints>(json!({
            "galleryEndpoint": "https://gallery.example.local",
            "authentication": {
                "loginEndpoint": "https://login.example.local",
                "audiences": ["aud1"]
            }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn empty_audiences_have_no_primary() {
        let auth = AuthenticationMetadata {
            login_endpoint: "https://login.example.local".into(),
            audiences: vec![],
        };
        assert!(auth.primary_audience().is_none());
    }
}
