//! Azure Stack endpoint discovery.
//!
//! This crate resolves the management URL of an Azure Stack deployment into the full set
//! of dependent service endpoints by reading its unauthenticated metadata document.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{
    discover_endpoints, MetadataClient, MetadataClientBuilder, METADATA_ACCEPT,
    METADATA_API_VERSION, METADATA_PATH,
};
pub use models::{AuthenticationMetadata, MetadataEndpoints};

/// Convenient result alias that reuses the shared error type.
pub type Result<T> = azs_core::Result<T>;
