//! Azure Resource Manager client for resource groups.
//!
//! This crate provides typed models and an asynchronous client for the resource group
//! endpoints of an Azure Stack resource manager, together with the service principal
//! token credential the client authenticates with.

#![deny(missing_docs)]

pub mod auth;
pub mod client;
pub mod models;

pub use auth::ClientSecretCredential;
pub use client::{ResourceGroupClient, ResourceGroupClientBuilder, RESOURCE_GROUPS_API_VERSION};
pub use models::{
    CreateResourceGroupRequest, ResourceGroupListResult, ResourceGroupProperties,
    ResourceGroupResource, UpdateResourceGroupRequest,
};

/// Convenient result alias that reuses the shared error type.
pub type Result<T> = azs_core::Result<T>;
