//! # azs-core
//!
//! Core types and utilities for managing resources on Azure Stack.
//!
//! This crate provides the shared error type, HTTP client settings, configuration,
//! and the capability traits implemented by the discovery and resource manager crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and error response mapping
//! - [`types`] - Domain types (discovered endpoints, resource groups)
//! - [`config`] - Process configuration and service principal credentials
//! - [`client`] - HTTP client settings shared by every remote client
//! - [`naming`] - Random resource name generation
//! - [`provisioning`] - Capability traits for token issuance and resource group management

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod naming;
pub mod provisioning;
pub mod types;

// Re-export commonly used types
pub use error::{DiscoveryError, Error, Result};
