//! Provider registry: discovery, options introspection, loading and
//! provisioning of pluggable backends.
//!
//! Providers register a [`ProviderFactory`] in a [`ProviderCatalog`] at
//! startup. A [`ProviderLoader`] pairs the catalog with a directory of
//! provider files (`providers/<name>.toml`), lists what is available, reports
//! each provider's options and builds [`ProviderHandle`]s. Installing a
//! provider's requirements is a separate step ([`Provisioner`]).

pub mod builtin;
pub mod catalog;
pub mod discover;
pub mod error;
pub mod factory;
pub mod install;
pub mod loader;
pub mod manifest;
pub mod provider;

pub use {
    catalog::ProviderCatalog,
    discover::{ProviderDir, discover_providers},
    error::{Error, Result},
    factory::{ConfigurableFactory, ProviderFactory, ProviderOptions},
    install::{
        CommandInstaller, PackageInstaller, ProvisionPlan, ProvisionReport, Provisioner,
    },
    loader::{ProviderHandle, ProviderLoader, available_providers},
    manifest::ProviderManifest,
    provider::{Provider, provider_type_name},
};
