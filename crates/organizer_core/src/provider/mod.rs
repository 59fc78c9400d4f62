//! Live resource inventory seam.
//!
//! # Responsibility
//! - Define the contract the reconciler uses to list live resources.
//! - Adapt external objects (containers, VMs) into organizer resources.
//!
//! # Invariants
//! - Providers are injected; nothing here reaches for global state.
//! - `enrich` may annotate objects but must not drop or reorder them.

mod adapter;
mod registry;

use std::error::Error;
use std::fmt::{Display, Formatter};

pub use adapter::{
    adapt_external_resource, resource_adapter, vm_resource_adapter, ContainerSummary,
    ExternalResource, VmSummary, CONTAINER_RESOURCE_TYPE, VM_RESOURCE_TYPE,
};
pub use registry::{ProviderRegistry, ProviderRegistryError};

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failure reported by a resource provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub provider_id: String,
    pub code: String,
    pub message: String,
    /// Whether repeating the whole operation may succeed.
    pub retryable: bool,
}

impl ProviderError {
    pub fn new(
        provider_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            code: code.into(),
            message: message.into(),
            retryable,
        }
    }

    /// Provider could not be reached.
    pub fn unavailable(provider_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider_id, "provider_unavailable", message, true)
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "resource provider `{}` failed ({}): {}",
            self.provider_id, self.code, self.message
        )
    }
}

impl Error for ProviderError {}

/// Source of the live resource list.
pub trait ResourceProvider {
    /// Stable provider id, `[a-z0-9_-]+`.
    fn provider_id(&self) -> &str;

    /// Lists live external objects.
    fn list_resources(&self) -> ProviderResult<Vec<ExternalResource>>;

    /// Attaches derived status before adaptation. Identity by default.
    fn enrich(&self, resources: Vec<ExternalResource>) -> ProviderResult<Vec<ExternalResource>> {
        Ok(resources)
    }

    /// Lists and enriches in one call.
    fn fetch_live(&self) -> ProviderResult<Vec<ExternalResource>> {
        let listed = self.list_resources()?;
        self.enrich(listed)
    }
}

/// Provider over a fixed snapshot, e.g. loaded from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticResourceProvider {
    provider_id: String,
    resources: Vec<ExternalResource>,
}

impl StaticResourceProvider {
    pub fn new(provider_id: impl Into<String>, resources: Vec<ExternalResource>) -> Self {
        Self {
            provider_id: provider_id.into(),
            resources,
        }
    }

    /// Parses a JSON array of tagged external resources.
    pub fn from_json(provider_id: impl Into<String>, text: &str) -> ProviderResult<Self> {
        let provider_id = provider_id.into();
        let resources = serde_json::from_str::<Vec<ExternalResource>>(text).map_err(|err| {
            ProviderError::new(provider_id.clone(), "invalid_snapshot", err.to_string(), false)
        })?;
        Ok(Self::new(provider_id, resources))
    }

    pub fn resources(&self) -> &[ExternalResource] {
        &self.resources
    }
}

impl ResourceProvider for StaticResourceProvider {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn list_resources(&self) -> ProviderResult<Vec<ExternalResource>> {
        Ok(self.resources.clone())
    }
}
