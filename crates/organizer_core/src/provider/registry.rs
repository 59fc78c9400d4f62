//! In-process registry combining several resource providers.

use super::{ExternalResource, ProviderResult, ResourceProvider};
use log::debug;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

const REGISTRY_PROVIDER_ID: &str = "registry";

/// Provider registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderRegistryError {
    InvalidProviderId(String),
    DuplicateProviderId(String),
}

impl Display for ProviderRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidProviderId(value) => write!(f, "provider id is invalid: {value}"),
            Self::DuplicateProviderId(value) => {
                write!(f, "provider id already registered: {value}")
            }
        }
    }
}

impl Error for ProviderRegistryError {}

/// Aggregates providers (e.g. containers and VMs) behind one provider.
///
/// Listing walks providers in sorted id order; each provider enriches its
/// own objects. The first failing provider aborts the listing.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn ResourceProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one provider.
    pub fn register(
        &mut self,
        provider: Arc<dyn ResourceProvider>,
    ) -> Result<(), ProviderRegistryError> {
        let provider_id = provider.provider_id().trim().to_string();
        if !is_valid_provider_id(&provider_id) {
            return Err(ProviderRegistryError::InvalidProviderId(provider_id));
        }
        if self.providers.contains_key(provider_id.as_str()) {
            return Err(ProviderRegistryError::DuplicateProviderId(provider_id));
        }

        self.providers.insert(provider_id, provider);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Returns sorted provider ids.
    pub fn provider_ids(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    pub fn get(&self, provider_id: &str) -> Option<Arc<dyn ResourceProvider>> {
        self.providers.get(provider_id.trim()).cloned()
    }
}

impl ResourceProvider for ProviderRegistry {
    fn provider_id(&self) -> &str {
        REGISTRY_PROVIDER_ID
    }

    fn list_resources(&self) -> ProviderResult<Vec<ExternalResource>> {
        let mut combined = Vec::new();
        for (provider_id, provider) in &self.providers {
            let live = provider.fetch_live()?;
            debug!(
                "event=provider_list module=provider status=ok provider_id={} count={}",
                provider_id,
                live.len()
            );
            combined.extend(live);
        }
        Ok(combined)
    }
}

fn is_valid_provider_id(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::{ProviderRegistry, ProviderRegistryError};
    use crate::provider::{
        ContainerSummary, ExternalResource, ProviderError, ProviderResult, ResourceProvider,
        StaticResourceProvider, VmSummary,
    };
    use std::sync::Arc;

    struct FailingProvider;

    impl ResourceProvider for FailingProvider {
        fn provider_id(&self) -> &str {
            "libvirt"
        }

        fn list_resources(&self) -> ProviderResult<Vec<ExternalResource>> {
            Err(ProviderError::unavailable("libvirt", "socket closed"))
        }
    }

    struct OrphanMarkingProvider;

    impl ResourceProvider for OrphanMarkingProvider {
        fn provider_id(&self) -> &str {
            "docker"
        }

        fn list_resources(&self) -> ProviderResult<Vec<ExternalResource>> {
            Ok(vec![ExternalResource::Container(ContainerSummary {
                id: "1".to_string(),
                names: vec!["/plex".to_string()],
                image: "plex".to_string(),
                state: "running".to_string(),
                status: String::new(),
                is_orphaned: false,
                labels: Default::default(),
            })])
        }

        fn enrich(
            &self,
            resources: Vec<ExternalResource>,
        ) -> ProviderResult<Vec<ExternalResource>> {
            Ok(resources
                .into_iter()
                .map(|resource| match resource {
                    ExternalResource::Container(mut container) => {
                        container.is_orphaned = true;
                        ExternalResource::Container(container)
                    }
                    other => other,
                })
                .collect())
        }
    }

    fn vm_provider() -> StaticResourceProvider {
        StaticResourceProvider::new(
            "libvirt",
            vec![ExternalResource::Vm(VmSummary {
                uuid: "u-1".to_string(),
                name: "win11".to_string(),
                state: "running".to_string(),
            })],
        )
    }

    #[test]
    fn rejects_invalid_or_duplicate_provider_id() {
        let mut registry = ProviderRegistry::new();
        let invalid = registry.register(Arc::new(StaticResourceProvider::new("Docker Engine", vec![])));
        assert!(matches!(
            invalid,
            Err(ProviderRegistryError::InvalidProviderId(_))
        ));

        registry
            .register(Arc::new(vm_provider()))
            .expect("first provider should register");
        let duplicate = registry.register(Arc::new(vm_provider()));
        assert!(matches!(
            duplicate,
            Err(ProviderRegistryError::DuplicateProviderId(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn combines_providers_in_sorted_order_with_enrichment() {
        let mut registry = ProviderRegistry::new();
        registry
            .register(Arc::new(vm_provider()))
            .expect("libvirt should register");
        registry
            .register(Arc::new(OrphanMarkingProvider))
            .expect("docker should register");

        assert_eq!(registry.provider_ids(), vec!["docker", "libvirt"]);
        let live = registry.fetch_live().expect("listing should succeed");
        assert_eq!(live.len(), 2);
        assert!(matches!(&live[0], ExternalResource::Container(c) if c.is_orphaned));
        assert!(matches!(&live[1], ExternalResource::Vm(_)));
    }

    #[test]
    fn failing_provider_aborts_listing() {
        let mut registry = ProviderRegistry::new();
        registry
            .register(Arc::new(FailingProvider))
            .expect("provider should register");

        let err = registry.fetch_live().expect_err("listing should fail");
        assert_eq!(err.provider_id, "libvirt");
        assert!(err.retryable);
    }

    #[test]
    fn get_trims_input() {
        let mut registry = ProviderRegistry::new();
        registry
            .register(Arc::new(vm_provider()))
            .expect("provider should register");
        assert!(registry.get("  libvirt ").is_some());
        assert!(registry.get("docker").is_none());
    }
}
