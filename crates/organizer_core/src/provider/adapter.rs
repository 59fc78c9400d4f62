//! External resource shapes and their organizer adapters.
//!
//! # Invariants
//! - Adapted ids are stable across restarts (names, not runtime ids).
//! - `meta` carries the full external object unchanged.

use crate::model::organizer::OrganizerResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resource type tag for containers.
pub const CONTAINER_RESOURCE_TYPE: &str = "container";
/// Resource type tag for virtual machines.
pub const VM_RESOURCE_TYPE: &str = "vm";

/// Container as reported by the container runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSummary {
    /// Runtime id. Changes when the container is recreated.
    pub id: String,
    /// Runtime names, usually `/name`.
    #[serde(default)]
    pub names: Vec<String>,
    pub image: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub status: String,
    /// Set by enrichment when no template backs the container.
    #[serde(default)]
    pub is_orphaned: bool,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// Virtual machine as reported by the hypervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmSummary {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
}

/// Any external object a provider can list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExternalResource {
    Container(ContainerSummary),
    Vm(VmSummary),
}

/// Maps a container to an organizer resource.
///
/// The id and name come from the first runtime name without its leading `/`,
/// falling back to the image reference.
pub fn resource_adapter(container: &ContainerSummary) -> OrganizerResource {
    let stable_ref = container
        .names
        .iter()
        .map(|name| name.trim().trim_start_matches('/'))
        .find(|name| !name.is_empty())
        .unwrap_or(container.image.as_str())
        .to_string();

    OrganizerResource {
        id: stable_ref.clone(),
        kind: CONTAINER_RESOURCE_TYPE.to_string(),
        name: stable_ref,
        // String, bool, and string-keyed map fields only; encoding cannot fail.
        meta: serde_json::to_value(container).unwrap_or_default(),
    }
}

/// Maps a virtual machine to an organizer resource.
pub fn vm_resource_adapter(vm: &VmSummary) -> OrganizerResource {
    let name = vm.name.trim();
    let stable_ref = if name.is_empty() {
        vm.uuid.clone()
    } else {
        name.to_string()
    };

    OrganizerResource {
        id: stable_ref.clone(),
        kind: VM_RESOURCE_TYPE.to_string(),
        name: stable_ref,
        // Plain string fields; encoding cannot fail.
        meta: serde_json::to_value(vm).unwrap_or_default(),
    }
}

/// Dispatches to the adapter matching the external object.
pub fn adapt_external_resource(resource: &ExternalResource) -> OrganizerResource {
    match resource {
        ExternalResource::Container(container) => resource_adapter(container),
        ExternalResource::Vm(vm) => vm_resource_adapter(vm),
    }
}
