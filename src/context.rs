//! Shared render context.
//!
//! A [`RenderContext`] is built once per manifest-generation run and handed
//! by reference to every renderer. It has no mutating API after
//! [`RenderContextBuilder::build`], so it can be shared across threads freely.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use serde::{Deserialize, Serialize};

/// Kubernetes Service type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    #[default]
    ClusterIP,
    NodePort,
    LoadBalancer,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::ClusterIP => "ClusterIP",
            ServiceType::NodePort => "NodePort",
            ServiceType::LoadBalancer => "LoadBalancer",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-component overrides supplied by the installer configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ComponentOverrides {
    /// Service type to use instead of ClusterIP
    #[serde(default)]
    pub service_type: Option<ServiceType>,
    /// Annotations added to the component's Service (win over common annotations)
    #[serde(default)]
    pub service_annotations: BTreeMap<String, String>,
}

/// Immutable configuration snapshot for one render run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderContext {
    namespace: String,
    common_labels: BTreeMap<String, String>,
    common_annotations: BTreeMap<String, String>,
    repository: String,
    features: BTreeSet<String>,
    owner: Option<OwnerReference>,
    components: BTreeMap<String, ComponentOverrides>,
}

impl RenderContext {
    pub fn builder(namespace: impl Into<String>) -> RenderContextBuilder {
        RenderContextBuilder {
            ctx: RenderContext {
                namespace: namespace.into(),
                ..Default::default()
            },
        }
    }

    /// Target namespace of every rendered object
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Labels applied to every rendered object
    pub fn common_labels(&self) -> &BTreeMap<String, String> {
        &self.common_labels
    }

    /// Annotations applied to every rendered object
    pub fn common_annotations(&self) -> &BTreeMap<String, String> {
        &self.common_annotations
    }

    /// Image repository components pull from
    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn features(&self) -> &BTreeSet<String> {
        &self.features
    }

    pub fn feature_enabled(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }

    /// Owner reference attached to every rendered object
    pub fn owner(&self) -> Option<&OwnerReference> {
        self.owner.as_ref()
    }

    /// Overrides for a component, if configured
    pub fn overrides(&self, component: &str) -> Option<&ComponentOverrides> {
        self.components.get(component)
    }

    /// Component names that have overrides configured
    pub fn overridden_components(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }
}

/// Builder for [`RenderContext`].
#[derive(Clone, Debug)]
pub struct RenderContextBuilder {
    ctx: RenderContext,
}

impl RenderContextBuilder {
    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ctx.common_labels.insert(key.into(), value.into());
        self
    }

    pub fn labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.ctx.common_labels.extend(labels);
        self
    }

    pub fn annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ctx.common_annotations.insert(key.into(), value.into());
        self
    }

    pub fn annotations(mut self, annotations: BTreeMap<String, String>) -> Self {
        self.ctx.common_annotations.extend(annotations);
        self
    }

    pub fn repository(mut self, repository: impl Into<String>) -> Self {
        self.ctx.repository = repository.into();
        self
    }

    pub fn feature(mut self, feature: impl Into<String>) -> Self {
        self.ctx.features.insert(feature.into());
        self
    }

    pub fn owner(mut self, owner: OwnerReference) -> Self {
        self.ctx.owner = Some(owner);
        self
    }

    pub fn component_overrides(
        mut self,
        component: impl Into<String>,
        overrides: ComponentOverrides,
    ) -> Self {
        self.ctx.components.insert(component.into(), overrides);
        self
    }

    pub fn build(self) -> RenderContext {
        self.ctx
    }
}
