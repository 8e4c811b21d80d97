//! Test fixtures and builder patterns for render contexts and configs.

use std::collections::BTreeMap;
use std::path::PathBuf;

use platform_installer::resources::NamedPortSpec;
use platform_installer::{ComponentOverrides, InstallerConfig, RenderContext, ServiceType};

/// Namespace used by most fixtures
pub const TEST_NAMESPACE: &str = "gitpod";

/// Builder for creating InstallerConfig test fixtures.
///
/// # Example
/// ```
/// let config = ConfigBuilder::new()
///     .namespace("gitpod")
///     .label("app", "gitpod")
///     .service_type("public-api-server", ServiceType::LoadBalancer)
///     .build();
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConfigBuilder {
    config: InstallerConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = Some(namespace.into());
        self
    }

    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.labels.insert(key.into(), value.into());
        self
    }

    pub fn annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.annotations.insert(key.into(), value.into());
        self
    }

    pub fn feature(mut self, feature: impl Into<String>) -> Self {
        self.config.features.insert(feature.into());
        self
    }

    pub fn service_type(mut self, component: impl Into<String>, service_type: ServiceType) -> Self {
        self.config
            .components
            .entry(component.into())
            .or_default()
            .service_type = Some(service_type);
        self
    }

    pub fn service_annotation(
        mut self,
        component: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.config
            .components
            .entry(component.into())
            .or_default()
            .service_annotations
            .insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> InstallerConfig {
        self.config
    }

    /// Serialize the config to YAML
    pub fn to_yaml(&self) -> String {
        serde_yaml::to_string(&self.config).unwrap_or_default()
    }

    /// Write the config into `dir` and return its path
    pub fn write_to(&self, dir: &tempfile::TempDir) -> std::io::Result<PathBuf> {
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, self.to_yaml())?;
        Ok(path)
    }
}

/// Context with the platform's usual common labels
pub fn gitpod_context() -> RenderContext {
    RenderContext::builder(TEST_NAMESPACE)
        .label("app", "gitpod")
        .build()
}

/// Context with the given common labels
pub fn context_with_labels(namespace: &str, labels: BTreeMap<String, String>) -> RenderContext {
    RenderContext::builder(namespace).labels(labels).build()
}

/// HTTP + gRPC ports as declared by the public API server
pub fn api_ports() -> Vec<NamedPortSpec> {
    vec![
        NamedPortSpec::new("http", 9001, 9001),
        NamedPortSpec::new("grpc", 9002, 9002),
    ]
}
