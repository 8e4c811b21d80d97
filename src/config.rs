//! Installer configuration file.
//!
//! Example:
//! ```yaml
//! namespace: gitpod
//! repository: eu.gcr.io/gitpod-core-dev/build
//! labels:
//!   app: gitpod
//! features:
//!   - public-api
//! components:
//!   public-api-server:
//!     serviceType: LoadBalancer
//!     serviceAnnotations:
//!       cloud.google.com/neg: '{"ingress": true}'
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::{ComponentOverrides, RenderContext};
use crate::error::{Error, Result};

/// Installer configuration as read from disk.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InstallerConfig {
    /// Target namespace (the `--namespace` flag takes precedence)
    #[serde(default)]
    pub namespace: Option<String>,

    /// Image repository for component images
    #[serde(default)]
    pub repository: String,

    /// Labels applied to every rendered object
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Annotations applied to every rendered object
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,

    /// Enabled feature flags
    #[serde(default)]
    pub features: BTreeSet<String>,

    /// Owner reference attached to every rendered object
    #[serde(default)]
    pub owner_reference: Option<OwnerReference>,

    /// Per-component overrides keyed by component name
    #[serde(default)]
    pub components: BTreeMap<String, ComponentOverrides>,
}

impl InstallerConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read and parse a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading installer config");
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_yaml_str(&raw)
    }

    /// Build the render context for one run.
    ///
    /// `namespace_override` wins over the file's namespace. An absent
    /// namespace yields an empty one, which generators reject.
    pub fn into_context(self, namespace_override: Option<String>) -> RenderContext {
        let namespace = namespace_override.or(self.namespace).unwrap_or_default();

        let mut builder = RenderContext::builder(namespace)
            .labels(self.labels)
            .annotations(self.annotations)
            .repository(self.repository);

        for feature in self.features {
            builder = builder.feature(feature);
        }
        if let Some(owner) = self.owner_reference {
            builder = builder.owner(owner);
        }
        for (component, overrides) in self.components {
            builder = builder.component_overrides(component, overrides);
        }

        builder.build()
    }
}
