//! Common resource generation utilities.
//!
//! The `component` label is the binding contract between a Service and the
//! workload it routes to. Workload generators and this crate must build it
//! the same way, so [`selector_labels`] is the only place it is produced.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

use crate::context::RenderContext;
use crate::resources::identity::ComponentIdentity;

/// Selector label key shared by Services and workloads
pub const COMPONENT_LABEL: &str = "component";

/// Selector labels routing traffic to a component's workload instances
pub fn selector_labels(identity: &ComponentIdentity) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(COMPONENT_LABEL.to_string(), identity.to_string());
    labels
}

/// Standard labels applied to all rendered objects of a component.
///
/// Cluster-wide labels come first; the selector label is applied last and
/// wins on key collision.
pub fn standard_labels(
    identity: &ComponentIdentity,
    ctx: &RenderContext,
) -> BTreeMap<String, String> {
    let mut labels = ctx.common_labels().clone();
    labels.extend(selector_labels(identity));
    labels
}

/// Common annotations merged with component-specific ones (component wins)
pub fn standard_annotations(
    ctx: &RenderContext,
    extra: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut annotations = ctx.common_annotations().clone();
    for (key, value) in extra {
        annotations.insert(key.clone(), value.clone());
    }
    annotations
}

/// Owner reference from the context, if the installer supplied one
pub fn owner_references(ctx: &RenderContext) -> Option<Vec<OwnerReference>> {
    ctx.owner().map(|owner| vec![owner.clone()])
}

/// Object metadata for a component-owned object
pub fn object_meta(
    identity: &ComponentIdentity,
    ctx: &RenderContext,
    extra_annotations: &BTreeMap<String, String>,
) -> ObjectMeta {
    let annotations = standard_annotations(ctx, extra_annotations);

    ObjectMeta {
        name: Some(identity.to_string()),
        namespace: Some(ctx.namespace().to_string()),
        labels: Some(standard_labels(identity, ctx)),
        annotations: if annotations.is_empty() {
            None
        } else {
            Some(annotations)
        },
        owner_references: owner_references(ctx),
        ..Default::default()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::get_unwrap
)]
mod tests {
    use super::*;

    fn identity() -> ComponentIdentity {
        ComponentIdentity::new("public-api-server").unwrap()
    }

    #[test]
    fn test_selector_labels() {
        let labels = selector_labels(&identity());
        assert_eq!(labels.len(), 1);
        assert_eq!(
            labels.get(COMPONENT_LABEL),
            Some(&"public-api-server".to_string())
        );
    }

    #[test]
    fn test_standard_labels_merge_common() {
        let ctx = RenderContext::builder("gitpod").label("app", "gitpod").build();
        let labels = standard_labels(&identity(), &ctx);
        assert_eq!(labels.get("app"), Some(&"gitpod".to_string()));
        assert_eq!(
            labels.get("component"),
            Some(&"public-api-server".to_string())
        );
    }

    #[test]
    fn test_selector_label_wins_collision() {
        let ctx = RenderContext::builder("gitpod")
            .label(COMPONENT_LABEL, "hijacked")
            .build();
        let labels = standard_labels(&identity(), &ctx);
        assert_eq!(
            labels.get(COMPONENT_LABEL),
            Some(&"public-api-server".to_string())
        );
    }

    #[test]
    fn test_object_meta_omits_empty_annotations() {
        let ctx = RenderContext::builder("gitpod").build();
        let meta = object_meta(&identity(), &ctx, &BTreeMap::new());
        assert_eq!(meta.name, Some("public-api-server".to_string()));
        assert_eq!(meta.namespace, Some("gitpod".to_string()));
        assert!(meta.annotations.is_none());
        assert!(meta.owner_references.is_none());
    }

    #[test]
    fn test_component_annotations_win() {
        let ctx = RenderContext::builder("gitpod")
            .annotation("a", "common")
            .annotation("b", "common")
            .build();
        let mut extra = BTreeMap::new();
        extra.insert("b".to_string(), "component".to_string());

        let annotations = standard_annotations(&ctx, &extra);
        assert_eq!(annotations.get("a"), Some(&"common".to_string()));
        assert_eq!(annotations.get("b"), Some(&"component".to_string()));
    }

    #[test]
    fn test_owner_reference_propagates() {
        let owner = OwnerReference {
            api_version: "v1".to_string(),
            kind: "ConfigMap".to_string(),
            name: "gitpod-app".to_string(),
            uid: "test-uid".to_string(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        };
        let ctx = RenderContext::builder("gitpod").owner(owner.clone()).build();
        let meta = object_meta(&identity(), &ctx, &BTreeMap::new());
        assert_eq!(meta.owner_references, Some(vec![owner]));
    }
}
