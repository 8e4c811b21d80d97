//! Renderer interface and component registry.
//!
//! Every platform component contributes one or more [`Renderer`]s. The
//! installer registers them in a [`Registry`] and renders the whole set
//! against a single [`RenderContext`].

use std::collections::HashSet;

use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use serde::Serialize;
use tracing::{info, warn};

use crate::context::RenderContext;
use crate::error::{Error, Result};

/// Typed Kubernetes object emitted by a renderer.
///
/// Serializes to the object's own manifest form (including `apiVersion`
/// and `kind`).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RuntimeObject {
    Service(Service),
}

impl RuntimeObject {
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeObject::Service(_) => <Service as k8s_openapi::Resource>::KIND,
        }
    }

    pub fn name(&self) -> String {
        match self {
            RuntimeObject::Service(svc) => svc.name_any(),
        }
    }

    pub fn namespace(&self) -> Option<String> {
        match self {
            RuntimeObject::Service(svc) => svc.namespace(),
        }
    }
}

impl From<Service> for RuntimeObject {
    fn from(svc: Service) -> Self {
        RuntimeObject::Service(svc)
    }
}

/// Produces the Kubernetes objects of one component.
pub trait Renderer: Send + Sync {
    fn render(&self, ctx: &RenderContext) -> Result<Vec<RuntimeObject>>;
}

impl<F> Renderer for F
where
    F: Fn(&RenderContext) -> Result<Vec<RuntimeObject>> + Send + Sync,
{
    fn render(&self, ctx: &RenderContext) -> Result<Vec<RuntimeObject>> {
        self(ctx)
    }
}

impl Renderer for Box<dyn Renderer> {
    fn render(&self, ctx: &RenderContext) -> Result<Vec<RuntimeObject>> {
        (**self).render(ctx)
    }
}

/// Several renderers of one component, run in order.
pub struct Composite {
    renderers: Vec<Box<dyn Renderer>>,
}

impl Renderer for Composite {
    fn render(&self, ctx: &RenderContext) -> Result<Vec<RuntimeObject>> {
        let mut objects = Vec::new();
        for renderer in &self.renderers {
            objects.extend(renderer.render(ctx)?);
        }
        Ok(objects)
    }
}

/// Combine renderers into one; stops at the first error.
pub fn composite(renderers: Vec<Box<dyn Renderer>>) -> Composite {
    Composite { renderers }
}

/// How the registry reacts to failing components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Stop at the first failing component
    #[default]
    FailFast,
    /// Render every component and report all failures together
    CollectAll,
}

/// Ordered list of component renderers.
#[derive(Default)]
pub struct Registry {
    entries: Vec<(String, Box<dyn Renderer>)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component renderer. Component names must be unique.
    pub fn register<R>(&mut self, component: impl Into<String>, renderer: R) -> Result<&mut Self>
    where
        R: Renderer + 'static,
    {
        let component = component.into();
        if self.entries.iter().any(|(name, _)| *name == component) {
            return Err(Error::DuplicateComponent(component));
        }
        self.entries.push((component, Box::new(renderer)));
        Ok(self)
    }

    /// Registered component names in registration order
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Override keys in `ctx` that match no registered component
    pub fn unknown_overrides<'a>(&self, ctx: &'a RenderContext) -> Vec<&'a str> {
        ctx.overridden_components()
            .filter(|name| !self.entries.iter().any(|(component, _)| component == name))
            .collect()
    }

    /// Render every component in registration order.
    ///
    /// Objects keep registration order. Two components emitting the same
    /// `(kind, namespace, name)` is an error in both modes.
    pub fn render(&self, ctx: &RenderContext, mode: RenderMode) -> Result<Vec<RuntimeObject>> {
        let mut objects = Vec::new();
        let mut seen: HashSet<(&'static str, String, String)> = HashSet::new();
        let mut failures = Vec::new();

        for name in self.unknown_overrides(ctx) {
            warn!(component = %name, "Overrides configured for unregistered component");
        }

        for (component, renderer) in &self.entries {
            let rendered = renderer
                .render(ctx)
                .and_then(|rendered| check_unique(&mut seen, rendered))
                .map_err(|e| Error::Component {
                    component: component.clone(),
                    source: Box::new(e),
                });

            match rendered {
                Ok(rendered) => objects.extend(rendered),
                Err(e) if mode == RenderMode::FailFast => return Err(e),
                Err(e) => {
                    warn!(component = %component, error = %e, "Component failed to render");
                    failures.push(e);
                }
            }
        }

        if !failures.is_empty() {
            return Err(Error::Aggregate(failures));
        }

        info!(
            components = self.entries.len(),
            objects = objects.len(),
            mode = ?mode,
            "Rendered manifests"
        );
        Ok(objects)
    }
}

/// Reject objects already emitted by an earlier component.
///
/// Keys are only merged into `seen` once the whole batch is unique, so a
/// failing component never claims names for the components after it.
fn check_unique(
    seen: &mut HashSet<(&'static str, String, String)>,
    objects: Vec<RuntimeObject>,
) -> Result<Vec<RuntimeObject>> {
    let mut batch = HashSet::with_capacity(objects.len());
    for obj in &objects {
        let key = (obj.kind(), obj.namespace().unwrap_or_default(), obj.name());
        if seen.contains(&key) || batch.contains(&key) {
            return Err(Error::DuplicateObject {
                kind: key.0.to_string(),
                namespace: key.1,
                name: key.2,
            });
        }
        batch.insert(key);
    }
    seen.extend(batch);
    Ok(objects)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::context::ComponentOverrides;
    use crate::resources::ports::NamedPortSpec;
    use crate::resources::services::service;

    fn http_renderer(component: &'static str) -> impl Renderer {
        move |ctx: &RenderContext| service(component, [NamedPortSpec::new("http", 8080, 80)], ctx)
    }

    fn failing(ctx: &RenderContext) -> Result<Vec<RuntimeObject>> {
        service("broken", Vec::new(), ctx)
    }

    fn ctx() -> RenderContext {
        RenderContext::builder("gitpod").build()
    }

    fn names(objects: &[RuntimeObject]) -> Vec<String> {
        objects.iter().map(RuntimeObject::name).collect()
    }

    #[test]
    fn test_runtime_object_accessors() {
        let objects = http_renderer("server").render(&ctx()).unwrap();
        let obj = &objects[0];
        assert_eq!(obj.kind(), "Service");
        assert_eq!(obj.name(), "server");
        assert_eq!(obj.namespace(), Some("gitpod".to_string()));
    }

    #[test]
    fn test_render_keeps_registration_order() {
        let mut registry = Registry::new();
        registry
            .register("proxy", http_renderer("proxy"))
            .unwrap()
            .register("dashboard", http_renderer("dashboard"))
            .unwrap()
            .register("server", http_renderer("server"))
            .unwrap();

        assert_eq!(
            registry.components().collect::<Vec<_>>(),
            vec!["proxy", "dashboard", "server"]
        );

        let objects = registry.render(&ctx(), RenderMode::FailFast).unwrap();
        assert_eq!(names(&objects), vec!["proxy", "dashboard", "server"]);
    }

    #[test]
    fn test_duplicate_component_rejected() {
        let mut registry = Registry::new();
        registry.register("server", http_renderer("server")).unwrap();
        let err = registry
            .register("server", http_renderer("server"))
            .err()
            .unwrap();
        assert!(matches!(err, Error::DuplicateComponent(name) if name == "server"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_fail_fast_stops_at_first_error() {
        let mut registry = Registry::new();
        registry
            .register("broken", failing)
            .unwrap()
            .register("also-broken", failing)
            .unwrap();

        let err = registry.render(&ctx(), RenderMode::FailFast).unwrap_err();
        assert_eq!(err.component(), Some("broken"));
        assert!(err.is_validation());
    }

    #[test]
    fn test_collect_all_reports_every_failure() {
        let mut registry = Registry::new();
        registry
            .register("broken", failing)
            .unwrap()
            .register("server", http_renderer("server"))
            .unwrap()
            .register("also-broken", failing)
            .unwrap();

        match registry.render(&ctx(), RenderMode::CollectAll).unwrap_err() {
            Error::Aggregate(errors) => {
                let components: Vec<_> = errors.iter().filter_map(Error::component).collect();
                assert_eq!(components, vec!["broken", "also-broken"]);
            }
            other => panic!("expected aggregate error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_object_rejected() {
        let mut registry = Registry::new();
        registry
            .register("server", http_renderer("server"))
            .unwrap()
            .register("server-alias", http_renderer("server"))
            .unwrap();

        let err = registry.render(&ctx(), RenderMode::FailFast).unwrap_err();
        assert_eq!(err.component(), Some("server-alias"));
        match err {
            Error::Component { source, .. } => {
                assert!(matches!(*source, Error::DuplicateObject { ref name, .. } if name == "server"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_within_one_component_rejected() {
        let mut registry = Registry::new();
        registry
            .register(
                "server",
                composite(vec![
                    Box::new(http_renderer("server")) as Box<dyn Renderer>,
                    Box::new(http_renderer("server")),
                ]),
            )
            .unwrap();

        let err = registry.render(&ctx(), RenderMode::FailFast).unwrap_err();
        assert_eq!(err.component(), Some("server"));
    }

    #[test]
    fn test_failed_component_does_not_claim_names() {
        let mut registry = Registry::new();
        registry
            .register("a", http_renderer("a"))
            .unwrap()
            .register(
                "b",
                composite(vec![
                    Box::new(http_renderer("x")) as Box<dyn Renderer>,
                    Box::new(http_renderer("a")),
                ]),
            )
            .unwrap()
            .register("c", http_renderer("x"))
            .unwrap();

        match registry.render(&ctx(), RenderMode::CollectAll).unwrap_err() {
            Error::Aggregate(errors) => {
                let components: Vec<_> = errors.iter().filter_map(Error::component).collect();
                assert_eq!(components, vec!["b"]);
            }
            other => panic!("expected aggregate error, got {other:?}"),
        }
    }

    #[test]
    fn test_boxed_renderer_registers() {
        let boxed: Box<dyn Renderer> = Box::new(http_renderer("server"));
        let mut registry = Registry::new();
        registry.register("server", boxed).unwrap();

        let objects = registry.render(&ctx(), RenderMode::FailFast).unwrap();
        assert_eq!(names(&objects), vec!["server"]);
    }

    #[test]
    fn test_unknown_overrides_reported() {
        let ctx = RenderContext::builder("gitpod")
            .component_overrides("server", ComponentOverrides::default())
            .component_overrides("sevrer", ComponentOverrides::default())
            .build();
        let mut registry = Registry::new();
        registry.register("server", http_renderer("server")).unwrap();

        assert_eq!(registry.unknown_overrides(&ctx), vec!["sevrer"]);
        // Unknown overrides are reported, not fatal
        assert_eq!(registry.render(&ctx, RenderMode::FailFast).unwrap().len(), 1);
    }

    #[test]
    fn test_composite_concatenates_in_order() {
        let combined = composite(vec![
            Box::new(http_renderer("server")) as Box<dyn Renderer>,
            Box::new(http_renderer("server-ws")),
        ]);
        let objects = combined.render(&ctx()).unwrap();
        assert_eq!(names(&objects), vec!["server", "server-ws"]);
    }

    #[test]
    fn test_composite_fails_on_first_error() {
        let combined = composite(vec![
            Box::new(http_renderer("server")) as Box<dyn Renderer>,
            Box::new(failing),
        ]);
        assert!(matches!(combined.render(&ctx()), Err(Error::NoPorts)));
    }

    #[test]
    fn test_empty_registry_renders_nothing() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert!(registry.render(&ctx(), RenderMode::CollectAll).unwrap().is_empty());
    }
}
