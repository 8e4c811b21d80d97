//! Service generation for platform components.
//!
//! A component declares its ports as a [`PortTable`]; this module compiles
//! that declaration into a ClusterIP Service (or the configured override
//! type) whose selector is exactly `{component: <identity>}`.

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use tracing::debug;

use crate::context::RenderContext;
use crate::error::{Error, Result};
use crate::renderer::RuntimeObject;
use crate::resources::common::{object_meta, selector_labels};
use crate::resources::identity::ComponentIdentity;
use crate::resources::ports::{NamedPortSpec, PortTable};

/// Generate the Service exposing a component's ports.
///
/// Fails with [`Error::MissingContext`] when the context has no namespace.
/// The port list matches `ports` one-to-one, in table order.
pub fn generate_service(
    identity: &ComponentIdentity,
    ports: &PortTable,
    ctx: &RenderContext,
) -> Result<Service> {
    if ctx.namespace().is_empty() {
        return Err(Error::MissingContext { field: "namespace" });
    }

    let overrides = ctx.overrides(identity.as_str());
    let service_type = overrides
        .and_then(|o| o.service_type)
        .unwrap_or_default();
    let extra_annotations = overrides
        .map(|o| o.service_annotations.clone())
        .unwrap_or_default();

    let service_ports: Vec<ServicePort> = ports.iter().map(service_port).collect();

    debug!(
        component = %identity,
        namespace = ctx.namespace(),
        ports = service_ports.len(),
        service_type = %service_type,
        "Generated service"
    );

    Ok(Service {
        metadata: object_meta(identity, ctx, &extra_annotations),
        spec: Some(ServiceSpec {
            type_: Some(service_type.to_string()),
            selector: Some(selector_labels(identity)),
            ports: Some(service_ports),
            ..Default::default()
        }),
        ..Default::default()
    })
}

/// Validate a component's declaration and render its Service.
///
/// Checks run in order: identity, ports, context. The first failure is
/// returned and nothing is rendered.
pub fn service(
    component: &str,
    ports: impl IntoIterator<Item = NamedPortSpec>,
    ctx: &RenderContext,
) -> Result<Vec<RuntimeObject>> {
    let identity = ComponentIdentity::new(component)?;
    let ports = PortTable::new(ports)?;
    let svc = generate_service(&identity, &ports, ctx)?;
    Ok(vec![RuntimeObject::from(svc)])
}

fn service_port(spec: &NamedPortSpec) -> ServicePort {
    ServicePort {
        name: Some(spec.name.clone()),
        port: spec.service_port,
        target_port: Some(IntOrString::Int(spec.container_port)),
        protocol: Some(spec.protocol.to_string()),
        ..Default::default()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::get_unwrap,
    clippy::panic
)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::context::{ComponentOverrides, ServiceType};
    use crate::resources::common::COMPONENT_LABEL;
    use crate::resources::ports::Protocol;

    fn api_ports() -> Vec<NamedPortSpec> {
        vec![
            NamedPortSpec::new("http", 9001, 9001),
            NamedPortSpec::new("grpc", 9002, 9002),
        ]
    }

    fn test_context() -> RenderContext {
        RenderContext::builder("gitpod").label("app", "gitpod").build()
    }

    fn generate(ports: Vec<NamedPortSpec>, ctx: &RenderContext) -> Result<Service> {
        let identity = ComponentIdentity::new("public-api-server")?;
        let table = PortTable::new(ports)?;
        generate_service(&identity, &table, ctx)
    }

    #[test]
    fn test_generate_service() {
        let svc = generate(api_ports(), &test_context()).unwrap();

        assert_eq!(svc.metadata.name, Some("public-api-server".to_string()));
        assert_eq!(svc.metadata.namespace, Some("gitpod".to_string()));

        let spec = svc.spec.unwrap();
        assert_eq!(spec.type_, Some("ClusterIP".to_string()));

        let mut expected_selector = BTreeMap::new();
        expected_selector.insert(COMPONENT_LABEL.to_string(), "public-api-server".to_string());
        assert_eq!(spec.selector, Some(expected_selector));

        let ports = spec.ports.unwrap();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].name, Some("http".to_string()));
        assert_eq!(ports[0].port, 9001);
        assert_eq!(ports[0].target_port, Some(IntOrString::Int(9001)));
        assert_eq!(ports[0].protocol, Some("TCP".to_string()));
        assert_eq!(ports[1].name, Some("grpc".to_string()));
        assert_eq!(ports[1].port, 9002);
        assert_eq!(ports[1].target_port, Some(IntOrString::Int(9002)));
    }

    #[test]
    fn test_container_and_service_ports_differ() {
        let svc = generate(vec![NamedPortSpec::new("http", 8080, 80)], &test_context()).unwrap();
        let ports = svc.spec.unwrap().ports.unwrap();
        assert_eq!(ports[0].port, 80);
        assert_eq!(ports[0].target_port, Some(IntOrString::Int(8080)));
    }

    #[test]
    fn test_protocol_carried_through() {
        let svc = generate(
            vec![NamedPortSpec::new("dns", 53, 53).with_protocol(Protocol::Udp)],
            &test_context(),
        )
        .unwrap();
        let ports = svc.spec.unwrap().ports.unwrap();
        assert_eq!(ports[0].protocol, Some("UDP".to_string()));
    }

    #[test]
    fn test_service_labels() {
        let ctx = RenderContext::builder("gitpod")
            .label("app", "gitpod")
            .label(COMPONENT_LABEL, "something-else")
            .build();
        let svc = generate(api_ports(), &ctx).unwrap();

        let labels = svc.metadata.labels.unwrap();
        assert_eq!(labels.get("app"), Some(&"gitpod".to_string()));
        assert_eq!(
            labels.get(COMPONENT_LABEL),
            Some(&"public-api-server".to_string())
        );

        let selector = svc.spec.unwrap().selector.unwrap();
        assert_eq!(selector.len(), 1);
        assert_eq!(
            selector.get(COMPONENT_LABEL),
            Some(&"public-api-server".to_string())
        );
    }

    #[test]
    fn test_missing_namespace() {
        let ctx = RenderContext::builder("").build();
        let err = generate(api_ports(), &ctx).unwrap_err();
        assert!(matches!(err, Error::MissingContext { field: "namespace" }));
    }

    #[test]
    fn test_component_overrides_applied() {
        let mut annotations = BTreeMap::new();
        annotations.insert("cloud.google.com/neg".to_string(), "true".to_string());
        let ctx = RenderContext::builder("gitpod")
            .annotation("owner", "platform")
            .component_overrides(
                "public-api-server",
                ComponentOverrides {
                    service_type: Some(ServiceType::LoadBalancer),
                    service_annotations: annotations,
                },
            )
            .build();

        let svc = generate(api_ports(), &ctx).unwrap();
        let meta_annotations = svc.metadata.annotations.unwrap();
        assert_eq!(meta_annotations.len(), 2);
        assert_eq!(
            meta_annotations.get("cloud.google.com/neg"),
            Some(&"true".to_string())
        );
        assert_eq!(
            svc.spec.unwrap().type_,
            Some("LoadBalancer".to_string())
        );
    }

    #[test]
    fn test_service_validation_order() {
        let ctx = RenderContext::builder("").build();

        // Identity is checked before ports and context
        let err = service("Bad_Name", Vec::new(), &ctx).unwrap_err();
        assert!(matches!(err, Error::InvalidIdentity { .. }));

        // Ports are checked before context
        let err = service("public-api-server", Vec::new(), &ctx).unwrap_err();
        assert!(matches!(err, Error::NoPorts));

        let err = service("public-api-server", api_ports(), &ctx).unwrap_err();
        assert!(matches!(err, Error::MissingContext { .. }));
    }

    #[test]
    fn test_service_returns_single_object() {
        let objects = service("public-api-server", api_ports(), &test_context()).unwrap();
        assert_eq!(objects.len(), 1);
        match &objects[0] {
            RuntimeObject::Service(svc) => {
                assert_eq!(svc.metadata.name, Some("public-api-server".to_string()));
            }
        }
    }
}
