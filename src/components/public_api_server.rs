//! Public API server.
//!
//! Exposes an HTTP port and a gRPC port through a single Service.

use crate::context::RenderContext;
use crate::error::Result;
use crate::renderer::RuntimeObject;
use crate::resources::ports::NamedPortSpec;
use crate::resources::services::service;

pub const COMPONENT: &str = "public-api-server";

pub const HTTP_PORT_NAME: &str = "http";
pub const HTTP_CONTAINER_PORT: i32 = 9001;
pub const HTTP_SERVICE_PORT: i32 = 9001;

pub const GRPC_PORT_NAME: &str = "grpc";
pub const GRPC_CONTAINER_PORT: i32 = 9002;
pub const GRPC_SERVICE_PORT: i32 = 9002;

/// Ports of the public API server, HTTP first
pub fn ports() -> [NamedPortSpec; 2] {
    [
        NamedPortSpec::new(HTTP_PORT_NAME, HTTP_CONTAINER_PORT, HTTP_SERVICE_PORT),
        NamedPortSpec::new(GRPC_PORT_NAME, GRPC_CONTAINER_PORT, GRPC_SERVICE_PORT),
    ]
}

pub fn render(ctx: &RenderContext) -> Result<Vec<RuntimeObject>> {
    service(COMPONENT, ports(), ctx)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

    use super::*;

    #[test]
    fn test_render_public_api_service() {
        let ctx = RenderContext::builder("gitpod").build();
        let objects = render(&ctx).unwrap();
        assert_eq!(objects.len(), 1);

        let RuntimeObject::Service(svc) = &objects[0];
        assert_eq!(svc.metadata.name.as_deref(), Some(COMPONENT));
        assert_eq!(svc.metadata.namespace.as_deref(), Some("gitpod"));

        let ports = svc.spec.as_ref().unwrap().ports.as_ref().unwrap();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].name.as_deref(), Some(HTTP_PORT_NAME));
        assert_eq!(ports[0].port, HTTP_SERVICE_PORT);
        assert_eq!(
            ports[0].target_port,
            Some(IntOrString::Int(HTTP_CONTAINER_PORT))
        );
        assert_eq!(ports[1].name.as_deref(), Some(GRPC_PORT_NAME));
        assert_eq!(ports[1].port, GRPC_SERVICE_PORT);
        assert_eq!(
            ports[1].target_port,
            Some(IntOrString::Int(GRPC_CONTAINER_PORT))
        );
    }

    #[test]
    fn test_render_requires_namespace() {
        let ctx = RenderContext::builder("").build();
        assert!(render(&ctx).is_err());
    }
}
