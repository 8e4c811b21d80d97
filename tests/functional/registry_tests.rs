//! Multi-component registry scenarios.

use std::thread;

use platform_installer::components::public_api_server;
use platform_installer::renderer::composite;
use platform_installer::resources::{NamedPortSpec, service};
use platform_installer::{
    ComponentOverrides, Error, RenderContext, RenderMode, Registry, Renderer, RuntimeObject,
};

use crate::common::fixtures::{api_ports, gitpod_context};

fn server(ctx: &RenderContext) -> Result<Vec<RuntimeObject>, Error> {
    service("server", [NamedPortSpec::new("http", 3000, 3000)], ctx)
}

fn proxy(ctx: &RenderContext) -> Result<Vec<RuntimeObject>, Error> {
    service(
        "proxy",
        [
            NamedPortSpec::new("http", 80, 80),
            NamedPortSpec::new("https", 443, 443),
        ],
        ctx,
    )
}

fn misconfigured(ctx: &RenderContext) -> Result<Vec<RuntimeObject>, Error> {
    service("misconfigured", [NamedPortSpec::new("grpc", 0, 9000)], ctx)
}

fn platform_registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register("proxy", proxy)
        .unwrap()
        .register("server", server)
        .unwrap()
        .register(public_api_server::COMPONENT, public_api_server::render)
        .unwrap();
    registry
}

#[test]
fn test_platform_render_order() {
    let objects = platform_registry()
        .render(&gitpod_context(), RenderMode::FailFast)
        .unwrap();
    let names: Vec<String> = objects.iter().map(RuntimeObject::name).collect();
    assert_eq!(names, vec!["proxy", "server", "public-api-server"]);
}

#[test]
fn test_collect_all_attributes_each_failure() {
    let mut registry = platform_registry();
    registry.register("misconfigured", misconfigured).unwrap();

    match registry
        .render(&gitpod_context(), RenderMode::CollectAll)
        .unwrap_err()
    {
        Error::Aggregate(errors) => {
            assert_eq!(errors.len(), 1);
            match &errors[0] {
                Error::Component { component, source } => {
                    assert_eq!(component, "misconfigured");
                    assert!(matches!(
                        source.as_ref(),
                        Error::InvalidPortSpec { name, .. } if name == "grpc"
                    ));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
        other => panic!("expected aggregate error, got {other:?}"),
    }
}

fn proxy_shadowing_server(ctx: &RenderContext) -> Result<Vec<RuntimeObject>, Error> {
    let mut objects = service("proxy-internal", [NamedPortSpec::new("http", 8080, 8080)], ctx)?;
    objects.extend(server(ctx)?);
    Ok(objects)
}

fn proxy_internal(ctx: &RenderContext) -> Result<Vec<RuntimeObject>, Error> {
    service("proxy-internal", [NamedPortSpec::new("http", 8080, 8080)], ctx)
}

#[test]
fn test_collect_all_duplicate_blames_only_offender() {
    let mut registry = Registry::new();
    registry
        .register("server", server)
        .unwrap()
        .register("proxy", proxy_shadowing_server)
        .unwrap()
        .register("proxy-internal", proxy_internal)
        .unwrap();

    match registry
        .render(&gitpod_context(), RenderMode::CollectAll)
        .unwrap_err()
    {
        Error::Aggregate(errors) => {
            assert_eq!(errors.len(), 1);
            match &errors[0] {
                Error::Component { component, source } => {
                    assert_eq!(component, "proxy");
                    assert!(matches!(
                        source.as_ref(),
                        Error::DuplicateObject { name, .. } if name == "server"
                    ));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
        other => panic!("expected aggregate error, got {other:?}"),
    }
}

#[test]
fn test_boxed_renderers_register() {
    let renderers: Vec<(&str, Box<dyn Renderer>)> = vec![
        ("proxy", Box::new(proxy) as Box<dyn Renderer>),
        ("server", Box::new(server) as Box<dyn Renderer>),
    ];

    let mut registry = Registry::new();
    for (component, renderer) in renderers {
        registry.register(component, renderer).unwrap();
    }

    let objects = registry
        .render(&gitpod_context(), RenderMode::FailFast)
        .unwrap();
    let names: Vec<String> = objects.iter().map(RuntimeObject::name).collect();
    assert_eq!(names, vec!["proxy", "server"]);
}

#[test]
fn test_misspelled_override_is_reported() {
    let ctx = RenderContext::builder("gitpod")
        .component_overrides("public-api-servr", ComponentOverrides::default())
        .component_overrides(public_api_server::COMPONENT, ComponentOverrides::default())
        .build();

    assert_eq!(
        platform_registry().unknown_overrides(&ctx),
        vec!["public-api-servr"]
    );
}

#[test]
fn test_component_with_multiple_renderers() {
    let mut registry = Registry::new();
    registry
        .register(
            "server",
            composite(vec![
                Box::new(server) as Box<dyn Renderer>,
                Box::new(|ctx: &RenderContext| {
                    service("server-ide", [NamedPortSpec::new("http", 3001, 3001)], ctx)
                }),
            ]),
        )
        .unwrap();

    let objects = registry
        .render(&gitpod_context(), RenderMode::FailFast)
        .unwrap();
    let names: Vec<String> = objects.iter().map(RuntimeObject::name).collect();
    assert_eq!(names, vec!["server", "server-ide"]);
}

#[test]
fn test_concurrent_renders_share_context() {
    let ctx = gitpod_context();
    let expected = service("public-api-server", api_ports(), &ctx).unwrap();

    let results: Vec<Vec<RuntimeObject>> = thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| service("public-api-server", api_ports(), &ctx).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for result in results {
        assert_eq!(result, expected);
    }
}
