//! Config-to-manifest pipeline scenarios.

use platform_installer::components::{default_registry, public_api_server};
use platform_installer::manifest::{self, DOCUMENT_SEPARATOR};
use platform_installer::{Error, InstallerConfig, RenderMode, ServiceType};

use crate::common::fixtures::{ConfigBuilder, TEST_NAMESPACE};

fn render_docs(config: InstallerConfig, namespace: Option<&str>) -> Vec<serde_json::Value> {
    let ctx = config.into_context(namespace.map(str::to_string));
    let objects = default_registry()
        .unwrap()
        .render(&ctx, RenderMode::FailFast)
        .unwrap();
    let yaml = manifest::to_yaml(&objects).unwrap();

    yaml.split(DOCUMENT_SEPARATOR)
        .filter(|doc| !doc.trim().is_empty())
        .map(|doc| serde_yaml::from_str(doc).unwrap())
        .collect()
}

#[test]
fn test_render_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = ConfigBuilder::new()
        .namespace(TEST_NAMESPACE)
        .label("app", "gitpod")
        .feature("public-api")
        .write_to(&dir)
        .unwrap();

    let config = InstallerConfig::load(&path).unwrap();
    let docs = render_docs(config, None);
    assert_eq!(docs.len(), 1);

    let svc = &docs[0];
    assert_eq!(svc["apiVersion"], "v1");
    assert_eq!(svc["kind"], "Service");
    assert_eq!(svc["metadata"]["name"], public_api_server::COMPONENT);
    assert_eq!(svc["metadata"]["namespace"], TEST_NAMESPACE);
    assert_eq!(svc["metadata"]["labels"]["app"], "gitpod");
    assert_eq!(
        svc["metadata"]["labels"]["component"],
        public_api_server::COMPONENT
    );
    assert_eq!(
        svc["spec"]["selector"],
        serde_json::json!({ "component": public_api_server::COMPONENT })
    );
    assert_eq!(svc["spec"]["type"], "ClusterIP");

    let ports = svc["spec"]["ports"].as_array().unwrap();
    assert_eq!(ports.len(), 2);
    assert_eq!(ports[0]["name"], "http");
    assert_eq!(ports[0]["port"], 9001);
    assert_eq!(ports[0]["targetPort"], 9001);
    assert_eq!(ports[0]["protocol"], "TCP");
    assert_eq!(ports[1]["name"], "grpc");
    assert_eq!(ports[1]["port"], 9002);
    assert_eq!(ports[1]["targetPort"], 9002);
}

#[test]
fn test_namespace_flag_overrides_config() {
    let config = ConfigBuilder::new().namespace("from-file").build();
    let docs = render_docs(config, Some("from-flag"));
    assert_eq!(docs[0]["metadata"]["namespace"], "from-flag");
}

#[test]
fn test_component_overrides_from_config() {
    let config = ConfigBuilder::new()
        .namespace(TEST_NAMESPACE)
        .annotation("owner", "platform")
        .service_type(public_api_server::COMPONENT, ServiceType::LoadBalancer)
        .service_annotation(
            public_api_server::COMPONENT,
            "cloud.google.com/neg",
            r#"{"ingress": true}"#,
        )
        .build();

    let docs = render_docs(config, None);
    let svc = &docs[0];
    assert_eq!(svc["spec"]["type"], "LoadBalancer");
    assert_eq!(svc["metadata"]["annotations"]["owner"], "platform");
    assert_eq!(
        svc["metadata"]["annotations"]["cloud.google.com/neg"],
        r#"{"ingress": true}"#
    );
}

#[test]
fn test_config_without_namespace_fails() {
    let ctx = ConfigBuilder::new().label("app", "gitpod").build().into_context(None);
    let err = default_registry()
        .unwrap()
        .render(&ctx, RenderMode::CollectAll)
        .unwrap_err();

    match err {
        Error::Aggregate(errors) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].component(), Some(public_api_server::COMPONENT));
            assert!(errors[0].to_string().contains("namespace"));
        }
        other => panic!("expected aggregate error, got {other:?}"),
    }
}

#[test]
fn test_manifest_output_is_byte_identical_across_runs() {
    let config = ConfigBuilder::new()
        .namespace(TEST_NAMESPACE)
        .label("app", "gitpod")
        .label("tier", "api")
        .annotation("b", "2")
        .annotation("a", "1")
        .build();
    let ctx = config.into_context(None);
    let registry = default_registry().unwrap();

    let first = manifest::to_yaml(&registry.render(&ctx, RenderMode::FailFast).unwrap()).unwrap();
    let second = manifest::to_yaml(&registry.render(&ctx, RenderMode::FailFast).unwrap()).unwrap();
    assert_eq!(first, second);
}
