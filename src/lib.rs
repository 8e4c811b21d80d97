//! platform-installer library crate
//!
//! Renders the Kubernetes manifests of platform components from a shared,
//! read-only [`RenderContext`]. Each component contributes a [`Renderer`];
//! the [`Registry`] runs them and collects the resulting objects.

pub mod components;
pub mod config;
pub mod context;
pub mod error;
pub mod manifest;
pub mod renderer;
pub mod resources;

pub use config::InstallerConfig;
pub use context::{ComponentOverrides, RenderContext, ServiceType};
pub use error::{Error, Result};
pub use renderer::{Registry, RenderMode, Renderer, RuntimeObject};
