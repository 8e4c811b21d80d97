//! Resource generation module.
//!
//! Contains the building blocks components use to describe the Kubernetes
//! objects they need.
//!
//! ## Resources Generated
//!
//! | Resource | Purpose |
//! |----------|---------|
//! | Service | Exposes a component's named ports, selected by `component` label |

pub mod common;
pub mod identity;
pub mod ports;
pub mod services;

// Re-export commonly used items
pub use common::{COMPONENT_LABEL, selector_labels, standard_labels};
pub use identity::ComponentIdentity;
pub use ports::{NamedPortSpec, PortTable, Protocol};
pub use services::{generate_service, service};
