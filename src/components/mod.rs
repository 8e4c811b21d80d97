//! Platform component renderers.
//!
//! | Component | Objects |
//! |-----------|---------|
//! | public-api-server | Service (http, grpc) |

pub mod public_api_server;

use crate::error::Result;
use crate::renderer::Registry;

/// Registry holding every shipped component, in render order
pub fn default_registry() -> Result<Registry> {
    let mut registry = Registry::new();
    registry.register(public_api_server::COMPONENT, public_api_server::render)?;
    Ok(registry)
}
