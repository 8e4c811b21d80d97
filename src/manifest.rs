//! Manifest serialization.
//!
//! Rendered objects are written as one multi-document YAML stream, each
//! document introduced by `---`, in the order they were rendered.

use crate::error::Result;
use crate::renderer::RuntimeObject;

/// YAML document separator
pub const DOCUMENT_SEPARATOR: &str = "---\n";

/// Serialize objects into a multi-document YAML stream.
pub fn to_yaml(objects: &[RuntimeObject]) -> Result<String> {
    let mut out = String::new();
    for obj in objects {
        out.push_str(DOCUMENT_SEPARATOR);
        out.push_str(&serde_yaml::to_string(obj)?);
    }
    Ok(out)
}
