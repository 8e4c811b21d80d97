//! Named port declarations.
//!
//! A component declares its network exposure as a [`PortTable`]: an ordered,
//! non-empty list of [`NamedPortSpec`] entries with unique names. All checks
//! run once in [`PortTable::new`]; a table that exists is valid.
//!
//! Output ordering follows insertion order, so the generated Service lists
//! ports exactly as the component declared them.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum port name length (IANA service name limit)
pub const MAX_PORT_NAME_LENGTH: usize = 15;

/// Lowest valid port number
pub const MIN_PORT: i32 = 1;

/// Highest valid port number
pub const MAX_PORT: i32 = 65535;

/// Transport protocol of a port.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
    Sctp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::Sctp => "SCTP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named pair of container-listening port and exposed service port.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NamedPortSpec {
    pub name: String,
    /// Port the workload process listens on
    pub container_port: i32,
    /// Port the Service exposes to clients
    pub service_port: i32,
    pub protocol: Protocol,
}

impl NamedPortSpec {
    /// Create a TCP port spec.
    pub fn new(name: impl Into<String>, container_port: i32, service_port: i32) -> Self {
        Self {
            name: name.into(),
            container_port,
            service_port,
            protocol: Protocol::Tcp,
        }
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    fn validate(&self) -> Result<()> {
        validate_port_name(&self.name).map_err(|reason| self.invalid(reason))?;

        if !(MIN_PORT..=MAX_PORT).contains(&self.container_port) {
            return Err(self.invalid(format!(
                "container port {} out of range {}-{}",
                self.container_port, MIN_PORT, MAX_PORT
            )));
        }

        if !(MIN_PORT..=MAX_PORT).contains(&self.service_port) {
            return Err(self.invalid(format!(
                "service port {} out of range {}-{}",
                self.service_port, MIN_PORT, MAX_PORT
            )));
        }

        Ok(())
    }

    fn invalid(&self, reason: String) -> Error {
        Error::InvalidPortSpec {
            name: self.name.clone(),
            reason,
        }
    }
}

/// Ordered, validated port table of one component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortTable {
    entries: Vec<NamedPortSpec>,
}

impl PortTable {
    /// Validate port specs and build a table.
    ///
    /// Fails on the first invalid entry; no partial table is returned.
    pub fn new(ports: impl IntoIterator<Item = NamedPortSpec>) -> Result<Self> {
        let entries: Vec<NamedPortSpec> = ports.into_iter().collect();
        if entries.is_empty() {
            return Err(Error::NoPorts);
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(entries.len());
        for spec in &entries {
            spec.validate()?;
            if !seen.insert(spec.name.as_str()) {
                return Err(spec.invalid("duplicate port name".to_string()));
            }
        }

        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedPortSpec> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a constructed table
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&NamedPortSpec> {
        self.entries.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|p| p.name.as_str())
    }
}

impl<'a> IntoIterator for &'a PortTable {
    type Item = &'a NamedPortSpec;
    type IntoIter = std::slice::Iter<'a, NamedPortSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Validate a port name against the Kubernetes IANA service name rules.
///
/// Rules:
/// - 1 to 15 characters
/// - Lowercase letters, digits, and hyphens only
/// - At least one letter
/// - No leading, trailing, or consecutive hyphens
fn validate_port_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("port name cannot be empty".to_string());
    }

    if name.len() > MAX_PORT_NAME_LENGTH {
        return Err(format!(
            "port name exceeds maximum length of {} characters",
            MAX_PORT_NAME_LENGTH
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("port name must be lowercase alphanumeric or '-'".to_string());
    }

    if !name.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("port name must contain at least one letter".to_string());
    }

    if name.starts_with('-') || name.ends_with('-') {
        return Err("port name cannot start or end with '-'".to_string());
    }

    if name.contains("--") {
        return Err("port name cannot contain consecutive hyphens".to_string());
    }

    Ok(())
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

    fn assert_invalid(result: Result<PortTable>, port: &str, reason_fragment: &str) {
        match result {
            Err(Error::InvalidPortSpec { name, reason }) => {
                assert_eq!(name, port);
                assert!(
                    reason.contains(reason_fragment),
                    "reason '{}' should mention '{}'",
                    reason,
                    reason_fragment
                );
            }
            other => panic!("expected InvalidPortSpec, got {other:?}"),
        }
    }

    #[test]
    fn test_table_preserves_insertion_order() {
        let table = PortTable::new([
            NamedPortSpec::new("http", 9001, 9001),
            NamedPortSpec::new("grpc", 9002, 9002),
            NamedPortSpec::new("debug", 6060, 6060),
        ])
        .unwrap();

        let names: Vec<&str> = table.names().collect();
        assert_eq!(names, vec!["http", "grpc", "debug"]);
        assert_eq!(table.len(), 3);
        assert!(!table.is_empty());
    }

    #[test]
    fn test_table_lookup() {
        let table = PortTable::new([NamedPortSpec::new("http", 8080, 80)]).unwrap();
        let http = table.get("http").unwrap();
        assert_eq!(http.container_port, 8080);
        assert_eq!(http.service_port, 80);
        assert_eq!(http.protocol, Protocol::Tcp);
        assert!(table.get("grpc").is_none());
    }

    #[test]
    fn test_empty_table_rejected() {
        let err = PortTable::new(Vec::new()).unwrap_err();
        assert!(matches!(err, Error::NoPorts));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let result = PortTable::new([
            NamedPortSpec::new("http", 9001, 9001),
            NamedPortSpec::new("http", 9002, 9002),
        ]);
        assert_invalid(result, "http", "duplicate");
    }

    #[test]
    fn test_long_name_rejected() {
        let result = PortTable::new([NamedPortSpec::new("metrics-exporter", 9500, 9500)]);
        assert_invalid(result, "metrics-exporter", "maximum length");
    }

    #[test]
    fn test_name_at_length_limit_accepted() {
        let name = "a".repeat(MAX_PORT_NAME_LENGTH);
        assert!(PortTable::new([NamedPortSpec::new(name, 80, 80)]).is_ok());
    }

    #[test]
    fn test_name_character_rules() {
        assert_invalid(
            PortTable::new([NamedPortSpec::new("HTTP", 80, 80)]),
            "HTTP",
            "lowercase",
        );
        assert_invalid(
            PortTable::new([NamedPortSpec::new("8080", 80, 80)]),
            "8080",
            "at least one letter",
        );
        assert_invalid(
            PortTable::new([NamedPortSpec::new("-http", 80, 80)]),
            "-http",
            "start or end",
        );
        assert_invalid(
            PortTable::new([NamedPortSpec::new("http--alt", 80, 80)]),
            "http--alt",
            "consecutive",
        );
        assert_invalid(PortTable::new([NamedPortSpec::new("", 80, 80)]), "", "empty");
    }

    #[test]
    fn test_port_ranges() {
        assert_invalid(
            PortTable::new([NamedPortSpec::new("http", 0, 80)]),
            "http",
            "container port 0",
        );
        assert_invalid(
            PortTable::new([NamedPortSpec::new("http", 80, 65536)]),
            "http",
            "service port 65536",
        );
        assert!(PortTable::new([NamedPortSpec::new("http", MIN_PORT, MAX_PORT)]).is_ok());
    }

    #[test]
    fn test_first_invalid_entry_is_reported() {
        let result = PortTable::new([
            NamedPortSpec::new("http", 9001, 9001),
            NamedPortSpec::new("grpc", -1, 9002),
            NamedPortSpec::new("Bad", 9003, 9003),
        ]);
        assert_invalid(result, "grpc", "container port");
    }

    #[test]
    fn test_protocol_override() {
        let spec = NamedPortSpec::new("dns", 53, 53).with_protocol(Protocol::Udp);
        assert_eq!(spec.protocol.as_str(), "UDP");
        assert_eq!(Protocol::default(), Protocol::Tcp);
        assert_eq!(Protocol::Sctp.to_string(), "SCTP");
    }
}
