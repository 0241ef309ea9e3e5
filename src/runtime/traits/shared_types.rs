// ABOUTME: Shared types used across the engine traits.
// ABOUTME: ContainerSpec, port bindings, bind mounts, and resource limits.

use crate::types::ImageRef;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Everything needed to create a container.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSpec {
    /// Name for the container.
    pub name: String,
    /// Image to run.
    pub image: ImageRef,
    /// `KEY=VALUE` entries, passed through untouched.
    pub env: Vec<String>,
    /// Command (overrides image CMD).
    pub cmd: Option<Vec<String>>,
    /// Entrypoint (overrides image ENTRYPOINT).
    pub entrypoint: Option<Vec<String>>,
    pub port_bindings: PortMap,
    pub mounts: Vec<BindMount>,
    pub resources: ResourceLimits,
}

/// Port protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
    Sctp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Sctp => "sctp",
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            "sctp" => Ok(Protocol::Sctp),
            other => Err(format!("unknown protocol: {other}")),
        }
    }
}

/// A container-side port, formatted like the engine's keys (`80/tcp`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContainerPort {
    pub port: u16,
    pub protocol: Protocol,
}

impl fmt::Display for ContainerPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.port, self.protocol.as_str())
    }
}

/// Where a container port is published on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostBinding {
    pub host_ip: String,
    /// `None` lets the engine pick a free port.
    pub host_port: Option<u16>,
}

/// Container port to host binding, one binding per port.
pub type PortMap = BTreeMap<ContainerPort, HostBinding>;

/// A host path bind-mounted into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    pub source: String,
    pub target: String,
}

/// Resource limits, already in engine units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Memory limit in bytes.
    pub memory: Option<i64>,
    /// CPU quota in units of 1e-9 CPUs.
    pub nano_cpus: Option<i64>,
}
