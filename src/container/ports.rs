// ABOUTME: Translates declarative port specs into engine port bindings.
// ABOUTME: Handles protocols, host IPs, and matching container/host port ranges.

use crate::runtime::{ContainerPort, HostBinding, PortMap, Protocol};
use std::collections::BTreeMap;
use thiserror::Error;

/// Host IP used when a spec doesn't name one.
pub const DEFAULT_HOST_IP: &str = "127.0.0.1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortSpecError {
    #[error("port {container} and {host} differ in range")]
    RangeMismatch { container: String, host: String },

    #[error("port ranges {container} and {host} differ in length")]
    LengthMismatch { container: String, host: String },

    #[error("invalid port {0:?}")]
    InvalidPort(String),

    #[error("invalid port range {0:?}")]
    InvalidRange(String),

    #[error("unknown protocol {0:?}")]
    UnknownProtocol(String),
}

/// Expand `container -> host` port specs into one binding per container port.
///
/// Container side: `port`, `start-end`, optionally suffixed with `/proto`
/// (default `tcp`). Host side: `port` or `start-end`, optionally prefixed
/// with `ip:` (default `127.0.0.1`). Both sides must agree on being a range.
pub fn get_port_bindings(ports: &BTreeMap<String, String>) -> Result<PortMap, PortSpecError> {
    let mut map = PortMap::new();

    for (container, host) in ports {
        if container.contains('-') != host.contains('-') {
            return Err(PortSpecError::RangeMismatch {
                container: container.clone(),
                host: host.clone(),
            });
        }

        let (container_ports, protocol) = match container.split_once('/') {
            Some((ports, proto)) => (
                ports,
                proto
                    .parse::<Protocol>()
                    .map_err(|_| PortSpecError::UnknownProtocol(proto.to_string()))?,
            ),
            None => (container.as_str(), Protocol::Tcp),
        };

        let (host_ip, host_ports) = match host.rsplit_once(':') {
            Some((ip, ports)) => (ip.trim_start_matches('[').trim_end_matches(']'), ports),
            None => (DEFAULT_HOST_IP, host.as_str()),
        };

        let (container_range, host_range) = if host_ports.contains('-') {
            let container_range = parse_range(container_ports)?;
            let host_range: Vec<Option<u16>> =
                parse_range(host_ports)?.into_iter().map(Some).collect();
            if container_range.len() != host_range.len() {
                return Err(PortSpecError::LengthMismatch {
                    container: container.clone(),
                    host: host.clone(),
                });
            }
            (container_range, host_range)
        } else {
            let host_port = match host_ports.trim() {
                "" => None,
                port => Some(parse_port(port)?),
            };
            (vec![parse_port(container_ports)?], vec![host_port])
        };

        for (port, host_port) in container_range.into_iter().zip(host_range) {
            map.insert(
                ContainerPort { port, protocol },
                HostBinding {
                    host_ip: host_ip.to_string(),
                    host_port,
                },
            );
        }
    }

    Ok(map)
}

fn parse_port(s: &str) -> Result<u16, PortSpecError> {
    match s.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(PortSpecError::InvalidPort(s.to_string())),
    }
}

fn parse_range(s: &str) -> Result<Vec<u16>, PortSpecError> {
    let (start, end) = s
        .split_once('-')
        .ok_or_else(|| PortSpecError::InvalidRange(s.to_string()))?;
    let (start, end) = (parse_port(start)?, parse_port(end)?);
    if start > end {
        return Err(PortSpecError::InvalidRange(s.to_string()));
    }
    Ok((start..=end).collect())
}
