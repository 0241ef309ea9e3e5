// ABOUTME: Property tests for port range expansion.
// ABOUTME: Matching container and host ranges expand into one binding per port, in step.

use proptest::prelude::*;
use std::collections::BTreeMap;
use zen_docker::container::get_port_bindings;
use zen_docker::runtime::{ContainerPort, Protocol};

proptest! {
    #[test]
    fn ranges_expand_pairwise(
        container_start in 1u16..60000,
        host_start in 1u16..60000,
        len in 0u16..64,
        udp in any::<bool>(),
    ) {
        let proto = if udp { Protocol::Udp } else { Protocol::Tcp };
        let container = format!(
            "{}-{}/{}",
            container_start,
            container_start + len,
            proto.as_str()
        );
        let host = format!("0.0.0.0:{}-{}", host_start, host_start + len);
        let map = get_port_bindings(&BTreeMap::from([(container, host)])).unwrap();

        prop_assert_eq!(map.len(), usize::from(len) + 1);
        for offset in 0..=len {
            let binding = map
                .get(&ContainerPort { port: container_start + offset, protocol: proto })
                .unwrap();
            prop_assert_eq!(binding.host_port, Some(host_start + offset));
            prop_assert_eq!(binding.host_ip.as_str(), "0.0.0.0");
        }
    }

    #[test]
    fn unequal_ranges_are_rejected(
        start in 1u16..60000,
        len in 1u16..64,
        extra in 1u16..16,
    ) {
        let container = format!("{}-{}", start, start + len);
        let host = format!("{}-{}", start, start + len + extra);
        prop_assert!(get_port_bindings(&BTreeMap::from([(container, host)])).is_err());
    }

    #[test]
    fn single_ports_never_panic(container in "\\PC*", host in "\\PC*") {
        let _ = get_port_bindings(&BTreeMap::from([(container, host)]));
    }
}
