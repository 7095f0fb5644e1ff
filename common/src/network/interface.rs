//! # Interface Inventory
//!
//! Enumerates the host's network adapters and reduces each one to the facts
//! discovery cares about: link state, hardware address and the first IPv4
//! address bound to it.
//!
//! The inventory is rebuilt from scratch on every [`scan`]; entries carry no
//! identity across scans.

use std::net::Ipv4Addr;

use pnet::datalink::{self, MacAddr};
use pnet::ipnetwork::{IpNetwork, Ipv4Network};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum InventoryError {
    /// The operating system refused to list its interfaces.
    #[error("failed to get network interfaces: {0}")]
    Enumeration(String),
}

/// One host network adapter as seen by the discovery engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    pub name: String,
    pub mac: Option<MacAddr>,
    pub ipv4: Option<Ipv4Addr>,
    pub netmask: Option<Ipv4Addr>,
    pub is_up: bool,
}

impl NetworkInterface {
    /// Hardware address in `aa:bb:cc:dd:ee:ff` form, empty when the adapter has none.
    pub fn hardware_address(&self) -> String {
        self.mac.map(|mac| mac.to_string()).unwrap_or_default()
    }

    pub fn has_ipv4(&self) -> bool {
        self.ipv4.is_some()
    }

    pub fn has_hardware_address(&self) -> bool {
        self.mac.is_some()
    }
}

impl From<&datalink::NetworkInterface> for NetworkInterface {
    fn from(interface: &datalink::NetworkInterface) -> Self {
        let first_v4: Option<Ipv4Network> = interface.ips.iter().find_map(|net| match net {
            IpNetwork::V4(v4) => Some(*v4),
            IpNetwork::V6(_) => None,
        });

        Self {
            name: interface.name.clone(),
            mac: interface.mac,
            ipv4: first_v4.map(|net| net.ip()),
            netmask: first_v4.map(|net| net.mask()),
            is_up: interface.is_up(),
        }
    }
}

/// Where raw interface descriptions come from.
///
/// The system implementation asks the OS; tests hand in fixed lists.
pub trait InterfaceSource {
    fn interfaces(&self) -> Result<Vec<datalink::NetworkInterface>, InventoryError>;
}

/// Reads interfaces from the operating system through `pnet`.
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn interfaces(&self) -> Result<Vec<datalink::NetworkInterface>, InventoryError> {
        Ok(datalink::interfaces())
    }
}

/// Takes a fresh inventory of every non-loopback interface.
///
/// Interfaces without an IPv4 address are still listed; selection rejects them later.
/// Enumeration failures are returned as-is, with no partial result.
pub fn scan(source: &impl InterfaceSource) -> Result<Vec<NetworkInterface>, InventoryError> {
    let interfaces: Vec<datalink::NetworkInterface> = source.interfaces()?;

    let inventory: Vec<NetworkInterface> = interfaces
        .iter()
        .filter(|interface| !interface.is_loopback())
        .map(NetworkInterface::from)
        .collect();

    for interface in &inventory {
        info!(
            interface = %interface.name,
            mac = %interface.hardware_address(),
            ipv4 = ?interface.ipv4,
            up = interface.is_up,
            "found network interface"
        );
    }

    Ok(inventory)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
