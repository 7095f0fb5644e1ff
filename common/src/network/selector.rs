//! # Interface Selector
//!
//! Picks the interface that discovery traffic is bound to.
//!
//! Candidates come from a configured allow-list matched by exact name. A
//! candidate is only usable when it is up, carries an IPv4 address and has a
//! hardware address; [`BindingConfig`] can only be built from such an interface.

use std::fmt;
use std::net::Ipv4Addr;

use pnet::datalink::MacAddr;
use thiserror::Error;
use tracing::{info, warn};

use crate::network::interface::NetworkInterface;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SelectionError {
    #[error("interface {0} not found")]
    NotFound(String),
    #[error("interface {0} is DOWN")]
    IsDown(String),
    #[error("interface {0} has no IP address")]
    NoIpv4Address(String),
    #[error("interface {0} has no MAC address")]
    NoMacAddress(String),
    /// Nothing in the inventory matched the allow-list. No discovery is possible.
    #[error("no candidate interface matches the configured allow-list")]
    NoCandidates,
}

/// The interface chosen for discovery, ready to hand to the discovery service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingConfig {
    interface_name: String,
    mac: MacAddr,
    ipv4: Ipv4Addr,
    role: String,
    enabled: bool,
}

impl BindingConfig {
    pub fn interface_name(&self) -> &str {
        &self.interface_name
    }

    pub fn hardware_address(&self) -> String {
        self.mac.to_string()
    }

    pub fn ipv4(&self) -> Ipv4Addr {
        self.ipv4
    }

    /// Symbolic network role, `dante1` for the first domain and so on.
    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

pub fn find<'a>(inventory: &'a [NetworkInterface], name: &str) -> Option<&'a NetworkInterface> {
    inventory.iter().find(|interface| interface.name == name)
}

/// Returns the inventory interfaces whose name is on the allow-list, in inventory order.
pub fn identify(inventory: &[NetworkInterface], candidates: &[String]) -> Vec<NetworkInterface> {
    let matched: Vec<NetworkInterface> = inventory
        .iter()
        .filter(|interface| candidates.iter().any(|name| *name == interface.name))
        .cloned()
        .collect();

    for interface in &matched {
        info!(interface = %interface.name, ipv4 = ?interface.ipv4, "audio network interface found");
    }
    if matched.is_empty() {
        warn!("no audio network interfaces found");
    }

    matched
}

/// Checks that `name` is present in the inventory and usable for discovery.
pub fn validate(inventory: &[NetworkInterface], name: &str) -> Result<(), SelectionError> {
    let interface =
        find(inventory, name).ok_or_else(|| SelectionError::NotFound(name.to_string()))?;
    check_usable(interface)
}

fn check_usable(interface: &NetworkInterface) -> Result<(), SelectionError> {
    if !interface.is_up {
        return Err(SelectionError::IsDown(interface.name.clone()));
    }
    if !interface.has_ipv4() {
        return Err(SelectionError::NoIpv4Address(interface.name.clone()));
    }
    if !interface.has_hardware_address() {
        return Err(SelectionError::NoMacAddress(interface.name.clone()));
    }
    Ok(())
}

/// Builds the binding for `candidate`, the `ordinal`-th audio domain (0-based).
pub fn build_config(
    candidate: &NetworkInterface,
    ordinal: usize,
) -> Result<BindingConfig, SelectionError> {
    let no_address = || SelectionError::NoIpv4Address(candidate.name.clone());
    let ipv4 = candidate.ipv4.ok_or_else(no_address)?;
    check_usable(candidate)?;
    let mac = candidate
        .mac
        .ok_or_else(|| SelectionError::NoMacAddress(candidate.name.clone()))?;

    Ok(BindingConfig {
        interface_name: candidate.name.clone(),
        mac,
        ipv4,
        role: format!("dante{}", ordinal + 1),
        enabled: candidate.is_up,
    })
}

/// Picks the first allow-listed interface that passes validation.
///
/// When candidates exist but none qualifies, the first candidate's rejection is returned.
pub fn select(
    inventory: &[NetworkInterface],
    candidates: &[String],
) -> Result<BindingConfig, SelectionError> {
    let matched: Vec<NetworkInterface> = identify(inventory, candidates);
    let mut first_rejection: Option<SelectionError> = None;

    for (ordinal, candidate) in matched.iter().enumerate() {
        match validate(inventory, &candidate.name).and_then(|()| build_config(candidate, ordinal)) {
            Ok(binding) => return Ok(binding),
            Err(e) => {
                warn!(interface = %candidate.name, error = %e, "candidate interface rejected");
                first_rejection.get_or_insert(e);
            }
        }
    }

    Err(first_rejection.unwrap_or(SelectionError::NoCandidates))
}

/// Role of an interface in the recommended three-interface host layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainRole {
    Management,
    Domain1,
    Domain2,
}

impl fmt::Display for DomainRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainRole::Management => write!(f, "Management (Telnet)"),
            DomainRole::Domain1 => write!(f, "Dante Domain 1"),
            DomainRole::Domain2 => write!(f, "Dante Domain 2"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutSuggestion {
    /// Fewer than three interfaces are up with an address.
    Insufficient { usable: usize },
    /// Roles for the first three usable interfaces, in inventory order.
    Assignment(Vec<(String, Ipv4Addr, DomainRole)>),
}

pub const REQUIRED_INTERFACES: usize = 3;

/// Advisory only: recommends a management / domain 1 / domain 2 split.
pub fn suggest_layout(inventory: &[NetworkInterface]) -> LayoutSuggestion {
    const ROLES: [DomainRole; REQUIRED_INTERFACES] =
        [DomainRole::Management, DomainRole::Domain1, DomainRole::Domain2];

    let usable: Vec<(&str, Ipv4Addr)> = inventory
        .iter()
        .filter(|interface| interface.is_up)
        .filter_map(|interface| interface.ipv4.map(|ip| (interface.name.as_str(), ip)))
        .collect();

    if usable.len() < REQUIRED_INTERFACES {
        return LayoutSuggestion::Insufficient {
            usable: usable.len(),
        };
    }

    let assignment = usable
        .into_iter()
        .zip(ROLES)
        .map(|((name, ip), role)| (name.to_string(), ip, role))
        .collect();
    LayoutSuggestion::Assignment(assignment)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Isolation {
    Isolated,
    /// Both domains share a /24 prefix; expect broadcast interference.
    SameSegment { prefix: [u8; 3] },
}

/// Compares the /24 prefixes of the first two audio domains.
///
/// Returns `None` when fewer than two domains with an IPv4 address exist.
pub fn check_isolation(domains: &[NetworkInterface]) -> Option<Isolation> {
    let [first, second, ..] = domains else {
        return None;
    };
    let (a, b) = (first.ipv4?.octets(), second.ipv4?.octets());

    if a[..3] == b[..3] {
        warn!(
            first = %first.name,
            second = %second.name,
            "audio domains are on the same network segment"
        );
        Some(Isolation::SameSegment {
            prefix: [a[0], a[1], a[2]],
        })
    } else {
        Some(Isolation::Isolated)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
