use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Mutex;
use std::time::Duration;

use pnet::datalink::{MacAddr, NetworkInterface};
use pnet::ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use scout_common::network::interface::{InterfaceSource, InventoryError};
use scout_common::network::interface::NetworkInterface as InventoryEntry;
use scout_common::network::selector::{BindingConfig, LayoutSuggestion};
use scout_core::session::DeviceReport;
use scout_core::supervisor::Console;

pub const IFF_UP: u32 = 1;
pub const IFF_BROADCAST: u32 = 1 << 1;
pub const IFF_LOOPBACK: u32 = 1 << 3;

pub fn ni(name: &str, index: u32, mac: Option<MacAddr>, ips: &[IpNetwork], flags: u32) -> NetworkInterface {
    NetworkInterface {
        name: name.into(),
        description: "".into(),
        index,
        mac,
        ips: ips.to_vec(),
        flags,
    }
}

pub fn v4(a: u8, b: u8, c: u8, d: u8, p: u8) -> IpNetwork {
    IpNetwork::V4(Ipv4Network::new(Ipv4Addr::new(a, b, c, d), p).unwrap())
}

pub fn v6(s: &str, p: u8) -> IpNetwork {
    IpNetwork::V6(Ipv6Network::new(s.parse::<Ipv6Addr>().unwrap(), p).unwrap())
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|name| name.to_string()).collect()
}

/// Interface source that hands out a fixed list.
pub struct StaticInterfaces(pub Vec<NetworkInterface>);

impl InterfaceSource for StaticInterfaces {
    fn interfaces(&self) -> Result<Vec<NetworkInterface>, InventoryError> {
        Ok(self.0.clone())
    }
}

pub struct FailingInterfaces;

impl InterfaceSource for FailingInterfaces {
    fn interfaces(&self) -> Result<Vec<NetworkInterface>, InventoryError> {
        Err(InventoryError::Enumeration("permission denied".to_string()))
    }
}

/// Console that keeps everything it is asked to show.
#[derive(Default)]
pub struct RecordingConsole {
    pub inventory: Mutex<Vec<InventoryEntry>>,
    pub layouts: Mutex<Vec<LayoutSuggestion>>,
    pub bindings: Mutex<Vec<BindingConfig>>,
    pub settle_delays: Mutex<Vec<Duration>>,
    pub reports: Mutex<Vec<DeviceReport>>,
}

impl Console for RecordingConsole {
    fn show_inventory(&self, inventory: &[InventoryEntry]) {
        *self.inventory.lock().unwrap() = inventory.to_vec();
    }

    fn show_layout(&self, suggestion: &LayoutSuggestion) {
        self.layouts.lock().unwrap().push(suggestion.clone());
    }

    fn show_binding(&self, binding: &BindingConfig) {
        self.bindings.lock().unwrap().push(binding.clone());
    }

    fn waiting_for_devices(&self, delay: Duration) {
        self.settle_delays.lock().unwrap().push(delay);
    }

    fn show_devices(&self, report: &DeviceReport) {
        self.reports.lock().unwrap().push(report.clone());
    }
}

/*************************************************************
                  Mock interfaces for testing
**************************************************************/

pub fn lo() -> NetworkInterface {
    ni(
        "lo",
        1,
        Some(MacAddr::new(0, 0, 0, 0, 0, 0)),
        &[v4(127, 0, 0, 1, 8), v6("::1", 128)],
        IFF_UP | IFF_LOOPBACK,
    )
}

pub fn eth0() -> NetworkInterface {
    ni(
        "eth0",
        2,
        Some(MacAddr::new(0xa8, 0xa1, 0x59, 0x13, 0x41, 0x46)),
        &[v4(192, 168, 1, 5, 24), v6("fe80::b3dd:5c39:7c29:48b6", 64)],
        IFF_UP | IFF_BROADCAST,
    )
}

pub fn dante0() -> NetworkInterface {
    ni(
        "dante0",
        3,
        Some(MacAddr::new(0xf8, 0xe4, 0x3b, 0xd6, 0x30, 0x9e)),
        &[v6("fe80::fae4:3bff:fed6:309e", 64), v4(10, 1, 0, 2, 16)],
        IFF_UP | IFF_BROADCAST,
    )
}

pub fn dante1() -> NetworkInterface {
    ni(
        "dante1",
        4,
        Some(MacAddr::new(0xf8, 0xe4, 0x3b, 0xd5, 0x5d, 0xf6)),
        &[v4(10, 2, 0, 2, 16)],
        IFF_UP | IFF_BROADCAST,
    )
}

pub fn dante_down() -> NetworkInterface {
    ni(
        "dante9",
        5,
        Some(MacAddr::new(0x02, 0x42, 0xac, 0x11, 0x00, 0x01)),
        &[v4(10, 9, 0, 2, 16)],
        IFF_BROADCAST,
    )
}

pub fn tun0() -> NetworkInterface {
    ni(
        "tun0",
        6,
        None,
        &[v4(10, 96, 0, 57, 16), v6("fe80::c137:8964:5a63:efde", 64)],
        IFF_UP,
    )
}

pub fn veth1234() -> NetworkInterface {
    ni(
        "veth1234",
        7,
        Some(MacAddr::new(0x1a, 0x2b, 0x3c, 0x4d, 0x5e, 0x6f)),
        &[v6("fe80::1a2b:3cff:fe4d:5e6f", 64)],
        IFF_UP | IFF_BROADCAST,
    )
}
