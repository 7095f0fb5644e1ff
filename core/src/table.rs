//! # Device Table
//!
//! A bounded, ordered list of the devices found by one rebuild pass.
//!
//! Published tables are immutable. A rebuild assembles a fresh table with a
//! [`TableBuilder`] and the keeper swaps the shared `Arc` in one step, so a
//! reader holding a snapshot always sees entries from a single pass.

use std::net::Ipv4Addr;
use std::sync::Arc;

use tokio::sync::watch;

/// Link speed sentinel for devices whose speed is not known.
pub const LINK_SPEED_UNKNOWN: i32 = -1;

/// Product version reported for remotely discovered devices.
pub const PRODUCT_VERSION_UNAVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    /// 1-based ordinal, only meaningful within the table that holds it.
    pub id: u32,
    pub name: String,
    pub model: String,
    pub protocol_version: String,
    pub product_version: String,
    /// `0.0.0.0` when the address could not be resolved.
    pub ip_address: Ipv4Addr,
    pub link_speed: i32,
    pub secondary_ip: String,
    pub secondary_speed: i32,
    pub mac_address: String,
    pub valid: bool,
}

impl DiscoveredDevice {
    pub fn is_resolved(&self) -> bool {
        !self.ip_address.is_unspecified()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceTable {
    devices: Vec<DiscoveredDevice>,
    capacity: usize,
    dropped: usize,
    generation: u64,
}

impl DeviceTable {
    /// An empty table, as published before the first rebuild.
    pub fn empty(capacity: usize) -> Self {
        Self {
            devices: Vec::new(),
            capacity,
            dropped: 0,
            generation: 0,
        }
    }

    pub fn count(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Device at the 0-based `index`, or `None` when out of range or not valid.
    pub fn at(&self, index: usize) -> Option<&DiscoveredDevice> {
        self.devices.get(index).filter(|device| device.valid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiscoveredDevice> {
        self.devices.iter().filter(|device| device.valid)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Announcements the last rebuild could not store because the table was full.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Number of the rebuild pass that produced this table, `0` for the initial empty table.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Append-only assembly of the next table.
#[derive(Debug)]
pub struct TableBuilder {
    devices: Vec<DiscoveredDevice>,
    capacity: usize,
    dropped: usize,
}

impl TableBuilder {
    pub fn new(capacity: usize) -> Self {
        Self {
            devices: Vec::new(),
            capacity,
            dropped: 0,
        }
    }

    /// Reserves room for `announced` more devices, never past the table's capacity.
    pub fn reserve(&mut self, announced: usize) {
        let room = self.capacity.saturating_sub(self.devices.len());
        self.devices.reserve(announced.min(room));
    }

    /// Ordinal the next pushed device should carry.
    pub fn next_id(&self) -> u32 {
        u32::try_from(self.devices.len()).map_or(u32::MAX, |len| len.saturating_add(1))
    }

    pub fn is_full(&self) -> bool {
        self.devices.len() >= self.capacity
    }

    /// Appends `device`. Invalid devices are discarded and a full table counts the overflow.
    pub fn push(&mut self, device: DiscoveredDevice) {
        if !device.valid {
            return;
        }
        if self.is_full() {
            self.dropped += 1;
            return;
        }
        self.devices.push(device);
    }

    /// Records announcements skipped without being resolved.
    pub fn record_dropped(&mut self, count: usize) {
        self.dropped += count;
    }

    pub fn finish(self, generation: u64) -> DeviceTable {
        DeviceTable {
            devices: self.devices,
            capacity: self.capacity,
            dropped: self.dropped,
            generation,
        }
    }
}

/// Read side of the published table.
///
/// Cloning is cheap; every clone observes the same stream of snapshots.
#[derive(Debug, Clone)]
pub struct TableReader {
    receiver: watch::Receiver<Arc<DeviceTable>>,
}

impl TableReader {
    pub(crate) fn new(receiver: watch::Receiver<Arc<DeviceTable>>) -> Self {
        Self { receiver }
    }

    /// The most recently published table.
    pub fn snapshot(&self) -> Arc<DeviceTable> {
        self.receiver.borrow().clone()
    }

    /// Waits for the next published table.
    ///
    /// Returns `None` once the publisher has gone away.
    pub async fn changed(&mut self) -> Option<Arc<DeviceTable>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
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
