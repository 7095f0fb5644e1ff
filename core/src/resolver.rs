//! # Device Resolver
//!
//! Turns the discovery service's current view of the network into a new
//! [`DeviceTable`]. Each announced device is described from its metadata and its
//! transport address is resolved through a short, bounded polling handshake over
//! a routing connection.
//!
//! Resolution is sequential: a device that never resolves holds up the pass for
//! at most [`ResolveSettings::budget`].

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};

use scout_common::config::ResolveSettings;
use tracing::{debug, info, warn};

use crate::backend::{
    Announcement, ConnectionHandle, ConnectionState, DiscoveryBackend, ServiceFault,
};
use crate::table::{
    DeviceTable, DiscoveredDevice, LINK_SPEED_UNKNOWN, PRODUCT_VERSION_UNAVAILABLE, TableBuilder,
};

pub const UNKNOWN_MODEL: &str = "Unknown Model";
pub const UNKNOWN_VERSION: &str = "Unknown";

/// How the address handshake for one device ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressOutcome {
    Resolved(Ipv4Addr),
    /// The connection resolved but the service would not hand out the address.
    AddressLookupFailed,
    /// The connection entered the error state.
    DeviceError,
    /// No terminal state was reached within the attempt budget.
    Exhausted { attempts: u32 },
    /// The routing connection could not be opened.
    OpenFailed,
    /// The device announced no name, so there was nothing to connect to.
    Unnamed,
}

impl AddressOutcome {
    /// The resolved address, or `0.0.0.0` for every other outcome.
    pub fn address(&self) -> Ipv4Addr {
        match self {
            AddressOutcome::Resolved(address) => *address,
            _ => Ipv4Addr::UNSPECIFIED,
        }
    }
}

/// A routing connection that is closed when dropped.
struct RemoteConnection<'a> {
    backend: &'a dyn DiscoveryBackend,
    handle: ConnectionHandle,
}

impl<'a> RemoteConnection<'a> {
    fn open(backend: &'a dyn DiscoveryBackend, name: &str) -> Result<Self, ServiceFault> {
        let handle = backend.open_remote(name)?;
        Ok(Self { backend, handle })
    }

    fn state(&self) -> ConnectionState {
        self.backend.connection_state(self.handle)
    }

    fn address(&self) -> Result<Ipv4Addr, ServiceFault> {
        self.backend.resolved_address(self.handle).map(Ipv4Addr::from)
    }
}

impl Drop for RemoteConnection<'_> {
    fn drop(&mut self) {
        self.backend.close_connection(self.handle);
    }
}

/// Name shown for a device, synthesized from its ordinal when none was announced.
pub fn display_name(announcement: &Announcement, id: u32) -> String {
    announced_name(announcement)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Unknown Device {id}"))
}

/// First match wins: router info, manufacturer and model ids, default name.
pub fn model_label(announcement: &Announcement) -> String {
    if let Some(router_info) = non_empty(&announcement.router_info) {
        return router_info.to_string();
    }
    if let (Some(manufacturer), Some(model)) = (announcement.manufacturer_id, announcement.model_id)
    {
        return format!("{manufacturer}-{model}");
    }
    if let Some(default_name) = non_empty(&announcement.default_name) {
        return default_name.to_string();
    }
    UNKNOWN_MODEL.to_string()
}

pub fn protocol_version(announcement: &Announcement) -> String {
    announcement
        .router_version
        .map(|version| version.to_string())
        .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
}

fn announced_name(announcement: &Announcement) -> Option<&str> {
    non_empty(&announcement.name)
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

/// Resolves the transport address of the device announced as `name`.
///
/// Polls the connection state every `poll_interval` for at most `max_attempts`
/// attempts, pumping the service's event step between polls. The routing
/// connection is closed on every path.
pub async fn resolve_address(
    backend: &dyn DiscoveryBackend,
    name: &str,
    settings: &ResolveSettings,
) -> AddressOutcome {
    debug!(device = %name, "getting address through routing connection");

    let connection = match RemoteConnection::open(backend, name) {
        Ok(connection) => connection,
        Err(fault) => {
            warn!(
                device = %name,
                status = fault.code,
                error = %backend.last_error(),
                "failed to open routing connection"
            );
            return AddressOutcome::OpenFailed;
        }
    };

    for attempt in 1..=settings.max_attempts {
        match connection.state() {
            ConnectionState::Resolved | ConnectionState::Active => {
                debug!(device = %name, attempt, "device resolved");
                return match connection.address() {
                    Ok(address) => {
                        info!(device = %name, ip = %address, "device address resolved");
                        AddressOutcome::Resolved(address)
                    }
                    Err(fault) => {
                        warn!(
                            device = %name,
                            status = fault.code,
                            error = %backend.last_error(),
                            "failed to get device address"
                        );
                        AddressOutcome::AddressLookupFailed
                    }
                };
            }
            ConnectionState::Error => {
                warn!(device = %name, attempt, "device entered error state");
                return AddressOutcome::DeviceError;
            }
            ConnectionState::Unresolved | ConnectionState::Resolving => {
                backend.process_events();
                tokio::time::sleep(settings.poll_interval).await;
            }
        }
    }

    warn!(
        device = %name,
        attempts = settings.max_attempts,
        "device did not resolve in time"
    );
    AddressOutcome::Exhausted {
        attempts: settings.max_attempts,
    }
}

/// Builds the table entry for one announcement.
pub async fn describe(
    backend: &dyn DiscoveryBackend,
    id: u32,
    announcement: &Announcement,
    settings: &ResolveSettings,
) -> DiscoveredDevice {
    let outcome = match announced_name(announcement) {
        Some(name) => resolve_address(backend, name, settings).await,
        None => {
            debug!(id, "device announced without a name, skipping address resolution");
            AddressOutcome::Unnamed
        }
    };

    DiscoveredDevice {
        id,
        name: display_name(announcement, id),
        model: model_label(announcement),
        protocol_version: protocol_version(announcement),
        product_version: PRODUCT_VERSION_UNAVAILABLE.to_string(),
        ip_address: outcome.address(),
        link_speed: LINK_SPEED_UNKNOWN,
        secondary_ip: String::new(),
        secondary_speed: LINK_SPEED_UNKNOWN,
        mac_address: String::new(),
        valid: true,
    }
}

/// A rebuild pass abandoned because the keeper is stopping.
///
/// Carries the devices described so far; callers must not publish it.
#[derive(Debug)]
pub struct Interrupted(pub DeviceTable);

/// Runs one full rebuild pass against the service's current network snapshot.
///
/// A missing snapshot yields an empty table. Announcements past `capacity` are
/// dropped without being resolved and counted in [`DeviceTable::dropped`].
pub async fn rebuild(
    backend: &dyn DiscoveryBackend,
    settings: &ResolveSettings,
    capacity: usize,
    generation: u64,
) -> DeviceTable {
    let never = AtomicBool::new(false);
    rebuild_until(backend, settings, capacity, generation, &never)
        .await
        .unwrap_or_else(|Interrupted(partial)| partial)
}

/// Like [`rebuild`], but gives up between devices once `stop` is set.
///
/// A device whose handshake already started is always finished first.
pub async fn rebuild_until(
    backend: &dyn DiscoveryBackend,
    settings: &ResolveSettings,
    capacity: usize,
    generation: u64,
    stop: &AtomicBool,
) -> Result<DeviceTable, Interrupted> {
    let mut builder = TableBuilder::new(capacity);

    let Some(snapshot) = backend.network_snapshot() else {
        debug!("no network snapshot available");
        return Ok(builder.finish(generation));
    };

    let announced = snapshot.device_count();
    builder.reserve(announced);
    for index in 0..announced {
        if stop.load(Ordering::Acquire) {
            debug!(index, announced, "rebuild interrupted");
            return Err(Interrupted(builder.finish(generation)));
        }
        if builder.is_full() {
            builder.record_dropped(announced - index);
            break;
        }
        let Some(announcement) = snapshot.device_at(index) else {
            debug!(index, "device entry unavailable, skipping");
            continue;
        };
        let id = builder.next_id();
        builder.push(describe(backend, id, &announcement, settings).await);
    }

    let table = builder.finish(generation);
    if table.dropped() > 0 {
        warn!(
            announced,
            capacity,
            dropped = table.dropped(),
            "device table full, extra devices dropped"
        );
    }
    info!(devices = table.count(), "device list updated");
    Ok(table)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
