//! The **port** to the vendor discovery and transport service.
//!
//! The service itself is a black box: it browses the audio network, keeps its own
//! view of announced devices, opens per-device routing connections and needs to be
//! pumped regularly through [`DiscoveryBackend::process_events`].
//!
//! **Architectural Note:**
//! There is no process-wide state behind this trait. Each backend value is its own
//! context and is owned by exactly one [`DiscoverySession`](crate::session::DiscoverySession),
//! so several independent sessions can coexist.

use std::fmt;

use thiserror::Error;

pub mod simulated;

/// Invoked by the service whenever its view of the network changes.
///
/// Called from inside the service's event processing, so it must not block.
pub type ChangeCallback = Box<dyn Fn() + Send + Sync>;

/// Raw failure status returned by a service entry point.
///
/// The human readable cause is available from [`DiscoveryBackend::last_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("service returned status {code}")]
pub struct ServiceFault {
    pub code: i32,
}

/// Opaque routing connection handle issued by [`DiscoveryBackend::open_remote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionHandle(pub u64);

/// Progress of a routing connection towards a usable transport address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unresolved,
    Resolving,
    Resolved,
    Active,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterVersion {
    pub major: u8,
    pub minor: u8,
    pub bugfix: u16,
}

impl fmt::Display for RouterVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.bugfix)
    }
}

/// 64-bit manufacturer or model identifier, rendered as its DNS-SD text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id64(pub [u8; 8]);

impl fmt::Display for Id64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|byte| write!(f, "{byte:02x}"))
    }
}

/// What the service knows about one announced device. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Announcement {
    pub name: Option<String>,
    pub router_info: Option<String>,
    pub manufacturer_id: Option<Id64>,
    pub model_id: Option<Id64>,
    pub default_name: Option<String>,
    pub router_version: Option<RouterVersion>,
}

/// Point-in-time view of the announced devices.
pub trait NetworkSnapshot: Send {
    fn device_count(&self) -> usize;

    /// `None` when the service has no usable entry at `index`.
    fn device_at(&self, index: usize) -> Option<Announcement>;
}

impl NetworkSnapshot for Vec<Announcement> {
    fn device_count(&self) -> usize {
        self.len()
    }

    fn device_at(&self, index: usize) -> Option<Announcement> {
        self.get(index).cloned()
    }
}

pub trait DiscoveryBackend: Send + Sync {
    /// Prepares the service to browse on the named interface.
    fn init_with_interface(&self, interface: &str) -> Result<(), ServiceFault>;

    /// Message describing the most recent failure.
    fn last_error(&self) -> String;

    fn set_network_changed_callback(&self, callback: ChangeCallback);

    fn start_browse(&self) -> Result<(), ServiceFault>;
    fn stop_browse(&self);
    fn delete_browse(&self);

    /// `None` while the service has no network view, e.g. before browsing started.
    fn network_snapshot(&self) -> Option<Box<dyn NetworkSnapshot>>;

    fn open_remote(&self, name: &str) -> Result<ConnectionHandle, ServiceFault>;
    fn connection_state(&self, handle: ConnectionHandle) -> ConnectionState;

    /// Resolved IPv4 address in host order.
    fn resolved_address(&self, handle: ConnectionHandle) -> Result<u32, ServiceFault>;
    fn close_connection(&self, handle: ConnectionHandle);

    /// Advances the service's protocol state machines by one short step.
    ///
    /// May invoke the network-changed callback.
    fn process_events(&self);

    /// Releases every resource held by the service. Safe to call more than once.
    fn release(&self);
}
