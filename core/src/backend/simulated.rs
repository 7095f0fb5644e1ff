//! In-process stand-in for the vendor discovery service.
//!
//! Devices and their resolution behaviour are scripted up front; the backend then
//! answers browse, snapshot and routing calls the way the real service would and
//! counts what it was asked to do.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{
    Announcement, ChangeCallback, ConnectionHandle, ConnectionState, DiscoveryBackend, Id64,
    NetworkSnapshot, RouterVersion, ServiceFault,
};

/// How a device's routing connection behaves once opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveScript {
    /// Reports `Resolving` for `polls` state queries, then `Resolved` with `address`.
    After { polls: u32, address: Ipv4Addr },
    /// Never leaves `Resolving`.
    Never,
    /// Reports `Resolving` for `polls` state queries, then `Error`.
    FailsAfter { polls: u32 },
    /// `open_remote` is refused.
    OpenFails,
    /// Resolves immediately but the address lookup fails.
    AddressFails,
}

#[derive(Debug, Clone)]
pub struct SimulatedDevice {
    pub announcement: Announcement,
    pub script: ResolveScript,
    /// `false` when the snapshot lists the device but has no readable entry for it.
    pub available: bool,
}

impl SimulatedDevice {
    pub fn named(name: &str, script: ResolveScript) -> Self {
        Self::anonymous(script).with_name(name)
    }

    pub fn anonymous(script: ResolveScript) -> Self {
        Self {
            announcement: Announcement::default(),
            script,
            available: true,
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.announcement.name = Some(name.to_string());
        self
    }

    pub fn with_router_info(mut self, router_info: &str) -> Self {
        self.announcement.router_info = Some(router_info.to_string());
        self
    }

    pub fn with_ids(mut self, manufacturer: Id64, model: Id64) -> Self {
        self.announcement.manufacturer_id = Some(manufacturer);
        self.announcement.model_id = Some(model);
        self
    }

    pub fn with_default_name(mut self, default_name: &str) -> Self {
        self.announcement.default_name = Some(default_name.to_string());
        self
    }

    pub fn with_version(mut self, major: u8, minor: u8, bugfix: u16) -> Self {
        self.announcement.router_version = Some(RouterVersion {
            major,
            minor,
            bugfix,
        });
        self
    }
}

/// Call counters, useful for asserting on how the service was driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulatedStats {
    pub opened: usize,
    pub closed: usize,
    pub state_polls: usize,
    pub event_steps: usize,
    pub snapshots: usize,
}

struct OpenConnection {
    script: ResolveScript,
    polls: u32,
}

#[derive(Default)]
struct SimState {
    devices: Vec<SimulatedDevice>,
    interface: Option<String>,
    init_failure: Option<String>,
    browse_failure: Option<String>,
    browsing: bool,
    pending_change: bool,
    callback: Option<Arc<dyn Fn() + Send + Sync>>,
    connections: HashMap<ConnectionHandle, OpenConnection>,
    next_handle: u64,
    last_error: String,
    stats: SimulatedStats,
}

impl SimState {
    fn fail(&mut self, code: i32, message: impl Into<String>) -> ServiceFault {
        self.last_error = message.into();
        ServiceFault { code }
    }
}

struct SimulatedSnapshot(Vec<Option<Announcement>>);

impl NetworkSnapshot for SimulatedSnapshot {
    fn device_count(&self) -> usize {
        self.0.len()
    }

    fn device_at(&self, index: usize) -> Option<Announcement> {
        self.0.get(index).cloned().flatten()
    }
}

pub struct SimulatedBackend {
    state: Mutex<SimState>,
}

impl SimulatedBackend {
    pub fn new(devices: Vec<SimulatedDevice>) -> Self {
        Self {
            state: Mutex::new(SimState {
                devices,
                ..SimState::default()
            }),
        }
    }

    /// A small audio network used by the command line when no vendor service is linked in.
    pub fn demo() -> Self {
        Self::new(vec![
            SimulatedDevice::named(
                "Stagebox-32",
                ResolveScript::After {
                    polls: 3,
                    address: Ipv4Addr::new(10, 1, 0, 10),
                },
            )
            .with_router_info("ULTIMOX4")
            .with_version(4, 2, 1),
            SimulatedDevice::named(
                "FOH-Console",
                ResolveScript::After {
                    polls: 1,
                    address: Ipv4Addr::new(10, 1, 0, 11),
                },
            )
            .with_ids(Id64([0, 0x1d, 0xc1, 0, 0, 0, 0, 0x01]), Id64([0, 0, 0, 0, 0, 0, 0x02, 0x10]))
            .with_version(4, 1, 3),
            SimulatedDevice::named("Amp-Rack-L", ResolveScript::Never)
                .with_default_name("DAD-AVIO-2CH")
                .with_version(1, 0, 7),
        ])
    }

    /// Makes `init_with_interface` fail with `message`.
    pub fn failing_init(mut self, message: &str) -> Self {
        self.state_mut().init_failure = Some(message.to_string());
        self
    }

    /// Makes `start_browse` fail with `message`.
    pub fn failing_browse(mut self, message: &str) -> Self {
        self.state_mut().browse_failure = Some(message.to_string());
        self
    }

    /// Replaces the announced devices and schedules a change notification.
    pub fn set_devices(&self, devices: Vec<SimulatedDevice>) {
        let mut state = self.lock();
        state.devices = devices;
        state.pending_change = true;
    }

    /// Schedules a change notification for the next event step.
    pub fn announce_change(&self) {
        self.lock().pending_change = true;
    }

    pub fn stats(&self) -> SimulatedStats {
        self.lock().stats
    }

    pub fn open_connections(&self) -> usize {
        self.lock().connections.len()
    }

    pub fn is_browsing(&self) -> bool {
        self.lock().browsing
    }

    pub fn interface(&self) -> Option<String> {
        self.lock().interface.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&mut self) -> &mut SimState {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DiscoveryBackend for SimulatedBackend {
    fn init_with_interface(&self, interface: &str) -> Result<(), ServiceFault> {
        let mut state = self.lock();
        if let Some(message) = state.init_failure.clone() {
            return Err(state.fail(-1, message));
        }
        state.interface = Some(interface.to_string());
        Ok(())
    }

    fn last_error(&self) -> String {
        self.lock().last_error.clone()
    }

    fn set_network_changed_callback(&self, callback: ChangeCallback) {
        self.lock().callback = Some(Arc::from(callback));
    }

    fn start_browse(&self) -> Result<(), ServiceFault> {
        let mut state = self.lock();
        if state.interface.is_none() {
            return Err(state.fail(-1, "service not initialized"));
        }
        if let Some(message) = state.browse_failure.clone() {
            return Err(state.fail(-1, message));
        }
        if !state.browsing {
            state.browsing = true;
            state.pending_change = true;
        }
        Ok(())
    }

    fn stop_browse(&self) {
        self.lock().browsing = false;
    }

    fn delete_browse(&self) {
        let mut state = self.lock();
        state.browsing = false;
        state.pending_change = false;
        state.callback = None;
    }

    fn network_snapshot(&self) -> Option<Box<dyn NetworkSnapshot>> {
        let mut state = self.lock();
        state.stats.snapshots += 1;
        if !state.browsing {
            return None;
        }
        let entries = state
            .devices
            .iter()
            .map(|device| device.available.then(|| device.announcement.clone()))
            .collect();
        Some(Box::new(SimulatedSnapshot(entries)))
    }

    fn open_remote(&self, name: &str) -> Result<ConnectionHandle, ServiceFault> {
        let mut state = self.lock();
        if state.interface.is_none() {
            return Err(state.fail(-1, "service not initialized"));
        }
        let script = state
            .devices
            .iter()
            .find(|device| device.announcement.name.as_deref() == Some(name))
            .map(|device| device.script);

        match script {
            None => Err(state.fail(-2, format!("no device named '{name}'"))),
            Some(ResolveScript::OpenFails) => {
                Err(state.fail(-3, format!("failed to open routing connection to '{name}'")))
            }
            Some(script) => {
                state.next_handle += 1;
                let handle = ConnectionHandle(state.next_handle);
                state
                    .connections
                    .insert(handle, OpenConnection { script, polls: 0 });
                state.stats.opened += 1;
                Ok(handle)
            }
        }
    }

    fn connection_state(&self, handle: ConnectionHandle) -> ConnectionState {
        let mut state = self.lock();
        state.stats.state_polls += 1;
        let Some(connection) = state.connections.get_mut(&handle) else {
            return ConnectionState::Error;
        };
        connection.polls += 1;

        match connection.script {
            ResolveScript::After { polls, .. } if connection.polls > polls => {
                ConnectionState::Resolved
            }
            ResolveScript::FailsAfter { polls } if connection.polls > polls => {
                ConnectionState::Error
            }
            ResolveScript::AddressFails => ConnectionState::Resolved,
            ResolveScript::OpenFails => ConnectionState::Error,
            _ => ConnectionState::Resolving,
        }
    }

    fn resolved_address(&self, handle: ConnectionHandle) -> Result<u32, ServiceFault> {
        let mut state = self.lock();
        let resolved = state.connections.get(&handle).and_then(|connection| {
            match connection.script {
                ResolveScript::After { polls, address } if connection.polls > polls => {
                    Some(address)
                }
                _ => None,
            }
        });

        match resolved {
            Some(address) => Ok(u32::from(address)),
            None => Err(state.fail(-4, "device address not available")),
        }
    }

    fn close_connection(&self, handle: ConnectionHandle) {
        let mut state = self.lock();
        if state.connections.remove(&handle).is_some() {
            state.stats.closed += 1;
        }
    }

    fn process_events(&self) {
        let callback = {
            let mut state = self.lock();
            state.stats.event_steps += 1;
            if state.browsing && state.pending_change {
                state.pending_change = false;
                state.callback.clone()
            } else {
                None
            }
        };

        if let Some(callback) = callback {
            callback();
        }
    }

    fn release(&self) {
        let mut state = self.lock();
        state.browsing = false;
        state.pending_change = false;
        state.callback = None;
        state.connections.clear();
        state.interface = None;
    }
}
