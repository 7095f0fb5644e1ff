//! # Discovery Session
//!
//! Drives one discovery domain through its lifecycle:
//!
//! ```text
//! Uninitialized → Initializing → Ready → Scanning ⇄ Refreshing → Stopped
//! ```
//!
//! The session owns its discovery backend, the table keeper and the event
//! ticker. `Stopped` is terminal; a new session is needed to start over.

use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use scout_common::config::{Config, ResolveSettings};
use scout_common::network::selector::BindingConfig;
use scout_common::success;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::{DiscoveryBackend, ServiceFault};
use crate::keeper::{TableKeeper, TableNotifier};
use crate::table::{DeviceTable, DiscoveredDevice, TableReader};
use crate::ticker::EventTicker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready,
    Scanning,
    Refreshing,
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Initializing => "initializing",
            SessionState::Ready => "ready",
            SessionState::Scanning => "scanning",
            SessionState::Refreshing => "refreshing",
            SessionState::Stopped => "stopped",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The discovery service rejected an operation; `message` is its last error.
    #[error("failed to {op}: {message}")]
    Service { op: &'static str, message: String },
    #[error("cannot {op} while the session is {state}")]
    Precondition {
        op: &'static str,
        state: SessionState,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub table_capacity: usize,
    pub tick_interval: Duration,
    pub resolve: ResolveSettings,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            table_capacity: config.table_capacity,
            tick_interval: config.tick_interval,
            resolve: config.resolve,
        }
    }
}

pub struct DiscoverySession {
    name: String,
    backend: Arc<dyn DiscoveryBackend>,
    settings: SessionSettings,
    state: SessionState,
    binding: Option<BindingConfig>,
    device_count: usize,
    publisher: Option<watch::Sender<Arc<DeviceTable>>>,
    reader: TableReader,
    notifier: Option<TableNotifier>,
    keeper: Option<JoinHandle<()>>,
    ticker: Option<EventTicker>,
}

impl DiscoverySession {
    pub fn new(
        name: impl Into<String>,
        backend: Arc<dyn DiscoveryBackend>,
        settings: SessionSettings,
    ) -> Self {
        let (publisher, receiver) =
            watch::channel(Arc::new(DeviceTable::empty(settings.table_capacity)));

        Self {
            name: name.into(),
            backend,
            settings,
            state: SessionState::Uninitialized,
            binding: None,
            device_count: 0,
            publisher: Some(publisher),
            reader: TableReader::new(receiver),
            notifier: None,
            keeper: None,
            ticker: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn binding(&self) -> Option<&BindingConfig> {
        self.binding.as_ref()
    }

    /// Device count recorded by the last refresh.
    pub fn device_count(&self) -> usize {
        self.device_count
    }

    /// Read access to the published device table.
    pub fn table(&self) -> TableReader {
        self.reader.clone()
    }

    /// Binds the discovery service to the selected interface.
    ///
    /// A failure is fatal for the session: backend resources are released and the
    /// session ends up `Stopped`.
    pub fn initialize(&mut self, binding: &BindingConfig) -> Result<(), SessionError> {
        self.require("initialize", &[SessionState::Uninitialized])?;
        self.state = SessionState::Initializing;
        info!(
            domain = %self.name,
            interface = %binding.interface_name(),
            ip = %binding.ipv4(),
            "initializing discovery domain"
        );

        if let Err(fault) = self.backend.init_with_interface(binding.interface_name()) {
            let message = self.service_message(fault);
            self.backend.release();
            self.state = SessionState::Stopped;
            return Err(SessionError::Service {
                op: "initialize discovery service",
                message,
            });
        }

        self.binding = Some(binding.clone());
        self.state = SessionState::Ready;
        success!(domain = %self.name, "discovery domain ready for network scanning");
        Ok(())
    }

    /// Starts browsing and the background event ticker.
    ///
    /// Must be called from within a tokio runtime. On failure the session stays `Ready`.
    pub fn start_scan(&mut self) -> Result<(), SessionError> {
        self.require("start scan", &[SessionState::Ready])?;
        info!(
            domain = %self.name,
            interface = %self.interface_name(),
            "starting device scan"
        );

        let (notifier, inbox) = TableNotifier::channel();
        self.backend.set_network_changed_callback(notifier.callback());

        if let Err(fault) = self.backend.start_browse() {
            return Err(SessionError::Service {
                op: "start browsing",
                message: self.service_message(fault),
            });
        }

        let publisher = match self.publisher.take() {
            Some(publisher) => publisher,
            None => {
                self.backend.stop_browse();
                return Err(SessionError::Precondition {
                    op: "start scan",
                    state: self.state,
                });
            }
        };

        let keeper = TableKeeper::new(
            self.backend.clone(),
            self.settings.resolve,
            self.settings.table_capacity,
            inbox,
            publisher,
        );
        self.keeper = Some(keeper.spawn());
        self.notifier = Some(notifier);
        self.ticker = Some(EventTicker::spawn(
            self.backend.clone(),
            self.settings.tick_interval,
        ));
        self.state = SessionState::Scanning;
        success!(domain = %self.name, "device scan started");
        Ok(())
    }

    /// Rebuilds the table now and records the resulting device count.
    ///
    /// Before scanning has started this is a no-op that returns the last count. A
    /// rebuild that cannot complete leaves the previous count in place.
    pub async fn refresh(&mut self) -> Result<usize, SessionError> {
        self.require(
            "refresh",
            &[
                SessionState::Ready,
                SessionState::Scanning,
                SessionState::Refreshing,
            ],
        )?;
        let Some(notifier) = self.notifier.clone() else {
            debug!(domain = %self.name, "not scanning, keeping last device count");
            return Ok(self.device_count);
        };

        self.state = SessionState::Refreshing;
        info!(domain = %self.name, "refreshing device list");
        match notifier.rebuild_now().await {
            Some(table) => self.device_count = table.count(),
            None => debug!(domain = %self.name, "refresh not served, keeping stale table"),
        }
        self.state = SessionState::Scanning;

        info!(domain = %self.name, devices = self.device_count, "found devices");
        Ok(self.device_count)
    }

    /// Read-only view of the current table, limited to the last refreshed count.
    pub fn show_devices(&self) -> DeviceReport {
        let table = self.reader.snapshot();
        let devices = (0..self.device_count)
            .filter_map(|index| table.at(index))
            .cloned()
            .collect();

        DeviceReport {
            domain: self.name.clone(),
            interface: self.interface_name().to_string(),
            ip: self.binding.as_ref().map(BindingConfig::ipv4),
            total: self.device_count,
            devices,
        }
    }

    /// Stops the ticker, browsing and the keeper, then releases the backend.
    ///
    /// Idempotent and valid in every state. An in-flight rebuild is abandoned after
    /// the device it is resolving, so this waits for at most one handshake.
    pub async fn shutdown(&mut self) {
        if self.state == SessionState::Stopped {
            return;
        }
        let was_scanning = matches!(
            self.state,
            SessionState::Scanning | SessionState::Refreshing
        );
        let was_initialized = self.state != SessionState::Uninitialized;
        info!(domain = %self.name, state = %self.state, "shutting down discovery domain");

        if let Some(ticker) = self.ticker.take() {
            ticker.stop().await;
        }
        if was_scanning {
            self.backend.stop_browse();
        }
        // The keeper may still be resolving a device, so the browse handle and the
        // service stay alive until it has exited.
        if let Some(notifier) = self.notifier.take() {
            notifier.stop();
        }
        if let Some(keeper) = self.keeper.take() {
            if let Err(e) = keeper.await {
                warn!(domain = %self.name, error = %e, "table keeper ended abnormally");
            }
        }
        if was_scanning {
            self.backend.delete_browse();
        }
        if was_initialized {
            self.backend.release();
        }

        self.state = SessionState::Stopped;
        info!(domain = %self.name, "discovery domain stopped");
    }

    fn require(&self, op: &'static str, allowed: &[SessionState]) -> Result<(), SessionError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SessionError::Precondition {
                op,
                state: self.state,
            })
        }
    }

    fn service_message(&self, fault: ServiceFault) -> String {
        let message = self.backend.last_error();
        if message.is_empty() {
            fault.to_string()
        } else {
            message
        }
    }

    fn interface_name(&self) -> &str {
        self.binding
            .as_ref()
            .map(BindingConfig::interface_name)
            .unwrap_or_default()
    }
}

impl Drop for DiscoverySession {
    fn drop(&mut self) {
        if self.state != SessionState::Stopped {
            debug!(domain = %self.name, "session dropped without shutdown");
        }
        if let Some(notifier) = self.notifier.take() {
            notifier.stop();
        }
    }
}

/// Snapshot of a domain's devices for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceReport {
    pub domain: String,
    pub interface: String,
    pub ip: Option<Ipv4Addr>,
    pub total: usize,
    pub devices: Vec<DiscoveredDevice>,
}

impl fmt::Display for DeviceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ip = self.ip.map(|ip| ip.to_string()).unwrap_or_default();
        writeln!(f, "=== {} Device List ===", self.domain)?;
        writeln!(f, "Interface: {} ({})", self.interface, ip)?;
        writeln!(f, "Total Devices: {}", self.total)?;

        if !self.devices.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "{:<3} {:<20} {:<16} {:<16} {:<17} {}",
                "ID", "Name", "Model", "IP Address", "MAC Address", "Dante Ver"
            )?;
            writeln!(f, "{}", "─".repeat(89))?;
            for device in &self.devices {
                writeln!(
                    f,
                    "{:<3} {:<20} {:<16} {:<16} {:<17} {}",
                    device.id,
                    device.name,
                    device.model,
                    device.ip_address.to_string(),
                    device.mac_address,
                    device.protocol_version
                )?;
            }
        }

        write!(f, "{}", "=".repeat(26))
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
