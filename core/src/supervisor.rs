//! # Session Supervisor
//!
//! Runs the whole discovery flow for one domain: inventory, interface
//! selection, session start, an initial settle period and then a periodic
//! refresh and report until the shutdown signal fires.
//!
//! Presentation is delegated to a [`Console`], so the same flow drives the
//! terminal front end and the scenario tests.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use scout_common::config::Config;
use scout_common::network::interface::{self, InterfaceSource, InventoryError, NetworkInterface};
use scout_common::network::selector::{self, BindingConfig, LayoutSuggestion, SelectionError};
use thiserror::Error;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::backend::DiscoveryBackend;
use crate::session::{DeviceReport, DiscoverySession, SessionError, SessionSettings};

/// Fatal conditions that abort the supervisor before steady state.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Where the supervisor sends what the user should see.
pub trait Console {
    fn show_inventory(&self, inventory: &[NetworkInterface]);
    /// Advisory only; shown even when the layout is insufficient.
    fn show_layout(&self, suggestion: &LayoutSuggestion);
    fn show_binding(&self, binding: &BindingConfig);
    /// Called once before the settle delay starts.
    fn waiting_for_devices(&self, delay: Duration);
    fn show_devices(&self, report: &DeviceReport);
}

pub struct Supervisor<C> {
    config: Config,
    console: C,
}

impl<C: Console> Supervisor<C> {
    pub fn new(config: Config, console: C) -> Self {
        Self { config, console }
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    /// Runs until `shutdown` completes or a fatal condition occurs.
    ///
    /// The session is always shut down before returning `Ok`.
    pub async fn run(
        &self,
        source: &impl InterfaceSource,
        backend: Arc<dyn DiscoveryBackend>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), SupervisorError> {
        let inventory = interface::scan(source)?;
        self.console.show_inventory(&inventory);
        self.console.show_layout(&selector::suggest_layout(&inventory));

        let binding = selector::select(&inventory, &self.config.candidate_interfaces)?;
        info!(interface = %binding.interface_name(), "using audio network interface");
        self.console.show_binding(&binding);

        let mut session = DiscoverySession::new(
            self.config.domain_name.clone(),
            backend,
            SessionSettings::from(&self.config),
        );
        session.initialize(&binding)?;

        if let Err(e) = session.start_scan() {
            warn!(error = %e, "device scan warning, continuing without discovery");
        }

        tokio::pin!(shutdown);

        self.console.waiting_for_devices(self.config.settle_delay);
        tokio::select! {
            _ = tokio::time::sleep(self.config.settle_delay) => {}
            _ = &mut shutdown => {
                info!("shutdown requested during settle delay");
                session.shutdown().await;
                return Ok(());
            }
        }
        self.report(&mut session).await;

        let period = self.config.refresh_interval.max(Duration::from_millis(1));
        let mut refresh = tokio::time::interval_at(Instant::now() + period, period);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = refresh.tick() => self.report(&mut session).await,
                _ = &mut shutdown => {
                    info!("shutdown signal received");
                    break;
                }
            }
        }

        session.shutdown().await;
        Ok(())
    }

    async fn report(&self, session: &mut DiscoverySession) {
        if let Err(e) = session.refresh().await {
            warn!(error = %e, "refresh failed, showing stale device list");
        }
        self.console.show_devices(&session.show_devices());
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
