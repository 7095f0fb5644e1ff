use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use scout_common::config::Config;
use scout_common::network::interface::{NetworkInterface, SystemInterfaces};
use scout_common::network::selector::{BindingConfig, LayoutSuggestion};
use scout_core::backend::DiscoveryBackend;
use scout_core::backend::simulated::SimulatedBackend;
use scout_core::session::DeviceReport;
use scout_core::supervisor::{Console, Supervisor};
use tracing::{info, warn};

use crate::terminal::{network_fmt, print, spinner};

/// Terminal front end for the supervisor.
pub struct CliConsole;

impl Console for CliConsole {
    fn show_inventory(&self, inventory: &[NetworkInterface]) {
        print::header("network interfaces");
        network_fmt::print_inventory(inventory);
    }

    fn show_layout(&self, suggestion: &LayoutSuggestion) {
        network_fmt::print_layout(suggestion);
    }

    fn show_binding(&self, binding: &BindingConfig) {
        network_fmt::print_binding(binding);
    }

    fn waiting_for_devices(&self, delay: Duration) {
        spinner::start_settle_spinner(delay);
    }

    fn show_devices(&self, report: &DeviceReport) {
        spinner::finish_and_clear();
        network_fmt::print_devices(report);
    }
}

/// Picks the discovery service to drive.
///
/// No vendor service is linked into this build, so only the simulated network is available.
fn discovery_backend(simulate: bool) -> anyhow::Result<Arc<dyn DiscoveryBackend>> {
    if !simulate {
        bail!(
            "no vendor discovery service is linked into this build, \
             pass --simulate to run against the simulated audio network"
        );
    }
    warn!("using the simulated audio network, listed devices are not real");
    Ok(Arc::new(SimulatedBackend::demo()))
}

pub async fn discover(cfg: Config, simulate: bool) -> anyhow::Result<()> {
    let backend = discovery_backend(simulate)?;

    let supervisor = Supervisor::new(cfg, CliConsole);
    let result = supervisor
        .run(&SystemInterfaces, backend, shutdown_signal())
        .await
        .context("discovery aborted");
    spinner::finish_and_clear();
    result?;

    print::fat_separator();
    print::centerln("discovery stopped");
    Ok(())
}

/// Completes on Ctrl+C, or on SIGTERM where available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received interrupt"),
        _ = terminate => info!("received terminate"),
    }
}
