//! Single owner of the device table.
//!
//! Change notifications and manual refreshes are turned into [`TableCommand`]s
//! and processed one at a time by a dedicated task, so two rebuild passes can
//! never interleave. Requests that pile up while a pass is running are served
//! by a single follow-up pass. Stopping interrupts a running pass between
//! devices and nothing from it is published.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use scout_common::config::ResolveSettings;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::backend::{ChangeCallback, DiscoveryBackend};
use crate::resolver::{self, Interrupted};
use crate::table::DeviceTable;

#[derive(Debug)]
pub enum TableCommand {
    /// Rebuild the table; `reply` receives the resulting table.
    Rebuild {
        reply: Option<oneshot::Sender<Arc<DeviceTable>>>,
    },
    Stop,
}

/// Sending half of the keeper's command channel.
#[derive(Debug, Clone)]
pub struct TableNotifier {
    commands: mpsc::UnboundedSender<TableCommand>,
    stopping: Arc<AtomicBool>,
}

/// Receiving half of the keeper's command channel.
#[derive(Debug)]
pub struct TableInbox {
    commands: mpsc::UnboundedReceiver<TableCommand>,
    stopping: Arc<AtomicBool>,
}

impl TableNotifier {
    /// Creates a notifier together with the inbox a [`TableKeeper`] will drain.
    pub fn channel() -> (Self, TableInbox) {
        let (commands, inbox) = mpsc::unbounded_channel();
        let stopping = Arc::new(AtomicBool::new(false));
        let notifier = Self {
            commands,
            stopping: stopping.clone(),
        };
        (
            notifier,
            TableInbox {
                commands: inbox,
                stopping,
            },
        )
    }

    /// Requests a rebuild without waiting for it. Never blocks.
    pub fn notify(&self) -> bool {
        self.commands
            .send(TableCommand::Rebuild { reply: None })
            .is_ok()
    }

    /// Requests a rebuild and waits for the table it produces.
    ///
    /// Returns `None` when the keeper stopped before serving the request.
    pub async fn rebuild_now(&self) -> Option<Arc<DeviceTable>> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(TableCommand::Rebuild { reply: Some(reply) })
            .ok()?;
        response.await.ok()
    }

    /// Asks the keeper to exit. A running pass is abandoned before its next device.
    pub fn stop(&self) {
        self.stopping.store(true, Ordering::Release);
        let _ = self.commands.send(TableCommand::Stop);
    }

    /// Network-changed callback to register with the discovery service.
    pub fn callback(&self) -> ChangeCallback {
        let notifier = self.clone();
        Box::new(move || {
            trace!("network changed, requesting table rebuild");
            notifier.notify();
        })
    }
}

pub struct TableKeeper {
    backend: Arc<dyn DiscoveryBackend>,
    settings: ResolveSettings,
    capacity: usize,
    inbox: TableInbox,
    publisher: watch::Sender<Arc<DeviceTable>>,
    generation: u64,
}

impl TableKeeper {
    pub fn new(
        backend: Arc<dyn DiscoveryBackend>,
        settings: ResolveSettings,
        capacity: usize,
        inbox: TableInbox,
        publisher: watch::Sender<Arc<DeviceTable>>,
    ) -> Self {
        let generation = publisher.borrow().generation();
        Self {
            backend,
            settings,
            capacity,
            inbox,
            publisher,
            generation,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        while let Some(command) = self.inbox.commands.recv().await {
            let mut waiters = Vec::new();
            let mut stopping = false;

            match command {
                TableCommand::Rebuild { reply } => waiters.extend(reply),
                TableCommand::Stop => break,
            }

            let mut coalesced = 0usize;
            while let Ok(queued) = self.inbox.commands.try_recv() {
                match queued {
                    TableCommand::Rebuild { reply } => {
                        coalesced += 1;
                        waiters.extend(reply);
                    }
                    TableCommand::Stop => {
                        stopping = true;
                        break;
                    }
                }
            }
            if stopping {
                break;
            }
            if coalesced > 0 {
                debug!(coalesced, "merged queued rebuild requests");
            }

            let Some(table) = self.rebuild_once().await else {
                debug!("rebuild abandoned, keeper stopping");
                break;
            };
            for waiter in waiters {
                let _ = waiter.send(table.clone());
            }
        }

        debug!(generation = self.generation, "table keeper stopped");
    }

    async fn rebuild_once(&mut self) -> Option<Arc<DeviceTable>> {
        let generation = self.generation + 1;
        let table = match resolver::rebuild_until(
            self.backend.as_ref(),
            &self.settings,
            self.capacity,
            generation,
            &self.inbox.stopping,
        )
        .await
        {
            Ok(table) => Arc::new(table),
            Err(Interrupted(partial)) => {
                debug!(described = partial.count(), "discarding partial table");
                return None;
            }
        };

        self.generation = generation;
        self.publisher.send_replace(table.clone());
        Some(table)
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
