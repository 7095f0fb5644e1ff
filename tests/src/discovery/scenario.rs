use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use scout_common::config::Config;
use scout_common::network::interface;
use scout_common::network::selector::{self, LayoutSuggestion, SelectionError};
use scout_core::backend::simulated::{ResolveScript, SimulatedBackend, SimulatedDevice};
use scout_core::session::{DiscoverySession, SessionError, SessionSettings, SessionState};
use scout_core::supervisor::{Supervisor, SupervisorError};

use super::{dante0_binding, resolving};
use crate::util::{dante0, eth0, lo, names, FailingInterfaces, RecordingConsole, StaticInterfaces};

fn two_devices() -> Vec<SimulatedDevice> {
    vec![
        resolving("Stagebox-32", 5, [10, 1, 0, 10]).with_router_info("ULTIMOX4"),
        SimulatedDevice::named("Amp-Rack-L", ResolveScript::Never).with_default_name("DAD-AVIO-2CH"),
    ]
}

fn config(candidates: &[&str]) -> Config {
    Config {
        candidate_interfaces: names(candidates),
        ..Config::default()
    }
}

#[tokio::test(start_paused = true)]
async fn single_change_notification_builds_table() {
    let inventory = interface::scan(&StaticInterfaces(vec![eth0(), dante0(), lo()])).unwrap();
    let candidates = selector::identify(&inventory, &names(&["dante0"]));
    let matched: Vec<&str> = candidates.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(matched, vec!["dante0"]);

    let binding = selector::build_config(&candidates[0], 0).unwrap();
    assert_eq!(binding.interface_name(), "dante0");
    assert_eq!(binding.ipv4(), Ipv4Addr::new(10, 1, 0, 2));
    assert!(binding.is_enabled());

    let backend = Arc::new(SimulatedBackend::new(two_devices()));
    let mut session = DiscoverySession::new("Dante1", backend.clone(), SessionSettings::default());
    session.initialize(&binding).unwrap();
    session.start_scan().unwrap();

    // The first event step delivers the change raised by starting the browse.
    let mut reader = session.table();
    let table = reader.changed().await.unwrap();

    assert_eq!(table.generation(), 1);
    assert_eq!(table.count(), 2);
    assert_eq!(table.at(0).unwrap().ip_address, Ipv4Addr::new(10, 1, 0, 10));
    assert_eq!(table.at(0).unwrap().model, "ULTIMOX4");
    assert_eq!(table.at(1).unwrap().ip_address, Ipv4Addr::UNSPECIFIED);
    assert_eq!(table.at(1).unwrap().model, "DAD-AVIO-2CH");

    session.shutdown().await;
    assert_eq!(backend.open_connections(), 0);
}

#[tokio::test(start_paused = true)]
async fn refresh_and_report_follow_latest_table() {
    let backend = Arc::new(SimulatedBackend::new(two_devices()));
    let mut session = DiscoverySession::new("Dante1", backend.clone(), SessionSettings::default());
    session.initialize(&dante0_binding()).unwrap();
    session.start_scan().unwrap();

    assert_eq!(session.refresh().await, Ok(2));

    backend.set_devices(vec![resolving("FOH-Console", 0, [10, 1, 0, 11])]);
    assert_eq!(session.refresh().await, Ok(1));

    let report = session.show_devices();
    assert_eq!(report.total, 1);
    assert_eq!(report.devices[0].name, "FOH-Console");
    assert_eq!(report.devices[0].id, 1);
    assert!(report.to_string().contains("FOH-Console"));

    session.shutdown().await;
    assert_eq!(session.state(), SessionState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn supervisor_shutdown_waits_for_in_flight_report() {
    let supervisor = Supervisor::new(config(&["dante0"]), RecordingConsole::default());
    let backend = Arc::new(SimulatedBackend::new(two_devices()));

    supervisor
        .run(
            &StaticInterfaces(vec![lo(), eth0(), dante0()]),
            backend.clone(),
            tokio::time::sleep(Duration::from_secs(5)),
        )
        .await
        .unwrap();

    let console = supervisor.console();
    assert_eq!(console.inventory.lock().unwrap().len(), 2);
    assert_eq!(
        *console.layouts.lock().unwrap(),
        vec![LayoutSuggestion::Insufficient { usable: 2 }]
    );
    assert_eq!(console.bindings.lock().unwrap()[0].interface_name(), "dante0");
    assert_eq!(*console.settle_delays.lock().unwrap(), vec![Duration::from_secs(3)]);

    let reports = console.reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].total, 2);
    assert!(!backend.is_browsing());
    assert_eq!(backend.interface(), None);
}

#[tokio::test(start_paused = true)]
async fn supervisor_aborts_when_inventory_unavailable() {
    let supervisor = Supervisor::new(config(&["dante0"]), RecordingConsole::default());

    let result = supervisor
        .run(&FailingInterfaces, Arc::new(SimulatedBackend::new(vec![])), std::future::pending())
        .await;

    assert!(matches!(result, Err(SupervisorError::Inventory(_))));
}

#[tokio::test(start_paused = true)]
async fn supervisor_aborts_when_candidate_unusable() {
    let mut down = dante0();
    down.flags = 0;
    let supervisor = Supervisor::new(config(&["dante0"]), RecordingConsole::default());

    let result = supervisor
        .run(&StaticInterfaces(vec![down]), Arc::new(SimulatedBackend::new(vec![])), std::future::pending())
        .await;

    assert!(matches!(
        result,
        Err(SupervisorError::Selection(SelectionError::IsDown(name))) if name == "dante0"
    ));
}

#[tokio::test(start_paused = true)]
async fn supervisor_aborts_with_service_message_on_init_failure() {
    let supervisor = Supervisor::new(config(&["dante0"]), RecordingConsole::default());
    let backend = Arc::new(SimulatedBackend::new(vec![]).failing_init("Failed to create DAPI: 7"));

    let result = supervisor
        .run(&StaticInterfaces(vec![dante0()]), backend.clone(), std::future::pending())
        .await;

    match result {
        Err(SupervisorError::Session(SessionError::Service { message, .. })) => {
            assert_eq!(message, "Failed to create DAPI: 7");
        }
        other => panic!("expected a service error, got {other:?}"),
    }
    assert!(supervisor.console().reports.lock().unwrap().is_empty());
    assert!(!backend.is_browsing());
}
