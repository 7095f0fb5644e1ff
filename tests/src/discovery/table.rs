use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use scout_common::config::ResolveSettings;
use scout_core::backend::simulated::{ResolveScript, SimulatedBackend, SimulatedDevice};
use scout_core::backend::DiscoveryBackend;
use scout_core::resolver;
use scout_core::session::{DiscoverySession, SessionSettings};
use scout_core::table::{DeviceTable, DiscoveredDevice};

use super::{dante0_binding, resolving};

fn browsing(devices: Vec<SimulatedDevice>) -> Arc<SimulatedBackend> {
    let backend = Arc::new(SimulatedBackend::new(devices));
    backend.init_with_interface("dante0").unwrap();
    backend.start_browse().unwrap();
    backend
}

/*************************************************************
                         Truncation
**************************************************************/

#[tokio::test(start_paused = true)]
async fn rebuild_truncates_to_capacity_without_error() {
    let devices = (0..40u8)
        .map(|i| resolving(&format!("device-{i}"), 0, [10, 1, 0, i + 1]))
        .collect();
    let backend = Arc::new(SimulatedBackend::new(devices));
    let mut session = DiscoverySession::new("Dante1", backend.clone(), SessionSettings::default());
    session.initialize(&dante0_binding()).unwrap();
    session.start_scan().unwrap();

    let count = session.refresh().await.unwrap();
    let table = session.table().snapshot();

    assert_eq!(count, 32);
    assert_eq!(table.count(), 32);
    assert_eq!(table.dropped(), 8);
    let ids: Vec<u32> = table.iter().map(|d| d.id).collect();
    assert_eq!(ids, (1..=32).collect::<Vec<u32>>());
    assert!(table.at(32).is_none());

    session.shutdown().await;
}

/*************************************************************
                         Resolution
**************************************************************/

#[tokio::test(start_paused = true)]
async fn unresolved_device_times_out_after_budget() {
    let backend = browsing(vec![SimulatedDevice::named("Amp-Rack-L", ResolveScript::Never)]);
    let settings = ResolveSettings::default();
    let started = tokio::time::Instant::now();

    let table = resolver::rebuild(backend.as_ref(), &settings, 32, 1).await;

    assert_eq!(table.at(0).unwrap().ip_address, Ipv4Addr::UNSPECIFIED);
    assert_eq!(backend.stats().state_polls, 30);
    assert_eq!(backend.stats().opened, 1);
    assert_eq!(backend.stats().closed, 1);
    assert!(started.elapsed() >= Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn failing_devices_do_not_abort_rebuild() {
    let backend = browsing(vec![
        SimulatedDevice::named("refuses", ResolveScript::OpenFails),
        SimulatedDevice::named("breaks", ResolveScript::FailsAfter { polls: 2 }),
        SimulatedDevice::named("lookup", ResolveScript::AddressFails),
        resolving("works", 1, [10, 1, 0, 42]),
    ]);

    let table = resolver::rebuild(backend.as_ref(), &ResolveSettings::default(), 32, 1).await;

    let addresses: Vec<Ipv4Addr> = table.iter().map(|d| d.ip_address).collect();
    assert_eq!(
        addresses,
        vec![
            Ipv4Addr::UNSPECIFIED,
            Ipv4Addr::UNSPECIFIED,
            Ipv4Addr::UNSPECIFIED,
            Ipv4Addr::new(10, 1, 0, 42),
        ]
    );
    assert_eq!(backend.stats().opened, backend.stats().closed);
}

#[tokio::test(start_paused = true)]
async fn model_fallback_chain() {
    let backend = browsing(vec![
        SimulatedDevice::named("default-only", ResolveScript::OpenFails).with_default_name("AVIO-USB"),
        SimulatedDevice::named("bare", ResolveScript::OpenFails),
    ]);

    let table = resolver::rebuild(backend.as_ref(), &ResolveSettings::default(), 32, 1).await;

    assert_eq!(table.at(0).unwrap().model, "AVIO-USB");
    assert_eq!(table.at(1).unwrap().model, "Unknown Model");
    assert_eq!(table.at(1).unwrap().protocol_version, "Unknown");
}

/*************************************************************
                         Atomicity
**************************************************************/

fn batch(generation: u32) -> Vec<SimulatedDevice> {
    let size = generation % 7 + 1;
    (0..size)
        .map(|i| {
            SimulatedDevice::named(
                &format!("gen{generation}-{i}"),
                ResolveScript::After {
                    polls: 0,
                    address: Ipv4Addr::new(10, 1, (generation % 250) as u8, i as u8 + 1),
                },
            )
        })
        .collect()
}

fn assert_consistent(table: &DeviceTable) {
    let devices: Vec<&DiscoveredDevice> = (0..table.count())
        .map(|index| table.at(index).expect("entry within count must be valid"))
        .collect();
    let Some(first) = devices.first() else {
        return;
    };

    let prefix = first.name.split('-').next().unwrap().to_string();
    let generation: u32 = prefix.trim_start_matches("gen").parse().unwrap();
    assert_eq!(devices.len() as u32, generation % 7 + 1);
    for (index, device) in devices.iter().enumerate() {
        assert_eq!(device.id as usize, index + 1);
        assert!(device.name.starts_with(&format!("{prefix}-")));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_observe_a_mixed_table() {
    let backend = Arc::new(SimulatedBackend::new(batch(0)));
    let settings = SessionSettings {
        table_capacity: 32,
        tick_interval: Duration::from_millis(1),
        resolve: ResolveSettings {
            max_attempts: 3,
            poll_interval: Duration::from_millis(1),
        },
    };
    let mut session = DiscoverySession::new("Dante1", backend.clone(), settings);
    session.initialize(&dante0_binding()).unwrap();
    session.start_scan().unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..3)
        .map(|_| {
            let reader = session.table();
            let stop = stop.clone();
            tokio::spawn(async move {
                let mut checked = 0usize;
                while !stop.load(Ordering::Relaxed) {
                    assert_consistent(&reader.snapshot());
                    checked += 1;
                    tokio::task::yield_now().await;
                }
                checked
            })
        })
        .collect();

    for generation in 1..=50 {
        backend.set_devices(batch(generation));
        let count = session.refresh().await.unwrap();
        assert_eq!(count as u32, generation % 7 + 1);
    }
    stop.store(true, Ordering::Relaxed);

    for reader in readers {
        assert!(reader.await.unwrap() > 0);
    }
    session.shutdown().await;
}
