use std::net::Ipv4Addr;

use scout_common::network::interface::{self, NetworkInterface};
use scout_common::network::selector::{self, Isolation, LayoutSuggestion, SelectionError};

use crate::util::{
    dante0, dante1, dante_down, eth0, lo, names, tun0, veth1234, FailingInterfaces, StaticInterfaces,
};

fn inventory() -> Vec<NetworkInterface> {
    let source = StaticInterfaces(vec![lo(), eth0(), dante0(), dante1(), dante_down(), tun0(), veth1234()]);
    interface::scan(&source).unwrap()
}

/*************************************************************
                         Inventory
**************************************************************/

#[test]
fn inventory_never_contains_loopback() {
    let inventory = inventory();
    assert!(inventory.iter().all(|i| i.name != "lo"));
    assert_eq!(inventory.len(), 6);
}

#[test]
fn inventory_fails_without_partial_result() {
    assert!(interface::scan(&FailingInterfaces).is_err());
}

#[test]
fn inventory_takes_first_ipv4_after_ipv6() {
    let inventory = inventory();
    let dante0 = selector::find(&inventory, "dante0").unwrap();
    assert_eq!(dante0.ipv4, Some(Ipv4Addr::new(10, 1, 0, 2)));
}

/*************************************************************
                         Selection
**************************************************************/

#[test]
fn identify_is_exact_subset_of_inventory() {
    let matched = selector::identify(&inventory(), &names(&["dante", "dante1", "eth0 ", "lo"]));
    let matched: Vec<&str> = matched.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(matched, vec!["dante1"]);
}

#[test]
fn validate_reports_each_cause_distinctly() {
    let inventory = inventory();

    assert_eq!(
        selector::validate(&inventory, "eth7"),
        Err(SelectionError::NotFound("eth7".to_string()))
    );
    assert_eq!(
        selector::validate(&inventory, "dante9"),
        Err(SelectionError::IsDown("dante9".to_string()))
    );
    assert_eq!(
        selector::validate(&inventory, "veth1234"),
        Err(SelectionError::NoIpv4Address("veth1234".to_string()))
    );
    assert_eq!(
        selector::validate(&inventory, "tun0"),
        Err(SelectionError::NoMacAddress("tun0".to_string()))
    );
    assert_eq!(selector::validate(&inventory, "dante0"), Ok(()));
}

#[test]
fn select_skips_rejected_candidates() {
    let binding = selector::select(&inventory(), &names(&["dante9", "dante1"])).unwrap();
    assert_eq!(binding.interface_name(), "dante1");
    assert_eq!(binding.role(), "dante1");
}

#[test]
fn select_without_candidates_is_fatal() {
    assert_eq!(
        selector::select(&inventory(), &names(&["enxf8e43bd6309e", "enxf8e43bd55df6"])),
        Err(SelectionError::NoCandidates)
    );
}

#[test]
fn build_config_for_dante0() {
    let inventory = inventory();
    let candidates = selector::identify(&inventory, &names(&["dante0"]));

    let binding = selector::build_config(&candidates[0], 0).unwrap();

    assert_eq!(binding.interface_name(), "dante0");
    assert_eq!(binding.ipv4(), Ipv4Addr::new(10, 1, 0, 2));
    assert_eq!(binding.hardware_address(), "f8:e4:3b:d6:30:9e");
    assert!(binding.is_enabled());
}

/*************************************************************
                         Advisories
**************************************************************/

#[test]
fn layout_assigns_roles_when_three_interfaces_usable() {
    let LayoutSuggestion::Assignment(roles) = selector::suggest_layout(&inventory()) else {
        panic!("expected an assignment");
    };
    let assigned: Vec<&str> = roles.iter().map(|(name, _, _)| name.as_str()).collect();
    assert_eq!(assigned, vec!["eth0", "dante0", "dante1"]);
}

#[test]
fn layout_insufficient_with_two_interfaces() {
    let inventory = interface::scan(&StaticInterfaces(vec![lo(), eth0(), dante0()])).unwrap();
    assert_eq!(
        selector::suggest_layout(&inventory),
        LayoutSuggestion::Insufficient { usable: 2 }
    );
}

#[test]
fn isolation_distinguishes_segments() {
    let inventory = inventory();
    let separate = selector::identify(&inventory, &names(&["dante0", "dante1"]));
    assert_eq!(selector::check_isolation(&separate), Some(Isolation::Isolated));

    let mut shared = dante1();
    shared.ips = vec![crate::util::v4(10, 1, 0, 77, 16)];
    let inventory = interface::scan(&StaticInterfaces(vec![dante0(), shared])).unwrap();
    assert_eq!(
        selector::check_isolation(&inventory),
        Some(Isolation::SameSegment { prefix: [10, 1, 0] })
    );
}
