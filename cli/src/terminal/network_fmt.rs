use colored::*;
use scout_common::network::interface::NetworkInterface;
use scout_common::network::selector::{
    BindingConfig, Isolation, LayoutSuggestion, REQUIRED_INTERFACES,
};
use scout_core::session::DeviceReport;

use crate::terminal::format::{self, column};
use crate::terminal::{colors, print};

const NAME_WIDTH: usize = 16;
const MAC_WIDTH: usize = 18;
const IP_WIDTH: usize = 16;

pub fn print_inventory(inventory: &[NetworkInterface]) {
    print::print(&format!(
        "{}{}{}{}",
        column("NAME".bold(), NAME_WIDTH),
        column("MAC".bold(), MAC_WIDTH),
        column("IP".bold(), IP_WIDTH),
        "STATUS".bold()
    ));
    print::separator();

    for interface in inventory {
        print::print(&format!(
            "{}{}{}{}",
            column(interface.name.color(colors::PRIMARY), NAME_WIDTH),
            column(format::mac(&interface.hardware_address()), MAC_WIDTH),
            column(format::ipv4(interface.ipv4), IP_WIDTH),
            format::link_state(interface.is_up)
        ));
    }
    print::separator();
}

pub fn print_binding(binding: &BindingConfig) {
    print::header("selected interface");
    print::set_key_width(["Interface", "IP", "MAC", "Role", "Enabled"]);
    print::aligned_line("Interface", binding.interface_name().color(colors::PRIMARY));
    print::aligned_line("IP", format::ipv4(Some(binding.ipv4())));
    print::aligned_line("MAC", format::mac(&binding.hardware_address()));
    print::aligned_line("Role", binding.role());
    print::aligned_line("Enabled", binding.is_enabled().to_string());
}

pub fn print_layout(suggestion: &LayoutSuggestion) {
    print::header("suggested layout");
    match suggestion {
        LayoutSuggestion::Insufficient { usable } => {
            print::print_status(format!(
                "{} Only {} interfaces are UP with an address, {} are recommended",
                "!".yellow().bold(),
                usable.to_string().yellow().bold(),
                REQUIRED_INTERFACES
            ));
            print::as_tree_one_level(vec![
                ("eth0".to_string(), "Management (Telnet), external network".normal()),
                ("eth1".to_string(), "Dante Domain 1, audio network 1".normal()),
                ("eth2".to_string(), "Dante Domain 2, audio network 2".normal()),
            ]);
        }
        LayoutSuggestion::Assignment(roles) => {
            print::print_status("Sufficient interfaces available".green().to_string());
            let details = roles
                .iter()
                .map(|(name, ip, role)| {
                    let value = format!(
                        "{} {} {}",
                        format::ipv4(Some(*ip)),
                        "→".color(colors::SEPARATOR),
                        role
                    );
                    (name.clone(), value.normal())
                })
                .collect();
            print::as_tree_one_level(details);
        }
    }
}

pub fn print_isolation(isolation: Option<&Isolation>) {
    match isolation {
        None => {
            print::print_status("Fewer than two audio domains configured, isolation not checked")
        }
        Some(Isolation::Isolated) => {
            print::print_status("Audio networks are properly isolated".green().to_string())
        }
        Some(Isolation::SameSegment { prefix }) => {
            let segment = format!("{}.{}.{}.x", prefix[0], prefix[1], prefix[2]);
            print::print_status(format!(
                "{} Both audio domains are on {}, expect broadcast interference",
                "!".yellow().bold(),
                segment.yellow().bold()
            ));
            print::print_status("Use separate segments, e.g. 10.1.0.x and 10.2.0.x");
        }
    }
}

const ID_WIDTH: usize = 4;
const DEVICE_NAME_WIDTH: usize = 21;
const MODEL_WIDTH: usize = 17;
const DEVICE_MAC_WIDTH: usize = 18;

pub fn print_devices(report: &DeviceReport) {
    print::header(&format!("{} device list", report.domain));
    print::set_key_width(["Interface", "Total Devices"]);
    let ip = report.ip.map(|ip| ip.to_string()).unwrap_or_default();
    print::aligned_line(
        "Interface",
        format!("{} ({})", report.interface.color(colors::PRIMARY), ip.color(colors::IPV4_ADDR)),
    );
    print::aligned_line(
        "Total Devices",
        report.total.to_string().color(colors::ACCENT).bold(),
    );

    if report.devices.is_empty() {
        print::fat_separator();
        return;
    }

    print::print("");
    print::print(&format!(
        "{}{}{}{}{}{}",
        column("ID".bold(), ID_WIDTH),
        column("Name".bold(), DEVICE_NAME_WIDTH),
        column("Model".bold(), MODEL_WIDTH),
        column("IP Address".bold(), IP_WIDTH + 1),
        column("MAC Address".bold(), DEVICE_MAC_WIDTH),
        "Dante Ver".bold()
    ));
    print::separator();
    for device in &report.devices {
        print::print(&format!(
            "{}{}{}{}{}{}",
            column(device.id.to_string().color(colors::ACCENT), ID_WIDTH),
            column(device.name.color(colors::PRIMARY), DEVICE_NAME_WIDTH),
            column(&device.model, MODEL_WIDTH),
            column(format::device_address(device.ip_address), IP_WIDTH + 1),
            column(format::mac(&device.mac_address), DEVICE_MAC_WIDTH),
            device.protocol_version
        ));
    }
    print::fat_separator();
}
