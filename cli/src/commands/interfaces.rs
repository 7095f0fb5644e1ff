use anyhow::Context;
use scout_common::config::Config;
use scout_common::network::interface::{self, NetworkInterface, SystemInterfaces};
use scout_common::network::selector;

use crate::terminal::{network_fmt, print};

pub fn interfaces(cfg: &Config) -> anyhow::Result<()> {
    let inventory: Vec<NetworkInterface> =
        interface::scan(&SystemInterfaces).context("failed to list network interfaces")?;

    network_fmt::print_inventory(&inventory);
    network_fmt::print_layout(&selector::suggest_layout(&inventory));

    print::header("network isolation");
    let domains: Vec<NetworkInterface> = selector::identify(&inventory, &cfg.candidate_interfaces);
    network_fmt::print_isolation(selector::check_isolation(&domains).as_ref());

    Ok(())
}
