use std::net::Ipv4Addr;

use colored::*;
use console::{Alignment, pad_str};

use crate::terminal::colors;

const MISSING: &str = "-";

pub fn ipv4(addr: Option<Ipv4Addr>) -> ColoredString {
    match addr {
        Some(addr) => addr.to_string().color(colors::IPV4_ADDR),
        None => MISSING.color(colors::SEPARATOR),
    }
}

pub fn mac(address: &str) -> ColoredString {
    if address.is_empty() {
        MISSING.color(colors::SEPARATOR)
    } else {
        address.color(colors::MAC_ADDR)
    }
}

pub fn link_state(is_up: bool) -> ColoredString {
    if is_up {
        "UP".color(colors::LINK_UP).bold()
    } else {
        "DOWN".color(colors::LINK_DOWN).bold()
    }
}

/// Device address, highlighted when it is the unresolved sentinel.
pub fn device_address(addr: Ipv4Addr) -> ColoredString {
    if addr.is_unspecified() {
        addr.to_string().color(colors::UNRESOLVED)
    } else {
        addr.to_string().color(colors::IPV4_ADDR)
    }
}

/// Left-aligns `value` in a column of `width`, measuring without ANSI escapes.
pub fn column(value: impl ToString, width: usize) -> String {
    pad_str(&value.to_string(), width, Alignment::Left, None).into_owned()
}
