pub mod discover;
pub mod interfaces;

use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use scout_common::config::Config;

#[derive(Parser)]
#[command(name = "dante-scout")]
#[command(about = "Finds audio-over-IP devices and keeps their list up to date.")]
pub struct CommandLine {
    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List network interfaces and check the audio network layout
    #[command(alias = "i")]
    Interfaces(CandidateArgs),
    /// Discover devices on the audio network until interrupted
    #[command(alias = "d")]
    Discover(DiscoverArgs),
}

#[derive(Args)]
pub struct CandidateArgs {
    /// Interface allowed to carry discovery traffic; repeat for more. Replaces the built-in list
    #[arg(short, long = "interface", value_name = "NAME")]
    pub interfaces: Vec<String>,
}

impl CandidateArgs {
    fn apply(self, cfg: &mut Config) {
        if !self.interfaces.is_empty() {
            cfg.candidate_interfaces = self.interfaces;
        }
    }

    pub fn into_config(self) -> Config {
        let mut cfg = Config::default();
        self.apply(&mut cfg);
        cfg
    }
}

#[derive(Args)]
pub struct DiscoverArgs {
    #[command(flatten)]
    pub candidates: CandidateArgs,

    /// Name of the discovery domain shown in reports
    #[arg(long, value_name = "NAME")]
    pub domain: Option<String>,

    /// Maximum number of devices kept per rebuild
    #[arg(long, value_name = "COUNT", value_parser = clap::value_parser!(u16).range(1..=1024))]
    pub capacity: Option<u16>,

    /// Seconds to wait for the first announcements before the first report
    #[arg(long, value_name = "SECS")]
    pub settle_secs: Option<u64>,

    /// Seconds between device list refreshes
    #[arg(long, value_name = "SECS")]
    pub refresh_secs: Option<u64>,

    /// Run against a built-in simulated audio network instead of a vendor service
    #[arg(long)]
    pub simulate: bool,
}

impl DiscoverArgs {
    pub fn into_config(self) -> Config {
        let mut cfg = self.candidates.into_config();
        if let Some(domain) = self.domain {
            cfg.domain_name = domain;
        }
        if let Some(capacity) = self.capacity {
            cfg.table_capacity = usize::from(capacity);
        }
        if let Some(secs) = self.settle_secs {
            cfg.settle_delay = Duration::from_secs(secs);
        }
        if let Some(secs) = self.refresh_secs {
            cfg.refresh_interval = Duration::from_secs(secs);
        }
        cfg
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
