use std::time::Duration;

/// Interfaces wired to the audio network on the reference host.
pub const DEFAULT_CANDIDATE_INTERFACES: &[&str] = &["enxf8e43bd6309e", "enxf8e43bd55df6"];

pub const DEFAULT_DOMAIN_NAME: &str = "Dante1";
pub const DEFAULT_TABLE_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
pub struct Config {
    /// Interface names allowed to carry discovery traffic, matched exactly.
    pub candidate_interfaces: Vec<String>,
    /// Human readable name of the discovery domain.
    pub domain_name: String,
    /// Upper bound on the number of devices kept per table rebuild.
    ///
    /// Announcements past this bound are dropped.
    pub table_capacity: usize,
    /// Cadence of the background event-processing tick.
    pub tick_interval: Duration,
    /// Time given to the first announcements before the initial report.
    pub settle_delay: Duration,
    /// Cadence of the steady-state refresh and report.
    pub refresh_interval: Duration,
    pub resolve: ResolveSettings,
}

/// Bounds of the per-device address resolution handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveSettings {
    pub max_attempts: u32,
    pub poll_interval: Duration,
}

impl Default for ResolveSettings {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl ResolveSettings {
    /// Longest time a single device can hold up a rebuild.
    pub fn budget(&self) -> Duration {
        self.poll_interval * self.max_attempts
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            candidate_interfaces: DEFAULT_CANDIDATE_INTERFACES
                .iter()
                .map(|name| name.to_string())
                .collect(),
            domain_name: DEFAULT_DOMAIN_NAME.to_string(),
            table_capacity: DEFAULT_TABLE_CAPACITY,
            tick_interval: Duration::from_millis(500),
            settle_delay: Duration::from_secs(3),
            refresh_interval: Duration::from_secs(10),
            resolve: ResolveSettings::default(),
        }
    }
}
