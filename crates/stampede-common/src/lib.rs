use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub target: TargetConfig,
    pub run: RunSettings,
    pub metrics: MetricsConfig,
    pub profiles: Vec<ProfileConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TargetConfig {
    pub base_url: String,
}

/// Run-wide load shape: how fast users come online, how long the run
/// lasts (omit `duration_secs` for interactive runs that stop on ctrl-c),
/// and how long `stop` waits before abandoning unresponsive users.
#[derive(Debug, Deserialize, Clone)]
pub struct RunSettings {
    pub spawn_rate: f64,
    #[serde(default)]
    pub duration_secs: Option<u64>,
    #[serde(default = "default_grace_timeout")]
    pub grace_timeout_secs: u64,
}

fn default_grace_timeout() -> u64 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

/// One virtual-user behavior: a weighted action mix, a wait interval
/// applied between consecutive actions, and the default headers every
/// request from this profile carries.
#[derive(Debug, Deserialize, Clone)]
pub struct ProfileConfig {
    pub name: String,
    pub users: usize,
    pub wait_min_secs: f64,
    pub wait_max_secs: f64,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub actions: Vec<ActionConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ActionConfig {
    pub name: String,
    #[serde(default = "default_method")]
    pub method: String,
    pub path: String,
    pub weight: u32,
}

fn default_method() -> String {
    "GET".to_string()
}
