// SPDX-License-Identifier: Apache-2.0
//! Layered server configuration (§6): built-in defaults, overridden by
//! `SAIL_`-prefixed environment variables, overridden in turn by an
//! optional `--config <path.toml>` file.

use std::env;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {field}: {value}")]
    InvalidEnvValue { field: &'static str, value: String },
}

/// The fully-resolved server configuration (§6).
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub tick_rate: f64,
    pub max_ships: usize,
    pub max_players: usize,
    pub max_projectiles: usize,
    pub world_half_extent: f64,

    pub baseline_interval_ticks: u64,
    pub t_baseline_ms: u64,

    pub aoi_r_high: f64,
    pub aoi_r_mid: f64,
    pub aoi_r_low: f64,
    pub aoi_hz_high: f64,
    pub aoi_hz_mid: f64,
    pub aoi_hz_low: f64,

    pub max_interact_distance: f64,
    pub t_handshake_ms: u64,
    pub t_disconnect_ms: u64,
    pub input_rate_limit_per_sec: u32,

    pub seed: u64,

    pub ws_bind_addr: String,
    pub udp_bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tick_rate: 20.0,
            max_ships: 256,
            max_players: 1024,
            max_projectiles: 4096,
            world_half_extent: 2000.0,

            baseline_interval_ticks: 100,
            t_baseline_ms: 5000,

            aoi_r_high: 50.0,
            aoi_r_mid: 150.0,
            aoi_r_low: 400.0,
            aoi_hz_high: 20.0,
            aoi_hz_mid: 10.0,
            aoi_hz_low: 2.0,

            max_interact_distance: 4.0,
            t_handshake_ms: 5000,
            t_disconnect_ms: 15000,
            input_rate_limit_per_sec: 60,

            seed: 0,

            ws_bind_addr: "0.0.0.0:7777".to_string(),
            udp_bind_addr: "0.0.0.0:7778".to_string(),
        }
    }
}

/// Mirrors [`Config`] with every field optional, for partial
/// TOML overrides (§6: `--config` values win over env, which wins over
/// defaults).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
struct ConfigFile {
    tick_rate: Option<f64>,
    max_ships: Option<usize>,
    max_players: Option<usize>,
    max_projectiles: Option<usize>,
    world_half_extent: Option<f64>,
    baseline_interval_ticks: Option<u64>,
    t_baseline_ms: Option<u64>,
    aoi_r_high: Option<f64>,
    aoi_r_mid: Option<f64>,
    aoi_r_low: Option<f64>,
    aoi_hz_high: Option<f64>,
    aoi_hz_mid: Option<f64>,
    aoi_hz_low: Option<f64>,
    max_interact_distance: Option<f64>,
    t_handshake_ms: Option<u64>,
    t_disconnect_ms: Option<u64>,
    input_rate_limit_per_sec: Option<u32>,
    seed: Option<u64>,
    ws_bind_addr: Option<String>,
    udp_bind_addr: Option<String>,
}

macro_rules! apply_file_overrides {
    ($cfg:expr, $file:expr, { $($field:ident),* $(,)? }) => {
        $(
            if let Some(value) = $file.$field.clone() {
                $cfg.$field = value;
            }
        )*
    };
}

fn apply_file(cfg: &mut Config, file: &ConfigFile) {
    apply_file_overrides!(cfg, file, {
        tick_rate, max_ships, max_players, max_projectiles, world_half_extent,
        baseline_interval_ticks, t_baseline_ms,
        aoi_r_high, aoi_r_mid, aoi_r_low, aoi_hz_high, aoi_hz_mid, aoi_hz_low,
        max_interact_distance, t_handshake_ms, t_disconnect_ms,
        input_rate_limit_per_sec, seed, ws_bind_addr, udp_bind_addr,
    });
}

fn env_var(name: &str) -> Option<String> {
    env::var(format!("SAIL_{name}")).ok()
}

fn env_parse<T: std::str::FromStr>(field: &'static str) -> Result<Option<T>, ConfigError> {
    match env_var(field) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnvValue { field, value: raw }),
    }
}

fn apply_env(cfg: &mut Config) -> Result<(), ConfigError> {
    macro_rules! apply {
        ($field:ident, $name:literal) => {
            if let Some(v) = env_parse($name)? {
                cfg.$field = v;
            }
        };
    }
    apply!(tick_rate, "TICK_RATE");
    apply!(max_ships, "MAX_SHIPS");
    apply!(max_players, "MAX_PLAYERS");
    apply!(max_projectiles, "MAX_PROJECTILES");
    apply!(world_half_extent, "WORLD_HALF_EXTENT");
    apply!(baseline_interval_ticks, "BASELINE_INTERVAL_TICKS");
    apply!(t_baseline_ms, "T_BASELINE_MS");
    apply!(aoi_r_high, "AOI_R_HIGH");
    apply!(aoi_r_mid, "AOI_R_MID");
    apply!(aoi_r_low, "AOI_R_LOW");
    apply!(aoi_hz_high, "AOI_HZ_HIGH");
    apply!(aoi_hz_mid, "AOI_HZ_MID");
    apply!(aoi_hz_low, "AOI_HZ_LOW");
    apply!(max_interact_distance, "MAX_INTERACT_DISTANCE");
    apply!(t_handshake_ms, "T_HANDSHAKE_MS");
    apply!(t_disconnect_ms, "T_DISCONNECT_MS");
    apply!(input_rate_limit_per_sec, "INPUT_RATE_LIMIT_PER_SEC");
    apply!(seed, "SEED");
    apply!(ws_bind_addr, "WS_BIND_ADDR");
    apply!(udp_bind_addr, "UDP_BIND_ADDR");
    Ok(())
}

/// Loads configuration: defaults, then `SAIL_`-prefixed env vars, then
/// an optional TOML file, which wins over both (§6).
pub fn load(config_path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut cfg = Config::default();
    apply_env(&mut cfg)?;

    if let Some(path) = config_path {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        apply_file(&mut cfg, &file);
    }

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_internally_consistent() {
        let cfg = Config::default();
        assert!(cfg.aoi_r_high < cfg.aoi_r_mid);
        assert!(cfg.aoi_r_mid < cfg.aoi_r_low);
        assert!(cfg.tick_rate > 0.0);
    }

    #[test]
    fn load_with_no_overrides_returns_defaults() {
        let cfg = load(None).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn file_override_changes_a_single_field() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("sail-config-test-{}.toml", std::process::id()));
        std::fs::write(&path, "tick_rate = 30.0\n").unwrap();
        let cfg = load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(cfg.tick_rate, 30.0);
        assert_eq!(cfg.max_ships, Config::default().max_ships);
    }
}
