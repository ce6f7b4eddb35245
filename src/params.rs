/*
 * Simulation Parameters Module
 *
 * This module defines the SimulationParams struct that contains all the
 * tunable ranges and toggles for the node field: the spawn schedule, node
 * motion and fade timing, wave bursts, and connection formation. Colors and
 * opacities are carried along for the renderer and never read by the core.
 *
 * Parameters are loaded from a TOML file. Every section has defaults, so a
 * partial file only needs the values it wants to change.
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file looked up by the viewer
pub const DEFAULT_CONFIG_PATH: &str = "nodefield.toml";

/// Errors that can occur while loading or saving parameters.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// One phase of population growth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnStep {
    /// Milliseconds to wait after this step before the next one fires
    pub delay: f64,
    /// Outer edge of the spawn annulus as a fraction of the half extents
    pub outer_radius: f32,
    /// Number of nodes spawned by this step
    pub count: usize,
    /// Upper bound for each node's hide duration; falls back to `delay`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hide: Option<f64>,
}

impl SpawnStep {
    pub fn new(delay: f64, outer_radius: f32, count: usize) -> Self {
        Self { delay, outer_radius, count, max_hide: None }
    }

    pub fn max_hide_duration(&self) -> f64 {
        self.max_hide.unwrap_or(self.delay)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeParams {
    /// Velocity in world units per tick for `v = 0`
    pub min_velocity: f32,
    /// Velocity in world units per tick for `v -> 1`
    pub max_velocity: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Milliseconds a node spends fading in (SPAWNING)
    pub spawn_fade: f64,
    pub color: [u8; 3],
    pub opacity: f32,
}

impl Default for NodeParams {
    fn default() -> Self {
        Self {
            min_velocity: 0.1,
            max_velocity: 0.5,
            min_radius: 1.5,
            max_radius: 4.0,
            spawn_fade: 1200.0,
            color: [200, 220, 255],
            opacity: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveParams {
    /// Shortest quiet period before a burst, in milliseconds
    pub min_wait: f64,
    /// Longest quiet period before a burst, in milliseconds
    pub max_wait: f64,
    /// Rings per burst are `floor(lerp(min_count, max_count, u))`
    pub min_count: u32,
    pub max_count: u32,
    /// Lifetime of a single ring in milliseconds
    pub duration: f64,
    /// How far past the node's edge a ring grows before vanishing
    pub max_distance: f32,
    pub color: [u8; 3],
    pub opacity: f32,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            min_wait: 3000.0,
            max_wait: 12000.0,
            min_count: 1,
            max_count: 4,
            duration: 2400.0,
            max_distance: 40.0,
            color: [160, 200, 255],
            opacity: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionParams {
    /// Milliseconds to fade a connection in or out
    pub fade: f64,
    pub min_distance: f32,
    pub max_distance: f32,
    pub max_per_node: u32,
    pub color: [u8; 3],
    pub opacity: f32,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            fade: 800.0,
            min_distance: 40.0,
            max_distance: 140.0,
            max_per_node: 3,
            color: [200, 220, 255],
            opacity: 0.25,
        }
    }
}

// Parameters for the simulation, usually loaded from nodefield.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub connections_enabled: bool,
    pub waves_enabled: bool,
    /// Simulation ticks per second
    pub tick_rate: f64,
    /// Use the spatial grid to find connection candidates
    pub spatial_grid: bool,
    pub background: [u8; 3],
    pub spawn_steps: Vec<SpawnStep>,
    pub node: NodeParams,
    pub wave: WaveParams,
    pub connection: ConnectionParams,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            connections_enabled: true,
            waves_enabled: true,
            tick_rate: 25.0,
            spatial_grid: false,
            background: [8, 10, 20],
            // A few nodes near the centre first, the rest of the field later
            spawn_steps: vec![
                SpawnStep::new(1000.0, 0.35, 6),
                SpawnStep::new(2000.0, 0.7, 14),
                SpawnStep::new(3000.0, 1.0, 24),
            ],
            node: NodeParams::default(),
            wave: WaveParams::default(),
            connection: ConnectionParams::default(),
        }
    }
}

impl SimulationParams {
    /// Loads parameters from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses parameters from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Milliseconds between ticks, never below one.
    pub fn tick_period(&self) -> f64 {
        if self.tick_rate > 0.0 {
            (1000.0 / self.tick_rate).max(1.0)
        } else {
            1000.0
        }
    }

    // Names of every range whose minimum exceeds its maximum. These are not
    // errors: an inverted range just animates strangely.
    pub fn inverted_ranges(&self) -> Vec<&'static str> {
        let checks = [
            ("node.velocity", self.node.min_velocity > self.node.max_velocity),
            ("node.radius", self.node.min_radius > self.node.max_radius),
            ("wave.wait", self.wave.min_wait > self.wave.max_wait),
            ("wave.count", self.wave.min_count > self.wave.max_count),
            ("connection.distance", self.connection.min_distance > self.connection.max_distance),
        ];

        checks
            .into_iter()
            .filter(|(_, inverted)| *inverted)
            .map(|(name, _)| name)
            .collect()
    }
}
