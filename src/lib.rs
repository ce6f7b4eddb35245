/*
 * Node Field - Module Definitions
 *
 * This file defines the module structure for the node field backdrop.
 * The simulation core (everything except `app` and `renderer`) has no
 * graphics dependency; the nannou viewer sits behind the `viewer` feature.
 */

// Re-export key components for easier access
pub use clock::{Clock, ManualClock, SystemClock};
pub use connection::{Connection, ConnectionState, PairKey};
pub use controller::{LoopState, NodeField};
pub use debug::DebugInfo;
pub use node::{Node, NodeState, Wave};
pub use params::{ConfigError, SimulationParams, SpawnStep};
pub use scene::{Renderer, Scene, SceneSlot};
pub use simulation::Engine;
pub use spatial_grid::SpatialGrid;
pub use world::{Bounds, NodeId, World};

// Define modules
pub mod clock;
pub mod connection;
pub mod controller;
pub mod debug;
pub mod node;
pub mod params;
pub mod scene;
pub mod scheduler;
pub mod simulation;
pub mod spatial_grid;
pub mod spawner;
pub mod world;

#[cfg(feature = "viewer")]
pub mod app;
#[cfg(feature = "viewer")]
pub mod renderer;
