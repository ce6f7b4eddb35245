/*
 * Debug Information Module
 *
 * This module defines the DebugInfo struct that summarises the state of the
 * field after each tick. The controller logs it periodically.
 *
 * Includes:
 * - Tick counters (run, skipped, stale timer firings)
 * - Node counts per lifecycle state and live waves
 * - Connection counts per state
 */

use crate::connection::ConnectionState;
use crate::node::NodeState;
use crate::world::World;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugInfo {
    pub ticks: u64,
    pub skipped_ticks: u64,
    pub stale_timers: u64,
    pub hiding: usize,
    pub spawning: usize,
    pub silent: usize,
    pub emitting: usize,
    pub waves: usize,
    pub connecting: usize,
    pub connected: usize,
    pub disconnecting: usize,
}

impl DebugInfo {
    // Recount the per-state totals, keeping the counters
    pub fn refresh(&mut self, world: &World) {
        self.hiding = 0;
        self.spawning = 0;
        self.silent = 0;
        self.emitting = 0;
        self.waves = 0;
        self.connecting = 0;
        self.connected = 0;
        self.disconnecting = 0;

        for node in world.nodes() {
            match node.state {
                NodeState::Hiding => self.hiding += 1,
                NodeState::Spawning => self.spawning += 1,
                NodeState::Silent => self.silent += 1,
                NodeState::Emitting => self.emitting += 1,
            }
            self.waves += node.waves.len();
        }

        for connection in world.connections.values() {
            match connection.state {
                ConnectionState::Connecting => self.connecting += 1,
                ConnectionState::Connected => self.connected += 1,
                ConnectionState::Disconnecting => self.disconnecting += 1,
            }
        }
    }

    pub fn nodes(&self) -> usize {
        self.hiding + self.spawning + self.silent + self.emitting
    }

    pub fn connections(&self) -> usize {
        self.connecting + self.connected + self.disconnecting
    }
}
