/*
 * Connection Module
 *
 * A connection is a fading line between two nearby nodes. It is keyed by the
 * unordered pair of node ids, so the presence of a key is itself the
 * relationship: no key, no line.
 */

use crate::world::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    lo: NodeId,
    hi: NodeId,
}

impl PairKey {
    /// Builds the key for an unordered pair. The two ids must differ.
    pub fn new(a: NodeId, b: NodeId) -> Self {
        debug_assert_ne!(a, b, "a node cannot connect to itself");
        if a < b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    pub fn lo(&self) -> NodeId {
        self.lo
    }

    pub fn hi(&self) -> NodeId {
        self.hi
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnecting,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    key: PairKey,
    pub state: ConnectionState,
    /// When the current state was entered
    pub t: f64,
}

impl Connection {
    pub fn new(key: PairKey, now: f64) -> Self {
        Self { key, state: ConnectionState::Connecting, t: now }
    }

    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.key.lo, self.key.hi)
    }

    pub fn enter(&mut self, state: ConnectionState, now: f64) {
        self.state = state;
        self.t = now;
    }

    // How visible the line is, in [0, 1]
    pub fn fade(&self, now: f64, fade_duration: f64) -> f32 {
        let progress = if fade_duration > 0.0 {
            ((now - self.t) / fade_duration).clamp(0.0, 1.0) as f32
        } else {
            1.0
        };

        match self.state {
            ConnectionState::Connecting => progress,
            ConnectionState::Connected => 1.0,
            ConnectionState::Disconnecting => 1.0 - progress,
        }
    }
}
