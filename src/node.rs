/*
 * Node Module
 *
 * This module defines the Node struct and its waves.
 * Each node drifts in a straight line, bouncing off the world edges, and
 * moves through a fixed lifecycle:
 * 1. Hiding: invisible until its hide duration has passed
 * 2. Spawning: fading in
 * 3. Silent: visible and waiting for its next burst of waves
 * 4. Emitting: rings expanding until every wave has expired
 */

use std::f32::consts::{PI, TAU};

use crate::params::NodeParams;
use crate::world::Bounds;

/// Linear interpolation between `min` and `max` by `t`.
#[inline]
pub fn lerp(min: f32, max: f32, t: f32) -> f32 {
    (max - min) * t + min
}

#[inline]
pub fn lerp_ms(min: f64, max: f64, t: f64) -> f64 {
    (max - min) * t + min
}

// Wrap an angle into [0, 2π)
#[inline]
fn wrap_angle(a: f32) -> f32 {
    let a = a.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU
    if a >= TAU {
        0.0
    } else {
        a
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    Hiding,
    Spawning,
    Silent,
    Emitting,
}

impl NodeState {
    /// Visible nodes that have finished fading in may hold connections.
    pub fn can_connect(self) -> bool {
        matches!(self, NodeState::Silent | NodeState::Emitting)
    }
}

/// One expanding ring of a burst.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wave {
    /// When the burst was emitted
    pub t: f64,
    /// Stagger offset within the burst
    pub delay: f64,
}

impl Wave {
    pub fn elapsed(&self, now: f64) -> f64 {
        now - self.delay - self.t
    }

    pub fn is_active(&self, now: f64) -> bool {
        self.elapsed(now) >= 0.0
    }

    pub fn is_alive(&self, now: f64, duration: f64) -> bool {
        self.elapsed(now) <= duration
    }

    // Remaining life in [0, 1]: 1 when the ring starts, 0 when it is gone
    pub fn remaining(&self, now: f64, duration: f64) -> f32 {
        if duration <= 0.0 {
            return 0.0;
        }
        ((duration - self.elapsed(now)).max(0.0) / duration).min(1.0) as f32
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub x: f32,
    pub y: f32,
    /// Heading in radians, kept in [0, 2π)
    pub a: f32,
    /// Normalized speed factor in [0, 1)
    pub v: f32,
    /// Normalized radius factor in [0, 1)
    pub r: f32,
    pub state: NodeState,
    /// When the current state was entered
    pub t: f64,
    hide_duration: f64,
    /// Draw that decides how long the node stays silent
    pub silence: f64,
    pub connections: u32,
    pub waves: Vec<Wave>,
}

impl Node {
    pub fn new(x: f32, y: f32, a: f32, v: f32, r: f32, hide_duration: f64, now: f64) -> Self {
        Self {
            x,
            y,
            a: wrap_angle(a),
            v,
            r,
            state: NodeState::Hiding,
            t: now,
            hide_duration,
            silence: 0.0,
            connections: 0,
            waves: Vec::new(),
        }
    }

    // Fixed at spawn
    pub fn hide_duration(&self) -> f64 {
        self.hide_duration
    }

    pub fn velocity(&self, params: &NodeParams) -> f32 {
        lerp(params.min_velocity, params.max_velocity, self.v)
    }

    pub fn radius(&self, params: &NodeParams) -> f32 {
        lerp(params.min_radius, params.max_radius, self.r)
    }

    pub fn distance(&self, other: &Node) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn enter(&mut self, state: NodeState, now: f64) {
        self.state = state;
        self.t = now;
    }

    // Move one tick along the heading
    pub fn advance(&mut self, params: &NodeParams) {
        let velocity = self.velocity(params);
        self.x += self.a.cos() * velocity;
        self.y += self.a.sin() * velocity;
    }

    // Reflect the heading when the node's edge crosses a world boundary.
    // Only headings that point further out are reflected, so a node sitting
    // across the edge turns once instead of every tick.
    pub fn bounce(&mut self, bounds: &Bounds, radius: f32) {
        let (dx, dy) = (self.a.cos(), self.a.sin());

        if (self.x + radius > bounds.half_width && dx > 0.0)
            || (self.x - radius < -bounds.half_width && dx < 0.0)
        {
            self.a = PI - self.a;
        }

        if (self.y + radius > bounds.half_height && dy > 0.0)
            || (self.y - radius < -bounds.half_height && dy < 0.0)
        {
            self.a = TAU - self.a;
        }

        self.a = wrap_angle(self.a);
    }
}
