/*
 * Scene Module
 *
 * A Scene is a read-only snapshot of the world for one frame: positions,
 * radii and fade fractions, already worked out from the current time. A
 * renderer only has to turn it into pixels.
 */

use crate::node::NodeState;
use crate::params::SimulationParams;
use crate::world::{Bounds, NodeId, World};

/// Anything that can draw a scene.
pub trait Renderer {
    fn render(&mut self, scene: &Scene);
}

/// Keeps the latest scene for hosts that draw on their own schedule.
#[derive(Default)]
pub struct SceneSlot {
    latest: Option<Scene>,
    frames: u64,
}

impl SceneSlot {
    pub fn latest(&self) -> Option<&Scene> {
        self.latest.as_ref()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for SceneSlot {
    fn render(&mut self, scene: &Scene) {
        self.latest = Some(scene.clone());
        self.frames += 1;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    pub radius: f32,
    /// 0 when the ring starts, 1 when it is gone
    pub progress: f32,
    pub fade: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeSprite {
    pub id: NodeId,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub state: NodeState,
    pub fade: f32,
    pub rings: Vec<Ring>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionLine {
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub fade: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub time: f64,
    pub bounds: Bounds,
    pub connections: Vec<ConnectionLine>,
    pub nodes: Vec<NodeSprite>,
}

impl Scene {
    pub fn capture(world: &World, params: &SimulationParams, now: f64) -> Self {
        let connections = world
            .connections
            .values()
            .map(|connection| {
                let (a, b) = connection.endpoints();
                let (a, b) = (world.node(a), world.node(b));
                ConnectionLine {
                    from: (a.x, a.y),
                    to: (b.x, b.y),
                    fade: connection.fade(now, params.connection.fade),
                }
            })
            .collect();

        let nodes = world
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, node)| node.state != NodeState::Hiding)
            .map(|(i, node)| {
                let radius = node.radius(&params.node);
                let fade = match node.state {
                    NodeState::Spawning if params.node.spawn_fade > 0.0 => {
                        ((now - node.t) / params.node.spawn_fade).clamp(0.0, 1.0) as f32
                    }
                    _ => 1.0,
                };

                let rings = node
                    .waves
                    .iter()
                    .filter(|wave| wave.is_active(now))
                    .map(|wave| {
                        let remaining = wave.remaining(now, params.wave.duration);
                        Ring {
                            radius: radius + (1.0 - remaining) * params.wave.max_distance,
                            progress: 1.0 - remaining,
                            fade: remaining,
                        }
                    })
                    .collect();

                NodeSprite { id: NodeId(i), x: node.x, y: node.y, radius, state: node.state, fade, rings }
            })
            .collect();

        Self { time: now, bounds: world.bounds, connections, nodes }
    }
}
