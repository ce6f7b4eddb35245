/*
 * Spawner Module
 *
 * Grows the population in timed batches. Each spawn step places its nodes in
 * the ring between the previous step's outer radius and its own, so the
 * field fills from the centre outwards instead of popping in all at once.
 *
 * The schedule is consumed: each step fires exactly once, and nothing more
 * spawns until the schedule is reset.
 */

use std::collections::VecDeque;
use std::f32::consts::TAU;

use rand::Rng;

use crate::node::{lerp, Node};
use crate::params::SpawnStep;
use crate::world::World;

pub struct Spawner {
    steps: VecDeque<SpawnStep>,
    inner_radius: f32,
}

/// What happened when a spawn step fired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnOutcome {
    pub spawned: usize,
    /// Milliseconds to wait before the next step, if any step remains
    pub next_delay: Option<f64>,
}

impl Spawner {
    pub fn new(steps: &[SpawnStep]) -> Self {
        Self { steps: steps.iter().cloned().collect(), inner_radius: 0.0 }
    }

    /// Reloads the full schedule and starts again from the centre.
    pub fn reset(&mut self, steps: &[SpawnStep]) {
        self.steps = steps.iter().cloned().collect();
        self.inner_radius = 0.0;
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }

    // Fire the next step. Returns None once the schedule is exhausted.
    pub fn spawn_next<R: Rng + ?Sized>(
        &mut self,
        world: &mut World,
        now: f64,
        rng: &mut R,
    ) -> Option<SpawnOutcome> {
        let step = self.steps.pop_front()?;

        for _ in 0..step.count {
            let node = spawn_node(world, self.inner_radius, &step, now, &mut *rng);
            world.push_node(node);
        }

        self.inner_radius = step.outer_radius;

        Some(SpawnOutcome {
            spawned: step.count,
            next_delay: if self.steps.is_empty() { None } else { Some(step.delay) },
        })
    }
}

fn spawn_node<R: Rng + ?Sized>(
    world: &World,
    inner_radius: f32,
    step: &SpawnStep,
    now: f64,
    rng: &mut R,
) -> Node {
    let angle = rng.gen::<f32>() * TAU;
    let r = lerp(inner_radius, step.outer_radius, rng.gen::<f32>());
    let x = angle.cos() * r * world.bounds.half_width;
    let y = angle.sin() * r * world.bounds.half_height;

    let heading = rng.gen::<f32>() * TAU;
    let v = rng.gen::<f32>();
    let radius = rng.gen::<f32>();
    let hide_duration = step.max_hide_duration() * rng.gen::<f64>();

    Node::new(x, y, heading, v, radius, hide_duration, now)
}
